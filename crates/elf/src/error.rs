//! Parse errors.

use core::fmt;

/// Errors that can occur when parsing an ELF file.
///
/// Every variant is terminal: a parse either yields a complete
/// [`ElfFile`](crate::ElfFile) or one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    /// The input is shorter than a required fixed-size region.
    TruncatedInput,
    /// The file does not start with the ELF magic bytes.
    BadMagic,
    /// `EI_CLASS` is neither `ELFCLASS32` nor `ELFCLASS64`.
    InvalidClass(u8),
    /// `EI_DATA` is neither `ELFDATA2LSB` nor `ELFDATA2MSB`.
    InvalidEncoding(u8),
    /// A table offset (`e_shoff` or `e_phoff`) points outside the input.
    InvalidOffset(u64),
    /// A section name lies outside the input or is not NUL-terminated
    /// before the end of the input.
    InvalidStringIndex(u64),
    /// A section's `sh_offset + sh_size` runs past the end of the input.
    InvalidSectionRange {
        /// Index of the offending section.
        index: usize,
        /// Declared file offset.
        offset: u64,
        /// Declared size.
        size: u64,
    },
    /// A segment's `p_offset + p_filesz` runs past the end of the input.
    InvalidSegmentRange {
        /// Index of the offending program header.
        index: usize,
        /// Declared file offset.
        offset: u64,
        /// Declared file size.
        size: u64,
    },
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedInput => write!(f, "input data truncated"),
            Self::BadMagic => write!(f, "invalid ELF magic bytes"),
            Self::InvalidClass(class) => write!(f, "invalid ELF class {class}"),
            Self::InvalidEncoding(data) => write!(f, "invalid data encoding {data}"),
            Self::InvalidOffset(off) => write!(f, "invalid header table offset {off:#x}"),
            Self::InvalidStringIndex(pos) => write!(f, "invalid section string index {pos:#x}"),
            Self::InvalidSectionRange {
                index,
                offset,
                size,
            } => write!(
                f,
                "section {index} content {offset:#x}+{size:#x} is out of bounds"
            ),
            Self::InvalidSegmentRange {
                index,
                offset,
                size,
            } => write!(
                f,
                "segment {index} content {offset:#x}+{size:#x} is out of bounds"
            ),
        }
    }
}

impl core::error::Error for ElfError {}
