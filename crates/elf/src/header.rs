//! ELF file header parsing.
//!
//! Reads the 32-bit (52-byte) or 64-bit (64-byte) on-disk file header in
//! the byte order named by `e_ident`, and widens it into one [`FileHeader`].

use crate::error::ElfError;
use crate::ident::{Class, EI_NIDENT, Ident, Reader};

/// Size of an ELF32 file header (52 bytes).
pub(crate) const ELF32_EHDR_SIZE: usize = 52;

/// Size of an ELF64 file header (64 bytes).
pub(crate) const ELF64_EHDR_SIZE: usize = 64;

/// Size of an ELF32 program header entry (32 bytes).
pub(crate) const ELF32_PHDR_SIZE: usize = 32;

/// Size of an ELF64 program header entry (56 bytes).
pub(crate) const ELF64_PHDR_SIZE: usize = 56;

/// Size of an ELF32 section header entry (40 bytes).
pub(crate) const ELF32_SHDR_SIZE: usize = 40;

/// Size of an ELF64 section header entry (64 bytes).
pub(crate) const ELF64_SHDR_SIZE: usize = 64;

impl Class {
    /// Size of the on-disk file header for this class.
    #[must_use]
    pub const fn ehdr_size(self) -> usize {
        match self {
            Self::Elf32 => ELF32_EHDR_SIZE,
            Self::Elf64 => ELF64_EHDR_SIZE,
        }
    }

    /// Size of one on-disk program header for this class.
    #[must_use]
    pub const fn phdr_size(self) -> usize {
        match self {
            Self::Elf32 => ELF32_PHDR_SIZE,
            Self::Elf64 => ELF64_PHDR_SIZE,
        }
    }

    /// Size of one on-disk section header for this class.
    #[must_use]
    pub const fn shdr_size(self) -> usize {
        match self {
            Self::Elf32 => ELF32_SHDR_SIZE,
            Self::Elf64 => ELF64_SHDR_SIZE,
        }
    }
}

elf_constants! {
    /// Object file type (`e_type`).
    pub struct ElfType(u16);
    /// No file type.
    NONE = 0;
    /// Relocatable file.
    REL = 1;
    /// Executable file.
    EXEC = 2;
    /// Shared object file.
    DYN = 3;
    /// Core file.
    CORE = 4;
    /// Number of defined types.
    NUM = 5;
    /// Start of the processor-specific range.
    LOPROC = 0xff00;
    /// End of the processor-specific range.
    HIPROC = 0xffff;
}

elf_constants! {
    /// Target machine architecture (`e_machine`).
    pub struct Machine(u16);
    /// No machine.
    NONE = 0;
    /// SPARC.
    SPARC = 2;
    /// Intel 80386.
    I386 = 3;
    /// Motorola 68000.
    M68K = 4;
    /// Intel 80486.
    I486 = 6;
    /// Intel 80860.
    I860 = 7;
    /// MIPS RS3000.
    MIPS = 8;
    /// PowerPC.
    PPC = 20;
    /// 64-bit PowerPC.
    PPC64 = 21;
    /// ARM.
    ARM = 40;
    /// Intel IA-64.
    IA_64 = 50;
    /// AMD x86-64.
    X86_64 = 62;
    /// ARM 64-bit.
    AARCH64 = 183;
    /// RISC-V.
    RISCV = 243;
}

/// Parsed ELF file header, normalized to 64-bit fields.
///
/// For `ELFCLASS32` input, `e_entry`, `e_phoff` and `e_shoff` are
/// zero-extended; every other field has the same width in both classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Decoded identification block.
    pub ident: Ident,
    /// The raw 16 identification bytes, padding included.
    pub e_ident: [u8; EI_NIDENT],
    /// Object file type.
    pub e_type: ElfType,
    /// Target machine architecture.
    pub e_machine: Machine,
    /// Object file version.
    pub e_version: u32,
    /// Virtual address of the entry point (0 if none).
    pub e_entry: u64,
    /// Offset of the program header table in the file.
    pub e_phoff: u64,
    /// Offset of the section header table in the file.
    pub e_shoff: u64,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Size of this header in bytes, as declared.
    pub e_ehsize: u16,
    /// Size of each program header entry, as declared.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of each section header entry, as declared.
    pub e_shentsize: u16,
    /// Number of section header entries.
    pub e_shnum: u16,
    /// Section header string table index.
    pub e_shstrndx: u16,
}

impl FileHeader {
    /// Parse an ELF file header from raw bytes.
    ///
    /// Validates `e_ident` first, then reads the header record in the
    /// detected class and byte order. Table offsets and counts are not
    /// checked here.
    ///
    /// # Errors
    ///
    /// Returns any [`Ident::parse`] error, or [`ElfError::TruncatedInput`]
    /// if `data` is shorter than the header record for its class.
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        let ident = Ident::parse(data)?;
        let class = ident.class;

        if data.len() < class.ehdr_size() {
            return Err(ElfError::TruncatedInput);
        }

        let mut e_ident = [0u8; EI_NIDENT];
        e_ident.copy_from_slice(&data[..EI_NIDENT]);

        // Field order is identical for both classes; only the word-sized
        // fields (entry, phoff, shoff) differ in width.
        let mut r = Reader::new(data, EI_NIDENT, ident.endian);
        Ok(Self {
            ident,
            e_ident,
            e_type: ElfType::new(r.u16()?),
            e_machine: Machine::new(r.u16()?),
            e_version: r.u32()?,
            e_entry: r.word(class)?,
            e_phoff: r.word(class)?,
            e_shoff: r.word(class)?,
            e_flags: r.u32()?,
            e_ehsize: r.u16()?,
            e_phentsize: r.u16()?,
            e_phnum: r.u16()?,
            e_shentsize: r.u16()?,
            e_shnum: r.u16()?,
            e_shstrndx: r.u16()?,
        })
    }

    /// Returns the file class.
    #[must_use]
    pub fn class(&self) -> Class {
        self.ident.class
    }
}

/// Returns `data[offset..offset + size]`, or `None` if any part of the
/// range lies outside `data` or the end overflows.
pub(crate) fn file_range(data: &[u8], offset: u64, size: u64) -> Option<&[u8]> {
    let end = offset.checked_add(size)?;
    if end > data.len() as u64 {
        return None;
    }
    let start = usize::try_from(offset).ok()?;
    let end = usize::try_from(end).ok()?;
    data.get(start..end)
}

/// Validates that a table of `count` records of `entsize` bytes starts
/// inside `data`, and returns its start position.
///
/// A table that starts inside the buffer but runs past its end is reported
/// as [`ElfError::TruncatedInput`], the error the record reads would give.
pub(crate) fn table_start(
    data: &[u8],
    offset: u64,
    count: usize,
    entsize: usize,
) -> Result<usize, ElfError> {
    if offset >= data.len() as u64 {
        return Err(ElfError::InvalidOffset(offset));
    }
    let start = usize::try_from(offset).map_err(|_| ElfError::InvalidOffset(offset))?;
    let end = count
        .checked_mul(entsize)
        .and_then(|len| len.checked_add(start))
        .ok_or(ElfError::TruncatedInput)?;
    if end > data.len() {
        return Err(ElfError::TruncatedInput);
    }
    Ok(start)
}
