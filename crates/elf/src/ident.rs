//! ELF identification (`e_ident`) sniffing and byte-order aware field reads.
//!
//! The first 16 bytes of an ELF file decide how everything after them is
//! laid out: [`Class`] selects the 32- or 64-bit record layouts and
//! [`Endian`] the byte order of every multi-byte field.

use core::fmt;

use crate::error::ElfError;

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of the magic number.
pub const MAGIC_SIZE: usize = 4;
/// Index of the file class byte.
pub const EI_CLASS: usize = 4;
/// Index of the data encoding byte.
pub const EI_DATA: usize = 5;
/// Index of the identification version byte.
pub const EI_VERSION: usize = 6;
/// Index of the OS/ABI byte.
pub const EI_OSABI: usize = 7;
/// Index of the ABI version byte.
pub const EI_ABIVERSION: usize = 8;
/// Start of the padding bytes.
pub const EI_PAD: usize = 9;
/// Size of `e_ident`.
pub const EI_NIDENT: usize = 16;

/// ELF class: 32-bit objects.
pub const ELFCLASS32: u8 = 1;
/// ELF class: 64-bit objects.
pub const ELFCLASS64: u8 = 2;

/// ELF data encoding: little-endian.
pub const ELFDATA2LSB: u8 = 1;
/// ELF data encoding: big-endian.
pub const ELFDATA2MSB: u8 = 2;

/// Bit width of an object file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    /// `ELFCLASS32`.
    Elf32,
    /// `ELFCLASS64`.
    Elf64,
}

impl Class {
    /// Decodes the `EI_CLASS` byte.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidClass`] for anything but 1 or 2.
    pub fn from_byte(byte: u8) -> Result<Self, ElfError> {
        match byte {
            ELFCLASS32 => Ok(Self::Elf32),
            ELFCLASS64 => Ok(Self::Elf64),
            other => Err(ElfError::InvalidClass(other)),
        }
    }

    /// Size in bytes of an address or offset field in this class.
    #[must_use]
    pub const fn word_size(self) -> usize {
        match self {
            Self::Elf32 => 4,
            Self::Elf64 => 8,
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elf32 => write!(f, "ELF32"),
            Self::Elf64 => write!(f, "ELF64"),
        }
    }
}

/// Byte order of every multi-byte field after `e_ident`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    /// `ELFDATA2LSB`.
    Little,
    /// `ELFDATA2MSB`.
    Big,
}

impl Endian {
    /// Decodes the `EI_DATA` byte.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::InvalidEncoding`] for anything but 1 or 2.
    pub fn from_byte(byte: u8) -> Result<Self, ElfError> {
        match byte {
            ELFDATA2LSB => Ok(Self::Little),
            ELFDATA2MSB => Ok(Self::Big),
            other => Err(ElfError::InvalidEncoding(other)),
        }
    }

    /// Read a `u16` from `data` at byte offset `off`.
    pub(crate) fn read_u16(self, data: &[u8], off: usize) -> Result<u16, ElfError> {
        let bytes = chunk::<2>(data, off)?;
        Ok(match self {
            Self::Little => u16::from_le_bytes(*bytes),
            Self::Big => u16::from_be_bytes(*bytes),
        })
    }

    /// Read a `u32` from `data` at byte offset `off`.
    pub(crate) fn read_u32(self, data: &[u8], off: usize) -> Result<u32, ElfError> {
        let bytes = chunk::<4>(data, off)?;
        Ok(match self {
            Self::Little => u32::from_le_bytes(*bytes),
            Self::Big => u32::from_be_bytes(*bytes),
        })
    }

    /// Read a `u64` from `data` at byte offset `off`.
    pub(crate) fn read_u64(self, data: &[u8], off: usize) -> Result<u64, ElfError> {
        let bytes = chunk::<8>(data, off)?;
        Ok(match self {
            Self::Little => u64::from_le_bytes(*bytes),
            Self::Big => u64::from_be_bytes(*bytes),
        })
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => write!(f, "little endian"),
            Self::Big => write!(f, "big endian"),
        }
    }
}

/// Borrow `N` bytes at `off`, or fail with [`ElfError::TruncatedInput`].
fn chunk<const N: usize>(data: &[u8], off: usize) -> Result<&[u8; N], ElfError> {
    data.get(off..)
        .and_then(|rest| rest.first_chunk::<N>())
        .ok_or(ElfError::TruncatedInput)
}

/// Sequential field reader over one fixed-size on-disk record.
///
/// Fields are consumed in declaration order, the same way the records are
/// laid out in the format manual.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    endian: Endian,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at `pos` within `data`.
    pub(crate) fn new(data: &'a [u8], pos: usize, endian: Endian) -> Self {
        Self { data, pos, endian }
    }

    fn advance(&mut self, by: usize) -> Result<usize, ElfError> {
        let at = self.pos;
        self.pos = at.checked_add(by).ok_or(ElfError::TruncatedInput)?;
        Ok(at)
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ElfError> {
        let at = self.advance(2)?;
        self.endian.read_u16(self.data, at)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ElfError> {
        let at = self.advance(4)?;
        self.endian.read_u32(self.data, at)
    }

    pub(crate) fn u64(&mut self) -> Result<u64, ElfError> {
        let at = self.advance(8)?;
        self.endian.read_u64(self.data, at)
    }

    /// Read an address/offset-sized field, zero-extending 32-bit values.
    pub(crate) fn word(&mut self, class: Class) -> Result<u64, ElfError> {
        match class {
            Class::Elf32 => self.u32().map(u64::from),
            Class::Elf64 => self.u64(),
        }
    }
}

/// Decoded identification block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    /// File class (bit width).
    pub class: Class,
    /// Data encoding (byte order).
    pub endian: Endian,
    /// `EI_VERSION`.
    pub version: u8,
    /// `EI_OSABI`.
    pub os_abi: u8,
    /// `EI_ABIVERSION`.
    pub abi_version: u8,
}

impl Ident {
    /// Validates the identification block at the start of `data`.
    ///
    /// Checks, in order: at least the magic is present, the magic matches,
    /// the whole 16-byte block is present, then the class and encoding bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::TruncatedInput`], [`ElfError::BadMagic`],
    /// [`ElfError::InvalidClass`] or [`ElfError::InvalidEncoding`].
    pub fn parse(data: &[u8]) -> Result<Self, ElfError> {
        let magic = data
            .first_chunk::<MAGIC_SIZE>()
            .ok_or(ElfError::TruncatedInput)?;
        if *magic != ELF_MAGIC {
            return Err(ElfError::BadMagic);
        }

        let ident = data
            .first_chunk::<EI_NIDENT>()
            .ok_or(ElfError::TruncatedInput)?;
        let class = Class::from_byte(ident[EI_CLASS])?;
        let endian = Endian::from_byte(ident[EI_DATA])?;

        Ok(Self {
            class,
            endian,
            version: ident[EI_VERSION],
            os_abi: ident[EI_OSABI],
            abi_version: ident[EI_ABIVERSION],
        })
    }
}
