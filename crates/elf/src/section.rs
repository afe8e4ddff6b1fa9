//! Section header table parsing and section name resolution.
//!
//! Builds the ordered [`Section`] table: each on-disk record is normalized
//! to a [`SectionHeader`], named through the section header string table
//! (`e_shstrndx`), and bound to its validated content slice.

use alloc::vec::Vec;

use crate::error::ElfError;
use crate::header::{FileHeader, file_range, table_start};
use crate::ident::{Ident, Reader};

elf_constants! {
    /// Section type (`sh_type`).
    pub struct SectionType(u32);
    /// Inactive header; the null section at index 0.
    NULL = 0;
    /// Program-defined contents.
    PROGBITS = 1;
    /// Symbol table.
    SYMTAB = 2;
    /// String table.
    STRTAB = 3;
    /// Relocation entries with addends.
    RELA = 4;
    /// Symbol hash table.
    HASH = 5;
    /// Dynamic linking information.
    DYNAMIC = 6;
    /// Notes.
    NOTE = 7;
    /// Occupies no file space (`.bss`).
    NOBITS = 8;
    /// Relocation entries without addends.
    REL = 9;
    /// Reserved.
    SHLIB = 10;
    /// Dynamic linker symbol table.
    DYNSYM = 11;
    /// Array of constructors.
    INIT_ARRAY = 14;
    /// Array of destructors.
    FINI_ARRAY = 15;
    /// Array of pre-constructors.
    PREINIT_ARRAY = 16;
    /// Section group.
    GROUP = 17;
    /// Extended section indices.
    SYMTAB_SHNDX = 18;
}

impl SectionType {
    /// Start of the OS-specific range.
    pub const LOOS: Self = Self::new(0x6000_0000);
    /// End of the OS-specific range.
    pub const HIOS: Self = Self::new(0x6fff_ffff);
    /// Start of the processor-specific range.
    pub const LOPROC: Self = Self::new(0x7000_0000);
    /// End of the processor-specific range.
    pub const HIPROC: Self = Self::new(0x7fff_ffff);
    /// Start of the application-specific range.
    pub const LOUSER: Self = Self::new(0x8000_0000);
    /// End of the application-specific range.
    pub const HIUSER: Self = Self::new(0xffff_ffff);
}

bitflags::bitflags! {
    /// Section flags (`sh_flags`).
    ///
    /// Bits outside the named set are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SectionFlags: u64 {
        /// Writable data.
        const WRITE            = 0x1;
        /// Occupies memory during execution.
        const ALLOC            = 0x2;
        /// Executable machine instructions.
        const EXECINSTR        = 0x4;
        /// Mergeable data.
        const MERGE            = 0x10;
        /// NUL-terminated strings.
        const STRINGS          = 0x20;
        /// `sh_info` holds a section header table index.
        const INFO_LINK        = 0x40;
        /// Preserve order after combining.
        const LINK_ORDER       = 0x80;
        /// OS-specific handling required.
        const OS_NONCONFORMING = 0x100;
        /// Member of a section group.
        const GROUP            = 0x200;
        /// Thread-local storage.
        const TLS              = 0x400;
        /// Compressed data.
        const COMPRESSED       = 0x800;
        /// OS-specific bits.
        const MASKOS           = 0x0ff0_0000;
        /// Processor-specific bits.
        const MASKPROC         = 0xf000_0000;
        /// Special ordering requirement (Solaris).
        const ORDERED          = 0x4000_0000;
        /// Excluded unless referenced or allocated (Solaris).
        const EXCLUDE          = 0x8000_0000;

        const _ = !0;
    }
}

/// Special section index: undefined.
pub const SHN_UNDEF: u16 = 0;

/// Special section index: the real value lives in section 0 (extended numbering).
pub const SHN_XINDEX: u16 = 0xffff;

/// Parsed section header entry, normalized to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset into the section header string table for this section's name.
    pub sh_name: u32,
    /// Section type.
    pub sh_type: SectionType,
    /// Section flags.
    pub sh_flags: SectionFlags,
    /// Virtual address of the section in memory (0 for non-loaded sections).
    pub sh_addr: u64,
    /// File offset of the section data.
    pub sh_offset: u64,
    /// Size of the section in bytes.
    pub sh_size: u64,
    /// Associated section index (e.g. `.strtab` index for `.symtab`).
    pub sh_link: u32,
    /// Extra info (interpretation depends on section type).
    pub sh_info: u32,
    /// Required alignment of the section.
    pub sh_addralign: u64,
    /// Size of each entry, for sections holding fixed-size entries.
    pub sh_entsize: u64,
}

impl SectionHeader {
    /// Parse a section header record at `pos`.
    ///
    /// The ELF32 and ELF64 records share field order; the flag, address,
    /// offset, size, alignment and entry size fields are word-sized.
    pub(crate) fn parse(data: &[u8], pos: usize, ident: &Ident) -> Result<Self, ElfError> {
        let class = ident.class;
        let mut r = Reader::new(data, pos, ident.endian);
        Ok(Self {
            sh_name: r.u32()?,
            sh_type: SectionType::new(r.u32()?),
            sh_flags: SectionFlags::from_bits_retain(r.word(class)?),
            sh_addr: r.word(class)?,
            sh_offset: r.word(class)?,
            sh_size: r.word(class)?,
            sh_link: r.u32()?,
            sh_info: r.u32()?,
            sh_addralign: r.word(class)?,
            sh_entsize: r.word(class)?,
        })
    }

    /// Returns `true` if the section occupies space in the file.
    #[must_use]
    pub fn has_file_content(&self) -> bool {
        self.sh_type != SectionType::NOBITS
    }
}

/// A section: its header, resolved name and borrowed file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section<'a> {
    /// The normalized section header.
    pub header: SectionHeader,
    index: usize,
    name: &'a [u8],
    data: &'a [u8],
}

impl<'a> Section<'a> {
    /// Position of this section in the section header table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The section name, or `None` if it is not valid UTF-8.
    ///
    /// Sections in a file without a name string table have empty names.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        core::str::from_utf8(self.name).ok()
    }

    /// The raw name bytes, without the NUL terminator.
    #[must_use]
    pub fn name_bytes(&self) -> &'a [u8] {
        self.name
    }

    /// The section's file content.
    ///
    /// Always `sh_size` bytes long, except for `SHT_NOBITS` sections, whose
    /// content is empty.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The section type.
    #[must_use]
    pub fn section_type(&self) -> SectionType {
        self.header.sh_type
    }

    /// The section flags.
    #[must_use]
    pub fn flags(&self) -> SectionFlags {
        self.header.sh_flags
    }
}

/// A zero-copy wrapper around a NUL-terminated string table section.
#[derive(Debug, Clone, Copy)]
pub struct StringTable<'a> {
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    /// Creates a new string table from the raw section data.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Looks up the raw bytes of the NUL-terminated string at `offset`.
    ///
    /// Returns `None` if the offset is out of bounds or no NUL follows it.
    #[must_use]
    pub fn get_bytes(&self, offset: u32) -> Option<&'a [u8]> {
        let start = usize::try_from(offset).ok()?;
        let remaining = self.data.get(start..)?;
        let nul_pos = remaining.iter().position(|&b| b == 0)?;
        Some(&remaining[..nul_pos])
    }

    /// Looks up a NUL-terminated string at the given byte offset.
    ///
    /// Returns `None` if the offset is out of bounds, the string is not
    /// terminated, or it contains invalid UTF-8.
    #[must_use]
    pub fn get(&self, offset: u32) -> Option<&'a str> {
        core::str::from_utf8(self.get_bytes(offset)?).ok()
    }
}

/// Reads the name starting at `strtab_offset + sh_name`.
///
/// The scan for the terminator stops at the end of `data`; a name with no
/// NUL before that is rejected rather than read past the buffer.
fn resolve_name(data: &[u8], strtab_offset: u64, sh_name: u32) -> Result<&[u8], ElfError> {
    let pos = strtab_offset
        .checked_add(u64::from(sh_name))
        .ok_or(ElfError::InvalidStringIndex(u64::MAX))?;
    if pos >= data.len() as u64 {
        return Err(ElfError::InvalidStringIndex(pos));
    }
    let start = usize::try_from(pos).map_err(|_| ElfError::InvalidStringIndex(pos))?;
    let rest = &data[start..];
    let len = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(ElfError::InvalidStringIndex(pos))?;
    Ok(&rest[..len])
}

/// Finds the file offset names are resolved against.
///
/// `SHN_UNDEF` selects section 0 like any other index; the names it yields
/// are bounds-checked but not kept.
fn shstrtab_offset(hdr: &FileHeader, headers: &[SectionHeader]) -> Result<u64, ElfError> {
    let index = match hdr.e_shstrndx {
        SHN_XINDEX => {
            let link = headers.first().map_or(0, |null| null.sh_link);
            usize::try_from(link).map_err(|_| ElfError::InvalidStringIndex(u64::from(link)))?
        }
        index => usize::from(index),
    };
    headers
        .get(index)
        .map(|strtab| strtab.sh_offset)
        .ok_or(ElfError::InvalidStringIndex(index as u64))
}

/// Builds the section table in on-disk order.
///
/// Returns an empty table when `e_shnum` is 0, whatever the other fields hold.
pub(crate) fn parse_sections<'a>(
    data: &'a [u8],
    hdr: &FileHeader,
) -> Result<Vec<Section<'a>>, ElfError> {
    let count = usize::from(hdr.e_shnum);
    if count == 0 {
        return Ok(Vec::new());
    }

    let entsize = hdr.class().shdr_size();
    let start = table_start(data, hdr.e_shoff, count, entsize)?;

    let mut headers = Vec::with_capacity(count);
    for i in 0..count {
        let shdr = SectionHeader::parse(data, start + i * entsize, &hdr.ident)?;
        log::trace!(
            "shdr[{i}]: type={} flags={:#x} offset={:#x} size={:#x}",
            shdr.sh_type,
            shdr.sh_flags.bits(),
            shdr.sh_offset,
            shdr.sh_size
        );
        headers.push(shdr);
    }

    let strtab = shstrtab_offset(hdr, &headers)?;
    let named = hdr.e_shstrndx != SHN_UNDEF;

    let mut sections = Vec::with_capacity(count);
    for (index, header) in headers.into_iter().enumerate() {
        let name = resolve_name(data, strtab, header.sh_name)?;
        let name = if named { name } else { &[] };
        let content = if header.has_file_content() {
            file_range(data, header.sh_offset, header.sh_size).ok_or(
                ElfError::InvalidSectionRange {
                    index,
                    offset: header.sh_offset,
                    size: header.sh_size,
                },
            )?
        } else {
            &[]
        };
        sections.push(Section {
            header,
            index,
            name,
            data: content,
        });
    }

    Ok(sections)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
