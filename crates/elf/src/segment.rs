//! Program header (segment) table parsing.
//!
//! Segments are unnamed; each [`Segment`] is a normalized [`ProgramHeader`]
//! bound to the `p_filesz` bytes of the file it maps. The `p_memsz - p_filesz`
//! tail is zero-filled by a loader and has no file content.

use alloc::vec::Vec;

use crate::error::ElfError;
use crate::header::{FileHeader, file_range, table_start};
use crate::ident::{Class, Ident, Reader};

elf_constants! {
    /// Segment type (`p_type`).
    pub struct SegmentType(u32);
    /// Unused entry.
    NULL = 0;
    /// Loadable segment.
    LOAD = 1;
    /// Dynamic linking information.
    DYNAMIC = 2;
    /// Path of the program interpreter.
    INTERP = 3;
    /// Auxiliary information.
    NOTE = 4;
    /// Reserved.
    SHLIB = 5;
    /// The program header table itself.
    PHDR = 6;
    /// Thread-local storage template.
    TLS = 7;
    /// Number of defined types.
    NUM = 8;
    /// `.eh_frame_hdr` location.
    GNU_EH_FRAME = 0x6474_e550;
    /// Stack executability.
    GNU_STACK = 0x6474_e551;
    /// Read-only after relocation.
    GNU_RELRO = 0x6474_e552;
    /// `.note.gnu.property` location.
    GNU_PROPERTY = 0x6474_e553;
}

impl SegmentType {
    /// Start of the OS-specific range.
    pub const LOOS: Self = Self::new(0x6000_0000);
    /// End of the OS-specific range.
    pub const HIOS: Self = Self::new(0x6fff_ffff);
    /// Start of the processor-specific range.
    pub const LOPROC: Self = Self::new(0x7000_0000);
    /// End of the processor-specific range.
    pub const HIPROC: Self = Self::new(0x7fff_ffff);
}

bitflags::bitflags! {
    /// Segment permission flags (`p_flags`).
    ///
    /// Bits outside the named set are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SegmentFlags: u32 {
        /// Executable.
        const X        = 0x1;
        /// Writable.
        const W        = 0x2;
        /// Readable.
        const R        = 0x4;
        /// OS-specific bits.
        const MASKOS   = 0x0ff0_0000;
        /// Processor-specific bits.
        const MASKPROC = 0xf000_0000;

        const _ = !0;
    }
}

/// Parsed program header entry, normalized to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader {
    /// Segment type.
    pub p_type: SegmentType,
    /// Segment permission flags.
    pub p_flags: SegmentFlags,
    /// Offset of the segment in the file.
    pub p_offset: u64,
    /// Virtual address of the segment in memory.
    pub p_vaddr: u64,
    /// Physical address (unused on most platforms).
    pub p_paddr: u64,
    /// Size of the segment in the file.
    pub p_filesz: u64,
    /// Size of the segment in memory (may be larger than `p_filesz`).
    pub p_memsz: u64,
    /// Alignment of the segment.
    pub p_align: u64,
}

impl ProgramHeader {
    /// Parse a program header record at `pos`.
    ///
    /// `p_flags` moves: ELF64 stores it second, ELF32 stores it after
    /// `p_memsz`.
    pub(crate) fn parse(data: &[u8], pos: usize, ident: &Ident) -> Result<Self, ElfError> {
        let class = ident.class;
        let mut r = Reader::new(data, pos, ident.endian);
        let p_type = SegmentType::new(r.u32()?);
        match class {
            Class::Elf32 => {
                let p_offset = r.word(class)?;
                let p_vaddr = r.word(class)?;
                let p_paddr = r.word(class)?;
                let p_filesz = r.word(class)?;
                let p_memsz = r.word(class)?;
                let p_flags = SegmentFlags::from_bits_retain(r.u32()?);
                let p_align = r.word(class)?;
                Ok(Self {
                    p_type,
                    p_flags,
                    p_offset,
                    p_vaddr,
                    p_paddr,
                    p_filesz,
                    p_memsz,
                    p_align,
                })
            }
            Class::Elf64 => Ok(Self {
                p_type,
                p_flags: SegmentFlags::from_bits_retain(r.u32()?),
                p_offset: r.u64()?,
                p_vaddr: r.u64()?,
                p_paddr: r.u64()?,
                p_filesz: r.u64()?,
                p_memsz: r.u64()?,
                p_align: r.u64()?,
            }),
        }
    }
}

/// A segment: its program header and borrowed file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// The normalized program header.
    pub header: ProgramHeader,
    index: usize,
    data: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Position of this segment in the program header table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The file-backed content, exactly `p_filesz` bytes.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The segment type.
    #[must_use]
    pub fn segment_type(&self) -> SegmentType {
        self.header.p_type
    }

    /// The segment permission flags.
    #[must_use]
    pub fn flags(&self) -> SegmentFlags {
        self.header.p_flags
    }

    /// Virtual address where this segment should be mapped.
    #[must_use]
    pub fn vaddr(&self) -> u64 {
        self.header.p_vaddr
    }

    /// Total size of the segment in memory.
    #[must_use]
    pub fn memsz(&self) -> u64 {
        self.header.p_memsz
    }
}

/// Builds the segment table in on-disk order.
pub(crate) fn parse_segments<'a>(
    data: &'a [u8],
    hdr: &FileHeader,
) -> Result<Vec<Segment<'a>>, ElfError> {
    let count = usize::from(hdr.e_phnum);
    if count == 0 {
        return Ok(Vec::new());
    }

    let entsize = hdr.class().phdr_size();
    let start = table_start(data, hdr.e_phoff, count, entsize)?;

    let mut segments = Vec::with_capacity(count);
    for index in 0..count {
        let header = ProgramHeader::parse(data, start + index * entsize, &hdr.ident)?;
        log::trace!(
            "phdr[{index}]: type={} flags={:#x} offset={:#x} filesz={:#x} memsz={:#x}",
            header.p_type,
            header.p_flags.bits(),
            header.p_offset,
            header.p_filesz,
            header.p_memsz
        );
        let content = file_range(data, header.p_offset, header.p_filesz).ok_or(
            ElfError::InvalidSegmentRange {
                index,
                offset: header.p_offset,
                size: header.p_filesz,
            },
        )?;
        segments.push(Segment {
            header,
            index,
            data: content,
        });
    }

    Ok(segments)
}
