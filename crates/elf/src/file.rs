//! The parsed ELF model and its read-only query surface.

use alloc::vec::Vec;

use crate::error::ElfError;
use crate::header::FileHeader;
use crate::ident::{Class, Endian};
use crate::section::{
    SHN_UNDEF, SHN_XINDEX, Section, SectionFlags, SectionType, StringTable, parse_sections,
};
use crate::segment::{Segment, SegmentFlags, SegmentType, parse_segments};

/// A parsed ELF file borrowing the caller's buffer.
///
/// Built in one pass by [`ElfFile::parse`] and immutable afterwards. Every
/// [`Section`] and [`Segment`] it hands out borrows the same buffer, so the
/// buffer cannot be dropped or modified while any of them is alive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfFile<'a> {
    data: &'a [u8],
    header: FileHeader,
    sections: Vec<Section<'a>>,
    segments: Vec<Segment<'a>>,
}

impl<'a> ElfFile<'a> {
    /// Parse an ELF file from raw bytes.
    ///
    /// Validates the identification bytes and the file header, then builds
    /// the section table (names resolved, contents bounds-checked) and the
    /// segment table.
    ///
    /// # Errors
    ///
    /// Returns the first [`ElfError`] found. Nothing is returned for a
    /// partially valid file.
    pub fn parse(data: &'a [u8]) -> Result<Self, ElfError> {
        let header = FileHeader::parse(data)?;
        log::debug!(
            "{} {} {} for {}: {} sections at {:#x}, {} segments at {:#x}",
            header.class(),
            header.ident.endian,
            header.e_type,
            header.e_machine,
            header.e_shnum,
            header.e_shoff,
            header.e_phnum,
            header.e_phoff
        );

        let sections = parse_sections(data, &header)?;
        let segments = parse_segments(data, &header)?;

        Ok(Self {
            data,
            header,
            sections,
            segments,
        })
    }

    /// Returns the parsed file header.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Returns the file class.
    #[must_use]
    pub fn class(&self) -> Class {
        self.header.ident.class
    }

    /// Returns the byte order of the file.
    #[must_use]
    pub fn endian(&self) -> Endian {
        self.header.ident.endian
    }

    /// Returns the virtual address of the entry point.
    #[must_use]
    pub fn entry_point(&self) -> u64 {
        self.header.e_entry
    }

    /// Returns the buffer this file was parsed from.
    #[must_use]
    pub fn raw_data(&self) -> &'a [u8] {
        self.data
    }

    /// All sections in table order, starting with the null section.
    #[must_use]
    pub fn sections(&self) -> &[Section<'a>] {
        &self.sections
    }

    /// All segments in table order.
    #[must_use]
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Returns the first section named `name`.
    #[must_use]
    pub fn section_by_name(&self, name: &str) -> Option<&Section<'a>> {
        self.sections
            .iter()
            .find(|s| s.name_bytes() == name.as_bytes())
    }

    /// Returns the section at `index`, or `None` past the end of the table.
    #[must_use]
    pub fn section_at(&self, index: usize) -> Option<&Section<'a>> {
        self.sections.get(index)
    }

    /// Returns the segment at `index`, or `None` past the end of the table.
    #[must_use]
    pub fn segment_at(&self, index: usize) -> Option<&Segment<'a>> {
        self.segments.get(index)
    }

    /// Sections of type `ty`, in table order.
    pub fn sections_by_type(&self, ty: SectionType) -> impl Iterator<Item = &Section<'a>> {
        self.sections.iter().filter(move |s| s.section_type() == ty)
    }

    /// Segments of type `ty`, in table order.
    pub fn segments_by_type(&self, ty: SegmentType) -> impl Iterator<Item = &Segment<'a>> {
        self.segments.iter().filter(move |s| s.segment_type() == ty)
    }

    /// Sections whose flags are exactly `flags`.
    ///
    /// `ALLOC` alone does not match a section flagged `ALLOC | EXECINSTR`;
    /// use [`sections_with_flags`](Self::sections_with_flags) for a mask test.
    pub fn sections_by_flags(&self, flags: SectionFlags) -> impl Iterator<Item = &Section<'a>> {
        self.sections.iter().filter(move |s| s.flags() == flags)
    }

    /// Sections that have every bit of `flags` set.
    pub fn sections_with_flags(&self, flags: SectionFlags) -> impl Iterator<Item = &Section<'a>> {
        self.sections.iter().filter(move |s| s.flags().contains(flags))
    }

    /// Segments whose flags are exactly `flags`.
    pub fn segments_by_flags(&self, flags: SegmentFlags) -> impl Iterator<Item = &Segment<'a>> {
        self.segments.iter().filter(move |s| s.flags() == flags)
    }

    /// Segments that have every bit of `flags` set.
    pub fn segments_with_flags(&self, flags: SegmentFlags) -> impl Iterator<Item = &Segment<'a>> {
        self.segments.iter().filter(move |s| s.flags().contains(flags))
    }

    /// Returns an iterator over `PT_LOAD` segments.
    ///
    /// Each segment's [`data`](Segment::data) is the file-backed portion; a
    /// loader zero-fills the rest up to [`memsz`](Segment::memsz).
    pub fn load_segments(&self) -> impl Iterator<Item = &Segment<'a>> {
        self.segments_by_type(SegmentType::LOAD)
    }

    /// The section header string table, if the file names its sections.
    #[must_use]
    pub fn shstrtab(&self) -> Option<&Section<'a>> {
        match self.header.e_shstrndx {
            SHN_UNDEF => None,
            SHN_XINDEX => {
                let link = self.sections.first()?.header.sh_link;
                self.sections.get(usize::try_from(link).ok()?)
            }
            index => self.sections.get(usize::from(index)),
        }
    }

    /// Wraps a section's content as a string table.
    ///
    /// The section type is not checked.
    #[must_use]
    pub fn string_table(&self, section: &Section<'a>) -> StringTable<'a> {
        StringTable::new(section.data())
    }
}
