//! Test-only builder for complete ELF images in any class and byte order.
//!
//! Layout: file header, program headers, segment payloads, section contents,
//! `.shstrtab`, then the section header table (8-byte aligned). Section 0 is
//! always the null section and `.shstrtab` is always the last section.

use crate::ident::{Class, ELF_MAGIC, ELFCLASS32, ELFCLASS64, ELFDATA2LSB, ELFDATA2MSB, Endian};

/// `SHT_STRTAB`.
const SHT_STRTAB: u32 = 3;
/// `SHT_NOBITS`.
const SHT_NOBITS: u32 = 8;

/// One section to be written by [`ImageBuilder`].
#[derive(Debug, Clone)]
pub(crate) struct SectionDef {
    pub name: &'static str,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub data: Vec<u8>,
    /// Declared size for `SHT_NOBITS` sections (which have no data).
    pub nobits_size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
}

/// One program header to be written by [`ImageBuilder`].
#[derive(Debug, Clone)]
pub(crate) struct SegmentDef {
    pub p_type: u32,
    pub flags: u32,
    pub vaddr: u64,
    pub paddr: u64,
    pub data: Vec<u8>,
    pub memsz: u64,
    pub align: u64,
}

/// Builds an ELF image byte by byte.
pub(crate) struct ImageBuilder {
    class: Class,
    endian: Endian,
    e_type: u16,
    machine: u16,
    entry: u64,
    flags: u32,
    sections: Vec<SectionDef>,
    segments: Vec<SegmentDef>,
}

/// A built image plus the positions needed to corrupt it in tests.
pub(crate) struct Image {
    pub bytes: Vec<u8>,
    pub class: Class,
    pub endian: Endian,
    pub phoff: u64,
    pub shoff: u64,
    /// Index of `.shstrtab` (0 if there are no sections).
    pub shstrndx: usize,
    /// File offset of `.shstrtab` content.
    pub shstrtab_offset: u64,
    /// File offset of each section's content, by section index.
    pub section_offsets: Vec<u64>,
    /// File offset of each segment's payload, by program header index.
    pub segment_offsets: Vec<u64>,
}

impl ImageBuilder {
    pub(crate) fn new(class: Class, endian: Endian) -> Self {
        Self {
            class,
            endian,
            e_type: 1,
            machine: 62,
            entry: 0,
            flags: 0,
            sections: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub(crate) fn e_type(mut self, e_type: u16) -> Self {
        self.e_type = e_type;
        self
    }

    pub(crate) fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub(crate) fn entry(mut self, entry: u64) -> Self {
        self.entry = entry;
        self
    }

    pub(crate) fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Add a section with file content.
    pub(crate) fn section(self, name: &'static str, sh_type: u32, flags: u64, data: &[u8]) -> Self {
        self.section_def(SectionDef {
            name,
            sh_type,
            flags,
            addr: 0,
            data: data.to_vec(),
            nobits_size: 0,
            link: 0,
            info: 0,
            addralign: 1,
            entsize: 0,
        })
    }

    /// Add an `SHT_NOBITS` section declaring `size` bytes.
    pub(crate) fn nobits(self, name: &'static str, flags: u64, size: u64) -> Self {
        self.section_def(SectionDef {
            name,
            sh_type: SHT_NOBITS,
            flags,
            addr: 0,
            data: Vec::new(),
            nobits_size: size,
            link: 0,
            info: 0,
            addralign: 8,
            entsize: 0,
        })
    }

    pub(crate) fn section_def(mut self, def: SectionDef) -> Self {
        self.sections.push(def);
        self
    }

    /// Add a program header whose payload is `data`.
    pub(crate) fn segment(self, p_type: u32, flags: u32, vaddr: u64, data: &[u8], memsz: u64) -> Self {
        self.segment_def(SegmentDef {
            p_type,
            flags,
            vaddr,
            paddr: vaddr,
            data: data.to_vec(),
            memsz,
            align: 0x1000,
        })
    }

    pub(crate) fn segment_def(mut self, def: SegmentDef) -> Self {
        self.segments.push(def);
        self
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn build(self) -> Image {
        let class = self.class;
        let ehdr_size = class.ehdr_size();
        let phdr_size = class.phdr_size();
        let shdr_size = class.shdr_size();

        let mut w = Writer {
            buf: vec![0u8; ehdr_size],
            class,
            endian: self.endian,
        };

        // Program headers, then payloads.
        let phoff = if self.segments.is_empty() { 0 } else { ehdr_size };
        w.buf.resize(ehdr_size + self.segments.len() * phdr_size, 0);
        let mut segment_offsets = Vec::new();
        for seg in &self.segments {
            segment_offsets.push(w.buf.len() as u64);
            w.buf.extend_from_slice(&seg.data);
        }

        // Section contents and the name string table.
        let mut shstrtab = vec![0u8];
        let mut name_offsets = vec![0u32];
        let mut section_offsets = vec![0u64];
        for sec in &self.sections {
            name_offsets.push(push_name(&mut shstrtab, sec.name));
            section_offsets.push(w.buf.len() as u64);
            w.buf.extend_from_slice(&sec.data);
        }

        let (shoff, shstrndx, shstrtab_offset) = if self.sections.is_empty() {
            (0, 0, 0)
        } else {
            let shstrndx = self.sections.len() + 1;
            name_offsets.push(push_name(&mut shstrtab, ".shstrtab"));
            let shstrtab_offset = w.buf.len() as u64;
            section_offsets.push(shstrtab_offset);
            w.buf.extend_from_slice(&shstrtab);
            while w.buf.len() % 8 != 0 {
                w.buf.push(0);
            }
            (w.buf.len(), shstrndx, shstrtab_offset)
        };

        // Section headers: null, user sections, .shstrtab.
        if !self.sections.is_empty() {
            let shstrtab_def = SectionDef {
                name: ".shstrtab",
                sh_type: SHT_STRTAB,
                flags: 0,
                addr: 0,
                data: shstrtab.clone(),
                nobits_size: 0,
                link: 0,
                info: 0,
                addralign: 1,
                entsize: 0,
            };
            let shnum = self.sections.len() + 2;
            w.buf.resize(shoff + shnum * shdr_size, 0);
            let all = self.sections.iter().chain(core::iter::once(&shstrtab_def));
            for (i, sec) in all.enumerate() {
                let index = i + 1;
                let size = if sec.sh_type == SHT_NOBITS {
                    sec.nobits_size
                } else {
                    sec.data.len() as u64
                };
                w.shdr(
                    shoff + index * shdr_size,
                    sec,
                    name_offsets[index],
                    section_offsets[index],
                    size,
                );
            }
        }

        for (i, seg) in self.segments.iter().enumerate() {
            w.phdr(phoff + i * phdr_size, seg, segment_offsets[i]);
        }

        // File header last, once every offset is known.
        w.buf[..4].copy_from_slice(&ELF_MAGIC);
        w.buf[4] = match class {
            Class::Elf32 => ELFCLASS32,
            Class::Elf64 => ELFCLASS64,
        };
        w.buf[5] = match self.endian {
            Endian::Little => ELFDATA2LSB,
            Endian::Big => ELFDATA2MSB,
        };
        w.buf[6] = 1;
        let shnum = if self.sections.is_empty() { 0 } else { self.sections.len() + 2 };
        let mut r = 16;
        r = w.put_u16(r, self.e_type);
        r = w.put_u16(r, self.machine);
        r = w.put_u32(r, 1);
        r = w.put_word(r, self.entry);
        r = w.put_word(r, phoff as u64);
        r = w.put_word(r, shoff as u64);
        r = w.put_u32(r, self.flags);
        r = w.put_u16(r, ehdr_size as u16);
        r = w.put_u16(r, phdr_size as u16);
        r = w.put_u16(r, self.segments.len() as u16);
        r = w.put_u16(r, shdr_size as u16);
        r = w.put_u16(r, shnum as u16);
        w.put_u16(r, shstrndx as u16);

        Image {
            bytes: w.buf,
            class,
            endian: self.endian,
            phoff: phoff as u64,
            shoff: shoff as u64,
            shstrndx,
            shstrtab_offset,
            section_offsets,
            segment_offsets,
        }
    }
}

fn push_name(table: &mut Vec<u8>, name: &str) -> u32 {
    let off = u32::try_from(table.len()).expect("string table fits in u32");
    table.extend_from_slice(name.as_bytes());
    table.push(0);
    off
}

struct Writer {
    buf: Vec<u8>,
    class: Class,
    endian: Endian,
}

impl Writer {
    fn put_u16(&mut self, at: usize, v: u16) -> usize {
        let b = match self.endian {
            Endian::Little => v.to_le_bytes(),
            Endian::Big => v.to_be_bytes(),
        };
        self.buf[at..at + 2].copy_from_slice(&b);
        at + 2
    }

    fn put_u32(&mut self, at: usize, v: u32) -> usize {
        let b = match self.endian {
            Endian::Little => v.to_le_bytes(),
            Endian::Big => v.to_be_bytes(),
        };
        self.buf[at..at + 4].copy_from_slice(&b);
        at + 4
    }

    fn put_u64(&mut self, at: usize, v: u64) -> usize {
        let b = match self.endian {
            Endian::Little => v.to_le_bytes(),
            Endian::Big => v.to_be_bytes(),
        };
        self.buf[at..at + 8].copy_from_slice(&b);
        at + 8
    }

    /// Write an address-sized field; ELF32 values are truncated to 32 bits.
    #[allow(clippy::cast_possible_truncation)]
    fn put_word(&mut self, at: usize, v: u64) -> usize {
        match self.class {
            Class::Elf32 => self.put_u32(at, v as u32),
            Class::Elf64 => self.put_u64(at, v),
        }
    }

    fn shdr(&mut self, at: usize, sec: &SectionDef, name: u32, offset: u64, size: u64) {
        let mut r = at;
        r = self.put_u32(r, name);
        r = self.put_u32(r, sec.sh_type);
        r = self.put_word(r, sec.flags);
        r = self.put_word(r, sec.addr);
        r = self.put_word(r, offset);
        r = self.put_word(r, size);
        r = self.put_u32(r, sec.link);
        r = self.put_u32(r, sec.info);
        r = self.put_word(r, sec.addralign);
        self.put_word(r, sec.entsize);
    }

    fn phdr(&mut self, at: usize, seg: &SegmentDef, offset: u64) {
        let filesz = seg.data.len() as u64;
        let mut r = at;
        r = self.put_u32(r, seg.p_type);
        match self.class {
            Class::Elf32 => {
                r = self.put_word(r, offset);
                r = self.put_word(r, seg.vaddr);
                r = self.put_word(r, seg.paddr);
                r = self.put_word(r, filesz);
                r = self.put_word(r, seg.memsz);
                r = self.put_u32(r, seg.flags);
                self.put_word(r, seg.align);
            }
            Class::Elf64 => {
                r = self.put_u32(r, seg.flags);
                r = self.put_word(r, offset);
                r = self.put_word(r, seg.vaddr);
                r = self.put_word(r, seg.paddr);
                r = self.put_word(r, filesz);
                r = self.put_word(r, seg.memsz);
                self.put_word(r, seg.align);
            }
        }
    }
}

impl Image {
    fn writer(&mut self) -> Writer {
        Writer {
            buf: core::mem::take(&mut self.bytes),
            class: self.class,
            endian: self.endian,
        }
    }

    fn patch(&mut self, f: impl FnOnce(&mut Writer)) {
        let mut w = self.writer();
        f(&mut w);
        self.bytes = w.buf;
    }

    fn is_64(&self) -> bool {
        self.class == Class::Elf64
    }

    /// File position of section header `index`.
    pub(crate) fn shdr_pos(&self, index: usize) -> usize {
        usize::try_from(self.shoff).expect("shoff fits") + index * self.class.shdr_size()
    }

    /// File position of program header `index`.
    pub(crate) fn phdr_pos(&self, index: usize) -> usize {
        usize::try_from(self.phoff).expect("phoff fits") + index * self.class.phdr_size()
    }

    pub(crate) fn set_phoff(&mut self, v: u64) {
        let at = if self.is_64() { 32 } else { 28 };
        self.patch(|w| {
            w.put_word(at, v);
        });
    }

    pub(crate) fn set_shoff(&mut self, v: u64) {
        let at = if self.is_64() { 40 } else { 32 };
        self.patch(|w| {
            w.put_word(at, v);
        });
    }

    pub(crate) fn set_phnum(&mut self, v: u16) {
        let at = if self.is_64() { 56 } else { 44 };
        self.patch(|w| {
            w.put_u16(at, v);
        });
    }

    pub(crate) fn set_shnum(&mut self, v: u16) {
        let at = if self.is_64() { 60 } else { 48 };
        self.patch(|w| {
            w.put_u16(at, v);
        });
    }

    pub(crate) fn set_shstrndx(&mut self, v: u16) {
        let at = if self.is_64() { 62 } else { 50 };
        self.patch(|w| {
            w.put_u16(at, v);
        });
    }

    pub(crate) fn set_section_name(&mut self, index: usize, v: u32) {
        let at = self.shdr_pos(index);
        self.patch(|w| {
            w.put_u32(at, v);
        });
    }

    pub(crate) fn set_section_offset(&mut self, index: usize, v: u64) {
        let at = self.shdr_pos(index) + if self.is_64() { 24 } else { 16 };
        self.patch(|w| {
            w.put_word(at, v);
        });
    }

    pub(crate) fn set_section_size(&mut self, index: usize, v: u64) {
        let at = self.shdr_pos(index) + if self.is_64() { 32 } else { 20 };
        self.patch(|w| {
            w.put_word(at, v);
        });
    }

    pub(crate) fn set_section_link(&mut self, index: usize, v: u32) {
        let at = self.shdr_pos(index) + if self.is_64() { 40 } else { 24 };
        self.patch(|w| {
            w.put_u32(at, v);
        });
    }

    pub(crate) fn set_segment_offset(&mut self, index: usize, v: u64) {
        let at = self.phdr_pos(index) + if self.is_64() { 8 } else { 4 };
        self.patch(|w| {
            w.put_word(at, v);
        });
    }

    pub(crate) fn set_segment_filesz(&mut self, index: usize, v: u64) {
        let at = self.phdr_pos(index) + if self.is_64() { 32 } else { 16 };
        self.patch(|w| {
            w.put_word(at, v);
        });
    }
}
