//! Text rendering of the parsed ELF model.
//!
//! The layout follows `readelf`: one block for the file header, one table
//! per header table, and `-x` style hex dumps.

use std::fmt::{self, Write};

use elfview::{
    Class, ElfFile, Section, SectionFlags, SectionType, Segment, SegmentFlags, SegmentType,
};

/// Width of the label column in the file header block.
const LABEL_WIDTH: usize = 35;

/// Bytes per hex dump line.
const DUMP_LINE: usize = 16;

fn field(out: &mut impl Write, label: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(out, "  {label:<width$}{value}", width = LABEL_WIDTH)
}

/// Hex digits needed for an address in this class.
fn addr_width(class: Class) -> usize {
    class.word_size() * 2
}

/// Renders the file header block.
pub fn file_header(out: &mut impl Write, elf: &ElfFile<'_>) -> fmt::Result {
    let hdr = elf.header();
    writeln!(out, "ELF Header:")?;
    write!(out, "  Magic:  ")?;
    for byte in hdr.e_ident {
        write!(out, " {byte:02x}")?;
    }
    writeln!(out)?;
    field(out, "Class:", hdr.ident.class)?;
    field(out, "Data:", hdr.ident.endian)?;
    field(out, "Version:", hdr.ident.version)?;
    field(out, "OS/ABI:", hdr.ident.os_abi)?;
    field(out, "ABI Version:", hdr.ident.abi_version)?;
    field(out, "Type:", hdr.e_type)?;
    field(out, "Machine:", hdr.e_machine)?;
    field(out, "Version:", format_args!("{:#x}", hdr.e_version))?;
    field(out, "Entry point address:", format_args!("{:#x}", hdr.e_entry))?;
    field(
        out,
        "Start of program headers:",
        format_args!("{} (bytes into file)", hdr.e_phoff),
    )?;
    field(
        out,
        "Start of section headers:",
        format_args!("{} (bytes into file)", hdr.e_shoff),
    )?;
    field(out, "Flags:", format_args!("{:#x}", hdr.e_flags))?;
    field(out, "Size of this header:", format_args!("{} (bytes)", hdr.e_ehsize))?;
    field(
        out,
        "Size of program headers:",
        format_args!("{} (bytes)", hdr.e_phentsize),
    )?;
    field(out, "Number of program headers:", hdr.e_phnum)?;
    field(
        out,
        "Size of section headers:",
        format_args!("{} (bytes)", hdr.e_shentsize),
    )?;
    field(out, "Number of section headers:", hdr.e_shnum)?;
    field(out, "Section header string table index:", hdr.e_shstrndx)
}

/// `readelf` flag letters for a section.
pub fn section_flag_letters(flags: SectionFlags) -> String {
    const LETTERS: [(SectionFlags, char); 12] = [
        (SectionFlags::WRITE, 'W'),
        (SectionFlags::ALLOC, 'A'),
        (SectionFlags::EXECINSTR, 'X'),
        (SectionFlags::MERGE, 'M'),
        (SectionFlags::STRINGS, 'S'),
        (SectionFlags::INFO_LINK, 'I'),
        (SectionFlags::LINK_ORDER, 'L'),
        (SectionFlags::OS_NONCONFORMING, 'O'),
        (SectionFlags::GROUP, 'G'),
        (SectionFlags::TLS, 'T'),
        (SectionFlags::COMPRESSED, 'C'),
        (SectionFlags::EXCLUDE, 'E'),
    ];
    let mut letters: String = LETTERS
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|&(_, letter)| letter)
        .collect();
    if flags.intersects(SectionFlags::MASKOS) {
        letters.push('o');
    }
    if flags.intersects(SectionFlags::MASKPROC.difference(SectionFlags::EXCLUDE)) {
        letters.push('p');
    }
    letters
}

/// `readelf` style `RWE` permission column for a segment.
pub fn segment_flag_string(flags: SegmentFlags) -> String {
    [
        (SegmentFlags::R, 'R'),
        (SegmentFlags::W, 'W'),
        (SegmentFlags::X, 'E'),
    ]
    .iter()
    .map(|&(flag, c)| if flags.contains(flag) { c } else { ' ' })
    .collect()
}

fn section_row(out: &mut impl Write, section: &Section<'_>, width: usize) -> fmt::Result {
    let h = &section.header;
    writeln!(
        out,
        "  [{:>2}] {:<17} {:<16} {:0width$x} {:08x} {:08x} {:02x} {:>3} {:>2} {:>3} {:>2}",
        section.index(),
        String::from_utf8_lossy(section.name_bytes()),
        h.sh_type.to_string(),
        h.sh_addr,
        h.sh_offset,
        h.sh_size,
        h.sh_entsize,
        section_flag_letters(h.sh_flags),
        h.sh_link,
        h.sh_info,
        h.sh_addralign,
    )
}

/// Renders the section header table, optionally restricted to one type.
pub fn section_table(
    out: &mut impl Write,
    elf: &ElfFile<'_>,
    type_filter: Option<u32>,
) -> fmt::Result {
    if elf.sections().is_empty() {
        return writeln!(out, "There are no sections in this file.");
    }
    let width = addr_width(elf.class());
    writeln!(out, "Section Headers:")?;
    writeln!(
        out,
        "  [Nr] {:<17} {:<16} {:<width$} {:<8} {:<8} ES Flg Lk Inf Al",
        "Name", "Type", "Address", "Off", "Size"
    )?;
    match type_filter {
        Some(ty) => {
            for section in elf.sections_by_type(SectionType::new(ty)) {
                section_row(out, section, width)?;
            }
        }
        None => {
            for section in elf.sections() {
                section_row(out, section, width)?;
            }
        }
    }
    writeln!(
        out,
        "Key to Flags:\n  W (write), A (alloc), X (execute), M (merge), S (strings), I (info),\n  \
         L (link order), O (extra OS processing required), G (group), T (TLS),\n  \
         C (compressed), o (OS specific), E (exclude), p (processor specific)"
    )
}

fn segment_row(out: &mut impl Write, segment: &Segment<'_>, width: usize) -> fmt::Result {
    let h = &segment.header;
    writeln!(
        out,
        "  {:<14} {:#08x} {:#0w$x} {:#0w$x} {:#08x} {:#08x} {} {:#x}",
        h.p_type.to_string(),
        h.p_offset,
        h.p_vaddr,
        h.p_paddr,
        h.p_filesz,
        h.p_memsz,
        segment_flag_string(h.p_flags),
        h.p_align,
        w = width + 2,
    )
}

/// Renders the program header table, optionally restricted to one type.
pub fn segment_table(
    out: &mut impl Write,
    elf: &ElfFile<'_>,
    type_filter: Option<u32>,
) -> fmt::Result {
    if elf.segments().is_empty() {
        return writeln!(out, "There are no program headers in this file.");
    }
    let width = addr_width(elf.class());
    writeln!(out, "Program Headers:")?;
    writeln!(
        out,
        "  {:<14} {:<8} {:<w$} {:<w$} {:<8} {:<8} Flg Align",
        "Type",
        "Offset",
        "VirtAddr",
        "PhysAddr",
        "FileSiz",
        "MemSiz",
        w = width + 2,
    )?;
    match type_filter {
        Some(ty) => {
            for segment in elf.segments_by_type(SegmentType::new(ty)) {
                segment_row(out, segment, width)?;
            }
        }
        None => {
            for segment in elf.segments() {
                segment_row(out, segment, width)?;
            }
        }
    }
    Ok(())
}

/// Renders a `readelf -x` style dump of `data`, addressed from `addr`.
pub fn hex_dump(out: &mut impl Write, name: &str, addr: u64, data: &[u8]) -> fmt::Result {
    if data.is_empty() {
        return writeln!(out, "Section '{name}' has no data to dump.");
    }
    writeln!(out, "Hex dump of section '{name}':")?;
    let mut line_addr = addr;
    for line in data.chunks(DUMP_LINE) {
        write!(out, "  {line_addr:#010x} ")?;
        for i in 0..DUMP_LINE {
            match line.get(i) {
                Some(byte) => write!(out, "{byte:02x}")?,
                None => out.write_str("  ")?,
            }
            if i % 4 == 3 {
                out.write_char(' ')?;
            }
        }
        for &byte in line {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                char::from(byte)
            } else {
                '.'
            };
            out.write_char(c)?;
        }
        writeln!(out)?;
        line_addr = line_addr.wrapping_add(DUMP_LINE as u64);
    }
    Ok(())
}
