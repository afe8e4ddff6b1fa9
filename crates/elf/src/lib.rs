//! Zero-copy ELF parser.
//!
//! Parses ELF32 and ELF64 files of either byte order from a raw byte slice.
//! Headers are normalized to 64-bit fields, section names are resolved from
//! the section header string table, and every section and segment borrows
//! its content from the input buffer after a bounds check. Reads are safe
//! field extractions; nothing here panics on malformed input.
//!
//! # Usage
//!
//! ```
//! use elfview::{ElfFile, SectionFlags};
//!
//! fn list_code(data: &[u8]) {
//!     let elf = ElfFile::parse(data).expect("valid ELF");
//!     for section in elf.sections_with_flags(SectionFlags::EXECINSTR) {
//!         let _ = (section.name(), section.data());
//!     }
//!     for seg in elf.load_segments() {
//!         // Map seg.data() at seg.vaddr(), zero-fill to seg.memsz()
//!         let _ = seg;
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod error;
pub mod file;
pub mod header;
pub mod ident;
pub mod section;
pub mod segment;

#[cfg(test)]
mod testutil;

pub use error::ElfError;
pub use file::ElfFile;
pub use header::{ElfType, FileHeader, Machine};
pub use ident::{Class, Endian, Ident};
pub use section::{Section, SectionFlags, SectionHeader, SectionType, StringTable};
pub use segment::{ProgramHeader, Segment, SegmentFlags, SegmentType};
