//! Command-line interface definitions for elfdump.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Display information about an ELF file.
#[derive(Parser)]
#[command(name = "elfdump", version, about, disable_help_flag = true)]
pub struct Cli {
    /// ELF file to inspect.
    pub file: PathBuf,

    /// Display the ELF file header.
    #[arg(long = "file-header", short = 'h')]
    pub file_header: bool,

    /// Display the section header table.
    #[arg(long, short = 'S')]
    pub sections: bool,

    /// Display the program header table.
    #[arg(long = "segments", visible_alias = "program-headers", short = 'l')]
    pub segments: bool,

    /// Equivalent to `-h -S -l` (the default when nothing is selected).
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Dump the contents of the named section as hex.
    #[arg(long = "hex-dump", short = 'x', value_name = "NAME")]
    pub hex_dump: Option<String>,

    /// Only list sections and segments with this type code (decimal or 0x hex).
    #[arg(long = "type", value_name = "N", value_parser = parse_type)]
    pub type_filter: Option<u32>,

    /// Only report errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log parser diagnostics to stderr (repeat for per-record tracing).
    #[arg(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

/// What to print, after applying the `--all` default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Print the file header.
    pub file_header: bool,
    /// Print the section table.
    pub sections: bool,
    /// Print the segment table.
    pub segments: bool,
}

impl Cli {
    /// Resolves the display flags. With no table selected and no hex dump
    /// requested, everything is shown.
    pub fn selection(&self) -> Selection {
        let none = !self.file_header && !self.sections && !self.segments;
        let all = self.all || (none && self.hex_dump.is_none());
        Selection {
            file_header: all || self.file_header,
            sections: all || self.sections,
            segments: all || self.segments,
        }
    }
}

/// Parses a type code written in decimal or `0x` hexadecimal.
fn parse_type(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid type code '{s}': {e}"))
}
