//! ELF inspection tool.
//!
//! Reads one file, parses it with `elfview`, and prints the selected header
//! blocks and tables in a `readelf`-like layout.

mod cli;
mod logger;
mod print;

use anyhow::{Context, Result, bail};
use clap::Parser;
use elfview::ElfFile;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    logger::init(logger::Verbosity::from_flags(cli.quiet, cli.verbose));

    let data = std::fs::read(&cli.file)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    log::debug!("read {} bytes from {}", data.len(), cli.file.display());

    let elf = ElfFile::parse(&data)
        .with_context(|| format!("failed to parse {}", cli.file.display()))?;

    print!("{}", render(&cli, &elf)?);
    Ok(())
}

/// Renders every block the command line selected, in `readelf` order.
fn render(cli: &cli::Cli, elf: &ElfFile<'_>) -> Result<String> {
    let selection = cli.selection();
    let mut blocks = Vec::new();

    if selection.file_header {
        let mut out = String::new();
        print::file_header(&mut out, elf)?;
        blocks.push(out);
    }
    if selection.sections {
        if elf.shstrtab().is_none() && !elf.sections().is_empty() {
            log::warn!("no section name string table; names are empty");
        }
        let mut out = String::new();
        print::section_table(&mut out, elf, cli.type_filter)?;
        blocks.push(out);
    }
    if selection.segments {
        let mut out = String::new();
        print::segment_table(&mut out, elf, cli.type_filter)?;
        blocks.push(out);
    }
    if let Some(name) = &cli.hex_dump {
        let Some(section) = elf.section_by_name(name) else {
            bail!("section '{name}' was not found");
        };
        log::debug!("dumping section {} ({name})", section.index());
        let mut out = String::new();
        print::hex_dump(&mut out, name, section.header.sh_addr, section.data())?;
        blocks.push(out);
    }

    Ok(blocks.join("\n"))
}
