use std::path::PathBuf;

use clap::Parser;
use fitsimage::{ImageFile, OpenMode};
use fitsimage_tools::{main_with, parse_args, ToolResult};

/// Remove blank cards from the primary header.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// FITS file to edit in place
    file: PathBuf,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let mut file = ImageFile::open(&args.file, OpenMode::ReadWrite)?;
    let removed = file.remove_blank_cards()?;
    file.close()?;
    Ok(format!("removed {removed} blank card(s)\n"))
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
