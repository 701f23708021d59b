use std::path::PathBuf;

use clap::Parser;
use fitsimage::{ImageFile, OpenMode};
use fitsimage_tools::{main_with, parse_args, ToolResult};

/// Copy the header cards of one FITS file into another.
///
/// The destination keeps its own SIMPLE, BITPIX, NAXIS, NAXISn, BZERO and
/// BSCALE so its data is unchanged.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to copy the header from
    src: PathBuf,

    /// File whose header is replaced
    dst: PathBuf,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let src = ImageFile::open(&args.src, OpenMode::ReadOnly)?;
    let mut dst = ImageFile::open(&args.dst, OpenMode::ReadWrite)?;
    dst.copy_header_from(&src)?;
    dst.close()?;
    Ok(String::new())
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
