use std::path::PathBuf;

use clap::Parser;
use fitsimage::transform::to_unsigned;
use fitsimage::{Bitpix, ImageFile, OpenMode, PixelType};
use fitsimage_tools::{main_with, parse_args, require_pixel_type, write_derived, ToolResult};

/// Reinterpret a signed 16-bit image as unsigned by shifting every value
/// up by 32768.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input FITS image (BITPIX 16)
    input: PathBuf,

    /// Output FITS file; the input is modified in place when omitted
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    clobber: bool,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let mode = if args.output.is_some() {
        OpenMode::ReadOnly
    } else {
        OpenMode::ReadWrite
    };
    let mut file = ImageFile::open(&args.input, mode)?;
    let desc = file.validate_simple_2d(Some(Bitpix::I16))?;
    require_pixel_type(&desc, PixelType::I16)?;
    let unsigned = to_unsigned(&file.read_image::<i16>()?);

    if let Some(output) = &args.output {
        write_derived(
            output,
            args.clobber,
            &file,
            PixelType::U16,
            desc.width(),
            desc.height(),
            &unsigned,
        )?;
    } else {
        file.set_pixel_type(PixelType::U16)?;
        file.write_image(&unsigned)?;
        file.close()?;
    }
    Ok(String::new())
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
