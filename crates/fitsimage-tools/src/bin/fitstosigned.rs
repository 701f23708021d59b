use std::path::PathBuf;

use clap::Parser;
use fitsimage::transform::to_signed;
use fitsimage::{Bitpix, ImageFile, OpenMode, PixelType};
use fitsimage_tools::{main_with, parse_args, require_pixel_type, write_derived, ToolResult};

/// Reinterpret an unsigned 16-bit image as signed by shifting every value
/// down by 32768.
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
    let mode = match args.output {
        Some(_) => OpenMode::ReadOnly,
        None => OpenMode::ReadWrite,
    };
    let mut file = ImageFile::open(&args.input, mode)?;
    let desc = file.validate_simple_2d(Some(Bitpix::I16))?;
    require_pixel_type(&desc, PixelType::U16)?;
    let signed = to_signed(&file.read_image::<u16>()?);

    match &args.output {
        Some(output) => write_derived(
            output,
            args.clobber,
            &file,
            PixelType::I16,
            desc.width(),
            desc.height(),
            &signed,
        )?,
        None => {
            file.set_pixel_type(PixelType::I16)?;
            file.write_image(&signed)?;
            file.close()?;
        }
    }
    Ok(String::new())
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
