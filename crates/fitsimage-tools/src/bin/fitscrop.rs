use std::path::{Path, PathBuf};

use clap::Parser;
use fitsimage::transform::{crop, Region};
use fitsimage::{ImageFile, Pixel, PixelType};
use fitsimage_tools::{main_with, open_image, parse_args, region, write_derived, Span, ToolResult};

/// Cut a rectangular region out of an image.
///
/// The output keeps the pixel type and the header cards of the input.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input FITS image
    input: PathBuf,

    /// Column range X0:X1 (0-based, end exclusive)
    #[arg(short = 'c', long)]
    columns: Span,

    /// Row range Y0:Y1 (0-based, end exclusive)
    #[arg(short = 'r', long)]
    rows: Span,

    /// Output FITS file
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(long)]
    clobber: bool,
}

fn crop_as<T: Pixel>(
    input: &ImageFile,
    width: usize,
    height: usize,
    region: &Region,
    pixel_type: PixelType,
    output: &Path,
    clobber: bool,
) -> ToolResult<()> {
    let pixels = input.read_image::<T>()?;
    let cut = crop(&pixels, width, height, region)?;
    write_derived(output, clobber, input, pixel_type, region.width(), region.height(), &cut)
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let (input, width, height) = open_image(&args.input)?;
    let region = region(Some(args.columns), Some(args.rows), width, height)?;

    // Images with non-standard scaling are written as f64.
    let desc = input.descriptor()?;
    let pixel_type = PixelType::from_descriptor(&desc).unwrap_or(PixelType::F64);
    if pixel_type.is_float() {
        crop_as::<f64>(&input, width, height, &region, pixel_type, &args.output, args.clobber)?;
    } else {
        crop_as::<i64>(&input, width, height, &region, pixel_type, &args.output, args.clobber)?;
    }
    Ok(format!(
        "{}x{} region written to {}\n",
        region.width(),
        region.height(),
        args.output.display()
    ))
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
