use std::path::PathBuf;

use clap::Parser;
use fitsimage::transform::subtract_images_clamped;
use fitsimage::PixelType;
use fitsimage_tools::{main_with, open_image, parse_args, write_derived, ToolResult};

/// Subtract image B from image A pixel by pixel, clamping to 0..=65535.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Minuend image
    a: PathBuf,

    /// Subtrahend image, same dimensions as A
    b: PathBuf,

    /// Output FITS file (unsigned 16-bit, header taken from A)
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(long)]
    clobber: bool,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let (a, width, height) = open_image(&args.a)?;
    let (b, b_width, b_height) = open_image(&args.b)?;
    if (width, height) != (b_width, b_height) {
        return Err(fitsimage::Error::UnsupportedShape(format!(
            "{width}x{height} and {b_width}x{b_height} images cannot be subtracted"
        ))
        .into());
    }

    let (pixels, report) =
        subtract_images_clamped(&a.read_image::<f64>()?, &b.read_image::<f64>()?)?;
    write_derived(&args.output, args.clobber, &a, PixelType::U16, width, height, &pixels)?;
    Ok(format!(
        "underflow: {}\noverflow: {}\n",
        report.underflow, report.overflow
    ))
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
