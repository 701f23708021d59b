use std::path::PathBuf;

use clap::Parser;
use fitsimage::transform::subtract_clamped;
use fitsimage::{Bitpix, ImageFile, OpenMode, PixelType};
use fitsimage_tools::{main_with, open_image, parse_args, write_derived, ToolResult};

/// Subtract a constant from every pixel, clamping results to 0..=65535.
///
/// The result is written as an unsigned 16-bit image, in place unless an
/// output file is given.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input FITS image
    input: PathBuf,

    /// Constant to subtract
    #[arg(short = 'v', long, allow_hyphen_values = true)]
    value: f64,

    /// Output FITS file; the input is modified in place when omitted
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(long)]
    clobber: bool,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;

    let report = match &args.output {
        Some(output) => {
            let (input, width, height) = open_image(&args.input)?;
            let (pixels, report) = subtract_clamped(&input.read_image::<f64>()?, args.value);
            write_derived(output, args.clobber, &input, PixelType::U16, width, height, &pixels)?;
            report
        }
        None => {
            let mut file = ImageFile::open(&args.input, OpenMode::ReadWrite)?;
            file.validate_simple_2d(Some(Bitpix::I16))?;
            let (pixels, report) = subtract_clamped(&file.read_image::<f64>()?, args.value);
            file.set_pixel_type(PixelType::U16)?;
            file.write_image(&pixels)?;
            file.close()?;
            report
        }
    };
    Ok(format!(
        "underflow: {}\noverflow: {}\n",
        report.underflow, report.overflow
    ))
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
