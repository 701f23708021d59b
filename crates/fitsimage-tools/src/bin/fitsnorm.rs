use std::path::PathBuf;

use clap::Parser;
use fitsimage::transform::normalize;
use fitsimage::PixelType;
use fitsimage_tools::{main_with, open_image, parse_args, write_derived, ToolResult};

/// Divide an image by its mean, writing a 32-bit float image.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input FITS image
    input: PathBuf,

    /// Output FITS file
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Overwrite the output file if it exists
    #[arg(long)]
    clobber: bool,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let (input, width, height) = open_image(&args.input)?;
    let (pixels, mean) = normalize(&input.read_image::<f64>()?)?;
    write_derived(&args.output, args.clobber, &input, PixelType::F32, width, height, &pixels)?;
    Ok(format!("mean: {mean}\n"))
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
