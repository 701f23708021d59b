use std::path::PathBuf;

use clap::Parser;
use fitsimage::PixelType;
use fitsimage_tools::{create_output, main_with, parse_args, ToolError, ToolResult};

/// Create a new 2-D image filled with a constant.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Output FITS file
    output: PathBuf,

    /// Image width (NAXIS1)
    #[arg(short = 'c', long)]
    columns: usize,

    /// Image height (NAXIS2)
    #[arg(short = 'r', long)]
    rows: usize,

    /// Pixel type: u8, i8, i16, u16, i32, u32, i64, f32 or f64
    #[arg(short = 't', long = "type", default_value_t = PixelType::U16)]
    pixel_type: PixelType,

    /// Fill value
    #[arg(short = 'v', long, default_value_t = 0.0, allow_hyphen_values = true)]
    value: f64,

    /// Overwrite the output file if it exists
    #[arg(long)]
    clobber: bool,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    if args.columns == 0 || args.rows == 0 {
        return Err(ToolError::Argument("width and height must be positive".into()));
    }

    let mut file = create_output(&args.output, args.clobber)?;
    file.create_image(args.pixel_type, args.columns, args.rows)?;
    if args.value != 0.0 {
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(args.columns * args.rows)
            .map_err(|_| fitsimage::Error::Allocation(args.columns * args.rows))?;
        pixels.resize(args.columns * args.rows, args.value);
        file.write_image(&pixels)?;
    }
    file.close()?;
    Ok(String::new())
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
