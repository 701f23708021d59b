use std::path::PathBuf;

use clap::Parser;
use fitsimage::transform::mean_excluding_borders;
use fitsimage_tools::{main_with, open_image, parse_args, ToolResult};

/// Mean pixel value, ignoring prescan and postscan columns.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// FITS image to measure
    file: PathBuf,

    /// Leading columns of each row to exclude
    #[arg(long, default_value_t = 0)]
    prescan: usize,

    /// Trailing columns of each row to exclude
    #[arg(long, default_value_t = 0)]
    postscan: usize,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let (file, width, _) = open_image(&args.file)?;
    let pixels = file.read_image::<f64>()?;
    let mean = mean_excluding_borders(&pixels, width, args.prescan, args.postscan)?;
    Ok(format!("{mean}\n"))
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
