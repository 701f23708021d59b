use std::path::PathBuf;

use clap::Parser;
use fitsimage_tools::{main_with, open_image, parse_args, region, Span, ToolResult};

/// Print logical pixel values, one comma-separated line per row.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// FITS image to read
    file: PathBuf,

    /// Column range X0:X1 (0-based, end exclusive); all columns by default
    #[arg(short = 'c', long)]
    columns: Option<Span>,

    /// Row range Y0:Y1 (0-based, end exclusive); all rows by default
    #[arg(short = 'r', long)]
    rows: Option<Span>,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let (file, width, height) = open_image(&args.file)?;
    let region = region(args.columns, args.rows, width, height)?;

    let mut out = String::new();
    for y in region.y.clone() {
        let row = file.read_row::<f64>(y + 1)?;
        let values: Vec<String> = row[region.x.clone()].iter().map(f64::to_string).collect();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    Ok(out)
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
