use std::path::PathBuf;

use clap::Parser;
use fitsimage::{ImageFile, OpenMode, PixelType};
use fitsimage_tools::{main_with, parse_args, ToolResult};

/// Summarize the primary image of a FITS file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// List every header card
    #[arg(short, long)]
    verbose: bool,

    /// FITS file to inspect
    file: PathBuf,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let file = ImageFile::open(&args.file, OpenMode::ReadOnly)?;
    let desc = file.descriptor()?;

    let mut out = String::new();
    out.push_str(&format!("File: {}\n", args.file.display()));
    out.push_str(&format!("BITPIX: {}\n", desc.bitpix));
    out.push_str(&format!("NAXIS: {}\n", desc.naxis()));
    if desc.naxis() > 0 {
        let dims: Vec<String> = desc.naxes.iter().map(usize::to_string).collect();
        out.push_str(&format!("Dimensions: {}\n", dims.join(" x ")));
    }
    out.push_str(&format!("BZERO: {}\n", desc.bzero));
    out.push_str(&format!("BSCALE: {}\n", desc.bscale));
    if let Some(ty) = PixelType::from_descriptor(&desc) {
        out.push_str(&format!("Pixel type: {ty}\n"));
    }
    out.push_str(&format!("Data size: {} bytes\n", desc.data_byte_count()));
    if file.stored_data_len() < desc.data_byte_count() {
        out.push_str(&format!(
            "Warning: only {} data bytes stored\n",
            file.stored_data_len()
        ));
    }
    out.push_str(&format!("Cards: {}\n", file.header().len()));

    if args.verbose {
        out.push('\n');
        for card in file.header().iter() {
            let text = String::from_utf8_lossy(&card.to_bytes()).into_owned();
            out.push_str(text.trim_end());
            out.push('\n');
        }
        out.push_str("END\n");
    }
    Ok(out)
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
