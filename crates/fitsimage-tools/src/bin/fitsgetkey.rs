use std::path::PathBuf;

use clap::Parser;
use fitsimage::{ImageFile, KeyType, OpenMode};
use fitsimage_tools::{main_with, parse_args, ToolResult};

/// Print the value and comment of a header keyword.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// FITS file to read
    file: PathBuf,

    /// Keyword name (case-insensitive)
    key: String,

    /// Read the value as STRING, BOOLEAN, INT, DOUBLE or FIXDOUBLE
    #[arg(short = 't', long = "type")]
    key_type: Option<KeyType>,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let file = ImageFile::open(&args.file, OpenMode::ReadOnly)?;
    let kv = file.read_keyword_as(&args.key, args.key_type.unwrap_or(KeyType::String))?;
    Ok(match kv.comment {
        Some(comment) => format!("{} / {comment}\n", kv.value),
        None => format!("{}\n", kv.value),
    })
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
