use std::path::PathBuf;

use clap::Parser;
use fitsimage::{ImageFile, KeyType, OpenMode};
use fitsimage_tools::{main_with, parse_args, ToolError, ToolResult};

/// Set a header keyword, updating the first existing card or appending one.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// FITS file to edit in place
    file: PathBuf,

    /// Keyword name
    key: String,

    /// Value type: STRING, BOOLEAN, INT, DOUBLE or FIXDOUBLE
    key_type: KeyType,

    /// Value text
    #[arg(allow_hyphen_values = true)]
    value: String,

    /// Comment to store with the value
    #[arg(short = 'm', long)]
    comment: Option<String>,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let value = args
        .key_type
        .parse_value(&args.value)
        .map_err(ToolError::Argument)?;

    let mut file = ImageFile::open(&args.file, OpenMode::ReadWrite)?;
    file.write_keyword(&args.key, value, args.comment.as_deref())?;
    file.close()?;
    log::info!("set {} in {}", args.key, args.file.display());
    Ok(String::new())
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}
