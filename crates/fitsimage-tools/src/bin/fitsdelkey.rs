use std::path::PathBuf;

use clap::Parser;
use fitsimage::{ImageFile, OpenMode};
use fitsimage_tools::{main_with, parse_args, ToolResult};

/// Delete every card carrying one of the given keywords.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// FITS file to edit in place
    file: PathBuf,

    /// Keywords to purge
    #[arg(required = true)]
    keys: Vec<String>,
}

fn run(args: &[String]) -> ToolResult<String> {
    let args: Args = parse_args(env!("CARGO_BIN_NAME"), args)?;
    let mut file = ImageFile::open(&args.file, OpenMode::ReadWrite)?;

    let mut out = String::new();
    for key in &args.keys {
        let removed = file.delete_all(key)?;
        out.push_str(&format!("{}: removed {removed}\n", key.to_ascii_uppercase()));
    }
    file.close()?;
    Ok(out)
}

fn main() {
    main_with(env!("CARGO_BIN_NAME"), run);
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsimage::header::Card;
    use fitsimage::{PixelType, Value};

    fn fixture(dir: &std::path::Path) -> String {
        let path = dir.join("in.fits");
        let mut f = ImageFile::open(&path, OpenMode::Create).unwrap();
        f.create_image(PixelType::U8, 1, 1).unwrap();
        f.write_keyword("OBJECT", "M31", None).unwrap();
        f.write_keyword("GAIN", 1.5, None).unwrap();
        f.close().unwrap();

        // Duplicate keywords can only come from files written elsewhere.
        let mut bytes = std::fs::read(&path).unwrap();
        let dup = Card::new("GAIN", Value::Float(2.5), None).unwrap().to_bytes();
        let end = bytes.chunks_exact(80).position(|c| c.starts_with(b"END ")).unwrap();
        bytes[end * 80..(end + 1) * 80].copy_from_slice(&dup);
        bytes[(end + 1) * 80..(end + 1) * 80 + 3].copy_from_slice(b"END");
        std::fs::write(&path, bytes).unwrap();
        path.to_str().unwrap().to_string()
    }

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn purges_all_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(dir.path());
        let out = run(&argv(&[&path, "gain", "OBJECT", "MISSING"])).unwrap();
        assert_eq!(out, "GAIN: removed 2\nOBJECT: removed 1\nMISSING: removed 0\n");

        let f = ImageFile::open(&path, OpenMode::ReadOnly).unwrap();
        assert!(f.header().find("GAIN").is_none());
        assert!(f.header().find("OBJECT").is_none());
        assert_eq!(f.read_image::<u8>().unwrap(), [0]);
    }

    #[test]
    fn structural_keywords_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(dir.path());
        assert_eq!(run(&argv(&[&path, "NAXIS"])).unwrap_err().exit_code(), 8);
    }

    #[test]
    fn requires_a_keyword() {
        assert_eq!(run(&argv(&["x.fits"])).unwrap_err().exit_code(), 1);
    }
}
