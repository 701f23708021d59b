//! Shared plumbing for the `fits*` command-line tools: argument types,
//! error-to-exit-code mapping, logging setup and the output-file helpers
//! every image-producing tool goes through.

use std::fmt;
use std::path::Path;
use std::process;
use std::str::FromStr;

use clap::Parser;
use fitsimage::transform::Region;
use fitsimage::{ErrorKind, ImageDescriptor, ImageFile, OpenMode, Pixel, PixelType};
use thiserror::Error;

/// Failure of a tool run.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Help or version text was requested; not a failure.
    #[error("{0}")]
    Help(String),
    /// Bad command-line input.
    #[error("{0}")]
    Argument(String),
    #[error(transparent)]
    Image(#[from] fitsimage::Error),
}

impl ToolError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolError::Help(_) => 0,
            ToolError::Argument(_) => 1,
            ToolError::Image(e) => match e.kind() {
                ErrorKind::Open => 2,
                ErrorKind::UnsupportedShape => 3,
                ErrorKind::MissingKeyword => 4,
                ErrorKind::KeywordNotFound => 5,
                ErrorKind::TypeMismatch => 6,
                ErrorKind::Read => 7,
                ErrorKind::Write => 8,
                ErrorKind::Allocation => 9,
            },
        }
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Parse `args` (without the program name) into a clap argument struct.
pub fn parse_args<A: Parser>(name: &str, args: &[String]) -> ToolResult<A> {
    let argv = std::iter::once(name.to_string()).chain(args.iter().cloned());
    A::try_parse_from(argv).map_err(|e| {
        let text = e.render().to_string();
        match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                ToolError::Help(text)
            }
            _ => ToolError::Argument(text.trim_end().to_string()),
        }
    })
}

/// Initialize `env_logger` with a default level of `warn`.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}

/// Entry point shared by every tool binary.
pub fn main_with(name: &str, run: fn(&[String]) -> ToolResult<String>) {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => print!("{output}"),
        Err(ToolError::Help(text)) => print!("{text}"),
        Err(e) => {
            eprintln!("{name}: {e}");
            process::exit(e.exit_code());
        }
    }
}

/// A half-open `start:end` range of 0-based pixel indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl FromStr for Span {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| format!("range '{s}' must be in format 'start:end'"))?;
        let start = a
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid range start '{a}'"))?;
        let end = b
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid range end '{b}'"))?;
        if start >= end {
            return Err(format!("range '{s}' is empty (start must be less than end)"));
        }
        Ok(Span { start, end })
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Build a region from optional column and row spans, defaulting to the
/// whole image along an axis whose span is absent.
pub fn region(columns: Option<Span>, rows: Option<Span>, width: usize, height: usize) -> ToolResult<Region> {
    let x = columns.map_or(0..width, |s| s.start..s.end);
    let y = rows.map_or(0..height, |s| s.start..s.end);
    if x.end > width || y.end > height {
        return Err(ToolError::Argument(format!(
            "region {}:{} x {}:{} exceeds the {width}x{height} image",
            x.start, x.end, y.start, y.end
        )));
    }
    Ok(Region { x, y })
}

/// Open an input image read-only and check that it is 2-D.
pub fn open_image(path: &Path) -> ToolResult<(ImageFile, usize, usize)> {
    let file = ImageFile::open(path, OpenMode::ReadOnly)?;
    let desc = file.validate_simple_2d(None)?;
    let (width, height) = (desc.width(), desc.height());
    Ok((file, width, height))
}

/// Fail with `UnsupportedShape` unless the image's storage and scaling are
/// exactly those of `expected`.
pub fn require_pixel_type(desc: &ImageDescriptor, expected: PixelType) -> ToolResult<()> {
    match PixelType::from_descriptor(desc) {
        Some(ty) if ty == expected => Ok(()),
        found => Err(fitsimage::Error::UnsupportedShape(format!(
            "expected a {expected} image, found {}",
            found.map_or_else(
                || format!("BITPIX {} with BZERO {} BSCALE {}", desc.bitpix, desc.bzero, desc.bscale),
                |ty| ty.to_string()
            )
        ))
        .into()),
    }
}

/// Open a path for a new image, replacing an existing file only when
/// `clobber` is set.
pub fn create_output(path: &Path, clobber: bool) -> ToolResult<ImageFile> {
    let mode = if clobber {
        OpenMode::Overwrite
    } else {
        OpenMode::Create
    };
    Ok(ImageFile::open(path, mode)?)
}

/// Write `pixels` as a new `width` × `height` image at `path`, carrying over
/// the non-layout header cards of `template`.
pub fn write_derived<T: Pixel>(
    path: &Path,
    clobber: bool,
    template: &ImageFile,
    pixel_type: PixelType,
    width: usize,
    height: usize,
    pixels: &[T],
) -> ToolResult<()> {
    let mut out = create_output(path, clobber)?;
    out.create_image(pixel_type, width, height)?;
    out.copy_header_from(template)?;
    out.write_image(pixels)?;
    out.close()?;
    log::info!("wrote {width}x{height} {pixel_type} image to {}", path.display());
    Ok(())
}
