//! Read, edit and write simple two-dimensional FITS images.
//!
//! [`ImageFile`] is the entry point: it opens a file's primary HDU, exposes
//! typed keyword access and logical pixel I/O through BZERO/BSCALE, and
//! writes changes back on close. [`transform`] holds the buffer operations
//! the command-line tools compose.

pub mod block;
pub mod descriptor;
pub mod error;
pub mod file;
pub mod header;
pub mod keytype;
pub mod pixel;
pub mod transform;
pub mod value;

pub use block::{BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE};
pub use descriptor::{Bitpix, ImageDescriptor};
pub use error::{Error, ErrorKind, Result};
pub use file::{ImageFile, OpenMode};
pub use keytype::{FromValue, KeyType, KeywordValue};
pub use pixel::{Pixel, PixelType, Scaling};
pub use value::Value;
