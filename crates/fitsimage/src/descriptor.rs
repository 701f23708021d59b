//! Image shape and storage type derived from the mandatory primary keywords.

use std::fmt;

use crate::block::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::header::{Card, Header};
use crate::value::Value;

/// Physical pixel storage type declared by BITPIX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bitpix {
    U8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Bitpix {
    pub const ALL: [Bitpix; 6] = [
        Bitpix::U8,
        Bitpix::I16,
        Bitpix::I32,
        Bitpix::I64,
        Bitpix::F32,
        Bitpix::F64,
    ];

    /// The BITPIX keyword value.
    pub fn value(self) -> i64 {
        match self {
            Bitpix::U8 => 8,
            Bitpix::I16 => 16,
            Bitpix::I32 => 32,
            Bitpix::I64 => 64,
            Bitpix::F32 => -32,
            Bitpix::F64 => -64,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        (self.value().unsigned_abs() / 8) as usize
    }

    pub fn is_float(self) -> bool {
        matches!(self, Bitpix::F32 | Bitpix::F64)
    }
}

impl TryFrom<i64> for Bitpix {
    type Error = Error;

    fn try_from(v: i64) -> Result<Bitpix> {
        Bitpix::ALL
            .into_iter()
            .find(|b| b.value() == v)
            .ok_or(Error::InvalidBitpix(v))
    }
}

impl fmt::Display for Bitpix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Shape, storage type and linear scaling of a primary image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor {
    pub bitpix: Bitpix,
    /// NAXIS1, NAXIS2, ... in header order.
    pub naxes: Vec<usize>,
    /// BSCALE, 1.0 when absent.
    pub bscale: f64,
    /// BZERO, 0.0 when absent.
    pub bzero: f64,
}

impl ImageDescriptor {
    pub fn naxis(&self) -> usize {
        self.naxes.len()
    }

    /// NAXIS1, or 0 for a data-less header.
    pub fn width(&self) -> usize {
        self.naxes.first().copied().unwrap_or(0)
    }

    /// NAXIS2, or 1 for a one-dimensional image.
    pub fn height(&self) -> usize {
        self.naxes.get(1).copied().unwrap_or(1)
    }

    /// Number of samples in the data array.
    pub fn pixel_count(&self) -> usize {
        if self.naxes.is_empty() {
            return 0;
        }
        self.naxes.iter().product()
    }

    /// Unpadded size of the data array in bytes.
    pub fn data_byte_count(&self) -> usize {
        self.pixel_count() * self.bitpix.bytes_per_pixel()
    }
}

const STRUCTURAL: [&str; 4] = ["SIMPLE", "BITPIX", "NAXIS", "END"];

/// Returns `true` for keywords that describe the data layout and may only
/// be written through image creation.
pub fn is_structural(name: &str) -> bool {
    let name = name.trim().to_ascii_uppercase();
    if STRUCTURAL.contains(&name.as_str()) {
        return true;
    }
    name.strip_prefix("NAXIS")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

fn integer_keyword(header: &Header, name: &str) -> Result<i64> {
    match header.find(name).and_then(Card::value) {
        Some(Value::Integer(n)) => Ok(*n),
        Some(_) => Err(Error::InvalidHeader("structural keyword is not an integer")),
        None => Err(Error::MissingKeyword(name.to_string())),
    }
}

fn real_keyword(header: &Header, name: &str, default: f64) -> Result<f64> {
    match header.find(name).and_then(Card::value) {
        None => Ok(default),
        Some(v) => v.as_f64().ok_or_else(|| Error::TypeMismatch {
            keyword: name.to_string(),
            expected: "a number",
        }),
    }
}

/// Derive the image descriptor from a primary header.
pub fn describe(header: &Header) -> Result<ImageDescriptor> {
    let bitpix = Bitpix::try_from(integer_keyword(header, "BITPIX")?)?;
    let naxis = integer_keyword(header, "NAXIS")?;
    if !(0..=999).contains(&naxis) {
        return Err(Error::InvalidHeader("NAXIS out of range"));
    }

    let mut naxes = Vec::with_capacity(naxis as usize);
    let mut bytes = bitpix.bytes_per_pixel();
    for i in 1..=naxis {
        let len = integer_keyword(header, &format!("NAXIS{i}"))?;
        let len = usize::try_from(len).map_err(|_| Error::InvalidHeader("negative axis length"))?;
        bytes = bytes
            .checked_mul(len)
            .ok_or(Error::InvalidHeader("image size overflows"))?;
        naxes.push(len);
    }
    if bytes.checked_next_multiple_of(BLOCK_SIZE).is_none() {
        return Err(Error::InvalidHeader("image size overflows"));
    }

    Ok(ImageDescriptor {
        bitpix,
        naxes,
        bscale: real_keyword(header, "BSCALE", 1.0)?,
        bzero: real_keyword(header, "BZERO", 0.0)?,
    })
}

/// Check that the header opens a primary HDU (`SIMPLE = T` first).
pub fn check_primary(header: &Header) -> Result<()> {
    let first = header
        .cards()
        .first()
        .ok_or(Error::InvalidHeader("empty header"))?;
    if first.keyword_str() != "SIMPLE" {
        return Err(Error::InvalidHeader("first keyword is not SIMPLE"));
    }
    Ok(())
}

/// Mandatory cards for a two-dimensional primary image.
pub fn structural_cards(bitpix: Bitpix, width: usize, height: usize) -> Result<Vec<Card>> {
    Ok(vec![
        Card::new("SIMPLE", Value::Logical(true), Some("conforms to FITS standard"))?,
        Card::new("BITPIX", Value::Integer(bitpix.value()), Some("bits per data value"))?,
        Card::new("NAXIS", Value::Integer(2), Some("number of axes"))?,
        Card::new("NAXIS1", Value::Integer(width as i64), Some("width"))?,
        Card::new("NAXIS2", Value::Integer(height as i64), Some("height"))?,
    ])
}
