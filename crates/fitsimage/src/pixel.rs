//! Logical pixel types and the BZERO/BSCALE pixel codec.
//!
//! FITS stores samples big-endian in one of six physical encodings. The
//! logical value of a sample is `physical * BSCALE + BZERO`; this is how an
//! unsigned 16-bit image lives inside signed 16-bit storage (BZERO = 32768).
//! Decoding and encoding here always go through that transform, with an
//! exact integer path whenever the scaling is a pure integer offset.

use std::fmt;
use std::str::FromStr;

use bytemuck::pod_collect_to_vec;

use crate::descriptor::{Bitpix, ImageDescriptor};

/// Pixel type as declared by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    I64,
    F32,
    F64,
}

impl PixelType {
    pub const ALL: [PixelType; 9] = [
        PixelType::U8,
        PixelType::I8,
        PixelType::I16,
        PixelType::U16,
        PixelType::I32,
        PixelType::U32,
        PixelType::I64,
        PixelType::F32,
        PixelType::F64,
    ];

    /// Physical storage used for this logical type.
    pub fn storage(self) -> Bitpix {
        match self {
            PixelType::U8 | PixelType::I8 => Bitpix::U8,
            PixelType::I16 | PixelType::U16 => Bitpix::I16,
            PixelType::I32 | PixelType::U32 => Bitpix::I32,
            PixelType::I64 => Bitpix::I64,
            PixelType::F32 => Bitpix::F32,
            PixelType::F64 => Bitpix::F64,
        }
    }

    /// Scaling that maps the storage range onto this type's range.
    pub fn canonical_scaling(self) -> Scaling {
        let bzero = match self {
            PixelType::I8 => -128.0,
            PixelType::U16 => 32768.0,
            PixelType::U32 => 2147483648.0,
            _ => 0.0,
        };
        Scaling { bscale: 1.0, bzero }
    }

    pub fn is_float(self) -> bool {
        matches!(self, PixelType::F32 | PixelType::F64)
    }

    /// The logical type whose storage and canonical scaling match `desc`,
    /// if any.
    pub fn from_descriptor(desc: &ImageDescriptor) -> Option<PixelType> {
        PixelType::ALL.into_iter().find(|t| {
            t.storage() == desc.bitpix && t.canonical_scaling() == Scaling::of(desc)
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelType::U8 => "u8",
            PixelType::I8 => "i8",
            PixelType::I16 => "i16",
            PixelType::U16 => "u16",
            PixelType::I32 => "i32",
            PixelType::U32 => "u32",
            PixelType::I64 => "i64",
            PixelType::F32 => "f32",
            PixelType::F64 => "f64",
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        PixelType::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| format!("unknown pixel type '{s}' (expected one of u8, i8, i16, u16, i32, u32, i64, f32, f64)"))
    }
}

/// Linear transform from physical samples to logical values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub bscale: f64,
    pub bzero: f64,
}

impl Scaling {
    pub const IDENTITY: Scaling = Scaling {
        bscale: 1.0,
        bzero: 0.0,
    };

    pub fn of(desc: &ImageDescriptor) -> Scaling {
        Scaling {
            bscale: desc.bscale,
            bzero: desc.bzero,
        }
    }

    /// The BZERO offset as an integer, when the transform is `physical + n`.
    fn integer_offset(self) -> Option<i64> {
        let exact = self.bscale == 1.0
            && self.bzero.fract() == 0.0
            && self.bzero.abs() < 9.2e18;
        exact.then_some(self.bzero as i64)
    }
}

/// A Rust numeric type usable as a logical pixel.
pub trait Pixel: Copy + Default + PartialOrd + fmt::Debug + 'static {
    const TYPE: PixelType;

    /// Convert with rounding, saturating at the type's range.
    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
    /// Convert, saturating at the type's range.
    fn from_i64(v: i64) -> Self;
    fn to_i64(self) -> i64;
}

macro_rules! impl_int_pixel {
    ($t:ty, $kind:expr) => {
        impl Pixel for $t {
            const TYPE: PixelType = $kind;

            fn from_f64(v: f64) -> Self {
                v.round() as $t
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_i64(v: i64) -> Self {
                v.clamp(<$t>::MIN as i64, <$t>::MAX as i64) as $t
            }

            fn to_i64(self) -> i64 {
                self as i64
            }
        }
    };
}

impl_int_pixel!(u8, PixelType::U8);
impl_int_pixel!(i8, PixelType::I8);
impl_int_pixel!(i16, PixelType::I16);
impl_int_pixel!(u16, PixelType::U16);
impl_int_pixel!(i32, PixelType::I32);
impl_int_pixel!(u32, PixelType::U32);
impl_int_pixel!(i64, PixelType::I64);

macro_rules! impl_float_pixel {
    ($t:ty, $kind:expr) => {
        impl Pixel for $t {
            const TYPE: PixelType = $kind;

            fn from_f64(v: f64) -> Self {
                v as $t
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_i64(v: i64) -> Self {
                v as $t
            }

            fn to_i64(self) -> i64 {
                self.round() as i64
            }
        }
    };
}

impl_float_pixel!(f32, PixelType::F32);
impl_float_pixel!(f64, PixelType::F64);

/// Physical samples of one storage type, decoded to native endianness.
enum Physical {
    Int(Vec<i64>),
    Real(Vec<f64>),
}

fn decode_physical(raw: &[u8], bitpix: Bitpix) -> Physical {
    match bitpix {
        Bitpix::U8 => Physical::Int(raw.iter().map(|&b| b as i64).collect()),
        Bitpix::I16 => {
            let v: Vec<i16> = pod_collect_to_vec(raw);
            Physical::Int(v.into_iter().map(|p| i16::from_be(p) as i64).collect())
        }
        Bitpix::I32 => {
            let v: Vec<i32> = pod_collect_to_vec(raw);
            Physical::Int(v.into_iter().map(|p| i32::from_be(p) as i64).collect())
        }
        Bitpix::I64 => {
            let v: Vec<i64> = pod_collect_to_vec(raw);
            Physical::Int(v.into_iter().map(i64::from_be).collect())
        }
        Bitpix::F32 => {
            let v: Vec<u32> = pod_collect_to_vec(raw);
            Physical::Real(
                v.into_iter()
                    .map(|p| f32::from_bits(u32::from_be(p)) as f64)
                    .collect(),
            )
        }
        Bitpix::F64 => {
            let v: Vec<u64> = pod_collect_to_vec(raw);
            Physical::Real(v.into_iter().map(|p| f64::from_bits(u64::from_be(p))).collect())
        }
    }
}

/// Decode big-endian storage bytes into logical values of type `T`.
///
/// `raw.len()` must be a multiple of the storage size; trailing bytes of a
/// partial sample are ignored.
pub fn decode<T: Pixel>(raw: &[u8], bitpix: Bitpix, scaling: Scaling) -> Vec<T> {
    let whole = raw.len() - raw.len() % bitpix.bytes_per_pixel();
    let raw = &raw[..whole];
    match (decode_physical(raw, bitpix), scaling.integer_offset()) {
        (Physical::Int(samples), Some(offset)) => samples
            .into_iter()
            .map(|p| T::from_i64(saturating_i64(p as i128 + offset as i128)))
            .collect(),
        (Physical::Int(samples), None) => samples
            .into_iter()
            .map(|p| T::from_f64(p as f64 * scaling.bscale + scaling.bzero))
            .collect(),
        (Physical::Real(samples), _) => samples
            .into_iter()
            .map(|p| T::from_f64(p * scaling.bscale + scaling.bzero))
            .collect(),
    }
}

fn saturating_i64(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

/// Integer range representable by an integer storage type.
fn storage_range(bitpix: Bitpix) -> (i64, i64) {
    match bitpix {
        Bitpix::U8 => (0, u8::MAX as i64),
        Bitpix::I16 => (i16::MIN as i64, i16::MAX as i64),
        Bitpix::I32 => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    }
}

/// Encode logical values into big-endian storage bytes.
///
/// Integer storage is rounded and saturated; `out` must hold exactly
/// `pixels.len() * bitpix.bytes_per_pixel()` bytes.
pub fn encode<T: Pixel>(pixels: &[T], bitpix: Bitpix, scaling: Scaling, out: &mut [u8]) {
    let bpp = bitpix.bytes_per_pixel();
    assert_eq!(out.len(), pixels.len() * bpp, "output length must match pixel count");

    let offset = scaling.integer_offset().filter(|_| !T::TYPE.is_float());
    let (lo, hi) = storage_range(bitpix);
    let unscale = |v: T| (v.to_f64() - scaling.bzero) / scaling.bscale;

    for (chunk, &v) in out.chunks_exact_mut(bpp).zip(pixels) {
        if bitpix.is_float() {
            let p = unscale(v);
            match bitpix {
                Bitpix::F32 => chunk.copy_from_slice(&(p as f32).to_be_bytes()),
                _ => chunk.copy_from_slice(&p.to_be_bytes()),
            }
            continue;
        }
        let p = match offset {
            Some(off) => {
                let p = v.to_i64() as i128 - off as i128;
                p.clamp(lo as i128, hi as i128) as i64
            }
            None => {
                let p = unscale(v).round();
                if p.is_nan() {
                    0
                } else {
                    p.clamp(lo as f64, hi as f64) as i64
                }
            }
        };
        match bitpix {
            Bitpix::U8 => chunk[0] = p as u8,
            Bitpix::I16 => chunk.copy_from_slice(&(p as i16).to_be_bytes()),
            Bitpix::I32 => chunk.copy_from_slice(&(p as i32).to_be_bytes()),
            _ => chunk.copy_from_slice(&p.to_be_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_type_from_descriptor() {
        let desc = |bitpix, bzero| ImageDescriptor {
            bitpix,
            naxes: vec![1, 1],
            bscale: 1.0,
            bzero,
        };
        assert_eq!(PixelType::from_descriptor(&desc(Bitpix::I16, 32768.0)), Some(PixelType::U16));
        assert_eq!(PixelType::from_descriptor(&desc(Bitpix::I16, 0.0)), Some(PixelType::I16));
        assert_eq!(PixelType::from_descriptor(&desc(Bitpix::U8, -128.0)), Some(PixelType::I8));
        assert_eq!(PixelType::from_descriptor(&desc(Bitpix::F32, 0.0)), Some(PixelType::F32));
        assert_eq!(PixelType::from_descriptor(&desc(Bitpix::I16, 5.0)), None);
    }

    fn roundtrip<T: Pixel>(pixels: &[T], bitpix: Bitpix, scaling: Scaling) -> Vec<T> {
        let mut raw = vec![0u8; pixels.len() * bitpix.bytes_per_pixel()];
        encode(pixels, bitpix, scaling, &mut raw);
        decode(&raw, bitpix, scaling)
    }

    #[test]
    fn unsigned_16_stored_with_offset() {
        let scaling = PixelType::U16.canonical_scaling();
        let pixels: Vec<u16> = vec![0, 1, 32767, 32768, 65535];
        let mut raw = vec![0u8; 10];
        encode(&pixels, Bitpix::I16, scaling, &mut raw);
        assert_eq!(&raw[..2], &i16::MIN.to_be_bytes());
        assert_eq!(&raw[8..], &i16::MAX.to_be_bytes());
        assert_eq!(decode::<u16>(&raw, Bitpix::I16, scaling), pixels);
    }

    #[test]
    fn signed_16_roundtrip() {
        let pixels: Vec<i16> = vec![i16::MIN, -1, 0, 1, i16::MAX];
        assert_eq!(roundtrip(&pixels, Bitpix::I16, Scaling::IDENTITY), pixels);
    }

    #[test]
    fn reading_unsigned_storage_as_signed_saturates() {
        let scaling = PixelType::U16.canonical_scaling();
        let mut raw = vec![0u8; 4];
        encode(&[10u16, 60000], Bitpix::I16, scaling, &mut raw);
        let as_i16: Vec<i16> = decode(&raw, Bitpix::I16, scaling);
        assert_eq!(as_i16, vec![10, i16::MAX]);
    }

    #[test]
    fn writing_out_of_range_saturates() {
        let mut raw = vec![0u8; 4];
        encode(&[-5i32, 70000], Bitpix::I16, PixelType::U16.canonical_scaling(), &mut raw);
        let back: Vec<u16> = decode(&raw, Bitpix::I16, PixelType::U16.canonical_scaling());
        assert_eq!(back, vec![0, 65535]);
    }

    #[test]
    fn fractional_scaling_uses_float_path() {
        let scaling = Scaling {
            bscale: 0.5,
            bzero: 10.0,
        };
        let pixels = vec![10.0f64, 10.5, 20.0];
        assert_eq!(roundtrip(&pixels, Bitpix::I32, scaling), pixels);
    }

    #[test]
    fn float_storage_roundtrip() {
        let pixels = vec![-1.5f32, 0.0, 3.25, 1.0e10];
        assert_eq!(roundtrip(&pixels, Bitpix::F32, Scaling::IDENTITY), pixels);
        let pixels = vec![1.0e-300f64, -2.5];
        assert_eq!(roundtrip(&pixels, Bitpix::F64, Scaling::IDENTITY), pixels);
    }

    #[test]
    fn float_to_integer_rounds() {
        let mut raw = vec![0u8; 2];
        encode(&[1.6f64, -1.6], Bitpix::U8, Scaling::IDENTITY, &mut raw);
        assert_eq!(raw, vec![2, 0]);
    }

    #[test]
    fn signed_byte_type() {
        let scaling = PixelType::I8.canonical_scaling();
        let pixels: Vec<i8> = vec![-128, 0, 127];
        let mut raw = vec![0u8; 3];
        encode(&pixels, Bitpix::U8, scaling, &mut raw);
        assert_eq!(raw, vec![0, 128, 255]);
        assert_eq!(decode::<i8>(&raw, Bitpix::U8, scaling), pixels);
    }

    #[test]
    fn unsigned_32_roundtrip() {
        let pixels: Vec<u32> = vec![0, 1, u32::MAX];
        let scaling = PixelType::U32.canonical_scaling();
        assert_eq!(roundtrip(&pixels, Bitpix::I32, scaling), pixels);
    }

    #[test]
    fn i64_storage_exact() {
        let pixels: Vec<i64> = vec![i64::MIN, -1, i64::MAX];
        assert_eq!(roundtrip(&pixels, Bitpix::I64, Scaling::IDENTITY), pixels);
    }

    #[test]
    fn decode_ignores_partial_sample() {
        let raw = [0u8, 1, 0];
        assert_eq!(decode::<i16>(&raw, Bitpix::I16, Scaling::IDENTITY), vec![1]);
    }

    #[test]
    fn pixel_type_parsing() {
        assert_eq!("U16".parse::<PixelType>().unwrap(), PixelType::U16);
        assert_eq!("f32".parse::<PixelType>().unwrap(), PixelType::F32);
        assert!("u12".parse::<PixelType>().is_err());
        assert_eq!(PixelType::U16.storage(), Bitpix::I16);
        assert_eq!(PixelType::U16.to_string(), "u16");
    }
}
