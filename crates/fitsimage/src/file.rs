//! The scalar-image accessor: one FITS file's primary HDU held in memory.
//!
//! An [`ImageFile`] owns the primary header, the primary data bytes and any
//! bytes that follow the primary HDU. Edits happen in memory and are written
//! back on [`ImageFile::flush`], [`ImageFile::close`] or, as a last resort,
//! when the handle is dropped.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::block::{pad_to_block, padded_byte_len, DATA_PAD_BYTE};
use crate::descriptor::{check_primary, describe, is_structural, structural_cards};
use crate::descriptor::{Bitpix, ImageDescriptor};
use crate::error::{Error, Result};
use crate::header::{Card, Header};
use crate::keytype::{FromValue, KeyType, KeywordValue};
use crate::pixel::{decode, encode, Pixel, PixelType, Scaling};
use crate::value::Value;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
    /// Create a new file; fails if the path exists.
    Create,
    /// Create a new file, replacing any existing one.
    Overwrite,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        self != OpenMode::ReadOnly
    }
}

const SCALING_KEYS: [&str; 2] = ["BZERO", "BSCALE"];

/// Keywords that determine how the data bytes are interpreted.
fn is_layout(name: &str) -> bool {
    is_structural(name) || SCALING_KEYS.iter().any(|k| k.eq_ignore_ascii_case(name.trim()))
}

/// Allocate an empty buffer able to hold `len` items without reallocating.
fn alloc_buffer<T>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::Allocation(len))?;
    Ok(buf)
}

fn minimal_header() -> Result<Header> {
    Ok(Header::from_cards(vec![
        Card::new("SIMPLE", Value::Logical(true), Some("conforms to FITS standard"))?,
        Card::new("BITPIX", Value::Integer(8), Some("bits per data value"))?,
        Card::new("NAXIS", Value::Integer(0), Some("number of axes"))?,
    ]))
}

fn scaling_value(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        Value::Integer(x as i64)
    } else {
        Value::Float(x)
    }
}

/// An open FITS image file.
#[derive(Debug)]
pub struct ImageFile {
    path: Option<PathBuf>,
    mode: OpenMode,
    header: Header,
    /// Primary data array without block padding. May be shorter than the
    /// header declares when the file on disk was truncated.
    data: Vec<u8>,
    /// Everything after the primary HDU, written back verbatim.
    trailing: Vec<u8>,
    /// Logical type declared through `create_image` or `set_pixel_type`.
    pixel_type: Option<PixelType>,
    dirty: bool,
    closed: bool,
}

impl ImageFile {
    /// Open or create the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<ImageFile> {
        let path = path.as_ref();
        let open_err = |source: std::io::Error| Error::Open {
            path: path.to_path_buf(),
            source,
        };

        let mut file = match mode {
            OpenMode::ReadOnly | OpenMode::ReadWrite => {
                if mode == OpenMode::ReadWrite {
                    OpenOptions::new().write(true).open(path).map_err(open_err)?;
                }
                let bytes = std::fs::read(path).map_err(open_err)?;
                let mut file = ImageFile::from_bytes(&bytes)?;
                file.mode = mode;
                file
            }
            OpenMode::Create | OpenMode::Overwrite => {
                let mut options = OpenOptions::new();
                options.write(true);
                if mode == OpenMode::Create {
                    options.create_new(true);
                } else {
                    options.create(true).truncate(true);
                }
                let mut handle = options.open(path).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::AlreadyExists {
                        Error::AlreadyExists(path.to_path_buf())
                    } else {
                        open_err(e)
                    }
                })?;
                let mut file = ImageFile::in_memory()?;
                handle
                    .write_all(&file.to_bytes())
                    .map_err(|source| Error::Flush {
                        path: path.to_path_buf(),
                        source,
                    })?;
                file.mode = mode;
                file.dirty = true;
                file
            }
        };
        file.path = Some(path.to_path_buf());
        log::debug!("opened {} ({:?}, {} cards)", path.display(), mode, file.header.len());
        Ok(file)
    }

    /// A writable handle with an empty primary HDU and no backing file.
    pub fn in_memory() -> Result<ImageFile> {
        Ok(ImageFile {
            path: None,
            mode: OpenMode::Create,
            header: minimal_header()?,
            data: Vec::new(),
            trailing: Vec::new(),
            pixel_type: None,
            dirty: false,
            closed: false,
        })
    }

    /// A writable handle over FITS bytes, with no backing file.
    pub fn from_bytes(bytes: &[u8]) -> Result<ImageFile> {
        let (header, header_len) = Header::parse(bytes)?;
        check_primary(&header)?;
        let rest = &bytes[header_len..];

        let (data, trailing) = match describe(&header) {
            Ok(desc) => {
                let len = desc.data_byte_count();
                let data = rest[..len.min(rest.len())].to_vec();
                let trailing = rest.get(padded_byte_len(len)..).unwrap_or_default().to_vec();
                (data, trailing)
            }
            Err(e) => {
                // The layout is unreadable; keep the bytes so the file
                // survives a rewrite and report the problem on access.
                log::debug!("cannot describe primary image: {e}");
                (rest.to_vec(), Vec::new())
            }
        };

        Ok(ImageFile {
            path: None,
            mode: OpenMode::ReadWrite,
            header,
            data,
            trailing,
            pixel_type: None,
            dirty: false,
            closed: false,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The pixel type declared on this handle, if any.
    pub fn pixel_type(&self) -> Option<PixelType> {
        self.pixel_type
    }

    /// Length in bytes of the stored primary data, before padding.
    pub fn stored_data_len(&self) -> usize {
        self.data.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Read("file handle is closed".into()));
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Write("file handle is closed".into()));
        }
        if !self.mode.is_writable() {
            return Err(Error::Write("file is opened read-only".into()));
        }
        Ok(())
    }

    pub fn descriptor(&self) -> Result<ImageDescriptor> {
        self.ensure_open()?;
        describe(&self.header)
    }

    /// Check that the primary HDU is a 2-D image, and of the given storage
    /// type when one is supplied.
    pub fn validate_simple_2d(&self, expected: Option<Bitpix>) -> Result<ImageDescriptor> {
        let desc = self.descriptor()?;
        if desc.naxis() != 2 {
            return Err(Error::UnsupportedShape(format!(
                "expected a 2-D image, found NAXIS = {}",
                desc.naxis()
            )));
        }
        if let Some(bitpix) = expected {
            if desc.bitpix != bitpix {
                return Err(Error::UnsupportedShape(format!(
                    "expected BITPIX = {bitpix}, found {}",
                    desc.bitpix
                )));
            }
        }
        Ok(desc)
    }

    /// `(NAXIS1, NAXIS2)`.
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        self.ensure_open()?;
        let axis = |name: &'static str| -> Result<usize> {
            let card = self.header.find(name).ok_or_else(|| Error::MissingKeyword(name.to_string()))?;
            card.value()
                .and_then(i64::from_value)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| Error::TypeMismatch {
                    keyword: name.to_string(),
                    expected: "a non-negative integer",
                })
        };
        Ok((axis("NAXIS1")?, axis("NAXIS2")?))
    }

    fn keyword_card(&self, name: &str) -> Result<&Card> {
        self.ensure_open()?;
        self.header
            .find(name)
            .ok_or_else(|| Error::KeywordNotFound(name.trim().to_ascii_uppercase()))
    }

    /// Read the first card named `name` as `T`.
    pub fn read_keyword<T: FromValue>(&self, name: &str) -> Result<KeywordValue<T>> {
        let card = self.keyword_card(name)?;
        let value = card
            .value()
            .and_then(T::from_value)
            .ok_or_else(|| Error::TypeMismatch {
                keyword: card.keyword_str().to_string(),
                expected: T::EXPECTED,
            })?;
        Ok(KeywordValue {
            value,
            comment: card.comment().map(str::to_string),
        })
    }

    /// Read the first card named `name`, coerced to the tagged type.
    pub fn read_keyword_as(&self, name: &str, ty: KeyType) -> Result<KeywordValue<Value>> {
        let card = self.keyword_card(name)?;
        let value = card
            .value()
            .and_then(|v| ty.coerce(v))
            .ok_or_else(|| Error::TypeMismatch {
                keyword: card.keyword_str().to_string(),
                expected: ty.expected(),
            })?;
        Ok(KeywordValue {
            value,
            comment: card.comment().map(str::to_string),
        })
    }

    /// Update the first card named `name`, or append one.
    ///
    /// A `None` comment keeps the comment of an updated card.
    pub fn write_keyword(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        comment: Option<&str>,
    ) -> Result<()> {
        self.ensure_writable()?;
        if is_structural(name) {
            return Err(Error::Write(format!(
                "keyword '{}' describes the data layout and cannot be set directly",
                name.trim().to_ascii_uppercase()
            )));
        }
        if self.pixel_type.is_some() && is_layout(name) {
            return Err(Error::Write(format!(
                "keyword '{}' is derived from the declared pixel type",
                name.trim().to_ascii_uppercase()
            )));
        }
        self.header.set(name, value.into(), comment)?;
        self.dirty = true;
        Ok(())
    }

    fn ensure_deletable(&self, name: &str) -> Result<()> {
        self.ensure_writable()?;
        if is_structural(name) {
            return Err(Error::Write(format!(
                "keyword '{}' describes the data layout and cannot be deleted",
                name.trim().to_ascii_uppercase()
            )));
        }
        Ok(())
    }

    /// Remove the first card named `name`. `Ok(false)` if there was none.
    pub fn delete_keyword(&mut self, name: &str) -> Result<bool> {
        self.ensure_deletable(name)?;
        let removed = self.header.remove_first(name);
        self.dirty |= removed;
        Ok(removed)
    }

    /// Remove every card named `name`, returning how many were removed.
    pub fn delete_all(&mut self, name: &str) -> Result<usize> {
        self.ensure_deletable(name)?;
        let removed = self.header.remove_all(name);
        self.dirty |= removed > 0;
        Ok(removed)
    }

    /// Remove every blank card, returning how many were removed.
    pub fn remove_blank_cards(&mut self) -> Result<usize> {
        self.ensure_writable()?;
        let removed = self.header.remove_blank();
        self.dirty |= removed > 0;
        Ok(removed)
    }

    /// Replace this header with the cards of `src`.
    ///
    /// If this file already holds an image, its layout keywords (SIMPLE,
    /// BITPIX, NAXIS, NAXISn, BZERO, BSCALE) are kept so the header still
    /// describes the stored data. A file without an image takes the layout
    /// of `src` along with a zero-filled data array.
    pub fn copy_header_from(&mut self, src: &ImageFile) -> Result<()> {
        self.ensure_writable()?;
        src.ensure_open()?;

        let has_image = self.descriptor().is_ok_and(|d| d.naxis() > 0);
        if has_image {
            let mut cards: Vec<Card> = self
                .header
                .iter()
                .filter(|c| is_layout(c.keyword_str()))
                .cloned()
                .collect();
            cards.extend(
                src.header
                    .iter()
                    .filter(|c| !is_layout(c.keyword_str()))
                    .cloned(),
            );
            self.header = Header::from_cards(cards);
        } else {
            self.header = src.header.clone();
            let desc = describe(&self.header)?;
            self.data = self.zeroed_data(desc.data_byte_count())?;
            self.pixel_type = None;
        }
        self.dirty = true;
        log::debug!("copied {} header cards", src.header.len());
        Ok(())
    }

    fn zeroed_data(&self, len: usize) -> Result<Vec<u8>> {
        let mut data = alloc_buffer::<u8>(len)?;
        data.resize(len, 0);
        Ok(data)
    }

    /// Index just past the leading run of layout cards.
    fn layout_end(&self) -> usize {
        self.header
            .iter()
            .position(|c| !is_layout(c.keyword_str()))
            .unwrap_or(self.header.len())
    }

    /// Write BZERO and BSCALE explicitly, right after the structural cards.
    fn assert_scaling(&mut self, scaling: Scaling) -> Result<()> {
        let entries = [
            ("BZERO", scaling.bzero, "physical = raw * BSCALE + BZERO"),
            ("BSCALE", scaling.bscale, "linear scaling factor"),
        ];
        for (name, x, comment) in entries {
            if self.header.position(name).is_some() {
                self.header.set(name, scaling_value(x), Some(comment))?;
            } else {
                let at = self.layout_end();
                self.header
                    .insert(at, Card::new(name, scaling_value(x), Some(comment))?);
            }
        }
        Ok(())
    }

    /// Initialize the primary HDU as a zero-filled 2-D image.
    ///
    /// Non-layout cards already in the header are kept after the new
    /// layout cards.
    pub fn create_image(&mut self, pixel_type: PixelType, width: usize, height: usize) -> Result<()> {
        self.ensure_writable()?;
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(pixel_type.storage().bytes_per_pixel()))
            .ok_or(Error::Allocation(usize::MAX))?;
        let data = self.zeroed_data(len)?;

        let mut cards = structural_cards(pixel_type.storage(), width, height)?;
        cards.extend(
            self.header
                .iter()
                .filter(|c| !is_layout(c.keyword_str()))
                .cloned(),
        );
        self.header = Header::from_cards(cards);
        self.assert_scaling(pixel_type.canonical_scaling())?;
        self.data = data;
        self.pixel_type = Some(pixel_type);
        self.dirty = true;
        log::debug!("created {pixel_type} image {width}x{height}");
        Ok(())
    }

    /// Declare a different logical type over the same storage.
    ///
    /// Only BZERO/BSCALE change; the data bytes are untouched, so logical
    /// values shift by the difference in offsets.
    pub fn set_pixel_type(&mut self, pixel_type: PixelType) -> Result<()> {
        self.ensure_writable()?;
        let desc = self.descriptor()?;
        if desc.bitpix != pixel_type.storage() {
            return Err(Error::UnsupportedShape(format!(
                "{pixel_type} needs BITPIX = {}, image has {}",
                pixel_type.storage(),
                desc.bitpix
            )));
        }
        self.assert_scaling(pixel_type.canonical_scaling())?;
        self.pixel_type = Some(pixel_type);
        self.dirty = true;
        Ok(())
    }

    /// Byte range of `count` pixels starting at 1-based `offset`.
    fn pixel_span(desc: &ImageDescriptor, offset: usize, count: usize) -> Option<(usize, usize)> {
        let start = offset.checked_sub(1)?;
        let end = start.checked_add(count)?;
        if end > desc.pixel_count() {
            return None;
        }
        let bpp = desc.bitpix.bytes_per_pixel();
        Some((start * bpp, end * bpp))
    }

    /// Read `count` logical pixels starting at the 1-based `offset` of the
    /// flattened row-major array.
    pub fn read_pixels<T: Pixel>(&self, offset: usize, count: usize) -> Result<Vec<T>> {
        let desc = self.descriptor()?;
        let (lo, hi) = Self::pixel_span(&desc, offset, count).ok_or_else(|| {
            Error::Read(format!(
                "pixels {offset}..{} are outside the image of {} pixels",
                offset.saturating_add(count),
                desc.pixel_count()
            ))
        })?;
        let raw = self.data.get(lo..hi).ok_or_else(|| {
            Error::Read(format!(
                "stored data holds {} bytes, image declares {}",
                self.data.len(),
                desc.data_byte_count()
            ))
        })?;
        let mut out = alloc_buffer::<T>(count)?;
        out.extend(decode::<T>(raw, desc.bitpix, Scaling::of(&desc)));
        Ok(out)
    }

    /// Read one 1-based row.
    pub fn read_row<T: Pixel>(&self, row: usize) -> Result<Vec<T>> {
        let desc = self.descriptor()?;
        if row == 0 || row > desc.height() {
            return Err(Error::Read(format!(
                "row {row} is outside 1..={}",
                desc.height()
            )));
        }
        self.read_pixels((row - 1) * desc.width() + 1, desc.width())
    }

    /// Read the whole image, row-major.
    pub fn read_image<T: Pixel>(&self) -> Result<Vec<T>> {
        let desc = self.descriptor()?;
        self.read_pixels(1, desc.pixel_count())
    }

    /// Write logical pixels starting at the 1-based `offset`, rounding and
    /// saturating to the storage type.
    pub fn write_pixels<T: Pixel>(&mut self, offset: usize, pixels: &[T]) -> Result<()> {
        self.ensure_writable()?;
        let desc = self.descriptor()?;
        if desc.naxis() == 0 {
            return Err(Error::Write("no image defined; create one first".into()));
        }
        let (lo, hi) = Self::pixel_span(&desc, offset, pixels.len()).ok_or_else(|| {
            Error::Write(format!(
                "pixels {offset}..{} are outside the image of {} pixels",
                offset.saturating_add(pixels.len()),
                desc.pixel_count()
            ))
        })?;

        let full = desc.data_byte_count();
        if self.data.len() < full {
            self.data
                .try_reserve_exact(full - self.data.len())
                .map_err(|_| Error::Allocation(desc.pixel_count()))?;
            self.data.resize(full, 0);
        }
        encode(pixels, desc.bitpix, Scaling::of(&desc), &mut self.data[lo..hi]);
        self.dirty = true;
        Ok(())
    }

    /// Write one 1-based row.
    pub fn write_row<T: Pixel>(&mut self, row: usize, pixels: &[T]) -> Result<()> {
        let desc = self.descriptor()?;
        if row == 0 || row > desc.height() || pixels.len() != desc.width() {
            return Err(Error::Write(format!(
                "row {row} of {} pixels does not fit a {}x{} image",
                pixels.len(),
                desc.width(),
                desc.height()
            )));
        }
        self.write_pixels((row - 1) * desc.width() + 1, pixels)
    }

    /// Write the whole image; `pixels` must hold exactly width × height samples.
    pub fn write_image<T: Pixel>(&mut self, pixels: &[T]) -> Result<()> {
        let desc = self.descriptor()?;
        if pixels.len() != desc.pixel_count() {
            return Err(Error::Write(format!(
                "buffer of {} pixels does not match image of {}",
                pixels.len(),
                desc.pixel_count()
            )));
        }
        self.write_pixels(1, pixels)
    }

    /// Serialize the file: header, padded data, then any trailing bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.header.serialize();
        if !self.data.is_empty() {
            out.extend_from_slice(&self.data);
            pad_to_block(&mut out, DATA_PAD_BYTE);
        }
        out.extend_from_slice(&self.trailing);
        out
    }

    /// Write pending changes to the backing file.
    ///
    /// A no-op for read-only, in-memory and unmodified handles.
    pub fn flush(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::Write("file handle is closed".into()));
        }
        if !self.mode.is_writable() || !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            std::fs::write(path, self.to_bytes()).map_err(|source| Error::Flush {
                path: path.clone(),
                source,
            })?;
            log::debug!("flushed {}", path.display());
        }
        self.dirty = false;
        Ok(())
    }

    /// Flush and release the handle. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.flush();
        self.closed = true;
        result
    }
}

impl Drop for ImageFile {
    fn drop(&mut self) {
        if self.closed || !self.dirty || !self.mode.is_writable() {
            return;
        }
        if let Err(e) = self.flush() {
            log::warn!("discarding unsaved changes: {e}");
        }
    }
}
