//! Pixel-buffer transformations used by the tools. None of these touch a
//! file; they take and return row-major buffers.

use std::ops::Range;

use crate::error::{Error, Result};

/// Offset between the unsigned and signed 16-bit logical ranges.
pub const SIGN_SHIFT: i32 = 32768;

/// How many results fell outside `0..=65535` and were clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClampReport {
    pub underflow: usize,
    pub overflow: usize,
}

impl ClampReport {
    pub fn total(&self) -> usize {
        self.underflow + self.overflow
    }

    fn clamp(&mut self, v: f64) -> u16 {
        let v = v.round();
        if v < 0.0 {
            self.underflow += 1;
            0
        } else if v > u16::MAX as f64 {
            self.overflow += 1;
            u16::MAX
        } else {
            v as u16
        }
    }

    fn log(&self) {
        if self.total() > 0 {
            log::warn!(
                "clamped {} pixel(s) below 0 and {} above 65535",
                self.underflow,
                self.overflow
            );
        }
    }
}

/// `max(0, min(65535, round(v - c)))` for every logical pixel value.
pub fn subtract_clamped(pixels: &[f64], c: f64) -> (Vec<u16>, ClampReport) {
    let mut report = ClampReport::default();
    let out = pixels
        .iter()
        .map(|&v| report.clamp(v - c))
        .collect();
    report.log();
    (out, report)
}

/// Per-pixel `a - b`, clamped like [`subtract_clamped`].
pub fn subtract_images_clamped(a: &[f64], b: &[f64]) -> Result<(Vec<u16>, ClampReport)> {
    if a.len() != b.len() {
        return Err(Error::UnsupportedShape(format!(
            "images differ in size ({} vs {} pixels)",
            a.len(),
            b.len()
        )));
    }
    let mut report = ClampReport::default();
    let out = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| report.clamp(x - y))
        .collect();
    report.log();
    Ok((out, report))
}

/// Mean over columns `[prescan, width - postscan)` of every row.
pub fn mean_excluding_borders(
    pixels: &[f64],
    width: usize,
    prescan: usize,
    postscan: usize,
) -> Result<f64> {
    let end = width.saturating_sub(postscan);
    if width == 0 || prescan >= end || pixels.len() % width != 0 {
        return Err(Error::UnsupportedShape(format!(
            "no columns left in a row of {width} after excluding {prescan} + {postscan}"
        )));
    }
    let (sum, n) = pixels
        .chunks_exact(width)
        .flat_map(|row| &row[prescan..end])
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    if n == 0 {
        return Err(Error::UnsupportedShape("image has no rows".into()));
    }
    Ok(sum / n as f64)
}

/// Divide every pixel by the image mean, returning the scaled pixels and
/// the mean.
pub fn normalize(pixels: &[f64]) -> Result<(Vec<f32>, f64)> {
    if pixels.is_empty() {
        return Err(Error::UnsupportedShape("cannot normalize an empty image".into()));
    }
    let mean = pixels.iter().sum::<f64>() / pixels.len() as f64;
    if mean == 0.0 || !mean.is_finite() {
        return Err(Error::UnsupportedShape(format!(
            "cannot normalize by mean {mean}"
        )));
    }
    Ok((pixels.iter().map(|&v| (v / mean) as f32).collect(), mean))
}

/// A half-open, 0-based rectangle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub x: Range<usize>,
    pub y: Range<usize>,
}

impl Region {
    pub fn full(width: usize, height: usize) -> Region {
        Region {
            x: 0..width,
            y: 0..height,
        }
    }

    pub fn width(&self) -> usize {
        self.x.len()
    }

    pub fn height(&self) -> usize {
        self.y.len()
    }
}

/// Extract `region` from a `width` × `height` image.
///
/// Output pixel `(i, j)` is source pixel `(x0 + i, y0 + j)`.
pub fn crop<T: Copy>(pixels: &[T], width: usize, height: usize, region: &Region) -> Result<Vec<T>> {
    if pixels.len() != width * height {
        return Err(Error::UnsupportedShape(format!(
            "buffer of {} pixels is not {width}x{height}",
            pixels.len()
        )));
    }
    if region.x.is_empty()
        || region.y.is_empty()
        || region.x.end > width
        || region.y.end > height
    {
        return Err(Error::UnsupportedShape(format!(
            "region [{}:{}, {}:{}] is empty or outside {width}x{height}",
            region.x.start, region.x.end, region.y.start, region.y.end
        )));
    }
    let mut out = Vec::with_capacity(region.width() * region.height());
    for y in region.y.clone() {
        let row = &pixels[y * width..(y + 1) * width];
        out.extend_from_slice(&row[region.x.clone()]);
    }
    Ok(out)
}

/// Shift unsigned logical values into the signed range.
pub fn to_signed(pixels: &[u16]) -> Vec<i16> {
    pixels.iter().map(|&v| (v as i32 - SIGN_SHIFT) as i16).collect()
}

/// Inverse of [`to_signed`].
pub fn to_unsigned(pixels: &[i16]) -> Vec<u16> {
    pixels.iter().map(|&v| (v as i32 + SIGN_SHIFT) as u16).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtract_underflow_clamps_to_zero() {
        let (out, report) = subtract_clamped(&[10.0], 20.0);
        assert_eq!(out, [0]);
        assert_eq!(report, ClampReport { underflow: 1, overflow: 0 });
    }

    #[test]
    fn subtract_negative_constant_overflows() {
        let (out, report) = subtract_clamped(&[65000.0, 5.0], -1000.0);
        assert_eq!(out, [65535, 1005]);
        assert_eq!(report.overflow, 1);
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn subtract_images() {
        let (out, report) =
            subtract_images_clamped(&[5.0, 100.0, 7.0], &[10.0, 1.0, 7.0]).unwrap();
        assert_eq!(out, [0, 99, 0]);
        assert_eq!(report.underflow, 1);
        assert!(subtract_images_clamped(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn subtract_sees_values_outside_u16() {
        let (out, report) = subtract_clamped(&[-5.0, 70000.0, 300.0], 0.0);
        assert_eq!(out, [0, 65535, 300]);
        assert_eq!(report, ClampReport { underflow: 1, overflow: 1 });
    }

    #[test]
    fn rounding_to_range_edge_is_not_clamping() {
        let (out, report) = subtract_clamped(&[0.0, 65535.0], 0.3);
        assert_eq!(out, [0, 65535]);
        assert_eq!(report.total(), 0);

        let (out, report) = subtract_clamped(&[65535.0], -0.4);
        assert_eq!(out, [65535]);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn mean_excludes_prescan_and_postscan() {
        let row: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(mean_excluding_borders(&row, 10, 2, 3).unwrap(), 5.0);
        assert_eq!(mean_excluding_borders(&row, 10, 0, 0).unwrap(), 5.5);
    }

    #[test]
    fn mean_over_several_rows() {
        let px = [1.0, 100.0, 3.0, 100.0];
        assert_eq!(mean_excluding_borders(&px, 2, 0, 1).unwrap(), 2.0);
    }

    #[test]
    fn mean_empty_window_is_error() {
        let px = [1.0; 10];
        assert!(mean_excluding_borders(&px, 10, 5, 5).is_err());
        assert!(mean_excluding_borders(&px, 10, 11, 0).is_err());
        assert!(mean_excluding_borders(&px, 0, 0, 0).is_err());
    }

    #[test]
    fn normalize_to_unit_mean() {
        let (out, mean) = normalize(&[1.0, 2.0, 3.0, 6.0]).unwrap();
        assert_eq!(mean, 3.0);
        for (got, want) in out.iter().zip([1.0 / 3.0, 2.0 / 3.0, 1.0, 2.0]) {
            assert!((*got as f64 - want).abs() < 1e-6);
        }
        let new_mean: f64 = out.iter().map(|&v| v as f64).sum::<f64>() / out.len() as f64;
        assert!((new_mean - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_rejects_zero_mean() {
        assert!(normalize(&[0.0, 0.0]).is_err());
        assert!(normalize(&[-1.0, 1.0]).is_err());
        assert!(normalize(&[]).is_err());
    }

    #[test]
    fn crop_maps_coordinates() {
        // 4x3 image, value = 10 * y + x
        let px: Vec<u16> = (0..3).flat_map(|y| (0..4).map(move |x| 10 * y + x)).collect();
        let region = Region { x: 1..3, y: 1..3 };
        let out = crop(&px, 4, 3, &region).unwrap();
        assert_eq!(out, [11, 12, 21, 22]);
        assert_eq!(out.len(), region.width() * region.height());
    }

    #[test]
    fn crop_full_region_is_identity() {
        let px = [1, 2, 3, 4, 5, 6];
        assert_eq!(crop(&px, 3, 2, &Region::full(3, 2)).unwrap(), px);
    }

    #[test]
    fn crop_rejects_bad_regions() {
        let px = [0u8; 6];
        assert!(crop(&px, 3, 2, &Region { x: 0..4, y: 0..1 }).is_err());
        assert!(crop(&px, 3, 2, &Region { x: 1..1, y: 0..1 }).is_err());
        assert!(crop(&px, 2, 2, &Region::full(2, 2)).is_err());
    }

    #[test]
    fn sign_shift_round_trips() {
        let u = [0u16, 1, 32767, 32768, 65535];
        let s = to_signed(&u);
        assert_eq!(s, [-32768, -32767, -1, 0, 32767]);
        assert_eq!(to_unsigned(&s), u);
    }
}
