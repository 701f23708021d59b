//! End-to-end tests of the accessor: images are built in memory, serialized,
//! reparsed and checked through the public API only.

use fitsimage::transform::{crop, to_signed, to_unsigned, Region};
use fitsimage::{Bitpix, ErrorKind, ImageFile, KeyType, OpenMode, PixelType, Value, BLOCK_SIZE};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn reparse(file: &ImageFile) -> ImageFile {
    ImageFile::from_bytes(&file.to_bytes()).unwrap()
}

fn ramp_u16(width: usize, height: usize) -> ImageFile {
    let pixels: Vec<u16> = (0..width * height).map(|i| (i * 1000 % 65536) as u16).collect();
    let mut f = ImageFile::in_memory().unwrap();
    f.create_image(PixelType::U16, width, height).unwrap();
    f.write_image(&pixels).unwrap();
    f
}

/// A primary HDU from raw card text, followed by one block of zero data.
fn primary_bytes(cards: &[&str]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for card in cards.iter().chain(&["END"]) {
        bytes.extend_from_slice(format!("{card:<80}").as_bytes());
    }
    bytes.resize(BLOCK_SIZE, b' ');
    bytes.resize(2 * BLOCK_SIZE, 0);
    bytes
}

fn card_text(file: &ImageFile) -> Vec<String> {
    file.header()
        .iter()
        .map(|c| String::from_utf8_lossy(&c.to_bytes()).into_owned())
        .collect()
}

// ---------------------------------------------------------------------------
// Pixel round trips
// ---------------------------------------------------------------------------

#[test]
fn u16_survives_serialization() {
    let f = ramp_u16(7, 5);
    let g = reparse(&f);
    assert_eq!(g.read_image::<u16>().unwrap(), f.read_image::<u16>().unwrap());
    assert_eq!(g.validate_simple_2d(Some(Bitpix::I16)).unwrap().bzero, 32768.0);
}

#[test]
fn every_pixel_type_round_trips_small_values() {
    for ty in PixelType::ALL {
        let mut f = ImageFile::in_memory().unwrap();
        f.create_image(ty, 3, 1).unwrap();
        f.write_image(&[0.0f64, 1.0, 100.0]).unwrap();
        let g = reparse(&f);
        assert_eq!(g.read_image::<f64>().unwrap(), [0.0, 1.0, 100.0], "{ty}");
        assert_eq!(g.descriptor().unwrap().bitpix, ty.storage(), "{ty}");
    }
}

#[test]
fn unsigned_signed_reinterpretation_is_identity() {
    let f = ramp_u16(4, 4);
    let original = f.read_image::<u16>().unwrap();

    let mut g = reparse(&f);
    g.set_pixel_type(PixelType::I16).unwrap();
    let signed = g.read_image::<i16>().unwrap();
    assert_eq!(signed, to_signed(&original));

    let mut h = reparse(&g);
    h.set_pixel_type(PixelType::U16).unwrap();
    assert_eq!(h.read_image::<u16>().unwrap(), original);
    assert_eq!(to_unsigned(&signed), original);
}

#[test]
fn row_access_matches_flat_layout() {
    let f = ramp_u16(5, 3);
    let all = f.read_image::<u16>().unwrap();
    for row in 1..=3 {
        assert_eq!(f.read_row::<u16>(row).unwrap(), all[(row - 1) * 5..row * 5]);
    }
}

#[test]
fn crop_through_accessor() {
    let src = ramp_u16(6, 4);
    let region = Region { x: 2..5, y: 1..3 };
    let pixels = src.read_image::<u16>().unwrap();
    let cut = crop(&pixels, 6, 4, &region).unwrap();

    let mut out = ImageFile::in_memory().unwrap();
    out.create_image(PixelType::U16, region.width(), region.height()).unwrap();
    out.write_image(&cut).unwrap();

    let out = reparse(&out);
    assert_eq!(out.dimensions().unwrap(), (3, 2));
    for j in 0..2 {
        for i in 0..3 {
            let got = out.read_pixels::<u16>(j * 3 + i + 1, 1).unwrap()[0];
            let want = src.read_pixels::<u16>((1 + j) * 6 + (2 + i) + 1, 1).unwrap()[0];
            assert_eq!(got, want, "pixel ({i}, {j})");
        }
    }
}

// ---------------------------------------------------------------------------
// Header edits
// ---------------------------------------------------------------------------

#[test]
fn keyword_edits_survive_serialization() {
    let mut f = ramp_u16(2, 2);
    f.write_keyword("OBJECT", "NGC 1976", Some("target name")).unwrap();
    f.write_keyword("EXPTIME", 30.0, Some("s")).unwrap();
    f.write_keyword("DARKCORR", true, None).unwrap();
    f.write_keyword("CCDTEMP", Value::FixedFloat(-20.5), None).unwrap();

    let g = reparse(&f);
    assert_eq!(g.read_keyword::<String>("OBJECT").unwrap().value, "NGC 1976");
    let exp = g.read_keyword::<f64>("EXPTIME").unwrap();
    assert_eq!((exp.value, exp.comment.as_deref()), (30.0, Some("s")));
    assert!(g.read_keyword::<bool>("DARKCORR").unwrap().value);
    assert_eq!(
        g.read_keyword_as("CCDTEMP", KeyType::FixDouble).unwrap().value,
        Value::FixedFloat(-20.5)
    );
    assert!(card_text(&g).iter().any(|c| c.contains("-20.500000")));
}

#[test]
fn blank_sweep_leaves_single_end() {
    let mut f = ramp_u16(2, 2);
    f.write_keyword("A", 1i64, None).unwrap();
    let mut bytes = f.to_bytes();

    // Blank out the card holding A and append two blank cards before END.
    let cards: Vec<[u8; 80]> = bytes[..BLOCK_SIZE]
        .chunks_exact(80)
        .map(|c| c.try_into().unwrap())
        .collect();
    let end = cards.iter().position(|c| c.starts_with(b"END     ")).unwrap();
    let a = cards.iter().position(|c| c.starts_with(b"A       ")).unwrap();
    bytes[a * 80..(a + 1) * 80].fill(b' ');
    let mut end_card = [b' '; 80];
    end_card[..3].copy_from_slice(b"END");
    bytes[end * 80..(end + 1) * 80].fill(b' ');
    bytes[(end + 2) * 80..(end + 3) * 80].copy_from_slice(&end_card);

    let mut g = ImageFile::from_bytes(&bytes).unwrap();
    let before = g.header().len();
    assert_eq!(g.remove_blank_cards().unwrap(), 3);
    assert_eq!(g.header().len(), before - 3);

    let out = g.to_bytes();
    let ends = out[..BLOCK_SIZE]
        .chunks_exact(80)
        .filter(|c| c.starts_with(b"END     "))
        .count();
    assert_eq!(ends, 1);
    assert_eq!(g.read_image::<u16>().unwrap(), f.read_image::<u16>().unwrap());
}

#[test]
fn copy_header_preserves_target_shape() {
    let mut src = ramp_u16(10, 10);
    src.write_keyword("TELESCOP", "ORBITAL", None).unwrap();
    src.write_keyword("GAIN", 1.5, None).unwrap();

    let mut dst = ImageFile::in_memory().unwrap();
    dst.create_image(PixelType::F32, 3, 2).unwrap();
    dst.write_image(&[0.5f32; 6]).unwrap();
    dst.copy_header_from(&src).unwrap();

    let dst = reparse(&dst);
    assert_eq!(dst.validate_simple_2d(Some(Bitpix::F32)).unwrap().naxes, [3, 2]);
    assert_eq!(dst.read_image::<f32>().unwrap(), [0.5; 6]);
    assert_eq!(dst.read_keyword::<String>("TELESCOP").unwrap().value, "ORBITAL");
    assert_eq!(dst.read_keyword::<f64>("GAIN").unwrap().value, 1.5);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn error_kinds() {
    let f = ramp_u16(2, 2);
    assert_eq!(
        f.validate_simple_2d(Some(Bitpix::U8)).unwrap_err().kind(),
        ErrorKind::UnsupportedShape
    );
    assert_eq!(
        f.read_keyword::<i64>("NOPE").unwrap_err().kind(),
        ErrorKind::KeywordNotFound
    );
    assert_eq!(
        f.read_keyword::<bool>("NAXIS1").unwrap_err().kind(),
        ErrorKind::TypeMismatch
    );
    assert_eq!(f.read_pixels::<u16>(5, 1).unwrap_err().kind(), ErrorKind::Read);
    assert_eq!(
        ImageFile::from_bytes(&[b' '; 100]).unwrap_err().kind(),
        ErrorKind::Open
    );
}

#[test]
fn unrepresentable_keyword_values_are_refused() {
    let mut f = ramp_u16(2, 2);
    let before = f.to_bytes();
    let err = f.write_keyword("BIG", Value::FixedFloat(1e80), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Write);
    let err = f.write_keyword("OBSERVER", "M\u{fc}ller", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Write);
    assert!(f.write_keyword("NOTE", "x".repeat(69).as_str(), None).is_err());
    assert_eq!(f.to_bytes(), before);

    f.write_keyword("BIG", Value::FixedFloat(1e50), None).unwrap();
    let g = reparse(&f);
    assert_eq!(g.read_keyword::<f64>("BIG").unwrap().value, 1e50);
}

#[test]
fn data_cube_is_not_a_2d_image() {
    let bytes = primary_bytes(&[
        "SIMPLE  =                    T",
        "BITPIX  =                   16",
        "NAXIS   =                    3",
        "NAXIS1  =                    4",
        "NAXIS2  =                    3",
        "NAXIS3  =                    2",
    ]);
    let f = ImageFile::from_bytes(&bytes).unwrap();
    assert_eq!(f.descriptor().unwrap().naxes, [4, 3, 2]);
    for expected in [None, Some(Bitpix::I16)] {
        assert_eq!(
            f.validate_simple_2d(expected).unwrap_err().kind(),
            ErrorKind::UnsupportedShape
        );
    }
}

#[test]
fn overflowing_axes_open_but_do_not_describe() {
    let bytes = primary_bytes(&[
        "SIMPLE  =                    T",
        "BITPIX  =                   16",
        "NAXIS   =                    2",
        "NAXIS1  =        1099511627776",
        "NAXIS2  =        1099511627776",
    ]);
    let f = ImageFile::from_bytes(&bytes).unwrap();
    assert_eq!(f.descriptor().unwrap_err().kind(), ErrorKind::Open);
    assert!(f.validate_simple_2d(None).is_err());
}

#[test]
fn file_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.fits");

    let mut f = ImageFile::open(&path, OpenMode::Create).unwrap();
    f.create_image(PixelType::U16, 3, 3).unwrap();
    f.write_image(&[1u16, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
    f.write_keyword("OBJECT", "flat", None).unwrap();
    f.close().unwrap();

    let mut g = ImageFile::open(&path, OpenMode::ReadWrite).unwrap();
    assert!(g.delete_keyword("OBJECT").unwrap());
    g.write_row(2, &[40u16, 50, 60]).unwrap();
    g.close().unwrap();

    let h = ImageFile::open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(
        h.read_image::<u16>().unwrap(),
        [1, 2, 3, 40, 50, 60, 7, 8, 9]
    );
    assert_eq!(
        h.read_keyword::<String>("OBJECT").unwrap_err().kind(),
        ErrorKind::KeywordNotFound
    );
}
