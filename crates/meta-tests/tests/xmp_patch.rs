//! XMP field patching
//!
//! Fields are replaced as text; everything else in the packet must survive
//! byte for byte.

use meta_tests::fixtures::xmp_packet;
use oxmeta_core::metadata::xmp::{self, MAGICK_EPSILON, field_range, patch_field, rational};
use oxmeta_core::{Colorspace, Image, MetadataState, Orientation, PointInfo, ResolutionUnits};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn field<'a>(packet: &'a [u8], tag: &str) -> &'a str {
    let range = field_range(packet, tag).expect("field present");
    std::str::from_utf8(&packet[range]).unwrap()
}

fn full_packet() -> Vec<u8> {
    xmp_packet(&[
        ("Orientation", "1"),
        ("XResolution", "72/1"),
        ("YResolution", "72/1"),
        ("ResolutionUnit", "2"),
    ])
}

#[test]
fn test_sync_rewrites_fields() {
    eprintln!("\n=== XMP Sync ===");
    let mut packet = full_packet();
    let state = MetadataState {
        resolution: PointInfo::new(300.0, 118.5),
        units: ResolutionUnits::PixelsPerCentimeter,
        orientation: Orientation::LeftBottom,
    };
    xmp::sync(&mut packet, &state);
    eprintln!("  {}", String::from_utf8_lossy(&packet));

    assert_eq!(field(&packet, "tiff:XResolution"), "300/1");
    assert_eq!(field(&packet, "tiff:YResolution"), "237/2");
    assert_eq!(field(&packet, "tiff:ResolutionUnit"), "3");
    assert_eq!(field(&packet, "tiff:Orientation"), "8");
    assert!(packet.ends_with(b"<?xpacket end=\"w\"?>"));
}

#[test]
fn test_sync_is_idempotent() {
    let mut image = Image::new(1, 1, Colorspace::Srgb);
    image.set_profile("xmp", full_packet());
    image.resolution = PointInfo::new(96.0, 96.0);
    image.orientation = Orientation::BottomRight;

    assert!(image.sync_profiles());
    let once = image.get_profile("xmp").unwrap().data().to_vec();
    assert!(image.sync_profiles());
    assert_eq!(image.get_profile("xmp").unwrap().data(), once.as_slice());
}

#[test]
fn test_missing_fields_are_untouched() {
    let original = xmp_packet(&[("Orientation", "1")]);
    let mut packet = original.clone();
    assert!(!patch_field(&mut packet, "tiff:XResolution", "1/1"));
    assert_eq!(packet, original);

    // an attribute is not an element
    let mut attribute = b"<rdf:Description tiff:XResolution=\"72/1\"/>".to_vec();
    let before = attribute.clone();
    assert!(!patch_field(&mut attribute, "tiff:XResolution", "1/1"));
    assert_eq!(attribute, before);
}

#[test]
fn test_only_first_occurrence_is_patched() {
    let mut packet =
        b"<a><tiff:Orientation>1</tiff:Orientation><tiff:Orientation>1</tiff:Orientation></a>"
            .to_vec();
    assert!(patch_field(&mut packet, "tiff:Orientation", "6"));
    assert_eq!(
        packet,
        b"<a><tiff:Orientation>6</tiff:Orientation><tiff:Orientation>1</tiff:Orientation></a>"
    );
}

fn assert_within_epsilon(value: f64) {
    let (numerator, denominator) = rational(value);
    assert!(denominator > 0);
    let error = (numerator as f64 / denominator as f64 - value).abs();
    assert!(
        error <= MAGICK_EPSILON,
        "{:e} -> {}/{} (error {:e})",
        value,
        numerator,
        denominator,
        error
    );
}

#[test]
fn test_rational_approximation_property() {
    eprintln!("\n=== Rational Approximation ===");
    let mut rng = ChaCha8Rng::seed_from_u64(0x786d70);
    // log-uniform from below epsilon up to the u64 range
    for _ in 0..4000 {
        let exponent: f64 = rng.gen_range(-13.0..19.0);
        assert_within_epsilon(10f64.powf(exponent));
    }
    for _ in 0..1000 {
        assert_within_epsilon(rng.gen_range(1.0e9..1.0e12));
    }
    for value in [
        1.0e-13,
        MAGICK_EPSILON,
        1.1e-12,
        123_456_789.123,
        1.8e19,
        u64::MAX as f64,
    ] {
        assert_within_epsilon(value);
    }
    assert_eq!(rational(u64::MAX as f64), (u64::MAX, 1));
    assert_eq!(rational(2.0e19), (u64::MAX, 1));
}

#[test]
fn test_rational_edges() {
    assert_eq!(rational(0.0), (0, 1));
    assert_eq!(rational(-5.0), (0, 1));
    assert_eq!(rational(72.0), (72, 1));
    assert_eq!(rational(0.5), (1, 2));
    assert_eq!(rational(1e30), (u64::MAX, 1));
}
