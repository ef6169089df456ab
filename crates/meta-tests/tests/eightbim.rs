//! Photoshop resource block handling
//!
//! An "8bim" profile is fanned out into the profiles it embeds, and edits to
//! those profiles are written back into the block.

use meta_tests::fixtures::{resolution_info, resource, xmp_packet};
use oxmeta_core::metadata::eightbim::{self, Records};
use oxmeta_core::{Colorspace, Image, ResolutionUnits};

fn block(records: &[Vec<u8>]) -> Vec<u8> {
    records.concat()
}

fn payload_of(image: &Image, id: u16) -> Option<Vec<u8>> {
    let data = image.get_profile("8bim")?.data();
    Records::new(data)
        .find(|r| r.id == id)
        .map(|r| data[r.payload].to_vec())
}

#[test]
fn test_fan_out() {
    eprintln!("\n=== 8BIM Fan-Out ===");
    let xmp = xmp_packet(&[("Orientation", "1")]);
    let data = block(&[
        resource(eightbim::RESOLUTION_INFO, b"", &resolution_info(300.0, 1, 300.0)),
        resource(eightbim::IPTC, b"", &[0x1c, 0x02, 0x00, 0x00, 0x02, 0x00, 0x04]),
        resource(eightbim::THUMBNAIL, b"thumb", &[0xff; 33]),
        resource(eightbim::XMP, b"", &xmp),
        resource(2000, b"Path 1", &[0; 26]),
    ]);

    let mut image = Image::new(4, 4, Colorspace::Srgb);
    assert!(image.set_profile("8BIM", data.clone()));

    let names: Vec<_> = image.profiles().names().collect();
    eprintln!("  profiles: {:?}", names);
    assert_eq!(names, vec!["8bim", "iptc", "xmp"]);
    assert_eq!(image.get_profile("8bim").unwrap().data(), data.as_slice());
    assert_eq!(image.get_profile("xmp").unwrap().data(), xmp.as_slice());
    assert_eq!(image.resolution.x, 300.0);
    assert_eq!(image.units, ResolutionUnits::PixelsPerInch);
}

#[test]
fn test_write_back_replaces_and_deletes() {
    eprintln!("\n=== 8BIM Write-Back ===");
    let data = block(&[
        resource(eightbim::IPTC, b"", &[1, 2, 3]),
        resource(eightbim::ICC_PROFILE, b"", &[4; 8]),
    ]);
    let mut image = Image::new(1, 1, Colorspace::Srgb);
    image.set_profile("8bim", data.clone());
    assert_eq!(image.get_profile("icc").unwrap().data(), &[4; 8]);

    // an odd-length replacement gets a pad byte inside the block
    image.set_profile("iptc", vec![9; 5]);
    assert_eq!(payload_of(&image, eightbim::IPTC), Some(vec![9; 5]));
    assert_eq!(payload_of(&image, eightbim::ICC_PROFILE), Some(vec![4; 8]));

    // restoring the original payload restores the original block
    image.set_profile("iptc", vec![1, 2, 3]);
    assert_eq!(image.get_profile("8bim").unwrap().data(), data.as_slice());

    assert!(image.delete_profile("icc"));
    assert_eq!(payload_of(&image, eightbim::ICC_PROFILE), None);
    let ids: Vec<_> = Records::new(image.get_profile("8bim").unwrap().data())
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![eightbim::IPTC]);
}

#[test]
fn test_profiles_without_a_record_are_not_added() {
    let data = resource(eightbim::IPTC, b"", &[1, 2]);
    let mut image = Image::new(1, 1, Colorspace::Srgb);
    image.set_profile("8bim", data.clone());
    image.set_profile("xmp", xmp_packet(&[]));
    image.set_profile("exif", b"Exif\0\0MM\0*\0\0\0\x08\0\0\0\0\0\0".to_vec());
    assert_eq!(image.get_profile("8bim").unwrap().data(), data.as_slice());
}

#[test]
fn test_oversized_record_stops_decode() {
    eprintln!("\n=== 8BIM Oversized Record ===");
    let mut bad = resource(eightbim::ICC_PROFILE, b"", &[7; 4]);
    bad[8..12].copy_from_slice(&4096u32.to_be_bytes());
    let data = block(&[
        resource(eightbim::IPTC, b"", &[1, 2]),
        bad,
        resource(eightbim::XMP, b"", &xmp_packet(&[])),
    ]);

    let mut image = Image::new(1, 1, Colorspace::Srgb);
    assert!(image.set_profile("8bim", data));
    assert!(image.get_profile("iptc").is_some());
    assert!(image.get_profile("icc").is_none());
    assert!(image.get_profile("xmp").is_none());
}

#[test]
fn test_resolution_in_centimeters() {
    let data = resource(
        eightbim::RESOLUTION_INFO,
        b"",
        &resolution_info(254.0, 2, 127.0),
    );
    let mut image = Image::new(1, 1, Colorspace::Srgb);
    image.set_profile("8bim", data);
    assert_eq!(image.units, ResolutionUnits::PixelsPerCentimeter);
    assert!((image.resolution.x - 100.0).abs() < 1e-9);
    assert!((image.resolution.y - 50.0).abs() < 1e-9);
}

#[test]
fn test_sync_writes_resolution() {
    let data = resource(
        eightbim::RESOLUTION_INFO,
        b"",
        &resolution_info(72.0, 1, 72.0),
    );
    let mut image = Image::new(1, 1, Colorspace::Srgb);
    image.set_profile("8bim", data);
    image.resolution.x = 150.0;
    image.resolution.y = 200.0;
    assert!(image.sync_profiles());

    let payload = payload_of(&image, eightbim::RESOLUTION_INFO).unwrap();
    assert_eq!(payload, resolution_info(150.0, 1, 200.0));
}
