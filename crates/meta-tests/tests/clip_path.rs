//! Clipping path remapping after crops and canvas changes

use meta_tests::fixtures::{fixed, path_record, resource, subpath_record};
use oxmeta_core::metadata::clip_path::remap;
use oxmeta_core::metadata::eightbim::{self, Records};
use oxmeta_core::{Colorspace, Image, RectangleInfo};

const SUBPATH_CLOSED: u16 = 0;
const KNOT_CLOSED_LINKED: u16 = 1;
const FILL_RULE: u16 = 6;

/// One closed subpath with the given (y, x) knots, each repeated for its
/// two control points
fn path(knots: &[(f64, f64)]) -> Vec<u8> {
    let mut out = path_record(FILL_RULE, &[]);
    out.extend(subpath_record(SUBPATH_CLOSED, knots.len() as u16));
    for &(y, x) in knots {
        let (y, x) = (fixed(y), fixed(x));
        out.extend(path_record(KNOT_CLOSED_LINKED, &[y, x, y, x, y, x]));
    }
    out
}

fn values(data: &[u8]) -> Vec<i32> {
    data.chunks_exact(26)
        .skip(2)
        .flat_map(|record| {
            record[2..]
                .chunks_exact(4)
                .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[test]
fn test_same_canvas_is_identity() {
    eprintln!("\n=== Clip Path Identity ===");
    let original = path(&[(0.1, 0.2), (0.5, 0.5), (0.9, 0.75), (1.0, 0.0)]);
    for (columns, rows) in [(640, 480), (1, 1), (4001, 2999)] {
        let mut data = original.clone();
        remap(&mut data, columns, rows, &RectangleInfo::new(columns, rows, 0, 0));
        for (before, after) in values(&original).iter().zip(values(&data)) {
            assert!(
                (before - after).abs() <= 1,
                "{}x{}: {} -> {}",
                columns,
                rows,
                before,
                after
            );
        }
    }
}

#[test]
fn test_crop_translates_and_scales() {
    eprintln!("\n=== Clip Path Crop ===");
    // knot at pixel (x=200, y=300) of an 800x600 canvas
    let mut data = path(&[(0.5, 0.25)]);
    // keep the 400x300 window starting at (100, 150)
    remap(&mut data, 800, 600, &RectangleInfo::new(400, 300, 100, 150));
    let knot = values(&data);
    eprintln!("  y={:#x} x={:#x}", knot[0], knot[1]);
    assert!((knot[0] - fixed(0.5)).abs() <= 1);
    assert!((knot[1] - fixed(0.25)).abs() <= 1);
}

#[test]
fn test_larger_canvas_shrinks_fractions() {
    let mut data = path(&[(0.5, 0.5)]);
    remap(&mut data, 100, 100, &RectangleInfo::new(200, 400, 0, 0));
    let knot = values(&data);
    assert!((knot[0] - fixed(0.125)).abs() <= 1);
    assert!((knot[1] - fixed(0.25)).abs() <= 1);
}

#[test]
fn test_knots_beyond_the_announced_count_are_kept() {
    let mut data = path(&[(0.5, 0.5)]);
    data.extend(path_record(KNOT_CLOSED_LINKED, &[fixed(0.5); 6]));
    let before = values(&data);
    remap(&mut data, 100, 100, &RectangleInfo::new(50, 50, 0, 0));
    let after = values(&data);
    assert_eq!(after[6..], before[6..]);
    assert_ne!(after[0], before[0]);
}

#[test]
fn test_image_remaps_only_path_resources() {
    eprintln!("\n=== Clip Path Through 8BIM ===");
    let clip = path(&[(0.5, 0.5)]);
    let other = vec![0x55; 26 * 3];
    let block = [
        resource(2000, b"Work Path", &clip),
        resource(0x0400, b"", &other),
    ]
    .concat();

    let mut image = Image::new(50, 50, Colorspace::Srgb);
    image.set_profile("8bim", block);
    image.remap_clip_paths(100, 100, RectangleInfo::new(50, 50, 0, 0));

    let data = image.get_profile("8bim").unwrap().data();
    let records: Vec<_> = Records::new(data).collect();
    assert_eq!(records.len(), 2);
    let knot = values(&data[records[0].payload.clone()]);
    assert!((knot[0] - fixed(1.0)).abs() <= 1);
    assert_eq!(&data[records[1].payload.clone()], other.as_slice());
    assert!(eightbim::CLIP_PATHS.contains(&records[0].id));
}
