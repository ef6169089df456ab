//! In-place patching of XMP resolution and orientation fields
//!
//! The XMP packet is treated as text: each field is located by its element
//! name and only the element's character content is replaced. The rest of
//! the packet is left byte-for-byte intact.

use std::ops::Range;

use tracing::trace;

use super::MetadataState;
use super::bytes::find;

/// Tolerance used when approximating a resolution as a rational
pub const MAGICK_EPSILON: f64 = 1.0e-12;

const MAX_CONVERGENTS: usize = 128;

/// Approximate `value` as `numerator / denominator`.
///
/// Values at or below epsilon give `0/1`, integers give `n/1`, and values
/// beyond `u64::MAX` saturate to `u64::MAX/1`. Otherwise the continued
/// fraction of the exact binary value is expanded until a convergent is
/// within [`MAGICK_EPSILON`].
pub fn rational(value: f64) -> (u64, u64) {
    if value.is_nan() || value <= MAGICK_EPSILON {
        return (0, 1);
    }
    if value > u64::MAX as f64 {
        return (u64::MAX, 1);
    }
    if value.floor() == value {
        return (value as u64, 1);
    }

    // value == mantissa / 2^shift exactly; non-integers have shift > 0
    let bits = value.to_bits();
    let mantissa = u128::from((bits & ((1 << 52) - 1)) | (1 << 52));
    let shift = 1075 - ((bits >> 52) & 0x7ff) as u32;
    let reduce = mantissa.trailing_zeros().min(shift);
    let (mut a, mut b) = (mantissa >> reduce, 1u128 << (shift - reduce));

    let (mut h_prev, mut h) = (0u128, 1u128);
    let (mut k_prev, mut k) = (1u128, 0u128);
    let limit = u128::from(u64::MAX);
    for _ in 0..MAX_CONVERGENTS {
        if b == 0 {
            break;
        }
        let term = a / b;
        (a, b) = (b, a % b);
        let next = term
            .checked_mul(h)
            .and_then(|v| v.checked_add(h_prev))
            .zip(term.checked_mul(k).and_then(|v| v.checked_add(k_prev)));
        match next {
            Some((h_next, k_next)) if h_next <= limit && k_next <= limit => {
                (h_prev, h) = (h, h_next);
                (k_prev, k) = (k, k_next);
            }
            _ => break,
        }
        if (h as f64 / k as f64 - value).abs() <= MAGICK_EPSILON {
            break;
        }
    }
    (h as u64, k.max(1) as u64)
}

/// Byte range of the character content of `<tag>...</tag>`.
///
/// Only the first occurrence of the tag name is considered; it must be
/// preceded by `<` and followed by `>`.
pub fn field_range(xmp: &[u8], tag: &str) -> Option<Range<usize>> {
    let at = find(xmp, tag.as_bytes())?;
    if at == 0 || xmp[at - 1] != b'<' {
        return None;
    }
    let start = at + tag.len();
    if xmp.get(start) != Some(&b'>') {
        return None;
    }
    let start = start + 1;
    let end = start + xmp[start..].iter().position(|&b| b == b'<')?;
    Some(start..end)
}

/// Replace a byte range with `value`, growing or shrinking the buffer
pub fn replace_value(xmp: &mut Vec<u8>, range: Range<usize>, value: &str) {
    xmp.splice(range, value.bytes());
}

/// Patch one field if present; returns whether it was found
pub fn patch_field(xmp: &mut Vec<u8>, tag: &str, value: &str) -> bool {
    match field_range(xmp, tag) {
        Some(range) => {
            trace!(tag, value, "patching xmp field");
            replace_value(xmp, range, value);
            true
        }
        None => false,
    }
}

fn format_rational(value: f64) -> String {
    let (numerator, denominator) = rational(value);
    format!("{}/{}", numerator, denominator)
}

/// Write resolution, units and orientation into the XMP packet
pub fn sync(xmp: &mut Vec<u8>, state: &MetadataState) {
    patch_field(xmp, "tiff:XResolution", &format_rational(state.resolution.x));
    patch_field(xmp, "tiff:YResolution", &format_rational(state.resolution.y));
    patch_field(
        xmp,
        "tiff:ResolutionUnit",
        &(i32::from(state.units.to_u16()) + 1).to_string(),
    );
    patch_field(
        xmp,
        "tiff:Orientation",
        &state.orientation.to_u16().to_string(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Orientation, PointInfo, ResolutionUnits};

    const PACKET: &str = "<x:xmpmeta><rdf:RDF><rdf:Description>\
        <tiff:Orientation>1</tiff:Orientation>\
        <tiff:XResolution>72/1</tiff:XResolution>\
        <tiff:YResolution>72/1</tiff:YResolution>\
        <tiff:ResolutionUnit>2</tiff:ResolutionUnit>\
        </rdf:Description></rdf:RDF></x:xmpmeta>";

    #[test]
    fn test_rational_edges() {
        assert_eq!(rational(0.0), (0, 1));
        assert_eq!(rational(-5.0), (0, 1));
        assert_eq!(rational(300.0), (300, 1));
        assert_eq!(rational(1.0e30), (u64::MAX, 1));
        assert_eq!(rational(0.5), (1, 2));
        assert_eq!(rational(72.25), (289, 4));
    }

    #[test]
    fn test_rational_precision() {
        for value in [1.0 / 3.0, 2.54, 118.110_236_220_472_4, 0.001, 96.123_456_789] {
            let (n, d) = rational(value);
            assert!(d >= 1);
            assert!(
                (n as f64 / d as f64 - value).abs() <= MAGICK_EPSILON,
                "{} -> {}/{}",
                value,
                n,
                d
            );
        }
    }

    #[test]
    fn test_field_range() {
        let xmp = PACKET.as_bytes();
        let range = field_range(xmp, "tiff:Orientation").unwrap();
        assert_eq!(&xmp[range], b"1");
        assert!(field_range(xmp, "tiff:Software").is_none());
    }

    #[test]
    fn test_attribute_form_is_not_patched() {
        let xmp = b"<rdf:Description tiff:Orientation=\"1\"/>".to_vec();
        assert!(field_range(&xmp, "tiff:Orientation").is_none());
    }

    #[test]
    fn test_sync_rewrites_fields() {
        let mut xmp = PACKET.as_bytes().to_vec();
        let state = MetadataState {
            resolution: PointInfo::new(300.0, 150.5),
            units: ResolutionUnits::PixelsPerCentimeter,
            orientation: Orientation::RightTop,
        };
        sync(&mut xmp, &state);
        let text = String::from_utf8(xmp).unwrap();
        assert!(text.contains("<tiff:Orientation>6</tiff:Orientation>"));
        assert!(text.contains("<tiff:XResolution>300/1</tiff:XResolution>"));
        assert!(text.contains("<tiff:YResolution>301/2</tiff:YResolution>"));
        assert!(text.contains("<tiff:ResolutionUnit>3</tiff:ResolutionUnit>"));
        assert!(text.ends_with("</x:xmpmeta>"));
    }

    #[test]
    fn test_patch_is_idempotent() {
        let mut once = PACKET.as_bytes().to_vec();
        patch_field(&mut once, "tiff:Orientation", "8");
        let mut twice = once.clone();
        patch_field(&mut twice, "tiff:Orientation", "8");
        assert_eq!(once, twice);
    }
}
