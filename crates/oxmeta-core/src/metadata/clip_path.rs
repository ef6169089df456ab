//! Photoshop clipping path remapping
//!
//! Path resources are a sequence of 26-byte records: a big-endian selector
//! followed by 24 bytes of payload. Knot records hold three (y, x) pairs of
//! signed 8.24 fixed-point values expressed as a fraction of the canvas
//! height and width. After a crop or resize each coordinate is mapped from
//! the old canvas into the new geometry.

use tracing::trace;

use super::bytes::Endian;
use crate::types::RectangleInfo;

const RECORD_PAYLOAD: usize = 24;
const FIXED_ONE: f64 = 4096.0 * 4096.0;

/// Path record selectors
mod selector {
    pub const CLOSED_SUBPATH_LENGTH: u16 = 0;
    pub const CLOSED_KNOT_LINKED: u16 = 1;
    pub const CLOSED_KNOT_UNLINKED: u16 = 2;
    pub const OPEN_SUBPATH_LENGTH: u16 = 3;
    pub const OPEN_KNOT_LINKED: u16 = 4;
    pub const OPEN_KNOT_UNLINKED: u16 = 5;
}

fn remap_coordinate(value: i32, old_extent: usize, offset: i64, new_extent: usize) -> i32 {
    let pixels = f64::from(value) * old_extent as f64 / FIXED_ONE - offset as f64;
    (pixels * FIXED_ONE / new_extent as f64) as i32
}

/// Rescale every knot of a clipping path resource in place
pub fn remap(payload: &mut [u8], old_columns: usize, old_rows: usize, geometry: &RectangleInfo) {
    if geometry.width == 0 || geometry.height == 0 {
        return;
    }
    let mut knot_count: u32 = 0;
    let mut p = 0usize;
    while let Some(code) = Endian::Big.read_u16(payload, p) {
        p += 2;
        if p + RECORD_PAYLOAD > payload.len() {
            break;
        }
        match code {
            selector::CLOSED_SUBPATH_LENGTH | selector::OPEN_SUBPATH_LENGTH if knot_count == 0 => {
                knot_count = u32::from(Endian::Big.read_u16(payload, p).unwrap_or(0));
                trace!(knot_count, "clip path subpath");
            }
            selector::CLOSED_KNOT_LINKED
            | selector::CLOSED_KNOT_UNLINKED
            | selector::OPEN_KNOT_LINKED
            | selector::OPEN_KNOT_UNLINKED
                if knot_count != 0 =>
            {
                for pair in 0..3 {
                    let at = p + pair * 8;
                    let y = Endian::Big.read_u32(payload, at).unwrap_or(0) as i32;
                    let y = remap_coordinate(y, old_rows, geometry.y, geometry.height);
                    Endian::Big.write_u32(payload, at, y as u32);

                    let x = Endian::Big.read_u32(payload, at + 4).unwrap_or(0) as i32;
                    let x = remap_coordinate(x, old_columns, geometry.x, geometry.width);
                    Endian::Big.write_u32(payload, at + 4, x as u32);
                }
                knot_count -= 1;
            }
            _ => {}
        }
        p += RECORD_PAYLOAD;
    }
}
