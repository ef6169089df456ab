//! Photoshop image resource blocks ("8BIM")
//!
//! A resource block is a run of records:
//!
//! ```text
//! "8BIM" | id: u16 BE | name: pascal string, padded to even |
//!     size: u32 BE | payload, padded to even
//! ```
//!
//! Several of those records carry profiles that are also stored on their own
//! (ICC, IPTC, EXIF, XMP), so the block is decoded into individual profiles
//! when it is stored and patched again whenever one of them changes.

use std::ops::Range;

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace};

use super::MetadataState;
use super::clip_path;
use crate::image::Image;
use crate::types::{PointInfo, RectangleInfo, ResolutionUnits};

pub const SIGNATURE: &[u8; 4] = b"8BIM";

/// Resolution info resource
pub const RESOLUTION_INFO: u16 = 0x03ed;
pub const IPTC: u16 = 0x0404;
pub const THUMBNAIL: u16 = 0x040c;
pub const ICC_PROFILE: u16 = 0x040f;
pub const EXIF: u16 = 0x0422;
pub const XMP: u16 = 0x0424;

/// Clipping path resources occupy this id range
pub const CLIP_PATHS: Range<u16> = 2000..2999;

/// Smallest record: signature, id, empty name and its pad, size
const MIN_RECORD: usize = 12;

/// Resource id a stored profile is mirrored under
pub fn resource_id(profile_name: &str) -> Option<u16> {
    match profile_name.to_ascii_lowercase().as_str() {
        "icc" => Some(ICC_PROFILE),
        "iptc" => Some(IPTC),
        "xmp" => Some(XMP),
        _ => None,
    }
}

/// One record located inside a resource block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub id: u16,
    /// Offset of the "8BIM" signature
    pub start: usize,
    /// Offset of the 4-byte size field
    pub size_at: usize,
    /// Payload bytes (unpadded)
    pub payload: Range<usize>,
    /// Offset just past the padded payload
    pub end: usize,
}

/// Iterator over well-formed records; stops at the first malformed one
#[derive(Debug, Clone)]
pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Records<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn parse(&self) -> Option<ResourceRecord> {
        let data = self.data;
        let start = self.pos;
        if data.len().checked_sub(start)? < MIN_RECORD {
            return None;
        }
        if &data[start..start + 4] != SIGNATURE {
            return None;
        }
        let id = BigEndian::read_u16(&data[start + 4..]);
        let name_length = usize::from(data[start + 6]);
        let mut p = start + 7 + name_length;
        if name_length % 2 == 0 {
            p += 1;
        }
        let size_at = p;
        let size = data.get(p..p.checked_add(4)?).map(BigEndian::read_u32)? as usize;
        let payload_start = p + 4;
        let payload_end = payload_start.checked_add(size)?;
        if payload_end > data.len() {
            return None;
        }
        let end = (payload_end + size % 2).min(data.len());
        Some(ResourceRecord {
            id,
            start,
            size_at,
            payload: payload_start..payload_end,
            end,
        })
    }
}

impl Iterator for Records<'_> {
    type Item = ResourceRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.parse()?;
        self.pos = record.end;
        Some(record)
    }
}

/// Store every embedded profile and pick up the resolution resource
pub fn decode(image: &mut Image, block: &[u8]) {
    for record in Records::new(block) {
        let payload = &block[record.payload.clone()];
        trace!(id = record.id, size = payload.len(), "8bim record");
        let name = match record.id {
            RESOLUTION_INFO => {
                if payload.len() >= 10 {
                    read_resolution(image, payload);
                }
                continue;
            }
            IPTC => "iptc",
            ICC_PROFILE => "icc",
            EXIF => "exif",
            XMP => "xmp",
            THUMBNAIL => {
                trace!("skipping 8bim thumbnail");
                continue;
            }
            _ => continue,
        };
        debug!(name, "extracting profile from 8bim");
        image.set_profile_internal(name, payload.to_vec(), true);
    }
}

fn read_resolution(image: &mut Image, payload: &[u8]) {
    let x = f64::from(BigEndian::read_u32(&payload[0..4])) / 65536.0;
    let units = BigEndian::read_u16(&payload[4..6]);
    let y = f64::from(payload.get(8..12).map_or(0, BigEndian::read_u32)) / 65536.0;
    if ResolutionUnits::from_u16(units) == ResolutionUnits::PixelsPerCentimeter {
        image.resolution = PointInfo::new(x / 2.54, y / 2.54);
        image.units = ResolutionUnits::PixelsPerCentimeter;
    } else {
        image.resolution = PointInfo::new(x, y);
        image.units = ResolutionUnits::PixelsPerInch;
    }
}

/// Rewrite the payload of the first record with `id`.
///
/// `None` removes the whole record. Returns false if no record matched.
pub fn rewrite(block: &mut Vec<u8>, id: u16, payload: Option<&[u8]>) -> bool {
    let Some(record) = Records::new(block).find(|r| r.id == id) else {
        return false;
    };
    match payload {
        None => {
            block.drain(record.start..record.end);
        }
        Some(payload) => {
            let mut replacement = Vec::with_capacity(payload.len() + 5);
            replacement.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            replacement.extend_from_slice(payload);
            if payload.len() % 2 == 1 {
                replacement.push(0);
            }
            block.splice(record.size_at..record.end, replacement);
        }
    }
    true
}

/// Canvas change applied to clipping paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRemap {
    pub old_columns: usize,
    pub old_rows: usize,
    pub geometry: RectangleInfo,
}

/// Bring the resolution resource (and optionally clipping paths) in line
/// with the image
pub fn sync(block: &mut [u8], state: &MetadataState, clip: Option<&ClipRemap>) {
    let records: Vec<ResourceRecord> = Records::new(block).collect();
    for record in records {
        let payload = &mut block[record.payload.clone()];
        if record.id == RESOLUTION_INFO && payload.len() == 16 {
            write_resolution(payload, state);
        } else if CLIP_PATHS.contains(&record.id) {
            if let Some(clip) = clip {
                trace!(id = record.id, "remapping clip path");
                clip_path::remap(payload, clip.old_columns, clip.old_rows, &clip.geometry);
            }
        }
    }
}

fn write_resolution(payload: &mut [u8], state: &MetadataState) {
    let scale = if state.units == ResolutionUnits::PixelsPerCentimeter {
        2.54 * 65536.0
    } else {
        65536.0
    };
    let units = state.units.to_u16();
    BigEndian::write_u32(&mut payload[0..4], (state.resolution.x * scale) as u32);
    BigEndian::write_u16(&mut payload[4..6], units);
    BigEndian::write_u32(&mut payload[8..12], (state.resolution.y * scale) as u32);
    BigEndian::write_u16(&mut payload[12..14], units);
}
