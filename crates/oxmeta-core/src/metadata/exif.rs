//! EXIF (TIFF IFD) walking
//!
//! The walker follows the first IFD, the EXIF and Interoperability
//! sub-IFDs, and the next-IFD pointer of any directory that links to a
//! sub-IFD. Every bound is checked against the buffer; a malformed entry
//! ends the walk of its directory and nothing is reported to the caller.

use std::collections::HashSet;

use tracing::trace;

use super::MetadataState;
use super::bytes::{Endian, find};

/// Minimum size of a usable EXIF buffer
pub const MIN_EXIF_LENGTH: usize = 16;

/// Depth cap of the directory work list
pub const MAX_DIRECTORY_STACK: usize = 16;

pub const TAG_ORIENTATION: u16 = 0x0112;
pub const TAG_X_RESOLUTION: u16 = 0x011a;
pub const TAG_Y_RESOLUTION: u16 = 0x011b;
pub const TAG_RESOLUTION_UNIT: u16 = 0x0128;
pub const TAG_EXIF_OFFSET: u16 = 0x8769;
pub const TAG_INTEROP_OFFSET: u16 = 0xa005;

const EXIF_SIGNATURE: &[u8] = b"Exif\0\0";
const TIFF_MAGIC: u16 = 0x002a;
const ENTRY_SIZE: usize = 12;

/// Byte width of each entry format, indexed by format code
const FORMAT_BYTES: [usize; 13] = [0, 1, 1, 2, 4, 8, 1, 1, 2, 4, 8, 4, 8];

/// Entry format codes
mod format {
    pub const BYTE: u16 = 1;
    pub const STRING: u16 = 2;
    pub const USHORT: u16 = 3;
    pub const ULONG: u16 = 4;
    pub const URATIONAL: u16 = 5;
    pub const SBYTE: u16 = 6;
    pub const UNDEFINED: u16 = 7;
    pub const SSHORT: u16 = 8;
    pub const SLONG: u16 = 9;
    pub const SRATIONAL: u16 = 10;
    pub const SINGLE: u16 = 11;
    pub const DOUBLE: u16 = 12;
}

/// A directory entry whose value lies inside the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub format: u16,
    pub components: u32,
    /// Value position, relative to the TIFF header
    pub value_offset: usize,
    /// `components * width(format)`
    pub byte_len: usize,
}

/// Result of walking an EXIF buffer
#[derive(Debug, Clone)]
pub struct IfdWalk {
    pub endian: Endian,
    /// Position of the TIFF header inside the buffer
    pub tiff_start: usize,
    /// Entries in visit order
    pub entries: Vec<IfdEntry>,
}

/// Find the TIFF header, skipping a leading `Exif\0\0` marker
fn locate_header(buffer: &[u8]) -> Option<(usize, Endian)> {
    if buffer.len() < MIN_EXIF_LENGTH {
        return None;
    }
    let start = match Endian::from_marker(buffer) {
        Some(_) => 0,
        None => find(buffer, EXIF_SIGNATURE)? + EXIF_SIGNATURE.len(),
    };
    let tiff = &buffer[start..];
    if tiff.len() < MIN_EXIF_LENGTH {
        return None;
    }
    let endian = Endian::from_marker(tiff)?;
    if endian.read_u16(tiff, 2)? != TIFF_MAGIC {
        return None;
    }
    Some((start, endian))
}

/// Walk every reachable directory entry.
///
/// Returns `None` when the buffer has no valid TIFF header.
pub fn walk(buffer: &[u8]) -> Option<IfdWalk> {
    let (tiff_start, endian) = locate_header(buffer)?;
    let tiff = &buffer[tiff_start..];
    let length = tiff.len();

    let first = endian.read_u32(tiff, 4)? as usize;
    if first >= length {
        return None;
    }

    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(MAX_DIRECTORY_STACK);
    let (mut directory, mut entry) = (first, 0usize);
    loop {
        if directory <= length - 2 {
            let count = usize::from(endian.read_u16(tiff, directory).unwrap_or(0));
            while entry < count {
                let q = directory + 2 + ENTRY_SIZE * entry;
                if q + ENTRY_SIZE > length || !visited.insert(q) {
                    break;
                }
                let (Some(tag), Some(format), Some(components)) = (
                    endian.read_u16(tiff, q),
                    endian.read_u16(tiff, q + 2),
                    endian.read_u32(tiff, q + 4),
                ) else {
                    break;
                };
                let Some(&width) = FORMAT_BYTES.get(usize::from(format)) else {
                    break;
                };
                if (components as i32) < 0 {
                    break;
                }
                let Some(byte_len) = (components as usize).checked_mul(width) else {
                    break;
                };
                let value_offset = if byte_len <= 4 {
                    q + 8
                } else {
                    let offset = endian.read_u32(tiff, q + 8).unwrap_or(u32::MAX) as i32;
                    let in_bounds = offset >= 0
                        && (offset as usize)
                            .checked_add(byte_len)
                            .is_some_and(|end| end <= length);
                    if !in_bounds {
                        entry += 1;
                        continue;
                    }
                    offset as usize
                };
                entries.push(IfdEntry {
                    tag,
                    format,
                    components,
                    value_offset,
                    byte_len,
                });

                if tag == TAG_EXIF_OFFSET || tag == TAG_INTEROP_OFFSET {
                    let sub = endian
                        .read_u32(tiff, value_offset)
                        .map_or(usize::MAX, |v| v as usize);
                    if sub < length && stack.len() < MAX_DIRECTORY_STACK - 2 {
                        trace!(tag, sub, "following exif sub-directory");
                        stack.push((directory, entry + 1));
                        stack.push((sub, 0));
                        let next_at = directory + 2 + ENTRY_SIZE * count;
                        if let Some(next) = endian.read_u32(tiff, next_at) {
                            let next = next as usize;
                            if next != 0 && next < length && stack.len() < MAX_DIRECTORY_STACK - 2 {
                                stack.push((next, 0));
                            }
                        }
                    }
                    break;
                }
                entry += 1;
            }
        }
        match stack.pop() {
            Some((d, e)) => {
                directory = d;
                entry = e;
            }
            None => break,
        }
    }

    Some(IfdWalk {
        endian,
        tiff_start,
        entries,
    })
}

/// Rewrite resolution, orientation and unit tags in place.
///
/// Returns false when the buffer carries no usable TIFF header.
pub fn sync(buffer: &mut [u8], state: &MetadataState) -> bool {
    let Some(walk) = walk(buffer) else {
        return false;
    };
    let endian = walk.endian;
    let tiff = &mut buffer[walk.tiff_start..];
    for entry in &walk.entries {
        let at = entry.value_offset;
        match entry.tag {
            TAG_X_RESOLUTION | TAG_Y_RESOLUTION => {
                let resolution = if entry.tag == TAG_X_RESOLUTION {
                    state.resolution.x
                } else {
                    state.resolution.y
                };
                endian.write_u32(tiff, at, (resolution + 0.5) as u32);
                if entry.byte_len == 8 {
                    endian.write_u32(tiff, at + 4, 1);
                }
            }
            TAG_ORIENTATION | TAG_RESOLUTION_UNIT => {
                let value = if entry.tag == TAG_ORIENTATION {
                    state.orientation.to_u16()
                } else {
                    state.units.to_u16() + 1
                };
                if entry.byte_len == 4 {
                    endian.write_u32(tiff, at, u32::from(value));
                } else {
                    endian.write_u16(tiff, at, value);
                }
            }
            _ => {}
        }
    }
    true
}

/// Property names published for known tags
const TAG_NAMES: &[(u16, &str)] = &[
    (0x0001, "exif:InteroperabilityIndex"),
    (0x0002, "exif:InteroperabilityVersion"),
    (0x0100, "exif:ImageWidth"),
    (0x0101, "exif:ImageLength"),
    (0x010e, "exif:ImageDescription"),
    (0x010f, "exif:Make"),
    (0x0110, "exif:Model"),
    (0x0112, "exif:Orientation"),
    (0x011a, "exif:XResolution"),
    (0x011b, "exif:YResolution"),
    (0x0128, "exif:ResolutionUnit"),
    (0x0131, "exif:Software"),
    (0x0132, "exif:DateTime"),
    (0x013b, "exif:Artist"),
    (0x0213, "exif:YCbCrPositioning"),
    (0x8298, "exif:Copyright"),
    (0x829a, "exif:ExposureTime"),
    (0x829d, "exif:FNumber"),
    (0x8769, "exif:ExifOffset"),
    (0x8822, "exif:ExposureProgram"),
    (0x8827, "exif:PhotographicSensitivity"),
    (0x9000, "exif:ExifVersion"),
    (0x9003, "exif:DateTimeOriginal"),
    (0x9004, "exif:DateTimeDigitized"),
    (0x9201, "exif:ShutterSpeedValue"),
    (0x9202, "exif:ApertureValue"),
    (0x9204, "exif:ExposureBiasValue"),
    (0x9207, "exif:MeteringMode"),
    (0x9209, "exif:Flash"),
    (0x920a, "exif:FocalLength"),
    (0xa000, "exif:FlashPixVersion"),
    (0xa001, "exif:ColorSpace"),
    (0xa002, "exif:PixelXDimension"),
    (0xa003, "exif:PixelYDimension"),
    (0xa005, "exif:InteroperabilityOffset"),
    (0xa402, "exif:ExposureMode"),
    (0xa403, "exif:WhiteBalance"),
    (0xa406, "exif:SceneCaptureType"),
];

fn tag_name(tag: u16) -> Option<&'static str> {
    TAG_NAMES
        .iter()
        .find(|(id, _)| *id == tag)
        .map(|(_, name)| *name)
}

fn join<T: ToString>(values: impl Iterator<Item = T>) -> String {
    values.map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

/// Render an entry value the way properties expect it
fn format_value(endian: Endian, tiff: &[u8], entry: &IfdEntry) -> Option<String> {
    let at = entry.value_offset;
    // inline values always have their full 4-byte slot
    let span = entry.byte_len.max(4);
    let value = tiff.get(at..at + span)?;
    let count = entry.components as usize;
    let text = match entry.format {
        format::BYTE | format::UNDEFINED => join(value.iter().take(count)),
        format::SBYTE => join(value.iter().take(count).map(|&b| b as i8)),
        format::USHORT => join((0..count).filter_map(|i| endian.read_u16(value, i * 2))),
        format::SSHORT => join(
            (0..count).filter_map(|i| endian.read_u16(value, i * 2).map(|v| v as i16)),
        ),
        format::ULONG => join((0..count).filter_map(|i| endian.read_u32(value, i * 4))),
        format::SLONG => join(
            (0..count).filter_map(|i| endian.read_u32(value, i * 4).map(|v| v as i32)),
        ),
        format::URATIONAL | format::SRATIONAL => join((0..count).filter_map(|i| {
            let n = endian.read_u32(value, i * 8)?;
            let d = endian.read_u32(value, i * 8 + 4)?;
            Some(if entry.format == format::URATIONAL {
                format!("{}/{}", n, d)
            } else {
                format!("{}/{}", n as i32, d as i32)
            })
        })),
        format::SINGLE => join((0..count).filter_map(|i| {
            endian
                .read_u32(value, i * 4)
                .map(|bits| format!("{:.6}", f32::from_bits(bits)))
        })),
        format::DOUBLE => join((0..count).filter_map(|i| {
            let lo = endian.read_u32(value, i * 8)?;
            let hi = endian.read_u32(value, i * 8 + 4)?;
            let bits = match endian {
                Endian::Little => (u64::from(hi) << 32) | u64::from(lo),
                Endian::Big => (u64::from(lo) << 32) | u64::from(hi),
            };
            Some(format!("{:.6}", f64::from_bits(bits)))
        })),
        format::STRING => value
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect(),
        _ => return None,
    };
    Some(text)
}

/// `exif:*` properties for every known tag, first occurrence wins
pub fn properties(buffer: &[u8]) -> Vec<(&'static str, String)> {
    let Some(walk) = walk(buffer) else {
        return Vec::new();
    };
    let tiff = &buffer[walk.tiff_start..];
    let mut out: Vec<(&'static str, String)> = Vec::new();
    for entry in &walk.entries {
        let Some(name) = tag_name(entry.tag) else {
            continue;
        };
        if out.iter().any(|(key, _)| *key == name) {
            continue;
        }
        if let Some(value) = format_value(walk.endian, tiff, entry) {
            out.push((name, value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Orientation, PointInfo, ResolutionUnits};

    /// Little-endian TIFF with IFD0: orientation (short), x resolution
    /// (rational at an offset) and resolution unit (short)
    fn sample() -> Vec<u8> {
        let mut data = b"II".to_vec();
        data.extend(0x2au16.to_le_bytes());
        data.extend(8u32.to_le_bytes());
        data.extend(3u16.to_le_bytes());
        let rational_at = 8 + 2 + 3 * 12 + 4;
        for (tag, fmt, count, value) in [
            (TAG_ORIENTATION, 3u16, 1u32, 1u32),
            (TAG_X_RESOLUTION, 5, 1, rational_at as u32),
            (TAG_RESOLUTION_UNIT, 3, 1, 2),
        ] {
            data.extend(tag.to_le_bytes());
            data.extend(fmt.to_le_bytes());
            data.extend(count.to_le_bytes());
            data.extend(value.to_le_bytes());
        }
        data.extend(0u32.to_le_bytes());
        data.extend(72u32.to_le_bytes());
        data.extend(1u32.to_le_bytes());
        data
    }

    fn state() -> MetadataState {
        MetadataState {
            resolution: PointInfo::new(299.7, 150.0),
            units: ResolutionUnits::PixelsPerCentimeter,
            orientation: Orientation::BottomRight,
        }
    }

    #[test]
    fn test_walk_entries() {
        let walk = walk(&sample()).unwrap();
        assert_eq!(walk.endian, Endian::Little);
        assert_eq!(walk.entries.len(), 3);
        assert_eq!(walk.entries[1].byte_len, 8);
        assert_eq!(walk.entries[1].value_offset, 50);
    }

    #[test]
    fn test_sync_writes_in_place() {
        let mut data = sample();
        let length = data.len();
        assert!(sync(&mut data, &state()));
        assert_eq!(data.len(), length);
        assert_eq!(Endian::Little.read_u16(&data, 8 + 2 + 8), Some(3));
        assert_eq!(Endian::Little.read_u32(&data, 50), Some(300));
        assert_eq!(Endian::Little.read_u32(&data, 54), Some(1));
        assert_eq!(Endian::Little.read_u16(&data, 8 + 2 + 24 + 8), Some(3));
    }

    #[test]
    fn test_signature_prefix_is_skipped() {
        let mut data = b"Exif\0\0".to_vec();
        data.extend(sample());
        assert!(sync(&mut data, &state()));
        assert_eq!(Endian::Little.read_u32(&data, 6 + 50), Some(300));
    }

    #[test]
    fn test_short_buffer_untouched() {
        let mut data = b"II*\0\x08\0\0\0\0\0".to_vec();
        let original = data.clone();
        assert!(!sync(&mut data, &state()));
        assert_eq!(data, original);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = sample();
        data[2] = 0x2b;
        assert!(walk(&data).is_none());
    }

    #[test]
    fn test_out_of_bounds_offset_is_skipped() {
        let mut data = sample();
        // point the rational far outside the buffer
        data[8 + 2 + 12 + 8..8 + 2 + 12 + 12].copy_from_slice(&0xffffu32.to_le_bytes());
        let walk = walk(&data).unwrap();
        assert_eq!(walk.entries.len(), 2);
        assert_eq!(walk.entries[1].tag, TAG_RESOLUTION_UNIT);
    }

    #[test]
    fn test_self_referencing_sub_ifd_terminates() {
        let mut data = b"MM".to_vec();
        data.extend(0x2au16.to_be_bytes());
        data.extend(8u32.to_be_bytes());
        data.extend(1u16.to_be_bytes());
        data.extend(TAG_EXIF_OFFSET.to_be_bytes());
        data.extend(4u16.to_be_bytes());
        data.extend(1u32.to_be_bytes());
        data.extend(8u32.to_be_bytes());
        data.extend(8u32.to_be_bytes());
        let walk = walk(&data).unwrap();
        assert_eq!(walk.entries.len(), 1);
    }

    #[test]
    fn test_properties() {
        let props = properties(&sample());
        assert!(props.contains(&("exif:Orientation", "1".to_string())));
        assert!(props.contains(&("exif:XResolution", "72/1".to_string())));
        assert!(props.contains(&("exif:ResolutionUnit", "2".to_string())));
    }

    #[test]
    fn test_string_property_stops_at_nul() {
        let mut data = b"II".to_vec();
        data.extend(0x2au16.to_le_bytes());
        data.extend(8u32.to_le_bytes());
        data.extend(1u16.to_le_bytes());
        data.extend(0x0001u16.to_le_bytes());
        data.extend(2u16.to_le_bytes());
        data.extend(4u32.to_le_bytes());
        data.extend(b"R98\0");
        data.extend(0u32.to_le_bytes());
        let props = properties(&data);
        assert_eq!(
            props,
            vec![("exif:InteroperabilityIndex", "R98".to_string())]
        );
    }
}
