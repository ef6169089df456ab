//! Admission checks and repairs applied to every profile before storage

use tracing::debug;

use crate::error::Warning;
use crate::metadata::bytes::find;

/// End-of-packet marker of a writable XMP packet
pub const XMP_PACKET_END: &[u8] = b"<?xpacket end=\"w\"?>";

/// Marker that precedes a TIFF header in JPEG APP1 segments
pub const EXIF_SIGNATURE: &[u8] = b"Exif\0\0";

/// Shortest buffer that can hold an XMP document
const MIN_XMP_LENGTH: usize = 17;

/// Reject empty profiles and profiles over `limit` bytes
pub fn check_size(name: &str, length: usize, limit: usize) -> Result<(), Warning> {
    if length == 0 {
        return Err(Warning::EmptyProfile { name: name.into() });
    }
    if length > limit {
        return Err(Warning::ProfileSizeExceedsLimit {
            name: name.into(),
            length,
            limit,
        });
    }
    Ok(())
}

/// Drop anything after the XMP end-of-packet marker
pub fn repair_xmp(data: &mut Vec<u8>) -> bool {
    let Some(at) = find(data, XMP_PACKET_END) else {
        return false;
    };
    let end = at + XMP_PACKET_END.len();
    if end >= data.len() {
        return false;
    }
    debug!(trailing = data.len() - end, "trimming bytes after xmp packet");
    data.truncate(end);
    true
}

/// Prefix a bare TIFF payload with the `Exif\0\0` marker
pub fn repair_exif(data: &mut Vec<u8>) -> bool {
    if !(data.starts_with(b"MM") || data.starts_with(b"II")) {
        return false;
    }
    debug!("adding missing exif signature");
    data.splice(0..0, EXIF_SIGNATURE.iter().copied());
    true
}

/// Whether the buffer parses as an XML document
pub fn validate_xmp(data: &[u8]) -> bool {
    if data.len() < MIN_XMP_LENGTH {
        return false;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return false;
    };
    let text = text.trim_end_matches('\0');
    roxmltree::Document::parse(text).is_ok()
}

/// Storage key for a profile.
///
/// Names are lowercased; an `app1` payload that starts with the exact
/// bytes `exif` is stored as `exif`.
pub fn canonical_name(name: &str, data: &[u8]) -> String {
    let key = name.to_ascii_lowercase();
    if key == "app1" && data.starts_with(b"exif") {
        return "exif".into();
    }
    key
}
