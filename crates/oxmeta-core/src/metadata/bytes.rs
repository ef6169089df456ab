//! Bounds-checked integer access over metadata buffers

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order of a TIFF-style structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order from a TIFF `II`/`MM` marker
    pub fn from_marker(marker: &[u8]) -> Option<Self> {
        match marker.get(..2)? {
            b"II" => Some(Self::Little),
            b"MM" => Some(Self::Big),
            _ => None,
        }
    }

    pub fn read_u16(self, data: &[u8], at: usize) -> Option<u16> {
        let bytes = data.get(at..at.checked_add(2)?)?;
        Some(match self {
            Self::Little => LittleEndian::read_u16(bytes),
            Self::Big => BigEndian::read_u16(bytes),
        })
    }

    pub fn read_u32(self, data: &[u8], at: usize) -> Option<u32> {
        let bytes = data.get(at..at.checked_add(4)?)?;
        Some(match self {
            Self::Little => LittleEndian::read_u32(bytes),
            Self::Big => BigEndian::read_u32(bytes),
        })
    }

    pub fn write_u16(self, data: &mut [u8], at: usize, value: u16) -> bool {
        let Some(bytes) = at.checked_add(2).and_then(|end| data.get_mut(at..end)) else {
            return false;
        };
        match self {
            Self::Little => LittleEndian::write_u16(bytes, value),
            Self::Big => BigEndian::write_u16(bytes, value),
        }
        true
    }

    pub fn write_u32(self, data: &mut [u8], at: usize, value: u32) -> bool {
        let Some(bytes) = at.checked_add(4).and_then(|end| data.get_mut(at..end)) else {
            return false;
        };
        match self {
            Self::Little => LittleEndian::write_u32(bytes, value),
            Self::Big => BigEndian::write_u32(bytes, value),
        }
        true
    }
}

/// First position of `needle` in `haystack`
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
