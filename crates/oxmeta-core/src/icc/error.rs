//! ICC header error types

use std::fmt;

/// Errors that can occur when reading an ICC header
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IccError {
    /// Profile data is too small
    TooSmall { expected: usize, actual: usize },
    /// Invalid profile signature (should be 'acsp')
    InvalidSignature(u32),
    /// Unknown color space signature
    InvalidColorSpace(u32),
    /// Unknown profile class
    InvalidProfileClass(u32),
}

/// Render a signature as its four ASCII characters when printable
fn signature_text(sig: u32) -> String {
    let bytes = sig.to_be_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        format!("0x{:08X}", sig)
    }
}

impl fmt::Display for IccError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall { expected, actual } => {
                write!(
                    f,
                    "Profile too small: expected {} bytes, got {}",
                    expected, actual
                )
            }
            Self::InvalidSignature(sig) => {
                write!(
                    f,
                    "Invalid profile signature: '{}' (expected 'acsp')",
                    signature_text(*sig)
                )
            }
            Self::InvalidColorSpace(cs) => {
                write!(f, "Invalid color space: '{}'", signature_text(*cs))
            }
            Self::InvalidProfileClass(class) => {
                write!(f, "Invalid profile class: '{}'", signature_text(*class))
            }
        }
    }
}

impl std::error::Error for IccError {}
