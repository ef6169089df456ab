//! ICC profile header access
//!
//! Profiles are stored as opaque blobs; the color transform code only needs
//! the header signatures to pick a color-space descriptor and to recognize
//! device links.

pub mod header;

mod error;

pub use error::IccError;
pub use header::{ColorSpace, HEADER_SIZE, IccHeader, ProfileClass};
