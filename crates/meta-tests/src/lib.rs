//! # meta-tests
//!
//! Fixtures and integration tests for oxmeta.
//!
//! This crate provides:
//! - Byte-exact builders for 8BIM, EXIF, XMP and clipping-path blobs
//! - Real ICC profiles generated with lcms2
//! - An analytic reference color engine with predictable output
//! - Deterministic test images
//!
//! ## Test Categories
//!
//! 1. **Profile store**: sanitizing, naming, iteration
//! 2. **Metadata walkers**: 8BIM fan-out, EXIF IFDs, XMP fields, clip paths
//! 3. **Profile application**: association, conversion, removal

pub mod fixtures;
pub mod patterns;
pub mod profiles;
pub mod reference;

pub use reference::ReferenceEngine;
