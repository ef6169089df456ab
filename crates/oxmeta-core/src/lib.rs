//! # oxmeta - image profile and metadata handling
//!
//! The metadata and color-profile layer of a raster image toolkit.
//!
//! ## Overview
//!
//! - **Profile store**: named binary profiles (ICC, IPTC, EXIF, XMP, 8BIM,
//!   anything else) owned by each [`Image`], sanitized on the way in
//! - **8BIM**: Photoshop resource blocks are fanned out into their embedded
//!   profiles and kept in sync when those profiles change
//! - **EXIF / XMP**: resolution, units and orientation are patched in place
//!   after geometry changes
//! - **Clipping paths**: Photoshop path knots follow crops and resizes
//! - **Color transforms**: applying an ICC profile converts pixels through a
//!   pluggable [`ColorEngine`] (default: `moxcms`) in a parallel row scan
//!
//! ## Quick Start
//!
//! ```no_run
//! use oxmeta_core::{Colorspace, Image, SRGB_ICC};
//!
//! let mut image = Image::new(640, 480, Colorspace::Srgb);
//!
//! // Tag the pixels as sRGB; nothing is converted
//! image.profile_image("icc", Some(SRGB_ICC)).unwrap();
//! assert!(image.get_profile("icc").is_some());
//!
//! // Keep embedded metadata consistent after editing
//! image.resolution.x = 300.0;
//! image.resolution.y = 300.0;
//! image.sync_profiles();
//!
//! // Drop every profile except the ICC one
//! image.profile_image("*,!icc", None).unwrap();
//! ```

pub mod cms;
pub mod error;
pub mod icc;
pub mod image;
pub mod metadata;
pub mod profile;
pub mod sanitize;
pub mod settings;
pub mod store;
pub mod transform;
pub mod types;

pub use cms::{
    CmsContext, ColorEngine, ColorSpaceDescriptor, ColorSpaceKind, MoxcmsEngine, PixelFormat,
    Precision, TransformFlags,
};
pub use error::{Error, Result, Warning};
pub use icc::{IccHeader, ProfileClass};
pub use image::{ChannelLayout, Image, PixelChannel, ProgressMonitor, Quantum, QUANTUM_RANGE};
pub use metadata::MetadataState;
pub use metadata::eightbim::ClipRemap;
pub use profile::XMP_VALIDATE_ARTIFACT;
pub use settings::ProfileSettings;
pub use store::{Profile, ProfileStore};
pub use transform::{ColorTransformEngine, HIGHRES_ARTIFACT, PROGRESS_TAG};
pub use types::{
    Colorspace, ImageType, Orientation, PointInfo, RectangleInfo, RenderingIntent,
    ResolutionUnits,
};

/// Built-in sRGB display profile (ICC v2, 3212 bytes)
pub const SRGB_ICC: &[u8] = include_bytes!("data/srgb.icc");

/// Version of oxmeta
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
