//! Binary metadata walkers: 8BIM resource blocks, EXIF IFDs, XMP fields
//! and Photoshop clipping paths.

pub mod bytes;
pub mod clip_path;
pub mod eightbim;
pub mod exif;
pub mod xmp;

use crate::image::Image;
use crate::types::{Orientation, PointInfo, ResolutionUnits};

/// Image fields mirrored into metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetadataState {
    pub resolution: PointInfo,
    pub units: ResolutionUnits,
    pub orientation: Orientation,
}

impl MetadataState {
    pub fn of(image: &Image) -> Self {
        Self {
            resolution: image.resolution,
            units: image.units,
            orientation: image.orientation,
        }
    }
}
