//! Image state types shared by the profile and metadata code

/// Pixel colorspace of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Colorspace {
    /// sRGB (the default for decoded images)
    #[default]
    Srgb,
    /// Single-channel grayscale
    Gray,
    /// Cyan, magenta, yellow, black
    Cmyk,
    /// CIELAB
    Lab,
    /// CIEXYZ
    Xyz,
}

impl Colorspace {
    /// Number of color channels (alpha excluded)
    pub fn color_channels(&self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Srgb | Self::Lab | Self::Xyz => 3,
            Self::Cmyk => 4,
        }
    }

    pub fn is_gray(&self) -> bool {
        matches!(self, Self::Gray)
    }

    pub fn is_cmyk(&self) -> bool {
        matches!(self, Self::Cmyk)
    }
}

/// Image type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum ImageType {
    #[default]
    Undefined,
    Grayscale,
    GrayscaleAlpha,
    TrueColor,
    TrueColorAlpha,
    ColorSeparation,
    ColorSeparationAlpha,
}

/// Resolution units; the discriminants match the stored enum values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResolutionUnits {
    #[default]
    Undefined = 0,
    PixelsPerInch = 1,
    PixelsPerCentimeter = 2,
}

impl ResolutionUnits {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::PixelsPerInch,
            2 => Self::PixelsPerCentimeter,
            _ => Self::Undefined,
        }
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

/// EXIF orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Undefined = 0,
    TopLeft = 1,
    TopRight = 2,
    BottomRight = 3,
    BottomLeft = 4,
    LeftTop = 5,
    RightTop = 6,
    RightBottom = 7,
    LeftBottom = 8,
}

impl Orientation {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::TopLeft,
            2 => Self::TopRight,
            3 => Self::BottomRight,
            4 => Self::BottomLeft,
            5 => Self::LeftTop,
            6 => Self::RightTop,
            7 => Self::RightBottom,
            8 => Self::LeftBottom,
            _ => Self::Undefined,
        }
    }

    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

/// Rendering intent stored on an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderingIntent {
    /// No intent recorded; transforms use perceptual
    #[default]
    Undefined,
    /// Saturation - maintains saturation, may shift hue
    Saturation,
    /// Perceptual rendering intent - best for photographic images
    Perceptual,
    /// Absolute colorimetric - preserves white point
    Absolute,
    /// Relative colorimetric - preserves in-gamut colors, clips out-of-gamut
    Relative,
}

impl From<RenderingIntent> for moxcms::RenderingIntent {
    fn from(intent: RenderingIntent) -> Self {
        match intent {
            RenderingIntent::Undefined | RenderingIntent::Perceptual => Self::Perceptual,
            RenderingIntent::Saturation => Self::Saturation,
            RenderingIntent::Absolute => Self::AbsoluteColorimetric,
            RenderingIntent::Relative => Self::RelativeColorimetric,
        }
    }
}

impl From<moxcms::RenderingIntent> for RenderingIntent {
    fn from(intent: moxcms::RenderingIntent) -> Self {
        match intent {
            moxcms::RenderingIntent::Perceptual => Self::Perceptual,
            moxcms::RenderingIntent::RelativeColorimetric => Self::Relative,
            moxcms::RenderingIntent::Saturation => Self::Saturation,
            moxcms::RenderingIntent::AbsoluteColorimetric => Self::Absolute,
        }
    }
}

/// A 2-D point, used for resolution
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointInfo {
    pub x: f64,
    pub y: f64,
}

impl PointInfo {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Region geometry: size plus offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RectangleInfo {
    pub width: usize,
    pub height: usize,
    pub x: i64,
    pub y: i64,
}

impl RectangleInfo {
    pub const fn new(width: usize, height: usize, x: i64, y: i64) -> Self {
        Self {
            width,
            height,
            x,
            y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorspace_channels() {
        assert_eq!(Colorspace::Srgb.color_channels(), 3);
        assert_eq!(Colorspace::Cmyk.color_channels(), 4);
        assert_eq!(Colorspace::Gray.color_channels(), 1);
        assert_eq!(Colorspace::Lab.color_channels(), 3);
    }

    #[test]
    fn test_units_roundtrip() {
        for units in [
            ResolutionUnits::Undefined,
            ResolutionUnits::PixelsPerInch,
            ResolutionUnits::PixelsPerCentimeter,
        ] {
            assert_eq!(ResolutionUnits::from_u16(units.to_u16()), units);
        }
        assert_eq!(ResolutionUnits::from_u16(9), ResolutionUnits::Undefined);
    }

    #[test]
    fn test_orientation_values() {
        assert_eq!(Orientation::RightTop.to_u16(), 6);
        assert_eq!(Orientation::from_u16(8), Orientation::LeftBottom);
        assert_eq!(Orientation::from_u16(0), Orientation::Undefined);
    }

    #[test]
    fn test_intent_to_moxcms() {
        let intent: moxcms::RenderingIntent = RenderingIntent::Undefined.into();
        assert_eq!(intent, moxcms::RenderingIntent::Perceptual);
        let intent: moxcms::RenderingIntent = RenderingIntent::Absolute.into();
        assert_eq!(intent, moxcms::RenderingIntent::AbsoluteColorimetric);
    }
}
