//! Color space classification and sample scaling

use crate::error::{Error, Result};
use crate::icc::ColorSpace;
use crate::image::{QUANTUM_RANGE, QUANTUM_SCALE, Quantum, clamp_to_quantum};
use crate::types::{Colorspace, ImageType};

/// Color spaces the transform engine can convert between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpaceKind {
    Gray,
    Rgb,
    Cmyk,
    Lab,
    Xyz,
}

impl ColorSpaceKind {
    pub fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb | Self::Lab | Self::Xyz => 3,
            Self::Cmyk => 4,
        }
    }

    /// Image colorspace after converting into this space
    pub fn colorspace(self) -> Colorspace {
        match self {
            Self::Gray => Colorspace::Gray,
            Self::Rgb => Colorspace::Srgb,
            Self::Cmyk => Colorspace::Cmyk,
            Self::Lab => Colorspace::Lab,
            Self::Xyz => Colorspace::Xyz,
        }
    }

    /// Image type after converting into this space; `None` keeps the
    /// current type
    pub fn image_type(self, alpha: bool) -> Option<ImageType> {
        match (self, alpha) {
            (Self::Gray, false) => Some(ImageType::Grayscale),
            (Self::Gray, true) => Some(ImageType::GrayscaleAlpha),
            (Self::Rgb, false) => Some(ImageType::TrueColor),
            (Self::Rgb, true) => Some(ImageType::TrueColorAlpha),
            (Self::Cmyk, false) => Some(ImageType::ColorSeparation),
            (Self::Cmyk, true) => Some(ImageType::ColorSeparationAlpha),
            (Self::Lab | Self::Xyz, _) => None,
        }
    }
}

impl TryFrom<ColorSpace> for ColorSpaceKind {
    type Error = Error;

    fn try_from(space: ColorSpace) -> Result<Self> {
        match space {
            ColorSpace::Gray => Ok(Self::Gray),
            ColorSpace::Rgb => Ok(Self::Rgb),
            ColorSpace::Cmyk => Ok(Self::Cmyk),
            ColorSpace::Lab => Ok(Self::Lab),
            ColorSpace::Xyz => Ok(Self::Xyz),
            other => Err(Error::UnsupportedColorSpace(format!("{:?}", other))),
        }
    }
}

/// Sample type handed to the color engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// `f64` samples, scaled per channel
    Double,
    /// Raw 16-bit quanta
    Quantum,
}

/// How one side of a transform lays out and scales its samples.
///
/// In [`Precision::Double`] mode a quantum `q` is handed to the engine as
/// `scale[c] * (q / QuantumRange + translate[c])`, and engine output `v` is
/// stored back as `QuantumRange * (v / scale[c] - translate[c])`. In
/// [`Precision::Quantum`] mode quanta pass through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpaceDescriptor {
    pub kind: ColorSpaceKind,
    pub channels: usize,
    pub precision: Precision,
    pub scale: [f64; 4],
    pub translate: [f64; 4],
}

#[cfg(not(feature = "extended-range"))]
const LAB_CHROMA_TRANSLATE: f64 = -0.5;
#[cfg(feature = "extended-range")]
const LAB_CHROMA_TRANSLATE: f64 = 0.0;

impl ColorSpaceDescriptor {
    /// Classic CMS numeric ranges: CMYK in percent, L in [0, 100] and
    /// a/b centered on zero, everything else in [0, 1]
    pub fn new(kind: ColorSpaceKind, precision: Precision) -> Self {
        let (scale, translate) = match kind {
            ColorSpaceKind::Cmyk => ([100.0; 4], [0.0; 4]),
            ColorSpaceKind::Lab => (
                [100.0, 255.0, 255.0, 1.0],
                [0.0, LAB_CHROMA_TRANSLATE, LAB_CHROMA_TRANSLATE, 0.0],
            ),
            ColorSpaceKind::Gray | ColorSpaceKind::Rgb | ColorSpaceKind::Xyz => {
                ([1.0; 4], [0.0; 4])
            }
        };
        Self {
            kind,
            channels: kind.channels(),
            precision,
            scale,
            translate,
        }
    }

    /// Every channel normalized to [0, 1]
    pub fn identity(kind: ColorSpaceKind, precision: Precision) -> Self {
        Self {
            kind,
            channels: kind.channels(),
            precision,
            scale: [1.0; 4],
            translate: [0.0; 4],
        }
    }

    /// Bytes per sample handed to the engine
    pub fn sample_size(&self) -> usize {
        match self.precision {
            Precision::Double => std::mem::size_of::<f64>(),
            Precision::Quantum => std::mem::size_of::<Quantum>(),
        }
    }

    /// Convert one pixel's quanta into engine samples
    #[inline]
    pub fn gather(&self, quanta: &[Quantum], samples: &mut [f64]) {
        for (c, (q, v)) in quanta.iter().zip(samples.iter_mut()).enumerate() {
            *v = self.scale[c] * (f64::from(*q) * QUANTUM_SCALE + self.translate[c]);
        }
    }

    /// Convert one pixel's engine samples back into quanta
    #[inline]
    pub fn scatter(&self, samples: &[f64], quanta: &mut [Quantum]) {
        for (c, (v, q)) in samples.iter().zip(quanta.iter_mut()).enumerate() {
            *q = clamp_to_quantum(QUANTUM_RANGE * (v / self.scale[c] - self.translate[c]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_signature() {
        assert_eq!(
            ColorSpaceKind::try_from(ColorSpace::Cmyk).unwrap(),
            ColorSpaceKind::Cmyk
        );
        assert!(matches!(
            ColorSpaceKind::try_from(ColorSpace::Hsv),
            Err(Error::UnsupportedColorSpace(_))
        ));
        assert!(ColorSpaceKind::try_from(ColorSpace::MultiColor(6)).is_err());
    }

    #[test]
    fn test_channel_counts() {
        assert_eq!(ColorSpaceKind::Gray.channels(), 1);
        assert_eq!(ColorSpaceKind::Lab.channels(), 3);
        assert_eq!(ColorSpaceKind::Cmyk.channels(), 4);
        let descriptor = ColorSpaceDescriptor::new(ColorSpaceKind::Xyz, Precision::Double);
        assert_eq!(descriptor.channels, 3);
        assert_eq!(descriptor.sample_size(), 8);
    }

    #[test]
    fn test_cmyk_scaling() {
        let descriptor = ColorSpaceDescriptor::new(ColorSpaceKind::Cmyk, Precision::Double);
        let mut samples = [0.0; 4];
        descriptor.gather(&[0, 65535, 32768, 0], &mut samples);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 100.0);
        assert!((samples[2] - 50.0).abs() < 0.01);

        let mut quanta = [0; 4];
        descriptor.scatter(&[100.0, 0.0, 150.0, -3.0], &mut quanta);
        assert_eq!(quanta, [65535, 0, 65535, 0]);
    }

    #[cfg(not(feature = "extended-range"))]
    #[test]
    fn test_lab_chroma_is_centered() {
        let descriptor = ColorSpaceDescriptor::new(ColorSpaceKind::Lab, Precision::Double);
        let mut samples = [0.0; 3];
        descriptor.gather(&[65535, 0, 65535], &mut samples);
        assert!((samples[0] - 100.0).abs() < 1e-9);
        assert!((samples[1] + 127.5).abs() < 1e-9);
        assert!((samples[2] - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_gather_scatter_inverse() {
        for kind in [
            ColorSpaceKind::Gray,
            ColorSpaceKind::Rgb,
            ColorSpaceKind::Cmyk,
            ColorSpaceKind::Lab,
        ] {
            let descriptor = ColorSpaceDescriptor::new(kind, Precision::Double);
            let quanta = [1234u16, 40000, 65535, 7];
            let mut samples = [0.0; 4];
            let mut back = [0u16; 4];
            let n = descriptor.channels;
            descriptor.gather(&quanta[..n], &mut samples[..n]);
            descriptor.scatter(&samples[..n], &mut back[..n]);
            assert_eq!(&back[..n], &quanta[..n], "{:?}", kind);
        }
    }

    #[test]
    fn test_image_type() {
        assert_eq!(
            ColorSpaceKind::Cmyk.image_type(true),
            Some(ImageType::ColorSeparationAlpha)
        );
        assert_eq!(ColorSpaceKind::Lab.image_type(false), None);
    }
}
