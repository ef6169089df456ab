//! Analytic reference color engine
//!
//! Converts between gray, RGB and CMYK with closed-form formulas and no
//! color management at all, which makes pixel results exactly predictable.
//! Lab and XYZ are supported as targets only: RGB samples are taken as
//! linear sRGB primaries under a D65 white. Profiles are only read for
//! their header, so any ICC header with a supported data color space is
//! enough to drive a conversion.

use oxmeta_core::{
    CmsContext, ColorEngine, ColorSpaceDescriptor, ColorSpaceKind, Error, IccHeader,
    PixelFormat, Precision, RenderingIntent, Result, TransformFlags,
};

/// Opened reference profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceProfile {
    pub space: ColorSpaceKind,
    /// Output side of a device link
    pub link_output: Option<ColorSpaceKind>,
}

/// Bound reference transform
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTransform {
    source: ColorSpaceDescriptor,
    target: ColorSpaceDescriptor,
}

/// Closed-form gray / RGB / CMYK converter
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngine;

/// Rec. 709 luma weights
const LUMA: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Linear sRGB to XYZ, D65
const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

const D65_WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];

fn rgb_to_xyz(rgb: [f64; 3]) -> [f64; 3] {
    RGB_TO_XYZ.map(|row| row.iter().zip(rgb).map(|(m, c)| m * c).sum())
}

fn lab_f(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

/// CIE L*a*b* with L in [0, 100]
pub fn rgb_to_lab(rgb: [f64; 3]) -> [f64; 3] {
    let xyz = rgb_to_xyz(rgb);
    let [fx, fy, fz] = [0, 1, 2].map(|c| lab_f(xyz[c] / D65_WHITE[c]));
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

fn to_rgb(kind: ColorSpaceKind, v: &[f64]) -> Result<[f64; 3]> {
    Ok(match kind {
        ColorSpaceKind::Gray => [v[0]; 3],
        ColorSpaceKind::Rgb => [v[0], v[1], v[2]],
        ColorSpaceKind::Cmyk => {
            let k = 1.0 - v[3];
            [(1.0 - v[0]) * k, (1.0 - v[1]) * k, (1.0 - v[2]) * k]
        }
        other => return Err(Error::Transform(format!("reference: no path from {:?}", other))),
    })
}

fn from_rgb(kind: ColorSpaceKind, rgb: [f64; 3], out: &mut [f64]) -> Result<()> {
    match kind {
        ColorSpaceKind::Gray => {
            out[0] = rgb.iter().zip(LUMA).map(|(c, w)| c * w).sum();
        }
        ColorSpaceKind::Rgb => out[..3].copy_from_slice(&rgb),
        ColorSpaceKind::Cmyk => {
            let max = rgb.iter().copied().fold(0.0, f64::max);
            let k = 1.0 - max;
            for (c, value) in rgb.iter().enumerate() {
                out[c] = if max > 0.0 { (max - value) / max } else { 0.0 };
            }
            out[3] = k;
        }
        ColorSpaceKind::Lab => out[..3].copy_from_slice(&rgb_to_lab(rgb)),
        ColorSpaceKind::Xyz => out[..3].copy_from_slice(&rgb_to_xyz(rgb)),
    }
    Ok(())
}

/// Turn converted values into the engine units of `descriptor`; Lab and
/// XYZ are already produced in their own units
fn to_engine_units(descriptor: &ColorSpaceDescriptor, values: &mut [f64]) {
    if matches!(descriptor.kind, ColorSpaceKind::Lab | ColorSpaceKind::Xyz) {
        return;
    }
    for (c, value) in values.iter_mut().enumerate() {
        *value = descriptor.scale[c] * (*value + descriptor.translate[c]);
    }
}

/// Convert one pixel of normalized samples.
///
/// Gray, RGB and CMYK come out normalized to [0, 1]; Lab and XYZ come out
/// in CIE units.
pub fn convert_pixel(
    from: ColorSpaceKind,
    to: ColorSpaceKind,
    source: &[f64],
    target: &mut [f64],
) -> Result<()> {
    let rgb = to_rgb(from, source)?;
    from_rgb(to, rgb.map(|c| c.clamp(0.0, 1.0)), target)
}

impl ColorEngine for ReferenceEngine {
    type Profile = ReferenceProfile;
    type Transform = ReferenceTransform;

    fn open_profile(&self, data: &[u8], ctx: &CmsContext) -> Result<Self::Profile> {
        let header = IccHeader::parse(data).inspect_err(|e| ctx.report(e.to_string()))?;
        let space = ColorSpaceKind::try_from(header.data_color_space()?)?;
        let link_output = if header.is_device_link() {
            Some(ColorSpaceKind::try_from(header.connection_space()?)?)
        } else {
            None
        };
        Ok(ReferenceProfile { space, link_output })
    }

    fn create_transform(
        &self,
        source: &Self::Profile,
        source_format: PixelFormat,
        target: Option<&Self::Profile>,
        target_format: PixelFormat,
        _intent: RenderingIntent,
        _flags: TransformFlags,
        ctx: &CmsContext,
    ) -> Result<Self::Transform> {
        let output = match target {
            Some(target) => target.space,
            None => source.link_output.ok_or_else(|| {
                ctx.report("reference: missing target profile");
                Error::Transform("missing target profile".into())
            })?,
        };
        if source.space != source_format.kind || output != target_format.kind {
            return Err(Error::Transform(format!(
                "reference: format {:?} -> {:?} does not match profiles {:?} -> {:?}",
                source_format.kind, target_format.kind, source.space, output
            )));
        }
        Ok(ReferenceTransform {
            source: self.descriptor(source_format.kind, source_format.precision),
            target: self.descriptor(target_format.kind, target_format.precision),
        })
    }

    fn transform_f64(
        &self,
        transform: &mut Self::Transform,
        source: &[f64],
        target: &mut [f64],
        pixels: usize,
    ) -> Result<()> {
        let (sd, td) = (transform.source, transform.target);
        let pixel_pairs = source
            .chunks_exact(sd.channels)
            .zip(target.chunks_exact_mut(td.channels))
            .take(pixels);
        for (input, output) in pixel_pairs {
            let mut normalized = [0.0; 4];
            for (c, value) in input.iter().enumerate() {
                normalized[c] = value / sd.scale[c] - sd.translate[c];
            }
            convert_pixel(sd.kind, td.kind, &normalized[..sd.channels], output)?;
            to_engine_units(&td, output);
        }
        Ok(())
    }

    fn transform_u16(
        &self,
        transform: &mut Self::Transform,
        source: &[u16],
        target: &mut [u16],
        pixels: usize,
    ) -> Result<()> {
        let (sd, td) = (transform.source, transform.target);
        let pixel_pairs = source
            .chunks_exact(sd.channels)
            .zip(target.chunks_exact_mut(td.channels))
            .take(pixels);
        for (input, output) in pixel_pairs {
            let mut normalized = [0.0; 4];
            for (c, value) in input.iter().enumerate() {
                normalized[c] = f64::from(*value) / 65535.0;
            }
            let mut converted = [0.0; 4];
            let converted = &mut converted[..td.channels];
            convert_pixel(sd.kind, td.kind, &normalized[..sd.channels], converted)?;
            to_engine_units(&td, converted);
            td.scatter(converted, output);
        }
        Ok(())
    }

    /// Classic CMS ranges, whatever the precision
    fn descriptor(&self, kind: ColorSpaceKind, precision: Precision) -> ColorSpaceDescriptor {
        ColorSpaceDescriptor::new(kind, precision)
    }
}
