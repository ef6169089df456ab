//! `moxcms` backend

use moxcms::{ColorProfile, Layout, TransformExecutor, TransformOptions};
use tracing::debug;

use super::{
    CmsContext, ColorEngine, ColorSpaceDescriptor, ColorSpaceKind, PixelFormat, Precision,
    TransformFlags,
};
use crate::error::{Error, Result};
use crate::types::RenderingIntent;

/// Color engine backed by `moxcms`.
///
/// `moxcms` works on normalized samples, so every channel is handed over
/// in [0, 1]. Device-link profiles are not supported.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoxcmsEngine {
    /// Use CICP transfer functions when a profile carries them
    pub allow_use_cicp_transfer: bool,
}

impl MoxcmsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cicp_transfer(mut self, allow: bool) -> Self {
        self.allow_use_cicp_transfer = allow;
        self
    }
}

/// Opened `moxcms` profile
#[derive(Debug, Clone)]
pub struct MoxcmsProfile {
    inner: ColorProfile,
}

/// Bound `moxcms` transform
pub struct MoxcmsTransform {
    executor: Executor,
    source_channels: usize,
    target_channels: usize,
}

enum Executor {
    F64(Box<dyn TransformExecutor<f64> + Send + Sync>),
    U16(Box<dyn TransformExecutor<u16> + Send + Sync>),
}

/// CMYK travels in the four-channel RGBA layout
fn layout(kind: ColorSpaceKind) -> Layout {
    match kind.channels() {
        1 => Layout::Gray,
        4 => Layout::Rgba,
        _ => Layout::Rgb,
    }
}

impl MoxcmsTransform {
    fn check(&self, source: usize, target: usize, pixels: usize) -> Result<()> {
        let expected = pixels * self.source_channels;
        if source < expected {
            return Err(Error::BufferSize {
                expected,
                actual: source,
            });
        }
        let expected = pixels * self.target_channels;
        if target < expected {
            return Err(Error::BufferSize {
                expected,
                actual: target,
            });
        }
        Ok(())
    }
}

impl ColorEngine for MoxcmsEngine {
    type Profile = MoxcmsProfile;
    type Transform = MoxcmsTransform;

    fn open_profile(&self, data: &[u8], ctx: &CmsContext) -> Result<Self::Profile> {
        let inner = ColorProfile::new_from_slice(data).map_err(|e| {
            let message = format!("{:?}", e);
            ctx.report(message.clone());
            Error::Transform(message)
        })?;
        Ok(MoxcmsProfile { inner })
    }

    fn create_transform(
        &self,
        source: &Self::Profile,
        source_format: PixelFormat,
        target: Option<&Self::Profile>,
        target_format: PixelFormat,
        intent: RenderingIntent,
        flags: TransformFlags,
        ctx: &CmsContext,
    ) -> Result<Self::Transform> {
        let Some(target) = target else {
            let message = "device link profiles are not supported";
            ctx.report(message);
            return Err(Error::Transform(message.into()));
        };
        if flags.black_point_compensation {
            debug!("moxcms ignores black point compensation");
        }
        let options = TransformOptions {
            rendering_intent: intent.into(),
            allow_use_cicp_transfer: self.allow_use_cicp_transfer,
            prefer_fixed_point: !flags.high_res_precalc,
            ..Default::default()
        };
        let source_layout = layout(source_format.kind);
        let target_layout = layout(target_format.kind);
        let report = |e: moxcms::CmsError| {
            let message = format!("{:?}", e);
            ctx.report(message.clone());
            Error::Transform(message)
        };
        let executor = match (source_format.precision, target_format.precision) {
            (Precision::Double, Precision::Double) => Executor::F64(
                source
                    .inner
                    .create_transform_f64(source_layout, &target.inner, target_layout, options)
                    .map_err(report)?,
            ),
            (Precision::Quantum, Precision::Quantum) => Executor::U16(
                source
                    .inner
                    .create_transform_16bit(source_layout, &target.inner, target_layout, options)
                    .map_err(report)?,
            ),
            _ => {
                return Err(Error::Transform(
                    "source and target precision differ".into(),
                ));
            }
        };
        Ok(MoxcmsTransform {
            executor,
            source_channels: source_format.channels(),
            target_channels: target_format.channels(),
        })
    }

    fn transform_f64(
        &self,
        transform: &mut Self::Transform,
        source: &[f64],
        target: &mut [f64],
        pixels: usize,
    ) -> Result<()> {
        transform.check(source.len(), target.len(), pixels)?;
        let (src_len, dst_len) = (
            pixels * transform.source_channels,
            pixels * transform.target_channels,
        );
        match &transform.executor {
            Executor::F64(t) => t
                .transform(&source[..src_len], &mut target[..dst_len])
                .map_err(|e| Error::Transform(format!("{:?}", e))),
            Executor::U16(_) => Err(Error::Transform("Wrong sample type for transform".into())),
        }
    }

    fn transform_u16(
        &self,
        transform: &mut Self::Transform,
        source: &[u16],
        target: &mut [u16],
        pixels: usize,
    ) -> Result<()> {
        transform.check(source.len(), target.len(), pixels)?;
        let (src_len, dst_len) = (
            pixels * transform.source_channels,
            pixels * transform.target_channels,
        );
        match &transform.executor {
            Executor::U16(t) => t
                .transform(&source[..src_len], &mut target[..dst_len])
                .map_err(|e| Error::Transform(format!("{:?}", e))),
            Executor::F64(_) => Err(Error::Transform("Wrong sample type for transform".into())),
        }
    }

    fn descriptor(&self, kind: ColorSpaceKind, precision: Precision) -> ColorSpaceDescriptor {
        ColorSpaceDescriptor::identity(kind, precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn srgb() -> Vec<u8> {
        crate::SRGB_ICC.to_vec()
    }

    #[test]
    fn test_open_rejects_garbage() {
        let ctx = CmsContext::new("test");
        assert!(MoxcmsEngine::new().open_profile(&[0; 64], &ctx).is_err());
        assert_eq!(ctx.drain().len(), 1);
    }

    #[test]
    fn test_srgb_to_srgb_is_near_identity() {
        let engine = MoxcmsEngine::new();
        let ctx = CmsContext::new("test");
        let profile = engine.open_profile(&srgb(), &ctx).unwrap();
        let format = PixelFormat::new(ColorSpaceKind::Rgb, Precision::Double);
        let mut transform = engine
            .create_transform(
                &profile,
                format,
                Some(&profile),
                format,
                RenderingIntent::Perceptual,
                TransformFlags::default(),
                &ctx,
            )
            .unwrap();
        let source = [0.2, 0.5, 0.8, 1.0, 0.0, 0.25];
        let mut target = [0.0; 6];
        engine
            .transform_f64(&mut transform, &source, &mut target, 2)
            .unwrap();
        for (a, b) in source.iter().zip(target.iter()) {
            assert!((a - b).abs() < 0.01, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_device_link_unsupported() {
        let engine = MoxcmsEngine::new();
        let ctx = CmsContext::new("test");
        let profile = engine.open_profile(&srgb(), &ctx).unwrap();
        let format = PixelFormat::new(ColorSpaceKind::Rgb, Precision::Quantum);
        let result = engine.create_transform(
            &profile,
            format,
            None,
            format,
            RenderingIntent::Relative,
            TransformFlags::default(),
            &ctx,
        );
        assert!(matches!(result, Err(Error::Transform(_))));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let engine = MoxcmsEngine::new();
        let ctx = CmsContext::new("test");
        let profile = engine.open_profile(&srgb(), &ctx).unwrap();
        let format = PixelFormat::new(ColorSpaceKind::Rgb, Precision::Quantum);
        let mut transform = engine
            .create_transform(
                &profile,
                format,
                Some(&profile),
                format,
                RenderingIntent::Perceptual,
                TransformFlags::default(),
                &ctx,
            )
            .unwrap();
        let mut target = [0u16; 3];
        let result = engine.transform_u16(&mut transform, &[0; 3], &mut target, 2);
        assert!(matches!(result, Err(Error::BufferSize { expected: 6, .. })));
    }
}
