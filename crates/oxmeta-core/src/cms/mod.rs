//! Color management engine seam
//!
//! [`ColorEngine`] is the capability the transform code needs from a color
//! management library: open a profile, bind a transform between two
//! profiles (or a single device link), and run it over rows of samples.
//! Handles are released when dropped.
//!
//! The default backend, [`MoxcmsEngine`], is built on `moxcms`.

pub mod descriptor;
mod mox;

use std::sync::{Mutex, PoisonError};

use tracing::debug;

pub use descriptor::{ColorSpaceDescriptor, ColorSpaceKind, Precision};
pub use mox::{MoxcmsEngine, MoxcmsProfile, MoxcmsTransform};

use crate::error::Result;
use crate::types::RenderingIntent;

/// Sample layout of one side of a transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub kind: ColorSpaceKind,
    pub precision: Precision,
}

impl PixelFormat {
    pub fn new(kind: ColorSpaceKind, precision: Precision) -> Self {
        Self { kind, precision }
    }

    pub fn channels(&self) -> usize {
        self.kind.channels()
    }
}

/// Transform creation flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformFlags {
    /// Map the source black point onto the target black point
    pub black_point_compensation: bool,
    /// Favor accuracy over speed when precomputing the transform
    pub high_res_precalc: bool,
}

/// Collects diagnostics raised by the engine during one operation
#[derive(Debug, Default)]
pub struct CmsContext {
    filename: String,
    diagnostics: Mutex<Vec<String>>,
}

impl CmsContext {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Record an engine diagnostic
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(filename = %self.filename, "color engine: {}", message);
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    /// Take every diagnostic recorded so far
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(
            &mut *self
                .diagnostics
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

/// A color management backend
pub trait ColorEngine: Sync {
    /// Opened profile handle
    type Profile: Send + Sync;
    /// Transform handle; each worker owns its own
    type Transform: Send;

    /// Parse profile bytes
    fn open_profile(&self, data: &[u8], ctx: &CmsContext) -> Result<Self::Profile>;

    /// Bind a transform. `target` is `None` when `source` is a device link.
    #[allow(clippy::too_many_arguments)]
    fn create_transform(
        &self,
        source: &Self::Profile,
        source_format: PixelFormat,
        target: Option<&Self::Profile>,
        target_format: PixelFormat,
        intent: RenderingIntent,
        flags: TransformFlags,
        ctx: &CmsContext,
    ) -> Result<Self::Transform>;

    /// Convert `pixels` pixels of double samples
    fn transform_f64(
        &self,
        transform: &mut Self::Transform,
        source: &[f64],
        target: &mut [f64],
        pixels: usize,
    ) -> Result<()>;

    /// Convert `pixels` pixels of 16-bit samples
    fn transform_u16(
        &self,
        transform: &mut Self::Transform,
        source: &[u16],
        target: &mut [u16],
        pixels: usize,
    ) -> Result<()>;

    /// Numeric ranges the engine expects for `kind`
    fn descriptor(&self, kind: ColorSpaceKind, precision: Precision) -> ColorSpaceDescriptor {
        ColorSpaceDescriptor::new(kind, precision)
    }
}
