//! The image aggregate the profile code operates on
//!
//! Pixels are stored as interleaved 16-bit quanta, one row after another.
//! The channel order is the colorspace's color channels (gray, RGB or CMYK)
//! followed by an optional alpha channel.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::Warning;
use crate::settings::ProfileSettings;
use crate::store::ProfileStore;
use crate::types::{
    Colorspace, ImageType, Orientation, PointInfo, RenderingIntent, ResolutionUnits,
};

/// One stored channel value
pub type Quantum = u16;

/// Largest quantum value, as a float
pub const QUANTUM_RANGE: f64 = 65535.0;

/// Reciprocal of [`QUANTUM_RANGE`]
pub const QUANTUM_SCALE: f64 = 1.0 / QUANTUM_RANGE;

/// Round and clamp a value into the quantum range
#[inline]
pub fn clamp_to_quantum(value: f64) -> Quantum {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    if value >= QUANTUM_RANGE {
        return Quantum::MAX;
    }
    (value + 0.5) as Quantum
}

/// Progress callback: `(tag, completed, total) -> keep_going`
pub type ProgressMonitor = Arc<dyn Fn(&str, u64, u64) -> bool + Send + Sync>;

/// Named channels of a pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelChannel {
    Red,
    Green,
    Blue,
    Black,
    Gray,
    Alpha,
}

/// Interleaved channel arrangement of a pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    /// Color channels per pixel
    pub color: usize,
    /// Whether an alpha channel follows the color channels
    pub alpha: bool,
}

impl ChannelLayout {
    pub fn new(colorspace: Colorspace, alpha: bool) -> Self {
        Self {
            color: colorspace.color_channels(),
            alpha,
        }
    }

    /// Total channels per pixel
    pub fn channels(&self) -> usize {
        self.color + usize::from(self.alpha)
    }

    /// Offset of a channel inside a pixel
    pub fn offset(&self, channel: PixelChannel) -> Option<usize> {
        match channel {
            PixelChannel::Red | PixelChannel::Gray => Some(0),
            PixelChannel::Green if self.color >= 3 => Some(1),
            PixelChannel::Blue if self.color >= 3 => Some(2),
            PixelChannel::Black if self.color >= 4 => Some(3),
            PixelChannel::Alpha if self.alpha => Some(self.color),
            _ => None,
        }
    }
}

/// Raster image with its metadata
#[derive(Clone)]
pub struct Image {
    /// Name used in diagnostics
    pub filename: String,
    columns: usize,
    rows: usize,
    /// Bits per channel of the source data
    pub depth: u32,
    pub resolution: PointInfo,
    pub units: ResolutionUnits,
    pub orientation: Orientation,
    pub rendering_intent: RenderingIntent,
    pub black_point_compensation: bool,
    pub image_type: ImageType,
    pub settings: ProfileSettings,
    colorspace: Colorspace,
    alpha: bool,
    pixels: Vec<Quantum>,
    pub(crate) profiles: ProfileStore,
    properties: BTreeMap<String, String>,
    artifacts: BTreeMap<String, String>,
    warnings: Vec<Warning>,
    progress_monitor: Option<ProgressMonitor>,
}

impl Image {
    /// Create a black image in the given colorspace
    pub fn new(columns: usize, rows: usize, colorspace: Colorspace) -> Self {
        let layout = ChannelLayout::new(colorspace, false);
        Self {
            filename: String::new(),
            columns,
            rows,
            depth: 16,
            resolution: PointInfo::new(72.0, 72.0),
            units: ResolutionUnits::Undefined,
            orientation: Orientation::Undefined,
            rendering_intent: RenderingIntent::Undefined,
            black_point_compensation: false,
            image_type: ImageType::Undefined,
            settings: ProfileSettings::default(),
            colorspace,
            alpha: false,
            pixels: vec![0; columns * rows * layout.channels()],
            profiles: ProfileStore::new(),
            properties: BTreeMap::new(),
            artifacts: BTreeMap::new(),
            warnings: Vec::new(),
            progress_monitor: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn with_settings(mut self, settings: ProfileSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    pub fn has_alpha(&self) -> bool {
        self.alpha
    }

    pub fn layout(&self) -> ChannelLayout {
        ChannelLayout::new(self.colorspace, self.alpha)
    }

    /// Quanta per row
    pub fn row_stride(&self) -> usize {
        self.columns * self.layout().channels()
    }

    /// Change the colorspace, reshaping the pixel buffer.
    ///
    /// Shared color channels are kept, gray widens by replication, and new
    /// channels start at zero.
    pub fn set_colorspace(&mut self, colorspace: Colorspace) {
        let from = self.layout();
        self.colorspace = colorspace;
        self.relayout(from, self.layout());
    }

    /// Add or drop the alpha channel; a new alpha channel is opaque
    pub fn set_alpha(&mut self, alpha: bool) {
        let from = self.layout();
        self.alpha = alpha;
        self.relayout(from, self.layout());
    }

    fn relayout(&mut self, from: ChannelLayout, to: ChannelLayout) {
        if from == to {
            return;
        }
        let count = self.columns * self.rows;
        let mut pixels = vec![0; count * to.channels()];
        for (src, dst) in self
            .pixels
            .chunks_exact(from.channels())
            .zip(pixels.chunks_exact_mut(to.channels()))
        {
            if from.color == 1 && to.color >= 3 {
                dst[..3].fill(src[0]);
            } else {
                let shared = from.color.min(to.color);
                dst[..shared].copy_from_slice(&src[..shared]);
            }
            if to.alpha {
                dst[to.color] = if from.alpha {
                    src[from.color]
                } else {
                    Quantum::MAX
                };
            }
        }
        self.pixels = pixels;
    }

    /// Swap in a pixel buffer already laid out for `colorspace`
    pub(crate) fn replace_pixels(&mut self, colorspace: Colorspace, pixels: Vec<Quantum>) {
        self.colorspace = colorspace;
        self.pixels = pixels;
    }

    pub fn pixels(&self) -> &[Quantum] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Quantum] {
        &mut self.pixels
    }

    fn pixel_index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.columns && y < self.rows)
            .then(|| (y * self.columns + x) * self.layout().channels())
    }

    /// All channels of one pixel
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[Quantum]> {
        let start = self.pixel_index(x, y)?;
        self.pixels.get(start..start + self.layout().channels())
    }

    /// Overwrite one pixel; `values` must hold every channel
    pub fn set_pixel(&mut self, x: usize, y: usize, values: &[Quantum]) -> bool {
        let channels = self.layout().channels();
        match self.pixel_index(x, y) {
            Some(start) if values.len() == channels => {
                self.pixels[start..start + channels].copy_from_slice(values);
                true
            }
            _ => false,
        }
    }

    /// Set every pixel to `values`
    pub fn fill(&mut self, values: &[Quantum]) {
        if values.len() != self.layout().channels() {
            return;
        }
        for pixel in self.pixels.chunks_exact_mut(values.len()) {
            pixel.copy_from_slice(values);
        }
    }

    pub fn channel(&self, x: usize, y: usize, channel: PixelChannel) -> Option<Quantum> {
        let offset = self.layout().offset(channel)?;
        self.pixel(x, y).map(|p| p[offset])
    }

    pub fn set_channel(&mut self, x: usize, y: usize, channel: PixelChannel, value: Quantum) {
        if let (Some(offset), Some(start)) = (self.layout().offset(channel), self.pixel_index(x, y))
        {
            self.pixels[start + offset] = value;
        }
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn delete_property(&mut self, key: &str) -> bool {
        self.properties.remove(key).is_some()
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn artifact(&self, key: &str) -> Option<&str> {
        self.artifacts.get(key).map(String::as_str)
    }

    pub fn set_artifact(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.artifacts.insert(key.into(), value.into());
    }

    pub fn delete_artifact(&mut self, key: &str) -> bool {
        self.artifacts.remove(key).is_some()
    }

    /// Warnings raised so far
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub(crate) fn raise_warning(&mut self, warning: Warning) {
        warn!(filename = %self.filename, "{}", warning);
        self.warnings.push(warning);
    }

    pub fn set_progress_monitor<F>(&mut self, monitor: F)
    where
        F: Fn(&str, u64, u64) -> bool + Send + Sync + 'static,
    {
        self.progress_monitor = Some(Arc::new(monitor));
    }

    pub fn clear_progress_monitor(&mut self) {
        self.progress_monitor = None;
    }

    pub(crate) fn progress_monitor(&self) -> Option<ProgressMonitor> {
        self.progress_monitor.clone()
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("filename", &self.filename)
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("colorspace", &self.colorspace)
            .field("alpha", &self.alpha)
            .field("image_type", &self.image_type)
            .field("profiles", &self.profiles.len())
            .finish_non_exhaustive()
    }
}

/// Interpret an artifact value as a boolean
pub(crate) fn artifact_flag(value: Option<&str>, default: bool) -> bool {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "true" | "on" | "yes" | "1") => true,
        Some(v) if matches!(v.as_str(), "false" | "off" | "no" | "0") => false,
        _ => default,
    }
}
