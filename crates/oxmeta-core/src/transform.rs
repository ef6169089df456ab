//! Applying color profiles to images
//!
//! [`ColorTransformEngine::apply`] decides, per call, between removing
//! profiles, storing a profile as plain metadata, associating an ICC profile
//! with untagged pixels, and converting pixels from the image's current ICC
//! profile into a new one. Conversions run as a parallel row scan: rows are
//! split into one contiguous band per worker and every worker owns its own
//! transform handle and scratch rows.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::debug;

use crate::cms::{
    CmsContext, ColorEngine, ColorSpaceDescriptor, ColorSpaceKind, MoxcmsEngine, PixelFormat,
    Precision, TransformFlags,
};
use crate::error::{Error, Result, Warning};
use crate::icc::IccHeader;
use crate::image::{ChannelLayout, Image, Quantum, artifact_flag};

/// Artifact controlling double-precision transforms (default on)
pub const HIGHRES_ARTIFACT: &str = "profile:highres-transform";

/// Tag passed to the progress monitor
pub const PROGRESS_TAG: &str = "Profile/Image";

/// Drives profile application against a [`ColorEngine`]
#[derive(Debug, Clone, Default)]
pub struct ColorTransformEngine<E> {
    engine: E,
}

/// Per-worker state for the row scan
struct TransformContext<T> {
    transform: T,
    source: SampleRow,
    target: SampleRow,
}

enum SampleRow {
    Float(Vec<f64>),
    Quantum(Vec<Quantum>),
}

impl SampleRow {
    fn allocate(precision: Precision, len: usize) -> Result<Self> {
        Ok(match precision {
            Precision::Double => Self::Float(zeroed(len)?),
            Precision::Quantum => Self::Quantum(zeroed(len)?),
        })
    }
}

fn zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| Error::ResourceLimit(e.to_string()))?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

/// Both sides of a conversion
#[derive(Clone, Copy)]
struct Plan {
    source: ColorSpaceDescriptor,
    target: ColorSpaceDescriptor,
    from: ChannelLayout,
    to: ChannelLayout,
    columns: usize,
}

impl<E: ColorEngine> ColorTransformEngine<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Attach, apply or remove a profile.
    ///
    /// - `data` of `None` (or empty) deletes every profile whose name
    ///   matches the `name` pattern.
    /// - Names other than "icc"/"icm" are stored as plain profiles.
    /// - An ICC profile on an image without one is only associated, unless
    ///   it is a device link.
    /// - Otherwise the pixels are converted from the current profile (or
    ///   through the device link) and the new profile is stored.
    pub fn apply(&self, image: &mut Image, name: &str, data: Option<&[u8]>) -> Result<()> {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            let removed = remove_matching(image, name);
            debug!(pattern = name, removed, "removed profiles");
            return Ok(());
        };
        let lower = name.to_ascii_lowercase();
        if lower != "icc" && lower != "icm" {
            image.set_profile(name, data.to_vec());
            return Ok(());
        }

        let ctx = CmsContext::new(image.filename.clone());
        let result = self.apply_icc(image, name, data, &ctx);
        let filename = image.filename.clone();
        for message in ctx.drain() {
            image.raise_warning(Warning::UnableToTransformColorspace {
                message,
                filename: filename.clone(),
            });
        }
        result
    }

    fn apply_icc(
        &self,
        image: &mut Image,
        name: &str,
        data: &[u8],
        ctx: &CmsContext,
    ) -> Result<()> {
        if same_icc(image, data) {
            if image.property("exif:ColorSpace") != Some("1") {
                image.set_srgb_profile();
            }
            if image.property("exif:InteroperabilityIndex") != Some("R98.") {
                image.set_srgb_profile();
            }
            if same_icc(image, data) {
                debug!("profile already applied");
                return Ok(());
            }
        }

        let mismatch = || Error::ProfileMismatch { name: name.into() };
        let header = IccHeader::parse(data).map_err(|_| mismatch())?;
        let existing = image.get_profile("icc").map(|p| p.data().to_vec());
        if existing.is_none() && !header.is_device_link() {
            self.engine.open_profile(data, ctx).map_err(|_| mismatch())?;
            debug!(name, "associating profile with untagged pixels");
            image.set_profile(name, data.to_vec());
            return Ok(());
        }

        let (source_header, target_header) = match &existing {
            Some(bytes) => (IccHeader::parse(bytes).map_err(|_| mismatch())?, Some(header)),
            None => (header, None),
        };
        let unsupported = |e: crate::icc::IccError| Error::UnsupportedColorSpace(e.to_string());
        let source_kind =
            ColorSpaceKind::try_from(source_header.data_color_space().map_err(unsupported)?)?;
        let target_space = match &target_header {
            Some(h) => h.data_color_space(),
            None => source_header.connection_space(),
        };
        let target_kind = ColorSpaceKind::try_from(target_space.map_err(unsupported)?)?;

        let (source, target) = match &existing {
            Some(bytes) => {
                let source = self.engine.open_profile(bytes, ctx).map_err(|_| mismatch())?;
                let target = self.engine.open_profile(data, ctx).map_err(|_| mismatch())?;
                (source, Some(target))
            }
            None => (self.engine.open_profile(data, ctx).map_err(|_| mismatch())?, None),
        };

        let mut highres = artifact_flag(image.artifact(HIGHRES_ARTIFACT), true);
        if image.depth > 16 && !cfg!(feature = "extended-range") {
            highres = false;
        }
        let precision = if highres {
            Precision::Double
        } else {
            Precision::Quantum
        };
        let flags = TransformFlags {
            black_point_compensation: image.black_point_compensation,
            high_res_precalc: highres,
        };
        debug!(
            ?source_kind,
            ?target_kind,
            ?precision,
            link = source_header.is_device_link(),
            "converting pixels"
        );

        let plan = Plan {
            source: self.engine.descriptor(source_kind, precision),
            target: self.engine.descriptor(target_kind, precision),
            from: image.layout(),
            to: ChannelLayout::new(target_kind.colorspace(), image.has_alpha()),
            columns: image.columns(),
        };
        let pixels = self.scan(image, &plan, &source, target.as_ref(), flags, ctx)?;

        image.replace_pixels(target_kind.colorspace(), pixels);
        if let Some(image_type) = target_kind.image_type(image.has_alpha()) {
            image.image_type = image_type;
        }
        if !source_header.is_device_link() {
            image.set_profile(name, data.to_vec());
        }
        Ok(())
    }

    /// Convert every row into a new buffer laid out as `plan.to`
    fn scan(
        &self,
        image: &Image,
        plan: &Plan,
        source: &E::Profile,
        target: Option<&E::Profile>,
        flags: TransformFlags,
        ctx: &CmsContext,
    ) -> Result<Vec<Quantum>> {
        let rows = image.rows();
        let columns = plan.columns;
        let threads = image.settings.thread_limit.max(1);
        let rows_per_band = rows.div_ceil(threads).max(1);
        let bands = rows.div_ceil(rows_per_band).max(1);

        let source_format = PixelFormat::new(plan.source.kind, plan.source.precision);
        let target_format = PixelFormat::new(plan.target.kind, plan.target.precision);
        let mut contexts = Vec::with_capacity(bands);
        for _ in 0..bands {
            let transform = self.engine.create_transform(
                source,
                source_format,
                target,
                target_format,
                image.rendering_intent,
                flags,
                ctx,
            )?;
            let source_len = columns * plan.source.channels;
            let target_len = columns * plan.target.channels;
            contexts.push(TransformContext {
                transform,
                source: SampleRow::allocate(plan.source.precision, source_len)?,
                target: SampleRow::allocate(plan.target.precision, target_len)?,
            });
        }

        let mut output = zeroed::<Quantum>(columns * rows * plan.to.channels())?;
        let source_stride = columns * plan.from.channels();
        let target_stride = columns * plan.to.channels();
        if rows == 0 || source_stride == 0 || target_stride == 0 {
            return Ok(output);
        }

        let pool = thread_pool(threads)?;
        let monitor = image.progress_monitor();
        let status = AtomicBool::new(true);
        let progress = AtomicU64::new(0);
        let total = rows as u64;
        let engine = &self.engine;

        pool.install(|| {
            output
                .par_chunks_mut(rows_per_band * target_stride)
                .zip(image.pixels().par_chunks(rows_per_band * source_stride))
                .zip(contexts.par_iter_mut())
                .for_each(|((target_band, source_band), context)| {
                    let band_rows = source_band
                        .chunks_exact(source_stride)
                        .zip(target_band.chunks_exact_mut(target_stride));
                    for (source_row, target_row) in band_rows {
                        if !status.load(Ordering::Relaxed) {
                            return;
                        }
                        let converted = convert_row(engine, context, plan, source_row, target_row);
                        if let Err(err) = converted {
                            ctx.report(err.to_string());
                            status.store(false, Ordering::Relaxed);
                            return;
                        }
                        let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
                        if let Some(monitor) = &monitor {
                            if !monitor(PROGRESS_TAG, done, total) {
                                status.store(false, Ordering::Relaxed);
                            }
                        }
                    }
                });
        });

        let done = progress.load(Ordering::Relaxed);
        if !status.load(Ordering::Relaxed) {
            debug!(rows = done, total, "pixel scan aborted");
            return Err(Error::ScanFailed { rows: done });
        }
        debug!(rows = done, threads, "pixel scan complete");
        Ok(output)
    }
}

impl ColorTransformEngine<MoxcmsEngine> {
    /// Engine backed by `moxcms`
    pub fn moxcms() -> Self {
        Self::new(MoxcmsEngine::new())
    }
}

impl Image {
    /// Apply a profile with the default `moxcms` engine.
    ///
    /// See [`ColorTransformEngine::apply`].
    pub fn profile_image(&mut self, name: &str, data: Option<&[u8]>) -> Result<()> {
        ColorTransformEngine::moxcms().apply(self, name, data)
    }
}

/// Shared worker pool for a thread limit, built on first use
fn thread_pool(threads: usize) -> Result<Arc<ThreadPool>> {
    static POOLS: OnceLock<Mutex<HashMap<usize, Arc<ThreadPool>>>> = OnceLock::new();
    let mut pools = POOLS
        .get_or_init(Default::default)
        .lock()
        .map_err(|_| Error::ThreadPool("pool cache poisoned".into()))?;
    if let Some(pool) = pools.get(&threads) {
        return Ok(Arc::clone(pool));
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;
    debug!(threads, "built transform thread pool");
    let pool = Arc::new(pool);
    pools.insert(threads, Arc::clone(&pool));
    Ok(pool)
}

fn same_icc(image: &Image, data: &[u8]) -> bool {
    image.get_profile("icc").is_some_and(|p| p.data() == data)
}

/// Source color quanta of one pixel; gray widens by replication and
/// missing channels read as zero
#[inline]
fn source_quanta(pixel: &[Quantum], from: ChannelLayout, channels: usize) -> [Quantum; 4] {
    let mut out = [0; 4];
    for (c, value) in out.iter_mut().enumerate().take(channels) {
        *value = if c < from.color {
            pixel[c]
        } else if from.color == 1 && c < 3 {
            pixel[0]
        } else {
            0
        };
    }
    out
}

fn convert_row<E: ColorEngine>(
    engine: &E,
    context: &mut TransformContext<E::Transform>,
    plan: &Plan,
    source_row: &[Quantum],
    target_row: &mut [Quantum],
) -> Result<()> {
    let (from, to) = (plan.from, plan.to);
    let (sn, tn) = (plan.source.channels, plan.target.channels);
    let source_pixels = source_row.chunks_exact(from.channels());
    match (&mut context.source, &mut context.target) {
        (SampleRow::Float(src), SampleRow::Float(dst)) => {
            for (pixel, samples) in source_pixels.zip(src.chunks_exact_mut(sn)) {
                plan.source.gather(&source_quanta(pixel, from, sn)[..sn], samples);
            }
            engine.transform_f64(&mut context.transform, src, dst, plan.columns)?;
            let target_pixels = target_row.chunks_exact_mut(to.channels());
            for (pixel, samples) in target_pixels.zip(dst.chunks_exact(tn)) {
                plan.target.scatter(samples, &mut pixel[..tn]);
            }
        }
        (SampleRow::Quantum(src), SampleRow::Quantum(dst)) => {
            for (pixel, samples) in source_pixels.zip(src.chunks_exact_mut(sn)) {
                samples.copy_from_slice(&source_quanta(pixel, from, sn)[..sn]);
            }
            engine.transform_u16(&mut context.transform, src, dst, plan.columns)?;
            let target_pixels = target_row.chunks_exact_mut(to.channels());
            for (pixel, samples) in target_pixels.zip(dst.chunks_exact(tn)) {
                pixel[..tn].copy_from_slice(samples);
            }
        }
        _ => return Err(Error::Transform("scratch rows disagree on precision".into())),
    }
    if from.alpha && to.alpha {
        for (source, target) in source_row
            .chunks_exact(from.channels())
            .zip(target_row.chunks_exact_mut(to.channels()))
        {
            target[to.color] = source[from.color];
        }
    }
    Ok(())
}

/// Delete every profile whose name matches `pattern`
fn remove_matching(image: &mut Image, pattern: &str) -> usize {
    let mut removed = 0;
    image.reset_profile_iterator();
    while let Some(name) = image.next_profile() {
        if matches_pattern(&name, pattern) {
            image.delete_profile(&name);
            removed += 1;
            image.reset_profile_iterator();
        }
    }
    removed
}

/// Match a name against a comma-separated list of glob patterns.
///
/// A pattern prefixed with `!` excludes the names it matches.
pub fn matches_pattern(name: &str, patterns: &str) -> bool {
    let mut matched = false;
    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match pattern.strip_prefix('!') {
            Some(negated) if glob(negated.as_bytes(), name.as_bytes()) => return false,
            Some(_) => {}
            None if glob(pattern.as_bytes(), name.as_bytes()) => matched = true,
            None => {}
        }
    }
    matched
}

/// Case-insensitive wildcard match with `*` and `?`
fn glob(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some((p, t));
                p += 1;
            }
            Some(&c) if c == b'?' || c.eq_ignore_ascii_case(&text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == b'*')
}
