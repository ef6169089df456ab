//! Error and warning types for oxmeta

use thiserror::Error;

use crate::icc::IccError;

/// Result type for oxmeta operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a profile operation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Profile bytes could not be opened by the color engine
    #[error("Color profile mismatch: unable to open `{name}` profile")]
    ProfileMismatch { name: String },

    /// Profile declares a color space that cannot be transformed
    #[error("Unsupported color space: {0}")]
    UnsupportedColorSpace(String),

    /// Transform creation or execution failed
    #[error("Transform error: {0}")]
    Transform(String),

    /// Scratch buffers could not be allocated
    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Row scan stopped before every row was transformed
    #[error("Pixel scan aborted after {rows} rows")]
    ScanFailed { rows: u64 },

    /// Buffer size mismatch
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// ICC header could not be parsed
    #[error("ICC header: {0}")]
    Icc(#[from] IccError),
}

/// Recoverable conditions collected on the image's warning list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Warning {
    /// Profile larger than the configured ceiling
    #[error("Profile size exceeds limit: `{name}' is {length} bytes, limit {limit}")]
    ProfileSizeExceedsLimit {
        name: String,
        length: usize,
        limit: usize,
    },

    /// Zero-length profile
    #[error("Empty profile: `{name}'")]
    EmptyProfile { name: String },

    /// Profile payload failed validation
    #[error("Corrupt image profile: `{name}'")]
    CorruptImageProfile { name: String },

    /// Diagnostic raised by the color engine
    #[error("Unable to transform colorspace: {message} `{filename}'")]
    UnableToTransformColorspace { message: String, filename: String },
}
