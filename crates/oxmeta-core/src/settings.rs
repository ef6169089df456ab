//! Resource settings consumed by the profile code

use tracing::warn;

/// Default ceiling for a single stored profile (128 MiB)
pub const DEFAULT_MAX_PROFILE_SIZE: usize = 128 * 1024 * 1024;

/// Environment variable overriding [`ProfileSettings::max_profile_size`]
pub const MAX_PROFILE_SIZE_ENV: &str = "OXMETA_MAX_PROFILE_SIZE";

/// Environment variable overriding [`ProfileSettings::thread_limit`]
pub const THREAD_LIMIT_ENV: &str = "OXMETA_THREAD_LIMIT";

/// Per-image resource limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSettings {
    /// Largest profile admitted into a store, in bytes
    pub max_profile_size: usize,
    /// Worker threads used by the pixel transform
    pub thread_limit: usize,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            max_profile_size: DEFAULT_MAX_PROFILE_SIZE,
            thread_limit: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl ProfileSettings {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(size) = read_env(MAX_PROFILE_SIZE_ENV) {
            settings.max_profile_size = size;
        }
        if let Some(threads) = read_env(THREAD_LIMIT_ENV) {
            settings = settings.with_thread_limit(threads);
        }
        settings
    }

    pub fn with_max_profile_size(mut self, max_profile_size: usize) -> Self {
        self.max_profile_size = max_profile_size;
        self
    }

    /// Thread limit, clamped to at least one worker
    pub fn with_thread_limit(mut self, thread_limit: usize) -> Self {
        self.thread_limit = thread_limit.max(1);
        self
    }
}

fn read_env(key: &str) -> Option<usize> {
    let value = std::env::var(key).ok()?;
    match value.trim().parse::<usize>() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(key, value = %value, error = %err, "ignoring invalid setting");
            None
        }
    }
}
