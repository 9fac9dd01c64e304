//! Revalidation configuration.

use std::num::NonZeroUsize;

const DEFAULT_HISTORY_LIMIT: usize = 64;

#[derive(Debug, Clone)]
pub struct RevalidateConfig {
    /// Publish revalidation events after writes.
    pub enabled: bool,
    /// Number of recent events retained for inspection.
    pub history_limit: NonZeroUsize,
}

impl Default for RevalidateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            history_limit: NonZeroUsize::new(DEFAULT_HISTORY_LIMIT).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl From<&crate::config::RevalidateSettings> for RevalidateConfig {
    fn from(settings: &crate::config::RevalidateSettings) -> Self {
        Self {
            enabled: settings.enabled,
            history_limit: settings.history_limit,
        }
    }
}
