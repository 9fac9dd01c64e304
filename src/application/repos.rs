//! Storage seam for the preferences store.

use async_trait::async_trait;

use crate::domain::preferences::{FeatureFlagSet, PreferencesRecord};

/// Single shared preferences record plus its feature flags.
///
/// Implementations are process-wide and carry no per-caller isolation. Each call is atomic on
/// its own, but nothing orders concurrent writers: the last write to commit wins.
#[async_trait]
pub trait PreferencesRepo: Send + Sync {
    /// Current record and flags.
    async fn load(&self) -> (PreferencesRecord, FeatureFlagSet);

    /// Overwrite the stored currency.
    async fn write_currency(&self, currency: &str);

    /// Flip `flag`, creating it as enabled when absent. Returns the committed value.
    async fn toggle_flag(&self, flag: &str) -> bool;
}
