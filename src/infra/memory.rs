//! In-process preferences store.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::repos::PreferencesRepo;
use crate::domain::preferences::{FeatureFlagSet, PreferencesRecord};
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::memory";

const DEFAULT_READ_LATENCY: Duration = Duration::from_millis(100);
const DEFAULT_CURRENCY_WRITE_LATENCY: Duration = Duration::from_millis(500);
const DEFAULT_FLAG_WRITE_LATENCY: Duration = Duration::from_millis(300);

/// Simulated round-trip delays applied before each operation takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLatency {
    pub read: Duration,
    pub currency_write: Duration,
    pub flag_write: Duration,
}

impl StoreLatency {
    pub fn none() -> Self {
        Self {
            read: Duration::ZERO,
            currency_write: Duration::ZERO,
            flag_write: Duration::ZERO,
        }
    }
}

impl Default for StoreLatency {
    fn default() -> Self {
        Self {
            read: DEFAULT_READ_LATENCY,
            currency_write: DEFAULT_CURRENCY_WRITE_LATENCY,
            flag_write: DEFAULT_FLAG_WRITE_LATENCY,
        }
    }
}

impl From<&crate::config::StoreSettings> for StoreLatency {
    fn from(settings: &crate::config::StoreSettings) -> Self {
        Self {
            read: settings.read_latency,
            currency_write: settings.currency_write_latency,
            flag_write: settings.flag_write_latency,
        }
    }
}

#[derive(Debug, Default)]
struct StoreState {
    preferences: PreferencesRecord,
    flags: FeatureFlagSet,
}

/// Single shared record living for the whole process. Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryPreferences {
    state: RwLock<StoreState>,
    latency: StoreLatency,
}

impl InMemoryPreferences {
    pub fn new(latency: StoreLatency) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            latency,
        }
    }
}

async fn simulate(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl PreferencesRepo for InMemoryPreferences {
    async fn load(&self) -> (PreferencesRecord, FeatureFlagSet) {
        simulate(self.latency.read).await;
        let state = rw_read(&self.state, SOURCE, "load");
        (state.preferences.clone(), state.flags.clone())
    }

    async fn write_currency(&self, currency: &str) {
        simulate(self.latency.currency_write).await;
        let mut state = rw_write(&self.state, SOURCE, "write_currency");
        state.preferences.currency = currency.to_string();
    }

    async fn toggle_flag(&self, flag: &str) -> bool {
        simulate(self.latency.flag_write).await;
        rw_write(&self.state, SOURCE, "toggle_flag").flags.toggle(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_with_default_record_and_no_flags() {
        let store = InMemoryPreferences::new(StoreLatency::none());
        let (preferences, flags) = store.load().await;
        assert_eq!(preferences, PreferencesRecord::default());
        assert_eq!(flags, FeatureFlagSet::default());
    }

    #[tokio::test]
    async fn write_currency_overwrites_only_currency() {
        let store = InMemoryPreferences::new(StoreLatency::none());
        store.write_currency("EUR").await;

        let (preferences, _) = store.load().await;
        assert_eq!(preferences.currency, "EUR");
        assert_eq!(preferences.theme, "light");
    }

    #[tokio::test]
    async fn toggle_flag_returns_committed_value() {
        let store = InMemoryPreferences::new(StoreLatency::none());
        assert!(store.toggle_flag("beta").await);
        assert!(!store.toggle_flag("beta").await);

        let (_, flags) = store.load().await;
        assert!(!flags.is_enabled("beta"));
    }

    #[tokio::test(start_paused = true)]
    async fn flag_write_waits_for_its_latency() {
        let store = InMemoryPreferences::new(StoreLatency::default());
        let started = tokio::time::Instant::now();
        store.toggle_flag("beta").await;
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
