//! Server-of-record preference and feature flag records.

use std::collections::BTreeMap;

use serde::Serialize;

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_THEME: &str = "light";

/// Flag gating the currency switcher on the server panel.
pub const CURRENCY_TOGGLE_FLAG: &str = "currencyToggle";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesRecord {
    /// Stored verbatim; not constrained to the known currency codes.
    pub currency: String,
    pub theme: String,
}

impl Default for PreferencesRecord {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

/// Named boolean switches. Missing names read as disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFlagSet {
    flags: BTreeMap<String, bool>,
}

impl FeatureFlagSet {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Flip `name`, creating it as enabled when absent. Returns the new value.
    pub fn toggle(&mut self, name: &str) -> bool {
        let entry = self.flags.entry(name.to_string()).or_insert(false);
        *entry = !*entry;
        *entry
    }
}

/// By-value read model handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesSnapshot {
    pub currency: String,
    pub theme: String,
    pub currency_toggle_enabled: bool,
}

impl PreferencesSnapshot {
    pub fn from_records(preferences: &PreferencesRecord, flags: &FeatureFlagSet) -> Self {
        Self {
            currency: preferences.currency.clone(),
            theme: preferences.theme.clone(),
            currency_toggle_enabled: flags.is_enabled(CURRENCY_TOGGLE_FLAG),
        }
    }
}
