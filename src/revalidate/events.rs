//! Revalidation events.

use time::OffsetDateTime;
use uuid::Uuid;

/// Monotonic counter ordering revalidations within this process. Zero means "never revalidated".
pub type Epoch = u64;

/// Path every store write invalidates.
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// The preferences record changed.
    PreferencesUpdated { currency: String },
    /// A feature flag was flipped.
    FeatureFlagToggled { flag: String, enabled: bool },
    /// A path was revalidated directly.
    PathRevalidated { path: String },
}

impl EventKind {
    /// Paths whose rendered output depends on the changed state.
    pub fn affected_paths(&self) -> Vec<String> {
        match self {
            EventKind::PreferencesUpdated { .. } | EventKind::FeatureFlagToggled { .. } => {
                vec![HOME_PATH.to_string()]
            }
            EventKind::PathRevalidated { path } => vec![path.clone()],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::PreferencesUpdated { .. } => "preferences_updated",
            EventKind::FeatureFlagToggled { .. } => "feature_flag_toggled",
            EventKind::PathRevalidated { .. } => "path_revalidated",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RevalidationEvent {
    /// Unique identifier for log correlation.
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl RevalidationEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}
