//! Revalidation trigger service.
//!
//! Provides a high-level API for announcing committed writes to downstream readers.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use metrics::counter;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::util::lock::{mutex_lock, rw_read, rw_write};

use super::config::RevalidateConfig;
use super::events::{Epoch, EventKind, RevalidationEvent};

const SOURCE: &str = "revalidate::trigger";

/// Announces committed writes and wakes subscribed readers.
///
/// # Usage
///
/// ```ignore
/// // After the store has committed the new currency:
/// revalidator.preferences_updated("EUR");
/// ```
pub struct Revalidator {
    config: RevalidateConfig,
    epoch_counter: AtomicU64,
    path_epochs: RwLock<HashMap<String, Epoch>>,
    history: Mutex<VecDeque<RevalidationEvent>>,
    notifier: watch::Sender<Epoch>,
}

impl Revalidator {
    pub fn new(config: RevalidateConfig) -> Self {
        let (notifier, _) = watch::channel(0);
        Self {
            config,
            epoch_counter: AtomicU64::new(0),
            path_epochs: RwLock::new(HashMap::new()),
            history: Mutex::new(VecDeque::new()),
            notifier,
        }
    }

    /// Publish an event. Returns the epoch assigned to it, or `None` when revalidation is disabled.
    pub fn trigger(&self, kind: EventKind) -> Option<Epoch> {
        if !self.config.enabled {
            debug!(event_kind = ?kind, "Revalidation skipped: disabled");
            return None;
        }

        // Epoch assignment, path epochs, history and notification share the history lock
        // so concurrent triggers publish in epoch order.
        let mut history = mutex_lock(&self.history, SOURCE, "trigger.history");
        let epoch = self.epoch_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let event = RevalidationEvent::new(kind, epoch);

        {
            let mut paths = rw_write(&self.path_epochs, SOURCE, "trigger.path_epochs");
            for path in event.kind.affected_paths() {
                paths
                    .entry(path)
                    .and_modify(|latest| *latest = (*latest).max(epoch))
                    .or_insert(epoch);
            }
        }

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            "Revalidation published"
        );
        counter!("splitrender_revalidation_total", "kind" => event.kind.label()).increment(1);

        history.push_back(event);
        while history.len() > self.config.history_limit.get() {
            history.pop_front();
        }

        self.notifier
            .send_modify(|latest| *latest = (*latest).max(epoch));
        drop(history);
        Some(epoch)
    }

    /// Revalidate a single path.
    pub fn revalidate_path(&self, path: &str) -> Option<Epoch> {
        self.trigger(EventKind::PathRevalidated {
            path: path.to_string(),
        })
    }

    pub fn preferences_updated(&self, currency: &str) -> Option<Epoch> {
        self.trigger(EventKind::PreferencesUpdated {
            currency: currency.to_string(),
        })
    }

    pub fn feature_flag_toggled(&self, flag: &str, enabled: bool) -> Option<Epoch> {
        self.trigger(EventKind::FeatureFlagToggled {
            flag: flag.to_string(),
            enabled,
        })
    }

    /// Receiver woken after every published event.
    pub fn subscribe(&self) -> watch::Receiver<Epoch> {
        self.notifier.subscribe()
    }

    /// Latest epoch across all paths.
    pub fn epoch(&self) -> Epoch {
        *self.notifier.borrow()
    }

    /// Latest epoch that touched `path`; zero when it was never revalidated.
    pub fn path_epoch(&self, path: &str) -> Epoch {
        rw_read(&self.path_epochs, SOURCE, "path_epoch")
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Most recent events, oldest first.
    pub fn recent(&self) -> Vec<RevalidationEvent> {
        mutex_lock(&self.history, SOURCE, "recent")
            .iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn disabled() -> Revalidator {
        Revalidator::new(RevalidateConfig {
            enabled: false,
            ..Default::default()
        })
    }

    #[test]
    fn epochs_increase_monotonically() {
        let revalidator = Revalidator::new(RevalidateConfig::default());
        assert_eq!(revalidator.epoch(), 0);

        assert_eq!(revalidator.preferences_updated("EUR"), Some(1));
        assert_eq!(revalidator.feature_flag_toggled("x", true), Some(2));
        assert_eq!(revalidator.revalidate_path("/about"), Some(3));

        assert_eq!(revalidator.epoch(), 3);
        assert_eq!(revalidator.path_epoch("/"), 2);
        assert_eq!(revalidator.path_epoch("/about"), 3);
        assert_eq!(revalidator.path_epoch("/never"), 0);
    }

    #[test]
    fn disabled_revalidator_publishes_nothing() {
        let revalidator = disabled();
        assert_eq!(revalidator.preferences_updated("EUR"), None);
        assert_eq!(revalidator.epoch(), 0);
        assert!(revalidator.recent().is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let revalidator = Revalidator::new(RevalidateConfig {
            enabled: true,
            history_limit: NonZeroUsize::new(2).unwrap(),
        });
        revalidator.revalidate_path("/a");
        revalidator.revalidate_path("/b");
        revalidator.revalidate_path("/c");

        let recent = revalidator.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].epoch, 2);
        assert_eq!(recent[1].epoch, 3);
    }

    #[test]
    fn concurrent_triggers_keep_epochs_ordered() {
        for _ in 0..50 {
            let revalidator = Arc::new(Revalidator::new(RevalidateConfig {
                enabled: true,
                history_limit: NonZeroUsize::new(512).unwrap(),
            }));

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let revalidator = Arc::clone(&revalidator);
                    std::thread::spawn(move || {
                        for _ in 0..50 {
                            revalidator.revalidate_path("/");
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(revalidator.epoch(), 400);
            assert_eq!(revalidator.path_epoch("/"), revalidator.epoch());
            let epochs: Vec<_> = revalidator.recent().iter().map(|e| e.epoch).collect();
            assert_eq!(epochs.len(), 400);
            assert!(epochs.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[tokio::test]
    async fn subscribers_wake_on_publish() {
        let revalidator = Revalidator::new(RevalidateConfig::default());
        let mut receiver = revalidator.subscribe();

        revalidator.feature_flag_toggled("currencyToggle", true);

        tokio::time::timeout(Duration::from_secs(1), receiver.changed())
            .await
            .expect("subscriber should be woken")
            .expect("sender alive");
        assert_eq!(*receiver.borrow_and_update(), 1);
    }
}
