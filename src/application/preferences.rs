//! Server-of-record preferences: reads, mutations and their revalidation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use tracing::{info, instrument};

use crate::{
    application::repos::PreferencesRepo,
    domain::{error::DomainError, preferences::PreferencesSnapshot, types::CurrencyCode},
    revalidate::Revalidator,
};

pub struct PreferencesService {
    repo: Arc<dyn PreferencesRepo>,
    revalidator: Arc<Revalidator>,
    strict_currency: bool,
    pending: AtomicUsize,
}

/// Counts a mutation as pending for as long as it is alive.
struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        gauge!("splitrender_store_pending_mutations").increment(1.0);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
        gauge!("splitrender_store_pending_mutations").decrement(1.0);
    }
}

impl PreferencesService {
    pub fn new(repo: Arc<dyn PreferencesRepo>, revalidator: Arc<Revalidator>) -> Self {
        Self {
            repo,
            revalidator,
            strict_currency: false,
            pending: AtomicUsize::new(0),
        }
    }

    /// Reject currencies outside the known set instead of storing them verbatim.
    pub fn with_strict_currency(mut self, strict: bool) -> Self {
        self.strict_currency = strict;
        self
    }

    pub fn revalidator(&self) -> &Arc<Revalidator> {
        &self.revalidator
    }

    /// Number of mutations started but not yet committed.
    pub fn pending_mutations(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub async fn get_preferences(&self) -> PreferencesSnapshot {
        counter!("splitrender_store_read_total").increment(1);
        let (preferences, flags) = self.repo.load().await;
        PreferencesSnapshot::from_records(&preferences, &flags)
    }

    /// Overwrite the stored currency, then revalidate readers of the home page.
    ///
    /// Resolves only after the write is committed, so a read issued afterwards observes it.
    #[instrument(skip(self))]
    pub async fn set_currency(&self, currency: &str) -> Result<(), DomainError> {
        if self.strict_currency {
            currency.parse::<CurrencyCode>()?;
        }

        let _pending = PendingGuard::enter(&self.pending);
        let started = Instant::now();
        self.repo.write_currency(currency).await;
        record_mutation("set_currency", started);

        info!(
            target = "splitrender::preferences",
            currency, "Currency preference committed"
        );
        self.revalidator.preferences_updated(currency);
        Ok(())
    }

    /// Flip a feature flag, then revalidate readers of the home page. Returns the new value.
    #[instrument(skip(self))]
    pub async fn toggle_flag(&self, flag: &str) -> bool {
        let _pending = PendingGuard::enter(&self.pending);
        let started = Instant::now();
        let enabled = self.repo.toggle_flag(flag).await;
        record_mutation("toggle_flag", started);

        info!(
            target = "splitrender::preferences",
            flag, enabled, "Feature flag committed"
        );
        self.revalidator.feature_flag_toggled(flag, enabled);
        enabled
    }
}

fn record_mutation(op: &'static str, started: Instant) {
    counter!("splitrender_store_mutation_total", "op" => op).increment(1);
    histogram!("splitrender_store_mutation_ms", "op" => op)
        .record(started.elapsed().as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::preferences::CURRENCY_TOGGLE_FLAG;
    use crate::infra::memory::{InMemoryPreferences, StoreLatency};
    use crate::revalidate::RevalidateConfig;

    fn service(latency: StoreLatency) -> Arc<PreferencesService> {
        let repo: Arc<dyn PreferencesRepo> = Arc::new(InMemoryPreferences::new(latency));
        let revalidator = Arc::new(Revalidator::new(RevalidateConfig::default()));
        Arc::new(PreferencesService::new(repo, revalidator))
    }

    fn write_only_latency() -> StoreLatency {
        StoreLatency {
            read: Duration::ZERO,
            ..StoreLatency::default()
        }
    }

    #[tokio::test]
    async fn defaults_are_usd_light_without_toggle() {
        let service = service(StoreLatency::none());
        let snapshot = service.get_preferences().await;
        assert_eq!(snapshot.currency, "USD");
        assert_eq!(snapshot.theme, "light");
        assert!(!snapshot.currency_toggle_enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn read_after_completed_write_is_never_stale() {
        let service = service(StoreLatency::default());

        service.set_currency("EUR").await.unwrap();

        assert_eq!(service.get_preferences().await.currency, "EUR");
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_write_is_observable_as_pending() {
        let service = service(write_only_latency());

        let writer = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.set_currency("GBP").await }
        });
        tokio::task::yield_now().await;

        assert_eq!(service.pending_mutations(), 1);
        assert_eq!(service.get_preferences().await.currency, "USD");

        writer.await.unwrap().unwrap();
        assert_eq!(service.pending_mutations(), 0);
        assert_eq!(service.get_preferences().await.currency, "GBP");
    }

    #[tokio::test(start_paused = true)]
    async fn write_takes_the_simulated_latency() {
        let service = service(write_only_latency());
        let started = tokio::time::Instant::now();

        service.set_currency("JPY").await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn racing_writes_resolve_to_the_last_completed_one() {
        let service = service(write_only_latency());

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.set_currency("EUR").await }
        });
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(250)).await;
        let second = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.set_currency("GBP").await }
        });
        tokio::task::yield_now().await;
        assert_eq!(service.pending_mutations(), 2);

        first.await.unwrap().unwrap();
        assert_eq!(service.get_preferences().await.currency, "EUR");
        second.await.unwrap().unwrap();
        assert_eq!(service.get_preferences().await.currency, "GBP");
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_writes_are_last_write_wins() {
        let service = service(write_only_latency());

        let (a, b) =
            futures::future::join(service.set_currency("EUR"), service.set_currency("CAD")).await;
        a.unwrap();
        b.unwrap();

        // Completion order between equal latencies is unspecified; either write may land last.
        let currency = service.get_preferences().await.currency;
        assert!(currency == "EUR" || currency == "CAD", "got {currency}");
    }

    #[tokio::test]
    async fn arbitrary_currency_is_accepted_by_default() {
        let service = service(StoreLatency::none());
        service.set_currency("not-a-currency").await.unwrap();
        assert_eq!(service.get_preferences().await.currency, "not-a-currency");
    }

    #[tokio::test]
    async fn strict_mode_rejects_unknown_currency() {
        let repo: Arc<dyn PreferencesRepo> =
            Arc::new(InMemoryPreferences::new(StoreLatency::none()));
        let revalidator = Arc::new(Revalidator::new(RevalidateConfig::default()));
        let service = PreferencesService::new(repo, revalidator.clone()).with_strict_currency(true);

        let err = service.set_currency("XYZ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
        assert_eq!(service.get_preferences().await.currency, "USD");
        assert_eq!(revalidator.epoch(), 0);

        service.set_currency("JPY").await.unwrap();
        assert_eq!(service.get_preferences().await.currency, "JPY");
    }

    #[tokio::test]
    async fn toggle_flag_creates_then_flips() {
        let service = service(StoreLatency::none());

        assert!(service.toggle_flag("x").await);
        assert!(!service.toggle_flag("x").await);
        assert!(service.toggle_flag(CURRENCY_TOGGLE_FLAG).await);
        assert!(service.get_preferences().await.currency_toggle_enabled);
    }

    #[tokio::test]
    async fn mutations_revalidate_the_home_page() {
        let service = service(StoreLatency::none());
        let mut receiver = service.revalidator().subscribe();

        service.set_currency("EUR").await.unwrap();
        assert!(receiver.has_changed().unwrap());
        assert_eq!(*receiver.borrow_and_update(), 1);

        service.toggle_flag(CURRENCY_TOGGLE_FLAG).await;
        assert_eq!(*receiver.borrow_and_update(), 2);
        assert_eq!(service.revalidator().path_epoch("/"), 2);
    }
}
