//! The polling loop around the fetcher: observation log, change detection,
//! alert threshold and notifications.

use crate::browser::{CdpLauncher, Launcher};
use crate::config::{Config, EHI_BASE_URL};
use crate::fetcher::PriceFetcher;
use crate::services::{EmailService, Notifier, Observation, ObservationLog, PriceStore};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyDecision {
    Notify,
    Unchanged,
    AboveThreshold,
}

/// Notify when the price moved (or nothing was known) and, with a threshold
/// set, only when the price is at or below it.
pub fn decide(last_price: Option<f64>, price: f64, alert_price: Option<f64>) -> NotifyDecision {
    if alert_price.is_some_and(|alert| price > alert) {
        return NotifyDecision::AboveThreshold;
    }
    if last_price == Some(price) {
        return NotifyDecision::Unchanged;
    }
    NotifyDecision::Notify
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Priced { price: f64, decision: NotifyDecision },
    NotFound,
    Failed,
}

/// Result of a `--once` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnceOutcome {
    Done,
    NotFound,
    MailFailed,
    FetchFailed,
}

impl OnceOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            OnceOutcome::Done => 0,
            OnceOutcome::FetchFailed => 1,
            OnceOutcome::NotFound => 2,
            OnceOutcome::MailFailed => 3,
        }
    }
}

pub struct Monitor<L: Launcher, N: Notifier> {
    fetcher: PriceFetcher<L>,
    notifier: N,
    store: PriceStore,
    observations: ObservationLog,
    alert_price: Option<f64>,
    interval: Duration,
}

impl Monitor<CdpLauncher, EmailService> {
    pub fn from_config(config: &Config) -> Self {
        Monitor::new(
            PriceFetcher::from_config(config),
            EmailService::new(config.smtp.clone(), config.target.car_name.clone()),
            PriceStore::new(config.data_file.clone()),
            ObservationLog::in_dir(&config.logs_dir),
        )
        .with_alert_price(config.alert_price)
        .with_interval(Duration::from_secs(config.check_interval_seconds))
    }
}

impl<L: Launcher, N: Notifier> Monitor<L, N> {
    pub fn new(
        fetcher: PriceFetcher<L>,
        notifier: N,
        store: PriceStore,
        observations: ObservationLog,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            store,
            observations,
            alert_price: None,
            interval: Duration::from_secs(600),
        }
    }

    pub fn with_alert_price(mut self, alert_price: Option<f64>) -> Self {
        self.alert_price = alert_price;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn announce(&self) {
        let target = self.fetcher.target();
        tracing::info!("🚀 rental price monitor started");
        tracing::info!("   Target: {}", target.car_name);
        tracing::info!("   Mode: firstStep form fill");
        tracing::info!("   Base URL: {}", EHI_BASE_URL);
        tracing::info!("   Pickup: {} {}", target.pickup_city, target.pickup_date);
        tracing::info!("   Return: {} {}", target.return_city, target.return_date);
        if let Some(alert) = self.alert_price {
            tracing::info!("   Alert threshold: <= {}", alert);
        }
        tracing::info!("   Interval: {}s", self.interval.as_secs());
    }

    /// Single check that reports the current price whether or not it changed.
    pub async fn run_once(&self) -> OnceOutcome {
        let price = match self.fetcher.get_current_price().await {
            Ok(Some(price)) => price,
            Ok(None) => {
                tracing::warn!("⚠️ could not find a price for the target vehicle");
                return OnceOutcome::NotFound;
            }
            Err(e) => {
                tracing::error!("❌ check failed: {}", e);
                return OnceOutcome::FetchFailed;
            }
        };

        tracing::info!("💰 current price: {}", price);
        self.record(price, None);

        if let Some(alert) = self.alert_price.filter(|alert| price > *alert) {
            tracing::info!("skip email: price {} exceeds alert threshold {}", price, alert);
            return OnceOutcome::Done;
        }
        match self.notifier.current_price(price).await {
            Ok(()) => {
                tracing::info!("📧 test email sent");
                OnceOutcome::Done
            }
            Err(e) => {
                tracing::error!("❌ failed to send email: {}", e);
                OnceOutcome::MailFailed
            }
        }
    }

    /// Polls until `shutdown` resolves. A fetch in flight is dropped on
    /// shutdown, which tears its browser session down.
    pub async fn run_until<S: Future<Output = ()>>(&self, shutdown: S) {
        tokio::pin!(shutdown);

        let mut last_price = self.store.load();
        if let Some(last) = last_price {
            tracing::info!("last known price: {}", last);
        }

        loop {
            tokio::select! {
                _ = self.check(&mut last_price) => {}
                _ = &mut shutdown => break,
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => break,
            }
        }
        tracing::info!("👋 exiting on user request");
    }

    pub async fn run(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("❌ could not listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// One polling cycle. Updates `last_price` only after a notification attempt.
    pub async fn check(&self, last_price: &mut Option<f64>) -> CycleOutcome {
        let price = match self.fetcher.get_current_price().await {
            Ok(Some(price)) => price,
            Ok(None) => {
                tracing::warn!("⚠️ could not find a price for the target vehicle, will retry later");
                return CycleOutcome::NotFound;
            }
            Err(e) => {
                tracing::error!("❌ check failed: {}", e);
                return CycleOutcome::Failed;
            }
        };

        tracing::info!("💰 current price: {}", price);
        self.record(price, *last_price);

        let decision = decide(*last_price, price, self.alert_price);
        match decision {
            NotifyDecision::AboveThreshold => tracing::info!(
                "skip notify: price {} exceeds alert threshold {:?}",
                price,
                self.alert_price
            ),
            NotifyDecision::Unchanged => tracing::debug!("price unchanged"),
            NotifyDecision::Notify => {
                tracing::info!("📈 price change detected: {:?} -> {}", last_price, price);
                match self.notifier.price_changed(*last_price, price).await {
                    Ok(()) => tracing::info!("📧 notification email sent"),
                    Err(e) => tracing::error!("❌ failed to send email: {}", e),
                }
                if let Err(e) = self.store.save(price) {
                    tracing::error!("❌ could not persist last price: {}", e);
                }
                *last_price = Some(price);
            }
        }

        CycleOutcome::Priced { price, decision }
    }

    fn record(&self, price: f64, last_price: Option<f64>) {
        let observation = Observation::new(self.fetcher.target(), price, last_price, self.alert_price);
        if let Err(e) = self.observations.append(&observation) {
            tracing::warn!("⚠️ could not append observation: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_price_always_notifies() {
        assert_eq!(decide(None, 698.0, None), NotifyDecision::Notify);
    }

    #[test]
    fn unchanged_price_is_quiet() {
        assert_eq!(decide(Some(698.0), 698.0, None), NotifyDecision::Unchanged);
        assert_eq!(decide(Some(698.0), 650.0, None), NotifyDecision::Notify);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(decide(None, 700.0, Some(700.0)), NotifyDecision::Notify);
        assert_eq!(decide(None, 700.5, Some(700.0)), NotifyDecision::AboveThreshold);
        assert_eq!(decide(Some(650.0), 720.0, Some(700.0)), NotifyDecision::AboveThreshold);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(OnceOutcome::Done.exit_code(), 0);
        assert_eq!(OnceOutcome::FetchFailed.exit_code(), 1);
        assert_eq!(OnceOutcome::NotFound.exit_code(), 2);
        assert_eq!(OnceOutcome::MailFailed.exit_code(), 3);
    }
}
