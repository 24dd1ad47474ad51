use crate::browser::{BrowserSession, CdpLauncher, DebugSink, Launcher, PageDriver, SessionConfig};
use crate::config::{Config, FetchTarget};
use crate::error::FetchError;
use crate::extract::{self, PriceCandidate, VehicleQuery};
use crate::form::{self, FormOptions};
use std::future::Future;
use std::time::Duration;

/// Bounded retry around one unit of work. Only errors are retried; a clean
/// `Ok(None)` ("not found") is a final answer.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    tracing::warn!("⚠️ attempt {}/{} failed: {}", attempt, attempts, e);
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("❌ attempt {}/{} failed, giving up: {}", attempt, attempts, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Drives one browser session per attempt through form, search and extraction.
pub struct PriceFetcher<L: Launcher> {
    launcher: L,
    target: FetchTarget,
    query: VehicleQuery,
    form: FormOptions,
    debug: DebugSink,
    retry: RetryPolicy,
}

impl PriceFetcher<CdpLauncher> {
    pub fn from_config(config: &Config) -> Self {
        let session = SessionConfig::new(config.chrome_path.clone(), config.target.headful);
        PriceFetcher::new(CdpLauncher::new(session), config.target.clone())
            .with_debug(DebugSink::new(config.target.debug, config.debug_dir.clone()))
            .with_form_options(FormOptions {
                require_confirmed_selection: config.require_confirmed_selection,
            })
    }
}

impl<L: Launcher> PriceFetcher<L> {
    pub fn new(launcher: L, target: FetchTarget) -> Self {
        let query = VehicleQuery::new(&target.car_name);
        Self {
            launcher,
            target,
            query,
            form: FormOptions::default(),
            debug: DebugSink::disabled(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_debug(mut self, debug: DebugSink) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_form_options(mut self, form: FormOptions) -> Self {
        self.form = form;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn target(&self) -> &FetchTarget {
        &self.target
    }

    /// Current daily price for the target vehicle, `None` when the page has none.
    pub async fn get_current_price(&self) -> Result<Option<f64>, FetchError> {
        let hit = self.retry.run(|attempt| self.attempt(attempt)).await?;
        Ok(hit.map(|candidate| candidate.value))
    }

    /// One isolated attempt: fresh session, closed on every exit path.
    pub async fn attempt(&self, attempt: u32) -> Result<Option<PriceCandidate>, FetchError> {
        tracing::info!(
            "🚗 attempt {}: '{}' {} {} → {} {}",
            attempt,
            self.target.car_name,
            self.target.pickup_city,
            self.target.pickup_date,
            self.target.return_city,
            self.target.return_date
        );
        let mut session = self.launcher.open().await?;
        let outcome = self.run_in_page(session.page()).await;
        session.close().await;
        outcome
    }

    async fn run_in_page<P: PageDriver + ?Sized>(
        &self,
        page: &P,
    ) -> Result<Option<PriceCandidate>, FetchError> {
        let report = form::fill_and_search(page, &self.target, self.form, &self.debug).await?;
        tracing::debug!(
            "form submitted via {:?}, results {:?}, {} degraded control(s)",
            report.submitted_via,
            report.results,
            report.degraded().count()
        );
        extract::extract_price(page, &self.query).await
    }
}

/// Convenience entry point: a CDP-backed fetcher for the configured target.
pub async fn get_current_price(config: &Config) -> Result<Option<f64>, FetchError> {
    PriceFetcher::from_config(config).get_current_price().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_failures_with_delays() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = RetryPolicy::default()
            .run(|_| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::transient("page crashed"))
            })
            .await;

        assert!(matches!(result, Err(FetchError::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .run(|_| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<f64>, FetchError>(None)
            })
            .await;

        assert_eq!(result.unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_on_a_later_attempt() {
        let result = RetryPolicy::default()
            .run(|attempt| async move {
                if attempt < 2 {
                    Err(FetchError::transient("flaky"))
                } else {
                    Ok(698.0)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 698.0);
    }
}
