use crate::browser::driver::{Locator, PageDriver};
use crate::error::FetchError;
use std::time::Duration;
use tokio::time::{sleep, Instant};

const POLL: Duration = Duration::from_millis(100);

/// Polls until the locator's first match is visible. `Ok(false)` on timeout.
pub async fn wait_for_visible<P: PageDriver + ?Sized>(
    page: &P,
    locator: &Locator,
    timeout: Duration,
) -> Result<bool, FetchError> {
    let deadline = Instant::now() + timeout;
    loop {
        if page.is_visible(locator).await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(POLL).await;
    }
}

/// Polls until any of the locators has a visible match; returns its index.
pub async fn wait_for_any<P: PageDriver + ?Sized>(
    page: &P,
    locators: &[Locator],
    timeout: Duration,
) -> Result<Option<usize>, FetchError> {
    let deadline = Instant::now() + timeout;
    loop {
        for (i, locator) in locators.iter().enumerate() {
            if page.is_visible(locator).await? {
                return Ok(Some(i));
            }
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        sleep(POLL).await;
    }
}

/// Polls until the locator has no visible match. `Ok(false)` on timeout.
pub async fn wait_until_hidden<P: PageDriver + ?Sized>(
    page: &P,
    locator: &Locator,
    timeout: Duration,
) -> Result<bool, FetchError> {
    let deadline = Instant::now() + timeout;
    loop {
        if !page.is_visible(locator).await? {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(POLL).await;
    }
}

/// Polls until one of `attrs` on the element equals `expected` exactly.
pub async fn wait_for_attribute<P: PageDriver + ?Sized>(
    page: &P,
    locator: &Locator,
    attrs: &[&str],
    expected: &str,
    timeout: Duration,
) -> Result<bool, FetchError> {
    let deadline = Instant::now() + timeout;
    loop {
        for attr in attrs {
            if page.attribute(locator, attr).await?.as_deref() == Some(expected) {
                return Ok(true);
            }
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        sleep(POLL).await;
    }
}

pub async fn pause(ms: u64) {
    sleep(Duration::from_millis(ms)).await;
}
