use crate::browser::driver::{Key, Locator, PageDriver};
use crate::browser::wait::{pause, wait_for_any, wait_for_visible};
use crate::error::FetchError;
use crate::form::selectors::{self, EhiSelectors};
use std::time::Duration;

const NETWORK_IDLE_WAIT: Duration = Duration::from_secs(30);
const RESULTS_WAIT: Duration = Duration::from_secs(15);
const DAILY_PRICE_WAIT: Duration = Duration::from_secs(6);

/// Which control ended up submitting the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPath {
    RoleAndLabel,
    PartialLabel,
    TextMatch,
    EnterKey,
}

/// What the results wait saw. A timeout does not fail the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsState {
    Cards,
    BookButtons,
    DailyPrices,
    TimedOut,
}

/// Submits the search form, falling back through looser button matches and
/// finally the Enter key.
pub async fn submit<P: PageDriver + ?Sized>(page: &P) -> Result<SubmitPath, FetchError> {
    let candidates = [
        (SubmitPath::RoleAndLabel, selectors::search_by_role()),
        (SubmitPath::PartialLabel, selectors::search_by_partial_text()),
        (SubmitPath::TextMatch, selectors::search_by_text()),
    ];

    for (path, locator) in candidates.iter() {
        if page.count(locator).await? == 0 {
            continue;
        }
        match page.click(locator).await {
            Ok(()) => {
                tracing::info!("🔎 search submitted ({:?})", path);
                return Ok(*path);
            }
            Err(e) => tracing::debug!("search button {} not clickable: {}", locator, e),
        }
    }

    tracing::warn!("⚠️ no search button found, pressing Enter");
    page.press(Key::Enter).await?;
    Ok(SubmitPath::EnterKey)
}

/// Waits for the results list: network idle, a short settle, then any of the
/// result markers. Timeouts are logged and swallowed.
pub async fn wait_for_results<P: PageDriver + ?Sized>(page: &P) -> Result<ResultsState, FetchError> {
    page.network_idle(NETWORK_IDLE_WAIT).await?;
    pause(800).await;

    let markers: [Locator; 2] = [
        selectors::result_cards(),
        selectors::text_contains(EhiSelectors::BOOK_LABEL),
    ];
    match wait_for_any(page, &markers, RESULTS_WAIT).await? {
        Some(0) => return Ok(ResultsState::Cards),
        Some(_) => return Ok(ResultsState::BookButtons),
        None => {}
    }

    let daily = selectors::text_contains(EhiSelectors::DAILY_PRICE_LABEL);
    if wait_for_visible(page, &daily, DAILY_PRICE_WAIT).await? {
        return Ok(ResultsState::DailyPrices);
    }

    tracing::warn!("⚠️ results list not detected, extracting from the page as is");
    Ok(ResultsState::TimedOut)
}
