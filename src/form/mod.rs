//! Filling and submitting the booking search form.

pub mod city;
pub mod date;
pub mod search;
pub mod selectors;

use crate::browser::driver::{Locator, PageDriver};
use crate::browser::wait::wait_for_visible;
use crate::browser::DebugSink;
use crate::config::{FetchTarget, EHI_BASE_URL};
use crate::error::FetchError;
use std::time::Duration;

pub use city::resolve_city;
pub use date::resolve_date;
pub use search::{ResultsState, SubmitPath};
pub use selectors::EhiSelectors;

const FIELD_WAIT: Duration = Duration::from_secs(15);
const LOAD_IDLE_WAIT: Duration = Duration::from_secs(30);

/// How a form control reached its final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPath {
    /// Driven through the widget like a user would.
    Interactive,
    /// Value written directly after the widget refused; the site may ignore it.
    ForcedWrite,
    /// The lookup itself errored; the control was left as it was.
    LookupFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
    pub field: String,
    pub confirmed: bool,
    pub observed: String,
    pub via: SelectionPath,
}

impl SelectionResult {
    fn lookup_failed(field: &str) -> Self {
        Self {
            field: field.to_string(),
            confirmed: false,
            observed: String::new(),
            via: SelectionPath::LookupFailed,
        }
    }

    /// Confirmed through the widget, so the search will see it.
    pub fn is_trusted(&self) -> bool {
        self.confirmed && self.via == SelectionPath::Interactive
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FormOptions {
    /// Refuse to submit when any control was not confirmed interactively.
    pub require_confirmed_selection: bool,
}

#[derive(Debug, Clone)]
pub struct FormReport {
    pub selections: Vec<SelectionResult>,
    pub submitted_via: SubmitPath,
    pub results: ResultsState,
}

impl FormReport {
    pub fn degraded(&self) -> impl Iterator<Item = &SelectionResult> {
        self.selections.iter().filter(|s| !s.is_trusted())
    }
}

/// `title` and `value` of a control joined, which is what the site shows.
pub(crate) async fn read_back<P: PageDriver + ?Sized>(
    page: &P,
    locator: &Locator,
) -> Result<String, FetchError> {
    let title = page.attribute(locator, "title").await?.unwrap_or_default();
    let value = page.attribute(locator, "value").await?.unwrap_or_default();
    Ok(format!("{} {}", title, value).trim().to_string())
}

/// Opens the booking form, fills cities and dates, submits, and waits for
/// the results. Pickup and return times keep the page defaults.
pub async fn fill_and_search<P: PageDriver + ?Sized>(
    page: &P,
    target: &FetchTarget,
    options: FormOptions,
    debug: &DebugSink,
) -> Result<FormReport, FetchError> {
    tracing::info!("🌐 opening {}", EHI_BASE_URL);
    page.goto(EHI_BASE_URL).await?;

    let pickup = selectors::field(EhiSelectors::PICKUP_CITY_ID);
    let dropoff = selectors::field(EhiSelectors::RETURN_CITY_ID);
    let fields_ready = wait_for_visible(page, &pickup, FIELD_WAIT).await?
        && wait_for_visible(page, &dropoff, FIELD_WAIT).await?;
    if !fields_ready {
        tracing::debug!("city fields not visible yet, waiting for network idle");
        page.network_idle(LOAD_IDLE_WAIT).await?;
    }
    debug.capture(page, "01_loaded_firstStep").await;

    let mut selections = Vec::with_capacity(4);
    for (field_id, city) in [
        (EhiSelectors::PICKUP_CITY_ID, &target.pickup_city),
        (EhiSelectors::RETURN_CITY_ID, &target.return_city),
    ] {
        let result = match resolve_city(page, field_id, city).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("⚠️ city lookup for {} failed: {}", field_id, e);
                SelectionResult::lookup_failed(field_id)
            }
        };
        selections.push(result);
    }

    for (field_id, label, date) in [
        (
            EhiSelectors::PICKUP_DATE_ID,
            EhiSelectors::PICKUP_DATE_LABEL,
            target.pickup_date,
        ),
        (
            EhiSelectors::RETURN_DATE_ID,
            EhiSelectors::RETURN_DATE_LABEL,
            target.return_date,
        ),
    ] {
        let result = match resolve_date(page, field_id, label, date).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("⚠️ date lookup for {} failed: {}", field_id, e);
                SelectionResult::lookup_failed(field_id)
            }
        };
        selections.push(result);
    }
    tracing::debug!("pickup/return times left at page defaults");
    debug.capture(page, "02_filled_form").await;

    for degraded in selections.iter().filter(|s| !s.is_trusted()) {
        if options.require_confirmed_selection {
            return Err(FetchError::SelectionUnconfirmed {
                field: degraded.field.clone(),
                observed: degraded.observed.clone(),
            });
        }
        tracing::warn!(
            "⚠️ {} not confirmed ({:?}, reads '{}'), searching anyway",
            degraded.field,
            degraded.via,
            degraded.observed
        );
    }

    let submitted_via = search::submit(page).await?;
    let results = search::wait_for_results(page).await?;
    debug.capture(page, "03_results").await;

    Ok(FormReport {
        selections,
        submitted_via,
        results,
    })
}
