use crate::browser::driver::{Key, Locator, PageDriver};
use crate::browser::wait::{pause, wait_for_attribute, wait_for_visible};
use crate::error::FetchError;
use crate::form::selectors;
use crate::form::{read_back, SelectionPath, SelectionResult};
use chrono::NaiveDate;
use std::time::Duration;

const ROUNDS: usize = 2;
/// Calendar pages turned per opening before giving up on the date.
pub const MAX_MONTH_TURNS: usize = 12;
const OVERLAY_WAIT: Duration = Duration::from_millis(6000);
const APPLY_WAIT: Duration = Duration::from_millis(1500);

/// Sets a date input through its calendar overlay.
///
/// The input is found by id, or by the first input following its visible
/// label. The overlay is paged forward until the target cell shows up,
/// at most [`MAX_MONTH_TURNS`] times per round. Acceptance is textual: the
/// input's `value` or `title` contains the ISO date. After two rounds the
/// value is force-written and re-read.
pub async fn resolve_date<P: PageDriver + ?Sized>(
    page: &P,
    field_id: &str,
    label: &str,
    date: NaiveDate,
) -> Result<SelectionResult, FetchError> {
    let iso = date.format("%Y-%m-%d").to_string();

    let mut input = selectors::field(field_id);
    if page.count(&input).await? == 0 {
        tracing::debug!("no #{}, locating by label '{}'", field_id, label);
        input = selectors::field_after_label(label);
        if page.count(&input).await? == 0 {
            tracing::warn!("⚠️ date input {} not found", field_id);
            return Ok(SelectionResult {
                field: field_id.to_string(),
                confirmed: false,
                observed: String::new(),
                via: SelectionPath::Interactive,
            });
        }
    }

    for round in 1..=ROUNDS {
        if let Err(e) = pick_in_calendar(page, &input, &iso).await {
            tracing::debug!("📅 {} round {}: {}", field_id, round, e);
        }
        let observed = read_back(page, &input).await?;
        if observed.contains(&iso) {
            tracing::info!("✅ {} set to {}", field_id, iso);
            return Ok(SelectionResult {
                field: field_id.to_string(),
                confirmed: true,
                observed,
                via: SelectionPath::Interactive,
            });
        }
        pause(120).await;
    }

    tracing::warn!("⚠️ calendar did not apply {} to {}, writing it directly", iso, field_id);
    page.force_value(&input, &iso).await?;
    pause(120).await;
    let observed = read_back(page, &input).await?;

    Ok(SelectionResult {
        field: field_id.to_string(),
        confirmed: observed.contains(&iso),
        observed,
        via: SelectionPath::ForcedWrite,
    })
}

/// One interactive round. Returns how many months were turned.
async fn pick_in_calendar<P: PageDriver + ?Sized>(
    page: &P,
    input: &Locator,
    iso: &str,
) -> Result<usize, FetchError> {
    if let Err(e) = page.scroll_into_view(input).await {
        tracing::debug!("scroll to date input: {}", e);
    }
    let mut opener = input.clone();
    if let Some(wrapper) = selectors::picker_wrapper(input) {
        if page.count(&wrapper).await? > 0 {
            opener = wrapper;
        }
    }
    page.click(&opener).await?;

    if !wait_for_visible(page, &selectors::open_picker(), OVERLAY_WAIT).await? {
        return Err(FetchError::transient("date picker overlay did not open"));
    }

    let cell = selectors::calendar_cell(iso);
    let next = selectors::calendar_next_month();
    let mut turns = 0;
    while page.count(&cell).await? == 0 && turns < MAX_MONTH_TURNS {
        page.click(&next).await?;
        pause(120).await;
        turns += 1;
    }

    if page.count(&cell).await? > 0 {
        if let Err(e) = page.scroll_into_view(&cell).await {
            tracing::debug!("scroll to cell: {}", e);
        }
        page.click(&cell).await?;
        if !wait_for_attribute(page, input, &["value", "title"], iso, APPLY_WAIT).await? {
            tracing::debug!("input did not reflect {} after clicking the cell", iso);
        }
    } else {
        tracing::debug!("cell {} not found after {} month turns", iso, turns);
    }

    let confirm = selectors::calendar_confirm();
    if page.count(&confirm).await? > 0 {
        page.click(&confirm).await?;
    }
    page.press(Key::Escape).await?;

    Ok(turns)
}
