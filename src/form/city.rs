use crate::browser::driver::{Key, Locator, PageDriver};
use crate::browser::wait::{pause, wait_for_visible, wait_until_hidden};
use crate::error::FetchError;
use crate::form::selectors::{self, EhiSelectors};
use crate::form::{read_back, SelectionPath, SelectionResult};
use std::time::Duration;

const ROUNDS: usize = 2;
const KEY_DELAY: Duration = Duration::from_millis(20);
const SUGGEST_WAIT: Duration = Duration::from_millis(1200);
const DROPDOWN_WAIT: Duration = Duration::from_millis(3000);

/// Picks `city` in an autocomplete city field.
///
/// Each round types the name and tries, in order: the site's own suggestion
/// list, any open Ant Design dropdown or listbox, then "ArrowDown + Enter" to
/// take whatever the widget highlights first. The field counts as set once
/// its `title` or `value` mentions the city. After two failed rounds the value
/// is written directly and the result is marked [`SelectionPath::ForcedWrite`].
pub async fn resolve_city<P: PageDriver + ?Sized>(
    page: &P,
    field_id: &str,
    city: &str,
) -> Result<SelectionResult, FetchError> {
    let field = selectors::field(field_id);
    let variants = [city.to_string(), format!("{}{}", city, EhiSelectors::CITY_SUFFIX)];

    for round in 1..=ROUNDS {
        tracing::debug!("🏙️ {} round {}: typing '{}'", field_id, round, city);
        page.click(&field).await?;
        page.clear(&field).await?;
        page.type_text(&field, city, KEY_DELAY).await?;
        pause(150).await;
        if let Err(e) = page.press(Key::Enter).await {
            tracing::debug!("enter after typing: {}", e);
        }
        pause(150).await;

        let picked = match pick_from_suggestions(page, &variants).await? {
            Some(option) => Some(option),
            None => pick_from_dropdowns(page, &variants).await?,
        };
        match picked {
            Some(option) => tracing::debug!("clicked option {}", option),
            None => {
                tracing::debug!("no option matched '{}', taking first suggestion", city);
                page.press(Key::ArrowDown).await?;
                page.press(Key::Enter).await?;
                pause(600).await;
            }
        }

        let observed = read_back(page, &field).await?;
        if observed.contains(city) {
            if !wait_until_hidden(page, &selectors::city_suggest(), SUGGEST_WAIT).await? {
                tracing::debug!("city suggestions still showing after selection");
            }
            tracing::info!("✅ {} set to '{}'", field_id, observed);
            return Ok(SelectionResult {
                field: field_id.to_string(),
                confirmed: true,
                observed,
                via: SelectionPath::Interactive,
            });
        }
        tracing::debug!("{} reads '{}' after round {}", field_id, observed, round);
    }

    tracing::warn!(
        "⚠️ could not pick '{}' in {}, writing the value directly",
        city,
        field_id
    );
    page.force_value(&field, city).await?;
    pause(120).await;
    let observed = read_back(page, &field).await?;

    Ok(SelectionResult {
        field: field_id.to_string(),
        confirmed: observed.contains(city),
        observed,
        via: SelectionPath::ForcedWrite,
    })
}

async fn pick_from_suggestions<P: PageDriver + ?Sized>(
    page: &P,
    variants: &[String],
) -> Result<Option<Locator>, FetchError> {
    if !wait_for_visible(page, &selectors::city_suggest(), SUGGEST_WAIT).await? {
        tracing::debug!("city suggestion list did not appear");
        return Ok(None);
    }
    for variant in variants {
        let option = selectors::city_suggest_option(variant);
        if page.count(&option).await? > 0 {
            click_option(page, &option).await?;
            return Ok(Some(option));
        }
    }
    Ok(None)
}

async fn pick_from_dropdowns<P: PageDriver + ?Sized>(
    page: &P,
    variants: &[String],
) -> Result<Option<Locator>, FetchError> {
    if !wait_for_visible(page, &selectors::generic_dropdown(), DROPDOWN_WAIT).await? {
        tracing::debug!("no dropdown opened");
    }
    for variant in variants {
        for option in [
            selectors::generic_dropdown_option(variant),
            selectors::any_option(variant),
        ] {
            if page.count(&option).await? > 0 {
                click_option(page, &option).await?;
                return Ok(Some(option));
            }
        }
    }
    Ok(None)
}

async fn click_option<P: PageDriver + ?Sized>(page: &P, option: &Locator) -> Result<(), FetchError> {
    if let Err(e) = page.scroll_into_view(option).await {
        tracing::debug!("scroll to option: {}", e);
    }
    page.click(option).await
}
