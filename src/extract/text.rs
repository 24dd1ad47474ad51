use regex::Regex;
use std::sync::LazyLock;

/// Parsed numbers below this are engine sizes, seat counts and the like.
pub const PLAUSIBILITY_FLOOR: f64 = 20.0;

// Grouped form first so "¥1,234" is not cut at the first comma group and
// "¥1234" still falls through to the plain form.
static CURRENCY_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:¥|￥|RMB)\s*([0-9]{1,3}(?:,[0-9]{3})+(?:\.[0-9]{1,2})?|[0-9]+(?:\.[0-9]{1,2})?)",
    )
    .expect("currency price pattern")
});

static CONTEXT_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:^|[^0-9.,])([0-9]{2,5}(?:\.[0-9]{1,2})?)\s*(?:/\s*日均|日均|/\s*天|天|元|/\s*day|per\s+day)",
    )
    .expect("context price pattern")
});

/// Pulls a price out of free text.
///
/// Prefers a currency-prefixed number (`¥698`, `￥1,280.50`, `RMB 720`); otherwise
/// a bare number directly followed by a price-context word (`720/日均`, `698元`).
/// Anything under [`PLAUSIBILITY_FLOOR`] is treated as a decoy.
pub fn parse_price_from_text(text: &str) -> Option<f64> {
    let raw = CURRENCY_PRICE
        .captures(text)
        .or_else(|| CONTEXT_PRICE.captures(text))
        .and_then(|c| c.get(1))?
        .as_str();

    let value: f64 = raw.replace(',', "").parse().ok()?;
    plausible(value)
}

/// Parses the content of a dedicated numeric price element ("698", "1,298").
/// Falls back to the free-text parser when the element carries decoration.
pub fn parse_price_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(value) => plausible(value),
        Err(_) => parse_price_from_text(trimmed),
    }
}

fn plausible(value: f64) -> Option<f64> {
    if value.is_finite() && value >= PLAUSIBILITY_FLOOR {
        Some(value)
    } else {
        None
    }
}
