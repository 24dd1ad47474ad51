use crate::extract::keywords::VehicleQuery;
use crate::extract::text::parse_price_number;
use crate::extract::view::{collapsed_text, ResultsView};
use crate::extract::{PriceCandidate, StrategyTag};
use scraper::Selector;
use std::sync::LazyLock;

const MAX_CARDS: usize = 40;

pub(crate) static CARD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".cartype-list").expect("card selector"));
static CARD_NAME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".cartype-name").expect("card name selector"));
static CARD_PRICE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".cartype-price .cartype-price-current em").expect("card price selector")
});

/// Structured result cards: match by the card's name element, read the price
/// only from the card's numeric price element. Several cards can carry the
/// same model (different pickup logistics); the cheapest wins.
pub fn from_cards(view: &ResultsView, query: &VehicleQuery) -> Option<PriceCandidate> {
    let mut prices = Vec::new();

    for card in view.select(&CARD).take(MAX_CARDS) {
        let name = card
            .select(&CARD_NAME)
            .next()
            .map(collapsed_text)
            .unwrap_or_default();
        if !query.matches_name(&name) {
            continue;
        }

        let Some(price_el) = card.select(&CARD_PRICE).next() else {
            tracing::debug!("card '{}' has no price element", name);
            continue;
        };
        match parse_price_number(&collapsed_text(price_el)) {
            Some(price) => {
                tracing::debug!("card '{}' -> {}", name, price);
                prices.push(price);
            }
            None => tracing::debug!("card '{}' price not parseable", name),
        }
    }

    if prices.len() > 1 {
        tracing::debug!("{} matching cards, taking the minimum of {:?}", prices.len(), prices);
    }

    prices
        .into_iter()
        .min_by(f64::total_cmp)
        .map(|value| PriceCandidate::new(value, StrategyTag::StructuredCard))
}
