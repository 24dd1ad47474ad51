use crate::extract::keywords::VehicleQuery;
use crate::extract::text::parse_price_from_text;
use crate::extract::view::{
    ancestor_block, enclosing_block, inner_text, is_skipped, own_text, render_height, ResultsView,
};
use crate::extract::{PriceCandidate, StrategyTag};
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Blocks shorter than this are just the label, not the card around it.
const MIN_BLOCK_HEIGHT_PX: f64 = 40.0;
const MAX_PRICE_LIKE: usize = 10;

static PRICE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[¥￥]|\d{2,}").expect("price-like pattern"));

/// Finds the vehicle name on the page and parses a price from the block around it.
pub fn near_name(view: &ResultsView, query: &VehicleQuery) -> Option<PriceCandidate> {
    let handle = find_name(view, query)?;

    let mut block = enclosing_block(handle)?;
    if render_height(block).is_some_and(|h| h < MIN_BLOCK_HEIGHT_PX) {
        if let Some(parent) = ancestor_block(block) {
            block = parent;
        }
    }

    if let Some(price) = parse_price_from_text(&inner_text(block)) {
        return Some(PriceCandidate::new(price, StrategyTag::Proximity));
    }

    // Second pass: price-looking descendants one at a time
    block
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| !is_skipped(*el))
        .filter(|el| PRICE_LIKE.is_match(&own_text(*el)))
        .take(MAX_PRICE_LIKE)
        .find_map(|el| parse_price_from_text(&inner_text(el)))
        .map(|price| PriceCandidate::new(price, StrategyTag::Proximity))
}

fn find_name<'a>(view: &'a ResultsView, query: &VehicleQuery) -> Option<ElementRef<'a>> {
    let full = query.full();
    if full.is_empty() {
        return None;
    }
    let lowered = full.to_lowercase();
    if let Some(el) = view
        .smallest_matching(|text| text.to_lowercase().contains(&lowered))
        .into_iter()
        .next()
    {
        return Some(el);
    }

    let compact = query.compact().to_lowercase();
    view.smallest_matching(|text| text.replace(' ', "").to_lowercase().contains(&compact))
        .into_iter()
        .next()
}
