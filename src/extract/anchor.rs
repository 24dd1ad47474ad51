use crate::extract::keywords::{contains_ignore_case, VehicleQuery};
use crate::extract::text::parse_price_from_text;
use crate::extract::view::{ancestor_block, depth, inner_text, ResultsView};
use crate::extract::{PriceCandidate, StrategyTag};
use crate::extract::cards::CARD;
use scraper::ElementRef;

/// Label on each result's reserve control.
pub const BOOK_LABEL: &str = "预订";

const MAX_BUTTONS: usize = 20;
const MAX_SCAN_NODES: usize = 10;

/// Anchors on the "book" controls: the card around a control must mention
/// every keyword of the target before its text is parsed. Falls back to any
/// element naming both the brand and the model.
pub fn by_action_button(view: &ResultsView, query: &VehicleQuery) -> Option<PriceCandidate> {
    if query.full().is_empty() {
        return None;
    }

    let buttons = view.smallest_matching(|text| text.contains(BOOK_LABEL));
    for button in buttons.into_iter().take(MAX_BUTTONS) {
        // Nearest block first, one level further if that block is only the button row
        let Some(first) = ancestor_block(button) else {
            continue;
        };
        let blocks = std::iter::once(first).chain(ancestor_block(first));
        for block in blocks {
            let text = inner_text(block);
            if !query.contains_all_keywords(&text) {
                continue;
            }
            if let Some(price) = parse_price_from_text(&text) {
                return Some(PriceCandidate::new(price, StrategyTag::ActionAnchor));
            }
            break;
        }
    }

    brand_model_scan(view, query)
}

fn brand_model_scan(view: &ResultsView, query: &VehicleQuery) -> Option<PriceCandidate> {
    let (Some(brand), Some(model)) = (query.brand(), query.model()) else {
        return None;
    };

    // Markers that occur once per listing; a node holding two of any kind
    // spans several vehicles and its first price may belong to another one
    let markers = [
        view.smallest_matching(|text| contains_ignore_case(text, brand)),
        view.smallest_matching(|text| text.contains(BOOK_LABEL)),
        view.select(&CARD).collect(),
    ];

    let mut nodes: Vec<_> = view
        .elements()
        .filter(|el| {
            let text = inner_text(*el);
            contains_ignore_case(&text, brand) && contains_ignore_case(&text, model)
        })
        .filter(|el| markers.iter().all(|set| markers_within(*el, set) <= 1))
        .collect();
    // Innermost first so the page root does not win with some unrelated number
    nodes.sort_by_key(|el| std::cmp::Reverse(depth(*el)));

    nodes
        .into_iter()
        .take(MAX_SCAN_NODES)
        .find_map(|el| parse_price_from_text(&inner_text(el)))
        .map(|price| PriceCandidate::new(price, StrategyTag::BrandModelScan))
}

/// How many marked nodes are `el` itself or below it.
fn markers_within(el: ElementRef<'_>, marked: &[ElementRef<'_>]) -> usize {
    el.descendants()
        .filter(|n| marked.iter().any(|m| m.id() == n.id()))
        .count()
}
