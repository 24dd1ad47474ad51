//! Price extraction cascade.
//!
//! Each strategy reads a [`ResultsView`] snapshot and either produces a
//! [`PriceCandidate`] or nothing. Strategies run in a fixed order and the
//! first hit wins; there is no cross-checking between them.

pub mod anchor;
pub mod cards;
pub mod keywords;
pub mod proximity;
pub mod text;
pub mod view;

use crate::browser::driver::PageDriver;
use crate::browser::wait::pause;
use crate::error::FetchError;
use serde::Serialize;
use std::fmt;

pub use keywords::VehicleQuery;
pub use text::{parse_price_from_text, PLAUSIBILITY_FLOOR};
pub use view::ResultsView;

/// Scroll distance used to wake lazy-loaded result lists.
const LAZY_LOAD_SCROLL_PX: i64 = 1200;
const LAZY_LOAD_SETTLE_MS: u64 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    StructuredCard,
    Proximity,
    ActionAnchor,
    BrandModelScan,
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyTag::StructuredCard => "structured-card",
            StrategyTag::Proximity => "proximity",
            StrategyTag::ActionAnchor => "action-anchor",
            StrategyTag::BrandModelScan => "brand-model-scan",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceCandidate {
    pub value: f64,
    pub strategy: StrategyTag,
}

impl PriceCandidate {
    pub fn new(value: f64, strategy: StrategyTag) -> Self {
        Self { value, strategy }
    }
}

pub type Strategy = fn(&ResultsView, &VehicleQuery) -> Option<PriceCandidate>;

/// Strategies tried before and after the lazy-load scroll.
pub const PRIMARY: &[Strategy] = &[cards::from_cards, proximity::near_name];
/// Strategies tried last, on the post-scroll snapshot.
pub const FALLBACK: &[Strategy] = &[anchor::by_action_button];

/// Runs strategies in order; the first one producing a candidate wins.
pub fn first_success(
    view: &ResultsView,
    query: &VehicleQuery,
    strategies: &[Strategy],
) -> Option<PriceCandidate> {
    strategies.iter().find_map(|strategy| strategy(view, query))
}

/// The full cascade over one static snapshot (no scrolling).
pub fn extract_from_markup(markup: &str, query: &VehicleQuery) -> Option<PriceCandidate> {
    let view = ResultsView::parse(markup);
    first_success(&view, query, PRIMARY).or_else(|| first_success(&view, query, FALLBACK))
}

/// Runs the cascade against the live page: structured cards and proximity,
/// then a scroll to trigger lazy loading and the same two again, then the
/// action-button anchor on the latest snapshot.
pub async fn extract_price<P: PageDriver + ?Sized>(
    page: &P,
    query: &VehicleQuery,
) -> Result<Option<PriceCandidate>, FetchError> {
    tracing::info!("💰 extracting price for '{}'", query.full());

    let markup = page.snapshot().await?;
    if let Some(hit) = first_success(&ResultsView::parse(&markup), query, PRIMARY) {
        tracing::info!("✅ price {} via {}", hit.value, hit.strategy);
        return Ok(Some(hit));
    }

    tracing::debug!("nothing on first pass, scrolling for lazy content");
    page.scroll_by(LAZY_LOAD_SCROLL_PX).await?;
    pause(LAZY_LOAD_SETTLE_MS).await;

    let markup = page.snapshot().await?;
    let view = ResultsView::parse(&markup);
    if let Some(hit) = first_success(&view, query, PRIMARY) {
        tracing::info!("✅ price {} via {} after scroll", hit.value, hit.strategy);
        return Ok(Some(hit));
    }

    let hit = first_success(&view, query, FALLBACK);
    match &hit {
        Some(hit) => tracing::info!("✅ price {} via {}", hit.value, hit.strategy),
        None => tracing::debug!("no strategy produced a plausible price"),
    }
    Ok(hit)
}
