mod common;

use chrono::NaiveDate;
use common::{card, cooperative_booking_page, results_page, FakeLauncher, FakePage};
use rental_price_watch::form::FormOptions;
use rental_price_watch::{FetchError, FetchTarget, PriceFetcher};
use std::time::Duration;

fn target(car_name: &str, pickup_city: &str) -> FetchTarget {
    FetchTarget {
        car_name: car_name.to_string(),
        pickup_city: pickup_city.to_string(),
        return_city: "德令哈".to_string(),
        pickup_date: NaiveDate::from_ymd_opt(2025, 10, 4).unwrap(),
        return_date: NaiveDate::from_ymd_opt(2025, 10, 8).unwrap(),
        headful: false,
        debug: false,
    }
}

fn booking_page(results: &str) -> FakePage {
    cooperative_booking_page("敦煌", "德令哈", "2025-10-04", "2025-10-08", results)
}

#[tokio::test(start_paused = true)]
async fn fills_the_form_and_reads_the_card_price() {
    let launcher = FakeLauncher::new(|| booking_page(&results_page(&[card("Model X", "698")])));
    let counters = launcher.counters.clone();
    let fetcher = PriceFetcher::new(launcher, target("Model X", "敦煌"));

    let price = fetcher.get_current_price().await.unwrap();

    assert_eq!(price, Some(698.0));
    assert_eq!(counters.opened(), 1);
    assert_eq!(counters.closed(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_vehicle_is_not_retried() {
    let launcher = FakeLauncher::new(|| booking_page(&results_page(&[card("丰田卡罗拉", "318")])));
    let counters = launcher.counters.clone();
    let fetcher = PriceFetcher::new(launcher, target("大众新探影", "敦煌"));

    let price = fetcher.get_current_price().await.unwrap();

    assert_eq!(price, None);
    assert_eq!(counters.opened(), 1);
    assert_eq!(counters.closed(), 1);
}

#[tokio::test(start_paused = true)]
async fn navigation_failures_use_all_attempts_and_close_every_session() {
    let launcher = FakeLauncher::new(|| FakePage::new().failing_goto("net::ERR_CONNECTION_RESET"));
    let counters = launcher.counters.clone();
    let fetcher = PriceFetcher::new(launcher, target("Model X", "敦煌"));
    let started = tokio::time::Instant::now();

    let err = fetcher.get_current_price().await.unwrap_err();

    assert!(matches!(err, FetchError::Transient(ref m) if m.contains("ERR_CONNECTION_RESET")));
    assert_eq!(counters.opened(), 3);
    assert_eq!(counters.closed(), 3);
    assert!(started.elapsed() >= Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn launch_failures_surface_after_retries() {
    let launcher = FakeLauncher::failing("chrome not found");
    let counters = launcher.counters.clone();
    let fetcher = PriceFetcher::new(launcher, target("Model X", "敦煌"));

    let err = fetcher.get_current_price().await.unwrap_err();

    assert!(matches!(err, FetchError::Launch(_)));
    assert_eq!(counters.opened(), 3);
    assert_eq!(counters.closed(), 0);
}

#[tokio::test(start_paused = true)]
async fn degraded_selection_is_accepted_by_default() {
    // The page only offers 敦煌; 玉门 ends in a forced write
    let launcher = FakeLauncher::new(|| booking_page(&results_page(&[card("Model X", "698")])));
    let fetcher = PriceFetcher::new(launcher, target("Model X", "玉门"));

    assert_eq!(fetcher.get_current_price().await.unwrap(), Some(698.0));
}

#[tokio::test(start_paused = true)]
async fn strict_mode_refuses_degraded_selection() {
    let launcher = FakeLauncher::new(|| booking_page(&results_page(&[card("Model X", "698")])));
    let counters = launcher.counters.clone();
    let fetcher = PriceFetcher::new(launcher, target("Model X", "玉门")).with_form_options(
        FormOptions {
            require_confirmed_selection: true,
        },
    );

    let err = fetcher.get_current_price().await.unwrap_err();

    match err {
        FetchError::SelectionUnconfirmed { field, .. } => assert_eq!(field, "pickupcity"),
        other => panic!("expected SelectionUnconfirmed, got {other:?}"),
    }
    assert_eq!(counters.opened(), 3);
    assert_eq!(counters.closed(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancelled_fetch_still_releases_the_session() {
    // A widget that never responds keeps the attempt busy for seconds
    let launcher = FakeLauncher::new(|| booking_page("<html></html>"));
    let counters = launcher.counters.clone();
    let fetcher = PriceFetcher::new(launcher, target("Model X", "玉门"));

    let outcome = tokio::time::timeout(Duration::from_secs(1), fetcher.get_current_price()).await;

    assert!(outcome.is_err(), "fetch should still be running");
    assert_eq!(counters.opened(), 1);
    assert_eq!(counters.closed(), 0);
    assert_eq!(counters.dropped(), 1);
}
