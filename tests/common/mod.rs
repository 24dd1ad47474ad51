#![allow(dead_code)]

use async_trait::async_trait;
use rental_price_watch::browser::{BrowserSession, Key, Launcher, Locator, PageDriver};
use rental_price_watch::form::selectors::{self, EhiSelectors};
use rental_price_watch::FetchError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Goto(String),
    Click(Locator),
    Clear(Locator),
    Type(Locator, String),
    Press(Key),
    Force(Locator, String),
    ScrollBy(i64),
}

/// What a click changes on the fake page.
#[derive(Debug, Clone)]
pub enum Effect {
    SetAttr(Locator, &'static str, String),
    Show(Locator),
    Hide(Locator),
}

#[derive(Default)]
struct FakeState {
    counts: HashMap<Locator, usize>,
    visible: HashSet<Locator>,
    attrs: HashMap<(Locator, String), String>,
    on_click: HashMap<Locator, Vec<Effect>>,
    /// (target, trigger, n): target exists once trigger was clicked n times
    reveals: Vec<(Locator, Locator, usize)>,
    clicks: HashMap<Locator, usize>,
    ignore_force: HashSet<Locator>,
    snapshots: VecDeque<String>,
    last_snapshot: String,
    goto_error: Option<String>,
    log: Vec<Action>,
}

impl FakeState {
    fn count(&self, locator: &Locator) -> usize {
        let base = self.counts.get(locator).copied().unwrap_or(0);
        let revealed = self.reveals.iter().any(|(target, trigger, n)| {
            target == locator && self.clicks.get(trigger).copied().unwrap_or(0) >= *n
        });
        if revealed {
            base.max(1)
        } else {
            base
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::SetAttr(loc, name, value) => {
                self.attrs.insert((loc, name.to_string()), value);
            }
            Effect::Show(loc) => {
                self.visible.insert(loc);
            }
            Effect::Hide(loc) => {
                self.visible.remove(&loc);
            }
        }
    }
}

/// Scripted in-memory page. Elements exist only when declared.
#[derive(Default)]
pub struct FakePage {
    state: Mutex<FakeState>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    /// Present and visible.
    pub fn element(self, locator: Locator) -> Self {
        self.with_state(|s| {
            s.counts.insert(locator.clone(), 1);
            s.visible.insert(locator);
        })
    }

    /// Present but not rendered.
    pub fn hidden_element(self, locator: Locator) -> Self {
        self.with_state(|s| {
            s.counts.insert(locator, 1);
        })
    }

    pub fn visible(self, locator: Locator) -> Self {
        self.with_state(|s| {
            s.visible.insert(locator);
        })
    }

    pub fn attr(self, locator: Locator, name: &'static str, value: &str) -> Self {
        self.with_state(|s| {
            s.attrs.insert((locator, name.to_string()), value.to_string());
        })
    }

    pub fn on_click(self, locator: Locator, effect: Effect) -> Self {
        self.with_state(|s| s.on_click.entry(locator).or_default().push(effect))
    }

    pub fn reveal_after_clicks(self, target: Locator, trigger: Locator, clicks: usize) -> Self {
        self.with_state(|s| s.reveals.push((target, trigger, clicks)))
    }

    /// The control ignores direct value writes, like a widget that re-renders.
    pub fn ignore_force(self, locator: Locator) -> Self {
        self.with_state(|s| {
            s.ignore_force.insert(locator);
        })
    }

    /// Snapshots returned in order; the last one repeats.
    pub fn snapshots(self, markups: &[&str]) -> Self {
        self.with_state(|s| {
            s.snapshots = markups.iter().map(|m| m.to_string()).collect();
        })
    }

    pub fn failing_goto(self, message: &str) -> Self {
        self.with_state(|s| s.goto_error = Some(message.to_string()))
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn clicks(&self, locator: &Locator) -> usize {
        self.state
            .lock()
            .unwrap()
            .clicks
            .get(locator)
            .copied()
            .unwrap_or(0)
    }

    pub fn attr_value(&self, locator: &Locator, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .attrs
            .get(&(locator.clone(), name.to_string()))
            .cloned()
    }

    fn missing(locator: &Locator) -> FetchError {
        FetchError::transient(format!("no element matches {}", locator))
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str) -> Result<(), FetchError> {
        let mut s = self.state.lock().unwrap();
        s.log.push(Action::Goto(url.to_string()));
        match &s.goto_error {
            Some(message) => Err(FetchError::transient(message.clone())),
            None => Ok(()),
        }
    }

    async fn count(&self, locator: &Locator) -> Result<usize, FetchError> {
        Ok(self.state.lock().unwrap().count(locator))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, FetchError> {
        let s = self.state.lock().unwrap();
        let revealed = s
            .reveals
            .iter()
            .any(|(target, _, _)| target == locator && s.count(locator) > 0);
        Ok(s.visible.contains(locator) || revealed)
    }

    async fn click(&self, locator: &Locator) -> Result<(), FetchError> {
        let mut s = self.state.lock().unwrap();
        if s.count(locator) == 0 {
            return Err(Self::missing(locator));
        }
        s.log.push(Action::Click(locator.clone()));
        *s.clicks.entry(locator.clone()).or_default() += 1;
        let effects = s.on_click.get(locator).cloned().unwrap_or_default();
        for effect in effects {
            s.apply(effect);
        }
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), FetchError> {
        if self.state.lock().unwrap().count(locator) == 0 {
            return Err(Self::missing(locator));
        }
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> Result<(), FetchError> {
        let mut s = self.state.lock().unwrap();
        if s.count(locator) == 0 {
            return Err(Self::missing(locator));
        }
        s.log.push(Action::Clear(locator.clone()));
        Ok(())
    }

    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        _key_delay: Duration,
    ) -> Result<(), FetchError> {
        let mut s = self.state.lock().unwrap();
        if s.count(locator) == 0 {
            return Err(Self::missing(locator));
        }
        s.log.push(Action::Type(locator.clone(), text.to_string()));
        Ok(())
    }

    async fn press(&self, key: Key) -> Result<(), FetchError> {
        self.state.lock().unwrap().log.push(Action::Press(key));
        Ok(())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>, FetchError> {
        let s = self.state.lock().unwrap();
        Ok(s.attrs.get(&(locator.clone(), name.to_string())).cloned())
    }

    async fn force_value(&self, locator: &Locator, value: &str) -> Result<(), FetchError> {
        let mut s = self.state.lock().unwrap();
        if s.count(locator) == 0 {
            return Err(Self::missing(locator));
        }
        s.log.push(Action::Force(locator.clone(), value.to_string()));
        if !s.ignore_force.contains(locator) {
            s.attrs
                .insert((locator.clone(), "value".to_string()), value.to_string());
        }
        Ok(())
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<(), FetchError> {
        self.state.lock().unwrap().log.push(Action::ScrollBy(delta_y));
        Ok(())
    }

    async fn network_idle(&self, _timeout: Duration) -> Result<bool, FetchError> {
        Ok(true)
    }

    async fn snapshot(&self) -> Result<String, FetchError> {
        let mut s = self.state.lock().unwrap();
        if let Some(next) = s.snapshots.pop_front() {
            s.last_snapshot = next;
        }
        Ok(s.last_snapshot.clone())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, FetchError> {
        Ok(Vec::new())
    }
}

/// A booking page whose widgets all cooperate: suggestion lists offer the
/// cities, calendars show the dates, the search button exists and results
/// render as `results_markup`.
pub fn cooperative_booking_page(
    pickup_city: &str,
    return_city: &str,
    pickup_date: &str,
    return_date: &str,
    results_markup: &str,
) -> FakePage {
    let mut page = FakePage::new()
        .visible(selectors::city_suggest())
        .visible(selectors::open_picker())
        .element(selectors::search_by_role())
        .visible(selectors::result_cards())
        .snapshots(&[results_markup]);

    for (id, city) in [
        (EhiSelectors::PICKUP_CITY_ID, pickup_city),
        (EhiSelectors::RETURN_CITY_ID, return_city),
    ] {
        let field = selectors::field(id);
        let option = selectors::city_suggest_option(city);
        page = page
            .element(field.clone())
            .element(option.clone())
            .on_click(option, Effect::SetAttr(field, "value", city.to_string()));
    }

    for (id, date) in [
        (EhiSelectors::PICKUP_DATE_ID, pickup_date),
        (EhiSelectors::RETURN_DATE_ID, return_date),
    ] {
        let input = selectors::field(id);
        let cell = selectors::calendar_cell(date);
        page = page
            .element(input.clone())
            .element(cell.clone())
            .on_click(cell, Effect::SetAttr(input, "value", date.to_string()));
    }

    page
}

pub fn card(name: &str, price: &str) -> String {
    format!(
        r#"<div class="cartype-list">
             <div class="cartype-name">{name}</div>
             <div class="cartype-info">1.5T 5座 自动挡</div>
             <div class="cartype-price"><span class="cartype-price-current">¥<em>{price}</em>/日均</span></div>
           </div>"#
    )
}

pub fn results_page(cards: &[String]) -> String {
    format!(
        "<html><body><div class=\"result-wrap\">{}</div></body></html>",
        cards.join("\n")
    )
}

#[derive(Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub dropped: AtomicUsize,
}

impl Counters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

type PageFactory = Box<dyn Fn() -> FakePage + Send + Sync>;

/// Hands out a fresh scripted page per attempt and counts session lifecycles.
pub struct FakeLauncher {
    factory: PageFactory,
    launch_error: Option<String>,
    pub counters: Arc<Counters>,
}

impl FakeLauncher {
    pub fn new(factory: impl Fn() -> FakePage + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            launch_error: None,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            launch_error: Some(message.to_string()),
            ..Self::new(FakePage::new)
        }
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession, FetchError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.launch_error {
            return Err(FetchError::Launch(message.clone()));
        }
        Ok(FakeSession {
            page: (self.factory)(),
            open: true,
            counters: self.counters.clone(),
        })
    }
}

pub struct FakeSession {
    page: FakePage,
    open: bool,
    counters: Arc<Counters>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Page = FakePage;

    fn page(&self) -> &FakePage {
        &self.page
    }

    async fn close(&mut self) {
        if std::mem::take(&mut self.open) {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.counters.dropped.fetch_add(1, Ordering::SeqCst);
    }
}
