use crate::browser::driver::{Key, Locator, PageDriver};
use crate::browser::network::NetworkTracker;
use crate::error::FetchError;
use crate::extract::view::RENDER_HEIGHT_ATTR;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

const TARGET_ATTR: &str = "data-rpw-target";
/// No request may start or finish for this long before the page counts as idle.
const NETWORK_QUIET: Duration = Duration::from_millis(500);

/// CDP-backed page. Every interaction is followed by `pacing` so dynamic
/// widgets get time to react (the equivalent of a slow-motion launch option).
pub struct CdpPage {
    page: Page,
    pacing: Duration,
    network: Arc<NetworkTracker>,
    listener: JoinHandle<()>,
}

impl CdpPage {
    /// Wraps a page and starts tracking its requests from CDP network events.
    pub async fn attach(page: Page, pacing: Duration) -> Result<Self, FetchError> {
        let mut sent = page.event_listener::<EventRequestWillBeSent>().await?;
        let mut finished = page.event_listener::<EventLoadingFinished>().await?;
        let mut failed = page.event_listener::<EventLoadingFailed>().await?;

        let network = Arc::new(NetworkTracker::new(Instant::now()));
        let tracker = network.clone();
        let listener = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(ev) = sent.next() => tracker.started(ev.request_id.inner(), Instant::now()),
                    Some(ev) = finished.next() => tracker.finished(ev.request_id.inner(), Instant::now()),
                    Some(ev) = failed.next() => tracker.finished(ev.request_id.inner(), Instant::now()),
                    else => break,
                }
            }
            tracing::debug!("network listener finished");
        });

        Ok(Self {
            page,
            pacing,
            network,
            listener,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, FetchError> {
        let result = self.page.evaluate(script).await?;
        Ok(result.into_value::<T>()?)
    }

    /// Resolves the first match of a locator to a native element handle so
    /// clicks and focus go through real input events.
    async fn element(&self, locator: &Locator) -> Result<Element, FetchError> {
        let script = format!(
            r#"(() => {{
                document.querySelectorAll('[{attr}]').forEach(e => e.removeAttribute('{attr}'));
                const el = {first};
                if (!el) return false;
                el.setAttribute('{attr}', '1');
                return true;
            }})()"#,
            attr = TARGET_ATTR,
            first = first_match_js(locator),
        );
        let found: bool = self.eval(script).await?;
        if !found {
            return Err(FetchError::transient(format!("no element matches {}", locator)));
        }
        Ok(self
            .page
            .find_element(format!("[{}='1']", TARGET_ATTR))
            .await?)
    }

    async fn paced(&self) {
        sleep(self.pacing).await;
    }
}

/// JS expression evaluating to the first element matching `locator`, or null.
fn first_match_js(locator: &Locator) -> String {
    match locator {
        Locator::Css(sel) => format!("document.querySelector({})", js_str(sel)),
        Locator::XPath(expr) => format!(
            "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_str(expr)
        ),
    }
}

fn count_js(locator: &Locator) -> String {
    match locator {
        Locator::Css(sel) => format!("document.querySelectorAll({}).length", js_str(sel)),
        Locator::XPath(expr) => format!(
            "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
            js_str(expr)
        ),
    }
}

fn js_str(s: &str) -> String {
    // JSON string literals are valid JS string literals
    serde_json::Value::String(s.to_string()).to_string()
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str) -> Result<(), FetchError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize, FetchError> {
        self.eval(count_js(locator)).await
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, FetchError> {
        let script = format!(
            r#"(() => {{
                const el = {first};
                if (!el) return false;
                const style = getComputedStyle(el);
                if (style.display === 'none' || style.visibility === 'hidden') return false;
                const rect = el.getBoundingClientRect();
                return rect.width > 0 && rect.height > 0;
            }})()"#,
            first = first_match_js(locator),
        );
        self.eval(script).await
    }

    async fn click(&self, locator: &Locator) -> Result<(), FetchError> {
        let el = self.element(locator).await?;
        el.click().await?;
        self.paced().await;
        Ok(())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), FetchError> {
        let el = self.element(locator).await?;
        el.scroll_into_view().await?;
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> Result<(), FetchError> {
        let script = format!(
            r#"(() => {{
                const el = {first};
                if (!el) return false;
                el.focus();
                el.value = '';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return true;
            }})()"#,
            first = first_match_js(locator),
        );
        let cleared: bool = self.eval(script).await?;
        if !cleared {
            return Err(FetchError::transient(format!("no element matches {}", locator)));
        }
        self.paced().await;
        Ok(())
    }

    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        key_delay: Duration,
    ) -> Result<(), FetchError> {
        let el = self.element(locator).await?;
        el.focus().await?;
        // insertText commits each character like an IME would, which also
        // covers characters with no physical key definition
        for ch in text.chars() {
            self.page
                .execute(InsertTextParams::new(ch.to_string()))
                .await?;
            sleep(key_delay).await;
        }
        self.paced().await;
        Ok(())
    }

    async fn press(&self, key: Key) -> Result<(), FetchError> {
        let mut down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(key.name())
            .code(key.name())
            .windows_virtual_key_code(key.virtual_key_code())
            .native_virtual_key_code(key.virtual_key_code());
        if let Some(text) = key.text() {
            down = down.text(text);
        }
        let down = down.build().map_err(FetchError::Transient)?;
        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(key.name())
            .code(key.name())
            .windows_virtual_key_code(key.virtual_key_code())
            .native_virtual_key_code(key.virtual_key_code())
            .build()
            .map_err(FetchError::Transient)?;

        self.page.execute(down).await?;
        self.page.execute(up).await?;
        self.paced().await;
        Ok(())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>, FetchError> {
        // Wrapped: a bare null result carries no value over CDP.
        // `value` reads the live property, which widgets update without the attribute.
        let script = format!(
            r#"(() => {{
                const el = {first};
                if (!el) return {{ value: null }};
                const name = {name};
                if (name === 'value' && 'value' in el) return {{ value: String(el.value) }};
                return {{ value: el.getAttribute(name) }};
            }})()"#,
            first = first_match_js(locator),
            name = js_str(name),
        );
        let wrapped: serde_json::Value = self.eval(script).await?;
        Ok(wrapped
            .get("value")
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    async fn force_value(&self, locator: &Locator, value: &str) -> Result<(), FetchError> {
        let script = format!(
            r#"(() => {{
                const el = {first};
                if (!el) return false;
                const val = {value};
                el.removeAttribute('readonly');
                el.value = val;
                el.setAttribute('value', val);
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                el.blur();
                return true;
            }})()"#,
            first = first_match_js(locator),
            value = js_str(value),
        );
        let written: bool = self.eval(script).await?;
        if !written {
            return Err(FetchError::transient(format!("no element matches {}", locator)));
        }
        Ok(())
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<(), FetchError> {
        let script = format!(
            r#"(() => {{
                window.dispatchEvent(new WheelEvent('wheel', {{ deltaY: {dy}, bubbles: true }}));
                window.scrollBy(0, {dy});
                return true;
            }})()"#,
            dy = delta_y,
        );
        let _: bool = self.eval(script).await?;
        Ok(())
    }

    async fn network_idle(&self, timeout: Duration) -> Result<bool, FetchError> {
        tracing::debug!("⏳ waiting for network idle...");
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            sleep(Duration::from_millis(100)).await;
            if !self.network.is_idle(Instant::now(), NETWORK_QUIET) {
                continue;
            }
            let ready: String = self.eval("document.readyState".to_string()).await?;
            if ready == "complete" {
                return Ok(true);
            }
        }
        tracing::warn!(
            "⚠️ network idle timeout after {:?} ({} requests in flight)",
            timeout,
            self.network.inflight()
        );
        Ok(false)
    }

    async fn snapshot(&self) -> Result<String, FetchError> {
        let script = format!(
            r#"(() => {{
                document.querySelectorAll('div').forEach(el => {{
                    el.setAttribute('{attr}', String(Math.round(el.getBoundingClientRect().height)));
                }});
                return document.documentElement.outerHTML;
            }})()"#,
            attr = RENDER_HEIGHT_ATTR,
        );
        self.eval(script).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>, FetchError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        Ok(self.page.screenshot(params).await?)
    }
}

impl Drop for CdpPage {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
