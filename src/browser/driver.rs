use crate::error::FetchError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// How an element on the page is addressed. Operations act on the first match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn id(id: &str) -> Self {
        Locator::Css(format!("#{}", id))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    ArrowDown,
}

impl Key {
    pub fn name(self) -> &'static str {
        match self {
            Key::Enter => "Enter",
            Key::Escape => "Escape",
            Key::ArrowDown => "ArrowDown",
        }
    }

    pub fn virtual_key_code(self) -> i64 {
        match self {
            Key::Enter => 13,
            Key::Escape => 27,
            Key::ArrowDown => 40,
        }
    }

    /// Text the key produces, if any. Enter must carry "\r" or no keypress fires.
    pub fn text(self) -> Option<&'static str> {
        match self {
            Key::Enter => Some("\r"),
            _ => None,
        }
    }
}

/// The page operations the form resolvers and the extraction cascade need.
///
/// Implemented over CDP for real runs and by an in-memory fake in tests.
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), FetchError>;

    /// Number of elements currently matching the locator.
    async fn count(&self, locator: &Locator) -> Result<usize, FetchError>;

    /// Whether the first match exists and is rendered.
    async fn is_visible(&self, locator: &Locator) -> Result<bool, FetchError>;

    async fn click(&self, locator: &Locator) -> Result<(), FetchError>;

    async fn scroll_into_view(&self, locator: &Locator) -> Result<(), FetchError>;

    /// Empties an input the way a user selecting all and deleting would.
    async fn clear(&self, locator: &Locator) -> Result<(), FetchError>;

    /// Types `text` one character at a time with `key_delay` between keystrokes.
    async fn type_text(
        &self,
        locator: &Locator,
        text: &str,
        key_delay: Duration,
    ) -> Result<(), FetchError>;

    /// Presses a key against whatever currently has focus.
    async fn press(&self, key: Key) -> Result<(), FetchError>;

    async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>, FetchError>;

    /// Degraded write: sets the underlying value directly and synthesizes
    /// input/change events. Bypasses the widget's own interaction path.
    async fn force_value(&self, locator: &Locator, value: &str) -> Result<(), FetchError>;

    async fn scroll_by(&self, delta_y: i64) -> Result<(), FetchError>;

    /// Waits for network activity to settle. `Ok(false)` on timeout.
    async fn network_idle(&self, timeout: Duration) -> Result<bool, FetchError>;

    /// Full document markup with layout hints stamped on block elements
    /// (see [`crate::extract::view::RENDER_HEIGHT_ATTR`]).
    async fn snapshot(&self) -> Result<String, FetchError>;

    /// Full-page PNG.
    async fn screenshot(&self) -> Result<Vec<u8>, FetchError>;
}
