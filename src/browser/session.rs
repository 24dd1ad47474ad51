use crate::browser::cdp::CdpPage;
use crate::browser::driver::PageDriver;
use crate::config::{EHI_LOCALE, EHI_TZ};
use crate::error::FetchError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetTimezoneOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

/// Fixed launch profile for one fetch attempt.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub chrome_path: String,
    pub headful: bool,
    pub locale: String,
    pub timezone: String,
    pub user_agent: String,
    /// Delay after every interaction. Headed runs get more so widgets stay stable.
    pub pacing: Duration,
}

impl SessionConfig {
    pub fn new(chrome_path: impl Into<String>, headful: bool) -> Self {
        Self {
            chrome_path: chrome_path.into(),
            headful,
            locale: EHI_LOCALE.to_string(),
            timezone: EHI_TZ.to_string(),
            user_agent: DESKTOP_USER_AGENT.to_string(),
            pacing: Duration::from_millis(if headful { 100 } else { 50 }),
        }
    }
}

/// Starts browser sessions. One fresh session per fetch attempt.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Session: BrowserSession;

    async fn open(&self) -> Result<Self::Session, FetchError>;
}

/// An exclusively owned automation context.
#[async_trait]
pub trait BrowserSession: Send {
    type Page: PageDriver;

    fn page(&self) -> &Self::Page;

    /// Releases the browser. Safe to call more than once.
    async fn close(&mut self);
}

pub struct CdpLauncher {
    config: SessionConfig,
}

impl CdpLauncher {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Launcher for CdpLauncher {
    type Session = CdpSession;

    async fn open(&self) -> Result<CdpSession, FetchError> {
        CdpSession::open(&self.config).await
    }
}

pub struct CdpSession {
    browser: Option<Browser>,
    page: CdpPage,
    handler: JoinHandle<()>,
}

impl CdpSession {
    pub async fn open(config: &SessionConfig) -> Result<Self, FetchError> {
        tracing::info!("🚀 launching browser (headful={})", config.headful);
        tracing::debug!("🔍 chrome path: {}", config.chrome_path);

        let lang_arg = format!("--lang={}", config.locale);
        let ua_arg = format!("--user-agent={}", config.user_agent);
        let args = vec![
            "--disable-blink-features=AutomationControlled",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-infobars",
            lang_arg.as_str(),
            ua_arg.as_str(),
        ];

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&config.chrome_path)
            .window_size(1440, 900)
            .args(args);
        if config.headful {
            builder = builder.with_head();
        }
        let browser_config = builder
            .build()
            .map_err(|e| FetchError::Launch(format!("browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        // The handler must be polled for the connection to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP event error: {:?}", e);
                }
            }
            tracing::debug!("CDP handler finished");
        });

        match prepare_page(&browser, config).await {
            Ok(page) => {
                tracing::info!("✅ browser ready");
                Ok(CdpSession {
                    browser: Some(browser),
                    page,
                    handler,
                })
            }
            Err(e) => {
                let mut browser = browser;
                shut_down(&mut browser, EXIT_GRACE).await;
                handler.abort();
                Err(FetchError::Launch(e.to_string()))
            }
        }
    }
}

async fn prepare_page(browser: &Browser, config: &SessionConfig) -> Result<CdpPage, FetchError> {
    let page = browser.new_page("about:blank").await?;

    let ua = SetUserAgentOverrideParams::builder()
        .user_agent(config.user_agent.clone())
        .accept_language(config.locale.clone())
        .build()
        .map_err(FetchError::Launch)?;
    page.execute(ua).await?;
    page.execute(SetTimezoneOverrideParams::new(config.timezone.clone()))
        .await?;
    page.execute(SetLocaleOverrideParams {
        locale: Some(config.locale.clone()),
    })
    .await?;
    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
        STEALTH_SCRIPT.to_string(),
    ))
    .await?;

    CdpPage::attach(page, config.pacing).await
}

const STEALTH_SCRIPT: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['zh-CN', 'zh', 'en'] });
"#;

#[async_trait]
impl BrowserSession for CdpSession {
    type Page = CdpPage;

    fn page(&self) -> &CdpPage {
        &self.page
    }

    async fn close(&mut self) {
        let Some(mut browser) = self.browser.take() else {
            return;
        };
        shut_down(&mut browser, EXIT_GRACE).await;
        self.handler.abort();
        tracing::debug!("🧹 browser session closed");
    }
}

/// How long a closed browser gets to exit before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// The process side of a browser: ask it to close, wait for exit, or kill it.
#[async_trait]
trait BrowserProcess: Send {
    async fn request_close(&mut self) -> Result<(), String>;
    async fn wait_exit(&mut self) -> Result<(), String>;
    async fn kill(&mut self) -> Result<(), String>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), String> {
        self.close().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait_exit(&mut self) -> Result<(), String> {
        self.wait().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) -> Result<(), String> {
        match Browser::kill(self).await {
            Some(result) => result.map_err(|e| e.to_string()),
            None => Ok(()),
        }
    }
}

/// Closes the browser and waits for the process, killing it when the close
/// request fails or the exit takes longer than `grace`. Never blocks past that.
async fn shut_down<B: BrowserProcess + ?Sized>(process: &mut B, grace: Duration) {
    if let Err(e) = process.request_close().await {
        tracing::debug!("browser close: {}, killing process", e);
        if let Err(e) = process.kill().await {
            tracing::debug!("browser kill: {}", e);
        }
    }
    match tokio::time::timeout(grace, process.wait_exit()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("browser wait: {}", e),
        Err(_) => {
            tracing::warn!("⚠️ browser did not exit within {:?}, killing process", grace);
            if let Err(e) = process.kill().await {
                tracing::debug!("browser kill: {}", e);
            }
        }
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        // Reached without close() only when the attempt future was cancelled
        // or panicked; dropping the Browser kills the child process.
        if self.browser.is_some() {
            tracing::warn!("⚠️ browser session dropped without close, killing process");
        }
        self.handler.abort();
    }
}
