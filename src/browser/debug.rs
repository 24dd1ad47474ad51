use crate::browser::driver::PageDriver;
use std::path::PathBuf;

/// Per-stage page captures (full-page PNG + HTML). Disabled unless debug mode is on.
#[derive(Debug, Clone, Default)]
pub struct DebugSink {
    dir: Option<PathBuf>,
}

impl DebugSink {
    pub fn new(enabled: bool, dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: enabled.then(|| dir.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Best effort: capture failures are logged and never surface.
    pub async fn capture<P: PageDriver + ?Sized>(&self, page: &P, stage: &str) {
        let Some(dir) = &self.dir else {
            return;
        };
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            tracing::debug!("debug dir {:?}: {}", dir, e);
            return;
        }
        let safe = stage.replace('/', "_");

        match page.screenshot().await {
            Ok(png) => {
                if let Err(e) = tokio::fs::write(dir.join(format!("{}.png", safe)), png).await {
                    tracing::debug!("debug screenshot {}: {}", safe, e);
                }
            }
            Err(e) => tracing::debug!("debug screenshot {}: {}", safe, e),
        }

        match page.snapshot().await {
            Ok(html) => {
                if let Err(e) = tokio::fs::write(dir.join(format!("{}.html", safe)), html).await {
                    tracing::debug!("debug snapshot {}: {}", safe, e);
                }
            }
            Err(e) => tracing::debug!("debug snapshot {}: {}", safe, e),
        }

        tracing::debug!("📸 captured stage {}", safe);
    }
}
