//! Headless Chromium sessions over the DevTools protocol

use super::{BrowserLauncher, BrowserSession};
use crate::error::FetchError;
use crate::Result;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchMouseEventParams, DispatchMouseEventType,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Protocol request limit. Navigation is bounded separately when asked to be.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
const VIEWPORT: (u32, u32) = (1280, 800);

/// Resolved href of every anchor on the page
const ANCHOR_HREFS_JS: &str =
    "Array.from(document.querySelectorAll('a'), a => a.href).filter(h => typeof h === 'string')";

/// Launches a local headless Chromium
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    /// Browser binary; detected on the system when unset
    pub executable: Option<PathBuf>,
    /// Run with Chromium's sandbox enabled
    pub sandbox: bool,
}

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self {
            executable: None,
            sandbox: true,
        }
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Disable the sandbox, needed when running as root in containers
    pub fn without_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    fn config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(REQUEST_TIMEOUT)
            .window_size(VIEWPORT.0, VIEWPORT.1);

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        if !self.sandbox {
            builder = builder.no_sandbox();
        }

        builder.build().map_err(FetchError::BrowserSetup)
    }
}

impl Default for ChromiumLauncher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let config = self.config()?;
        let (browser, mut handler) = Browser::launch(config).await?;
        info!("Launched headless browser");

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler: {}", e);
                }
            }
        });

        let mut session = ChromiumSession {
            browser,
            page: None,
            handler: Some(handler),
        };

        match session.browser.new_page("about:blank").await {
            Ok(page) => {
                session.page = Some(page);
                Ok(Box::new(session))
            }
            Err(e) => {
                let _ = session.close().await;
                Err(e.into())
            }
        }
    }
}

/// A launched browser and its single page
pub struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| FetchError::BrowserSetup("page is not open".to_string()))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.page()?.goto(url).await?;
        Ok(())
    }

    async fn scroll_by(&mut self, pixels: i64) -> Result<()> {
        let wheel = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseWheel)
            .x(f64::from(VIEWPORT.0) / 2.0)
            .y(f64::from(VIEWPORT.1) / 2.0)
            .delta_x(0.0)
            .delta_y(pixels as f64)
            .build()
            .map_err(FetchError::BrowserSetup)?;

        self.page()?.execute(wheel).await?;
        Ok(())
    }

    async fn anchor_hrefs(&mut self) -> Result<Vec<String>> {
        let hrefs = self
            .page()?
            .evaluate(ANCHOR_HREFS_JS)
            .await?
            .into_value::<Vec<String>>()?;
        Ok(hrefs)
    }

    async fn close(&mut self) -> Result<()> {
        self.page = None;
        let handler = self.handler.take();
        let closed = self.browser.close().await.map(|_| ()).map_err(FetchError::from);

        let browser = &mut self.browser;
        finish_shutdown(closed, async move { browser.wait().await.map(|_| ()) }, handler).await?;
        debug!("Browser closed");
        Ok(())
    }
}

/// After a clean close, reap the browser process and let the handler drain.
/// After a failed close, stop the handler and report the close error.
async fn finish_shutdown<W>(
    closed: Result<()>,
    reap: W,
    handler: Option<JoinHandle<()>>,
) -> Result<()>
where
    W: Future<Output = std::io::Result<()>>,
{
    match closed {
        Ok(()) => {
            let reaped = reap.await;
            if let Some(handler) = handler {
                let _ = handler.await;
            }
            reaped?;
            Ok(())
        }
        Err(e) => {
            if let Some(handler) = handler {
                handler.abort();
            }
            Err(e)
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
