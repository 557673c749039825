//! Chrome DevTools implementation of [`BrowserSession`]

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, HandleJavaScriptDialogParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::BrowserOptions;
use crate::driver::{BrowserSession, Locator, Query};
use crate::error::{DriverError, DriverResult, E2eError, E2eResult};

const IS_DISPLAYED_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return style.visibility !== 'hidden' && style.display !== 'none'
        && rect.width > 0 && rect.height > 0;
}"#;

const IS_ENABLED_JS: &str = "function() { return !this.disabled; }";

const CLEAR_JS: &str = r#"function() {
    this.value = '';
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
}"#;

/// One Chrome process with a single page, driven over DevTools
pub struct ChromeSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: Mutex<Option<JoinHandle<()>>>,
    user_data_dir: PathBuf,
}

impl ChromeSession {
    /// Launch Chrome and open a blank page.
    ///
    /// Downloads are routed to `downloads_dir`, which is created if missing.
    pub async fn launch(options: &BrowserOptions, downloads_dir: &Path) -> E2eResult<Self> {
        let user_data_dir = std::env::temp_dir().join(format!(
            "breakingbad-e2e-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));

        let mut builder = BrowserConfig::builder()
            .window_size(options.window_width, options.window_height)
            .request_timeout(Duration::from_secs(options.request_timeout_secs))
            .user_data_dir(&user_data_dir)
            .arg("--start-maximized");

        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(E2eError::BrowserLaunch)?;

        info!(
            "Launching Chrome (headless: {}, window: {}x{})",
            options.headless, options.window_width, options.window_height
        );

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| E2eError::BrowserLaunch(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        std::fs::create_dir_all(downloads_dir)?;
        let download_path = std::fs::canonicalize(downloads_dir)?;
        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_path.to_string_lossy().to_string())
            .build()
            .map_err(E2eError::BrowserLaunch)?;
        browser
            .execute(behavior)
            .await
            .map_err(|e| E2eError::BrowserLaunch(format!("download behavior: {}", e)))?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| E2eError::BrowserLaunch(e.to_string()))?;

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler: Mutex::new(Some(handle)),
            user_data_dir,
        })
    }

    async fn xpath_count(&self, xpath: &str) -> DriverResult<usize> {
        let literal = serde_json::to_string(xpath).map_err(|e| DriverError::Script(e.to_string()))?;
        let expr = format!(
            "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
            literal
        );
        let count: u64 = self
            .page
            .evaluate(expr)
            .await?
            .into_value()
            .map_err(|e| DriverError::Script(e.to_string()))?;
        Ok(count as usize)
    }

    async fn element_flag(&self, element: &Element, function: &str) -> DriverResult<bool> {
        let returns = element.call_js_fn(function, false).await?;
        returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .ok_or_else(|| DriverError::Script(format!("expected boolean from {}", function)))
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        debug!("Navigating to: {}", url);
        self.page.goto(url).await?;
        Ok(())
    }

    async fn locate_all(&self, locator: &Locator) -> DriverResult<Vec<Element>> {
        match locator.query() {
            Query::Css(selector) => Ok(self.page.find_elements(selector).await?),
            Query::XPath(xpath) => {
                // find_xpaths errors on an empty result set
                if self.xpath_count(&xpath).await? == 0 {
                    return Ok(Vec::new());
                }
                Ok(self.page.find_xpaths(xpath).await?)
            }
        }
    }

    async fn send_keys(&self, element: &Element, text: &str) -> DriverResult<()> {
        element.focus().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn clear(&self, element: &Element) -> DriverResult<()> {
        element.call_js_fn(CLEAR_JS, false).await?;
        Ok(())
    }

    async fn click(&self, element: &Element) -> DriverResult<()> {
        element.click().await?;
        Ok(())
    }

    async fn is_displayed(&self, element: &Element) -> DriverResult<bool> {
        self.element_flag(element, IS_DISPLAYED_JS).await
    }

    async fn is_enabled(&self, element: &Element) -> DriverResult<bool> {
        self.element_flag(element, IS_ENABLED_JS).await
    }

    async fn accept_dialog(&self) -> DriverResult<()> {
        match self.page.execute(HandleJavaScriptDialogParams::new(true)).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("No dialog") => Err(DriverError::NoDialog),
            Err(e) => Err(e.into()),
        }
    }

    async fn screenshot(&self, path: &Path) -> DriverResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn quit(&self) -> DriverResult<()> {
        info!("Closing browser");
        let mut browser = self.browser.lock().await;
        let closed = browser.close().await;
        let _ = browser.wait().await;

        if let Some(handle) = self.handler.lock().await.take() {
            handle.abort();
        }
        let _ = std::fs::remove_dir_all(&self.user_data_dir);

        closed.map(|_| ()).map_err(DriverError::from)
    }
}
