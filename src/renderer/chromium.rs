//! Chromium-backed renderer.
//!
//! Finds or downloads a Chrome/Chromium executable, launches it with a
//! hardened argument set, and drives pages over CDP via `chromiumoxide`.
//! One [`ChromiumRenderer`] owns the browser process and its CDP handler
//! task; each engine gets its own page session from [`Renderer::open_page`].

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

use super::{PageElement, PageSurface, Renderer};
use crate::error::ScrapeError;
use crate::utils::CHROME_USER_AGENT;

/// Budget for the best-effort settle wait after scrolls and clicks.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Find a Chrome/Chromium executable on the system.
///
/// The `CHROMIUM_PATH` environment variable overrides all other methods;
/// after that, well-known install locations are probed, then `which` on
/// Unix systems.
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!(
            "CHROMIUM_PATH points to non-existent file: {}",
            path.display()
        );
    }

    let paths = if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    for path_str in paths {
        let path = if let Some(rest) = path_str.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else {
            PathBuf::from(path_str)
        };
        if path.exists() {
            info!("found browser at: {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for cmd in &["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path_str.is_empty() {
                    let path = PathBuf::from(path_str);
                    info!("found browser via 'which': {}", path.display());
                    return Ok(path);
                }
            }
        }
    }

    warn!("no Chrome/Chromium executable found; falling back to managed download");
    Err(anyhow!("Chrome/Chromium executable not found"))
}

/// Download a managed Chromium build into the local cache directory and
/// return its executable path.
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("threadscrape")
        .join("chromium");
    std::fs::create_dir_all(&cache_dir).context("failed to create browser cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("failed to build fetcher options")?,
    );
    let revision_info = fetcher.fetch().await.context("failed to fetch browser")?;

    info!(
        "downloaded Chromium to: {}",
        revision_info.folder_path.display()
    );
    Ok(revision_info.executable_path)
}

/// Browser process plus the task driving its CDP connection.
pub struct ChromiumRenderer {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// Find or download a browser executable and launch it.
    ///
    /// `user_data_dir` isolates the profile per session; a process-scoped
    /// temp directory is used when unset.
    pub async fn launch(
        headless: bool,
        user_data_dir: Option<PathBuf>,
    ) -> Result<Self, ScrapeError> {
        let chrome_path = match find_browser_executable().await {
            Ok(path) => path,
            Err(_) => download_managed_browser()
                .await
                .map_err(|e| ScrapeError::Browser(format!("{e:#}")))?,
        };

        let user_data_dir = user_data_dir.unwrap_or_else(|| {
            std::env::temp_dir().join(format!("threadscrape_chrome_{}", std::process::id()))
        });
        std::fs::create_dir_all(&user_data_dir)
            .map_err(|e| ScrapeError::Browser(format!("failed to create user data dir: {e}")))?;

        let mut config_builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(1920, 1080)
            .user_data_dir(user_data_dir)
            .chrome_executable(chrome_path);

        if headless {
            config_builder = config_builder.headless_mode(HeadlessMode::default());
        } else {
            config_builder = config_builder.with_head();
        }

        config_builder = config_builder
            .arg(format!("--user-agent={CHROME_USER_AGENT}"))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-popup-blocking")
            .arg("--disable-background-networking")
            .arg("--disable-hang-monitor")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--mute-audio");

        let browser_config = config_builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("failed to build browser config: {e}")))?;

        info!("launching browser");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to launch browser: {e}")))?;

        let handler_task = task::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    let msg = e.to_string();
                    // Chrome emits CDP events chromiumoxide does not model;
                    // those deserialization misses are not actionable.
                    if msg.contains("data did not match any variant of untagged enum Message")
                        || msg.contains("Failed to deserialize WS response")
                    {
                        trace!("suppressed benign CDP serialization error: {msg}");
                    } else {
                        warn!("browser handler error: {e:?}");
                    }
                }
            }
            debug!("browser handler task completed");
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }
}

impl Drop for ChromiumRenderer {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open_page(&self) -> Result<Box<dyn PageSurface>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to open page session")?;
        Ok(Box::new(ChromiumPage { page }))
    }
}

struct ChromiumPage {
    page: Page,
}

#[async_trait]
impl PageSurface for ChromiumPage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, async {
            self.page
                .goto(url)
                .await
                .map_err(|e| anyhow!("navigation failed: {e}"))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| anyhow!("page load failed: {e}"))?;
            Ok::<_, anyhow::Error>(())
        })
        .await
        .map_err(|_| anyhow!("navigation to {url} timed out after {timeout:?}"))?
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .evaluate("window.scrollBy(0, document.body.scrollHeight)")
            .await
            .map_err(|e| anyhow!("scroll failed: {e}"))?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64> {
        self.page
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(|e| anyhow!("scroll height query failed: {e}"))?
            .into_value::<i64>()
            .map_err(|e| anyhow!("scroll height was not a number: {e}"))
    }

    async fn wait_for_settled(&self) -> Result<()> {
        // Scroll-triggered loads do not always produce a navigation event;
        // a timeout here means "settled enough", not failure.
        match tokio::time::timeout(SETTLE_TIMEOUT, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => debug!("settle wait reported: {e}"),
            Err(_) => trace!("settle wait timed out after {SETTLE_TIMEOUT:?}"),
        }
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .map_err(|e| anyhow!("query for '{selector}' failed: {e}"))?;
        Ok(elements
            .into_iter()
            .map(|element| Box::new(ChromiumElement { element }) as Box<dyn PageElement>)
            .collect())
    }

    async fn park_pointer(&self) -> Result<()> {
        self.page
            .move_mouse(Point { x: 0.0, y: 0.0 })
            .await
            .map_err(|e| anyhow!("pointer park failed: {e}"))?;
        Ok(())
    }
}

struct ChromiumElement {
    element: chromiumoxide::Element,
}

#[async_trait]
impl PageElement for ChromiumElement {
    async fn text(&self) -> Result<Option<String>> {
        self.element
            .inner_text()
            .await
            .map_err(|e| anyhow!("text read failed: {e}"))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| anyhow!("attribute '{name}' read failed: {e}"))
    }

    async fn click(&self, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.element.click())
            .await
            .map_err(|_| anyhow!("click timed out after {timeout:?}"))?
            .map_err(|e| anyhow!("click failed: {e}"))?;
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<()> {
        self.element
            .scroll_into_view()
            .await
            .map_err(|e| anyhow!("scroll into view failed: {e}"))?;
        Ok(())
    }
}
