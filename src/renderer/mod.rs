//! Remote rendering surface.
//!
//! The crawl engines never talk to a browser directly; they drive these
//! traits. Every method is fallible and latency-bearing: each call is a
//! suspension point, and callers own the retry/timeout policy around it.
//! The production implementation lives in [`chromium`]; tests substitute
//! scripted fakes.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use chromium::ChromiumRenderer;

/// A single element handle on the current page.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Visible text content, if any.
    async fn text(&self) -> Result<Option<String>>;

    /// Value of the named attribute, if present.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Click the element, bounded by `timeout`.
    async fn click(&self, timeout: Duration) -> Result<()>;

    /// Scroll the element into the viewport.
    async fn scroll_into_view(&self) -> Result<()>;
}

/// One live page session on the remote renderer.
#[async_trait]
pub trait PageSurface: Send + Sync {
    /// Navigate to `url` and wait for the initial load, bounded by
    /// `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Trigger a scroll by the current page extent.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Current scroll extent of the document body.
    async fn scroll_height(&self) -> Result<i64>;

    /// Best-effort wait for in-flight rendering/network activity to settle.
    async fn wait_for_settled(&self) -> Result<()>;

    /// All elements currently matching `selector`, in document order.
    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>>;

    /// Move pointer focus to the viewport origin so hover side effects do
    /// not disturb subsequent reads.
    async fn park_pointer(&self) -> Result<()>;
}

/// Factory for page sessions; one renderer is shared by all engines.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Open a fresh page session.
    async fn open_page(&self) -> Result<Box<dyn PageSurface>>;
}
