//! Page-interaction plugin protocol.
//!
//! A plugin is one category of best-effort interaction against the current
//! page state: dismiss a dialog, expand a collapsed thread, and so on. The
//! capability set is closed: every plugin is a named [`PagePlugin`]
//! variant, and extraction composes them through an explicit ordered
//! slice, never by runtime introspection.
//!
//! Each attempt queries every element matching the plugin's selector and
//! tries to activate each one in turn: scroll into view, bounded-retry
//! click with a randomized per-attempt timeout, settle wait, jitter, then
//! park the pointer away from the element. One element failing never
//! aborts the rest; the attempt reports `true` iff at least one element was
//! actually activated.

use anyhow::{Context, Result, anyhow};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use crate::renderer::{PageElement, PageSurface};
use crate::utils::{CLICK_RETRIES, CLICK_TIMEOUT_CEILING_MS};

/// Delay between click attempts on the same element.
const CLICK_RETRY_DELAY: Duration = Duration::from_secs(1);

/// The closed set of page-interaction capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePlugin {
    /// Dismiss a blocking dialog via its close button.
    CloseDialog,
    /// Expand a collapsed comment thread.
    ExpandThread,
    /// Expand an "N more replies" fold.
    ExpandReplies,
    /// Load the next chunk of comments ("View more comments").
    ExpandComments,
}

impl PagePlugin {
    /// Pipeline order used by the extraction engine when none is supplied:
    /// load more comments first, then clear dialogs, then unfold threads
    /// and replies.
    #[must_use]
    pub fn default_pipeline() -> Vec<Self> {
        vec![
            Self::ExpandComments,
            Self::CloseDialog,
            Self::ExpandThread,
            Self::ExpandReplies,
        ]
    }

    /// Selector matching the elements this plugin activates.
    #[must_use]
    pub fn selector(&self) -> &'static str {
        match self {
            Self::CloseDialog => r#"button[aria-label="Close"]:has(svg[icon-name="close-outline"])"#,
            Self::ExpandThread => r#"button:has(svg[icon-name="join-outline"])"#,
            Self::ExpandReplies => r#"button:has-text("more replies")"#,
            Self::ExpandComments => r#"button:has-text("View more comments")"#,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::CloseDialog => "close-dialog",
            Self::ExpandThread => "expand-thread",
            Self::ExpandReplies => "expand-replies",
            Self::ExpandComments => "expand-comments",
        }
    }

    /// Attempt this interaction against the current page state.
    ///
    /// Returns whether any element was successfully activated. Callers
    /// treat an `Err` the same as `Ok(false)`; it is surfaced separately
    /// only so the failure can be logged with context.
    ///
    /// Suspension points: element query, then per element scroll/click/
    /// settle/jitter/park.
    pub async fn attempt(&self, page: &dyn PageSurface) -> Result<bool> {
        let elements = page
            .query(self.selector())
            .await
            .with_context(|| format!("{} element query failed", self.describe()))?;
        if elements.is_empty() {
            debug!(plugin = self.describe(), "no matching elements");
            return Ok(false);
        }

        debug!(
            plugin = self.describe(),
            count = elements.len(),
            "activating matching elements"
        );
        let mut activated = 0usize;
        for element in &elements {
            match activate_element(page, element.as_ref()).await {
                Ok(()) => activated += 1,
                Err(e) => {
                    warn!(plugin = self.describe(), "element activation failed: {e:#}");
                }
            }
        }

        debug!(
            plugin = self.describe(),
            activated,
            total = elements.len(),
            "plugin pass complete"
        );
        Ok(activated > 0)
    }
}

/// Activate a single element: scroll it into view, click it with bounded
/// retries, let the page settle, and park the pointer so hover state does
/// not linger over the element.
async fn activate_element(page: &dyn PageSurface, element: &dyn PageElement) -> Result<()> {
    element.scroll_into_view().await?;
    click_with_retries(element).await?;
    page.wait_for_settled().await?;

    let jitter = Duration::from_millis(rand::rng().random_range(0..2_000));
    tokio::time::sleep(jitter).await;

    if let Err(e) = page.park_pointer().await {
        // The click already landed; a failed park only risks hover noise.
        debug!("pointer park failed: {e:#}");
    }
    Ok(())
}

/// Click with up to [`CLICK_RETRIES`] attempts, each bounded by a fresh
/// randomized timeout.
async fn click_with_retries(element: &dyn PageElement) -> Result<()> {
    let mut last_error = anyhow!("no click attempts made");
    for attempt in 1..=CLICK_RETRIES {
        let timeout =
            Duration::from_millis(rand::rng().random_range(1..=CLICK_TIMEOUT_CEILING_MS));
        match element.click(timeout).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!("click attempt {attempt}/{CLICK_RETRIES} failed: {e:#}");
                last_error = e;
                if attempt < CLICK_RETRIES {
                    tokio::time::sleep(CLICK_RETRY_DELAY).await;
                }
            }
        }
    }
    Err(last_error.context(format!("click failed after {CLICK_RETRIES} attempts")))
}
