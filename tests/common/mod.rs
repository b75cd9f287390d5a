//! Scripted fake renderer shared by the integration tests.
//!
//! A `FakePage` is a sequence of [`Round`]s: snapshots of page state
//! between scrolls. `scroll_to_bottom` advances to the next round (clamping
//! at the last), queries and height reads see the current round. This is
//! enough to script feed growth, comment loading, and stuck pages without
//! a browser.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use threadscrape::renderer::{PageElement, PageSurface, Renderer};

/// A scriptable element; clones share the attempt counter.
#[derive(Clone, Default)]
pub struct FakeElement {
    pub text: Option<String>,
    pub href: Option<String>,
    pub fail_clicks: bool,
    pub click_attempts: Arc<AtomicUsize>,
}

impl FakeElement {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    pub fn with_href(href: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            ..Self::default()
        }
    }

    pub fn clickable() -> Self {
        Self::default()
    }

    pub fn unclickable() -> Self {
        Self {
            fail_clicks: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.click_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageElement for FakeElement {
    async fn text(&self) -> Result<Option<String>> {
        Ok(self.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        if name == "href" {
            Ok(self.href.clone())
        } else {
            Ok(None)
        }
    }

    async fn click(&self, _timeout: Duration) -> Result<()> {
        self.click_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_clicks {
            bail!("element refused the click");
        }
        Ok(())
    }

    async fn scroll_into_view(&self) -> Result<()> {
        Ok(())
    }
}

/// One page state between scrolls.
#[derive(Clone, Default)]
pub struct Round {
    pub elements: HashMap<String, Vec<FakeElement>>,
    pub height: i64,
}

impl Round {
    pub fn new(height: i64) -> Self {
        Self {
            elements: HashMap::new(),
            height,
        }
    }

    pub fn with(mut self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }
}

#[derive(Default)]
struct PageState {
    rounds: Vec<Round>,
    current: usize,
    navigations: Vec<String>,
    fail_navigation: bool,
}

/// A page session scripted as a sequence of rounds. Clones share state so
/// tests can inspect a page they handed to an engine.
#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn scripted(rounds: Vec<Round>) -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState {
                rounds,
                ..PageState::default()
            })),
        }
    }

    pub fn failing_navigation() -> Self {
        Self {
            state: Arc::new(Mutex::new(PageState {
                fail_navigation: true,
                ..PageState::default()
            })),
        }
    }

    pub async fn navigations(&self) -> Vec<String> {
        self.state.lock().await.navigations.clone()
    }
}

#[async_trait]
impl PageSurface for FakePage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.fail_navigation {
            bail!("navigation refused");
        }
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.current + 1 < state.rounds.len() {
            state.current += 1;
        }
        Ok(())
    }

    async fn scroll_height(&self) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .rounds
            .get(state.current)
            .map(|round| round.height)
            .unwrap_or(0))
    }

    async fn wait_for_settled(&self) -> Result<()> {
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Vec<Box<dyn PageElement>>> {
        let state = self.state.lock().await;
        Ok(state
            .rounds
            .get(state.current)
            .and_then(|round| round.elements.get(selector))
            .map(|elements| {
                elements
                    .iter()
                    .cloned()
                    .map(|element| Box::new(element) as Box<dyn PageElement>)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn park_pointer(&self) -> Result<()> {
        Ok(())
    }
}

/// Hands out scripted pages in order; falls back to blank pages once the
/// queue is empty.
pub struct FakeRenderer {
    queue: Mutex<VecDeque<FakePage>>,
}

impl FakeRenderer {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            queue: Mutex::new(pages.into()),
        }
    }

    pub fn single(page: FakePage) -> Self {
        Self::new(vec![page])
    }

    pub fn blank() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn open_page(&self) -> Result<Box<dyn PageSurface>> {
        let mut queue = self.queue.lock().await;
        let page = queue.pop_front().unwrap_or_default();
        Ok(Box::new(page))
    }
}
