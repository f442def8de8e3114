//! Browser capability — the trait the Behavioral Scanner and the guided-access
//! handler drive, plus a concrete Chrome DevTools Protocol adapter.
//!
//! The trait is intentionally narrow: only the operations named by the scan
//! pipeline (§4.2) and the guided-access flow need to cross this boundary.
//! Grounded on `examples/spider-rs-spider/spider_chrome` (published under the
//! crate name `chromiumoxide`), the ecosystem's CDP automation crate.

mod chrome;
mod fake;

pub use chrome::ChromeBrowser;
pub use fake::FakePage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::types::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Visible,
    Hidden,
    Attached,
}

/// A single cookie as read off the page; also the shape persisted to
/// `cookies.json` after a guided-access session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
}

#[derive(Debug, Clone)]
pub struct NetworkRequestRecord {
    pub url: String,
    pub method: String,
    pub resource_type: String,
    pub is_websocket_upgrade: bool,
    pub response_content_type: Option<String>,
}

/// A live browser page, abstracted to exactly the operations the scanner and
/// the guided-access handler need.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;
    async fn evaluate(&self, script: &str) -> Result<Value>;
    async fn drain_network_log(&self) -> Vec<NetworkRequestRecord>;
    async fn cookies(&self) -> Result<Vec<CookieRecord>>;
    async fn script_sources(&self) -> Result<Vec<String>>;
    async fn click(&self, selector: &str) -> Result<()>;
    async fn wait_for_selector(&self, selector: &str, state: WaitState, timeout: Duration) -> Result<bool>;
    async fn scroll_by(&self, pixels: i64) -> Result<()>;
    async fn current_url(&self) -> Result<String>;
    async fn storage_state_json(&self) -> Result<Value>;
}

/// Constructs a [`BrowserPage`] in the requested mode. Kept as a thin factory
/// so the engine depends only on the trait.
pub async fn launch(headless: bool) -> Result<Box<dyn BrowserPage>> {
    Ok(Box::new(ChromeBrowser::launch(headless).await?))
}
