//! In-memory [`BrowserPage`] double used by scanner and workflow unit tests.
//! No real navigation happens; behavior is entirely configured up front.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{BrowserPage, CookieRecord, NetworkRequestRecord, WaitState};
use crate::types::Result;

/// Canned responses a test wires up before handing the page to code under test.
#[derive(Debug, Default)]
pub struct FakePage {
    inner: Mutex<FakeState>,
}

#[derive(Debug, Default)]
struct FakeState {
    url: String,
    eval_responses: HashMap<String, Value>,
    default_eval: Value,
    network_log: Vec<NetworkRequestRecord>,
    cookies: Vec<CookieRecord>,
    script_sources: Vec<String>,
    selector_present: HashMap<String, bool>,
    clicks: Vec<String>,
    scrolls: Vec<i64>,
}

impl FakePage {
    pub fn new() -> Self {
        Self { inner: Mutex::new(FakeState { default_eval: Value::Null, ..Default::default() }) }
    }

    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.inner.lock().unwrap().url = url.into();
        self
    }

    /// Register the value returned for an exact script string.
    pub fn on_eval(self, script: impl Into<String>, value: Value) -> Self {
        self.inner.lock().unwrap().eval_responses.insert(script.into(), value);
        self
    }

    pub fn with_default_eval(self, value: Value) -> Self {
        self.inner.lock().unwrap().default_eval = value;
        self
    }

    pub fn with_network_log(self, records: Vec<NetworkRequestRecord>) -> Self {
        self.inner.lock().unwrap().network_log = records;
        self
    }

    pub fn with_cookies(self, cookies: Vec<CookieRecord>) -> Self {
        self.inner.lock().unwrap().cookies = cookies;
        self
    }

    pub fn with_script_sources(self, sources: Vec<String>) -> Self {
        self.inner.lock().unwrap().script_sources = sources;
        self
    }

    pub fn with_selector(self, selector: impl Into<String>, present: bool) -> Self {
        self.inner.lock().unwrap().selector_present.insert(selector.into(), present);
        self
    }

    pub fn clicks(&self) -> Vec<String> {
        self.inner.lock().unwrap().clicks.clone()
    }

    pub fn scrolls(&self) -> Vec<i64> {
        self.inner.lock().unwrap().scrolls.clone()
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        self.inner.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let state = self.inner.lock().unwrap();
        Ok(state.eval_responses.get(script).cloned().unwrap_or_else(|| state.default_eval.clone()))
    }

    async fn drain_network_log(&self) -> Vec<NetworkRequestRecord> {
        let mut state = self.inner.lock().unwrap();
        std::mem::take(&mut state.network_log)
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>> {
        Ok(self.inner.lock().unwrap().cookies.clone())
    }

    async fn script_sources(&self) -> Result<Vec<String>> {
        Ok(self.inner.lock().unwrap().script_sources.clone())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.inner.lock().unwrap().clicks.push(selector.to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, state: WaitState, _timeout: Duration) -> Result<bool> {
        let present = self.inner.lock().unwrap().selector_present.get(selector).copied().unwrap_or(false);
        Ok(match state {
            WaitState::Visible | WaitState::Attached => present,
            WaitState::Hidden => !present,
        })
    }

    async fn scroll_by(&self, pixels: i64) -> Result<()> {
        self.inner.lock().unwrap().scrolls.push(pixels);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.inner.lock().unwrap().url.clone())
    }

    async fn storage_state_json(&self) -> Result<Value> {
        let cookies = self.cookies().await?;
        Ok(serde_json::json!({
            "cookies": cookies.iter().map(|c| serde_json::json!({
                "name": c.name, "value": c.value, "domain": c.domain,
            })).collect::<Vec<_>>(),
            "local_storage": {},
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_clicks_and_scrolls() {
        let page = FakePage::new();
        page.click("#accept-cookies").await.unwrap();
        page.scroll_by(3000).await.unwrap();
        assert_eq!(page.clicks(), vec!["#accept-cookies".to_string()]);
        assert_eq!(page.scrolls(), vec![3000]);
    }

    #[tokio::test]
    async fn selector_presence_drives_wait_outcomes() {
        let page = FakePage::new().with_selector(".captcha", true);
        assert!(page.wait_for_selector(".captcha", WaitState::Visible, Duration::from_millis(10)).await.unwrap());
        assert!(!page.wait_for_selector(".missing", WaitState::Visible, Duration::from_millis(10)).await.unwrap());
    }

    #[tokio::test]
    async fn eval_returns_registered_value_or_default() {
        let page = FakePage::new()
            .on_eval("document.title", Value::String("Example".into()))
            .with_default_eval(Value::Bool(false));
        assert_eq!(page.evaluate("document.title").await.unwrap(), Value::String("Example".into()));
        assert_eq!(page.evaluate("anything.else").await.unwrap(), Value::Bool(false));
    }
}
