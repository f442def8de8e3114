//! Chrome DevTools Protocol adapter, built on `chromiumoxide`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::cdp::browser_protocol::page::EventLifecycleEvent;
use chromiumoxide::{Browser, BrowserConfig, Page};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{BrowserPage, CookieRecord, NetworkRequestRecord, WaitState};
use crate::types::{Result, ScrapeError};

/// Chrome, driven over CDP. Holds the handler task's join handle alive for
/// the adapter's lifetime and keeps a rolling log of observed requests.
pub struct ChromeBrowser {
    _browser: Mutex<Browser>,
    page: Page,
    requests: Arc<DashMap<u64, NetworkRequestRecord>>,
    _handler: tokio::task::JoinHandle<()>,
}

impl ChromeBrowser {
    pub async fn launch(headless: bool) -> Result<Self> {
        let config = if headless {
            BrowserConfig::builder().build()
        } else {
            BrowserConfig::builder().with_head().build()
        }
        .map_err(|e| ScrapeError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to launch chrome: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = futures::StreamExt::next(&mut handler).await {
                if let Err(e) = event {
                    warn!("chrome handler event error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to open page: {e}")))?;

        let requests: Arc<DashMap<u64, NetworkRequestRecord>> = Arc::new(DashMap::new());
        Self::attach_network_listener(&page, requests.clone()).await?;

        Ok(Self { _browser: Mutex::new(browser), page, requests, _handler: handler_task })
    }

    async fn attach_network_listener(page: &Page, requests: Arc<DashMap<u64, NetworkRequestRecord>>) -> Result<()> {
        let mut response_stream = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to attach network listener: {e}")))?;
        let mut lifecycle_stream = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to attach lifecycle listener: {e}")))?;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(ev) = futures::StreamExt::next(&mut response_stream) => {
                        let url = ev.response.url.clone();
                        let method = ev.r#type.to_string();
                        let content_type = ev
                            .response
                            .headers
                            .inner()
                            .get("content-type")
                            .and_then(|v| v.as_str())
                            .map(|s| s.to_string());
                        let is_ws = method.eq_ignore_ascii_case("websocket");
                        requests.insert(
                            requests.len() as u64,
                            NetworkRequestRecord {
                                url,
                                method: "GET".to_string(),
                                resource_type: method,
                                is_websocket_upgrade: is_ws,
                                response_content_type: content_type,
                            },
                        );
                    }
                    Some(_) = futures::StreamExt::next(&mut lifecycle_stream) => {}
                    else => break,
                }
            }
        });
        Ok(())
    }
}

#[async_trait]
impl BrowserPage for ChromeBrowser {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| ScrapeError::timeout("browser navigate", timeout))?
            .map_err(|e| ScrapeError::Browser(format!("navigation failed: {e}")))?;
        tokio::time::timeout(timeout, self.page.wait_for_navigation())
            .await
            .map_err(|_| ScrapeError::timeout("browser navigate (load)", timeout))?
            .map_err(|e| ScrapeError::Browser(format!("navigation settle failed: {e}")))?;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Browser(format!("evaluate failed: {e}")))?;
        result
            .into_value()
            .map_err(|e| ScrapeError::Browser(format!("evaluate result not JSON: {e}")))
    }

    async fn drain_network_log(&self) -> Vec<NetworkRequestRecord> {
        let out: Vec<NetworkRequestRecord> = self.requests.iter().map(|kv| kv.value().clone()).collect();
        self.requests.clear();
        out
    }

    async fn cookies(&self) -> Result<Vec<CookieRecord>> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| ScrapeError::Browser(format!("get_cookies failed: {e}")))?;
        Ok(cookies
            .into_iter()
            .map(|c| CookieRecord { name: c.name, value: c.value, domain: c.domain })
            .collect())
    }

    async fn script_sources(&self) -> Result<Vec<String>> {
        let value = self
            .evaluate("Array.from(document.scripts).map(s => s.src).filter(Boolean)")
            .await?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| ScrapeError::Browser(format!("selector {selector} not found: {e}")))?;
        element
            .click()
            .await
            .map_err(|e| ScrapeError::Browser(format!("click failed: {e}")))?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, state: WaitState, timeout: Duration) -> Result<bool> {
        let script = format!(
            "(() => {{ const el = document.querySelector({selector:?}); \
             if (!el) return 'absent'; \
             const style = window.getComputedStyle(el); \
             return (style.display !== 'none' && style.visibility !== 'hidden') ? 'visible' : 'hidden'; \
             }})()",
            selector,
        );
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let observed = self
                .evaluate(&script)
                .await
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "absent".to_string());
            let satisfied = match state {
                WaitState::Visible => observed == "visible",
                WaitState::Hidden => observed == "hidden" || observed == "absent",
                WaitState::Attached => observed != "absent",
            };
            if satisfied {
                debug!(selector, %observed, "selector wait resolved");
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn scroll_by(&self, pixels: i64) -> Result<()> {
        self.evaluate(&format!("window.scrollBy(0, {pixels})")).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(|e| ScrapeError::Browser(format!("url failed: {e}")))?
            .unwrap_or_default())
    }

    async fn storage_state_json(&self) -> Result<Value> {
        let cookies = self.cookies().await?;
        let local_storage = self
            .evaluate("JSON.stringify(Object.assign({}, window.localStorage))")
            .await
            .unwrap_or(Value::String("{}".to_string()));
        Ok(serde_json::json!({
            "cookies": cookies.iter().map(|c| serde_json::json!({
                "name": c.name, "value": c.value, "domain": c.domain,
            })).collect::<Vec<_>>(),
            "local_storage": local_storage,
        }))
    }
}
