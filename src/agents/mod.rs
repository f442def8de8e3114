//! LLM-facing agents: Understanding, CodeGen, Repair. All three share one
//! shape — build a prompt, call the provider, log the raw reply, parse it —
//! so only `mod.rs`'s `AgentRunner` differs per agent in its prompt and
//! schema.
//!
//! Grounded on `ai/provider/claude_code.rs`'s call/parse pattern and
//! `ai/validation/json_repair.rs`'s fallback-ladder idiom, narrowed per
//! [`parsing`].

mod codegen;
mod parsing;
mod repair;
mod understanding;

pub use codegen::CodeGenAgent;
pub use repair::RepairAgent;
pub use understanding::UnderstandingAgent;

use std::sync::Arc;
use std::time::SystemTime;

use serde_json::Value;
use tracing::debug;

use crate::ai::provider::{LlmProvider, LlmResponse};
use crate::store::ArtifactStore;
use crate::types::Result;

/// Shared plumbing every agent is built on: the provider to call and the
/// store to log raw replies into (`llm_logs/<agent>-<n>.json`).
pub struct AgentRunner {
    provider: Arc<dyn LlmProvider>,
    store: ArtifactStore,
}

impl AgentRunner {
    pub fn new(provider: Arc<dyn LlmProvider>, store: ArtifactStore) -> Self {
        Self { provider, store }
    }

    /// Calls the provider, logs the raw reply under `llm_logs/`, and returns
    /// a normalized JSON value: if the provider's own parse produced a plain
    /// string (a model that double-encoded its JSON as a quoted string), the
    /// narrow ladder in [`parsing`] gets a second pass at it.
    pub async fn call(&self, agent_name: &str, prompt: &str, schema: &Value) -> Result<Value> {
        debug!(agent = agent_name, "invoking llm agent");
        let response: LlmResponse = self.provider.generate(prompt, schema).await?;
        self.log_raw(agent_name, &response).await;

        let value = match &response.content {
            Value::String(s) => parsing::narrow_json_extract(s),
            other => other.clone(),
        };
        Ok(value)
    }

    async fn log_raw(&self, agent_name: &str, response: &LlmResponse) {
        let seq = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
        let relative = format!("llm_logs/{agent_name}-{seq}.json");
        let record = serde_json::json!({
            "agent": agent_name,
            "model": response.metadata.model,
            "provider": response.metadata.provider,
            "usage": response.usage,
            "content": response.content,
        });
        if let Err(e) = self.store.write_json(&relative, &record) {
            tracing::warn!(error = %e, "failed to log raw agent response");
        }
    }
}
