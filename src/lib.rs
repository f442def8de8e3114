//! scrapecraft - Agentic Scraper Builder
//!
//! Point it at a URL: a behavioral scan classifies how hostile the site's
//! anti-bot/rendering surface is, an LLM proposes what to extract, generated
//! Python is tested and self-repaired against the live page, and a runnable
//! scraper plus its first output are left on disk for a project directory.
//!
//! ## Core Features
//!
//! - **Behavioral Scanner**: headless/headed probes score complexity and
//!   bot-defense hostility before any LLM call is made
//! - **Guided Access**: a headed browser session for sites that need a human
//!   to sign in or clear a challenge
//! - **Understanding → Codegen → Repair**: an LLM proposes fields and
//!   pagination, generates a scraper script, and repairs it against real
//!   failures within a bounded attempt budget
//! - **Provider Chain**: Claude Code CLI, OpenAI, or Ollama backends
//!
//! ## Modules
//!
//! - [`workflow`]: the state machine orchestrating one project run
//! - [`scanner`]: behavioral scanning and complexity/hostility scoring
//! - [`agents`]: Understanding/CodeGen/Repair LLM agents
//! - [`executor`]: runs the generated scraper as a subprocess
//! - [`repair`]: bounded self-repair loop over execution failures
//! - [`runtime_contract`]: the shared Python runtime the generated scraper imports
//! - [`browser`]: headless/headed browser control
//! - [`store`]: per-project JSON artifact persistence
//! - [`config`]: layered configuration (defaults/global/project/env)
//! - [`ai`]: LLM provider abstraction

#![recursion_limit = "256"]

pub mod agents;
pub mod ai;
pub mod browser;
pub mod cli;
pub mod config;
pub mod constants;
pub mod executor;
pub mod repair;
pub mod runtime_contract;
pub mod scanner;
pub mod store;
pub mod types;
pub mod workflow;

// =============================================================================
// Core Re-exports
// =============================================================================

pub use config::{Config, ConfigLoader, LlmConfig, ProjectsConfig};

pub use types::error::{ErrorCategory, Result, ResultExt, ScrapeError};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{ClaudeCodeProvider, LlmProvider, LlmResponse, ProviderChain, ProviderChainBuilder, TimeoutConfig, with_timeout};

// =============================================================================
// Workflow Re-exports
// =============================================================================

pub use workflow::{CiOperator, Engine, OperatorInterface, TestOutcome};
