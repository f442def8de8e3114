//! Error taxonomy.
//!
//! Two classifiers live here, grounded on the same substring-cascade idiom:
//! `ErrorCategory`/`ErrorClassifier` classify failures from the LLM transport
//! (retry/fallback routing inside the provider chain); `ScraperErrorKind`/
//! `ScraperErrorClassifier` classify stderr/stdout text from a generated
//! scraper's subprocess run for the repair loop.

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// LLM transport error categories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    RateLimit,
    TokenLimit,
    Auth,
    Network,
    Unavailable,
    BadRequest,
    ParseError,
    Transient,
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RateLimit => "rate_limit",
            Self::TokenLimit => "token_limit",
            Self::Auth => "auth",
            Self::Network => "network",
            Self::Unavailable => "unavailable",
            Self::BadRequest => "bad_request",
            Self::ParseError => "parse_error",
            Self::Transient => "transient",
            Self::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl ErrorCategory {
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Auth | Self::BadRequest)
    }

    pub fn should_fallback(self) -> bool {
        matches!(self, Self::Auth | Self::TokenLimit | Self::Unavailable)
    }

    pub fn recommended_delay(self) -> Duration {
        match self {
            Self::RateLimit => Duration::from_secs(30),
            Self::Network | Self::Transient => Duration::from_secs(2),
            Self::ParseError => Duration::from_millis(500),
            _ => Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: String,
    pub retry_after: Option<Duration>,
}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: provider.into(),
            retry_after: None,
        }
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({})", self.provider, self.message, self.category)
    }
}

pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(message: &str, provider: &str) -> LlmError {
        let lower = message.to_lowercase();
        let category = if lower.contains("rate limit") || lower.contains("429") || lower.contains("too many requests") {
            ErrorCategory::RateLimit
        } else if lower.contains("token limit") || lower.contains("context length") || lower.contains("maximum context") {
            ErrorCategory::TokenLimit
        } else if lower.contains("unauthorized") || lower.contains("invalid api key") || lower.contains("401") || lower.contains("403") {
            ErrorCategory::Auth
        } else if lower.contains("connection") || lower.contains("timed out") || lower.contains("timeout") || lower.contains("dns") {
            ErrorCategory::Network
        } else if lower.contains("unavailable") || lower.contains("503") || lower.contains("overloaded") {
            ErrorCategory::Unavailable
        } else if lower.contains("bad request") || lower.contains("400") || lower.contains("invalid request") {
            ErrorCategory::BadRequest
        } else if lower.contains("parse") || lower.contains("json") || lower.contains("malformed") {
            ErrorCategory::ParseError
        } else if lower.contains("temporarily") || lower.contains("retry") {
            ErrorCategory::Transient
        } else {
            ErrorCategory::Unknown
        };

        LlmError::new(category, message, provider)
    }

    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            401 | 403 => ErrorCategory::Auth,
            429 => ErrorCategory::RateLimit,
            400 | 404 | 422 => ErrorCategory::BadRequest,
            500..=599 => ErrorCategory::Unavailable,
            _ => ErrorCategory::Unknown,
        };
        LlmError::new(category, message, provider)
    }
}

// =============================================================================
// Scraper subprocess error kinds (Repair Loop classifier)
// =============================================================================

/// Classification of a failed scraper subprocess run, used to decide how the
/// Repair agent should be prompted. Substring-based, case-insensitive, in the
/// fixed precedence order named by the repair loop design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScraperErrorKind {
    TimeoutError,
    SyntaxError,
    SelectorError,
    NetworkError,
    GeneralError,
}

impl std::fmt::Display for ScraperErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TimeoutError => "timeout_error",
            Self::SyntaxError => "syntax_error",
            Self::SelectorError => "selector_error",
            Self::NetworkError => "network_error",
            Self::GeneralError => "general_error",
        };
        write!(f, "{s}")
    }
}

impl ScraperErrorKind {
    /// Whether this kind is considered recoverable by an LLM code fix.
    ///
    /// Network and general errors are marked non-recoverable here but the
    /// repair loop does not consult this to skip an attempt — it always
    /// spends the attempt within budget. Preserved intentionally, see
    /// DESIGN.md Open Question #2.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, Self::NetworkError | Self::GeneralError)
    }
}

pub struct ScraperErrorClassifier;

impl ScraperErrorClassifier {
    pub fn classify(output: &str) -> ScraperErrorKind {
        let lower = output.to_lowercase();
        if lower.contains("timeouterror") || lower.contains("timed out") || lower.contains("timeout exceeded") {
            ScraperErrorKind::TimeoutError
        } else if lower.contains("syntaxerror") || lower.contains("indentationerror") {
            ScraperErrorKind::SyntaxError
        } else if lower.contains("no such element") || lower.contains("selector") || lower.contains("waiting for selector") {
            ScraperErrorKind::SelectorError
        } else if lower.contains("connectionerror") || lower.contains("net::err") || lower.contains("networkerror") || lower.contains("dns") {
            ScraperErrorKind::NetworkError
        } else {
            ScraperErrorKind::GeneralError
        }
    }
}

// =============================================================================
// Validation errors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Schema,
    MissingField,
    Format,
    Range,
    Consistency,
    General,
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

// =============================================================================
// Top-level error type
// =============================================================================

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM transport error: {0}")]
    LlmApi(String),

    #[error("{operation} timed out after {duration:?}")]
    Timeout { operation: String, duration: Duration },

    #[error("workflow step {state} failed: {message} (recoverable: {recoverable})")]
    Workflow { state: String, message: String, recoverable: bool },

    #[error("failed to parse {path}: {message}")]
    Parse { message: String, path: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("artifact store error: {0}")]
    Store(String),

    #[error("scraper runtime error: {0}")]
    ScraperRuntime(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

impl ScrapeError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout { operation: operation.into(), duration }
    }

    pub fn workflow(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Workflow { state: state.into(), message: message.into(), recoverable: false }
    }

    pub fn workflow_recoverable(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Workflow { state: state.into(), message: message.into(), recoverable: true }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Workflow { recoverable: true, .. })
    }
}

impl From<LlmError> for ScrapeError {
    fn from(e: LlmError) -> Self {
        Self::Llm(e.to_string())
    }
}

impl From<ValidationError> for ScrapeError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e.to_string())
    }
}

pub trait ResultExt<T> {
    fn with_context(self, context: impl FnOnce() -> String) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn with_context(self, context: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| ScrapeError::Other(anyhow::anyhow!("{}: {}", context(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_display() {
        assert_eq!(ErrorCategory::RateLimit.to_string(), "rate_limit");
        assert_eq!(ErrorCategory::Unknown.to_string(), "unknown");
    }

    #[test]
    fn category_retryable_and_fallback() {
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Auth.should_fallback());
        assert!(!ErrorCategory::Network.should_fallback());
    }

    #[test]
    fn classify_each_category() {
        assert_eq!(ErrorClassifier::classify("429 rate limit exceeded", "p").category, ErrorCategory::RateLimit);
        assert_eq!(ErrorClassifier::classify("maximum context length exceeded", "p").category, ErrorCategory::TokenLimit);
        assert_eq!(ErrorClassifier::classify("401 unauthorized", "p").category, ErrorCategory::Auth);
        assert_eq!(ErrorClassifier::classify("connection timed out", "p").category, ErrorCategory::Network);
        assert_eq!(ErrorClassifier::classify("503 service unavailable", "p").category, ErrorCategory::Unavailable);
        assert_eq!(ErrorClassifier::classify("400 bad request", "p").category, ErrorCategory::BadRequest);
        assert_eq!(ErrorClassifier::classify("failed to parse json", "p").category, ErrorCategory::ParseError);
        assert_eq!(ErrorClassifier::classify("something odd happened", "p").category, ErrorCategory::Unknown);
    }

    #[test]
    fn http_status_classification() {
        assert_eq!(ErrorClassifier::classify_http_status(429, "", "p").category, ErrorCategory::RateLimit);
        assert_eq!(ErrorClassifier::classify_http_status(500, "", "p").category, ErrorCategory::Unavailable);
    }

    #[test]
    fn scraper_error_classification_precedence() {
        assert_eq!(ScraperErrorClassifier::classify("TimeoutError: page took too long"), ScraperErrorKind::TimeoutError);
        assert_eq!(ScraperErrorClassifier::classify("SyntaxError: invalid syntax"), ScraperErrorKind::SyntaxError);
        assert_eq!(ScraperErrorClassifier::classify("waiting for selector \".item\" failed"), ScraperErrorKind::SelectorError);
        assert_eq!(ScraperErrorClassifier::classify("net::ERR_CONNECTION_REFUSED"), ScraperErrorKind::NetworkError);
        assert_eq!(ScraperErrorClassifier::classify("KeyError: 'title'"), ScraperErrorKind::GeneralError);
    }

    #[test]
    fn scraper_error_recoverability() {
        assert!(ScraperErrorKind::SyntaxError.is_recoverable());
        assert!(ScraperErrorKind::SelectorError.is_recoverable());
        assert!(!ScraperErrorKind::NetworkError.is_recoverable());
        assert!(!ScraperErrorKind::GeneralError.is_recoverable());
    }
}
