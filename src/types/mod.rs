pub mod analysis_snapshot;
pub mod error;
pub mod interaction_log;
pub mod run_config;
pub mod scan_profile;
pub mod session;
pub mod understanding;
pub mod wide_event;

pub use analysis_snapshot::{AnalysisSnapshot, PaginationSignal, SectionCandidate, SnapshotMeta};
pub use error::{
    ErrorCategory, ErrorClassifier, LlmError, Result, ResultExt, ScrapeError, ScraperErrorClassifier,
    ScraperErrorKind, ValidationError, ValidationErrorKind,
};
pub use interaction_log::{AccessMode, InteractionLog, InteractionStep};
pub use run_config::{
    FieldSelection, OutputFormat, Pagination, PaginationConfig, PaginationMode, RunConfig,
};
pub use scan_profile::{
    AccessRecommendation, ApiEndpoint, DomStats, MutationStats, NetworkActivity, ScanProfile,
    ScrollDependency, SigninSignals, StructuralSignals, TechStack,
};
pub use session::{HistoryEntry, Session, SessionFlags, State};
pub use understanding::{BrowserMode, FieldSuggestion, PaginationGuess, PaginationStrategy, Understanding};
pub use wide_event::WideEvent;

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for project/session identifiers.
///
/// Prevents accidental mixing of session IDs with other string types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Type-safe wrapper for token counts.
///
/// Provides compile-time type safety for token budget operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenCount(u64);

impl TokenCount {
    pub const ZERO: Self = Self(0);

    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Check if count exceeds a threshold percentage of a budget.
    pub fn exceeds_threshold(self, budget: Self, threshold: f64) -> bool {
        if budget.0 == 0 {
            return false;
        }
        (self.0 as f64 / budget.0 as f64) >= threshold
    }

    /// Calculate utilization as a percentage (0.0 - 1.0).
    pub fn utilization(self, budget: Self) -> f64 {
        if budget.0 == 0 {
            0.0
        } else {
            self.0 as f64 / budget.0 as f64
        }
    }
}

impl fmt::Display for TokenCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TokenCount {
    fn from(count: u64) -> Self {
        Self(count)
    }
}

impl From<u32> for TokenCount {
    fn from(count: u32) -> Self {
        Self(count as u64)
    }
}

impl std::ops::Add for TokenCount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for TokenCount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

/// Type-safe wrapper for file paths.
///
/// Ensures file paths are not accidentally mixed with other string types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(String);

impl FilePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> Option<&str> {
        std::path::Path::new(&self.0).file_name().and_then(|n| n.to_str())
    }

    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.0).extension().and_then(|e| e.to_str())
    }

    pub fn parent(&self) -> Option<&str> {
        std::path::Path::new(&self.0).parent().and_then(|p| p.to_str())
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for FilePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for FilePath {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

#[cfg(test)]
mod newtype_tests {
    use super::*;

    #[test]
    fn test_token_count_arithmetic() {
        let a = TokenCount::new(100);
        let b = TokenCount::new(50);
        assert_eq!((a + b).get(), 150);
        assert_eq!(a.saturating_sub(TokenCount::new(200)).get(), 0);
    }

    #[test]
    fn test_file_path_methods() {
        let path = FilePath::new("src/main.rs");
        assert_eq!(path.file_name(), Some("main.rs"));
        assert_eq!(path.extension(), Some("rs"));
        assert_eq!(path.parent(), Some("src"));
    }

    #[test]
    fn test_session_id() {
        let id = SessionId::new("sess-123");
        assert_eq!(id.as_str(), "sess-123");
        assert_eq!(format!("{}", id), "sess-123");
    }
}
