//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Behavioral scanner timing budgets.
pub mod scan {
    /// Navigation budget for reconnaissance.
    pub const NAV_TIMEOUT_SECS: u64 = 45;
    /// Navigation budget for the stealth probe (shorter than a full scan).
    pub const PROBE_TIMEOUT_SECS: u64 = 30;
    /// Soft budget to wait for network idle before measuring DOM stability.
    pub const NETWORK_IDLE_SECS: u64 = 10;
    /// Poll interval while waiting for the DOM to stop mutating.
    pub const DOM_STABILITY_POLL_MS: u64 = 100;
    /// DOM must be unchanged for this long to be considered stable.
    pub const DOM_STABILITY_QUIET_MS: u64 = 800;
    /// Hard cap on DOM stability polling.
    pub const DOM_STABILITY_MAX_SECS: u64 = 5;
    /// Window over which DOM mutations are counted.
    pub const MUTATION_WINDOW_SECS: u64 = 4;
    /// Mutation rate (per second) above which a page is considered highly dynamic.
    pub const HIGH_MUTATION_RATE: f64 = 0.5;
    /// Pixels scrolled when probing scroll-dependent rendering.
    pub const SCROLL_PROBE_PX: i64 = 3000;
    /// Wait after the scroll probe before re-measuring the DOM (seconds).
    pub const SCROLL_PROBE_WAIT_SECS: f64 = 2.5;
}

/// Complexity/hostility scoring weights.
pub mod scoring {
    pub const CAPTCHA: u32 = 50;
    pub const CLOUDFLARE: u32 = 40;
    pub const SPA_FRAMEWORK: u32 = 20;
    pub const HIGH_MUTATION: u32 = 15;
    pub const SCROLL_DEPENDENCY: u32 = 15;

    pub const VENDOR_COOKIE: u32 = 50;
    pub const VENDOR_SCRIPT: u32 = 30;
    pub const HONEYPOT: u32 = 20;
    pub const CHALLENGE_TRAFFIC: u32 = 30;

    pub const LOGIN_BUTTON: u32 = 20;
    pub const AUTH_REQUIRED_BLOCK: u32 = 30;
    pub const AUTH_PROMPT_TEXT: u32 = 40;
    pub const BLURRED_CONTENT: u32 = 25;
    pub const AUTH_OVERLAY: u32 = 35;
    pub const KNOWN_AUTH_HEAVY_HOST: u32 = 30;

    /// At or above this hostility score, access is forced to "guided". This is
    /// the sole trigger for the guided recommendation; complexity alone never
    /// forces it.
    pub const HOSTILITY_GUIDED_THRESHOLD: u32 = 40;

    pub const KNOWN_AUTH_HEAVY_HOSTS: &[&str] =
        &["amazon.", "linkedin.", "facebook.", "twitter.", "x.com", "instagram."];

    pub const BOT_DEFENSE_COOKIES: &[&str] = &[
        "_abck", "bm_sz", "ak_bmsc", "px3", "pxvid", "cf_clearance", "datadome", "kasada",
        "incap_ses", "visid_incap",
    ];
    pub const BOT_DEFENSE_SCRIPT_KEYWORDS: &[&str] = &[
        "akamai", "perimeterx", "px-cdn", "datadome", "kasada", "botd", "fingerprint", "challenge",
    ];
    pub const CHALLENGE_PATH_KEYWORDS: &[&str] = &["challenge", "verify", "/fp"];
}

/// Repair loop bounds.
pub mod repair {
    /// Number of repair attempts allowed per REPAIR entry (total executions = this + 1).
    pub const MAX_REPAIR_ATTEMPTS: u32 = 2;
}

/// Workflow engine retry envelope (flaky exterior calls).
pub mod retry {
    pub const BASE_DELAY_MS: u64 = 2_000;
    pub const MAX_DELAY_SECS: u64 = 30;
    pub const MIN_ATTEMPTS: usize = 2;
    pub const MAX_ATTEMPTS: usize = 3;
    pub const BACKOFF_FACTOR: f64 = 2.0;
}

/// Provider chain constants.
pub mod chain {
    /// Maximum total attempts across all providers.
    pub const MAX_TOTAL_ATTEMPTS: usize = 10;

    /// Default maximum retries per provider.
    pub const DEFAULT_MAX_RETRIES: u8 = 3;

    /// Base delay for exponential backoff (milliseconds).
    pub const BASE_DELAY_MS: u64 = 500;

    /// Maximum delay between retries (seconds).
    pub const MAX_DELAY_SECS: u64 = 30;

    /// Backoff multiplier.
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// Circuit breaker constants.
pub mod circuit_breaker {
    /// Number of failures before opening circuit.
    pub const FAILURE_THRESHOLD: u32 = 5;

    /// Duration to wait before attempting recovery (seconds).
    pub const RECOVERY_TIMEOUT_SECS: u64 = 30;

    /// Maximum requests allowed in half-open state.
    pub const HALF_OPEN_MAX_REQUESTS: u32 = 3;

    /// Success threshold to close circuit from half-open.
    pub const SUCCESS_THRESHOLD: u32 = 2;
}

/// Token budget constants.
pub mod budget {
    /// Default total token budget for a single run.
    pub const DEFAULT_BUDGET: u64 = 200_000;

    /// Warning threshold (percentage of budget).
    pub const WARNING_THRESHOLD: f64 = 0.75;

    /// Critical threshold (percentage of budget).
    pub const CRITICAL_THRESHOLD: f64 = 0.90;
}

/// HTTP/Network constants.
pub mod network {
    /// Default request timeout (seconds).
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Connection timeout (seconds).
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    /// Maximum retries for network requests.
    pub const MAX_NETWORK_RETRIES: u32 = 3;
}

/// Test/final-run subprocess execution timeouts.
pub mod execution {
    pub const TEST_RUN_TIMEOUT_SECS: u64 = 120;
    pub const FINAL_RUN_TIMEOUT_SECS: u64 = 600;
}

/// Understanding-agent confidence thresholds.
pub mod confidence {
    /// Below this, CI mode treats LLM_ANALYSIS as a hard failure.
    pub const CI_MIN_CONFIDENCE: f64 = 0.5;
    /// Below this, `scraping_possible = false` is expected by policy.
    pub const INFEASIBLE_MAX_CONFIDENCE: f64 = 0.4;
}
