//! ScanProfile — the Behavioral Scanner's output artifact.
//!
//! Field shape and scoring invariants grounded on the scanner design
//! (`scanner/mod.rs`) and the scoring weights in `constants::scoring`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRecommendation {
    Automatic,
    Guided,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkActivity {
    pub total_requests: u32,
    pub api_endpoints: Vec<ApiEndpoint>,
    pub realtime_connections: u32,
    pub json_responses: u32,
    /// A request URL matched one of `constants::scoring::CHALLENGE_PATH_KEYWORDS`.
    pub challenge_path_seen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub url: String,
    pub method: String,
    pub resource_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomStats {
    pub node_count: u32,
    pub avg_depth: f64,
    pub max_depth: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationStats {
    pub mutations_observed: u32,
    pub window_secs: f64,
    pub rate_per_sec: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrollDependency {
    pub nodes_before: u32,
    pub nodes_after: u32,
    pub lazy_image_count: u32,
    pub has_intersection_observer: bool,
    pub detected: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechStack {
    pub framework: Option<String>,
    pub shadow_dom: bool,
    pub anti_bot: Option<String>,
    pub bot_defense_vendors: Vec<String>,
    pub signin_required: bool,
}

/// Individual sign-in/paywall surface indicators, each weighted separately
/// by `scoring::synthesize` rather than collapsed to one bool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigninSignals {
    pub login_button: bool,
    pub auth_required_block: bool,
    pub auth_prompt_text: bool,
    pub blurred_content: bool,
    pub auth_overlay: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralSignals {
    pub iframe_count: u32,
    pub nav_to_content_ratio: f64,
    pub repeating_unit_selector: Option<String>,
    pub accessibility_landmarks: u32,
    /// Hidden form inputs outside the visible viewport — a honeypot trap
    /// laid for scripted form-fillers.
    pub hidden_input_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanProfile {
    pub url: String,
    #[serde(default)]
    pub dom_ready_ms: u64,
    pub network_activity: NetworkActivity,
    pub pre_render_stats: DomStats,
    pub post_render_stats: DomStats,
    pub mutation_stats: MutationStats,
    pub scroll_dependency: ScrollDependency,
    pub tech_stack: TechStack,
    pub structural_signals: StructuralSignals,
    #[serde(default)]
    pub signin_signals: SigninSignals,
    pub complexity_score: u32,
    pub hostility_score: u32,
    #[serde(default)]
    pub complexity_reasons: Vec<String>,
    pub access_recommendation: Option<AccessRecommendation>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ScanProfile {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    /// A conservative fallback profile used when the probe itself fails after
    /// retries (S6): never terminal, always routes to guided access.
    pub fn probe_failed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            complexity_score: 100,
            hostility_score: 0,
            complexity_reasons: vec!["Probe failed".to_string()],
            access_recommendation: Some(AccessRecommendation::Guided),
            errors: vec!["probe navigation failed after retries".to_string()],
            ..Default::default()
        }
    }
}
