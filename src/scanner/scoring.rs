//! Complexity/hostility score synthesis from the signals a scan collects.
//! Pure functions over [`ScanProfile`]'s component fields so the pipeline in
//! `mod.rs` stays a straight-line sequence of probes.

use crate::constants::scoring;
use crate::types::{AccessRecommendation, ScanProfile};

/// Fold every weighted signal into `complexity_score`/`hostility_score` and
/// pick the access recommendation. Mutates the profile in place; called once
/// as the pipeline's final stage.
///
/// `complexity_score` and `hostility_score` start as independent tallies —
/// complexity from rendering-difficulty signals (captcha, Cloudflare, SPA
/// framework, mutation rate, scroll dependency), hostility from
/// bot-defense/evasion signals (vendor cookies/scripts, honeypots, challenge
/// traffic) — and the sign-in surface folds into hostility before the two
/// are reconciled so `complexity_score >= hostility_score` always holds.
/// `access_recommendation` is driven solely by `hostility_score >= 40`;
/// complexity alone never forces guided access.
pub fn synthesize(profile: &mut ScanProfile) {
    let mut complexity: u32 = 0;
    let mut hostility: u32 = 0;
    let mut complexity_reasons = Vec::new();
    let mut hostility_reasons = Vec::new();

    if let Some(anti_bot) = profile.tech_stack.anti_bot.as_deref() {
        match anti_bot {
            "captcha" => {
                complexity += scoring::CAPTCHA;
                complexity_reasons.push("CAPTCHA challenge detected".to_string());
            }
            "cloudflare" => {
                complexity += scoring::CLOUDFLARE;
                complexity_reasons.push("Cloudflare challenge page detected".to_string());
            }
            _ => {}
        }
    }

    if profile.tech_stack.framework.is_some() {
        complexity += scoring::SPA_FRAMEWORK;
        complexity_reasons.push(format!(
            "SPA framework detected: {}",
            profile.tech_stack.framework.as_deref().unwrap_or("unknown")
        ));
    }

    if profile.mutation_stats.rate_per_sec > crate::constants::scan::HIGH_MUTATION_RATE {
        complexity += scoring::HIGH_MUTATION;
        complexity_reasons.push(format!(
            "High DOM mutation rate: {:.2}/s",
            profile.mutation_stats.rate_per_sec
        ));
    }

    if profile.scroll_dependency.detected {
        complexity += scoring::SCROLL_DEPENDENCY;
        complexity_reasons.push("Content depends on scroll-triggered loading".to_string());
    }

    let vendors = &profile.tech_stack.bot_defense_vendors;
    if vendors.iter().any(|v| v == "cookie") {
        hostility += scoring::VENDOR_COOKIE;
    }
    if vendors.iter().any(|v| v == "script") {
        hostility += scoring::VENDOR_SCRIPT;
    }
    if !vendors.is_empty() {
        hostility_reasons.push(format!("Bot-defense vendor signals: {}", vendors.join(", ")));
    }

    if profile.structural_signals.hidden_input_count > 0 {
        hostility += scoring::HONEYPOT;
        hostility_reasons.push(format!(
            "{} hidden form input(s) suggest a honeypot trap",
            profile.structural_signals.hidden_input_count
        ));
    }

    if profile.network_activity.challenge_path_seen {
        hostility += scoring::CHALLENGE_TRAFFIC;
        hostility_reasons.push("Challenge/verify/fingerprint traffic observed".to_string());
    }

    let signin = &profile.signin_signals;
    let mut signin_score: u32 = 0;
    let mut signin_reasons = Vec::new();
    if signin.login_button {
        signin_score += scoring::LOGIN_BUTTON;
        signin_reasons.push("Login button present".to_string());
    }
    if signin.auth_required_block {
        signin_score += scoring::AUTH_REQUIRED_BLOCK;
        signin_reasons.push("Auth-required block detected".to_string());
    }
    if signin.auth_prompt_text {
        signin_score += scoring::AUTH_PROMPT_TEXT;
        signin_reasons.push("Auth prompt text detected".to_string());
    }
    if signin.blurred_content {
        signin_score += scoring::BLURRED_CONTENT;
        signin_reasons.push("Blurred content behind a sign-in wall".to_string());
    }
    if signin.auth_overlay {
        signin_score += scoring::AUTH_OVERLAY;
        signin_reasons.push("Auth overlay detected".to_string());
    }
    if is_known_auth_heavy_host(&profile.url) {
        signin_score += scoring::KNOWN_AUTH_HEAVY_HOST;
        signin_reasons.push("Host is known to require authentication".to_string());
    }
    if signin_score >= scoring::HOSTILITY_GUIDED_THRESHOLD {
        hostility = hostility.max(signin_score);
    } else {
        hostility += signin_score;
    }
    hostility_reasons.extend(signin_reasons);

    if profile.structural_signals.iframe_count > 0 {
        complexity_reasons
            .push(format!("{} iframe(s) present", profile.structural_signals.iframe_count));
    }

    if hostility >= scoring::HOSTILITY_GUIDED_THRESHOLD {
        complexity = complexity.max(hostility);
        let mut folded = vec!["Hostile Bot Defense Detected".to_string()];
        folded.extend(hostility_reasons);
        folded.dedup();
        complexity_reasons.extend(folded);
        profile.access_recommendation = Some(AccessRecommendation::Guided);
    } else {
        complexity += hostility;
        complexity_reasons.extend(hostility_reasons);
        profile.access_recommendation = Some(AccessRecommendation::Automatic);
    }

    profile.complexity_score = complexity;
    profile.hostility_score = hostility;
    profile.complexity_reasons = complexity_reasons;
}

fn is_known_auth_heavy_host(url: &str) -> bool {
    let lower = url.to_lowercase();
    scoring::KNOWN_AUTH_HEAVY_HOSTS.iter().any(|host| lower.contains(host))
}

/// Classify a bot-defense cookie name as a vendor signal, if recognized.
pub fn classify_bot_defense_cookie(name: &str) -> bool {
    let lower = name.to_lowercase();
    scoring::BOT_DEFENSE_COOKIES.iter().any(|c| lower == *c)
}

/// Classify a script source URL as a bot-defense vendor signal, if recognized.
pub fn classify_bot_defense_script(src: &str) -> bool {
    let lower = src.to_lowercase();
    scoring::BOT_DEFENSE_SCRIPT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SigninSignals, StructuralSignals, TechStack};

    #[test]
    fn hostility_boundary_39_is_automatic() {
        let mut profile = ScanProfile::new("https://example.com");
        profile.hostility_score = 39;
        assert_eq!(
            if profile.hostility_score >= scoring::HOSTILITY_GUIDED_THRESHOLD {
                AccessRecommendation::Guided
            } else {
                AccessRecommendation::Automatic
            },
            AccessRecommendation::Automatic
        );
        // login_button alone scores 20, well under the fold threshold, and
        // adds straight into hostility rather than replacing it.
        profile.signin_signals = SigninSignals { login_button: true, ..Default::default() };
        synthesize(&mut profile);
        assert_eq!(profile.hostility_score, scoring::LOGIN_BUTTON);
        assert_eq!(profile.access_recommendation, Some(AccessRecommendation::Automatic));
    }

    #[test]
    fn hostility_boundary_40_is_guided() {
        let mut profile = ScanProfile::new("https://example.com");
        profile.tech_stack = TechStack { bot_defense_vendors: vec!["cookie".to_string()], ..Default::default() };
        synthesize(&mut profile);
        assert_eq!(profile.hostility_score, scoring::VENDOR_COOKIE);
        assert!(profile.hostility_score >= scoring::HOSTILITY_GUIDED_THRESHOLD);
        assert_eq!(profile.access_recommendation, Some(AccessRecommendation::Guided));
    }

    #[test]
    fn complexity_never_falls_below_hostility() {
        // A page with only a vendor-defense cookie: hostility=50, zero
        // rendering-complexity signals. The invariant requires complexity to
        // be folded up to match, not left at zero.
        let mut profile = ScanProfile::new("https://example.com");
        profile.tech_stack = TechStack { bot_defense_vendors: vec!["cookie".to_string()], ..Default::default() };
        synthesize(&mut profile);
        assert!(profile.complexity_score >= profile.hostility_score);
        assert_eq!(profile.complexity_score, scoring::VENDOR_COOKIE);
    }

    #[test]
    fn captcha_and_cloudflare_score_complexity_not_hostility() {
        // A CAPTCHA alone is a rendering-complexity signal, not a hostility
        // one: zero hostility means access stays automatic even though
        // complexity alone is already above the guided threshold.
        let mut profile = ScanProfile::new("https://example.com");
        profile.tech_stack = TechStack { anti_bot: Some("captcha".to_string()), ..Default::default() };
        synthesize(&mut profile);
        assert_eq!(profile.complexity_score, scoring::CAPTCHA);
        assert_eq!(profile.hostility_score, 0);
        assert_eq!(profile.access_recommendation, Some(AccessRecommendation::Automatic));
    }

    #[test]
    fn honeypot_hidden_inputs_score_hostility() {
        let mut profile = ScanProfile::new("https://example.com");
        profile.structural_signals = StructuralSignals { hidden_input_count: 2, ..Default::default() };
        synthesize(&mut profile);
        assert_eq!(profile.hostility_score, scoring::HONEYPOT);
    }

    #[test]
    fn challenge_path_traffic_scores_hostility() {
        let mut profile = ScanProfile::new("https://example.com");
        profile.network_activity.challenge_path_seen = true;
        synthesize(&mut profile);
        assert_eq!(profile.hostility_score, scoring::CHALLENGE_TRAFFIC);
    }

    #[test]
    fn high_complexity_alone_does_not_force_guided() {
        // SPA framework + high mutation + scroll dependency: complexity well
        // past 40, zero hostility signals. Only hostility forces guided.
        let mut profile = ScanProfile::new("https://example.com");
        profile.tech_stack = TechStack { framework: Some("react".to_string()), ..Default::default() };
        profile.mutation_stats.rate_per_sec = 5.0;
        profile.scroll_dependency.detected = true;
        synthesize(&mut profile);
        assert!(profile.complexity_score >= 40);
        assert_eq!(profile.hostility_score, 0);
        assert_eq!(profile.access_recommendation, Some(AccessRecommendation::Automatic));
    }

    #[test]
    fn strong_signin_surface_folds_into_hostility_by_max() {
        // auth_prompt_text (40) + auth_overlay (35) = 75, well over the fold
        // threshold: hostility takes the max rather than summing on top of
        // whatever else was already accumulated.
        let mut profile = ScanProfile::new("https://example.com");
        profile.signin_signals =
            SigninSignals { auth_prompt_text: true, auth_overlay: true, ..Default::default() };
        synthesize(&mut profile);
        assert_eq!(profile.hostility_score, scoring::AUTH_PROMPT_TEXT + scoring::AUTH_OVERLAY);
        assert_eq!(profile.access_recommendation, Some(AccessRecommendation::Guided));
    }

    #[test]
    fn weak_signin_surface_adds_into_hostility() {
        // login_button alone (20) is under the fold threshold: it adds
        // straight into hostility instead of replacing it.
        let mut profile = ScanProfile::new("https://example.com");
        profile.tech_stack = TechStack { bot_defense_vendors: vec!["script".to_string()], ..Default::default() };
        profile.signin_signals = SigninSignals { login_button: true, ..Default::default() };
        synthesize(&mut profile);
        assert_eq!(profile.hostility_score, scoring::VENDOR_SCRIPT + scoring::LOGIN_BUTTON);
    }

    #[test]
    fn known_auth_heavy_host_detected() {
        assert!(is_known_auth_heavy_host("https://www.linkedin.com/in/someone"));
        assert!(!is_known_auth_heavy_host("https://example.com/product/1"));
    }

    #[test]
    fn bot_defense_cookie_classification() {
        assert!(classify_bot_defense_cookie("cf_clearance"));
        assert!(!classify_bot_defense_cookie("session_id"));
    }
}
