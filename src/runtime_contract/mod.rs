//! Generated Scraper Runtime contract — the Rust-side mirror of the Python
//! `BaseScraper` support package CodeGen writes alongside each generated
//! scraper, plus the dedup-key derivation both sides must agree on.

use sha2::{Digest, Sha256};

/// The embedded runtime support module, written verbatim into every
/// generated project as `scraper_runtime.py` so the generated script can
/// `from scraper_runtime import BaseScraper`.
pub const RUNTIME_TEMPLATE: &str = include_str!("runtime_template.py");

/// Derive the dedup key for one scraped record: lowercase/trim each named
/// field's value, join with `|`, and SHA-256 the result. Both the Rust side
/// (for dataset post-processing) and the generated Python runtime (via the
/// template's own `dedup_key` function) must compute this identically.
pub fn dedup_key(field_values: &[&str]) -> String {
    let joined = field_values.iter().map(|v| v.trim().to_lowercase()).collect::<Vec<_>>().join("|");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_is_case_and_whitespace_insensitive() {
        let a = dedup_key(&["  Widget A ", "9.99"]);
        let b = dedup_key(&["widget a", "9.99"]);
        assert_eq!(a, b);
    }

    #[test]
    fn dedup_key_distinguishes_field_order() {
        let a = dedup_key(&["a", "b"]);
        let b = dedup_key(&["b", "a"]);
        assert_ne!(a, b);
    }

    #[test]
    fn runtime_template_declares_base_scraper() {
        assert!(RUNTIME_TEMPLATE.contains("class BaseScraper"));
        assert!(RUNTIME_TEMPLATE.contains("def smart_wait"));
        assert!(RUNTIME_TEMPLATE.contains("def scroll_down"));
        assert!(RUNTIME_TEMPLATE.contains("def dedup_key"));
    }
}
