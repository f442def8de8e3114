//! The narrow parsing ladder agents use on top of whatever the LLM provider
//! itself recovered. Deliberately simpler than `ai::validation::JsonRepairer`
//! — no trailing-comma or truncated-string repair, just the fallback order a
//! well-behaved model's deviations actually take: fenced, then bracketed,
//! then raw, then give up to an empty object rather than fail the run.

use serde_json::Value;

/// Fenced code block (```json ... ``` or ``` ... ```) -> first `{` to last
/// `}` -> the whole string -> `{}`. Never errors; an unparseable reply
/// degrades to an empty object so a single bad agent turn does not abort
/// the workflow.
pub fn narrow_json_extract(raw: &str) -> Value {
    let trimmed = raw.trim();

    if let Some(fenced) = extract_fenced(trimmed)
        && let Ok(value) = serde_json::from_str(&fenced)
    {
        return value;
    }

    if let Some(spanned) = extract_brace_span(trimmed)
        && let Ok(value) = serde_json::from_str(spanned)
    {
        return value;
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return value;
    }

    serde_json::json!({})
}

fn extract_fenced(s: &str) -> Option<String> {
    let start = s.find("```")?;
    let after_open = &s[start + 3..];
    let after_open = after_open.strip_prefix("json").unwrap_or(after_open);
    let after_open = after_open.strip_prefix('\n').unwrap_or(after_open);
    let end = after_open.find("```")?;
    Some(after_open[..end].trim().to_string())
}

fn extract_brace_span(s: &str) -> Option<&str> {
    let first = s.find('{')?;
    let last = s.rfind('}')?;
    if last < first {
        return None;
    }
    Some(&s[first..=last])
}

/// Longest ```python fenced block -> first line that looks like top-level
/// Python (`import`/`from`/`class`/`def`) through the end -> the raw text.
pub fn extract_python_code(raw: &str) -> String {
    let trimmed = raw.trim();

    let fences = find_python_fences(trimmed);
    if let Some(longest) = fences.into_iter().max_by_key(|f| f.len()) {
        return longest;
    }

    for (i, line) in trimmed.lines().enumerate() {
        let l = line.trim_start();
        if l.starts_with("import ") || l.starts_with("from ") || l.starts_with("class ") || l.starts_with("def ") {
            return trimmed.lines().skip(i).collect::<Vec<_>>().join("\n");
        }
    }

    trimmed.to_string()
}

fn find_python_fences(s: &str) -> Vec<String> {
    let mut fences = Vec::new();
    let mut rest = s;
    while let Some(start) = rest.find("```") {
        let after_open = &rest[start + 3..];
        let after_open = after_open.strip_prefix("python").or_else(|| after_open.strip_prefix("py")).unwrap_or(after_open);
        let after_open = after_open.strip_prefix('\n').unwrap_or(after_open);
        match after_open.find("```") {
            Some(end) => {
                fences.push(after_open[..end].trim().to_string());
                rest = &after_open[end + 3..];
            }
            None => break,
        }
    }
    fences
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_json_boundary_case() {
        let raw = "```json\n{}\n```";
        assert_eq!(narrow_json_extract(raw), json!({}));
    }

    #[test]
    fn fenced_json_with_content() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(narrow_json_extract(raw), json!({"a": 1}));
    }

    #[test]
    fn brace_span_with_surrounding_prose() {
        let raw = "Sure, here you go:\n{\"a\": 1}\nHope that helps.";
        assert_eq!(narrow_json_extract(raw), json!({"a": 1}));
    }

    #[test]
    fn unparseable_degrades_to_empty_object() {
        assert_eq!(narrow_json_extract("not json at all"), json!({}));
    }

    #[test]
    fn python_extraction_prefers_longest_fence() {
        let raw = "```python\nimport os\n```\nand also\n```python\nimport sys\nimport os\nclass X: pass\n```";
        let code = extract_python_code(raw);
        assert!(code.contains("class X"));
    }

    #[test]
    fn python_extraction_falls_back_to_import_line() {
        let raw = "Explanation text.\nimport requests\n\ndef run():\n    pass";
        let code = extract_python_code(raw);
        assert!(code.starts_with("import requests"));
    }
}
