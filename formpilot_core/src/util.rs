//! Helpers for reading engine output and labelling snapshots.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::IgnoredAny;
use serde_json::Value;
use sha2::{Digest, Sha256};

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)(?:```|\z)").expect("fence pattern compiles")
});

/// Strip a Markdown code fence around engine output.
///
/// Text that already parses as JSON is only trimmed, so backticks inside
/// string values survive. Otherwise returns the body of the first fenced
/// block, or the trimmed input when no fence is present. An unterminated
/// fence yields everything after it.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    if serde_json::from_str::<IgnoredAny>(trimmed).is_ok() {
        return trimmed;
    }
    CODE_FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim(), |body| body.as_str().trim())
}

/// Hex SHA-256 digest of a JSON value's compact serialization.
///
/// Object keys serialize in sorted order, so equal values always produce the
/// same digest.
#[must_use]
pub fn content_digest(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_is_trimmed() {
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn json_fence_is_removed() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn bare_fence_is_removed() {
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn backticks_inside_plain_json_are_kept() {
        let text = r#"{"descriptionOfPrimaryOperations": "runs ```make``` builds"}"#;
        assert_eq!(strip_code_fences(text), text);
        assert_eq!(strip_code_fences(&format!("\n{text}\n")), text);
    }

    #[test]
    fn fenced_json_is_still_unwrapped() {
        let text = "```json\n{\"a\": \"b\"}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": \"b\"}");
    }

    #[test]
    fn unterminated_fence_keeps_tail() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        let a = content_digest(&json!({"b": 2, "a": 1}));
        let b = content_digest(&json!({"a": 1, "b": 2}));
        let c = content_digest(&json!({"a": 1, "b": 3}));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
