//! Removal of memory subtrees that must never reach extraction.

use serde_json::Value;

/// Top-level section holding raw call logs.
pub const PHONE_EVENTS_KEY: &str = "phone_events";
/// Section that owns the company profile.
pub const COMPANY_KEY: &str = "company";
/// Free-text markdown notes under the company section.
pub const NOTES_KEY: &str = "md";
/// Structured subtree under the company section.
pub const STRUCTURED_KEY: &str = "json";
/// Derived facts array under `company.json`.
pub const FACTS_KEY: &str = "facts";

/// Return a copy of `raw` without `phone_events`, `company.md` and
/// `company.json.facts`.
///
/// Missing paths are skipped, so the function is idempotent and safe to run
/// on memory that was already sanitized upstream.
#[must_use]
pub fn sanitize(raw: &Value) -> Value {
    let mut cleaned = raw.clone();

    let Some(root) = cleaned.as_object_mut() else {
        return cleaned;
    };

    root.remove(PHONE_EVENTS_KEY);

    if let Some(company) = root.get_mut(COMPANY_KEY).and_then(Value::as_object_mut) {
        company.remove(NOTES_KEY);

        if let Some(structured) = company
            .get_mut(STRUCTURED_KEY)
            .and_then(Value::as_object_mut)
        {
            structured.remove(FACTS_KEY);
        }
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "phone_events": [{"id": 1, "transcript": "call"}],
            "company": {
                "company_name": "Acme",
                "md": "# internal notes",
                "json": {
                    "facts": ["fact one", "fact two"],
                    "company": {"company_name": "Acme Nested"}
                }
            },
            "other": {"keep": true}
        })
    }

    #[test]
    fn removes_all_three_paths() {
        let cleaned = sanitize(&sample());

        assert!(cleaned.get("phone_events").is_none());
        assert!(cleaned["company"].get("md").is_none());
        assert!(cleaned["company"]["json"].get("facts").is_none());
        assert_eq!(cleaned["company"]["company_name"], "Acme");
        assert_eq!(
            cleaned["company"]["json"]["company"]["company_name"],
            "Acme Nested"
        );
        assert_eq!(cleaned["other"]["keep"], true);
    }

    #[test]
    fn input_is_not_mutated() {
        let raw = sample();
        let before = raw.clone();
        let _ = sanitize(&raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn idempotent() {
        let once = sanitize(&sample());
        let twice = sanitize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn absent_paths_are_noops() {
        let raw = json!({"company": {"company_name": "Acme"}});
        assert_eq!(sanitize(&raw), raw);

        let raw = json!({"company": "not an object", "phone_events": null});
        assert_eq!(sanitize(&raw), json!({"company": "not an object"}));

        let raw = json!({"company": {"json": ["array", "not", "object"]}});
        assert_eq!(sanitize(&raw), raw);
    }

    #[test]
    fn non_object_roots_pass_through() {
        assert_eq!(sanitize(&json!([1, 2, 3])), json!([1, 2, 3]));
        assert_eq!(sanitize(&Value::Null), Value::Null);
    }
}
