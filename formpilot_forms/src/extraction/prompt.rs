//! Extraction request text.

use formpilot_core::FieldSpec;
use serde_json::{Map, Value};
use std::fmt::Write;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are an expert at extracting relevant information \
from JSON data for PDF form filling. You only return valid JSON that matches the requested \
structure exactly.";

const PLACEHOLDER: &str = "string or null";

/// Shape the engine must answer with: scalar keys map to a placeholder,
/// group keys to an object of their requested children.
#[must_use]
pub fn output_example(spec: &FieldSpec) -> Value {
    let layout = spec.layout();
    let mut shape = Map::new();

    for key in layout.scalars {
        shape.insert(key, Value::String(PLACEHOLDER.to_string()));
    }
    for (group, children) in layout.groups {
        let members = children
            .into_iter()
            .map(|child| (child, Value::String(PLACEHOLDER.to_string())))
            .collect();
        shape.insert(group, Value::Object(members));
    }

    Value::Object(shape)
}

/// User prompt carrying the sanitized memory, the numbered field list and
/// the output shape.
#[must_use]
pub fn build_extraction_prompt(sanitized: &Value, spec: &FieldSpec) -> String {
    let mut fields = String::new();
    for (i, entry) in spec.entries().iter().enumerate() {
        let _ = writeln!(fields, "{}. {} - {}", i + 1, entry.key, entry.description);
    }

    let example = serde_json::to_string_pretty(&output_example(spec)).unwrap_or_default();

    format!(
        "I have customer data in JSON format, and I need to extract specific fields for a PDF form.\n\
         \n\
         Here's the JSON data:\n\
         ```json\n\
         {sanitized}\n\
         ```\n\
         \n\
         I need you to find these values:\n\
         {fields}\n\
         Some important notes:\n\
         - Only extract values that actually exist in the data, never make anything up\n\
         - If you can't find a value, use null\n\
         - Reason about which source fields fit each target best\n\
         - The data structure differs between companies; values may be nested under \
         company.json.company or elsewhere\n\
         \n\
         Your response should be ONLY a JSON object with this structure:\n\
         {example}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use formpilot_core::SchemaRegistry;
    use serde_json::json;

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn example_groups_by_prefix() {
        let registry = SchemaRegistry::new();
        let spec = FieldSpec::new(
            &registry,
            [
                ("carrier", "carrier"),
                ("county.city", "city"),
                ("county.state", "state"),
            ],
        )
        .expect("valid spec");

        assert_eq!(
            output_example(&spec),
            json!({
                "carrier": "string or null",
                "county": {"city": "string or null", "state": "string or null"}
            })
        );
    }

    #[test]
    fn prompt_numbers_fields_and_embeds_data() {
        let registry = SchemaRegistry::new();
        let spec = registry.default_field_spec();
        let prompt = build_extraction_prompt(&json!({"company": {"company_name": "Acme"}}), &spec);

        assert!(prompt.contains("1. billingPlanForPolicyIsDirect - "));
        assert!(prompt.contains(&format!("{}. ", spec.len())));
        assert!(prompt.contains("\"company_name\":\"Acme\""));
        assert!(prompt.contains("\"premisesZipcode\": {"));
        assert!(!prompt.contains("deductible"));
    }
}
