//! Mapping raw company memory onto the canonical form.
//!
//! Two strategies share the same contract: [`ReasoningExtractor`] asks the
//! reasoning engine, [`KeyPathExtractor`] follows a fixed table of well-known
//! memory keys. Both sanitize first and both return a form with exactly the
//! registry's key set.

mod key_path;
pub mod prompt;
mod reasoning;

use async_trait::async_trait;
use formpilot_core::{CanonicalForm, FieldKind, FieldSpec, SchemaRegistry};
use serde_json::Value;
use tracing::debug;

use crate::error::ExtractionFailure;

pub use key_path::{KeyPathExtractor, KeyRule, default_rules};
pub use reasoning::ReasoningExtractor;

#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Extract the fields named by `spec` from raw memory.
    async fn extract(&self, raw: &Value, spec: &FieldSpec)
    -> Result<CanonicalForm, ExtractionFailure>;

    fn registry(&self) -> &SchemaRegistry;

    /// Extract every described registry field.
    async fn extract_all(&self, raw: &Value) -> Result<CanonicalForm, ExtractionFailure> {
        let spec = self.registry().default_field_spec();
        self.extract(raw, &spec).await
    }
}

/// Validate an engine response against `spec` and build the form.
///
/// Every requested scalar key and group child must be present. Groups must
/// be objects whose keys are all children of the group's sub-schema. Fields
/// not in `spec` keep their registry default. Unrequested top-level keys in
/// the response are ignored.
pub fn assemble(
    registry: &SchemaRegistry,
    spec: &FieldSpec,
    response: &Value,
) -> Result<CanonicalForm, ExtractionFailure> {
    let object = response.as_object().ok_or_else(|| {
        ExtractionFailure::MalformedOutput("response is not a JSON object".to_string())
    })?;

    let layout = spec.layout();
    let mut form = registry.blank_form();

    for key in &layout.scalars {
        let value = object
            .get(key)
            .ok_or_else(|| ExtractionFailure::Incomplete { key: key.clone() })?;
        form.set(registry, key, value)
            .map_err(|e| ExtractionFailure::MalformedOutput(e.to_string()))?;
    }

    for (group, children) in &layout.groups {
        let value = object.get(group).ok_or_else(|| ExtractionFailure::Incomplete {
            key: group.clone(),
        })?;
        let Value::Object(members) = value else {
            return Err(ExtractionFailure::MalformedOutput(format!(
                "expected '{group}' to be an object"
            )));
        };

        let declared = registry
            .get(group)
            .map(|field| field.kind)
            .and_then(|kind| match kind {
                FieldKind::Group(g) => Some(g.children()),
                _ => None,
            })
            .unwrap_or_default();
        if let Some(extra) = members.keys().find(|k| !declared.contains(&k.as_str())) {
            return Err(ExtractionFailure::MalformedOutput(format!(
                "unexpected key: {group}.{extra}"
            )));
        }

        for child in children {
            let dotted = format!("{group}.{child}");
            let value = members
                .get(child)
                .ok_or_else(|| ExtractionFailure::Incomplete {
                    key: dotted.clone(),
                })?;
            form.set(registry, &dotted, value)
                .map_err(|e| ExtractionFailure::MalformedOutput(e.to_string()))?;
        }
    }

    let ignored = object
        .keys()
        .filter(|k| !layout.scalars.contains(*k) && !layout.groups.contains_key(*k))
        .count();
    if ignored > 0 {
        debug!("Ignored {ignored} unrequested keys in extraction output");
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
    }

    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn small_spec(registry: &SchemaRegistry) -> FieldSpec {
        FieldSpec::new(
            registry,
            [
                ("applicantName", "name"),
                ("annualRevenues", "revenue"),
                ("premisesZipcode.city", "city"),
                ("premisesZipcode.zip", "zip"),
            ],
        )
        .expect("valid spec")
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn complete_response_builds_full_form() {
        let registry = registry();
        let spec = small_spec(&registry);
        let response = json!({
            "applicantName": "Acme",
            "annualRevenues": 500_000,
            "premisesZipcode": {"city": "Austin", "zip": null}
        });

        let form = assemble(&registry, &spec, &response).expect("valid response");

        assert_eq!(form.len(), registry.len());
        assert_eq!(form.text("applicantName"), Some("Acme"));
        assert_eq!(form.text("annualRevenues"), Some("500000"));
        assert_eq!(form.child("premisesZipcode", "city"), Some("Austin"));
        assert_eq!(form.get("carrier"), Some(&Value::Null));
        assert_eq!(form.text("deductible"), Some(""));
    }

    #[test]
    fn missing_scalar_reports_key() {
        let registry = registry();
        let spec = small_spec(&registry);
        let response = json!({
            "applicantName": "Acme",
            "premisesZipcode": {"city": null, "zip": null}
        });

        assert_eq!(
            assemble(&registry, &spec, &response),
            Err(ExtractionFailure::Incomplete {
                key: "annualRevenues".to_string()
            })
        );
    }

    #[test]
    fn missing_child_reports_dotted_key() {
        let registry = registry();
        let spec = small_spec(&registry);
        let response = json!({
            "applicantName": null,
            "annualRevenues": null,
            "premisesZipcode": {"city": null}
        });

        assert_eq!(
            assemble(&registry, &spec, &response),
            Err(ExtractionFailure::Incomplete {
                key: "premisesZipcode.zip".to_string()
            })
        );
    }

    #[test]
    fn group_must_be_object_with_declared_children() {
        let registry = registry();
        let spec = small_spec(&registry);

        let flat = json!({
            "applicantName": null,
            "annualRevenues": null,
            "premisesZipcode": "Austin"
        });
        assert!(matches!(
            assemble(&registry, &spec, &flat),
            Err(ExtractionFailure::MalformedOutput(_))
        ));

        let extra = json!({
            "applicantName": null,
            "annualRevenues": null,
            "premisesZipcode": {"city": null, "zip": null, "planet": "earth"}
        });
        assert!(matches!(
            assemble(&registry, &spec, &extra),
            Err(ExtractionFailure::MalformedOutput(_))
        ));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn wrong_type_is_malformed() {
        let registry = registry();
        let spec = FieldSpec::new(&registry, [("applicantIsLLC", "llc")]).expect("valid spec");
        let response = json!({"applicantIsLLC": "perhaps"});
        assert!(matches!(
            assemble(&registry, &spec, &response),
            Err(ExtractionFailure::MalformedOutput(_))
        ));
    }

    #[test]
    fn non_object_response_is_malformed() {
        let registry = registry();
        let spec = small_spec(&registry);
        assert!(matches!(
            assemble(&registry, &spec, &json!([1, 2])),
            Err(ExtractionFailure::MalformedOutput(_))
        ));
    }
}
