use async_trait::async_trait;
use formpilot_core::{CanonicalForm, FieldSpec, SchemaRegistry, sanitize};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

use super::FieldExtractor;
use crate::error::ExtractionFailure;

/// One memory key and the canonical fields it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRule {
    pub source: &'static str,
    pub targets: &'static [&'static str],
}

impl KeyRule {
    #[must_use]
    pub const fn new(source: &'static str, targets: &'static [&'static str]) -> Self {
        Self { source, targets }
    }
}

/// Memory keys commonly written by the company memory workflows.
#[must_use]
pub fn default_rules() -> Vec<KeyRule> {
    vec![
        KeyRule::new("company_name", &["applicantName"]),
        KeyRule::new(
            "company_primary_email",
            &["contactInformationPrimary1", "applicantEmailAddress"],
        ),
        KeyRule::new("company_secondary_email", &["contactInformationSecondary1"]),
        KeyRule::new("company_annual_revenue_usd", &["annualRevenues"]),
        KeyRule::new("company_primary_phone", &["applicantPhoneNumber"]),
        KeyRule::new("company_phone", &["applicantPhoneNumber"]),
        KeyRule::new("company_website", &["websiteAddress.street1"]),
        KeyRule::new("company_description", &["descriptionOfPrimaryOperations"]),
        KeyRule::new("company_naics_code", &["naics1"]),
        KeyRule::new("company_sic_code", &["sic1"]),
        KeyRule::new("company_fein", &["feinOrSocSec1"]),
        KeyRule::new("company_full_time_employees", &["numberOfFullTimeEmployees"]),
        KeyRule::new("company_part_time_employees", &["partTimeEmployeesNumber"]),
        KeyRule::new("company_state", &["premisesState"]),
        KeyRule::new("company_contact_name", &["applicantContactName"]),
    ]
}

/// Deterministic extraction from well-known memory keys.
///
/// Each rule's source key is looked up breadth-first at any depth; the
/// shallowest scalar occurrence wins. Targets with no source value, or whose
/// value does not coerce to the field's kind, stay null.
pub struct KeyPathExtractor {
    registry: Arc<SchemaRegistry>,
    rules: Vec<KeyRule>,
}

impl KeyPathExtractor {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self::with_rules(registry, default_rules())
    }

    pub const fn with_rules(registry: Arc<SchemaRegistry>, rules: Vec<KeyRule>) -> Self {
        Self { registry, rules }
    }
}

/// Shallowest scalar value stored under `key`.
fn find_scalar<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        let Value::Object(object) = node else {
            continue;
        };
        if let Some(value) = object.get(key) {
            if matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) {
                return Some(value);
            }
        }
        queue.extend(object.values().filter(|v| v.is_object()));
    }
    None
}

#[async_trait]
impl FieldExtractor for KeyPathExtractor {
    async fn extract(
        &self,
        raw: &Value,
        spec: &FieldSpec,
    ) -> Result<CanonicalForm, ExtractionFailure> {
        let sanitized = sanitize(raw);
        let requested: HashSet<&str> = spec.entries().iter().map(|e| e.key.as_str()).collect();
        let mut form = self.registry.blank_form();
        let mut filled = HashSet::new();

        for rule in &self.rules {
            let Some(value) = find_scalar(&sanitized, rule.source) else {
                continue;
            };
            for target in rule.targets {
                if !requested.contains(target) || filled.contains(target) {
                    continue;
                }
                match form.set(&self.registry, target, value) {
                    Ok(()) => {
                        filled.insert(*target);
                    }
                    Err(e) => debug!("Skipping {} for {target}: {e}", rule.source),
                }
            }
        }

        info!(
            "Key-path extraction filled {} of {} requested fields",
            filled.len(),
            spec.len()
        );
        Ok(form)
    }

    fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }
}
