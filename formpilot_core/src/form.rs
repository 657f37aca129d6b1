//! The normalized form record.
//!
//! A [`CanonicalForm`] can only be built through the schema registry, so its
//! key set always equals the registry's declared key set, recursively. Values
//! are coerced to the declared kind on the way in; `null` is kept as `null`.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::schema::{FieldDefault, FieldKind, SchemaRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormShapeError {
    #[error("form must be a JSON object")]
    NotAnObject,

    #[error("missing key: {0}")]
    MissingKey(String),

    #[error("unexpected key: {0}")]
    UnexpectedKey(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid value for '{key}': expected {expected}, got {found}")]
    WrongType {
        key: String,
        expected: &'static str,
        found: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalForm {
    fields: Map<String, Value>,
}

impl CanonicalForm {
    pub(crate) fn blank(registry: &SchemaRegistry) -> Self {
        let mut fields = Map::new();
        for field in registry.fields() {
            let value = match field.kind {
                FieldKind::Group(group) => Value::Object(
                    group
                        .children()
                        .iter()
                        .map(|child| ((*child).to_string(), Value::Null))
                        .collect(),
                ),
                _ => match field.default {
                    FieldDefault::Null => Value::Null,
                    FieldDefault::EmptyText => Value::String(String::new()),
                },
            };
            fields.insert(field.name.to_string(), value);
        }
        Self { fields }
    }

    /// Validate and coerce a complete form.
    ///
    /// The object must carry every registry field and nothing else; group
    /// fields must be objects with exactly their declared children.
    pub fn from_json(value: &Value, registry: &SchemaRegistry) -> Result<Self, FormShapeError> {
        let object = value.as_object().ok_or(FormShapeError::NotAnObject)?;

        if let Some(extra) = object.keys().find(|key| !registry.contains(key)) {
            return Err(FormShapeError::UnexpectedKey(extra.clone()));
        }

        let mut fields = Map::new();
        for field in registry.fields() {
            let raw = object
                .get(field.name)
                .ok_or_else(|| FormShapeError::MissingKey(field.name.to_string()))?;
            fields.insert(field.name.to_string(), coerce(field.kind, field.name, raw)?);
        }
        Ok(Self { fields })
    }

    /// Field value by top-level name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Text value of a scalar field, `None` for null or non-text fields.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Value::as_bool)
    }

    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// Child of a group field (`child("premisesZipcode", "city")`).
    #[must_use]
    pub fn child(&self, group: &str, child: &str) -> Option<&str> {
        self.fields
            .get(group)
            .and_then(|g| g.get(child))
            .and_then(Value::as_str)
    }

    /// Set one field or group child (dotted key), coercing to its kind.
    pub fn set(
        &mut self,
        registry: &SchemaRegistry,
        key: &str,
        value: &Value,
    ) -> Result<(), FormShapeError> {
        match key.split_once('.') {
            Some((parent, child)) => {
                let field = registry
                    .get(parent)
                    .ok_or_else(|| FormShapeError::UnknownField(key.to_string()))?;
                let FieldKind::Group(group) = field.kind else {
                    return Err(FormShapeError::UnknownField(key.to_string()));
                };
                if !group.children().contains(&child) {
                    return Err(FormShapeError::UnknownField(key.to_string()));
                }
                let coerced = coerce(FieldKind::Text, key, value)?;
                if let Some(Value::Object(children)) = self.fields.get_mut(parent) {
                    children.insert(child.to_string(), coerced);
                }
                Ok(())
            }
            None => {
                let field = registry
                    .get(key)
                    .ok_or_else(|| FormShapeError::UnknownField(key.to_string()))?;
                let coerced = coerce(field.kind, key, value)?;
                self.fields.insert(key.to_string(), coerced);
                Ok(())
            }
        }
    }

    /// Top-level keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Copy for display: nulls become `""` (text, numbers, group children)
    /// or `false` (booleans).
    ///
    /// This is the only place nulls are replaced; the stored form keeps them.
    #[must_use]
    pub fn with_display_defaults(&self, registry: &SchemaRegistry) -> Value {
        let mut out = Map::new();
        for (key, value) in &self.fields {
            let kind = registry.get(key).map_or(FieldKind::Text, |f| f.kind);
            let shown = match (kind, value) {
                (FieldKind::Boolean, Value::Null) => Value::Bool(false),
                (FieldKind::Group(_), Value::Object(children)) => Value::Object(
                    children
                        .iter()
                        .map(|(child, v)| {
                            let v = if v.is_null() {
                                Value::String(String::new())
                            } else {
                                v.clone()
                            };
                            (child.clone(), v)
                        })
                        .collect(),
                ),
                (_, Value::Null) => Value::String(String::new()),
                (_, v) => v.clone(),
            };
            out.insert(key.clone(), shown);
        }
        Value::Object(out)
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("'{s}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn wrong_type(key: &str, expected: &'static str, value: &Value) -> FormShapeError {
    FormShapeError::WrongType {
        key: key.to_string(),
        expected,
        found: describe(value),
    }
}

/// Coerce one raw value to `kind`.
///
/// Text accepts numbers and booleans (`500000` becomes `"500000"`). Booleans
/// accept yes/no style strings and 0/1. Numbers accept numeric strings with
/// currency symbols and thousands separators. Empty strings in boolean and
/// number slots read as null.
pub(crate) fn coerce(kind: FieldKind, key: &str, value: &Value) -> Result<Value, FormShapeError> {
    match kind {
        FieldKind::Text => match value {
            Value::Null | Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Array(_) | Value::Object(_) => Err(wrong_type(key, kind.as_str(), value)),
        },
        FieldKind::Boolean => match value {
            Value::Null | Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "" => Ok(Value::Null),
                "true" | "yes" | "y" | "x" | "1" | "checked" => Ok(Value::Bool(true)),
                "false" | "no" | "n" | "0" | "unchecked" => Ok(Value::Bool(false)),
                _ => Err(wrong_type(key, kind.as_str(), value)),
            },
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(wrong_type(key, kind.as_str(), value)),
            },
            Value::Array(_) | Value::Object(_) => Err(wrong_type(key, kind.as_str(), value)),
        },
        FieldKind::Number => match value {
            Value::Null | Value::Number(_) => Ok(value.clone()),
            Value::String(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !matches!(c, ',' | '$' | '_') && !c.is_whitespace())
                    .collect();
                if cleaned.is_empty() {
                    return Ok(Value::Null);
                }
                parse_number(&cleaned).ok_or_else(|| wrong_type(key, kind.as_str(), value))
            }
            Value::Bool(_) | Value::Array(_) | Value::Object(_) => {
                Err(wrong_type(key, kind.as_str(), value))
            }
        },
        FieldKind::Group(group) => {
            let children = value
                .as_object()
                .ok_or_else(|| wrong_type(key, kind.as_str(), value))?;
            if let Some(extra) = children
                .keys()
                .find(|child| !group.children().contains(&child.as_str()))
            {
                return Err(FormShapeError::UnexpectedKey(format!("{key}.{extra}")));
            }
            let mut out = Map::new();
            for child in group.children() {
                let dotted = format!("{key}.{child}");
                let raw = children
                    .get(*child)
                    .ok_or_else(|| FormShapeError::MissingKey(dotted.clone()))?;
                out.insert((*child).to_string(), coerce(FieldKind::Text, &dotted, raw)?);
            }
            Ok(Value::Object(out))
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DEDUCTIBLE_FIELD;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
    }

    #[test]
    fn blank_form_has_exact_key_set() {
        let registry = registry();
        let form = registry.blank_form();
        let keys: BTreeSet<_> = form.keys().collect();
        let declared: BTreeSet<_> = registry.field_names().into_iter().collect();
        assert_eq!(keys, declared);
        assert_eq!(form.child("county", "city"), None);
        assert_eq!(
            form.get("county").and_then(Value::as_object).map(Map::len),
            Some(6)
        );
        assert_eq!(form.text(DEDUCTIBLE_FIELD), Some(""));
        assert_eq!(form.get("agency"), Some(&Value::Null));
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn from_json_round_trips_blank_form() {
        let registry = registry();
        let blank = registry.blank_form();
        let parsed =
            CanonicalForm::from_json(&blank.to_json(), &registry).expect("blank form is valid");
        assert_eq!(parsed, blank);
    }

    #[test]
    fn from_json_rejects_missing_and_extra_keys() {
        let registry = registry();
        let mut json = registry.blank_form().to_json();
        json.as_object_mut().map(|o| o.remove("agency"));
        assert_eq!(
            CanonicalForm::from_json(&json, &registry),
            Err(FormShapeError::MissingKey("agency".to_string()))
        );

        let mut json = registry.blank_form().to_json();
        json.as_object_mut()
            .map(|o| o.insert("surprise".to_string(), json!(1)));
        assert_eq!(
            CanonicalForm::from_json(&json, &registry),
            Err(FormShapeError::UnexpectedKey("surprise".to_string()))
        );

        let mut json = registry.blank_form().to_json();
        json["county"]
            .as_object_mut()
            .map(|o| o.insert("planet".to_string(), json!("earth")));
        assert_eq!(
            CanonicalForm::from_json(&json, &registry),
            Err(FormShapeError::UnexpectedKey("county.planet".to_string()))
        );

        let mut json = registry.blank_form().to_json();
        json["county"].as_object_mut().map(|o| o.remove("zip"));
        assert_eq!(
            CanonicalForm::from_json(&json, &registry),
            Err(FormShapeError::MissingKey("county.zip".to_string()))
        );

        assert_eq!(
            CanonicalForm::from_json(&json!([]), &registry),
            Err(FormShapeError::NotAnObject)
        );
    }

    #[test]
    fn coercion_rules() {
        assert_eq!(
            coerce(FieldKind::Text, "k", &json!(500_000)),
            Ok(json!("500000"))
        );
        assert_eq!(coerce(FieldKind::Text, "k", &json!(true)), Ok(json!("true")));
        assert_eq!(coerce(FieldKind::Text, "k", &Value::Null), Ok(Value::Null));
        assert!(coerce(FieldKind::Text, "k", &json!({"a": 1})).is_err());

        assert_eq!(coerce(FieldKind::Boolean, "k", &json!("Yes")), Ok(json!(true)));
        assert_eq!(coerce(FieldKind::Boolean, "k", &json!("no")), Ok(json!(false)));
        assert_eq!(coerce(FieldKind::Boolean, "k", &json!(1)), Ok(json!(true)));
        assert_eq!(coerce(FieldKind::Boolean, "k", &json!("")), Ok(Value::Null));
        assert!(coerce(FieldKind::Boolean, "k", &json!("LLC")).is_err());

        assert_eq!(
            coerce(FieldKind::Number, "k", &json!("$1,250")),
            Ok(json!(1250))
        );
        assert_eq!(coerce(FieldKind::Number, "k", &json!("2.5")), Ok(json!(2.5)));
        assert_eq!(coerce(FieldKind::Number, "k", &json!(" ")), Ok(Value::Null));
        assert!(coerce(FieldKind::Number, "k", &json!("a dozen")).is_err());
        assert!(coerce(FieldKind::Number, "k", &json!(false)).is_err());
    }

    #[test]
    fn group_children_are_text_coerced() {
        let value = json!({
            "street1": "1 Main St", "street2": null, "city": "Springfield",
            "state": "IL", "zip": 62701, "country": "US"
        });
        let coerced = coerce(
            FieldKind::Group(crate::GroupKind::Address),
            "premisesZipcode",
            &value,
        );
        assert_eq!(coerced.map(|v| v["zip"].clone()), Ok(json!("62701")));
    }

    #[test]
    fn set_scalar_and_child() {
        let registry = registry();
        let mut form = registry.blank_form();

        assert!(form.set(&registry, "annualRevenues", &json!(42)).is_ok());
        assert_eq!(form.text("annualRevenues"), Some("42"));

        assert!(
            form.set(&registry, "premisesZipcode.city", &json!("Austin"))
                .is_ok()
        );
        assert_eq!(form.child("premisesZipcode", "city"), Some("Austin"));

        assert!(form.set(&registry, "nope", &json!(1)).is_err());
        assert!(form.set(&registry, "agency.city", &json!("x")).is_err());
        assert!(form.set(&registry, "county.planet", &json!("x")).is_err());
        assert_eq!(form.len(), registry.len());
    }

    #[test]
    fn display_defaults_fill_nulls_only() {
        let registry = registry();
        let mut form = registry.blank_form();
        let _ = form.set(&registry, "followsOsha", &json!(true));

        let shown = form.with_display_defaults(&registry);
        assert_eq!(shown["agency"], json!(""));
        assert_eq!(shown["hasBusinessAuto"], json!(false));
        assert_eq!(shown["followsOsha"], json!(true));
        assert_eq!(shown["county"]["city"], json!(""));
        assert_eq!(shown["numberOfFullTimeEmployees"], json!(""));
        // the stored form keeps its nulls
        assert_eq!(form.get("agency"), Some(&Value::Null));
    }
}
