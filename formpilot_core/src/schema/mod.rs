//! The canonical form schema.
//!
//! Every form the system produces carries exactly the fields declared here.
//! Scalar fields hold a string, boolean or number; group fields hold a fixed
//! set of string children (a person name or a postal address).

mod fields;

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::form::{CanonicalForm, FormShapeError};

pub use fields::{CANONICAL_FIELDS, DEDUCTIBLE_FIELD};

/// Fixed sub-schema of a group field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Name,
    Address,
}

impl GroupKind {
    /// Child keys, in form order.
    #[must_use]
    pub const fn children(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["firstName", "mi", "lastName"],
            Self::Address => &["street1", "street2", "city", "state", "zip", "country"],
        }
    }

    /// Description of one child, phrased around the group's subject.
    #[must_use]
    pub fn describe_child(self, child: &str, subject: &str) -> String {
        let label = match (self, child) {
            (Self::Name, "firstName") => "The first name",
            (Self::Name, "mi") => "The middle initial",
            (Self::Name, "lastName") => "The last name",
            (Self::Address, "street1") => "Street address line 1",
            (Self::Address, "street2") => "Street address line 2",
            (Self::Address, "city") => "City",
            (Self::Address, "state") => "State",
            (Self::Address, "zip") => "ZIP code",
            (Self::Address, "country") => "Country",
            _ => "Value",
        };
        match self {
            Self::Name => format!("{label} of {subject}"),
            Self::Address => format!("{label} for {subject}"),
        }
    }
}

/// Value type of a canonical field.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "group", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Boolean,
    Number,
    Group(GroupKind),
}

impl FieldKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Group(GroupKind::Name) => "name",
            Self::Group(GroupKind::Address) => "address",
        }
    }

    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(self, Self::Group(_))
    }
}

/// Value a field holds on a blank form.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    #[default]
    Null,
    EmptyText,
}

/// Declaration of one canonical field.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    /// What the field means, used to brief the reasoning engine. Fields
    /// without a description are never requested during extraction.
    pub description: Option<&'static str>,
    pub default: FieldDefault,
}

impl FieldSchema {
    #[must_use]
    pub const fn text(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Text, Some(description))
    }

    #[must_use]
    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Boolean, Some(description))
    }

    #[must_use]
    pub const fn number(name: &'static str, description: &'static str) -> Self {
        Self::new(name, FieldKind::Number, Some(description))
    }

    /// Group field; `subject` completes child descriptions ("the premises").
    #[must_use]
    pub const fn group(name: &'static str, kind: GroupKind, subject: &'static str) -> Self {
        Self::new(name, FieldKind::Group(kind), Some(subject))
    }

    /// Field filled only by edits, never by extraction.
    #[must_use]
    pub const fn edit_only(name: &'static str, default: FieldDefault) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            description: None,
            default,
        }
    }

    const fn new(name: &'static str, kind: FieldKind, description: Option<&'static str>) -> Self {
        Self {
            name,
            kind,
            description,
            default: FieldDefault::Null,
        }
    }

    #[must_use]
    pub const fn is_extracted(&self) -> bool {
        self.description.is_some()
    }
}

/// One dotted key requested from the reasoning engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRequest {
    pub key: String,
    pub description: String,
}

/// The set of keys an extraction asks for, with their descriptions.
///
/// Group children use dotted keys (`premisesZipcode.city`); the request is
/// grouped by the prefix before the first `.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    entries: Vec<FieldRequest>,
}

/// Output shape of a [`FieldSpec`]: scalar keys plus group keys with their
/// requested children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecLayout {
    pub scalars: Vec<String>,
    pub groups: BTreeMap<String, Vec<String>>,
}

impl FieldSpec {
    /// Build a spec from `(dotted key, description)` pairs.
    ///
    /// # Errors
    /// Fails with [`FormShapeError::UnknownField`] when a key does not name a
    /// registry field or group child, and with [`FormShapeError::WrongType`]
    /// when a dotted key targets a scalar or a bare key targets a group.
    pub fn new<K, D>(
        registry: &SchemaRegistry,
        entries: impl IntoIterator<Item = (K, D)>,
    ) -> Result<Self, FormShapeError>
    where
        K: Into<String>,
        D: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, description)| FieldRequest {
                key: key.into(),
                description: description.into(),
            })
            .collect::<Vec<_>>();

        for entry in &entries {
            registry.check_request_key(&entry.key)?;
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn entries(&self) -> &[FieldRequest] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Group dotted keys under their parent.
    #[must_use]
    pub fn layout(&self) -> SpecLayout {
        let mut layout = SpecLayout::default();
        for entry in &self.entries {
            if let Some((parent, child)) = entry.key.split_once('.') {
                let children = layout.groups.entry(parent.to_string()).or_default();
                if !children.iter().any(|c| c == child) {
                    children.push(child.to_string());
                }
            } else if !layout.scalars.contains(&entry.key) {
                layout.scalars.push(entry.key.clone());
            }
        }
        layout
    }
}

/// Registry over a static field table.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    fields: &'static [FieldSchema],
    index: HashMap<&'static str, usize>,
}

impl SchemaRegistry {
    /// Registry over the canonical application form.
    #[must_use]
    pub fn new() -> Self {
        Self::from_fields(CANONICAL_FIELDS)
    }

    /// Registry over a custom table. Later duplicates shadow earlier ones.
    #[must_use]
    pub fn from_fields(fields: &'static [FieldSchema]) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name, i))
            .collect();
        Self { fields, index }
    }

    #[must_use]
    pub const fn fields(&self) -> &'static [FieldSchema] {
        self.fields
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Top-level field names in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Every addressable key: scalar names plus dotted group children.
    #[must_use]
    pub fn dotted_keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            match field.kind {
                FieldKind::Group(group) => keys.extend(
                    group
                        .children()
                        .iter()
                        .map(|child| format!("{}.{child}", field.name)),
                ),
                _ => keys.push(field.name.to_string()),
            }
        }
        keys
    }

    /// A form with every field at its default.
    #[must_use]
    pub fn blank_form(&self) -> CanonicalForm {
        CanonicalForm::blank(self)
    }

    /// Extraction request covering every described field.
    #[must_use]
    pub fn default_field_spec(&self) -> FieldSpec {
        let mut entries = Vec::new();
        for field in self.fields {
            let Some(description) = field.description else {
                continue;
            };
            match field.kind {
                FieldKind::Group(group) => {
                    for child in group.children() {
                        entries.push(FieldRequest {
                            key: format!("{}.{child}", field.name),
                            description: group.describe_child(child, description),
                        });
                    }
                }
                _ => entries.push(FieldRequest {
                    key: field.name.to_string(),
                    description: description.to_string(),
                }),
            }
        }
        FieldSpec { entries }
    }

    fn check_request_key(&self, key: &str) -> Result<(), FormShapeError> {
        match key.split_once('.') {
            Some((parent, child)) => {
                let field = self
                    .get(parent)
                    .ok_or_else(|| FormShapeError::UnknownField(key.to_string()))?;
                let FieldKind::Group(group) = field.kind else {
                    return Err(FormShapeError::WrongType {
                        key: parent.to_string(),
                        expected: field.kind.as_str(),
                        found: "group child".to_string(),
                    });
                };
                if group.children().contains(&child) {
                    Ok(())
                } else {
                    Err(FormShapeError::UnknownField(key.to_string()))
                }
            }
            None => {
                let field = self
                    .get(key)
                    .ok_or_else(|| FormShapeError::UnknownField(key.to_string()))?;
                if field.kind.is_group() {
                    return Err(FormShapeError::WrongType {
                        key: key.to_string(),
                        expected: field.kind.as_str(),
                        found: "scalar".to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
