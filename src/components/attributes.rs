//! Attribute models
//!
//! An attribute model is the set of attribute uses a complex type allows,
//! keyed by name, plus an optional attribute wildcard.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#cAttribute_Use

use crate::error::{Error, Result};
use crate::namespaces::QName;
use indexmap::IndexMap;

use super::types::TypeId;
use super::wildcards::Wildcard;

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeUse {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl AttributeUse {
    /// Parse from string value
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "optional" => Ok(AttributeUse::Optional),
            "required" => Ok(AttributeUse::Required),
            "prohibited" => Ok(AttributeUse::Prohibited),
            _ => Err(Error::Value(format!(
                "Invalid attribute use value: '{}'. Must be 'optional', 'required', or 'prohibited'",
                s
            ))),
        }
    }

    /// Get the use as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeUse::Optional => "optional",
            AttributeUse::Required => "required",
            AttributeUse::Prohibited => "prohibited",
        }
    }
}

impl std::fmt::Display for AttributeUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attribute use inside an attribute model
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAttributeUse {
    /// Attribute name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Use mode
    pub use_mode: AttributeUse,
    /// Default value text
    pub default_value: Option<String>,
    /// Fixed value text
    pub fixed_value: Option<String>,
}

impl SchemaAttributeUse {
    /// Create an optional use without value constraint
    pub fn new(name: QName, type_id: TypeId) -> Self {
        Self {
            name,
            type_id,
            use_mode: AttributeUse::Optional,
            default_value: None,
            fixed_value: None,
        }
    }

    /// Set the use mode
    pub fn with_use(mut self, use_mode: AttributeUse) -> Self {
        self.use_mode = use_mode;
        self
    }

    /// Whether the use is required
    pub fn is_required(&self) -> bool {
        self.use_mode == AttributeUse::Required
    }

    /// Whether the use is prohibited
    pub fn is_prohibited(&self) -> bool {
        self.use_mode == AttributeUse::Prohibited
    }

    /// Default or fixed value
    pub fn value_constraint(&self) -> Option<&str> {
        self.fixed_value.as_deref().or(self.default_value.as_deref())
    }
}

/// A global attribute declaration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaGlobalAttribute {
    /// Attribute name
    pub name: QName,
    /// Simple type of the value
    pub type_id: TypeId,
    /// Default value text
    pub default_value: Option<String>,
    /// Fixed value text
    pub fixed_value: Option<String>,
    /// Documentation text
    pub documentation: Vec<String>,
}

/// Attribute uses of a type plus its attribute wildcard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaAttributeModel {
    uses: IndexMap<QName, SchemaAttributeUse>,
    wildcard: Option<Wildcard>,
}

impl SchemaAttributeModel {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a use by name
    pub fn get(&self, name: &QName) -> Option<&SchemaAttributeUse> {
        self.uses.get(name)
    }

    /// Whether a use with this name exists
    pub fn contains(&self, name: &QName) -> bool {
        self.uses.contains_key(name)
    }

    /// Add a use; returns false (and leaves the model unchanged) if the
    /// name is already taken
    pub fn add(&mut self, attribute: SchemaAttributeUse) -> bool {
        if self.uses.contains_key(&attribute.name) {
            return false;
        }
        self.uses.insert(attribute.name.clone(), attribute);
        true
    }

    /// Add or replace a use, keeping its position if it existed
    pub fn set(&mut self, attribute: SchemaAttributeUse) {
        self.uses.insert(attribute.name.clone(), attribute);
    }

    /// Remove a use
    pub fn remove(&mut self, name: &QName) -> Option<SchemaAttributeUse> {
        self.uses.shift_remove(name)
    }

    /// Iterate uses in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &SchemaAttributeUse> {
        self.uses.values()
    }

    /// Names of required uses
    pub fn required_names(&self) -> impl Iterator<Item = &QName> {
        self.uses.values().filter(|u| u.is_required()).map(|u| &u.name)
    }

    /// Number of uses
    pub fn len(&self) -> usize {
        self.uses.len()
    }

    /// Whether there are no uses
    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }

    /// The attribute wildcard
    pub fn wildcard(&self) -> Option<&Wildcard> {
        self.wildcard.as_ref()
    }

    /// Replace the attribute wildcard
    pub fn set_wildcard(&mut self, wildcard: Option<Wildcard>) {
        self.wildcard = wildcard;
    }

    /// Whether an attribute with this name is allowed, by declaration or wildcard
    pub fn allows(&self, name: &QName) -> bool {
        match self.uses.get(name) {
            Some(u) => !u.is_prohibited(),
            None => self.wildcard.as_ref().map_or(false, |w| w.is_matching(name)),
        }
    }
}
