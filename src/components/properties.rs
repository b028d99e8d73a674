//! Flattened properties
//!
//! A property is one distinct element or attribute name reachable in a
//! type's content, with its cardinality and value-constraint status merged
//! across every branch of the content model where it can occur.

use crate::namespaces::QName;
use std::fmt;

use super::particles::Occurs;
use super::types::TypeId;

/// Whether a boolean trait holds across all occurrences of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyFlag {
    /// Absent on every occurrence
    #[default]
    Never,
    /// Present on every occurrence
    Consistently,
    /// Branches disagree
    Variable,
}

impl PropertyFlag {
    /// Flag for a single occurrence
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::Consistently
        } else {
            Self::Never
        }
    }

    /// Merge the flags of two occurrences of the same name
    pub fn merge(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::Variable
        }
    }
}

impl fmt::Display for PropertyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => write!(f, "never"),
            Self::Consistently => write!(f, "consistently"),
            Self::Variable => write!(f, "variable"),
        }
    }
}

/// One flattened element or attribute property of a type
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaProperty {
    /// Property name
    pub name: QName,
    /// Whether this is an attribute property
    pub is_attribute: bool,
    /// Value type (common base when occurrences disagree)
    pub type_id: TypeId,
    /// Type that owns the property
    pub container_type: TypeId,
    /// Minimum total occurrences
    pub min_occurs: u32,
    /// Maximum total occurrences (None = unbounded)
    pub max_occurs: Option<u32>,
    /// Nillable status
    pub nillable: PropertyFlag,
    /// Default value status
    pub has_default: PropertyFlag,
    /// Fixed value status
    pub has_fixed: PropertyFlag,
    /// Default or fixed text, when every occurrence agrees
    pub default_text: Option<String>,
}

impl SchemaProperty {
    /// Element property with a single required occurrence
    pub fn element(name: QName, type_id: TypeId, container_type: TypeId) -> Self {
        Self {
            name,
            is_attribute: false,
            type_id,
            container_type,
            min_occurs: 1,
            max_occurs: Some(1),
            nillable: PropertyFlag::Never,
            has_default: PropertyFlag::Never,
            has_fixed: PropertyFlag::Never,
            default_text: None,
        }
    }

    /// Attribute property
    pub fn attribute(name: QName, type_id: TypeId, container_type: TypeId, required: bool) -> Self {
        Self {
            name,
            is_attribute: true,
            type_id,
            container_type,
            min_occurs: u32::from(required),
            max_occurs: Some(1),
            nillable: PropertyFlag::Never,
            has_default: PropertyFlag::Never,
            has_fixed: PropertyFlag::Never,
            default_text: None,
        }
    }

    /// Occurrence range
    pub fn occurs(&self) -> Occurs {
        Occurs::new(self.min_occurs, self.max_occurs)
    }

    /// Replace the occurrence range
    pub fn set_occurs(&mut self, occurs: Occurs) {
        self.min_occurs = occurs.min;
        self.max_occurs = occurs.max;
    }

    /// Whether more than one occurrence is possible
    pub fn is_multiple(&self) -> bool {
        self.occurs().is_repeating()
    }

    /// Whether the property may be absent
    pub fn is_optional(&self) -> bool {
        self.min_occurs == 0
    }
}
