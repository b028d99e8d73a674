//! Global element declarations
//!
//! Every global element owns a document type and may head or join a
//! substitution group. Member lists are filled in by substitution-group
//! linking before any content model is built.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#cElement_Declarations

use crate::namespaces::QName;

use super::types::{DerivationFlags, TypeId};

/// A global element declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaGlobalElement {
    /// Element name
    pub name: QName,
    /// Type of the element's value
    pub type_id: TypeId,
    /// Whether the type was declared explicitly (otherwise it may be
    /// inherited from the substitution group head)
    pub has_declared_type: bool,
    /// Abstract elements never appear in instances themselves
    pub is_abstract: bool,
    /// Nillable flag
    pub nillable: bool,
    /// Default value text
    pub default_value: Option<String>,
    /// Fixed value text
    pub fixed_value: Option<String>,
    /// Substitution group head, once linked
    pub substitution_group: Option<QName>,
    /// Direct substitution group members
    pub substitution_members: Vec<QName>,
    /// Final flags
    pub final_flags: DerivationFlags,
    /// Block flags
    pub block_flags: DerivationFlags,
    /// Wrapper document type
    pub document_type: TypeId,
    /// Documentation text
    pub documentation: Vec<String>,
}

impl SchemaGlobalElement {
    /// Create a declaration of the given type
    pub fn new(name: QName, type_id: TypeId, document_type: TypeId) -> Self {
        Self {
            name,
            type_id,
            has_declared_type: true,
            is_abstract: false,
            nillable: false,
            default_value: None,
            fixed_value: None,
            substitution_group: None,
            substitution_members: Vec::new(),
            final_flags: DerivationFlags::none(),
            block_flags: DerivationFlags::none(),
            document_type,
            documentation: Vec::new(),
        }
    }

    /// Whether other elements substitute for this one
    pub fn is_substitution_head(&self) -> bool {
        !self.substitution_members.is_empty()
    }
}
