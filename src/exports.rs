//! Type System Export
//!
//! Serialisable summary of a resolved type system: one entry per type with
//! its derivation, content model (including the UPA transition sets computed
//! for every particle), attribute model and projected properties, plus the
//! diagnostics of the compilation that produced it.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::compiler::CompiledSchema;
use crate::components::attributes::SchemaAttributeUse;
use crate::components::particles::{ParticleTerm, SchemaParticle};
use crate::components::properties::SchemaProperty;
use crate::components::types::SchemaType;
use crate::components::typesystem::TypeSystem;
use crate::error::{Diagnostic, Result};

/// Serialisable dump of a type system
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSystemDump {
    /// Library version that produced the dump
    pub version: String,
    /// Dumped types in arena order
    pub types: Vec<TypeDump>,
    /// Global elements
    pub elements: Vec<ElementDump>,
    /// Diagnostics of the compilation
    pub diagnostics: Vec<Diagnostic>,
}

/// One type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDump {
    /// Arena index
    pub id: usize,
    /// Display label
    pub label: String,
    /// Clark-notation name of a global type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// "simple" or "complex"
    pub kind: String,
    /// Content variety
    pub variety: String,
    /// Base type label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Derivation method
    pub derivation: String,
    /// Distance from anyType
    pub base_depth: u32,
    /// Abstract flag
    pub is_abstract: bool,
    /// Content model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_model: Option<ParticleDump>,
    /// Attribute uses
    pub attributes: Vec<AttributeDump>,
    /// Attribute wildcard names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_wildcard: Option<String>,
    /// Element and attribute properties
    pub properties: Vec<PropertyDump>,
    /// Documentation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documentation: Vec<String>,
}

/// One particle, recursively
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleDump {
    /// Particle kind
    pub kind: String,
    /// Element name or wildcard name set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Occurrence suffix ("", "?", "*", "+", "{m,n}")
    pub occurs: String,
    /// Start set, once computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// Exclude-next set, once computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_next: Option<String>,
    /// Whether the particle can match empty input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skippable: Option<bool>,
    /// Whether the particle's model is deterministic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deterministic: Option<bool>,
    /// Group children
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParticleDump>,
}

/// One attribute use
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDump {
    /// Attribute name
    pub name: String,
    /// Type label
    pub type_label: String,
    /// optional / required / prohibited
    #[serde(rename = "use")]
    pub use_mode: String,
    /// Default or fixed value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One projected property
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDump {
    /// Property name
    pub name: String,
    /// Whether this is an attribute property
    pub is_attribute: bool,
    /// Type label
    pub type_label: String,
    /// Minimum occurrences
    pub min_occurs: u32,
    /// Maximum occurrences; absent when unbounded
    pub max_occurs: Option<u32>,
    /// Nillable flag
    pub nillable: String,
}

/// One global element
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDump {
    /// Element name
    pub name: String,
    /// Type label
    pub type_label: String,
    /// Substitution group head
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution_group: Option<String>,
    /// Abstract flag
    pub is_abstract: bool,
}

impl TypeSystemDump {
    /// Dump the user-defined types of a type system
    pub fn new(type_system: &TypeSystem, diagnostics: &[Diagnostic]) -> Self {
        Self::build(type_system, diagnostics, false)
    }

    /// Dump every type, builtins included
    pub fn with_builtins(type_system: &TypeSystem, diagnostics: &[Diagnostic]) -> Self {
        Self::build(type_system, diagnostics, true)
    }

    /// Dump a compilation result
    pub fn from_compiled(compiled: &CompiledSchema) -> Self {
        Self::new(compiled.type_system(), compiled.diagnostics())
    }

    fn build(type_system: &TypeSystem, diagnostics: &[Diagnostic], builtins: bool) -> Self {
        let types = type_system
            .types()
            .filter(|ty| builtins || !ty.is_builtin())
            .map(|ty| dump_type(type_system, ty))
            .collect();
        let elements = type_system
            .elements()
            .map(|element| ElementDump {
                name: element.name.to_string(),
                type_label: type_system.get(element.type_id).label(),
                substitution_group: element.substitution_group.as_ref().map(|h| h.to_string()),
                is_abstract: element.is_abstract,
            })
            .collect();
        Self {
            version: crate::VERSION.to_string(),
            types,
            elements,
            diagnostics: diagnostics.to_vec(),
        }
    }

    /// Find a dumped type by label
    pub fn find(&self, label: &str) -> Option<&TypeDump> {
        self.types.iter().find(|ty| ty.label == label)
    }

    /// Serialise as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON dump to a file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

fn dump_type(type_system: &TypeSystem, ty: &SchemaType) -> TypeDump {
    let label = |id| type_system.get(id).label();
    let properties = ty
        .element_properties
        .iter()
        .chain(&ty.attribute_properties)
        .map(|p| dump_property(type_system, p))
        .collect();
    TypeDump {
        id: ty.id.index(),
        label: ty.label(),
        name: ty.name.as_ref().map(|n| n.to_string()),
        kind: if ty.is_simple() { "simple" } else { "complex" }.to_string(),
        variety: ty.content_variety.to_string(),
        base: ty.base_type.map(label),
        derivation: ty.derivation.to_string(),
        base_depth: ty.base_depth,
        is_abstract: ty.is_abstract,
        content_model: ty.content_model.as_ref().map(dump_particle),
        attributes: ty
            .attribute_model
            .iter()
            .map(|u| dump_attribute(type_system, u))
            .collect(),
        attribute_wildcard: ty.attribute_model.wildcard().map(|w| w.names.to_string()),
        properties,
        documentation: ty.documentation.clone(),
    }
}

fn dump_particle(particle: &SchemaParticle) -> ParticleDump {
    let name = match &particle.term {
        ParticleTerm::Element(element) => Some(element.name.to_string()),
        ParticleTerm::Wildcard(wildcard) => Some(wildcard.names.to_string()),
        _ => None,
    };
    ParticleDump {
        kind: particle.kind().to_string(),
        name,
        occurs: particle.occurs.to_string(),
        start: particle.start_set().map(|s| s.to_string()),
        exclude_next: particle.exclude_next_set().map(|s| s.to_string()),
        skippable: particle.is_skippable(),
        deterministic: particle.is_deterministic(),
        children: particle.children().iter().map(dump_particle).collect(),
    }
}

fn dump_attribute(type_system: &TypeSystem, attribute: &SchemaAttributeUse) -> AttributeDump {
    AttributeDump {
        name: attribute.name.to_string(),
        type_label: type_system.get(attribute.type_id).label(),
        use_mode: attribute.use_mode.to_string(),
        value: attribute.value_constraint().map(String::from),
    }
}

fn dump_property(type_system: &TypeSystem, property: &SchemaProperty) -> PropertyDump {
    PropertyDump {
        name: property.name.to_string(),
        is_attribute: property.is_attribute,
        type_label: type_system.get(property.type_id).label(),
        min_occurs: property.min_occurs,
        max_occurs: property.max_occurs,
        nillable: property.nillable.to_string(),
    }
}
