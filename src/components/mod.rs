//! Resolved schema components
//!
//! The immutable output model: name sets, particles, wildcards, attribute
//! models, types, properties and the type system that owns them.

pub mod attributes;
pub mod builtins;
pub mod elements;
pub mod particles;
pub mod properties;
pub mod qnameset;
pub mod types;
pub mod typesystem;
pub mod wildcards;

pub use attributes::{AttributeUse, SchemaAttributeModel, SchemaAttributeUse, SchemaGlobalAttribute};
pub use builtins::BuiltinCode;
pub use elements::SchemaGlobalElement;
pub use particles::{
    parse_occurs, ElementTerm, Occurs, OccursCalculator, ParticleKind, ParticleTerm,
    SchemaParticle, Transitions,
};
pub use properties::{PropertyFlag, SchemaProperty};
pub use qnameset::QNameSet;
pub use types::{
    ContentVariety, DerivationFlags, DerivationMethod, Facet, FacetKind, SchemaType,
    SimpleFacets, SimpleTypeInfo, SimpleVariety, TypeId, TypeKind, WhiteSpace,
};
pub use typesystem::TypeSystem;
pub use wildcards::{NamespaceConstraint, ProcessContents, Wildcard};
