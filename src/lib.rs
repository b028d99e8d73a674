//! # xmlschema-types
//!
//! Resolution of XML Schema components into a frozen type system.
//!
//! Given the parsed global components of one or more schema documents, the
//! compiler resolves every type's base chain and derivation, builds the
//! canonical content model of each complex type, merges attribute models,
//! checks Unique Particle Attribution, and projects per-name element and
//! attribute properties for language bindings.
//!
//! Reading XSD files is out of scope: input is the serde-deserialisable
//! [`ParsedSchema`] model.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xmlschema_types::{Compiler, CompileOptions, ParsedSchema, QName};
//!
//! let schema = ParsedSchema::from_file("schema.json")?;
//! let compiled = Compiler::new(CompileOptions::default()).compile(&[schema])?;
//!
//! for diagnostic in compiled.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//! let order = compiled.type_system().find_type(&QName::namespaced("urn:shop", "Order"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod names;
pub mod namespaces;
pub mod options;

// Input and output models
pub mod components;
pub mod parsed;

// Resolution engine
pub mod compiler;

// Data export
pub mod exports;

pub use compiler::{CompiledSchema, Compiler, Phase};
pub use components::{
    ContentVariety, DerivationMethod, QNameSet, SchemaParticle, SchemaProperty, SchemaType,
    TypeId, TypeSystem, Wildcard,
};
pub use error::{Diagnostic, Error, Result, Severity};
pub use exports::TypeSystemDump;
pub use namespaces::QName;
pub use options::CompileOptions;
pub use parsed::ParsedSchema;

/// Version of the xmlschema-types library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";
