//! Shared helpers for the integration tests

#![allow(dead_code)]

use xmlschema_types::{CompileOptions, CompiledSchema, Compiler, ParsedSchema, QName, SchemaType};

/// Parse a parsed-schema document from JSON
pub fn schema(json: &str) -> ParsedSchema {
    ParsedSchema::from_json(json).expect("fixture is valid JSON")
}

/// Compile documents, keeping partial type systems
pub fn compile(documents: &[&str]) -> CompiledSchema {
    compile_with(
        documents,
        CompileOptions::default().with_allow_partial_type_system(true),
    )
}

/// Compile documents with explicit options
pub fn compile_with(documents: &[&str], options: CompileOptions) -> CompiledSchema {
    let schemas: Vec<ParsedSchema> = documents.iter().map(|d| schema(d)).collect();
    Compiler::new(options)
        .compile(&schemas)
        .expect("compilation succeeds")
}

/// Constraint codes of every diagnostic, in order
pub fn codes(compiled: &CompiledSchema) -> Vec<&'static str> {
    compiled.diagnostics().iter().filter_map(|d| d.code).collect()
}

/// Name without namespace
pub fn q(local: &str) -> QName {
    QName::local(local)
}

/// Name in the XSD namespace
pub fn xs(local: &str) -> QName {
    QName::namespaced(xmlschema_types::XSD_NAMESPACE, local)
}

/// Global type by local name (no namespace)
pub fn global<'a>(compiled: &'a CompiledSchema, local: &str) -> &'a SchemaType {
    compiled
        .type_system()
        .find_type(&q(local))
        .unwrap_or_else(|| panic!("type {} is defined", local))
}

/// Content model of a global type rendered as text
pub fn model(compiled: &CompiledSchema, local: &str) -> String {
    global(compiled, local)
        .content_model
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_default()
}
