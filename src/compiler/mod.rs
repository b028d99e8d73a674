//! Type-system compiler
//!
//! Compiles a set of parsed schema documents into a frozen [`TypeSystem`]:
//!
//! 1. global components of every document are registered by QName;
//! 2. every global element is linked into its substitution group;
//! 3. every type is resolved, recursively resolving the types it depends
//!    on, with the phase controller breaking cycles;
//! 4. properties are projected and substitution-group member types are
//!    checked once the whole graph is resolved.
//!
//! Schema problems never abort compilation on their own: they are
//! recorded as [`Diagnostic`]s with a fallback applied. Only when partial
//! type systems are not allowed does an unrecoverable diagnostic turn into
//! an [`Error::Compile`].

pub(crate) mod attributes;
pub mod content;
pub(crate) mod context;
pub(crate) mod derivation;
pub mod phases;
pub(crate) mod properties;
pub(crate) mod simple;
pub(crate) mod substitution;
pub mod upa;

pub use phases::Phase;

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::components::attributes::SchemaGlobalAttribute;
use crate::components::elements::SchemaGlobalElement;
use crate::components::types::{TypeId, TypeKind};
use crate::components::typesystem::TypeSystem;
use crate::error::{codes, Diagnostic, Error, Result, Severity};
use crate::names::is_valid_ncname;
use crate::namespaces::QName;
use crate::options::CompileOptions;
use crate::parsed::ParsedSchema;
use context::{CompileContext, DocScope, Scoped, TypeSource};
use phases::Entry;

/// Compiles parsed schema documents into a type system
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a compiler with the given options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a set of documents into one type system
    pub fn compile(&self, schemas: &[ParsedSchema]) -> Result<CompiledSchema> {
        let mut ctx = CompileContext::new(self.options.clone());
        let scopes: Vec<Arc<DocScope>> = schemas
            .iter()
            .map(|schema| Arc::new(DocScope::of(schema)))
            .collect();

        for (schema, scope) in schemas.iter().zip(&scopes) {
            register_definitions(&mut ctx, schema, scope);
        }
        for (schema, scope) in schemas.iter().zip(&scopes) {
            register_attributes(&mut ctx, schema, scope);
        }
        for (schema, scope) in schemas.iter().zip(&scopes) {
            register_elements(&mut ctx, schema, scope);
        }

        substitution::resolve_substitution_groups(&mut ctx);

        // anonymous types discovered while resolving are appended to the
        // arena and picked up by the same loop
        let mut index = 0;
        while index < ctx.types.len() {
            resolve_type(&mut ctx, TypeId(index));
            index += 1;
        }

        for index in 0..ctx.types.len() {
            properties::project_properties(&mut ctx, TypeId(index));
        }
        substitution::check_member_types(&mut ctx);

        let compiled = CompiledSchema {
            type_system: TypeSystem::from_parts(
                ctx.types,
                ctx.global_types,
                ctx.elements,
                ctx.attributes,
            ),
            diagnostics: ctx.diagnostics,
        };
        info!(
            documents = schemas.len(),
            types = compiled.type_system.len(),
            errors = compiled.errors().count(),
            warnings = compiled.warnings().count(),
            "type system compiled"
        );

        if !self.options.allow_partial_type_system {
            let unrecoverable: Vec<Diagnostic> = compiled
                .errors()
                .filter(|d| !d.recoverable)
                .cloned()
                .collect();
            if !unrecoverable.is_empty() {
                return Err(Error::Compile {
                    errors: unrecoverable,
                });
            }
        }
        Ok(compiled)
    }

    /// Load parsed-schema JSON files and compile them together
    pub fn compile_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<CompiledSchema> {
        let schemas = paths
            .iter()
            .map(ParsedSchema::from_file)
            .collect::<Result<Vec<_>>>()?;
        self.compile(&schemas)
    }
}

/// Result of a compilation: the type system plus every diagnostic
#[derive(Debug)]
pub struct CompiledSchema {
    type_system: TypeSystem,
    diagnostics: Vec<Diagnostic>,
}

impl CompiledSchema {
    /// The resolved type system
    pub fn type_system(&self) -> &TypeSystem {
        &self.type_system
    }

    /// Take the type system, dropping the diagnostics
    pub fn into_type_system(self) -> TypeSystem {
        self.type_system
    }

    /// Every diagnostic in the order it was recorded
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics of severity error
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    /// Diagnostics of severity warning
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    /// Whether any error was recorded
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Whether an error with the given constraint code was recorded
    pub fn has_error_code(&self, code: &str) -> bool {
        self.errors().any(|d| d.code == Some(code))
    }
}

/// Resolve one type, recursively resolving what it depends on
///
/// Returns false when the type is already being resolved further up the
/// call stack; the caller must then substitute a fallback.
pub(crate) fn resolve_type(ctx: &mut CompileContext, id: TypeId) -> bool {
    match ctx.ty(id).resolution_entry() {
        Entry::Done => return true,
        Entry::Circular => {
            let component = ctx.component_name(id);
            ctx.error(
                codes::CIRCULAR,
                component.as_ref(),
                format!("{} depends on itself", ctx.label(id)),
            );
            return false;
        }
        Entry::Proceed => {}
    }

    ctx.ty_mut(id).advance_phase(Phase::Resolving);
    match ctx.sources[id.index()].clone() {
        TypeSource::Builtin => {}
        TypeSource::Complex(source) => derivation::resolve_complex(ctx, id, &source),
        TypeSource::Simple { source, base } => simple::resolve_simple(ctx, id, &source, base),
        TypeSource::Document(element) => substitution::resolve_document_type(ctx, id, &element),
    }
    ctx.ty_mut(id).advance_phase(Phase::Resolved);
    true
}

fn declared_name(
    ctx: &mut CompileContext,
    local: Option<&str>,
    scope: &DocScope,
    what: &str,
) -> Option<QName> {
    match local {
        Some(local) if is_valid_ncname(local) => Some(scope.declared(local)),
        other => {
            ctx.error(
                codes::INVALID_NAME,
                None,
                format!("global {} name {:?} is not a valid NCName", what, other),
            );
            None
        }
    }
}

fn duplicate(ctx: &mut CompileContext, what: &str, name: &QName) {
    ctx.warning(
        codes::DUPLICATE_GLOBAL,
        Some(name),
        format!("{} {} is declared more than once; the first declaration is kept", what, name),
    );
}

fn register_definitions(ctx: &mut CompileContext, schema: &ParsedSchema, scope: &Arc<DocScope>) {
    for def in &schema.complex_types {
        let Some(name) = declared_name(ctx, def.name.as_deref(), scope, "complex type") else {
            continue;
        };
        if ctx.global_types.contains_key(&name) {
            duplicate(ctx, "type", &name);
            continue;
        }
        let source = TypeSource::Complex(Scoped::new(def.clone(), scope));
        let id = ctx.add_type(Some(name.clone()), TypeKind::Complex, source, None);
        ctx.global_types.insert(name, id);
    }

    for def in &schema.simple_types {
        let Some(name) = declared_name(ctx, def.name.as_deref(), scope, "simple type") else {
            continue;
        };
        if ctx.global_types.contains_key(&name) {
            duplicate(ctx, "type", &name);
            continue;
        }
        let source = TypeSource::Simple {
            source: Scoped::new(def.clone(), scope),
            base: None,
        };
        let id = ctx.add_type(Some(name.clone()), TypeKind::Simple, source, None);
        ctx.global_types.insert(name, id);
    }

    for def in &schema.groups {
        let Some(name) = declared_name(ctx, Some(def.name.as_str()), scope, "model group") else {
            continue;
        };
        if ctx.groups.contains_key(&name) {
            duplicate(ctx, "model group", &name);
            continue;
        }
        ctx.groups.insert(name, Scoped::new(def.clone(), scope));
    }

    for def in &schema.attribute_groups {
        let Some(name) = declared_name(ctx, Some(def.name.as_str()), scope, "attribute group")
        else {
            continue;
        };
        if ctx.attribute_groups.contains_key(&name) {
            duplicate(ctx, "attribute group", &name);
            continue;
        }
        ctx.attribute_groups.insert(name, Scoped::new(def.clone(), scope));
    }
}

fn register_attributes(ctx: &mut CompileContext, schema: &ParsedSchema, scope: &Arc<DocScope>) {
    for def in &schema.attributes {
        let Some(name) = declared_name(ctx, def.name.as_deref(), scope, "attribute") else {
            continue;
        };
        if ctx.attributes.contains_key(&name) {
            duplicate(ctx, "attribute", &name);
            continue;
        }
        let type_id = attributes::attribute_type(ctx, def, scope, None, Some(&name));
        let documentation = if ctx.options.disable_annotations {
            Vec::new()
        } else {
            def.documentation.clone()
        };
        debug!(attribute = %name, "global attribute registered");
        ctx.attributes.insert(
            name.clone(),
            SchemaGlobalAttribute {
                name,
                type_id,
                default_value: def.default.clone(),
                fixed_value: def.fixed.clone(),
                documentation,
            },
        );
    }
}

fn register_elements(ctx: &mut CompileContext, schema: &ParsedSchema, scope: &Arc<DocScope>) {
    for def in &schema.elements {
        let Some(name) = declared_name(ctx, def.name.as_deref(), scope, "element") else {
            continue;
        };
        if ctx.elements.contains_key(&name) {
            duplicate(ctx, "element", &name);
            continue;
        }

        let document_type = ctx.add_type(
            None,
            TypeKind::Complex,
            TypeSource::Document(name.clone()),
            None,
        );
        {
            let ty = ctx.ty_mut(document_type);
            ty.is_document_type = true;
            ty.document_element = Some(name.clone());
        }

        let declared = content::element_type(ctx, def, scope, Some(document_type), Some(&name));
        let mut element =
            SchemaGlobalElement::new(name.clone(), declared.unwrap_or(TypeId::ANY_TYPE), document_type);
        element.has_declared_type = declared.is_some();
        element.is_abstract = def.is_abstract;
        element.nillable = def.nillable;
        element.default_value = def.default.clone();
        element.fixed_value = def.fixed.clone();
        element.final_flags = ctx.derivation_flags(def.final_value.as_deref(), Some(&name));
        element.block_flags = ctx.derivation_flags(def.block.as_deref(), Some(&name));
        if !ctx.options.disable_annotations {
            element.documentation = def.documentation.clone();
        }

        debug!(element = %name, document_type = %document_type, "global element registered");
        ctx.element_sources
            .insert(name.clone(), Scoped::new(def.clone(), scope));
        ctx.elements.insert(name, element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::types::DerivationFlags;
    use crate::parsed::{ParsedAttribute, ParsedComplexType, ParsedElement};

    fn complex(name: &str) -> ParsedComplexType {
        ParsedComplexType {
            name: Some(name.into()),
            ..ParsedComplexType::default()
        }
    }

    #[test]
    fn test_duplicates_warn_and_first_wins() {
        let mut first = ParsedSchema::new(Some("urn:a"));
        first.complex_types.push(ParsedComplexType {
            mixed: true,
            ..complex("t")
        });
        let mut second = ParsedSchema::new(Some("urn:a"));
        second.complex_types.push(complex("t"));

        let compiled = Compiler::default().compile(&[first, second]).unwrap();
        assert_eq!(compiled.warnings().count(), 1);
        assert!(!compiled.has_errors());
        let t = compiled
            .type_system()
            .find_type(&QName::namespaced("urn:a", "t"))
            .unwrap();
        assert!(t.is_resolved());
        assert_eq!(t.content_variety, crate::components::types::ContentVariety::Mixed);
    }

    #[test]
    fn test_invalid_names_are_skipped() {
        let mut schema = ParsedSchema::new(None);
        schema.complex_types.push(complex("1bad"));
        schema.elements.push(ParsedElement::default());

        let compiled = Compiler::default().compile(&[schema]).unwrap();
        let codes: Vec<_> = compiled.errors().map(|d| d.code).collect();
        assert_eq!(codes, vec![Some(codes::INVALID_NAME), Some(codes::INVALID_NAME)]);
        assert_eq!(compiled.type_system().elements().count(), 0);
    }

    #[test]
    fn test_invalid_values_are_not_name_errors() {
        let mut schema = ParsedSchema::new(None);
        let mut t = complex("t");
        t.final_value = Some("sometimes".into());
        t.attribute_decls.attributes.push(ParsedAttribute {
            name: Some("a".into()),
            use_value: Some("often".into()),
            ..ParsedAttribute::default()
        });
        schema.complex_types.push(t);

        let compiled = Compiler::default().compile(&[schema]).unwrap();
        let codes: Vec<_> = compiled.errors().map(|d| d.code).collect();
        assert_eq!(codes, vec![Some(codes::INVALID_VALUE), Some(codes::INVALID_VALUE)]);
        let t = compiled.type_system().find_type(&QName::local("t")).unwrap();
        assert_eq!(t.final_flags, DerivationFlags::none());
        assert!(!t.attribute_model.get(&QName::local("a")).unwrap().is_required());
    }

    #[test]
    fn test_unrecoverable_errors_abort_unless_partial() {
        let mut schema = ParsedSchema::new(None);
        schema.elements.push(ParsedElement {
            name: Some("root".into()),
            type_name: Some(QName::local("missing")),
            ..ParsedElement::default()
        });

        match Compiler::default().compile(std::slice::from_ref(&schema)) {
            Err(Error::Compile { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, Some(codes::SRC_RESOLVE));
            }
            other => panic!("expected a compile error, got {:?}", other),
        }

        let partial = Compiler::new(CompileOptions::default().with_allow_partial_type_system(true))
            .compile(&[schema])
            .unwrap();
        let root = partial
            .type_system()
            .find_element(&QName::local("root"))
            .unwrap();
        assert_eq!(root.type_id, TypeId::ANY_TYPE);
        assert!(partial.type_system().types().all(|ty| ty.is_resolved()));
    }
}
