//! Compilation context
//!
//! All state of one compilation lives in a [`CompileContext`] threaded
//! through every resolution call: the type arena under construction, the
//! registries of parsed definitions, the diagnostics collected so far, and
//! the "currently processing" guards for named groups.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::components::attributes::SchemaGlobalAttribute;
use crate::components::builtins::{builtin_names, builtin_types};
use crate::components::elements::SchemaGlobalElement;
use crate::components::qnameset::QNameSet;
use crate::components::types::{DerivationFlags, SchemaType, TypeId, TypeKind};
use crate::error::{codes, Diagnostic, Severity};
use crate::namespaces::QName;
use crate::options::CompileOptions;
use crate::parsed::{
    ParsedAttributeGroup, ParsedComplexType, ParsedElement, ParsedNamedGroup, ParsedSchema,
    ParsedSimpleType,
};

/// Namespace context of the document a definition came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocScope {
    /// Namespace components are declared in (target or adopted)
    pub target_namespace: Option<String>,
    /// Whether unqualified references are adopted into the target namespace
    pub chameleon: bool,
    /// elementFormDefault="qualified"
    pub elements_qualified: bool,
    /// attributeFormDefault="qualified"
    pub attributes_qualified: bool,
}

impl DocScope {
    pub(crate) fn of(schema: &ParsedSchema) -> Self {
        Self {
            target_namespace: schema.effective_namespace().map(String::from),
            chameleon: schema.is_chameleon(),
            elements_qualified: schema.element_form_default.as_deref() == Some("qualified"),
            attributes_qualified: schema.attribute_form_default.as_deref() == Some("qualified"),
        }
    }

    /// Name of a component declared in this document
    pub(crate) fn declared(&self, local: &str) -> QName {
        QName::new(self.target_namespace.as_deref(), local)
    }

    /// A reference as written, adopted into the target namespace for
    /// chameleon documents
    pub(crate) fn reference(&self, name: &QName) -> QName {
        if self.chameleon && name.namespace.is_none() {
            name.with_namespace(self.target_namespace.as_deref())
        } else {
            name.clone()
        }
    }

    /// Name of a local element or attribute given its form
    pub(crate) fn local(&self, local: &str, form: Option<&str>, default_qualified: bool) -> QName {
        let qualified = match form {
            Some("qualified") => true,
            Some(_) => false,
            None => default_qualified,
        };
        if qualified {
            self.declared(local)
        } else {
            QName::local(local)
        }
    }
}

/// A parsed definition paired with its document scope
#[derive(Debug)]
pub(crate) struct Scoped<T> {
    pub def: Arc<T>,
    pub scope: Arc<DocScope>,
}

impl<T> Clone for Scoped<T> {
    fn clone(&self) -> Self {
        Self {
            def: Arc::clone(&self.def),
            scope: Arc::clone(&self.scope),
        }
    }
}

impl<T> Scoped<T> {
    pub(crate) fn new(def: T, scope: &Arc<DocScope>) -> Self {
        Self {
            def: Arc::new(def),
            scope: Arc::clone(scope),
        }
    }
}

/// Where the definition of an arena type comes from
#[derive(Debug, Clone)]
pub(crate) enum TypeSource {
    /// Pre-populated builtin
    Builtin,
    /// Complex type definition
    Complex(Scoped<ParsedComplexType>),
    /// Simple type definition; `base` replaces the restriction base
    /// reference when the base is anonymous
    Simple {
        source: Scoped<ParsedSimpleType>,
        base: Option<TypeId>,
    },
    /// Wrapper type of a global element
    Document(QName),
}

/// All state of one compilation
#[derive(Debug)]
pub struct CompileContext {
    pub(crate) options: CompileOptions,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) types: Vec<SchemaType>,
    pub(crate) sources: Vec<TypeSource>,
    pub(crate) global_types: IndexMap<QName, TypeId>,
    pub(crate) elements: IndexMap<QName, SchemaGlobalElement>,
    pub(crate) element_sources: IndexMap<QName, Scoped<ParsedElement>>,
    pub(crate) attributes: IndexMap<QName, SchemaGlobalAttribute>,
    pub(crate) groups: IndexMap<QName, Scoped<ParsedNamedGroup>>,
    pub(crate) attribute_groups: IndexMap<QName, Scoped<ParsedAttributeGroup>>,
    pub(crate) processing_groups: HashSet<QName>,
    pub(crate) processing_attribute_groups: HashSet<QName>,
}

impl CompileContext {
    /// Create a context holding only the builtin types
    pub fn new(options: CompileOptions) -> Self {
        let types = builtin_types();
        let sources = vec![TypeSource::Builtin; types.len()];
        Self {
            options,
            diagnostics: Vec::new(),
            types,
            sources,
            global_types: builtin_names(),
            elements: IndexMap::new(),
            element_sources: IndexMap::new(),
            attributes: IndexMap::new(),
            groups: IndexMap::new(),
            attribute_groups: IndexMap::new(),
            processing_groups: HashSet::new(),
            processing_attribute_groups: HashSet::new(),
        }
    }

    /// Options of this compilation
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Diagnostics collected so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Record a diagnostic
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => warn!(code = ?diagnostic.code, "{}", diagnostic),
            Severity::Warning | Severity::Info => debug!(code = ?diagnostic.code, "{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record a recoverable error
    pub(crate) fn error(&mut self, code: &'static str, component: Option<&QName>, message: String) {
        self.report(
            Diagnostic::error(message)
                .with_code(code)
                .with_component(component.cloned()),
        );
    }

    /// Record an error for a component missing from the input set
    pub(crate) fn missing(&mut self, component: Option<&QName>, what: &str, name: &QName) {
        self.report(
            Diagnostic::error(format!("{} {} not found", what, name))
                .with_code(codes::SRC_RESOLVE)
                .with_component(component.cloned())
                .unrecoverable(),
        );
    }

    /// Record a warning
    pub(crate) fn warning(&mut self, code: &'static str, component: Option<&QName>, message: String) {
        self.report(
            Diagnostic::warning(message)
                .with_code(code)
                .with_component(component.cloned()),
        );
    }

    /// Parse a `final`/`block` attribute; malformed values are reported and
    /// read as empty
    pub(crate) fn derivation_flags(
        &mut self,
        value: Option<&str>,
        component: Option<&QName>,
    ) -> DerivationFlags {
        match value.map(DerivationFlags::from_str) {
            None => DerivationFlags::none(),
            Some(Ok(flags)) => flags,
            Some(Err(err)) => {
                self.error(codes::INVALID_VALUE, component, err.to_string());
                DerivationFlags::none()
            }
        }
    }

    /// Whether an error without fallback was recorded
    pub fn has_unrecoverable_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.is_error() && !d.recoverable)
    }

    /// Type by handle
    pub(crate) fn ty(&self, id: TypeId) -> &SchemaType {
        &self.types[id.index()]
    }

    /// Type by handle, for writing
    pub(crate) fn ty_mut(&mut self, id: TypeId) -> &mut SchemaType {
        &mut self.types[id.index()]
    }

    /// Type by handle, for writing resolution-owned fields
    pub(crate) fn resolving_mut(&mut self, id: TypeId) -> &mut SchemaType {
        let ty = &mut self.types[id.index()];
        ty.assert_resolving();
        ty
    }

    /// Add a type to the arena
    pub(crate) fn add_type(
        &mut self,
        name: Option<QName>,
        kind: TypeKind,
        source: TypeSource,
        outer: Option<TypeId>,
    ) -> TypeId {
        let id = TypeId(self.types.len());
        let mut ty = SchemaType::new(id, name, kind);
        ty.outer_type = outer;
        self.types.push(ty);
        self.sources.push(source);
        id
    }

    /// Add an anonymous complex type declared inside `outer`
    pub(crate) fn add_anonymous_complex(
        &mut self,
        def: &ParsedComplexType,
        scope: &Arc<DocScope>,
        outer: Option<TypeId>,
    ) -> TypeId {
        let source = TypeSource::Complex(Scoped::new(def.clone(), scope));
        self.add_type(None, TypeKind::Complex, source, outer)
    }

    /// Add an anonymous simple type declared inside `outer`
    pub(crate) fn add_anonymous_simple(
        &mut self,
        def: &ParsedSimpleType,
        scope: &Arc<DocScope>,
        outer: Option<TypeId>,
        base: Option<TypeId>,
    ) -> TypeId {
        let source = TypeSource::Simple {
            source: Scoped::new(def.clone(), scope),
            base,
        };
        self.add_type(None, TypeKind::Simple, source, outer)
    }

    /// Find a global type, reporting a missing reference and falling back
    /// to `fallback`
    pub(crate) fn lookup_type(
        &mut self,
        name: &QName,
        scope: &DocScope,
        component: Option<&QName>,
        fallback: TypeId,
    ) -> TypeId {
        self.find_type(name, scope, component).unwrap_or(fallback)
    }

    /// Like [`lookup_type`](Self::lookup_type), but tells the caller when
    /// the name is missing instead of substituting a fallback
    pub(crate) fn find_type(
        &mut self,
        name: &QName,
        scope: &DocScope,
        component: Option<&QName>,
    ) -> Option<TypeId> {
        let name = scope.reference(name);
        let found = self.global_types.get(&name).copied();
        if found.is_none() {
            self.missing(component, "type", &name);
        }
        found
    }

    /// Names an element particle referring to `element` accepts: its own
    /// name unless abstract, plus every non-abstract transitive member of
    /// its substitution group
    pub(crate) fn accepted_names(&self, element: &QName) -> QNameSet {
        let mut names = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = vec![element.clone()];
        while let Some(name) = pending.pop() {
            if !visited.insert(name.clone()) {
                continue;
            }
            match self.elements.get(&name) {
                Some(decl) => {
                    if !decl.is_abstract {
                        names.push(name.clone());
                    }
                    pending.extend(decl.substitution_members.iter().cloned());
                }
                None => names.push(name),
            }
        }
        QNameSet::from_names(names)
    }

    /// Label of a type for messages
    pub(crate) fn label(&self, id: TypeId) -> String {
        self.ty(id).label()
    }

    /// Component name to attach to diagnostics about a type: its own name,
    /// or the nearest named enclosing type
    pub(crate) fn component_name(&self, id: TypeId) -> Option<QName> {
        let mut current = Some(id);
        while let Some(id) = current {
            let ty = self.ty(id);
            if let Some(name) = ty.name.as_ref().or(ty.document_element.as_ref()) {
                return Some(name.clone());
            }
            current = ty.outer_type;
        }
        None
    }
}
