//! The resolved type system
//!
//! A [`TypeSystem`] owns the type arena and the global registries. It is
//! produced frozen by the compiler; the only later mutation is the
//! language-binding pass driven by [`TypeSystem::javaize`].

use crate::compiler::phases::Phase;
use crate::namespaces::QName;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

use super::attributes::SchemaGlobalAttribute;
use super::builtins::{builtin_names, builtin_types};
use super::elements::SchemaGlobalElement;
use super::types::{SchemaType, SimpleVariety, TypeId};

/// A fully linked, immutable type graph
#[derive(Debug)]
pub struct TypeSystem {
    types: Vec<SchemaType>,
    global_types: IndexMap<QName, TypeId>,
    elements: IndexMap<QName, SchemaGlobalElement>,
    attributes: IndexMap<QName, SchemaGlobalAttribute>,
}

impl TypeSystem {
    /// The builtin type system alone
    pub fn builtin() -> Self {
        Self {
            types: builtin_types(),
            global_types: builtin_names(),
            elements: IndexMap::new(),
            attributes: IndexMap::new(),
        }
    }

    pub(crate) fn from_parts(
        types: Vec<SchemaType>,
        global_types: IndexMap<QName, TypeId>,
        elements: IndexMap<QName, SchemaGlobalElement>,
        attributes: IndexMap<QName, SchemaGlobalAttribute>,
    ) -> Self {
        Self {
            types,
            global_types,
            elements,
            attributes,
        }
    }

    /// Type by handle
    ///
    /// Handles are only produced by this type system, so an out of range
    /// handle is a programming error.
    pub fn get(&self, id: TypeId) -> &SchemaType {
        &self.types[id.index()]
    }

    /// The universal root type
    pub fn any_type(&self) -> &SchemaType {
        self.get(TypeId::ANY_TYPE)
    }

    /// The universal simple type
    pub fn any_simple_type(&self) -> &SchemaType {
        self.get(TypeId::ANY_SIMPLE_TYPE)
    }

    /// Every type in the arena, builtins first
    pub fn types(&self) -> impl Iterator<Item = &SchemaType> {
        self.types.iter()
    }

    /// Number of types in the arena
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the arena is empty (never true: builtins are always present)
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Global type by name
    pub fn find_type(&self, name: &QName) -> Option<&SchemaType> {
        self.global_types.get(name).map(|&id| self.get(id))
    }

    /// Global type handle by name
    pub fn find_type_id(&self, name: &QName) -> Option<TypeId> {
        self.global_types.get(name).copied()
    }

    /// Global element by name
    pub fn find_element(&self, name: &QName) -> Option<&SchemaGlobalElement> {
        self.elements.get(name)
    }

    /// Global attribute by name
    pub fn find_attribute(&self, name: &QName) -> Option<&SchemaGlobalAttribute> {
        self.attributes.get(name)
    }

    /// Document type of a global element
    pub fn document_type(&self, element: &QName) -> Option<&SchemaType> {
        self.elements.get(element).map(|e| self.get(e.document_type))
    }

    /// Named global types, builtins included, in registration order
    pub fn global_types(&self) -> impl Iterator<Item = &SchemaType> {
        self.global_types.values().map(move |&id| self.get(id))
    }

    /// Global elements in registration order
    pub fn elements(&self) -> impl Iterator<Item = &SchemaGlobalElement> {
        self.elements.values()
    }

    /// Global attributes in registration order
    pub fn attributes(&self) -> impl Iterator<Item = &SchemaGlobalAttribute> {
        self.attributes.values()
    }

    /// Document types, one per global element
    pub fn document_types(&self) -> impl Iterator<Item = &SchemaType> {
        self.elements.values().map(move |e| self.get(e.document_type))
    }

    /// Whether `derived` is `base` or derives from it through any chain
    pub fn is_derived_from(&self, derived: TypeId, base: TypeId) -> bool {
        derives_in(&self.types, derived, base)
    }

    /// Nearest common ancestor of two types
    pub fn common_base_type(&self, a: TypeId, b: TypeId) -> TypeId {
        common_base_in(&self.types, a, b)
    }

    /// Member types of a union with nested unions inlined
    ///
    /// Computed once per type and cached; returns an empty slice for
    /// non-union types.
    pub fn union_members(&self, id: TypeId) -> &[TypeId] {
        self.get(id).union_members.get_or_init(|| {
            let mut members = Vec::new();
            let mut visited = HashSet::new();
            self.flatten_union(id, &mut members, &mut visited);
            members
        })
    }

    fn flatten_union(&self, id: TypeId, out: &mut Vec<TypeId>, visited: &mut HashSet<TypeId>) {
        if !visited.insert(id) {
            return;
        }
        let Some(info) = self.get(id).simple.as_ref() else {
            return;
        };
        if info.variety != SimpleVariety::Union {
            return;
        }
        for &member in &info.member_types {
            let is_union = self.get(member).simple_variety() == Some(SimpleVariety::Union);
            if is_union {
                self.flatten_union(member, out, visited);
            } else if !out.contains(&member) {
                out.push(member);
            }
        }
    }

    /// Run the language-binding pass, naming every resolved type
    ///
    /// Types that are already javaized keep their binding name.
    pub fn javaize<F>(&mut self, mut namer: F)
    where
        F: FnMut(&SchemaType) -> String,
    {
        for ty in self.types.iter_mut() {
            if ty.phase() != Phase::Resolved {
                continue;
            }
            ty.advance_phase(Phase::Javaizing);
            let name = namer(&*ty);
            ty.binding_name = Some(name);
            ty.advance_phase(Phase::Javaized);
        }
        debug!(types = self.types.len(), "language binding names assigned");
    }
}

/// Base-chain walk over an arena
pub(crate) fn derives_in(types: &[SchemaType], derived: TypeId, base: TypeId) -> bool {
    let mut current = Some(derived);
    while let Some(id) = current {
        if id == base {
            return true;
        }
        current = types[id.index()].base_type;
    }
    false
}

/// Nearest common ancestor by base-depth walk over an arena
pub(crate) fn common_base_in(types: &[SchemaType], a: TypeId, b: TypeId) -> TypeId {
    let (mut a, mut b) = (a, b);
    let depth = |id: TypeId| types[id.index()].base_depth;
    let parent = |id: TypeId| types[id.index()].base_type.unwrap_or(TypeId::ANY_TYPE);

    while depth(a) > depth(b) {
        a = parent(a);
    }
    while depth(b) > depth(a) {
        b = parent(b);
    }
    while a != b {
        if a == TypeId::ANY_TYPE || b == TypeId::ANY_TYPE {
            return TypeId::ANY_TYPE;
        }
        a = parent(a);
        b = parent(b);
    }
    a
}
