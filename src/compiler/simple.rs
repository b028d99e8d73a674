//! Simple-type resolution
//!
//! Follows the base chain of a restriction, the item type of a list, or the
//! member types of a union, and seeds the effective facets from the base.
//!
//! Reference: https://www.w3.org/TR/xmlschema-2/#Simple_Type_Definitions

use std::sync::Arc;

use super::context::{CompileContext, DocScope, Scoped};
use super::resolve_type;
use crate::components::types::{
    ContentVariety, DerivationMethod, Facet, FacetKind, SimpleFacets, SimpleTypeInfo,
    SimpleVariety, TypeId, WhiteSpace,
};
use crate::error::codes;
use crate::namespaces::QName;
use crate::parsed::{
    ParsedFacet, ParsedList, ParsedSimpleDerivation, ParsedSimpleRestriction, ParsedSimpleType,
    ParsedUnion,
};

/// Resolve a simple type definition into `id`
///
/// `base_override` replaces the restriction base reference; it is set for
/// the anonymous types synthesized for simple-content restrictions.
pub(crate) fn resolve_simple(
    ctx: &mut CompileContext,
    id: TypeId,
    source: &Scoped<ParsedSimpleType>,
    base_override: Option<TypeId>,
) {
    let def = &source.def;
    let scope = &source.scope;
    let component = ctx.component_name(id);
    let final_flags = ctx.derivation_flags(def.final_value.as_deref(), component.as_ref());

    let (base, info) = match &def.derivation {
        ParsedSimpleDerivation::Restriction(restriction) => {
            restrict(ctx, id, restriction, scope, base_override, component.as_ref())
        }
        ParsedSimpleDerivation::List(list) => (
            TypeId::ANY_SIMPLE_TYPE,
            list_info(ctx, id, list, scope, component.as_ref()),
        ),
        ParsedSimpleDerivation::Union(union) => (
            TypeId::ANY_SIMPLE_TYPE,
            union_info(ctx, id, union, scope, component.as_ref()),
        ),
    };

    let base_depth = ctx.ty(base).base_depth + 1;
    let disable_annotations = ctx.options.disable_annotations;
    let ty = ctx.resolving_mut(id);
    ty.base_type = Some(base);
    ty.base_depth = base_depth;
    ty.derivation = DerivationMethod::Restriction;
    ty.content_variety = ContentVariety::NotComplex;
    ty.final_flags = final_flags;
    ty.simple = Some(info);
    if !disable_annotations {
        ty.documentation = def.documentation.clone();
    }
}

/// Resolve a type used where a simple type is required; a cycle or a
/// complex type yields anySimpleType
pub(crate) fn require_simple(
    ctx: &mut CompileContext,
    candidate: TypeId,
    component: Option<&QName>,
) -> TypeId {
    if !resolve_type(ctx, candidate) {
        return TypeId::ANY_SIMPLE_TYPE;
    }
    if ctx.ty(candidate).is_complex() {
        ctx.error(
            codes::ST_BASE,
            component,
            format!("{} is not a simple type", ctx.label(candidate)),
        );
        return TypeId::ANY_SIMPLE_TYPE;
    }
    candidate
}

fn restrict(
    ctx: &mut CompileContext,
    id: TypeId,
    restriction: &ParsedSimpleRestriction,
    scope: &Arc<DocScope>,
    base_override: Option<TypeId>,
    component: Option<&QName>,
) -> (TypeId, SimpleTypeInfo) {
    let base = match (base_override, &restriction.base, &restriction.simple_type) {
        (Some(base), _, _) => base,
        (None, Some(name), _) => ctx.lookup_type(name, scope, component, TypeId::ANY_SIMPLE_TYPE),
        (None, None, Some(inline)) => inline_type(ctx, id, inline, scope),
        (None, None, None) => TypeId::ANY_SIMPLE_TYPE,
    };
    let base = require_simple(ctx, base, component);
    if ctx.ty(base).final_flags.restriction {
        ctx.error(
            codes::CT_FINAL_RESTRICTION,
            component,
            format!("{} is final for restriction", ctx.label(base)),
        );
    }

    let base_info = ctx.ty(base).simple.clone().unwrap_or_default();
    let facets = seed_facets(ctx, &base_info.facets, &restriction.facets, component);
    (base, SimpleTypeInfo { facets, ..base_info })
}

fn list_info(
    ctx: &mut CompileContext,
    id: TypeId,
    list: &ParsedList,
    scope: &Arc<DocScope>,
    component: Option<&QName>,
) -> SimpleTypeInfo {
    let item = match (&list.item_type, &list.simple_type) {
        (Some(name), _) => ctx.lookup_type(name, scope, component, TypeId::ANY_SIMPLE_TYPE),
        (None, Some(inline)) => inline_type(ctx, id, inline, scope),
        (None, None) => TypeId::ANY_SIMPLE_TYPE,
    };
    let item = require_simple(ctx, item, component);
    SimpleTypeInfo {
        variety: SimpleVariety::List,
        primitive: None,
        item_type: Some(item),
        member_types: Vec::new(),
        facets: SimpleFacets {
            white_space: Some(WhiteSpace::Collapse),
            ..SimpleFacets::default()
        },
    }
}

fn union_info(
    ctx: &mut CompileContext,
    id: TypeId,
    union: &ParsedUnion,
    scope: &Arc<DocScope>,
    component: Option<&QName>,
) -> SimpleTypeInfo {
    let mut candidates: Vec<TypeId> = union
        .member_types
        .iter()
        .map(|name| ctx.lookup_type(name, scope, component, TypeId::ANY_SIMPLE_TYPE))
        .collect();
    for inline in &union.simple_types {
        candidates.push(inline_type(ctx, id, inline, scope));
    }
    let member_types = candidates
        .into_iter()
        .map(|member| require_simple(ctx, member, component))
        .collect();
    SimpleTypeInfo {
        variety: SimpleVariety::Union,
        primitive: None,
        item_type: None,
        member_types,
        facets: SimpleFacets::default(),
    }
}

fn inline_type(
    ctx: &mut CompileContext,
    outer: TypeId,
    inline: &ParsedSimpleType,
    scope: &Arc<DocScope>,
) -> TypeId {
    let id = ctx.add_anonymous_simple(inline, scope, Some(outer), None);
    ctx.resolving_mut(outer).anonymous_types.push(id);
    id
}

/// Effective facets of a restriction step: single-valued facets override
/// the inherited ones of the same kind, patterns accumulate, and a step
/// declaring enumerations replaces the inherited enumeration
pub(crate) fn seed_facets(
    ctx: &mut CompileContext,
    inherited: &SimpleFacets,
    own: &[ParsedFacet],
    component: Option<&QName>,
) -> SimpleFacets {
    let mut facets = inherited.clone();
    let mut enumerations = Vec::new();
    for facet in own {
        match FacetKind::from_str(&facet.kind) {
            None => ctx.error(
                codes::FACET,
                component,
                format!("unknown facet '{}'", facet.kind),
            ),
            Some(FacetKind::Pattern) => facets.patterns.push(facet.value.clone()),
            Some(FacetKind::Enumeration) => enumerations.push(facet.value.clone()),
            Some(FacetKind::WhiteSpace) => match WhiteSpace::from_str(&facet.value) {
                Some(white_space) => facets.white_space = Some(white_space),
                None => ctx.error(
                    codes::FACET,
                    component,
                    format!("invalid whiteSpace value '{}'", facet.value),
                ),
            },
            Some(kind) => {
                if let Some(existing) = inherited.get(kind) {
                    if existing.fixed && existing.value != facet.value {
                        ctx.error(
                            codes::FACET,
                            component,
                            format!("facet {:?} is fixed to '{}'", kind, existing.value),
                        );
                        continue;
                    }
                }
                facets.values.insert(
                    kind,
                    Facet {
                        value: facet.value.clone(),
                        fixed: facet.fixed,
                    },
                );
            }
        }
    }
    if !enumerations.is_empty() {
        facets.enumerations = enumerations;
    }
    facets
}
