//! Attribute-model construction
//!
//! Local attribute declarations, attribute-group references and the local
//! attribute wildcard are gathered first; the result is then combined with
//! the base type's model according to the derivation method.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#declare-type

use std::collections::HashSet;
use std::sync::Arc;

use super::content::build_wildcard;
use super::context::{CompileContext, DocScope};
use crate::components::attributes::{AttributeUse, SchemaAttributeModel, SchemaAttributeUse};
use crate::components::types::TypeId;
use crate::components::wildcards::Wildcard;
use crate::error::codes;
use crate::names::is_valid_ncname;
use crate::namespaces::QName;
use crate::parsed::{ParsedAttribute, ParsedAttributeDecls};

/// Attribute uses declared directly on a type (prohibited uses included)
#[derive(Debug, Clone, Default)]
pub(crate) struct LocalAttributes {
    pub uses: Vec<SchemaAttributeUse>,
    pub wildcard: Option<Wildcard>,
}

/// Collect the attribute declarations of a type, expanding attribute
/// groups
pub(crate) fn gather_attributes(
    ctx: &mut CompileContext,
    decls: &ParsedAttributeDecls,
    scope: &Arc<DocScope>,
    owner: TypeId,
) -> LocalAttributes {
    let component = ctx.component_name(owner);
    let mut local = LocalAttributes::default();
    let mut seen = HashSet::new();
    collect(ctx, decls, scope, owner, component.as_ref(), &mut local, &mut seen);
    local
}

fn collect(
    ctx: &mut CompileContext,
    decls: &ParsedAttributeDecls,
    scope: &Arc<DocScope>,
    owner: TypeId,
    component: Option<&QName>,
    local: &mut LocalAttributes,
    seen: &mut HashSet<QName>,
) {
    for attribute in &decls.attributes {
        let Some(attribute_use) = attribute_use(ctx, attribute, scope, owner, component) else {
            continue;
        };
        if !seen.insert(attribute_use.name.clone()) {
            ctx.error(
                codes::DUPLICATE_ATTRIBUTE,
                component,
                format!("attribute {} is declared more than once", attribute_use.name),
            );
            continue;
        }
        local.uses.push(attribute_use);
    }

    for reference in &decls.attribute_groups {
        let name = scope.reference(reference);
        let Some(group) = ctx.attribute_groups.get(&name).cloned() else {
            ctx.missing(component, "attribute group", &name);
            continue;
        };
        if !ctx.processing_attribute_groups.insert(name.clone()) {
            ctx.error(
                codes::CIRCULAR,
                component,
                format!("attribute group {} refers to itself", name),
            );
            continue;
        }
        collect(ctx, &group.def.attribute_decls, &group.scope, owner, component, local, seen);
        ctx.processing_attribute_groups.remove(&name);
    }

    if let Some(any) = &decls.any_attribute {
        let wildcard = build_wildcard(ctx, any, scope, component);
        local.wildcard = Some(match local.wildcard.take() {
            Some(existing) => wildcard.intersected_with(&existing),
            None => wildcard,
        });
    }
}

fn attribute_use(
    ctx: &mut CompileContext,
    attribute: &ParsedAttribute,
    scope: &Arc<DocScope>,
    owner: TypeId,
    component: Option<&QName>,
) -> Option<SchemaAttributeUse> {
    let use_mode = match attribute.use_value.as_deref().map(AttributeUse::from_str) {
        None => AttributeUse::Optional,
        Some(Ok(use_mode)) => use_mode,
        Some(Err(err)) => {
            ctx.error(codes::INVALID_VALUE, component, err.to_string());
            AttributeUse::Optional
        }
    };

    let mut result = if let Some(reference) = &attribute.reference {
        let name = scope.reference(reference);
        let Some(global) = ctx.attributes.get(&name) else {
            ctx.missing(component, "attribute", &name);
            return None;
        };
        let mut result = SchemaAttributeUse::new(name, global.type_id).with_use(use_mode);
        result.default_value = global.default_value.clone();
        result.fixed_value = global.fixed_value.clone();
        result
    } else {
        let local = match attribute.name.as_deref() {
            Some(local) if is_valid_ncname(local) => local,
            other => {
                ctx.error(
                    codes::INVALID_NAME,
                    component,
                    format!("local attribute name {:?} is not a valid NCName", other),
                );
                return None;
            }
        };
        let name = scope.local(local, attribute.form.as_deref(), scope.attributes_qualified);
        let type_id = attribute_type(ctx, attribute, scope, Some(owner), component);
        SchemaAttributeUse::new(name, type_id).with_use(use_mode)
    };

    if attribute.default.is_some() {
        result.default_value = attribute.default.clone();
    }
    if attribute.fixed.is_some() {
        result.fixed_value = attribute.fixed.clone();
    }
    Some(result)
}

/// Simple type of an attribute declaration, anySimpleType when none is given
pub(crate) fn attribute_type(
    ctx: &mut CompileContext,
    attribute: &ParsedAttribute,
    scope: &Arc<DocScope>,
    outer: Option<TypeId>,
    component: Option<&QName>,
) -> TypeId {
    if let Some(type_name) = &attribute.type_name {
        return ctx.lookup_type(type_name, scope, component, TypeId::ANY_SIMPLE_TYPE);
    }
    let Some(simple) = &attribute.simple_type else {
        return TypeId::ANY_SIMPLE_TYPE;
    };
    let id = ctx.add_anonymous_simple(simple, scope, outer, None);
    if let Some(outer) = outer {
        ctx.ty_mut(outer).anonymous_types.push(id);
    }
    id
}

/// Attribute model of a type with no explicit derivation
pub(crate) fn basic_attributes(local: LocalAttributes) -> SchemaAttributeModel {
    let mut model = SchemaAttributeModel::new();
    for attribute_use in local.uses {
        if !attribute_use.is_prohibited() {
            model.set(attribute_use);
        }
    }
    model.set_wildcard(local.wildcard);
    model
}

/// Attribute model of an extension: the base model plus the local uses,
/// with wildcards unioned
pub(crate) fn extend_attributes(
    ctx: &mut CompileContext,
    base: &SchemaAttributeModel,
    local: LocalAttributes,
    component: Option<&QName>,
) -> SchemaAttributeModel {
    let mut model = base.clone();
    for attribute_use in local.uses {
        if base.contains(&attribute_use.name) {
            ctx.error(
                codes::CT_EXTENDS_ATTRIBUTE,
                component,
                format!("extension redeclares base attribute {}", attribute_use.name),
            );
        }
        if attribute_use.is_prohibited() {
            model.remove(&attribute_use.name);
        } else {
            model.set(attribute_use);
        }
    }

    let wildcard = match (base.wildcard(), local.wildcard) {
        (Some(base), Some(local)) => Some(base.extended_by(&local)),
        (base, local) => local.or_else(|| base.cloned()),
    };
    model.set_wildcard(wildcard);
    model
}

/// Attribute model of a restriction: the base model overridden by the
/// local uses, checked for being a valid restriction
pub(crate) fn restrict_attributes(
    ctx: &mut CompileContext,
    base: &SchemaAttributeModel,
    local: LocalAttributes,
    component: Option<&QName>,
) -> SchemaAttributeModel {
    let mut model = base.clone();
    for attribute_use in local.uses {
        let name = attribute_use.name.clone();
        match base.get(&name) {
            Some(base_use) if attribute_use.is_prohibited() => {
                if base_use.is_required() {
                    ctx.error(
                        codes::RESTRICTION_ATTR_PROHIBITED,
                        component,
                        format!("restriction prohibits required attribute {}", name),
                    );
                } else {
                    model.remove(&name);
                }
            }
            Some(base_use) => {
                if base_use.is_required() && !attribute_use.is_required() {
                    ctx.error(
                        codes::RESTRICTION_ATTR_REQUIRED,
                        component,
                        format!("restriction makes required attribute {} optional", name),
                    );
                }
                if let Some(fixed) = &base_use.fixed_value {
                    if attribute_use.fixed_value.as_ref() != Some(fixed) {
                        ctx.error(
                            codes::RESTRICTION_ATTR_FIXED,
                            component,
                            format!("restriction changes the fixed value '{}' of attribute {}", fixed, name),
                        );
                    }
                }
                model.set(attribute_use);
            }
            None if attribute_use.is_prohibited() => {}
            None => {
                if !base.wildcard().map_or(false, |w| w.is_matching(&name)) {
                    ctx.error(
                        codes::RESTRICTION_ATTR_NOT_IN_BASE,
                        component,
                        format!("attribute {} is not allowed by the base type", name),
                    );
                }
                model.set(attribute_use);
            }
        }
    }

    if let Some(wildcard) = &local.wildcard {
        let valid = base.wildcard().map_or(false, |base| {
            wildcard.is_subset_of(base) && wildcard.process_contents.is_restriction_of(&base.process_contents)
        });
        if !valid {
            ctx.error(
                codes::RESTRICTION_WILDCARD,
                component,
                "attribute wildcard is not a restriction of the base wildcard".to_string(),
            );
        }
    }
    model.set_wildcard(local.wildcard);
    model
}
