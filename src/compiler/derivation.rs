//! Complex-type derivation
//!
//! A complex type definition takes exactly one of five forms: complex
//! content extension or restriction, simple content extension or
//! restriction, or the basic form with a particle directly inside the
//! type. Each form fixes the base type, the content model, the attribute
//! model and the content variety; all of them end by summarizing
//! wildcards and building the content model's state machine.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#Complex_Type_Definition_details

use std::sync::Arc;

use super::attributes::{
    basic_attributes, extend_attributes, gather_attributes, restrict_attributes,
};
use super::content::{check_all_groups, extend_content, ModelBuilder};
use super::context::{CompileContext, DocScope, Scoped};
use super::resolve_type;
use super::simple::require_simple;
use super::upa::check_content_model;
use crate::components::attributes::SchemaAttributeModel;
use crate::components::particles::{ParticleTerm, SchemaParticle};
use crate::components::qnameset::QNameSet;
use crate::components::types::{ContentVariety, DerivationMethod, TypeId};
use crate::error::codes;
use crate::namespaces::QName;
use crate::parsed::{
    ParsedComplexType, ParsedDerivation, ParsedMethod, ParsedSimpleDerivation,
    ParsedSimpleRestriction, ParsedSimpleType,
};

/// Which of the mutually exclusive definition forms a type uses
#[derive(Debug, Clone, Copy)]
enum Form<'a> {
    Basic,
    ComplexContent(&'a ParsedDerivation),
    SimpleContent(&'a ParsedDerivation),
}

/// Per-type inputs shared by every form
struct Target<'a> {
    id: TypeId,
    def: &'a ParsedComplexType,
    scope: &'a Arc<DocScope>,
    component: Option<QName>,
}

impl Target<'_> {
    fn component(&self) -> Option<&QName> {
        self.component.as_ref()
    }
}

/// Resolve a complex type definition into `id`
pub(crate) fn resolve_complex(
    ctx: &mut CompileContext,
    id: TypeId,
    source: &Scoped<ParsedComplexType>,
) {
    let target = Target {
        id,
        def: &source.def,
        scope: &source.scope,
        component: ctx.component_name(id),
    };
    let final_flags = ctx.derivation_flags(target.def.final_value.as_deref(), target.component());
    let block_flags = ctx.derivation_flags(target.def.block.as_deref(), target.component());
    {
        let ty = ctx.resolving_mut(id);
        ty.is_abstract = target.def.is_abstract;
        ty.final_flags = final_flags;
        ty.block_flags = block_flags;
    }

    match classify(ctx, &target) {
        Form::Basic => resolve_basic(ctx, &target),
        Form::ComplexContent(d) if d.method == ParsedMethod::Extension => {
            complex_extension(ctx, &target, d)
        }
        Form::ComplexContent(d) => complex_restriction(ctx, &target, d),
        Form::SimpleContent(d) if d.method == ParsedMethod::Extension => {
            simple_extension(ctx, &target, d)
        }
        Form::SimpleContent(d) => simple_restriction(ctx, &target, d),
    }

    finish(ctx, &target);
}

fn classify<'a>(ctx: &mut CompileContext, target: &Target<'a>) -> Form<'a> {
    let def = target.def;
    let basic = def.particle.is_some() || !def.attribute_decls.is_empty();
    let mut forms = Vec::with_capacity(3);
    if let Some(d) = &def.complex_content {
        forms.push(Form::ComplexContent(d));
    }
    if let Some(d) = &def.simple_content {
        forms.push(Form::SimpleContent(d));
    }
    if basic || forms.is_empty() {
        forms.push(Form::Basic);
    }
    if forms.len() > 1 {
        ctx.error(
            codes::CT_CONTENT_FORMS,
            target.component(),
            format!(
                "{} combines {} content forms; only the first is used",
                ctx.label(target.id),
                forms.len()
            ),
        );
    }
    forms[0]
}

/// Resolve the base named by a derivation; `None` when it is unnamed,
/// missing or circular and the base must be treated as absent
fn resolve_base(
    ctx: &mut CompileContext,
    target: &Target<'_>,
    derivation: &ParsedDerivation,
) -> Option<TypeId> {
    let Some(name) = &derivation.base else {
        ctx.error(
            codes::SRC_RESOLVE,
            target.component(),
            "derivation does not name a base type".to_string(),
        );
        return None;
    };
    let base = ctx.find_type(name, target.scope, target.component())?;
    resolve_type(ctx, base).then_some(base)
}

fn set_base(ctx: &mut CompileContext, id: TypeId, base: TypeId, method: DerivationMethod) {
    let depth = ctx.ty(base).base_depth + 1;
    let ty = ctx.resolving_mut(id);
    ty.base_type = Some(base);
    ty.base_depth = depth;
    ty.derivation = method;
}

fn check_final(ctx: &mut CompileContext, target: &Target<'_>, base: TypeId, method: DerivationMethod) {
    if !ctx.ty(base).final_flags.contains(method) {
        return;
    }
    let code = match method {
        DerivationMethod::Restriction => codes::CT_FINAL_RESTRICTION,
        _ => codes::CT_FINAL_EXTENSION,
    };
    ctx.error(
        code,
        target.component(),
        format!("{} is final for {}", ctx.label(base), method),
    );
}

fn content_variety(mixed: bool, model: Option<&SchemaParticle>) -> ContentVariety {
    match (mixed, model) {
        (true, _) => ContentVariety::Mixed,
        (false, None) => ContentVariety::Empty,
        (false, Some(_)) => ContentVariety::ElementOnly,
    }
}

fn store(
    ctx: &mut CompileContext,
    id: TypeId,
    variety: ContentVariety,
    model: Option<SchemaParticle>,
    attributes: SchemaAttributeModel,
) {
    let ty = ctx.resolving_mut(id);
    ty.content_variety = variety;
    ty.content_model = model;
    ty.attribute_model = attributes;
}

fn resolve_basic(ctx: &mut CompileContext, target: &Target<'_>) {
    set_base(ctx, target.id, TypeId::ANY_TYPE, DerivationMethod::Restriction);
    let model = ModelBuilder::new(ctx, target.scope, target.id).build(target.def.particle.as_ref());
    let local = gather_attributes(ctx, &target.def.attribute_decls, target.scope, target.id);
    let variety = content_variety(target.def.mixed, model.as_ref());
    store(ctx, target.id, variety, model, basic_attributes(local));
}

fn complex_extension(ctx: &mut CompileContext, target: &Target<'_>, derivation: &ParsedDerivation) {
    let resolved = resolve_base(ctx, target, derivation);
    let mut base = resolved.unwrap_or(TypeId::ANY_TYPE);
    let mut inherit = resolved.is_some();
    if ctx.ty(base).is_simple() {
        ctx.error(
            codes::CT_EXTENDS_SIMPLE,
            target.component(),
            format!("complex content cannot extend simple type {}", ctx.label(base)),
        );
        base = TypeId::ANY_TYPE;
        inherit = false;
    }
    check_final(ctx, target, base, DerivationMethod::Extension);
    set_base(ctx, target.id, base, DerivationMethod::Extension);

    let own = ModelBuilder::new(ctx, target.scope, target.id).build(derivation.particle.as_ref());
    let has_own = own.is_some();
    let (base_model, base_variety, base_attributes) = if inherit {
        let base_type = ctx.ty(base);
        (
            base_type.content_model.clone(),
            base_type.content_variety,
            base_type.attribute_model.clone(),
        )
    } else {
        (None, ContentVariety::Empty, SchemaAttributeModel::new())
    };

    let mixed = derivation.mixed.unwrap_or(target.def.mixed);
    let variety = if !inherit {
        content_variety(mixed, own.as_ref())
    } else if !has_own {
        base_variety
    } else {
        let own_variety = content_variety(mixed, own.as_ref());
        match base_variety {
            ContentVariety::Empty => own_variety,
            ContentVariety::ElementOnly | ContentVariety::Mixed if base_variety == own_variety => own_variety,
            _ => {
                ctx.error(
                    codes::CT_EXTENDS_MIXED,
                    target.component(),
                    format!(
                        "{} content cannot extend {} content of {}",
                        own_variety,
                        base_variety,
                        ctx.label(base)
                    ),
                );
                own_variety
            }
        }
    };
    if variety == ContentVariety::Simple {
        inherit_simple_content(ctx, target.id, base);
    }

    let model = extend_content(base_model, own);
    let local = gather_attributes(ctx, &derivation.attribute_decls, target.scope, target.id);
    let attributes = extend_attributes(ctx, &base_attributes, local, target.component());
    store(ctx, target.id, variety, model, attributes);
}

fn complex_restriction(ctx: &mut CompileContext, target: &Target<'_>, derivation: &ParsedDerivation) {
    let mut base = resolve_base(ctx, target, derivation).unwrap_or(TypeId::ANY_TYPE);
    if ctx.ty(base).is_simple() {
        ctx.error(
            codes::CT_EXTENDS_SIMPLE,
            target.component(),
            format!("complex content cannot restrict simple type {}", ctx.label(base)),
        );
        base = TypeId::ANY_TYPE;
    }
    check_final(ctx, target, base, DerivationMethod::Restriction);
    set_base(ctx, target.id, base, DerivationMethod::Restriction);

    let model = ModelBuilder::new(ctx, target.scope, target.id).build(derivation.particle.as_ref());
    if let Some(model) = &model {
        check_restricted_wildcards(ctx, target, model, base);
    }
    let mixed = derivation.mixed.unwrap_or(target.def.mixed);
    let variety = content_variety(mixed, model.as_ref());

    let base_attributes = ctx.ty(base).attribute_model.clone();
    let local = gather_attributes(ctx, &derivation.attribute_decls, target.scope, target.id);
    let attributes = restrict_attributes(ctx, &base_attributes, local, target.component());
    store(ctx, target.id, variety, model, attributes);
}

/// Every element wildcard of a restriction must lie within the wildcards
/// of the base content model
fn check_restricted_wildcards(
    ctx: &mut CompileContext,
    target: &Target<'_>,
    model: &SchemaParticle,
    base: TypeId,
) {
    let mut allowed = QNameSet::empty();
    if let Some(base_model) = &ctx.ty(base).content_model {
        base_model.walk(&mut |p| {
            if let Some(wildcard) = p.as_wildcard() {
                allowed = allowed.union(&wildcard.names);
            }
        });
    }
    let mut offending = Vec::new();
    model.walk(&mut |p| {
        if let Some(wildcard) = p.as_wildcard() {
            if !allowed.contains_all(&wildcard.names) {
                offending.push(wildcard.names.to_string());
            }
        }
    });
    for names in offending {
        ctx.error(
            codes::RESTRICTION_WILDCARD,
            target.component(),
            format!("wildcard {} is not allowed by the base content of {}", names, ctx.label(base)),
        );
    }
}

/// The simple type text content of `base` is based on, if it has one
fn simple_content_of(ctx: &CompileContext, base: TypeId) -> Option<TypeId> {
    let base_type = ctx.ty(base);
    if base_type.is_simple() {
        Some(base)
    } else if base_type.content_variety == ContentVariety::Simple {
        base_type.content_based_on
    } else {
        None
    }
}

fn inherit_simple_content(ctx: &mut CompileContext, id: TypeId, based_on_type: TypeId) {
    let based_on = simple_content_of(ctx, based_on_type).unwrap_or(TypeId::ANY_SIMPLE_TYPE);
    set_simple_content(ctx, id, based_on);
}

fn set_simple_content(ctx: &mut CompileContext, id: TypeId, based_on: TypeId) {
    let simple = ctx.ty(based_on).simple.clone();
    let ty = ctx.resolving_mut(id);
    ty.content_variety = ContentVariety::Simple;
    ty.content_based_on = Some(based_on);
    ty.simple = simple;
}

fn simple_extension(ctx: &mut CompileContext, target: &Target<'_>, derivation: &ParsedDerivation) {
    let base = resolve_base(ctx, target, derivation).unwrap_or(TypeId::ANY_SIMPLE_TYPE);
    let based_on = match simple_content_of(ctx, base) {
        Some(based_on) => based_on,
        None => {
            ctx.error(
                codes::CT_SIMPLE_CONTENT_BASE,
                target.component(),
                format!("{} has no simple content to extend", ctx.label(base)),
            );
            TypeId::ANY_SIMPLE_TYPE
        }
    };
    check_final(ctx, target, base, DerivationMethod::Extension);
    set_base(ctx, target.id, base, DerivationMethod::Extension);

    let base_attributes = ctx.ty(base).attribute_model.clone();
    let local = gather_attributes(ctx, &derivation.attribute_decls, target.scope, target.id);
    let attributes = extend_attributes(ctx, &base_attributes, local, target.component());
    store(ctx, target.id, ContentVariety::Simple, None, attributes);
    set_simple_content(ctx, target.id, based_on);
}

fn simple_restriction(ctx: &mut CompileContext, target: &Target<'_>, derivation: &ParsedDerivation) {
    let base = resolve_base(ctx, target, derivation).unwrap_or(TypeId::ANY_TYPE);
    let inherited = match simple_content_of(ctx, base) {
        Some(based_on) if ctx.ty(base).is_complex() => based_on,
        _ => {
            ctx.error(
                codes::CT_SIMPLE_CONTENT_BASE,
                target.component(),
                format!("{} is not a complex type with simple content", ctx.label(base)),
            );
            TypeId::ANY_SIMPLE_TYPE
        }
    };
    check_final(ctx, target, base, DerivationMethod::Restriction);
    set_base(ctx, target.id, base, DerivationMethod::Restriction);

    let based_on = if derivation.simple_type.is_some() || !derivation.facets.is_empty() {
        let synthesized = ParsedSimpleType {
            name: None,
            final_value: None,
            derivation: ParsedSimpleDerivation::Restriction(ParsedSimpleRestriction {
                base: None,
                simple_type: derivation.simple_type.clone(),
                facets: derivation.facets.clone(),
            }),
            documentation: Vec::new(),
        };
        let override_base = match derivation.simple_type {
            Some(_) => None,
            None => Some(inherited),
        };
        let anonymous =
            ctx.add_anonymous_simple(&synthesized, target.scope, Some(target.id), override_base);
        ctx.resolving_mut(target.id).anonymous_types.push(anonymous);
        require_simple(ctx, anonymous, target.component())
    } else {
        inherited
    };

    let base_attributes = ctx.ty(base).attribute_model.clone();
    let local = gather_attributes(ctx, &derivation.attribute_decls, target.scope, target.id);
    let attributes = restrict_attributes(ctx, &base_attributes, local, target.component());
    store(ctx, target.id, ContentVariety::Simple, None, attributes);
    set_simple_content(ctx, target.id, based_on);
}

/// Wildcard summary, content-model checks and annotations
fn finish(ctx: &mut CompileContext, target: &Target<'_>) {
    let model = ctx.resolving_mut(target.id).content_model.take();

    let mut element_wildcards = QNameSet::empty();
    let mut declared = Vec::new();
    if let Some(model) = &model {
        model.walk(&mut |p| match &p.term {
            ParticleTerm::Wildcard(wildcard) => {
                element_wildcards = element_wildcards.union(&wildcard.names)
            }
            ParticleTerm::Element(element) => declared.push(element.name.clone()),
            _ => {}
        });
    }
    let element_wildcard_names = element_wildcards.difference(&QNameSet::from_names(declared));

    let attribute_model = &ctx.ty(target.id).attribute_model;
    let attribute_wildcard_names = match attribute_model.wildcard() {
        Some(wildcard) => wildcard
            .names
            .difference(&QNameSet::from_names(attribute_model.iter().map(|u| u.name.clone()))),
        None => QNameSet::empty(),
    };

    if let Some(model) = &model {
        let label = ctx.label(target.id);
        check_all_groups(ctx, model, target.component());
        check_content_model(ctx, model, target.component(), &label);
    }

    let documentation = if ctx.options.disable_annotations {
        Vec::new()
    } else {
        target.def.documentation.clone()
    };
    let ty = ctx.resolving_mut(target.id);
    ty.content_model = model;
    ty.element_wildcard_names = element_wildcard_names;
    ty.attribute_wildcard_names = attribute_wildcard_names;
    ty.documentation = documentation;
}
