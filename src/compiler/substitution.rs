//! Substitution groups and document types
//!
//! Every global element is wrapped in a document type. Before a document
//! type may resolve, its element is linked into the substitution group it
//! names: the head must exist and head chains must be acyclic, otherwise
//! the link is dropped. Members without a declared type take the head's.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#Element_Equivalence_Class

use tracing::debug;

use super::context::CompileContext;
use super::phases::{Entry, Phase};
use super::upa::build_state_machine;
use crate::components::particles::{ElementTerm, Occurs, SchemaParticle};
use crate::components::types::{ContentVariety, DerivationMethod, TypeId};
use crate::components::typesystem::derives_in;
use crate::error::codes;
use crate::namespaces::QName;

/// Link every global element into its substitution group
pub(crate) fn resolve_substitution_groups(ctx: &mut CompileContext) {
    let names: Vec<QName> = ctx.elements.keys().cloned().collect();
    for name in &names {
        link(ctx, name);
    }
}

/// Link one element; false when its document type is already being linked
/// further up the call stack
fn link(ctx: &mut CompileContext, name: &QName) -> bool {
    let Some(document_type) = ctx.elements.get(name).map(|e| e.document_type) else {
        return false;
    };
    match ctx.ty(document_type).substitution_entry() {
        Entry::Done => return true,
        Entry::Circular => {
            ctx.error(
                codes::CIRCULAR,
                Some(name),
                format!("substitution group chain of {} is circular", name),
            );
            return false;
        }
        Entry::Proceed => {}
    }
    ctx.ty_mut(document_type)
        .advance_phase(Phase::ResolvingSubstitutionGroups);

    let head = ctx.element_sources.get(name).and_then(|source| {
        source
            .def
            .substitution_group
            .as_ref()
            .map(|head| source.scope.reference(head))
    });
    if let Some(head) = head {
        if !ctx.elements.contains_key(&head) {
            ctx.missing(Some(name), "substitution group head", &head);
        } else if link(ctx, &head) {
            join(ctx, name, &head);
        }
    }

    ctx.ty_mut(document_type)
        .advance_phase(Phase::ResolvedSubstitutionGroups);
    true
}

fn join(ctx: &mut CompileContext, member: &QName, head: &QName) {
    let head_type = ctx.elements[head].type_id;
    if let Some(element) = ctx.elements.get_mut(member) {
        if !element.has_declared_type {
            element.type_id = head_type;
        }
        element.substitution_group = Some(head.clone());
    }
    if let Some(element) = ctx.elements.get_mut(head) {
        element.substitution_members.push(member.clone());
    }
    debug!(member = %member, head = %head, "substitution group linked");
}

/// Resolve the document type of a global element: a single required
/// particle for the element, accepting its substitution group
pub(crate) fn resolve_document_type(ctx: &mut CompileContext, id: TypeId, element: &QName) {
    let Some(decl) = ctx.elements.get(element) else {
        return;
    };
    let term = ElementTerm {
        name: element.clone(),
        type_id: decl.type_id,
        nillable: decl.nillable,
        default_value: decl.default_value.clone(),
        fixed_value: decl.fixed_value.clone(),
        is_global: true,
        accepted_names: ctx.accepted_names(element),
    };
    let is_abstract = decl.is_abstract;
    let documentation = if ctx.options.disable_annotations {
        Vec::new()
    } else {
        decl.documentation.clone()
    };

    let particle = SchemaParticle::element(term, Occurs::once());
    build_state_machine(&particle);

    let ty = ctx.resolving_mut(id);
    ty.base_type = Some(TypeId::ANY_TYPE);
    ty.base_depth = 1;
    ty.derivation = DerivationMethod::Restriction;
    ty.content_variety = ContentVariety::ElementOnly;
    ty.content_model = Some(particle);
    ty.is_abstract = is_abstract;
    ty.documentation = documentation;
}

/// Report members whose type does not derive from their head's type
///
/// Runs once every type is resolved, since it walks base chains.
pub(crate) fn check_member_types(ctx: &mut CompileContext) {
    let mut mismatches = Vec::new();
    for element in ctx.elements.values() {
        let Some(head) = element.substitution_group.as_ref() else {
            continue;
        };
        let head_type = ctx.elements[head].type_id;
        if !derives_in(&ctx.types, element.type_id, head_type) {
            mismatches.push((element.name.clone(), head.clone(), head_type, element.type_id));
        }
    }
    for (member, head, head_type, member_type) in mismatches {
        ctx.error(
            codes::SUBSTITUTION_TYPE,
            Some(&member),
            format!(
                "type {} of {} does not derive from type {} of its head {}",
                ctx.label(member_type),
                member,
                ctx.label(head_type),
                head
            ),
        );
    }
}
