//! Content-model construction
//!
//! Translates parsed particles into a [`SchemaParticle`] tree: named group
//! references are expanded, occurrence attributes are parsed, and
//! pointless wrapper groups are removed as the tree is assembled.
//!
//! Pointless-particle elimination rules:
//! - a 1..1 sequence directly inside a sequence is spliced into its parent,
//!   and likewise a 1..1 choice inside a choice;
//! - any particle with maxOccurs 0 disappears;
//! - an empty sequence or all disappears, an empty choice disappears only
//!   when it is optional;
//! - a 1..1 group with a single child is replaced by that child.

use std::sync::Arc;
use tracing::debug;

use super::context::{CompileContext, DocScope};
use crate::components::particles::{
    parse_occurs, ElementTerm, Occurs, ParticleKind, ParticleTerm, SchemaParticle,
};
use crate::components::qnameset::QNameSet;
use crate::components::types::TypeId;
use crate::components::wildcards::{ProcessContents, Wildcard};
use crate::error::codes;
use crate::names::is_valid_ncname;
use crate::namespaces::QName;
use crate::parsed::{ParsedElement, ParsedGroupRef, ParsedParticle, ParsedWildcard};

/// Append `particle` to the children of a `parent_kind` group, splicing its
/// own children in when it is a pointless group of the same kind
pub fn add_minus_pointless(
    children: &mut Vec<SchemaParticle>,
    particle: SchemaParticle,
    parent_kind: ParticleKind,
) {
    let splice = particle.is_singleton()
        && particle.kind() == parent_kind
        && matches!(parent_kind, ParticleKind::Sequence | ParticleKind::Choice);
    if splice {
        children.extend(particle.into_children());
    } else {
        children.push(particle);
    }
}

/// Drop or collapse a particle that contributes nothing on its own
pub fn filter_pointless(particle: SchemaParticle) -> Option<SchemaParticle> {
    if particle.occurs.max == Some(0) {
        return None;
    }
    let count = particle.children().len();
    match particle.kind() {
        ParticleKind::Element | ParticleKind::Wildcard => Some(particle),
        ParticleKind::Sequence | ParticleKind::All if count == 0 => None,
        ParticleKind::Choice if count == 0 && particle.occurs.min == 0 => None,
        _ if count == 1 && particle.is_singleton() => particle.into_children().pop(),
        _ => Some(particle),
    }
}

/// Assemble a group from already simplified children
pub fn make_group(
    kind: ParticleKind,
    children: Vec<SchemaParticle>,
    occurs: Occurs,
) -> Option<SchemaParticle> {
    let mut flat = Vec::with_capacity(children.len());
    for child in children {
        add_minus_pointless(&mut flat, child, kind);
    }
    filter_pointless(SchemaParticle::group(kind, flat, occurs)?)
}

/// Apply pointless-particle elimination to a whole tree, bottom-up
pub fn simplify(particle: SchemaParticle) -> Option<SchemaParticle> {
    if !particle.is_group() {
        return filter_pointless(particle);
    }
    let kind = particle.kind();
    let occurs = particle.occurs;
    let children = particle
        .into_children()
        .into_iter()
        .filter_map(simplify)
        .collect();
    make_group(kind, children, occurs)
}

/// Content model of an extension: the base particle followed by the
/// extension's own particle
pub fn extend_content(
    base: Option<SchemaParticle>,
    extension: Option<SchemaParticle>,
) -> Option<SchemaParticle> {
    match (base, extension) {
        (base, None) => base,
        (None, extension) => extension,
        (Some(base), Some(extension)) => {
            let mut children = Vec::with_capacity(2);
            add_minus_pointless(&mut children, base, ParticleKind::Sequence);
            add_minus_pointless(&mut children, extension, ParticleKind::Sequence);
            make_group(ParticleKind::Sequence, children, Occurs::once())
        }
    }
}

/// Report `all` groups that are nested, repeated, or hold anything other
/// than single elements
pub(crate) fn check_all_groups(
    ctx: &mut CompileContext,
    particle: &SchemaParticle,
    component: Option<&QName>,
) {
    check_all(ctx, particle, component, false);
}

fn check_all(
    ctx: &mut CompileContext,
    particle: &SchemaParticle,
    component: Option<&QName>,
    nested: bool,
) {
    match &particle.term {
        ParticleTerm::All(children) => {
            if nested {
                ctx.error(
                    codes::ALL_NESTED,
                    component,
                    "an all group must be the whole content model".to_string(),
                );
            }
            if particle.occurs.max.map_or(true, |max| max > 1) {
                ctx.error(
                    codes::ALL_LIMITED,
                    component,
                    format!("maxOccurs of an all group must be 0 or 1, found {}", particle),
                );
            }
            for child in children {
                let single_element = child.kind() == ParticleKind::Element
                    && child.occurs.max.map_or(false, |max| max <= 1);
                if !single_element {
                    ctx.error(
                        codes::ALL_LIMITED,
                        component,
                        format!("all group member {} must be an element with maxOccurs 0 or 1", child),
                    );
                }
                if child.is_group() {
                    check_all(ctx, child, component, true);
                }
            }
        }
        ParticleTerm::Sequence(children) | ParticleTerm::Choice(children) => {
            for child in children {
                check_all(ctx, child, component, true);
            }
        }
        ParticleTerm::Element(_) | ParticleTerm::Wildcard(_) => {}
    }
}

/// Resolve the type of an element declaration: a named type, an inline
/// anonymous type, or None when the declaration names no type
pub(crate) fn element_type(
    ctx: &mut CompileContext,
    element: &ParsedElement,
    scope: &Arc<DocScope>,
    outer: Option<TypeId>,
    component: Option<&QName>,
) -> Option<TypeId> {
    if let Some(type_name) = &element.type_name {
        return Some(ctx.lookup_type(type_name, scope, component, TypeId::ANY_TYPE));
    }
    let id = match (&element.complex_type, &element.simple_type) {
        (Some(complex), _) => ctx.add_anonymous_complex(complex, scope, outer),
        (None, Some(simple)) => ctx.add_anonymous_simple(simple, scope, outer, None),
        (None, None) => return None,
    };
    if let Some(outer) = outer {
        ctx.ty_mut(outer).anonymous_types.push(id);
    }
    Some(id)
}

/// Build the wildcard of an `any` or `anyAttribute`, falling back to an
/// empty wildcard when its namespace specification is malformed
pub(crate) fn build_wildcard(
    ctx: &mut CompileContext,
    parsed: &ParsedWildcard,
    scope: &DocScope,
    component: Option<&QName>,
) -> Wildcard {
    let not_qnames: Vec<QName> = parsed.not_qname.iter().map(|n| scope.reference(n)).collect();
    match Wildcard::from_attributes(
        parsed.namespace.as_deref(),
        parsed.not_namespace.as_deref(),
        &not_qnames,
        parsed.process_contents.as_deref(),
        scope.target_namespace.as_deref(),
    ) {
        Ok(wildcard) => wildcard,
        Err(err) => {
            ctx.error(codes::WILDCARD_NAMESPACE, component, err.to_string());
            Wildcard::new(QNameSet::empty(), ProcessContents::Strict)
        }
    }
}

/// Builds the particle tree of one type
pub(crate) struct ModelBuilder<'c> {
    ctx: &'c mut CompileContext,
    scope: Arc<DocScope>,
    owner: TypeId,
    component: Option<QName>,
    depth_reported: bool,
}

impl<'c> ModelBuilder<'c> {
    /// Builder for the content of `owner`
    pub(crate) fn new(ctx: &'c mut CompileContext, scope: &Arc<DocScope>, owner: TypeId) -> Self {
        let component = ctx.component_name(owner);
        Self {
            ctx,
            scope: Arc::clone(scope),
            owner,
            component,
            depth_reported: false,
        }
    }

    /// Build and simplify a content model
    pub(crate) fn build(mut self, parsed: Option<&ParsedParticle>) -> Option<SchemaParticle> {
        let particle = self.particle(parsed?, 1)?;
        debug!(component = %self.ctx.label(self.owner), model = %particle, "content model built");
        Some(particle)
    }

    fn particle(&mut self, parsed: &ParsedParticle, depth: usize) -> Option<SchemaParticle> {
        if let Err(err) = self.ctx.options.check_model_depth(depth) {
            if !self.depth_reported {
                self.depth_reported = true;
                self.ctx.error(codes::MODEL_DEPTH, self.component.as_ref(), err.to_string());
            }
            return None;
        }
        let occurs = self.occurs(parsed);
        match parsed {
            ParsedParticle::Element(element) => self.element(element, occurs),
            ParsedParticle::Any(wildcard) => {
                let wildcard = build_wildcard(self.ctx, wildcard, &self.scope, self.component.as_ref());
                filter_pointless(SchemaParticle::wildcard(wildcard, occurs))
            }
            ParsedParticle::Sequence(group) => {
                self.group(ParticleKind::Sequence, &group.particles, occurs, depth)
            }
            ParsedParticle::Choice(group) => {
                self.group(ParticleKind::Choice, &group.particles, occurs, depth)
            }
            ParsedParticle::All(group) => self.group(ParticleKind::All, &group.particles, occurs, depth),
            ParsedParticle::Group(reference) => self.group_ref(reference, occurs, depth),
        }
    }

    fn occurs(&mut self, parsed: &ParsedParticle) -> Occurs {
        let (min, max) = parsed.occurs_attributes();
        match parse_occurs(min, max) {
            Ok(occurs) => occurs,
            Err(err) => {
                self.ctx.error(codes::OCCURS, self.component.as_ref(), err.to_string());
                Occurs::once()
            }
        }
    }

    fn group(
        &mut self,
        kind: ParticleKind,
        particles: &[ParsedParticle],
        occurs: Occurs,
        depth: usize,
    ) -> Option<SchemaParticle> {
        let children = particles
            .iter()
            .filter_map(|p| self.particle(p, depth + 1))
            .collect();
        let group = make_group(kind, children, occurs);
        if let Some(particle) = &group {
            if particle.kind() == ParticleKind::Choice && particle.children().is_empty() {
                self.ctx.warning(
                    codes::EMPTY_CHOICE,
                    self.component.as_ref(),
                    "required choice has no alternatives and can never be satisfied".to_string(),
                );
            }
        }
        group
    }

    fn group_ref(
        &mut self,
        reference: &ParsedGroupRef,
        occurs: Occurs,
        depth: usize,
    ) -> Option<SchemaParticle> {
        let name = self.scope.reference(&reference.reference);
        let Some(group) = self.ctx.groups.get(&name).cloned() else {
            self.ctx.missing(self.component.as_ref(), "model group", &name);
            return None;
        };
        if !self.ctx.processing_groups.insert(name.clone()) {
            self.ctx.error(
                codes::CIRCULAR,
                self.component.as_ref(),
                format!("model group {} refers to itself", name),
            );
            return None;
        }
        debug!(group = %name, "expanding model group");

        let saved = std::mem::replace(&mut self.scope, Arc::clone(&group.scope));
        let particle = match &group.def.particle {
            ParsedParticle::Sequence(g) => self.group(ParticleKind::Sequence, &g.particles, occurs, depth),
            ParsedParticle::Choice(g) => self.group(ParticleKind::Choice, &g.particles, occurs, depth),
            ParsedParticle::All(g) => self.group(ParticleKind::All, &g.particles, occurs, depth),
            other => {
                let child = self.particle(other, depth + 1);
                make_group(ParticleKind::Sequence, child.into_iter().collect(), occurs)
            }
        };
        self.scope = saved;

        self.ctx.processing_groups.remove(&name);
        particle
    }

    fn element(&mut self, element: &ParsedElement, occurs: Occurs) -> Option<SchemaParticle> {
        let component = self.component.clone();
        let term = if let Some(reference) = &element.reference {
            let name = self.scope.reference(reference);
            let Some(decl) = self.ctx.elements.get(&name) else {
                self.ctx.missing(component.as_ref(), "element", &name);
                return None;
            };
            ElementTerm {
                type_id: decl.type_id,
                nillable: decl.nillable,
                default_value: decl.default_value.clone(),
                fixed_value: decl.fixed_value.clone(),
                is_global: true,
                accepted_names: self.ctx.accepted_names(&name),
                name,
            }
        } else {
            let local = match element.name.as_deref() {
                Some(local) if is_valid_ncname(local) => local,
                other => {
                    self.ctx.error(
                        codes::INVALID_NAME,
                        component.as_ref(),
                        format!("local element name {:?} is not a valid NCName", other),
                    );
                    return None;
                }
            };
            let name = self
                .scope
                .local(local, element.form.as_deref(), self.scope.elements_qualified);
            let scope = Arc::clone(&self.scope);
            let type_id = element_type(self.ctx, element, &scope, Some(self.owner), component.as_ref())
                .unwrap_or(TypeId::ANY_TYPE);
            ElementTerm {
                type_id,
                nillable: element.nillable,
                default_value: element.default.clone(),
                fixed_value: element.fixed.clone(),
                is_global: false,
                accepted_names: QNameSet::singleton(name.clone()),
                name,
            }
        };
        filter_pointless(SchemaParticle::element(term, occurs))
    }
}
