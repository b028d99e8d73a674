//! Determinism state machine
//!
//! A bottom-up walk that attaches [`Transitions`] to every particle of a
//! finished content model and detects Unique Particle Attribution
//! violations. Repetition is handled in two passes: a naive overlap test
//! between a looping particle's start set and its exclude-next set, then a
//! per-particle comparison that tells a particle legitimately matching
//! itself again apart from two different particles competing for a name.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#cos-nonambig

use std::collections::HashMap;
use tracing::trace;

use super::context::CompileContext;
use crate::components::particles::{ParticleTerm, SchemaParticle, Transitions};
use crate::components::qnameset::QNameSet;
use crate::error::codes;
use crate::namespaces::QName;

/// Names claimed by more than one particle at some point of a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    /// The contested names
    pub names: QNameSet,
    /// The particle where the conflict was found
    pub particle: String,
}

/// Compute transition metadata for a particle tree
///
/// Subtrees whose metadata is already set are not revisited.
pub fn build_state_machine(particle: &SchemaParticle) -> &Transitions {
    let mut ambiguities = Vec::new();
    build(particle, &mut ambiguities)
}

/// Compute transition metadata and return every ambiguity found on the way
pub fn find_ambiguities(particle: &SchemaParticle) -> Vec<Ambiguity> {
    let mut ambiguities = Vec::new();
    build(particle, &mut ambiguities);
    ambiguities
}

/// Build the state machine of a type's content model and report a
/// violation unless the check is disabled
pub(crate) fn check_content_model(
    ctx: &mut CompileContext,
    particle: &SchemaParticle,
    component: Option<&QName>,
    label: &str,
) {
    let ambiguities = find_ambiguities(particle);
    let deterministic = particle.is_deterministic().unwrap_or(true);
    trace!(component = %label, deterministic, "content model state machine built");

    if deterministic || ctx.options.disable_upa_check {
        return;
    }
    let detail = match ambiguities.first() {
        Some(a) => format!(": {} is contested in {}", a.names, a.particle),
        None => String::new(),
    };
    ctx.error(
        codes::NON_AMBIGUOUS,
        component,
        format!("content model of {} is not deterministic{}", label, detail),
    );
}

fn build<'a>(particle: &'a SchemaParticle, ambiguities: &mut Vec<Ambiguity>) -> &'a Transitions {
    if let Some(done) = particle.transitions() {
        return done;
    }
    let computed = compute(particle, ambiguities);
    particle.transition_cell().get_or_init(|| computed)
}

fn compute(particle: &SchemaParticle, ambiguities: &mut Vec<Ambiguity>) -> Transitions {
    let mut t = match &particle.term {
        ParticleTerm::Element(element) => leaf(element.accepted_names.clone()),
        ParticleTerm::Wildcard(wildcard) => leaf(wildcard.names.clone()),
        ParticleTerm::Sequence(children) => sequence(particle, children, ambiguities),
        ParticleTerm::Choice(children) => choice(particle, children, ambiguities, false),
        ParticleTerm::All(children) => choice(particle, children, ambiguities, true),
    };

    if particle.occurs.is_repeating() {
        if t.deterministic && !t.start.is_disjoint(&t.exclude_next) {
            let suspect = t.exclude_next.intersect(&t.start);
            let mut start_map = ParticleMap::new();
            particles_matching_start(particle, &suspect, &mut start_map);
            let mut after_map = ParticleMap::new();
            particles_matching_after(particle, &suspect, true, &mut after_map);

            if !after_map_subsumed_by_start_map(&start_map, &after_map) {
                t.deterministic = false;
                ambiguities.push(Ambiguity {
                    names: suspect,
                    particle: particle.to_string(),
                });
            }
        }
        if particle.occurs.is_variable() {
            t.exclude_next = t.exclude_next.union(&t.start);
        }
    }

    t.skippable |= particle.occurs.min == 0;
    t
}

fn leaf(start: QNameSet) -> Transitions {
    Transitions {
        start,
        exclude_next: QNameSet::empty(),
        skippable: false,
        deterministic: true,
    }
}

fn sequence(
    particle: &SchemaParticle,
    children: &[SchemaParticle],
    ambiguities: &mut Vec<Ambiguity>,
) -> Transitions {
    let mut start = QNameSet::empty();
    let mut exclude_next = QNameSet::empty();
    let mut skippable = true;
    let mut deterministic = true;

    for child in children {
        let ct = build(child, ambiguities);
        deterministic &= ct.deterministic;

        if !exclude_next.is_disjoint(&ct.start) {
            if deterministic {
                ambiguities.push(Ambiguity {
                    names: exclude_next.intersect(&ct.start),
                    particle: particle.to_string(),
                });
            }
            deterministic = false;
        }
        if skippable {
            start = start.union(&ct.start);
        }
        if ct.skippable {
            exclude_next = exclude_next.union(&ct.start);
        } else {
            skippable = false;
            exclude_next = QNameSet::empty();
        }
        exclude_next = exclude_next.union(&ct.exclude_next);
    }

    Transitions {
        start,
        exclude_next,
        skippable,
        deterministic,
    }
}

/// Choice, or all when `unordered` is set
fn choice(
    particle: &SchemaParticle,
    children: &[SchemaParticle],
    ambiguities: &mut Vec<Ambiguity>,
    unordered: bool,
) -> Transitions {
    let mut start = QNameSet::empty();
    let mut exclude_next = QNameSet::empty();
    let mut any_skippable = false;
    let mut all_skippable = true;
    let mut deterministic = true;

    for child in children {
        let ct = build(child, ambiguities);
        deterministic &= ct.deterministic;

        if !start.is_disjoint(&ct.start) {
            if deterministic {
                ambiguities.push(Ambiguity {
                    names: start.intersect(&ct.start),
                    particle: particle.to_string(),
                });
            }
            deterministic = false;
        }
        start = start.union(&ct.start);
        exclude_next = exclude_next.union(&ct.exclude_next);
        any_skippable |= ct.skippable;
        all_skippable &= ct.skippable;
    }

    let skippable = if unordered { all_skippable } else { any_skippable };
    if unordered && skippable {
        exclude_next = exclude_next.union(&start);
    }

    Transitions {
        start,
        exclude_next,
        skippable,
        deterministic,
    }
}

/// Particles keyed by identity; wildcards carry the part of their range
/// that was matched
type ParticleMap = HashMap<*const SchemaParticle, Option<QNameSet>>;

fn key(particle: &SchemaParticle) -> *const SchemaParticle {
    particle
}

fn skippable(particle: &SchemaParticle) -> bool {
    particle
        .transitions()
        .map_or(particle.occurs.min == 0, |t| t.skippable)
}

/// Leaf particles that can match a suspect name at the start of `particle`
fn particles_matching_start(particle: &SchemaParticle, suspect: &QNameSet, map: &mut ParticleMap) {
    match &particle.term {
        ParticleTerm::Element(element) => {
            if !element.accepted_names.is_disjoint(suspect) {
                map.insert(key(particle), None);
            }
        }
        ParticleTerm::Wildcard(wildcard) => {
            let range = wildcard.names.intersect(suspect);
            if range.is_empty() {
                return;
            }
            let merged = match map.get(&key(particle)) {
                Some(Some(existing)) => existing.union(&range),
                _ => range,
            };
            map.insert(key(particle), Some(merged));
        }
        ParticleTerm::Choice(children) | ParticleTerm::All(children) => {
            for child in children {
                particles_matching_start(child, suspect, map);
            }
        }
        ParticleTerm::Sequence(children) => {
            for child in children {
                particles_matching_start(child, suspect, map);
                if !skippable(child) {
                    break;
                }
            }
        }
    }
}

/// Leaf particles that can match a suspect name right after a match of
/// `particle` has consumed input, without starting a new repetition of it
fn particles_matching_after(
    particle: &SchemaParticle,
    suspect: &QNameSet,
    top: bool,
    map: &mut ParticleMap,
) {
    match &particle.term {
        ParticleTerm::Choice(children) | ParticleTerm::All(children) => {
            for child in children {
                particles_matching_after(child, suspect, false, map);
            }
        }
        ParticleTerm::Sequence(children) => {
            for child in children.iter().rev() {
                particles_matching_after(child, suspect, false, map);
                if !skippable(child) {
                    break;
                }
            }
        }
        ParticleTerm::Element(_) | ParticleTerm::Wildcard(_) => {}
    }

    if !top && particle.occurs.is_variable() {
        particles_matching_start(particle, suspect, map);
    }
}

fn after_map_subsumed_by_start_map(start: &ParticleMap, after: &ParticleMap) -> bool {
    if after.len() > start.len() {
        return false;
    }
    after.iter().all(|(particle, range)| match (start.get(particle), range) {
        (None, _) => false,
        (Some(Some(start_range)), Some(after_range)) => start_range.contains_all(after_range),
        (Some(_), _) => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::particles::test_support::elem;
    use crate::components::particles::Occurs;
    use crate::components::wildcards::{ProcessContents, Wildcard};

    fn any(names: QNameSet, occurs: Occurs) -> SchemaParticle {
        SchemaParticle::wildcard(Wildcard::new(names, ProcessContents::Lax), occurs)
    }

    fn set(names: &[&str]) -> QNameSet {
        QNameSet::from_names(names.iter().map(|n| QName::local(*n)))
    }

    #[test]
    fn test_plain_sequence() {
        let seq = SchemaParticle::sequence(
            vec![elem("a", Occurs::once()), elem("b", Occurs::once())],
            Occurs::once(),
        );
        let t = build_state_machine(&seq);
        assert_eq!(t.start, set(&["a"]));
        assert!(t.exclude_next.is_empty());
        assert!(!t.skippable);
        assert!(t.deterministic);
    }

    #[test]
    fn test_duplicate_choice_is_ambiguous() {
        let choice = SchemaParticle::choice(
            vec![elem("a", Occurs::once()), elem("a", Occurs::once())],
            Occurs::once(),
        );
        let ambiguities = find_ambiguities(&choice);
        assert_eq!(choice.is_deterministic(), Some(false));
        assert_eq!(ambiguities.len(), 1);
        assert!(ambiguities[0].names.contains(&QName::local("a")));
    }

    #[test]
    fn test_optional_then_required_same_name() {
        let seq = SchemaParticle::sequence(
            vec![elem("a", Occurs::optional()), elem("a", Occurs::once())],
            Occurs::once(),
        );
        assert!(!build_state_machine(&seq).deterministic);
    }

    #[test]
    fn test_repeating_optional_sequence_loops_on_itself() {
        let seq = SchemaParticle::sequence(
            vec![elem("a", Occurs::optional()), elem("b", Occurs::optional())],
            Occurs::zero_or_more(),
        );
        let t = build_state_machine(&seq);
        assert!(t.deterministic);
        assert!(t.skippable);
        assert_eq!(t.start, set(&["a", "b"]));
        assert_eq!(t.exclude_next, set(&["a", "b"]));
    }

    #[test]
    fn test_repeating_sequence_with_trailing_duplicate() {
        let seq = SchemaParticle::sequence(
            vec![
                elem("a", Occurs::optional()),
                elem("b", Occurs::once()),
                elem("a", Occurs::optional()),
            ],
            Occurs::zero_or_more(),
        );
        let ambiguities = find_ambiguities(&seq);
        assert_eq!(seq.is_deterministic(), Some(false));
        assert_eq!(ambiguities[0].names, set(&["a"]));
    }

    #[test]
    fn test_nested_star() {
        let inner = elem("a", Occurs::zero_or_more());
        let outer = SchemaParticle::sequence(vec![inner], Occurs::zero_or_more());
        let t = build_state_machine(&outer);
        assert!(t.deterministic);
        assert_eq!(t.exclude_next, set(&["a"]));
    }

    #[test]
    fn test_repeating_leaf_exclude_next() {
        let star = elem("a", Occurs::new(1, Some(3)));
        let t = build_state_machine(&star);
        assert_eq!(t.exclude_next, set(&["a"]));
        assert!(!t.skippable);

        let fixed = elem("a", Occurs::new(2, Some(2)));
        assert!(build_state_machine(&fixed).exclude_next.is_empty());
    }

    #[test]
    fn test_wildcard_followed_by_element() {
        let seq = SchemaParticle::sequence(
            vec![any(QNameSet::all(), Occurs::zero_or_more()), elem("a", Occurs::once())],
            Occurs::once(),
        );
        assert!(!build_state_machine(&seq).deterministic);

        let other = QNameSet::complement_namespaces([""]);
        let seq = SchemaParticle::sequence(
            vec![any(other, Occurs::zero_or_more()), elem("a", Occurs::once())],
            Occurs::once(),
        );
        assert!(build_state_machine(&seq).deterministic);
    }

    #[test]
    fn test_repeating_wildcard_choice() {
        let narrow = QNameSet::for_namespaces(["urn:a"]);
        let choice = SchemaParticle::choice(
            vec![any(narrow, Occurs::once()), elem("b", Occurs::once())],
            Occurs::one_or_more(),
        );
        let t = build_state_machine(&choice);
        assert!(t.deterministic);
        assert!(t.exclude_next.contains(&QName::namespaced("urn:a", "x")));
        assert!(t.exclude_next.contains(&QName::local("b")));
    }

    #[test]
    fn test_all_group() {
        let all = SchemaParticle::all(
            vec![elem("a", Occurs::optional()), elem("b", Occurs::optional())],
            Occurs::once(),
        );
        let t = build_state_machine(&all);
        assert!(t.skippable);
        assert!(t.deterministic);
        assert_eq!(t.exclude_next, set(&["a", "b"]));

        let required = SchemaParticle::all(
            vec![elem("a", Occurs::once()), elem("b", Occurs::optional())],
            Occurs::once(),
        );
        let t = build_state_machine(&required);
        assert!(!t.skippable);
        assert!(t.exclude_next.is_empty());
    }

    #[test]
    fn test_transitions_set_once() {
        let seq = SchemaParticle::sequence(vec![elem("a", Occurs::once())], Occurs::once());
        let first = build_state_machine(&seq).clone();
        let second = build_state_machine(&seq);
        assert_eq!(&first, second);
        assert!(seq.children()[0].transitions().is_some());
    }
}
