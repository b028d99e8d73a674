//! Resolution phases
//!
//! Each type moves through a fixed sequence of phases. Document types pass
//! through the substitution-group sub-chain before they may start resolving.
//! A type found in `Resolving` when asked to resolve again is part of a
//! cycle; that observation is the only cycle detection the compiler does.

use std::fmt;
use tracing::debug;

use crate::components::types::SchemaType;

/// Resolution phase of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Registered, nothing computed
    Unresolved,
    /// Linking the substitution group (document types only)
    ResolvingSubstitutionGroups,
    /// Substitution group linked (document types only)
    ResolvedSubstitutionGroups,
    /// Base, content and attributes being computed
    Resolving,
    /// Frozen; every resolution-owned field may be read
    Resolved,
    /// Language-binding names being assigned
    Javaizing,
    /// Language-binding names assigned
    Javaized,
}

impl Phase {
    /// Whether a type may move from this phase to `next`
    pub fn can_advance_to(self, next: Phase, is_document_type: bool) -> bool {
        use Phase::*;
        match (self, next) {
            (Unresolved, ResolvingSubstitutionGroups) => is_document_type,
            (Unresolved, Resolving) => !is_document_type,
            (ResolvingSubstitutionGroups, ResolvedSubstitutionGroups) => true,
            (ResolvedSubstitutionGroups, Resolving) => true,
            (Resolving, Resolved) => true,
            (Resolved, Javaizing) => true,
            (Javaizing, Javaized) => true,
            _ => false,
        }
    }

    /// Whether resolution has finished
    pub fn is_resolved(self) -> bool {
        self >= Phase::Resolved
    }

    /// Whether the language-binding pass has finished
    pub fn is_javaized(self) -> bool {
        self == Phase::Javaized
    }

    /// Whether the type is in the middle of a step
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            Phase::ResolvingSubstitutionGroups | Phase::Resolving | Phase::Javaizing
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unresolved => "unresolved",
            Phase::ResolvingSubstitutionGroups => "resolving-substitution-groups",
            Phase::ResolvedSubstitutionGroups => "resolved-substitution-groups",
            Phase::Resolving => "resolving",
            Phase::Resolved => "resolved",
            Phase::Javaizing => "javaizing",
            Phase::Javaized => "javaized",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of asking a type to enter a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Entry {
    /// The step may run now
    Proceed,
    /// The step already ran
    Done,
    /// The step is already running further up the call stack
    Circular,
}

impl SchemaType {
    /// Move to the next phase
    ///
    /// # Panics
    ///
    /// Panics on an illegal transition; the compiler never requests one.
    pub(crate) fn advance_phase(&mut self, next: Phase) {
        assert!(
            self.phase.can_advance_to(next, self.is_document_type),
            "illegal phase transition {} -> {} for {}",
            self.phase,
            next,
            self.label()
        );
        debug!(component = %self.label(), from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }

    /// Check whether resolution may start
    pub(crate) fn resolution_entry(&self) -> Entry {
        match self.phase {
            Phase::Resolving => Entry::Circular,
            Phase::Resolved | Phase::Javaizing | Phase::Javaized => Entry::Done,
            Phase::Unresolved if self.is_document_type => {
                unreachable!("document type resolved before its substitution group")
            }
            Phase::Unresolved | Phase::ResolvedSubstitutionGroups => Entry::Proceed,
            Phase::ResolvingSubstitutionGroups => {
                unreachable!("resolution requested while linking substitution groups")
            }
        }
    }

    /// Check whether substitution-group linking may start
    pub(crate) fn substitution_entry(&self) -> Entry {
        match self.phase {
            Phase::Unresolved => Entry::Proceed,
            Phase::ResolvingSubstitutionGroups => Entry::Circular,
            _ => Entry::Done,
        }
    }

    /// Assert that resolution-owned fields may be written
    pub(crate) fn assert_resolving(&self) {
        debug_assert_eq!(
            self.phase,
            Phase::Resolving,
            "{} written outside its resolving phase",
            self.label()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::types::{TypeId, TypeKind};

    #[test]
    fn test_ordinary_chain() {
        let mut ty = SchemaType::new(TypeId(60), None, TypeKind::Complex);
        assert_eq!(ty.resolution_entry(), Entry::Proceed);
        ty.advance_phase(Phase::Resolving);
        assert_eq!(ty.resolution_entry(), Entry::Circular);
        ty.advance_phase(Phase::Resolved);
        assert_eq!(ty.resolution_entry(), Entry::Done);
        assert!(ty.is_resolved());
        ty.advance_phase(Phase::Javaizing);
        assert!(ty.phase().is_in_progress());
        ty.advance_phase(Phase::Javaized);
        assert!(ty.is_javaized());
    }

    #[test]
    fn test_document_chain() {
        let mut ty = SchemaType::new(TypeId(61), None, TypeKind::Complex);
        ty.is_document_type = true;
        assert_eq!(ty.substitution_entry(), Entry::Proceed);
        ty.advance_phase(Phase::ResolvingSubstitutionGroups);
        assert_eq!(ty.substitution_entry(), Entry::Circular);
        ty.advance_phase(Phase::ResolvedSubstitutionGroups);
        assert_eq!(ty.substitution_entry(), Entry::Done);
        assert_eq!(ty.resolution_entry(), Entry::Proceed);
        ty.advance_phase(Phase::Resolving);
        ty.advance_phase(Phase::Resolved);
    }

    #[test]
    fn test_transition_table() {
        assert!(!Phase::Unresolved.can_advance_to(Phase::Resolving, true));
        assert!(!Phase::Unresolved.can_advance_to(Phase::ResolvingSubstitutionGroups, false));
        assert!(!Phase::Resolved.can_advance_to(Phase::Resolving, false));
        assert!(!Phase::Unresolved.can_advance_to(Phase::Resolved, false));
    }

    #[test]
    #[should_panic(expected = "illegal phase transition")]
    fn test_illegal_transition_panics() {
        let mut ty = SchemaType::new(TypeId(62), None, TypeKind::Simple);
        ty.advance_phase(Phase::Resolved);
    }
}
