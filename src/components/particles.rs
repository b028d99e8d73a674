//! XSD particles
//!
//! A particle is one node of a content model: an element, a wildcard, or a
//! model group (sequence, choice, all) with children. Every particle carries
//! its occurrence range. Once the content model is finished the determinism
//! pass attaches [`Transitions`] to every node, bottom-up and exactly once.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#cParticles

use crate::error::{ParseError, Result};
use crate::namespaces::QName;
use once_cell::sync::OnceCell;
use std::fmt;

use super::qnameset::QNameSet;
use super::types::TypeId;
use super::wildcards::Wildcard;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Exactly one occurrence
    pub fn is_once(&self) -> bool {
        self.min == 1 && self.max == Some(1)
    }

    /// Check if particle can occur more than once
    pub fn is_repeating(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }

    /// Check if minOccurs != maxOccurs
    pub fn is_variable(&self) -> bool {
        match self.max {
            Some(max) => self.min < max,
            None => true,
        }
    }

    /// Check that min <= max
    pub fn is_consistent(&self) -> bool {
        self.max.map_or(true, |max| self.min <= max)
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (1, Some(1)) => Ok(()),
            (0, Some(1)) => write!(f, "?"),
            (0, None) => write!(f, "*"),
            (1, None) => write!(f, "+"),
            (min, None) => write!(f, "{{{},}}", min),
            (min, Some(max)) => write!(f, "{{{},{}}}", min, max),
        }
    }
}

/// Parse minOccurs/maxOccurs from their lexical attribute values
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        match min_str.trim().parse::<u32>() {
            Ok(min) => occurs.min = min,
            Err(_) => {
                return Err(ParseError::new(format!(
                    "minOccurs value '{}' is not a valid non-negative integer",
                    min_str
                ))
                .into())
            }
        }
    }

    if let Some(max_str) = max_occurs {
        let max_str = max_str.trim();
        if max_str == "unbounded" {
            occurs.max = None;
        } else {
            match max_str.parse::<u32>() {
                Ok(max) => {
                    if occurs.min > max {
                        return Err(ParseError::new(
                            "maxOccurs must be 'unbounded' or greater than minOccurs",
                        )
                        .into());
                    }
                    occurs.max = Some(max);
                }
                Err(_) => {
                    return Err(ParseError::new(format!(
                        "maxOccurs value '{}' must be a non-negative integer or 'unbounded'",
                        max_str
                    ))
                    .into())
                }
            }
        }
    } else if occurs.min > 1 {
        return Err(ParseError::new("minOccurs must be lesser or equal than maxOccurs").into());
    }

    Ok(occurs)
}

/// Helper for combining occurrence ranges across model groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccursCalculator {
    /// Calculated minimum occurrences
    pub min_occurs: u32,
    /// Calculated maximum occurrences (None = unbounded)
    pub max_occurs: Option<u32>,
}

impl OccursCalculator {
    /// Start from an existing range
    pub fn from_occurs(occurs: Occurs) -> Self {
        Self {
            min_occurs: occurs.min,
            max_occurs: occurs.max,
        }
    }

    /// Get as Occurs
    pub fn occurs(&self) -> Occurs {
        Occurs::new(self.min_occurs, self.max_occurs)
    }

    /// Add another range (sequence: both happen)
    pub fn add(&mut self, other: Occurs) {
        self.min_occurs = self.min_occurs.saturating_add(other.min);
        self.max_occurs = match (self.max_occurs, other.max) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            _ => None,
        };
    }

    /// Multiply by an enclosing range (nested groups)
    pub fn multiply(&mut self, other: Occurs) {
        self.min_occurs = self.min_occurs.saturating_mul(other.min);
        self.max_occurs = match (self.max_occurs, other.max) {
            (Some(0), _) | (_, Some(0)) => Some(0),
            (Some(a), Some(b)) => Some(a.saturating_mul(b)),
            _ => None,
        };
    }

    /// Take the min of minimums and max of maximums (choice: one or the other)
    pub fn max_with(&mut self, other: Occurs) {
        self.min_occurs = self.min_occurs.min(other.min);
        self.max_occurs = match (self.max_occurs, other.max) {
            (None, _) | (_, None) => None,
            (Some(a), Some(b)) => Some(a.max(b)),
        };
    }
}

/// The kind of a particle, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    /// Element declaration
    Element,
    /// Element wildcard
    Wildcard,
    /// Ordered group
    Sequence,
    /// Alternative group
    Choice,
    /// Unordered group
    All,
}

impl fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element => write!(f, "element"),
            Self::Wildcard => write!(f, "any"),
            Self::Sequence => write!(f, "sequence"),
            Self::Choice => write!(f, "choice"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Element term of a particle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTerm {
    /// Element name
    pub name: QName,
    /// Type of the element's value
    pub type_id: TypeId,
    /// Whether the element is nillable
    pub nillable: bool,
    /// Default value text
    pub default_value: Option<String>,
    /// Fixed value text
    pub fixed_value: Option<String>,
    /// Whether this is a reference to a global element declaration
    pub is_global: bool,
    /// Names this particle accepts: its own name unless abstract, plus
    /// every non-abstract member of its substitution group
    pub accepted_names: QNameSet,
}

/// The payload of a particle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticleTerm {
    /// Element declaration
    Element(ElementTerm),
    /// Element wildcard
    Wildcard(Wildcard),
    /// Ordered children
    Sequence(Vec<SchemaParticle>),
    /// Exactly one of the children
    Choice(Vec<SchemaParticle>),
    /// Children in any order
    All(Vec<SchemaParticle>),
}

/// Determinism metadata computed once per particle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transitions {
    /// Names that can begin a match of this particle
    pub start: QNameSet,
    /// Names that may follow a match without forcing it to end
    pub exclude_next: QNameSet,
    /// Whether the particle can match nothing
    pub skippable: bool,
    /// Whether the subtree is free of attribution ambiguity
    pub deterministic: bool,
}

/// One node of a content model
#[derive(Debug, Clone)]
pub struct SchemaParticle {
    /// What the particle matches
    pub term: ParticleTerm,
    /// Occurrence range
    pub occurs: Occurs,
    transitions: OnceCell<Transitions>,
}

impl PartialEq for SchemaParticle {
    fn eq(&self, other: &Self) -> bool {
        self.occurs == other.occurs && self.term == other.term
    }
}

impl Eq for SchemaParticle {}

impl SchemaParticle {
    /// Create a particle
    pub fn new(term: ParticleTerm, occurs: Occurs) -> Self {
        Self {
            term,
            occurs,
            transitions: OnceCell::new(),
        }
    }

    /// Create an element particle
    pub fn element(term: ElementTerm, occurs: Occurs) -> Self {
        Self::new(ParticleTerm::Element(term), occurs)
    }

    /// Create a wildcard particle
    pub fn wildcard(wildcard: Wildcard, occurs: Occurs) -> Self {
        Self::new(ParticleTerm::Wildcard(wildcard), occurs)
    }

    /// Create a sequence
    pub fn sequence(children: Vec<SchemaParticle>, occurs: Occurs) -> Self {
        Self::new(ParticleTerm::Sequence(children), occurs)
    }

    /// Create a choice
    pub fn choice(children: Vec<SchemaParticle>, occurs: Occurs) -> Self {
        Self::new(ParticleTerm::Choice(children), occurs)
    }

    /// Create an all group
    pub fn all(children: Vec<SchemaParticle>, occurs: Occurs) -> Self {
        Self::new(ParticleTerm::All(children), occurs)
    }

    /// Group of the given kind; leaf kinds are not groups and yield None
    pub fn group(kind: ParticleKind, children: Vec<SchemaParticle>, occurs: Occurs) -> Option<Self> {
        match kind {
            ParticleKind::Sequence => Some(Self::sequence(children, occurs)),
            ParticleKind::Choice => Some(Self::choice(children, occurs)),
            ParticleKind::All => Some(Self::all(children, occurs)),
            ParticleKind::Element | ParticleKind::Wildcard => None,
        }
    }

    /// The particle kind
    pub fn kind(&self) -> ParticleKind {
        match &self.term {
            ParticleTerm::Element(_) => ParticleKind::Element,
            ParticleTerm::Wildcard(_) => ParticleKind::Wildcard,
            ParticleTerm::Sequence(_) => ParticleKind::Sequence,
            ParticleTerm::Choice(_) => ParticleKind::Choice,
            ParticleTerm::All(_) => ParticleKind::All,
        }
    }

    /// Child particles (empty for leaves)
    pub fn children(&self) -> &[SchemaParticle] {
        match &self.term {
            ParticleTerm::Sequence(c) | ParticleTerm::Choice(c) | ParticleTerm::All(c) => c,
            ParticleTerm::Element(_) | ParticleTerm::Wildcard(_) => &[],
        }
    }

    /// Take ownership of the children (empty for leaves)
    pub fn into_children(self) -> Vec<SchemaParticle> {
        match self.term {
            ParticleTerm::Sequence(c) | ParticleTerm::Choice(c) | ParticleTerm::All(c) => c,
            ParticleTerm::Element(_) | ParticleTerm::Wildcard(_) => Vec::new(),
        }
    }

    /// Whether this is a model group
    pub fn is_group(&self) -> bool {
        matches!(
            self.term,
            ParticleTerm::Sequence(_) | ParticleTerm::Choice(_) | ParticleTerm::All(_)
        )
    }

    /// Whether the occurrence range is exactly 1..1
    pub fn is_singleton(&self) -> bool {
        self.occurs.is_once()
    }

    /// The element term, if this is an element particle
    pub fn as_element(&self) -> Option<&ElementTerm> {
        match &self.term {
            ParticleTerm::Element(e) => Some(e),
            _ => None,
        }
    }

    /// The wildcard, if this is a wildcard particle
    pub fn as_wildcard(&self) -> Option<&Wildcard> {
        match &self.term {
            ParticleTerm::Wildcard(w) => Some(w),
            _ => None,
        }
    }

    /// Determinism metadata, once computed
    pub fn transitions(&self) -> Option<&Transitions> {
        self.transitions.get()
    }

    /// Names that can start a match, once computed
    pub fn start_set(&self) -> Option<&QNameSet> {
        self.transitions().map(|t| &t.start)
    }

    /// Names that may follow without ending the match, once computed
    pub fn exclude_next_set(&self) -> Option<&QNameSet> {
        self.transitions().map(|t| &t.exclude_next)
    }

    /// Whether the particle can match nothing, once computed
    pub fn is_skippable(&self) -> Option<bool> {
        self.transitions().map(|t| t.skippable)
    }

    /// Whether the subtree is deterministic, once computed
    pub fn is_deterministic(&self) -> Option<bool> {
        self.transitions().map(|t| t.deterministic)
    }

    pub(crate) fn transition_cell(&self) -> &OnceCell<Transitions> {
        &self.transitions
    }

    /// Visit every particle of the subtree, parents before children
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SchemaParticle)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Nesting depth (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

impl fmt::Display for SchemaParticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let group = |f: &mut fmt::Formatter<'_>, label: &str, children: &[SchemaParticle]| {
            write!(f, "{}(", label)?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, ")")
        };
        match &self.term {
            ParticleTerm::Element(e) => write!(f, "{}", e.name)?,
            ParticleTerm::Wildcard(_) => write!(f, "any")?,
            ParticleTerm::Sequence(c) => group(f, "seq", c)?,
            ParticleTerm::Choice(c) => group(f, "choice", c)?,
            ParticleTerm::All(c) => group(f, "all", c)?,
        }
        write!(f, "{}", self.occurs)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::elem;
    use super::*;

    #[test]
    fn test_occurs_presets() {
        assert_eq!(Occurs::once(), Occurs::new(1, Some(1)));
        assert_eq!(Occurs::optional(), Occurs::new(0, Some(1)));
        assert_eq!(Occurs::zero_or_more(), Occurs::new(0, None));
        assert_eq!(Occurs::one_or_more(), Occurs::new(1, None));
    }

    #[test]
    fn test_occurs_predicates() {
        let optional = Occurs::optional();
        assert!(optional.is_emptiable());
        assert!(!optional.is_repeating());
        assert!(optional.is_variable());

        let unbounded = Occurs::zero_or_more();
        assert!(unbounded.is_repeating());
        assert!(unbounded.is_variable());

        assert!(Occurs::new(0, Some(0)).is_empty());
        assert!(!Occurs::new(3, Some(3)).is_variable());
        assert!(Occurs::new(3, Some(3)).is_repeating());
        assert!(!Occurs::new(3, Some(2)).is_consistent());
    }

    #[test]
    fn test_occurs_display() {
        assert_eq!(Occurs::once().to_string(), "");
        assert_eq!(Occurs::optional().to_string(), "?");
        assert_eq!(Occurs::zero_or_more().to_string(), "*");
        assert_eq!(Occurs::one_or_more().to_string(), "+");
        assert_eq!(Occurs::new(2, Some(5)).to_string(), "{2,5}");
        assert_eq!(Occurs::new(2, None).to_string(), "{2,}");
    }

    #[test]
    fn test_parse_occurs_values() {
        assert_eq!(parse_occurs(None, None).unwrap(), Occurs::once());
        assert_eq!(parse_occurs(Some("0"), Some("5")).unwrap(), Occurs::new(0, Some(5)));
        assert_eq!(parse_occurs(Some("1"), Some("unbounded")).unwrap(), Occurs::new(1, None));
        assert_eq!(parse_occurs(Some("0"), Some("0")).unwrap(), Occurs::new(0, Some(0)));
    }

    #[test]
    fn test_parse_occurs_errors() {
        assert!(parse_occurs(Some("abc"), None).is_err());
        assert!(parse_occurs(Some("-1"), None).is_err());
        assert!(parse_occurs(None, Some("abc")).is_err());
        assert!(parse_occurs(Some("5"), Some("3")).is_err());
        assert!(parse_occurs(Some("5"), None).is_err());
    }

    #[test]
    fn test_occurs_calculator() {
        let mut calc = OccursCalculator::from_occurs(Occurs::new(1, Some(2)));
        calc.add(Occurs::new(2, Some(3)));
        assert_eq!(calc.occurs(), Occurs::new(3, Some(5)));

        calc.multiply(Occurs::new(2, Some(4)));
        assert_eq!(calc.occurs(), Occurs::new(6, Some(20)));

        calc.max_with(Occurs::new(1, None));
        assert_eq!(calc.occurs(), Occurs::new(1, None));

        let mut calc = OccursCalculator::from_occurs(Occurs::new(1, None));
        calc.multiply(Occurs::new(0, Some(0)));
        assert_eq!(calc.occurs(), Occurs::new(0, Some(0)));
    }

    #[test]
    fn test_particle_structure() {
        let seq = SchemaParticle::sequence(
            vec![elem("a", Occurs::once()), elem("b", Occurs::zero_or_more())],
            Occurs::optional(),
        );
        assert_eq!(seq.kind(), ParticleKind::Sequence);
        assert!(seq.is_group());
        assert!(!seq.is_singleton());
        assert_eq!(seq.children().len(), 2);
        assert_eq!(seq.depth(), 2);
        assert_eq!(seq.to_string(), "seq(a, b*)?");
        assert!(seq.transitions().is_none());
        assert!(seq.children()[0].as_element().is_some());

        let mut names = Vec::new();
        seq.walk(&mut |p| names.push(p.kind()));
        assert_eq!(
            names,
            vec![ParticleKind::Sequence, ParticleKind::Element, ParticleKind::Element]
        );
    }

    #[test]
    fn test_structural_equality_ignores_transitions() {
        let a = elem("a", Occurs::once());
        let b = a.clone();
        let _ = a.transition_cell().set(Transitions {
            start: QNameSet::empty(),
            exclude_next: QNameSet::empty(),
            skippable: false,
            deterministic: true,
        });
        assert_eq!(a, b);
        assert!(b.transitions().is_none());
    }
}
