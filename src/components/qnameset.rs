//! QName set algebra
//!
//! A [`QNameSet`] is a possibly infinite set of qualified names. It is stored
//! as a namespace predicate (a finite namespace list, either included or
//! excluded) refined by two finite exception lists: names excluded although
//! their namespace is included, and names included although their namespace
//! is excluded. That shape is closed under union, intersection and
//! complement, which is all the wildcard and determinism code needs.
//!
//! The absent namespace is spelled as the empty string throughout.

use std::collections::BTreeSet;
use std::fmt;

use crate::namespaces::QName;

/// Immutable set of qualified names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QNameSet {
    /// When true `namespaces` lists the namespaces NOT in the set
    inverted: bool,
    namespaces: BTreeSet<String>,
    /// Names removed from otherwise-included namespaces
    excluded_names: BTreeSet<QName>,
    /// Names added from otherwise-excluded namespaces
    included_names: BTreeSet<QName>,
}

impl Default for QNameSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl QNameSet {
    /// The empty set
    pub fn empty() -> Self {
        Self {
            inverted: false,
            namespaces: BTreeSet::new(),
            excluded_names: BTreeSet::new(),
            included_names: BTreeSet::new(),
        }
    }

    /// The set of every name in every namespace
    pub fn all() -> Self {
        Self {
            inverted: true,
            ..Self::empty()
        }
    }

    /// A set holding exactly one name
    pub fn singleton(name: QName) -> Self {
        Self::from_names(std::iter::once(name))
    }

    /// A finite set of names
    pub fn from_names<I: IntoIterator<Item = QName>>(names: I) -> Self {
        Self {
            included_names: names.into_iter().collect(),
            ..Self::empty()
        }
    }

    /// Every name whose namespace is one of `namespaces`
    pub fn for_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            ..Self::empty()
        }
    }

    /// Every name whose namespace is NOT one of `namespaces`
    pub fn complement_namespaces<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inverted: true,
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            ..Self::empty()
        }
    }

    /// Whether the namespace predicate admits `namespace`
    pub fn contains_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace) != self.inverted
    }

    /// Membership test
    pub fn contains(&self, name: &QName) -> bool {
        if self.contains_namespace(name.namespace_uri()) {
            !self.excluded_names.contains(name)
        } else {
            self.included_names.contains(name)
        }
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        !self.inverted && self.namespaces.is_empty() && self.included_names.is_empty()
    }

    /// Whether the set holds every name
    pub fn is_all(&self) -> bool {
        self.inverted && self.namespaces.is_empty() && self.excluded_names.is_empty()
    }

    /// Whether the set is a finite enumeration of names
    pub fn is_finite(&self) -> bool {
        !self.inverted && self.namespaces.is_empty()
    }

    /// The namespaces wholly included, when the set is not namespace-inverted
    pub fn included_namespaces(&self) -> Option<&BTreeSet<String>> {
        (!self.inverted).then_some(&self.namespaces)
    }

    /// The namespaces wholly excluded, when the set is namespace-inverted
    pub fn excluded_namespaces(&self) -> Option<&BTreeSet<String>> {
        self.inverted.then_some(&self.namespaces)
    }

    /// Names listed individually as members (outside the namespace predicate)
    pub fn included_names(&self) -> &BTreeSet<QName> {
        &self.included_names
    }

    /// Names listed individually as non-members (inside the namespace predicate)
    pub fn excluded_names(&self) -> &BTreeSet<QName> {
        &self.excluded_names
    }

    /// Complement
    pub fn inverse(&self) -> Self {
        Self {
            inverted: !self.inverted,
            namespaces: self.namespaces.clone(),
            excluded_names: self.included_names.clone(),
            included_names: self.excluded_names.clone(),
        }
    }

    /// Union
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_all() {
            return other.clone();
        }
        if other.is_empty() || self.is_all() {
            return self.clone();
        }
        Self::combine(self, other, |a, b| a || b)
    }

    /// Intersection
    pub fn intersect(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_all() {
            return self.clone();
        }
        if other.is_empty() || self.is_all() {
            return other.clone();
        }
        Self::combine(self, other, |a, b| a && b)
    }

    /// Members of `self` that are not members of `other`
    pub fn difference(&self, other: &Self) -> Self {
        if self.is_empty() || other.is_empty() {
            return self.clone();
        }
        Self::combine(self, other, |a, b| a && !b)
    }

    /// Whether every member of `other` is a member of `self`
    pub fn contains_all(&self, other: &Self) -> bool {
        self == other || other.difference(self).is_empty()
    }

    /// Whether the two sets share no member
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.is_empty() || other.is_empty() || self.intersect(other).is_empty()
    }

    /// Pointwise combination of two sets under a boolean operator.
    ///
    /// Namespaces mentioned by neither side share the same default membership,
    /// so the result's predicate default is `op` applied to both defaults and
    /// only the mentioned namespaces and names need individual evaluation.
    fn combine(a: &Self, b: &Self, op: impl Fn(bool, bool) -> bool) -> Self {
        let inverted = op(a.inverted, b.inverted);

        let namespaces: BTreeSet<String> = a
            .namespaces
            .iter()
            .chain(b.namespaces.iter())
            .filter(|ns| op(a.contains_namespace(ns), b.contains_namespace(ns)) != inverted)
            .cloned()
            .collect();

        let mut result = Self {
            inverted,
            namespaces,
            excluded_names: BTreeSet::new(),
            included_names: BTreeSet::new(),
        };

        let candidates = a
            .excluded_names
            .iter()
            .chain(a.included_names.iter())
            .chain(b.excluded_names.iter())
            .chain(b.included_names.iter());

        for name in candidates {
            let member = op(a.contains(name), b.contains(name));
            let by_namespace = result.contains_namespace(name.namespace_uri());
            if member && !by_namespace {
                result.included_names.insert(name.clone());
            } else if !member && by_namespace {
                result.excluded_names.insert(name.clone());
            }
        }

        result
    }
}

impl fmt::Display for QNameSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return write!(f, "{{*}}");
        }
        let namespace_label = |ns: &String| {
            if ns.is_empty() {
                "##local".to_string()
            } else {
                ns.clone()
            }
        };

        let mut parts: Vec<String> = Vec::new();
        if self.inverted {
            let excluded: Vec<String> = self.namespaces.iter().map(namespace_label).collect();
            parts.push(format!("* except ns [{}]", excluded.join(" ")));
        } else {
            parts.extend(self.namespaces.iter().map(|ns| format!("{}:*", namespace_label(ns))));
        }
        parts.extend(self.included_names.iter().map(|n| n.to_string()));
        if !self.excluded_names.is_empty() {
            let excluded: Vec<String> = self.excluded_names.iter().map(|n| n.to_string()).collect();
            parts.push(format!("except [{}]", excluded.join(" ")));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn q(ns: &str, local: &str) -> QName {
        QName::namespaced(ns, local)
    }

    #[test]
    fn test_finite_sets() {
        let set = QNameSet::from_names([q("urn:a", "x"), q("urn:a", "y")]);
        assert!(set.contains(&q("urn:a", "x")));
        assert!(!set.contains(&q("urn:a", "z")));
        assert!(set.is_finite());
        assert!(!set.is_empty());
        assert!(QNameSet::empty().is_empty());
    }

    #[test]
    fn test_namespace_sets() {
        let set = QNameSet::for_namespaces(["urn:a", ""]);
        assert!(set.contains(&q("urn:a", "anything")));
        assert!(set.contains(&QName::local("local")));
        assert!(!set.contains(&q("urn:b", "x")));

        let other = QNameSet::complement_namespaces(["urn:t", ""]);
        assert!(other.contains(&q("urn:b", "x")));
        assert!(!other.contains(&q("urn:t", "x")));
        assert!(!other.contains(&QName::local("x")));
    }

    #[test]
    fn test_union_and_intersect() {
        let a = QNameSet::for_namespaces(["urn:a"]);
        let x = QNameSet::singleton(q("urn:b", "x"));

        let union = a.union(&x);
        assert!(union.contains(&q("urn:a", "y")));
        assert!(union.contains(&q("urn:b", "x")));
        assert!(!union.contains(&q("urn:b", "y")));

        let intersect = union.intersect(&QNameSet::for_namespaces(["urn:b"]));
        assert_eq!(intersect, x);
    }

    #[test]
    fn test_difference_leaves_exceptions() {
        let all_a = QNameSet::for_namespaces(["urn:a"]);
        let minus = all_a.difference(&QNameSet::singleton(q("urn:a", "x")));
        assert!(!minus.contains(&q("urn:a", "x")));
        assert!(minus.contains(&q("urn:a", "y")));
        assert_eq!(minus.excluded_names().len(), 1);
    }

    #[test]
    fn test_contains_all_and_disjoint() {
        let any = QNameSet::all();
        let other = QNameSet::complement_namespaces(["urn:t", ""]);
        let enumerated = QNameSet::for_namespaces(["urn:b", "urn:c"]);

        assert!(any.contains_all(&other));
        assert!(!other.contains_all(&any));
        assert!(other.contains_all(&enumerated));
        assert!(!enumerated.contains_all(&other));

        assert!(QNameSet::singleton(q("urn:t", "a")).is_disjoint(&other));
        assert!(!enumerated.is_disjoint(&other));
        assert!(QNameSet::empty().is_disjoint(&any));
    }

    #[test]
    fn test_inverse() {
        let set = QNameSet::for_namespaces(["urn:a"]).union(&QNameSet::singleton(q("urn:b", "x")));
        let inverse = set.inverse();
        assert!(!inverse.contains(&q("urn:a", "y")));
        assert!(!inverse.contains(&q("urn:b", "x")));
        assert!(inverse.contains(&q("urn:b", "y")));
        assert_eq!(inverse.inverse(), set);
        assert!(QNameSet::empty().inverse().is_all());
    }

    #[test]
    fn test_display() {
        assert_eq!(QNameSet::all().to_string(), "{*}");
        assert_eq!(QNameSet::singleton(q("urn:a", "x")).to_string(), "{{urn:a}x}");
        assert_eq!(QNameSet::for_namespaces([""]).to_string(), "{##local:*}");
    }

    fn arb_name() -> impl Strategy<Value = QName> {
        (prop::sample::select(vec!["", "urn:a", "urn:b"]), prop::sample::select(vec!["x", "y"]))
            .prop_map(|(ns, local)| QName::new(Some(ns), local))
    }

    fn arb_set() -> impl Strategy<Value = QNameSet> {
        let leaf = prop_oneof![
            Just(QNameSet::empty()),
            Just(QNameSet::all()),
            arb_name().prop_map(QNameSet::singleton),
            prop::sample::select(vec!["", "urn:a", "urn:b"]).prop_map(|ns| QNameSet::for_namespaces([ns])),
            prop::sample::select(vec!["", "urn:a", "urn:b"])
                .prop_map(|ns| QNameSet::complement_namespaces([ns])),
        ];
        leaf.prop_recursive(3, 16, 2, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a.union(&b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| a.intersect(&b)),
                inner.prop_map(|a| a.inverse()),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_operations_are_pointwise(a in arb_set(), b in arb_set(), name in arb_name()) {
            prop_assert_eq!(a.union(&b).contains(&name), a.contains(&name) || b.contains(&name));
            prop_assert_eq!(a.intersect(&b).contains(&name), a.contains(&name) && b.contains(&name));
            prop_assert_eq!(a.difference(&b).contains(&name), a.contains(&name) && !b.contains(&name));
            prop_assert_eq!(a.inverse().contains(&name), !a.contains(&name));
        }

        #[test]
        fn prop_containment_laws(a in arb_set(), b in arb_set()) {
            prop_assert!(a.union(&b).contains_all(&a));
            prop_assert!(a.contains_all(&a.intersect(&b)));
            prop_assert!(a.is_disjoint(&a.inverse()));
            prop_assert_eq!(a.is_disjoint(&b), b.is_disjoint(&a));
        }
    }
}
