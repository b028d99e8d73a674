//! XSD wildcards
//!
//! Wildcards appear as `xs:any` particles and as `xs:anyAttribute` on
//! attribute models. Their namespace constraint is parsed from the lexical
//! `namespace` / `notNamespace` attributes and lowered into a [`QNameSet`]
//! so that every later computation works on plain set algebra.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#Wildcards

use crate::error::ParseError;
use crate::namespaces::QName;
use std::collections::BTreeSet;

use super::qnameset::QNameSet;

/// Process contents mode for wildcards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessContents {
    /// Validate strictly - element/attribute must be declared
    #[default]
    Strict,
    /// Validate if declaration found, otherwise accept
    Lax,
    /// Skip validation entirely
    Skip,
}

impl ProcessContents {
    /// Parse from string value
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }

    /// Check if this is a valid restriction of another process contents
    pub fn is_restriction_of(&self, other: &Self) -> bool {
        match (self, other) {
            (a, b) if a == b => true,
            (Self::Strict, _) => true,
            (Self::Lax, Self::Skip) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ProcessContents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lax => write!(f, "lax"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

/// Namespace constraint for wildcards, as written in the schema
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceConstraint {
    /// Any namespace is allowed (##any)
    #[default]
    Any,
    /// Any namespace except the target namespace and no namespace (##other)
    Other {
        /// The target namespace to exclude
        target_namespace: Option<String>,
    },
    /// Specific set of allowed namespaces ("" is the absent namespace)
    Enumeration(BTreeSet<String>),
    /// Set of disallowed namespaces (notNamespace)
    Not(BTreeSet<String>),
}

impl NamespaceConstraint {
    /// Create from namespace attribute value
    pub fn from_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        match value.trim() {
            "##any" => Ok(Self::Any),
            "##other" => Ok(Self::Other {
                target_namespace: target_namespace.map(String::from),
            }),
            other => Ok(Self::Enumeration(Self::namespace_list(
                other,
                target_namespace,
                "namespace",
            )?)),
        }
    }

    /// Create from notNamespace attribute
    pub fn from_not_namespace_attr(
        value: &str,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        Ok(Self::Not(Self::namespace_list(
            value,
            target_namespace,
            "notNamespace",
        )?))
    }

    fn namespace_list(
        value: &str,
        target_namespace: Option<&str>,
        attribute: &str,
    ) -> Result<BTreeSet<String>, ParseError> {
        let mut namespaces = BTreeSet::new();
        for ns in value.split_whitespace() {
            match ns {
                "##local" => {
                    namespaces.insert(String::new());
                }
                "##targetNamespace" => {
                    namespaces.insert(target_namespace.unwrap_or("").to_string());
                }
                s if s.starts_with("##") => {
                    return Err(ParseError::new(format!(
                        "wrong value '{}' in '{}' attribute",
                        s, attribute
                    )));
                }
                uri => {
                    namespaces.insert(uri.to_string());
                }
            }
        }
        Ok(namespaces)
    }

    /// Lower the constraint into a name set
    pub fn to_qname_set(&self) -> QNameSet {
        match self {
            Self::Any => QNameSet::all(),
            Self::Other { target_namespace } => QNameSet::complement_namespaces([
                target_namespace.clone().unwrap_or_default(),
                String::new(),
            ]),
            Self::Enumeration(set) => QNameSet::for_namespaces(set.iter().cloned()),
            Self::Not(set) => QNameSet::complement_namespaces(set.iter().cloned()),
        }
    }
}

/// A resolved wildcard: accepted names plus processing mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    /// Names matched by the wildcard
    pub names: QNameSet,
    /// Process contents mode
    pub process_contents: ProcessContents,
}

impl Wildcard {
    /// Create a wildcard from an already lowered name set
    pub fn new(names: QNameSet, process_contents: ProcessContents) -> Self {
        Self {
            names,
            process_contents,
        }
    }

    /// Build a wildcard from its lexical attributes.
    ///
    /// `namespace` and `not_namespace` are mutually exclusive; a missing
    /// `namespace` means `##any`. Names in `not_qnames` are removed.
    pub fn from_attributes(
        namespace: Option<&str>,
        not_namespace: Option<&str>,
        not_qnames: &[QName],
        process_contents: Option<&str>,
        target_namespace: Option<&str>,
    ) -> Result<Self, ParseError> {
        let constraint = match (namespace, not_namespace) {
            (Some(_), Some(_)) => {
                return Err(ParseError::new(
                    "'namespace' and 'notNamespace' attributes are mutually exclusive",
                ))
            }
            (Some(ns), None) => NamespaceConstraint::from_namespace_attr(ns, target_namespace)?,
            (None, Some(not_ns)) => {
                NamespaceConstraint::from_not_namespace_attr(not_ns, target_namespace)?
            }
            (None, None) => NamespaceConstraint::Any,
        };

        let process_contents = match process_contents {
            Some(value) => ProcessContents::from_str(value).ok_or_else(|| {
                ParseError::new(format!("wrong value '{}' in 'processContents' attribute", value))
            })?,
            None => ProcessContents::Strict,
        };

        let mut names = constraint.to_qname_set();
        if !not_qnames.is_empty() {
            names = names.difference(&QNameSet::from_names(not_qnames.iter().cloned()));
        }

        Ok(Self::new(names, process_contents))
    }

    /// Check if a name matches this wildcard
    pub fn is_matching(&self, name: &QName) -> bool {
        self.names.contains(name)
    }

    /// Check if this wildcard is a valid namespace restriction of another
    pub fn is_subset_of(&self, other: &Wildcard) -> bool {
        other.names.contains_all(&self.names)
    }

    /// Union used by extension: names are unioned and the extension's
    /// processing mode replaces the base's.
    pub fn extended_by(&self, extension: &Wildcard) -> Wildcard {
        Wildcard::new(
            self.names.union(&extension.names),
            extension.process_contents,
        )
    }

    /// Intersection used when attribute-group wildcards are combined
    pub fn intersected_with(&self, other: &Wildcard) -> Wildcard {
        Wildcard::new(self.names.intersect(&other.names), self.process_contents)
    }
}
