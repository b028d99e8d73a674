//! Qualified names
//!
//! Every schema component and every name a content model can accept is a
//! [`QName`]. The absent namespace is represented as `None`; an empty
//! namespace string is normalized to `None` on construction so the two
//! spellings never compare unequal.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()).filter(|ns| !ns.is_empty()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self::new(Some(namespace), local_name)
    }

    /// The namespace URI, with the empty string standing for "no namespace"
    pub fn namespace_uri(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }

    /// Same local name moved into another namespace
    pub fn with_namespace(&self, namespace: Option<&str>) -> Self {
        Self::new(namespace, self.local_name.clone())
    }

    /// Parse Clark notation: `{namespace}local` or a bare `local`
    pub fn from_clark(value: &str) -> Result<Self> {
        let value = value.trim();
        if let Some(rest) = value.strip_prefix('{') {
            let (namespace, local) = rest.split_once('}').ok_or_else(|| {
                Error::Namespace(format!("unterminated namespace in '{}'", value))
            })?;
            if local.is_empty() {
                return Err(Error::Name(format!("missing local name in '{}'", value)));
            }
            Ok(Self::new(Some(namespace), local))
        } else if value.is_empty() {
            Err(Error::Name("empty qualified name".to_string()))
        } else {
            Ok(Self::local(value))
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

impl FromStr for QName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_clark(s)
    }
}

impl TryFrom<String> for QName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_clark(&value)
    }
}

impl From<QName> for String {
    fn from(name: QName) -> Self {
        name.to_string()
    }
}
