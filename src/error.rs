//! Error types for xmlschema-types
//!
//! Two kinds of failure exist in this crate. Rust-level failures (bad input
//! files, malformed JSON, a compilation aborted because a required component
//! is missing) are reported through [`Error`]. Schema-level problems are not
//! Rust errors at all: they are [`Diagnostic`] values collected while
//! compiling, each paired with a documented fallback so compilation can go on.

use std::fmt;
use thiserror::Error;

use crate::namespaces::QName;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xmlschema-types operations
#[derive(Error, Debug)]
pub enum Error {
    /// Parsed-schema input could not be interpreted
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Compilation aborted (partial type systems not allowed)
    #[error("compilation failed with {} unrecoverable error(s)", .errors.len())]
    Compile {
        /// The unrecoverable diagnostics that caused the abort
        errors: Vec<Diagnostic>,
    },

    /// Value error (invalid value for a setting or attribute)
    #[error("value error: {0}")]
    Value(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parsing error for lexical values found in the parsed-schema model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location of the offending value, if known
    pub location: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, " (at {})", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Severity of a compilation diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Progress or diagnostic information, no semantic effect
    Info,
    /// Non-conformant but processed as specified
    Warning,
    /// Schema-invalid; compilation continues with a fallback substitution
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// XML Schema constraint codes attached to diagnostics
///
/// The strings are the constraint identifiers used by the XML Schema
/// recommendation so downstream tooling can match on them.
pub mod codes {
    /// A QName reference could not be resolved
    pub const SRC_RESOLVE: &str = "src-resolve";
    /// A type, group or substitution chain refers back to itself
    pub const CIRCULAR: &str = "ct-props-correct.3";
    /// More than one of complexContent/simpleContent/particle present
    pub const CT_CONTENT_FORMS: &str = "src-ct.5";
    /// Complex-content extension of a simple type
    pub const CT_EXTENDS_SIMPLE: &str = "src-ct.1";
    /// Derivation from a type that is final for that method
    pub const CT_FINAL_EXTENSION: &str = "cos-ct-extends.1.1";
    /// Restriction of a type that is final for restriction
    pub const CT_FINAL_RESTRICTION: &str = "derivation-ok-restriction.1";
    /// Mixed/element-only mismatch between an extension and its base
    pub const CT_EXTENDS_MIXED: &str = "cos-ct-extends.1.4.3.2.2.1";
    /// Simple content derived from a type without simple content
    pub const CT_SIMPLE_CONTENT_BASE: &str = "src-ct.2";
    /// Extension redeclares or prohibits a base attribute
    pub const CT_EXTENDS_ATTRIBUTE: &str = "cos-ct-extends.1.2";
    /// Restriction widens a required attribute use to optional
    pub const RESTRICTION_ATTR_REQUIRED: &str = "derivation-ok-restriction.3";
    /// Restriction prohibits or drops a required base attribute
    pub const RESTRICTION_ATTR_PROHIBITED: &str = "derivation-ok-restriction.3.b";
    /// Restriction declares an attribute not allowed by the base
    pub const RESTRICTION_ATTR_NOT_IN_BASE: &str = "derivation-ok-restriction.2.2";
    /// Restriction changes a fixed attribute value
    pub const RESTRICTION_ATTR_FIXED: &str = "derivation-ok-restriction.2.1.3";
    /// Restriction wildcard is not a subset of the base wildcard
    pub const RESTRICTION_WILDCARD: &str = "derivation-ok-restriction.4";
    /// Malformed wildcard namespace specification
    pub const WILDCARD_NAMESPACE: &str = "src-wildcard";
    /// minOccurs/maxOccurs malformed or inconsistent
    pub const OCCURS: &str = "p-props-correct.2";
    /// An `all` group with illegal cardinality or children
    pub const ALL_LIMITED: &str = "cos-all-limited";
    /// An `all` group nested inside another model group
    pub const ALL_NESTED: &str = "cos-all-limited.1.2";
    /// A required choice with no alternatives
    pub const EMPTY_CHOICE: &str = "empty-choice";
    /// Unique Particle Attribution violated
    pub const NON_AMBIGUOUS: &str = "cos-nonambig";
    /// Duplicate attribute name within one attribute model
    pub const DUPLICATE_ATTRIBUTE: &str = "ct-props-correct.4";
    /// Duplicate global component across documents
    pub const DUPLICATE_GLOBAL: &str = "sch-props-correct.2";
    /// Substitution group member type does not derive from head type
    pub const SUBSTITUTION_TYPE: &str = "e-props-correct.4";
    /// Invalid NCName for a declared component
    pub const INVALID_NAME: &str = "cvc-datatype-valid.1.2.1";
    /// Unrecognised `use`, `final` or `block` value
    pub const INVALID_VALUE: &str = "s4s-att-invalid-value";
    /// Simple type derived from a complex type
    pub const ST_BASE: &str = "st-props-correct.1";
    /// Unknown facet, malformed facet value, or change of a fixed facet
    pub const FACET: &str = "cos-applicable-facets";
    /// Particle nesting exceeded the configured limit
    pub const MODEL_DEPTH: &str = "model-depth";
}

/// A schema-level problem found while compiling
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Constraint code (see [`codes`])
    pub code: Option<&'static str>,
    /// Human readable message
    pub message: String,
    /// Schema component the problem was found on
    pub component: Option<QName>,
    /// Whether compilation could substitute a fallback for this problem
    pub recoverable: bool,
}

impl Diagnostic {
    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            component: None,
            recoverable: true,
        }
    }

    /// Set the constraint code
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the component the diagnostic applies to
    pub fn with_component(mut self, component: Option<QName>) -> Self {
        self.component = component;
        self
    }

    /// Mark the diagnostic as unrecoverable (no fallback exists)
    pub fn unrecoverable(mut self) -> Self {
        self.recoverable = false;
        self
    }

    /// Whether this diagnostic is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, " [{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(ref component) = self.component {
            write!(f, " (in {})", component)?;
        }
        Ok(())
    }
}
