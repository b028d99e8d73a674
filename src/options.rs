//! Compilation options
//!
//! The configuration surface consumed by the compiler, plus a structural
//! limit that keeps pathological particle nesting from exhausting the stack.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Options controlling one type-system compilation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Do not report Unique Particle Attribution violations as errors
    pub disable_upa_check: bool,

    /// Do not attach documentation/appinfo text to resolved components
    pub disable_annotations: bool,

    /// Return a type system even when unrecoverable errors were found
    pub allow_partial_type_system: bool,

    /// Maximum nesting depth of a particle tree
    pub max_model_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            disable_upa_check: false,
            disable_annotations: false,
            allow_partial_type_system: false,
            max_model_depth: 256,
        }
    }
}

impl CompileOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict options: every check enabled, shallow models only
    pub fn strict() -> Self {
        Self {
            max_model_depth: 64,
            ..Self::default()
        }
    }

    /// Permissive options: keep compiling through anything recoverable
    pub fn permissive() -> Self {
        Self {
            disable_upa_check: true,
            disable_annotations: false,
            allow_partial_type_system: true,
            max_model_depth: 4096,
        }
    }

    /// Load options from a JSON document
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load options from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Set whether UPA violations are ignored
    pub fn with_disable_upa_check(mut self, disable: bool) -> Self {
        self.disable_upa_check = disable;
        self
    }

    /// Set whether annotations are dropped
    pub fn with_disable_annotations(mut self, disable: bool) -> Self {
        self.disable_annotations = disable;
        self
    }

    /// Set whether a partial type system is acceptable
    pub fn with_allow_partial_type_system(mut self, allow: bool) -> Self {
        self.allow_partial_type_system = allow;
        self
    }

    /// Set the particle nesting limit
    pub fn with_max_model_depth(mut self, depth: usize) -> Self {
        self.max_model_depth = depth;
        self
    }

    /// Check if a particle nesting depth is within limits
    pub fn check_model_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_model_depth {
            Err(Error::LimitExceeded(format!(
                "content model depth {} exceeds maximum {}",
                depth, self.max_model_depth
            )))
        } else {
            Ok(())
        }
    }
}
