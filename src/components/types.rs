//! Schema types
//!
//! A [`SchemaType`] is one node of the resolved type graph. Types live in an
//! arena owned by the type system and refer to each other through [`TypeId`]
//! handles, which makes forward references and cycles in the source harmless.
//! A type is created empty, filled in while its phase is `Resolving`, and is
//! read-only once the type system is frozen.
//!
//! Reference: https://www.w3.org/TR/xmlschema-1/#Complex_Type_Definitions

use crate::compiler::phases::Phase;
use crate::error::{Error, Result};
use crate::namespaces::QName;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::fmt;

use super::attributes::SchemaAttributeModel;
use super::builtins::BuiltinCode;
use super::particles::SchemaParticle;
use super::properties::SchemaProperty;
use super::qnameset::QNameSet;

/// Handle of a type inside a type system's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    /// The universal root type `xs:anyType`
    pub const ANY_TYPE: TypeId = TypeId(0);
    /// The universal simple type `xs:anySimpleType`
    pub const ANY_SIMPLE_TYPE: TypeId = TypeId(1);

    /// Position in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Simple or complex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// xs:simpleType
    Simple,
    /// xs:complexType
    Complex,
}

/// How a type was derived from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivationMethod {
    /// No base (only the universal root type)
    #[default]
    None,
    /// Derived by extension
    Extension,
    /// Derived by restriction
    Restriction,
}

impl fmt::Display for DerivationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Extension => write!(f, "extension"),
            Self::Restriction => write!(f, "restriction"),
        }
    }
}

/// Content variety of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentVariety {
    /// Simple types have no content model of their own
    #[default]
    NotComplex,
    /// No child elements, no text
    Empty,
    /// Text only
    Simple,
    /// Child elements only
    ElementOnly,
    /// Child elements interleaved with text
    Mixed,
}

impl ContentVariety {
    /// Whether instances can contain child elements
    pub fn has_elements(self) -> bool {
        matches!(self, Self::ElementOnly | Self::Mixed)
    }
}

impl fmt::Display for ContentVariety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotComplex => write!(f, "not-complex"),
            Self::Empty => write!(f, "empty"),
            Self::Simple => write!(f, "simple"),
            Self::ElementOnly => write!(f, "element-only"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// A set of derivation methods (`final`, `block`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct DerivationFlags {
    /// Extension is covered
    pub extension: bool,
    /// Restriction is covered
    pub restriction: bool,
    /// Substitution is covered (`block` on elements)
    pub substitution: bool,
    /// List is covered (simple types)
    pub list: bool,
    /// Union is covered (simple types)
    pub union: bool,
}

impl DerivationFlags {
    /// No flags
    pub fn none() -> Self {
        Self::default()
    }

    /// Every flag (`#all`)
    pub fn all() -> Self {
        Self {
            extension: true,
            restriction: true,
            substitution: true,
            list: true,
            union: true,
        }
    }

    /// Parse a `final`/`block` attribute value
    pub fn from_str(value: &str) -> Result<Self> {
        let value = value.trim();
        if value == "#all" {
            return Ok(Self::all());
        }
        let mut flags = Self::none();
        for token in value.split_whitespace() {
            match token {
                "extension" => flags.extension = true,
                "restriction" => flags.restriction = true,
                "substitution" => flags.substitution = true,
                "list" => flags.list = true,
                "union" => flags.union = true,
                other => {
                    return Err(Error::Value(format!(
                        "invalid derivation control '{}'",
                        other
                    )))
                }
            }
        }
        Ok(flags)
    }

    /// Whether a derivation method is blocked by these flags
    pub fn contains(&self, method: DerivationMethod) -> bool {
        match method {
            DerivationMethod::Extension => self.extension,
            DerivationMethod::Restriction => self.restriction,
            DerivationMethod::None => false,
        }
    }
}

/// Variety of a simple type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimpleVariety {
    /// Single value of a primitive type
    #[default]
    Atomic,
    /// Whitespace separated list of an item type
    List,
    /// One of several member types
    Union,
}

/// White space normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl WhiteSpace {
    /// Parse from string value
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim() {
            "preserve" => Some(Self::Preserve),
            "replace" => Some(Self::Replace),
            "collapse" => Some(Self::Collapse),
            _ => None,
        }
    }
}

/// Constraining facet kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetKind {
    /// length
    Length,
    /// minLength
    MinLength,
    /// maxLength
    MaxLength,
    /// pattern
    Pattern,
    /// enumeration
    Enumeration,
    /// whiteSpace
    WhiteSpace,
    /// maxInclusive
    MaxInclusive,
    /// maxExclusive
    MaxExclusive,
    /// minInclusive
    MinInclusive,
    /// minExclusive
    MinExclusive,
    /// totalDigits
    TotalDigits,
    /// fractionDigits
    FractionDigits,
}

impl FacetKind {
    /// Parse from the facet element's local name
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "length" => Some(Self::Length),
            "minLength" => Some(Self::MinLength),
            "maxLength" => Some(Self::MaxLength),
            "pattern" => Some(Self::Pattern),
            "enumeration" => Some(Self::Enumeration),
            "whiteSpace" => Some(Self::WhiteSpace),
            "maxInclusive" => Some(Self::MaxInclusive),
            "maxExclusive" => Some(Self::MaxExclusive),
            "minInclusive" => Some(Self::MinInclusive),
            "minExclusive" => Some(Self::MinExclusive),
            "totalDigits" => Some(Self::TotalDigits),
            "fractionDigits" => Some(Self::FractionDigits),
            _ => None,
        }
    }
}

/// A single-valued facet
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Facet {
    /// Lexical value
    pub value: String,
    /// Whether derived types may not change it
    pub fixed: bool,
}

/// The effective facets of a simple type or simple content
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct SimpleFacets {
    /// Single-valued facets (length, bounds, digits)
    pub values: IndexMap<FacetKind, Facet>,
    /// Patterns from every derivation step
    pub patterns: Vec<String>,
    /// Enumeration values from the most derived step that declared any
    pub enumerations: Vec<String>,
    /// White space rule
    pub white_space: Option<WhiteSpace>,
}

impl SimpleFacets {
    /// Single-valued facet lookup
    pub fn get(&self, kind: FacetKind) -> Option<&Facet> {
        self.values.get(&kind)
    }

    /// Whether no facet is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.patterns.is_empty()
            && self.enumerations.is_empty()
            && self.white_space.is_none()
    }
}

/// Simple-type specific information
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleTypeInfo {
    /// Atomic, list or union
    pub variety: SimpleVariety,
    /// Primitive builtin the value space comes from (atomic only)
    pub primitive: Option<BuiltinCode>,
    /// Item type (list only)
    pub item_type: Option<TypeId>,
    /// Declared member types (union only)
    pub member_types: Vec<TypeId>,
    /// Effective facets
    pub facets: SimpleFacets,
}

/// A node in the resolved type graph
#[derive(Debug)]
pub struct SchemaType {
    /// Arena handle
    pub id: TypeId,
    /// Qualified name; None for anonymous types
    pub name: Option<QName>,
    /// Simple or complex
    pub kind: TypeKind,
    /// Derivation method from the base type
    pub derivation: DerivationMethod,
    /// Content variety
    pub content_variety: ContentVariety,
    /// Base type; None only for the universal root
    pub base_type: Option<TypeId>,
    /// Distance from the universal root type
    pub base_depth: u32,
    /// Abstract flag
    pub is_abstract: bool,
    /// Final flags
    pub final_flags: DerivationFlags,
    /// Block flags
    pub block_flags: DerivationFlags,
    /// Builtin code for builtin types
    pub builtin: Option<BuiltinCode>,
    /// Simple-type information (simple types and simple content)
    pub simple: Option<SimpleTypeInfo>,
    /// Simple type that the text content is based on (simple content)
    pub content_based_on: Option<TypeId>,
    /// Content model
    pub content_model: Option<SchemaParticle>,
    /// Attribute model
    pub attribute_model: SchemaAttributeModel,
    /// Names matched only through element wildcards
    pub element_wildcard_names: QNameSet,
    /// Names matched only through the attribute wildcard
    pub attribute_wildcard_names: QNameSet,
    /// Flattened element properties
    pub element_properties: Vec<SchemaProperty>,
    /// Flattened attribute properties
    pub attribute_properties: Vec<SchemaProperty>,
    /// Anonymous types declared inside this type
    pub anonymous_types: Vec<TypeId>,
    /// Enclosing type of an anonymous type
    pub outer_type: Option<TypeId>,
    /// Whether this is the wrapper type of a global element
    pub is_document_type: bool,
    /// Element wrapped by a document type
    pub document_element: Option<QName>,
    /// Documentation text
    pub documentation: Vec<String>,
    /// Name assigned by the language-binding pass
    pub binding_name: Option<String>,
    pub(crate) phase: Phase,
    element_index: OnceCell<IndexMap<QName, usize>>,
    attribute_index: OnceCell<IndexMap<QName, usize>>,
    pub(crate) union_members: OnceCell<Vec<TypeId>>,
}

impl SchemaType {
    /// Create an empty, unresolved type
    pub fn new(id: TypeId, name: Option<QName>, kind: TypeKind) -> Self {
        Self {
            id,
            name,
            kind,
            derivation: DerivationMethod::None,
            content_variety: match kind {
                TypeKind::Simple => ContentVariety::NotComplex,
                TypeKind::Complex => ContentVariety::Empty,
            },
            base_type: None,
            base_depth: 0,
            is_abstract: false,
            final_flags: DerivationFlags::none(),
            block_flags: DerivationFlags::none(),
            builtin: None,
            simple: None,
            content_based_on: None,
            content_model: None,
            attribute_model: SchemaAttributeModel::new(),
            element_wildcard_names: QNameSet::empty(),
            attribute_wildcard_names: QNameSet::empty(),
            element_properties: Vec::new(),
            attribute_properties: Vec::new(),
            anonymous_types: Vec::new(),
            outer_type: None,
            is_document_type: false,
            document_element: None,
            documentation: Vec::new(),
            binding_name: None,
            phase: Phase::Unresolved,
            element_index: OnceCell::new(),
            attribute_index: OnceCell::new(),
            union_members: OnceCell::new(),
        }
    }

    /// Whether this is a simple type
    pub fn is_simple(&self) -> bool {
        self.kind == TypeKind::Simple
    }

    /// Whether this is a complex type
    pub fn is_complex(&self) -> bool {
        self.kind == TypeKind::Complex
    }

    /// Whether this is an anonymous type
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// Whether this is a builtin type
    pub fn is_builtin(&self) -> bool {
        self.builtin.is_some()
    }

    /// Whether this is the universal root type
    pub fn is_any_type(&self) -> bool {
        self.id == TypeId::ANY_TYPE
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether every resolution-owned field is safe to read
    pub fn is_resolved(&self) -> bool {
        self.phase.is_resolved()
    }

    /// Whether the binding name is safe to read
    pub fn is_javaized(&self) -> bool {
        self.phase.is_javaized()
    }

    /// Simple variety, for simple types and simple content
    pub fn simple_variety(&self) -> Option<SimpleVariety> {
        self.simple.as_ref().map(|s| s.variety)
    }

    /// Primitive builtin code, for atomic simple types
    pub fn primitive(&self) -> Option<BuiltinCode> {
        self.simple.as_ref().and_then(|s| s.primitive)
    }

    /// Effective facets, for simple types and simple content
    pub fn facets(&self) -> Option<&SimpleFacets> {
        self.simple.as_ref().map(|s| &s.facets)
    }

    /// Whether the content model contains any element wildcard
    pub fn has_element_wildcards(&self) -> bool {
        !self.element_wildcard_names.is_empty()
    }

    /// Whether the attribute model has a wildcard
    pub fn has_attribute_wildcards(&self) -> bool {
        !self.attribute_wildcard_names.is_empty()
    }

    /// Element property by name
    pub fn element_property(&self, name: &QName) -> Option<&SchemaProperty> {
        let index = self
            .element_index
            .get_or_init(|| Self::index_properties(&self.element_properties));
        index.get(name).map(|&i| &self.element_properties[i])
    }

    /// Attribute property by name
    pub fn attribute_property(&self, name: &QName) -> Option<&SchemaProperty> {
        let index = self
            .attribute_index
            .get_or_init(|| Self::index_properties(&self.attribute_properties));
        index.get(name).map(|&i| &self.attribute_properties[i])
    }

    fn index_properties(properties: &[SchemaProperty]) -> IndexMap<QName, usize> {
        properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect()
    }

    /// Display label: the QName, or the document element / arena handle
    pub fn label(&self) -> String {
        match (&self.name, &self.document_element) {
            (Some(name), _) => name.to_string(),
            (None, Some(element)) => format!("document type of {}", element),
            (None, None) => format!("anonymous type {}", self.id),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
