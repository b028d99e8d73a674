//! Parsed-schema object model
//!
//! The compiler's input: schema components as an XSD document parser would
//! hand them over, with every reference still an unresolved QName and
//! every occurrence attribute still in its lexical form. The model is
//! serde-enabled so documents can be loaded from JSON; QNames use Clark
//! notation (`"{urn:example}item"`, or `"item"` for no namespace).

use crate::error::Result;
use crate::namespaces::QName;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One parsed schema document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedSchema {
    /// Where the document came from, for messages
    pub location: Option<String>,
    /// Target namespace
    pub target_namespace: Option<String>,
    /// Namespace adopted by a document without target namespace
    /// (chameleon inclusion)
    pub chameleon_namespace: Option<String>,
    /// `qualified` or `unqualified` (default)
    pub element_form_default: Option<String>,
    /// `qualified` or `unqualified` (default)
    pub attribute_form_default: Option<String>,
    /// Global complex types
    pub complex_types: Vec<ParsedComplexType>,
    /// Global simple types
    pub simple_types: Vec<ParsedSimpleType>,
    /// Global elements
    pub elements: Vec<ParsedElement>,
    /// Global attributes
    pub attributes: Vec<ParsedAttribute>,
    /// Named model groups
    pub groups: Vec<ParsedNamedGroup>,
    /// Named attribute groups
    pub attribute_groups: Vec<ParsedAttributeGroup>,
}

impl ParsedSchema {
    /// Create an empty document for a target namespace
    pub fn new(target_namespace: Option<&str>) -> Self {
        Self {
            target_namespace: target_namespace.map(String::from),
            ..Self::default()
        }
    }

    /// Load a document from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a document from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut schema = Self::from_json(&text)?;
        if schema.location.is_none() {
            schema.location = Some(path.display().to_string());
        }
        Ok(schema)
    }

    /// Serialize the document to JSON text
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether this document is included as a chameleon
    pub fn is_chameleon(&self) -> bool {
        self.target_namespace.is_none() && self.chameleon_namespace.is_some()
    }

    /// The namespace the document's components are declared in
    pub fn effective_namespace(&self) -> Option<&str> {
        self.target_namespace
            .as_deref()
            .or(self.chameleon_namespace.as_deref())
    }
}

/// Attribute declarations shared by complex types, derivations and
/// attribute groups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedAttributeDecls {
    /// Local attribute declarations and references
    pub attributes: Vec<ParsedAttribute>,
    /// Referenced attribute groups
    pub attribute_groups: Vec<QName>,
    /// Local attribute wildcard
    pub any_attribute: Option<ParsedWildcard>,
}

impl ParsedAttributeDecls {
    /// Whether nothing is declared
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.attribute_groups.is_empty() && self.any_attribute.is_none()
    }
}

/// A complex type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedComplexType {
    /// Local name (None for anonymous types)
    pub name: Option<String>,
    /// abstract attribute
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// mixed attribute
    pub mixed: bool,
    /// final attribute
    #[serde(rename = "final")]
    pub final_value: Option<String>,
    /// block attribute
    pub block: Option<String>,
    /// complexContent derivation
    pub complex_content: Option<ParsedDerivation>,
    /// simpleContent derivation
    pub simple_content: Option<ParsedDerivation>,
    /// Direct particle (basic form)
    pub particle: Option<ParsedParticle>,
    /// Direct attribute declarations (basic form)
    #[serde(flatten)]
    pub attribute_decls: ParsedAttributeDecls,
    /// Documentation text
    pub documentation: Vec<String>,
}

/// Derivation method named by the derivation element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsedMethod {
    /// xs:extension
    #[default]
    Extension,
    /// xs:restriction
    Restriction,
}

/// The extension/restriction child of complexContent or simpleContent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedDerivation {
    /// Extension or restriction
    pub method: ParsedMethod,
    /// Base type reference
    pub base: Option<QName>,
    /// mixed attribute of complexContent (overrides the type's)
    pub mixed: Option<bool>,
    /// Particle (complex content)
    pub particle: Option<ParsedParticle>,
    /// Attribute declarations
    #[serde(flatten)]
    pub attribute_decls: ParsedAttributeDecls,
    /// Inline simple type (simple content restriction)
    pub simple_type: Option<Box<ParsedSimpleType>>,
    /// Facets (simple content restriction)
    pub facets: Vec<ParsedFacet>,
}

/// A particle in a content model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParsedParticle {
    /// Local element or element reference
    Element(ParsedElement),
    /// Element wildcard
    Any(ParsedWildcard),
    /// xs:sequence
    Sequence(ParsedModelGroup),
    /// xs:choice
    Choice(ParsedModelGroup),
    /// xs:all
    All(ParsedModelGroup),
    /// Reference to a named model group
    Group(ParsedGroupRef),
}

impl ParsedParticle {
    /// Lexical minOccurs/maxOccurs
    pub fn occurs_attributes(&self) -> (Option<&str>, Option<&str>) {
        let (min, max) = match self {
            Self::Element(e) => (&e.min_occurs, &e.max_occurs),
            Self::Any(w) => (&w.min_occurs, &w.max_occurs),
            Self::Sequence(g) | Self::Choice(g) | Self::All(g) => (&g.min_occurs, &g.max_occurs),
            Self::Group(r) => (&r.min_occurs, &r.max_occurs),
        };
        (min.as_deref(), max.as_deref())
    }
}

/// An anonymous model group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedModelGroup {
    /// minOccurs attribute
    pub min_occurs: Option<String>,
    /// maxOccurs attribute
    pub max_occurs: Option<String>,
    /// Children in document order
    pub particles: Vec<ParsedParticle>,
}

/// A reference to a named model group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGroupRef {
    /// Referenced group
    #[serde(rename = "ref")]
    pub reference: QName,
    /// minOccurs attribute
    #[serde(default)]
    pub min_occurs: Option<String>,
    /// maxOccurs attribute
    #[serde(default)]
    pub max_occurs: Option<String>,
}

/// A named model group definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedNamedGroup {
    /// Local name
    pub name: String,
    /// The group's sequence, choice or all
    pub particle: ParsedParticle,
}

/// An element declaration (global or local) or element reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedElement {
    /// Local name
    pub name: Option<String>,
    /// Reference to a global element
    #[serde(rename = "ref")]
    pub reference: Option<QName>,
    /// Named type
    #[serde(rename = "type")]
    pub type_name: Option<QName>,
    /// Inline complex type
    pub complex_type: Option<Box<ParsedComplexType>>,
    /// Inline simple type
    pub simple_type: Option<Box<ParsedSimpleType>>,
    /// minOccurs attribute
    pub min_occurs: Option<String>,
    /// maxOccurs attribute
    pub max_occurs: Option<String>,
    /// nillable attribute
    pub nillable: bool,
    /// default attribute
    pub default: Option<String>,
    /// fixed attribute
    pub fixed: Option<String>,
    /// form attribute (local elements)
    pub form: Option<String>,
    /// abstract attribute (global elements)
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    /// substitutionGroup attribute (global elements)
    pub substitution_group: Option<QName>,
    /// final attribute
    #[serde(rename = "final")]
    pub final_value: Option<String>,
    /// block attribute
    pub block: Option<String>,
    /// Documentation text
    pub documentation: Vec<String>,
}

/// An element or attribute wildcard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedWildcard {
    /// namespace attribute
    pub namespace: Option<String>,
    /// notNamespace attribute
    pub not_namespace: Option<String>,
    /// notQName attribute
    #[serde(rename = "notQName")]
    pub not_qname: Vec<QName>,
    /// processContents attribute
    pub process_contents: Option<String>,
    /// minOccurs attribute (element wildcards)
    pub min_occurs: Option<String>,
    /// maxOccurs attribute (element wildcards)
    pub max_occurs: Option<String>,
}

/// An attribute declaration (global or local) or attribute reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedAttribute {
    /// Local name
    pub name: Option<String>,
    /// Reference to a global attribute
    #[serde(rename = "ref")]
    pub reference: Option<QName>,
    /// Named simple type
    #[serde(rename = "type")]
    pub type_name: Option<QName>,
    /// Inline simple type
    pub simple_type: Option<Box<ParsedSimpleType>>,
    /// use attribute
    #[serde(rename = "use")]
    pub use_value: Option<String>,
    /// default attribute
    pub default: Option<String>,
    /// fixed attribute
    pub fixed: Option<String>,
    /// form attribute (local attributes)
    pub form: Option<String>,
    /// Documentation text
    pub documentation: Vec<String>,
}

/// A named attribute group definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedAttributeGroup {
    /// Local name
    pub name: String,
    /// Contents
    #[serde(flatten)]
    pub attribute_decls: ParsedAttributeDecls,
}

/// A simple type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedSimpleType {
    /// Local name (None for anonymous types)
    pub name: Option<String>,
    /// final attribute
    #[serde(rename = "final")]
    pub final_value: Option<String>,
    /// Restriction, list or union
    pub derivation: ParsedSimpleDerivation,
    /// Documentation text
    pub documentation: Vec<String>,
}

/// The variety-defining child of a simple type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ParsedSimpleDerivation {
    /// xs:restriction
    Restriction(ParsedSimpleRestriction),
    /// xs:list
    List(ParsedList),
    /// xs:union
    Union(ParsedUnion),
}

impl Default for ParsedSimpleDerivation {
    fn default() -> Self {
        Self::Restriction(ParsedSimpleRestriction::default())
    }
}

/// Restriction of a simple type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedSimpleRestriction {
    /// Base type reference
    pub base: Option<QName>,
    /// Inline base type
    pub simple_type: Option<Box<ParsedSimpleType>>,
    /// Facets
    pub facets: Vec<ParsedFacet>,
}

/// List simple type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedList {
    /// Item type reference
    pub item_type: Option<QName>,
    /// Inline item type
    pub simple_type: Option<Box<ParsedSimpleType>>,
}

/// Union simple type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedUnion {
    /// Member type references
    pub member_types: Vec<QName>,
    /// Inline member types
    pub simple_types: Vec<ParsedSimpleType>,
}

/// A constraining facet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedFacet {
    /// Facet element local name (`maxLength`, `pattern`, ...)
    pub kind: String,
    /// value attribute
    pub value: String,
    /// fixed attribute
    pub fixed: bool,
}
