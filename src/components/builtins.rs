//! XSD built-in types
//!
//! The builtin table is a pre-populated leaf type system: `anyType`,
//! `anySimpleType` and the XSD 1.0 primitive and derived datatypes. Every
//! builtin is born resolved and occupies a fixed arena slot, so a
//! [`BuiltinCode`] converts directly into a [`TypeId`].
//!
//! Reference: https://www.w3.org/TR/xmlschema-2/#built-in-datatypes

use crate::compiler::phases::Phase;
use crate::namespaces::QName;
use crate::XSD_NAMESPACE;
use indexmap::IndexMap;
use std::fmt;

use super::attributes::SchemaAttributeModel;
use super::particles::{Occurs, SchemaParticle};
use super::qnameset::QNameSet;
use super::types::{
    ContentVariety, DerivationMethod, Facet, FacetKind, SchemaType, SimpleFacets, SimpleTypeInfo,
    SimpleVariety, TypeId, TypeKind, WhiteSpace,
};
use super::wildcards::{ProcessContents, Wildcard};

macro_rules! builtin_codes {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Code of a builtin type; the discriminant is its arena slot
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        pub enum BuiltinCode {
            $(
                #[doc = concat!("xs:", $name)]
                $variant,
            )*
        }

        impl BuiltinCode {
            /// Every builtin, in arena order
            pub const ALL: &'static [BuiltinCode] = &[$(BuiltinCode::$variant),*];

            /// Local name in the XSD namespace
            pub fn local_name(self) -> &'static str {
                match self {
                    $(BuiltinCode::$variant => $name,)*
                }
            }
        }
    };
}

builtin_codes! {
    AnyType => "anyType",
    AnySimpleType => "anySimpleType",
    String => "string",
    Boolean => "boolean",
    Float => "float",
    Double => "double",
    Decimal => "decimal",
    Duration => "duration",
    DateTime => "dateTime",
    Time => "time",
    Date => "date",
    GYearMonth => "gYearMonth",
    GYear => "gYear",
    GMonthDay => "gMonthDay",
    GDay => "gDay",
    GMonth => "gMonth",
    HexBinary => "hexBinary",
    Base64Binary => "base64Binary",
    AnyUri => "anyURI",
    QName => "QName",
    Notation => "NOTATION",
    NormalizedString => "normalizedString",
    Token => "token",
    Language => "language",
    NmToken => "NMTOKEN",
    NmTokens => "NMTOKENS",
    Name => "Name",
    NcName => "NCName",
    Id => "ID",
    IdRef => "IDREF",
    IdRefs => "IDREFS",
    Entity => "ENTITY",
    Entities => "ENTITIES",
    Integer => "integer",
    NonPositiveInteger => "nonPositiveInteger",
    NegativeInteger => "negativeInteger",
    Long => "long",
    Int => "int",
    Short => "short",
    Byte => "byte",
    NonNegativeInteger => "nonNegativeInteger",
    UnsignedLong => "unsignedLong",
    UnsignedInt => "unsignedInt",
    UnsignedShort => "unsignedShort",
    UnsignedByte => "unsignedByte",
    PositiveInteger => "positiveInteger",
}

impl BuiltinCode {
    /// Arena slot of this builtin
    pub fn type_id(self) -> TypeId {
        TypeId(self as usize)
    }

    /// Qualified name in the XSD namespace
    pub fn qname(self) -> QName {
        QName::namespaced(XSD_NAMESPACE, self.local_name())
    }

    /// Look up a builtin by local name
    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|code| code.local_name() == name)
    }

    /// Look up a builtin by qualified name
    pub fn from_qname(name: &QName) -> Option<Self> {
        if name.namespace.as_deref() == Some(XSD_NAMESPACE) {
            Self::from_local_name(&name.local_name)
        } else {
            None
        }
    }

    /// Base type; None for anyType
    pub fn base(self) -> Option<BuiltinCode> {
        use BuiltinCode::*;
        Some(match self {
            AnyType => return None,
            AnySimpleType => AnyType,
            String | Boolean | Float | Double | Decimal | Duration | DateTime | Time | Date
            | GYearMonth | GYear | GMonthDay | GDay | GMonth | HexBinary | Base64Binary
            | AnyUri | QName | Notation => AnySimpleType,
            NmTokens | IdRefs | Entities => AnySimpleType,
            NormalizedString => String,
            Token => NormalizedString,
            Language | NmToken | Name => Token,
            NcName => Name,
            Id | IdRef | Entity => NcName,
            Integer => Decimal,
            NonPositiveInteger | Long | NonNegativeInteger => Integer,
            NegativeInteger => NonPositiveInteger,
            Int => Long,
            Short => Int,
            Byte => Short,
            UnsignedLong | PositiveInteger => NonNegativeInteger,
            UnsignedInt => UnsignedLong,
            UnsignedShort => UnsignedInt,
            UnsignedByte => UnsignedShort,
        })
    }

    /// Item type of the builtin list types
    pub fn list_item(self) -> Option<BuiltinCode> {
        match self {
            Self::NmTokens => Some(Self::NmToken),
            Self::IdRefs => Some(Self::IdRef),
            Self::Entities => Some(Self::Entity),
            _ => None,
        }
    }

    /// Whether this is one of the XSD primitive datatypes
    pub fn is_primitive(self) -> bool {
        self.base() == Some(Self::AnySimpleType) && self.list_item().is_none()
    }

    /// Primitive this builtin's value space comes from
    pub fn primitive(self) -> Option<BuiltinCode> {
        let mut code = self;
        loop {
            if code.is_primitive() {
                return Some(code);
            }
            code = code.base()?;
        }
    }

    fn white_space(self) -> Option<WhiteSpace> {
        match self {
            Self::AnyType | Self::AnySimpleType => None,
            Self::String => Some(WhiteSpace::Preserve),
            Self::NormalizedString => Some(WhiteSpace::Replace),
            _ => Some(WhiteSpace::Collapse),
        }
    }

    fn seed_facets(self) -> &'static [(FacetKind, &'static str)] {
        use FacetKind::*;
        match self {
            Self::Integer => &[(FractionDigits, "0")],
            Self::NonPositiveInteger => &[(MaxInclusive, "0")],
            Self::NegativeInteger => &[(MaxInclusive, "-1")],
            Self::Long => &[
                (MinInclusive, "-9223372036854775808"),
                (MaxInclusive, "9223372036854775807"),
            ],
            Self::Int => &[(MinInclusive, "-2147483648"), (MaxInclusive, "2147483647")],
            Self::Short => &[(MinInclusive, "-32768"), (MaxInclusive, "32767")],
            Self::Byte => &[(MinInclusive, "-128"), (MaxInclusive, "127")],
            Self::NonNegativeInteger => &[(MinInclusive, "0")],
            Self::UnsignedLong => &[(MaxInclusive, "18446744073709551615")],
            Self::UnsignedInt => &[(MaxInclusive, "4294967295")],
            Self::UnsignedShort => &[(MaxInclusive, "65535")],
            Self::UnsignedByte => &[(MaxInclusive, "255")],
            Self::PositiveInteger => &[(MinInclusive, "1")],
            Self::NmTokens | Self::IdRefs | Self::Entities => &[(MinLength, "1")],
            _ => &[],
        }
    }
}

impl fmt::Display for BuiltinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xs:{}", self.local_name())
    }
}

/// Build the resolved builtin types, in arena order
pub fn builtin_types() -> Vec<SchemaType> {
    let mut types: Vec<SchemaType> = Vec::with_capacity(BuiltinCode::ALL.len());
    for &code in BuiltinCode::ALL {
        let ty = match code {
            BuiltinCode::AnyType => any_type(),
            _ => {
                let base = code.base().map(BuiltinCode::type_id);
                let inherited = base
                    .and_then(|b| types.get(b.index()))
                    .and_then(|b| b.simple.as_ref())
                    .map(|s| s.facets.clone())
                    .unwrap_or_default();
                simple_builtin(code, inherited)
            }
        };
        types.push(ty);
    }
    types
}

fn any_type() -> SchemaType {
    let code = BuiltinCode::AnyType;
    let mut ty = SchemaType::new(code.type_id(), Some(code.qname()), TypeKind::Complex);
    ty.builtin = Some(code);
    ty.content_variety = ContentVariety::Mixed;

    let wildcard = Wildcard::new(QNameSet::all(), ProcessContents::Lax);
    let particle = SchemaParticle::wildcard(wildcard.clone(), Occurs::zero_or_more());
    crate::compiler::upa::build_state_machine(&particle);
    ty.content_model = Some(particle);

    let mut attributes = SchemaAttributeModel::new();
    attributes.set_wildcard(Some(wildcard));
    ty.attribute_model = attributes;
    ty.element_wildcard_names = QNameSet::all();
    ty.attribute_wildcard_names = QNameSet::all();
    ty.phase = Phase::Resolved;
    ty
}

fn simple_builtin(code: BuiltinCode, inherited: SimpleFacets) -> SchemaType {
    let mut ty = SchemaType::new(code.type_id(), Some(code.qname()), TypeKind::Simple);
    ty.builtin = Some(code);
    ty.base_type = code.base().map(BuiltinCode::type_id);
    ty.base_depth = depth_of(code);
    ty.derivation = DerivationMethod::Restriction;

    let mut facets = if code.list_item().is_some() {
        SimpleFacets::default()
    } else {
        inherited
    };
    for (kind, value) in code.seed_facets() {
        facets.values.insert(
            *kind,
            Facet {
                value: (*value).to_string(),
                fixed: *kind == FacetKind::FractionDigits,
            },
        );
    }
    facets.white_space = code.white_space();

    let (variety, item_type) = match code.list_item() {
        Some(item) => (SimpleVariety::List, Some(item.type_id())),
        None => (SimpleVariety::Atomic, None),
    };
    ty.simple = Some(SimpleTypeInfo {
        variety,
        primitive: code.primitive(),
        item_type,
        member_types: Vec::new(),
        facets,
    });
    ty.phase = Phase::Resolved;
    ty
}

fn depth_of(code: BuiltinCode) -> u32 {
    let mut depth = 0;
    let mut current = code;
    while let Some(base) = current.base() {
        depth += 1;
        current = base;
    }
    depth
}

/// Builtin types keyed by qualified name
pub fn builtin_names() -> IndexMap<QName, TypeId> {
    BuiltinCode::ALL
        .iter()
        .map(|code| (code.qname(), code.type_id()))
        .collect()
}
