//! Complex-type derivation tests
//!
//! Compiles small parsed-schema documents and checks base chains, merged
//! content models, attribute models and the diagnostics recorded for
//! invalid derivations.

mod common;

use common::{codes, compile, global, model, q};
use pretty_assertions::assert_eq;
use xmlschema_types::components::{AttributeUse, BuiltinCode, FacetKind};
use xmlschema_types::error::codes;
use xmlschema_types::{CompileOptions, Compiler, ContentVariety, DerivationMethod, Error};

const DERIVATIONS: &str = r#"{
    "complexTypes": [
        {
            "name": "Base",
            "particle": {"kind": "sequence", "particles": [
                {"kind": "element", "name": "a", "type": "{http://www.w3.org/2001/XMLSchema}string"},
                {"kind": "element", "name": "b", "minOccurs": "0"}
            ]},
            "attributes": [{"name": "id", "use": "required"}]
        },
        {
            "name": "Extended",
            "complexContent": {
                "method": "extension",
                "base": "Base",
                "particle": {"kind": "sequence", "particles": [
                    {"kind": "element", "name": "c", "minOccurs": "0", "maxOccurs": "unbounded"}
                ]},
                "attributes": [{"name": "lang"}]
            }
        },
        {
            "name": "Restricted",
            "complexContent": {
                "method": "restriction",
                "base": "Base",
                "particle": {"kind": "sequence", "particles": [
                    {"kind": "element", "name": "a", "type": "{http://www.w3.org/2001/XMLSchema}string"}
                ]}
            }
        },
        {
            "name": "Priced",
            "simpleContent": {
                "method": "extension",
                "base": "{http://www.w3.org/2001/XMLSchema}decimal",
                "attributes": [{"name": "currency", "use": "required"}]
            }
        },
        {
            "name": "SmallPrice",
            "simpleContent": {
                "method": "restriction",
                "base": "Priced",
                "facets": [{"kind": "maxInclusive", "value": "100"}]
            }
        }
    ]
}"#;

#[test]
fn test_extension_appends_content_and_attributes() {
    let compiled = compile(&[DERIVATIONS]);
    assert!(compiled.diagnostics().is_empty(), "{:?}", compiled.diagnostics());

    let base = global(&compiled, "Base");
    let extended = global(&compiled, "Extended");
    assert_eq!(model(&compiled, "Extended"), "seq(a, b?, c*)");
    assert_eq!(extended.base_type, Some(base.id));
    assert_eq!(extended.derivation, DerivationMethod::Extension);
    assert_eq!(extended.base_depth, base.base_depth + 1);
    assert_eq!(extended.content_variety, ContentVariety::ElementOnly);

    let attributes = &extended.attribute_model;
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes.get(&q("id")).unwrap().use_mode, AttributeUse::Required);
    assert_eq!(attributes.get(&q("lang")).unwrap().use_mode, AttributeUse::Optional);
}

#[test]
fn test_restriction_replaces_content_and_keeps_attributes() {
    let compiled = compile(&[DERIVATIONS]);
    let restricted = global(&compiled, "Restricted");
    assert_eq!(model(&compiled, "Restricted"), "a");
    assert_eq!(restricted.derivation, DerivationMethod::Restriction);
    assert!(restricted.attribute_model.get(&q("id")).unwrap().is_required());

    let types = compiled.type_system();
    let base = global(&compiled, "Base").id;
    let extended = global(&compiled, "Extended").id;
    assert!(types.is_derived_from(restricted.id, base));
    assert!(!types.is_derived_from(base, restricted.id));
    assert_eq!(types.common_base_type(extended, restricted.id), base);
}

#[test]
fn test_simple_content_derivations() {
    let compiled = compile(&[DERIVATIONS]);
    let priced = global(&compiled, "Priced");
    assert_eq!(priced.content_variety, ContentVariety::Simple);
    assert_eq!(priced.base_type, Some(BuiltinCode::Decimal.type_id()));
    assert_eq!(priced.content_based_on, Some(BuiltinCode::Decimal.type_id()));
    assert!(priced.content_model.is_none());
    assert!(priced.attribute_model.get(&q("currency")).unwrap().is_required());

    let small = global(&compiled, "SmallPrice");
    assert_eq!(small.base_type, Some(priced.id));
    assert_eq!(small.derivation, DerivationMethod::Restriction);
    assert_eq!(small.content_variety, ContentVariety::Simple);
    let facets = small.facets().unwrap();
    assert_eq!(facets.get(FacetKind::MaxInclusive).unwrap().value, "100");

    let based_on = compiled.type_system().get(small.content_based_on.unwrap());
    assert!(based_on.is_anonymous());
    assert_eq!(based_on.base_type, Some(BuiltinCode::Decimal.type_id()));
    assert_eq!(small.anonymous_types, vec![based_on.id]);
    assert!(small.attribute_model.contains(&q("currency")));
}

#[test]
fn test_invalid_derivations_are_reported() {
    let compiled = compile(&[r###"{
        "complexTypes": [
            {
                "name": "Sealed",
                "final": "#all",
                "particle": {"kind": "element", "name": "x"}
            },
            {"name": "Child", "complexContent": {"method": "extension", "base": "Sealed"}},
            {
                "name": "FromSimple",
                "complexContent": {"method": "extension", "base": "{http://www.w3.org/2001/XMLSchema}string"}
            },
            {
                "name": "Both",
                "particle": {"kind": "element", "name": "y"},
                "simpleContent": {"method": "extension", "base": "{http://www.w3.org/2001/XMLSchema}string"}
            },
            {
                "name": "Mixer",
                "mixed": true,
                "complexContent": {
                    "method": "extension",
                    "base": "Sealed",
                    "particle": {"kind": "element", "name": "z"}
                }
            }
        ]
    }"###]);

    assert_eq!(
        codes(&compiled),
        vec![
            codes::CT_FINAL_EXTENSION,
            codes::CT_EXTENDS_SIMPLE,
            codes::CT_CONTENT_FORMS,
            codes::CT_FINAL_EXTENSION,
            codes::CT_EXTENDS_MIXED,
        ]
    );
    assert!(compiled.diagnostics().iter().all(|d| d.recoverable));

    assert_eq!(model(&compiled, "Child"), "x");
    assert_eq!(global(&compiled, "Child").content_variety, ContentVariety::ElementOnly);
    assert_eq!(global(&compiled, "FromSimple").base_type, Some(BuiltinCode::AnyType.type_id()));
    assert_eq!(global(&compiled, "Both").content_variety, ContentVariety::Simple);
    assert_eq!(model(&compiled, "Mixer"), "seq(x, z)");
    assert_eq!(global(&compiled, "Mixer").content_variety, ContentVariety::Mixed);
}

#[test]
fn test_circular_base_chain_falls_back_to_any_type() {
    let compiled = compile(&[r#"{
        "complexTypes": [
            {"name": "A", "complexContent": {"method": "extension", "base": "B"}},
            {"name": "B", "complexContent": {"method": "extension", "base": "A"}}
        ]
    }"#]);

    assert_eq!(codes(&compiled), vec![codes::CIRCULAR]);
    let a = global(&compiled, "A");
    let b = global(&compiled, "B");
    assert_eq!(b.base_type, Some(BuiltinCode::AnyType.type_id()));
    assert_eq!(a.base_type, Some(b.id));
    assert!(a.is_resolved() && b.is_resolved());
}

#[test]
fn test_extending_a_circular_base_inherits_nothing() {
    let compiled = compile(&[r#"{
        "complexTypes": [
            {
                "name": "A",
                "complexContent": {
                    "method": "extension",
                    "base": "B",
                    "particle": {"kind": "sequence", "particles": [{"kind": "element", "name": "x"}]}
                }
            },
            {
                "name": "B",
                "complexContent": {
                    "method": "extension",
                    "base": "A",
                    "particle": {"kind": "sequence", "particles": [{"kind": "element", "name": "y"}]}
                }
            }
        ]
    }"#]);

    assert_eq!(codes(&compiled), vec![codes::CIRCULAR]);
    let b = global(&compiled, "B");
    assert_eq!(b.base_type, Some(BuiltinCode::AnyType.type_id()));
    assert_eq!(model(&compiled, "B"), "y");
    assert_eq!(b.content_variety, ContentVariety::ElementOnly);
    assert!(!b.has_element_wildcards());
    assert_eq!(model(&compiled, "A"), "seq(y, x)");
}

#[test]
fn test_extending_a_missing_base_inherits_nothing() {
    let compiled = compile(&[r#"{
        "complexTypes": [
            {
                "name": "Stray",
                "complexContent": {
                    "method": "extension",
                    "base": "Nowhere",
                    "particle": {"kind": "sequence", "particles": [
                        {"kind": "element", "name": "x"},
                        {"kind": "element", "name": "y", "minOccurs": "0"}
                    ]}
                }
            }
        ]
    }"#]);

    assert_eq!(codes(&compiled), vec![codes::SRC_RESOLVE]);
    let stray = global(&compiled, "Stray");
    assert_eq!(stray.base_type, Some(BuiltinCode::AnyType.type_id()));
    assert_eq!(stray.derivation, DerivationMethod::Extension);
    assert_eq!(model(&compiled, "Stray"), "seq(x, y?)");
    assert_eq!(stray.content_variety, ContentVariety::ElementOnly);
    assert_eq!(stray.content_model.as_ref().unwrap().is_deterministic(), Some(true));
}

#[test]
fn test_missing_base_is_unrecoverable() {
    let document = r#"{
        "complexTypes": [
            {"name": "Orphan", "complexContent": {"method": "restriction", "base": "Nowhere"}}
        ]
    }"#;

    let strict = Compiler::new(CompileOptions::default()).compile(&[common::schema(document)]);
    match strict {
        Err(Error::Compile { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].code, Some(codes::SRC_RESOLVE));
            assert_eq!(errors[0].component, Some(q("Orphan")));
        }
        other => panic!("expected a compile error, got {:?}", other.map(|c| c.diagnostics().to_vec())),
    }

    let partial = compile(&[document]);
    assert_eq!(codes(&partial), vec![codes::SRC_RESOLVE]);
    assert_eq!(
        global(&partial, "Orphan").base_type,
        Some(BuiltinCode::AnyType.type_id())
    );
}

#[test]
fn test_restriction_attribute_rules() {
    let compiled = compile(&[r#"{
        "complexTypes": [
            {
                "name": "Base",
                "attributes": [
                    {"name": "id", "use": "required"},
                    {"name": "opt"},
                    {"name": "fix", "fixed": "1"}
                ]
            },
            {
                "name": "Narrow",
                "complexContent": {
                    "method": "restriction",
                    "base": "Base",
                    "attributes": [
                        {"name": "id", "use": "optional"},
                        {"name": "opt", "use": "prohibited"},
                        {"name": "fix", "fixed": "2"},
                        {"name": "extra"}
                    ]
                }
            }
        ]
    }"#]);

    assert_eq!(
        codes(&compiled),
        vec![
            codes::RESTRICTION_ATTR_REQUIRED,
            codes::RESTRICTION_ATTR_FIXED,
            codes::RESTRICTION_ATTR_NOT_IN_BASE,
        ]
    );
    let narrow = global(&compiled, "Narrow");
    let names: Vec<String> = narrow.attribute_model.iter().map(|u| u.name.to_string()).collect();
    assert_eq!(names, vec!["id", "fix", "extra"]);
    assert_eq!(narrow.attribute_model.get(&q("fix")).unwrap().fixed_value.as_deref(), Some("2"));
    assert!(narrow.attribute_property(&q("opt")).is_none());
    assert!(narrow.attribute_property(&q("extra")).is_some());
    assert_eq!(narrow.content_variety, ContentVariety::Empty);
}
