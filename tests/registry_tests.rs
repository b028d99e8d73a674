//! Multi-document compilation, global registries, groups and simple types

mod common;

use common::{codes, compile, compile_with, q, xs};
use pretty_assertions::assert_eq;
use xmlschema_types::components::{
    BuiltinCode, ContentVariety, FacetKind, ProcessContents, SimpleVariety, WhiteSpace,
};
use xmlschema_types::error::codes;
use xmlschema_types::{CompileOptions, QName, Severity};

fn a(local: &str) -> QName {
    QName::namespaced("urn:a", local)
}

const MAIN: &str = r#"{
    "location": "main.json",
    "targetNamespace": "urn:a",
    "elementFormDefault": "qualified",
    "complexTypes": [
        {
            "name": "Item",
            "documentation": ["An item"],
            "particle": {"kind": "sequence", "particles": [
                {"kind": "element", "name": "name", "type": "{http://www.w3.org/2001/XMLSchema}string"},
                {"kind": "group", "ref": "{urn:a}Extras", "minOccurs": "0"}
            ]},
            "attributeGroups": ["{urn:a}Common"],
            "attributes": [{"ref": "{urn:a}version"}]
        }
    ],
    "elements": [{"name": "item", "type": "{urn:a}Item"}],
    "attributes": [{"name": "version", "type": "{http://www.w3.org/2001/XMLSchema}int", "default": "1"}]
}"#;

const SHARED: &str = r###"{
    "location": "shared.json",
    "chameleonNamespace": "urn:a",
    "complexTypes": [{"name": "Item", "mixed": true}],
    "groups": [
        {
            "name": "Extras",
            "particle": {"kind": "choice", "particles": [
                {"kind": "element", "name": "note", "form": "unqualified"},
                {"kind": "element", "name": "tag", "type": "Code", "form": "qualified"}
            ]}
        }
    ],
    "attributeGroups": [
        {
            "name": "Common",
            "attributes": [{"name": "lang"}],
            "anyAttribute": {"namespace": "##other", "processContents": "lax"}
        }
    ],
    "simpleTypes": [
        {
            "name": "Code",
            "derivation": {
                "kind": "restriction",
                "base": "{http://www.w3.org/2001/XMLSchema}token",
                "facets": [{"kind": "maxLength", "value": "8"}, {"kind": "pattern", "value": "[A-Z]+"}]
            }
        }
    ]
}"###;

#[test]
fn test_documents_share_one_registry() {
    let compiled = compile(&[MAIN, SHARED]);
    assert!(!compiled.has_errors(), "{:?}", compiled.diagnostics());

    let warnings: Vec<_> = compiled.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, Some(codes::DUPLICATE_GLOBAL));
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(warnings[0].component, Some(a("Item")));

    let types = compiled.type_system();
    let item = types.find_type(&a("Item")).unwrap();
    assert_eq!(item.content_variety, ContentVariety::ElementOnly);
    assert_eq!(item.documentation, vec!["An item".to_string()]);
    assert!(types.find_type(&a("Code")).is_some());
    assert!(types.find_type(&q("Code")).is_none());
}

#[test]
fn test_groups_expand_with_their_own_scope() {
    let compiled = compile(&[MAIN, SHARED]);
    let item = compiled.type_system().find_type(&a("Item")).unwrap();
    let model = item.content_model.as_ref().unwrap();
    assert_eq!(model.to_string(), "seq({urn:a}name, choice(note, {urn:a}tag)?)");

    let code = compiled.type_system().find_type_id(&a("Code")).unwrap();
    let tag = item.element_property(&a("tag")).unwrap();
    assert_eq!(tag.type_id, code);
    assert_eq!((tag.min_occurs, tag.max_occurs), (0, Some(1)));
    let name = item.element_property(&a("name")).unwrap();
    assert_eq!((name.min_occurs, name.max_occurs), (1, Some(1)));
    assert!(item.element_property(&q("note")).is_some());
}

#[test]
fn test_attribute_groups_and_global_attributes() {
    let compiled = compile(&[MAIN, SHARED]);
    let types = compiled.type_system();
    let item = types.find_type(&a("Item")).unwrap();

    let names: Vec<String> = item.attribute_model.iter().map(|u| u.name.to_string()).collect();
    assert_eq!(names, vec!["{urn:a}version", "lang"]);

    let version = item.attribute_model.get(&a("version")).unwrap();
    assert_eq!(version.type_id, BuiltinCode::Int.type_id());
    assert_eq!(version.default_value.as_deref(), Some("1"));
    assert_eq!(types.find_attribute(&a("version")).unwrap().type_id, BuiltinCode::Int.type_id());

    let wildcard = item.attribute_model.wildcard().unwrap();
    assert_eq!(wildcard.process_contents, ProcessContents::Lax);
    assert!(wildcard.is_matching(&QName::namespaced("urn:b", "x")));
    assert!(!wildcard.is_matching(&a("x")));
    assert!(item.has_attribute_wildcards());

    let property = item.attribute_property(&a("version")).unwrap();
    assert!(property.is_attribute);
    assert_eq!(property.default_text.as_deref(), Some("1"));
}

#[test]
fn test_simple_type_facets_are_seeded_from_the_base() {
    let compiled = compile(&[MAIN, SHARED]);
    let code = compiled.type_system().find_type(&a("Code")).unwrap();
    assert!(code.is_simple());
    assert_eq!(code.base_type, Some(BuiltinCode::Token.type_id()));
    assert_eq!(code.simple_variety(), Some(SimpleVariety::Atomic));
    assert_eq!(code.primitive(), Some(BuiltinCode::String));

    let facets = code.facets().unwrap();
    assert_eq!(facets.get(FacetKind::MaxLength).unwrap().value, "8");
    assert_eq!(facets.patterns, vec!["[A-Z]+".to_string()]);
    assert_eq!(facets.white_space, Some(WhiteSpace::Collapse));
}

#[test]
fn test_list_and_union_types() {
    let compiled = compile(&[r#"{
        "simpleTypes": [
            {"name": "Sizes", "derivation": {"kind": "list", "itemType": "{http://www.w3.org/2001/XMLSchema}int"}},
            {
                "name": "Inner",
                "derivation": {"kind": "union", "memberTypes": [
                    "{http://www.w3.org/2001/XMLSchema}int",
                    "{http://www.w3.org/2001/XMLSchema}date"
                ]}
            },
            {
                "name": "Outer",
                "derivation": {
                    "kind": "union",
                    "memberTypes": ["Inner", "{http://www.w3.org/2001/XMLSchema}int"],
                    "simpleTypes": [{"derivation": {"kind": "list", "itemType": "{http://www.w3.org/2001/XMLSchema}string"}}]
                }
            },
            {"name": "Bad", "derivation": {"kind": "restriction", "base": "Holder"}}
        ],
        "complexTypes": [{"name": "Holder"}]
    }"#]);

    assert_eq!(codes(&compiled), vec![codes::ST_BASE]);
    let types = compiled.type_system();

    let sizes = types.find_type(&q("Sizes")).unwrap();
    assert_eq!(sizes.simple_variety(), Some(SimpleVariety::List));
    assert_eq!(sizes.simple.as_ref().unwrap().item_type, Some(BuiltinCode::Int.type_id()));
    assert_eq!(sizes.base_type, Some(BuiltinCode::AnySimpleType.type_id()));

    let outer = types.find_type(&q("Outer")).unwrap();
    let anonymous_list = outer.anonymous_types[0];
    assert_eq!(
        types.union_members(outer.id),
        &[BuiltinCode::Int.type_id(), BuiltinCode::Date.type_id(), anonymous_list]
    );
    assert!(types.union_members(sizes.id).is_empty());

    let bad = types.find_type(&q("Bad")).unwrap();
    assert_eq!(bad.base_type, Some(BuiltinCode::AnySimpleType.type_id()));
}

#[test]
fn test_annotations_can_be_disabled() {
    let compiled = compile_with(
        &[MAIN, SHARED],
        CompileOptions::default()
            .with_disable_annotations(true)
            .with_allow_partial_type_system(true),
    );
    let item = compiled.type_system().find_type(&a("Item")).unwrap();
    assert!(item.documentation.is_empty());
}

#[test]
fn test_builtins_are_preloaded() {
    let compiled = compile(&[]);
    let types = compiled.type_system();
    let any = types.any_type();
    assert_eq!(any.base_type, None);
    assert_eq!(any.base_depth, 0);
    assert_eq!(types.any_simple_type().base_depth, 1);

    let int = types.find_type(&xs("int")).unwrap();
    assert!(int.is_builtin() && int.is_resolved());
    assert!(types.is_derived_from(int.id, BuiltinCode::Decimal.type_id()));
    assert_eq!(
        types.common_base_type(BuiltinCode::Int.type_id(), BuiltinCode::Short.type_id()),
        BuiltinCode::Int.type_id()
    );
    assert_eq!(
        types.common_base_type(BuiltinCode::Int.type_id(), BuiltinCode::String.type_id()),
        BuiltinCode::AnySimpleType.type_id()
    );
}

#[test]
fn test_javaize_names_every_resolved_type() {
    let compiled = compile(&[MAIN, SHARED]);
    let mut types = compiled.into_type_system();
    types.javaize(|ty| match &ty.name {
        Some(name) => name.local_name.clone(),
        None => format!("Anon{}", ty.id.index()),
    });
    assert!(types.types().all(|ty| ty.is_javaized()));
    let item = types.find_type(&a("Item")).unwrap();
    assert_eq!(item.binding_name.as_deref(), Some("Item"));
}
