//! Substitution groups and document types

mod common;

use common::{codes, compile, global, q};
use pretty_assertions::assert_eq;
use xmlschema_types::components::{BuiltinCode, ContentVariety, DerivationMethod, QNameSet};
use xmlschema_types::error::codes;

const SHAPES: &str = r#"{
    "complexTypes": [
        {"name": "Shape", "particle": {"kind": "element", "name": "id"}},
        {
            "name": "Circle",
            "complexContent": {
                "method": "extension",
                "base": "Shape",
                "particle": {"kind": "element", "name": "r"}
            }
        },
        {"name": "Holder", "particle": {"kind": "element", "ref": "shape", "minOccurs": "0", "maxOccurs": "unbounded"}}
    ],
    "elements": [
        {"name": "shape", "type": "Shape", "abstract": true, "documentation": ["Any shape"]},
        {"name": "circle", "type": "Circle", "substitutionGroup": "shape"},
        {"name": "square", "substitutionGroup": "shape"},
        {"name": "dot", "substitutionGroup": "circle"},
        {"name": "text", "type": "{http://www.w3.org/2001/XMLSchema}string", "substitutionGroup": "shape"},
        {"name": "orphan", "substitutionGroup": "missing"},
        {"name": "loopA", "substitutionGroup": "loopB"},
        {"name": "loopB", "substitutionGroup": "loopA"}
    ]
}"#;

#[test]
fn test_links_and_diagnostics() {
    let compiled = compile(&[SHAPES]);
    assert_eq!(
        codes(&compiled),
        vec![codes::SRC_RESOLVE, codes::CIRCULAR, codes::SUBSTITUTION_TYPE]
    );

    let types = compiled.type_system();
    let shape = types.find_element(&q("shape")).unwrap();
    assert!(shape.is_substitution_head());
    assert_eq!(shape.substitution_members, vec![q("circle"), q("square"), q("text")]);

    let circle = types.find_element(&q("circle")).unwrap();
    assert_eq!(circle.substitution_group, Some(q("shape")));
    assert_eq!(circle.substitution_members, vec![q("dot")]);

    assert!(types.find_element(&q("orphan")).unwrap().substitution_group.is_none());
    assert_eq!(
        types.find_element(&q("loopA")).unwrap().substitution_group,
        Some(q("loopB"))
    );
    assert!(types.find_element(&q("loopB")).unwrap().substitution_group.is_none());

    let mismatch = compiled
        .diagnostics()
        .iter()
        .find(|d| d.code == Some(codes::SUBSTITUTION_TYPE))
        .unwrap();
    assert_eq!(mismatch.component, Some(q("text")));
}

#[test]
fn test_untyped_members_take_the_head_type() {
    let compiled = compile(&[SHAPES]);
    let types = compiled.type_system();
    let square = types.find_element(&q("square")).unwrap();
    assert!(!square.has_declared_type);
    assert_eq!(square.type_id, global(&compiled, "Shape").id);

    let dot = types.find_element(&q("dot")).unwrap();
    assert_eq!(dot.type_id, global(&compiled, "Circle").id);
    assert!(types.is_derived_from(dot.type_id, square.type_id));
}

#[test]
fn test_abstract_head_accepts_members_only() {
    let compiled = compile(&[SHAPES]);
    let holder = global(&compiled, "Holder").content_model.as_ref().unwrap();
    assert_eq!(holder.to_string(), "shape*");

    let accepted = &holder.as_element().unwrap().accepted_names;
    assert_eq!(
        accepted,
        &QNameSet::from_names([q("circle"), q("square"), q("dot"), q("text")])
    );
    assert!(!accepted.contains(&q("shape")));

    let property = global(&compiled, "Holder").element_property(&q("shape")).unwrap();
    assert_eq!(property.min_occurs, 0);
    assert_eq!(property.max_occurs, None);
}

#[test]
fn test_document_types_wrap_global_elements() {
    let compiled = compile(&[SHAPES]);
    let types = compiled.type_system();
    assert_eq!(types.document_types().count(), 8);

    let document = types.document_type(&q("shape")).unwrap();
    assert!(document.is_document_type);
    assert!(document.is_abstract);
    assert!(document.is_resolved());
    assert_eq!(document.base_type, Some(BuiltinCode::AnyType.type_id()));
    assert_eq!(document.base_depth, 1);
    assert_eq!(document.derivation, DerivationMethod::Restriction);
    assert_eq!(document.content_variety, ContentVariety::ElementOnly);
    assert_eq!(document.documentation, vec!["Any shape".to_string()]);
    assert_eq!(document.label(), "document type of shape");

    let particle = document.content_model.as_ref().unwrap();
    assert_eq!(particle.to_string(), "shape");
    assert_eq!(particle.is_deterministic(), Some(true));
    assert_eq!(
        particle.start_set(),
        Some(&QNameSet::from_names([q("circle"), q("square"), q("dot"), q("text")]))
    );

    let circle_document = types.document_type(&q("circle")).unwrap();
    let property = circle_document.element_property(&q("circle")).unwrap();
    assert_eq!(property.type_id, global(&compiled, "Circle").id);
    assert_eq!((property.min_occurs, property.max_occurs), (1, Some(1)));
}
