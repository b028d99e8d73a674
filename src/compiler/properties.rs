//! Property-model projection
//!
//! Flattens a resolved content model into one property per element name
//! and the attribute model into one property per attribute name.

use indexmap::IndexMap;

use super::context::CompileContext;
use crate::components::attributes::SchemaAttributeModel;
use crate::components::particles::{ElementTerm, OccursCalculator, ParticleTerm, SchemaParticle};
use crate::components::properties::{PropertyFlag, SchemaProperty};
use crate::components::types::{SchemaType, TypeId};
use crate::components::typesystem::common_base_in;
use crate::namespaces::QName;

type PropertyMap = IndexMap<QName, SchemaProperty>;

/// Compute the element and attribute properties of a resolved type
pub(crate) fn project_properties(ctx: &mut CompileContext, id: TypeId) {
    let ty = ctx.ty(id);
    let elements = match &ty.content_model {
        Some(model) => project(&ctx.types, model, id).into_values().collect(),
        None => Vec::new(),
    };
    let attributes = attribute_properties(&ty.attribute_model, id);

    let ty = ctx.ty_mut(id);
    ty.element_properties = elements;
    ty.attribute_properties = attributes;
}

/// Element properties of a particle tree owned by `container`
pub(crate) fn project(types: &[SchemaType], particle: &SchemaParticle, container: TypeId) -> PropertyMap {
    let mut map = match &particle.term {
        ParticleTerm::Element(element) => {
            let mut map = PropertyMap::new();
            map.insert(element.name.clone(), element_property(element, container));
            map
        }
        ParticleTerm::Wildcard(_) => PropertyMap::new(),
        ParticleTerm::Sequence(children) => {
            let mut map = PropertyMap::new();
            for child in children {
                for (name, property) in project(types, child, container) {
                    match map.get_mut(&name) {
                        Some(existing) => merge_in_sequence(types, existing, &property),
                        None => {
                            map.insert(name, property);
                        }
                    }
                }
            }
            map
        }
        ParticleTerm::Choice(children) | ParticleTerm::All(children) => {
            let branches: Vec<PropertyMap> = children
                .iter()
                .map(|child| project(types, child, container))
                .collect();
            merge_alternatives(types, branches)
        }
    };

    for property in map.values_mut() {
        let mut calc = OccursCalculator::from_occurs(property.occurs());
        calc.multiply(particle.occurs);
        property.set_occurs(calc.occurs());
    }
    map
}

fn element_property(element: &ElementTerm, container: TypeId) -> SchemaProperty {
    let mut property = SchemaProperty::element(element.name.clone(), element.type_id, container);
    property.nillable = PropertyFlag::from_bool(element.nillable);
    property.has_default = PropertyFlag::from_bool(element.default_value.is_some());
    property.has_fixed = PropertyFlag::from_bool(element.fixed_value.is_some());
    property.default_text = element
        .fixed_value
        .as_ref()
        .or(element.default_value.as_ref())
        .cloned();
    property
}

fn merge_flags(types: &[SchemaType], into: &mut SchemaProperty, other: &SchemaProperty) {
    into.nillable = into.nillable.merge(other.nillable);
    into.has_default = into.has_default.merge(other.has_default);
    into.has_fixed = into.has_fixed.merge(other.has_fixed);
    if into.default_text != other.default_text {
        into.default_text = None;
    }
    if into.type_id != other.type_id {
        into.type_id = common_base_in(types, into.type_id, other.type_id);
    }
}

fn merge_in_sequence(types: &[SchemaType], into: &mut SchemaProperty, other: &SchemaProperty) {
    let mut calc = OccursCalculator::from_occurs(into.occurs());
    calc.add(other.occurs());
    into.set_occurs(calc.occurs());
    merge_flags(types, into, other);
}

fn merge_alternatives(types: &[SchemaType], branches: Vec<PropertyMap>) -> PropertyMap {
    let mut map = PropertyMap::new();
    for branch in &branches {
        for (name, property) in branch {
            match map.get_mut(name) {
                Some(existing) => {
                    let mut calc = OccursCalculator::from_occurs(existing.occurs());
                    calc.max_with(property.occurs());
                    existing.set_occurs(calc.occurs());
                    merge_flags(types, existing, property);
                }
                None => {
                    map.insert(name.clone(), property.clone());
                }
            }
        }
    }
    for (name, property) in map.iter_mut() {
        if branches.iter().any(|branch| !branch.contains_key(name)) {
            property.min_occurs = 0;
        }
    }
    map
}

fn attribute_properties(model: &SchemaAttributeModel, container: TypeId) -> Vec<SchemaProperty> {
    model
        .iter()
        .filter(|u| !u.is_prohibited())
        .map(|u| {
            let mut property =
                SchemaProperty::attribute(u.name.clone(), u.type_id, container, u.is_required());
            property.has_default = PropertyFlag::from_bool(u.default_value.is_some());
            property.has_fixed = PropertyFlag::from_bool(u.fixed_value.is_some());
            property.default_text = u.value_constraint().map(String::from);
            property
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::builtins::{builtin_types, BuiltinCode};
    use crate::components::particles::test_support::elem;
    use crate::components::particles::Occurs;
    use pretty_assertions::assert_eq;

    fn occurs_of(map: &PropertyMap, name: &str) -> Occurs {
        map[&QName::local(name)].occurs()
    }

    #[test]
    fn test_sequence_sums_and_group_multiplies() {
        let types = builtin_types();
        let model = SchemaParticle::sequence(
            vec![
                elem("a", Occurs::once()),
                elem("b", Occurs::optional()),
                elem("a", Occurs::new(0, Some(2))),
            ],
            Occurs::new(1, Some(2)),
        );
        let map = project(&types, &model, TypeId(99));
        assert_eq!(map.len(), 2);
        assert_eq!(occurs_of(&map, "a"), Occurs::new(1, Some(6)));
        assert_eq!(occurs_of(&map, "b"), Occurs::new(0, Some(2)));
        assert_eq!(map[&QName::local("a")].container_type, TypeId(99));
    }

    #[test]
    fn test_choice_takes_range_and_marks_missing_optional() {
        let types = builtin_types();
        let model = SchemaParticle::choice(
            vec![
                SchemaParticle::sequence(
                    vec![elem("a", Occurs::once()), elem("b", Occurs::once())],
                    Occurs::once(),
                ),
                elem("a", Occurs::new(2, Some(3))),
            ],
            Occurs::once(),
        );
        let map = project(&types, &model, TypeId(99));
        assert_eq!(occurs_of(&map, "a"), Occurs::new(1, Some(3)));
        assert_eq!(occurs_of(&map, "b"), Occurs::new(0, Some(1)));

        let unbounded = SchemaParticle::choice(
            vec![elem("a", Occurs::once()), elem("c", Occurs::once())],
            Occurs::zero_or_more(),
        );
        let map = project(&types, &unbounded, TypeId(99));
        assert_eq!(occurs_of(&map, "c"), Occurs::zero_or_more());
    }

    #[test]
    fn test_flags_and_types_merge() {
        let types = builtin_types();
        let typed = |name: &str, code: BuiltinCode, nillable: bool, fixed: Option<&str>| {
            let mut particle = elem(name, Occurs::once());
            if let ParticleTerm::Element(term) = &mut particle.term {
                term.type_id = code.type_id();
                term.nillable = nillable;
                term.fixed_value = fixed.map(String::from);
            }
            particle
        };
        let model = SchemaParticle::choice(
            vec![
                typed("n", BuiltinCode::Byte, true, Some("1")),
                typed("n", BuiltinCode::UnsignedByte, false, Some("1")),
            ],
            Occurs::once(),
        );
        let map = project(&types, &model, TypeId(99));
        let property = &map[&QName::local("n")];
        assert_eq!(property.type_id, BuiltinCode::Integer.type_id());
        assert_eq!(property.nillable, PropertyFlag::Variable);
        assert_eq!(property.has_fixed, PropertyFlag::Consistently);
        assert_eq!(property.default_text.as_deref(), Some("1"));
        assert_eq!(property.occurs(), Occurs::once());
    }

    #[test]
    fn test_wildcards_contribute_nothing() {
        let types = builtin_types();
        let model = types[TypeId::ANY_TYPE.index()].content_model.clone().unwrap();
        assert!(project(&types, &model, TypeId::ANY_TYPE).is_empty());
    }
}
