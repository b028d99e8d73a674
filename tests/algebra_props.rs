//! Property tests for content-model simplification

use proptest::prelude::*;
use xmlschema_types::compiler::content::simplify;
use xmlschema_types::components::{
    ElementTerm, Occurs, ParticleKind, QNameSet, SchemaParticle, TypeId,
};
use xmlschema_types::QName;

fn element(local: &str, occurs: Occurs) -> SchemaParticle {
    let name = QName::local(local);
    SchemaParticle::element(
        ElementTerm {
            name: name.clone(),
            type_id: TypeId::ANY_TYPE,
            nillable: false,
            default_value: None,
            fixed_value: None,
            is_global: false,
            accepted_names: QNameSet::singleton(name),
        },
        occurs,
    )
}

fn occurs_strategy() -> impl Strategy<Value = Occurs> {
    prop_oneof![
        Just(Occurs::once()),
        Just(Occurs::optional()),
        Just(Occurs::zero_or_more()),
        Just(Occurs::one_or_more()),
        Just(Occurs::new(0, Some(0))),
        Just(Occurs::new(2, Some(3))),
    ]
}

fn particle_strategy() -> impl Strategy<Value = SchemaParticle> {
    let leaf = (prop::sample::select(vec!["a", "b", "c"]), occurs_strategy())
        .prop_map(|(local, occurs)| element(local, occurs));
    leaf.prop_recursive(4, 24, 4, |inner| {
        (
            prop::sample::select(vec![
                ParticleKind::Sequence,
                ParticleKind::Choice,
                ParticleKind::All,
            ]),
            prop::collection::vec(inner, 0..4),
            occurs_strategy(),
        )
            .prop_map(|(kind, children, occurs)| {
                SchemaParticle::group(kind, children, occurs)
                    .unwrap_or_else(|| element("a", Occurs::once()))
            })
    })
}

proptest! {
    #[test]
    fn test_simplify_is_idempotent(particle in particle_strategy()) {
        let once = simplify(particle);
        let twice = once.clone().and_then(simplify);
        prop_assert_eq!(
            once.as_ref().map(ToString::to_string),
            twice.as_ref().map(ToString::to_string)
        );
    }

    #[test]
    fn test_simplify_leaves_no_pointless_particles(particle in particle_strategy()) {
        if let Some(simplified) = simplify(particle) {
            let mut pointless = Vec::new();
            simplified.walk(&mut |p| {
                if p.occurs.max == Some(0) {
                    pointless.push(p.to_string());
                }
                for child in p.children() {
                    let same_kind = child.kind() == p.kind()
                        && matches!(p.kind(), ParticleKind::Sequence | ParticleKind::Choice);
                    if same_kind && child.is_singleton() {
                        pointless.push(child.to_string());
                    }
                }
            });
            prop_assert!(pointless.is_empty(), "{:?}", pointless);
        }
    }
}
