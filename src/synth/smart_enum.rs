//! Smart enum transforms: key conversions, equality delegates and the instance registry

use super::ir::{FragmentPlan, Member, PartialUnit, Slot, CODE_ANALYSIS_USING};
use crate::config::Config;
use crate::shape::DeclarationShape;

pub fn plan(shape: &DeclarationShape, config: &Config) -> Vec<FragmentPlan> {
    let mut plans = Vec::new();
    plans.extend(cast_operators(shape));
    plans.push(equality(shape));
    if config.generation.registry {
        plans.extend(values(shape));
    }
    plans
}

/// Explicit conversions between the enum and its key
pub fn cast_operators(shape: &DeclarationShape) -> Option<FragmentPlan> {
    let key_type = shape.key_type.clone()?;
    let type_name = self_name(shape);

    let mut unit = unit_for(shape);
    unit.members = vec![
        Member::KeyLookupConversion {
            type_name: type_name.clone(),
            key_type: key_type.clone(),
        },
        Member::KeyConversion { type_name, key_type },
    ];

    Some(FragmentPlan {
        owner: shape.owner(),
        slot: Slot::CastOperators,
        unit,
    })
}

pub fn equality(shape: &DeclarationShape) -> FragmentPlan {
    let mut unit = unit_for(shape);
    unit.members = vec![Member::EqualityDelegates {
        type_name: self_name(shape),
    }];

    FragmentPlan {
        owner: shape.owner(),
        slot: Slot::Equality,
        unit,
    }
}

/// `AllValues` over the declared singletons, in declaration order, plus keyed lookup
pub fn values(shape: &DeclarationShape) -> Option<FragmentPlan> {
    let key_type = shape.key_type.clone()?;

    let mut unit = unit_for(shape).with_using(CODE_ANALYSIS_USING);
    unit.members = vec![Member::Registry {
        type_name: self_name(shape),
        key_type,
        instances: shape.enumerated_instances.clone(),
    }];

    Some(FragmentPlan {
        owner: shape.owner(),
        slot: Slot::Values,
        unit,
    })
}

fn self_name(shape: &DeclarationShape) -> String {
    format!("{}{}", shape.name, shape.type_parameter_list)
}

fn unit_for(shape: &DeclarationShape) -> PartialUnit {
    let mut unit = PartialUnit::new(shape.namespace.clone(), &shape.name, &shape.type_parameter_list);
    unit.spaced = true;
    unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::BaseClassification;
    use crate::rules::CandidateKind;
    use crate::syntax::{DeclarationKind, Location};

    fn color() -> DeclarationShape {
        DeclarationShape {
            kind: CandidateKind::SmartEnum,
            name: "Color".into(),
            namespace: None,
            full_name: "Color".into(),
            declaration_kind: DeclarationKind::Record,
            is_partial: true,
            is_sealed: true,
            is_abstract: false,
            is_nested: false,
            declaration_syntax_count: 1,
            base: Some(BaseClassification::DirectGeneric),
            parameters: Some(vec![]),
            type_parameters: vec![],
            type_parameter_list: String::new(),
            enumerated_instances: vec!["Red".into(), "Green".into()],
            key_type: Some("System.Int32".into()),
            location: Location::default(),
        }
    }

    #[test]
    fn test_all_fragments() {
        let plans = plan(&color(), &Config::default());
        let names: Vec<_> = plans.iter().map(|p| p.hint_name()).collect();
        assert_eq!(
            names,
            vec![
                "Color.CastOperators.g.cs",
                "Color.Equality.g.cs",
                "Color.Values.g.cs"
            ]
        );
        assert!(plans[2]
            .unit
            .usings
            .contains(&"System.Diagnostics.CodeAnalysis".to_string()));
    }

    #[test]
    fn test_registry_keeps_declaration_order() {
        let plan = values(&color()).unwrap();
        match &plan.unit.members[0] {
            Member::Registry { instances, .. } => assert_eq!(instances, &["Red", "Green"]),
            other => panic!("unexpected member {:?}", other),
        }
    }

    #[test]
    fn test_unknown_key_type_keeps_equality_only() {
        let shape = DeclarationShape {
            key_type: None,
            ..color()
        };
        let plans = plan(&shape, &Config::default());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].slot, Slot::Equality);
    }

    #[test]
    fn test_registry_disabled() {
        let mut config = Config::default();
        config.generation.registry = false;
        let slots: Vec<_> = plan(&color(), &config).iter().map(|p| p.slot).collect();
        assert_eq!(slots, vec![Slot::CastOperators, Slot::Equality]);
    }
}
