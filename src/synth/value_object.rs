//! Value object transforms: conversions and ordering

use super::ir::{FragmentPlan, Member, PartialUnit, Relation, Slot};
use crate::config::Config;
use crate::shape::DeclarationShape;

pub fn plan(shape: &DeclarationShape, config: &Config) -> Vec<FragmentPlan> {
    let mut plans = Vec::new();
    plans.extend(cast_operators(shape));
    if config.generation.comparable {
        plans.extend(comparable(shape));
    }
    plans
}

/// Conversions to and from the wrapped value
///
/// Abstract declarations cannot be constructed, so only the unwrapping
/// direction is emitted for them.
pub fn cast_operators(shape: &DeclarationShape) -> Option<FragmentPlan> {
    let parameter = shape.unary_parameter()?;
    let type_name = self_name(shape);

    let mut unit = unit_for(shape);
    if !shape.is_abstract {
        unit.members.push(Member::WrapConversion {
            type_name: type_name.clone(),
            value_type: parameter.type_full_name.clone(),
        });
    }
    unit.members.push(Member::UnwrapConversion {
        type_name,
        value_type: parameter.type_full_name.clone(),
        property: parameter.name.clone(),
    });

    Some(FragmentPlan {
        owner: shape.owner(),
        slot: Slot::CastOperators,
        unit,
    })
}

/// `IComparable` implementation when the wrapped value is comparable
///
/// Relational operators need a closed type, so generic definitions only
/// get the `CompareTo` pair.
pub fn comparable(shape: &DeclarationShape) -> Option<FragmentPlan> {
    let parameter = shape.unary_parameter()?;
    if !(parameter.is_comparable || parameter.is_comparable_generic) {
        return None;
    }
    let type_name = self_name(shape);

    let mut unit = unit_for(shape);
    unit.bases = vec![
        format!("System.IComparable<{}>", shape.full_name),
        "System.IComparable".to_string(),
    ];
    if !shape.is_generic() {
        unit.members
            .extend(Relation::ALL.into_iter().map(|relation| Member::RelationalOperator {
                type_name: type_name.clone(),
                relation,
            }));
    }
    unit.members.push(Member::CompareTo {
        type_name: type_name.clone(),
        property: parameter.name.clone(),
    });
    unit.members.push(Member::CompareToObject { type_name });

    Some(FragmentPlan {
        owner: shape.owner(),
        slot: Slot::IComparable,
        unit,
    })
}

fn self_name(shape: &DeclarationShape) -> String {
    format!("{}{}", shape.name, shape.type_parameter_list)
}

fn unit_for(shape: &DeclarationShape) -> PartialUnit {
    PartialUnit::new(shape.namespace.clone(), &shape.name, &shape.type_parameter_list)
}
