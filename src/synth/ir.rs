//! Fragment plan
//!
//! What a generated file contains, independent of how it is formatted.
//! Plans are plain data: they serialize, compare and hash, so synthesis
//! can be tested without looking at rendered text.

use serde::{Deserialize, Serialize};

/// Usings every generated fragment starts with
pub const STANDARD_USINGS: &[&str] = &[
    "System",
    "System.Collections.Generic",
    "System.Collections.Immutable",
    "System.Linq",
];

/// Extra using for fragments that annotate `out` parameters
pub const CODE_ANALYSIS_USING: &str = "System.Diagnostics.CodeAnalysis";

/// Which transform produced a fragment; also the middle part of the file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    CastOperators,
    IComparable,
    Equality,
    Values,
}

impl Slot {
    pub fn as_str(self) -> &'static str {
        match self {
            Slot::CastOperators => "CastOperators",
            Slot::IComparable => "IComparable",
            Slot::Equality => "Equality",
            Slot::Values => "Values",
        }
    }
}

/// Relational operators emitted by the comparison transform, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::Less,
        Relation::Greater,
        Relation::LessOrEqual,
        Relation::GreaterOrEqual,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Less => "<",
            Relation::Greater => ">",
            Relation::LessOrEqual => "<=",
            Relation::GreaterOrEqual => ">=",
        }
    }

    /// Whether a three-way comparison result satisfies this relation
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            Relation::Less => ordering == Less,
            Relation::Greater => ordering == Greater,
            Relation::LessOrEqual => ordering != Greater,
            Relation::GreaterOrEqual => ordering != Less,
        }
    }
}

/// One member of a partial declaration
///
/// `type_name` is always the declaring type as written inside its own body,
/// type parameters included (`Money`, `Wrapper<TValue>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    /// `explicit operator Name(Value value)`, constructs through the primary constructor
    WrapConversion { type_name: String, value_type: String },
    /// `implicit operator Value(Name value)`, reads the wrapped property
    UnwrapConversion {
        type_name: String,
        value_type: String,
        property: String,
    },
    /// `operator <` and friends through the default comparer
    RelationalOperator { type_name: String, relation: Relation },
    /// `CompareTo(Name? other)`: absent sorts first, identity is equal, else the wrapped value decides
    CompareTo { type_name: String, property: String },
    /// `CompareTo(object? obj)`, rejecting foreign types
    CompareToObject { type_name: String },
    /// `explicit operator Name(Key key)` through `TryGet`
    KeyLookupConversion { type_name: String, key_type: String },
    /// `explicit operator Key(Name @enum)`
    KeyConversion { type_name: String, key_type: String },
    /// `GetHashCode` / `Equals` handing back to the base record
    EqualityDelegates { type_name: String },
    /// Lazily built `AllValues` plus `TryGet` / `Get`
    Registry {
        type_name: String,
        key_type: String,
        instances: Vec<String>,
    },
}

impl Member {
    /// Template that renders this member
    pub fn template(&self) -> &'static str {
        match self {
            Member::WrapConversion { .. } => "csharp/members/wrap_conversion.jinja",
            Member::UnwrapConversion { .. } => "csharp/members/unwrap_conversion.jinja",
            Member::RelationalOperator { .. } => "csharp/members/relational_operator.jinja",
            Member::CompareTo { .. } => "csharp/members/compare_to.jinja",
            Member::CompareToObject { .. } => "csharp/members/compare_to_object.jinja",
            Member::KeyLookupConversion { .. } => "csharp/members/key_lookup_conversion.jinja",
            Member::KeyConversion { .. } => "csharp/members/key_conversion.jinja",
            Member::EqualityDelegates { .. } => "csharp/members/equality_delegates.jinja",
            Member::Registry { .. } => "csharp/members/registry.jinja",
        }
    }
}

/// One `partial record` block and the file around it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialUnit {
    pub usings: Vec<String>,
    /// `None` for the global namespace
    pub namespace: Option<String>,
    pub type_name: String,
    /// Verbatim `<...>`, empty when not generic
    pub type_parameter_list: String,
    /// Fully qualified interfaces added by this fragment
    pub bases: Vec<String>,
    pub members: Vec<Member>,
    /// Separate members with a blank line
    pub spaced: bool,
}

impl PartialUnit {
    pub fn new(namespace: Option<String>, type_name: &str, type_parameter_list: &str) -> Self {
        Self {
            usings: STANDARD_USINGS.iter().map(|u| u.to_string()).collect(),
            namespace,
            type_name: type_name.to_string(),
            type_parameter_list: type_parameter_list.to_string(),
            bases: Vec::new(),
            members: Vec::new(),
            spaced: false,
        }
    }

    pub fn with_using(mut self, using: &str) -> Self {
        self.usings.push(using.to_string());
        self
    }
}

/// A planned fragment: who owns it, where it goes and what is in it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FragmentPlan {
    /// `Ns.Name` of the declaration the fragment extends
    pub owner: String,
    pub slot: Slot,
    pub unit: PartialUnit,
}

impl FragmentPlan {
    /// `Ns.Name.Slot.g.cs`; the namespace prefix is dropped for the global namespace
    pub fn hint_name(&self) -> String {
        format!("{}.{}.g.cs", self.owner, self.slot.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_relations() {
        assert!(Relation::Less.holds(Ordering::Less));
        assert!(!Relation::Less.holds(Ordering::Equal));
        assert!(Relation::LessOrEqual.holds(Ordering::Equal));
        assert!(Relation::GreaterOrEqual.holds(Ordering::Greater));
        assert!(!Relation::GreaterOrEqual.holds(Ordering::Less));
        let symbols: Vec<_> = Relation::ALL.iter().map(|r| r.symbol()).collect();
        assert_eq!(symbols, vec!["<", ">", "<=", ">="]);
    }

    #[test]
    fn test_member_serializes_with_kind_tag() {
        let member = Member::RelationalOperator {
            type_name: "Money".into(),
            relation: Relation::LessOrEqual,
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["kind"], "relational_operator");
        assert_eq!(json["relation"], "<=");
    }

    #[test]
    fn test_hint_name() {
        let plan = FragmentPlan {
            owner: "Shop.Money".into(),
            slot: Slot::IComparable,
            unit: PartialUnit::new(Some("Shop".into()), "Money", ""),
        };
        assert_eq!(plan.hint_name(), "Shop.Money.IComparable.g.cs");
        assert_eq!(plan.unit.usings.len(), 4);
    }
}
