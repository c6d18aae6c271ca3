//! Declaration checker
//!
//! Evaluates a shape against its pattern's conventions:
//!
//! 1. not a type declaration (an `enum`): nothing to check
//! 2. not record-shaped: `MustBeRecord` only
//! 3. more than one user-written fragment: `MustNotHavePartialImplementation` only
//! 4. otherwise every remaining check runs independently
//!
//! Output is sorted by rule number so it is stable across runs.

use crate::config::Config;
use crate::facts::BaseClassification;
use crate::rules::{self, CandidateKind, Check, Severity};
use crate::shape::{self, Candidate, DeclarationShape};
use crate::symbols::{Compilation, TypeId};
use crate::syntax::Location;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// A convention violation on one declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// Simple name of the offending declaration
    pub declaration: String,
    pub location: Location,
    pub fixable: bool,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}: {}",
            self.location, self.severity, self.rule_id, self.message
        )
    }
}

/// Checks that fail for a shape, before catalog lookup and filtering
pub fn failing_checks(shape: &DeclarationShape) -> Vec<Check> {
    if !shape.is_type_declaration() {
        return Vec::new();
    }
    if !shape.is_record() {
        return vec![Check::MustBeRecord];
    }
    if shape.declaration_syntax_count > 1 {
        return vec![Check::MustNotHavePartialImplementation];
    }

    let mut checks = Vec::new();

    if !shape.is_partial {
        checks.push(Check::MustBePartial);
    }

    match (shape.kind, shape.base) {
        (_, Some(BaseClassification::Object | BaseClassification::Unrelated))
        | (CandidateKind::SmartEnum, Some(BaseClassification::IndirectGeneric)) => {
            checks.push(Check::MustDeriveFromBase)
        }
        (_, Some(BaseClassification::DirectNonGeneric)) => {
            checks.push(Check::MustNotDeriveFromNonGenericBase)
        }
        (_, Some(_)) => {}
        (_, None) => warn!(declaration = %shape.name, "base list not bound, skipping base check"),
    }

    if shape.is_nested {
        checks.push(Check::ShouldNotBeNested);
    }

    if shape.kind == CandidateKind::SmartEnum && !shape.is_sealed {
        checks.push(Check::MustBeSealed);
    }

    if shape.kind == CandidateKind::ValueObject {
        match &shape.parameters {
            Some(parameters) if parameters.is_empty() => {
                checks.push(Check::MustHaveAtLeastOneParameter)
            }
            Some(parameters) if parameters.iter().any(|p| !p.is_equatable) => {
                checks.push(Check::AllParametersShouldBeEquatable)
            }
            Some(_) => {}
            None => warn!(declaration = %shape.name, "parameter types not bound, skipping parameter checks"),
        }
    }

    checks
}

/// Violations for one shape, with config severities applied
pub fn check_shape(shape: &DeclarationShape, config: &Config) -> Vec<Violation> {
    let mut violations: Vec<(u32, Violation)> = failing_checks(shape)
        .into_iter()
        .filter_map(|check| rules::rule_for(shape.kind, check))
        .filter(|rule| rule.is_active(config))
        .map(|rule| {
            (
                rule.number(),
                Violation {
                    rule_id: rule.id.to_string(),
                    severity: rule.severity(config),
                    message: rule.format_message(&shape.name),
                    declaration: shape.name.clone(),
                    location: shape.location.clone(),
                    fixable: rule.fixable,
                },
            )
        })
        .collect();

    violations.sort_by_key(|(number, _)| *number);
    debug!(
        declaration = %shape.name,
        kind = shape.kind.label(),
        violations = violations.len(),
        "checked declaration"
    );
    violations.into_iter().map(|(_, v)| v).collect()
}

/// Violations for a single symbol; unmarked symbols yield nothing
pub fn check_symbol(compilation: &Compilation, id: TypeId, config: &Config) -> Vec<Violation> {
    crate::facts::marked_kinds(compilation, id, config)
        .into_iter()
        .filter_map(|kind| shape::extract_shape(compilation, Candidate { id, kind }, config))
        .flat_map(|shape| check_shape(&shape, config))
        .collect()
}

/// Violations for every marked declaration in the compilation
pub fn check_compilation(compilation: &Compilation, config: &Config) -> Vec<Violation> {
    shape::discover(compilation, config)
        .into_iter()
        .filter_map(|candidate| shape::extract_shape(compilation, candidate, config))
        .flat_map(|shape| check_shape(&shape, config))
        .collect()
}

/// Any violation at error severity
pub fn has_errors(violations: &[Violation]) -> bool {
    violations.iter().any(|v| v.severity == Severity::Error)
}
