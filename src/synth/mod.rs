//! Code synthesizer
//!
//! Turns a [`DeclarationShape`] into generated C# fragments in two steps:
//! the pattern planners build [`FragmentPlan`]s, then the template engine
//! renders each plan's unit. Both steps are pure; rendering the same shape
//! twice yields byte-identical text.
//!
//! Only record-shaped partial declarations are synthesized. A partial
//! fragment cannot attach to anything else, so other shapes produce
//! nothing and are left to the checker.

pub mod ir;
pub mod smart_enum;
pub mod value_object;

use minijinja::Environment;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::rules::CandidateKind;
use crate::shape::DeclarationShape;
use crate::templates;

pub use ir::{FragmentPlan, Member, PartialUnit, Relation, Slot};

/// A rendered fragment ready to be written next to the user's code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFragment {
    /// `Ns.Name` of the declaration the fragment extends
    pub owner: String,
    /// File name, e.g. `Shop.Money.CastOperators.g.cs`
    pub slot_name: String,
    pub text: String,
}

/// Whether any transform may run for this shape
pub fn is_eligible(shape: &DeclarationShape) -> bool {
    shape.is_record() && shape.is_partial
}

/// Fragment plans for a shape, in slot order
pub fn plan(shape: &DeclarationShape, config: &Config) -> Vec<FragmentPlan> {
    if !config.generation.enabled || !is_eligible(shape) {
        return Vec::new();
    }
    match shape.kind {
        CandidateKind::ValueObject => value_object::plan(shape, config),
        CandidateKind::SmartEnum => smart_enum::plan(shape, config),
    }
}

/// Render a plan with the given engine
pub fn render(env: &Environment<'_>, plan: &FragmentPlan) -> Result<GeneratedFragment> {
    Ok(GeneratedFragment {
        owner: plan.owner.clone(),
        slot_name: plan.hint_name(),
        text: templates::render_unit(env, &plan.unit)?,
    })
}

/// Plan and render with the embedded templates
pub fn synthesize(shape: &DeclarationShape, config: &Config) -> Result<Vec<GeneratedFragment>> {
    synthesize_with(templates::engine(), shape, config)
}

/// Plan and render with a specific engine, e.g. one with overridden templates
pub fn synthesize_with(
    env: &Environment<'_>,
    shape: &DeclarationShape,
    config: &Config,
) -> Result<Vec<GeneratedFragment>> {
    plan(shape, config)
        .iter()
        .map(|plan| render(env, plan))
        .collect()
}
