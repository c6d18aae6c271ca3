//! Template-based rendering of fragment plans
//!
//! Uses MiniJinja templates for the C# text of generated fragments.
//! Templates are embedded by default; a directory passed to
//! [`engine_with_override`] replaces any of them by relative path, e.g.
//! `csharp/members/registry.jinja`.

pub mod filters;

use minijinja::{context, AutoEscape, Environment};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::synth::ir::PartialUnit;

/// Template that renders a whole [`PartialUnit`]
pub const UNIT_TEMPLATE: &str = "csharp/unit.jinja";

// Embedded templates (compiled into binary)
mod embedded {
    pub const UNIT: &str = include_str!("../../templates/csharp/unit.jinja");

    pub const WRAP_CONVERSION: &str =
        include_str!("../../templates/csharp/members/wrap_conversion.jinja");
    pub const UNWRAP_CONVERSION: &str =
        include_str!("../../templates/csharp/members/unwrap_conversion.jinja");
    pub const RELATIONAL_OPERATOR: &str =
        include_str!("../../templates/csharp/members/relational_operator.jinja");
    pub const COMPARE_TO: &str = include_str!("../../templates/csharp/members/compare_to.jinja");
    pub const COMPARE_TO_OBJECT: &str =
        include_str!("../../templates/csharp/members/compare_to_object.jinja");
    pub const KEY_LOOKUP_CONVERSION: &str =
        include_str!("../../templates/csharp/members/key_lookup_conversion.jinja");
    pub const KEY_CONVERSION: &str =
        include_str!("../../templates/csharp/members/key_conversion.jinja");
    pub const EQUALITY_DELEGATES: &str =
        include_str!("../../templates/csharp/members/equality_delegates.jinja");
    pub const REGISTRY: &str = include_str!("../../templates/csharp/members/registry.jinja");
}

/// Every template name with its embedded source
const TEMPLATES: &[(&str, &str)] = &[
    (UNIT_TEMPLATE, embedded::UNIT),
    ("csharp/members/wrap_conversion.jinja", embedded::WRAP_CONVERSION),
    ("csharp/members/unwrap_conversion.jinja", embedded::UNWRAP_CONVERSION),
    ("csharp/members/relational_operator.jinja", embedded::RELATIONAL_OPERATOR),
    ("csharp/members/compare_to.jinja", embedded::COMPARE_TO),
    ("csharp/members/compare_to_object.jinja", embedded::COMPARE_TO_OBJECT),
    ("csharp/members/key_lookup_conversion.jinja", embedded::KEY_LOOKUP_CONVERSION),
    ("csharp/members/key_conversion.jinja", embedded::KEY_CONVERSION),
    ("csharp/members/equality_delegates.jinja", embedded::EQUALITY_DELEGATES),
    ("csharp/members/registry.jinja", embedded::REGISTRY),
];

/// Template engine singleton
static ENGINE: OnceLock<Environment<'static>> = OnceLock::new();

/// Initialize the template engine with embedded templates
fn init_engine() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);

    filters::register_filters(&mut env);

    for (name, source) in TEMPLATES {
        env.add_template(name, source)
            .expect("embedded template must parse");
    }

    env
}

/// Get the global template engine
pub fn engine() -> &'static Environment<'static> {
    ENGINE.get_or_init(init_engine)
}

/// Create a new template engine with custom template directory
/// Templates in custom_dir override embedded templates
pub fn engine_with_override(custom_dir: &Path) -> Result<Environment<'static>> {
    let mut env = init_engine();

    for (name, _) in TEMPLATES {
        let path = custom_dir.join(name);
        if !path.exists() {
            continue;
        }
        let content = std::fs::read_to_string(&path)?;
        // Leaked once per override directory, at startup
        let leaked: &'static str = Box::leak(content.into_boxed_str());
        env.add_template(name, leaked)
            .map_err(|e| Error::Render(format!("{}: {}", path.display(), e)))?;
    }

    Ok(env)
}

/// SHA-256 over the source of every known template in `env`
///
/// Two engines with the same fingerprint render identical text.
pub fn fingerprint(env: &Environment<'_>) -> Result<String> {
    let mut hasher = Sha256::new();
    for (name, _) in TEMPLATES {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(env.get_template(name)?.source().as_bytes());
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Render one partial unit to C# source text
pub fn render_unit(env: &Environment<'_>, unit: &PartialUnit) -> Result<String> {
    let template = env.get_template(UNIT_TEMPLATE)?;
    Ok(template.render(context! { unit => unit })?)
}
