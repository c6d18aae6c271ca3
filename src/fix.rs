//! Automated fixes
//!
//! A fix is a set of text edits on the declaration found at the violation's
//! offset. Each fixable rule has exactly one strategy; the batch fixer
//! re-checks after every applied fix, since offsets move.

use crate::check::{self, Violation};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parse::{parse_csharp, parse_source};
use crate::rules::{self, CandidateKind, Check};
use crate::symbols::Compilation;
use crate::syntax::{BaseEntry, DeclarationKind, SyntaxTree, TypeDeclaration};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Upper bound on fix/re-check rounds for one file
pub const MAX_FIX_PASSES: usize = 32;

/// Replace `start..end` with `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            replacement: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub rule_id: String,
    pub title: String,
    pub edits: Vec<TextEdit>,
}

impl Fix {
    /// Apply all edits; they never overlap
    pub fn apply(&self, source: &str) -> String {
        let mut edits: Vec<&TextEdit> = self.edits.iter().collect();
        edits.sort_by(|a, b| b.start.cmp(&a.start));

        let mut out = source.to_string();
        for edit in edits {
            out.replace_range(edit.start..edit.end, &edit.replacement);
        }
        out
    }
}

/// Result of the batch fixer
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixApplicationResult {
    pub applied: Vec<String>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

/// Compute the fix for `rule_id` on the declaration enclosing `offset`
pub fn compute_fix(rule_id: &str, source: &str, offset: usize, config: &Config) -> Result<Fix> {
    let rule = rules::rule(rule_id).ok_or_else(|| Error::Fix(format!("Unknown rule {}", rule_id)))?;
    if !rule.fixable {
        return Err(Error::Fix(format!("Rule {} has no automated fix", rule_id)));
    }

    let tree = parse_csharp("", source)?;
    let index = tree
        .declaration_at(offset)
        .ok_or_else(|| Error::Fix(format!("No type declaration at offset {}", offset)))?;
    let decl = &tree.declarations[index];

    let edits = match rule.check {
        Check::MustBePartial => make_partial(decl),
        Check::MustBeSealed => make_sealed(decl),
        Check::MustBeRecord => make_record(decl),
        Check::MustDeriveFromBase => derive_from_base(&tree, index, rule.candidate, config)?,
        Check::MustNotDeriveFromNonGenericBase => {
            replace_non_generic_base(&tree, decl, rule.candidate, config)?
        }
        other => return Err(Error::Fix(format!("No strategy for {:?}", other))),
    };

    Ok(Fix {
        rule_id: rule.id.to_string(),
        title: rule.title.to_string(),
        edits,
    })
}

/// `partial` goes right before the type keyword
fn make_partial(decl: &TypeDeclaration) -> Vec<TextEdit> {
    vec![TextEdit::insert(decl.keyword_span.start_byte, "partial ")]
}

/// `sealed` goes right before `partial`, or before the keyword without one
///
/// An `abstract` modifier cannot stand next to `sealed`, so it is replaced.
fn make_sealed(decl: &TypeDeclaration) -> Vec<TextEdit> {
    if let Some(modifier) = decl.modifiers.iter().find(|m| m.keyword == "abstract") {
        return vec![TextEdit {
            start: modifier.span.start_byte,
            end: modifier.span.end_byte,
            replacement: "sealed".to_string(),
        }];
    }
    let at = decl
        .modifiers
        .iter()
        .find(|m| m.keyword == "partial")
        .map(|m| m.span.start_byte)
        .unwrap_or(decl.keyword_span.start_byte);
    vec![TextEdit::insert(at, "sealed ")]
}

fn make_record(decl: &TypeDeclaration) -> Vec<TextEdit> {
    let replacement = match decl.kind {
        DeclarationKind::Struct => "record struct",
        _ => "record",
    };
    vec![TextEdit {
        start: decl.keyword_span.start_byte,
        end: decl.keyword_span.end_byte,
        replacement: replacement.to_string(),
    }]
}

/// `ValueObject<Name<T>>` or `SmartEnum<TKey>(Key)`
fn generic_base_text(decl: &TypeDeclaration, candidate: CandidateKind) -> Result<String> {
    match candidate {
        CandidateKind::ValueObject => Ok(format!(
            "ValueObject<{}{}>",
            decl.name,
            decl.type_parameter_list.as_deref().unwrap_or("")
        )),
        CandidateKind::SmartEnum => {
            let key = decl
                .parameter_list
                .as_ref()
                .and_then(|params| params.first())
                .ok_or_else(|| {
                    Error::Fix(format!(
                        "Smart enum '{}' needs a key parameter before it can derive from SmartEnum<TKey>",
                        decl.name
                    ))
                })?;
            let key_type = key.ty.as_ref().ok_or_else(|| {
                Error::Fix(format!("Key parameter of '{}' has no type", decl.name))
            })?;
            Ok(format!("SmartEnum<{}>({})", key_type, key.name))
        }
    }
}

fn derive_from_base(
    tree: &SyntaxTree,
    index: usize,
    candidate: CandidateKind,
    config: &Config,
) -> Result<Vec<TextEdit>> {
    let decl = &tree.declarations[index];
    let base = generic_base_text(decl, candidate)?;

    // The base class has to come first in the list
    let mut edits = vec![match &decl.base_list {
        Some(list) => match list.entries.first() {
            Some(first) if is_class_entry(tree, index, first, config) => {
                return Err(Error::Fix(format!(
                    "'{}' already derives from {}; replace it with {} by hand",
                    decl.name,
                    first.ty,
                    base
                )));
            }
            Some(first) => TextEdit::insert(first.span.start_byte, format!("{}, ", base)),
            None => TextEdit::insert(list.span.end_byte, format!(" {}", base)),
        },
        None => TextEdit::insert(decl.header_end(), format!(" : {}", base)),
    }];
    edits.extend(runtime_using(tree, decl, config));
    Ok(edits)
}

/// A base list entry that names a class rather than an interface
///
/// Base constructor arguments always mean a class. Otherwise the entry is
/// bound against this file; an unbound entry is taken to be an interface.
fn is_class_entry(tree: &SyntaxTree, index: usize, entry: &BaseEntry, config: &Config) -> bool {
    if entry.arguments.is_some() {
        return true;
    }
    let compilation = Compilation::new(vec![tree.clone()], config);
    compilation
        .resolve_type(0, Some(index), &entry.ty)
        .and_then(|ty| ty.id())
        .is_some_and(|id| compilation.symbol(id).kind != DeclarationKind::Interface)
}

fn replace_non_generic_base(
    tree: &SyntaxTree,
    decl: &TypeDeclaration,
    candidate: CandidateKind,
    config: &Config,
) -> Result<Vec<TextEdit>> {
    let entry = decl
        .base_list
        .iter()
        .flat_map(|list| list.entries.iter())
        .find(|entry| {
            entry.ty.simple_name() == Some(candidate.base_name()) && entry.ty.arity() == 0
        })
        .ok_or_else(|| {
            Error::Fix(format!(
                "No non-generic {} base on '{}'",
                candidate.base_name(),
                decl.name
            ))
        })?;

    let mut edits = vec![TextEdit {
        start: entry.span.start_byte,
        end: entry.span.end_byte,
        replacement: generic_base_text(decl, candidate)?,
    }];
    edits.extend(runtime_using(tree, decl, config));
    Ok(edits)
}

/// `using <runtime>;` at the top of the file when the runtime namespace is not in scope
fn runtime_using(tree: &SyntaxTree, decl: &TypeDeclaration, config: &Config) -> Option<TextEdit> {
    let runtime = config.runtime.namespace.as_str();
    let imported = tree
        .usings
        .iter()
        .any(|u| u.alias.is_none() && !u.is_static && u.target == runtime);
    let enclosing = decl
        .namespace
        .as_deref()
        .is_some_and(|ns| ns == runtime || ns.starts_with(&format!("{}.", runtime)));

    if imported || enclosing {
        None
    } else {
        Some(TextEdit::insert(0, format!("using {};\n", runtime)))
    }
}

/// Violations in one file, checked against that file alone
pub fn violations_in(path: &str, source: &str, config: &Config) -> Result<Vec<Violation>> {
    let tree = parse_source(path, source)?;
    let compilation = Compilation::new(vec![tree], config);
    Ok(check::check_compilation(&compilation, config))
}

/// Apply fixes until no fixable violation is left
///
/// With `only`, just that rule id is fixed. Violations without a fix are
/// reported as skipped.
pub fn fix_source(
    path: &str,
    source: &str,
    config: &Config,
    only: Option<&str>,
) -> Result<(String, FixApplicationResult)> {
    let mut text = source.to_string();
    let mut result = FixApplicationResult::default();
    let mut failed: HashSet<(String, String)> = HashSet::new();

    for pass in 0..MAX_FIX_PASSES {
        let violations = violations_in(path, &text, config)?;
        let next = violations.iter().find(|v| {
            v.fixable
                && only.is_none_or(|id| id == v.rule_id)
                && !failed.contains(&(v.rule_id.clone(), v.declaration.clone()))
        });

        let Some(violation) = next else {
            result.skipped = violations
                .iter()
                .filter(|v| only.is_none_or(|id| id == v.rule_id))
                .map(|v| format!("{} ({})", v.rule_id, v.declaration))
                .collect();
            break;
        };

        debug!(pass, rule = %violation.rule_id, declaration = %violation.declaration, "applying fix");
        match compute_fix(
            &violation.rule_id,
            &text,
            violation.location.span.start_byte,
            config,
        ) {
            Ok(fix) => {
                text = fix.apply(&text);
                result
                    .applied
                    .push(format!("{} ({})", violation.rule_id, violation.declaration));
            }
            Err(e) => {
                result
                    .errors
                    .push(format!("{} ({}): {}", violation.rule_id, violation.declaration, e));
                failed.insert((violation.rule_id.clone(), violation.declaration.clone()));
            }
        }
    }

    info!(
        path,
        applied = result.applied.len(),
        errors = result.errors.len(),
        "fix pass finished"
    );
    Ok((text, result))
}
