//! Rule catalog
//!
//! Stable rule ids with their default severity, message template and
//! fixability. The checker and the fixer both key off these entries; the
//! catalog itself holds no logic beyond lookups and message formatting.

use crate::config::Config;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Category shared by every rule
pub const CATEGORY: &str = "Domain";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// The two conventions a marked declaration can opt into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    ValueObject,
    SmartEnum,
}

impl CandidateKind {
    /// Name used in messages and logs
    pub fn label(self) -> &'static str {
        match self {
            CandidateKind::ValueObject => "value object",
            CandidateKind::SmartEnum => "smart enum",
        }
    }

    /// Simple name of the runtime base type
    pub fn base_name(self) -> &'static str {
        match self {
            CandidateKind::ValueObject => "ValueObject",
            CandidateKind::SmartEnum => "SmartEnum",
        }
    }
}

/// What a rule checks, independent of the pattern it applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Check {
    MustBePartial,
    MustBeRecord,
    MustDeriveFromBase,
    ShouldNotBeNested,
    MustNotDeriveFromNonGenericBase,
    MustNotHavePartialImplementation,
    MustHaveAtLeastOneParameter,
    AllParametersShouldBeEquatable,
    DuplicateKey,
    MustBeSealed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: &'static str,
    pub candidate: CandidateKind,
    pub check: Check,
    pub title: &'static str,
    /// Message with `{0}` standing for the declaration name
    pub message: &'static str,
    pub default_severity: Severity,
    pub fixable: bool,
    /// Reserved ids are listed but never reported
    pub enforced: bool,
}

impl Rule {
    /// `SEED0103` -> 103
    pub fn number(&self) -> u32 {
        self.id
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .parse()
            .unwrap_or(u32::MAX)
    }

    /// Severity after applying config overrides
    pub fn severity(&self, config: &Config) -> Severity {
        config
            .severity
            .get(self.id)
            .copied()
            .unwrap_or(self.default_severity)
    }

    /// Enforced and not disabled in config
    pub fn is_active(&self, config: &Config) -> bool {
        self.enforced && !config.is_disabled(self.id)
    }

    pub fn format_message(&self, name: &str) -> String {
        format_message(self.message, &[name])
    }
}

/// Substitute `{0}`, `{1}`, ... with the given arguments
///
/// Placeholders without a matching argument are left as written.
pub fn format_message(template: &str, args: &[&str]) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder =
        PLACEHOLDER.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("placeholder pattern is valid"));

    placeholder
        .replace_all(template, |caps: &regex::Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .map(|arg| arg.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

macro_rules! rule {
    ($id:literal, $candidate:ident, $check:ident, $title:literal, $message:literal, $severity:ident, fixable: $fixable:literal) => {
        rule!($id, $candidate, $check, $title, $message, $severity, fixable: $fixable, enforced: true)
    };
    ($id:literal, $candidate:ident, $check:ident, $title:literal, $message:literal, $severity:ident, fixable: $fixable:literal, enforced: $enforced:literal) => {
        Rule {
            id: $id,
            candidate: CandidateKind::$candidate,
            check: Check::$check,
            title: $title,
            message: $message,
            default_severity: Severity::$severity,
            fixable: $fixable,
            enforced: $enforced,
        }
    };
}

/// Every known rule, in numeric id order
pub static CATALOG: &[Rule] = &[
    rule!("SEED0001", ValueObject, MustBePartial,
        "ValueObject must be partial",
        "The value object '{0}' is not partial. Value objects must be marked as partial.",
        Error, fixable: true),
    rule!("SEED0002", ValueObject, MustBeRecord,
        "ValueObject must be a record",
        "The value object '{0}' is not a record. Value objects must be records.",
        Error, fixable: true),
    rule!("SEED0003", ValueObject, MustDeriveFromBase,
        "ValueObject must derive from ValueObject",
        "The value object '{0}' does not inherit from ValueObject. Value objects must derive from ValueObject<T>.",
        Error, fixable: true),
    rule!("SEED0005", ValueObject, ShouldNotBeNested,
        "ValueObject must not be a nested class",
        "The value object '{0}' is nested inside another class. This is not supported",
        Error, fixable: false),
    rule!("SEED0006", ValueObject, MustNotDeriveFromNonGenericBase,
        "Do not derive from non-generic ValueObject",
        "The value object '{0}' derives from the non-generic ValueObject base class, which is not intended to be derived from directly",
        Error, fixable: true),
    rule!("SEED0007", ValueObject, MustNotHavePartialImplementation,
        "ValueObject should not have multiple partial declarations",
        "The value object '{0}' has more than one partial implementation. This can lead to errors in code generation",
        Error, fixable: false),
    rule!("SEED0008", ValueObject, MustHaveAtLeastOneParameter,
        "Primary constructor is expected to have at least one parameter",
        "The primary constructor for '{0}' is expected to have at least one parameter",
        Error, fixable: false),
    rule!("SEED0009", ValueObject, AllParametersShouldBeEquatable,
        "ValueObject parameters should be equatable",
        "The value object '{0}' should only have parameters which are equatable",
        Warning, fixable: false),
    rule!("SEED0101", SmartEnum, MustBePartial,
        "SmartEnum must be partial",
        "The smart enum '{0}' is not partial. Smart enums must be marked as partial.",
        Error, fixable: true),
    rule!("SEED0102", SmartEnum, MustBeRecord,
        "SmartEnum must be a record",
        "The smart enum '{0}' is not a record. Smart enums must be records.",
        Error, fixable: true),
    rule!("SEED0103", SmartEnum, MustDeriveFromBase,
        "SmartEnum must derive from SmartEnum<T>",
        "The smart enum '{0}' does not inherit from SmartEnum<T>. Smart enums must derive from SmartEnum<>.",
        Error, fixable: true),
    rule!("SEED0105", SmartEnum, ShouldNotBeNested,
        "SmartEnum must not be a nested class",
        "The smart enum '{0}' is nested inside another class. This is not supported",
        Error, fixable: false),
    rule!("SEED0106", SmartEnum, MustNotDeriveFromNonGenericBase,
        "Do not derive from non-generic SmartEnum",
        "The smart enum '{0}' derives from the non-generic SmartEnum base class, which is not intended to be derived from directly",
        Error, fixable: true),
    rule!("SEED0107", SmartEnum, MustNotHavePartialImplementation,
        "SmartEnum should not have multiple partial declarations",
        "The smart enum '{0}' has more than one partial implementation. This can lead to errors in code generation",
        Error, fixable: false),
    rule!("SEED0109", SmartEnum, DuplicateKey,
        "SmartEnum contains duplicate key",
        "The smart enum '{0}' contains duplicates for the same key.",
        Error, fixable: false, enforced: false),
    rule!("SEED0111", SmartEnum, MustBeSealed,
        "SmartEnum should be sealed",
        "The smart enum '{0}' is not sealed. Smart enums must be sealed.",
        Error, fixable: true),
];

pub fn rule(id: &str) -> Option<&'static Rule> {
    CATALOG.iter().find(|r| r.id == id)
}

pub fn rule_for(candidate: CandidateKind, check: Check) -> Option<&'static Rule> {
    CATALOG
        .iter()
        .find(|r| r.candidate == candidate && r.check == check)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_sorted_and_unique() {
        let numbers: Vec<u32> = CATALOG.iter().map(Rule::number).collect();
        let mut sorted = numbers.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(numbers, sorted);
    }

    #[test]
    fn test_checks_unique_per_candidate() {
        let pairs: HashSet<_> = CATALOG.iter().map(|r| (r.candidate, r.check)).collect();
        assert_eq!(pairs.len(), CATALOG.len());
    }

    #[test]
    fn test_message_substitution() {
        let rule = rule("SEED0001").unwrap();
        assert_eq!(
            rule.format_message("Money"),
            "The value object 'Money' is not partial. Value objects must be marked as partial."
        );
        assert_eq!(format_message("{0} and {1}", &["a"]), "a and {1}");
    }

    #[test]
    fn test_severity_override() {
        let rule = rule_for(CandidateKind::SmartEnum, Check::MustBeSealed).unwrap();
        let mut config = Config::default();
        assert_eq!(rule.severity(&config), Severity::Error);

        config.severity.insert("SEED0111".into(), Severity::Warning);
        assert_eq!(rule.severity(&config), Severity::Warning);
    }

    #[test]
    fn test_duplicate_key_is_reserved() {
        let rule = rule("SEED0109").unwrap();
        assert!(!rule.is_active(&Config::default()));
        assert!(rule_for(CandidateKind::ValueObject, Check::MustBeSealed).is_none());
    }
}
