//! Fixer round trips: apply a fix, re-check, expect the violation gone

use pretty_assertions::assert_eq;
use rstest::rstest;
use seedwork::fix::violations_in;
use seedwork::{compute_fix, fix_source, Config};

fn ids(path: &str, source: &str) -> Vec<String> {
    violations_in(path, source, &Config::default())
        .unwrap()
        .into_iter()
        .map(|v| v.rule_id)
        .collect()
}

/// Fix the first reported violation and return the new text
fn fix_first(source: &str) -> String {
    let config = Config::default();
    let violations = violations_in("Test.cs", source, &config).unwrap();
    let violation = violations.first().expect("a violation to fix");
    compute_fix(
        &violation.rule_id,
        source,
        violation.location.span.start_byte,
        &config,
    )
    .unwrap()
    .apply(source)
}

#[rstest]
#[case::partial(
    "using Cranks.SeedWork.Domain;\n[ValueObject]\npublic record Money(decimal Amount) : ValueObject<Money>;\n",
    "SEED0001"
)]
#[case::record(
    "using Cranks.SeedWork.Domain;\n[ValueObject]\npublic partial class Money(decimal Amount) : ValueObject<Money> { }\n",
    "SEED0002"
)]
#[case::derive(
    "using Cranks.SeedWork.Domain;\n[ValueObject]\npublic partial record Money(decimal Amount);\n",
    "SEED0003"
)]
#[case::non_generic(
    "using Cranks.SeedWork.Domain;\n[ValueObject]\npublic partial record Money(decimal Amount) : ValueObject;\n",
    "SEED0006"
)]
#[case::sealed(
    "using Cranks.SeedWork.Domain;\n[SmartEnum]\npublic partial record Color(int Key) : SmartEnum<int>(Key);\n",
    "SEED0111"
)]
#[case::smart_enum_base(
    "using Cranks.SeedWork.Domain;\n[SmartEnum]\npublic sealed partial record Color(int Key);\n",
    "SEED0103"
)]
fn test_single_fix_clears_violation(#[case] source: &str, #[case] rule_id: &str) {
    assert_eq!(ids("Test.cs", source), vec![rule_id]);
    let fixed = fix_first(source);
    assert!(ids("Test.cs", &fixed).is_empty(), "still failing:\n{}", fixed);
}

#[test]
fn test_partial_fix_changes_nothing_else() {
    let source = "using Cranks.SeedWork.Domain;\n\n/// Money\n[ValueObject]\npublic sealed record Money(decimal Amount) : ValueObject<Money>, IFormattable\n{\n    public string Format() => Amount.ToString();\n}\n";
    assert_eq!(
        fix_first(source),
        "using Cranks.SeedWork.Domain;\n\n/// Money\n[ValueObject]\npublic sealed partial record Money(decimal Amount) : ValueObject<Money>, IFormattable\n{\n    public string Format() => Amount.ToString();\n}\n"
    );
}

#[test]
fn test_derive_adds_missing_using() {
    let source = "namespace Shop;\n\n[Cranks.SeedWork.Domain.ValueObject]\npublic partial record Money(decimal Amount);\n";
    let fix = compute_fix(
        "SEED0003",
        source,
        source.find("Money").unwrap(),
        &Config::default(),
    )
    .unwrap();
    assert_eq!(
        fix.apply(source),
        "using Cranks.SeedWork.Domain;\nnamespace Shop;\n\n[Cranks.SeedWork.Domain.ValueObject]\npublic partial record Money(decimal Amount) : ValueObject<Money>;\n"
    );
}

#[test]
fn test_batch_fix_value_object() {
    let source = "using Cranks.SeedWork.Domain;\n\nnamespace Shop;\n\n[ValueObject]\npublic class Money(decimal Amount) : ValueObject\n{\n}\n";
    let config = Config::default();
    let (fixed, result) = fix_source("Money.cs", source, &config, None).unwrap();

    assert_eq!(
        fixed,
        "using Cranks.SeedWork.Domain;\n\nnamespace Shop;\n\n[ValueObject]\npublic partial record Money(decimal Amount) : ValueObject<Money>\n{\n}\n"
    );
    assert_eq!(result.applied.len(), 3);
    assert!(result.errors.is_empty());
    assert!(violations_in("Money.cs", &fixed, &config).unwrap().is_empty());
}

#[test]
fn test_batch_fix_reports_unfixable() {
    let source = "using Cranks.SeedWork.Domain;\n\npublic static class Outer\n{\n    [ValueObject]\n    public record Money(decimal Amount) : ValueObject<Money>;\n}\n";
    let (fixed, result) = fix_source("Money.cs", source, &Config::default(), None).unwrap();

    assert!(fixed.contains("public partial record Money"));
    assert_eq!(result.applied, vec!["SEED0001 (Money)"]);
    assert_eq!(result.skipped, vec!["SEED0005 (Money)"]);
}

#[test]
fn test_only_one_rule() {
    let source = "using Cranks.SeedWork.Domain;\n[SmartEnum]\npublic record Color(int Key) : SmartEnum<int>(Key);\n";
    let (fixed, result) = fix_source("Color.cs", source, &Config::default(), Some("SEED0111")).unwrap();

    assert_eq!(
        fixed,
        "using Cranks.SeedWork.Domain;\n[SmartEnum]\npublic sealed record Color(int Key) : SmartEnum<int>(Key);\n"
    );
    assert_eq!(result.applied, vec!["SEED0111 (Color)"]);
    assert_eq!(ids("Color.cs", &fixed), vec!["SEED0101"]);
}

#[test]
fn test_fix_is_idempotent_on_clean_source() {
    let source = "using Cranks.SeedWork.Domain;\n[ValueObject]\npublic partial record Money(decimal Amount) : ValueObject<Money>;\n";
    let (fixed, result) = fix_source("Money.cs", source, &Config::default(), None).unwrap();
    assert_eq!(fixed, source);
    assert!(result.applied.is_empty());
}

#[test]
fn test_derive_refuses_to_add_a_second_base_class() {
    let source = "using Cranks.SeedWork.Domain;\n\nnamespace Shop;\n\npublic abstract record Base(decimal Amount);\n\n[ValueObject]\npublic partial record Money(decimal Amount) : Base(Amount);\n";
    let (fixed, result) = fix_source("Money.cs", source, &Config::default(), None).unwrap();

    assert_eq!(fixed, source);
    assert!(result.applied.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("SEED0003 (Money)"));
    assert!(result.errors[0].contains("already derives from Base"));
}

#[test]
fn test_derive_refuses_bound_class_without_arguments() {
    let source = "using Cranks.SeedWork.Domain;\n\nnamespace Shop;\n\npublic abstract record Base;\n\n[ValueObject]\npublic partial record Money(decimal Amount) : Base;\n";
    let err = compute_fix(
        "SEED0003",
        source,
        source.rfind("Money").unwrap(),
        &Config::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("already derives from Base"));
}

#[test]
fn test_two_base_classes_are_reported() {
    let source = "using Cranks.SeedWork.Domain;\n\nnamespace Shop;\n\npublic abstract record Base(decimal Amount);\n\n[ValueObject]\npublic partial record Money(decimal Amount) : ValueObject<Money>, Base(Amount);\n";
    assert_eq!(ids("Money.cs", source), vec!["SEED0003"]);
}

#[test]
fn test_sealed_replaces_abstract() {
    let source = "using Cranks.SeedWork.Domain;\n[SmartEnum]\npublic abstract partial record Color(int Key) : SmartEnum<int>(Key);\n";
    let (fixed, result) = fix_source("Color.cs", source, &Config::default(), None).unwrap();

    assert_eq!(
        fixed,
        "using Cranks.SeedWork.Domain;\n[SmartEnum]\npublic sealed partial record Color(int Key) : SmartEnum<int>(Key);\n"
    );
    assert_eq!(result.applied, vec!["SEED0111 (Color)"]);
    assert!(ids("Color.cs", &fixed).is_empty());
}
