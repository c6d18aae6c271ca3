//! Data-driven tests for the declaration checker
//!
//! Each case is a C# snippet placed after a common prelude, checked on its
//! own, and compared by rule id.

use rstest::rstest;
use seedwork::{check_compilation, parse_source, Compilation, Config, Severity};

const PRELUDE: &str = "using System;\nusing System.Collections.Generic;\nusing Cranks.SeedWork.Domain;\n\nnamespace Shop;\n\n";

fn check_with(config: &Config, sources: &[(&str, &str)]) -> Vec<String> {
    let trees = sources
        .iter()
        .map(|(path, body)| parse_source(path, &format!("{}{}", PRELUDE, body)).unwrap())
        .collect();
    let compilation = Compilation::new(trees, config);
    check_compilation(&compilation, config)
        .into_iter()
        .map(|v| v.rule_id)
        .collect()
}

fn check(body: &str) -> Vec<String> {
    check_with(&Config::default(), &[("Test.cs", body)])
}

// ============================================================================
// Value objects
// ============================================================================

#[rstest]
#[case::golden_path(
    "[ValueObject] public partial record Money(decimal Amount) : ValueObject<Money>;",
    &[]
)]
#[case::not_partial(
    "[ValueObject] public record Money(decimal Amount) : ValueObject<Money>;",
    &["SEED0001"]
)]
#[case::class_stops_further_checks(
    "[ValueObject] public class Money { }",
    &["SEED0002"]
)]
#[case::struct_is_not_record_shaped(
    "[ValueObject] public partial struct Money { }",
    &["SEED0002"]
)]
#[case::no_base(
    "[ValueObject] public partial record Money(decimal Amount);",
    &["SEED0003"]
)]
#[case::unrelated_base(
    "public record Other(int X);\n[ValueObject] public partial record Money(decimal Amount) : Other(1);",
    &["SEED0003"]
)]
#[case::non_generic_base(
    "[ValueObject] public partial record Money(decimal Amount) : ValueObject;",
    &["SEED0006"]
)]
#[case::indirect_generic_base_is_accepted(
    "public abstract record Quantity(decimal Value) : ValueObject<Quantity>;\n[ValueObject] public partial record Money(decimal Value) : Quantity(Value);",
    &[]
)]
#[case::nested(
    "public static class Outer\n{\n    [ValueObject] public partial record Money(decimal Amount) : ValueObject<Money>;\n}",
    &["SEED0005"]
)]
#[case::no_parameter_list(
    "[ValueObject] public partial record Money : ValueObject<Money>;",
    &["SEED0008"]
)]
#[case::empty_parameter_list(
    "[ValueObject] public partial record Money() : ValueObject<Money>;",
    &["SEED0008"]
)]
#[case::list_is_not_equatable(
    "[ValueObject] public partial record Tags(List<string> Values) : ValueObject<Tags>;",
    &["SEED0009"]
)]
#[case::object_is_not_equatable(
    "[ValueObject] public partial record Anything(object Value) : ValueObject<Anything>;",
    &["SEED0009"]
)]
#[case::string_and_guid_are_equatable(
    "[ValueObject] public partial record Sku(string Code, Guid Id) : ValueObject<Sku>;",
    &[]
)]
#[case::several_violations_sorted(
    "[ValueObject] public record Money : ValueObject;",
    &["SEED0001", "SEED0006", "SEED0008"]
)]
#[case::unresolved_parameter_is_skipped(
    "[ValueObject] public partial record Money(Currency Unit) : ValueObject<Money>;",
    &[]
)]
#[case::unresolved_base_is_skipped(
    "[ValueObject] public partial record Money(decimal Amount) : SomewhereElse;",
    &[]
)]
#[case::unmarked_is_ignored(
    "public class Plain { }\npublic record Other(object X);",
    &[]
)]
fn test_value_object_rules(#[case] body: &str, #[case] expected: &[&str]) {
    assert_eq!(check(body), expected);
}

// ============================================================================
// Smart enums
// ============================================================================

#[rstest]
#[case::golden_path(
    "[SmartEnum] public sealed partial record Color(int Key) : SmartEnum<int>(Key)\n{\n    public static readonly Color Red = new(1);\n}",
    &[]
)]
#[case::not_sealed(
    "[SmartEnum] public partial record Color(int Key) : SmartEnum<int>(Key);",
    &["SEED0111"]
)]
#[case::not_partial_not_sealed(
    "[SmartEnum] public record Color(int Key) : SmartEnum<int>(Key);",
    &["SEED0101", "SEED0111"]
)]
#[case::class(
    "[SmartEnum] public sealed partial class Color { }",
    &["SEED0102"]
)]
#[case::no_base(
    "[SmartEnum] public sealed partial record Color(int Key);",
    &["SEED0103"]
)]
#[case::indirect_base_is_rejected(
    "public abstract record Palette(int Key) : SmartEnum<int>(Key);\n[SmartEnum] public sealed partial record Color(int Key) : Palette(Key);",
    &["SEED0103"]
)]
#[case::non_generic_base(
    "[SmartEnum] public sealed partial record Color(int Key) : SmartEnum;",
    &["SEED0106"]
)]
#[case::no_parameters_is_fine(
    "[SmartEnum] public sealed partial record Color : SmartEnum<int>;",
    &[]
)]
fn test_smart_enum_rules(#[case] body: &str, #[case] expected: &[&str]) {
    assert_eq!(check(body), expected);
}

// ============================================================================
// Cross-cutting behavior
// ============================================================================

#[test]
fn test_multiple_fragments_report_only_partial_implementation() {
    let ids = check_with(
        &Config::default(),
        &[
            ("Money.cs", "[ValueObject] public partial record Money(object Amount);"),
            ("Money.Extra.cs", "public partial record Money\n{\n    public int Scale => 2;\n}"),
        ],
    );
    assert_eq!(ids, vec!["SEED0007"]);
}

#[test]
fn test_generated_fragment_does_not_count() {
    let ids = check_with(
        &Config::default(),
        &[
            (
                "Money.cs",
                "[ValueObject] public partial record Money(decimal Amount) : ValueObject<Money>;",
            ),
            ("Shop.Money.CastOperators.g.cs", "partial record Money { }"),
        ],
    );
    assert!(ids.is_empty());
}

#[test]
fn test_same_named_marker_from_elsewhere_is_not_a_marker() {
    let source = r#"using Fake;

namespace Fake
{
    public sealed class ValueObjectAttribute : System.Attribute { }
}

namespace Shop
{
    [ValueObject]
    public class Money { }
}
"#;
    let config = Config::default();
    let compilation = Compilation::new(vec![parse_source("Money.cs", source).unwrap()], &config);
    assert!(check_compilation(&compilation, &config).is_empty());
}

#[test]
fn test_config_overrides_severity_and_disables() {
    let config = Config::from_yaml(
        r#"
severity:
  SEED0001: warning
disabled:
  - SEED0008
"#,
    )
    .unwrap();

    let trees = vec![parse_source(
        "Money.cs",
        &format!("{}[ValueObject] public record Money : ValueObject<Money>;", PRELUDE),
    )
    .unwrap()];
    let compilation = Compilation::new(trees, &config);
    let violations = check_compilation(&compilation, &config);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].rule_id, "SEED0001");
    assert_eq!(violations[0].severity, Severity::Warning);
    assert!(!seedwork::has_errors(&violations));
}

#[test]
fn test_message_and_location() {
    let trees = vec![parse_source(
        "Domain/Money.cs",
        &format!("{}[ValueObject]\npublic record Money(decimal Amount) : ValueObject<Money>;", PRELUDE),
    )
    .unwrap()];
    let config = Config::default();
    let compilation = Compilation::new(trees, &config);
    let violations = check_compilation(&compilation, &config);

    assert_eq!(violations.len(), 1);
    let v = &violations[0];
    assert_eq!(v.declaration, "Money");
    assert_eq!(v.location.path, "Domain/Money.cs");
    assert_eq!(v.location.span.start_line, 8);
    assert!(v.message.contains("'Money'"));
    assert!(v.fixable);
}

#[test]
fn test_checking_is_idempotent() {
    let body = "[ValueObject] public record Money : ValueObject;\n[SmartEnum] public record Color(int Key);";
    assert_eq!(check(body), check(body));
}
