//! End-to-end synthesis: C# source in, generated fragment text out

use pretty_assertions::assert_eq;
use seedwork::{CancellationToken, Config, GeneratedFragment, Pipeline, SourceFile};

const HEADER: &str = "// <auto-generated />
#nullable enable

using System;
using System.Collections.Generic;
using System.Collections.Immutable;
using System.Linq;
";

fn generate_with(config: Config, source: &str) -> Vec<GeneratedFragment> {
    let sources = vec![SourceFile::new("TestValueObject.cs", source)];
    Pipeline::new(config)
        .run(&sources, &CancellationToken::new())
        .unwrap()
        .fragments()
        .cloned()
        .collect()
}

fn generate(source: &str) -> Vec<GeneratedFragment> {
    generate_with(Config::default(), source)
}

fn fragment<'a>(fragments: &'a [GeneratedFragment], slot_name: &str) -> &'a str {
    &fragments
        .iter()
        .find(|f| f.slot_name == slot_name)
        .unwrap_or_else(|| panic!("no fragment {}", slot_name))
        .text
}

const UNARY: &str = r#"using Cranks.SeedWork.Domain;

namespace SomeNamespace;

[ValueObject]
public partial record TestValueObject(int Value) : ValueObject<TestValueObject>;
"#;

#[test]
fn test_unary_cast_operators() {
    let fragments = generate(UNARY);
    let expected = format!(
        "{}
namespace SomeNamespace;

partial record TestValueObject
{{
    public static explicit operator TestValueObject(System.Int32 value)
    {{
        return new(value);
    }}
    public static implicit operator System.Int32(TestValueObject value)
    {{
        return value.Value;
    }}
}}
",
        HEADER
    );
    assert_eq!(
        fragment(&fragments, "SomeNamespace.TestValueObject.CastOperators.g.cs"),
        expected
    );
}

#[test]
fn test_unary_comparable() {
    let fragments = generate(UNARY);
    let expected = format!(
        "{}
namespace SomeNamespace;

partial record TestValueObject
    : System.IComparable<SomeNamespace.TestValueObject>,
      System.IComparable
{{
    public static bool operator <(TestValueObject? left, TestValueObject? right)
    {{
        return System.Collections.Generic.Comparer<TestValueObject>.Default.Compare(left, right) < 0;
    }}
    public static bool operator >(TestValueObject? left, TestValueObject? right)
    {{
        return System.Collections.Generic.Comparer<TestValueObject>.Default.Compare(left, right) > 0;
    }}
    public static bool operator <=(TestValueObject? left, TestValueObject? right)
    {{
        return System.Collections.Generic.Comparer<TestValueObject>.Default.Compare(left, right) <= 0;
    }}
    public static bool operator >=(TestValueObject? left, TestValueObject? right)
    {{
        return System.Collections.Generic.Comparer<TestValueObject>.Default.Compare(left, right) >= 0;
    }}
    public int CompareTo(TestValueObject? other)
    {{
        if (ReferenceEquals(null, other))
        {{
            return 1;
        }}

        if (ReferenceEquals(this, other))
        {{
            return 0;
        }}

        return Value.CompareTo(other.Value);
    }}
    public int CompareTo(object? obj)
    {{
        if (ReferenceEquals(null, obj))
        {{
            return 1;
        }}

        if (ReferenceEquals(this, obj))
        {{
            return 0;
        }}

        return obj is TestValueObject other ? CompareTo(other) : throw new System.ArgumentException($\"Object must be of type {{nameof(TestValueObject)}}\");
    }}
}}
",
        HEADER
    );
    assert_eq!(
        fragment(&fragments, "SomeNamespace.TestValueObject.IComparable.g.cs"),
        expected
    );
}

#[test]
fn test_comparable_can_be_switched_off() {
    let config = Config::from_yaml("generation:\n  comparable: false\n").unwrap();
    let fragments = generate_with(config, UNARY);
    let names: Vec<&str> = fragments.iter().map(|f| f.slot_name.as_str()).collect();
    assert_eq!(names, vec!["SomeNamespace.TestValueObject.CastOperators.g.cs"]);
}

#[test]
fn test_generic_value_object() {
    let fragments = generate(
        r#"using System;
using Cranks.SeedWork.Domain;

namespace SomeNamespace;

[ValueObject]
public partial record TestValueObject<T>(T Value) : ValueObject<TestValueObject<T>>
    where T : IComparable<T>, IEquatable<T>;
"#,
    );

    let casts = fragment(&fragments, "SomeNamespace.TestValueObject.CastOperators.g.cs");
    assert!(casts.contains("partial record TestValueObject<T>\n{"));
    assert!(casts.contains("public static explicit operator TestValueObject<T>(T value)"));
    assert!(casts.contains("public static implicit operator T(TestValueObject<T> value)"));

    let comparable = fragment(&fragments, "SomeNamespace.TestValueObject.IComparable.g.cs");
    assert!(comparable.contains("    : System.IComparable<SomeNamespace.TestValueObject<T>>,\n"));
    assert!(comparable.contains("public int CompareTo(TestValueObject<T>? other)"));
    assert!(!comparable.contains("operator <"));
}

#[test]
fn test_abstract_value_object_only_unwraps() {
    let fragments = generate(
        r#"using Cranks.SeedWork.Domain;

namespace SomeNamespace;

[ValueObject]
public abstract partial record TestValueObject(string Value) : ValueObject<TestValueObject>;
"#,
    );
    let casts = fragment(&fragments, "SomeNamespace.TestValueObject.CastOperators.g.cs");
    assert!(!casts.contains("explicit operator"));
    assert!(casts.contains("public static implicit operator System.String(TestValueObject value)"));
}

#[test]
fn test_non_unary_value_object_gets_nothing() {
    let fragments = generate(
        r#"using Cranks.SeedWork.Domain;

namespace SomeNamespace;

[ValueObject]
public partial record Range(int From, int To) : ValueObject<Range>;
"#,
    );
    assert!(fragments.is_empty());
}

#[test]
fn test_not_partial_gets_nothing() {
    let fragments = generate(
        r#"using Cranks.SeedWork.Domain;

namespace SomeNamespace;

[ValueObject]
public record TestValueObject(int Value) : ValueObject<TestValueObject>;
"#,
    );
    assert!(fragments.is_empty());
}

#[test]
fn test_keyword_property_is_escaped() {
    let fragments = generate(
        r#"using Cranks.SeedWork.Domain;

[ValueObject]
public partial record Flag(bool @event) : ValueObject<Flag>;
"#,
    );
    let casts = fragment(&fragments, "Flag.CastOperators.g.cs");
    assert!(casts.contains("return value.@event;"));
    assert!(!casts.contains("namespace"));
}

const COLOR: &str = r#"using Cranks.SeedWork.Domain;

namespace Paint;

[SmartEnum]
public sealed partial record Color(int Key) : SmartEnum<int>(Key)
{
    public static readonly Color Red = new(1);
    public static readonly Color Green = new(2);
    public static readonly int Unrelated = 3;
}
"#;

#[test]
fn test_smart_enum_fragments() {
    let fragments = generate(COLOR);
    let names: Vec<&str> = fragments.iter().map(|f| f.slot_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Paint.Color.CastOperators.g.cs",
            "Paint.Color.Equality.g.cs",
            "Paint.Color.Values.g.cs"
        ]
    );
}

#[test]
fn test_smart_enum_casts_and_equality() {
    let fragments = generate(COLOR);
    assert_eq!(
        fragment(&fragments, "Paint.Color.CastOperators.g.cs"),
        format!(
            "{}
namespace Paint;

partial record Color
{{
    public static explicit operator Color(System.Int32 key)
    {{
        return Color.TryGet(key, out var @enum) ? @enum : throw new System.InvalidCastException($\"Cannot cast '{{key}}' to Color\");
    }}

    public static explicit operator System.Int32(Color @enum)
    {{
        return @enum.Key;
    }}
}}
",
            HEADER
        )
    );
    assert_eq!(
        fragment(&fragments, "Paint.Color.Equality.g.cs"),
        format!(
            "{}
namespace Paint;

partial record Color
{{
    public override int GetHashCode() => base.GetHashCode();

    public bool Equals(Color? other) => base.Equals(other);
}}
",
            HEADER
        )
    );
}

#[test]
fn test_smart_enum_registry() {
    let fragments = generate(COLOR);
    let values = fragment(&fragments, "Paint.Color.Values.g.cs");

    assert!(values.contains("using System.Diagnostics.CodeAnalysis;\n"));
    assert!(values.contains("        builder.Add(Red);\n        builder.Add(Green);\n        return builder.ToImmutable();"));
    assert!(!values.contains("Unrelated"));
    assert!(values.contains("public static bool TryGet(System.Int32 key, [NotNullWhen(true)] out Color? @enum)"));
    assert!(values.contains("throw new KeyNotFoundException($\"No {nameof(Color)} with key {key} exists\");"));
}

#[test]
fn test_registry_can_be_switched_off() {
    let config = Config::from_yaml("generation:\n  registry: false\n").unwrap();
    let fragments = generate_with(config, COLOR);
    assert!(fragments.iter().all(|f| !f.slot_name.ends_with(".Values.g.cs")));
    assert_eq!(fragments.len(), 2);
}

#[test]
fn test_generation_disabled() {
    let config = Config::from_yaml("generation:\n  enabled: false\n").unwrap();
    assert!(generate_with(config, COLOR).is_empty());
}
