//! Custom MiniJinja filters for C# generation

use minijinja::Environment;

/// Register all custom filters with the environment
pub fn register_filters(env: &mut Environment<'_>) {
    env.add_filter("nullable", nullable);
    env.add_filter("verbatim", verbatim);
}

/// `T` -> `T?`, leaving already-nullable types alone
fn nullable(value: &str) -> String {
    if value.ends_with('?') {
        value.to_string()
    } else {
        format!("{}?", value)
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected", "public",
    "readonly", "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static",
    "string", "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong",
    "unchecked", "unsafe", "ushort", "using", "virtual", "void", "volatile", "while",
];

/// Prefix reserved words with `@` so they can be used as identifiers
fn verbatim(value: &str) -> String {
    if KEYWORDS.contains(&value) {
        format!("@{}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable() {
        assert_eq!(nullable("Money"), "Money?");
        assert_eq!(nullable("Money?"), "Money?");
        assert_eq!(nullable("Wrapper<T>"), "Wrapper<T>?");
    }

    #[test]
    fn test_verbatim() {
        assert_eq!(verbatim("Value"), "Value");
        assert_eq!(verbatim("event"), "@event");
        assert_eq!(verbatim("@event"), "@event");
    }
}
