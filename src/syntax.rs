//! Owned syntax model for C# type declarations
//!
//! The tree-sitter tree is only alive during parsing. Everything the
//! checker, synthesizer and binder need is copied into these plain types
//! so a [`SyntaxTree`] can be shared freely between worker threads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source span, both as byte offsets and as 1-based lines / 0-based columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn contains(&self, offset: usize) -> bool {
        self.start_byte <= offset && offset < self.end_byte
    }
}

/// A span inside a named source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    pub span: Span,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.path,
            self.span.start_line,
            self.span.start_col + 1
        )
    }
}

/// One parsed source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub path: String,
    /// `sha256:` prefixed hash of the source text
    pub source_hash: String,
    /// Generated trees contribute symbols but are never checked
    pub is_generated: bool,
    pub usings: Vec<UsingDirective>,
    /// Every type declaration in pre-order, nested ones included
    pub declarations: Vec<TypeDeclaration>,
}

impl SyntaxTree {
    /// Index of the innermost declaration whose span contains `offset`
    pub fn declaration_at(&self, offset: usize) -> Option<usize> {
        self.declarations
            .iter()
            .enumerate()
            .filter(|(_, d)| d.span.contains(offset))
            .max_by_key(|(_, d)| d.span.start_byte)
            .map(|(i, _)| i)
    }
}

/// `using X.Y;` or `using A = X.Y;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsingDirective {
    pub target: String,
    pub alias: Option<String>,
    pub is_static: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclarationKind {
    Class,
    Struct,
    Interface,
    Record,
    RecordStruct,
    Enum,
}

impl DeclarationKind {
    /// Enums are base-type declarations, not type declarations
    pub fn is_type_declaration(self) -> bool {
        !matches!(self, DeclarationKind::Enum)
    }

    pub fn is_record(self) -> bool {
        matches!(self, DeclarationKind::Record | DeclarationKind::RecordStruct)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Struct => "struct",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Record => "record",
            DeclarationKind::RecordStruct => "record struct",
            DeclarationKind::Enum => "enum",
        }
    }
}

/// A single type declaration fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDeclaration {
    pub kind: DeclarationKind,
    pub name: String,
    /// Whole declaration, attributes included
    pub span: Span,
    pub identifier_span: Span,
    /// The `class` / `record` / ... keyword
    pub keyword_span: Span,
    /// Containing namespace, `None` for the global namespace
    pub namespace: Option<String>,
    /// Lexically enclosing type declaration (index into the same tree)
    pub parent: Option<usize>,
    pub attributes: Vec<AttributeSyntax>,
    pub modifiers: Vec<Modifier>,
    pub type_parameters: Vec<String>,
    /// Verbatim `<...>` text, if any
    pub type_parameter_list: Option<String>,
    pub type_parameter_list_span: Option<Span>,
    /// Primary constructor; `None` when there is no parameter list at all
    pub parameter_list: Option<Vec<ParameterSyntax>>,
    pub parameter_list_span: Option<Span>,
    pub base_list: Option<BaseList>,
    pub constraints: Vec<ConstraintClause>,
    pub fields: Vec<FieldSyntax>,
}

impl TypeDeclaration {
    pub fn has_modifier(&self, keyword: &str) -> bool {
        self.modifiers.iter().any(|m| m.keyword == keyword)
    }

    pub fn arity(&self) -> usize {
        self.type_parameters.len()
    }

    /// End of the header before any base list: identifier, type parameters, parameters
    pub fn header_end(&self) -> usize {
        [
            Some(self.identifier_span),
            self.type_parameter_list_span,
            self.parameter_list_span,
        ]
        .into_iter()
        .flatten()
        .map(|span| span.end_byte)
        .max()
        .unwrap_or(self.identifier_span.end_byte)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSyntax {
    pub name: TypeSyntax,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub keyword: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSyntax {
    pub name: String,
    /// Missing while the user is still typing
    pub ty: Option<TypeSyntax>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseList {
    pub span: Span,
    pub entries: Vec<BaseEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEntry {
    pub ty: TypeSyntax,
    pub span: Span,
    /// `(Key)` of a primary-constructor base call
    pub arguments: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintClause {
    pub target: String,
    pub types: Vec<TypeSyntax>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSyntax {
    pub name: String,
    pub ty: TypeSyntax,
    pub modifiers: Vec<String>,
}

impl FieldSyntax {
    /// `public static readonly`
    pub fn is_singleton_candidate(&self) -> bool {
        ["public", "static", "readonly"]
            .iter()
            .all(|m| self.modifiers.iter().any(|own| own == m))
    }
}

/// One segment of a possibly qualified name: `Name<Args>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameSegment {
    pub name: String,
    pub args: Vec<TypeSyntax>,
}

/// Type reference as written in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSyntax {
    /// `int`, `string`, ...
    Predefined(String),
    Name {
        global: bool,
        segments: Vec<NameSegment>,
    },
    Nullable(Box<TypeSyntax>),
    Array(Box<TypeSyntax>),
    Tuple(Vec<TypeSyntax>),
    /// Anything the binder does not understand (`var`, pointers, ...)
    Other(String),
}

impl TypeSyntax {
    /// Simple name of the right-most segment
    pub fn simple_name(&self) -> Option<&str> {
        match self {
            TypeSyntax::Name { segments, .. } => segments.last().map(|s| s.name.as_str()),
            TypeSyntax::Nullable(inner) => inner.simple_name(),
            _ => None,
        }
    }

    /// Number of type arguments on the right-most segment
    pub fn arity(&self) -> usize {
        match self {
            TypeSyntax::Name { segments, .. } => segments.last().map_or(0, |s| s.args.len()),
            _ => 0,
        }
    }

    pub fn simple(name: &str) -> Self {
        TypeSyntax::Name {
            global: false,
            segments: vec![NameSegment {
                name: name.to_string(),
                args: Vec::new(),
            }],
        }
    }
}

impl fmt::Display for TypeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSyntax::Predefined(keyword) => f.write_str(keyword),
            TypeSyntax::Name { global, segments } => {
                if *global {
                    f.write_str("global::")?;
                }
                for (i, segment) in segments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&segment.name)?;
                    if !segment.args.is_empty() {
                        let args: Vec<String> = segment.args.iter().map(|a| a.to_string()).collect();
                        write!(f, "<{}>", args.join(", "))?;
                    }
                }
                Ok(())
            }
            TypeSyntax::Nullable(inner) => write!(f, "{}?", inner),
            TypeSyntax::Array(inner) => write!(f, "{}[]", inner),
            TypeSyntax::Tuple(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
            TypeSyntax::Other(text) => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_syntax_display() {
        let ty = TypeSyntax::Name {
            global: true,
            segments: vec![
                NameSegment {
                    name: "System".into(),
                    args: vec![],
                },
                NameSegment {
                    name: "IComparable".into(),
                    args: vec![TypeSyntax::Predefined("int".into())],
                },
            ],
        };
        assert_eq!(ty.to_string(), "global::System.IComparable<int>");
        assert_eq!(ty.simple_name(), Some("IComparable"));
        assert_eq!(ty.arity(), 1);

        let nullable = TypeSyntax::Nullable(Box::new(TypeSyntax::simple("Money")));
        assert_eq!(nullable.to_string(), "Money?");
        assert_eq!(nullable.simple_name(), Some("Money"));
    }

    #[test]
    fn test_span_contains_is_half_open() {
        let span = Span {
            start_byte: 4,
            end_byte: 8,
            ..Default::default()
        };
        assert!(span.contains(4));
        assert!(span.contains(7));
        assert!(!span.contains(8));
    }
}
