//! Fact extraction
//!
//! Side-effect free questions over the compilation and the syntax model.
//! Missing information is `None`, which callers treat as "skip this check
//! for this pass", never as a violation.

use crate::config::{Config, MarkerTriple};
use crate::rules::CandidateKind;
use crate::symbols::{Compilation, DeclarationRef, TypeId, TypeRef, MAX_HIERARCHY_DEPTH};
use crate::syntax::TypeDeclaration;
use serde::{Deserialize, Serialize};

/// How a declaration relates to its pattern's runtime base types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BaseClassification {
    /// No base besides `object`
    Object,
    DirectGeneric,
    DirectNonGeneric,
    /// The generic base is reached further up the chain
    IndirectGeneric,
    Unrelated,
}

/// True iff an attribute on the symbol matches the marker by name, assembly and namespace
pub fn is_marked(compilation: &Compilation, id: TypeId, marker: &MarkerTriple) -> bool {
    compilation.symbol(id).attributes.iter().any(|&attribute| {
        let symbol = compilation.symbol(attribute);
        symbol.name == marker.name
            && symbol.assembly == marker.assembly
            && symbol.namespace_name() == marker.namespace
    })
}

/// Which pattern markers a symbol carries
pub fn marked_kinds(compilation: &Compilation, id: TypeId, config: &Config) -> Vec<CandidateKind> {
    let mut kinds = Vec::new();
    if is_marked(compilation, id, &config.value_object_marker()) {
        kinds.push(CandidateKind::ValueObject);
    }
    if is_marked(compilation, id, &config.smart_enum_marker()) {
        kinds.push(CandidateKind::SmartEnum);
    }
    kinds
}

/// Walk the base chain from the immediate base, stopping at `object`
///
/// With `allow_indirect == false` only the immediate base is tested.
pub fn derives_from(
    compilation: &Compilation,
    ty: &TypeRef,
    predicate: impl Fn(&TypeRef) -> bool,
    allow_indirect: bool,
) -> bool {
    let object = compilation.well_known().object;
    let mut current = compilation.base_type(ty);

    for _ in 0..MAX_HIERARCHY_DEPTH {
        let Some(base) = current else {
            return false;
        };
        if base.id() == Some(object) {
            return false;
        }
        if predicate(&base) {
            return true;
        }
        if !allow_indirect {
            return false;
        }
        current = compilation.base_type(&base);
    }
    false
}

fn is_runtime_base(
    compilation: &Compilation,
    ty: &TypeRef,
    kind: CandidateKind,
    config: &Config,
    arity: usize,
) -> bool {
    let Some(id) = ty.id() else {
        return false;
    };
    let symbol = compilation.symbol(id);
    symbol.name == kind.base_name()
        && symbol.assembly == config.runtime.assembly
        && symbol.namespace_name() == config.runtime.namespace
        && symbol.arity() == arity
}

/// `ValueObject<T>` / `SmartEnum<TKey>`
pub fn is_generic_base(compilation: &Compilation, ty: &TypeRef, kind: CandidateKind, config: &Config) -> bool {
    is_runtime_base(compilation, ty, kind, config, 1)
}

/// `ValueObject` / `SmartEnum`, the shared marker roots
pub fn is_non_generic_base(compilation: &Compilation, ty: &TypeRef, kind: CandidateKind, config: &Config) -> bool {
    is_runtime_base(compilation, ty, kind, config, 0)
}

/// Classify the symbol's base against its pattern
///
/// `None` when an unbound base list entry leaves the answer open.
pub fn classify_base(
    compilation: &Compilation,
    id: TypeId,
    kind: CandidateKind,
    config: &Config,
) -> Option<BaseClassification> {
    let symbol = compilation.symbol(id);
    let object = compilation.well_known().object;

    // Two base classes never compile, whichever of them is the right one
    if symbol.has_conflicting_bases {
        return Some(BaseClassification::Unrelated);
    }

    let base = match &symbol.base_type {
        Some(base) if base.id() != Some(object) => base,
        _ if symbol.has_unresolved_bases => return None,
        _ => return Some(BaseClassification::Object),
    };

    if is_generic_base(compilation, base, kind, config) {
        return Some(BaseClassification::DirectGeneric);
    }
    if is_non_generic_base(compilation, base, kind, config) {
        return Some(BaseClassification::DirectNonGeneric);
    }

    let self_type = compilation.self_type(id);
    if derives_from(
        compilation,
        &self_type,
        |t| is_generic_base(compilation, t, kind, config),
        true,
    ) {
        return Some(BaseClassification::IndirectGeneric);
    }
    Some(BaseClassification::Unrelated)
}

pub fn is_partial_declaration(decl: &TypeDeclaration) -> bool {
    decl.has_modifier("partial")
}

/// Any lexical ancestor is a type declaration
pub fn is_nested_declaration(decl: &TypeDeclaration) -> bool {
    decl.parent.is_some()
}

/// Base list entries as written
pub fn extract_base_type_names(decl: &TypeDeclaration) -> Vec<String> {
    decl.base_list
        .iter()
        .flat_map(|list| list.entries.iter())
        .map(|entry| entry.ty.to_string())
        .collect()
}

/// Primary constructor parameters with their bound types
///
/// A missing parameter list yields an empty list; any parameter whose
/// type does not bind yields `None`.
pub fn extract_constructor_parameters(
    compilation: &Compilation,
    at: DeclarationRef,
) -> Option<Vec<(String, TypeRef)>> {
    let decl = compilation.declaration(at);
    let Some(parameters) = &decl.parameter_list else {
        return Some(Vec::new());
    };

    parameters
        .iter()
        .map(|p| {
            let ty = compilation.resolve_type(at.tree, Some(at.declaration), p.ty.as_ref()?)?;
            Some((p.name.clone(), ty))
        })
        .collect()
}

/// Interfaces that decide capabilities, constraint-implied ones included
fn capability_interfaces(compilation: &Compilation, ty: &TypeRef) -> Vec<TypeRef> {
    match ty {
        TypeRef::Named { id, .. } => {
            let mut interfaces = compilation.all_interfaces(ty);
            if compilation.symbol(*id).kind == crate::syntax::DeclarationKind::Interface {
                interfaces.push(ty.clone());
            }
            interfaces
        }
        TypeRef::Parameter { owner, ordinal } => {
            let mut interfaces = Vec::new();
            for constraint in compilation.constraints(*owner, *ordinal) {
                interfaces.extend(capability_interfaces(compilation, constraint));
            }
            interfaces
        }
        // `T?` over a value type is `Nullable<T>`, which implements nothing useful
        TypeRef::Nullable(inner) => match inner.as_ref() {
            TypeRef::Named { id, .. } if compilation.symbol(*id).is_value_type() => Vec::new(),
            other => capability_interfaces(compilation, other),
        },
        TypeRef::Array(_) | TypeRef::Tuple(_) => Vec::new(),
    }
}

fn implements(compilation: &Compilation, ty: &TypeRef, interface: TypeId) -> bool {
    // Value tuples compare and equate element-wise
    if let TypeRef::Tuple(_) = ty {
        return true;
    }
    capability_interfaces(compilation, ty)
        .iter()
        .any(|i| i.id() == Some(interface))
}

/// Implements the non-generic `System.IComparable`
pub fn is_comparable(compilation: &Compilation, ty: &TypeRef) -> bool {
    implements(compilation, ty, compilation.well_known().icomparable)
}

/// Implements `System.IComparable<T>`
pub fn is_comparable_generic(compilation: &Compilation, ty: &TypeRef) -> bool {
    implements(compilation, ty, compilation.well_known().icomparable_t)
}

/// Implements `System.IEquatable<T>`
pub fn is_equatable(compilation: &Compilation, ty: &TypeRef) -> bool {
    implements(compilation, ty, compilation.well_known().iequatable_t)
}

/// `public static readonly` fields typed as the declaring type, in declaration order
pub fn enumerated_instances(compilation: &Compilation, id: TypeId, fragments: &[DeclarationRef]) -> Vec<String> {
    let mut names = Vec::new();
    for at in fragments {
        let decl = compilation.declaration(*at);
        for field in decl.fields.iter().filter(|f| f.is_singleton_candidate()) {
            let resolved = compilation.resolve_type(at.tree, Some(at.declaration), &field.ty);
            if resolved.and_then(|t| t.id()) == Some(id) {
                names.push(field.name.clone());
            }
        }
    }
    names
}

/// `TKey` of the immediate `SmartEnum<TKey>` base
pub fn smart_enum_key_type(compilation: &Compilation, id: TypeId, config: &Config) -> Option<TypeRef> {
    let base = compilation.symbol(id).base_type.as_ref()?;
    if !is_generic_base(compilation, base, CandidateKind::SmartEnum, config) {
        return None;
    }
    base.args().first().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;

    const RUNTIME: &str = "using Cranks.SeedWork.Domain;\n";

    fn compile(source: &str) -> Compilation {
        let text = format!("{}{}", RUNTIME, source);
        Compilation::new(vec![parse_source("Test.cs", &text).unwrap()], &Config::default())
    }

    fn id_of(c: &Compilation, name: &str) -> TypeId {
        c.lookup("N", name, 0).unwrap()
    }

    #[test]
    fn test_is_marked_requires_full_triple() {
        let c = compile(
            r#"
namespace N;
public sealed class ValueObjectAttribute : System.Attribute { }
[ValueObject] public partial record Local(int X);
[Cranks.SeedWork.Domain.ValueObject] public partial record Real(int X);
"#,
        );
        let marker = Config::default().value_object_marker();
        assert!(!is_marked(&c, id_of(&c, "Local"), &marker));
        assert!(is_marked(&c, id_of(&c, "Real"), &marker));
    }

    #[test]
    fn test_classify_base() {
        let config = Config::default();
        let c = compile(
            r#"
namespace N;
public partial record A(int X) : ValueObject<A>;
public partial record B(int X) : ValueObject;
public partial record C(int X);
public partial record D(int X) : A(X);
public partial record E(int X) : System.Exception;
public partial record F(int X) : Unknown;
"#,
        );
        let vo = CandidateKind::ValueObject;
        assert_eq!(classify_base(&c, id_of(&c, "A"), vo, &config), Some(BaseClassification::DirectGeneric));
        assert_eq!(classify_base(&c, id_of(&c, "B"), vo, &config), Some(BaseClassification::DirectNonGeneric));
        assert_eq!(classify_base(&c, id_of(&c, "C"), vo, &config), Some(BaseClassification::Object));
        assert_eq!(classify_base(&c, id_of(&c, "D"), vo, &config), Some(BaseClassification::IndirectGeneric));
        // System.Exception is not declared, so the base is unknown
        assert_eq!(classify_base(&c, id_of(&c, "E"), vo, &config), None);
        assert_eq!(classify_base(&c, id_of(&c, "F"), vo, &config), None);
        assert_eq!(
            classify_base(&c, id_of(&c, "A"), CandidateKind::SmartEnum, &config),
            Some(BaseClassification::Unrelated)
        );
    }

    #[test]
    fn test_capabilities() {
        let c = compile(
            r#"
namespace N;
public record Holder(int A, string B, byte[] C, int? D, Holder E, (int, string) F);
public record Wrapper<T>(T Value) where T : System.IComparable<T>;
"#,
        );
        let at = DeclarationRef { tree: 0, declaration: 0 };
        let params = extract_constructor_parameters(&c, at).unwrap();
        let equatable: Vec<bool> = params.iter().map(|(_, t)| is_equatable(&c, t)).collect();
        assert_eq!(equatable, vec![true, true, false, false, true, true]);
        assert!(is_comparable(&c, &params[0].1));
        assert!(!is_comparable(&c, &params[4].1));

        let wrapper = DeclarationRef { tree: 0, declaration: 1 };
        let params = extract_constructor_parameters(&c, wrapper).unwrap();
        assert!(is_comparable_generic(&c, &params[0].1));
        assert!(!is_comparable(&c, &params[0].1));
        assert!(!is_equatable(&c, &params[0].1));
    }

    #[test]
    fn test_unresolved_parameters_fail() {
        let c = compile("namespace N; public record A(Missing X, int Y);");
        let at = DeclarationRef { tree: 0, declaration: 0 };
        assert!(extract_constructor_parameters(&c, at).is_none());

        let c = compile("namespace N; public record A;");
        assert_eq!(extract_constructor_parameters(&c, at), Some(Vec::new()));
    }

    #[test]
    fn test_instances_and_key_type() {
        let config = Config::default();
        let c = compile(
            r#"
namespace N;
public sealed partial record Color(string Key) : SmartEnum<string>(Key)
{
    public static readonly Color Red = new("red");
    public static readonly string Label = "colors";
    public static readonly Color Blue = new("blue");
    private static readonly Color Hidden = new("hidden");
}
"#,
        );
        let id = id_of(&c, "Color");
        let fragments = c.symbol(id).declarations.clone();
        assert_eq!(enumerated_instances(&c, id, &fragments), vec!["Red", "Blue"]);

        let key = smart_enum_key_type(&c, id, &config).unwrap();
        assert_eq!(c.full_name(&key), "System.String");
    }

    #[test]
    fn test_syntax_facts() {
        let c = compile("namespace N; public class Outer { public record Inner(int X) : A, B<int>; }");
        let inner = c.declaration(DeclarationRef { tree: 0, declaration: 1 });
        assert!(is_nested_declaration(inner));
        assert!(!is_partial_declaration(inner));
        assert_eq!(extract_base_type_names(inner), vec!["A", "B<int>"]);
    }
}
