//! Semantic model
//!
//! A [`Compilation`] turns a set of [`SyntaxTree`]s into type symbols:
//! partial fragments are merged into one symbol, base lists and attributes
//! are bound by name lookup, and a small set of referenced assemblies (BCL
//! primitives plus the SeedWork runtime) is declared up front.
//!
//! The compilation is immutable once built and is shared read-only between
//! worker threads.

mod resolve;
mod wellknown;

use crate::config::Config;
use crate::syntax::{DeclarationKind, SyntaxTree, TypeDeclaration, TypeSyntax};
use std::collections::HashMap;
use tracing::debug;

pub use wellknown::WellKnown;

/// Index into [`Compilation::symbols`]
pub type TypeId = usize;

/// Guard for walks over base and interface relations
///
/// Valid programs are acyclic, but a half-typed one may not look like it.
pub const MAX_HIERARCHY_DEPTH: usize = 32;

/// Assembly used for well-known BCL types
pub const BCL_ASSEMBLY: &str = "System.Runtime";

/// One syntax fragment backing a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclarationRef {
    pub tree: usize,
    pub declaration: usize,
}

/// A reference to a type, possibly constructed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named { id: TypeId, args: Vec<TypeRef> },
    /// Type parameter `ordinal` of `owner`
    Parameter { owner: TypeId, ordinal: usize },
    Nullable(Box<TypeRef>),
    Array(Box<TypeRef>),
    Tuple(Vec<TypeRef>),
}

impl TypeRef {
    pub fn named(id: TypeId) -> Self {
        TypeRef::Named { id, args: Vec::new() }
    }

    pub fn generic(id: TypeId, args: Vec<TypeRef>) -> Self {
        TypeRef::Named { id, args }
    }

    /// Definition id for named types
    pub fn id(&self) -> Option<TypeId> {
        match self {
            TypeRef::Named { id, .. } => Some(*id),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// Replace `owner`'s type parameters with `args`
    pub fn substitute(&self, owner: TypeId, args: &[TypeRef]) -> TypeRef {
        match self {
            TypeRef::Parameter { owner: o, ordinal } if *o == owner => {
                args.get(*ordinal).cloned().unwrap_or_else(|| self.clone())
            }
            TypeRef::Parameter { .. } => self.clone(),
            TypeRef::Named { id, args: own } => TypeRef::Named {
                id: *id,
                args: own.iter().map(|a| a.substitute(owner, args)).collect(),
            },
            TypeRef::Nullable(inner) => TypeRef::Nullable(Box::new(inner.substitute(owner, args))),
            TypeRef::Array(inner) => TypeRef::Array(Box::new(inner.substitute(owner, args))),
            TypeRef::Tuple(elements) => {
                TypeRef::Tuple(elements.iter().map(|e| e.substitute(owner, args)).collect())
            }
        }
    }
}

/// A named type, merged over all its declaring fragments
#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    /// `None` for the global namespace
    pub namespace: Option<String>,
    pub containing_type: Option<TypeId>,
    pub assembly: String,
    pub kind: DeclarationKind,
    pub type_parameters: Vec<String>,
    pub is_abstract: bool,
    pub is_sealed: bool,
    /// Source fragments in tree order; empty for referenced types
    pub declarations: Vec<DeclarationRef>,
    pub base_type: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub attributes: Vec<TypeId>,
    /// Constraint types per type parameter
    pub constraints: Vec<Vec<TypeRef>>,
    /// At least one base list entry did not bind
    pub has_unresolved_bases: bool,
    /// Base lists name more than one distinct class
    pub has_conflicting_bases: bool,
}

impl TypeSymbol {
    fn new(name: &str, namespace: Option<&str>, assembly: &str, kind: DeclarationKind) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            containing_type: None,
            assembly: assembly.to_string(),
            kind,
            type_parameters: Vec::new(),
            is_abstract: false,
            is_sealed: false,
            declarations: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            attributes: Vec::new(),
            constraints: Vec::new(),
            has_unresolved_bases: false,
            has_conflicting_bases: false,
        }
    }

    pub fn arity(&self) -> usize {
        self.type_parameters.len()
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }

    pub fn is_value_type(&self) -> bool {
        matches!(
            self.kind,
            DeclarationKind::Struct | DeclarationKind::RecordStruct | DeclarationKind::Enum
        )
    }

    /// Namespace as a string, empty for the global namespace
    pub fn namespace_name(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TopLevelKey {
    namespace: String,
    name: String,
    arity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NestedKey {
    container: TypeId,
    name: String,
    arity: usize,
}

/// Bound semantic model over a set of syntax trees
#[derive(Debug)]
pub struct Compilation {
    assembly: String,
    trees: Vec<SyntaxTree>,
    symbols: Vec<TypeSymbol>,
    top_level: HashMap<TopLevelKey, TypeId>,
    nested: HashMap<NestedKey, TypeId>,
    declared: HashMap<DeclarationRef, TypeId>,
    well_known: WellKnown,
}

/// Result of binding one symbol, applied after all lookups are done
#[derive(Default)]
struct Binding {
    base_type: Option<TypeRef>,
    interfaces: Vec<TypeRef>,
    attributes: Vec<TypeId>,
    constraints: Vec<Vec<TypeRef>>,
    has_unresolved_bases: bool,
    has_conflicting_bases: bool,
}

impl Compilation {
    pub fn new(trees: Vec<SyntaxTree>, config: &Config) -> Self {
        let mut compilation = Self {
            assembly: config.assembly.clone(),
            trees: Vec::new(),
            symbols: Vec::new(),
            top_level: HashMap::new(),
            nested: HashMap::new(),
            declared: HashMap::new(),
            well_known: WellKnown::default(),
        };

        compilation.well_known = wellknown::declare(&mut compilation, config);
        compilation.trees = trees;
        compilation.declare_sources();
        compilation.bind_sources();

        debug!(
            trees = compilation.trees.len(),
            symbols = compilation.symbols.len(),
            "compilation built"
        );
        compilation
    }

    /// Name of the assembly source declarations belong to
    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    pub fn tree(&self, index: usize) -> &SyntaxTree {
        &self.trees[index]
    }

    pub fn declaration(&self, at: DeclarationRef) -> &TypeDeclaration {
        &self.trees[at.tree].declarations[at.declaration]
    }

    pub fn symbols(&self) -> &[TypeSymbol] {
        &self.symbols
    }

    pub fn symbol(&self, id: TypeId) -> &TypeSymbol {
        &self.symbols[id]
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    /// Symbol declared by a syntax fragment
    pub fn symbol_of(&self, at: DeclarationRef) -> Option<TypeId> {
        self.declared.get(&at).copied()
    }

    /// Symbols declared in source, in order of first declaration
    pub fn source_symbols(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.symbols.len()).filter(|&id| !self.symbols[id].declarations.is_empty())
    }

    /// Top-level type by namespace (`""` for global), name and arity
    pub fn lookup(&self, namespace: &str, name: &str, arity: usize) -> Option<TypeId> {
        self.top_level
            .get(&TopLevelKey {
                namespace: namespace.to_string(),
                name: name.to_string(),
                arity,
            })
            .copied()
    }

    pub fn lookup_nested(&self, container: TypeId, name: &str, arity: usize) -> Option<TypeId> {
        self.nested
            .get(&NestedKey {
                container,
                name: name.to_string(),
                arity,
            })
            .copied()
    }

    /// Resolve a type written inside `at` (or at file level when `None`)
    pub fn resolve_type(&self, tree: usize, at: Option<usize>, ty: &TypeSyntax) -> Option<TypeRef> {
        resolve::Scope::new(self, tree, at).resolve(ty)
    }

    /// Resolve an attribute name, trying the `Attribute` suffix as well
    pub fn resolve_attribute(&self, tree: usize, at: Option<usize>, name: &TypeSyntax) -> Option<TypeId> {
        resolve::Scope::new(self, tree, at).resolve_attribute(name)
    }

    /// `Self` as seen from inside the declaration: type parameters unbound
    pub fn self_type(&self, id: TypeId) -> TypeRef {
        let args = (0..self.symbols[id].arity())
            .map(|ordinal| TypeRef::Parameter { owner: id, ordinal })
            .collect();
        TypeRef::generic(id, args)
    }

    /// Declared base type with `ty`'s type arguments substituted
    pub fn base_type(&self, ty: &TypeRef) -> Option<TypeRef> {
        let TypeRef::Named { id, args } = ty else {
            return None;
        };
        self.symbols[*id]
            .base_type
            .as_ref()
            .map(|base| base.substitute(*id, args))
    }

    /// Declared interfaces of `ty`, substituted, not transitive
    pub fn direct_interfaces(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let TypeRef::Named { id, args } = ty else {
            return Vec::new();
        };
        self.symbols[*id]
            .interfaces
            .iter()
            .map(|i| i.substitute(*id, args))
            .collect()
    }

    /// Every interface `ty` implements, through base types and base interfaces
    pub fn all_interfaces(&self, ty: &TypeRef) -> Vec<TypeRef> {
        let mut out: Vec<TypeRef> = Vec::new();
        let mut current = Some(ty.clone());
        let mut depth = 0;

        while let Some(ty) = current {
            if depth >= MAX_HIERARCHY_DEPTH {
                break;
            }
            for interface in self.direct_interfaces(&ty) {
                self.collect_interface(interface, &mut out, 0);
            }
            current = self.base_type(&ty);
            depth += 1;
        }
        out
    }

    fn collect_interface(&self, interface: TypeRef, out: &mut Vec<TypeRef>, depth: usize) {
        if depth >= MAX_HIERARCHY_DEPTH || out.contains(&interface) {
            return;
        }
        let inherited = self.direct_interfaces(&interface);
        out.push(interface);
        for base in inherited {
            self.collect_interface(base, out, depth + 1);
        }
    }

    /// Constraint types declared for a type parameter
    pub fn constraints(&self, owner: TypeId, ordinal: usize) -> &[TypeRef] {
        self.symbols[owner]
            .constraints
            .get(ordinal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `Ns.Outer.Name`, no type arguments
    pub fn qualified_name(&self, id: TypeId) -> String {
        let symbol = &self.symbols[id];
        match (symbol.containing_type, &symbol.namespace) {
            (Some(container), _) => format!("{}.{}", self.qualified_name(container), symbol.name),
            (None, Some(ns)) => format!("{}.{}", ns, symbol.name),
            (None, None) => symbol.name.clone(),
        }
    }

    /// Fully qualified display name, e.g. `System.IComparable<Shop.Money>`
    ///
    /// Type parameters are written by their bare name.
    pub fn full_name(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Named { id, args } if args.is_empty() => self.qualified_name(*id),
            TypeRef::Named { id, args } => {
                let args: Vec<String> = args.iter().map(|a| self.full_name(a)).collect();
                format!("{}<{}>", self.qualified_name(*id), args.join(", "))
            }
            TypeRef::Parameter { owner, ordinal } => self.symbols[*owner]
                .type_parameters
                .get(*ordinal)
                .cloned()
                .unwrap_or_default(),
            TypeRef::Nullable(inner) => format!("{}?", self.full_name(inner)),
            TypeRef::Array(inner) => format!("{}[]", self.full_name(inner)),
            TypeRef::Tuple(elements) => {
                let parts: Vec<String> = elements.iter().map(|e| self.full_name(e)).collect();
                format!("({})", parts.join(", "))
            }
        }
    }

    fn add_symbol(&mut self, symbol: TypeSymbol) -> TypeId {
        let id = self.symbols.len();
        match symbol.containing_type {
            Some(container) => {
                self.nested.insert(
                    NestedKey {
                        container,
                        name: symbol.name.clone(),
                        arity: symbol.arity(),
                    },
                    id,
                );
            }
            None => {
                self.top_level.insert(
                    TopLevelKey {
                        namespace: symbol.namespace_name().to_string(),
                        name: symbol.name.clone(),
                        arity: symbol.arity(),
                    },
                    id,
                );
            }
        }
        self.symbols.push(symbol);
        id
    }

    fn declare_sources(&mut self) {
        for tree_index in 0..self.trees.len() {
            for decl_index in 0..self.trees[tree_index].declarations.len() {
                let at = DeclarationRef {
                    tree: tree_index,
                    declaration: decl_index,
                };
                let decl = &self.trees[tree_index].declarations[decl_index];

                // Parents come first in pre-order, so they are already declared
                let container = match decl.parent {
                    Some(parent) => match self.declared.get(&DeclarationRef {
                        tree: tree_index,
                        declaration: parent,
                    }) {
                        Some(id) => Some(*id),
                        None => continue,
                    },
                    None => None,
                };

                let existing = match container {
                    Some(container) => self.lookup_nested(container, &decl.name, decl.arity()),
                    None => self.lookup(
                        decl.namespace.as_deref().unwrap_or(""),
                        &decl.name,
                        decl.arity(),
                    ),
                };

                let is_abstract = decl.has_modifier("abstract");
                let is_sealed = decl.has_modifier("sealed");

                let id = match existing {
                    Some(id) if self.symbols[id].assembly == self.assembly => id,
                    _ => {
                        let mut symbol = TypeSymbol::new(
                            &decl.name,
                            decl.namespace.as_deref(),
                            &self.assembly,
                            decl.kind,
                        );
                        symbol.containing_type = container;
                        symbol.type_parameters = decl.type_parameters.clone();
                        self.add_symbol(symbol)
                    }
                };

                let symbol = &mut self.symbols[id];
                symbol.is_abstract |= is_abstract;
                symbol.is_sealed |= is_sealed;
                symbol.declarations.push(at);
                self.declared.insert(at, id);
            }
        }
    }

    fn bind_sources(&mut self) {
        let ids: Vec<TypeId> = self.source_symbols().collect();
        let bindings: Vec<(TypeId, Binding)> =
            ids.into_iter().map(|id| (id, self.bind_symbol(id))).collect();

        for (id, binding) in bindings {
            let symbol = &mut self.symbols[id];
            symbol.base_type = binding.base_type;
            symbol.interfaces = binding.interfaces;
            symbol.attributes = binding.attributes;
            symbol.constraints = binding.constraints;
            symbol.has_unresolved_bases = binding.has_unresolved_bases;
            symbol.has_conflicting_bases = binding.has_conflicting_bases;
        }
    }

    fn bind_symbol(&self, id: TypeId) -> Binding {
        let symbol = &self.symbols[id];
        let mut binding = Binding {
            constraints: vec![Vec::new(); symbol.arity()],
            ..Default::default()
        };

        for at in &symbol.declarations {
            let decl = self.declaration(*at);

            for attribute in &decl.attributes {
                if let Some(attr) = self.resolve_attribute(at.tree, Some(at.declaration), &attribute.name) {
                    if !binding.attributes.contains(&attr) {
                        binding.attributes.push(attr);
                    }
                }
            }

            // Generated fragments only ever add interfaces derived from the
            // user's declaration; binding them would feed output back into facts
            let bases = if self.trees[at.tree].is_generated {
                None
            } else {
                decl.base_list.as_ref()
            };
            for entry in bases.iter().flat_map(|b| b.entries.iter()) {
                let Some(resolved) = self.resolve_type(at.tree, Some(at.declaration), &entry.ty) else {
                    binding.has_unresolved_bases = true;
                    continue;
                };
                let is_interface = resolved
                    .id()
                    .is_some_and(|t| self.symbols[t].kind == DeclarationKind::Interface);
                if is_interface || symbol.kind == DeclarationKind::Interface {
                    if !binding.interfaces.contains(&resolved) {
                        binding.interfaces.push(resolved);
                    }
                } else {
                    match &binding.base_type {
                        None => binding.base_type = Some(resolved),
                        Some(base) if *base == resolved => {}
                        Some(_) => binding.has_conflicting_bases = true,
                    }
                }
            }

            for clause in &decl.constraints {
                let Some(ordinal) = symbol.type_parameters.iter().position(|p| *p == clause.target) else {
                    continue;
                };
                for ty in &clause.types {
                    if let Some(resolved) = self.resolve_type(at.tree, Some(at.declaration), ty) {
                        binding.constraints[ordinal].push(resolved);
                    }
                }
            }
        }

        if binding.base_type.is_none() {
            binding.base_type = self.implicit_base(symbol.kind);
        }
        if symbol.kind.is_record() || symbol.kind == DeclarationKind::Enum {
            let equatable = TypeRef::generic(self.well_known.iequatable_t, vec![self.self_type(id)]);
            if !binding.interfaces.contains(&equatable) {
                binding.interfaces.push(equatable);
            }
        }

        binding
    }

    fn implicit_base(&self, kind: DeclarationKind) -> Option<TypeRef> {
        match kind {
            DeclarationKind::Class | DeclarationKind::Record => Some(TypeRef::named(self.well_known.object)),
            DeclarationKind::Struct | DeclarationKind::RecordStruct => {
                Some(TypeRef::named(self.well_known.value_type))
            }
            DeclarationKind::Enum => Some(TypeRef::named(self.well_known.enum_)),
            DeclarationKind::Interface => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;

    fn compile(sources: &[(&str, &str)]) -> Compilation {
        let trees = sources
            .iter()
            .map(|(path, text)| parse_source(path, text).unwrap())
            .collect();
        Compilation::new(trees, &Config::default())
    }

    #[test]
    fn test_partial_fragments_merge() {
        let c = compile(&[
            ("A.cs", "namespace Shop; public partial record Money(decimal Amount);"),
            ("B.cs", "namespace Shop; public sealed partial record Money;"),
        ]);
        let id = c.lookup("Shop", "Money", 0).unwrap();
        let money = c.symbol(id);
        assert_eq!(money.declarations.len(), 2);
        assert!(money.is_sealed);
        assert_eq!(c.qualified_name(id), "Shop.Money");
    }

    #[test]
    fn test_binds_runtime_base_through_using() {
        let c = compile(&[(
            "Money.cs",
            r#"
using Cranks.SeedWork.Domain;
namespace Shop;
[ValueObject]
public partial record Money(decimal Amount) : ValueObject<Money>;
"#,
        )]);
        let id = c.lookup("Shop", "Money", 0).unwrap();
        let base = c.symbol(id).base_type.clone().unwrap();
        assert_eq!(c.full_name(&base), "Cranks.SeedWork.Domain.ValueObject<Shop.Money>");
        assert_eq!(c.symbol(id).attributes, vec![c.well_known().value_object_attribute]);

        let grand = c.base_type(&base).unwrap();
        assert_eq!(c.full_name(&grand), "Cranks.SeedWork.Domain.ValueObject");
    }

    #[test]
    fn test_unresolved_base_is_flagged() {
        let c = compile(&[("A.cs", "public partial record A(int X) : Missing<A>;")]);
        let id = c.lookup("", "A", 0).unwrap();
        assert!(c.symbol(id).has_unresolved_bases);
        assert_eq!(c.symbol(id).base_type, Some(TypeRef::named(c.well_known().object)));
    }

    #[test]
    fn test_second_base_class_is_a_conflict() {
        let c = compile(&[(
            "Money.cs",
            r#"
using Cranks.SeedWork.Domain;
namespace Shop;
public abstract record Base(decimal Amount);
public partial record Money(decimal Amount) : ValueObject<Money>, Base(Amount);
"#,
        )]);
        let id = c.lookup("Shop", "Money", 0).unwrap();
        let money = c.symbol(id);
        assert!(money.has_conflicting_bases);
        assert!(money.interfaces.iter().all(|i| c.full_name(i) != "Shop.Base"));
    }

    #[test]
    fn test_repeated_base_across_fragments_is_not_a_conflict() {
        let c = compile(&[
            ("A.cs", "namespace Shop; public record Base; public partial record Money : Base;"),
            ("B.cs", "namespace Shop; public partial record Money : Base;"),
        ]);
        let id = c.lookup("Shop", "Money", 0).unwrap();
        assert!(!c.symbol(id).has_conflicting_bases);
        assert_eq!(c.full_name(c.symbol(id).base_type.as_ref().unwrap()), "Shop.Base");
    }

    #[test]
    fn test_generated_base_lists_are_not_bound() {
        let c = compile(&[
            ("Money.cs", "namespace Shop; public partial record Money(decimal Amount);"),
            (
                "Shop.Money.IComparable.g.cs",
                "namespace Shop; partial record Money : System.IComparable<Shop.Money>, System.IComparable { }",
            ),
        ]);
        let id = c.lookup("Shop", "Money", 0).unwrap();
        let names: Vec<String> = c
            .all_interfaces(&c.self_type(id))
            .iter()
            .map(|i| c.full_name(i))
            .collect();
        assert_eq!(names, vec!["System.IEquatable<Shop.Money>".to_string()]);
        assert_eq!(c.symbol(id).declarations.len(), 2);
    }

    #[test]
    fn test_all_interfaces_of_int() {
        let c = compile(&[]);
        let int = TypeRef::named(c.lookup("System", "Int32", 0).unwrap());
        let names: Vec<String> = c.all_interfaces(&int).iter().map(|i| c.full_name(i)).collect();
        assert!(names.contains(&"System.IComparable".to_string()));
        assert!(names.contains(&"System.IComparable<System.Int32>".to_string()));
        assert!(names.contains(&"System.IEquatable<System.Int32>".to_string()));
    }

    #[test]
    fn test_records_are_equatable_to_themselves() {
        let c = compile(&[("Pair.cs", "namespace N; public record Pair<T>(T Left, T Right);")]);
        let id = c.lookup("N", "Pair", 1).unwrap();
        let names: Vec<String> = c
            .all_interfaces(&c.self_type(id))
            .iter()
            .map(|i| c.full_name(i))
            .collect();
        assert_eq!(names, vec!["System.IEquatable<N.Pair<T>>".to_string()]);
    }

    #[test]
    fn test_nested_lookup() {
        let c = compile(&[(
            "Outer.cs",
            "namespace N { public class Outer { public record Inner(int X); } }",
        )]);
        let outer = c.lookup("N", "Outer", 0).unwrap();
        let inner = c.lookup_nested(outer, "Inner", 0).unwrap();
        assert_eq!(c.qualified_name(inner), "N.Outer.Inner");
        assert_eq!(c.symbol(inner).containing_type, Some(outer));
    }
}
