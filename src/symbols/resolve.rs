//! Name lookup
//!
//! Order for a simple name: type parameters of the enclosing declarations,
//! the enclosing types and their nested types, the namespace chain, `using`
//! aliases and namespaces, then the global namespace.

use super::{Compilation, DeclarationRef, TypeId, TypeRef};
use crate::syntax::{NameSegment, TypeSyntax};

pub(super) struct Scope<'c> {
    compilation: &'c Compilation,
    tree: usize,
    /// Innermost first
    declarations: Vec<usize>,
    namespace: Option<String>,
}

impl<'c> Scope<'c> {
    pub(super) fn new(compilation: &'c Compilation, tree: usize, at: Option<usize>) -> Self {
        let syntax = compilation.tree(tree);
        let mut declarations = Vec::new();
        let mut current = at;
        while let Some(index) = current {
            declarations.push(index);
            current = syntax.declarations[index].parent;
        }
        let namespace = at.and_then(|i| syntax.declarations[i].namespace.clone());

        Self {
            compilation,
            tree,
            declarations,
            namespace,
        }
    }

    pub(super) fn resolve(&self, ty: &TypeSyntax) -> Option<TypeRef> {
        match ty {
            TypeSyntax::Predefined(keyword) => self.predefined(keyword),
            TypeSyntax::Name { global, segments } => self.resolve_name(*global, segments),
            TypeSyntax::Nullable(inner) => self.resolve(inner).map(|t| TypeRef::Nullable(Box::new(t))),
            TypeSyntax::Array(inner) => self.resolve(inner).map(|t| TypeRef::Array(Box::new(t))),
            TypeSyntax::Tuple(elements) => elements
                .iter()
                .map(|e| self.resolve(e))
                .collect::<Option<Vec<_>>>()
                .map(TypeRef::Tuple),
            TypeSyntax::Other(_) => None,
        }
    }

    pub(super) fn resolve_attribute(&self, name: &TypeSyntax) -> Option<TypeId> {
        let TypeSyntax::Name { global, segments } = name else {
            return None;
        };
        let is_attribute = |t: &TypeRef| t.id().is_some_and(|id| self.is_attribute_type(id));

        if let Some(found) = self.resolve_name(*global, segments).filter(is_attribute) {
            return found.id();
        }

        let (last, init) = segments.split_last()?;
        if last.name.ends_with("Attribute") {
            return None;
        }
        let mut suffixed = init.to_vec();
        suffixed.push(NameSegment {
            name: format!("{}Attribute", last.name),
            args: last.args.clone(),
        });
        self.resolve_name(*global, &suffixed)
            .filter(is_attribute)
            .and_then(|t| t.id())
    }

    fn is_attribute_type(&self, id: TypeId) -> bool {
        let attribute = self.compilation.well_known().attribute;
        let mut current = Some(TypeRef::named(id));
        for _ in 0..super::MAX_HIERARCHY_DEPTH {
            match current {
                Some(TypeRef::Named { id, .. }) if id == attribute => return true,
                Some(ty) => current = self.compilation.base_type(&ty),
                None => return false,
            }
        }
        false
    }

    fn predefined(&self, keyword: &str) -> Option<TypeRef> {
        let name = match keyword {
            "bool" => "Boolean",
            "byte" => "Byte",
            "sbyte" => "SByte",
            "char" => "Char",
            "short" => "Int16",
            "ushort" => "UInt16",
            "int" => "Int32",
            "uint" => "UInt32",
            "long" => "Int64",
            "ulong" => "UInt64",
            "nint" => "IntPtr",
            "nuint" => "UIntPtr",
            "float" => "Single",
            "double" => "Double",
            "decimal" => "Decimal",
            "string" => "String",
            "object" | "dynamic" => "Object",
            _ => return None,
        };
        self.compilation.lookup("System", name, 0).map(TypeRef::named)
    }

    fn resolve_args(&self, segment: &NameSegment) -> Option<Vec<TypeRef>> {
        segment.args.iter().map(|a| self.resolve(a)).collect()
    }

    fn resolve_name(&self, global: bool, segments: &[NameSegment]) -> Option<TypeRef> {
        let (first, rest) = segments.split_first()?;

        let head = if global {
            self.compilation
                .lookup("", &first.name, first.args.len())
                .map(|id| (id, first))
        } else {
            match self.lookup_simple(first) {
                Some(TypeRef::Parameter { owner, ordinal }) if rest.is_empty() => {
                    return Some(TypeRef::Parameter { owner, ordinal })
                }
                Some(TypeRef::Named { id, .. }) => Some((id, first)),
                _ => None,
            }
        };

        if let Some((id, segment)) = head {
            let head = TypeRef::generic(id, self.resolve_args(segment)?);
            return self.resolve_nested(head, rest);
        }

        // Some prefix of the name is a namespace
        for split in (1..segments.len()).rev() {
            let (prefix, tail) = segments.split_at(split);
            if prefix.iter().any(|s| !s.args.is_empty()) {
                continue;
            }
            let written: Vec<&str> = prefix.iter().map(|s| s.name.as_str()).collect();
            let written = written.join(".");

            for namespace in self.namespace_candidates(global, &written) {
                let (target, nested) = (&tail[0], &tail[1..]);
                if let Some(id) = self
                    .compilation
                    .lookup(&namespace, &target.name, target.args.len())
                {
                    let head = TypeRef::generic(id, self.resolve_args(target)?);
                    return self.resolve_nested(head, nested);
                }
            }
        }
        None
    }

    fn resolve_nested(&self, mut current: TypeRef, rest: &[NameSegment]) -> Option<TypeRef> {
        for segment in rest {
            let container = current.id()?;
            let id = self
                .compilation
                .lookup_nested(container, &segment.name, segment.args.len())?;
            current = TypeRef::generic(id, self.resolve_args(segment)?);
        }
        Some(current)
    }

    /// Namespaces a written prefix may refer to, most specific first
    fn namespace_candidates(&self, global: bool, written: &str) -> Vec<String> {
        if global {
            return vec![written.to_string()];
        }

        let mut candidates = Vec::new();
        for outer in self.namespace_chain() {
            candidates.push(format!("{}.{}", outer, written));
        }

        let (head, tail) = match written.split_once('.') {
            Some((head, tail)) => (head, Some(tail)),
            None => (written, None),
        };
        for using in &self.compilation.tree(self.tree).usings {
            if using.alias.as_deref() == Some(head) {
                candidates.push(match tail {
                    Some(tail) => format!("{}.{}", using.target, tail),
                    None => using.target.clone(),
                });
            }
        }

        candidates.push(written.to_string());
        candidates
    }

    /// `A.B.C` -> `A.B.C`, `A.B`, `A`
    fn namespace_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.namespace.as_deref();
        while let Some(ns) = current {
            chain.push(ns.to_string());
            current = ns.rsplit_once('.').map(|(outer, _)| outer);
        }
        chain
    }

    fn lookup_simple(&self, segment: &NameSegment) -> Option<TypeRef> {
        let name = segment.name.as_str();
        let arity = segment.args.len();
        let syntax = self.compilation.tree(self.tree);

        let enclosing: Vec<TypeId> = self
            .declarations
            .iter()
            .filter_map(|&declaration| {
                self.compilation.symbol_of(DeclarationRef {
                    tree: self.tree,
                    declaration,
                })
            })
            .collect();

        if arity == 0 {
            for &owner in &enclosing {
                let params = &self.compilation.symbol(owner).type_parameters;
                if let Some(ordinal) = params.iter().position(|p| p == name) {
                    return Some(TypeRef::Parameter { owner, ordinal });
                }
            }
        }

        for &owner in &enclosing {
            if let Some(id) = self.compilation.lookup_nested(owner, name, arity) {
                return Some(TypeRef::named(id));
            }
            let symbol = self.compilation.symbol(owner);
            if symbol.name == name && symbol.arity() == arity {
                return Some(TypeRef::named(owner));
            }
        }

        for namespace in self.namespace_chain() {
            if let Some(id) = self.compilation.lookup(&namespace, name, arity) {
                return Some(TypeRef::named(id));
            }
        }

        for using in &syntax.usings {
            if using.alias.as_deref() == Some(name) && arity == 0 {
                let segments: Vec<NameSegment> = using
                    .target
                    .split('.')
                    .map(|part| NameSegment {
                        name: part.to_string(),
                        args: Vec::new(),
                    })
                    .collect();
                if let Some(found) = self.resolve_name(true, &segments) {
                    return Some(found);
                }
            }
        }

        for using in syntax.usings.iter().filter(|u| u.alias.is_none() && !u.is_static) {
            if let Some(id) = self.compilation.lookup(&using.target, name, arity) {
                return Some(TypeRef::named(id));
            }
        }

        self.compilation.lookup("", name, arity).map(TypeRef::named)
    }
}
