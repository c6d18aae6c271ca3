//! Declaration shape
//!
//! The unit both the checker and the synthesizer work on. A shape is built
//! fresh from the compilation on every pass and carries no identity beyond
//! the values in it.

use crate::config::Config;
use crate::facts::{self, BaseClassification};
use crate::rules::CandidateKind;
use crate::symbols::{Compilation, DeclarationRef, TypeId};
use crate::syntax::{DeclarationKind, Location};
use serde::{Deserialize, Serialize};

/// One primary-constructor parameter with its capabilities
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterShape {
    pub name: String,
    /// Fully qualified, e.g. `System.Int32`
    pub type_full_name: String,
    pub is_equatable: bool,
    pub is_comparable: bool,
    pub is_comparable_generic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationShape {
    pub kind: CandidateKind,
    pub name: String,
    /// `None` for the global namespace
    pub namespace: Option<String>,
    /// `Ns.Name<T>` as used in generated code
    pub full_name: String,
    /// Syntax kind of the primary fragment
    pub declaration_kind: DeclarationKind,
    pub is_partial: bool,
    pub is_sealed: bool,
    pub is_abstract: bool,
    pub is_nested: bool,
    /// User-written fragments only; generated ones are not counted
    pub declaration_syntax_count: usize,
    /// `None` when the base list could not be bound
    pub base: Option<BaseClassification>,
    /// `None` when a parameter type could not be bound
    pub parameters: Option<Vec<ParameterShape>>,
    pub type_parameters: Vec<String>,
    /// Verbatim `<...>`, empty when not generic
    pub type_parameter_list: String,
    /// Smart enums: singleton fields in declaration order
    pub enumerated_instances: Vec<String>,
    /// Smart enums: fully qualified key type
    pub key_type: Option<String>,
    /// Identifier of the primary fragment
    pub location: Location,
}

impl DeclarationShape {
    pub fn is_global_namespace(&self) -> bool {
        self.namespace.is_none()
    }

    pub fn is_record(&self) -> bool {
        self.declaration_kind.is_record()
    }

    pub fn is_type_declaration(&self) -> bool {
        self.declaration_kind.is_type_declaration()
    }

    pub fn is_unary(&self) -> bool {
        self.parameters.as_ref().is_some_and(|p| p.len() == 1)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_parameters.is_empty()
    }

    /// The single parameter of a unary shape
    pub fn unary_parameter(&self) -> Option<&ParameterShape> {
        match self.parameters.as_deref() {
            Some([only]) => Some(only),
            _ => None,
        }
    }

    /// `Ns.Name` without type arguments, used to identify the owner
    pub fn owner(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}.{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// A marked symbol found in source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub id: TypeId,
    pub kind: CandidateKind,
}

/// Every marked source symbol, in order of first declaration
pub fn discover(compilation: &Compilation, config: &Config) -> Vec<Candidate> {
    compilation
        .source_symbols()
        .flat_map(|id| {
            facts::marked_kinds(compilation, id, config)
                .into_iter()
                .map(move |kind| Candidate { id, kind })
        })
        .collect()
}

/// Fragments written by the user, in tree order
pub fn user_fragments(compilation: &Compilation, id: TypeId) -> Vec<DeclarationRef> {
    compilation
        .symbol(id)
        .declarations
        .iter()
        .copied()
        .filter(|at| !compilation.tree(at.tree).is_generated)
        .collect()
}

/// Build the shape of a candidate
///
/// `None` when the symbol has no user-written fragment.
pub fn extract_shape(compilation: &Compilation, candidate: Candidate, config: &Config) -> Option<DeclarationShape> {
    let Candidate { id, kind } = candidate;
    let fragments = user_fragments(compilation, id);
    let primary = *fragments.first()?;
    let decl = compilation.declaration(primary);
    let symbol = compilation.symbol(id);

    let parameters = facts::extract_constructor_parameters(compilation, primary).map(|params| {
        params
            .into_iter()
            .map(|(name, ty)| ParameterShape {
                name,
                type_full_name: compilation.full_name(&ty),
                is_equatable: facts::is_equatable(compilation, &ty),
                is_comparable: facts::is_comparable(compilation, &ty),
                is_comparable_generic: facts::is_comparable_generic(compilation, &ty),
            })
            .collect()
    });

    let (enumerated_instances, key_type) = match kind {
        CandidateKind::SmartEnum => (
            facts::enumerated_instances(compilation, id, &fragments),
            facts::smart_enum_key_type(compilation, id, config).map(|key| compilation.full_name(&key)),
        ),
        CandidateKind::ValueObject => (Vec::new(), None),
    };

    Some(DeclarationShape {
        kind,
        name: symbol.name.clone(),
        namespace: symbol.namespace.clone(),
        full_name: compilation.full_name(&compilation.self_type(id)),
        declaration_kind: decl.kind,
        is_partial: facts::is_partial_declaration(decl),
        is_sealed: symbol.is_sealed,
        is_abstract: symbol.is_abstract,
        is_nested: facts::is_nested_declaration(decl),
        declaration_syntax_count: fragments.len(),
        base: facts::classify_base(compilation, id, kind, config),
        parameters,
        type_parameters: symbol.type_parameters.clone(),
        type_parameter_list: decl.type_parameter_list.clone().unwrap_or_default(),
        enumerated_instances,
        key_type,
        location: Location {
            path: compilation.tree(primary.tree).path.clone(),
            span: decl.identifier_span,
        },
    })
}
