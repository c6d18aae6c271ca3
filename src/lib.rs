// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # SeedWork
//!
//! Convention checks, automated fixes and member synthesis for C# domain
//! types: **value objects** and **smart enums**.
//!
//! A declaration takes part when it carries a marker attribute
//! (`[ValueObject]` or `[SmartEnum]`). For every such declaration SeedWork:
//!
//! - **Checks** it against the pattern's shape (partial, record, correct
//!   generic base, not nested, single fragment, sealed, equatable
//!   parameters) and reports [`Violation`]s with stable rule ids
//! - **Fixes** the mechanical violations with minimal text edits
//! - **Synthesizes** partial fragments: conversion operators, ordering,
//!   equality delegates and an instance registry with keyed lookup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use seedwork::{CancellationToken, Config, Pipeline, SourceFile};
//!
//! let sources = vec![SourceFile::new("Money.cs", r#"
//!     using Cranks.SeedWork.Domain;
//!     namespace Shop;
//!
//!     [ValueObject]
//!     public partial record Money(decimal Amount) : ValueObject<Money>;
//! "#)];
//!
//! let result = Pipeline::new(Config::default()).run(&sources, &CancellationToken::new())?;
//! for violation in result.violations() {
//!     println!("{}", violation);
//! }
//! for fragment in result.fragments() {
//!     println!("// {}\n{}", fragment.slot_name, fragment.text);
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! sources ──► parse ──► SyntaxTree ──► symbols::Compilation
//!                                            │
//!                                  facts + shape::extract_shape
//!                                            │
//!                                     DeclarationShape
//!                                  ┌─────────┴─────────┐
//!                            check::check_shape   synth::plan ──► templates
//!                                  │                   │
//!                              Violation        GeneratedFragment
//!                                  │
//!                          fix::compute_fix ──► TextEdit
//! ```
//!
//! Every step after binding is a pure function of the compilation, so
//! declarations are processed in parallel and results never depend on
//! processing order.

// Front end
pub mod config;
pub mod error;
pub mod parse;
pub mod symbols;
pub mod syntax;

// Analysis
pub mod check;
pub mod facts;
pub mod fix;
pub mod rules;
pub mod shape;

// Synthesis
pub mod synth;
pub mod templates;

// Driving a pass
pub mod manifest;
pub mod pipeline;
pub mod util;

// Re-exports
pub use check::{check_compilation, check_shape, has_errors, Violation};
pub use config::Config;
pub use error::{Error, Result};
pub use facts::BaseClassification;
pub use fix::{compute_fix, fix_source, Fix, FixApplicationResult, TextEdit};
pub use manifest::{write_fragments, Manifest, WriteSummary};
pub use parse::{parse_source, to_sexp, SourceFile};
pub use pipeline::{CancellationToken, DeclarationReport, GenerationCache, PassResult, Pipeline};
pub use rules::{CandidateKind, Rule, Severity, CATALOG};
pub use shape::{extract_shape, DeclarationShape, ParameterShape};
pub use symbols::Compilation;
pub use synth::{synthesize, FragmentPlan, GeneratedFragment};
pub use syntax::{Location, Span, SyntaxTree};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
