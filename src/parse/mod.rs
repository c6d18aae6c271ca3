//! Code parsing via tree-sitter
//!
//! Parses C# source into the owned [`SyntaxTree`] model.

mod csharp;

use crate::error::{Error, Result};
use crate::syntax::{Span, SyntaxTree};
use sha2::{Digest, Sha256};
use tree_sitter::{Node, Parser, Tree};

pub use csharp::parse_csharp;

/// Marker that generated fragments start with
pub const AUTO_GENERATED_HEADER: &str = "// <auto-generated";

/// A source file handed to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Generated code is never analyzed, only bound
    pub fn is_generated(&self) -> bool {
        self.path.ends_with(".g.cs") || self.text.trim_start().starts_with(AUTO_GENERATED_HEADER)
    }

    pub fn parse(&self) -> Result<SyntaxTree> {
        parse_csharp(&self.path, &self.text).map(|mut tree| {
            tree.is_generated = self.is_generated();
            tree
        })
    }
}

/// Parse one file, flagging generated code by path or header
pub fn parse_source(path: &str, text: &str) -> Result<SyntaxTree> {
    SourceFile::new(path, text).parse()
}

/// Run tree-sitter over C# source
pub(crate) fn parse_tree(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
        .map_err(|e| Error::CodeParse(format!("Failed to set language: {}", e)))?;

    parser
        .parse(source, None)
        .ok_or_else(|| Error::CodeParse("Failed to parse source".into()))
}

/// Get raw tree-sitter S-expression for source code
///
/// Useful for debugging what tree-sitter sees vs what gets extracted.
pub fn to_sexp(source: &str) -> Result<String> {
    let tree = parse_tree(source)?;
    Ok(tree.root_node().to_sexp())
}

pub(crate) fn source_hash(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("sha256:{}", hex::encode(&hasher.finalize()[..8]))
}

pub(crate) fn node_span(node: Node) -> Span {
    Span {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        start_line: node.start_position().row + 1,
        start_col: node.start_position().column,
        end_line: node.end_position().row + 1,
        end_col: node.end_position().column,
    }
}

pub(crate) fn last_named_child(node: Node) -> Option<Node> {
    let count = u32::try_from(node.named_child_count()).ok()?;
    node.named_child(count.checked_sub(1)?)
}

pub(crate) fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}
