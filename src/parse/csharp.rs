//! C# parser - collects type declarations from a tree-sitter tree

use crate::error::Result;
use crate::syntax::*;
use tree_sitter::Node;

use super::{last_named_child, node_span, node_text, parse_tree, source_hash};

const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "record_declaration",
    "record_struct_declaration",
    "enum_declaration",
];

const MODIFIER_KEYWORDS: &[&str] = &[
    "abstract", "file", "internal", "new", "partial", "private", "protected", "public", "readonly",
    "ref", "sealed", "static", "unsafe",
];

const TYPE_NODE_KINDS: &[&str] = &[
    "predefined_type",
    "identifier",
    "generic_name",
    "qualified_name",
    "alias_qualified_name",
    "nullable_type",
    "array_type",
    "tuple_type",
];

pub fn parse_csharp(path: &str, source: &str) -> Result<SyntaxTree> {
    let tree = parse_tree(source)?;

    let mut collector = Collector {
        source,
        usings: Vec::new(),
        declarations: Vec::new(),
    };
    collector.visit_container(tree.root_node(), None, None);

    Ok(SyntaxTree {
        path: path.to_string(),
        source_hash: source_hash(source),
        is_generated: false,
        usings: collector.usings,
        declarations: collector.declarations,
    })
}

struct Collector<'s> {
    source: &'s str,
    usings: Vec<UsingDirective>,
    declarations: Vec<TypeDeclaration>,
}

impl<'s> Collector<'s> {
    fn text(&self, node: Node) -> &'s str {
        node_text(node, self.source)
    }

    /// Compilation unit, namespace body or preprocessor region
    fn visit_container(&mut self, node: Node, namespace: Option<String>, parent: Option<usize>) {
        // A file-scoped namespace applies to every sibling that follows it
        let mut current_ns = namespace.clone();

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "using_directive" if parent.is_none() => {
                    if let Some(using) = self.parse_using(child) {
                        self.usings.push(using);
                    }
                }
                "namespace_declaration" => {
                    let ns = self.qualify_namespace(namespace.as_deref(), child);
                    if let Some(body) = child
                        .child_by_field_name("body")
                        .or_else(|| first_child_of_kind(child, "declaration_list"))
                    {
                        self.visit_container(body, Some(ns), None);
                    }
                }
                "file_scoped_namespace_declaration" => {
                    current_ns = Some(self.qualify_namespace(namespace.as_deref(), child));
                    self.visit_container(child, current_ns.clone(), None);
                }
                "declaration_list" | "preproc_if" | "preproc_else" | "preproc_elif" => {
                    self.visit_container(child, current_ns.clone(), parent);
                }
                kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                    self.push_declaration(child, current_ns.clone(), parent);
                }
                _ => {}
            }
        }
    }

    fn qualify_namespace(&self, outer: Option<&str>, node: Node) -> String {
        let name = node
            .child_by_field_name("name")
            .map(|n| strip_whitespace(self.text(n)))
            .unwrap_or_default();
        match outer {
            Some(outer) => format!("{}.{}", outer, name),
            None => name,
        }
    }

    fn parse_using(&self, node: Node) -> Option<UsingDirective> {
        let mut is_static = false;
        let mut has_alias = false;
        let mut names = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "=" => has_alias = true,
                "identifier" | "qualified_name" | "generic_name" | "alias_qualified_name" => {
                    names.push(strip_whitespace(self.text(child)))
                }
                _ if child.is_named() && names.len() == 1 && has_alias => {
                    names.push(strip_whitespace(self.text(child)))
                }
                _ => {}
            }
        }

        if has_alias && names.len() >= 2 {
            Some(UsingDirective {
                target: names[1].clone(),
                alias: Some(names[0].clone()),
                is_static,
            })
        } else {
            names.pop().map(|target| UsingDirective {
                target,
                alias: None,
                is_static,
            })
        }
    }

    fn push_declaration(&mut self, node: Node, namespace: Option<String>, parent: Option<usize>) {
        let kind = match node.kind() {
            "class_declaration" => DeclarationKind::Class,
            "struct_declaration" => DeclarationKind::Struct,
            "interface_declaration" => DeclarationKind::Interface,
            "enum_declaration" => DeclarationKind::Enum,
            "record_struct_declaration" => DeclarationKind::RecordStruct,
            _ if first_child_of_kind(node, "struct").is_some() => DeclarationKind::RecordStruct,
            _ => DeclarationKind::Record,
        };

        let name_node = node
            .child_by_field_name("name")
            .or_else(|| first_child_of_kind(node, "identifier"));
        let (name, identifier_span) = match name_node {
            Some(n) => (self.text(n).to_string(), node_span(n)),
            // Mid-edit declaration without a name
            None => return,
        };

        let mut declaration = TypeDeclaration {
            kind,
            name,
            span: node_span(node),
            identifier_span,
            keyword_span: identifier_span,
            namespace: namespace.clone(),
            parent,
            attributes: Vec::new(),
            modifiers: Vec::new(),
            type_parameters: Vec::new(),
            type_parameter_list: None,
            type_parameter_list_span: None,
            parameter_list: None,
            parameter_list_span: None,
            base_list: None,
            constraints: Vec::new(),
            fields: Vec::new(),
        };

        let mut keyword_seen = false;
        let mut body = None;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "attribute_list" => self.parse_attributes(child, &mut declaration.attributes),
                "modifier" => declaration.modifiers.push(Modifier {
                    keyword: self.text(child).trim().to_string(),
                    span: node_span(child),
                }),
                kw if !child.is_named() && !keyword_seen && MODIFIER_KEYWORDS.contains(&kw) => {
                    declaration.modifiers.push(Modifier {
                        keyword: kw.to_string(),
                        span: node_span(child),
                    })
                }
                "class" | "struct" | "interface" | "record" | "enum" if !keyword_seen => {
                    keyword_seen = true;
                    declaration.keyword_span = node_span(child);
                }
                "type_parameter_list" => {
                    declaration.type_parameter_list = Some(strip_whitespace(self.text(child)));
                    declaration.type_parameter_list_span = Some(node_span(child));
                    declaration.type_parameters = self.parse_type_parameters(child);
                }
                "parameter_list" => {
                    declaration.parameter_list = Some(self.parse_parameters(child));
                    declaration.parameter_list_span = Some(node_span(child));
                }
                "base_list" => declaration.base_list = Some(self.parse_base_list(child)),
                "type_parameter_constraints_clause" => {
                    if let Some(clause) = self.parse_constraint_clause(child) {
                        declaration.constraints.push(clause);
                    }
                }
                "declaration_list" => body = Some(child),
                _ => {}
            }
        }

        let index = self.declarations.len();
        self.declarations.push(declaration);

        if let Some(body) = body {
            self.visit_body(body, namespace, index);
        }
    }

    fn visit_body(&mut self, body: Node, namespace: Option<String>, index: usize) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "field_declaration" => {
                    let fields = self.parse_fields(member);
                    self.declarations[index].fields.extend(fields);
                }
                kind if TYPE_DECLARATION_KINDS.contains(&kind) => {
                    self.push_declaration(member, namespace.clone(), Some(index));
                }
                _ => {}
            }
        }
    }

    fn parse_attributes(&self, list: Node, out: &mut Vec<AttributeSyntax>) {
        let mut cursor = list.walk();
        for attribute in list.named_children(&mut cursor) {
            if attribute.kind() != "attribute" {
                continue;
            }
            let name = attribute
                .child_by_field_name("name")
                .or_else(|| attribute.named_child(0));
            if let Some(name) = name {
                out.push(AttributeSyntax {
                    name: self.parse_type(name),
                    span: node_span(attribute),
                });
            }
        }
    }

    fn parse_type_parameters(&self, list: Node) -> Vec<String> {
        let mut names = Vec::new();
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => names.push(self.text(child).to_string()),
                "type_parameter" => {
                    let name = child
                        .child_by_field_name("name")
                        .or_else(|| first_child_of_kind(child, "identifier"));
                    if let Some(name) = name {
                        names.push(self.text(name).to_string());
                    }
                }
                _ => {}
            }
        }
        names
    }

    fn parse_parameters(&self, list: Node) -> Vec<ParameterSyntax> {
        let mut parameters = Vec::new();
        let mut cursor = list.walk();
        for parameter in list.named_children(&mut cursor) {
            if parameter.kind() != "parameter" {
                continue;
            }

            let mut ty = parameter.child_by_field_name("type");
            let mut name = parameter.child_by_field_name("name");

            if ty.is_none() || name.is_none() {
                let mut inner = parameter.walk();
                let parts: Vec<Node> = parameter
                    .named_children(&mut inner)
                    .filter(|c| TYPE_NODE_KINDS.contains(&c.kind()))
                    .collect();
                if parts.len() >= 2 {
                    ty = ty.or(Some(parts[0]));
                    name = name.or(Some(parts[parts.len() - 1]));
                } else if let Some(only) = parts.first() {
                    name = name.or(Some(*only));
                }
            }

            if let Some(name) = name {
                parameters.push(ParameterSyntax {
                    name: self.text(name).to_string(),
                    ty: ty.map(|t| self.parse_type(t)),
                    span: node_span(parameter),
                });
            }
        }
        parameters
    }

    fn parse_base_list(&self, list: Node) -> BaseList {
        let mut entries: Vec<BaseEntry> = Vec::new();
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            match child.kind() {
                "primary_constructor_base_type" => {
                    let ty = child
                        .child_by_field_name("type")
                        .or_else(|| child.named_child(0));
                    let arguments = first_child_of_kind(child, "argument_list")
                        .map(|a| self.text(a).to_string());
                    if let Some(ty) = ty {
                        entries.push(BaseEntry {
                            ty: self.parse_type(ty),
                            span: node_span(child),
                            arguments,
                        });
                    }
                }
                // Some grammar revisions attach the base call arguments as a sibling
                "argument_list" => {
                    if let Some(last) = entries.last_mut() {
                        last.arguments = Some(self.text(child).to_string());
                        last.span.end_byte = child.end_byte();
                        last.span.end_line = child.end_position().row + 1;
                        last.span.end_col = child.end_position().column;
                    }
                }
                kind if TYPE_NODE_KINDS.contains(&kind) => entries.push(BaseEntry {
                    ty: self.parse_type(child),
                    span: node_span(child),
                    arguments: None,
                }),
                _ => {}
            }
        }

        BaseList {
            span: node_span(list),
            entries,
        }
    }

    fn parse_constraint_clause(&self, clause: Node) -> Option<ConstraintClause> {
        let target = clause
            .child_by_field_name("target")
            .or_else(|| first_child_of_kind(clause, "identifier"))?;
        let mut types = Vec::new();

        let mut cursor = clause.walk();
        for child in clause.named_children(&mut cursor) {
            if child.id() == target.id() {
                continue;
            }
            if child.kind() == "type_parameter_constraint" {
                let mut inner = child.walk();
                for constraint in child.named_children(&mut inner) {
                    if TYPE_NODE_KINDS.contains(&constraint.kind()) {
                        types.push(self.parse_type(constraint));
                    }
                }
            } else if TYPE_NODE_KINDS.contains(&child.kind()) {
                types.push(self.parse_type(child));
            }
        }

        Some(ConstraintClause {
            target: self.text(target).to_string(),
            types,
        })
    }

    fn parse_fields(&self, field: Node) -> Vec<FieldSyntax> {
        let mut modifiers = Vec::new();
        let mut declaration = None;

        let mut cursor = field.walk();
        for child in field.children(&mut cursor) {
            match child.kind() {
                "modifier" => modifiers.push(self.text(child).trim().to_string()),
                kw if !child.is_named() && MODIFIER_KEYWORDS.contains(&kw) => {
                    modifiers.push(kw.to_string())
                }
                "variable_declaration" => declaration = Some(child),
                _ => {}
            }
        }

        let Some(declaration) = declaration else {
            return Vec::new();
        };
        let Some(ty) = declaration
            .child_by_field_name("type")
            .or_else(|| declaration.named_child(0))
        else {
            return Vec::new();
        };
        let ty = self.parse_type(ty);

        let mut fields = Vec::new();
        let mut cursor = declaration.walk();
        for declarator in declaration.named_children(&mut cursor) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let name = declarator
                .child_by_field_name("name")
                .or_else(|| first_child_of_kind(declarator, "identifier"));
            if let Some(name) = name {
                fields.push(FieldSyntax {
                    name: self.text(name).to_string(),
                    ty: ty.clone(),
                    modifiers: modifiers.clone(),
                });
            }
        }
        fields
    }

    fn parse_type(&self, node: Node) -> TypeSyntax {
        match node.kind() {
            "predefined_type" => TypeSyntax::Predefined(self.text(node).to_string()),
            "identifier" => TypeSyntax::simple(self.text(node)),
            "generic_name" => TypeSyntax::Name {
                global: false,
                segments: vec![self.parse_generic_segment(node)],
            },
            "qualified_name" => {
                let qualifier = node
                    .child_by_field_name("qualifier")
                    .or_else(|| node.named_child(0));
                let name = node
                    .child_by_field_name("name")
                    .or_else(|| last_named_child(node));
                match (qualifier.map(|q| self.parse_type(q)), name) {
                    (Some(TypeSyntax::Name { global, mut segments }), Some(name)) => {
                        segments.extend(self.name_segments(name));
                        TypeSyntax::Name { global, segments }
                    }
                    _ => TypeSyntax::Other(strip_whitespace(self.text(node))),
                }
            }
            "alias_qualified_name" => {
                let alias = node
                    .child_by_field_name("alias")
                    .or_else(|| node.named_child(0))
                    .map(|a| self.text(a));
                let name = node
                    .child_by_field_name("name")
                    .or_else(|| last_named_child(node));
                match (alias, name) {
                    (Some("global"), Some(name)) => TypeSyntax::Name {
                        global: true,
                        segments: self.name_segments(name),
                    },
                    _ => TypeSyntax::Other(strip_whitespace(self.text(node))),
                }
            }
            "nullable_type" => match node
                .child_by_field_name("type")
                .or_else(|| node.named_child(0))
            {
                Some(inner) => TypeSyntax::Nullable(Box::new(self.parse_type(inner))),
                None => TypeSyntax::Other(self.text(node).to_string()),
            },
            "array_type" => match node
                .child_by_field_name("type")
                .or_else(|| node.named_child(0))
            {
                Some(inner) => TypeSyntax::Array(Box::new(self.parse_type(inner))),
                None => TypeSyntax::Other(self.text(node).to_string()),
            },
            "tuple_type" => {
                let mut elements = Vec::new();
                let mut cursor = node.walk();
                for element in node.named_children(&mut cursor) {
                    let ty = element
                        .child_by_field_name("type")
                        .or_else(|| element.named_child(0));
                    if let Some(ty) = ty {
                        elements.push(self.parse_type(ty));
                    }
                }
                TypeSyntax::Tuple(elements)
            }
            _ => TypeSyntax::Other(strip_whitespace(self.text(node))),
        }
    }

    fn name_segments(&self, node: Node) -> Vec<NameSegment> {
        match node.kind() {
            "generic_name" => vec![self.parse_generic_segment(node)],
            _ => match self.parse_type(node) {
                TypeSyntax::Name { segments, .. } => segments,
                other => vec![NameSegment {
                    name: other.to_string(),
                    args: Vec::new(),
                }],
            },
        }
    }

    fn parse_generic_segment(&self, node: Node) -> NameSegment {
        let name = first_child_of_kind(node, "identifier")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let mut args = Vec::new();
        if let Some(list) = first_child_of_kind(node, "type_argument_list") {
            let mut cursor = list.walk();
            for arg in list.named_children(&mut cursor) {
                args.push(self.parse_type(arg));
            }
        }
        NameSegment { name, args }
    }
}

fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
