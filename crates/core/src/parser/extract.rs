use tree_sitter::Node;

use super::SourceLanguage;
use crate::model::FunctionRecord;

const SCRIPT_FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "method_definition",
    "function",
    "function_expression",
    "arrow_function",
];

/// Declarator chains deeper than this are not followed.
const MAX_DECLARATOR_DEPTH: usize = 16;

/// Pre-order walk collecting one record per named function node, nested
/// functions included.
pub(super) fn functions(
    root: Node<'_>,
    source: &str,
    file_path: &str,
    language: SourceLanguage,
) -> Vec<FunctionRecord> {
    let mut records = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if is_function(node, language) {
            if let Some(name) = function_name(node, source, language) {
                let body = text(node, source);
                records.push(FunctionRecord::new(
                    name,
                    file_path,
                    node.start_position().row as u32 + 1,
                    node.end_position().row as u32 + 1,
                    body,
                    calls(node, source),
                ));
            }
        }
        push_children(node, &mut stack);
    }

    records
}

fn push_children<'t>(node: Node<'t>, stack: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    stack.extend(children.into_iter().rev());
}

fn text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn is_function(node: Node<'_>, language: SourceLanguage) -> bool {
    if !node.is_named() {
        return false;
    }
    if language.is_script() {
        SCRIPT_FUNCTION_KINDS.contains(&node.kind())
    } else {
        node.kind() == "function_definition"
    }
}

fn function_name(node: Node<'_>, source: &str, language: SourceLanguage) -> Option<String> {
    let name = match language {
        SourceLanguage::Python => node
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
            .map(|n| text(n, source)),
        SourceLanguage::C | SourceLanguage::Cpp => declarator_name(node, source),
        _ => script_function_name(node, source),
    }?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Follow `declarator` fields down to the identifier (through pointer and
/// function declarators); qualified C++ names yield their last segment.
fn declarator_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    let mut current = node.child_by_field_name("declarator")?;
    for _ in 0..MAX_DECLARATOR_DEPTH {
        match current.kind() {
            "identifier" | "field_identifier" | "destructor_name" | "operator_name" => {
                return Some(text(current, source));
            }
            "qualified_identifier" => current = current.child_by_field_name("name")?,
            _ => current = current.child_by_field_name("declarator")?,
        }
    }
    None
}

fn script_function_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => node
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
            .map(|n| text(n, source)),
        "method_definition" => node
            .child_by_field_name("name")
            .filter(|n| matches!(n.kind(), "property_identifier" | "identifier"))
            .map(|n| text(n, source)),
        _ => {
            if let Some(own) = node.child_by_field_name("name") {
                return Some(text(own, source));
            }
            binding_name(node.parent()?, source)
        }
    }
}

/// Name an anonymous function from what it is bound to.
fn binding_name<'s>(parent: Node<'_>, source: &'s str) -> Option<&'s str> {
    match parent.kind() {
        "variable_declarator" => parent
            .child_by_field_name("name")
            .filter(|n| n.kind() == "identifier")
            .map(|n| text(n, source)),
        "assignment_expression" => {
            let left = parent.child_by_field_name("left")?;
            match left.kind() {
                "identifier" => Some(text(left, source)),
                "member_expression" => left
                    .child_by_field_name("property")
                    .filter(|p| p.kind() == "property_identifier")
                    .map(|p| text(p, source)),
                _ => None,
            }
        }
        "field_definition" | "public_field_definition" | "property_definition" => parent
            .child_by_field_name("property")
            .or_else(|| parent.child_by_field_name("name"))
            .filter(|n| matches!(n.kind(), "property_identifier" | "identifier"))
            .map(|n| text(n, source)),
        _ => None,
    }
}

/// Called names inside `node`, in source order.
fn calls(node: Node<'_>, source: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut stack = vec![node];

    while let Some(current) = stack.pop() {
        let callee = match current.kind() {
            "call" => current
                .child_by_field_name("function")
                .filter(|f| f.kind() == "identifier")
                .map(|f| text(f, source)),
            "call_expression" => {
                current.child_by_field_name("function").and_then(|f| call_name(f, source))
            }
            "new_expression" => current
                .child_by_field_name("constructor")
                .and_then(|c| call_name(c, source)),
            _ => None,
        };
        if let Some(name) = callee.filter(|n| !n.is_empty()) {
            found.push(name.to_string());
        }
        push_children(current, &mut stack);
    }

    found
}

fn call_name<'s>(node: Node<'_>, source: &'s str) -> Option<&'s str> {
    match node.kind() {
        "identifier" => Some(text(node, source)),
        "member_expression" => node
            .child_by_field_name("property")
            .filter(|p| p.kind() == "property_identifier")
            .map(|p| text(p, source)),
        "field_expression" => node
            .child_by_field_name("field")
            .filter(|f| f.kind() == "field_identifier")
            .map(|f| text(f, source)),
        _ => None,
    }
}
