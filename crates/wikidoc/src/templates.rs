use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::WikidocError;
use crate::parse_tree::{self, Element, Node};

/// One top-level template call found in a revision, e.g. `{{AFC submission|d|nn}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInvocation {
    pub target: String,
    /// Keyed by parameter name, or by positional index for unnamed parameters.
    pub params: IndexMap<String, String>,
}

impl TemplateInvocation {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Compares targets the way wiki titles compare: underscores as spaces, first letter
    /// case-insensitive.
    pub fn is(&self, name: &str) -> bool {
        fold_target(&self.target) == fold_target(name)
    }
}

fn fold_target(name: &str) -> String {
    crate::title::uppercase_first(&name.trim().replace('_', " "))
}

/// Lists the templates placed directly in the document, in document order.
///
/// Templates nested inside another template's parameters are not listed; they are rendered
/// back to `{{...}}` text inside the enclosing value. A `template` node without a `title`
/// is skipped. An empty tree (absent document) yields no templates.
pub fn extract_templates(raw_tree: &str) -> Result<Vec<TemplateInvocation>, WikidocError> {
    if raw_tree.trim().is_empty() {
        return Ok(Vec::new());
    }
    let root = parse_tree::parse(raw_tree)?;
    Ok(root
        .child_elements()
        .filter(|element| element.name == "template")
        .filter_map(invocation_from)
        .collect())
}

fn invocation_from(template: &Element) -> Option<TemplateInvocation> {
    let Some(title) = template.child("title") else {
        tracing::warn!("skipping template node without a title");
        return None;
    };

    let mut params = IndexMap::new();
    let mut unnamed = 0usize;
    for part in template.child_elements().filter(|e| e.name == "part") {
        let key = match part.child("name") {
            Some(name) => {
                let text = render_children(name);
                let text = text.trim();
                if !text.is_empty() {
                    text.to_string()
                } else if let Some(index) = name.attribute("index") {
                    unnamed += 1;
                    index.trim().to_string()
                } else {
                    unnamed += 1;
                    unnamed.to_string()
                }
            }
            None => {
                unnamed += 1;
                tracing::warn!(position = unnamed, "template part without a name node");
                unnamed.to_string()
            }
        };
        let value = part
            .child("value")
            .map(|value| render_children(value).trim().to_string())
            .unwrap_or_default();
        params.insert(key, value);
    }

    Some(TemplateInvocation {
        target: render_children(title).trim().to_string(),
        params,
    })
}

fn render_children(element: &Element) -> String {
    let mut out = String::new();
    for node in &element.children {
        render_node(node, &mut out);
    }
    out
}

/// Writes a node back as wikitext: template-like nodes regain their braces, extension tags
/// regain their angle brackets, everything else contributes its text.
fn render_node(node: &Node, out: &mut String) {
    let element = match node {
        Node::Text(text) => {
            out.push_str(text);
            return;
        }
        Node::Element(element) => element,
    };

    match element.name.as_str() {
        "template" => render_braced(element, "{{", "}}", out),
        "tplarg" => render_braced(element, "{{{", "}}}", out),
        "ext" => render_extension(element, out),
        _ => {
            for child in &element.children {
                render_node(child, out);
            }
        }
    }
}

fn render_braced(element: &Element, open: &str, close: &str, out: &mut String) {
    out.push_str(open);
    for child in &element.children {
        match child {
            Node::Element(part) if part.name == "part" => {
                out.push('|');
                for piece in &part.children {
                    render_node(piece, out);
                }
            }
            other => render_node(other, out),
        }
    }
    out.push_str(close);
}

fn render_extension(element: &Element, out: &mut String) {
    let name = element.child("name").map(Element::text).unwrap_or_default();
    let attr = element.child("attr").map(Element::text).unwrap_or_default();
    out.push('<');
    out.push_str(&name);
    out.push_str(&attr);
    match element.child("inner") {
        Some(inner) => {
            out.push('>');
            out.push_str(&inner.text());
            match element.child("close") {
                Some(close) => out.push_str(&close.text()),
                None => {
                    out.push_str("</");
                    out.push_str(&name);
                    out.push('>');
                }
            }
        }
        None => out.push_str("/>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(body: &str) -> String {
        format!("<root>{body}</root>")
    }

    #[test]
    fn named_and_positional_parameters() {
        let templates = extract_templates(&tree(
            "<template><title>Foo</title><part><name>bar</name>=<value>baz</value></part><part><name index=\"1\"/><value>qux</value></part></template>",
        ))
        .expect("extracts");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].target, "Foo");
        let params: Vec<_> = templates[0]
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(params, vec![("bar", "baz"), ("1", "qux")]);
    }

    #[test]
    fn nested_templates_are_rendered_inline() {
        let templates = extract_templates(&tree(
            "<template><title>Outer</title><part><name>text</name>=<value>see <template><title>Inner</title><part><name index=\"1\"/><value>x</value></part><part><name>k</name>=<value>v</value></part></template> here</value></part></template>",
        ))
        .expect("extracts");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].param("text"), Some("see {{Inner|x|k=v}} here"));
    }

    #[test]
    fn extension_tags_and_tplargs_survive() {
        let templates = extract_templates(&tree(
            "<template><title>Cite</title><part><name>ref</name>=<value><ext><name>ref</name><attr> name=\"a\"</attr><inner>Body</inner><close>&lt;/ref&gt;</close></ext><ext><name>br</name><attr></attr></ext><tplarg><title>1</title><part><name index=\"1\"/><value>def</value></part></tplarg></value></part></template>",
        ))
        .expect("extracts");
        assert_eq!(
            templates[0].param("ref"),
            Some("<ref name=\"a\">Body</ref><br/>{{{1|def}}}")
        );
    }

    #[test]
    fn empty_values_and_parameterless_templates() {
        let templates = extract_templates(&tree(
            "<template><title> Stub </title></template>text<template><title>X</title><part><name>a</name>=<value>  </value></part><part><name>b</name>=</part></template>",
        ))
        .expect("extracts");
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0].target, "Stub");
        assert!(templates[0].params.is_empty());
        assert_eq!(templates[1].param("a"), Some(""));
        assert_eq!(templates[1].param("b"), Some(""));
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let templates = extract_templates(&tree(
            "<template><title>T</title><part><name>a</name>=<value>1</value></part><part><name>b</name>=<value>2</value></part><part><name>a</name>=<value>3</value></part></template>",
        ))
        .expect("extracts");
        let keys: Vec<_> = templates[0].params.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(templates[0].param("a"), Some("3"));
    }

    #[test]
    fn malformed_template_nodes_are_skipped() {
        let templates = extract_templates(&tree(
            "<template><part><name>a</name>=<value>1</value></part></template><template><title>Kept</title><part><value>v</value></part></template>",
        ))
        .expect("extracts");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].target, "Kept");
        assert_eq!(templates[0].param("1"), Some("v"));
    }

    #[test]
    fn empty_tree_has_no_templates_and_garbage_is_an_error() {
        assert!(extract_templates("").expect("empty").is_empty());
        assert!(matches!(
            extract_templates("<root><template>"),
            Err(WikidocError::TemplateTree(_))
        ));
    }

    #[test]
    fn runaway_nesting_is_an_error_not_a_crash() {
        let levels = 5_000;
        let mut body = String::new();
        for _ in 0..levels {
            body.push_str("<template><title>a</title><part><name index=\"1\"/><value>");
        }
        for _ in 0..levels {
            body.push_str("</value></part></template>");
        }
        assert!(matches!(
            extract_templates(&tree(&body)),
            Err(WikidocError::TemplateTree(_))
        ));
    }

    #[test]
    fn moderate_nesting_still_renders() {
        let mut value = "x".to_string();
        for _ in 0..20 {
            value = format!(
                "<template><title>a</title><part><name index=\"1\"/><value>{value}</value></part></template>"
            );
        }
        let templates = extract_templates(&tree(&format!(
            "<template><title>Outer</title><part><name>p</name>=<value>{value}</value></part></template>"
        )))
        .expect("extracts");
        let expected = format!("{}x{}", "{{a|".repeat(20), "}}".repeat(20));
        assert_eq!(templates[0].param("p"), Some(expected.as_str()));
    }

    #[test]
    fn target_matching_folds_case_of_first_letter() {
        let invocation = TemplateInvocation {
            target: "aFC submission".into(),
            params: IndexMap::new(),
        };
        assert!(invocation.is("AFC_submission"));
        assert!(!invocation.is("afc submission"));
    }
}
