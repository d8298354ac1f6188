//! XML I/O for function results: parsing a function's
//! output text into an owned tree, and serializing/indenting it back out.
//!
//! We deliberately do not mutate a `minidom::Element` in place — chain
//! resolution needs to splice a chained function's children into the
//! middle of a parent's child list, and an owned tree makes that a plain
//! `Vec` operation instead of depending on `minidom`'s less-exercised
//! mutation API.

use minidom::Element;

use crate::error::OutputParseError;

/// An owned, mutable XML element: a name, its attributes in document
/// order, and its children (text or nested elements, interleaved as
/// written).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub nodes: Vec<OutputNode>,
}

/// A child of an [`OutputElement`]: either literal text or a nested
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNode {
    Text(String),
    Element(OutputElement),
}

impl OutputElement {
    /// Parses `xml` as a single root element.
    pub fn parse(xml: &str) -> Result<Self, OutputParseError> {
        let element: Element = xml.parse()?;
        Ok(Self::from_minidom(&element))
    }

    fn from_minidom(element: &Element) -> Self {
        let attrs = element.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let mut nodes = Vec::new();
        for node in element.nodes() {
            match node {
                minidom::Node::Text(text) => nodes.push(OutputNode::Text(text.clone())),
                minidom::Node::Element(child) => nodes.push(OutputNode::Element(Self::from_minidom(child))),
            }
        }
        Self {
            name: element.name().to_string(),
            attrs,
            nodes,
        }
    }

    /// Direct child elements, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &OutputElement> {
        self.nodes.iter().filter_map(|node| match node {
            OutputNode::Element(element) => Some(element),
            OutputNode::Text(_) => None,
        })
    }

    /// The concatenation of this element's direct text nodes.
    #[must_use]
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                OutputNode::Text(text) => Some(text.as_str()),
                OutputNode::Element(_) => None,
            })
            .collect()
    }

    /// Reads an attribute by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Serializes this element and its descendants, pretty-printed with a
    /// two-space indent — a structural port of `parser.py.indent`'s
    /// `ElementTree` pretty-printer recipe: this function computes
    /// equivalent indentation directly while writing, rather than mutating
    /// `.text`/`.tail` fields first.
    #[must_use]
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        self.write(&mut out, 0);
        out
    }

    fn write(&self, out: &mut String, level: usize) {
        let indent = "  ".repeat(level);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&html_escape::encode_double_quoted_attribute(value));
            out.push('"');
        }

        if self.nodes.is_empty() {
            out.push_str(" />\n");
            return;
        }

        let has_child_elements = self.nodes.iter().any(|node| matches!(node, OutputNode::Element(_)));
        if !has_child_elements {
            out.push('>');
            for node in &self.nodes {
                if let OutputNode::Text(text) = node {
                    out.push_str(&html_escape::encode_text_minimal(text));
                }
            }
            out.push_str("</");
            out.push_str(&self.name);
            out.push_str(">\n");
            return;
        }

        out.push_str(">\n");
        for node in &self.nodes {
            match node {
                OutputNode::Text(text) if text.trim().is_empty() => {}
                OutputNode::Text(text) => {
                    out.push_str(&"  ".repeat(level + 1));
                    out.push_str(&html_escape::encode_text_minimal(text));
                    out.push('\n');
                }
                OutputNode::Element(child) => child.write(out, level + 1),
            }
        }
        out.push_str(&indent);
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_and_attributes() {
        let element = OutputElement::parse(r#"<movie id="1">Hello</movie>"#).unwrap();
        assert_eq!(element.name, "movie");
        assert_eq!(element.attr("id"), Some("1"));
        assert_eq!(element.text(), "Hello");
    }

    #[test]
    fn child_elements_are_visited_in_document_order() {
        let element = OutputElement::parse(r#"<movie><a/><b/><a/></movie>"#).unwrap();
        let names: Vec<_> = element.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "a"]);
    }

    #[test]
    fn malformed_xml_is_an_output_parse_error() {
        assert!(OutputElement::parse("<movie>").is_err());
    }

    #[test]
    fn pretty_string_indents_nested_elements() {
        let element = OutputElement::parse(r#"<movie><actors><actor>A</actor></actors></movie>"#).unwrap();
        let pretty = element.to_pretty_string();
        assert_eq!(
            pretty,
            "<movie>\n  <actors>\n    <actor>A</actor>\n  </actors>\n</movie>\n"
        );
    }

    #[test]
    fn self_closing_for_childless_elements() {
        let element = OutputElement::parse(r#"<movie><empty/></movie>"#).unwrap();
        assert_eq!(element.to_pretty_string(), "<movie>\n  <empty />\n</movie>\n");
    }
}
