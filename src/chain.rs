//! The chain resolver: after a function returns, scan its output for
//! `<chain function="…">` elements and splice in the named function's own
//! output in their place.

use crate::ast::FunctionTable;
use crate::buffers::Buffers;
use crate::diagnostics::{self, Diagnostic};
use crate::eval::evaluate_function;
use crate::settings::Settings;
use crate::xml::{OutputElement, OutputNode};

/// Parses `xml_text`, expanding every `<chain>` element that is a *direct*
/// child of the root, and returns the re-serialized result.
///
/// Per spec.md §4.5, the resolver "walks its direct children" only — it does
/// not descend into non-`chain` sibling elements looking for `<chain>` tags
/// nested deeper in the tree, matching `original_source/parser.py.output`'s
/// `for child in details:` loop over the result root's immediate children
/// only. A chained function's own output is a fresh root, so its direct
/// children are scanned in turn (`resolve_chain` recurses into `chained` for
/// exactly this reason) — this is how "chains may nest" (§4.5) without
/// contradicting the direct-children-only rule.
///
/// `source` is inherited as `B[3]` for every chained invocation.
pub fn expand_chains(
    table: &FunctionTable,
    xml_text: &str,
    settings: &Settings,
    source: Option<&str>,
) -> Result<(String, Vec<Diagnostic>), crate::error::OutputParseError> {
    let mut root = OutputElement::parse(xml_text)?;
    let mut diagnostics = Vec::new();
    resolve_element(&mut root, table, settings, source, &mut diagnostics);
    Ok((root.to_pretty_string(), diagnostics))
}

/// Replaces every `<chain>` element among `element`'s direct children with
/// its resolved output. Non-`chain` children are left untouched — including
/// their own descendants, which are not scanned for nested `<chain>`
/// elements.
fn resolve_element(
    element: &mut OutputElement,
    table: &FunctionTable,
    settings: &Settings,
    source: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut resolved = Vec::with_capacity(element.nodes.len());
    for node in element.nodes.drain(..) {
        match node {
            OutputNode::Element(child) if child.name == "chain" => {
                let replacement = resolve_chain(&child, table, settings, source, diagnostics);
                resolved.extend(replacement);
            }
            other => resolved.push(other),
        }
    }
    element.nodes = resolved;
}

/// Resolves a single `<chain function="NAME">TEXT</chain>` element into the
/// children of the named function's own (recursively chain-resolved)
/// output, or nothing if the chain misses.
fn resolve_chain(
    chain: &OutputElement,
    table: &FunctionTable,
    settings: &Settings,
    source: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<OutputNode> {
    let Some(function_name) = chain.attr("function") else {
        diagnostics::warn(
            diagnostics,
            Diagnostic::ChainMiss {
                function: String::new(),
            },
        );
        return Vec::new();
    };

    let text = chain.text();
    let buffers = Buffers::for_chain(text, source);

    let (result, mut eval_diagnostics) = match evaluate_function(table, function_name, buffers, settings) {
        Ok(outcome) => outcome,
        Err(_) => {
            diagnostics::warn(
                diagnostics,
                Diagnostic::ChainMiss {
                    function: function_name.to_string(),
                },
            );
            return Vec::new();
        }
    };
    diagnostics.append(&mut eval_diagnostics);

    if result.trim().is_empty() {
        diagnostics::warn(
            diagnostics,
            Diagnostic::ChainMiss {
                function: function_name.to_string(),
            },
        );
        return Vec::new();
    }

    let mut chained = match OutputElement::parse(&result) {
        Ok(element) => element,
        Err(_) => {
            diagnostics::warn(
                diagnostics,
                Diagnostic::ChainMiss {
                    function: function_name.to_string(),
                },
            );
            return Vec::new();
        }
    };
    resolve_element(&mut chained, table, settings, source, diagnostics);
    chained.nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::load_function_table;

    #[test]
    fn chain_idempotence_when_no_chain_elements_are_present() {
        let table = load_function_table(r#"<scraper/>"#).unwrap();
        let (result, diagnostics) = expand_chains(&table, "<movie><title>A</title></movie>", &Settings::new(), None).unwrap();
        assert_eq!(result, "<movie>\n  <title>A</title>\n</movie>\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn chain_expansion_splices_named_function_children_in_place() {
        let table = load_function_table(
            r#"<scraper>
                <Cast dest="1">
                    <RegExp input="$$1" output="&lt;actors&gt;&lt;actor&gt;\1&lt;/actor&gt;&lt;/actors&gt;" dest="1">
                        <expression>(.*)</expression>
                    </RegExp>
                </Cast>
            </scraper>"#,
        )
        .unwrap();
        let xml = r#"<movie><chain function="Cast">A</chain></movie>"#;
        let (result, diagnostics) = expand_chains(&table, xml, &Settings::new(), None).unwrap();
        assert_eq!(result, "<movie>\n  <actors>\n    <actor>A</actor>\n  </actors>\n</movie>\n");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn chain_miss_removes_element_and_warns() {
        let table = load_function_table(r#"<scraper/>"#).unwrap();
        let xml = r#"<movie><chain function="Missing">A</chain></movie>"#;
        let (result, diagnostics) = expand_chains(&table, xml, &Settings::new(), None).unwrap();
        assert_eq!(result, "<movie />\n");
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], Diagnostic::ChainMiss { .. }));
    }

    #[test]
    fn chain_nested_inside_a_non_chain_child_is_left_untouched() {
        let table = load_function_table(
            r#"<scraper>
                <Cast dest="1">
                    <RegExp input="$$1" output="&lt;actors&gt;&lt;actor&gt;\1&lt;/actor&gt;&lt;/actors&gt;" dest="1">
                        <expression>(.*)</expression>
                    </RegExp>
                </Cast>
            </scraper>"#,
        )
        .unwrap();
        let xml = r#"<movie><fanart><chain function="Cast">A</chain></fanart></movie>"#;
        let (result, diagnostics) = expand_chains(&table, xml, &Settings::new(), None).unwrap();
        assert_eq!(
            result,
            "<movie>\n  <fanart>\n    <chain function=\"Cast\">A</chain>\n  </fanart>\n</movie>\n"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn source_buffer_is_inherited_by_the_chained_invocation() {
        let table = load_function_table(
            r#"<scraper>
                <Cast dest="1">
                    <RegExp input="$$3" output="&lt;url&gt;\1&lt;/url&gt;" dest="1">
                        <expression>(.*)</expression>
                    </RegExp>
                </Cast>
            </scraper>"#,
        )
        .unwrap();
        let xml = r#"<movie><chain function="Cast">ignored</chain></movie>"#;
        let (result, _) = expand_chains(&table, xml, &Settings::new(), Some("https://example.test/")).unwrap();
        assert_eq!(result, "<movie>\n  <url>https://example.test/</url>\n</movie>\n");
    }
}
