//! The evaluator: recursive walker over Function/RegExp nodes.

use crate::ast::{Dest, Expression, Function, FunctionTable, Input, RegExpNode};
use crate::buffers::Buffers;
use crate::clean::CleanedCaptures;
use crate::diagnostics::{self, Diagnostic};
use crate::error::UnknownFunction;
use crate::regex_adapter::CompiledPattern;
use crate::settings::Settings;

/// Evaluates the function named `name` against `buffers`/`settings`,
/// returning the text of its destination buffer together with any
/// non-fatal diagnostics collected along the way.
pub fn evaluate_function(
    table: &FunctionTable,
    name: &str,
    mut buffers: Buffers,
    settings: &Settings,
) -> Result<(String, Vec<Diagnostic>), UnknownFunction> {
    let function = table.get(name).ok_or_else(|| UnknownFunction(name.to_string()))?;
    let mut diagnostics = Vec::new();
    run_function(function, &mut buffers, settings, &mut diagnostics);
    let result = buffers.get_or_empty(function.dest.index).to_string();
    Ok((result, diagnostics))
}

fn run_function(function: &Function, buffers: &mut Buffers, settings: &Settings, diagnostics: &mut Vec<Diagnostic>) {
    if function.clearbuffers {
        buffers.reset_preserving_input();
    }
    for child in &function.children {
        evaluate_node(child, buffers, settings, diagnostics);
    }
}

fn evaluate_node(node: &RegExpNode, buffers: &mut Buffers, settings: &Settings, diagnostics: &mut Vec<Diagnostic>) {
    if !conditional_allows(node, settings, diagnostics) {
        return;
    }

    for child in &node.children {
        evaluate_node(child, buffers, settings, diagnostics);
    }

    let data = resolve_input(&node.input, buffers, settings);
    let result = match apply_expression(&node.expression, &node.output, &data, diagnostics) {
        Some(result) => result,
        None => return,
    };
    let result = expand_buffer_references(&result, buffers, settings);

    write_destination(node.dest, &node.expression, &result, buffers);
}

/// The conditional guard: an absent key is a warning plus a skip; a present
/// key must match the wanted literal exactly.
fn conditional_allows(node: &RegExpNode, settings: &Settings, diagnostics: &mut Vec<Diagnostic>) -> bool {
    let Some((key, negated)) = &node.conditional else {
        return true;
    };
    let Some(value) = settings.get(key) else {
        diagnostics::warn(diagnostics, Diagnostic::MissingSetting { key: key.clone() });
        return false;
    };
    let wanted = if *negated { "false" } else { "true" };
    value == wanted
}

fn resolve_input(input: &Input, buffers: &Buffers, settings: &Settings) -> Option<String> {
    match input {
        Input::Buffer(index) => buffers.get(*index).map(str::to_string),
        Input::Settings(key) => Some(settings.get_or_empty(key).to_string()),
    }
}

/// Applies the expression's regex to `data`, returning `None` when the
/// pattern itself failed to compile or match (the node contributes nothing
/// and evaluation continues), or `Some` of the (possibly empty) concatenated
/// expansion otherwise.
///
/// A `data` of `None` (the input buffer is absent) also skips the regex
/// entirely and yields an empty result, matching the reference
/// implementation's behavior of never invoking the engine against a `None`
/// buffer.
fn apply_expression(
    expression: &Expression,
    output: &str,
    data: &Option<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let Some(data) = data else {
        return Some(String::new());
    };

    let pattern = match CompiledPattern::compile(&expression.pattern, expression.cs) {
        Ok(pattern) => pattern,
        Err(err) => {
            diagnostics::warn(
                diagnostics,
                Diagnostic::Pattern {
                    pattern: expression.pattern.clone(),
                    message: err.to_string(),
                },
            );
            return None;
        }
    };

    let mut result = String::new();
    if expression.repeat {
        for found in pattern.find_all(data) {
            match found {
                Ok(captures) => {
                    let cleaned = CleanedCaptures::from_match(expression, &captures);
                    result.push_str(&cleaned.expand(output));
                }
                Err(err) => {
                    diagnostics::warn(
                        diagnostics,
                        Diagnostic::Pattern {
                            pattern: expression.pattern.clone(),
                            message: err.to_string(),
                        },
                    );
                    return None;
                }
            }
        }
    } else {
        match pattern.search(data) {
            Ok(Some(captures)) => {
                let cleaned = CleanedCaptures::from_match(expression, &captures);
                result.push_str(&cleaned.expand(output));
            }
            Ok(None) => {}
            Err(err) => {
                diagnostics::warn(
                    diagnostics,
                    Diagnostic::Pattern {
                        pattern: expression.pattern.clone(),
                        message: err.to_string(),
                    },
                );
                return None;
            }
        }
    }
    Some(result)
}

/// Replaces `$$n` for `n` from 20 down to 1, then `$INFO[key]`, in `text`.
fn expand_buffer_references(text: &str, buffers: &Buffers, settings: &Settings) -> String {
    let mut result = text.to_string();
    for n in (1..=20u8).rev() {
        let needle = format!("$${n}");
        if result.contains(&needle) {
            result = result.replace(&needle, buffers.get_or_empty(n));
        }
    }
    expand_settings_references(&result, settings)
}

/// Replaces every `$INFO[key]` literal with `settings[key]` (empty if
/// absent).
fn expand_settings_references(text: &str, settings: &Settings) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("$INFO[") {
        out.push_str(&rest[..start]);
        let after_marker = &rest[start + "$INFO[".len()..];
        match after_marker.find(']') {
            Some(end) => {
                let key = &after_marker[..end];
                out.push_str(settings.get_or_empty(key));
                rest = &after_marker[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Writes `result` to the destination buffer per the expression's `clear`
/// flag and the dest's append/assign mode.
fn write_destination(dest: Dest, expression: &Expression, result: &str, buffers: &mut Buffers) {
    if expression.clear {
        buffers.clear(dest.index);
    }
    if dest.append {
        buffers.append(dest.index, result);
    } else if !result.is_empty() {
        buffers.set(dest.index, result.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::load_function_table;

    #[test]
    fn single_capture_assign() {
        let table = load_function_table(
            r#"<scraper><F dest="5"><RegExp input="$$1" output="\1" dest="5">
                <expression>&lt;title&gt;(.*?)&lt;/title&gt;</expression>
            </RegExp></F></scraper>"#,
        )
        .unwrap();
        let buffers = Buffers::for_input("pre<title>Hi</title>post", "", "");
        let (result, diagnostics) = evaluate_function(&table, "F", buffers, &Settings::new()).unwrap();
        assert_eq!(result, "Hi");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn clean_by_default_strips_tags_and_decodes_entities() {
        let table = load_function_table(
            r#"<scraper><F dest="5"><RegExp input="$$1" output="\1" dest="5">
                <expression>&gt;([^&lt;]+)&lt;</expression>
            </RegExp></F></scraper>"#,
        )
        .unwrap();
        let buffers = Buffers::for_input("<b>Foo &amp; Bar</b>", "", "");
        let (result, _) = evaluate_function(&table, "F", buffers, &Settings::new()).unwrap();
        assert_eq!(result, "Foo & Bar");
    }

    #[test]
    fn conditional_skip_runs_only_the_matching_branch() {
        let table = load_function_table(
            r#"<scraper><F dest="5">
                <RegExp input="$$1" output="A" dest="5" conditional="lang"/>
                <RegExp input="$$1" output="B" dest="5" conditional="!lang"/>
            </F></scraper>"#,
        )
        .unwrap();
        let mut settings = Settings::new();
        settings.insert("lang", "true");
        let buffers = Buffers::for_input("anything", "", "");
        let (result, _) = evaluate_function(&table, "F", buffers, &settings).unwrap();
        assert_eq!(result, "A");
    }

    #[test]
    fn append_order_with_buffer_reference() {
        let table = load_function_table(
            r#"<scraper><F dest="9">
                <RegExp input="$$1" output="Alpha" dest="7"/>
                <RegExp input="$$1" output="Beta" dest="8"/>
                <RegExp input="$$1" output="$$7-$$8" dest="9"/>
            </F></scraper>"#,
        )
        .unwrap();
        let buffers = Buffers::for_input("x", "", "");
        let (result, _) = evaluate_function(&table, "F", buffers, &Settings::new()).unwrap();
        assert_eq!(result, "Alpha-Beta");
    }

    #[test]
    fn missing_conditional_setting_skips_and_warns() {
        let table = load_function_table(
            r#"<scraper><F dest="5">
                <RegExp input="$$1" output="A" dest="5" conditional="missing"/>
            </F></scraper>"#,
        )
        .unwrap();
        let buffers = Buffers::for_input("x", "", "");
        let (result, diagnostics) = evaluate_function(&table, "F", buffers, &Settings::new()).unwrap();
        assert_eq!(result, "");
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(diagnostics[0], Diagnostic::MissingSetting { .. }));
    }

    #[test]
    fn empty_result_does_not_overwrite_an_assigning_destination() {
        let table = load_function_table(
            r#"<scraper><F dest="5">
                <RegExp input="$$1" output="kept" dest="5"/>
                <RegExp input="$$2" output="\1" dest="5">
                    <expression>(nonexistent)</expression>
                </RegExp>
            </F></scraper>"#,
        )
        .unwrap();
        let buffers = Buffers::for_input("x", "y", "");
        let (result, _) = evaluate_function(&table, "F", buffers, &Settings::new()).unwrap();
        assert_eq!(result, "kept");
    }

    #[test]
    fn repeat_concatenates_all_non_overlapping_matches() {
        let table = load_function_table(
            r#"<scraper><F dest="5">
                <RegExp input="$$1" output="[\1]" dest="5">
                    <expression repeat="yes">(\w+)</expression>
                </RegExp>
            </F></scraper>"#,
        )
        .unwrap();
        let buffers = Buffers::for_input("a b c", "", "");
        let (result, _) = evaluate_function(&table, "F", buffers, &Settings::new()).unwrap();
        assert_eq!(result, "[a][b][c]");
    }

    #[test]
    fn unknown_function_is_an_error() {
        let table = load_function_table(r#"<scraper/>"#).unwrap();
        let result = evaluate_function(&table, "Missing", Buffers::new(), &Settings::new());
        assert!(result.is_err());
    }
}
