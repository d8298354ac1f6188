//! Typed AST for Function/RegExp/Expression nodes, and the
//! loader that builds a [`FunctionTable`] from a parsed scraper document.

use std::collections::HashSet;

use indexmap::IndexMap;
use minidom::Element;

use crate::error::DefinitionError;

/// Where a RegExp node's `data` comes from: a buffer slot, or a settings
/// lookup surfaced as `$INFO[key]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A buffer index, `1..=20`.
    Buffer(u8),
    /// A settings key, looked up with `Settings::get_or_empty`.
    Settings(String),
}

/// A parsed `dest` attribute: a buffer index plus whether writes append
/// (trailing `+`) or assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dest {
    pub index: u8,
    pub append: bool,
}

/// The regex + per-capture cleaning configuration of a `<expression>`
/// element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    /// The pattern source; `(.*)`  when the element is absent or empty.
    pub pattern: String,
    /// `false` → first match only; `true` → all non-overlapping matches.
    pub repeat: bool,
    /// Capture indices exempt from HTML tag stripping.
    pub noclean: HashSet<u8>,
    /// Capture indices to whitespace-trim.
    pub trim: HashSet<u8>,
    /// Capture indices to URL-encode.
    pub encode: HashSet<u8>,
    /// Capture indices to HTML-unescape.
    pub fixchars: HashSet<u8>,
    /// If true, the destination buffer is reset to empty before writing.
    pub clear: bool,
    /// Case-sensitive matching; default false.
    pub cs: bool,
}

impl Default for Expression {
    fn default() -> Self {
        Self {
            pattern: "(.*)".to_string(),
            repeat: false,
            noclean: HashSet::new(),
            trim: HashSet::new(),
            encode: HashSet::new(),
            fixchars: HashSet::new(),
            clear: false,
            cs: false,
        }
    }
}

/// One `<RegExp>` element: an input source, an expression, a destination,
/// an optional conditional guard, and child RegExp nodes evaluated first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExpNode {
    pub input: Input,
    pub output: String,
    pub dest: Dest,
    /// The settings key to test, with the leading `!` already stripped; the
    /// bool is `true` when the guard is negated.
    pub conditional: Option<(String, bool)>,
    pub expression: Expression,
    pub children: Vec<RegExpNode>,
}

/// A named top-level entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub dest: Dest,
    pub clearbuffers: bool,
    pub children: Vec<RegExpNode>,
}

/// A mapping from function name to [`Function`], populated once before
/// evaluation and immutable throughout.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable(IndexMap<String, Function>);

impl FunctionTable {
    /// Looks up a function by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.0.get(name)
    }

    /// Iterates functions in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parses `xml` (the scraper definition's root element, containing one or
/// more top-level function elements) into a [`FunctionTable`].
///
/// A duplicate top-level function tag overwrites the earlier one, matching
/// the reference implementation's plain dict assignment (`parser.py.import_module`
/// performs `funcs[child.tag] = Function(child)` with no duplicate check).
pub fn load_function_table(xml: &str) -> Result<FunctionTable, DefinitionError> {
    let root: Element = xml.parse()?;
    let mut table = IndexMap::new();
    for child in root.children() {
        let function = parse_function(child)?;
        table.insert(function.name.clone(), function);
    }
    Ok(FunctionTable(table))
}

fn parse_function(element: &Element) -> Result<Function, DefinitionError> {
    let name = element.name().to_string();
    let dest = parse_dest(&name, element.attr("dest"))?;
    let clearbuffers = element.attr("clearbuffers").is_none_or(|v| v != "no");
    let children = element
        .children()
        .filter(|child| child.name() == "RegExp")
        .map(parse_regexp)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Function {
        name,
        dest,
        clearbuffers,
        children,
    })
}

fn parse_regexp(element: &Element) -> Result<RegExpNode, DefinitionError> {
    let input = parse_input(element)?;
    let output = element.attr("output").unwrap_or("").to_string();
    let dest = parse_dest("RegExp", element.attr("dest"))?;
    let conditional = parse_conditional(element.attr("conditional"));
    let expression = element
        .children()
        .find(|child| child.name() == "expression")
        .map(parse_expression)
        .transpose()?
        .unwrap_or_default();
    let children = element
        .children()
        .filter(|child| child.name() == "RegExp")
        .map(parse_regexp)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RegExpNode {
        input,
        output,
        dest,
        conditional,
        expression,
        children,
    })
}

/// Parses the `input` attribute: `$INFO[key]` is a settings
/// lookup; otherwise the leading two characters (the `$$` surface form) are
/// discarded and the remainder parsed as a decimal buffer index.
fn parse_input(element: &Element) -> Result<Input, DefinitionError> {
    let raw = element.attr("input").ok_or(DefinitionError::MissingInput)?;
    if raw.is_empty() {
        return Ok(Input::Buffer(crate::buffers::INPUT));
    }
    if let Some(key) = raw.strip_prefix("$INFO[").and_then(|rest| rest.strip_suffix(']')) {
        return Ok(Input::Settings(key.to_string()));
    }
    let digits = raw
        .get(2..)
        .ok_or_else(|| DefinitionError::InvalidInput(raw.to_string()))?;
    let index: u8 = digits
        .parse()
        .map_err(|_| DefinitionError::InvalidInput(raw.to_string()))?;
    if !crate::buffers::is_valid_index(index) {
        return Err(DefinitionError::BufferIndexOutOfRange(index));
    }
    Ok(Input::Buffer(index))
}

/// Parses a `dest` attribute: trailing `+` means append mode, the numeric
/// prefix is the buffer index.
fn parse_dest(element: &str, raw: Option<&str>) -> Result<Dest, DefinitionError> {
    let raw = raw.ok_or_else(|| DefinitionError::MissingDest {
        element: element.to_string(),
    })?;
    let (digits, append) = match raw.strip_suffix('+') {
        Some(digits) => (digits, true),
        None => (raw, false),
    };
    let index: u8 = digits.parse().map_err(|_| DefinitionError::InvalidDest {
        element: element.to_string(),
        value: raw.to_string(),
    })?;
    if !crate::buffers::is_valid_index(index) {
        return Err(DefinitionError::BufferIndexOutOfRange(index));
    }
    Ok(Dest { index, append })
}

/// Parses a `conditional` attribute: a leading `!` negates the guard.
fn parse_conditional(raw: Option<&str>) -> Option<(String, bool)> {
    let raw = raw?;
    match raw.strip_prefix('!') {
        Some(key) => Some((key.to_string(), true)),
        None => Some((raw.to_string(), false)),
    }
}

fn parse_expression(element: &Element) -> Result<Expression, DefinitionError> {
    note_unimplemented_attribute(element, "utf8");
    note_unimplemented_attribute(element, "compare");
    let pattern = element.text();
    let pattern = if pattern.is_empty() { "(.*)".to_string() } else { pattern };
    Ok(Expression {
        pattern,
        repeat: parse_yes_no(element.attr("repeat")),
        noclean: parse_index_list("noclean", element.attr("noclean"))?,
        trim: parse_index_list("trim", element.attr("trim"))?,
        encode: parse_index_list("encode", element.attr("encode"))?,
        fixchars: parse_index_list("fixchars", element.attr("fixchars"))?,
        clear: parse_yes_no(element.attr("clear")),
        cs: parse_yes_no(element.attr("cs")),
    })
}

fn parse_yes_no(raw: Option<&str>) -> bool {
    raw == Some("yes")
}

/// `compare` and `utf8` are parsed so their presence is not a
/// `DefinitionError`, but neither affects evaluation (spec.md §9: "Probably
/// never implement this" in the reference parser's own comments). Their
/// presence is only noted at `debug` level, not collected as a
/// [`crate::diagnostics::Diagnostic`], since it is a load-time curiosity
/// rather than something a caller needs to react to per evaluation.
fn note_unimplemented_attribute(element: &Element, attribute: &str) {
    if element.attr(attribute).is_some() {
        log::debug!("attribute `{attribute}` on `{}` is parsed but not implemented", element.name());
    }
}

/// Parses a comma-separated list of 1-based capture indices, e.g. `"1,3,4"`.
fn parse_index_list(attribute: &str, raw: Option<&str>) -> Result<HashSet<u8>, DefinitionError> {
    let Some(raw) = raw else {
        return Ok(HashSet::new());
    };
    raw.split(',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .map_err(|_| DefinitionError::InvalidIndexList {
                    attribute: attribute.to_string(),
                    value: raw.to_string(),
                })
        })
        .collect()
}
