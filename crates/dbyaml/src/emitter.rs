//! Canonical YAML rendering.
//!
//! The output matches what libyaml writes with its default settings: two
//! space indentation, an 80 column line width and unicode left unescaped.
//! Rewrites locate environment blocks in the file by this exact text, so the
//! layout rules here are deliberately not configurable.

use saphyr_parser::ScalarStyle;

use crate::ast::{Document, MappingNode, Node, ScalarNode, SequenceNode, Stream};
use crate::placeholder::Placeholder;
use crate::scalar::{self, Position, is_blank, is_break};

const BEST_INDENT: usize = 2;
const BEST_WIDTH: usize = 80;
const MAX_SIMPLE_KEY_LENGTH: usize = 128;

/// Render one key/value pair as a snippet.
///
/// The pair is emitted as the only entry of a single-document stream, the
/// document marker is dropped, surrounding whitespace is trimmed, and the
/// placeholder line is commented again if the loader activated it.
pub fn render(key: &Node, value: &Node, placeholder: Placeholder) -> String {
    let mapping = MappingNode::from_entries([(key.clone(), value.clone())]);
    let stream = Stream {
        documents: vec![Document {
            root: Some(Node::Mapping(mapping)),
        }],
    };
    let yaml = Emitter::default().emit_stream(&stream);
    let body = yaml.strip_prefix("---").unwrap_or(&yaml);
    placeholder.restore(body.trim().to_string())
}

/// Serialize a whole stream.
pub fn emit(stream: &Stream) -> String {
    Emitter::default().emit_stream(stream)
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    mapping: bool,
    simple_key: bool,
}

#[derive(Debug)]
#[allow(clippy::struct_excessive_bools)]
struct Emitter {
    out: String,
    column: usize,
    indent: Option<usize>,
    indents: Vec<Option<usize>>,
    flow_level: usize,
    /// The last character written was whitespace.
    whitespace: bool,
    /// Only indentation has been written on the current line.
    indention: bool,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            out: String::new(),
            column: 0,
            indent: None,
            indents: Vec::new(),
            flow_level: 0,
            whitespace: true,
            indention: true,
        }
    }
}

impl Emitter {
    fn emit_stream(mut self, stream: &Stream) -> String {
        for document in &stream.documents {
            self.emit_document(document);
        }
        self.out
    }

    fn emit_document(&mut self, document: &Document) {
        self.indent = None;
        if self.column > 0 {
            self.put_break();
        }
        self.write_indicator("---", true, false, false);
        if let Some(root) = &document.root {
            self.emit_node(root, Context::default());
        }
        self.indent = None;
        self.write_indent();
    }

    fn emit_node(&mut self, node: &Node, context: Context) {
        match node {
            Node::Alias(alias) => {
                self.write_property("*", &alias.name);
                if context.simple_key {
                    self.put(' ');
                }
            }
            Node::Scalar(scalar) => self.emit_scalar(scalar, context),
            Node::Sequence(sequence) => {
                self.write_properties(sequence.anchor.as_deref(), sequence.tag.as_deref());
                if self.flow_level > 0 || sequence.flow || sequence.items.is_empty() {
                    self.emit_flow_sequence(sequence);
                } else {
                    self.emit_block_sequence(sequence, context);
                }
            }
            Node::Mapping(mapping) => {
                self.write_properties(mapping.anchor.as_deref(), mapping.tag.as_deref());
                if self.flow_level > 0 || mapping.flow || mapping.entries.is_empty() {
                    self.emit_flow_mapping(mapping);
                } else {
                    self.emit_block_mapping(mapping);
                }
            }
        }
    }

    fn emit_scalar(&mut self, scalar: &ScalarNode, context: Context) {
        let analysis = scalar::analyze(&scalar.value);
        let position = Position {
            in_flow: self.flow_level > 0,
            simple_key: context.simple_key,
        };
        let style = scalar::select_style(scalar.style, &scalar.value, &analysis, position);

        // A plain scalar that has to be quoted keeps its plain resolution
        // through the non-specific tag.
        let tag = match scalar.tag.as_deref() {
            None if scalar.style == ScalarStyle::Plain && style != ScalarStyle::Plain => Some("!"),
            tag => tag,
        };
        self.write_properties(scalar.anchor.as_deref(), tag);

        self.increase_indent(true, false);
        let allow_breaks = !context.simple_key;
        match style {
            ScalarStyle::Plain => self.write_plain(&scalar.value, allow_breaks),
            ScalarStyle::SingleQuoted => self.write_single_quoted(&scalar.value, allow_breaks),
            ScalarStyle::DoubleQuoted => self.write_double_quoted(&scalar.value, allow_breaks),
            ScalarStyle::Literal => self.write_literal(&scalar.value),
            ScalarStyle::Folded => self.write_folded(&scalar.value),
        }
        self.pop_indent();
    }

    fn emit_block_sequence(&mut self, sequence: &SequenceNode, context: Context) {
        self.increase_indent(false, context.mapping && !self.indention);
        for item in &sequence.items {
            self.write_indent();
            self.write_indicator("-", true, false, true);
            self.emit_node(item, Context::default());
        }
        self.pop_indent();
    }

    fn emit_flow_sequence(&mut self, sequence: &SequenceNode) {
        self.write_indicator("[", true, true, false);
        self.increase_indent(true, false);
        self.flow_level += 1;
        for (i, item) in sequence.items.iter().enumerate() {
            if i > 0 {
                self.write_indicator(",", false, false, false);
            }
            if self.column > BEST_WIDTH {
                self.write_indent();
            }
            self.emit_node(item, Context::default());
        }
        self.flow_level -= 1;
        self.pop_indent();
        self.write_indicator("]", false, false, false);
    }

    fn emit_block_mapping(&mut self, mapping: &MappingNode) {
        self.increase_indent(false, false);
        for entry in &mapping.entries {
            self.write_indent();
            if is_simple_key(&entry.key) {
                self.emit_node(&entry.key, Context {
                    mapping: true,
                    simple_key: true,
                });
                self.write_indicator(":", false, false, false);
            } else {
                self.write_indicator("?", true, false, true);
                self.emit_node(&entry.key, Context {
                    mapping: true,
                    simple_key: false,
                });
                self.write_indent();
                self.write_indicator(":", true, false, true);
            }
            self.emit_node(&entry.value, Context {
                mapping: true,
                simple_key: false,
            });
        }
        self.pop_indent();
    }

    fn emit_flow_mapping(&mut self, mapping: &MappingNode) {
        self.write_indicator("{", true, true, false);
        self.increase_indent(true, false);
        self.flow_level += 1;
        for (i, entry) in mapping.entries.iter().enumerate() {
            if i > 0 {
                self.write_indicator(",", false, false, false);
            }
            if self.column > BEST_WIDTH {
                self.write_indent();
            }
            if is_simple_key(&entry.key) {
                self.emit_node(&entry.key, Context {
                    mapping: true,
                    simple_key: true,
                });
                self.write_indicator(":", false, false, false);
            } else {
                self.write_indicator("?", true, false, false);
                self.emit_node(&entry.key, Context {
                    mapping: true,
                    simple_key: false,
                });
                if self.column > BEST_WIDTH {
                    self.write_indent();
                }
                self.write_indicator(":", true, false, false);
            }
            self.emit_node(&entry.value, Context {
                mapping: true,
                simple_key: false,
            });
        }
        self.flow_level -= 1;
        self.pop_indent();
        self.write_indicator("}", false, false, false);
    }

    // ─── Low-level writers ──────────────────────────────────────────────────

    fn put(&mut self, c: char) {
        self.out.push(c);
        self.column += 1;
    }

    fn put_break(&mut self) {
        self.out.push('\n');
        self.column = 0;
    }

    fn write_break(&mut self, c: char) {
        if c == '\n' {
            self.put_break();
        } else {
            self.out.push(c);
            self.column = 0;
        }
    }

    fn increase_indent(&mut self, flow: bool, indentless: bool) {
        self.indents.push(self.indent);
        self.indent = match self.indent {
            None if flow => Some(BEST_INDENT),
            None => Some(0),
            Some(indent) if !indentless => Some(indent + BEST_INDENT),
            Some(indent) => Some(indent),
        };
    }

    fn pop_indent(&mut self) {
        self.indent = self.indents.pop().flatten();
    }

    fn write_indent(&mut self) {
        let indent = self.indent.unwrap_or(0);
        if !self.indention || self.column > indent || (self.column == indent && !self.whitespace) {
            self.put_break();
        }
        while self.column < indent {
            self.put(' ');
        }
        self.whitespace = true;
        self.indention = true;
    }

    fn write_indicator(&mut self, indicator: &str, need_whitespace: bool, is_whitespace: bool, is_indention: bool) {
        if need_whitespace && !self.whitespace {
            self.put(' ');
        }
        for c in indicator.chars() {
            self.put(c);
        }
        self.whitespace = is_whitespace;
        self.indention = self.indention && is_indention;
    }

    /// An anchor (`&name`) or alias (`*name`).
    fn write_property(&mut self, indicator: &str, name: &str) {
        self.write_indicator(indicator, true, false, false);
        for c in name.chars() {
            self.put(c);
        }
        self.whitespace = false;
        self.indention = false;
    }

    fn write_properties(&mut self, anchor: Option<&str>, tag: Option<&str>) {
        if let Some(anchor) = anchor {
            self.write_property("&", anchor);
        }
        if let Some(tag) = tag {
            self.write_indicator(tag, true, false, false);
        }
    }

    #[allow(clippy::cognitive_complexity)]
    fn write_plain(&mut self, value: &str, allow_breaks: bool) {
        let chars: Vec<char> = value.chars().collect();
        if !self.whitespace && (!chars.is_empty() || self.flow_level > 0) {
            self.put(' ');
        }

        let mut spaces = false;
        let mut breaks = false;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c == ' ' {
                let next_is_space = chars.get(i + 1) == Some(&' ');
                if allow_breaks && !spaces && self.column > BEST_WIDTH && !next_is_space {
                    self.write_indent();
                } else {
                    self.put(c);
                }
                spaces = true;
            } else if is_break(c) {
                if !breaks && c == '\n' {
                    self.put_break();
                }
                self.write_break(c);
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent();
                }
                self.put(c);
                self.indention = false;
                spaces = false;
                breaks = false;
            }
            i += 1;
        }

        self.whitespace = false;
        self.indention = false;
    }

    #[allow(clippy::cognitive_complexity)]
    fn write_single_quoted(&mut self, value: &str, allow_breaks: bool) {
        let chars: Vec<char> = value.chars().collect();
        self.write_indicator("'", true, false, false);

        let mut spaces = false;
        let mut breaks = false;
        for (i, &c) in chars.iter().enumerate() {
            if c == ' ' {
                let next_is_space = chars.get(i + 1) == Some(&' ');
                if allow_breaks
                    && !spaces
                    && self.column > BEST_WIDTH
                    && i != 0
                    && i + 1 != chars.len()
                    && !next_is_space
                {
                    self.write_indent();
                } else {
                    self.put(c);
                }
                spaces = true;
            } else if is_break(c) {
                if !breaks && c == '\n' {
                    self.put_break();
                }
                self.write_break(c);
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent();
                }
                if c == '\'' {
                    self.put('\'');
                }
                self.put(c);
                self.indention = false;
                spaces = false;
                breaks = false;
            }
        }

        if breaks {
            self.write_indent();
        }
        self.write_indicator("'", false, false, false);
    }

    #[allow(clippy::cognitive_complexity)]
    fn write_double_quoted(&mut self, value: &str, allow_breaks: bool) {
        let chars: Vec<char> = value.chars().collect();
        self.write_indicator("\"", true, false, false);

        let mut spaces = false;
        for (i, &c) in chars.iter().enumerate() {
            if let Some(escaped) = scalar::escape(c) {
                self.put('\\');
                for e in escaped.chars() {
                    self.put(e);
                }
                spaces = false;
            } else if c == ' ' {
                if allow_breaks && !spaces && self.column > BEST_WIDTH && i != 0 && i + 1 != chars.len() {
                    self.write_indent();
                    if chars.get(i + 1) == Some(&' ') {
                        self.put('\\');
                    }
                } else {
                    self.put(c);
                }
                spaces = true;
            } else {
                self.put(c);
                spaces = false;
            }
        }

        self.write_indicator("\"", false, false, false);
    }

    fn write_block_hints(&mut self, chars: &[char]) {
        if chars.first().is_some_and(|&c| c == ' ' || is_break(c)) {
            self.write_indicator(&BEST_INDENT.to_string(), false, false, false);
        }

        match chars.last() {
            Some(&last) if !is_break(last) => self.write_indicator("-", false, false, false),
            None => self.write_indicator("-", false, false, false),
            Some(_) => {
                let trailing_breaks = chars.iter().rev().take_while(|&&c| is_break(c)).count();
                if trailing_breaks > 1 || chars.len() == 1 {
                    self.write_indicator("+", false, false, false);
                }
            }
        }
    }

    fn write_literal(&mut self, value: &str) {
        let chars: Vec<char> = value.chars().collect();
        self.write_indicator("|", true, false, false);
        self.write_block_hints(&chars);
        self.put_break();
        self.indention = true;
        self.whitespace = true;

        let mut breaks = true;
        for &c in &chars {
            if is_break(c) {
                self.write_break(c);
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent();
                }
                self.put(c);
                self.indention = false;
                breaks = false;
            }
        }
    }

    #[allow(clippy::cognitive_complexity)]
    fn write_folded(&mut self, value: &str) {
        let chars: Vec<char> = value.chars().collect();
        self.write_indicator(">", true, false, false);
        self.write_block_hints(&chars);
        self.put_break();
        self.indention = true;
        self.whitespace = true;

        let mut breaks = true;
        let mut leading_spaces = true;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if is_break(c) {
                if !breaks && !leading_spaces && c == '\n' {
                    let next_content = chars[i..].iter().find(|&&c| !is_break(c));
                    if next_content.is_some_and(|&c| !is_blank(c)) {
                        self.put_break();
                    }
                }
                self.write_break(c);
                self.indention = true;
                breaks = true;
            } else {
                if breaks {
                    self.write_indent();
                    leading_spaces = is_blank(c);
                }
                let next_is_space = chars.get(i + 1) == Some(&' ');
                if !breaks && c == ' ' && !next_is_space && self.column > BEST_WIDTH {
                    self.write_indent();
                } else {
                    self.put(c);
                }
                self.indention = false;
                breaks = false;
            }
            i += 1;
        }
    }
}

/// Whether a key can be written inline before its `:`.
fn is_simple_key(key: &Node) -> bool {
    let length = match key {
        Node::Alias(alias) => alias.name.chars().count(),
        Node::Scalar(scalar) => {
            if scalar::analyze(&scalar.value).multiline {
                return false;
            }
            property_length(scalar.anchor.as_deref(), scalar.tag.as_deref())
                + scalar.value.chars().count()
        }
        Node::Sequence(sequence) => {
            if !sequence.items.is_empty() {
                return false;
            }
            property_length(sequence.anchor.as_deref(), sequence.tag.as_deref())
        }
        Node::Mapping(mapping) => {
            if !mapping.entries.is_empty() {
                return false;
            }
            property_length(mapping.anchor.as_deref(), mapping.tag.as_deref())
        }
    };
    length <= MAX_SIMPLE_KEY_LENGTH
}

fn property_length(anchor: Option<&str>, tag: Option<&str>) -> usize {
    anchor.map_or(0, |a| a.chars().count()) + tag.map_or(0, |t| t.chars().count())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::loader::parse;

    /// Parse a document and render each top-level pair on its own.
    fn render_pairs(source: &str) -> Vec<String> {
        let stream = parse(source).expect("parse");
        let root = stream.documents[0]
            .root
            .as_ref()
            .and_then(Node::as_mapping)
            .expect("root mapping");
        root.entries
            .iter()
            .map(|e| render(&e.key, &e.value, Placeholder::default()))
            .collect()
    }

    fn assert_renders_unchanged(block: &str) {
        assert_eq!(render_pairs(block), vec![block.trim_end().to_string()]);
    }

    /// Like `assert_renders_unchanged`, for blocks that alias `&default`.
    fn assert_renders_unchanged_after_default(block: &str) {
        let rendered = render_pairs(&format!("default: &default\n  adapter: sqlite3\n{block}"));
        assert_eq!(rendered[1..], [block.trim_end().to_string()]);
    }

    #[test]
    fn rails_default_block() {
        assert_renders_unchanged(
            "default: &default\n  adapter: sqlite3\n  pool: <%= ENV.fetch(\"RAILS_MAX_THREADS\") { 5 } %>\n  timeout: 5000\n",
        );
    }

    #[test]
    fn two_tier_environment() {
        assert_renders_unchanged_after_default("development:\n  <<: *default\n  database: storage/development.sqlite3\n");
    }

    #[test]
    fn three_tier_environment() {
        assert_renders_unchanged_after_default(
            "production:\n  primary:\n    <<: *default\n    database: storage/production.sqlite3\n  cache:\n    <<: *default\n    database: storage/production_cache.sqlite3\n    migrations_path: db/cache_migrate\n",
        );
    }

    #[test]
    fn sequences_are_indentless_under_keys() {
        assert_renders_unchanged("paths:\n- db/one\n- db/two\n");
        assert_renders_unchanged("nested:\n- name: a\n  value: 1\n- - x\n  - y\n");
    }

    #[test]
    fn flow_and_empty_collections() {
        assert_renders_unchanged("options: {encoding: unicode, pool: 5}\n");
        assert_renders_unchanged("list: [1, 2]\n");
        assert_eq!(render_pairs("empty: {}\n"), vec!["empty: {}".to_string()]);
        assert_eq!(render_pairs("none: []\n"), vec!["none: []".to_string()]);
    }

    #[test]
    fn quoted_scalars_keep_their_style() {
        assert_renders_unchanged("test:\n  password: \"secret\"\n  username: 'app'\n");
        assert_renders_unchanged("quote: 'it''s'\n");
        assert_renders_unchanged("escape: \"tab\\there\"\n");
    }

    #[test]
    fn empty_value() {
        assert_renders_unchanged("test:\n  password:\n  host: localhost\n");
    }

    #[test]
    fn alias_as_key_gets_a_space() {
        assert_eq!(
            render(&Node::alias("a"), &Node::plain("x"), Placeholder::default()),
            "*a : x"
        );
    }

    #[test]
    fn literal_blocks() {
        assert_renders_unchanged("script: |\n  line one\n  line two\n");
        assert_renders_unchanged("stripped: |-\n  no newline\n");
    }

    #[test]
    fn plain_quoted_fallback_keeps_plain_resolution() {
        assert_eq!(
            render(&Node::plain("key"), &Node::plain("*not-an-alias"), Placeholder::default()),
            "key: ! '*not-an-alias'"
        );
    }

    #[test]
    fn long_plain_values_fold_at_eighty_columns() {
        let value = ["abcdefghi"; 20].join(" ");
        let line = |n: usize| vec!["abcdefghi"; n].join(" ");
        let expected = format!("k: {}\n  {}\n  {}", line(8), line(8), line(4));
        assert_eq!(render(&Node::plain("k"), &Node::plain(value), Placeholder::default()), expected);
    }

    #[test]
    fn emit_writes_document_markers() {
        let stream = parse("a: 1\n---\nb: 2\n").expect("parse");
        assert_eq!(emit(&stream), "---\na: 1\n---\nb: 2\n");
    }
}
