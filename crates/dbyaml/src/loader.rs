use std::collections::HashMap;

use saphyr_parser::{Event, Parser, ScalarStyle, Span};

use crate::ast::{AliasNode, Document, MappingEntry, MappingNode, Node, ScalarNode, SequenceNode, Stream};
use crate::error::Error;
use crate::placeholder::Placeholder;
use crate::utilities::{CharIndex, format_tag, is_anchor_char};

/// A parsed configuration together with the text filter that was applied to it.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub stream: Stream,
    pub placeholder: Placeholder,
}

/// Parse a `database.yml`, activating the commented production placeholder
/// first so it is part of the tree.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the text is not well-formed YAML.
pub fn load(raw: &str) -> Result<Loaded, Error> {
    let (text, placeholder) = Placeholder::activate(raw);
    let stream = parse(&text)?;
    Ok(Loaded {
        stream,
        placeholder,
    })
}

/// Parse YAML text into a node tree, without any text filtering.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the text is not well-formed YAML.
pub fn parse(source: &str) -> Result<Stream, Error> {
    let index = CharIndex::new(source);
    let events = collect_events(source, &index)?;
    AstBuilder::new(source, &events, &index).build_stream()
}

fn collect_events<'a>(source: &'a str, index: &CharIndex) -> Result<Vec<(Event<'a>, Span)>, Error> {
    let parser = Parser::new_from_str(source);
    let mut events = Vec::new();
    for result in parser {
        let (event, span) = result.map_err(|e| {
            Error::parse(source, index.to_byte(e.marker().index()), e.info().to_string())
        })?;
        events.push((event, span));
    }
    Ok(events)
}

struct AstBuilder<'a> {
    source: &'a str,
    events: &'a [(Event<'a>, Span)],
    index: &'a CharIndex,
    pos: usize,
    /// Anchor names by saphyr's anchor id, so aliases resolve by id.
    anchors: HashMap<usize, String>,
    /// Whether we are currently inside a flow collection (nested depth counter)
    in_flow_context: usize,
}

impl<'a> AstBuilder<'a> {
    fn new(source: &'a str, events: &'a [(Event<'a>, Span)], index: &'a CharIndex) -> Self {
        AstBuilder {
            source,
            events,
            index,
            pos: 0,
            anchors: HashMap::new(),
            in_flow_context: 0,
        }
    }

    fn peek(&self) -> Option<&'a Event<'a>> {
        self.events.get(self.pos).map(|(event, _)| event)
    }

    fn advance(&mut self) -> Result<&'a (Event<'a>, Span), Error> {
        let item = self.events.get(self.pos).ok_or_else(|| {
            Error::parse(self.source, self.source.len(), "unexpected end of YAML stream")
        })?;
        self.pos += 1;
        Ok(item)
    }

    fn build_stream(&mut self) -> Result<Stream, Error> {
        // Skip StreamStart
        self.advance()?;

        let mut documents = Vec::new();
        while let Some(event) = self.peek() {
            match event {
                Event::DocumentStart(_) => documents.push(self.build_document()?),
                _ => break,
            }
        }
        Ok(Stream { documents })
    }

    fn build_document(&mut self) -> Result<Document, Error> {
        self.advance()?;
        let root = if matches!(self.peek(), Some(Event::DocumentEnd)) {
            None
        } else {
            Some(self.build_node()?)
        };
        if matches!(self.peek(), Some(Event::DocumentEnd)) {
            self.advance()?;
        }
        Ok(Document { root })
    }

    fn build_node(&mut self) -> Result<Node, Error> {
        let (event, span) = self.advance()?;
        match event {
            Event::Scalar(value, style, anchor_id, tag) => Ok(Node::Scalar(ScalarNode {
                value: if self.is_implicit_null(span, value, *style) {
                    String::new()
                } else {
                    value.to_string()
                },
                style: *style,
                anchor: self.anchor(*anchor_id, span),
                tag: tag.as_ref().map(format_tag),
            })),
            Event::SequenceStart(anchor_id, tag) => {
                let anchor = self.anchor(*anchor_id, span);
                let tag = tag.as_ref().map(format_tag);
                self.build_sequence(span, anchor, tag)
            }
            Event::MappingStart(anchor_id, tag) => {
                let anchor = self.anchor(*anchor_id, span);
                let tag = tag.as_ref().map(format_tag);
                self.build_mapping(span, anchor, tag)
            }
            Event::Alias(anchor_id) => {
                let name = match self.anchors.get(anchor_id) {
                    Some(name) => name.clone(),
                    None => self.extract_alias_name(span),
                };
                Ok(Node::Alias(AliasNode { name }))
            }
            _ => Err(Error::parse(
                self.source,
                self.index.to_byte(span.start.index()),
                "unexpected YAML event",
            )),
        }
    }

    fn build_sequence(
        &mut self,
        span: &Span,
        anchor: Option<String>,
        tag: Option<String>,
    ) -> Result<Node, Error> {
        let flow = self.starts_with(span, b'[') || self.in_flow_context > 0;
        if flow {
            self.in_flow_context += 1;
        }

        let mut items = Vec::new();
        loop {
            if matches!(self.peek(), Some(Event::SequenceEnd)) {
                self.advance()?;
                break;
            }
            items.push(self.build_node()?);
        }

        if flow {
            self.in_flow_context -= 1;
        }
        Ok(Node::Sequence(SequenceNode {
            items,
            flow,
            anchor,
            tag,
        }))
    }

    fn build_mapping(
        &mut self,
        span: &Span,
        anchor: Option<String>,
        tag: Option<String>,
    ) -> Result<Node, Error> {
        let flow = self.starts_with(span, b'{') || self.in_flow_context > 0;
        if flow {
            self.in_flow_context += 1;
        }

        let mut entries = Vec::new();
        loop {
            if matches!(self.peek(), Some(Event::MappingEnd)) {
                self.advance()?;
                break;
            }
            let key = self.build_node()?;
            let value = self.build_node()?;
            entries.push(MappingEntry { key, value });
        }

        if flow {
            self.in_flow_context -= 1;
        }
        Ok(Node::Mapping(MappingNode {
            entries,
            flow,
            anchor,
            tag,
        }))
    }

    // ─── Source extraction helpers ──────────────────────────────────────────

    fn anchor(&mut self, anchor_id: usize, span: &Span) -> Option<String> {
        if anchor_id == 0 {
            return None;
        }
        let name = self.extract_anchor_before(span)?;
        self.anchors.insert(anchor_id, name.clone());
        Some(name)
    }

    /// saphyr reports an empty node as `~`; only a `~` written in the source
    /// stays one.
    fn is_implicit_null(&self, span: &Span, value: &str, style: ScalarStyle) -> bool {
        if style != ScalarStyle::Plain || value != "~" {
            return false;
        }
        if span.is_empty() {
            return true;
        }
        let start = self.index.to_byte(span.start.index());
        let end = self.index.to_byte(span.end.index()).max(start);
        !self.source[start..end].contains('~')
    }

    fn starts_with(&self, span: &Span, byte: u8) -> bool {
        let byte_idx = self.index.to_byte(span.start.index());
        self.source.as_bytes().get(byte_idx) == Some(&byte)
    }

    fn extract_anchor_before(&self, span: &Span) -> Option<String> {
        let start = self.index.to_byte(span.start.index());
        let mut search_start = start.saturating_sub(200);
        while !self.source.is_char_boundary(search_start) {
            search_start -= 1;
        }
        let region = &self.source[search_start..start];

        let amp_pos = region.rfind('&')?;
        let name: String = region[amp_pos + 1..]
            .chars()
            .take_while(|c| is_anchor_char(*c))
            .collect();
        (!name.is_empty()).then_some(name)
    }

    fn extract_alias_name(&self, span: &Span) -> String {
        let start = self.index.to_byte(span.start.index());
        let end = self.index.to_byte(span.end.index()).max(start);
        let region = &self.source[start..end];

        match region.find('*') {
            Some(star_pos) => region[star_pos + 1..]
                .chars()
                .take_while(|c| is_anchor_char(*c))
                .collect(),
            None => String::new(),
        }
    }
}
