use alloc::borrow::Cow;

use saphyr_parser::Tag;

/// Check if a character is valid in a YAML anchor/alias name.
/// YAML spec: any character except flow indicators ([]{},) and whitespace.
pub(crate) fn is_anchor_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '[' | ']' | '{' | '}' | ',')
}

/// Render a parsed tag the way it is written in source.
#[allow(clippy::ptr_arg)]
pub(crate) fn format_tag(tag: &Cow<'_, Tag>) -> String {
    if tag.handle.is_empty() && tag.suffix == "!" {
        "!".to_string()
    } else if tag.handle.is_empty() {
        // Verbatim tag: saphyr strips the angle brackets
        format!("!<{}>", tag.suffix)
    } else if tag.handle == "!" {
        format!("!{}", tag.suffix)
    } else if tag.handle == "!!" || tag.handle == "tag:yaml.org,2002:" {
        format!("!!{}", tag.suffix)
    } else {
        format!("{}!{}", tag.handle, tag.suffix)
    }
}

/// Map saphyr's char indices to byte offsets for slicing.
pub(crate) struct CharIndex {
    offsets: Vec<usize>,
    len: usize,
}

impl CharIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut offsets: Vec<usize> = source.char_indices().map(|(b, _)| b).collect();
        offsets.push(source.len());
        Self {
            offsets,
            len: source.len(),
        }
    }

    pub(crate) fn to_byte(&self, char_idx: usize) -> usize {
        self.offsets.get(char_idx).copied().unwrap_or(self.len)
    }
}
