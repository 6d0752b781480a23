//! Scalar analysis and presentation-style selection.
//!
//! A rendered scalar keeps the style it was parsed with unless that style
//! cannot represent its text in the position it is emitted, in which case it
//! falls back to a quoted style. The rules follow libyaml's emitter, which is
//! what wrote most `database.yml` files in the first place.

use saphyr_parser::ScalarStyle;

/// What a scalar's text permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct Analysis {
    pub multiline: bool,
    pub flow_plain_allowed: bool,
    pub block_plain_allowed: bool,
    pub single_quoted_allowed: bool,
    pub block_allowed: bool,
}

/// Where the scalar is being written.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Position {
    pub in_flow: bool,
    pub simple_key: bool,
}

pub(crate) fn is_break(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

pub(crate) fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Blank, break, or the end of the text.
fn is_blankz(c: Option<&char>) -> bool {
    c.is_none_or(|&c| is_blank(c) || is_break(c))
}

/// Characters that may appear unescaped in a scalar.
pub(crate) fn is_printable(c: char) -> bool {
    matches!(
        c,
        '\n' | '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}'
    ) && c != '\u{feff}'
}

#[allow(clippy::too_many_lines, clippy::cognitive_complexity)]
pub(crate) fn analyze(value: &str) -> Analysis {
    if value.is_empty() {
        return Analysis {
            multiline: false,
            flow_plain_allowed: false,
            block_plain_allowed: true,
            single_quoted_allowed: true,
            block_allowed: false,
        };
    }

    let chars: Vec<char> = value.chars().collect();

    let mut block_indicators = false;
    let mut flow_indicators = false;
    if value.starts_with("---") || value.starts_with("...") {
        block_indicators = true;
        flow_indicators = true;
    }

    let mut leading_space = false;
    let mut leading_break = false;
    let mut trailing_space = false;
    let mut trailing_break = false;
    let mut break_space = false;
    let mut space_break = false;
    let mut special_characters = false;
    let mut line_breaks = false;

    let mut preceded_by_whitespace = true;
    let mut followed_by_whitespace = is_blankz(chars.get(1));
    let mut previous_space = false;
    let mut previous_break = false;

    for (i, &c) in chars.iter().enumerate() {
        let first = i == 0;
        let last = i + 1 == chars.len();

        if first {
            match c {
                '#' | ',' | '[' | ']' | '{' | '}' | '&' | '*' | '!' | '|' | '>' | '\'' | '"'
                | '%' | '@' | '`' => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                '?' | ':' => {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                '-' if followed_by_whitespace => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                _ => {}
            }
        } else {
            match c {
                ',' | '?' | '[' | ']' | '{' | '}' => flow_indicators = true,
                ':' => {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                '#' if preceded_by_whitespace => {
                    flow_indicators = true;
                    block_indicators = true;
                }
                _ => {}
            }
        }

        if !is_printable(c) {
            special_characters = true;
        }
        if is_break(c) {
            line_breaks = true;
        }

        if c == ' ' {
            leading_space |= first;
            trailing_space |= last;
            break_space |= previous_break;
            previous_space = true;
            previous_break = false;
        } else if is_break(c) {
            leading_break |= first;
            trailing_break |= last;
            space_break |= previous_space;
            previous_space = false;
            previous_break = true;
        } else {
            previous_space = false;
            previous_break = false;
        }

        preceded_by_whitespace = is_blankz(Some(&c));
        followed_by_whitespace = is_blankz(chars.get(i + 2));
    }

    let mut analysis = Analysis {
        multiline: line_breaks,
        flow_plain_allowed: true,
        block_plain_allowed: true,
        single_quoted_allowed: true,
        block_allowed: true,
    };

    if leading_space || leading_break || trailing_space || trailing_break {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
    }
    if trailing_space {
        analysis.block_allowed = false;
    }
    if break_space {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
        analysis.single_quoted_allowed = false;
    }
    if space_break || special_characters {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
        analysis.single_quoted_allowed = false;
        analysis.block_allowed = false;
    }
    if line_breaks {
        analysis.flow_plain_allowed = false;
        analysis.block_plain_allowed = false;
    }
    if flow_indicators {
        analysis.flow_plain_allowed = false;
    }
    if block_indicators {
        analysis.block_plain_allowed = false;
    }

    analysis
}

/// Pick the style a scalar is written in.
pub(crate) fn select_style(
    requested: ScalarStyle,
    value: &str,
    analysis: &Analysis,
    position: Position,
) -> ScalarStyle {
    let mut style = requested;

    if position.simple_key && analysis.multiline {
        style = ScalarStyle::DoubleQuoted;
    }

    if style == ScalarStyle::Plain {
        let plain_allowed = if position.in_flow {
            analysis.flow_plain_allowed
        } else {
            analysis.block_plain_allowed
        };
        if !plain_allowed || (value.is_empty() && (position.in_flow || position.simple_key)) {
            style = ScalarStyle::SingleQuoted;
        }
    }

    if style == ScalarStyle::SingleQuoted && !analysis.single_quoted_allowed {
        style = ScalarStyle::DoubleQuoted;
    }

    if matches!(style, ScalarStyle::Literal | ScalarStyle::Folded)
        && (!analysis.block_allowed || position.in_flow || position.simple_key)
    {
        style = ScalarStyle::DoubleQuoted;
    }

    style
}

/// The escape sequence for a character in a double-quoted scalar, if it needs one.
pub(crate) fn escape(c: char) -> Option<String> {
    let needs_escape = !is_printable(c) || is_break(c) || c == '"' || c == '\\';
    if !needs_escape {
        return None;
    }
    let escaped = match c {
        '\0' => "0".to_string(),
        '\u{7}' => "a".to_string(),
        '\u{8}' => "b".to_string(),
        '\t' => "t".to_string(),
        '\n' => "n".to_string(),
        '\u{b}' => "v".to_string(),
        '\u{c}' => "f".to_string(),
        '\r' => "r".to_string(),
        '\u{1b}' => "e".to_string(),
        '"' => "\"".to_string(),
        '\\' => "\\".to_string(),
        '\u{85}' => "N".to_string(),
        '\u{a0}' => "_".to_string(),
        '\u{2028}' => "L".to_string(),
        '\u{2029}' => "P".to_string(),
        c if u32::from(c) <= 0xff => format!("x{:02X}", u32::from(c)),
        c if u32::from(c) <= 0xffff => format!("u{:04X}", u32::from(c)),
        c => format!("U{:08X}", u32::from(c)),
    };
    Some(escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK_VALUE: Position = Position {
        in_flow: false,
        simple_key: false,
    };
    const SIMPLE_KEY: Position = Position {
        in_flow: false,
        simple_key: true,
    };

    fn style_for(requested: ScalarStyle, value: &str, position: Position) -> ScalarStyle {
        select_style(requested, value, &analyze(value), position)
    }

    #[test]
    fn ordinary_values_stay_plain() {
        for value in [
            "sqlite3",
            "storage/development.sqlite3",
            "<%= ENV.fetch(\"RAILS_MAX_THREADS\") { 5 } %>",
            "db/cache_migrate",
            "a:b",
            "x#y",
        ] {
            assert_eq!(
                style_for(ScalarStyle::Plain, value, BLOCK_VALUE),
                ScalarStyle::Plain,
                "{value}"
            );
        }
    }

    #[test]
    fn indicators_force_quotes() {
        for value in ["*x", "&x", "- x", "x: y", "x #y", "---", " lead", "trail ", "@x"] {
            assert_eq!(
                style_for(ScalarStyle::Plain, value, BLOCK_VALUE),
                ScalarStyle::SingleQuoted,
                "{value}"
            );
        }
    }

    #[test]
    fn flow_indicators_only_matter_in_flow() {
        let flow = Position {
            in_flow: true,
            simple_key: false,
        };
        assert_eq!(style_for(ScalarStyle::Plain, "a,b", BLOCK_VALUE), ScalarStyle::Plain);
        assert_eq!(style_for(ScalarStyle::Plain, "a,b", flow), ScalarStyle::SingleQuoted);
    }

    #[test]
    fn empty_scalars() {
        assert_eq!(style_for(ScalarStyle::Plain, "", BLOCK_VALUE), ScalarStyle::Plain);
        assert_eq!(style_for(ScalarStyle::Plain, "", SIMPLE_KEY), ScalarStyle::SingleQuoted);
    }

    #[test]
    fn quoted_styles_are_kept_when_possible() {
        assert_eq!(
            style_for(ScalarStyle::DoubleQuoted, "secret", BLOCK_VALUE),
            ScalarStyle::DoubleQuoted
        );
        assert_eq!(
            style_for(ScalarStyle::SingleQuoted, "secret", BLOCK_VALUE),
            ScalarStyle::SingleQuoted
        );
        assert_eq!(
            style_for(ScalarStyle::SingleQuoted, "a\tb", BLOCK_VALUE),
            ScalarStyle::DoubleQuoted
        );
    }

    #[test]
    fn block_scalars() {
        assert_eq!(
            style_for(ScalarStyle::Literal, "line one\nline two\n", BLOCK_VALUE),
            ScalarStyle::Literal
        );
        assert_eq!(
            style_for(ScalarStyle::Literal, "line one\n", SIMPLE_KEY),
            ScalarStyle::DoubleQuoted
        );
        assert_eq!(
            style_for(ScalarStyle::Folded, "trailing ", BLOCK_VALUE),
            ScalarStyle::DoubleQuoted
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(escape('a'), None);
        assert_eq!(escape('é'), None);
        assert_eq!(escape('\n').as_deref(), Some("n"));
        assert_eq!(escape('"').as_deref(), Some("\""));
        assert_eq!(escape('\u{1}').as_deref(), Some("x01"));
        assert_eq!(escape('\u{feff}').as_deref(), Some("uFEFF"));
        assert_eq!(escape('\u{1f600}').as_deref(), Some("U0001F600"));
    }
}
