use core::fmt::Write;

use ansi_term_styles::{DIM, GREEN, RED, RESET};
use similar::ChangeTag;

/// Line diff of a pending edit with three lines of context, numbered by the
/// line in the old text for removals and the new text for additions.
pub fn render(path: &str, original: &str, updated: &str, color: bool) -> String {
    let diff = similar::TextDiff::from_lines(original, updated);

    let max_line = original.lines().count().max(updated.lines().count());
    let width = max_line.to_string().len();

    let mut out = String::with_capacity(original.len() + updated.len());
    let _ = writeln!(out, "--- {path}");
    let _ = writeln!(out, "+++ {path}");

    let mut first_group = true;
    for group in diff.grouped_ops(3) {
        if !first_group {
            if color {
                let _ = writeln!(out, "{DIM}  ...{RESET}");
            } else {
                let _ = writeln!(out, "  ...");
            }
        }
        first_group = false;

        for op in &group {
            for change in diff.iter_changes(op) {
                let value = change.value().trim_end_matches('\n');
                let (lineno, marker, style) = match change.tag() {
                    ChangeTag::Delete => (change.old_index(), '-', RED),
                    ChangeTag::Insert => (change.new_index(), '+', GREEN),
                    ChangeTag::Equal => (change.old_index(), ' ', ""),
                };
                let lineno = lineno.map_or(0, |n| n + 1);
                if color && !style.is_empty() {
                    let _ = writeln!(out, "{style}{lineno:>width$} {marker} {value}{RESET}");
                } else {
                    let _ = writeln!(out, "{lineno:>width$} {marker} {value}");
                }
            }
        }
    }
    out
}
