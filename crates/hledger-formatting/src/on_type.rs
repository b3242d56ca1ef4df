//! On-type formatting for `\n` and `\t`.

use crate::document::{utf16_len, FormatSettings};
use hledger_journal::Journal;
use hledger_position::LineIndex;
use lsp_types::{Position, Range, TextEdit};

/// Handle a typed character at `(line, character)` (the cursor position
/// after the insertion).
///
/// - `\n` after a transaction header or a posting without an amount:
///   indent the new line. After a posting with an amount or an empty
///   line: strip any auto-inserted indentation; the transaction is
///   closed.
/// - `\t` at the end of a posting that has no amount yet: replace the tab
///   with the spaces needed to land at the alignment column.
pub fn on_type(
    text: &str,
    journal: &Journal,
    line: u32,
    character: u32,
    typed: &str,
    settings: &FormatSettings,
) -> Vec<TextEdit> {
    let line_index = LineIndex::new(text);
    match typed {
        "\n" => handle_newline(text, &line_index, line, settings),
        "\t" => handle_tab(text, &line_index, journal, line, character, settings),
        _ => Vec::new(),
    }
}

fn handle_newline(
    text: &str,
    line_index: &LineIndex,
    line: u32,
    settings: &FormatSettings,
) -> Vec<TextEdit> {
    if line == 0 {
        return Vec::new();
    }
    let previous = line_index.line_text(text, line - 1).unwrap_or("");
    let current = line_index.line_text(text, line).unwrap_or("");
    let current_ws: String =
        current.chars().take_while(|c| *c == ' ' || *c == '\t').collect();

    let wanted = if line_wants_indent(previous) {
        " ".repeat(settings.indent_size as usize)
    } else {
        String::new()
    };
    if current_ws == wanted {
        return Vec::new();
    }
    vec![TextEdit {
        range: Range {
            start: Position { line, character: 0 },
            end: Position { line, character: utf16_len(&current_ws) },
        },
        new_text: wanted,
    }]
}

/// A header line or an amount-less posting line keeps the transaction
/// open; the next line should be an indented posting.
fn line_wants_indent(previous: &str) -> bool {
    if previous.starts_with(|c: char| c.is_ascii_digit()) {
        return true;
    }
    let indented = previous.starts_with("  ") || previous.starts_with('\t');
    if !indented {
        return false;
    }
    let content = previous.trim_start();
    if content.is_empty() || content.starts_with(';') {
        return false;
    }
    // posting without an amount: nothing after the account separator
    match find_separator(content) {
        None => true,
        Some(idx) => content[idx..].trim().is_empty(),
    }
}

fn handle_tab(
    text: &str,
    line_index: &LineIndex,
    journal: &Journal,
    line: u32,
    character: u32,
    settings: &FormatSettings,
) -> Vec<TextEdit> {
    let line_text = line_index.line_text(text, line).unwrap_or("");
    // the typed tab sits just before the cursor, at the end of the line
    if character == 0 || utf16_len(line_text) != character {
        return Vec::new();
    }
    if !line_text.ends_with('\t') {
        return Vec::new();
    }
    let before_tab = &line_text[..line_text.len() - 1];
    if !(before_tab.starts_with("  ") || before_tab.starts_with(' ')) {
        return Vec::new();
    }
    let account = before_tab.trim();
    if account.is_empty() || find_separator(before_tab.trim_start()).is_some() {
        // no account yet, or the amount area has already begun
        return Vec::new();
    }

    // alignment column over the whole document's postings
    let computed = journal
        .transactions
        .iter()
        .flat_map(|t| &t.postings)
        .map(|p| settings.indent_size + utf16_len(&p.account) + 2)
        .max()
        .unwrap_or(settings.indent_size + 2)
        .max(settings.min_alignment_column);

    let account_end = utf16_len(before_tab);
    let pad = computed.saturating_sub(account_end).max(2);
    vec![TextEdit {
        range: Range {
            start: Position { line, character: character - 1 },
            end: Position { line, character },
        },
        new_text: " ".repeat(pad as usize),
    }]
}

fn find_separator(content: &str) -> Option<usize> {
    let bytes = content.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] == b'\t' {
            return Some(i);
        }
        if bytes[i] == b' ' && i + 1 < bytes.len() && bytes[i + 1] == b' ' {
            return Some(i);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_journal::{parse_with, ParserOptions};
    use pretty_assertions::assert_eq;

    fn journal(text: &str) -> Journal {
        parse_with(text, &ParserOptions { fallback_year: 2024 })
    }

    fn newline_edits(text: &str, line: u32) -> Vec<TextEdit> {
        let j = journal(text);
        on_type(text, &j, line, 0, "\n", &FormatSettings::default())
    }

    #[test]
    fn newline_after_header_indents() {
        let text = "2024-01-01 x\n\n";
        let edits = newline_edits(text, 1);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "    ");
    }

    #[test]
    fn newline_after_posting_without_amount_indents() {
        let text = "2024-01-01 x\n    expenses:food\n\n";
        let edits = newline_edits(text, 2);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "    ");
    }

    #[test]
    fn newline_after_posting_with_amount_strips_auto_indent() {
        // the editor auto-inserted four spaces on the new line
        let text = "2024-01-01 x\n    expenses:food  10 EUR\n    \n";
        let edits = newline_edits(text, 2);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "");
        assert_eq!(edits[0].range.start.character, 0);
        assert_eq!(edits[0].range.end.character, 4);
    }

    #[test]
    fn newline_after_empty_line_does_nothing() {
        let text = "2024-01-01 x\n    a  1 EUR\n\n\n";
        assert_eq!(newline_edits(text, 3), vec![]);
    }

    #[test]
    fn tab_completes_to_alignment_column() {
        let text = "2024-01-01 x\n    expenses:food  10 EUR\n    a\t\n";
        let j = journal(text);
        // cursor after the tab: line "    a\t" is 6 UTF-16 units
        let edits = on_type(text, &j, 2, 6, "\t", &FormatSettings::default());
        assert_eq!(edits.len(), 1);
        // alignment column = 4 + len("expenses:food") + 2 = 19; account
        // ends at 5, so 14 spaces
        assert_eq!(edits[0].new_text, " ".repeat(14));
        assert_eq!(edits[0].range.start.character, 5);
    }

    #[test]
    fn tab_with_amount_already_written_is_untouched() {
        let text = "2024-01-01 x\n    a  10\t\n";
        let j = journal(text);
        let edits = on_type(text, &j, 1, 10, "\t", &FormatSettings::default());
        assert_eq!(edits, vec![]);
    }
}
