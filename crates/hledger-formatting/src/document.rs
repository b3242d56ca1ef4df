//! Full-document formatting.

use hledger_analysis::CommodityFormat;
use hledger_journal::{Amount, Journal, Posting};
use hledger_position::LineIndex;
use lsp_types::{Position, Range, TextEdit};
use rustc_hash::FxHashMap;

/// Formatter configuration (from the `formatting.*` settings).
#[derive(Debug, Clone)]
pub struct FormatSettings {
    /// Spaces of posting indentation
    pub indent_size: u32,
    /// Align amounts at a common column
    pub align_amounts: bool,
    /// Floor for the computed alignment column; 0 disables the floor
    pub min_alignment_column: u32,
}

impl Default for FormatSettings {
    fn default() -> Self {
        FormatSettings { indent_size: 4, align_amounts: true, min_alignment_column: 0 }
    }
}

struct RenderedPosting<'a> {
    posting: &'a Posting,
    line: u32,
    /// account text in UTF-16 units
    account_len: u32,
    amount: Option<String>,
    assertion: Option<String>,
}

/// Format a whole document: reindent postings and align amounts.
///
/// Returns one edit per line whose content changes.
pub fn format_document(
    text: &str,
    journal: &Journal,
    commodity_formats: &FxHashMap<String, CommodityFormat>,
    settings: &FormatSettings,
) -> Vec<TextEdit> {
    let line_index = LineIndex::new(text);
    let indent = " ".repeat(settings.indent_size as usize);

    let mut rendered: Vec<RenderedPosting<'_>> = Vec::new();
    for transaction in &journal.transactions {
        for posting in &transaction.postings {
            let amount = posting.amount.as_ref().map(|a| {
                let mut out = render_amount(a, commodity_formats);
                if let Some(cost) = &posting.cost {
                    let op = if cost.is_total { "@@" } else { "@" };
                    out.push_str(&format!(" {op} {}", render_amount(&cost.amount, commodity_formats)));
                }
                out
            });
            let assertion = posting.balance_assertion.as_ref().map(|a| {
                let op = if a.is_strict { "==" } else { "=" };
                format!("{op} {}", render_amount(&a.amount, commodity_formats))
            });
            rendered.push(RenderedPosting {
                posting,
                line: posting.span.start.line.saturating_sub(1),
                account_len: utf16_len(&posting.account),
                amount,
                assertion,
            });
        }
    }

    // single alignment column across the document
    let computed = rendered
        .iter()
        .map(|r| settings.indent_size + r.account_len + 2)
        .max()
        .unwrap_or(settings.indent_size + 2);
    let align_column = computed.max(settings.min_alignment_column);

    // a second column for balance-assertion `=` signs, derived analogously
    let assertion_column = rendered
        .iter()
        .filter(|r| r.assertion.is_some())
        .map(|r| {
            let amount_len = r.amount.as_deref().map(utf16_len).unwrap_or(0);
            align_column + amount_len + 2
        })
        .max()
        .unwrap_or(0);

    let mut edits = Vec::new();
    for item in &rendered {
        let mut new_line = String::new();
        new_line.push_str(&indent);
        new_line.push_str(&item.posting.account);

        if let Some(amount) = &item.amount {
            if settings.align_amounts {
                let current = settings.indent_size + item.account_len;
                let pad = align_column.saturating_sub(current).max(2);
                new_line.push_str(&" ".repeat(pad as usize));
            } else {
                new_line.push_str("  ");
            }
            new_line.push_str(amount);
        }
        if let Some(assertion) = &item.assertion {
            if settings.align_amounts {
                let current = utf16_len(&new_line);
                let pad = assertion_column.saturating_sub(current).max(1);
                new_line.push_str(&" ".repeat(pad as usize));
            } else {
                new_line.push(' ');
            }
            new_line.push_str(assertion);
        }
        for comment in &item.posting.comments {
            // keep trailing comments, two spaces before the marker
            if comment.span.start.line == item.posting.span.start.line {
                new_line.push_str("  ;");
                new_line.push_str(&comment.text);
            }
        }

        let old_line = line_index.line_text(text, item.line).unwrap_or("");
        if old_line != new_line {
            edits.push(TextEdit {
                range: Range {
                    start: Position { line: item.line, character: 0 },
                    end: Position {
                        line: item.line,
                        character: line_index.line_utf16_len(text, item.line),
                    },
                },
                new_text: new_line,
            });
        }
    }
    edits
}

/// Render an amount through its commodity's declared format, or keep the
/// literal text untouched.
fn render_amount(amount: &Amount, formats: &FxHashMap<String, CommodityFormat>) -> String {
    match formats.get(&amount.commodity) {
        Some(format) if !amount.commodity.is_empty() => {
            format.render(amount.quantity, &amount.commodity)
        }
        _ => amount.raw_text.clone(),
    }
}

pub(crate) fn utf16_len(s: &str) -> u32 {
    s.chars().map(|c| c.len_utf16() as u32).sum()
}
