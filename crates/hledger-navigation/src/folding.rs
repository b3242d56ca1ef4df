//! Folding ranges: transactions, multi-line directives and comment runs.

use hledger_journal::Journal;
use lsp_types::{FoldingRange, FoldingRangeKind};

/// Compute the foldable regions of one file.
pub fn folding_ranges(journal: &Journal) -> Vec<FoldingRange> {
    let mut ranges = Vec::new();

    for transaction in &journal.transactions {
        let start = transaction.span.start.line.saturating_sub(1);
        let end = transaction.span.end.line.saturating_sub(1);
        if end > start {
            ranges.push(fold(start, end, FoldingRangeKind::Region));
        }
    }

    for directive in &journal.directives {
        let span = directive.span();
        let start = span.start.line.saturating_sub(1);
        let end = span.end.line.saturating_sub(1);
        if end > start {
            ranges.push(fold(start, end, FoldingRangeKind::Region));
        }
    }

    // runs of two or more adjacent file-level comment lines
    let mut run_start: Option<(u32, u32)> = None;
    for comment in &journal.comments {
        let line = comment.span.start.line.saturating_sub(1);
        match run_start {
            Some((start, last)) if line == last + 1 => run_start = Some((start, line)),
            Some((start, last)) => {
                if last > start {
                    ranges.push(fold(start, last, FoldingRangeKind::Comment));
                }
                run_start = Some((line, line));
            }
            None => run_start = Some((line, line)),
        }
    }
    if let Some((start, last)) = run_start {
        if last > start {
            ranges.push(fold(start, last, FoldingRangeKind::Comment));
        }
    }

    ranges.sort_by_key(|r| (r.start_line, r.end_line));
    ranges
}

fn fold(start_line: u32, end_line: u32, kind: FoldingRangeKind) -> FoldingRange {
    FoldingRange {
        start_line,
        start_character: None,
        end_line,
        end_character: None,
        kind: Some(kind),
        collapsed_text: None,
    }
}
