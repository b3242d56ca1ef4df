//! Candidate collection, ranking and LSP item construction.

use crate::context::{classify, ContextKind, CursorContext};
use crate::fuzzy;
use chrono::NaiveDate;
use hledger_analysis::{AnalysisResult, PostingTemplate};
use hledger_position::LineIndex;
use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionList, CompletionTextEdit, InsertTextFormat,
    Position, Range, TextEdit,
};

/// One completion invocation.
pub struct CompletionRequest<'a> {
    /// Full document text
    pub text: &'a str,
    /// Line index over `text`
    pub line_index: &'a LineIndex,
    /// Cursor line (0-based)
    pub line: u32,
    /// Cursor column in UTF-16 units
    pub character: u32,
    /// Trigger character, when the editor sent one
    pub trigger_character: Option<String>,
    /// Whether the client understands snippet syntax
    pub snippet_support: bool,
    /// Result cap (`completion.maxResults`)
    pub max_results: usize,
    /// `completion.fuzzyMatching`
    pub fuzzy_matching: bool,
    /// `completion.showCounts`
    pub show_counts: bool,
    /// Today's date, injected by the orchestrator
    pub today: NaiveDate,
}

struct Candidate {
    label: String,
    score: i64,
    usage: u32,
    kind: CompletionItemKind,
    template: Option<PostingTemplate>,
}

/// Produce the ordered completion list for a cursor position.
pub fn complete(request: &CompletionRequest<'_>, analysis: &AnalysisResult) -> CompletionList {
    let line_text = request
        .line_index
        .line_text(request.text, request.line)
        .unwrap_or("");
    let context = classify(line_text, request.character, request.trigger_character.as_deref());

    let items = match context.kind {
        ContextKind::Date => date_items(request, analysis, &context),
        ContextKind::Unknown => Vec::new(),
        _ => ranked_items(request, analysis, &context),
    };

    // `is_incomplete` stays true so the editor re-queries as the user
    // types instead of re-filtering a stale list
    CompletionList { is_incomplete: true, items }
}

fn score_label(request: &CompletionRequest<'_>, kind: ContextKind, query: &str, label: &str) -> Option<i64> {
    if !request.fuzzy_matching {
        return fuzzy::substring_score(query, label);
    }
    match kind {
        ContextKind::Account => fuzzy::account_score(query, label),
        _ => fuzzy::fuzzy_score(query, label),
    }
}

fn ranked_items(
    request: &CompletionRequest<'_>,
    analysis: &AnalysisResult,
    context: &CursorContext,
) -> Vec<CompletionItem> {
    let mut candidates: Vec<Candidate> = Vec::new();
    match context.kind {
        ContextKind::Account => {
            for account in &analysis.accounts.all {
                if let Some(score) = score_label(request, context.kind, &context.query, account) {
                    candidates.push(Candidate {
                        label: account.clone(),
                        score,
                        usage: analysis.accounts.counts.get(account).copied().unwrap_or(0),
                        kind: CompletionItemKind::FIELD,
                        template: None,
                    });
                }
            }
        }
        ContextKind::Payee => {
            for entry in &analysis.payees {
                if let Some(score) = score_label(request, context.kind, &context.query, &entry.name) {
                    candidates.push(Candidate {
                        label: entry.name.clone(),
                        score,
                        usage: entry.count,
                        kind: CompletionItemKind::TEXT,
                        template: analysis.templates.get(&entry.name).cloned(),
                    });
                }
            }
        }
        ContextKind::Commodity => {
            for entry in &analysis.commodities {
                if let Some(score) = score_label(request, context.kind, &context.query, &entry.name) {
                    candidates.push(Candidate {
                        label: entry.name.clone(),
                        score,
                        usage: entry.count,
                        kind: CompletionItemKind::UNIT,
                        template: None,
                    });
                }
            }
        }
        ContextKind::TagName => {
            for entry in &analysis.tag_names {
                if let Some(score) = score_label(request, context.kind, &context.query, &entry.name) {
                    candidates.push(Candidate {
                        label: entry.name.clone(),
                        score,
                        usage: entry.count,
                        kind: CompletionItemKind::PROPERTY,
                        template: None,
                    });
                }
            }
        }
        ContextKind::TagValue => {
            let values = context
                .tag_name
                .as_ref()
                .and_then(|name| analysis.tag_values.get(name));
            for value in values.into_iter().flatten() {
                if value.is_empty() {
                    continue;
                }
                if let Some(score) = score_label(request, context.kind, &context.query, value) {
                    let usage = context
                        .tag_name
                        .as_ref()
                        .and_then(|name| {
                            analysis.tag_value_counts.get(&(name.clone(), value.clone()))
                        })
                        .copied()
                        .unwrap_or(0);
                    candidates.push(Candidate {
                        label: value.clone(),
                        score,
                        usage,
                        kind: CompletionItemKind::VALUE,
                        template: None,
                    });
                }
            }
        }
        ContextKind::Date | ContextKind::Unknown => {}
    }

    // relevance first, then frequency, then a stable name order
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.usage.cmp(&a.usage))
            .then_with(|| a.label.cmp(&b.label))
    });
    candidates.truncate(request.max_results);

    candidates
        .into_iter()
        .enumerate()
        .map(|(rank, candidate)| build_item(request, context, rank, candidate))
        .collect()
}

fn build_item(
    request: &CompletionRequest<'_>,
    context: &CursorContext,
    rank: usize,
    candidate: Candidate,
) -> CompletionItem {
    let replace_range = Range {
        start: Position { line: request.line, character: context.replace_start },
        end: Position { line: request.line, character: request.character },
    };

    let mut item = CompletionItem {
        label: candidate.label.clone(),
        kind: Some(candidate.kind),
        // zero-padded rank so the editor preserves our order
        sort_text: Some(format!("{rank:04}")),
        // identical filter text on every item defeats editor re-scoring
        filter_text: Some(context.query.clone()),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: replace_range,
            new_text: candidate.label.clone(),
        })),
        ..Default::default()
    };
    if request.show_counts && candidate.usage > 0 {
        item.detail = Some(format!("used {} time{}", candidate.usage, plural(candidate.usage)));
    }

    if let Some(template) = candidate.template {
        if request.snippet_support {
            let snippet = template_snippet(&candidate.label, &template);
            item.insert_text_format = Some(InsertTextFormat::SNIPPET);
            item.text_edit = Some(CompletionTextEdit::Edit(TextEdit {
                range: replace_range,
                new_text: snippet,
            }));
        }
    }
    item
}

/// Render a payee template as a snippet: accounts verbatim, each amount a
/// numbered placeholder, `$0` parking the cursor at the end.
fn template_snippet(payee: &str, template: &PostingTemplate) -> String {
    let mut snippet = escape_snippet(payee);
    let mut stop = 0usize;
    for posting in &template.postings {
        snippet.push_str("\n    ");
        snippet.push_str(&escape_snippet(&posting.account));
        if let Some(amount) = &posting.amount {
            stop += 1;
            snippet.push_str("  ");
            snippet.push_str(&format!("${{{stop}:{}}}", escape_snippet(amount)));
        }
    }
    snippet.push_str("\n$0");
    snippet
}

fn escape_snippet(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '$' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn date_items(
    request: &CompletionRequest<'_>,
    analysis: &AnalysisResult,
    context: &CursorContext,
) -> Vec<CompletionItem> {
    let style = analysis.date_style;
    let mut labels: Vec<(String, &'static str)> = Vec::new();
    labels.push((style.format(request.today), "today"));
    if let Some(yesterday) = request.today.pred_opt() {
        labels.push((style.format(yesterday), "yesterday"));
    }
    if let Some(tomorrow) = request.today.succ_opt() {
        labels.push((style.format(tomorrow), "tomorrow"));
    }
    for date in analysis.dates.iter().rev() {
        if !labels.iter().any(|(label, _)| label == date) {
            labels.push((date.clone(), ""));
        }
    }

    let replace_range = Range {
        start: Position { line: request.line, character: context.replace_start },
        end: Position { line: request.line, character: request.character },
    };

    labels
        .into_iter()
        .filter(|(label, _)| fuzzy::fuzzy_score(&context.query, label).is_some())
        .take(request.max_results)
        .enumerate()
        .map(|(rank, (label, detail))| CompletionItem {
            label: label.clone(),
            kind: Some(CompletionItemKind::CONSTANT),
            detail: (!detail.is_empty()).then(|| detail.to_string()),
            sort_text: Some(format!("{rank:04}")),
            filter_text: Some(context.query.clone()),
            text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                range: replace_range,
                new_text: label,
            })),
            ..Default::default()
        })
        .collect()
}

fn plural(count: u32) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_journal::ParserOptions;
    use hledger_resolve::{FileLoader, LoadFailure, ResolveConfig, Resolver};
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    struct OneFile(String);

    impl FileLoader for OneFile {
        fn load(&self, path: &Path) -> Result<String, LoadFailure> {
            (path == Path::new("/t/main.journal"))
                .then(|| self.0.clone())
                .ok_or(LoadFailure::NotFound)
        }
    }

    fn analysis_of(journal: &str) -> AnalysisResult {
        let resolver = Resolver::new();
        let resolved = resolver.resolve_with(
            Path::new("/t/main.journal"),
            &OneFile(journal.to_string()),
            &ResolveConfig::default(),
            &ParserOptions { fallback_year: 2024 },
        );
        hledger_analysis::analyze(&resolved)
    }

    fn run(journal: &str, doc: &str, line: u32, character: u32) -> CompletionList {
        let analysis = analysis_of(journal);
        let line_index = LineIndex::new(doc);
        let request = CompletionRequest {
            text: doc,
            line_index: &line_index,
            line,
            character,
            trigger_character: None,
            snippet_support: true,
            max_results: 50,
            fuzzy_matching: true,
            show_counts: true,
            today: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap_or_default(),
        };
        complete(&request, &analysis)
    }

    const JOURNAL: &str = "\
2024-01-01 Grocery Store\n    expenses:food  10.00 EUR\n    assets:cash\n\
2024-01-02 Grocery Store\n    expenses:food  12.00 EUR\n    assets:cash\n\
2024-01-03 Grocery Store\n    expenses:food  9.00 EUR\n    assets:cash\n\
2024-01-04 Cinema\n    expenses:rare  5.00 EUR\n    assets:cash\n";

    #[test]
    fn frequent_accounts_rank_first() {
        let doc = format!("{JOURNAL}2024-01-05 x\n    \n");
        let list = run(JOURNAL, &doc, 13, 4);
        assert!(list.is_incomplete);
        let labels: Vec<&str> = list.items.iter().map(|i| i.label.as_str()).collect();
        let food = labels.iter().position(|l| *l == "expenses:food");
        let rare = labels.iter().position(|l| *l == "expenses:rare");
        assert!(food < rare, "expenses:food must sort before expenses:rare");
        let sort_of = |label: &str| {
            list.items
                .iter()
                .find(|i| i.label == label)
                .and_then(|i| i.sort_text.clone())
        };
        assert!(sort_of("expenses:food") < sort_of("expenses:rare"));
    }

    #[test]
    fn all_items_share_filter_text() {
        let doc = format!("{JOURNAL}2024-01-05 x\n    exp\n");
        let list = run(JOURNAL, &doc, 13, 7);
        let mut filters: Vec<Option<String>> =
            list.items.iter().map(|i| i.filter_text.clone()).collect();
        filters.dedup();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0], Some("exp".to_string()));
    }

    #[test]
    fn segment_query_filters_and_ranks() {
        let journal = "\
2024-01-01 a\n    Активы:Альфа:Текущий  1 EUR\n    Активы:Альфа:Альфа-Счет\n\
2024-01-02 b\n    Активы:Альфа:Текущий  1 EUR\n    Расходы:Мобильный телефон\n\
2024-01-03 c\n    Расходы:Мобильный телефон  1 EUR\n    Расходы:Мобильный телефон\n";
        let doc = format!("{journal}2024-01-04 d\n    альф\n");
        let list = run(journal, &doc, 10, 8);
        let labels: Vec<&str> = list.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["Активы:Альфа:Текущий", "Активы:Альфа:Альфа-Счет"]);
    }

    #[test]
    fn payee_items_carry_template_snippets() {
        let doc = format!("{JOURNAL}2024-01-05 Groc\n");
        let list = run(JOURNAL, &doc, 12, 15);
        let item = list.items.iter().find(|i| i.label == "Grocery Store");
        let edit = item.and_then(|i| i.text_edit.clone());
        let Some(CompletionTextEdit::Edit(edit)) = edit else {
            panic!("expected a text edit");
        };
        assert!(edit.new_text.contains("expenses:food"));
        assert!(edit.new_text.contains("${1:9.00 EUR}"));
        assert!(edit.new_text.ends_with("$0"));
        assert_eq!(item.and_then(|i| i.insert_text_format), Some(InsertTextFormat::SNIPPET));
    }

    #[test]
    fn date_items_lead_with_today_then_history_descending() {
        let list = run(JOURNAL, "", 0, 0);
        let labels: Vec<&str> = list.items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "2024-06-15",
                "2024-06-14",
                "2024-06-16",
                "2024-01-04",
                "2024-01-03",
                "2024-01-02",
                "2024-01-01",
            ]
        );
    }

    #[test]
    fn max_results_caps_but_stays_incomplete() {
        let analysis = analysis_of(JOURNAL);
        let doc = format!("{JOURNAL}2024-01-05 x\n    \n");
        let line_index = LineIndex::new(&doc);
        let request = CompletionRequest {
            text: &doc,
            line_index: &line_index,
            line: 13,
            character: 4,
            trigger_character: None,
            snippet_support: false,
            max_results: 1,
            fuzzy_matching: true,
            show_counts: false,
            today: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap_or_default(),
        };
        let list = complete(&request, &analysis);
        assert_eq!(list.items.len(), 1);
        assert!(list.is_incomplete);
        assert_eq!(list.items[0].label, "expenses:food");
    }

    #[test]
    fn text_edit_spans_query_to_cursor() {
        let doc = format!("{JOURNAL}2024-01-05 x\n    exp\n");
        let list = run(JOURNAL, &doc, 13, 7);
        let Some(CompletionTextEdit::Edit(edit)) =
            list.items.first().and_then(|i| i.text_edit.clone())
        else {
            panic!("expected a text edit");
        };
        assert_eq!(edit.range.start, Position { line: 13, character: 4 });
        assert_eq!(edit.range.end, Position { line: 13, character: 7 });
    }

    #[test]
    fn unknown_context_returns_nothing() {
        let list = run(JOURNAL, "prose line\n", 0, 5);
        assert!(list.items.is_empty());
    }
}
