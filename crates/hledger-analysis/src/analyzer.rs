//! The analyzer: one pass to collect, one pass to validate.

use crate::balance::{check_balance, BalanceCheck};
use crate::commodity_format::CommodityFormat;
use crate::types::*;
use chrono::NaiveDate;
use hledger_journal::{Amount, DateStyle, Directive, ParseErrorSeverity};
use hledger_resolve::{LoadErrorKind, ResolvedJournal};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Build an [`AnalysisResult`] from a resolved workspace.
pub fn analyze(resolved: &ResolvedJournal) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut separator_counts: FxHashMap<char, u32> = FxHashMap::default();
    let mut tag_values: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    // payee → (date, visit ordinal) of the freshest transaction seen
    let mut template_keys: FxHashMap<String, (NaiveDate, usize)> = FxHashMap::default();
    let mut ordinal = 0usize;

    // pass 1: collect inventories
    for (_path, journal) in resolved.files_in_order() {
        for directive in &journal.directives {
            match directive {
                Directive::Account(decl) => {
                    result.accounts.declared.insert(decl.name.clone());
                    result.accounts.counts.entry(decl.name.clone()).or_insert(0);
                }
                Directive::Commodity(decl) => {
                    result.declared_commodities.insert(decl.symbol.clone());
                    result.commodity_counts.entry(decl.symbol.clone()).or_insert(0);
                    if let Some(example) = &decl.format {
                        if let Some((_, format)) = CommodityFormat::parse(example) {
                            result.commodity_formats.insert(decl.symbol.clone(), format);
                        }
                    }
                }
                Directive::Price(decl) => {
                    result.commodity_counts.entry(decl.commodity.clone()).or_insert(0);
                    record_amount_commodity(&mut result.commodity_counts, &decl.amount);
                }
                _ => {}
            }
        }

        for transaction in &journal.transactions {
            ordinal += 1;
            dates.insert(transaction.primary_date.date);
            *separator_counts.entry(transaction.primary_date.separator).or_insert(0) += 1;

            if let Some(payee) = &transaction.payee {
                *result.payee_counts.entry(payee.clone()).or_insert(0) += 1;

                let key = (transaction.primary_date.date, ordinal);
                let is_fresher = template_keys.get(payee).map_or(true, |prev| key >= *prev);
                if is_fresher && !transaction.postings.is_empty() {
                    template_keys.insert(payee.clone(), key);
                    result.templates.insert(
                        payee.clone(),
                        PostingTemplate {
                            date: transaction.primary_date.date,
                            postings: transaction
                                .postings
                                .iter()
                                .map(|p| TemplatePosting {
                                    account: p.account.clone(),
                                    amount: p.amount.as_ref().map(|a| a.raw_text.clone()),
                                })
                                .collect(),
                        },
                    );
                }
            }

            for tag in transaction.tags.iter().chain(
                transaction.postings.iter().flat_map(|p| p.tags.iter()),
            ) {
                *result.tag_counts.entry(tag.name.clone()).or_insert(0) += 1;
                tag_values.entry(tag.name.clone()).or_default().insert(tag.value.clone());
                *result
                    .tag_value_counts
                    .entry((tag.name.clone(), tag.value.clone()))
                    .or_insert(0) += 1;
            }

            for posting in &transaction.postings {
                *result.accounts.counts.entry(posting.account.clone()).or_insert(0) += 1;
                for amount in [
                    posting.amount.as_ref(),
                    posting.cost.as_ref().map(|c| &c.amount),
                    posting.balance_assertion.as_ref().map(|a| &a.amount),
                ]
                .into_iter()
                .flatten()
                {
                    record_amount_commodity(&mut result.commodity_counts, amount);
                }
            }
        }
    }

    // derived, explicitly sorted views
    result.accounts.all = ranked_names(&result.accounts.counts);
    for account in &result.accounts.all {
        for prefix in segment_prefixes(account) {
            result.accounts.by_prefix.entry(prefix).or_default().push(account.clone());
        }
    }
    result.payees = ranked_entries(&result.payee_counts);
    result.commodities = ranked_entries(&result.commodity_counts);
    result.tag_names = ranked_entries(&result.tag_counts);
    result.tag_values =
        tag_values.into_iter().map(|(name, values)| (name, values.into_iter().collect())).collect();
    result.date_style = dominant_style(&separator_counts);
    result.dates = dates.iter().map(|d| result.date_style.format(*d)).collect();

    // pass 2: validation, in deterministic file/source order
    for (path, journal) in resolved.files_in_order() {
        collect_file_diagnostics(&mut result, path, journal);
    }
    for error in &resolved.load_errors {
        let (path, span) = match &error.site {
            Some(site) => (site.path.clone(), site.span),
            None => (error.path.clone(), Default::default()),
        };
        result.diagnostics.push(AnalysisDiagnostic {
            code: match error.kind {
                LoadErrorKind::FileNotFound => DiagnosticCode::FileNotFound,
                LoadErrorKind::FileTooLarge { .. } => DiagnosticCode::FileTooLarge,
                LoadErrorKind::EncodingError => DiagnosticCode::EncodingError,
                LoadErrorKind::CycleDetected => DiagnosticCode::CycleDetected,
                LoadErrorKind::TooDeep(_) => DiagnosticCode::FileNotFound,
            },
            severity: DiagnosticSeverity::Error,
            path,
            span,
            message: error.message(),
        });
    }

    result
}

fn collect_file_diagnostics(
    result: &mut AnalysisResult,
    path: &PathBuf,
    journal: &hledger_journal::Journal,
) {
    for error in &journal.parse_errors {
        result.diagnostics.push(AnalysisDiagnostic {
            code: DiagnosticCode::ParseError,
            severity: match error.severity {
                ParseErrorSeverity::Error => DiagnosticSeverity::Error,
                ParseErrorSeverity::Hint => DiagnosticSeverity::Hint,
            },
            path: path.clone(),
            span: error.span,
            message: error.message.clone(),
        });
    }

    for transaction in &journal.transactions {
        match check_balance(transaction) {
            BalanceCheck::Balanced => {}
            BalanceCheck::MultipleInferred => {
                result.diagnostics.push(AnalysisDiagnostic {
                    code: DiagnosticCode::MultipleInferred,
                    severity: DiagnosticSeverity::Error,
                    path: path.clone(),
                    span: transaction.span,
                    message: "more than one posting without an amount".to_string(),
                });
            }
            BalanceCheck::Unbalanced(sums) => {
                let detail = sums
                    .iter()
                    .map(|(commodity, sum)| {
                        if commodity.is_empty() {
                            sum.to_string()
                        } else {
                            format!("{sum} {commodity}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                result.diagnostics.push(AnalysisDiagnostic {
                    code: DiagnosticCode::Unbalanced,
                    severity: DiagnosticSeverity::Error,
                    path: path.clone(),
                    span: transaction.span,
                    message: format!("transaction does not balance: {detail}"),
                });
            }
        }

        for posting in &transaction.postings {
            if !result.accounts.declared.contains(&posting.account) {
                result.diagnostics.push(AnalysisDiagnostic {
                    code: DiagnosticCode::UndeclaredAccount,
                    severity: DiagnosticSeverity::Warning,
                    path: path.clone(),
                    span: posting.account_span,
                    message: format!("undeclared account `{}`", posting.account),
                });
            }
            if let Some(amount) = &posting.amount {
                if !amount.commodity.is_empty()
                    && !result.declared_commodities.contains(&amount.commodity)
                {
                    result.diagnostics.push(AnalysisDiagnostic {
                        code: DiagnosticCode::UndeclaredCommodity,
                        severity: DiagnosticSeverity::Warning,
                        path: path.clone(),
                        span: amount.commodity_span.unwrap_or(amount.span),
                        message: format!("undeclared commodity `{}`", amount.commodity),
                    });
                }
            }
        }
    }
}

fn record_amount_commodity(counts: &mut FxHashMap<String, u32>, amount: &Amount) {
    if !amount.commodity.is_empty() {
        *counts.entry(amount.commodity.clone()).or_insert(0) += 1;
    }
}

/// Names sorted by descending usage, then ascending name.
fn ranked_names(counts: &FxHashMap<String, u32>) -> Vec<String> {
    let mut names: Vec<&String> = counts.keys().collect();
    names.sort_by(|a, b| {
        let ca = counts.get(*a).copied().unwrap_or(0);
        let cb = counts.get(*b).copied().unwrap_or(0);
        cb.cmp(&ca).then_with(|| a.cmp(b))
    });
    names.into_iter().cloned().collect()
}

fn ranked_entries(counts: &FxHashMap<String, u32>) -> Vec<UsageEntry> {
    ranked_names(counts)
        .into_iter()
        .map(|name| {
            let count = counts.get(&name).copied().unwrap_or(0);
            UsageEntry { name, count }
        })
        .collect()
}

/// Colon-terminated prefixes of an account name, shortest first:
/// `expenses:food:fruit` → `expenses:`, `expenses:food:`.
fn segment_prefixes(account: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let segments: Vec<&str> = account.split(':').collect();
    for take in 1..segments.len() {
        prefixes.push(format!("{}:", segments[..take].join(":")));
    }
    prefixes
}

fn dominant_style(separator_counts: &FxHashMap<char, u32>) -> DateStyle {
    let mut best = ('-', 0u32);
    for candidate in ['-', '/', '.'] {
        let count = separator_counts.get(&candidate).copied().unwrap_or(0);
        if count > best.1 {
            best = (candidate, count);
        }
    }
    DateStyle { separator: best.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_resolve::{FileLoader, LoadFailure, ResolveConfig, Resolver};
    use hledger_journal::ParserOptions;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    struct MapLoader(Vec<(PathBuf, String)>);

    impl FileLoader for MapLoader {
        fn load(&self, path: &Path) -> Result<String, LoadFailure> {
            self.0
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, text)| text.clone())
                .ok_or(LoadFailure::NotFound)
        }
    }

    fn analyze_files(files: &[(&str, &str)]) -> AnalysisResult {
        let loader = MapLoader(
            files.iter().map(|(p, t)| (PathBuf::from(p), t.to_string())).collect(),
        );
        let resolver = Resolver::new();
        let resolved = resolver.resolve_with(
            Path::new(files[0].0),
            &loader,
            &ResolveConfig::default(),
            &ParserOptions { fallback_year: 2024 },
        );
        analyze(&resolved)
    }

    fn analyze_one(text: &str) -> AnalysisResult {
        analyze_files(&[("/t/main.journal", text)])
    }

    #[test]
    fn accounts_rank_by_usage_then_name() {
        let result = analyze_one(
            "2024-01-01 a\n    expenses:food  1 EUR\n    assets:cash\n\
             2024-01-02 b\n    expenses:food  1 EUR\n    assets:cash\n\
             2024-01-03 c\n    expenses:food  1 EUR\n    expenses:rare\n",
        );
        assert_eq!(result.accounts.counts.get("expenses:food"), Some(&3));
        assert_eq!(result.accounts.all[0], "expenses:food");
        let prefixed = result.accounts.by_prefix.get("expenses:").cloned().unwrap_or_default();
        assert_eq!(prefixed, vec!["expenses:food".to_string(), "expenses:rare".to_string()]);
    }

    #[test]
    fn declared_but_unused_accounts_are_indexed() {
        let result = analyze_one("account liabilities:card\n");
        assert!(result.accounts.all.contains(&"liabilities:card".to_string()));
        assert_eq!(result.accounts.counts.get("liabilities:card"), Some(&0));
        assert!(result.accounts.declared.contains("liabilities:card"));
    }

    #[test]
    fn commodity_formats_last_declaration_wins() {
        let result = analyze_one(
            "commodity $1000.00\ncommodity $1,000.000\n",
        );
        let format = result.commodity_formats.get("$").cloned();
        assert_eq!(format.map(|f| f.precision), Some(3));
    }

    #[test]
    fn tags_and_values_are_collected() {
        let result = analyze_one(
            "2024-01-01 x ; trip:norway, mood:good\n    a  1 EUR ; trip:sweden\n    b\n",
        );
        assert_eq!(result.tag_counts.get("trip"), Some(&2));
        assert_eq!(
            result.tag_values.get("trip"),
            Some(&vec!["norway".to_string(), "sweden".to_string()])
        );
        assert_eq!(result.tag_value_counts.get(&("trip".into(), "norway".into())), Some(&1));
    }

    #[test]
    fn dates_are_distinct_sorted_and_styled() {
        let result = analyze_one(
            "2024/01/03 a\n    x  1 E\n    y\n2024/01/01 b\n    x  1 E\n    y\n2024/01/03 c\n    x  1 E\n    y\n",
        );
        assert_eq!(result.dates, vec!["2024/01/01".to_string(), "2024/01/03".to_string()]);
    }

    #[test]
    fn templates_keep_the_most_recent_transaction() {
        let result = analyze_one(
            "2024-01-05 Shop\n    expenses:old  1 EUR\n    assets:cash\n\
             2024-02-01 Shop\n    expenses:new  2 EUR\n    assets:cash\n",
        );
        let template = result.templates.get("Shop").cloned();
        let accounts: Vec<String> =
            template.map(|t| t.postings.iter().map(|p| p.account.clone()).collect()).unwrap_or_default();
        assert_eq!(accounts, vec!["expenses:new".to_string(), "assets:cash".to_string()]);
        let template = result.templates.get("Shop").cloned();
        assert_eq!(
            template.and_then(|t| t.postings[0].amount.clone()),
            Some("2 EUR".to_string())
        );
    }

    #[test]
    fn undeclared_warnings_respect_external_declarations() {
        let result = analyze_files(&[
            ("/t/main.journal", "include decls.journal\n2024-01-01 x\n    expenses:food  1 EUR\n    assets:cash\n"),
            ("/t/decls.journal", "account expenses:food\ncommodity EUR\n"),
        ]);
        let undeclared_accounts: Vec<&AnalysisDiagnostic> = result
            .diagnostics
            .iter()
            .filter(|d| d.code == DiagnosticCode::UndeclaredAccount)
            .collect();
        // only assets:cash is undeclared; EUR is declared in the sibling
        assert_eq!(undeclared_accounts.len(), 1);
        assert!(undeclared_accounts[0].message.contains("assets:cash"));
        assert!(!result
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::UndeclaredCommodity));
    }

    #[test]
    fn unbalanced_and_multiple_inferred_are_reported() {
        let result = analyze_one(
            "2024-01-01 bad\n    a  10 EUR\n    b  -9 EUR\n2024-01-02 worse\n    a  10 EUR\n    b\n    c\n",
        );
        let codes: Vec<DiagnosticCode> = result
            .diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .map(|d| d.code)
            .collect();
        assert!(codes.contains(&DiagnosticCode::Unbalanced));
        assert!(codes.contains(&DiagnosticCode::MultipleInferred));
    }

    #[test]
    fn analysis_is_deterministic() {
        let text = "2024-01-01 a\n    expenses:food  1 EUR\n    assets:cash\naccount assets:cash\n";
        let first = analyze_one(text);
        let second = analyze_one(text);
        assert_eq!(first.accounts.all, second.accounts.all);
        assert_eq!(first.payees, second.payees);
        assert_eq!(first.dates, second.dates);
        assert_eq!(first.diagnostics, second.diagnostics);
    }
}
