//! Hover panels.

use crate::element::Element;
use hledger_analysis::AnalysisResult;
use hledger_journal::Decimal;
use hledger_resolve::ResolvedJournal;
use std::collections::BTreeMap;

/// Build the Markdown hover panel for an element, or `None` when there is
/// nothing useful to show.
pub fn hover(
    resolved: &ResolvedJournal,
    analysis: &AnalysisResult,
    element: &Element,
) -> Option<String> {
    match element {
        Element::Account { name, .. } => {
            let mut balances: BTreeMap<String, Decimal> = BTreeMap::new();
            let mut postings = 0u32;
            for (_, journal) in resolved.files_in_order() {
                for (_, posting) in journal.postings() {
                    if posting.account != *name {
                        continue;
                    }
                    postings += 1;
                    if let Some(amount) = &posting.amount {
                        let entry =
                            balances.entry(amount.commodity.clone()).or_insert(Decimal::ZERO);
                        *entry = entry.add(&amount.quantity);
                    }
                }
            }

            let mut panel = format!("**Account** `{name}`\n");
            if !balances.is_empty() {
                panel.push_str("\nBalance:\n");
                for (commodity, sum) in &balances {
                    if commodity.is_empty() {
                        panel.push_str(&format!("- {sum}\n"));
                    } else {
                        panel.push_str(&format!("- {sum} {commodity}\n"));
                    }
                }
            }
            panel.push_str(&format!("\nPostings: {postings}"));
            Some(panel)
        }
        Element::Amount { amount, cost, .. } => {
            let mut panel = format!("**Amount** {}", amount.raw_text.trim());
            if let Some(cost) = cost {
                let op = if cost.is_total { "@@" } else { "@" };
                panel.push_str(&format!("\n\nCost: {op} {}", cost.amount.raw_text.trim()));
            }
            Some(panel)
        }
        Element::Payee { name, .. } => {
            let count = analysis.payee_counts.get(name).copied().unwrap_or(0);
            Some(format!("**Payee** {name}\n\nTransactions: {count}"))
        }
        Element::TagName { name, .. } => {
            let count = analysis.tag_counts.get(name).copied().unwrap_or(0);
            let mut panel = format!("**Tag** `{name}`\n\nUsed {count} time{}\n", plural(count));
            if let Some(values) = analysis.tag_values.get(name) {
                panel.push_str("\nValues:\n");
                for value in values {
                    if value.is_empty() {
                        panel.push_str("- (empty)\n");
                    } else {
                        panel.push_str(&format!("- {value}\n"));
                    }
                }
            }
            Some(panel.trim_end().to_string())
        }
        Element::TagValue { name, value, .. } => {
            let count = analysis
                .tag_value_counts
                .get(&(name.clone(), value.clone()))
                .copied()
                .unwrap_or(0);
            Some(format!(
                "**Tag** `{name}` = `{value}`\n\nUsed {count} time{}",
                plural(count)
            ))
        }
        Element::Commodity { name, .. } => {
            let count = analysis.commodity_counts.get(name).copied().unwrap_or(0);
            Some(format!("**Commodity** `{name}`\n\nAmounts: {count}"))
        }
    }
}

fn plural(count: u32) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
