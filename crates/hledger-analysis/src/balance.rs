//! Transaction balance checking.
//!
//! A transaction is balanced when its per-commodity sums are zero,
//! allowing at most one posting with a missing amount (which absorbs the
//! remainder). Postings with a cost annotation balance in the cost's
//! commodity: `@` converts at quantity × unit price, `@@` contributes the
//! total directly with the posting's sign.

use hledger_journal::{Decimal, Transaction};
use std::collections::BTreeMap;

/// Outcome of checking one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceCheck {
    /// Sums are zero, or one elided posting absorbs the remainder
    Balanced,
    /// More than one posting lacks an amount
    MultipleInferred,
    /// Nonzero sums with nothing to absorb them
    Unbalanced(Vec<(String, Decimal)>),
}

/// Check a transaction's per-commodity sums.
pub fn check_balance(transaction: &Transaction) -> BalanceCheck {
    let mut elided = 0usize;
    let mut sums: BTreeMap<String, Decimal> = BTreeMap::new();

    for posting in &transaction.postings {
        let Some(amount) = &posting.amount else {
            elided += 1;
            continue;
        };
        let (commodity, value) = match &posting.cost {
            Some(cost) if cost.is_total => {
                let total = if amount.quantity.is_negative() {
                    cost.amount.quantity.neg()
                } else {
                    cost.amount.quantity
                };
                (cost.amount.commodity.clone(), total)
            }
            Some(cost) => {
                (cost.amount.commodity.clone(), amount.quantity.mul(&cost.amount.quantity))
            }
            None => (amount.commodity.clone(), amount.quantity),
        };
        let entry = sums.entry(commodity).or_insert(Decimal::ZERO);
        *entry = entry.add(&value);
    }

    if elided > 1 {
        return BalanceCheck::MultipleInferred;
    }
    if elided == 1 {
        return BalanceCheck::Balanced;
    }
    let nonzero: Vec<(String, Decimal)> =
        sums.into_iter().filter(|(_, sum)| !sum.is_zero()).collect();
    if nonzero.is_empty() || transaction.postings.is_empty() {
        BalanceCheck::Balanced
    } else {
        BalanceCheck::Unbalanced(nonzero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hledger_journal::{parse_with, ParserOptions};
    use pretty_assertions::assert_eq;

    fn check(src: &str) -> BalanceCheck {
        let journal = parse_with(src, &ParserOptions { fallback_year: 2024 });
        check_balance(&journal.transactions[0])
    }

    #[test]
    fn zero_sum_balances() {
        assert_eq!(
            check("2024-01-01 x\n    a  10.00 EUR\n    b  -10 EUR\n"),
            BalanceCheck::Balanced
        );
    }

    #[test]
    fn one_elided_posting_is_inferred() {
        assert_eq!(check("2024-01-01 x\n    a  10 EUR\n    b\n"), BalanceCheck::Balanced);
    }

    #[test]
    fn two_elided_postings_are_an_error() {
        assert_eq!(
            check("2024-01-01 x\n    a  10 EUR\n    b\n    c\n"),
            BalanceCheck::MultipleInferred
        );
    }

    #[test]
    fn nonzero_sum_is_unbalanced() {
        let result = check("2024-01-01 x\n    a  10 EUR\n    b  -9 EUR\n");
        match result {
            BalanceCheck::Unbalanced(sums) => {
                assert_eq!(sums.len(), 1);
                assert_eq!(sums[0].0, "EUR");
            }
            other => panic!("expected Unbalanced, got {other:?}"),
        }
    }

    #[test]
    fn unit_cost_converts_commodity() {
        assert_eq!(
            check("2024-01-01 x\n    a  10 EUR @ 1.10 USD\n    b  -11 USD\n"),
            BalanceCheck::Balanced
        );
    }

    #[test]
    fn total_cost_follows_posting_sign() {
        assert_eq!(
            check("2024-01-01 x\n    a  -10 EUR @@ 11 USD\n    b  11 USD\n"),
            BalanceCheck::Balanced
        );
    }

    #[test]
    fn commodities_balance_independently() {
        assert_eq!(
            check("2024-01-01 x\n    a  10 EUR\n    b  -10 EUR\n    c  5 USD\n    d  -5 USD\n"),
            BalanceCheck::Balanced
        );
    }
}
