//! Declared commodity number formats.
//!
//! A `commodity` directive carries an example amount, `$1,000.00` or
//! `1.000,00 EUR`, that fixes how amounts in that commodity are written.
//! The analyzer parses the example into its parts; the formatter replays
//! them when aligning amounts.

use hledger_journal::Decimal;

/// The number format declared for a commodity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommodityFormat {
    /// Decimal mark: `.` or `,`
    pub decimal_sep: char,
    /// Thousands separator, when the example groups digits
    pub group_sep: Option<char>,
    /// Digit group sizes, rightmost first; the last size repeats
    pub digit_groups: Vec<u8>,
    /// Number of fractional digits
    pub precision: u32,
    /// True when the symbol precedes the number
    pub symbol_on_left: bool,
    /// True when a space separates symbol and number
    pub space_between: bool,
}

impl CommodityFormat {
    /// Parse a format example like `$1,000.00` or `1.000,00 EUR`.
    ///
    /// Returns the commodity symbol and the format, or `None` when the
    /// example contains no digits.
    pub fn parse(example: &str) -> Option<(String, CommodityFormat)> {
        let example = example.trim();
        let number_start = example.find(|c: char| c.is_ascii_digit())?;
        let number_end = example
            .rfind(|c: char| c.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(example.len());
        let number = &example[number_start..number_end];
        let before = example[..number_start].trim_end_matches(['-', '+']);
        let after = &example[number_end..];

        let (symbol, symbol_on_left, space_between) = if !before.trim().is_empty() {
            (before.trim().to_string(), true, before.ends_with(char::is_whitespace))
        } else if !after.trim().is_empty() {
            (after.trim().to_string(), false, after.starts_with(char::is_whitespace))
        } else {
            (String::new(), false, false)
        };
        let symbol = symbol.trim_matches('"').to_string();

        // the decimal mark is the last `.` or `,` occurring exactly once
        let decimal_idx = number.rfind(['.', ',']).filter(|&i| {
            let mark = &number[i..i + 1];
            number.matches(mark).count() == 1
        });

        let (int_part, precision, decimal_sep) = match decimal_idx {
            Some(i) => {
                let mark = number[i..].chars().next().unwrap_or('.');
                (&number[..i], (number.len() - i - 1) as u32, mark)
            }
            None => (number, 0, '.'),
        };

        let group_sep = int_part.chars().find(|c| ['.', ',', ' '].contains(c));
        let digit_groups = match group_sep {
            Some(sep) => {
                let mut groups: Vec<u8> =
                    int_part.split(sep).skip(1).map(|g| g.len() as u8).collect();
                groups.reverse();
                groups.dedup();
                groups
            }
            None => Vec::new(),
        };

        Some((
            symbol,
            CommodityFormat {
                decimal_sep,
                group_sep,
                digit_groups,
                precision,
                symbol_on_left,
                space_between,
            },
        ))
    }

    /// Render a quantity in this format with the given symbol.
    pub fn render(&self, quantity: Decimal, symbol: &str) -> String {
        let number = quantity.format_grouped(
            self.precision,
            self.decimal_sep,
            self.group_sep,
            &self.digit_groups,
        );
        if symbol.is_empty() {
            return number;
        }
        let space = if self.space_between { " " } else { "" };
        if self.symbol_on_left {
            format!("{symbol}{space}{number}")
        } else {
            format!("{number}{space}{symbol}")
        }
    }
}
