//! Transaction dates: parsing, default-year resolution and display styles.

use chrono::{Datelike, NaiveDate};
use hledger_position::Span;

/// A parsed transaction date.
///
/// `date` is always a concrete calendar date; short dates (`MM-DD`) have
/// had a year applied by the parser. The raw literal and separator are
/// kept so completion and formatting can reproduce the file's style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartDate {
    /// The resolved calendar date
    pub date: NaiveDate,
    /// The literal as written, e.g. `01/15`
    pub raw: String,
    /// The separator used in the literal: `-`, `/` or `.`
    pub separator: char,
    /// Whether the literal carried an explicit year
    pub had_year: bool,
    /// Source range of the literal
    pub span: Span,
}

/// How a date failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    /// The literal did not have 2 or 3 numeric fields
    #[error("malformed date `{0}`")]
    Malformed(String),
    /// The fields do not name a real calendar day
    #[error("invalid calendar date `{0}`")]
    OutOfRange(String),
}

/// Outcome of resolving a date literal against the year context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDate {
    /// The parsed date
    pub date: SmartDate,
    /// True when no `Y` directive or preceding full date supplied the year
    /// and the fallback year had to be used
    pub used_fallback_year: bool,
}

/// Parse a date literal.
///
/// Accepts `YYYY-MM-DD`, `MM-DD` and single-digit variants with `-`, `/`
/// or `.` as the separator. Short dates take `default_year` when present,
/// otherwise `fallback_year` (flagged in the result).
pub fn parse_date(
    raw: &str,
    span: Span,
    default_year: Option<i32>,
    fallback_year: i32,
) -> Result<ResolvedDate, DateError> {
    let separator = raw
        .chars()
        .find(|c| ['-', '/', '.'].contains(c))
        .ok_or_else(|| DateError::Malformed(raw.to_string()))?;
    let fields: Vec<&str> = raw.split(separator).collect();

    let (year, month, day, had_year, used_fallback) = match fields.as_slice() {
        [y, m, d] => {
            let year: i32 = parse_field(y, raw)?;
            (year, parse_field(m, raw)?, parse_field(d, raw)?, true, false)
        }
        [m, d] => match default_year {
            Some(year) => (year, parse_field(m, raw)?, parse_field(d, raw)?, false, false),
            None => (fallback_year, parse_field(m, raw)?, parse_field(d, raw)?, false, true),
        },
        _ => return Err(DateError::Malformed(raw.to_string())),
    };

    let date = NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .ok_or_else(|| DateError::OutOfRange(raw.to_string()))?;

    Ok(ResolvedDate {
        date: SmartDate { date, raw: raw.to_string(), separator, had_year, span },
        used_fallback_year: used_fallback,
    })
}

fn parse_field(field: &str, raw: &str) -> Result<i32, DateError> {
    if field.is_empty() || field.len() > 4 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateError::Malformed(raw.to_string()));
    }
    field.parse().map_err(|_| DateError::Malformed(raw.to_string()))
}

/// The display style of dates in a file: separator choice.
///
/// Detected as the dominant separator across a file's dates; used when
/// formatting completion items so inserted dates match their journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateStyle {
    /// Separator between year, month and day
    pub separator: char,
}

impl Default for DateStyle {
    fn default() -> Self {
        DateStyle { separator: '-' }
    }
}

impl DateStyle {
    /// Format a date in this style, zero-padded, year first.
    pub fn format(&self, date: NaiveDate) -> String {
        format!(
            "{:04}{sep}{:02}{sep}{:02}",
            date.year(),
            date.month(),
            date.day(),
            sep = self.separator
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn span() -> Span {
        Span::default()
    }

    #[test]
    fn full_dates_with_each_separator() {
        for (raw, sep) in [("2024-01-15", '-'), ("2024/01/15", '/'), ("2024.01.15", '.')] {
            let resolved = parse_date(raw, span(), None, 2000).unwrap();
            assert_eq!(resolved.date.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
            assert_eq!(resolved.date.separator, sep);
            assert!(resolved.date.had_year);
            assert!(!resolved.used_fallback_year);
        }
    }

    #[test]
    fn single_digit_fields() {
        let resolved = parse_date("2024-1-5", span(), None, 2000).unwrap();
        assert_eq!(resolved.date.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }

    #[test]
    fn short_date_takes_default_year() {
        let resolved = parse_date("03/07", span(), Some(2021), 1999).unwrap();
        assert_eq!(resolved.date.date, NaiveDate::from_ymd_opt(2021, 3, 7).unwrap());
        assert!(!resolved.date.had_year);
        assert!(!resolved.used_fallback_year);
    }

    #[test]
    fn short_date_without_default_flags_fallback() {
        let resolved = parse_date("03/07", span(), None, 1999).unwrap();
        assert_eq!(resolved.date.date, NaiveDate::from_ymd_opt(1999, 3, 7).unwrap());
        assert!(resolved.used_fallback_year);
    }

    #[test]
    fn bad_dates_are_errors() {
        assert!(matches!(parse_date("hello", span(), None, 2000), Err(DateError::Malformed(_))));
        assert!(matches!(
            parse_date("2024-13-01", span(), None, 2000),
            Err(DateError::OutOfRange(_))
        ));
        assert!(matches!(parse_date("2024", span(), None, 2000), Err(DateError::Malformed(_))));
    }

    #[test]
    fn style_formats_with_padding() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(DateStyle::default().format(date), "2024-03-07");
        assert_eq!(DateStyle { separator: '/' }.format(date), "2024/03/07");
    }
}
