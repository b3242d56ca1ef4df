//! Tag extraction from comment text.
//!
//! Tags are `name:value` pairs inside comments, separated by commas:
//! `; date:2024-01-05, type:food, flagged:`. A tag name is a maximal run
//! of letters (any script), digits, `_` and `-`; the value extends to the
//! next comma or the end of the comment and is trimmed. Empty values are
//! preserved as `""`.

use crate::ast::Tag;
use hledger_position::{Pos, Span};

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Extract the tags of a comment. `start` is the position of the first
/// character of `text` in the source document.
pub fn extract_tags(text: &str, start: Pos) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut cur = start;
    let mut rest = text;

    while !rest.is_empty() {
        // find the next name-character run
        let Some(ch) = rest.chars().next() else { break };
        if !is_name_char(ch) {
            cur.advance(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        }

        let name_len = rest.chars().take_while(|&c| is_name_char(c)).map(char::len_utf8).sum();
        let name = &rest[..name_len];
        let name_start = cur;
        cur.advance_str(name);
        rest = &rest[name_len..];

        if !rest.starts_with(':') {
            continue;
        }
        let name_span = Span::new(name_start, cur);
        cur.advance(':');
        rest = &rest[1..];

        // value runs to the next comma or end of comment
        let raw_len = rest.find(',').unwrap_or(rest.len());
        let raw_value = &rest[..raw_len];
        let lead = raw_value.len() - raw_value.trim_start().len();
        let value = raw_value.trim();

        let mut value_start = cur;
        value_start.advance_str(&raw_value[..lead]);
        let mut value_end = value_start;
        value_end.advance_str(value);

        cur.advance_str(raw_value);
        rest = &rest[raw_len..];
        if rest.starts_with(',') {
            cur.advance(',');
            rest = &rest[1..];
        }

        tags.push(Tag {
            name: name.to_string(),
            value: value.to_string(),
            span: name_span,
            value_span: if value.is_empty() {
                None
            } else {
                Some(Span::new(value_start, value_end))
            },
        });
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names_and_values(text: &str) -> Vec<(String, String)> {
        extract_tags(text, Pos::start()).into_iter().map(|t| (t.name, t.value)).collect()
    }

    #[test]
    fn simple_pairs() {
        assert_eq!(
            names_and_values(" date:2024-01-05, type:food"),
            vec![
                ("date".to_string(), "2024-01-05".to_string()),
                ("type".to_string(), "food".to_string()),
            ]
        );
    }

    #[test]
    fn empty_value_is_preserved() {
        assert_eq!(names_and_values("flagged:"), vec![("flagged".to_string(), String::new())]);
    }

    #[test]
    fn plain_prose_yields_nothing() {
        assert_eq!(names_and_values("just an ordinary note"), vec![]);
    }

    #[test]
    fn cyrillic_names() {
        assert_eq!(
            names_and_values(" категория:еда"),
            vec![("категория".to_string(), "еда".to_string())]
        );
    }

    #[test]
    fn value_may_contain_colons() {
        assert_eq!(
            names_and_values("link:https://example.com/x, next:y"),
            vec![
                ("link".to_string(), "https://example.com/x".to_string()),
                ("next".to_string(), "y".to_string()),
            ]
        );
    }

    #[test]
    fn spans_track_utf16_columns() {
        let tags = extract_tags("ставка:13%", Pos::start());
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].span.start.utf16_col, 0);
        assert_eq!(tags[0].span.end.utf16_col, 6);
        let vs = tags[0].value_span.as_ref().map(|s| (s.start.utf16_col, s.end.utf16_col));
        assert_eq!(vs, Some((7, 10)));
    }
}
