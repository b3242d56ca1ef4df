//! Cursor-context classification and query-text extraction.

/// What the cursor is positioned to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// Account name on a posting or account-taking directive
    Account,
    /// Transaction description area
    Payee,
    /// Commodity symbol in an amount, cost or `commodity` directive
    Commodity,
    /// Tag name inside a comment
    TagName,
    /// Tag value inside a comment
    TagValue,
    /// Transaction date on a fresh line
    Date,
    /// Nothing completable
    Unknown,
}

/// A classified cursor position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorContext {
    /// The classification
    pub kind: ContextKind,
    /// Query text already typed, from the query start to the cursor
    pub query: String,
    /// UTF-16 column where the query (and the replacement range) starts
    pub replace_start: u32,
    /// For [`ContextKind::TagValue`]: the tag name being valued
    pub tag_name: Option<String>,
}

impl CursorContext {
    fn new(kind: ContextKind, query: impl Into<String>, replace_start: u32) -> Self {
        CursorContext { kind, query: query.into(), replace_start, tag_name: None }
    }
}

/// Classify the cursor on one line of text.
///
/// `character` is the cursor's UTF-16 column; `trigger` is the completion
/// trigger character, when the editor sent one.
pub fn classify(line_text: &str, character: u32, trigger: Option<&str>) -> CursorContext {
    let cursor_byte = utf16_col_to_byte(line_text, character);
    let before = &line_text[..cursor_byte];

    if trigger == Some("\n") {
        return CursorContext::new(ContextKind::Date, before.trim_start(), 0);
    }

    // a semicolon before the cursor puts us inside a comment: tag context
    if let Some(semicolon) = before.rfind(';') {
        return classify_comment(line_text, before, semicolon);
    }

    let first_char = line_text.chars().next().unwrap_or(' ');
    if line_text.starts_with("  ") || first_char == '\t' {
        return classify_posting(line_text, before, trigger);
    }
    if line_text.trim().is_empty() {
        return CursorContext::new(ContextKind::Date, before.trim_start(), 0);
    }

    for prefix in ["apply account ", "account "] {
        if line_text.starts_with(prefix) && before.len() >= prefix.len() {
            let query = &before[prefix.len()..];
            return CursorContext::new(
                ContextKind::Account,
                query,
                utf16_len(&line_text[..prefix.len()]),
            );
        }
    }
    if line_text.starts_with("alias ") && !before.is_empty() {
        let start = query_start_after_whitespace(before);
        return CursorContext::new(
            ContextKind::Account,
            &before[start..],
            utf16_len(&before[..start]),
        );
    }
    if line_text.starts_with("commodity ") && before.len() >= "commodity ".len() {
        let start = query_start_after_whitespace(before);
        return CursorContext::new(
            ContextKind::Commodity,
            &before[start..],
            utf16_len(&before[..start]),
        );
    }

    if first_char.is_ascii_digit() {
        return classify_description(before);
    }

    CursorContext::new(ContextKind::Unknown, "", character)
}

fn classify_comment(line_text: &str, before: &str, semicolon: usize) -> CursorContext {
    let comment = &before[semicolon + 1..];
    // the segment after the last comma is the pair being typed
    let segment_start = comment.rfind(',').map(|i| i + 1).unwrap_or(0);
    let segment = &comment[segment_start..];
    let segment_offset = semicolon + 1 + segment_start;

    if let Some(colon) = segment.find(':') {
        let name = segment[..colon].trim().to_string();
        let value_raw = &segment[colon + 1..];
        let lead = value_raw.len() - value_raw.trim_start().len();
        let value_start = segment_offset + colon + 1 + lead;
        let mut context = CursorContext::new(
            ContextKind::TagValue,
            &before[value_start..],
            utf16_len(&line_text[..value_start]),
        );
        context.tag_name = Some(name);
        context
    } else {
        let lead = segment.len() - segment.trim_start().len();
        let name_start = segment_offset + lead;
        CursorContext::new(
            ContextKind::TagName,
            &before[name_start..],
            utf16_len(&line_text[..name_start]),
        )
    }
}

fn classify_posting(line_text: &str, before: &str, trigger: Option<&str>) -> CursorContext {
    if matches!(trigger, Some("@") | Some("=")) {
        let start = query_start_after_whitespace(before);
        return CursorContext::new(
            ContextKind::Commodity,
            &before[start..],
            utf16_len(&before[..start]),
        );
    }

    let indent_len = before.len() - before.trim_start().len();
    let content = &before[indent_len..];

    // past the account/amount separator with a number written: commodity
    if let Some(separator) = find_separator(content) {
        let amount_area = &content[separator..];
        if amount_area.chars().any(|c| c.is_ascii_digit()) {
            let start = query_start_after_whitespace(before);
            return CursorContext::new(
                ContextKind::Commodity,
                &before[start..],
                utf16_len(&before[..start]),
            );
        }
    }

    CursorContext::new(ContextKind::Account, content, utf16_len(&line_text[..indent_len]))
}

fn classify_description(before: &str) -> CursorContext {
    // date, spaces, optional status, spaces, optional code, spaces
    let mut idx = before
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '/' | '.' | '=')))
        .unwrap_or(before.len());
    idx += whitespace_len(&before[idx..]);
    if matches!(before[idx..].chars().next(), Some('*' | '!'))
        && before[idx + 1..].chars().next().map_or(true, char::is_whitespace)
    {
        idx += 1;
        idx += whitespace_len(&before[idx..]);
    }
    if before[idx..].starts_with('(') {
        if let Some(close) = before[idx..].find(')') {
            idx += close + 1;
            idx += whitespace_len(&before[idx..]);
        }
    }
    CursorContext::new(ContextKind::Payee, &before[idx..], utf16_len(&before[..idx]))
}

fn whitespace_len(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Byte offset where the run of non-whitespace containing the cursor
/// begins.
fn query_start_after_whitespace(before: &str) -> usize {
    before.rfind(char::is_whitespace).map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8)).unwrap_or(0)
}

/// First tab or two-space run in a posting body.
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

fn utf16_len(s: &str) -> u32 {
    s.chars().map(|c| c.len_utf16() as u32).sum()
}

fn utf16_col_to_byte(line: &str, character: u32) -> usize {
    let mut utf16 = 0u32;
    for (byte, c) in line.char_indices() {
        if utf16 >= character {
            return byte;
        }
        utf16 += c.len_utf16() as u32;
    }
    line.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify_at(line: &str, character: u32) -> CursorContext {
        classify(line, character, None)
    }

    #[test]
    fn empty_line_is_date_context() {
        assert_eq!(classify_at("", 0).kind, ContextKind::Date);
        assert_eq!(classify_at(" ", 1).kind, ContextKind::Date);
    }

    #[test]
    fn newline_trigger_is_date_context() {
        assert_eq!(classify("2024", 4, Some("\n")).kind, ContextKind::Date);
    }

    #[test]
    fn posting_line_is_account_context() {
        let context = classify_at("    exp", 7);
        assert_eq!(context.kind, ContextKind::Account);
        assert_eq!(context.query, "exp");
        assert_eq!(context.replace_start, 4);
    }

    #[test]
    fn account_query_spans_single_spaces_and_colons() {
        let context = classify_at("    expenses:eating ou", 22);
        assert_eq!(context.kind, ContextKind::Account);
        assert_eq!(context.query, "expenses:eating ou");
    }

    #[test]
    fn fresh_posting_line_is_account_context() {
        // a new indented line with nothing typed yet still completes accounts
        let context = classify_at("    ", 4);
        assert_eq!(context.kind, ContextKind::Account);
        assert_eq!(context.query, "");
        assert_eq!(context.replace_start, 4);
        let context = classify_at("\ta", 2);
        assert_eq!(context.kind, ContextKind::Account);
    }

    #[test]
    fn number_after_separator_makes_commodity_context() {
        let context = classify_at("    expenses:food  10 E", 23);
        assert_eq!(context.kind, ContextKind::Commodity);
        assert_eq!(context.query, "E");
    }

    #[test]
    fn cost_trigger_makes_commodity_context() {
        let context = classify("    a  10 EUR @ ", 16, Some("@"));
        assert_eq!(context.kind, ContextKind::Commodity);
    }

    #[test]
    fn description_area_is_payee_context() {
        let context = classify_at("2024-01-15 * Groc", 17);
        assert_eq!(context.kind, ContextKind::Payee);
        assert_eq!(context.query, "Groc");
        assert_eq!(context.replace_start, 13);
    }

    #[test]
    fn payee_query_skips_code() {
        let context = classify_at("2024-01-15 (42) Sho", 19);
        assert_eq!(context.kind, ContextKind::Payee);
        assert_eq!(context.query, "Sho");
    }

    #[test]
    fn comment_gives_tag_name_context() {
        let context = classify_at("    a  1 EUR ; tri", 18);
        assert_eq!(context.kind, ContextKind::TagName);
        assert_eq!(context.query, "tri");
    }

    #[test]
    fn after_colon_gives_tag_value_context() {
        let context = classify_at("2024-01-01 x ; trip:nor", 23);
        assert_eq!(context.kind, ContextKind::TagValue);
        assert_eq!(context.query, "nor");
        assert_eq!(context.tag_name.as_deref(), Some("trip"));
    }

    #[test]
    fn comma_resets_to_tag_name() {
        let context = classify_at("2024-01-01 x ; trip:norway, mo", 30);
        assert_eq!(context.kind, ContextKind::TagName);
        assert_eq!(context.query, "mo");
    }

    #[test]
    fn account_directive_line() {
        let context = classify_at("account exp", 11);
        assert_eq!(context.kind, ContextKind::Account);
        assert_eq!(context.query, "exp");
        assert_eq!(context.replace_start, 8);
    }

    #[test]
    fn commodity_directive_line() {
        let context = classify_at("commodity EU", 12);
        assert_eq!(context.kind, ContextKind::Commodity);
        assert_eq!(context.query, "EU");
    }

    #[test]
    fn unicode_replace_start_counts_utf16() {
        // "Активы" = 6 UTF-16 units; cursor after "Активы:Ба"
        let context = classify_at("    Активы:Ба", 13);
        assert_eq!(context.kind, ContextKind::Account);
        assert_eq!(context.query, "Активы:Ба");
        assert_eq!(context.replace_start, 4);
    }

    #[test]
    fn unknown_for_prose_lines() {
        assert_eq!(classify_at("random prose", 6).kind, ContextKind::Unknown);
    }
}
