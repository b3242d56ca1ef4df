//! Hand-written, line-oriented lexer for journal files.
//!
//! The lexer never fails: unrecognized runs become [`TokenKind::Text`]
//! tokens and the parser decides what to do with them. Whitespace is
//! significant: an indented line is a posting or posting comment, and a
//! run of two-or-more spaces (or a tab) separates an account name from
//! its amount. Indentation is tokenized explicitly.

use crate::token::{Token, TokenKind};
use hledger_position::{Pos, Span};
use memchr::memchr2;

/// Directives recognized at column 0. Anything else starting a line is
/// plain text.
const DIRECTIVE_KEYWORDS: [&str; 10] =
    ["account", "commodity", "include", "alias", "payee", "decimal-mark", "tag", "P", "D", "Y"];

/// A restartable tokenizer over a text slice.
pub struct Lexer<'a> {
    source: &'a str,
    pos: Pos,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over the given source.
    pub fn new(source: &'a str) -> Self {
        Lexer { source, pos: Pos::start(), tokens: Vec::new() }
    }

    /// Tokenize the whole source. The stream is terminated by `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        while self.pos.byte < self.source.len() {
            self.lex_line();
            self.lex_line_break();
        }
        let end = self.pos;
        self.tokens.push(Token::new(TokenKind::Eof, "", Span::empty(end)));
        self.tokens
    }

    fn lex_line(&mut self) {
        match self.peek() {
            None | Some('\n') | Some('\r') => {}
            Some(c) if c.is_ascii_digit() => self.lex_transaction_header(),
            Some(' ') | Some('\t') => self.lex_indented_line(),
            Some(';') | Some('#') | Some('*') => self.lex_comment(),
            Some(_) => self.lex_directive_or_text(),
        }
    }

    // ---- transaction headers -------------------------------------------

    fn lex_transaction_header(&mut self) {
        self.lex_date();

        // secondary date: 2024-01-15=2024-01-20
        if self.peek() == Some('=') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.lex_single_char(TokenKind::Equals);
            self.lex_date();
        }

        self.skip_inline_spaces();
        if let Some(c @ ('*' | '!')) = self.peek() {
            if self.peek_second().map_or(true, |n| n == ' ' || n == '\t' || n == '\n' || n == '\r')
            {
                let start = self.pos;
                self.bump();
                self.push(TokenKind::Status, c.to_string(), start);
            }
        }

        self.skip_inline_spaces();
        if self.peek() == Some('(') {
            let line = self.rest_of_line();
            if let Some(close) = line.find(')') {
                let start = self.pos;
                let lexeme = line[..=close].to_string();
                self.advance_bytes(close + 1);
                self.push(TokenKind::Code, lexeme, start);
            }
        }

        // description up to `;` or end of line, split on `|`
        let desc_end = self.find_in_line(';');
        let pipe = self.source[self.pos.byte..desc_end].find('|');
        match pipe {
            Some(rel) => {
                let pipe_abs = self.pos.byte + rel;
                self.emit_trimmed_text(pipe_abs, TokenKind::Text);
                self.lex_single_char(TokenKind::Pipe);
                self.emit_trimmed_text(desc_end, TokenKind::Text);
            }
            None => self.emit_trimmed_text(desc_end, TokenKind::Text),
        }

        if self.peek() == Some(';') {
            self.lex_comment();
        }
    }

    fn lex_date(&mut self) {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.bump();
                }
                Some('-' | '/' | '.')
                    if self.peek_second().is_some_and(|c| c.is_ascii_digit()) =>
                {
                    self.bump();
                }
                _ => break,
            }
        }
        let lexeme = self.source[start.byte..self.pos.byte].to_string();
        self.push(TokenKind::Date, lexeme, start);
    }

    // ---- indented lines: postings and posting comments -----------------

    fn lex_indented_line(&mut self) {
        let start = self.pos;
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
        let lexeme = self.source[start.byte..self.pos.byte].to_string();
        self.push(TokenKind::Indent, lexeme, start);

        match self.peek() {
            None | Some('\n') | Some('\r') => {}
            Some(';') => self.lex_comment(),
            Some(_) => self.lex_posting(),
        }
    }

    fn lex_posting(&mut self) {
        let line = self.rest_of_line();
        let account_end = find_account_separator(line).unwrap_or(line.len());
        let account_end_abs = self.pos.byte + account_end;
        self.emit_trimmed_text(account_end_abs, TokenKind::Account);
        self.advance_to(account_end_abs);
        self.lex_amount_tokens();
        if self.peek() == Some(';') {
            self.lex_comment();
        }
    }

    /// Lex amount-position tokens: numbers, commodities, cost and
    /// assertion operators, up to a comment or end of line.
    fn lex_amount_tokens(&mut self) {
        loop {
            self.skip_inline_spaces();
            match self.peek() {
                None | Some('\n') | Some('\r') | Some(';') => break,
                Some('@') => {
                    let start = self.pos;
                    self.bump();
                    if self.peek() == Some('@') {
                        self.bump();
                        self.push(TokenKind::AtAt, "@@", start);
                    } else {
                        self.push(TokenKind::At, "@", start);
                    }
                }
                Some('=') => {
                    let start = self.pos;
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        self.push(TokenKind::DoubleEquals, "==", start);
                    } else {
                        self.push(TokenKind::Equals, "=", start);
                    }
                }
                Some(c @ ('-' | '+')) => {
                    if self.peek_second().is_some_and(|n| n.is_ascii_digit()) {
                        self.lex_number();
                    } else {
                        let start = self.pos;
                        self.bump();
                        self.push(TokenKind::Text, c.to_string(), start);
                    }
                }
                Some(c) if c.is_ascii_digit() => self.lex_number(),
                Some('"') => self.lex_quoted_commodity(),
                Some(_) => self.lex_commodity(),
            }
        }
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.bump();
                }
                // `.`, `,` and single spaces continue the number only when
                // a digit follows; `1.` ends at the `1`
                Some('.' | ',' | ' ')
                    if self.peek_second().is_some_and(|c| c.is_ascii_digit()) =>
                {
                    self.bump();
                }
                _ => break,
            }
        }
        let lexeme = self.source[start.byte..self.pos.byte].to_string();
        self.push(TokenKind::Number, lexeme, start);
    }

    fn lex_quoted_commodity(&mut self) {
        let start = self.pos;
        self.bump(); // opening quote
        while let Some(c) = self.peek() {
            if c == '"' || c == '\n' || c == '\r' {
                break;
            }
            self.bump();
        }
        if self.peek() == Some('"') {
            self.bump();
        }
        let lexeme = self.source[start.byte..self.pos.byte].to_string();
        self.push(TokenKind::Commodity, lexeme, start);
    }

    fn lex_commodity(&mut self) {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace()
                || c.is_ascii_digit()
                || matches!(c, ';' | '@' | '=' | '-' | '+' | '"')
            {
                break;
            }
            self.bump();
        }
        if self.pos.byte == start.byte {
            // guarantee progress on stray operator-like characters
            self.bump();
            let lexeme = self.source[start.byte..self.pos.byte].to_string();
            self.push(TokenKind::Text, lexeme, start);
            return;
        }
        let lexeme = self.source[start.byte..self.pos.byte].to_string();
        self.push(TokenKind::Commodity, lexeme, start);
    }

    // ---- comments ------------------------------------------------------

    /// Lex a comment from the marker (`;`, `#` or column-0 `*`) to the end
    /// of the line. The lexeme is the text after the marker; the span
    /// starts at the marker.
    fn lex_comment(&mut self) {
        let start = self.pos;
        self.bump(); // marker
        let end = self.line_end();
        let lexeme = self.source[self.pos.byte..end].to_string();
        self.advance_to(end);
        self.push(TokenKind::Comment, lexeme, start);
    }

    // ---- directives ----------------------------------------------------

    fn lex_directive_or_text(&mut self) {
        let line = self.rest_of_line();
        let word_end = line.find([' ', '\t']).unwrap_or(line.len());
        let word = &line[..word_end];

        if !DIRECTIVE_KEYWORDS.contains(&word) {
            let end = self.find_in_line(';');
            self.emit_trimmed_text(end, TokenKind::Text);
            if self.peek() == Some(';') {
                self.lex_comment();
            }
            return;
        }

        let start = self.pos;
        let keyword = word.to_string();
        self.advance_bytes(word_end);
        self.push(TokenKind::Directive, keyword.clone(), start);
        self.skip_inline_spaces();
        self.lex_directive_args(&keyword);
    }

    fn lex_directive_args(&mut self, keyword: &str) {
        match keyword {
            // a path may contain spaces and even `;`, take the whole rest
            "include" => {
                let end = self.line_end();
                self.emit_trimmed_text(end, TokenKind::Text);
            }
            "account" => {
                let line = self.rest_of_line();
                let sep = find_account_separator(line).unwrap_or(line.len());
                let semi = line.find(';').unwrap_or(line.len());
                let end_abs = self.pos.byte + sep.min(semi);
                self.emit_trimmed_text(end_abs, TokenKind::Account);
                self.skip_to_comment_or_eol();
            }
            "commodity" | "D" => {
                self.lex_amount_tokens();
            }
            "P" => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.lex_date();
                }
                self.lex_amount_tokens();
            }
            "Y" => {
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    let start = self.pos;
                    while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        self.bump();
                    }
                    let lexeme = self.source[start.byte..self.pos.byte].to_string();
                    self.push(TokenKind::Number, lexeme, start);
                }
                self.skip_to_comment_or_eol();
            }
            // alias old = new: the `=` belongs to the argument, keep raw
            _ => {
                let end = self.find_in_line(';');
                self.emit_trimmed_text(end, TokenKind::Text);
            }
        }
        if self.peek() == Some(';') {
            self.lex_comment();
        }
    }

    // ---- low-level helpers ---------------------------------------------

    fn peek(&self) -> Option<char> {
        self.source[self.pos.byte..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos.byte..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos.advance(ch);
        Some(ch)
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, start: Pos) {
        self.tokens.push(Token::new(kind, lexeme, Span::new(start, self.pos)));
    }

    fn lex_single_char(&mut self, kind: TokenKind) {
        let start = self.pos;
        if let Some(c) = self.bump() {
            self.push(kind, c.to_string(), start);
        }
    }

    fn skip_inline_spaces(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.bump();
        }
    }

    fn skip_to_comment_or_eol(&mut self) {
        let end = self.find_in_line(';');
        self.advance_to(end);
    }

    /// Byte offset of the end of the current line (exclusive of the break).
    fn line_end(&self) -> usize {
        match memchr2(b'\n', b'\r', self.source[self.pos.byte..].as_bytes()) {
            Some(i) => self.pos.byte + i,
            None => self.source.len(),
        }
    }

    fn rest_of_line(&self) -> &'a str {
        &self.source[self.pos.byte..self.line_end()]
    }

    /// Byte offset of `needle` in the current line, or the line end.
    fn find_in_line(&self, needle: char) -> usize {
        match self.rest_of_line().find(needle) {
            Some(i) => self.pos.byte + i,
            None => self.line_end(),
        }
    }

    fn advance_bytes(&mut self, n: usize) {
        let target = self.pos.byte + n;
        self.advance_to(target);
    }

    fn advance_to(&mut self, target: usize) {
        while self.pos.byte < target {
            if self.bump().is_none() {
                break;
            }
        }
    }

    /// Emit the trimmed content of `[pos, end)` as a token, positioning the
    /// span exactly over the non-whitespace text. Emits nothing when the
    /// range is all whitespace.
    fn emit_trimmed_text(&mut self, end: usize, kind: TokenKind) {
        let end = end.max(self.pos.byte);
        let raw = &self.source[self.pos.byte..end];
        let lead = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        self.advance_bytes(lead);
        if trimmed.is_empty() {
            self.advance_to(end);
            return;
        }
        let start = self.pos;
        self.advance_bytes(trimmed.len());
        self.push(kind, trimmed.to_string(), start);
        self.advance_to(end);
    }

    fn lex_line_break(&mut self) {
        let start = self.pos;
        match self.peek() {
            Some('\r') => {
                self.bump();
                if self.peek() == Some('\n') {
                    self.bump();
                }
                self.push(TokenKind::Newline, "\n", start);
            }
            Some('\n') => {
                self.bump();
                self.push(TokenKind::Newline, "\n", start);
            }
            _ => {}
        }
    }
}

/// Find the byte offset of the account/amount separator in a posting line:
/// the first tab or first run of two-or-more spaces.
fn find_account_separator(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\t' {
            return Some(i);
        }
        if bytes[i] == b' ' && i + 1 < bytes.len() && bytes[i + 1] == b' ' {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    fn lexemes_of(source: &str, kind: TokenKind) -> Vec<String> {
        Lexer::new(source)
            .tokenize()
            .into_iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn transaction_header_tokens() {
        let src = "2024-01-15 * (42) Grocery Store | weekly run ; note:x\n";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Date,
                TokenKind::Status,
                TokenKind::Code,
                TokenKind::Text,
                TokenKind::Pipe,
                TokenKind::Text,
                TokenKind::Comment,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(lexemes_of(src, TokenKind::Text), vec!["Grocery Store", "weekly run"]);
        assert_eq!(lexemes_of(src, TokenKind::Code), vec!["(42)"]);
    }

    #[test]
    fn secondary_date() {
        let src = "2024-01-15=2024-01-20 Payee\n";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Date,
                TokenKind::Equals,
                TokenKind::Date,
                TokenKind::Text,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn posting_with_amount() {
        let src = "    expenses:food  10.50 EUR\n";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Indent,
                TokenKind::Account,
                TokenKind::Number,
                TokenKind::Commodity,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(lexemes_of(src, TokenKind::Account), vec!["expenses:food"]);
        assert_eq!(lexemes_of(src, TokenKind::Number), vec!["10.50"]);
    }

    #[test]
    fn account_names_may_contain_single_spaces() {
        let src = "    expenses:eating out  5 EUR\n";
        assert_eq!(lexemes_of(src, TokenKind::Account), vec!["expenses:eating out"]);
    }

    #[test]
    fn commodity_on_the_left() {
        let src = "    assets:cash  $-1,200.00 @@ 1000 EUR == 5 EUR\n";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Indent,
                TokenKind::Account,
                TokenKind::Commodity,
                TokenKind::Number,
                TokenKind::AtAt,
                TokenKind::Number,
                TokenKind::Commodity,
                TokenKind::DoubleEquals,
                TokenKind::Number,
                TokenKind::Commodity,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
        assert_eq!(lexemes_of(src, TokenKind::Number), vec!["-1,200.00", "1000", "5"]);
    }

    #[test]
    fn incomplete_number_stops_at_the_dot() {
        let src = "    a  1.\n";
        assert_eq!(lexemes_of(src, TokenKind::Number), vec!["1"]);
        // the dangling dot surfaces as a commodity-position token for the
        // parser to reject
        assert!(kinds(src).contains(&TokenKind::Commodity));
    }

    #[test]
    fn indented_comment_is_a_comment() {
        let src = "    ; posting note\n";
        assert_eq!(
            kinds(src),
            vec![TokenKind::Indent, TokenKind::Comment, TokenKind::Newline, TokenKind::Eof]
        );
        assert_eq!(lexemes_of(src, TokenKind::Comment), vec![" posting note"]);
    }

    #[test]
    fn column_zero_comment_markers() {
        for src in ["; c\n", "# c\n", "* c\n"] {
            assert_eq!(kinds(src), vec![TokenKind::Comment, TokenKind::Newline, TokenKind::Eof]);
        }
    }

    #[test]
    fn directives_are_recognized() {
        let src = "account expenses:food\ninclude other.journal\nY 2024\n";
        assert_eq!(
            kinds(src),
            vec![
                TokenKind::Directive,
                TokenKind::Account,
                TokenKind::Newline,
                TokenKind::Directive,
                TokenKind::Text,
                TokenKind::Newline,
                TokenKind::Directive,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unknown_line_is_text() {
        let src = "frobnicate the books\n";
        assert_eq!(kinds(src), vec![TokenKind::Text, TokenKind::Newline, TokenKind::Eof]);
    }

    #[test]
    fn unicode_accounts_and_positions() {
        let src = "    Активы:Кошелек  100 RUB\n";
        let tokens = Lexer::new(src).tokenize();
        let account = tokens.iter().find(|t| t.kind == TokenKind::Account).cloned();
        let account = account.map(|t| (t.lexeme, t.span.start.utf16_col, t.span.end.utf16_col));
        assert_eq!(account, Some(("Активы:Кошелек".to_string(), 4, 18)));
    }

    #[test]
    fn quoted_commodity() {
        let src = "    assets:broker  2 \"AAPL shares\"\n";
        assert_eq!(lexemes_of(src, TokenKind::Commodity), vec!["\"AAPL shares\""]);
    }

    #[test]
    fn crlf_input() {
        let src = "2024-01-15 Payee\r\n    a  1 EUR\r\n";
        assert!(kinds(src).ends_with(&[TokenKind::Newline, TokenKind::Eof]));
    }

    #[test]
    fn lexer_never_fails_on_garbage() {
        let src = "\u{0}\u{1}\t 🤖 ;;; ==@@@\n\n   \n2024-99-99\n";
        let tokens = Lexer::new(src).tokenize();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}
