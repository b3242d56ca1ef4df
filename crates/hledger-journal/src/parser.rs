//! Error-recovering parser: token stream → [`Journal`].
//!
//! The parser always returns a journal. On a mismatch it records a
//! [`ParseError`] and discards tokens up to the next line starting with a
//! date or a directive keyword, so one bad line never poisons the rest of
//! the file. A malformed posting is dropped without taking its sibling
//! postings down with it.

use crate::ast::*;
use crate::date::{parse_date, SmartDate};
use crate::decimal::Decimal;
use crate::lexer::Lexer;
use crate::tags::extract_tags;
use crate::token::{Token, TokenKind};
use chrono::Datelike;
use hledger_position::Span;

/// Options controlling parsing.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Year applied to short dates when neither a `Y` directive nor a
    /// preceding full date supplies one. Defaults to the current year.
    pub fallback_year: i32,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions { fallback_year: chrono::Local::now().year() }
    }
}

/// Parse a journal, using the current system year as the short-date
/// fallback.
pub fn parse(text: &str) -> Journal {
    parse_with(text, &ParserOptions::default())
}

/// Parse a journal with explicit options.
pub fn parse_with(text: &str, options: &ParserOptions) -> Journal {
    let tokens = Lexer::new(text).tokenize();
    Parser {
        source: text,
        tokens,
        idx: 0,
        default_year: None,
        last_full_year: None,
        fallback_year: options.fallback_year,
        journal: Journal::default(),
    }
    .run()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    idx: usize,
    default_year: Option<i32>,
    last_full_year: Option<i32>,
    fallback_year: i32,
    journal: Journal,
}

impl<'a> Parser<'a> {
    fn run(mut self) -> Journal {
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.bump();
                }
                TokenKind::Date => self.parse_transaction(),
                TokenKind::Directive => self.parse_directive(),
                TokenKind::Comment => {
                    let comment = self.take_comment();
                    self.journal.comments.push(comment.0);
                }
                TokenKind::Indent => {
                    let indent_span = self.peek().span;
                    self.bump();
                    match self.peek().kind {
                        TokenKind::Newline | TokenKind::Eof => {}
                        TokenKind::Comment => {
                            let comment = self.take_comment();
                            self.journal.comments.push(comment.0);
                        }
                        _ => {
                            self.error("posting outside of a transaction", indent_span);
                            self.skip_to_line_end();
                        }
                    }
                }
                _ => {
                    let token = self.bump();
                    self.error(
                        format!("unrecognized line starting with `{}`", token.lexeme),
                        token.span,
                    );
                    self.recover();
                }
            }
        }
        self.journal
    }

    // ---- transactions --------------------------------------------------

    fn parse_transaction(&mut self) {
        let date_token = self.bump();
        let resolved = match parse_date(
            &date_token.lexeme,
            date_token.span,
            self.default_year.or(self.last_full_year),
            self.fallback_year,
        ) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.error(err.to_string(), date_token.span);
                self.recover();
                return;
            }
        };
        if resolved.used_fallback_year {
            self.hint(
                format!(
                    "date has no explicit year and no `Y` directive applies; assuming {}",
                    resolved.date.date.year()
                ),
                date_token.span,
            );
        }
        if resolved.date.had_year {
            self.last_full_year = Some(resolved.date.date.year());
        }
        let primary_date = resolved.date;

        let secondary_date = self.parse_secondary_date(&primary_date);

        let mut txn = Transaction {
            primary_date,
            secondary_date,
            status: Status::Unmarked,
            status_span: None,
            code: None,
            code_span: None,
            payee: None,
            payee_span: None,
            description: None,
            description_span: None,
            comments: Vec::new(),
            tags: Vec::new(),
            postings: Vec::new(),
            span: date_token.span,
        };

        if let Some(status) = self.eat(TokenKind::Status) {
            txn.status = if status.lexeme == "*" { Status::Cleared } else { Status::Pending };
            txn.status_span = Some(status.span);
            txn.span = txn.span.union(status.span);
        }
        if let Some(code) = self.eat(TokenKind::Code) {
            txn.code =
                Some(code.lexeme.trim_start_matches('(').trim_end_matches(')').to_string());
            txn.code_span = Some(code.span);
            txn.span = txn.span.union(code.span);
        }
        if let Some(payee) = self.eat(TokenKind::Text) {
            txn.payee = Some(payee.lexeme);
            txn.payee_span = Some(payee.span);
            txn.span = txn.span.union(payee.span);
        }
        if self.eat(TokenKind::Pipe).is_some() {
            if let Some(note) = self.eat(TokenKind::Text) {
                txn.description = Some(note.lexeme);
                txn.description_span = Some(note.span);
                txn.span = txn.span.union(note.span);
            }
        }
        if self.at(TokenKind::Comment) {
            let (comment, tags) = self.take_comment();
            txn.span = txn.span.union(comment.span);
            txn.comments.push(comment);
            txn.tags.extend(tags);
        }
        self.expect_line_end();

        // indented body: comments and postings
        while self.at(TokenKind::Indent) {
            self.bump();
            match self.peek().kind {
                TokenKind::Newline => {
                    // a whitespace-only line closes the transaction
                    self.bump();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Comment => {
                    let (comment, tags) = self.take_comment();
                    txn.span = txn.span.union(comment.span);
                    match txn.postings.last_mut() {
                        Some(posting) => {
                            posting.span = posting.span.union(comment.span);
                            posting.comments.push(comment);
                            posting.tags.extend(tags);
                        }
                        None => {
                            txn.comments.push(comment);
                            txn.tags.extend(tags);
                        }
                    }
                    self.expect_line_end();
                }
                TokenKind::Account => {
                    if let Some(posting) = self.parse_posting() {
                        txn.span = txn.span.union(posting.span);
                        txn.postings.push(posting);
                    }
                }
                _ => {
                    let span = self.peek().span;
                    self.error("malformed posting", span);
                    self.skip_to_line_end();
                }
            }
        }

        self.journal.transactions.push(txn);
    }

    fn parse_secondary_date(&mut self, primary: &SmartDate) -> Option<SmartDate> {
        if !(self.at(TokenKind::Equals) && self.peek_next_kind() == TokenKind::Date) {
            return None;
        }
        self.bump(); // `=`
        let token = self.bump();
        match parse_date(
            &token.lexeme,
            token.span,
            Some(primary.date.year()),
            self.fallback_year,
        ) {
            Ok(resolved) => Some(resolved.date),
            Err(err) => {
                self.error(err.to_string(), token.span);
                None
            }
        }
    }

    /// Parse one posting line. Returns `None` when the posting is dropped;
    /// the caller continues with the next line either way.
    fn parse_posting(&mut self) -> Option<Posting> {
        let account = self.bump();
        let mut posting = Posting {
            account: account.lexeme,
            account_span: account.span,
            amount: None,
            cost: None,
            balance_assertion: None,
            comments: Vec::new(),
            tags: Vec::new(),
            span: account.span,
        };

        if self.at_amount_start() {
            posting.amount = self.parse_amount();
            if let Some(amount) = &posting.amount {
                posting.span = posting.span.union(amount.span);
            }
        }

        if self.at(TokenKind::At) || self.at(TokenKind::AtAt) {
            let op = self.bump();
            match self.parse_amount() {
                Some(amount) => {
                    let span = op.span.union(amount.span);
                    posting.span = posting.span.union(span);
                    posting.cost =
                        Some(Cost { amount, is_total: op.kind == TokenKind::AtAt, span });
                }
                None => self.error("expected an amount after the cost operator", op.span),
            }
        }

        if self.at(TokenKind::Equals) || self.at(TokenKind::DoubleEquals) {
            let op = self.bump();
            match self.parse_amount() {
                Some(amount) => {
                    let span = op.span.union(amount.span);
                    posting.span = posting.span.union(span);
                    posting.balance_assertion = Some(BalanceAssertion {
                        amount,
                        is_strict: op.kind == TokenKind::DoubleEquals,
                        span,
                    });
                }
                None => {
                    self.error("expected an amount after the balance assertion", op.span)
                }
            }
        }

        if self.at(TokenKind::Comment) {
            let (comment, tags) = self.take_comment();
            posting.span = posting.span.union(comment.span);
            posting.comments.push(comment);
            posting.tags.extend(tags);
        }

        self.expect_line_end();
        Some(posting)
    }

    fn at_amount_start(&self) -> bool {
        match self.peek().kind {
            TokenKind::Number | TokenKind::Commodity => true,
            TokenKind::Text => matches!(self.peek().lexeme.as_str(), "-" | "+"),
            _ => false,
        }
    }

    /// Parse `sign? (commodity number | number commodity?)`.
    fn parse_amount(&mut self) -> Option<Amount> {
        let mut first_span: Option<Span> = None;
        let mut negate = false;

        if self.at(TokenKind::Text) && matches!(self.peek().lexeme.as_str(), "-" | "+") {
            let sign = self.bump();
            negate = sign.lexeme == "-";
            first_span = Some(sign.span);
        }

        let mut left_commodity: Option<Token> = None;
        if self.at(TokenKind::Commodity) {
            let token = self.bump();
            first_span.get_or_insert(token.span);
            left_commodity = Some(token);
        }

        // a sign may also sit between commodity and number: `$ -5`
        if self.at(TokenKind::Text) && matches!(self.peek().lexeme.as_str(), "-" | "+") {
            let sign = self.bump();
            negate = negate != (sign.lexeme == "-");
        }

        let Some(number) = self.eat(TokenKind::Number) else {
            let span = first_span.unwrap_or(self.peek().span);
            self.error("expected an amount", span);
            return None;
        };
        first_span.get_or_insert(number.span);

        let right_commodity = if left_commodity.is_none() && self.at(TokenKind::Commodity) {
            Some(self.bump())
        } else {
            None
        };

        let Some(mut quantity) = Decimal::parse(&number.lexeme) else {
            self.error(format!("malformed number `{}`", number.lexeme), number.span);
            return None;
        };
        if negate {
            quantity = quantity.neg();
        }

        let commodity_left = left_commodity.is_some();
        let commodity_token = left_commodity.or(right_commodity);
        let (commodity, commodity_span) = match &commodity_token {
            Some(token) => (token.lexeme.trim_matches('"').to_string(), Some(token.span)),
            None => (String::new(), None),
        };

        let start = first_span.unwrap_or(number.span);
        let end = commodity_token
            .as_ref()
            .map(|t| t.span)
            .filter(|s| s.end.byte > number.span.end.byte)
            .unwrap_or(number.span);
        let span = start.union(end);

        Some(Amount {
            quantity,
            commodity,
            commodity_left,
            raw_text: span.slice(self.source).to_string(),
            span,
            number_span: number.span,
            commodity_span,
        })
    }

    // ---- directives ----------------------------------------------------

    fn parse_directive(&mut self) {
        let keyword = self.bump();
        let keyword_span = keyword.span;

        let directive = match keyword.lexeme.as_str() {
            "account" => self.parse_account_directive(keyword_span),
            "commodity" => self.parse_commodity_directive(keyword_span),
            "P" => self.parse_price_directive(keyword_span),
            "Y" => self.parse_year_directive(keyword_span),
            "alias" => self.parse_alias_directive(keyword_span),
            "include" => self.parse_include_directive(keyword_span),
            other => {
                let span = self.line_span(keyword_span);
                self.skip_to_line_end();
                Directive::Other(OtherDecl { keyword: other.to_string(), keyword_span, span })
            }
        };
        self.journal.directives.push(directive);
    }

    fn parse_account_directive(&mut self, keyword_span: Span) -> Directive {
        let Some(name) = self.eat(TokenKind::Account) else {
            self.error("expected an account name", keyword_span);
            let span = self.line_span(keyword_span);
            self.skip_to_line_end();
            return Directive::Other(OtherDecl {
                keyword: "account".to_string(),
                keyword_span,
                span,
            });
        };
        let mut span = keyword_span.union(name.span);
        self.skip_to_line_end();
        for (_, attr_span) in self.consume_indented_attrs() {
            span = span.union(attr_span);
        }
        Directive::Account(AccountDecl {
            name: name.lexeme,
            name_span: name.span,
            keyword_span,
            span,
        })
    }

    fn parse_commodity_directive(&mut self, keyword_span: Span) -> Directive {
        let (symbol, symbol_span, mut format) = if self.at(TokenKind::Commodity)
            && self.peek_next_kind() != TokenKind::Number
        {
            let token = self.bump();
            (token.lexeme.trim_matches('"').to_string(), token.span, None)
        } else if self.at_amount_start() {
            match self.parse_amount() {
                Some(amount) if !amount.commodity.is_empty() => {
                    let symbol_span = amount.commodity_span.unwrap_or(amount.span);
                    (amount.commodity.clone(), symbol_span, Some(amount.raw_text.clone()))
                }
                _ => {
                    self.error("expected a commodity symbol", keyword_span);
                    let span = self.line_span(keyword_span);
                    self.skip_to_line_end();
                    return Directive::Other(OtherDecl {
                        keyword: "commodity".to_string(),
                        keyword_span,
                        span,
                    });
                }
            }
        } else {
            self.error("expected a commodity symbol", keyword_span);
            let span = self.line_span(keyword_span);
            self.skip_to_line_end();
            return Directive::Other(OtherDecl {
                keyword: "commodity".to_string(),
                keyword_span,
                span,
            });
        };

        let mut span = keyword_span.union(symbol_span);
        self.skip_to_line_end();
        for (text, attr_span) in self.consume_indented_attrs() {
            span = span.union(attr_span);
            if let Some(rest) = text.strip_prefix("format") {
                let rest = rest.trim();
                if !rest.is_empty() {
                    format = Some(rest.to_string());
                }
            }
        }
        Directive::Commodity(CommodityDecl { symbol, symbol_span, format, keyword_span, span })
    }

    fn parse_price_directive(&mut self, keyword_span: Span) -> Directive {
        let fallback = |parser: &mut Parser<'a>, span: Span| {
            parser.skip_to_line_end();
            Directive::Other(OtherDecl { keyword: "P".to_string(), keyword_span, span })
        };

        let Some(date_token) = self.eat(TokenKind::Date) else {
            self.error("expected a date after `P`", keyword_span);
            let span = self.line_span(keyword_span);
            return fallback(self, span);
        };
        let date = match parse_date(
            &date_token.lexeme,
            date_token.span,
            self.default_year.or(self.last_full_year),
            self.fallback_year,
        ) {
            Ok(resolved) => resolved.date,
            Err(err) => {
                self.error(err.to_string(), date_token.span);
                let span = self.line_span(keyword_span);
                return fallback(self, span);
            }
        };
        let Some(commodity) = self.eat(TokenKind::Commodity) else {
            self.error("expected a commodity after the price date", date_token.span);
            let span = self.line_span(keyword_span);
            return fallback(self, span);
        };
        let Some(amount) = self.parse_amount() else {
            let span = self.line_span(keyword_span);
            return fallback(self, span);
        };

        let span = keyword_span.union(amount.span);
        self.skip_to_line_end();
        Directive::Price(PriceDecl {
            date,
            commodity: commodity.lexeme.trim_matches('"').to_string(),
            commodity_span: commodity.span,
            amount,
            keyword_span,
            span,
        })
    }

    fn parse_year_directive(&mut self, keyword_span: Span) -> Directive {
        let Some(year_token) = self.eat(TokenKind::Number) else {
            self.error("expected a year after `Y`", keyword_span);
            let span = self.line_span(keyword_span);
            self.skip_to_line_end();
            return Directive::Other(OtherDecl {
                keyword: "Y".to_string(),
                keyword_span,
                span,
            });
        };
        let span = keyword_span.union(year_token.span);
        match year_token.lexeme.parse::<i32>() {
            Ok(year) => {
                self.default_year = Some(year);
                self.skip_to_line_end();
                Directive::DefaultYear(YearDecl { year, keyword_span, span })
            }
            Err(_) => {
                self.error(format!("invalid year `{}`", year_token.lexeme), year_token.span);
                self.skip_to_line_end();
                Directive::Other(OtherDecl { keyword: "Y".to_string(), keyword_span, span })
            }
        }
    }

    fn parse_alias_directive(&mut self, keyword_span: Span) -> Directive {
        let span = self.line_span(keyword_span);
        let Some(args) = self.eat(TokenKind::Text) else {
            self.error("expected `old = new` after `alias`", keyword_span);
            self.skip_to_line_end();
            return Directive::Other(OtherDecl {
                keyword: "alias".to_string(),
                keyword_span,
                span,
            });
        };
        self.skip_to_line_end();
        match args.lexeme.split_once('=') {
            Some((from, to)) => Directive::Alias(AliasDecl {
                from: from.trim().to_string(),
                to: to.trim().to_string(),
                keyword_span,
                span,
            }),
            None => {
                self.error("alias is missing `=`", args.span);
                Directive::Other(OtherDecl { keyword: "alias".to_string(), keyword_span, span })
            }
        }
    }

    fn parse_include_directive(&mut self, keyword_span: Span) -> Directive {
        let Some(path) = self.eat(TokenKind::Text) else {
            self.error("expected a path after `include`", keyword_span);
            let span = self.line_span(keyword_span);
            self.skip_to_line_end();
            return Directive::Other(OtherDecl {
                keyword: "include".to_string(),
                keyword_span,
                span,
            });
        };
        self.skip_to_line_end();
        let decl = IncludeDecl {
            path: path.lexeme,
            path_span: path.span,
            keyword_span,
            span: keyword_span.union(path.span),
        };
        self.journal.includes.push(decl.clone());
        Directive::Include(decl)
    }

    /// Consume indented attribute lines following a directive, returning
    /// each line's text and span.
    fn consume_indented_attrs(&mut self) -> Vec<(String, Span)> {
        let mut attrs = Vec::new();
        while self.at(TokenKind::Indent) && self.peek_next_kind() != TokenKind::Newline
            && self.peek_next_kind() != TokenKind::Eof
        {
            self.bump(); // indent
            let start = self.peek().span;
            let mut end = start;
            while !matches!(self.peek().kind, TokenKind::Newline | TokenKind::Eof) {
                end = self.bump().span;
            }
            let span = start.union(end);
            attrs.push((span.slice(self.source).to_string(), span));
            self.eat(TokenKind::Newline);
        }
        attrs
    }

    // ---- plumbing ------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn peek_next_kind(&self) -> TokenKind {
        self.tokens
            .get(self.idx + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    fn take_comment(&mut self) -> (Comment, Vec<Tag>) {
        let token = self.bump();
        let mut text_start = token.span.start;
        if let Some(marker) = self.source[token.span.start.byte..].chars().next() {
            text_start.advance(marker);
        }
        let tags = extract_tags(&token.lexeme, text_start);
        (Comment { text: token.lexeme, span: token.span }, tags)
    }

    /// Span from `from` to the end of the current line's content.
    fn line_span(&self, from: Span) -> Span {
        let mut span = from;
        let mut i = self.idx;
        while let Some(token) = self.tokens.get(i) {
            if matches!(token.kind, TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            span = span.union(token.span);
            i += 1;
        }
        span
    }

    /// Skip the rest of the line, keeping comments as file comments, then
    /// consume the line break.
    fn skip_to_line_end(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Newline => {
                    self.bump();
                    break;
                }
                TokenKind::Eof => break,
                TokenKind::Comment => {
                    let comment = self.take_comment();
                    self.journal.comments.push(comment.0);
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// After a parse failure: discard tokens until the next line that
    /// starts with a date or a directive keyword.
    fn recover(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.bump();
                    if matches!(
                        self.peek().kind,
                        TokenKind::Date | TokenKind::Directive | TokenKind::Eof
                    ) {
                        break;
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Consume an expected end of line; complain about trailing garbage
    /// once and skip it.
    fn expect_line_end(&mut self) {
        if matches!(self.peek().kind, TokenKind::Newline) {
            self.bump();
            return;
        }
        if matches!(self.peek().kind, TokenKind::Eof) {
            return;
        }
        let span = self.peek().span;
        self.error("unexpected trailing input", span);
        self.skip_to_line_end();
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.journal.parse_errors.push(ParseError {
            message: message.into(),
            span,
            severity: ParseErrorSeverity::Error,
        });
    }

    fn hint(&mut self, message: impl Into<String>, span: Span) {
        self.journal.parse_errors.push(ParseError {
            message: message.into(),
            span,
            severity: ParseErrorSeverity::Hint,
        });
    }
}
