// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scanner that produces tokens from source text.

use super::{Span, TemplateChunk, Token, TokenKind};

/// A scanner that tokenizes script source code.
#[derive(Clone)]
pub struct Scanner<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current_pos: 0,
        }
    }

    /// Returns the source text this scanner reads from.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        let newline_before = self.skip_whitespace_and_comments();

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            let mut token = Token::new(TokenKind::Eof, Span::new(start, start));
            token.newline_before = newline_before;
            return token;
        };

        let kind = match ch {
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '~' => TokenKind::Tilde,

            '.' => self.scan_dot(),
            '+' => self.scan_with_equal('+', TokenKind::PlusPlus, TokenKind::PlusEqual, TokenKind::Plus),
            '-' => self.scan_with_equal('-', TokenKind::MinusMinus, TokenKind::MinusEqual, TokenKind::Minus),
            '*' => self.scan_star(),
            '/' => self.scan_single_equal(TokenKind::SlashEqual, TokenKind::Slash),
            '%' => self.scan_single_equal(TokenKind::PercentEqual, TokenKind::Percent),
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '=' => self.scan_equal(),
            '!' => self.scan_bang(),
            '&' => self.scan_doubled('&', TokenKind::AmpersandAmpersand, TokenKind::Ampersand),
            '|' => self.scan_doubled('|', TokenKind::PipePipe, TokenKind::Pipe),
            '^' => TokenKind::Caret,
            '?' => self.scan_question(),

            '"' | '\'' => self.scan_string(ch),
            '`' => self.scan_template(),
            '0'..='9' => self.scan_number(ch),

            _ if is_id_start(ch) => self.scan_identifier(ch),

            _ => TokenKind::Invalid(format!("Unexpected character '{}'", ch)),
        };

        let mut token = Token::new(kind, Span::new(start, self.current_pos));
        token.newline_before = newline_before;
        token
    }

    /// Converts a byte offset into a 1-based (line, column) pair.
    pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(pos) => before[pos + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        (line, column)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skips trivia and reports whether a line terminator was crossed.
    fn skip_whitespace_and_comments(&mut self) -> bool {
        let mut saw_newline = false;
        loop {
            match self.peek() {
                Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                    saw_newline = true;
                    self.advance();
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') => match self.peek_next() {
                    Some('/') => {
                        self.advance();
                        self.advance();
                        while let Some(ch) = self.peek() {
                            if ch == '\n' || ch == '\r' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('*') => {
                        self.advance();
                        self.advance();
                        let mut prev = ' ';
                        while let Some((_, ch)) = self.advance() {
                            if ch == '\n' {
                                saw_newline = true;
                            }
                            if prev == '*' && ch == '/' {
                                break;
                            }
                            prev = ch;
                        }
                    }
                    _ => break,
                },
                Some('#') if self.current_pos == 0 && self.peek_next() == Some('!') => {
                    // Shebang line at the very start of a file
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
        saw_newline
    }

    fn scan_dot(&mut self) -> TokenKind {
        if self.peek() == Some('.') && self.peek_next() == Some('.') {
            self.advance();
            self.advance();
            TokenKind::Ellipsis
        } else if matches!(self.peek(), Some('0'..='9')) {
            self.scan_number('.')
        } else {
            TokenKind::Dot
        }
    }

    fn scan_with_equal(
        &mut self,
        same: char,
        doubled: TokenKind,
        with_equal: TokenKind,
        single: TokenKind,
    ) -> TokenKind {
        if self.eat(same) {
            doubled
        } else if self.eat('=') {
            with_equal
        } else {
            single
        }
    }

    fn scan_single_equal(&mut self, with_equal: TokenKind, single: TokenKind) -> TokenKind {
        if self.eat('=') {
            with_equal
        } else {
            single
        }
    }

    fn scan_doubled(&mut self, same: char, doubled: TokenKind, single: TokenKind) -> TokenKind {
        if self.eat(same) {
            doubled
        } else {
            single
        }
    }

    fn scan_star(&mut self) -> TokenKind {
        if self.eat('*') {
            TokenKind::StarStar
        } else if self.eat('=') {
            TokenKind::StarEqual
        } else {
            TokenKind::Star
        }
    }

    fn scan_less_than(&mut self) -> TokenKind {
        if self.eat('<') {
            TokenKind::LeftShift
        } else if self.eat('=') {
            TokenKind::LessThanEqual
        } else {
            TokenKind::LessThan
        }
    }

    fn scan_greater_than(&mut self) -> TokenKind {
        if self.eat('>') {
            if self.eat('>') {
                TokenKind::UnsignedRightShift
            } else {
                TokenKind::RightShift
            }
        } else if self.eat('=') {
            TokenKind::GreaterThanEqual
        } else {
            TokenKind::GreaterThan
        }
    }

    fn scan_equal(&mut self) -> TokenKind {
        if self.eat('=') {
            if self.eat('=') {
                TokenKind::StrictEqual
            } else {
                TokenKind::EqualEqual
            }
        } else if self.eat('>') {
            TokenKind::Arrow
        } else {
            TokenKind::Equal
        }
    }

    fn scan_bang(&mut self) -> TokenKind {
        if self.eat('=') {
            if self.eat('=') {
                TokenKind::StrictNotEqual
            } else {
                TokenKind::NotEqual
            }
        } else {
            TokenKind::Bang
        }
    }

    fn scan_question(&mut self) -> TokenKind {
        if self.eat('?') {
            TokenKind::QuestionQuestion
        } else if self.peek() == Some('.') && !matches!(self.peek_next(), Some('0'..='9')) {
            self.advance();
            TokenKind::QuestionDot
        } else {
            TokenKind::Question
        }
    }

    fn scan_escape(&mut self, value: &mut String) {
        let Some((_, escaped)) = self.advance() else {
            return;
        };
        match escaped {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' => value.push('\0'),
            'x' => {
                let hex: String = (0..2).filter_map(|_| self.advance().map(|(_, c)| c)).collect();
                if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    value.push(ch);
                }
            }
            'u' => {
                let hex: String = if self.eat('{') {
                    let mut digits = String::new();
                    while let Some((_, c)) = self.advance() {
                        if c == '}' {
                            break;
                        }
                        digits.push(c);
                    }
                    digits
                } else {
                    (0..4).filter_map(|_| self.advance().map(|(_, c)| c)).collect()
                };
                if let Some(ch) = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    value.push(ch);
                }
            }
            // Line continuation
            '\n' => {}
            '\r' => {
                self.eat('\n');
            }
            other => value.push(other),
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                None | Some((_, '\n')) => {
                    return TokenKind::Invalid("Unterminated string literal".into())
                }
                Some((_, ch)) if ch == quote => break,
                Some((_, '\\')) => self.scan_escape(&mut value),
                Some((_, ch)) => value.push(ch),
            }
        }

        TokenKind::String(value)
    }

    fn scan_template(&mut self) -> TokenKind {
        let mut chunks = Vec::new();
        let mut text = String::new();

        loop {
            match self.advance() {
                None => return TokenKind::Invalid("Unterminated template literal".into()),
                Some((_, '`')) => break,
                Some((_, '$')) if self.peek() == Some('{') => {
                    self.advance();
                    if !text.is_empty() {
                        chunks.push(TemplateChunk::Text(std::mem::take(&mut text)));
                    }
                    let start = self.current_pos;
                    match self.skip_substitution() {
                        Some(end) => chunks.push(TemplateChunk::Substitution(
                            self.source[start..end].to_string(),
                            start,
                        )),
                        None => {
                            return TokenKind::Invalid("Unterminated template substitution".into())
                        }
                    }
                }
                Some((_, '\\')) => self.scan_escape(&mut text),
                Some((_, ch)) => text.push(ch),
            }
        }

        if !text.is_empty() || chunks.is_empty() {
            chunks.push(TemplateChunk::Text(text));
        }
        TokenKind::Template(chunks)
    }

    /// Consumes a `${ ... }` body, returning the byte offset of the closing brace.
    fn skip_substitution(&mut self) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            let (pos, ch) = self.advance()?;
            match ch {
                '{' => depth += 1,
                '}' if depth == 0 => return Some(pos),
                '}' => depth -= 1,
                '"' | '\'' => {
                    if let TokenKind::Invalid(_) = self.scan_string(ch) {
                        return None;
                    }
                }
                '`' => {
                    if let TokenKind::Invalid(_) = self.scan_template() {
                        return None;
                    }
                }
                _ => {}
            }
        }
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);

        if first == '0' {
            let radix = match self.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                return self.scan_radix_number(radix);
            }
        }

        let mut seen_dot = first == '.';
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            value.push('e');
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                value.push(sign);
                self.advance();
            }
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    value.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        match value.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid(format!("Invalid number literal '{}'", value)),
        }
    }

    fn scan_radix_number(&mut self, radix: u32) -> TokenKind {
        let mut digits = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_digit(radix) {
                digits.push(ch);
                self.advance();
            } else if ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        match u64::from_str_radix(&digits, radix) {
            Ok(n) => TokenKind::Number(n as f64),
            Err(_) => TokenKind::Invalid("Invalid number literal".into()),
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);

        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        TokenKind::from_word(&name).unwrap_or(TokenKind::Identifier(name))
    }
}

/// Checks if a character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_start(ch)
}

/// Checks if a character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '_' || ch == '$' || unicode_xid::UnicodeXID::is_xid_continue(ch)
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
