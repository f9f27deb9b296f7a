// loxy-scanner - Lexical scanner for the Loxy scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Pull-based scanner for Loxy source code.
//!
//! The scanner hands out one token per call to [`Scanner::next_token`];
//! tokens are slices into the source buffer, never copies. Once the input is
//! exhausted every further call returns `Eof`.

use crate::token::{Token, TokenKind};

/// The scanner converts source text into tokens on demand.
pub struct Scanner<'src> {
    source: &'src str,
    /// Byte offset of the first character of the token being scanned.
    start: usize,
    /// Byte offset of the next character to consume.
    current: usize,
    line: u32,
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_alpha(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

impl<'src> Scanner<'src> {
    /// Create a scanner over `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scan and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof);
        }

        let c = self.advance();

        if is_digit(c) {
            return self.number();
        }
        if is_alpha(c) {
            return self.identifier();
        }

        match c {
            b'(' => self.make_token(TokenKind::LeftParen),
            b')' => self.make_token(TokenKind::RightParen),
            b'{' => self.make_token(TokenKind::LeftBrace),
            b'}' => self.make_token(TokenKind::RightBrace),
            b';' => self.make_token(TokenKind::Semicolon),
            b',' => self.make_token(TokenKind::Comma),
            b'.' => self.make_token(TokenKind::Dot),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Star),
            b'!' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.make_token(kind)
            }
            b'=' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.make_token(kind)
            }
            b'<' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.make_token(kind)
            }
            b'>' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.make_token(kind)
            }
            b'"' => self.string(),
            _ => Token::error("Unexpected character.", self.line),
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> u8 {
        let c = self.source.as_bytes()[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            b'\0'
        } else {
            self.source.as_bytes()[self.current]
        }
    }

    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            b'\0'
        } else {
            self.source.as_bytes()[self.current + 1]
        }
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn make_token(&self, kind: TokenKind) -> Token<'src> {
        Token::new(kind, &self.source[self.start..self.current], self.line)
    }

    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.current += 1;
                }
                b'\n' => {
                    self.line += 1;
                    self.current += 1;
                }
                b'/' => {
                    if self.peek_next() == b'/' {
                        // A comment goes until the end of the line.
                        while self.peek() != b'\n' && !self.is_at_end() {
                            self.current += 1;
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn number(&mut self) -> Token<'src> {
        while is_digit(self.peek()) {
            self.current += 1;
        }

        // Fractional part.
        if self.peek() == b'.' && is_digit(self.peek_next()) {
            // Consume the ".".
            self.current += 1;
            while is_digit(self.peek()) {
                self.current += 1;
            }
        }

        self.make_token(TokenKind::Number)
    }

    fn string(&mut self) -> Token<'src> {
        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.current += 1;
        }

        if self.is_at_end() {
            return Token::error("Unterminated string.", self.line);
        }

        // The closing quote.
        self.current += 1;
        self.make_token(TokenKind::String)
    }

    fn identifier(&mut self) -> Token<'src> {
        while is_alpha(self.peek()) || is_digit(self.peek()) {
            self.current += 1;
        }
        self.make_token(self.identifier_kind())
    }

    /// Keyword recognition as a fixed-branch trie over the first bytes.
    fn identifier_kind(&self) -> TokenKind {
        let word = &self.source.as_bytes()[self.start..self.current];
        match word[0] {
            b'a' => self.check_keyword(word, "and", TokenKind::And),
            b'c' => self.check_keyword(word, "class", TokenKind::Class),
            b'e' => self.check_keyword(word, "else", TokenKind::Else),
            b'f' if word.len() > 1 => match word[1] {
                b'a' => self.check_keyword(word, "false", TokenKind::False),
                b'o' => self.check_keyword(word, "for", TokenKind::For),
                b'u' => self.check_keyword(word, "fun", TokenKind::Fun),
                _ => TokenKind::Identifier,
            },
            b'i' => self.check_keyword(word, "if", TokenKind::If),
            b'n' => self.check_keyword(word, "nil", TokenKind::Nil),
            b'o' => self.check_keyword(word, "or", TokenKind::Or),
            b'p' => self.check_keyword(word, "print", TokenKind::Print),
            b'r' => self.check_keyword(word, "return", TokenKind::Return),
            b's' => self.check_keyword(word, "super", TokenKind::Super),
            b't' if word.len() > 1 => match word[1] {
                b'h' => self.check_keyword(word, "this", TokenKind::This),
                b'r' => self.check_keyword(word, "true", TokenKind::True),
                _ => TokenKind::Identifier,
            },
            b'v' => self.check_keyword(word, "var", TokenKind::Var),
            b'w' => self.check_keyword(word, "while", TokenKind::While),
            _ => TokenKind::Identifier,
        }
    }

    fn check_keyword(&self, word: &[u8], keyword: &str, kind: TokenKind) -> TokenKind {
        if word == keyword.as_bytes() {
            kind
        } else {
            TokenKind::Identifier
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_kinds(source: &str) -> Vec<TokenKind> {
        let mut scanner = Scanner::new(source);
        let mut kinds = Vec::new();
        loop {
            let token = scanner.next_token();
            let kind = token.kind;
            kinds.push(kind);
            if kind == TokenKind::Eof {
                return kinds;
            }
        }
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            scan_kinds("( ) { } , . - + ; / *"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Slash,
                TokenKind::Star,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            scan_kinds("! != = == < <= > >="),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            scan_kinds("and andor var variable _under f42"),
            vec![
                TokenKind::And,
                TokenKind::Identifier,
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_all_keywords() {
        let source = "and class else false for fun if nil or print return super this true var while";
        let kinds = scan_kinds(source);
        assert_eq!(kinds.len(), 17);
        assert!(!kinds.contains(&TokenKind::Identifier));
    }

    #[test]
    fn test_number_literals() {
        let mut scanner = Scanner::new("123 3.14 7.");
        assert_eq!(scanner.next_token().lexeme, "123");
        assert_eq!(scanner.next_token().lexeme, "3.14");
        // "7." is a number followed by a dot: no trailing fraction.
        assert_eq!(scanner.next_token().lexeme, "7");
        assert_eq!(scanner.next_token().kind, TokenKind::Dot);
    }

    #[test]
    fn test_string_literal() {
        let mut scanner = Scanner::new("\"hello world\"");
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.lexeme, "\"hello world\"");
    }

    #[test]
    fn test_string_spanning_lines_counts_them() {
        let mut scanner = Scanner::new("\"a\nb\" x");
        let string = scanner.next_token();
        assert_eq!(string.kind, TokenKind::String);
        assert_eq!(string.line, 2);
        assert_eq!(scanner.next_token().line, 2);
    }

    #[test]
    fn test_unterminated_string() {
        let mut scanner = Scanner::new("\"oops");
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(token.lexeme, "Unterminated string.");
    }

    #[test]
    fn test_unexpected_character() {
        let mut scanner = Scanner::new("@");
        let token = scanner.next_token();
        assert_eq!(token.kind, TokenKind::Error);
        assert_eq!(token.lexeme, "Unexpected character.");
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            scan_kinds("1 // the rest is ignored\n2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_line_tracking() {
        let mut scanner = Scanner::new("a\nb\n\nc");
        assert_eq!(scanner.next_token().line, 1);
        assert_eq!(scanner.next_token().line, 2);
        assert_eq!(scanner.next_token().line, 4);
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut scanner = Scanner::new("");
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    }
}
