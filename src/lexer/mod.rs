//! Lexical analysis for GraphQL executable documents.
//!
//! The lexer converts source text into a stream of tokens, each tagged with its
//! byte span and line/column position. It keeps scanning after an error so the
//! caller sees every lexical problem, but the parser refuses to build an AST
//! from a token stream that produced any diagnostic.

pub mod token;

use crate::ast::Pos;
use crate::diag::Diag;
use smol_str::SmolStr;
use token::{Token, TokenKind};

/// Result of lexical analysis.
///
/// Contains both the tokens produced and any diagnostics encountered during scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// The tokens produced, including an EOF token at the end.
    pub tokens: Vec<Token>,
    /// Diagnostics encountered during lexing.
    pub diagnostics: Vec<Diag>,
}

/// A lexical analyzer for GraphQL source text.
pub struct Lexer<'a> {
    /// The source text being lexed.
    source: &'a str,
    /// Current byte position in source.
    pos: usize,
    /// Current 1-based line.
    line: usize,
    /// Byte offset at which the current line starts.
    line_start: usize,
    /// Accumulated tokens.
    tokens: Vec<Token>,
    /// Accumulated diagnostics.
    diagnostics: Vec<Diag>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            line_start: 0,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Tokenizes the source text and returns the result.
    pub fn tokenize(mut self) -> LexerResult {
        while !self.is_at_end() {
            self.skip_ignored();
            if self.is_at_end() {
                break;
            }
            self.scan_token();
        }

        let eof = self.source.len();
        let pos = self.position_of(eof);
        self.tokens.push(Token::new(TokenKind::Eof, eof..eof, pos));

        LexerResult {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    /// Scans a single token.
    fn scan_token(&mut self) {
        let start = self.pos;
        let start_pos = self.position_of(start);
        let ch = self.advance();

        match ch {
            '!' => self.add_token(TokenKind::Bang, start, start_pos),
            '(' => self.add_token(TokenKind::LParen, start, start_pos),
            ')' => self.add_token(TokenKind::RParen, start, start_pos),
            ':' => self.add_token(TokenKind::Colon, start, start_pos),
            '=' => self.add_token(TokenKind::Equals, start, start_pos),
            '@' => self.add_token(TokenKind::At, start, start_pos),
            '[' => self.add_token(TokenKind::LBracket, start, start_pos),
            ']' => self.add_token(TokenKind::RBracket, start, start_pos),
            '{' => self.add_token(TokenKind::LBrace, start, start_pos),
            '}' => self.add_token(TokenKind::RBrace, start, start_pos),
            '.' => {
                if self.peek() == '.' && self.peek_next() == '.' {
                    self.advance();
                    self.advance();
                    self.add_token(TokenKind::Spread, start, start_pos);
                } else {
                    self.error(start, "unexpected character '.', did you mean '...'?");
                }
            }
            '$' => self.scan_variable(start, start_pos),
            '"' => {
                if self.peek() == '"' && self.peek_next() == '"' {
                    self.advance();
                    self.advance();
                    self.scan_block_string(start, start_pos);
                } else {
                    self.scan_string(start, start_pos);
                }
            }
            '-' | '0'..='9' => self.scan_number(start, start_pos),
            'a'..='z' | 'A'..='Z' | '_' => {
                while is_name_continue(self.peek()) {
                    self.advance();
                }
                let text = SmolStr::new(&self.source[start..self.pos]);
                self.add_token(TokenKind::Name(text), start, start_pos);
            }
            _ => {
                self.error(start, &format!("invalid character {ch:?}"));
            }
        }
    }

    /// Scans `$name`.
    fn scan_variable(&mut self, start: usize, start_pos: Pos) {
        if !is_name_start(self.peek()) {
            self.error(start, "expected variable name after '$'");
            return;
        }
        while is_name_continue(self.peek()) {
            self.advance();
        }
        let name = SmolStr::new(&self.source[start + 1..self.pos]);
        self.add_token(TokenKind::Variable(name), start, start_pos);
    }

    /// Scans an integer or float literal.
    ///
    /// Follows GraphQL's grammar: optional minus, no leading zeros, optional
    /// fraction and exponent, and no name character directly after the number.
    fn scan_number(&mut self, start: usize, start_pos: Pos) {
        let first = self.source[start..].chars().next().unwrap_or('\0');
        let mut is_float = false;

        if first == '-' && !self.peek().is_ascii_digit() {
            self.error(start, "expected digit after '-'");
            return;
        }

        let int_start = if first == '-' { self.pos } else { start };
        if first == '-' {
            self.advance();
        }
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        let integer = &self.source[int_start..self.pos];
        if integer.len() > 1 && integer.starts_with('0') {
            self.error_span(
                start..self.pos,
                &format!("invalid number '{}': leading zeros are not allowed", &self.source[start..self.pos]),
                "syntax::invalid_number",
            );
            return;
        }

        if self.peek() == '.' {
            self.advance();
            if !self.peek().is_ascii_digit() {
                self.error_span(
                    start..self.pos,
                    "invalid number: expected digit after '.'",
                    "syntax::invalid_number",
                );
                return;
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            is_float = true;
        }

        if matches!(self.peek(), 'e' | 'E') {
            self.advance();
            if matches!(self.peek(), '+' | '-') {
                self.advance();
            }
            if !self.peek().is_ascii_digit() {
                self.error_span(
                    start..self.pos,
                    "invalid number: expected digit in exponent",
                    "syntax::invalid_number",
                );
                return;
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
            is_float = true;
        }

        if is_name_start(self.peek()) || self.peek() == '.' {
            self.error_span(
                start..self.pos + self.peek().len_utf8(),
                &format!("invalid number: unexpected {:?} after numeric literal", self.peek()),
                "syntax::invalid_number",
            );
            return;
        }

        let text = self.source[start..self.pos].to_string();
        let kind = if is_float {
            TokenKind::FloatLiteral(text)
        } else {
            TokenKind::IntLiteral(text)
        };
        self.add_token(kind, start, start_pos);
    }

    /// Scans a single-line string literal. The opening quote is consumed.
    fn scan_string(&mut self, start: usize, start_pos: Pos) {
        let mut value = String::new();

        loop {
            if self.is_at_end() || matches!(self.peek(), '\n' | '\r') {
                self.error_span(
                    start..self.pos,
                    "unterminated string",
                    "syntax::unterminated_string",
                );
                return;
            }

            match self.advance() {
                '"' => break,
                '\\' => {
                    let escape_at = self.pos - 1;
                    match self.advance() {
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        '/' => value.push('/'),
                        'b' => value.push('\u{0008}'),
                        'f' => value.push('\u{000C}'),
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        'u' => match self.scan_unicode_escape() {
                            Some(ch) => value.push(ch),
                            None => {
                                self.error_span(
                                    escape_at..self.pos,
                                    "invalid unicode escape sequence",
                                    "syntax::invalid_escape",
                                );
                                return;
                            }
                        },
                        other => {
                            self.error_span(
                                escape_at..self.pos,
                                &format!("invalid escape sequence '\\{other}'"),
                                "syntax::invalid_escape",
                            );
                            return;
                        }
                    }
                }
                ch => value.push(ch),
            }
        }

        self.add_token(TokenKind::StringLiteral(value), start, start_pos);
    }

    /// Reads the four hex digits of a `\u` escape.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self.peek().to_digit(16)?;
            self.advance();
            code = code * 16 + digit;
        }
        char::from_u32(code)
    }

    /// Scans a `"""` block string. The opening quotes are consumed.
    fn scan_block_string(&mut self, start: usize, start_pos: Pos) {
        let mut raw = String::new();

        loop {
            if self.is_at_end() {
                self.error_span(
                    start..self.pos,
                    "unterminated block string",
                    "syntax::unterminated_string",
                );
                return;
            }
            if self.source[self.pos..].starts_with("\"\"\"") {
                self.pos += 3;
                break;
            }
            if self.source[self.pos..].starts_with("\\\"\"\"") {
                self.pos += 4;
                raw.push_str("\"\"\"");
                continue;
            }
            let ch = self.advance();
            if ch == '\n' {
                self.new_line();
            }
            raw.push(ch);
        }

        self.add_token(
            TokenKind::StringLiteral(block_string_value(&raw)),
            start,
            start_pos,
        );
    }

    /// Skips whitespace, line terminators, commas and `#` comments.
    fn skip_ignored(&mut self) {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' | ',' | '\u{FEFF}' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.new_line();
                }
                '#' => {
                    while !self.is_at_end() && !matches!(self.peek(), '\n' | '\r') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
    }

    /// Line/column position of a byte offset on the current line.
    fn position_of(&self, offset: usize) -> Pos {
        let column = self.source[self.line_start..offset].chars().count() + 1;
        Pos::new(self.line, column, offset)
    }

    /// Adds a token spanning from `start` to the current position.
    fn add_token(&mut self, kind: TokenKind, start: usize, pos: Pos) {
        self.tokens.push(Token::new(kind, start..self.pos, pos));
    }

    /// Adds an error diagnostic for the character at `pos`.
    fn error(&mut self, pos: usize, message: &str) {
        let width = self.source[pos..].chars().next().map_or(0, char::len_utf8);
        self.error_span(pos..pos + width, message, "syntax::invalid_character");
    }

    /// Adds an error diagnostic with an explicit span and code.
    fn error_span(&mut self, span: std::ops::Range<usize>, message: &str, code: &str) {
        self.diagnostics.push(
            Diag::error(message)
                .with_primary_label(span, "here")
                .with_code(code),
        );
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> char {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    /// Advances and returns the current character.
    fn advance(&mut self) -> char {
        let ch = self.peek();
        if !self.is_at_end() {
            self.pos += ch.len_utf8();
        }
        ch
    }

    /// Returns true if at end of input.
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Computes the value of a block string: common indentation is removed and
/// leading/trailing blank lines are dropped.
fn block_string_value(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').map(|line| line.trim_end_matches('\r')).collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
            (indent < line.len()).then_some(indent)
        })
        .min()
        .unwrap_or(0);

    let mut trimmed: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 || line.len() < common_indent {
                *line
            } else {
                &line[common_indent..]
            }
        })
        .collect();

    let is_blank = |line: &&str| line.trim_matches([' ', '\t']).is_empty();
    while trimmed.first().is_some_and(is_blank) {
        trimmed.remove(0);
    }
    while trimmed.last().is_some_and(is_blank) {
        trimmed.pop();
    }

    trimmed.join("\n")
}

/// Convenience function to tokenize a source string.
pub fn tokenize(source: &str) -> LexerResult {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let result = tokenize(source);
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            result.diagnostics
        );
        result.tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input() {
        let result = tokenize("");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Eof);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn commas_whitespace_and_comments_are_ignored() {
        let kinds = kinds("  {a,, b} # trailing comment\n\t");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LBrace,
                TokenKind::Name("a".into()),
                TokenKind::Name("b".into()),
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn punctuators_and_spread() {
        let kinds = kinds("( ) [ ] { } : = ! @ ...");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Colon,
                TokenKind::Equals,
                TokenKind::Bang,
                TokenKind::At,
                TokenKind::Spread,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        let kinds = kinds("0 -12 3.5 1e10 -2.5E-3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral("0".into()),
                TokenKind::IntLiteral("-12".into()),
                TokenKind::FloatLiteral("3.5".into()),
                TokenKind::FloatLiteral("1e10".into()),
                TokenKind::FloatLiteral("-2.5E-3".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn invalid_numbers_are_reported() {
        for source in ["012", "1.", "1.e5", "2e", "3abc", "-", "1.2.3"] {
            let result = tokenize(source);
            assert!(
                !result.diagnostics.is_empty(),
                "expected a diagnostic for {source:?}"
            );
        }
    }

    #[test]
    fn string_escapes() {
        let kinds = kinds(r#""a\"b\\c\ndA""#);
        assert_eq!(kinds[0], TokenKind::StringLiteral("a\"b\\c\ndA".into()));
    }

    #[test]
    fn unterminated_string_is_reported_at_opening_quote() {
        let result = tokenize("{ user(id: \"1) }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "unterminated string");
        assert_eq!(result.diagnostics[0].primary_span().map(|s| s.start), Some(11));
    }

    #[test]
    fn string_cannot_span_lines() {
        let result = tokenize("\"abc\ndef\"");
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn invalid_escape_is_reported() {
        let result = tokenize(r#""\q""#);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("invalid escape"));
    }

    #[test]
    fn block_string_is_dedented() {
        let kinds = kinds("\"\"\"\n    Hello,\n      World!\n\n    Yours\n  \"\"\"");
        assert_eq!(
            kinds[0],
            TokenKind::StringLiteral("Hello,\n  World!\n\nYours".into())
        );
    }

    #[test]
    fn block_string_escaped_triple_quote() {
        let kinds = kinds(r#""""a \""" b""""#);
        assert_eq!(kinds[0], TokenKind::StringLiteral("a \"\"\" b".into()));
    }

    #[test]
    fn variables() {
        let kinds = kinds("$id $_x1");
        assert_eq!(kinds[0], TokenKind::Variable("id".into()));
        assert_eq!(kinds[1], TokenKind::Variable("_x1".into()));
    }

    #[test]
    fn dollar_without_name_is_reported() {
        let result = tokenize("$ id");
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn invalid_character_is_reported_and_scanning_continues() {
        let result = tokenize("{ a % b }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code.as_deref(), Some("syntax::invalid_character"));
        assert!(result
            .tokens
            .iter()
            .any(|t| t.kind == TokenKind::Name("b".into())));
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let result = tokenize("{\n  user {\n    name\n  }\n}");
        let name = result
            .tokens
            .iter()
            .find(|t| t.kind == TokenKind::Name("name".into()))
            .unwrap();
        assert_eq!(name.pos.line, 3);
        assert_eq!(name.pos.column, 5);
        let eof = result.tokens.last().unwrap();
        assert_eq!(eof.pos.line, 5);
        assert_eq!(eof.pos.column, 2);
    }

    #[test]
    fn positions_after_block_string_lines() {
        let result = tokenize("\"\"\"a\nb\"\"\" x");
        let x = &result.tokens[1];
        assert_eq!(x.kind, TokenKind::Name("x".into()));
        assert_eq!(x.pos.line, 2);
        assert_eq!(x.pos.column, 6);
    }
}
