use crate::parser::ast::ByteRange;
use multipeek::{multipeek, MultiPeek};
use std::collections::HashMap;
use std::str::CharIndices;
use strum_macros::{Display, EnumDiscriminants};

/// Turns fun source text into a stream of [`Token`]s.
///
/// Tokens are produced lazily: the scanner only reads as far into the source as the consumer
/// asks for. The literate reader relies on this to parse a single declaration embedded in
/// arbitrary prose without tripping over the text that follows it.
pub struct Scanner<'a> {
    source: &'a str,
    base_offset: usize,
    chars: MultiPeek<CharIndices<'a>>,
    current_line: u32,
    current_column: u32,
    keywords: HashMap<&'static str, TokenType>,
    reached_eof: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::starting_at(source, 0)
    }

    /// Scan `source` starting from the byte `offset`.
    /// Spans and line/column information are still relative to the whole of `source`.
    pub fn starting_at(source: &'a str, offset: usize) -> Self {
        let keywords = HashMap::from_iter([
            ("if", TokenType::If),
            ("else", TokenType::Else),
            ("return", TokenType::Return),
        ]);
        let consumed = &source[..offset];
        let current_line = 1 + consumed.matches('\n').count() as u32;
        let current_column = 1 + consumed
            .rsplit('\n')
            .next()
            .map(|line| line.chars().count())
            .unwrap_or(0) as u32;
        Self {
            source,
            base_offset: offset,
            chars: multipeek(source[offset..].char_indices()),
            current_line,
            current_column,
            keywords,
            reached_eof: false,
        }
    }

    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.offset();
        let (line, column) = (self.current_line, self.current_column);
        let ty = match self.advance() {
            None => TokenType::Eof,
            Some(c) => self.token_type(c, start),
        };
        let end = self.offset();
        Token {
            ty,
            lexeme: self.source[start..end].to_owned(),
            span: ByteRange::new(start, end),
            line,
            column,
        }
    }

    fn token_type(&mut self, c: char, start: usize) -> TokenType {
        match c {
            '{' => TokenType::LeftBrace,
            '}' => TokenType::RightBrace,
            '(' => TokenType::LeftParen,
            ')' => TokenType::RightParen,
            '[' => TokenType::LeftBracket,
            ']' => TokenType::RightBracket,
            '\\' => TokenType::Backslash,
            ';' => TokenType::Semicolon,
            ',' => TokenType::Comma,
            '=' => {
                if self.advance_on_match('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                }
            }
            ':' => {
                if self.advance_on_match('=') {
                    TokenType::ColonEqual
                } else if self.advance_on_match(':') {
                    TokenType::ColonColon
                } else {
                    TokenType::syntax_error("Unexpected character ':'")
                }
            }
            '+' => self.with_optional_equal(TokenType::Plus, TokenType::PlusEqual),
            '-' => self.with_optional_equal(TokenType::Minus, TokenType::MinusEqual),
            '*' => self.with_optional_equal(TokenType::Star, TokenType::StarEqual),
            '/' => self.with_optional_equal(TokenType::Slash, TokenType::SlashEqual),
            '"' | '\'' => self.string(c),
            d if d.is_ascii_digit() => self.number(d),
            c if Self::is_alpha(c) => {
                self.advance_while_true(|c| Self::is_alpha(c) || c.is_ascii_digit());
                let end = self.offset();
                let lexeme = &self.source[start..end];
                match self.keywords.get(lexeme) {
                    Some(keyword) => keyword.clone(),
                    None => TokenType::Identifier(lexeme.to_owned()),
                }
            }
            c => TokenType::syntax_error(format!("Unexpected character '{c}'")),
        }
    }

    fn with_optional_equal(&mut self, plain: TokenType, with_equal: TokenType) -> TokenType {
        if self.advance_on_match('=') {
            with_equal
        } else {
            plain
        }
    }

    fn string(&mut self, terminator: char) -> TokenType {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return TokenType::syntax_error("Unterminated string"),
                Some(c) if c == terminator => return TokenType::String(value),
                Some('\\') => {
                    let escaped = match self.advance() {
                        None => return TokenType::syntax_error("Unterminated string"),
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('e') => '\x1b',
                        Some(c @ ('\'' | '"' | '\\')) => c,
                        Some(c) => {
                            return TokenType::syntax_error(format!(
                                "Unexpected escaped character '{c}'"
                            ))
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self, first: char) -> TokenType {
        let mut radix = 10;
        let mut value = 0.0;
        let prefix = match (first, self.peek()) {
            ('0', Some('x')) => Some(16),
            ('0', Some('o')) => Some(8),
            ('0', Some('b')) => Some(2),
            _ => None,
        };
        match prefix {
            Some(prefix) => {
                self.advance();
                radix = prefix;
                if !matches!(self.peek(), Some(c) if c.is_digit(radix)) {
                    return TokenType::syntax_error("Invalid number");
                }
            }
            None => value = f64::from(first.to_digit(10).unwrap_or(0)),
        }

        while let Some(digit) = self.peek().and_then(|c| c.to_digit(radix)) {
            self.advance();
            value = value * f64::from(radix) + f64::from(digit);
        }

        // A fractional part needs at least one digit after the dot.
        let has_fraction = self.peek() == Some('.')
            && matches!(self.peek_nth(1), Some(c) if c.is_digit(radix));
        if has_fraction {
            self.advance();
            let mut fraction = 0.0;
            let mut digits = 0;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(radix)) {
                self.advance();
                fraction = fraction * f64::from(radix) + f64::from(digit);
                digits += 1;
            }
            // One division keeps short fractions such as `0.3` exact.
            value += fraction / f64::from(radix).powi(digits);
        }
        if !value.is_finite() {
            return TokenType::syntax_error("Number literal is too large");
        }
        TokenType::Number(value)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r' | '\n') => {
                    self.advance();
                }
                Some('/') if self.peek_nth(1) == Some('/') => {
                    // Eat the entire comment, until we encounter a line break
                    self.advance_while_true(|c| c != '\n');
                }
                _ => break,
            }
        }
    }

    fn is_alpha(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn offset(&mut self) -> usize {
        match self.chars.peek() {
            Some((i, _)) => self.base_offset + i,
            None => self.source.len(),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.current_line += 1;
            self.current_column = 1;
        } else {
            self.current_column += 1;
        }
        Some(c)
    }

    fn advance_on_match(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance_while_true<F>(&mut self, f: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(next) = self.peek() {
            if !f(next) {
                break;
            }
            self.advance();
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_nth(&mut self, n: usize) -> Option<char> {
        self.chars.peek_nth(n).map(|(_, c)| *c)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.reached_eof {
            return None;
        }
        let token = self.scan_token();
        if token.discriminant() == TokenDiscriminant::Eof {
            self.reached_eof = true;
        }
        Some(token)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    ty: TokenType,
    lexeme: String,
    span: ByteRange,
    line: u32,
    column: u32,
}

impl Token {
    /// A synthetic end-of-input token, positioned right after `previous` if there is one.
    pub(crate) fn end_of_input(previous: Option<&Token>) -> Self {
        let (end, line, column) = match previous {
            Some(p) => (
                p.span.end,
                p.line,
                p.column + p.lexeme.chars().count() as u32,
            ),
            None => (0, 1, 1),
        };
        Self {
            ty: TokenType::Eof,
            lexeme: String::new(),
            span: ByteRange::new(end, end),
            line,
            column,
        }
    }

    pub fn ty(&self) -> &TokenType {
        &self.ty
    }

    pub fn discriminant(&self) -> TokenDiscriminant {
        TokenDiscriminant::from(&self.ty)
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn span(&self) -> ByteRange {
        self.span
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(TokenDiscriminant), derive(Display, Hash))]
pub enum TokenType {
    // Single-character tokens
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Backslash,
    Semicolon,
    Comma,

    // One or two character tokens
    Equal,
    ColonEqual,
    ColonColon,
    Plus,
    Minus,
    Star,
    Slash,

    // Reserved: scanned as whole operators, but no grammar rule accepts them yet.
    LeftBracket,
    RightBracket,
    EqualEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,

    // Literals
    Identifier(String),
    String(String),
    Number(f64),

    // Keywords
    If,
    Else,
    Return,

    // End of file
    Eof,

    // Special token to signal that we encountered a token
    // that we couldn't successfully scan.
    SyntaxError { error_msg: String },
}

impl TokenType {
    fn syntax_error(error_msg: impl Into<String>) -> Self {
        Self::SyntaxError {
            error_msg: error_msg.into(),
        }
    }
}
