//! Tokenizer for Norn source text
//!
//! A maximal-munch scanner producing a flat token sequence with source
//! locations. Whitespace and comments (`// ...` and `/* ... */`) are
//! discarded; the sequence is terminated by a synthetic `End` token the
//! parser uses as a look-ahead sentinel.

use crate::ast::SourceLocation;
use std::fmt;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    IntLiteral,
    BoolLiteral,
    Identifier,
    Keyword,
    Operator,
    Punct,
    /// Synthetic end-of-input sentinel
    End,
}

/// A token with its source text and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: SourceLocation,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, loc: SourceLocation) -> Self {
        Token {
            kind,
            text: text.into(),
            loc,
        }
    }

    /// Human-readable form for diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::End => "end of input".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Reserved words that are not literals or operators.
const KEYWORDS: &[&str] = &[
    "if", "then", "else", "while", "do", "var", "fun", "return", "break", "continue",
];

/// Word-shaped operators; these lex as `Operator`, not `Keyword`, so the
/// precedence climber can treat them uniformly with the symbolic ones.
const WORD_OPERATORS: &[&str] = &["and", "or", "not"];

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn loc(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_second(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace and comments. Returns an error for an
    /// unterminated block comment.
    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    let start = self.loc();
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            Some('*') if self.peek_second() == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                            None => {
                                return Err(format!("{}: unterminated block comment", start));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.bump();
        }
        text
    }

    fn next_token(&mut self) -> Result<Option<Token>, String> {
        self.skip_trivia()?;
        let loc = self.loc();
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        if c.is_ascii_digit() {
            let text = self.scan_while(|c| c.is_ascii_digit());
            return Ok(Some(Token::new(TokenKind::IntLiteral, text, loc)));
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let text = self.scan_while(|c| c.is_ascii_alphanumeric() || c == '_');
            let kind = if text == "true" || text == "false" {
                TokenKind::BoolLiteral
            } else if KEYWORDS.contains(&text.as_str()) {
                TokenKind::Keyword
            } else if WORD_OPERATORS.contains(&text.as_str()) {
                TokenKind::Operator
            } else {
                TokenKind::Identifier
            };
            return Ok(Some(Token::new(kind, text, loc)));
        }

        // Two-character operators take precedence over their prefixes.
        if let Some(second) = self.peek_second() {
            let pair: String = [c, second].iter().collect();
            if matches!(pair.as_str(), "==" | "!=" | "<=" | ">=") {
                self.bump();
                self.bump();
                return Ok(Some(Token::new(TokenKind::Operator, pair, loc)));
            }
        }

        if matches!(c, '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=') {
            self.bump();
            return Ok(Some(Token::new(TokenKind::Operator, c, loc)));
        }

        if matches!(c, '(' | ')' | '{' | '}' | ',' | ';' | ':') {
            self.bump();
            return Ok(Some(Token::new(TokenKind::Punct, c, loc)));
        }

        Err(format!("{}: unrecognized character '{}'", loc, c))
    }
}

/// Tokenize a whole source file.
///
/// The returned sequence preserves source order and always ends with a
/// single `End` token located just past the last character.
pub fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = scanner.next_token()? {
        tokens.push(token);
    }
    tokens.push(Token::new(TokenKind::End, "", scanner.loc()));
    Ok(tokens)
}
