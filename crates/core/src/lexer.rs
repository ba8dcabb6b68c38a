//! Tokenizer for cliscript source.
//!
//! Turns source text into a flat sequence of [`Token`]s, each carrying the
//! line and column it started at. Newlines are significant (declarations are
//! line oriented) and are emitted as [`TokenKind::Newline`]; comments and
//! horizontal whitespace are dropped.

use std::fmt::{Display, Formatter};

use log::debug;
use serde::Serialize;

use crate::error::{LexError, LexErrorKind, Position};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum TokenKind {
    AppName,
    Use,
    Root,
    Cmd,
    Default,
    /// `-x` or `--long-name`, stored with its dashes.
    Flag(String),
    /// `<name>` or `<name...>`.
    Positional { name: String, variadic: bool },
    /// Raw contents of a `[...]` group.
    Attribute(String),
    Str(String),
    Number(String),
    Identifier(String),
    /// `$name`, stored without the dollar sign.
    Variable(String),
    Arrow,
    Comma,
    LParen,
    RParen,
    Newline,
    Eof,
}

impl TokenKind {
    /// Short name of the token class, used when reporting what a parser
    /// expected.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::AppName => "`appname`",
            TokenKind::Use => "`use`",
            TokenKind::Root => "`root`",
            TokenKind::Cmd => "`cmd`",
            TokenKind::Default => "`default`",
            TokenKind::Flag(_) => "flag",
            TokenKind::Positional { .. } => "positional",
            TokenKind::Attribute(_) => "attribute group",
            TokenKind::Str(_) => "string",
            TokenKind::Number(_) => "number",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::Variable(_) => "variable",
            TokenKind::Arrow => "`->`",
            TokenKind::Comma => "`,`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Newline => "end of line",
            TokenKind::Eof => "end of input",
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Flag(flag) => write!(formatter, "flag `{flag}`"),
            TokenKind::Positional { name, variadic } => {
                let dots = if *variadic { "..." } else { "" };
                write!(formatter, "positional `<{name}{dots}>`")
            }
            TokenKind::Attribute(contents) => write!(formatter, "attribute `[{contents}]`"),
            TokenKind::Str(value) => write!(formatter, "string {value:?}"),
            TokenKind::Number(number) => write!(formatter, "number `{number}`"),
            TokenKind::Identifier(name) => write!(formatter, "identifier `{name}`"),
            TokenKind::Variable(name) => write!(formatter, "variable `${name}`"),
            other => formatter.write_str(other.describe()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// Tokenizes `source`. The returned stream always ends with
/// [`TokenKind::Eof`].
///
/// # Arguments
///
/// * `source` - Script text
///
/// # Errors
///
/// Returns a [`LexError`] for an unterminated string, attribute group or
/// positional name, a bare `$`, or any character that starts no token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source).tokenize()?;
    debug!("Tokenized source into {} tokens", tokens.len());
    Ok(tokens)
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            line: 1,
            column: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(current) = self.peek() {
            let position = self.position();

            let kind = match current {
                ' ' | '\t' | '\r' => {
                    self.bump();
                    continue;
                }
                '#' => {
                    self.skip_comment();
                    continue;
                }
                '\n' => {
                    self.bump();
                    TokenKind::Newline
                }
                ',' => {
                    self.bump();
                    TokenKind::Comma
                }
                '(' => {
                    self.bump();
                    TokenKind::LParen
                }
                ')' => {
                    self.bump();
                    TokenKind::RParen
                }
                '"' => self.read_string(position)?,
                '[' => self.read_attribute(position)?,
                '<' => self.read_positional(position)?,
                '$' => self.read_variable(position)?,
                '-' => self.read_dash(position)?,
                c if c.is_ascii_digit() => TokenKind::Number(self.read_number()),
                c if c.is_ascii_alphabetic() || c == '_' => self.read_word(),
                c => return Err(error(LexErrorKind::UnexpectedCharacter, c, position)),
            };

            tokens.push(Token { kind, position });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            position: self.position(),
        });

        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_nth(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let current = self.peek()?;
        self.index += 1;
        if current == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(current)
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> String {
        let mut taken = String::new();
        while let Some(current) = self.peek() {
            if !predicate(current) {
                break;
            }
            taken.push(current);
            self.bump();
        }
        taken
    }

    fn skip_comment(&mut self) {
        while let Some(current) = self.peek() {
            if current == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn read_string(&mut self, start: Position) -> Result<TokenKind, LexError> {
        self.bump();
        let mut value = String::new();

        loop {
            match self.bump() {
                None => return Err(error(LexErrorKind::UnterminatedString, '"', start)),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None => return Err(error(LexErrorKind::UnterminatedString, '"', start)),
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                },
                Some(other) => value.push(other),
            }
        }

        Ok(TokenKind::Str(value))
    }

    fn read_attribute(&mut self, start: Position) -> Result<TokenKind, LexError> {
        self.bump();
        let contents = self.take_while(|c| c != ']' && c != '\n');
        if self.bump() != Some(']') {
            return Err(error(LexErrorKind::UnterminatedAttribute, '[', start));
        }

        Ok(TokenKind::Attribute(contents.trim().to_string()))
    }

    fn read_positional(&mut self, start: Position) -> Result<TokenKind, LexError> {
        self.bump();
        let contents = self.take_while(|c| c != '>' && c != '\n');
        if self.bump() != Some('>') {
            return Err(error(LexErrorKind::UnterminatedPositional, '<', start));
        }

        let contents = contents.trim();
        let (name, variadic) = match contents.strip_suffix("...") {
            Some(name) => (name.trim(), true),
            None => (contents, false),
        };

        if name.is_empty() {
            return Err(error(LexErrorKind::UnexpectedCharacter, '<', start));
        }

        Ok(TokenKind::Positional {
            name: name.to_string(),
            variadic,
        })
    }

    fn read_variable(&mut self, start: Position) -> Result<TokenKind, LexError> {
        self.bump();
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        if name.is_empty() {
            return Err(error(LexErrorKind::EmptyVariable, '$', start));
        }

        Ok(TokenKind::Variable(name))
    }

    fn read_dash(&mut self, start: Position) -> Result<TokenKind, LexError> {
        match self.peek_nth(1) {
            Some('>') => {
                self.bump();
                self.bump();
                Ok(TokenKind::Arrow)
            }
            Some(c) if c.is_ascii_digit() => {
                self.bump();
                Ok(TokenKind::Number(format!("-{}", self.read_number())))
            }
            Some(c) if c.is_ascii_alphanumeric() || c == '-' => {
                let flag = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
                if flag.chars().all(|c| c == '-') {
                    return Err(error(LexErrorKind::UnexpectedCharacter, '-', start));
                }
                Ok(TokenKind::Flag(flag))
            }
            _ => Err(error(LexErrorKind::UnexpectedCharacter, '-', start)),
        }
    }

    fn read_number(&mut self) -> String {
        let mut number = self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            number.push('.');
            number.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }

        number
    }

    fn read_word(&mut self) -> TokenKind {
        let word =
            self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');

        match word.as_str() {
            "appname" => TokenKind::AppName,
            "use" => TokenKind::Use,
            "root" => TokenKind::Root,
            "cmd" => TokenKind::Cmd,
            "default" => TokenKind::Default,
            _ => TokenKind::Identifier(word),
        }
    }
}

fn error(kind: LexErrorKind, character: char, position: Position) -> LexError {
    LexError {
        kind,
        character,
        position,
    }
}
