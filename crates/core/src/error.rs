use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 1-based line and column of a character in DSL source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Lex(#[from] LexError),

    #[error("{}", .0)]
    Parse(#[from] ParseError),

    #[error("{}", .0)]
    Semantic(#[from] SemanticError),

    #[error("{}", .0)]
    Match(#[from] MatchError),

    #[error("IO error with {} file at path `{}`: {}", .file_description, .path, .original)]
    Io {
        file_description: String,
        path: String,
        original: std::io::Error,
    },

    #[error("No function is registered for target `{}`", .0)]
    UnknownTarget(String),

    #[error("Error dispatching invocation: {}", .0)]
    Dispatch(String),

    #[error("Error formatting output: {}", .0)]
    Output(String),
}

impl Error {
    pub fn io_error(file_description: String, path: String, original: std::io::Error) -> Self {
        Self::Io {
            file_description,
            path,
            original,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated attribute group")]
    UnterminatedAttribute,

    #[error("unterminated positional name")]
    UnterminatedPositional,

    #[error("unexpected character")]
    UnexpectedCharacter,

    #[error("`$` must be followed by a name")]
    EmptyVariable,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Lex error at {}: {} `{}`", .position, .kind, .character.escape_default())]
pub struct LexError {
    pub kind: LexErrorKind,
    pub character: char,
    pub position: Position,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("expected {}, found {}", .expected.join(" or "), .found)]
    Unexpected {
        expected: Vec<&'static str>,
        found: String,
    },

    #[error("flag `{}` is declared twice in the same scope", .0)]
    DuplicateFlag(String),

    #[error("name `{}` is declared twice in the same scope", .0)]
    DuplicateName(String),

    #[error("command `{}` is declared twice", .0)]
    DuplicateCommand(String),

    #[error("only one `default` block may be declared")]
    SecondDefault,

    #[error("variadic positional `{}` must be the last positional", .0)]
    VariadicNotLast(String),

    #[error("binding references undeclared `${}`", .0)]
    UndeclaredReference(String),

    #[error("malformed attribute group `[{}]`", .0)]
    MalformedAttribute(String),

    #[error("`{}` has no `->` binding", .0)]
    MissingBinding(String),

    #[error("`{}` already has a `->` binding", .0)]
    DuplicateBinding(String),

    #[error("positional `<{}>` declared outside of a command", .0)]
    PositionalOutsideCommand(String),

    #[error("`root` must be followed by a flag")]
    MissingFlag,

    #[error("`{}` is not a valid flag; short flags are a single character", .0)]
    InvalidFlag(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Parse error at {}: {}", .position, .kind)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: Position,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticRule {
    #[error("default `{}` is not a valid {}", .value, .expected_type)]
    DefaultTypeMismatch {
        value: String,
        expected_type: String,
    },

    #[error("choice set may not be empty")]
    EmptyChoice,

    #[error("default `{}` is not one of the declared choices", .0)]
    DefaultNotInChoice(String),

    #[error("`required` and `default` are mutually exclusive")]
    RequiredWithDefault,

    #[error("a counting flag (`[bool][multiple]`) may not declare a default")]
    CountWithDefault,

    #[error("more than one type is declared")]
    DuplicateType,

    #[error("positionals cannot be `multiple`; declare `<name...>` instead")]
    MultiplePositional,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid declaration `{}` at {}: {}", .declaration, .position, .rule)]
pub struct SemanticError {
    pub declaration: String,
    pub position: Position,
    pub rule: SemanticRule,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("{}", no_such_command_message(.name))]
    NoSuchCommand { name: Option<String> },

    #[error("Unknown flag: `{}`", .flag)]
    UnknownFlag { flag: String },

    #[error("Option `{}` requires a value", .flag)]
    MissingOptionValue { flag: String },

    #[error("Missing required option `{}`", .flag)]
    MissingOption { flag: String },

    #[error("Missing required argument `<{}>`", .name)]
    MissingArgument { name: String },

    #[error("Too many arguments: unexpected `{}`", .unexpected.join(" "))]
    TooManyArguments { unexpected: Vec<String> },

    #[error("Invalid value `{}` for `{}`: expected {}", .raw_value, .decl_name, .expected_type)]
    TypeMismatch {
        decl_name: String,
        raw_value: String,
        expected_type: String,
    },
}

fn no_such_command_message(name: &Option<String>) -> String {
    match name {
        Some(name) => format!("No such command: `{name}`"),
        None => "No command given".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_display() {
        let error = LexError {
            kind: LexErrorKind::UnexpectedCharacter,
            character: '@',
            position: Position::new(3, 7),
        };
        assert_eq!(
            error.to_string(),
            "Lex error at line 3, column 7: unexpected character `@`"
        );
    }

    #[test]
    fn test_parse_error_display_lists_expected_kinds() {
        let error = ParseError::new(
            ParseErrorKind::Unexpected {
                expected: vec!["string", "identifier"],
                found: "`->`".to_string(),
            },
            Position::new(1, 5),
        );
        assert_eq!(
            error.to_string(),
            "Parse error at line 1, column 5: expected string or identifier, found `->`"
        );
    }

    #[test]
    fn test_no_such_command_display() {
        let named = MatchError::NoSuchCommand {
            name: Some("cpy".to_string()),
        };
        assert_eq!(named.to_string(), "No such command: `cpy`");

        let unnamed = MatchError::NoSuchCommand { name: None };
        assert_eq!(unnamed.to_string(), "No command given");
    }

    #[test]
    fn test_families_convert_into_error() {
        let error: Error = MatchError::MissingArgument {
            name: "source".to_string(),
        }
        .into();
        assert!(matches!(error, Error::Match(MatchError::MissingArgument { .. })));
        assert_eq!(error.to_string(), "Missing required argument `<source>`");
    }
}
