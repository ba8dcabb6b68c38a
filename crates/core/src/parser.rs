//! Recursive-descent parser from tokens to a [`Program`].
//!
//! Top-level statements are dispatched on their leading keyword. Option
//! lines seen before the first `cmd`/`default` belong to the root scope;
//! inside a block, option and positional lines accumulate until the block's
//! `->` binding closes it. The first error encountered is returned.

use std::collections::HashSet;

use log::debug;

use crate::command_definitions::{
    Attribute, Binding, CommandBody, CommandDecl, DefaultCommandDecl, OptionDecl, ParamRef,
    PositionalDecl, Program,
};
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::value::Value;

const TOP_LEVEL: &[&str] = &["`appname`", "`use`", "`root`", "`cmd`", "`default`"];

/// Tokenizes and parses `source` into an unresolved [`Program`].
///
/// # Errors
///
/// Returns [`crate::error::Error::Lex`] or [`crate::error::Error::Parse`]
/// for the leftmost malformed token or construct.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = tokenize(source)?;
    Ok(parse_tokens(&tokens)?)
}

/// Parses an already tokenized source. `tokens` must end with
/// [`TokenKind::Eof`], as [`tokenize`] guarantees.
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered.
pub fn parse_tokens(tokens: &[Token]) -> std::result::Result<Program, ParseError> {
    let program = Parser::new(tokens).parse_program()?;
    debug!(
        "Parsed program with {} root options and {} commands (default: {})",
        program.root_options.len(),
        program.commands.len(),
        program.default_command.is_some()
    );
    Ok(program)
}

type ParseResult<T> = std::result::Result<T, ParseError>;

struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    program: Program,
    block_opened: bool,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            index: 0,
            program: Program::default(),
            block_opened: false,
        }
    }

    fn current(&self) -> &'a Token {
        let tokens = self.tokens;
        &tokens[self.index.min(tokens.len().saturating_sub(1))]
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.index += 1;
        }
        token
    }

    fn skip_newlines(&mut self) {
        while self.current().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &[&'static str]) -> ParseError {
        let token = self.current();
        ParseError::new(
            ParseErrorKind::Unexpected {
                expected: expected.to_vec(),
                found: token.kind.to_string(),
            },
            token.position,
        )
    }

    fn end_of_line(&mut self, expected: &[&'static str]) -> ParseResult<()> {
        match self.current().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected(expected)),
        }
    }

    fn parse_program(mut self) -> ParseResult<Program> {
        loop {
            self.skip_newlines();
            let token = self.current();

            match &token.kind {
                TokenKind::Eof => break,
                TokenKind::AppName => self.parse_app_name()?,
                TokenKind::Use => self.parse_use()?,
                TokenKind::Root => {
                    let root_token = self.advance();
                    if !matches!(self.current().kind, TokenKind::Flag(_)) {
                        return Err(ParseError::new(
                            ParseErrorKind::MissingFlag,
                            root_token.position,
                        ));
                    }
                    self.parse_root_option()?;
                }
                TokenKind::Flag(_) if !self.block_opened => self.parse_root_option()?,
                TokenKind::Cmd => self.parse_command()?,
                TokenKind::Default => self.parse_default_command()?,
                TokenKind::Positional { name, .. } => {
                    return Err(ParseError::new(
                        ParseErrorKind::PositionalOutsideCommand(name.clone()),
                        token.position,
                    ));
                }
                _ => return Err(self.unexpected(TOP_LEVEL)),
            }
        }

        Ok(self.program)
    }

    fn parse_app_name(&mut self) -> ParseResult<()> {
        self.advance();
        let name = match &self.current().kind {
            TokenKind::Str(name) | TokenKind::Identifier(name) => name.clone(),
            _ => return Err(self.unexpected(&["string"])),
        };
        self.advance();
        self.end_of_line(&["end of line"])?;

        self.program.app_name = Some(name);
        Ok(())
    }

    fn parse_use(&mut self) -> ParseResult<()> {
        self.advance();
        let module = match &self.current().kind {
            TokenKind::Str(module) | TokenKind::Identifier(module) => module.clone(),
            _ => return Err(self.unexpected(&["string", "identifier"])),
        };
        self.advance();
        self.end_of_line(&["end of line"])?;

        self.program.imports.push(module);
        Ok(())
    }

    fn parse_root_option(&mut self) -> ParseResult<()> {
        let mut option = self.parse_option_line()?;
        check_option_unique(&self.program.root_options, &[], &option)?;

        self.skip_newlines();
        if self.current().kind == TokenKind::Arrow {
            let mut scope: Vec<String> = self
                .program
                .root_options
                .iter()
                .map(OptionDecl::name)
                .collect();
            scope.push(option.name());

            option.action = Some(self.parse_binding(&scope)?);
        }

        self.program.root_options.push(option);
        Ok(())
    }

    fn parse_command(&mut self) -> ParseResult<()> {
        self.advance();
        self.block_opened = true;

        let name_token = self.current();
        let TokenKind::Identifier(name) = &name_token.kind else {
            return Err(self.unexpected(&["identifier"]));
        };
        self.advance();

        if self.program.command(name).is_some() {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateCommand(name.clone()),
                name_token.position,
            ));
        }

        let description = self.parse_description();
        self.end_of_line(&["string", "end of line"])?;

        let body = self.parse_body(name)?;
        self.program.commands.push(CommandDecl {
            name: name.clone(),
            description,
            body,
            position: name_token.position,
        });
        Ok(())
    }

    fn parse_default_command(&mut self) -> ParseResult<()> {
        let default_token = self.advance();
        self.block_opened = true;

        if self.program.default_command.is_some() {
            return Err(ParseError::new(
                ParseErrorKind::SecondDefault,
                default_token.position,
            ));
        }

        let description = self.parse_description();
        self.end_of_line(&["string", "end of line"])?;

        let body = self.parse_body("default")?;
        self.program.default_command = Some(DefaultCommandDecl {
            description,
            body,
            position: default_token.position,
        });
        Ok(())
    }

    fn parse_description(&mut self) -> Option<String> {
        if let TokenKind::Str(description) = &self.current().kind {
            self.advance();
            return Some(description.clone());
        }

        None
    }

    fn parse_body(&mut self, label: &str) -> ParseResult<CommandBody> {
        let mut options: Vec<OptionDecl> = Vec::new();
        let mut positionals: Vec<PositionalDecl> = Vec::new();

        loop {
            self.skip_newlines();
            let token = self.current();

            match &token.kind {
                TokenKind::Flag(_) => {
                    let option = self.parse_option_line()?;
                    check_option_unique(&options, &positionals, &option)?;
                    options.push(option);
                }
                TokenKind::Positional { .. } => {
                    let positional = self.parse_positional_line()?;
                    check_positional(&options, &positionals, &positional)?;
                    positionals.push(positional);
                }
                TokenKind::Arrow => {
                    let scope: Vec<String> = options
                        .iter()
                        .map(OptionDecl::name)
                        .chain(positionals.iter().map(|positional| positional.name.clone()))
                        .chain(self.program.root_options.iter().map(OptionDecl::name))
                        .collect();
                    let binding = self.parse_binding(&scope)?;

                    self.skip_newlines();
                    if self.current().kind == TokenKind::Arrow {
                        return Err(ParseError::new(
                            ParseErrorKind::DuplicateBinding(label.to_string()),
                            self.current().position,
                        ));
                    }

                    return Ok(CommandBody {
                        options,
                        positionals,
                        binding,
                    });
                }
                TokenKind::Eof
                | TokenKind::AppName
                | TokenKind::Use
                | TokenKind::Root
                | TokenKind::Cmd
                | TokenKind::Default => {
                    return Err(ParseError::new(
                        ParseErrorKind::MissingBinding(label.to_string()),
                        token.position,
                    ));
                }
                _ => return Err(self.unexpected(&["flag", "positional", "`->`"])),
            }
        }
    }

    fn parse_option_line(&mut self) -> ParseResult<OptionDecl> {
        let position = self.current().position;
        let mut short: Option<String> = None;
        let mut long: Option<String> = None;

        while let TokenKind::Flag(flag) = &self.current().kind {
            let flag_position = self.current().position;
            let slot = if flag.starts_with("--") {
                &mut long
            } else if flag.chars().count() == 2 {
                &mut short
            } else {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidFlag(flag.clone()),
                    flag_position,
                ));
            };

            if slot.is_some() {
                return Err(ParseError::new(
                    ParseErrorKind::DuplicateFlag(flag.clone()),
                    flag_position,
                ));
            }
            *slot = Some(flag.clone());
            self.advance();

            if self.current().kind == TokenKind::Comma {
                self.advance();
            }
        }

        let value_name = match &self.current().kind {
            TokenKind::Positional { name, .. } => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };

        let attributes = self.parse_attributes()?;
        let description = self.parse_description();
        self.end_of_line(&["attribute group", "string", "end of line"])?;

        Ok(OptionDecl {
            short,
            long,
            value_name,
            attributes,
            description,
            action: None,
            position,
        })
    }

    fn parse_positional_line(&mut self) -> ParseResult<PositionalDecl> {
        let token = self.advance();
        let TokenKind::Positional { name, variadic } = &token.kind else {
            return Err(ParseError::new(
                ParseErrorKind::Unexpected {
                    expected: vec!["positional"],
                    found: token.kind.to_string(),
                },
                token.position,
            ));
        };

        let attributes = self.parse_attributes()?;
        let description = self.parse_description();
        self.end_of_line(&["attribute group", "string", "end of line"])?;

        Ok(PositionalDecl {
            name: name.clone(),
            variadic: *variadic,
            attributes,
            description,
            position: token.position,
        })
    }

    fn parse_attributes(&mut self) -> ParseResult<Vec<Attribute>> {
        let mut attributes = Vec::new();

        while let TokenKind::Attribute(text) = &self.current().kind {
            let attribute = Attribute::from_group(text).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::MalformedAttribute(text.clone()),
                    self.current().position,
                )
            })?;
            attributes.push(attribute);
            self.advance();
        }

        Ok(attributes)
    }

    fn parse_binding(&mut self, scope: &[String]) -> ParseResult<Binding> {
        let position = self.advance().position;

        let TokenKind::Identifier(target) = &self.current().kind else {
            return Err(self.unexpected(&["identifier"]));
        };
        self.advance();

        let mut parameters = Vec::new();
        if self.current().kind == TokenKind::LParen {
            self.advance();

            if self.current().kind == TokenKind::RParen {
                self.advance();
            } else {
                loop {
                    parameters.push(self.parse_parameter(scope)?);

                    match self.current().kind {
                        TokenKind::Comma => {
                            self.advance();
                        }
                        TokenKind::RParen => {
                            self.advance();
                            break;
                        }
                        _ => return Err(self.unexpected(&["`,`", "`)`"])),
                    }
                }
            }
        }

        self.end_of_line(&["`(`", "end of line"])?;

        Ok(Binding {
            target: target.clone(),
            parameters,
            position,
        })
    }

    fn parse_parameter(&mut self, scope: &[String]) -> ParseResult<ParamRef> {
        let token = self.current();

        let parameter = match &token.kind {
            TokenKind::Variable(name) => {
                if !scope.iter().any(|declared| declared == name) {
                    return Err(ParseError::new(
                        ParseErrorKind::UndeclaredReference(name.clone()),
                        token.position,
                    ));
                }
                ParamRef::Reference(name.clone())
            }
            TokenKind::Str(text) => ParamRef::Literal(Value::Str(text.clone())),
            TokenKind::Number(number) => ParamRef::Literal(number_literal(number)),
            TokenKind::Identifier(word) if word == "true" => ParamRef::Literal(Value::Bool(true)),
            TokenKind::Identifier(word) if word == "false" => {
                ParamRef::Literal(Value::Bool(false))
            }
            _ => return Err(self.unexpected(&["variable", "string", "number", "`true`/`false`"])),
        };

        self.advance();
        Ok(parameter)
    }
}

fn number_literal(number: &str) -> Value {
    if let Ok(int) = number.parse::<i64>() {
        return Value::Int(int);
    }

    // The lexer only produces digit runs with an optional fraction.
    number
        .parse::<f64>()
        .map_or_else(|_| Value::Str(number.to_string()), Value::Float)
}

fn check_option_unique(
    options: &[OptionDecl],
    positionals: &[PositionalDecl],
    option: &OptionDecl,
) -> ParseResult<()> {
    let declared_flags: HashSet<&str> = options.iter().flat_map(OptionDecl::flags).collect();
    if let Some(flag) = option
        .flags()
        .into_iter()
        .find(|flag| declared_flags.contains(flag))
    {
        return Err(ParseError::new(
            ParseErrorKind::DuplicateFlag(flag.to_string()),
            option.position,
        ));
    }

    let name = option.name();
    let name_taken = options.iter().any(|declared| declared.name() == name)
        || positionals.iter().any(|declared| declared.name == name);
    if name_taken {
        return Err(ParseError::new(
            ParseErrorKind::DuplicateName(name),
            option.position,
        ));
    }

    Ok(())
}

fn check_positional(
    options: &[OptionDecl],
    positionals: &[PositionalDecl],
    positional: &PositionalDecl,
) -> ParseResult<()> {
    if let Some(previous) = positionals.last().filter(|previous| previous.variadic) {
        return Err(ParseError::new(
            ParseErrorKind::VariadicNotLast(previous.name.clone()),
            positional.position,
        ));
    }

    let name_taken = positionals
        .iter()
        .any(|declared| declared.name == positional.name)
        || options
            .iter()
            .any(|declared| declared.name() == positional.name);
    if name_taken {
        return Err(ParseError::new(
            ParseErrorKind::DuplicateName(positional.name.clone()),
            positional.position,
        ));
    }

    Ok(())
}
