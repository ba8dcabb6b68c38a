//! Argument matcher.
//!
//! Resolves a process argument vector against a [`ResolvedProgram`] in a
//! single left-to-right pass:
//!
//! 1. root options written first are bound, then the next token selects a
//!    command, else the default command applies;
//! 2. option tokens are bound to declarations in the active scope (the
//!    selected command's options, then the root options), coercing values as
//!    they are read; every other token is queued as positional;
//! 3. queued tokens are assigned to positionals in declaration order;
//! 4. defaults fill whatever was not supplied;
//! 5. the command's binding is evaluated into an ordered argument list.
//!
//! A token is never reclassified once read, so the first error encountered is
//! the one reported.

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;

use crate::command_definitions::{Binding, ParamRef};
use crate::error::MatchError;
use crate::resolver::{ResolvedCommand, ResolvedOption, ResolvedProgram};
use crate::value::{ResolvedValue, Value, ValueType};

/// Which declaration an [`Invocation`] was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Selected {
    Command(String),
    Default,
    /// A root option carrying its own binding, named by the option's name.
    RootAction(String),
}

/// A fully matched and type-checked call, ready for the function registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    pub command: Selected,
    /// Every option and positional in scope, by declared name.
    pub values: IndexMap<String, ResolvedValue>,
    pub binding: Binding,
    pub target: String,
    /// The binding's parameters in written order; `None` for absent values.
    pub arguments: Vec<Option<Value>>,
}

impl Invocation {
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(ResolvedValue::value)
    }
}

/// Matches `arguments` (program name already stripped) against `program`.
///
/// # Arguments
///
/// * `program` - The resolved script to match against
/// * `arguments` - The user's argument tokens, in order
///
/// # Returns
///
/// The selected command with every value resolved and the binding's
/// arguments evaluated.
///
/// # Errors
///
/// Returns the first [`MatchError`] found scanning left to right: an unknown
/// command or flag, a flag missing its value, a value that does not coerce to
/// its declared type, too few or too many positionals, or a missing required
/// option.
pub fn match_arguments<S: AsRef<str>>(
    program: &ResolvedProgram,
    arguments: &[S],
) -> Result<Invocation, MatchError> {
    let tokens: Vec<&str> = arguments.iter().map(AsRef::as_ref).collect();

    let mut matcher = Matcher::new(&program.root_options);
    let leading = matcher.bind_leading_root_options(&tokens)?;
    let rest = &tokens[leading..];

    let (command, selected, rest) = match rest.first() {
        Some(first) if program.command(first).is_some() => (
            program.command(first),
            Some(Selected::Command((*first).to_string())),
            &rest[1..],
        ),
        _ => match &program.default_command {
            Some(default) => (Some(default), Some(Selected::Default), rest),
            None => match rest.first() {
                // Only an option or an already bound root action is left to run.
                Some(first) if !first.starts_with('-') && matcher.root_action.is_none() => {
                    return Err(MatchError::NoSuchCommand {
                        name: Some((*first).to_string()),
                    })
                }
                _ => (None, None, rest),
            },
        },
    };
    debug!("Selected command: {selected:?}");

    matcher.select(command);
    matcher.bind_options(rest)?;

    if let Some(index) = matcher.root_action {
        let option = &program.root_options[index];
        if let Some(action) = &option.action {
            return Ok(matcher.root_action_invocation(option, action.clone()));
        }
    }

    let (Some(command), Some(selected)) = (command, selected) else {
        return Err(MatchError::NoSuchCommand {
            name: matcher.positional_tokens.first().map(|name| (*name).to_string()),
        });
    };

    matcher.invocation(command, selected)
}

struct Matcher<'p, 'a> {
    command: Option<&'p ResolvedCommand>,
    root_options: &'p [ResolvedOption],
    command_states: Vec<Option<Value>>,
    root_states: Vec<Option<Value>>,
    positional_tokens: Vec<&'a str>,
    root_action: Option<usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Owner {
    Command,
    Root,
}

impl<'p, 'a> Matcher<'p, 'a> {
    fn new(root_options: &'p [ResolvedOption]) -> Self {
        Self {
            command: None,
            root_options,
            command_states: Vec::new(),
            root_states: vec![None; root_options.len()],
            positional_tokens: Vec::new(),
            root_action: None,
        }
    }

    fn select(&mut self, command: Option<&'p ResolvedCommand>) {
        self.command = command;
        self.command_states = vec![None; command.map_or(0, |command| command.options.len())];
    }

    /// Binds root options written ahead of the command name and returns how
    /// many tokens they used. Stops at the first token that is not a complete
    /// root option, leaving it for the main pass.
    fn bind_leading_root_options(&mut self, tokens: &[&'a str]) -> Result<usize, MatchError> {
        let mut index = 0;

        while let Some(&token) = tokens.get(index) {
            if token == "-" || token == "--" || !token.starts_with('-') {
                break;
            }

            let (flag, inline_value) = match token.split_once('=') {
                Some((flag, value)) if token.starts_with("--") => (flag, Some(value)),
                _ => (token, None),
            };

            let resolved = match self.find(flag) {
                Some(found) => vec![found],
                None if !token.starts_with("--") && token.chars().count() > 2 => {
                    match self.split_cluster(token) {
                        Ok(resolved) => resolved,
                        Err(_) => break,
                    }
                }
                None => break,
            };

            let mut next = index + 1;
            let mut bound = Vec::with_capacity(resolved.len());
            for (owner, slot, option) in resolved {
                let raw = match (option.takes_value(), inline_value) {
                    (false, None) => None,
                    (false, Some(_)) => return Ok(index),
                    (true, Some(value)) => Some(value),
                    (true, None) => {
                        let Some(&value) = tokens.get(next) else {
                            return Ok(index);
                        };
                        next += 1;
                        Some(value)
                    }
                };
                bound.push((owner, slot, option, raw));
            }

            for (owner, slot, option, raw) in bound {
                self.record(owner, slot, option, raw)?;
            }
            index = next;
        }

        Ok(index)
    }

    /// Command scope first, so a command's flag shadows a root flag.
    fn find(&self, flag: &str) -> Option<(Owner, usize, &'p ResolvedOption)> {
        let command_options: &'p [ResolvedOption] = match self.command {
            Some(command) => &command.options,
            None => &[],
        };

        if let Some((index, option)) = position_of(command_options, flag) {
            return Some((Owner::Command, index, option));
        }

        position_of(self.root_options, flag).map(|(index, option)| (Owner::Root, index, option))
    }

    fn bind_options(&mut self, tokens: &[&'a str]) -> Result<(), MatchError> {
        let mut index = 0;
        let mut options_ended = false;

        while index < tokens.len() {
            let token = tokens[index];
            index += 1;

            if options_ended || token == "-" || !token.starts_with('-') {
                self.positional_tokens.push(token);
                continue;
            }

            if token == "--" {
                options_ended = true;
                continue;
            }

            if token.starts_with("--") {
                let (flag, inline_value) = match token.split_once('=') {
                    Some((flag, value)) => (flag, Some(value)),
                    None => (token, None),
                };

                let (owner, slot, option) = self.find(flag).ok_or_else(|| unknown_flag(flag))?;

                let raw = if !option.takes_value() {
                    if inline_value.is_some() {
                        return Err(unknown_flag(token));
                    }
                    None
                } else if let Some(value) = inline_value {
                    Some(value)
                } else {
                    let value = next_value(tokens, &mut index, option)?;
                    Some(value)
                };

                self.record(owner, slot, option, raw)?;
            } else if token.chars().count() == 2 {
                let (owner, slot, option) = self.find(token).ok_or_else(|| unknown_flag(token))?;
                let raw = if option.takes_value() {
                    Some(next_value(tokens, &mut index, option)?)
                } else {
                    None
                };

                self.record(owner, slot, option, raw)?;
            } else {
                for (owner, slot, option) in self.split_cluster(token)? {
                    let raw = if option.takes_value() {
                        Some(next_value(tokens, &mut index, option)?)
                    } else {
                        None
                    };

                    self.record(owner, slot, option, raw)?;
                }
            }
        }

        Ok(())
    }

    /// Splits `-rf` into `-r -f`. Every letter must name a distinct known
    /// flag, and only the last one may take a value.
    fn split_cluster(
        &self,
        token: &str,
    ) -> Result<Vec<(Owner, usize, &'p ResolvedOption)>, MatchError> {
        let letters: Vec<char> = token.chars().skip(1).collect();
        let mut resolved: Vec<(Owner, usize, &'p ResolvedOption)> = Vec::with_capacity(letters.len());

        for (position, letter) in letters.iter().enumerate() {
            let flag = format!("-{letter}");
            let Some((owner, slot, option)) = self.find(&flag) else {
                return Err(unknown_flag(token));
            };

            let is_last = position + 1 == letters.len();
            let repeated = resolved
                .iter()
                .any(|(seen_owner, seen_slot, _)| *seen_owner == owner && *seen_slot == slot);
            if repeated || (option.takes_value() && !is_last) {
                return Err(unknown_flag(token));
            }

            resolved.push((owner, slot, option));
        }

        Ok(resolved)
    }

    fn record(
        &mut self,
        owner: Owner,
        slot: usize,
        option: &ResolvedOption,
        raw: Option<&str>,
    ) -> Result<(), MatchError> {
        let descriptor = &option.descriptor;
        let state = match owner {
            Owner::Command => &mut self.command_states[slot],
            Owner::Root => &mut self.root_states[slot],
        };

        match raw {
            None if descriptor.is_count() => {
                let count = match *state {
                    Some(Value::Int(count)) => count + 1,
                    _ => 1,
                };
                *state = Some(Value::Int(count));
            }
            None => *state = Some(Value::Bool(true)),
            Some(raw) => {
                let value = coerce(&option.name, &descriptor.value_type, raw)?;
                if descriptor.multiple {
                    // The first occurrence replaces any declared default.
                    let mut values = match state.take() {
                        Some(Value::List(values)) => values,
                        _ => Vec::new(),
                    };
                    values.push(value);
                    *state = Some(Value::List(values));
                } else {
                    *state = Some(value);
                }
            }
        }

        if owner == Owner::Root && option.action.is_some() && self.root_action.is_none() {
            self.root_action = Some(slot);
        }

        Ok(())
    }

    fn root_values(&self) -> IndexMap<String, ResolvedValue> {
        self.root_options
            .iter()
            .zip(&self.root_states)
            .map(|(option, state)| (option.name.clone(), resolve_option(option, state)))
            .collect()
    }

    fn root_action_invocation(&self, option: &ResolvedOption, binding: Binding) -> Invocation {
        let values = self.root_values();
        debug!("Root option `{}` triggers {}", option.name, binding);

        build_invocation(Selected::RootAction(option.name.clone()), values, binding)
    }

    fn invocation(
        self,
        command: &ResolvedCommand,
        selected: Selected,
    ) -> Result<Invocation, MatchError> {
        let mut values = self.root_values();

        for (option, state) in command.options.iter().zip(&self.command_states) {
            values.insert(option.name.clone(), resolve_option(option, state));
        }

        let mut queued = self.positional_tokens.iter().copied();
        for positional in &command.positionals {
            let descriptor = &positional.descriptor;

            let taken: Vec<&str> = if positional.variadic {
                queued.by_ref().collect()
            } else {
                queued.next().into_iter().collect()
            };

            let resolved = if taken.is_empty() {
                if descriptor.required {
                    return Err(MatchError::MissingArgument {
                        name: positional.name.clone(),
                    });
                }
                descriptor
                    .default
                    .clone()
                    .map_or(ResolvedValue::Absent, ResolvedValue::Default)
            } else {
                let mut coerced = taken
                    .iter()
                    .map(|raw| coerce(&positional.name, &descriptor.value_type, raw))
                    .collect::<Result<Vec<Value>, MatchError>>()?;

                if positional.variadic {
                    ResolvedValue::Supplied(Value::List(coerced))
                } else {
                    ResolvedValue::Supplied(coerced.remove(0))
                }
            };

            values.insert(positional.name.clone(), resolved);
        }

        let unexpected: Vec<String> = queued.map(ToString::to_string).collect();
        if !unexpected.is_empty() {
            return Err(MatchError::TooManyArguments { unexpected });
        }

        let missing_option = command
            .options
            .iter()
            .zip(&self.command_states)
            .chain(self.root_options.iter().zip(&self.root_states))
            .find(|(option, state)| option.descriptor.required && state.is_none());
        if let Some((option, _)) = missing_option {
            return Err(MatchError::MissingOption {
                flag: option.display_flag().to_string(),
            });
        }

        debug!("Matched `{}` with {} values", command.label(), values.len());
        Ok(build_invocation(selected, values, command.binding.clone()))
    }
}

fn position_of<'p>(options: &'p [ResolvedOption], flag: &str) -> Option<(usize, &'p ResolvedOption)> {
    options
        .iter()
        .enumerate()
        .find(|(_, option)| option.has_flag(flag))
}

fn next_value<'a>(
    tokens: &[&'a str],
    index: &mut usize,
    option: &ResolvedOption,
) -> Result<&'a str, MatchError> {
    let value = tokens
        .get(*index)
        .copied()
        .ok_or_else(|| MatchError::MissingOptionValue {
            flag: option.display_flag().to_string(),
        })?;
    *index += 1;
    Ok(value)
}

fn unknown_flag(flag: &str) -> MatchError {
    MatchError::UnknownFlag {
        flag: flag.to_string(),
    }
}

fn coerce(name: &str, value_type: &ValueType, raw: &str) -> Result<Value, MatchError> {
    value_type
        .coerce(raw)
        .ok_or_else(|| MatchError::TypeMismatch {
            decl_name: name.to_string(),
            raw_value: raw.to_string(),
            expected_type: value_type.to_string(),
        })
}

fn resolve_option(option: &ResolvedOption, state: &Option<Value>) -> ResolvedValue {
    match state {
        Some(value) => ResolvedValue::Supplied(value.clone()),
        None => option
            .descriptor
            .default
            .clone()
            .map_or(ResolvedValue::Absent, ResolvedValue::Default),
    }
}

fn build_invocation(
    command: Selected,
    values: IndexMap<String, ResolvedValue>,
    binding: Binding,
) -> Invocation {
    let arguments = binding
        .parameters
        .iter()
        .map(|parameter| match parameter {
            ParamRef::Literal(value) => Some(value.clone()),
            ParamRef::Reference(name) => values.get(name).and_then(ResolvedValue::value).cloned(),
        })
        .collect();

    Invocation {
        command,
        values,
        target: binding.target.clone(),
        binding,
        arguments,
    }
}
