//! Declaration resolver.
//!
//! Folds each declaration's attribute list into a typed [`Descriptor`] and
//! checks that the attributes agree with each other. A [`ResolvedProgram`] is
//! internally consistent; the matcher and help builder never re-check it.

use log::{debug, warn};
use serde::Serialize;

use crate::command_definitions::{
    Attribute, Binding, CommandBody, OptionDecl, PositionalDecl, Program,
};
use crate::error::{Position, Result, SemanticError, SemanticRule};
use crate::parser::parse;
use crate::value::{Value, ValueType};

/// Canonical, typed form of a declaration's attribute groups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub value_type: ValueType,
    /// Already coerced to `value_type`; wrapped in a list for `multiple`
    /// options and variadic positionals.
    pub default: Option<Value>,
    pub required: bool,
    pub multiple: bool,
}

impl Descriptor {
    /// A `[bool][multiple]` option, which counts its occurrences.
    #[must_use]
    pub fn is_count(&self) -> bool {
        self.value_type.is_bool() && self.multiple
    }

    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        match &self.value_type {
            ValueType::Choice(choices) => Some(choices),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedOption {
    pub name: String,
    pub short: Option<String>,
    pub long: Option<String>,
    pub value_name: Option<String>,
    pub descriptor: Descriptor,
    pub description: Option<String>,
    pub action: Option<Binding>,
}

impl ResolvedOption {
    #[must_use]
    pub fn takes_value(&self) -> bool {
        !self.descriptor.value_type.is_bool()
    }

    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.short.as_deref() == Some(flag) || self.long.as_deref() == Some(flag)
    }

    /// The flag used when reporting errors about this option.
    #[must_use]
    pub fn display_flag(&self) -> &str {
        self.long
            .as_deref()
            .or(self.short.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPositional {
    pub name: String,
    pub variadic: bool,
    pub descriptor: Descriptor,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCommand {
    /// `None` for the default command.
    pub name: Option<String>,
    pub description: Option<String>,
    pub options: Vec<ResolvedOption>,
    pub positionals: Vec<ResolvedPositional>,
    pub binding: Binding,
}

impl ResolvedCommand {
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProgram {
    pub app_name: Option<String>,
    pub imports: Vec<String>,
    pub root_options: Vec<ResolvedOption>,
    pub commands: Vec<ResolvedCommand>,
    pub default_command: Option<ResolvedCommand>,
}

impl ResolvedProgram {
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&ResolvedCommand> {
        self.commands
            .iter()
            .find(|command| command.name.as_deref() == Some(name))
    }
}

/// Parses and resolves `source` in one step.
///
/// # Arguments
///
/// * `source` - Script text
///
/// # Returns
///
/// The resolved program, ready for matching.
///
/// # Errors
///
/// Returns the first lex, parse or semantic error in the source.
pub fn compile(source: &str) -> Result<ResolvedProgram> {
    let program = parse(source)?;
    Ok(resolve(&program)?)
}

/// Resolves every declaration of `program`.
///
/// # Errors
///
/// Returns a [`SemanticError`] naming the first declaration whose attributes
/// are inconsistent.
pub fn resolve(program: &Program) -> std::result::Result<ResolvedProgram, SemanticError> {
    let root_options = resolve_options(&program.root_options)?;

    let mut commands = Vec::with_capacity(program.commands.len());
    for command in &program.commands {
        commands.push(resolve_command(
            Some(command.name.clone()),
            command.description.clone(),
            &command.body,
        )?);
    }

    let default_command = match &program.default_command {
        Some(default) => Some(resolve_command(
            None,
            default.description.clone(),
            &default.body,
        )?),
        None => None,
    };

    debug!("Resolved {} commands", commands.len());
    warn_unimported_targets(program);

    Ok(ResolvedProgram {
        app_name: program.app_name.clone(),
        imports: program.imports.clone(),
        root_options,
        commands,
        default_command,
    })
}

/// Warns about dotted targets whose module is not a `use` import.
fn warn_unimported_targets(program: &Program) {
    if program.imports.is_empty() {
        return;
    }

    let bindings = program
        .commands
        .iter()
        .map(|command| &command.body.binding)
        .chain(program.default_command.iter().map(|default| &default.body.binding))
        .chain(program.root_options.iter().filter_map(|option| option.action.as_ref()));

    for binding in bindings {
        let module = binding.target.split_once('.').map(|(module, _)| module);
        if let Some(module) = module {
            if !program.imports.iter().any(|import| import == module) {
                warn!(
                    "Target `{}` at {} uses module `{module}`, which is not imported",
                    binding.target, binding.position
                );
            }
        }
    }
}

fn resolve_command(
    name: Option<String>,
    description: Option<String>,
    body: &CommandBody,
) -> std::result::Result<ResolvedCommand, SemanticError> {
    let options = resolve_options(&body.options)?;

    let mut positionals = Vec::with_capacity(body.positionals.len());
    for positional in &body.positionals {
        positionals.push(resolve_positional(positional)?);
    }

    Ok(ResolvedCommand {
        name,
        description,
        options,
        positionals,
        binding: body.binding.clone(),
    })
}

fn resolve_options(
    options: &[OptionDecl],
) -> std::result::Result<Vec<ResolvedOption>, SemanticError> {
    options.iter().map(resolve_option).collect()
}

fn resolve_option(option: &OptionDecl) -> std::result::Result<ResolvedOption, SemanticError> {
    let declaration = option.to_string();
    let descriptor = resolve_descriptor(
        &declaration,
        option.position,
        &option.attributes,
        Slot::Option,
    )?;

    Ok(ResolvedOption {
        name: option.name(),
        short: option.short.clone(),
        long: option.long.clone(),
        value_name: option.value_name.clone(),
        descriptor,
        description: option.description.clone(),
        action: option.action.clone(),
    })
}

fn resolve_positional(
    positional: &PositionalDecl,
) -> std::result::Result<ResolvedPositional, SemanticError> {
    let declaration = positional.to_string();
    let descriptor = resolve_descriptor(
        &declaration,
        positional.position,
        &positional.attributes,
        Slot::Positional {
            variadic: positional.variadic,
        },
    )?;

    Ok(ResolvedPositional {
        name: positional.name.clone(),
        variadic: positional.variadic,
        descriptor,
        description: positional.description.clone(),
    })
}

#[derive(Clone, Copy)]
enum Slot {
    Option,
    /// `<name...>` positionals collect a list the same way a `multiple`
    /// option does.
    Positional { variadic: bool },
}

fn resolve_descriptor(
    declaration: &str,
    position: Position,
    attributes: &[Attribute],
    slot: Slot,
) -> std::result::Result<Descriptor, SemanticError> {
    let fail = |rule: SemanticRule| SemanticError {
        declaration: declaration.to_string(),
        position,
        rule,
    };

    let mut value_type: Option<ValueType> = None;
    let mut default_text: Option<&str> = None;
    let mut required = false;
    let variadic = matches!(slot, Slot::Positional { variadic: true });
    let mut multiple = variadic;

    for attribute in attributes {
        match attribute {
            Attribute::Type(declared) => {
                if value_type.is_some() {
                    return Err(fail(SemanticRule::DuplicateType));
                }
                value_type = Some(declared.clone());
            }
            Attribute::Required => required = true,
            Attribute::Default(text) => default_text = Some(text),
            Attribute::Multiple => {
                if let Slot::Positional { .. } = slot {
                    return Err(fail(SemanticRule::MultiplePositional));
                }
                multiple = true;
            }
        }
    }

    let value_type = value_type.unwrap_or(ValueType::String);

    if matches!(&value_type, ValueType::Choice(choices) if choices.is_empty()) {
        return Err(fail(SemanticRule::EmptyChoice));
    }

    if required && default_text.is_some() {
        return Err(fail(SemanticRule::RequiredWithDefault));
    }

    let is_count = value_type.is_bool() && multiple && !variadic;
    if is_count && default_text.is_some() {
        return Err(fail(SemanticRule::CountWithDefault));
    }

    let default = match default_text {
        Some(text) => {
            let value = value_type.coerce(text).ok_or_else(|| match &value_type {
                ValueType::Choice(_) => fail(SemanticRule::DefaultNotInChoice(text.to_string())),
                other => fail(SemanticRule::DefaultTypeMismatch {
                    value: text.to_string(),
                    expected_type: other.to_string(),
                }),
            })?;

            if multiple {
                Some(Value::List(vec![value]))
            } else {
                Some(value)
            }
        }
        None if is_count => Some(Value::Int(0)),
        None if value_type.is_bool() && !required && !multiple => Some(Value::Bool(false)),
        None => None,
    };

    Ok(Descriptor {
        value_type,
        default,
        required,
        multiple,
    })
}
