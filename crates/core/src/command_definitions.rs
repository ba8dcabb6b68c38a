//! Parsed command tree.
//!
//! These types mirror the source text: attribute groups are kept as the
//! tagged list the parser read, in order. [`crate::resolver`] folds them into
//! typed descriptors before anything is matched against them.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::Position;
use crate::value::{Value, ValueType};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub app_name: Option<String>,
    pub imports: Vec<String>,
    pub root_options: Vec<OptionDecl>,
    pub commands: Vec<CommandDecl>,
    pub default_command: Option<DefaultCommandDecl>,
}

impl Program {
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&CommandDecl> {
        self.commands.iter().find(|command| command.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDecl {
    pub name: String,
    pub description: Option<String>,
    pub body: CommandBody,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultCommandDecl {
    pub description: Option<String>,
    pub body: CommandBody,
    pub position: Position,
}

/// Declarations shared by named commands and the default command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandBody {
    pub options: Vec<OptionDecl>,
    pub positionals: Vec<PositionalDecl>,
    pub binding: Binding,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Attribute {
    Type(ValueType),
    Required,
    Default(String),
    Multiple,
}

impl Attribute {
    /// Parses the contents of one `[...]` group. Returns `None` for anything
    /// that is not a known type or attribute.
    #[must_use]
    pub fn from_group(text: &str) -> Option<Self> {
        match text {
            "required" => Some(Attribute::Required),
            "multiple" => Some(Attribute::Multiple),
            _ => {
                if let Some(value) = text.strip_prefix("default:") {
                    return Some(Attribute::Default(value.to_string()));
                }

                ValueType::from_attribute(text).map(Attribute::Type)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDecl {
    /// Short flag including its dash, e.g. `-r`.
    pub short: Option<String>,
    /// Long flag including its dashes, e.g. `--recursive`.
    pub long: Option<String>,
    /// Placeholder from `<valueName>`, shown in help.
    pub value_name: Option<String>,
    pub attributes: Vec<Attribute>,
    pub description: Option<String>,
    /// Binding run instead of the command when this root option is supplied.
    pub action: Option<Binding>,
    pub position: Position,
}

impl OptionDecl {
    /// Name a binding refers to this option by: the long flag without its
    /// dashes (inner hyphens become underscores), else the short flag letter.
    #[must_use]
    pub fn name(&self) -> String {
        let flag = match (&self.long, &self.short) {
            (Some(long), _) => long.trim_start_matches('-'),
            (None, Some(short)) => short.trim_start_matches('-'),
            (None, None) => "",
        };

        flag.replace('-', "_")
    }

    #[must_use]
    pub fn flags(&self) -> Vec<&str> {
        self.short
            .iter()
            .chain(self.long.iter())
            .map(String::as_str)
            .collect()
    }
}

impl Display for OptionDecl {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.flags().join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionalDecl {
    pub name: String,
    pub variadic: bool,
    pub attributes: Vec<Attribute>,
    pub description: Option<String>,
    pub position: Position,
}

impl Display for PositionalDecl {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        if self.variadic {
            write!(formatter, "<{}...>", self.name)
        } else {
            write!(formatter, "<{}>", self.name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParamRef {
    Literal(Value),
    /// `$name`, stored without the dollar sign.
    Reference(String),
}

impl Display for ParamRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamRef::Literal(Value::Str(text)) => write!(formatter, "{text:?}"),
            ParamRef::Literal(value) => write!(formatter, "{value}"),
            ParamRef::Reference(name) => write!(formatter, "${name}"),
        }
    }
}

/// Dispatch target of a command: `module.function(params...)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub target: String,
    pub parameters: Vec<ParamRef>,
    pub position: Position,
}

impl Binding {
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().filter_map(|parameter| match parameter {
            ParamRef::Reference(name) => Some(name.as_str()),
            ParamRef::Literal(_) => None,
        })
    }
}

impl Display for Binding {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let parameters: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        write!(formatter, "{}({})", self.target, parameters.join(", "))
    }
}
