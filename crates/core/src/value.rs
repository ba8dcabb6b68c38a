//! Declared value types and the typed values raw tokens are coerced into.

use std::fmt::{Display, Formatter};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Bool,
    String,
    Int,
    Float,
    Choice(Vec<String>),
}

impl ValueType {
    /// Parses the contents of a type attribute group such as `int` or
    /// `choice:a,b,c`. Returns `None` when the text names no type.
    #[must_use]
    pub fn from_attribute(text: &str) -> Option<Self> {
        match text {
            "bool" => Some(ValueType::Bool),
            "string" => Some(ValueType::String),
            "int" => Some(ValueType::Int),
            "float" => Some(ValueType::Float),
            _ => {
                let choices = text.strip_prefix("choice:")?;
                Some(ValueType::Choice(
                    choices
                        .split(',')
                        .map(str::trim)
                        .filter(|choice| !choice.is_empty())
                        .map(ToString::to_string)
                        .collect(),
                ))
            }
        }
    }

    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, ValueType::Bool)
    }

    /// Coerces a raw token into a value of this type.
    ///
    /// Returns `None` when the text is not a valid value: non-numeric text
    /// for `int`/`float`, anything but `true`/`false` for `bool`, or a value
    /// outside a choice set.
    #[must_use]
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        match self {
            ValueType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueType::String => Some(Value::Str(raw.to_string())),
            ValueType::Int => raw.parse::<i64>().ok().map(Value::Int),
            ValueType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|float| float.is_finite())
                .map(Value::Float),
            ValueType::Choice(choices) => choices
                .iter()
                .any(|choice| choice == raw)
                .then(|| Value::Str(raw.to_string())),
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Bool => formatter.write_str("bool"),
            ValueType::String => formatter.write_str("string"),
            ValueType::Int => formatter.write_str("int"),
            ValueType::Float => formatter.write_str("float"),
            ValueType::Choice(choices) => write!(formatter, "choice:{}", choices.join(",")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Renders the value as command line words. Lists expand to one word per
    /// element.
    #[must_use]
    pub fn to_words(&self) -> Vec<String> {
        match self {
            Value::List(values) => values.iter().flat_map(Value::to_words).collect(),
            other => vec![other.to_string()],
        }
    }
}

impl Display for Value {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Bool(value) => write!(formatter, "{value}"),
            Value::Int(value) => write!(formatter, "{value}"),
            Value::Float(value) => write!(formatter, "{value}"),
            Value::Str(value) => formatter.write_str(value),
            Value::List(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(formatter, "[{}]", rendered.join(", "))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// Outcome of matching one declared option or positional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum ResolvedValue {
    /// Coerced from tokens on the command line.
    Supplied(Value),
    /// Taken from the declaration's default.
    Default(Value),
    /// Not supplied and no default; only possible when not required.
    Absent,
}

impl ResolvedValue {
    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        match self {
            ResolvedValue::Supplied(value) | ResolvedValue::Default(value) => Some(value),
            ResolvedValue::Absent => None,
        }
    }

    #[must_use]
    pub fn is_supplied(&self) -> bool {
        matches!(self, ResolvedValue::Supplied(_))
    }
}
