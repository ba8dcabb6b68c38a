//! Structured help model.
//!
//! [`build_help`] describes a [`ResolvedProgram`] (or one of its commands) as
//! plain data. Turning a [`HelpModel`] into terminal text is left to the
//! caller.

use serde::Serialize;

use crate::config::DEFAULT_APP_NAME;
use crate::error::MatchError;
use crate::resolver::{ResolvedCommand, ResolvedOption, ResolvedPositional, ResolvedProgram};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpModel {
    pub app_name: String,
    /// The command this help describes; `None` for top-level help.
    pub command: Option<String>,
    pub description: Option<String>,
    pub usage: String,
    pub options: Vec<OptionHelp>,
    pub positionals: Vec<PositionalHelp>,
    /// Command summaries; only filled for top-level help.
    pub commands: Vec<CommandSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionHelp {
    pub name: String,
    /// Flags as written, e.g. `-r, --recursive`.
    pub flags: String,
    /// Placeholder for the option's value; `None` for flags that take none.
    pub value_hint: Option<String>,
    pub value_type: String,
    pub default: Option<String>,
    pub required: bool,
    pub multiple: bool,
    pub description: Option<String>,
    /// Declared at the top level rather than on the command.
    pub global: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionalHelp {
    pub name: String,
    pub variadic: bool,
    pub value_type: String,
    pub default: Option<String>,
    pub required: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSummary {
    pub name: String,
    pub description: Option<String>,
}

/// Builds the help model for `program`, or for `command` within it.
///
/// # Arguments
///
/// * `program` - The resolved script
/// * `command` - A declared command name, or `None` for top-level help
///
/// # Returns
///
/// A [`HelpModel`] listing usage, options, positionals and, for top-level
/// help, the declared commands.
///
/// # Errors
///
/// Returns [`MatchError::NoSuchCommand`] if `command` names no declared
/// command.
pub fn build_help(
    program: &ResolvedProgram,
    command: Option<&str>,
) -> Result<HelpModel, MatchError> {
    let app_name = program
        .app_name
        .clone()
        .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

    let Some(name) = command else {
        return Ok(top_level_help(program, app_name));
    };

    let selected = program
        .command(name)
        .ok_or_else(|| MatchError::NoSuchCommand {
            name: Some(name.to_string()),
        })?;

    let mut options = option_help(&selected.options, false);
    options.extend(option_help(&program.root_options, true));

    Ok(HelpModel {
        usage: usage_line(&app_name, Some(name), !options.is_empty(), false, selected),
        app_name,
        command: Some(name.to_string()),
        description: selected.description.clone(),
        options,
        positionals: positional_help(&selected.positionals),
        commands: Vec::new(),
    })
}

fn top_level_help(program: &ResolvedProgram, app_name: String) -> HelpModel {
    let mut options = option_help(&program.root_options, true);
    let mut positionals = Vec::new();

    let commands: Vec<CommandSummary> = program
        .commands
        .iter()
        .map(|command| CommandSummary {
            name: command.label().to_string(),
            description: command.description.clone(),
        })
        .collect();

    let (usage, description) = match &program.default_command {
        Some(default) => {
            options.extend(option_help(&default.options, false));
            positionals = positional_help(&default.positionals);
            (
                usage_line(&app_name, None, !options.is_empty(), !commands.is_empty(), default),
                default.description.clone(),
            )
        }
        None => {
            let mut usage = app_name.clone();
            if !options.is_empty() {
                usage.push_str(" [options]");
            }
            if !commands.is_empty() {
                usage.push_str(" <command> [args]");
            }
            (usage, None)
        }
    };

    HelpModel {
        app_name,
        command: None,
        description,
        usage,
        options,
        positionals,
        commands,
    }
}

fn usage_line(
    app_name: &str,
    command_name: Option<&str>,
    has_options: bool,
    has_commands: bool,
    command: &ResolvedCommand,
) -> String {
    let mut words = vec![app_name.to_string()];
    words.extend(command_name.map(ToString::to_string));
    if has_commands {
        words.push("[command]".to_string());
    }
    if has_options {
        words.push("[options]".to_string());
    }

    for positional in &command.positionals {
        let dots = if positional.variadic { "..." } else { "" };
        if positional.descriptor.required {
            words.push(format!("<{}{dots}>", positional.name));
        } else {
            words.push(format!("[<{}{dots}>]", positional.name));
        }
    }

    words.join(" ")
}

fn option_help(options: &[ResolvedOption], global: bool) -> Vec<OptionHelp> {
    options
        .iter()
        .map(|option| {
            let descriptor = &option.descriptor;
            let takes_value = option.takes_value();

            OptionHelp {
                name: option.name.clone(),
                flags: option
                    .short
                    .iter()
                    .chain(option.long.iter())
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                value_hint: takes_value.then(|| {
                    let hint = option
                        .value_name
                        .clone()
                        .unwrap_or_else(|| descriptor.value_type.to_string());
                    format!("<{hint}>")
                }),
                value_type: descriptor.value_type.to_string(),
                // Flag defaults (false, zero) are implied and not worth listing.
                default: descriptor
                    .default
                    .as_ref()
                    .filter(|_| takes_value)
                    .map(ToString::to_string),
                required: descriptor.required,
                multiple: descriptor.multiple,
                description: option.description.clone(),
                global,
            }
        })
        .collect()
}

fn positional_help(positionals: &[ResolvedPositional]) -> Vec<PositionalHelp> {
    positionals
        .iter()
        .map(|positional| PositionalHelp {
            name: positional.name.clone(),
            variadic: positional.variadic,
            value_type: positional.descriptor.value_type.to_string(),
            default: positional.descriptor.default.as_ref().map(ToString::to_string),
            required: positional.descriptor.required,
            description: positional.description.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::compile;

    const SOURCE: &str = r#"
appname "fileops"

root -v, --verbose [bool] [multiple] "More output"

cmd copy "Copy a file"
    -r, --recursive [bool] "Copy directories"
    -m, --mode <octal> [int] [default:644]
    <source> [required] "File to copy"
    <target...>
    -> file_utils.copy($source, $target, $recursive, $mode)

cmd list "List files"
    -> file_utils.list()
"#;

    #[test]
    fn test_top_level_help() {
        let program = compile(SOURCE).unwrap();
        let help = build_help(&program, None).unwrap();

        assert_eq!(help.app_name, "fileops");
        assert_eq!(help.command, None);
        assert_eq!(help.usage, "fileops [options] <command> [args]");
        assert_eq!(
            help.commands,
            vec![
                CommandSummary {
                    name: "copy".to_string(),
                    description: Some("Copy a file".to_string()),
                },
                CommandSummary {
                    name: "list".to_string(),
                    description: Some("List files".to_string()),
                },
            ]
        );
        assert_eq!(help.options.len(), 1);
        assert!(help.options[0].global);
        assert_eq!(help.options[0].value_hint, None);
        assert_eq!(help.options[0].default, None);
    }

    #[test]
    fn test_command_help() {
        let program = compile(SOURCE).unwrap();
        let help = build_help(&program, Some("copy")).unwrap();

        assert_eq!(help.command.as_deref(), Some("copy"));
        assert_eq!(help.usage, "fileops copy [options] <source> [<target...>]");
        assert!(help.commands.is_empty());

        let names: Vec<&str> = help.options.iter().map(|option| option.name.as_str()).collect();
        assert_eq!(names, vec!["recursive", "mode", "verbose"]);

        let mode = &help.options[1];
        assert_eq!(mode.flags, "-m, --mode");
        assert_eq!(mode.value_hint.as_deref(), Some("<octal>"));
        assert_eq!(mode.value_type, "int");
        assert_eq!(mode.default.as_deref(), Some("644"));
        assert!(!mode.global);

        assert_eq!(help.positionals.len(), 2);
        assert!(help.positionals[0].required);
        assert_eq!(help.positionals[0].description.as_deref(), Some("File to copy"));
        assert!(help.positionals[1].variadic);
    }

    #[test]
    fn test_unknown_command_help() {
        let program = compile(SOURCE).unwrap();
        assert_eq!(
            build_help(&program, Some("move")).unwrap_err(),
            MatchError::NoSuchCommand {
                name: Some("move".to_string())
            }
        );
    }

    #[test]
    fn test_default_command_in_top_level_help() {
        let program = compile(
            "cmd init\n-> app.init()\ndefault \"Greet someone\"\n--loud [bool]\n<name> [default:world]\n-> app.greet($name, $loud)",
        )
        .unwrap();
        let help = build_help(&program, None).unwrap();

        assert_eq!(help.app_name, DEFAULT_APP_NAME);
        assert_eq!(help.usage, "CLI Tool [command] [options] [<name>]");
        assert_eq!(help.description.as_deref(), Some("Greet someone"));
        assert_eq!(help.positionals[0].default.as_deref(), Some("world"));
        assert_eq!(help.commands.len(), 1);
    }

    #[test]
    fn test_help_never_names_undeclared_items() {
        let program = compile(SOURCE).unwrap();
        let option_names: Vec<&str> = program
            .root_options
            .iter()
            .chain(program.commands.iter().flat_map(|command| &command.options))
            .map(|option| option.name.as_str())
            .collect();
        let positional_names: Vec<&str> = program
            .commands
            .iter()
            .flat_map(|command| &command.positionals)
            .map(|positional| positional.name.as_str())
            .collect();

        let mut models = vec![build_help(&program, None).unwrap()];
        for command in &program.commands {
            models.push(build_help(&program, Some(command.label())).unwrap());
        }

        for model in models {
            for option in &model.options {
                assert!(option_names.contains(&option.name.as_str()));
            }
            for positional in &model.positionals {
                assert!(positional_names.contains(&positional.name.as_str()));
            }
            for summary in &model.commands {
                assert!(program.command(&summary.name).is_some());
            }
        }
    }
}
