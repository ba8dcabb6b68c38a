//! Terminal rendering of [`HelpModel`]s.

use std::io::Write;

use cliscript_core::help::{HelpModel, OptionHelp, PositionalHelp};
use cliscript_core::resolver::{ResolvedCommand, ResolvedOption, ResolvedProgram};
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use itertools::Itertools;

const HELP_FLAGS: [&str; 2] = ["-h", "--help"];

/// Decides whether `arguments` ask for help rather than a command.
///
/// Arguments are classified the way the matcher reads them: the first
/// positional token may name a command, and a value-taking option swallows
/// the token after it. A help flag only counts before a `--` terminator and
/// when the active scope (root options plus the selected or default command)
/// does not declare it.
///
/// # Arguments
///
/// * `program` - The compiled script.
/// * `arguments` - The user's arguments, program name stripped.
///
/// # Returns
///
/// `Some(command)` when help should be shown, where `command` is the command
/// to describe or `None` for top-level help. Empty arguments ask for
/// top-level help when there is no default command.
#[must_use]
pub fn help_request<'a>(program: &ResolvedProgram, arguments: &'a [String]) -> Option<Option<&'a str>> {
    if arguments.is_empty() {
        return program.default_command.is_none().then_some(None);
    }

    let mut command: Option<&ResolvedCommand> = None;
    let mut command_name = None;
    let mut seen_positional = false;
    let mut asked = false;
    let mut index = 0;

    while let Some(argument) = arguments.get(index) {
        let argument = argument.as_str();
        index += 1;

        if argument == "--" {
            break;
        }

        if argument == "-" || !argument.starts_with('-') {
            if !seen_positional {
                seen_positional = true;
                command = program.command(argument);
                command_name = command.map(|_| argument);
            }
            continue;
        }

        let active = command.or(program.default_command.as_ref());
        let scope = program
            .root_options
            .iter()
            .chain(active.into_iter().flat_map(|command| &command.options));

        match value_option(scope, argument) {
            Some(option) => {
                if option.takes_value() && !argument.contains('=') {
                    index += 1;
                }
            }
            None if HELP_FLAGS.contains(&argument) => asked = true,
            None => {}
        }
    }

    asked.then_some(command_name)
}

/// The declared option `argument` ends with: the flag itself, or the last
/// letter of a short cluster, which is the one that may take a value.
fn value_option<'p>(
    mut scope: impl Iterator<Item = &'p ResolvedOption>,
    argument: &str,
) -> Option<&'p ResolvedOption> {
    let flag = if argument.starts_with("--") {
        argument.split_once('=').map_or(argument, |(flag, _)| flag).to_string()
    } else {
        format!("-{}", argument.chars().last()?)
    };

    scope.find(|option| option.has_flag(&flag))
}

/// Writes `model` as help text. Styling escapes are only emitted when
/// `colored` is set.
///
/// # Errors
///
/// Returns any error from writing to `writer`.
pub fn render_help<W: Write>(writer: &mut W, model: &HelpModel, colored: bool) -> std::io::Result<()> {
    if let Some(description) = &model.description {
        queue!(writer, Print(description), Print("\n\n"))?;
    }

    heading(writer, "Usage:", colored)?;
    queue!(writer, Print(" "), Print(&model.usage), Print("\n"))?;

    let positional_rows: Vec<(String, String)> =
        model.positionals.iter().map(positional_row).collect();
    let option_rows: Vec<(String, String)> = model.options.iter().map(option_row).collect();
    let command_rows: Vec<(String, String)> = model
        .commands
        .iter()
        .map(|command| {
            (
                command.name.clone(),
                command.description.clone().unwrap_or_default(),
            )
        })
        .collect();

    let width = positional_rows
        .iter()
        .chain(&option_rows)
        .chain(&command_rows)
        .map(|(left, _)| left.chars().count())
        .max()
        .unwrap_or(0);

    section(writer, "Arguments:", &positional_rows, width, colored)?;
    section(writer, "Options:", &option_rows, width, colored)?;
    section(writer, "Commands:", &command_rows, width, colored)?;

    writer.flush()
}

fn heading<W: Write>(writer: &mut W, text: &str, colored: bool) -> std::io::Result<()> {
    if colored {
        queue!(
            writer,
            SetAttribute(Attribute::Bold),
            SetAttribute(Attribute::Underlined),
            Print(text),
            SetAttribute(Attribute::Reset)
        )
    } else {
        queue!(writer, Print(text))
    }
}

fn section<W: Write>(
    writer: &mut W,
    title: &str,
    rows: &[(String, String)],
    width: usize,
    colored: bool,
) -> std::io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    queue!(writer, Print("\n"))?;
    heading(writer, title, colored)?;
    queue!(writer, Print("\n"))?;

    for (left, right) in rows {
        let padding = " ".repeat(width - left.chars().count() + 2);
        queue!(writer, Print("  "))?;

        if colored {
            queue!(
                writer,
                SetForegroundColor(Color::Green),
                Print(left),
                SetForegroundColor(Color::Reset)
            )?;
        } else {
            queue!(writer, Print(left))?;
        }

        queue!(writer, Print(padding), Print(right.trim_end()), Print("\n"))?;
    }

    Ok(())
}

fn option_row(option: &OptionHelp) -> (String, String) {
    let left = match &option.value_hint {
        Some(hint) => format!("{} {hint}", option.flags),
        None => option.flags.clone(),
    };

    let mut notes = Vec::new();
    if option.required {
        notes.push("required".to_string());
    }
    if option.multiple && option.value_hint.is_some() {
        notes.push("repeatable".to_string());
    }
    if let Some(choices) = option.value_type.strip_prefix("choice:") {
        notes.push(format!("one of: {}", choices.split(',').join(", ")));
    }
    if let Some(default) = &option.default {
        notes.push(format!("default: {default}"));
    }

    (left, describe(option.description.as_deref(), &notes))
}

fn positional_row(positional: &PositionalHelp) -> (String, String) {
    let left = if positional.variadic {
        format!("<{}...>", positional.name)
    } else {
        format!("<{}>", positional.name)
    };

    let mut notes = Vec::new();
    if positional.required {
        notes.push("required".to_string());
    }
    if let Some(default) = &positional.default {
        notes.push(format!("default: {default}"));
    }

    (left, describe(positional.description.as_deref(), &notes))
}

fn describe(description: Option<&str>, notes: &[String]) -> String {
    let notes = notes.iter().map(|note| format!("[{note}]"));
    description.into_iter().map(ToString::to_string).chain(notes).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliscript_core::help::build_help;
    use cliscript_core::resolver::compile;

    const SCRIPT: &str = r#"
appname "fileops"
root -v, --verbose [bool] [multiple] "More output"
cmd copy "Copy a file"
    -m, --mode <octal> [int] [default:644] "File mode"
    -C, --color [choice:auto,never] [default:auto]
    <source> [required] "File to copy"
    <target...>
    -> file_utils.copy($source, $target, $mode, $color)
cmd list "List files"
    -> file_utils.list()
"#;

    fn rendered(command: Option<&str>) -> String {
        let program = compile(SCRIPT).unwrap();
        let model = build_help(&program, command).unwrap();
        let mut output = Vec::new();
        render_help(&mut output, &model, false).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_render_top_level_help() {
        let text = rendered(None);
        assert_eq!(
            text,
            "Usage: fileops [options] <command> [args]\n\
             \n\
             Options:\n  \
             -v, --verbose  More output\n\
             \n\
             Commands:\n  \
             copy           Copy a file\n  \
             list           List files\n"
        );
    }

    #[test]
    fn test_render_command_help() {
        let text = rendered(Some("copy"));
        assert!(text.starts_with("Copy a file\n\nUsage: fileops copy [options] <source> [<target...>]\n"));
        assert!(text.contains("<source>  "));
        assert!(text.contains("File to copy [required]"));
        assert!(text.contains("-m, --mode <octal>"));
        assert!(text.contains("File mode [default: 644]"));
        assert!(text.contains("[one of: auto, never] [default: auto]"));
        assert!(!text.contains("Commands:"));
    }

    #[test]
    fn test_help_request() {
        let program = compile(SCRIPT).unwrap();
        let arguments = |words: &[&str]| -> Vec<String> {
            words.iter().map(ToString::to_string).collect()
        };

        assert_eq!(help_request(&program, &[]), Some(None));
        assert_eq!(help_request(&program, &arguments(&["--help"])), Some(None));
        assert_eq!(
            help_request(&program, &arguments(&["copy", "a", "-h"])),
            Some(Some("copy"))
        );
        assert_eq!(help_request(&program, &arguments(&["copy", "--", "-h"])), None);
        assert_eq!(help_request(&program, &arguments(&["copy", "a"])), None);
    }

    #[test]
    fn test_help_flag_taken_as_option_value() {
        let program = compile("cmd grep\n-p, --pattern [required]\n<file>\n-> search.grep($pattern, $file)").unwrap();
        let arguments = |words: &[&str]| -> Vec<String> {
            words.iter().map(ToString::to_string).collect()
        };

        assert_eq!(help_request(&program, &arguments(&["grep", "--pattern", "-h", "f"])), None);
        assert_eq!(help_request(&program, &arguments(&["grep", "-p", "-h", "f"])), None);
        assert_eq!(
            help_request(&program, &arguments(&["grep", "--pattern=x", "-h"])),
            Some(Some("grep"))
        );
    }

    #[test]
    fn test_help_flag_after_leading_root_option() {
        let program = compile(SCRIPT).unwrap();
        let arguments = vec!["-v".to_string(), "copy".to_string(), "--help".to_string()];

        assert_eq!(help_request(&program, &arguments), Some(Some("copy")));
        assert_eq!(
            help_request(&program, &["copy".to_string(), "-m".to_string(), "-h".to_string()]),
            None
        );
    }

    #[test]
    fn test_declared_help_flag_is_left_to_the_script() {
        let program = compile(
            "cmd show\n-h, --human [bool]\n-> fs.show($human)\ncmd list\n-> fs.list()\ndefault\n-> fs.df()",
        )
        .unwrap();
        let arguments = vec!["show".to_string(), "-h".to_string()];

        assert_eq!(help_request(&program, &arguments), None);
        assert_eq!(
            help_request(&program, &["list".to_string(), "-h".to_string()]),
            Some(Some("list"))
        );
        assert_eq!(help_request(&program, &[]), None);
        assert_eq!(
            help_request(&program, &["--help".to_string()]),
            Some(None)
        );
    }

    #[test]
    fn test_colored_output_has_escapes() {
        let program = compile(SCRIPT).unwrap();
        let model = build_help(&program, None).unwrap();
        let mut output = Vec::new();
        render_help(&mut output, &model, true).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains('\u{1b}'));
        assert!(text.contains("fileops [options]"));
    }
}
