//! Integration tests for cliscript-core
//!
//! These tests load a complete script from disk and drive it through
//! matching, help generation and dispatch.

use cliscript_core::{
    error::{Error, MatchError},
    file_handling::load_program,
    help::build_help,
    lexer::tokenize,
    matcher::{match_arguments, Selected},
    parser::parse,
    registry::{dispatch, Registry},
    resolver::ResolvedProgram,
    value::{ResolvedValue, Value},
};
use std::io::Write;
use tempfile::NamedTempFile;

const FILEOPS_SCRIPT: &str = r#"
# File operations
appname "fileops"
use "file_utils"

root -v, --verbose [bool] [multiple] "Increase verbosity"
root -V, --version [bool] "Print the version"
-> info.version()

cmd copy "Copy a file"
    -r, --recursive [bool] "Copy directories recursively"
    -f, --force [bool] "Overwrite existing files"
    <source> [required] "File to copy"
    <target> [required] "Destination"
    -> file_utils.copy($source, $target, $recursive, $force)

cmd grep "Search for a pattern"
    -n, --max-count <num> [int] [default:3] "Stop after this many matches"
    -i, --ignore-case [bool]
    <pattern> [required]
    <file...> [required]
    -> file_utils.grep($pattern, $file, $max_count, $ignore_case)

default "Show a summary"
    -> info.summary($verbose)
"#;

fn load(script: &str) -> ResolvedProgram {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{script}").unwrap();
    let temp_path = temp_file.path().to_str().unwrap().to_string();

    load_program(&temp_path).unwrap()
}

/// Test the copy example from the language reference end to end
#[test]
fn test_copy_workflow() {
    let program = load(FILEOPS_SCRIPT);
    let invocation = match_arguments(&program, &["copy", "-rf", "a.txt", "b.txt"]).unwrap();

    assert_eq!(invocation.command, Selected::Command("copy".to_string()));
    assert_eq!(invocation.target, "file_utils.copy");
    assert_eq!(
        invocation.arguments,
        vec![
            Some(Value::from("a.txt")),
            Some(Value::from("b.txt")),
            Some(Value::Bool(true)),
            Some(Value::Bool(true)),
        ]
    );
}

#[test]
fn test_grep_workflow() {
    let program = load(FILEOPS_SCRIPT);
    let invocation =
        match_arguments(&program, &["grep", "-i", "abc", "a.txt", "b.txt"]).unwrap();

    assert_eq!(
        invocation.arguments,
        vec![
            Some(Value::from("abc")),
            Some(Value::List(vec![Value::from("a.txt"), Value::from("b.txt")])),
            Some(Value::Int(3)),
            Some(Value::Bool(true)),
        ]
    );
    assert_eq!(
        invocation.values["max_count"],
        ResolvedValue::Default(Value::Int(3))
    );

    let error = match_arguments(&program, &["grep", "-n", "12x", "abc", "a.txt"]).unwrap_err();
    assert!(matches!(error, MatchError::TypeMismatch { .. }));
}

#[test]
fn test_default_and_root_action_workflow() {
    let program = load(FILEOPS_SCRIPT);

    let summary = match_arguments(&program, &["-v", "--verbose"]).unwrap();
    assert_eq!(summary.command, Selected::Default);
    assert_eq!(summary.target, "info.summary");
    assert_eq!(summary.arguments, vec![Some(Value::Int(2))]);

    let version = match_arguments(&program, &["-V"]).unwrap();
    assert_eq!(version.command, Selected::RootAction("version".to_string()));
    assert_eq!(version.target, "info.version");

    let error = match_arguments(&program, &["summary", "extra"]).unwrap_err();
    assert_eq!(
        error,
        MatchError::TooManyArguments {
            unexpected: vec!["summary".to_string(), "extra".to_string()]
        }
    );
}

#[test]
fn test_help_workflow() {
    let program = load(FILEOPS_SCRIPT);

    let top_level = build_help(&program, None).unwrap();
    assert_eq!(top_level.app_name, "fileops");
    assert_eq!(top_level.commands.len(), 2);
    assert_eq!(top_level.description.as_deref(), Some("Show a summary"));

    let grep = build_help(&program, Some("grep")).unwrap();
    assert_eq!(grep.usage, "fileops grep [options] <pattern> <file...>");
    assert_eq!(grep.options[0].default.as_deref(), Some("3"));
}

#[test]
fn test_dispatch_workflow() {
    let program = load(FILEOPS_SCRIPT);
    let mut registry = Registry::with_imports(&program.imports);
    registry.register("file_utils.copy", |arguments| {
        let words: Vec<String> = arguments.iter().flatten().map(ToString::to_string).collect();
        Ok(Some(Value::Str(words.join(" "))))
    });

    let invocation = match_arguments(&program, &["copy", "-f", "a.txt", "b.txt"]).unwrap();
    assert_eq!(
        dispatch(&registry, &invocation).unwrap(),
        Some(Value::from("a.txt b.txt false true"))
    );

    let version = match_arguments(&program, &["--version"]).unwrap();
    assert!(matches!(
        dispatch(&registry, &version),
        Err(Error::UnknownTarget(target)) if target == "info.version"
    ));
}

#[test]
fn test_parsing_is_deterministic() {
    assert_eq!(
        tokenize(FILEOPS_SCRIPT).unwrap(),
        tokenize(FILEOPS_SCRIPT).unwrap()
    );
    assert_eq!(parse(FILEOPS_SCRIPT).unwrap(), parse(FILEOPS_SCRIPT).unwrap());
}

#[test]
fn test_invalid_script_reports_position() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "cmd a\n-n, --count [int] [default:lots]\n-> m.a($count)\n").unwrap();
    let temp_path = temp_file.path().to_str().unwrap().to_string();

    match load_program(&temp_path) {
        Err(Error::Semantic(error)) => {
            assert_eq!(error.declaration, "-n, --count");
            assert_eq!(error.position.line, 2);
        }
        other => panic!("Expected semantic error, got {other:?}"),
    }
}
