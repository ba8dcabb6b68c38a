//! End-to-end tests for the `clis` binary.

use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

const SCRIPT: &str = r#"
appname "fileops"
use "echo"

root -V, --version [bool] "Print the version"
-> echo.version()

cmd copy "Copy a file"
    -r, --recursive [bool] "Copy directories"
    -f, --force [bool] "Overwrite"
    <source> [required]
    <target> [required]
    -> file_utils.copy($source, $target, $recursive, $force)

cmd greet "Say hello"
    -n, --times [int] [default:1]
    <name...> [required]
    -> echo.hello($name, $times)
"#;

fn script_file() -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{SCRIPT}").unwrap();
    temp_file
}

fn clis(script: &NamedTempFile, arguments: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_clis"))
        .arg("--script-path")
        .arg(script.path())
        .args(arguments)
        .output()
        .unwrap()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_dry_run_prints_invocation() {
    let script = script_file();
    let output = clis(&script, &["--dry-run", "copy", "-rf", "a.txt", "b.txt"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("target: file_utils.copy"));
    assert!(stdout.contains("- a.txt"));
    assert!(stdout.contains("- true"));
}

#[cfg(unix)]
#[test]
fn test_runs_bound_program() {
    let script = script_file();
    let output = clis(&script, &["greet", "ada", "grace", "--times", "2"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_of(&output), "hello ada grace 2\n");
}

#[cfg(unix)]
#[test]
fn test_root_action() {
    let script = script_file();
    let output = clis(&script, &["-V"]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_of(&output), "version\n");
}

#[test]
fn test_unknown_command_suggests_closest() {
    let script = script_file();
    let output = clis(&script, &["cpy", "a", "b"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("No such command: `cpy`"));
    assert!(stderr.contains("Did you mean `copy`?"));
}

#[test]
fn test_type_mismatch_is_a_usage_error() {
    let script = script_file();
    let output = clis(&script, &["greet", "-n", "2x", "ada"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr_of(&output).contains("2x"));
}

#[test]
fn test_help_for_command() {
    let script = script_file();
    let output = clis(&script, &["copy", "--help"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Usage: fileops copy [options] <source> <target>"));
    assert!(stdout.contains("-r, --recursive"));
    assert!(stdout.contains("-V, --version"));
}

#[test]
fn test_empty_arguments_show_top_level_help() {
    let script = script_file();
    let output = clis(&script, &[]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Commands:"));
    assert!(stdout.contains("greet"));
}

#[test]
fn test_dump_tokens() {
    let script = script_file();
    let output = clis(&script, &["--dump-tokens"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("kind: AppName"));
}

#[test]
fn test_dump_ast() {
    let script = script_file();
    let output = clis(&script, &["--dump-ast"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("app_name: fileops"));
    assert!(stdout.contains("target: file_utils.copy"));
}

#[test]
fn test_missing_script_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_clis"))
        .args(["--script-path", "/this/path/does/not/exist.cls", "copy"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("/this/path/does/not/exist.cls"));
}

#[test]
fn test_invalid_script_fails() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "cmd broken\n<name>\n").unwrap();

    let output = clis(&temp_file, &["broken"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("Parse error at line"));
}
