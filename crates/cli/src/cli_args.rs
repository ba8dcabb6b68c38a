//! Command-line argument parsing.
//!
//! `clis` owns only a handful of flags. Everything after them is passed
//! untouched to the script's own argument matcher.

use clap::Parser;

/// Command-line arguments for the `clis` runner.
///
/// # Examples
///
/// ```rust
/// use clap::Parser;
/// use cliscript_cli::cli_args::Args;
///
/// let args = Args::parse_from(["clis", "-c", "tool.cls", "copy", "-rf", "a", "b"]);
/// assert_eq!(args.arguments, vec!["copy", "-rf", "a", "b"]);
/// ```
#[derive(Parser, Debug)] // requires `derive` feature
#[command(term_width = 0, disable_help_flag = true)]
pub struct Args {
    /// Path to the script describing the command line interface.
    ///
    /// If not provided, defaults to `~/.cliscript/cli.cls`.
    #[arg(long, short = 'c')]
    pub script_path: Option<String>,

    /// Print the matched invocation instead of running it.
    #[arg(long, short = 'd', action)]
    pub dry_run: bool,

    /// Print the script's tokens as YAML and exit.
    #[arg(long, action)]
    pub dump_tokens: bool,

    /// Print the script's syntax tree as YAML and exit.
    #[arg(long, action)]
    pub dump_ast: bool,

    /// Arguments matched against the script, starting with the command name.
    ///
    /// `-h`/`--help` here shows the script's help unless the script declares
    /// that flag itself.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub arguments: Vec<String>,
}

impl Args {
    /// Arguments before a `--` terminator, where a help flag still counts.
    #[must_use]
    pub fn option_arguments(&self) -> &[String] {
        let end = self
            .arguments
            .iter()
            .position(|argument| argument == "--")
            .unwrap_or(self.arguments.len());

        &self.arguments[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_values() {
        let args = Args::parse_from(["clis"]);

        assert!(args.script_path.is_none());
        assert!(!args.dry_run);
        assert!(!args.dump_tokens);
        assert!(!args.dump_ast);
        assert!(args.arguments.is_empty());
    }

    #[test]
    fn test_args_short_flags() {
        let args = Args::parse_from(["clis", "-c", "/custom/tool.cls", "-d"]);

        assert_eq!(args.script_path, Some("/custom/tool.cls".to_string()));
        assert!(args.dry_run);
    }

    #[test]
    fn test_args_long_flags() {
        let args = Args::parse_from([
            "clis",
            "--script-path",
            "/custom/tool.cls",
            "--dry-run",
            "--dump-tokens",
            "--dump-ast",
        ]);

        assert_eq!(args.script_path, Some("/custom/tool.cls".to_string()));
        assert!(args.dry_run);
        assert!(args.dump_tokens);
        assert!(args.dump_ast);
    }

    #[test]
    fn test_script_arguments_keep_their_flags() {
        let args = Args::parse_from(["clis", "-d", "copy", "-rf", "a.txt"]);

        assert!(args.dry_run);
        assert_eq!(args.arguments, vec!["copy", "-rf", "a.txt"]);
    }

    #[test]
    fn test_option_arguments_stop_at_terminator() {
        let args = Args {
            script_path: None,
            dry_run: false,
            dump_tokens: false,
            dump_ast: false,
            arguments: ["grep", "-n", "2", "--", "-h"]
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        assert_eq!(args.option_arguments(), ["grep", "-n", "2"]);
    }

    #[test]
    fn test_help_flag_reaches_script_arguments() {
        let args = Args::parse_from(["clis", "copy", "--help"]);
        assert_eq!(args.arguments, vec!["copy", "--help"]);
    }
}
