//! Script path resolution.
//!
//! Resolves where the script is loaded from and expands shell shorthands
//! like `~` in the path.

/// Default location of the script when none is given on the command line.
const DEFAULT_SCRIPT_PATH: &str = "~/.cliscript/cli.cls";

/// Name shown in usage lines when the script has no `appname` directive.
pub const DEFAULT_APP_NAME: &str = "CLI Tool";

/// Resolves the script file path.
///
/// If a custom path is provided, uses that path. Otherwise, uses the default
/// script path. Shell expansions like `~` are resolved.
///
/// # Arguments
///
/// * `script_path_arg` - Optional custom script file path
///
/// # Returns
///
/// The resolved script file path as a String.
///
/// # Examples
///
/// ```
/// use cliscript_core::config::get_script_path;
///
/// let custom_path = get_script_path(&Some("/path/to/tool.cls".to_string()));
/// assert_eq!(custom_path, "/path/to/tool.cls");
/// ```
pub fn get_script_path(script_path_arg: &Option<String>) -> String {
    let script_path = match script_path_arg {
        Some(script_path) => script_path,
        None => DEFAULT_SCRIPT_PATH,
    };

    shellexpand::tilde(script_path).to_string()
}
