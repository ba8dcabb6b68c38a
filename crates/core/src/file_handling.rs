//! Loading scripts from disk.

use std::fs::File;
use std::io::Read;

use log::info;

use crate::error::{Error, Result};
use crate::resolver::{compile, ResolvedProgram};

fn get_reader(file_description: &str, path: &str) -> Result<File> {
    File::open(path).map_err(|e| Error::io_error(file_description.to_string(), path.to_string(), e))
}

/// Reads the script source at `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or is not valid UTF-8.
pub fn load_source(path: &str) -> Result<String> {
    let mut reader = get_reader("script", path)?;
    let mut source = String::new();

    reader
        .read_to_string(&mut source)
        .map_err(|e| Error::io_error("script".to_string(), path.to_string(), e))?;

    Ok(source)
}

/// Loads, parses and resolves the script at `path`.
///
/// # Arguments
///
/// * `path` - Path to the script file
///
/// # Returns
///
/// The resolved program declared by the script.
///
/// # Errors
///
/// Returns an error if:
/// - The script file cannot be read
/// - The source fails to lex or parse
/// - A declaration's attributes are inconsistent
///
/// # Examples
///
/// ```no_run
/// use cliscript_core::file_handling::load_program;
///
/// let program = load_program("/home/me/.cliscript/cli.cls")?;
/// println!("Loaded {} commands", program.commands.len());
/// # Ok::<(), cliscript_core::error::Error>(())
/// ```
pub fn load_program(path: &str) -> Result<ResolvedProgram> {
    let source = load_source(path)?;
    let program = compile(&source)?;
    info!("Loaded {} commands from {path}", program.commands.len());

    Ok(program)
}
