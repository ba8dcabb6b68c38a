//! Runs matched invocations as external programs.
//!
//! A target `module.function` runs the program `module` with `function` as
//! its first argument, followed by the invocation's arguments as words.

use std::io::Write;
use std::process::{Command, Stdio};

use cliscript_core::error::{Error, Result};
use cliscript_core::registry::FunctionRegistry;
use cliscript_core::value::Value;
use log::info;

#[derive(Debug, Default)]
pub struct ProcessRegistry {
    imports: Vec<String>,
}

impl ProcessRegistry {
    /// A target without a module runs under the first import.
    #[must_use]
    pub fn with_imports(imports: &[String]) -> Self {
        Self {
            imports: imports.to_vec(),
        }
    }

    /// The program and its argument words for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTarget`] if `target` has no module part and no
    /// import to fall back on.
    pub fn command_line(
        &self,
        target: &str,
        arguments: &[Option<Value>],
    ) -> Result<(String, Vec<String>)> {
        let (program, function) = match target.split_once('.') {
            Some((module, function)) if !module.is_empty() && !function.is_empty() => {
                (module.to_string(), function.to_string())
            }
            _ => {
                let module = self
                    .imports
                    .first()
                    .ok_or_else(|| Error::UnknownTarget(target.to_string()))?;
                (module.clone(), target.to_string())
            }
        };

        let mut words = vec![function];
        words.extend(arguments.iter().flatten().flat_map(Value::to_words));

        Ok((program, words))
    }
}

impl FunctionRegistry for ProcessRegistry {
    fn call(&self, target: &str, arguments: &[Option<Value>]) -> Result<Option<Value>> {
        let (program, words) = self.command_line(target, arguments)?;
        info!("Running `{program}` with {words:?}");

        let mut command = Command::new(&program);
        command.args(&words);
        execute_command(command, &program)?;

        Ok(None)
    }
}

/// Runs `command` attached to this terminal and waits for it.
///
/// # Errors
///
/// Returns an error if the program cannot be started or exits with a
/// non-zero status.
pub fn execute_command(mut command: Command, program: &str) -> Result<()> {
    let command = command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let status = command
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(|e| Error::io_error("program".to_string(), program.to_string(), e))?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Dispatch(format!("`{program}` exited with {status}")))
    }
}

/// Writes a value returned by the bound function, one line, if there is one.
///
/// # Errors
///
/// Returns [`Error::Output`] if `writer` fails.
pub fn write_result<W: Write>(writer: &mut W, result: Option<&Value>) -> Result<()> {
    if let Some(value) = result {
        writeln!(writer, "{value}").map_err(|e| Error::Output(e.to_string()))?;
    }
    Ok(())
}
