use std::io::stdout;
use std::process::ExitCode;

use clap::Parser;
use cliscript_cli::cli_args::Args;
use cliscript_cli::execution::{write_result, ProcessRegistry};
use cliscript_cli::help_rendering::{help_request, render_help};
use cliscript_cli::suggestions;
use cliscript_core::error::{Error, Result};
use cliscript_core::help::build_help;
use cliscript_core::lexer::tokenize;
use cliscript_core::matcher::match_arguments;
use cliscript_core::parser::parse;
use cliscript_core::registry::dispatch;
use cliscript_core::resolver::ResolvedProgram;
use cliscript_core::{config, file_handling};
use crossterm::tty::IsTty;
use log::{debug, info};
use serde::Serialize;

/// Exit code for arguments that do not match the script.
const USAGE_EXIT_CODE: u8 = 2;

fn print_yaml<T: Serialize>(value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).map_err(|e| Error::Output(e.to_string()))?;
    print!("{yaml}");
    Ok(())
}

fn print_help(program: &ResolvedProgram, command: Option<&str>) -> Result<()> {
    let model = build_help(program, command)?;
    let mut stdout = stdout();
    let colored = stdout.is_tty();

    render_help(&mut stdout, &model, colored)
        .map_err(|e| Error::io_error("output".to_string(), "stdout".to_string(), e))
}

/// Dump the script's tokens or syntax tree, whichever was requested
fn dump_script(args: &Args, script_path: &str) -> Result<()> {
    let source = file_handling::load_source(script_path)?;

    if args.dump_tokens {
        print_yaml(&tokenize(&source)?)?;
    }

    if args.dump_ast {
        print_yaml(&parse(&source)?)?;
    }

    Ok(())
}

fn execute(args: &Args) -> Result<ExitCode> {
    let script_path = config::get_script_path(&args.script_path);
    debug!("Script path: `{script_path}`");

    if args.dump_tokens || args.dump_ast {
        dump_script(args, &script_path)?;
        return Ok(ExitCode::SUCCESS);
    }

    let program = file_handling::load_program(&script_path)?;

    if let Some(command) = help_request(&program, &args.arguments) {
        print_help(&program, command)?;
        return Ok(ExitCode::SUCCESS);
    }

    let invocation = match match_arguments(&program, &args.arguments) {
        Ok(invocation) => invocation,
        Err(error) => {
            eprintln!("{error}");
            if let Some(hint) = suggestions::hint(&program, &error) {
                eprintln!("{hint}");
            }
            return Ok(ExitCode::from(USAGE_EXIT_CODE));
        }
    };
    info!("Matched {:?} to `{}`", invocation.command, invocation.binding);

    if args.dry_run {
        println!("Dry run is specified, exiting without executing.");
        print_yaml(&invocation)?;
        return Ok(ExitCode::SUCCESS);
    }

    let registry = ProcessRegistry::with_imports(&program.imports);
    let result = dispatch(&registry, &invocation)?;
    write_result(&mut stdout(), result.as_ref())?;

    Ok(ExitCode::SUCCESS)
}

fn exit_code_for(error: &Error) -> ExitCode {
    match error {
        Error::Match(_) => ExitCode::from(USAGE_EXIT_CODE),
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match execute(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for(&e)
        }
    }
}
