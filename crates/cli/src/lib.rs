//! cliscript CLI Library
//!
//! This crate provides `clis`, a runner that loads a script describing a
//! command line interface, matches the process arguments against it and
//! runs the bound target as an external program.
//!
//! # Architecture
//!
//! - [`cli_args`]: The runner's own flags, parsed with `clap`
//! - [`execution`]: Dispatching invocations to external programs
//! - [`help_rendering`]: Help requests and terminal rendering of help models
//! - [`suggestions`]: Fuzzy "did you mean" hints for match errors
//!
//! # Examples
//!
//! ```bash
//! # Run the `copy` command of the default script (~/.cliscript/cli.cls)
//! clis copy -rf a.txt b.txt
//!
//! # Use another script and only show what would run
//! clis -c ./tools.cls --dry-run deploy --env prod
//!
//! # Show help for one command
//! clis copy --help
//!
//! # Inspect how the script was read
//! clis -c ./tools.cls --dump-ast
//! ```

pub mod cli_args;
pub mod execution;
pub mod help_rendering;
pub mod suggestions;
