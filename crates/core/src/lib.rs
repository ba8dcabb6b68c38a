//! cliscript Core Library
//!
//! This crate compiles scripts written in a small language for describing
//! command line interfaces, and matches process arguments against them.
//!
//! # Key Features
//!
//! - **Lexing and Parsing**: Turn script source into a [`command_definitions::Program`]
//! - **Resolution**: Fold attribute groups into typed descriptors and check them
//! - **Argument Matching**: Bind argv to options and positionals, with coercion and defaults
//! - **Help Models**: Describe a program or command as structured data
//! - **Dispatch**: Route a matched invocation to a registered function
//!
//! # Examples
//!
//! ```
//! use cliscript_core::matcher::match_arguments;
//! use cliscript_core::resolver::compile;
//!
//! let program = compile(
//!     "cmd copy\n-f, --force [bool]\n<source> [required]\n<target> [required]\n-> files.copy($source, $target, $force)",
//! )?;
//! let invocation = match_arguments(&program, &["copy", "-f", "a.txt", "b.txt"])?;
//! assert_eq!(invocation.target, "files.copy");
//! # Ok::<(), cliscript_core::error::Error>(())
//! ```

pub mod command_definitions;
pub mod config;
pub mod error;
pub mod file_handling;
pub mod help;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod value;
