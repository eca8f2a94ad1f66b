//! # CLI Module
//!
//! Command-line front end for the generator.
//!
//! ## Commands
//!
//! ### `build`
//!
//! Generate a project from scratch:
//!
//! ```bash
//! stubsmith build --input export.json --output my-app
//! ```
//!
//! ### `update`
//!
//! Regenerate an existing project. Documents bound to interfaces, data types,
//! templates or pages are rewritten; plain documents only with `--spec`:
//!
//! ```bash
//! stubsmith update --input export.json --output my-app --key demo \
//!     --spec-type ios --previous last-export.json
//! ```
//!
//! Options shared by both:
//! - `--input <FILE>` - Exported project (required)
//! - `--output <DIR>` - Output root (required)
//! - `--key <KEY>` - Project key; turns on mock data and run config
//! - `--overwrite` - Overwrite existing files
//! - `--config <FILE>` - YAML settings supplying defaults
//! - `--arg <NAME=VALUE>` - Extra value for templates, repeatable
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use stubsmith::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let report = run_cli(&cli)?;
//! println!("{report}");
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands, RunArgs};
