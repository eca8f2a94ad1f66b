//! # stubsmith
//!
//! **stubsmith** turns an exported project description into files on disk: client
//! source skeletons, mock-server payloads and routing rules, and the
//! configuration a later incremental run needs.
//!
//! ## Overview
//!
//! An export carries a *document tree* of Handlebars templates together with the
//! project's domain entities: interfaces, data types, templates and pages. Each
//! file node in the tree declares a data source; the generator renders it once,
//! or once per entity of that kind, binding the entity into the render context.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Loading and normalizing an export (JSON or YAML)
//! - **[`generator`]** - Sandbox, tree walker, output writer, mocks and run config
//! - **[`dummy_value`]** - Mock payload synthesis from parameter schemas
//! - **[`providers`]** - File system, downloader, diff and project-file seams
//! - **[`config`]** - Run arguments and the optional YAML settings file
//! - **[`logging`]** - `tracing` subscriber setup for the binary
//! - **[`cli`]** - The `stubsmith` command line
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as CLI<br/>(stubsmith)
//!     participant Spec as spec::load_data_source
//!     participant Builder as generator::Builder
//!     participant Walker as generator::DocTreeWalker
//!     participant FS as File System
//!
//!     CLI->>Spec: load_data_source("export.json")
//!     Spec-->>CLI: NormalizedSpec
//!     CLI->>Builder: run(&spec)
//!     Builder->>Builder: register helpers, build context
//!     Builder->>FS: mock payloads (incremental runs)
//!     Builder->>Walker: walk(docs, output_root)
//!     Walker->>FS: rendered files, downloads
//!     Builder->>FS: stubsmith.json, server.config.json
//!     Builder-->>CLI: BuildReport
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! stubsmith build --input export.json --output my-app
//! stubsmith update --input export.json --output my-app --key demo
//! ```
//!
//! ## Template Helpers
//!
//! Besides the Handlebars built-ins, templates can call `ifCond`, `typeName`,
//! `iosProperty`, `raw`, `JSONStringify` and a set of case-conversion helpers.
//! Document nodes with the `HandlebarHelper` data source are Rhai scripts
//! registered as helpers under their file stem; they run with operation and
//! size limits and cannot reach the file system or network.

pub mod cli;
pub mod config;
pub mod dummy_value;
pub mod generator;
pub mod logging;
pub mod providers;
pub mod spec;

pub use generator::{BuildReport, Builder};
pub use spec::{load_data_source, NormalizedSpec};
