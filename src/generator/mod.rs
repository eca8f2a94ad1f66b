//! # Generator Module
//!
//! Materializes a document tree of Handlebars templates into a project on disk.
//!
//! ## Architecture
//!
//! ```text
//! NormalizedSpec → RenderContext → DocTreeWalker → OutputWriter → files
//!                       ↑               ↑
//!                 mock rules        Sandbox (built-in + script helpers)
//! ```
//!
//! - [`Sandbox`] - Handlebars registry plus a restricted Rhai engine for
//!   helpers authored in the document tree
//! - [`DocTreeWalker`] - depth-first interpretation of directory and file nodes
//! - [`OutputWriter`] - overwrite policy and `!!w`/`!!nw` write directives
//! - [`MockWriter`] - mock payloads and mock-server routing rules
//! - [`Builder`] - orchestration of one run
//!
//! ## Document nodes
//!
//! A file node's data source decides how it expands:
//!
//! | Data source | Expands over | Bound as |
//! |---|---|---|
//! | `None` | once | - |
//! | `Interface` | `ds.interfaces` | `interface` |
//! | `DataType` | `ds.datatypes` (or `datatypeEnums` with `!!enum` in the name) | `datatype` |
//! | `Template` | `ds.templates` | `template` |
//! | `WebView` | `ds.pages` | `view` |
//! | `HandlebarHelper` | never written; registered as a helper | - |
//!
//! A name that renders empty suppresses the file. Rendered names may contain
//! `/` and are confined to the directory they render in.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stubsmith::config::{Action, BuildArgs, BuildConfig};
//! use stubsmith::dummy_value::SchemaMockData;
//! use stubsmith::generator::Builder;
//! use stubsmith::providers::HttpDownloader;
//! use stubsmith::spec::load_data_source;
//!
//! let spec = load_data_source("export.json".as_ref())?;
//! let config = BuildConfig::new(BuildArgs::new(Action::Build), "out");
//! let downloader = HttpDownloader::new();
//! let mock = SchemaMockData::new();
//! let report = Builder::new(&config, &downloader, &mock).run(&spec)?;
//! downloader.join_all();
//! println!("{report}");
//! ```

mod builder;
mod context;
pub mod helpers;
mod mock;
mod paths;
pub mod sandbox;
mod server_config;
mod walker;
mod writer;

pub use builder::{BuildReport, Builder};
pub use context::RenderContext;
pub use mock::{view_rules, MockRule, MockWriter, ViewRule, DEFAULT_MOCK_FILTER};
pub use paths::{join_rendered, mock_data_path, strip_extension, StructuralRoots};
pub use sandbox::{Sandbox, SandboxError};
pub use server_config::{
    engine_config, server_config, sorted_rules, ServerRule, ENGINE_CONFIG_FILE,
    PRESERVED_FIELDS, SERVER_CONFIG_FILE,
};
pub use walker::{DocTreeWalker, RegenerationPolicy, WalkReport, ENUM_FLAG};
pub use writer::{OutputWriter, WriteDirective, WriteOutcome};
