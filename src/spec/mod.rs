//! # Spec Module
//!
//! Loads a spec export (JSON or YAML) and normalizes it into the typed entities the
//! generator consumes: the document tree, interfaces, data types, page templates,
//! pages and constraints.

mod load;
mod types;

pub use load::*;
pub use types::*;
