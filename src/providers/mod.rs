//! # Providers
//!
//! Collaborators the generator reaches only through traits: file-system
//! primitives, binary download, change detection and platform project-file
//! mutation. Mock payload synthesis lives in [`crate::dummy_value`].
//!
//! Each trait ships a default implementation so the CLI works end to end:
//!
//! | Trait | Default |
//! |---|---|
//! | [`FileSystem`] | [`LocalFs`] |
//! | [`Downloader`] | [`HttpDownloader`] |
//! | [`DiffProvider`] | [`DiffResult`] (fixed flags), [`SnapshotDiff`] |
//! | [`ProjectFileUpdater`] | [`LoggingProjectUpdater`] |

mod diff;
mod download;
mod fs;
mod project;

pub use diff::{DiffProvider, DiffResult, SnapshotDiff};
pub use download::{Downloader, HttpDownloader};
pub use fs::{FileSystem, LocalFs};
pub use project::{LoggingProjectUpdater, ProjectFileUpdater, ProjectManifest};
