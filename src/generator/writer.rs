//! Output writer: overwrite policy and filename-embedded write directives.

use crate::providers::FileSystem;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

static DIRECTIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!!(n?)[wW]").expect("write directive regex should be valid"));

/// Per-file override of the run's overwrite flag, written into a file name
/// as `!!w` (overwrite) or `!!nw` (keep).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDirective {
    Overwrite,
    Keep,
}

impl WriteDirective {
    /// Directive of the first marker in `path`, and `path` with every marker removed.
    pub fn extract(path: &str) -> (Option<WriteDirective>, String) {
        let directive = DIRECTIVE.captures(path).map(|caps| {
            if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
                WriteDirective::Keep
            } else {
                WriteDirective::Overwrite
            }
        });
        (directive, DIRECTIVE.replace_all(path, "").into_owned())
    }

    /// [`extract`](Self::extract) over a path.
    pub fn resolve(path: &Path) -> (Option<WriteDirective>, PathBuf) {
        let (directive, cleaned) = Self::extract(&path.to_string_lossy());
        (directive, PathBuf::from(cleaned))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    SkippedExisting(PathBuf),
}

pub struct OutputWriter<'a> {
    fs: &'a dyn FileSystem,
    overwrite: bool,
}

impl<'a> OutputWriter<'a> {
    pub fn new(fs: &'a dyn FileSystem, overwrite: bool) -> Self {
        Self { fs, overwrite }
    }

    /// Write `content` to `path`, honoring directives and the overwrite flag.
    /// The parent directory must exist.
    pub fn write(
        &self,
        path: &Path,
        content: &str,
        skip_existence_check: bool,
    ) -> io::Result<WriteOutcome> {
        let (directive, path) = WriteDirective::resolve(path);
        let overwrite = match directive {
            Some(WriteDirective::Overwrite) => true,
            Some(WriteDirective::Keep) => false,
            None => self.overwrite,
        };
        if !skip_existence_check && !overwrite && self.fs.exists(&path) {
            debug!(path = ?path, "File exists, not overwritten");
            return Ok(WriteOutcome::SkippedExisting(path));
        }
        self.fs.write(&path, content.as_bytes())?;
        debug!(path = ?path, "Wrote file");
        Ok(WriteOutcome::Written(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LocalFs;
    use tempfile::tempdir;

    #[test]
    fn test_extract_first_marker_wins() {
        assert_eq!(
            WriteDirective::extract("a!!w.js"),
            (Some(WriteDirective::Overwrite), "a.js".to_string())
        );
        assert_eq!(
            WriteDirective::extract("a!!nW.js"),
            (Some(WriteDirective::Keep), "a.js".to_string())
        );
        assert_eq!(
            WriteDirective::extract("x!!nw/a!!w.js"),
            (Some(WriteDirective::Keep), "x/a.js".to_string())
        );
        assert_eq!(WriteDirective::extract("plain.js"), (None, "plain.js".to_string()));
    }

    #[test]
    fn test_keep_marker_needs_lowercase_n() {
        assert_eq!(
            WriteDirective::extract("a!!W.js"),
            (Some(WriteDirective::Overwrite), "a.js".to_string())
        );
        assert_eq!(
            WriteDirective::extract("a!!NW.js"),
            (None, "a!!NW.js".to_string())
        );
    }

    #[test]
    fn test_existing_file_is_kept_without_overwrite() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "old").unwrap();
        let writer = OutputWriter::new(&LocalFs, false);
        let outcome = writer.write(&file, "new", false).unwrap();
        assert_eq!(outcome, WriteOutcome::SkippedExisting(file.clone()));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "old");

        writer.write(&file, "new", true).unwrap();
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "new");
    }

    #[test]
    fn test_directives_override_global_flag() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "old").unwrap();

        let keep = OutputWriter::new(&LocalFs, false);
        let forced = dir.path().join("a!!w.txt");
        assert!(matches!(keep.write(&forced, "w", false).unwrap(), WriteOutcome::Written(_)));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "w");

        let overwrite = OutputWriter::new(&LocalFs, true);
        let kept = dir.path().join("a!!nw.txt");
        assert!(matches!(
            overwrite.write(&kept, "nw", false).unwrap(),
            WriteOutcome::SkippedExisting(_)
        ));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "w");
    }

    #[test]
    fn test_missing_parent_is_an_error() {
        let dir = tempdir().unwrap();
        let writer = OutputWriter::new(&LocalFs, true);
        assert!(writer.write(&dir.path().join("no/such/a.txt"), "x", false).is_err());
    }
}
