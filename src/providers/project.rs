use super::FileSystem;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An Xcode project located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectManifest {
    /// Product name, the `.xcodeproj` bundle name up to its first `.`
    pub product: String,
    pub pbxproj: PathBuf,
}

impl ProjectManifest {
    /// Find the `*.xcodeproj` bundle in `dir` whose `project.pbxproj` exists.
    pub fn locate(fs: &dyn FileSystem, dir: &Path) -> Option<Self> {
        let names = match fs.read_dir_names(dir) {
            Ok(names) => names,
            Err(err) => {
                debug!(dir = ?dir, error = %err, "Cannot list iOS project directory");
                return None;
            }
        };
        let bundle = names.into_iter().find(|n| n.ends_with(".xcodeproj"))?;
        let product = bundle.split('.').next().unwrap_or_default().to_string();
        let pbxproj = dir
            .join(format!("{product}.xcodeproj"))
            .join("project.pbxproj");
        if !fs.exists(&pbxproj) {
            debug!(path = ?pbxproj, "No project.pbxproj, skipping project update");
            return None;
        }
        Some(Self { product, pbxproj })
    }
}

/// Mutates a platform project manifest so it references the generated directories.
pub trait ProjectFileUpdater {
    fn update(&self, manifest: &ProjectManifest, tracked_dirs: &[PathBuf]) -> anyhow::Result<()>;
}

/// Logs the directories that would be added to the project.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProjectUpdater;

impl ProjectFileUpdater for LoggingProjectUpdater {
    fn update(&self, manifest: &ProjectManifest, tracked_dirs: &[PathBuf]) -> anyhow::Result<()> {
        info!(
            product = %manifest.product,
            pbxproj = ?manifest.pbxproj,
            dirs = tracked_dirs.len(),
            "Updating project file"
        );
        for dir in tracked_dirs {
            info!(dir = ?dir, "Project group");
        }
        Ok(())
    }
}
