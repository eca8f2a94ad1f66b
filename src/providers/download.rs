use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::JoinHandle;
use tracing::{debug, error};

/// Fetches a remote binary asset to a local path. Fire-and-forget: the
/// caller neither waits for nor retries the transfer.
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path);
}

/// Downloads over HTTP(S) on a detached thread per asset.
#[derive(Debug, Default)]
pub struct HttpDownloader {
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every started transfer has finished. Used by the binary
    /// before exiting so in-flight assets are not cut off.
    pub fn join_all(&self) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for handle in handles {
            if handle.join().is_err() {
                error!("Download thread panicked");
            }
        }
    }
}

fn fetch(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to request {url}"))?
        .error_for_status()
        .with_context(|| format!("Unexpected status for {url}"))?;
    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to read body of {url}"))?;
    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {dest:?}"))?;
    Ok(())
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) {
        let url = url.to_string();
        let dest: PathBuf = dest.to_path_buf();
        let handle = std::thread::spawn(move || match fetch(&url, &dest) {
            Ok(()) => debug!(url = %url, dest = ?dest, "Downloaded asset"),
            Err(err) => error!(url = %url, dest = ?dest, error = %format!("{err:#}"), "Asset download failed"),
        });
        match self.pending.lock() {
            Ok(mut pending) => pending.push(handle),
            Err(poisoned) => poisoned.into_inner().push(handle),
        }
    }
}
