// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk layout of host assets.
//!
//! ```text
//! <root>/staging/<uuid>/   icons downloaded before the host row exists
//! <root>/hosts/<host-id>/  finalized icons of an installed host
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tsundoku_core::HostId;
use url::Url;

const STAGING_DIR: &str = "staging";
const HOSTS_DIR: &str = "hosts";
const DEFAULT_ICON_EXTENSION: &str = "png";

/// Icon file name for a source: `<slug>.<ext>`.
///
/// The extension is taken from the icon URL's path when it is 1 to 5 ASCII
/// alphanumerics, otherwise `png`.
pub fn icon_file_name(slug: &str, icon_url: &str) -> String {
    let ext = Url::parse(icon_url)
        .ok()
        .and_then(|url| {
            let last = url.path_segments()?.next_back()?.to_string();
            let (_, ext) = last.rsplit_once('.')?;
            let usable =
                (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric());
            usable.then(|| ext.to_ascii_lowercase())
        })
        .unwrap_or_else(|| DEFAULT_ICON_EXTENSION.to_string());
    format!("{slug}.{ext}")
}

/// Paths under the asset root.
#[derive(Debug, Clone)]
pub struct AssetLayout {
    root: PathBuf,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn staging_root(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn staging_dir(&self, key: &str) -> PathBuf {
        self.staging_root().join(key)
    }

    pub fn hosts_root(&self) -> PathBuf {
        self.root.join(HOSTS_DIR)
    }

    pub fn host_dir(&self, id: HostId) -> PathBuf {
        self.hosts_root().join(id.0.to_string())
    }

    /// Absolute path of an installed source's icon.
    pub fn icon_path(&self, host_id: HostId, icon: &str) -> PathBuf {
        self.host_dir(host_id).join(icon)
    }

    /// Create a fresh staging directory and return its key and path.
    pub async fn create_staging(&self) -> io::Result<(String, PathBuf)> {
        let key = uuid::Uuid::new_v4().to_string();
        let dir = self.staging_dir(&key);
        tokio::fs::create_dir_all(&dir).await?;
        debug!(staging = %dir.display(), "staging directory created");
        Ok((key, dir))
    }

    /// Remove a staging directory. Failures are logged, not returned.
    pub async fn discard_staging(&self, key: &str) {
        let dir = self.staging_dir(key);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => debug!(staging = %dir.display(), "staging directory removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(staging = %dir.display(), error = %e, "failed to remove staging directory"),
        }
    }

    /// Move a staging directory to the host's permanent directory.
    ///
    /// A leftover directory at the target path is removed first. If the
    /// staging directory is already gone but the target exists, another
    /// sweep finalized it and this is a no-op.
    pub async fn finalize(&self, key: &str, host_id: HostId) -> io::Result<PathBuf> {
        let staging = self.staging_dir(key);
        let target = self.host_dir(host_id);
        if !tokio::fs::try_exists(&staging).await? {
            if tokio::fs::try_exists(&target).await? {
                return Ok(target);
            }
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("staging directory {} is missing", staging.display()),
            ));
        }
        match tokio::fs::remove_dir_all(&target).await {
            Ok(()) => warn!(host_id = %host_id, "removed stale host asset directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        tokio::fs::create_dir_all(self.hosts_root()).await?;
        tokio::fs::rename(&staging, &target).await?;
        debug!(host_id = %host_id, path = %target.display(), "host assets finalized");
        Ok(target)
    }

    /// Delete a host's permanent directory. Returns whether anything was removed.
    pub async fn remove_host_dir(&self, host_id: HostId) -> io::Result<bool> {
        match tokio::fs::remove_dir_all(self.host_dir(host_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_name_uses_url_extension() {
        assert_eq!(
            icon_file_name("mangadex", "https://cdn.example.com/icons/md.WEBP"),
            "mangadex.webp"
        );
        assert_eq!(
            icon_file_name("comick", "https://cdn.example.com/comick.svg?v=3"),
            "comick.svg"
        );
    }

    #[test]
    fn icon_name_falls_back_to_png() {
        assert_eq!(icon_file_name("a", "https://cdn.example.com/icon"), "a.png");
        assert_eq!(
            icon_file_name("a", "https://cdn.example.com/icon.toolong"),
            "a.png"
        );
        assert_eq!(icon_file_name("a", "https://cdn.example.com/i.p-g"), "a.png");
        assert_eq!(icon_file_name("a", "not a url"), "a.png");
        assert_eq!(icon_file_name("a", "https://cdn.example.com/"), "a.png");
    }

    #[tokio::test]
    async fn staging_then_finalize_moves_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = AssetLayout::new(dir.path());
        let (key, staging) = layout.create_staging().await.unwrap();
        tokio::fs::write(staging.join("a.png"), b"icon").await.unwrap();

        let target = layout.finalize(&key, HostId(7)).await.unwrap();
        assert_eq!(target, layout.host_dir(HostId(7)));
        assert!(layout.icon_path(HostId(7), "a.png").exists());
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn finalize_replaces_stale_target() {
        let dir = tempfile::tempdir().unwrap();
        let layout = AssetLayout::new(dir.path());
        let stale = layout.host_dir(HostId(1));
        tokio::fs::create_dir_all(&stale).await.unwrap();
        tokio::fs::write(stale.join("old.png"), b"old").await.unwrap();

        let (key, staging) = layout.create_staging().await.unwrap();
        tokio::fs::write(staging.join("new.png"), b"new").await.unwrap();
        layout.finalize(&key, HostId(1)).await.unwrap();

        assert!(!stale.join("old.png").exists());
        assert!(stale.join("new.png").exists());
    }

    #[tokio::test]
    async fn discard_and_remove_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = AssetLayout::new(dir.path());
        let (key, staging) = layout.create_staging().await.unwrap();
        layout.discard_staging(&key).await;
        layout.discard_staging(&key).await;
        assert!(!staging.exists());

        assert!(!layout.remove_host_dir(HostId(3)).await.unwrap());
    }
}
