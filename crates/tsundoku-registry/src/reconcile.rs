// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation of the asset directory against committed hosts.
//!
//! The host row is the source of truth. A crash between commit and finalize
//! leaves a committed host whose icons are still in `staging/<asset_key>`;
//! the sweep finishes the rename. Staging directories with no host row are
//! abandoned installs and are deleted once older than the grace period, so
//! installs still in progress are left alone.

use std::collections::HashSet;
use std::io;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};
use tsundoku_core::{HostId, TsundokuError};
use tsundoku_storage::Database;
use tsundoku_storage::queries::hosts;

use crate::assets::AssetLayout;

/// What a sweep changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Hosts whose staged assets were moved into place.
    pub finalized: Vec<HostId>,
    /// Orphan staging keys that were deleted.
    pub removed_staging: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.removed_staging.is_empty()
    }
}

/// Run one reconciliation sweep.
pub async fn reconcile(
    db: &Database,
    assets: &AssetLayout,
    staging_grace: Duration,
) -> Result<ReconcileReport, TsundokuError> {
    let mut report = ReconcileReport::default();
    let installed = hosts::list_hosts(db).await?;
    let mut known = HashSet::with_capacity(installed.len());

    for host in &installed {
        known.insert(host.asset_key.as_str());
        let staging = assets.staging_dir(&host.asset_key);
        if !tokio::fs::try_exists(&staging).await? {
            continue;
        }
        if tokio::fs::try_exists(assets.host_dir(host.id)).await? {
            // Already finalized; the staging copy is a leftover.
            assets.discard_staging(&host.asset_key).await;
            continue;
        }
        match assets.finalize(&host.asset_key, host.id).await {
            Ok(_) => {
                info!(host_id = %host.id, repository = %host.repository, "finalized staged host assets");
                report.finalized.push(host.id);
            }
            Err(e) => {
                warn!(host_id = %host.id, error = %e, "could not finalize staged host assets");
            }
        }
    }

    let mut entries = match tokio::fs::read_dir(assets.staging_root()).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(report),
        Err(e) => return Err(e.into()),
    };
    let now = SystemTime::now();
    while let Some(entry) = entries.next_entry().await? {
        let key = entry.file_name().to_string_lossy().into_owned();
        if known.contains(key.as_str()) {
            continue;
        }
        let modified = entry.metadata().await?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age < staging_grace {
            debug!(staging = %key, ?age, "staging directory within grace period");
            continue;
        }
        assets.discard_staging(&key).await;
        info!(staging = %key, "removed abandoned staging directory");
        report.removed_staging.push(key);
    }

    Ok(report)
}
