// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Atomic host installation.
//!
//! Pipeline: duplicate check, fetch, validate, stage icons, commit, finalize.
//! Staging happens in a random-keyed directory because no host id exists yet.
//! The database commit happens before the filesystem rename; a commit that
//! succeeds followed by a failed rename leaves a recoverable state that the
//! reconciliation sweep finishes later. Any failure before the commit removes
//! the staging directory and leaves no rows behind.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tsundoku_core::{
    BusinessError, ErrorCategory, InstalledHost, SystemError, Transport, TransportRequest,
    TsundokuError, types::DEFAULT_SEARCH_PATH,
};
use tsundoku_resilience::RequestThrottler;
use tsundoku_storage::queries::hosts;
use tsundoku_storage::{Database, InsertOutcome, NewHost, NewPreset, NewSource};

use crate::assets::{AssetLayout, icon_file_name};
use crate::manifest::{HostManifest, SourceManifest, parse_manifest};
use crate::reconcile::reconcile;
use crate::validator::{is_http_url, validate};

/// Installs hosts from manifest URLs.
#[derive(Clone)]
pub struct HostInstaller {
    db: Database,
    transport: Arc<dyn Transport>,
    throttler: RequestThrottler,
    assets: AssetLayout,
    staging_grace: Duration,
}

impl std::fmt::Debug for HostInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostInstaller")
            .field("assets", &self.assets)
            .field("throttler", &self.throttler)
            .finish_non_exhaustive()
    }
}

impl HostInstaller {
    pub fn new(
        db: Database,
        transport: Arc<dyn Transport>,
        throttler: RequestThrottler,
        assets: AssetLayout,
        staging_grace: Duration,
    ) -> Self {
        Self {
            db,
            transport,
            throttler,
            assets,
            staging_grace,
        }
    }

    /// Install the host whose manifest lives at `manifest_url`.
    pub async fn install(
        &self,
        manifest_url: &str,
        cancel: &CancellationToken,
    ) -> Result<InstalledHost, TsundokuError> {
        let result = self.run(manifest_url, cancel).await;
        match &result {
            Ok(host) => {
                info!(host_id = %host.id, repository = %host.repository, "host installed");
            }
            Err(e) => match e.category() {
                ErrorCategory::Business => info!(url = manifest_url, error = %e, "install rejected"),
                ErrorCategory::DataAccess if e.is_cancelled() => {
                    debug!(url = manifest_url, "install cancelled");
                }
                ErrorCategory::DataAccess => warn!(url = manifest_url, error = %e, "install failed"),
                ErrorCategory::System => {
                    error!(url = manifest_url, error = %e, category = "system", "install failed");
                }
            },
        }
        result
    }

    async fn run(
        &self,
        manifest_url: &str,
        cancel: &CancellationToken,
    ) -> Result<InstalledHost, TsundokuError> {
        if !is_http_url(manifest_url) {
            return Err(BusinessError::MalformedManifest {
                reason: format!("host URL `{manifest_url}` must be an absolute http or https URL"),
            }
            .into());
        }

        if let Err(e) = reconcile(&self.db, &self.assets, self.staging_grace).await {
            warn!(error = %e, "pre-install reconciliation failed");
        }

        // A host installed from this URL before: reject without touching the network.
        if let Some(existing) = hosts::find_by_url(&self.db, manifest_url).await? {
            return Err(BusinessError::HostAlreadyExists {
                repository: existing.repository,
            }
            .into());
        }

        let body = self
            .throttler
            .execute(cancel, || {
                self.transport.send(TransportRequest::get(manifest_url))
            })
            .await?;
        let manifest = parse_manifest(&body)?;
        validate(&manifest, manifest_url)?;

        if hosts::find_by_repository(&self.db, &manifest.repository)
            .await?
            .is_some()
        {
            return Err(BusinessError::HostAlreadyExists {
                repository: manifest.repository,
            }
            .into());
        }

        let (asset_key, staging) = self.assets.create_staging().await?;
        match self
            .stage_and_commit(manifest_url, &manifest, &asset_key, &staging, cancel)
            .await
        {
            Ok(host_id) => {
                // The row is committed; a failed rename is finished by the next sweep.
                if let Err(e) = self.assets.finalize(&asset_key, host_id).await {
                    warn!(host_id = %host_id, staging = %asset_key, error = %e,
                        "host committed but asset finalize failed; will reconcile");
                }
                hosts::get_host(&self.db, host_id)
                    .await?
                    .ok_or_else(|| SystemError::MissingId { entity: "host" }.into())
            }
            Err(e) => {
                self.assets.discard_staging(&asset_key).await;
                Err(e)
            }
        }
    }

    async fn stage_and_commit(
        &self,
        manifest_url: &str,
        manifest: &HostManifest,
        asset_key: &str,
        staging: &Path,
        cancel: &CancellationToken,
    ) -> Result<tsundoku_core::HostId, TsundokuError> {
        // Fetch every icon before touching the disk, so no write is still in
        // flight when a failed install discards the staging directory.
        let downloads = try_join_all(
            manifest
                .sources
                .iter()
                .map(|source| self.download_icon(source, cancel)),
        )
        .await?;

        if cancel.is_cancelled() {
            return Err(TsundokuError::cancelled());
        }

        let mut icons = Vec::with_capacity(downloads.len());
        for (file_name, bytes) in downloads {
            tokio::fs::write(staging.join(&file_name), &bytes).await?;
            icons.push(file_name);
        }
        debug!(staging = %asset_key, icons = icons.len(), "icons staged");

        let sources = manifest
            .sources
            .iter()
            .zip(icons)
            .map(|(source, icon)| new_source(source, icon))
            .collect::<Result<Vec<_>, _>>()?;
        let host = NewHost {
            name: manifest.name.trim().to_string(),
            author: manifest.author.trim().to_string(),
            url: manifest_url.to_string(),
            repository: manifest.repository.clone(),
            official: manifest.official,
            asset_key: asset_key.to_string(),
            sources,
        };

        match hosts::insert_host(&self.db, host).await? {
            InsertOutcome::Inserted(id) => Ok(id),
            InsertOutcome::Duplicate => Err(BusinessError::HostAlreadyExists {
                repository: manifest.repository.clone(),
            }
            .into()),
        }
    }

    /// Download one icon, returning its staged file name and bytes.
    async fn download_icon(
        &self,
        source: &SourceManifest,
        cancel: &CancellationToken,
    ) -> Result<(String, Vec<u8>), TsundokuError> {
        let file_name = icon_file_name(&source.slug, &source.icon);
        let mut request = TransportRequest::get(&source.icon);
        if let Some(referer) = &source.referer {
            request = request.with_header("Referer", referer);
        }
        let bytes = self
            .throttler
            .execute(cancel, || self.transport.send(request))
            .await?;
        if bytes.is_empty() {
            return Err(tsundoku_core::DataAccessError::InvalidResponse {
                message: format!("icon for source `{}` is empty", source.slug),
            }
            .into());
        }
        debug!(slug = %source.slug, icon = %file_name, bytes = bytes.len(), "icon downloaded");
        Ok((file_name, bytes))
    }
}

fn new_source(source: &SourceManifest, icon: String) -> Result<NewSource, TsundokuError> {
    let presets = source
        .presets
        .iter()
        .map(|preset| {
            Ok(NewPreset {
                name: preset.name.clone(),
                description: preset.description.clone(),
                request_blob: preset.request.to_blob()?,
            })
        })
        .collect::<Result<Vec<_>, TsundokuError>>()?;

    Ok(NewSource {
        slug: source.slug.clone(),
        name: source.name.trim().to_string(),
        icon,
        icon_url: source.icon.clone(),
        url: source.url.trim_end_matches('/').to_string(),
        referer: source.referer.clone(),
        search_path: source
            .search_path
            .clone()
            .unwrap_or_else(|| DEFAULT_SEARCH_PATH.to_string()),
        languages: source
            .languages
            .iter()
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect(),
        nsfw: source.nsfw,
        auth: source.auth,
        capabilities: source.search.capabilities(),
        presets,
    })
}
