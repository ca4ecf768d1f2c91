// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry facade: wiring plus host and source management.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tsundoku_config::TsundokuConfig;
use tsundoku_core::{
    BusinessError, HostId, HostSnapshot, InstalledHost, InstalledPreset, InstalledSource,
    SourceId, Transport, TsundokuError,
};
use tsundoku_resilience::RequestThrottler;
use tsundoku_storage::Database;
use tsundoku_storage::queries::{hosts, search, sources};

use crate::assets::AssetLayout;
use crate::capability::CapabilityRegistry;
use crate::installer::HostInstaller;
use crate::observer::RegistryObserver;
use crate::reconcile::{ReconcileReport, reconcile};

/// Entry point to the source registry.
///
/// Owns the database handle, the asset layout, the shared throttler, and the
/// transport, and hands out the components built on them.
#[derive(Clone)]
pub struct SourceRegistry {
    db: Database,
    assets: AssetLayout,
    throttler: RequestThrottler,
    transport: Arc<dyn Transport>,
    staging_grace: Duration,
}

impl SourceRegistry {
    pub fn new(
        db: Database,
        transport: Arc<dyn Transport>,
        throttler: RequestThrottler,
        assets: AssetLayout,
        staging_grace: Duration,
    ) -> Self {
        Self {
            db,
            assets,
            throttler,
            transport,
            staging_grace,
        }
    }

    /// Build a registry from configuration, sharing one throttler for all outbound calls.
    pub fn from_config(
        config: &TsundokuConfig,
        db: Database,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let throttler =
            RequestThrottler::new(config.network.max_concurrent, config.network.stagger());
        Self::new(
            db,
            transport,
            throttler,
            AssetLayout::new(&config.assets.directory),
            config.assets.staging_grace(),
        )
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn assets(&self) -> &AssetLayout {
        &self.assets
    }

    pub fn throttler(&self) -> &RequestThrottler {
        &self.throttler
    }

    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    pub fn installer(&self) -> HostInstaller {
        HostInstaller::new(
            self.db.clone(),
            self.transport.clone(),
            self.throttler.clone(),
            self.assets.clone(),
            self.staging_grace,
        )
    }

    pub fn capabilities(&self) -> CapabilityRegistry {
        CapabilityRegistry::new(self.db.clone())
    }

    pub fn observer(&self) -> RegistryObserver {
        RegistryObserver::new(self.db.clone())
    }

    /// Install a host from its manifest URL.
    pub async fn install(
        &self,
        manifest_url: &str,
        cancel: &CancellationToken,
    ) -> Result<InstalledHost, TsundokuError> {
        self.installer().install(manifest_url, cancel).await
    }

    /// Finalize half-installed hosts and sweep abandoned staging directories.
    pub async fn reconcile(&self) -> Result<ReconcileReport, TsundokuError> {
        reconcile(&self.db, &self.assets, self.staging_grace).await
    }

    /// Remove a host with all of its sources, then its asset directory.
    pub async fn remove_host(&self, id: HostId) -> Result<(), TsundokuError> {
        if !hosts::delete_host(&self.db, id).await? {
            return Err(BusinessError::NotFound {
                entity: "host",
                id: id.0,
            }
            .into());
        }
        if let Err(e) = self.assets.remove_host_dir(id).await {
            warn!(host_id = %id, error = %e, "host removed but its asset directory was not");
        }
        info!(host_id = %id, "host removed");
        Ok(())
    }

    pub async fn set_pinned(&self, id: SourceId, pinned: bool) -> Result<(), TsundokuError> {
        if !sources::set_pinned(&self.db, id, pinned).await? {
            return Err(source_not_found(id));
        }
        info!(source_id = %id, pinned, "source pin updated");
        Ok(())
    }

    pub async fn set_disabled(&self, id: SourceId, disabled: bool) -> Result<(), TsundokuError> {
        if !sources::set_disabled(&self.db, id, disabled).await? {
            return Err(source_not_found(id));
        }
        info!(source_id = %id, disabled, "source availability updated");
        Ok(())
    }

    /// Every installed host with nested sources, capabilities and presets.
    pub async fn list_hosts(&self) -> Result<Vec<HostSnapshot>, TsundokuError> {
        self.observer().current().await
    }

    /// Sources of one host, pinned first, then by name.
    pub async fn sources_of(&self, id: HostId) -> Result<Vec<InstalledSource>, TsundokuError> {
        if hosts::get_host(&self.db, id).await?.is_none() {
            return Err(BusinessError::NotFound {
                entity: "host",
                id: id.0,
            }
            .into());
        }
        sources::list_for_host(&self.db, id).await
    }

    pub async fn source(&self, id: SourceId) -> Result<InstalledSource, TsundokuError> {
        sources::get_source(&self.db, id)
            .await?
            .ok_or_else(|| source_not_found(id))
    }

    /// Presets bound to a source.
    pub async fn presets_for(&self, id: SourceId) -> Result<Vec<InstalledPreset>, TsundokuError> {
        self.source(id).await?;
        search::list_presets(&self.db, id).await
    }
}

fn source_not_found(id: SourceId) -> TsundokuError {
    BusinessError::NotFound {
        entity: "source",
        id: id.0,
    }
    .into()
}
