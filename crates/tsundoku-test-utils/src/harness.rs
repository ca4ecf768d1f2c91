// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for registry and search integration tests.
//!
//! `TestHarness` owns a temporary directory holding a file-backed SQLite
//! database and the asset root, a [`MockTransport`], and a throttler with no
//! stagger so tests run at full speed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tsundoku_config::TsundokuConfig;
use tsundoku_config::model::{AssetsConfig, NetworkConfig, StorageConfig};
use tsundoku_core::{Transport, TsundokuError};
use tsundoku_resilience::RequestThrottler;
use tsundoku_storage::Database;

use crate::mock_transport::MockTransport;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    max_concurrent: usize,
    stagger: Duration,
    staging_grace: Duration,
    transport: MockTransport,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            max_concurrent: 3,
            stagger: Duration::ZERO,
            staging_grace: Duration::from_secs(3600),
            transport: MockTransport::new(),
        }
    }

    /// Configure the shared throttler.
    pub fn with_throttle(mut self, max_concurrent: usize, stagger: Duration) -> Self {
        self.max_concurrent = max_concurrent;
        self.stagger = stagger;
        self
    }

    /// Age after which orphan staging directories are swept.
    pub fn with_staging_grace(mut self, grace: Duration) -> Self {
        self.staging_grace = grace;
        self
    }

    /// Use a pre-configured transport (e.g. one built `with_delay`).
    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.transport = transport;
        self
    }

    pub async fn build(self) -> Result<TestHarness, TsundokuError> {
        let temp_dir = tempfile::TempDir::new()?;
        let db_path = temp_dir.path().join("registry.db");
        let assets_dir = temp_dir.path().join("assets");

        let config = TsundokuConfig {
            storage: StorageConfig {
                database_path: db_path.to_string_lossy().into_owned(),
                wal_mode: true,
            },
            assets: AssetsConfig {
                directory: assets_dir.to_string_lossy().into_owned(),
                staging_grace_secs: self.staging_grace.as_secs(),
            },
            network: NetworkConfig {
                max_concurrent: self.max_concurrent,
                stagger_ms: self.stagger.as_millis() as u64,
                ..NetworkConfig::default()
            },
            ..TsundokuConfig::default()
        };

        let db = Database::open(&config.storage).await?;
        let throttler = RequestThrottler::new(self.max_concurrent, self.stagger);

        Ok(TestHarness {
            db,
            transport: Arc::new(self.transport),
            throttler,
            config,
            assets_dir,
            staging_grace: self.staging_grace,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete registry environment backed by temporary storage.
pub struct TestHarness {
    pub db: Database,
    pub transport: Arc<MockTransport>,
    pub throttler: RequestThrottler,
    pub config: TsundokuConfig,
    assets_dir: PathBuf,
    staging_grace: Duration,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Harness with default settings.
    pub async fn new() -> Result<Self, TsundokuError> {
        Self::builder().build().await
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn staging_grace(&self) -> Duration {
        self.staging_grace
    }

    /// The mock transport as the trait object components expect.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Entries currently under `assets/staging`, sorted.
    pub fn staging_entries(&self) -> Vec<String> {
        list_dir(&self.assets_dir.join("staging"))
    }

    /// Entries currently under `assets/hosts`, sorted.
    pub fn host_dirs(&self) -> Vec<String> {
        list_dir(&self.assets_dir.join("hosts"))
    }
}

fn list_dir(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
