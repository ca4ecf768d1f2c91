// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live view of installed hosts.
//!
//! A subscription yields the full host list immediately, then again after
//! every committed write, until its cancellation token fires. Each
//! subscription owns its own watch receiver, so cancelling one never affects
//! another and a new subscription starts fresh.

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tsundoku_core::{HostSnapshot, TsundokuError};
use tsundoku_storage::Database;
use tsundoku_storage::queries::snapshot;

/// One emission of a registry subscription.
pub type RegistryUpdate = Result<Vec<HostSnapshot>, TsundokuError>;

struct Subscription {
    db: Database,
    changes: watch::Receiver<u64>,
    cancel: CancellationToken,
    primed: bool,
}

/// Subscribe-side of the registry.
#[derive(Debug, Clone)]
pub struct RegistryObserver {
    db: Database,
}

impl RegistryObserver {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Stream the installed hosts until `cancel` fires.
    ///
    /// The change version is marked seen before each read, so a write that
    /// commits while a snapshot is loading triggers another emission rather
    /// than being lost.
    pub fn subscribe(&self, cancel: CancellationToken) -> BoxStream<'static, RegistryUpdate> {
        let state = Subscription {
            db: self.db.clone(),
            changes: self.db.subscribe(),
            cancel,
            primed: false,
        };
        stream::unfold(state, |mut state| async move {
            if state.cancel.is_cancelled() {
                return None;
            }
            if state.primed {
                tokio::select! {
                    biased;
                    _ = state.cancel.cancelled() => return None,
                    changed = state.changes.changed() => changed.ok()?,
                }
            }
            state.primed = true;
            let version = *state.changes.borrow_and_update();
            let update = snapshot::load_snapshot(&state.db).await;
            debug!(version, ok = update.is_ok(), "registry snapshot emitted");
            Some((update, state))
        })
        .boxed()
    }

    /// Load the current host list once.
    pub async fn current(&self) -> RegistryUpdate {
        snapshot::load_snapshot(&self.db).await
    }
}
