// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single point of capability lookup for search.

use tsundoku_core::{SearchCapabilities, SourceId, TsundokuError};
use tsundoku_storage::Database;
use tsundoku_storage::queries::search;

/// Reads a source's persisted capabilities and tag vocabulary.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    db: Database,
}

impl CapabilityRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Capabilities of `source_id`, or `None` if the source has no capability row.
    pub async fn capabilities_for(
        &self,
        source_id: SourceId,
    ) -> Result<Option<SearchCapabilities>, TsundokuError> {
        search::get_capabilities(&self.db, source_id).await
    }
}
