// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insert models and raw row types.
//!
//! The canonical read types live in `tsundoku-core::types`. This module holds
//! the write-side projection of a validated manifest and the raw rows that
//! still need decoding.

use std::str::FromStr;

use tsundoku_core::{
    AuthDeclaration, AuthType, DataAccessError, FilterOption, HostId, InstalledPreset,
    InstalledSource, SearchCapabilities, SearchRequest, SearchTag, SortOption, SourceId,
    TsundokuError,
};

/// A host ready to be committed, with everything that hangs off it.
#[derive(Debug, Clone)]
pub struct NewHost {
    pub name: String,
    pub author: String,
    pub url: String,
    pub repository: String,
    pub official: bool,
    pub asset_key: String,
    pub sources: Vec<NewSource>,
}

#[derive(Debug, Clone)]
pub struct NewSource {
    pub slug: String,
    pub name: String,
    pub icon: String,
    pub icon_url: String,
    pub url: String,
    pub referer: Option<String>,
    pub search_path: String,
    pub languages: Vec<String>,
    pub nsfw: bool,
    pub auth: AuthDeclaration,
    pub capabilities: SearchCapabilities,
    pub presets: Vec<NewPreset>,
}

#[derive(Debug, Clone)]
pub struct NewPreset {
    pub name: String,
    pub description: Option<String>,
    /// Request serialized once at install time.
    pub request_blob: Vec<u8>,
}

/// Result of committing a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(HostId),
    /// Another host already owns this repository URL.
    Duplicate,
}

fn corrupted(what: &str, detail: impl std::fmt::Display) -> TsundokuError {
    DataAccessError::Corrupted {
        message: format!("{what}: {detail}"),
    }
    .into()
}

/// A `source` row as stored, before JSON/enum columns are decoded.
#[derive(Debug, Clone)]
pub(crate) struct SourceRow {
    pub id: i64,
    pub host_id: i64,
    pub slug: String,
    pub name: String,
    pub icon: String,
    pub icon_url: String,
    pub url: String,
    pub referer: Option<String>,
    pub search_path: String,
    pub languages: String,
    pub nsfw: bool,
    pub pinned: bool,
    pub disabled: bool,
    pub auth_type: String,
    pub auth_required: bool,
}

pub(crate) const SOURCE_COLUMNS: &str = "id, host_id, slug, name, icon, icon_url, url, referer, \
     search_path, languages, nsfw, pinned, disabled, auth_type, auth_required";

impl SourceRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            host_id: row.get(1)?,
            slug: row.get(2)?,
            name: row.get(3)?,
            icon: row.get(4)?,
            icon_url: row.get(5)?,
            url: row.get(6)?,
            referer: row.get(7)?,
            search_path: row.get(8)?,
            languages: row.get(9)?,
            nsfw: row.get(10)?,
            pinned: row.get(11)?,
            disabled: row.get(12)?,
            auth_type: row.get(13)?,
            auth_required: row.get(14)?,
        })
    }

    pub fn decode(self) -> Result<InstalledSource, TsundokuError> {
        let languages: Vec<String> = serde_json::from_str(&self.languages)
            .map_err(|e| corrupted("source.languages", e))?;
        let kind = AuthType::from_str(&self.auth_type)
            .map_err(|e| corrupted("source.auth_type", e))?;
        Ok(InstalledSource {
            id: SourceId(self.id),
            host_id: HostId(self.host_id),
            slug: self.slug,
            name: self.name,
            icon: self.icon,
            icon_url: self.icon_url,
            url: self.url,
            referer: self.referer,
            search_path: self.search_path,
            languages,
            nsfw: self.nsfw,
            pinned: self.pinned,
            disabled: self.disabled,
            auth: AuthDeclaration {
                kind,
                required: self.auth_required,
            },
        })
    }
}

/// A `search_config` row plus its tags.
#[derive(Debug, Clone)]
pub(crate) struct CapabilityRow {
    pub supported_sorts: String,
    pub supported_filters: String,
    pub tags: Vec<SearchTag>,
}

impl CapabilityRow {
    pub fn decode(self) -> Result<SearchCapabilities, TsundokuError> {
        let sorts: Vec<SortOption> = serde_json::from_str(&self.supported_sorts)
            .map_err(|e| corrupted("search_config.supported_sorts", e))?;
        let filters: Vec<FilterOption> = serde_json::from_str(&self.supported_filters)
            .map_err(|e| corrupted("search_config.supported_filters", e))?;
        Ok(SearchCapabilities {
            supported_sorts: sorts.into_iter().collect(),
            supported_filters: filters.into_iter().collect(),
            tags: self.tags,
        })
    }
}

/// A `search_preset` row with the request still encoded.
#[derive(Debug, Clone)]
pub(crate) struct PresetRow {
    pub id: i64,
    pub source_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub request_blob: Vec<u8>,
}

pub(crate) const PRESET_COLUMNS: &str = "id, source_id, name, description, request_blob";

impl PresetRow {
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            request_blob: row.get(4)?,
        })
    }

    pub fn decode(self) -> Result<InstalledPreset, TsundokuError> {
        Ok(InstalledPreset {
            id: self.id,
            source_id: SourceId(self.source_id),
            name: self.name,
            description: self.description,
            request: SearchRequest::from_blob(&self.request_blob)?,
        })
    }
}

pub(crate) fn tag_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SearchTag> {
    Ok(SearchTag {
        slug: row.get(0)?,
        name: row.get(1)?,
        nsfw: row.get(2)?,
    })
}
