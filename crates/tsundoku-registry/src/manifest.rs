// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host manifest wire format.
//!
//! A manifest is untrusted input fetched from a host. Parsing only checks
//! shape and the closed enumerations (auth type, sort, filter); everything
//! semantic is left to [`crate::validator`].

use serde::{Deserialize, Serialize};
use tsundoku_core::{
    AuthDeclaration, BusinessError, FilterOption, SearchCapabilities, SearchRequest, SearchTag,
    SortOption,
};

/// A host and the sources it publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    /// Canonical identity of the host.
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub sources: Vec<SourceManifest>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    /// Icon URL.
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub nsfw: bool,
    /// Base URL of the source.
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Path appended to `url` for search calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_path: Option<String>,
    #[serde(default)]
    pub auth: AuthDeclaration,
    #[serde(default)]
    pub search: SearchManifest,
    #[serde(default)]
    pub presets: Vec<PresetManifest>,
}

/// Declared search capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchManifest {
    #[serde(default)]
    pub sort: Vec<SortOption>,
    #[serde(default)]
    pub filters: Vec<FilterOption>,
    #[serde(default)]
    pub tags: Vec<SearchTag>,
}

impl SearchManifest {
    pub fn capabilities(&self) -> SearchCapabilities {
        SearchCapabilities {
            supported_sorts: self.sort.iter().copied().collect(),
            supported_filters: self.filters.iter().copied().collect(),
            tags: self.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub request: SearchRequest,
}

/// Decode a fetched manifest body.
///
/// Unknown auth, sort, or filter values are rejected here rather than
/// silently dropped.
pub fn parse_manifest(body: &[u8]) -> Result<HostManifest, BusinessError> {
    serde_json::from_slice(body).map_err(|e| BusinessError::MalformedManifest {
        reason: format!("manifest is not valid JSON for a host: {e}"),
    })
}
