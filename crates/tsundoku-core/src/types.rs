// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the registry, storage, and search crates.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{DataAccessError, TsundokuError};

/// Hard ceiling on `SearchRequest::limit`. Larger requests are rejected, never clamped.
pub const MAX_RESULTS: u32 = 100;

/// Maximum length of a search query, in characters.
pub const MAX_QUERY_CHARS: usize = 200;

/// Search path used when a source does not declare its own.
pub const DEFAULT_SEARCH_PATH: &str = "/search";

/// Durable identity of an installed host, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostId(pub i64);

/// Durable identity of an installed source, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub i64);

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authentication scheme a source declares. Only the tag is persisted.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum AuthType {
    #[default]
    None,
    Basic,
    Session,
    ApiKey,
    Bearer,
    Cookie,
}

/// A source's declared auth scheme, as it appears in the manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthDeclaration {
    #[serde(rename = "type", default)]
    pub kind: AuthType,
    #[serde(default)]
    pub required: bool,
}

/// Credentials supplied by the user at request time.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthCredentials {
    Basic { username: String, password: String },
    Session { username: String, password: String },
    ApiKey { key: String },
    Bearer { token: String },
    Cookie { value: String },
}

impl AuthCredentials {
    /// The auth scheme these credentials satisfy.
    pub fn kind(&self) -> AuthType {
        match self {
            AuthCredentials::Basic { .. } => AuthType::Basic,
            AuthCredentials::Session { .. } => AuthType::Session,
            AuthCredentials::ApiKey { .. } => AuthType::ApiKey,
            AuthCredentials::Bearer { .. } => AuthType::Bearer,
            AuthCredentials::Cookie { .. } => AuthType::Cookie,
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

/// Closed set of search sort keys.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortOption {
    /// Universally available; the only legal sort when a source declares none.
    #[default]
    Relevance,
    Latest,
    Title,
    Popularity,
    Rating,
    Chapters,
    Year,
    Views,
    Follows,
    CreatedAt,
    UpdatedAt,
}

/// Closed set of search filter keys.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FilterOption {
    Genre,
    Status,
    ContentRating,
    Year,
    OriginalLanguage,
    TranslatedLanguage,
    Author,
    Artist,
    IncludeTag,
    ExcludeTag,
    Demographic,
    Publisher,
    MinChapters,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Value attached to a filter key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Number(i64),
    Text(String),
    List(Vec<String>),
}

/// A search request against one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub sort: SortOption,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<FilterOption, FilterValue>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: default_page(),
            limit: default_limit(),
            sort: SortOption::default(),
            direction: SortDirection::default(),
            filters: BTreeMap::new(),
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Encodes the request into the opaque blob stored with presets.
    pub fn to_blob(&self) -> Result<Vec<u8>, TsundokuError> {
        serde_json::to_vec(self).map_err(|e| {
            crate::error::SystemError::Invariant {
                message: format!("search request failed to serialize: {e}"),
            }
            .into()
        })
    }

    /// Decodes a stored preset blob.
    pub fn from_blob(blob: &[u8]) -> Result<Self, TsundokuError> {
        serde_json::from_slice(blob).map_err(|e| {
            DataAccessError::Corrupted {
                message: format!("preset request blob: {e}"),
            }
            .into()
        })
    }
}

/// A tag in a source's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTag {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub nsfw: bool,
}

/// The legality envelope for searches against one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCapabilities {
    pub supported_sorts: BTreeSet<SortOption>,
    pub supported_filters: BTreeSet<FilterOption>,
    pub tags: Vec<SearchTag>,
}

impl SearchCapabilities {
    /// A source that declares no sort list only accepts the default sort.
    pub fn allows_sort(&self, sort: SortOption) -> bool {
        if self.supported_sorts.is_empty() {
            sort == SortOption::default()
        } else {
            self.supported_sorts.contains(&sort)
        }
    }

    pub fn allows_filter(&self, filter: FilterOption) -> bool {
        self.supported_filters.contains(&filter)
    }
}

/// A persisted host row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledHost {
    pub id: HostId,
    pub name: String,
    pub author: String,
    /// URL the manifest was fetched from.
    pub url: String,
    /// Canonical identity of the host.
    pub repository: String,
    pub official: bool,
    /// Staging key the host's assets were downloaded under.
    pub asset_key: String,
    pub installed_at: String,
}

/// A persisted source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledSource {
    pub id: SourceId,
    pub host_id: HostId,
    pub slug: String,
    pub name: String,
    /// Icon file name inside the host's asset directory.
    pub icon: String,
    pub icon_url: String,
    pub url: String,
    pub referer: Option<String>,
    pub search_path: String,
    pub languages: Vec<String>,
    pub nsfw: bool,
    pub pinned: bool,
    pub disabled: bool,
    pub auth: AuthDeclaration,
}

/// A persisted preset with its decoded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPreset {
    pub id: i64,
    pub source_id: SourceId,
    pub name: String,
    pub description: Option<String>,
    pub request: SearchRequest,
}

/// A source together with everything that hangs off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSnapshot {
    pub source: InstalledSource,
    pub capabilities: SearchCapabilities,
    pub presets: Vec<InstalledPreset>,
}

/// Read model of one installed host, as delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSnapshot {
    pub host: InstalledHost,
    pub sources: Vec<SourceSnapshot>,
}

/// One entry of a search result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub cover: Option<String>,
}

/// Source-agnostic result of a search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub entries: Vec<SearchEntry>,
    pub current_page: u32,
    pub has_more: bool,
}
