// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search call wire format.
//!
//! Request body is the serialized [`SearchRequest`](tsundoku_core::SearchRequest):
//! `{query, page, limit, sort, direction, filters?}`. The response is
//! `{results: [{slug, title, cover?}], page, more}`.

use serde::Deserialize;
use tsundoku_core::{DataAccessError, SearchEntry, SearchResult, TsundokuError};

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchEntry>,
    pub page: u32,
    #[serde(default)]
    pub more: bool,
}

impl From<SearchResponse> for SearchResult {
    fn from(response: SearchResponse) -> Self {
        SearchResult {
            entries: response.results,
            current_page: response.page,
            has_more: response.more,
        }
    }
}

/// Decode a search response body.
pub fn decode_response(body: &[u8]) -> Result<SearchResult, TsundokuError> {
    let response: SearchResponse =
        serde_json::from_slice(body).map_err(|e| DataAccessError::InvalidResponse {
            message: format!("search response could not be decoded: {e}"),
        })?;
    Ok(response.into())
}
