// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Tsundoku source registry.
//!
//! This crate provides the error taxonomy, the domain types shared by every
//! other crate in the workspace, and the [`Transport`] seam through which all
//! outbound HTTP traffic flows.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BusinessError, DataAccessError, ErrorCategory, SystemError, TsundokuError};
pub use traits::{HttpMethod, Transport, TransportRequest};
pub use types::{
    AuthCredentials, AuthDeclaration, AuthType, FilterOption, FilterValue, HostId, HostSnapshot,
    InstalledHost, InstalledPreset, InstalledSource, SearchCapabilities, SearchEntry,
    SearchRequest, SearchResult, SearchTag, SortDirection, SortOption, SourceId, SourceSnapshot,
    MAX_QUERY_CHARS, MAX_RESULTS,
};
