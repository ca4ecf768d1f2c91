// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Search against installed sources.
//!
//! Requests are validated against the source's persisted capabilities before
//! any network traffic, then sent through the shared request throttler.

pub mod executor;
pub mod wire;

pub use executor::{SearchExecutor, validate_request};
pub use wire::SearchResponse;
