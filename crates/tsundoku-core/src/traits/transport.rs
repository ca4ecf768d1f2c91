// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport trait for outbound HTTP calls to third-party hosts.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{SystemError, TsundokuError};
use crate::types::AuthCredentials;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A single outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub credentials: Option<AuthCredentials>,
}

impl TransportRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            credentials: None,
        }
    }

    /// Builds a POST request with a JSON-encoded body.
    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> Result<Self, TsundokuError> {
        let body = serde_json::to_vec(body).map_err(|e| SystemError::Invariant {
            message: format!("request body failed to serialize: {e}"),
        })?;
        Ok(Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
            credentials: None,
        })
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_credentials(mut self, credentials: Option<AuthCredentials>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Generic fetch primitive.
///
/// Implementations own timeouts and map transport failures into
/// [`DataAccessError`](crate::error::DataAccessError) variants. A non-2xx
/// status is an `InvalidResponse`. Cancellation is achieved by dropping the
/// returned future.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs the request and returns the body of a successful response.
    async fn send(&self, request: TransportRequest) -> Result<Vec<u8>, TsundokuError>;
}
