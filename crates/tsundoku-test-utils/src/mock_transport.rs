// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted transport for deterministic testing.
//!
//! `MockTransport` implements [`Transport`] by looking the request URL up in
//! a table of canned replies. Every request is recorded so tests can assert
//! on how many calls were made and what they carried. URLs with no reply
//! answer with an HTTP 404 equivalent.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tsundoku_core::{DataAccessError, Transport, TransportRequest, TsundokuError};

/// A canned reply for one URL.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 2xx with the given body.
    Body(Vec<u8>),
    /// Non-2xx status.
    Status(u16),
    /// Connection-level failure.
    NetworkError(String),
    /// Request timed out after the given duration.
    Timeout(Duration),
    /// Never completes. Only cancellation ends the call.
    Hang,
}

impl MockReply {
    pub fn json<T: Serialize>(value: &T) -> Self {
        MockReply::Body(serde_json::to_vec(value).unwrap_or_default())
    }

    pub fn text(body: &str) -> Self {
        MockReply::Body(body.as_bytes().to_vec())
    }
}

#[derive(Default)]
struct State {
    replies: HashMap<String, MockReply>,
    calls: Vec<TransportRequest>,
}

/// A transport that serves canned replies keyed by URL.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply by `delay` (tokio time, so paused clocks apply).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Register (or replace) the reply for a URL.
    pub async fn on(&self, url: impl Into<String>, reply: MockReply) {
        self.state.lock().await.replies.insert(url.into(), reply);
    }

    /// Register a JSON body for a URL.
    pub async fn on_json<T: Serialize>(&self, url: impl Into<String>, value: &T) {
        self.on(url, MockReply::json(value)).await;
    }

    /// All requests seen so far, in arrival order.
    pub async fn calls(&self) -> Vec<TransportRequest> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }

    /// Number of requests made to exactly `url`.
    pub async fn calls_to(&self, url: &str) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.url == url)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<Vec<u8>, TsundokuError> {
        let reply = {
            let mut state = self.state.lock().await;
            let reply = state
                .replies
                .get(&request.url)
                .cloned()
                .unwrap_or(MockReply::Status(404));
            state.calls.push(request.clone());
            reply
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Body(body) => Ok(body),
            MockReply::Status(status) => Err(DataAccessError::InvalidResponse {
                message: format!("{} returned {status}", request.url),
            }
            .into()),
            MockReply::NetworkError(message) => Err(DataAccessError::Network { message }.into()),
            MockReply::Timeout(duration) => Err(DataAccessError::Timeout { duration }.into()),
            MockReply::Hang => futures::future::pending().await,
        }
    }
}
