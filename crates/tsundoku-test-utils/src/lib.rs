// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tsundoku integration tests.
//!
//! Provides a scripted transport and a harness with a temporary database and
//! asset directory, so registry and search tests run without real hosts.
//!
//! # Components
//!
//! - [`MockTransport`] - records every request and serves canned replies
//! - [`TestHarness`] - temp database, temp asset root, throttler, config

pub mod harness;
pub mod mock_transport;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_transport::{MockReply, MockTransport};
