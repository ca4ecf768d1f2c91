// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport for the Tsundoku source registry.
//!
//! Provides [`HttpTransport`], the production implementation of
//! [`tsundoku_core::Transport`].

pub mod client;

pub use client::HttpTransport;
