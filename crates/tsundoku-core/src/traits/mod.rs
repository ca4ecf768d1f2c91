// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the registry and its external collaborators.

pub mod transport;

pub use transport::{HttpMethod, Transport, TransportRequest};
