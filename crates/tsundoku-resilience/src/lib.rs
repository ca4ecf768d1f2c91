// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for outbound traffic.
//!
//! Every call the registry makes to a third-party host (manifest fetches,
//! icon downloads, searches) is gated by one shared [`RequestThrottler`].

pub mod throttle;

pub use throttle::RequestThrottler;
