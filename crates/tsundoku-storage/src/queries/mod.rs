// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for registry entities.

pub mod hosts;
pub mod search;
pub mod snapshot;
pub mod sources;
