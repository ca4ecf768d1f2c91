// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Tsundoku source registry.
//!
//! Validates host manifests, installs hosts atomically across the database
//! and the asset directory, exposes source capabilities to search, and
//! streams the installed host list to observers.

pub mod assets;
pub mod capability;
pub mod installer;
pub mod manifest;
pub mod observer;
pub mod reconcile;
pub mod registry;
pub mod validator;

pub use assets::{AssetLayout, icon_file_name};
pub use capability::CapabilityRegistry;
pub use installer::HostInstaller;
pub use manifest::{HostManifest, PresetManifest, SearchManifest, SourceManifest, parse_manifest};
pub use observer::{RegistryObserver, RegistryUpdate};
pub use reconcile::{ReconcileReport, reconcile};
pub use registry::SourceRegistry;
pub use validator::validate;
