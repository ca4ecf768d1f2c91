// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Tsundoku source registry.
//!
//! Every failure falls into one of three disjoint categories. Business errors
//! are user-correctable and never retried automatically, data-access errors
//! come from infrastructure and are often transient, and system errors mark
//! a defect in the registry itself.

use std::time::Duration;

use thiserror::Error;

/// The primary error type returned by every registry operation.
#[derive(Debug, Error)]
pub enum TsundokuError {
    /// User-correctable failure, surfaced verbatim.
    #[error(transparent)]
    Business(#[from] BusinessError),

    /// Infrastructure failure (network, storage, filesystem, cancellation).
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    /// Programming or invariant violation.
    #[error(transparent)]
    System(#[from] SystemError),
}

/// User-correctable errors. Raised before any side effect where possible.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusinessError {
    #[error("a host with repository {repository} already exists")]
    HostAlreadyExists { repository: String },

    #[error("malformed manifest: {reason}")]
    MalformedManifest { reason: String },

    #[error("host manifest declares no sources")]
    NoSourcesInHost,

    #[error("invalid search: {reason}")]
    InvalidSearch { reason: String },

    #[error("filter `{filter}` is not supported by this source")]
    UnsupportedFilter { filter: String },

    #[error("sort `{sort}` is not supported by this source")]
    UnsupportedSort { sort: String },

    #[error("operation not permitted: {reason}")]
    OperationNotPermitted { reason: String },

    #[error("source `{source_slug}` requires credentials")]
    CredentialsRequired { source_slug: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

/// Infrastructure errors raised while talking to hosts, the store, or the disk.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("network failure: {message}")]
    Network { message: String },

    #[error("request timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("storage failure: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("stored data is corrupted: {message}")]
    Corrupted { message: String },

    #[error("filesystem failure: {source}")]
    Filesystem {
        #[from]
        source: std::io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,
}

/// Defects: an invariant the registry itself is supposed to uphold was broken.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("record could not be decoded: {message}")]
    RecordCast { message: String },

    #[error("expected {entity} id to be present after insert")]
    MissingId { entity: &'static str },

    #[error("source {source_id} has no capability row")]
    MissingCapability { source_id: i64 },

    #[error("invariant violated: {message}")]
    Invariant { message: String },
}

/// Coarse error category used for logging and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCategory {
    Business,
    DataAccess,
    System,
}

impl TsundokuError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TsundokuError::Business(_) => ErrorCategory::Business,
            TsundokuError::DataAccess(_) => ErrorCategory::DataAccess,
            TsundokuError::System(_) => ErrorCategory::System,
        }
    }

    /// Whether a caller may retry the same operation without intervention.
    ///
    /// Storage failures and corrupted data need a human; everything else in
    /// the data-access category is transient.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TsundokuError::DataAccess(err) => !matches!(
                err,
                DataAccessError::Storage { .. } | DataAccessError::Corrupted { .. }
            ),
            _ => false,
        }
    }

    /// True for intentional cancellations, which callers should not present as failures.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TsundokuError::DataAccess(DataAccessError::Cancelled))
    }

    /// Human-facing message appropriate for the error's category.
    pub fn user_message(&self) -> String {
        match self {
            TsundokuError::Business(err) => err.to_string(),
            TsundokuError::DataAccess(DataAccessError::Cancelled) => {
                "the operation was cancelled".to_string()
            }
            TsundokuError::DataAccess(err) if self.is_recoverable() => {
                format!("{err}. Please try again.")
            }
            TsundokuError::DataAccess(err) => {
                format!("{err}. Check the local data directory before retrying.")
            }
            TsundokuError::System(_) => "something went wrong".to_string(),
        }
    }

    /// Shorthand for a storage failure wrapping any error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        DataAccessError::Storage {
            source: source.into(),
        }
        .into()
    }

    pub fn cancelled() -> Self {
        DataAccessError::Cancelled.into()
    }
}

impl From<std::io::Error> for TsundokuError {
    fn from(err: std::io::Error) -> Self {
        DataAccessError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_disjoint() {
        let business: TsundokuError = BusinessError::NoSourcesInHost.into();
        let data: TsundokuError = DataAccessError::Cancelled.into();
        let system: TsundokuError = SystemError::MissingId { entity: "host" }.into();

        assert_eq!(business.category(), ErrorCategory::Business);
        assert_eq!(data.category(), ErrorCategory::DataAccess);
        assert_eq!(system.category(), ErrorCategory::System);
    }

    #[test]
    fn recoverability_follows_data_access_kind() {
        let timeout: TsundokuError = DataAccessError::Timeout {
            duration: Duration::from_secs(30),
        }
        .into();
        assert!(timeout.is_recoverable());

        let network: TsundokuError = DataAccessError::Network {
            message: "connection reset".into(),
        }
        .into();
        assert!(network.is_recoverable());

        assert!(!TsundokuError::storage("disk full").is_recoverable());

        let corrupted: TsundokuError = DataAccessError::Corrupted {
            message: "bad blob".into(),
        }
        .into();
        assert!(!corrupted.is_recoverable());

        let business: TsundokuError = BusinessError::NoSourcesInHost.into();
        assert!(!business.is_recoverable());
    }

    #[test]
    fn cancellation_is_distinguishable() {
        assert!(TsundokuError::cancelled().is_cancelled());
        assert!(TsundokuError::cancelled().is_recoverable());

        let network: TsundokuError = DataAccessError::Network {
            message: "down".into(),
        }
        .into();
        assert!(!network.is_cancelled());
    }

    #[test]
    fn user_messages_by_category() {
        let dup: TsundokuError = BusinessError::HostAlreadyExists {
            repository: "https://example.com/repo".into(),
        }
        .into();
        assert_eq!(
            dup.user_message(),
            "a host with repository https://example.com/repo already exists"
        );

        let timeout: TsundokuError = DataAccessError::Timeout {
            duration: Duration::from_secs(5),
        }
        .into();
        assert!(timeout.user_message().ends_with("Please try again."));

        let system: TsundokuError = SystemError::MissingCapability { source_id: 4 }.into();
        assert_eq!(system.user_message(), "something went wrong");
    }

    #[test]
    fn io_errors_become_filesystem_failures() {
        let err: TsundokuError = std::io::Error::other("boom").into();
        assert!(matches!(
            err,
            TsundokuError::DataAccess(DataAccessError::Filesystem { .. })
        ));
    }
}
