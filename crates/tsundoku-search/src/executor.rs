// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability-gated search execution.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use tsundoku_core::{
    AuthCredentials, AuthType, BusinessError, ErrorCategory, InstalledSource, MAX_QUERY_CHARS,
    MAX_RESULTS, SearchCapabilities, SearchRequest, SearchResult, SourceId, SystemError,
    Transport, TransportRequest, TsundokuError,
};
use tsundoku_registry::{CapabilityRegistry, SourceRegistry};
use tsundoku_resilience::RequestThrottler;
use tsundoku_storage::Database;
use tsundoku_storage::queries::{search, sources};

use crate::wire::decode_response;

fn invalid(reason: impl Into<String>) -> BusinessError {
    BusinessError::InvalidSearch {
        reason: reason.into(),
    }
}

/// Check a request against a source before any network call.
///
/// Checks, in order: page, limit, query length, disabled source, filters,
/// sort, credentials. The first failure wins; nothing is silently dropped or
/// clamped.
pub fn validate_request(
    source: &InstalledSource,
    capabilities: &SearchCapabilities,
    request: &SearchRequest,
    credentials: Option<&AuthCredentials>,
) -> Result<(), BusinessError> {
    if request.page < 1 {
        return Err(invalid("page must be at least 1"));
    }
    if request.limit < 1 || request.limit > MAX_RESULTS {
        return Err(invalid(format!(
            "limit must be between 1 and {MAX_RESULTS}, got {}",
            request.limit
        )));
    }
    let query_chars = request.query.chars().count();
    if query_chars > MAX_QUERY_CHARS {
        return Err(invalid(format!(
            "query is {query_chars} characters, the maximum is {MAX_QUERY_CHARS}"
        )));
    }
    if source.disabled {
        return Err(BusinessError::OperationNotPermitted {
            reason: format!("source `{}` is disabled", source.slug),
        });
    }
    if let Some(filter) = request
        .filters
        .keys()
        .find(|filter| !capabilities.allows_filter(**filter))
    {
        return Err(BusinessError::UnsupportedFilter {
            filter: filter.to_string(),
        });
    }
    if !capabilities.allows_sort(request.sort) {
        return Err(BusinessError::UnsupportedSort {
            sort: request.sort.to_string(),
        });
    }
    match credentials {
        Some(credentials) if credentials.kind() != source.auth.kind => Err(invalid(format!(
            "source `{}` expects `{}` credentials, got `{}`",
            source.slug,
            source.auth.kind,
            credentials.kind()
        ))),
        None if source.auth.required && source.auth.kind != AuthType::None => {
            Err(BusinessError::CredentialsRequired {
                source_slug: source.slug.clone(),
            })
        }
        _ => Ok(()),
    }
}

/// Runs searches against installed sources.
#[derive(Clone)]
pub struct SearchExecutor {
    db: Database,
    capabilities: CapabilityRegistry,
    transport: Arc<dyn Transport>,
    throttler: RequestThrottler,
}

impl SearchExecutor {
    pub fn new(
        db: Database,
        capabilities: CapabilityRegistry,
        transport: Arc<dyn Transport>,
        throttler: RequestThrottler,
    ) -> Self {
        Self {
            db,
            capabilities,
            transport,
            throttler,
        }
    }

    /// Executor sharing the registry's database, transport and throttler.
    pub fn from_registry(registry: &SourceRegistry) -> Self {
        Self::new(
            registry.database().clone(),
            registry.capabilities(),
            registry.transport(),
            registry.throttler().clone(),
        )
    }

    /// Search one source.
    pub async fn search(
        &self,
        source_id: SourceId,
        request: &SearchRequest,
        credentials: Option<&AuthCredentials>,
        cancel: &CancellationToken,
    ) -> Result<SearchResult, TsundokuError> {
        let result = self.run(source_id, request, credentials, cancel).await;
        if let Err(e) = &result {
            match e.category() {
                ErrorCategory::Business => debug!(source_id = %source_id, error = %e, "search rejected"),
                ErrorCategory::DataAccess if e.is_cancelled() => {
                    debug!(source_id = %source_id, "search cancelled");
                }
                ErrorCategory::DataAccess => warn!(source_id = %source_id, error = %e, "search failed"),
                ErrorCategory::System => {
                    error!(source_id = %source_id, error = %e, category = "system", "search failed");
                }
            }
        }
        result
    }

    /// Run a stored preset through the same validation path as [`Self::search`].
    pub async fn run_preset(
        &self,
        preset_id: i64,
        credentials: Option<&AuthCredentials>,
        cancel: &CancellationToken,
    ) -> Result<SearchResult, TsundokuError> {
        let preset = search::get_preset(&self.db, preset_id)
            .await?
            .ok_or(BusinessError::NotFound {
                entity: "preset",
                id: preset_id,
            })?;
        debug!(preset_id, source_id = %preset.source_id, name = %preset.name, "running preset");
        self.search(preset.source_id, &preset.request, credentials, cancel)
            .await
    }

    async fn run(
        &self,
        source_id: SourceId,
        request: &SearchRequest,
        credentials: Option<&AuthCredentials>,
        cancel: &CancellationToken,
    ) -> Result<SearchResult, TsundokuError> {
        let source = sources::get_source(&self.db, source_id)
            .await?
            .ok_or(BusinessError::NotFound {
                entity: "source",
                id: source_id.0,
            })?;
        let capabilities = self
            .capabilities
            .capabilities_for(source_id)
            .await?
            .ok_or(SystemError::MissingCapability {
                source_id: source_id.0,
            })?;

        validate_request(&source, &capabilities, request, credentials)?;

        let url = format!("{}{}", source.url.trim_end_matches('/'), source.search_path);
        let mut call = TransportRequest::post_json(url, request)?
            .with_credentials(credentials.cloned());
        if let Some(referer) = &source.referer {
            call = call.with_header("Referer", referer);
        }

        debug!(source_id = %source_id, slug = %source.slug, page = request.page, "searching");
        let body = self
            .throttler
            .execute(cancel, || self.transport.send(call))
            .await?;
        decode_response(&body)
    }
}
