// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host operations: lookup, transactional install commit, and cascade removal.

use rusqlite::{params, OptionalExtension};
use tracing::debug;
use tsundoku_core::{HostId, InstalledHost, SystemError, TsundokuError};

use crate::database::{map_tr_err, Database};
use crate::models::{InsertOutcome, NewHost};

pub(crate) const HOST_COLUMNS: &str = "id, name, author, url, repository, official, asset_key, installed_at";

pub(crate) fn host_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InstalledHost> {
    Ok(InstalledHost {
        id: HostId(row.get(0)?),
        name: row.get(1)?,
        author: row.get(2)?,
        url: row.get(3)?,
        repository: row.get(4)?,
        official: row.get(5)?,
        asset_key: row.get(6)?,
        installed_at: row.get(7)?,
    })
}

fn is_duplicate_repository(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(message))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message.contains("host.repository")
    )
}

/// Find the host that owns a repository URL.
pub async fn find_by_repository(
    db: &Database,
    repository: &str,
) -> Result<Option<InstalledHost>, TsundokuError> {
    let repository = repository.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {HOST_COLUMNS} FROM host WHERE repository = ?1"),
                params![repository],
                host_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Find a host previously installed from the given manifest URL.
pub async fn find_by_url(db: &Database, url: &str) -> Result<Option<InstalledHost>, TsundokuError> {
    let url = url.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {HOST_COLUMNS} FROM host WHERE url = ?1"),
                params![url],
                host_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_host(db: &Database, id: HostId) -> Result<Option<InstalledHost>, TsundokuError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {HOST_COLUMNS} FROM host WHERE id = ?1"),
                params![id.0],
                host_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// List all hosts ordered by name.
pub async fn list_hosts(db: &Database) -> Result<Vec<InstalledHost>, TsundokuError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {HOST_COLUMNS} FROM host ORDER BY name, id"))?;
            let hosts = stmt
                .query_map([], host_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(hosts)
        })
        .await
        .map_err(map_tr_err)
}

/// Commit a host and all of its sources, capabilities, tags, and presets in
/// one transaction.
///
/// A UNIQUE violation on the repository URL rolls the transaction back and
/// yields [`InsertOutcome::Duplicate`]; any other failure also rolls back.
pub async fn insert_host(db: &Database, host: NewHost) -> Result<InsertOutcome, TsundokuError> {
    let mut languages = Vec::with_capacity(host.sources.len());
    let mut capability_columns = Vec::with_capacity(host.sources.len());
    for source in &host.sources {
        languages.push(encode_json(&source.languages)?);
        capability_columns.push((
            encode_json(&source.capabilities.supported_sorts)?,
            encode_json(&source.capabilities.supported_filters)?,
        ));
    }

    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let inserted = tx.execute(
                "INSERT INTO host (name, author, url, repository, official, asset_key) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    host.name,
                    host.author,
                    host.url,
                    host.repository,
                    host.official,
                    host.asset_key
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_duplicate_repository(&e) => return Ok(InsertOutcome::Duplicate),
                Err(e) => return Err(e),
            }
            let host_id = tx.last_insert_rowid();

            for ((source, langs), (sorts, filters)) in host
                .sources
                .iter()
                .zip(&languages)
                .zip(&capability_columns)
            {
                tx.execute(
                    "INSERT INTO source (host_id, slug, name, icon, icon_url, url, referer, \
                     search_path, languages, nsfw, auth_type, auth_required) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        host_id,
                        source.slug,
                        source.name,
                        source.icon,
                        source.icon_url,
                        source.url,
                        source.referer,
                        source.search_path,
                        langs,
                        source.nsfw,
                        source.auth.kind.to_string(),
                        source.auth.required
                    ],
                )?;
                let source_id = tx.last_insert_rowid();

                tx.execute(
                    "INSERT INTO search_config (source_id, supported_sorts, supported_filters) \
                     VALUES (?1, ?2, ?3)",
                    params![source_id, sorts, filters],
                )?;

                for tag in &source.capabilities.tags {
                    tx.execute(
                        "INSERT INTO search_tag (source_id, slug, name, nsfw) VALUES (?1, ?2, ?3, ?4)",
                        params![source_id, tag.slug, tag.name, tag.nsfw],
                    )?;
                }

                for preset in &source.presets {
                    tx.execute(
                        "INSERT INTO search_preset (source_id, name, description, request_blob) \
                         VALUES (?1, ?2, ?3, ?4)",
                        params![source_id, preset.name, preset.description, preset.request_blob],
                    )?;
                }
            }

            tx.commit()?;
            Ok(InsertOutcome::Inserted(HostId(host_id)))
        })
        .await
        .map_err(map_tr_err)?;

    if let InsertOutcome::Inserted(id) = outcome {
        if id.0 <= 0 {
            return Err(SystemError::MissingId { entity: "host" }.into());
        }
        debug!(host_id = %id, "host committed");
        db.notify_changed();
    }
    Ok(outcome)
}

/// Delete a host; sources, capabilities, tags and presets cascade.
///
/// Returns whether a row was removed.
pub async fn delete_host(db: &Database, id: HostId) -> Result<bool, TsundokuError> {
    let removed = db
        .connection()
        .call(move |conn| conn.execute("DELETE FROM host WHERE id = ?1", params![id.0]))
        .await
        .map_err(map_tr_err)?;
    if removed > 0 {
        db.notify_changed();
    }
    Ok(removed > 0)
}

fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, TsundokuError> {
    serde_json::to_string(value).map_err(|e| {
        SystemError::Invariant {
            message: format!("column failed to serialize: {e}"),
        }
        .into()
    })
}
