// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability, tag and preset reads.

use rusqlite::{params, Connection, OptionalExtension};
use tsundoku_core::{InstalledPreset, SearchCapabilities, SourceId, TsundokuError};

use crate::database::{map_tr_err, Database};
use crate::models::{tag_from_row, CapabilityRow, PresetRow, PRESET_COLUMNS};

/// Read the capability row and tag vocabulary of a source on an open connection.
pub(crate) fn read_capabilities(
    conn: &Connection,
    source_id: i64,
) -> rusqlite::Result<Option<CapabilityRow>> {
    let columns = conn
        .query_row(
            "SELECT supported_sorts, supported_filters FROM search_config WHERE source_id = ?1",
            params![source_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    let Some((supported_sorts, supported_filters)) = columns else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT slug, name, nsfw FROM search_tag WHERE source_id = ?1 ORDER BY id")?;
    let tags = stmt
        .query_map(params![source_id], tag_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(CapabilityRow {
        supported_sorts,
        supported_filters,
        tags,
    }))
}

pub(crate) fn read_presets(conn: &Connection, source_id: i64) -> rusqlite::Result<Vec<PresetRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESET_COLUMNS} FROM search_preset WHERE source_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![source_id], PresetRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Capabilities of a source, or `None` when no capability row exists.
pub async fn get_capabilities(
    db: &Database,
    source_id: SourceId,
) -> Result<Option<SearchCapabilities>, TsundokuError> {
    let row = db
        .connection()
        .call(move |conn| read_capabilities(conn, source_id.0))
        .await
        .map_err(map_tr_err)?;
    row.map(CapabilityRow::decode).transpose()
}

pub async fn list_presets(
    db: &Database,
    source_id: SourceId,
) -> Result<Vec<InstalledPreset>, TsundokuError> {
    let rows = db
        .connection()
        .call(move |conn| read_presets(conn, source_id.0))
        .await
        .map_err(map_tr_err)?;
    rows.into_iter().map(PresetRow::decode).collect()
}

pub async fn get_preset(db: &Database, id: i64) -> Result<Option<InstalledPreset>, TsundokuError> {
    let row = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {PRESET_COLUMNS} FROM search_preset WHERE id = ?1"),
                params![id],
                PresetRow::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(PresetRow::decode).transpose()
}
