// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source lookup and user-toggleable flags.

use rusqlite::{params, OptionalExtension};
use tsundoku_core::{HostId, InstalledSource, SourceId, TsundokuError};

use crate::database::{map_tr_err, Database};
use crate::models::{SourceRow, SOURCE_COLUMNS};

pub async fn get_source(
    db: &Database,
    id: SourceId,
) -> Result<Option<InstalledSource>, TsundokuError> {
    let row = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {SOURCE_COLUMNS} FROM source WHERE id = ?1"),
                params![id.0],
                SourceRow::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(SourceRow::decode).transpose()
}

/// Sources of one host, pinned first, then by name.
pub async fn list_for_host(
    db: &Database,
    host_id: HostId,
) -> Result<Vec<InstalledSource>, TsundokuError> {
    let rows = db
        .connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SOURCE_COLUMNS} FROM source WHERE host_id = ?1 \
                 ORDER BY pinned DESC, name, id"
            ))?;
            let rows = stmt
                .query_map(params![host_id.0], SourceRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)?;
    rows.into_iter().map(SourceRow::decode).collect()
}

/// Set the `pinned` flag. Returns false if the source does not exist.
pub async fn set_pinned(db: &Database, id: SourceId, pinned: bool) -> Result<bool, TsundokuError> {
    set_flag(db, id, "pinned", pinned).await
}

/// Set the `disabled` flag. Returns false if the source does not exist.
pub async fn set_disabled(
    db: &Database,
    id: SourceId,
    disabled: bool,
) -> Result<bool, TsundokuError> {
    set_flag(db, id, "disabled", disabled).await
}

async fn set_flag(
    db: &Database,
    id: SourceId,
    column: &'static str,
    value: bool,
) -> Result<bool, TsundokuError> {
    let updated = db
        .connection()
        .call(move |conn| {
            conn.execute(
                &format!("UPDATE source SET {column} = ?1 WHERE id = ?2"),
                params![value, id.0],
            )
        })
        .await
        .map_err(map_tr_err)?;
    if updated > 0 {
        db.notify_changed();
    }
    Ok(updated > 0)
}
