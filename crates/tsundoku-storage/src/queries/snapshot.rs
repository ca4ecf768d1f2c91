// SPDX-FileCopyrightText: 2026 Tsundoku Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full registry snapshot read inside a single transaction so observers never
//! see a host without its sources.

use rusqlite::params;
use tsundoku_core::{HostSnapshot, SourceSnapshot, SystemError, TsundokuError};

use super::hosts::{host_from_row, HOST_COLUMNS};
use super::search::{read_capabilities, read_presets};
use crate::database::{map_tr_err, Database};
use crate::models::{CapabilityRow, PresetRow, SourceRow, SOURCE_COLUMNS};

struct RawSource {
    row: SourceRow,
    capabilities: Option<CapabilityRow>,
    presets: Vec<PresetRow>,
}

/// Load every host with its sources, capabilities and presets.
///
/// Hosts are ordered by name; sources pinned first, then by name.
pub async fn load_snapshot(db: &Database) -> Result<Vec<HostSnapshot>, TsundokuError> {
    let raw = db
        .connection()
        .call(|conn| {
            let tx = conn.transaction()?;
            let mut out = Vec::new();
            {
                let mut host_stmt =
                    tx.prepare(&format!("SELECT {HOST_COLUMNS} FROM host ORDER BY name, id"))?;
                let hosts = host_stmt
                    .query_map([], host_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut source_stmt = tx.prepare(&format!(
                    "SELECT {SOURCE_COLUMNS} FROM source WHERE host_id = ?1 \
                     ORDER BY pinned DESC, name, id"
                ))?;
                for host in hosts {
                    let rows = source_stmt
                        .query_map(params![host.id.0], SourceRow::from_row)?
                        .collect::<Result<Vec<_>, _>>()?;
                    let mut sources = Vec::with_capacity(rows.len());
                    for row in rows {
                        let capabilities = read_capabilities(&tx, row.id)?;
                        let presets = read_presets(&tx, row.id)?;
                        sources.push(RawSource {
                            row,
                            capabilities,
                            presets,
                        });
                    }
                    out.push((host, sources));
                }
            }
            tx.commit()?;
            Ok(out)
        })
        .await
        .map_err(map_tr_err)?;

    raw.into_iter()
        .map(|(host, sources)| {
            let sources = sources
                .into_iter()
                .map(decode_source)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(HostSnapshot { host, sources })
        })
        .collect()
}

fn decode_source(raw: RawSource) -> Result<SourceSnapshot, TsundokuError> {
    let source_id = raw.row.id;
    let capabilities = raw
        .capabilities
        .ok_or(SystemError::MissingCapability { source_id })?
        .decode()?;
    let presets = raw
        .presets
        .into_iter()
        .map(PresetRow::decode)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SourceSnapshot {
        source: raw.row.decode()?,
        capabilities,
        presets,
    })
}
