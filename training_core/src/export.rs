//! Backup bundles and completion history export.

use crate::{Error, PlayerState, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::path::Path;

/// Format version written into backup bundles
pub const BUNDLE_VERSION: u32 = 2;

#[derive(Serialize)]
struct BundleOut<'a> {
    state: &'a PlayerState,
    exported_at: DateTime<Utc>,
    version: u32,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BundleIn {
    state: Option<Value>,
    #[serde(default)]
    exported_at: Option<DateTime<Utc>>,
    #[serde(default)]
    version: Option<u32>,
}

/// Serialize the full player state into a pretty-printed backup bundle
pub fn export_bundle(state: &PlayerState, now: DateTime<Utc>) -> Result<String> {
    let bundle = BundleOut {
        state,
        exported_at: now,
        version: BUNDLE_VERSION,
    };
    Ok(serde_json::to_string_pretty(&bundle)?)
}

/// Collect keys of `input` that `known` does not have, descending into
/// nested objects whose shape is fixed
fn unknown_keys(input: &Value, known: &Value, prefix: &str, out: &mut Vec<String>) {
    let (Value::Object(input), Value::Object(known)) = (input, known) else {
        return;
    };
    // Empty maps are keyed by data (dates, weeks), not by field names
    if known.is_empty() {
        return;
    }
    for (key, value) in input {
        let path = format!("{}{}", prefix, key);
        match known.get(key) {
            Some(expected) => unknown_keys(value, expected, &format!("{}.", path), out),
            None => out.push(path),
        }
    }
}

/// Read the player state back out of a backup bundle
///
/// Documents with fields this format does not know are refused rather
/// than imported with those fields dropped.
pub fn import_bundle(json: &str) -> Result<PlayerState> {
    let raw: Value = serde_json::from_str(json)?;
    let bundle: BundleIn = serde_json::from_value(raw)
        .map_err(|e| Error::State(format!("not a backup bundle: {}", e)))?;
    if let Some(version) = bundle.version.filter(|v| *v > BUNDLE_VERSION) {
        return Err(Error::State(format!(
            "backup version {} is newer than supported version {}",
            version, BUNDLE_VERSION
        )));
    }
    let state = bundle
        .state
        .ok_or_else(|| Error::State("backup contains no player state".into()))?;

    let mut unknown = Vec::new();
    unknown_keys(&state, &serde_json::to_value(PlayerState::default())?, "", &mut unknown);
    if !unknown.is_empty() {
        return Err(Error::State(format!(
            "backup state has unrecognized fields: {}",
            unknown.join(", ")
        )));
    }

    if let Some(exported_at) = bundle.exported_at {
        tracing::debug!("Importing backup exported at {}", exported_at);
    }
    serde_json::from_value(state)
        .map_err(|e| Error::State(format!("invalid player state in backup: {}", e)))
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: &'a str,
    plan_item_id: &'a str,
    completed_at: String,
    xp_earned: u64,
    gold_earned: u64,
}

/// Write every completion record to a CSV file, oldest day first
///
/// Overwrites `path`. Returns the number of rows written.
pub fn export_completions_csv(state: &PlayerState, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(File::create(path)?);
    let mut rows = 0;
    for (date, records) in &state.completions {
        for record in records {
            writer.serialize(CsvRow {
                date,
                plan_item_id: &record.plan_item_id,
                completed_at: record.completed_at.to_rfc3339(),
                xp_earned: record.xp_earned,
                gold_earned: record.gold_earned,
            })?;
            rows += 1;
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} completions to {:?}", rows, path);
    Ok(rows)
}
