use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Mode;

const HISTORY_FILE: &str = "launches.json";
const MAX_RECORDS: usize = 50;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LaunchRecord {
    pub target: PathBuf,
    pub mode: Mode,
    pub exit_code: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct History {
    #[serde(default)]
    pub launches: Vec<LaunchRecord>,
}

impl History {
    pub fn last(&self) -> Option<&LaunchRecord> {
        self.launches.last()
    }

    fn truncate_to_newest(&mut self) {
        let excess = self.launches.len().saturating_sub(MAX_RECORDS);
        self.launches.drain(..excess);
    }
}

pub fn history_file(data_dir: &Path) -> PathBuf {
    data_dir.join(HISTORY_FILE)
}

/// Strict read; a missing file is an empty history, a corrupt one is an error.
pub fn load_history(data_dir: &Path) -> anyhow::Result<History> {
    let path = history_file(data_dir);
    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(History::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("reading launch history at {}", path.display()));
        }
    };

    let mut history: History = serde_json::from_str(&data)
        .with_context(|| format!("parsing launch history at {}", path.display()))?;
    history.truncate_to_newest();
    Ok(history)
}

/// Like [`load_history`], but a corrupt file is moved to `launches.json.bad`
/// so the next write starts from an empty history.
fn load_or_reset(data_dir: &Path) -> anyhow::Result<History> {
    let path = history_file(data_dir);
    match load_history(data_dir) {
        Ok(history) => Ok(history),
        Err(err) if err.downcast_ref::<serde_json::Error>().is_some() => {
            let quarantine = path.with_extension("json.bad");
            tracing::warn!(
                "launch history is corrupt ({err:#}); moving it to {}",
                quarantine.display()
            );
            fs::rename(&path, &quarantine)
                .with_context(|| format!("moving corrupt history to {}", quarantine.display()))?;
            Ok(History::default())
        }
        Err(err) => Err(err),
    }
}

pub fn save_history(data_dir: &Path, history: &History) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("creating history directory {}", data_dir.display()))?;

    let path = history_file(data_dir);
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, serde_json::to_vec_pretty(history)?)
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &path).with_context(|| format!("replacing {}", path.display()))
}

/// Append a record, keeping only the newest entries.
pub fn record_launch(data_dir: &Path, record: LaunchRecord) -> anyhow::Result<()> {
    let mut history = load_or_reset(data_dir)?;
    history.launches.push(record);
    history.truncate_to_newest();
    save_history(data_dir, &history)
}
