//! Run output files: the append-only run log and JSON dumps.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use valstream_core::ledger::RunRecord;

#[derive(Debug, thiserror::Error)]
pub enum RunLogError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RunLogError + '_ {
    move |source| RunLogError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn create_parent(path: &Path) -> Result<(), RunLogError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).map_err(io_error(path)),
        _ => Ok(()),
    }
}

/// Append `record` to the run log at `path` as one JSON line, creating the
/// file and its directory when missing.
pub fn append_record(path: &Path, record: &RunRecord) -> Result<(), RunLogError> {
    create_parent(path)?;
    let line = serde_json::to_string(record).map_err(|source| RunLogError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_error(path))?;
    writeln!(file, "{line}").map_err(io_error(path))
}

/// Write `value` to `path` as pretty-printed JSON, replacing any existing file.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<(), RunLogError> {
    create_parent(path)?;
    let file = fs::File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| RunLogError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_error(path))
}
