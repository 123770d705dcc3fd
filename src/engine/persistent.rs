//! Journal-backed cell store.
//!
//! Every write appends the full cell as one JSON line; the newest line for
//! an id wins on replay. `compact` rewrites the journal down to one line
//! per cell.

use std::{
    collections::HashMap,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Read, Write},
    mem,
    path::{Path, PathBuf},
};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::storage::{CellQuery, CellStore};
use crate::{
    error::{StoreError, StoreResult},
    grid::{CellId, GridCell},
};

/// How often the journal is forced to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    /// fsync after every record.
    Always,
    /// Flush to the OS only.
    #[default]
    No,
}

pub struct FileCellStore {
    path: PathBuf,
    policy: SyncPolicy,
    index: RwLock<HashMap<CellId, GridCell>>,
    writer: Mutex<BufWriter<File>>,
}

impl FileCellStore {
    /// Opens (or creates) the journal at `path` and replays it.
    ///
    /// An unterminated last line is a write torn by a crash: it is dropped
    /// and the file truncated to the last complete record. A bad line
    /// anywhere else is reported as corruption.
    pub fn open<P: AsRef<Path>>(
        path: P,
        policy: SyncPolicy,
    ) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;
        let mut raw = Vec::new();
        file.read_to_end(&mut raw)?;

        let (index, valid_len) = replay(&raw)?;
        if valid_len < raw.len() {
            warn!(
                path = %path.display(),
                dropped_bytes = raw.len() - valid_len,
                "Dropping torn record at journal tail"
            );
            file.set_len(valid_len as u64)?;
        }

        let writer_file = OpenOptions::new().append(true).open(&path)?;
        info!(path = %path.display(), cells = index.len(), "Cell journal opened");

        Ok(Self {
            path,
            policy,
            index: RwLock::new(index),
            writer: Mutex::new(BufWriter::new(writer_file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Rewrites the journal with exactly one record per cell.
    pub fn compact(&self) -> StoreResult<()> {
        let index = self.index.read();
        let mut writer = self.writer.lock();
        writer.flush()?;

        let old_size = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut out = BufWriter::new(temp.as_file_mut());
            for cell in index.values() {
                write_record(&mut out, cell)?;
            }
            out.flush()?;
        }
        temp.as_file_mut().sync_all()?;
        temp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        *writer = BufWriter::new(OpenOptions::new().append(true).open(&self.path)?);

        let new_size = fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0);
        info!(
            path = %self.path.display(),
            cells = index.len(),
            old_size,
            new_size,
            "Cell journal compacted"
        );
        Ok(())
    }

    /// Appends one record. A failed append leaves the journal as it was:
    /// nothing of the record stays buffered or on disk.
    fn append(
        &self,
        cell: &GridCell,
    ) -> StoreResult<()> {
        let mut writer = self.writer.lock();
        let start = writer.get_ref().metadata()?.len();
        if let Err(err) = write_synced(&mut writer, cell, self.policy) {
            warn!(cell = %cell.id, error = %err, "Journal append failed, rolling back");
            self.rewind(&mut writer, start)?;
            return Err(err);
        }
        Ok(())
    }

    /// Drops whatever `writer` still buffers and truncates the journal to
    /// `len` bytes.
    fn rewind(
        &self,
        writer: &mut BufWriter<File>,
        len: u64,
    ) -> StoreResult<()> {
        let fresh = BufWriter::new(OpenOptions::new().append(true).open(&self.path)?);
        let (_, unwritten) = mem::replace(writer, fresh).into_parts();
        writer.get_ref().set_len(len)?;
        debug!(
            len,
            discarded_bytes = unwritten.map_or(0, |b| b.len()),
            "Journal rewound"
        );
        Ok(())
    }
}

impl CellStore for FileCellStore {
    fn create(&self, cell: &GridCell) -> StoreResult<()> {
        let mut index = self.index.write();
        if index.contains_key(&cell.id) {
            return Err(StoreError::AlreadyExists {
                id: cell.id.to_string(),
            });
        }
        self.append(cell)?;
        index.insert(cell.id, cell.clone());
        Ok(())
    }

    fn upsert(&self, cell: &GridCell) -> StoreResult<()> {
        let mut index = self.index.write();
        self.append(cell)?;
        index.insert(cell.id, cell.clone());
        Ok(())
    }

    fn get(&self, id: &CellId) -> StoreResult<Option<GridCell>> {
        Ok(self.index.read().get(id).cloned())
    }

    fn query(&self, query: &CellQuery) -> StoreResult<Vec<GridCell>> {
        let matched = self
            .index
            .read()
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        Ok(query.finish(matched))
    }

    fn count(&self, query: &CellQuery) -> StoreResult<usize> {
        Ok(self
            .index
            .read()
            .values()
            .filter(|c| query.matches(c))
            .count())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Internal functions
////////////////////////////////////////////////////////////////////////////////

fn write_synced(
    writer: &mut BufWriter<File>,
    cell: &GridCell,
    policy: SyncPolicy,
) -> StoreResult<()> {
    write_record(writer, cell)?;
    writer.flush()?;
    if policy == SyncPolicy::Always {
        writer.get_ref().sync_data()?;
    }
    Ok(())
}

fn write_record<W: Write>(
    out: &mut W,
    cell: &GridCell,
) -> StoreResult<()> {
    serde_json::to_writer(&mut *out, cell).map_err(|e| StoreError::Serialization {
        reason: e.to_string(),
    })?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Rebuilds the index from journal bytes. Returns the index and the length
/// of the valid prefix.
fn replay(raw: &[u8]) -> StoreResult<(HashMap<CellId, GridCell>, usize)> {
    let mut index = HashMap::new();
    let mut offset = 0;
    let mut line_no = 0;

    while offset < raw.len() {
        line_no += 1;
        let Some(newline) = raw[offset..].iter().position(|b| *b == b'\n') else {
            // Unterminated tail.
            break;
        };
        let line = &raw[offset..offset + newline];
        offset += newline + 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let cell: GridCell = serde_json::from_slice(line).map_err(|e| StoreError::Corrupted {
            line: line_no,
            reason: e.to_string(),
        })?;
        index.insert(cell.id, cell);
    }

    debug!(records = line_no, cells = index.len(), "Journal replayed");
    // `offset` stops at the first byte of an unterminated tail, if any.
    Ok((index, offset))
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
