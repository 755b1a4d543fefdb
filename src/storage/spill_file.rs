//! # Spill Files
//!
//! A `SpillFile` is an append-only temporary file holding `RowSerde`-encoded
//! rows. Writes go through a `BufWriter`; reads go through a memory map that
//! is refreshed lazily whenever rows were appended since the last mapping, so
//! a file can be read while it is still being written.
//!
//! ## Layout
//!
//! ```text
//! +-------+-------+-------+-----+-------+
//! | row 0 | row 1 | row 2 | ... | row N |   (no header, no footer)
//! +-------+-------+-------+-----+-------+
//! ^                       ^
//! index[0]                index[1] = offset of row SPILL_INDEX_STRIDE
//! ```
//!
//! The sparse index lives in memory only. Random access to row `p` starts at
//! `index[p / SPILL_INDEX_STRIDE]` and skips at most `SPILL_INDEX_STRIDE - 1`
//! rows. A [`ReadHint`] remembers where the previous read ended, so strictly
//! sequential `read_at` calls never re-skip.
//!
//! ## Cleanup
//!
//! The file is removed when the `SpillFile` is dropped. Removal failures are
//! logged and otherwise ignored.

use super::RowSerde;
use crate::config::{SPILL_INDEX_STRIDE, SPILL_WRITE_BUFFER_SIZE};
use crate::types::{OwnedValue, Row};
use eyre::{ensure, Result, WrapErr};
use memmap2::Mmap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static SPILL_FILE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Position memo for sequential reads: the byte offset of row `next_row`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadHint {
    next_row: usize,
    offset: usize,
    valid: bool,
}

pub struct SpillFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    mmap: Option<Arc<Mmap>>,
    mapped_rows: usize,
    row_count: usize,
    bytes_written: usize,
    index: Vec<usize>,
    encode_buf: Vec<u8>,
}

impl std::fmt::Debug for SpillFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpillFile")
            .field("path", &self.path)
            .field("row_count", &self.row_count)
            .field("bytes_written", &self.bytes_written)
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

impl SpillFile {
    pub fn create(dir: &Path, prefix: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("failed to create spill directory: {:?}", dir))?;

        let seq = SPILL_FILE_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = dir.join(format!("{}_{}_{}.tmp", prefix, std::process::id(), seq));

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .wrap_err_with(|| format!("failed to create spill file: {:?}", path))?;

        Ok(Self {
            path,
            writer: Some(BufWriter::with_capacity(SPILL_WRITE_BUFFER_SIZE, file)),
            mmap: None,
            mapped_rows: 0,
            row_count: 0,
            bytes_written: 0,
            index: Vec::new(),
            encode_buf: Vec::with_capacity(256),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes_written
    }

    pub fn is_sealed(&self) -> bool {
        self.writer.is_none()
    }

    pub fn append(&mut self, row: &[OwnedValue]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            eyre::bail!("spill file {:?} is sealed", self.path);
        };

        if self.row_count % SPILL_INDEX_STRIDE == 0 {
            self.index.push(self.bytes_written);
        }

        self.encode_buf.clear();
        RowSerde::serialize_row_into(row, &mut self.encode_buf);
        writer
            .write_all(&self.encode_buf)
            .wrap_err_with(|| format!("failed to write spill file: {:?}", self.path))?;

        self.bytes_written += self.encode_buf.len();
        self.row_count += 1;
        Ok(())
    }

    /// Flushes buffered writes and drops the writer. Further appends fail.
    pub fn seal(&mut self) -> Result<()> {
        self.refresh_map()?;
        self.writer = None;
        Ok(())
    }

    /// Makes every appended row visible to readers.
    pub fn refresh_map(&mut self) -> Result<()> {
        if self.mapped_rows == self.row_count {
            return Ok(());
        }

        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer
            .flush()
            .wrap_err_with(|| format!("failed to flush spill file: {:?}", self.path))?;

        // SAFETY: the file is private to this process (created with
        // create_new) and only ever appended to, so mapped bytes never change.
        let mmap = unsafe { Mmap::map(writer.get_ref()) }
            .wrap_err_with(|| format!("failed to mmap spill file: {:?}", self.path))?;
        ensure!(
            mmap.len() >= self.bytes_written,
            "spill file {:?} shorter than written data",
            self.path
        );

        self.mmap = Some(Arc::new(mmap));
        self.mapped_rows = self.row_count;
        Ok(())
    }

    fn data(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    /// Reads row `pos`. Requires a prior `refresh_map` covering `pos`.
    pub fn read_at(&self, pos: usize, hint: &mut ReadHint) -> Result<Row> {
        ensure!(
            pos < self.mapped_rows,
            "spill row {} out of range (mapped {})",
            pos,
            self.mapped_rows
        );

        let data = self.data();
        let mut offset = if hint.valid && hint.next_row == pos {
            hint.offset
        } else {
            let block = pos / SPILL_INDEX_STRIDE;
            let mut offset = self.index[block];
            for _ in 0..pos % SPILL_INDEX_STRIDE {
                RowSerde::skip_row(data, &mut offset)?;
            }
            offset
        };

        let row = RowSerde::deserialize_row(data, &mut offset)
            .wrap_err_with(|| format!("corrupt spill file: {:?}", self.path))?;

        *hint = ReadHint {
            next_row: pos + 1,
            offset,
            valid: true,
        };
        Ok(row)
    }

    /// Sequential cursor over the currently mapped rows. The cursor shares
    /// the mapping, so it stays valid after further appends.
    pub fn cursor(&self) -> SpillCursor {
        SpillCursor {
            mmap: self.mmap.clone(),
            offset: 0,
            remaining: self.mapped_rows,
        }
    }
}

impl Drop for SpillFile {
    fn drop(&mut self) {
        self.writer = None;
        self.mmap = None;
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = ?self.path, error = %e, "failed to remove spill file");
            }
        }
    }
}

pub struct SpillCursor {
    mmap: Option<Arc<Mmap>>,
    offset: usize,
    remaining: usize,
}

impl SpillCursor {
    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl Iterator for SpillCursor {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let mmap = self.mmap.as_ref()?;
        self.remaining -= 1;

        match RowSerde::deserialize_row(mmap, &mut self.offset) {
            Ok(row) => Some(Ok(row)),
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn int_row(i: i64) -> Vec<OwnedValue> {
        vec![OwnedValue::Int(i), OwnedValue::Text(format!("row_{}", i))]
    }

    #[test]
    fn cursor_reads_rows_in_write_order() {
        let dir = tempdir().unwrap();
        let mut file = SpillFile::create(dir.path(), "test").unwrap();
        for i in 0..100 {
            file.append(&int_row(i)).unwrap();
        }
        file.seal().unwrap();

        let rows: Vec<Row> = file.cursor().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 100);
        assert_eq!(rows[0][0], OwnedValue::Int(0));
        assert_eq!(rows[99][1], OwnedValue::Text("row_99".into()));
    }

    #[test]
    fn read_at_supports_random_and_sequential_access() {
        let dir = tempdir().unwrap();
        let mut file = SpillFile::create(dir.path(), "test").unwrap();
        for i in 0..(SPILL_INDEX_STRIDE as i64 * 3 + 5) {
            file.append(&int_row(i)).unwrap();
        }
        file.seal().unwrap();

        let mut hint = ReadHint::default();
        let row = file.read_at(130, &mut hint).unwrap();
        assert_eq!(row[0], OwnedValue::Int(130));
        let row = file.read_at(131, &mut hint).unwrap();
        assert_eq!(row[0], OwnedValue::Int(131));
        let row = file.read_at(3, &mut hint).unwrap();
        assert_eq!(row[0], OwnedValue::Int(3));
        assert!(file.read_at(10_000, &mut hint).is_err());
    }

    #[test]
    fn refresh_map_exposes_rows_appended_after_first_read() {
        let dir = tempdir().unwrap();
        let mut file = SpillFile::create(dir.path(), "test").unwrap();
        file.append(&int_row(1)).unwrap();
        file.refresh_map().unwrap();
        let early = file.cursor();

        file.append(&int_row(2)).unwrap();
        file.refresh_map().unwrap();

        assert_eq!(early.count(), 1);
        assert_eq!(file.cursor().count(), 2);
    }

    #[test]
    fn append_after_seal_returns_error() {
        let dir = tempdir().unwrap();
        let mut file = SpillFile::create(dir.path(), "test").unwrap();
        file.seal().unwrap();
        assert!(file.append(&int_row(1)).is_err());
        assert_eq!(file.cursor().count(), 0);
    }

    #[test]
    fn drop_removes_file() {
        let dir = tempdir().unwrap();
        let path;
        {
            let mut file = SpillFile::create(dir.path(), "test").unwrap();
            file.append(&int_row(1)).unwrap();
            file.seal().unwrap();
            path = file.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn file_names_are_unique() {
        let dir = tempdir().unwrap();
        let a = SpillFile::create(dir.path(), "test").unwrap();
        let b = SpillFile::create(dir.path(), "test").unwrap();
        assert_ne!(a.path(), b.path());
    }
}
