//! # Spill Coordinator
//!
//! Owns the external half of a row store. The coordinator creates its spill
//! file lazily on the first `spill`, so results that never overflow never
//! touch the filesystem.
//!
//! Rows reach the spill file only by being flushed out of memory, oldest
//! first, so the spilled rows always form a prefix of the store's logical
//! sequence. [`SpillCoordinator::merge`] exploits that: the unified sequence
//! is simply "spilled rows, then in-memory rows".

use crate::storage::{ReadHint, SpillCursor, SpillFile};
use crate::types::Row;
use eyre::Result;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SpillCoordinator {
    dir: PathBuf,
    prefix: &'static str,
    file: Option<SpillFile>,
}

impl SpillCoordinator {
    pub fn new(dir: impl Into<PathBuf>, prefix: &'static str) -> Self {
        Self {
            dir: dir.into(),
            prefix,
            file: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.file.is_some()
    }

    pub fn row_count(&self) -> usize {
        self.file.as_ref().map_or(0, SpillFile::row_count)
    }

    pub fn size_bytes(&self) -> usize {
        self.file.as_ref().map_or(0, SpillFile::size_bytes)
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(SpillFile::path)
    }

    pub fn spill(&mut self, row: &Row) -> Result<()> {
        let file = match self.file.as_mut() {
            Some(file) => file,
            None => self.file.insert(SpillFile::create(&self.dir, self.prefix)?),
        };
        file.append(row)
    }

    /// Restartable sequence of spilled rows in write order.
    pub fn iterate(&mut self) -> Result<SpilledRows> {
        match self.file.as_mut() {
            Some(file) => {
                file.refresh_map()?;
                Ok(SpilledRows {
                    cursor: Some(file.cursor()),
                })
            }
            None => Ok(SpilledRows { cursor: None }),
        }
    }

    /// Spilled rows followed by `in_memory`, which is append order.
    pub fn merge<'a>(&mut self, in_memory: &'a [Row]) -> Result<MergedRows<'a>> {
        Ok(MergedRows {
            spilled: self.iterate()?,
            in_memory: in_memory.iter(),
        })
    }

    pub fn read_at(&self, pos: usize, hint: &mut ReadHint) -> Result<Row> {
        match self.file.as_ref() {
            Some(file) => file.read_at(pos, hint),
            None => eyre::bail!("spilled row {} requested but nothing was spilled", pos),
        }
    }

    pub fn seal(&mut self) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => file.seal(),
            None => Ok(()),
        }
    }

    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            tracing::trace!(path = ?file.path(), rows = file.row_count(), "releasing spill file");
        }
    }
}

pub struct SpilledRows {
    cursor: Option<SpillCursor>,
}

impl Iterator for SpilledRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.as_mut()?.next()
    }
}

pub struct MergedRows<'a> {
    spilled: SpilledRows,
    in_memory: std::slice::Iter<'a, Row>,
}

impl Iterator for MergedRows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(row) = self.spilled.next() {
            return Some(row);
        }
        self.in_memory.next().cloned().map(Ok)
    }
}
