//! Table buffers: persistence and normalization over engine sample buffers.
//!
//! A table is a precomputed sample buffer living inside the engine; this
//! layer owns the handles and moves data in and out. On-disk format is one
//! JSON list of floats per channel, e.g. a two-channel table serializes as
//! `[[0.0, 1.0, ...], [1.0, 0.99, ...]]`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::engine::{EngineRef, TableId};
use crate::error::{Error, Result};

/// Exclusive ownership of one engine table, released exactly once on drop.
pub struct Table {
    engine: EngineRef,
    id: TableId,
}

impl Table {
    pub(crate) fn new(engine: EngineRef, id: TableId) -> Self {
        Table { engine, id }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    /// Copy of the table's samples.
    pub fn data(&self) -> Result<Vec<f64>> {
        Ok(self.engine.table_data(self.id)?)
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        self.engine.delete_table(self.id);
    }
}

/// The ordered per-channel table buffers owned by one table node.
pub struct TableSet {
    engine: EngineRef,
    tables: Vec<Table>,
}

impl TableSet {
    /// Allocate `channels` zero-filled buffers of `size` frames.
    pub fn alloc(engine: &EngineRef, size: usize, channels: usize) -> Result<Self> {
        let mut tables = Vec::with_capacity(channels);
        for _ in 0..channels {
            let id = engine.alloc_table(size)?;
            tables.push(Table::new(engine.clone(), id));
        }
        Ok(TableSet {
            engine: engine.clone(),
            tables,
        })
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Indexed access; out-of-range indices are a reported error.
    pub fn table(&self, i: usize) -> Result<&Table> {
        self.tables.get(i).ok_or(Error::ChannelOutOfRange {
            index: i,
            count: self.tables.len(),
        })
    }

    /// Replace channel `i`'s samples, resizing its buffer to `data.len()`.
    pub fn set_data(&mut self, i: usize, data: &[f64]) -> Result<()> {
        let id = self.table(i)?.id();
        Ok(self.engine.set_table_data(id, data)?)
    }

    /// Serialize one list of floats per channel.
    pub fn write(&self, path: &Path) -> Result<()> {
        let data: std::result::Result<Vec<Vec<f64>>, _> = self
            .tables
            .iter()
            .map(|t| self.engine.table_data(t.id()))
            .collect();
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer(file, &data?)?;
        Ok(())
    }

    /// Replace every channel's contents from a file written by
    /// [`write`](Self::write). Each buffer is resized to its list's length;
    /// when the file holds fewer lists than there are channels, the lists
    /// cycle.
    pub fn read(&mut self, path: &Path) -> Result<()> {
        let file = BufReader::new(File::open(path)?);
        let data: Vec<Vec<f64>> = serde_json::from_reader(file)?;
        if data.is_empty() {
            return Err(Error::EmptyTableData);
        }
        for (i, t) in self.tables.iter().enumerate() {
            self.engine.set_table_data(t.id(), &data[i % data.len()])?;
        }
        Ok(())
    }

    /// Scale every channel so its largest magnitude is 1.
    pub fn normalize(&mut self) -> Result<()> {
        for t in &self.tables {
            self.engine.normalize_table(t.id())?;
        }
        Ok(())
    }
}

/// A writable multi-channel table node, allocated silent.
pub struct DataTable {
    set: TableSet,
    size: usize,
}

impl DataTable {
    pub fn new(engine: &EngineRef, size: usize, channels: usize) -> Result<Self> {
        Ok(DataTable {
            set: TableSet::alloc(engine, size, channels)?,
            size,
        })
    }

    /// Allocation size in frames. Individual channels may have been resized
    /// since by [`read`](TableSet::read).
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tables(&self) -> &TableSet {
        &self.set
    }

    pub fn tables_mut(&mut self) -> &mut TableSet {
        &mut self.set
    }

    pub fn set_data(&mut self, channel: usize, data: &[f64]) -> Result<()> {
        self.set.set_data(channel, data)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        self.set.write(path)
    }

    pub fn read(&mut self, path: &Path) -> Result<()> {
        self.set.read(path)
    }

    pub fn normalize(&mut self) -> Result<()> {
        self.set.normalize()
    }
}
