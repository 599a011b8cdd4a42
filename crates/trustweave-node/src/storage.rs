//! RocksDB storage backend for the TrustWeave node.
//!
//! Two column families: `events` holds one JSON record per event keyed by
//! its big-endian sequence number, `state` holds the latest ledger snapshot.
//! [`Storage::persist`] writes both in a single atomic batch, so a snapshot
//! never refers to events that were not stored.

use anyhow::Result;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

use trustweave_core::EventRecord;
use trustweave_ledger::LedgerSnapshot;

/// Column family names for different data types.
const CF_EVENTS: &str = "events";
const CF_STATE: &str = "state";

const SNAPSHOT_KEY: &[u8] = b"snapshot";

/// RocksDB-backed storage for the TrustWeave node.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_EVENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_STATE, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    /// Put a value into a column family.
    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))?;
        self.db.put_cf(&cf, key, value)?;
        Ok(())
    }

    /// Get a value from a column family.
    pub fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))?;
        let value = self.db.get_cf(&cf, key)?;
        Ok(value)
    }

    /// Atomically store new event records together with the snapshot taken
    /// after them.
    pub fn persist(&self, snapshot: &LedgerSnapshot, records: &[EventRecord]) -> Result<()> {
        let events_cf = self
            .db
            .cf_handle(CF_EVENTS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_EVENTS))?;
        let state_cf = self
            .db
            .cf_handle(CF_STATE)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_STATE))?;

        let mut batch = WriteBatch::default();
        for record in records {
            batch.put_cf(&events_cf, record.seq.to_be_bytes(), serde_json::to_vec(record)?);
        }
        batch.put_cf(&state_cf, SNAPSHOT_KEY, snapshot.to_json_bytes()?);
        self.db.write(batch)?;
        Ok(())
    }

    /// Latest stored snapshot, if the ledger was ever persisted.
    pub fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        match self.get(CF_STATE, SNAPSHOT_KEY)? {
            Some(bytes) => Ok(Some(LedgerSnapshot::from_json_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Up to `limit` stored event records with `seq > after`, in sequence
    /// order, read by seeking to the first key.
    pub fn events_since(&self, after: u64, limit: usize) -> Result<Vec<EventRecord>> {
        let cf = self
            .db
            .cf_handle(CF_EVENTS)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", CF_EVENTS))?;
        let Some(start) = after.checked_add(1) else {
            return Ok(Vec::new());
        };
        let start = start.to_be_bytes();
        let mut records = Vec::new();
        let mode = IteratorMode::From(&start, Direction::Forward);
        for item in self.db.iterator_cf(&cf, mode).take(limit) {
            let (_, value) = item?;
            records.push(serde_json::from_slice::<EventRecord>(&value)?);
        }
        Ok(records)
    }
}
