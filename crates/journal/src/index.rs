//! Append-only revision index using sled
//!
//! One pair of trees per archiver:
//! - `archiver/<name>/revisions`: big-endian sequence number -> encoded entry
//! - `archiver/<name>/keys`: revision key -> sequence number
//!
//! Sequence numbers grow with every append, so iterating `revisions` in key
//! order yields entries oldest to newest.

use crate::entry::RevisionEntry;
use crate::error::IndexError;
use crate::Result;
use parking_lot::RwLock;
use sled::transaction::{abort, TransactionError, Transactional};
use sled::{Db, Tree};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tm_core::{MetricNotFound, MetricValue};

const TREE_PREFIX: &str = "archiver/";

/// The whole index database, shared by every archiver
pub struct Index {
    db: Db,
}

impl Index {
    /// Open or create the index at `dir`
    pub fn open(dir: &Path) -> Result<Self> {
        let db = sled::open(dir)?;
        tracing::debug!(path = %dir.display(), "opened revision index");
        Ok(Self { db })
    }

    /// Handle on the per-archiver index, created empty on first use
    pub fn archiver(&self, name: &str) -> Result<ArchiverIndex> {
        ArchiverIndex::open(&self.db, name)
    }

    /// Names of archivers that have at least one tree
    pub fn archivers(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .db
            .tree_names()
            .iter()
            .filter_map(|raw| std::str::from_utf8(raw).ok())
            .filter_map(|name| name.strip_prefix(TREE_PREFIX))
            .filter_map(|rest| rest.strip_suffix("/revisions"))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }
}

/// Ordered, append-only list of revision entries for one archiver
pub struct ArchiverIndex {
    name: String,
    revisions: Tree,
    keys: Tree,
    /// In-memory mirror of `keys`: revision key -> sequence number
    key_map: RwLock<HashMap<String, u64>>,
    /// Next sequence number
    seq_counter: AtomicU64,
}

impl ArchiverIndex {
    fn open(db: &Db, name: &str) -> Result<Self> {
        let revisions = db.open_tree(format!("{}{}/revisions", TREE_PREFIX, name))?;
        let keys = db.open_tree(format!("{}{}/keys", TREE_PREFIX, name))?;

        // Rebuild the key map on startup
        let mut key_map = HashMap::new();
        for item in keys.iter() {
            let (key, seq) = item?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|_| IndexError::Corrupt("non UTF-8 revision key".to_string()))?;
            key_map.insert(key, decode_seq(&seq)?);
        }

        let next_seq = match revisions.last()? {
            Some((seq, _)) => decode_seq(&seq)? + 1,
            None => 0,
        };

        Ok(Self {
            name: name.to_string(),
            revisions,
            keys,
            key_map: RwLock::new(key_map),
            seq_counter: AtomicU64::new(next_seq),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a new entry; fails without modifying the index if its key is present
    pub fn append(&self, entry: &RevisionEntry) -> Result<u64> {
        let key = entry.key().to_string();
        if self.contains(&key) {
            return Err(self.duplicate(&key));
        }

        let value = entry.serialize()?;
        let seq = self.seq_counter.fetch_add(1, Ordering::SeqCst);
        let seq_bytes = seq.to_be_bytes();

        let outcome = (&self.revisions, &self.keys).transaction(|(revisions, keys)| {
            if keys.get(key.as_bytes())?.is_some() {
                return abort(());
            }
            revisions.insert(&seq_bytes[..], value.as_slice())?;
            keys.insert(key.as_bytes(), &seq_bytes[..])?;
            Ok(())
        });

        match outcome {
            Ok(()) => {}
            Err(TransactionError::Abort(())) => return Err(self.duplicate(&key)),
            Err(TransactionError::Storage(e)) => return Err(IndexError::Storage(e)),
        }

        self.key_map.write().insert(key, seq);

        // Flush to ensure durability
        self.revisions.flush()?;
        self.keys.flush()?;

        tracing::debug!(archiver = %self.name, revision = %entry.key(), seq, "appended revision");
        Ok(seq)
    }

    /// Fetch the entry for `key`
    pub fn lookup_revision(&self, key: &str) -> Result<RevisionEntry> {
        let seq = self
            .key_map
            .read()
            .get(key)
            .copied()
            .ok_or_else(|| IndexError::RevisionNotFound {
                archiver: self.name.clone(),
                key: key.to_string(),
            })?;
        self.entry_at(seq)?.ok_or_else(|| {
            IndexError::Corrupt(format!("revision {} points at a missing entry", key))
        })
    }

    /// Most recently appended entry
    pub fn last_revision(&self) -> Result<RevisionEntry> {
        match self.revisions.last()? {
            Some((_, value)) => RevisionEntry::deserialize(&value),
            None => Err(IndexError::EmptyIndex {
                archiver: self.name.clone(),
            }),
        }
    }

    /// Up to `limit` entries, newest first
    pub fn history(&self, limit: usize) -> Result<Vec<RevisionEntry>> {
        self.revisions
            .iter()
            .rev()
            .take(limit)
            .map(|item| {
                let (_, value) = item?;
                RevisionEntry::deserialize(&value)
            })
            .collect()
    }

    /// Value of one metric at `key`
    ///
    /// `object` selects a function/class row; `None` reads the file total.
    pub fn get_metric(
        &self,
        key: &str,
        operator: &str,
        file: &str,
        object: Option<&str>,
        metric: &str,
    ) -> Result<MetricValue> {
        let entry = match self.lookup_revision(key) {
            Ok(entry) => entry,
            Err(IndexError::RevisionNotFound { key, .. }) => {
                return Err(MetricNotFound::RevisionNotIndexed { key }.into())
            }
            Err(e) => return Err(e),
        };
        Ok(entry.get(operator, file, object, metric)?.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.key_map.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.key_map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All indexed revision keys, oldest first
    pub fn keys(&self) -> Vec<String> {
        let map = self.key_map.read();
        let mut keys: Vec<(&String, &u64)> = map.iter().collect();
        keys.sort_by_key(|(_, seq)| **seq);
        keys.into_iter().map(|(key, _)| key.clone()).collect()
    }

    fn entry_at(&self, seq: u64) -> Result<Option<RevisionEntry>> {
        match self.revisions.get(seq.to_be_bytes())? {
            Some(value) => Ok(Some(RevisionEntry::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    fn duplicate(&self, key: &str) -> IndexError {
        IndexError::DuplicateAppend {
            archiver: self.name.clone(),
            key: key.to_string(),
        }
    }
}

fn decode_seq(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| IndexError::Corrupt(format!("bad sequence number of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}
