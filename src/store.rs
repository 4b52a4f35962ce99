//! The record store: every daily record of the session, keyed by date, and its durable snapshot.
//!
//! The store has value semantics. `commit` returns a new store and leaves the one it was called
//! on untouched, so any code still holding the old store keeps a consistent view of it.
//!
//! The durable slot is a single JSON file holding the whole store. It is read once at startup
//! and fully rewritten after each committed change.

use crate::backup::Backup;
use crate::error::{ErrorType, IntoResult};
use crate::model::{DailyRecord, DateKey, SchemaVariant};
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// A mapping from `DateKey` to one daily record of schema `R`.
///
/// Being generic over the record type means a store can never hold records of two schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordStore<R: DailyRecord> {
    records: BTreeMap<DateKey, R>,
}

/// The on-disk form of the store. The schema tag makes a snapshot written under one schema
/// unreadable under another instead of being coerced.
#[derive(Serialize)]
struct SnapshotRef<'a, R> {
    schema: SchemaVariant,
    records: &'a BTreeMap<DateKey, R>,
}

#[derive(Deserialize)]
struct Snapshot<R> {
    schema: SchemaVariant,
    records: BTreeMap<DateKey, R>,
}

impl<R: DailyRecord> Default for RecordStore<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<R: DailyRecord> RecordStore<R> {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the snapshot at `path`.
    ///
    /// This never fails. A missing snapshot yields an empty store. An unreadable or unparseable
    /// snapshot is logged, copied into the backups directory, and also yields an empty store.
    pub async fn load(path: &Path, backup: &Backup) -> Self {
        if !path.exists() {
            debug!("No snapshot at {}, starting empty", path.display());
            return Self::new();
        }
        match Self::read(path).await {
            Ok(store) => {
                debug!("Loaded {} record(s) from {}", store.len(), path.display());
                store
            }
            Err(e) => {
                warn!("Ignoring the unreadable snapshot, starting empty: {e:#}");
                match backup.preserve_unreadable(path).await {
                    Ok(copy) => warn!("The unreadable snapshot was saved to {}", copy.display()),
                    Err(e) => warn!("Unable to back up the unreadable snapshot: {e:#}"),
                }
                Self::new()
            }
        }
    }

    async fn read(path: &Path) -> Result<Self> {
        let snapshot: Snapshot<R> = utils::deserialize(path).await?;
        anyhow::ensure!(
            snapshot.schema == R::VARIANT,
            "The snapshot at {} was written with the '{}' schema, expected '{}'",
            path.display(),
            snapshot.schema,
            R::VARIANT
        );
        Ok(Self {
            records: snapshot.records,
        })
    }

    /// Writes the whole store to `path`, replacing the previous snapshot.
    ///
    /// # Errors
    /// Returns a `Persistence` error if the snapshot cannot be written. The in-memory store is
    /// still valid in that case.
    pub async fn persist(&self, path: &Path) -> Result<()> {
        let snapshot = SnapshotRef {
            schema: R::VARIANT,
            records: &self.records,
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .context("Unable to serialize the record store")
            .pub_result(ErrorType::Persistence)?;
        utils::write_replace(path, json)
            .await
            .pub_result(ErrorType::Persistence)
    }

    /// Returns the record for `date`, or the zero-value record if there is none.
    pub fn get(&self, date: &DateKey) -> Cow<'_, R> {
        match self.records.get(date) {
            Some(record) => Cow::Borrowed(record),
            None => Cow::Owned(R::default()),
        }
    }

    /// Whether a record is stored for `date`.
    pub fn contains(&self, date: &DateKey) -> bool {
        self.records.contains_key(date)
    }

    /// Returns a new store in which `date` maps to `record`. All other entries are unchanged and
    /// `self` is not modified.
    #[must_use]
    pub fn commit(&self, date: DateKey, record: R) -> Self {
        let mut records = self.records.clone();
        records.insert(date, record);
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates over the stored records in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &R)> {
        self.records.iter()
    }
}

impl<R: DailyRecord> FromIterator<(DateKey, R)> for RecordStore<R> {
    fn from_iter<T: IntoIterator<Item = (DateKey, R)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
