//! Keyed tables with staged, all-or-nothing writes
//!
//! Each venue owns three tables: its cumulative record, its fine buckets and
//! its coarse buckets. A unit of work runs against a [`VenueTxn`] that layers
//! staged writes over the committed rows. The write set is applied only when
//! the work returns `Ok`; an `Err` discards it.
//!
//! `InMemoryStore` keeps one `Mutex`-guarded partition per venue in a
//! `DashMap`, so writers on one venue serialize while different venues
//! proceed in parallel.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use types::ids::VenueId;

use crate::error::StatsError;
use crate::records::{CoarseBucket, CumulativeRecord, FineBucket};

/// Committed state of one venue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueTables {
    pub cumulative: Option<CumulativeRecord>,
    /// Fine buckets keyed by aligned timestamp (ascending).
    pub fine: BTreeMap<i64, FineBucket>,
    /// Coarse buckets keyed by aligned timestamp (ascending).
    pub coarse: BTreeMap<i64, CoarseBucket>,
}

impl VenueTables {
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_none() && self.fine.is_empty() && self.coarse.is_empty()
    }

    /// Total rows across the three tables.
    pub fn row_count(&self) -> usize {
        usize::from(self.cumulative.is_some()) + self.fine.len() + self.coarse.len()
    }
}

/// Timestamp-keyed table view with pending puts and deletes.
pub struct StagedTable<'a, V> {
    committed: &'a BTreeMap<i64, V>,
    puts: BTreeMap<i64, V>,
    deletes: BTreeSet<i64>,
}

impl<'a, V: Clone> StagedTable<'a, V> {
    fn new(committed: &'a BTreeMap<i64, V>) -> Self {
        Self {
            committed,
            puts: BTreeMap::new(),
            deletes: BTreeSet::new(),
        }
    }

    pub fn get(&self, key: i64) -> Option<&V> {
        if let Some(value) = self.puts.get(&key) {
            return Some(value);
        }
        if self.deletes.contains(&key) {
            return None;
        }
        self.committed.get(&key)
    }

    pub fn contains(&self, key: i64) -> bool {
        self.get(key).is_some()
    }

    /// Mutable access; a committed row is copied into the write set first.
    pub fn get_mut(&mut self, key: i64) -> Option<&mut V> {
        if !self.puts.contains_key(&key) {
            if self.deletes.contains(&key) {
                return None;
            }
            let value = self.committed.get(&key)?.clone();
            self.puts.insert(key, value);
        }
        self.puts.get_mut(&key)
    }

    pub fn put(&mut self, key: i64, value: V) {
        self.deletes.remove(&key);
        self.puts.insert(key, value);
    }

    /// Delete a row. Returns whether it was visible.
    pub fn delete(&mut self, key: i64) -> bool {
        let existed = self.contains(key);
        self.puts.remove(&key);
        if self.committed.contains_key(&key) {
            self.deletes.insert(key);
        }
        existed
    }

    /// Oldest visible row.
    pub fn first(&self) -> Option<(i64, &V)> {
        let committed = self
            .committed
            .iter()
            .find(|(key, _)| !self.deletes.contains(key) && !self.puts.contains_key(key))
            .map(|(key, value)| (*key, value));
        let staged = self.puts.iter().next().map(|(key, value)| (*key, value));

        match (committed, staged) {
            (Some(c), Some(s)) => Some(if s.0 < c.0 { s } else { c }),
            (c, s) => c.or(s),
        }
    }

    /// Visible keys strictly below `bound`, ascending.
    ///
    /// Only the expired range of the committed table is visited.
    pub fn keys_before(&self, bound: i64) -> Vec<i64> {
        let committed = self
            .committed
            .range(..bound)
            .map(|(key, _)| *key)
            .filter(|key| !self.deletes.contains(key));
        let staged = self.puts.range(..bound).map(|(key, _)| *key);
        committed.chain(staged).collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// All visible keys, ascending.
    pub fn keys(&self) -> Vec<i64> {
        let committed = self
            .committed
            .keys()
            .copied()
            .filter(|key| !self.deletes.contains(key));
        let staged = self.puts.keys().copied();
        committed.chain(staged).collect::<BTreeSet<_>>().into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    fn into_writes(self) -> TableWrites<V> {
        TableWrites {
            puts: self.puts,
            deletes: self.deletes,
        }
    }
}

struct TableWrites<V> {
    puts: BTreeMap<i64, V>,
    deletes: BTreeSet<i64>,
}

impl<V> TableWrites<V> {
    fn apply(self, target: &mut BTreeMap<i64, V>) {
        for key in self.deletes {
            target.remove(&key);
        }
        target.extend(self.puts);
    }
}

/// Staged view over one venue's three tables.
pub struct VenueTxn<'a> {
    venue: VenueId,
    committed_cumulative: Option<&'a CumulativeRecord>,
    /// `Some(None)` stages a delete.
    staged_cumulative: Option<Option<CumulativeRecord>>,
    pub fine: StagedTable<'a, FineBucket>,
    pub coarse: StagedTable<'a, CoarseBucket>,
}

impl<'a> VenueTxn<'a> {
    pub fn begin(venue: VenueId, tables: &'a VenueTables) -> Self {
        Self {
            venue,
            committed_cumulative: tables.cumulative.as_ref(),
            staged_cumulative: None,
            fine: StagedTable::new(&tables.fine),
            coarse: StagedTable::new(&tables.coarse),
        }
    }

    pub fn venue(&self) -> &VenueId {
        &self.venue
    }

    pub fn cumulative(&self) -> Option<&CumulativeRecord> {
        match &self.staged_cumulative {
            Some(staged) => staged.as_ref(),
            None => self.committed_cumulative,
        }
    }

    pub fn put_cumulative(&mut self, record: CumulativeRecord) {
        self.staged_cumulative = Some(Some(record));
    }

    /// Stage deletion of every row. Returns the number of rows removed.
    pub fn clear(&mut self) -> usize {
        let mut removed = usize::from(self.cumulative().is_some());
        self.staged_cumulative = Some(None);
        for key in self.fine.keys() {
            removed += usize::from(self.fine.delete(key));
        }
        for key in self.coarse.keys() {
            removed += usize::from(self.coarse.delete(key));
        }
        removed
    }

    pub fn into_writes(self) -> VenueWrites {
        VenueWrites {
            cumulative: self.staged_cumulative,
            fine: self.fine.into_writes(),
            coarse: self.coarse.into_writes(),
        }
    }
}

/// Pending writes of one committed unit of work.
pub struct VenueWrites {
    cumulative: Option<Option<CumulativeRecord>>,
    fine: TableWrites<FineBucket>,
    coarse: TableWrites<CoarseBucket>,
}

impl VenueWrites {
    pub fn apply(self, tables: &mut VenueTables) {
        if let Some(cumulative) = self.cumulative {
            tables.cumulative = cumulative;
        }
        self.fine.apply(&mut tables.fine);
        self.coarse.apply(&mut tables.coarse);
    }
}

/// Venue-partitioned persistence for the three tables.
pub trait StatsStore: Send + Sync {
    /// Run `work` against a staged view of `venue`, committing its writes
    /// only if it returns `Ok`. Calls for the same venue are serialized.
    fn transact<R>(
        &self,
        venue: &VenueId,
        work: impl FnOnce(&mut VenueTxn<'_>) -> Result<R, StatsError>,
    ) -> Result<R, StatsError>;

    /// Read committed state of `venue` (empty tables if unknown).
    fn read<R>(&self, venue: &VenueId, view: impl FnOnce(&VenueTables) -> R) -> Result<R, StatsError>;

    /// Venues holding at least one row, sorted.
    fn venues(&self) -> Vec<VenueId>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    partitions: DashMap<VenueId, Arc<Mutex<VenueTables>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn partition(&self, venue: &VenueId) -> Arc<Mutex<VenueTables>> {
        Arc::clone(&self.partitions.entry(venue.clone()).or_default())
    }

    /// Copy of every non-empty venue's tables.
    pub fn export(&self) -> Result<BTreeMap<VenueId, VenueTables>, StatsError> {
        let mut venues = BTreeMap::new();
        for entry in self.partitions.iter() {
            let tables = entry
                .value()
                .lock()
                .map_err(|_| StatsError::StorePoisoned(entry.key().clone()))?;
            if !tables.is_empty() {
                venues.insert(entry.key().clone(), tables.clone());
            }
        }
        Ok(venues)
    }

    /// Replace the contents of every listed venue. Venues absent from
    /// `venues` are cleared.
    pub fn import(&self, venues: BTreeMap<VenueId, VenueTables>) -> Result<(), StatsError> {
        let known: Vec<VenueId> = self.partitions.iter().map(|e| e.key().clone()).collect();
        for venue in known {
            if !venues.contains_key(&venue) {
                let partition = self.partition(&venue);
                let mut tables = partition
                    .lock()
                    .map_err(|_| StatsError::StorePoisoned(venue.clone()))?;
                *tables = VenueTables::default();
            }
        }
        for (venue, restored) in venues {
            let partition = self.partition(&venue);
            let mut tables = partition
                .lock()
                .map_err(|_| StatsError::StorePoisoned(venue.clone()))?;
            *tables = restored;
        }
        Ok(())
    }
}

impl StatsStore for InMemoryStore {
    fn transact<R>(
        &self,
        venue: &VenueId,
        work: impl FnOnce(&mut VenueTxn<'_>) -> Result<R, StatsError>,
    ) -> Result<R, StatsError> {
        let partition = self.partition(venue);
        let mut tables = partition
            .lock()
            .map_err(|_| StatsError::StorePoisoned(venue.clone()))?;

        let (result, writes) = {
            let mut txn = VenueTxn::begin(venue.clone(), &tables);
            let result = work(&mut txn)?;
            (result, txn.into_writes())
        };
        writes.apply(&mut tables);
        Ok(result)
    }

    fn read<R>(&self, venue: &VenueId, view: impl FnOnce(&VenueTables) -> R) -> Result<R, StatsError> {
        let partition = match self.partitions.get(venue) {
            Some(entry) => Arc::clone(entry.value()),
            None => return Ok(view(&VenueTables::default())),
        };
        let tables = partition
            .lock()
            .map_err(|_| StatsError::StorePoisoned(venue.clone()))?;
        Ok(view(&tables))
    }

    fn venues(&self) -> Vec<VenueId> {
        let mut venues: Vec<VenueId> = self
            .partitions
            .iter()
            .filter(|entry| entry.value().lock().map(|t| !t.is_empty()).unwrap_or(false))
            .map(|entry| entry.key().clone())
            .collect();
        venues.sort();
        venues
    }
}
