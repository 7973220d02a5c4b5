//! Historical fixings: the `FixingSource` seam and the in-memory
//! `FixingStore`.

use ql_core::errors::{Error, Result};
use ql_core::Real;
use ql_time::Date;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Anything that can report past fixings of named indexes.
pub trait FixingSource: std::fmt::Debug + Send + Sync {
    /// The stored fixing of `index_id` on `date`, if any.
    fn get(&self, index_id: &str, date: Date) -> Option<Real>;

    /// The stored fixing of `index_id` on `date`.
    ///
    /// # Errors
    /// [`Error::MissingFixing`] when no fixing is stored.
    fn fixing_at(&self, index_id: &str, date: Date) -> Result<Real> {
        self.get(index_id, date).ok_or_else(|| Error::MissingFixing {
            index: index_id.to_owned(),
            date: date.to_string(),
        })
    }

    /// Stamp that changes whenever the stored fixings change.  Sources that
    /// never change may keep the default.
    fn version(&self) -> u64 {
        0
    }
}

/// Thread-safe store of fixings keyed by index name and date.
///
/// Clones share the same data, so one store can be handed to several
/// indexes and filled afterwards.
#[derive(Debug, Clone, Default)]
pub struct FixingStore {
    data: Arc<RwLock<HashMap<String, BTreeMap<Date, Real>>>>,
    version: Arc<AtomicU64>,
}

impl FixingStore {
    /// Create a new, empty fixing store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or overwrite) a fixing.
    pub fn add(&self, index_id: &str, date: Date, value: Real) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(index_id.to_owned())
            .or_default()
            .insert(date, value);
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    /// All fixings of one index in date order.
    pub fn history(&self, index_id: &str) -> Vec<(Date, Real)> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index_id)
            .map(|h| h.iter().map(|(&d, &v)| (d, v)).collect())
            .unwrap_or_default()
    }

    /// Number of stored fixings across all indexes.
    pub fn len(&self) -> usize {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(BTreeMap::len)
            .sum()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every fixing of `index_id`.
    pub fn clear_history(&self, index_id: &str) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(index_id);
        self.version.fetch_add(1, Ordering::Relaxed);
    }
}

impl FixingSource for FixingStore {
    fn get(&self, index_id: &str, date: Date) -> Option<Real> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index_id)
            .and_then(|h| h.get(&date).copied())
    }

    fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }
}
