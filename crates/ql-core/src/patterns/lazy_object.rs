//! Lazily recomputed results.
//!
//! A [`LazyCache`] remembers the last value it computed together with the
//! stamp of the inputs it was computed from.  Asking for the value with a
//! different stamp recomputes it; asking again with the same stamp returns the
//! cached copy.  Nothing is pushed to the cache when inputs change: staleness
//! is discovered on the next read, which is how relinking a curve handle
//! invalidates bond valuations.

use crate::errors::Result;
use std::sync::{Mutex, PoisonError};

/// A single-slot cache keyed by an input stamp.
#[derive(Debug)]
pub struct LazyCache<K, T> {
    slot: Mutex<Option<(K, T)>>,
}

impl<K, T> LazyCache<K, T>
where
    K: PartialEq + Clone,
    T: Clone,
{
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value for `stamp`, computing it with `f` if the cache
    /// is empty or was filled under a different stamp.
    ///
    /// A failed computation leaves the cache empty.
    pub fn get_or_try_compute<F>(&self, stamp: &K, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        {
            let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((cached_stamp, value)) = slot.as_ref() {
                if cached_stamp == stamp {
                    tracing::trace!("lazy cache hit");
                    return Ok(value.clone());
                }
            }
        }
        tracing::trace!("lazy cache miss");
        let computed = f();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        match computed {
            Ok(value) => {
                *slot = Some((stamp.clone(), value.clone()));
                Ok(value)
            }
            Err(e) => {
                *slot = None;
                Err(e)
            }
        }
    }

    /// Return `true` if the cache holds a value computed under `stamp`.
    pub fn is_valid_for(&self, stamp: &K) -> bool {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(slot.as_ref(), Some((s, _)) if s == stamp)
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = None;
    }
}

impl<K, T> Default for LazyCache<K, T>
where
    K: PartialEq + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> Clone for LazyCache<K, T>
where
    K: PartialEq + Clone,
    T: Clone,
{
    /// Clones start empty; a copied instrument recomputes on first use.
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use std::cell::Cell;

    #[test]
    fn computes_once_per_stamp() {
        let cache: LazyCache<u64, f64> = LazyCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(42.0)
        };
        assert_eq!(cache.get_or_try_compute(&1, compute).unwrap(), 42.0);
        assert_eq!(cache.get_or_try_compute(&1, compute).unwrap(), 42.0);
        assert_eq!(calls.get(), 1);
        assert!(cache.is_valid_for(&1));

        cache.get_or_try_compute(&2, compute).unwrap();
        assert_eq!(calls.get(), 2);
        assert!(!cache.is_valid_for(&1));
    }

    #[test]
    fn failure_leaves_cache_empty() {
        let cache: LazyCache<u64, f64> = LazyCache::new();
        cache.get_or_try_compute(&1, || Ok(1.0)).unwrap();
        let err = cache.get_or_try_compute(&2, || Err(Error::Runtime("boom".into())));
        assert!(err.is_err());
        assert!(!cache.is_valid_for(&1));
        assert!(!cache.is_valid_for(&2));
    }

    #[test]
    fn invalidate_forces_recompute() {
        let cache: LazyCache<u64, f64> = LazyCache::new();
        cache.get_or_try_compute(&7, || Ok(1.0)).unwrap();
        cache.invalidate();
        assert!(!cache.is_valid_for(&7));
        assert_eq!(cache.get_or_try_compute(&7, || Ok(2.0)).unwrap(), 2.0);
    }
}
