//! Per-date cache of opened cloud grids
//!
//! Each calendar day's grid is opened once and handed out as an
//! `Arc<CloudGrid>` to every query for that day. The cache keeps at most
//! `capacity` days; the least recently used day is dropped first. A dropped
//! grid stays alive until the last walk holding its `Arc` finishes.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::dataset::CloudGrid;
use super::opener::GridOpener;
use crate::error::Result;

/// Cache counters, reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub opens: u64,
    pub evictions: u64,
}

struct CacheInner {
    grids: FxHashMap<NaiveDate, Arc<CloudGrid>>,
    /// Front = least recently used
    recency: VecDeque<NaiveDate>,
    stats: CacheStats,
}

impl CacheInner {
    fn touch(&mut self, date: NaiveDate) {
        if let Some(pos) = self.recency.iter().position(|d| *d == date) {
            self.recency.remove(pos);
        }
        self.recency.push_back(date);
    }
}

/// Thread-safe LRU cache of daily cloud grids
pub struct GridCache {
    opener: Box<dyn GridOpener>,
    capacity: NonZeroUsize,
    inner: Mutex<CacheInner>,
}

impl GridCache {
    pub fn new(opener: Box<dyn GridOpener>, capacity: NonZeroUsize) -> Self {
        Self {
            opener,
            capacity,
            inner: Mutex::new(CacheInner {
                grids: FxHashMap::default(),
                recency: VecDeque::with_capacity(capacity.get()),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Grid for `date`, opening it on first use.
    ///
    /// Opening happens under the cache lock so concurrent walks never load
    /// the same day twice. Failed opens are not cached.
    ///
    /// # Errors
    /// Propagates the opener's error.
    pub fn get(&self, date: NaiveDate) -> Result<Arc<CloudGrid>> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(grid) = inner.grids.get(&date).cloned() {
            inner.stats.hits += 1;
            inner.touch(date);
            return Ok(grid);
        }

        let grid = Arc::new(self.opener.open(date)?);
        inner.stats.opens += 1;
        debug!("Opened cloud grid for {}", date);

        while inner.grids.len() >= self.capacity.get() {
            let Some(oldest) = inner.recency.pop_front() else {
                break;
            };
            inner.grids.remove(&oldest);
            inner.stats.evictions += 1;
            debug!("Evicted cloud grid for {}", oldest);
        }

        inner.grids.insert(date, Arc::clone(&grid));
        inner.touch(date);
        Ok(grid)
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Number of days currently held
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .grids
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .grids
            .contains_key(&date)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
    }
}

impl std::fmt::Debug for GridCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
