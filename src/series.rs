//! Rolling per-entity history of (limit, usage) pairs.
//!
//! Each entity owns two fixed-capacity ring buffers, one for CPU and one for
//! memory. Appending to a full buffer overwrites the oldest point.

use std::collections::HashMap;

/// Default number of points kept per series.
pub const DEFAULT_CAPACITY: usize = 100;

/// One sample of a metric at one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub limit: f64,
    pub usage: f64,
}

impl SeriesPoint {
    pub fn new(limit: f64, usage: f64) -> Self {
        Self { limit, usage }
    }
}

/// Fixed-capacity ring buffer of points in chronological order.
#[derive(Debug, Clone)]
pub struct RollingSeries {
    buf: Vec<SeriesPoint>,
    /// Index of the oldest point once the buffer is full.
    head: usize,
    capacity: usize,
}

static EMPTY: RollingSeries = RollingSeries::empty();

impl RollingSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            head: 0,
            capacity,
        }
    }

    const fn empty() -> Self {
        Self {
            buf: Vec::new(),
            head: 0,
            capacity: 0,
        }
    }

    /// Appends a point, evicting the oldest one when full.
    pub fn push(&mut self, point: SeriesPoint) {
        if self.capacity == 0 {
            return;
        }
        if self.buf.len() < self.capacity {
            self.buf.push(point);
        } else {
            self.buf[self.head] = point;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SeriesPoint> + '_ {
        let (newer, older) = self.buf.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Point at chronological position `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&SeriesPoint> {
        if index >= self.buf.len() {
            return None;
        }
        Some(&self.buf[(self.head + index) % self.buf.len()])
    }

    pub fn latest(&self) -> Option<&SeriesPoint> {
        self.iter().next_back()
    }

    pub fn to_vec(&self) -> Vec<SeriesPoint> {
        self.iter().copied().collect()
    }
}

/// CPU and memory history for one entity.
#[derive(Debug, Clone)]
pub struct EntitySeries {
    pub cpu: RollingSeries,
    pub mem: RollingSeries,
}

impl EntitySeries {
    fn new(capacity: usize) -> Self {
        Self {
            cpu: RollingSeries::with_capacity(capacity),
            mem: RollingSeries::with_capacity(capacity),
        }
    }
}

/// Rolling series for every entity seen so far, keyed by
/// [`MetricRecord::key`](crate::model::MetricRecord::key).
///
/// Entries for entities that disappear are not pruned; cardinality is bounded
/// by cluster size.
#[derive(Debug, Clone)]
pub struct RollingSeriesStore {
    entries: HashMap<String, EntitySeries>,
    capacity: usize,
}

impl Default for RollingSeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingSeriesStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    /// Appends one point to each of the entity's series.
    pub fn upsert(&mut self, key: &str, cpu: SeriesPoint, mem: SeriesPoint) {
        if !self.entries.contains_key(key) {
            self.entries
                .insert(key.to_string(), EntitySeries::new(self.capacity));
        }
        if let Some(entry) = self.entries.get_mut(key) {
            entry.cpu.push(cpu);
            entry.mem.push(mem);
        }
    }

    /// Returns `(cpu, mem)` series; both empty for unknown entities.
    pub fn get(&self, key: &str) -> (&RollingSeries, &RollingSeries) {
        match self.entries.get(key) {
            Some(entry) => (&entry.cpu, &entry.mem),
            None => (&EMPTY, &EMPTY),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entities with recorded history.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usages(series: &RollingSeries) -> Vec<f64> {
        series.iter().map(|p| p.usage).collect()
    }

    #[test]
    fn test_unknown_entity_is_empty() {
        let store = RollingSeriesStore::default();
        let (cpu, mem) = store.get("missing");
        assert!(cpu.is_empty());
        assert!(mem.is_empty());
    }

    #[test]
    fn test_length_tracks_min_of_upserts_and_bound() {
        let mut store = RollingSeriesStore::new(5);
        for n in 1..=12 {
            store.upsert("a", SeriesPoint::new(0.0, n as f64), SeriesPoint::new(0.0, 0.0));
            let (cpu, mem) = store.get("a");
            assert_eq!(cpu.len(), n.min(5));
            assert_eq!(mem.len(), n.min(5));
            let expected: Vec<f64> = ((n.saturating_sub(5) + 1)..=n).map(|v| v as f64).collect();
            assert_eq!(usages(cpu), expected);
        }
    }

    #[test]
    fn test_eviction_keeps_latest_hundred() {
        let mut store = RollingSeriesStore::new(100);
        for v in 1..=150 {
            store.upsert("a", SeriesPoint::new(200.0, v as f64), SeriesPoint::new(1.0, 1.0));
        }
        let (cpu, _) = store.get("a");
        assert_eq!(cpu.len(), 100);
        assert_eq!(cpu.get(0).map(|p| p.usage), Some(51.0));
        assert_eq!(cpu.get(99).map(|p| p.usage), Some(150.0));
        assert_eq!(cpu.latest().map(|p| p.usage), Some(150.0));
        assert!(cpu.get(100).is_none());
    }

    #[test]
    fn test_first_point_recorded() {
        let mut store = RollingSeriesStore::default();
        store.upsert("a", SeriesPoint::new(200.0, 100.0), SeriesPoint::new(100.0, 50.0));
        let (cpu, mem) = store.get("a");
        assert_eq!(cpu.to_vec(), vec![SeriesPoint::new(200.0, 100.0)]);
        assert_eq!(mem.to_vec(), vec![SeriesPoint::new(100.0, 50.0)]);
    }

    #[test]
    fn test_entities_are_independent() {
        let mut store = RollingSeriesStore::new(3);
        store.upsert("a", SeriesPoint::new(1.0, 1.0), SeriesPoint::new(1.0, 1.0));
        store.upsert("b", SeriesPoint::new(2.0, 2.0), SeriesPoint::new(2.0, 2.0));
        store.upsert("b", SeriesPoint::new(3.0, 3.0), SeriesPoint::new(3.0, 3.0));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").0.len(), 1);
        assert_eq!(store.get("b").0.len(), 2);
    }

    #[test]
    fn test_zero_capacity_records_nothing() {
        let mut series = RollingSeries::with_capacity(0);
        series.push(SeriesPoint::new(1.0, 1.0));
        assert!(series.is_empty());
    }
}
