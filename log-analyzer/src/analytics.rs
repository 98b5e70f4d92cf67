use std::{cmp::Reverse, collections::HashMap, hash::Hash};

use crate::{
    invariants::{RequestPath, SourceAddr, StatusCode},
    models::LogRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    count: u64,
    first_seen: usize,
}

/// Counter map that remembers the order in which keys first appeared.
#[derive(Debug, Clone)]
struct Tally<K> {
    slots: HashMap<K, Slot>,
    next_ordinal: usize,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            next_ordinal: 0,
        }
    }
}

impl<K: Eq + Hash + Clone> Tally<K> {
    fn add(&mut self, key: &K, count: u64) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.count += count;
            return;
        }
        self.slots.insert(
            key.clone(),
            Slot {
                count,
                first_seen: self.next_ordinal,
            },
        );
        self.next_ordinal += 1;
    }

    fn get(&self, key: &K) -> u64 {
        self.slots.get(key).map_or(0, |slot| slot.count)
    }

    /// Count descending, first-seen ascending.
    fn ranked(&self) -> Vec<(&K, u64)> {
        let mut entries: Vec<_> = self.slots.iter().collect();
        entries.sort_unstable_by_key(|(_, slot)| (Reverse(slot.count), slot.first_seen));
        entries.into_iter().map(|(k, slot)| (k, slot.count)).collect()
    }

    fn merge(&mut self, other: &Self) {
        let mut incoming: Vec<_> = other.slots.iter().collect();
        incoming.sort_unstable_by_key(|(_, slot)| slot.first_seen);
        for (key, slot) in incoming {
            self.add(key, slot.count);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    total: u64,
    bytes_served: u64,
    statuses: HashMap<StatusCode, u64>,
    sources: Tally<SourceAddr>,
    paths: Tally<RequestPath>,
}

impl Aggregate {
    pub fn record(&mut self, record: &LogRecord) {
        let request = record.request();
        self.total += 1;
        self.sources.add(&request.source, 1);
        self.paths.add(&request.path, 1);
        if let Some(status) = request.status {
            *self.statuses.entry(status).or_default() += 1;
        }
        if let Some(bytes) = request.size.and_then(|size| size.bytes()) {
            self.bytes_served = self.bytes_served.saturating_add(bytes);
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Sum of every known response size, saturating at `u64::MAX`.
    pub fn bytes_served(&self) -> u64 {
        self.bytes_served
    }

    /// Status distribution ordered by count descending, then code ascending.
    pub fn status_counts(&self) -> Vec<(StatusCode, u64)> {
        let mut entries: Vec<_> = self.statuses.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_unstable_by_key(|(code, count)| (Reverse(*count), *code));
        entries
    }

    pub fn status_count(&self, code: u16) -> u64 {
        StatusCode::try_from(code)
            .ok()
            .and_then(|code| self.statuses.get(&code).copied())
            .unwrap_or(0)
    }

    pub fn source_count(&self, source: &str) -> u64 {
        self.sources.get(&source.into())
    }

    pub fn path_count(&self, path: &str) -> u64 {
        self.paths.get(&path.into())
    }

    pub fn ranked_sources(&self) -> Vec<(String, u64)> {
        self.sources
            .ranked()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    pub fn top_sources(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries = self.ranked_sources();
        entries.truncate(n);
        entries
    }

    pub fn top_paths(&self, n: usize) -> Vec<(String, u64)> {
        self.paths
            .ranked()
            .into_iter()
            .take(n)
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    /// Folds a shard produced from other input into this one. Keys new to
    /// `self` rank after existing keys on ties, in `other`'s first-seen order.
    pub fn merge(&mut self, other: &Aggregate) {
        self.total += other.total;
        self.bytes_served = self.bytes_served.saturating_add(other.bytes_served);
        for (code, count) in &other.statuses {
            *self.statuses.entry(*code).or_default() += count;
        }
        self.sources.merge(&other.sources);
        self.paths.merge(&other.paths);
    }
}

/// Sources whose share of all parsed records is strictly greater than
/// `threshold_fraction`, busiest first, ties in first-seen order.
pub fn suspicious_sources(aggregate: &Aggregate, threshold_fraction: f64) -> Vec<(String, u64)> {
    if aggregate.is_empty() {
        return Vec::new();
    }
    let total = aggregate.total() as f64;
    aggregate
        .ranked_sources()
        .into_iter()
        .filter(|(_, count)| *count as f64 / total > threshold_fraction)
        .collect()
}
