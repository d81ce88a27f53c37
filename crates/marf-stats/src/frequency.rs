//! Frequency counting with dense frequency ranks.
//!
//! A [`FrequencyTable`] counts how often each key was observed. Calling
//! [`FrequencyTable::rank()`] orders the entries by descending frequency and assigns ranks
//! `1..=N`; ties keep the order in which the keys were first observed. The table is the
//! statistical model behind Zipf's law classification, where the rank/frequency profile of
//! an unseen input is compared against the profile accumulated during training.
//!
//! Entries keep insertion order until ranked, so the table can be persisted and restored
//! without losing its tie-break order.

use std::{collections::HashMap, hash::Hash};

use serde::{Deserialize, Serialize};

/// Occurrence statistics of a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry<K> {
    key: K,
    frequency: u64,
    rank: usize,
}

impl<K> FrequencyEntry<K> {
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[must_use]
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Dense rank by descending frequency, starting at 1; 0 until the table is ranked.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }
}

/// Frequency counts keyed by observed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyTable<K> {
    entries: Vec<FrequencyEntry<K>>,
    #[serde(skip, default = "HashMap::new")]
    index: HashMap<K, usize>,
}

impl<K> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K> FrequencyTable<K>
where
    K: Eq + Hash + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `key`.
    pub fn observe(&mut self, key: K) {
        self.ensure_index();
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].frequency += 1;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push(FrequencyEntry {
                key,
                frequency: 1,
                rank: 0,
            });
        }
    }

    pub fn observe_all<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        for key in keys {
            self.observe(key);
        }
    }

    /// Sorts entries by descending frequency and assigns ranks `1..=N`.
    pub fn rank(&mut self) {
        self.entries.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
        self.rebuild_index();
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&FrequencyEntry<K>> {
        match self.index.get(key) {
            Some(&i) => self.entries.get(i),
            None => self.entries.iter().find(|e| e.key == *key),
        }
    }

    fn ensure_index(&mut self) {
        if self.index.len() != self.entries.len() {
            self.rebuild_index();
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.key.clone(), i))
            .collect();
    }
}

impl<K> FrequencyTable<K> {
    /// Entries in rank order (insertion order before the first [`rank()`](Self::rank)).
    #[must_use]
    pub fn entries(&self) -> &[FrequencyEntry<K>] {
        &self.entries
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of observations.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.frequency).sum()
    }

    /// Relative frequency of every entry, in entry order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn proportions(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.entries
            .iter()
            .map(|e| e.frequency as f64 / total)
            .collect()
    }

    /// How many keys occur exactly `f` times, for `f` in `1..=max_frequency`.
    ///
    /// Keys more frequent than `max_frequency` are not counted.
    #[must_use]
    pub fn frequency_of_frequencies(&self, max_frequency: usize) -> Vec<usize> {
        let mut counts = vec![0; max_frequency];
        for entry in &self.entries {
            if let Ok(f) = usize::try_from(entry.frequency)
                && (1..=max_frequency).contains(&f)
            {
                counts[f - 1] += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ties_keep_first_observation_order() {
        let mut table = FrequencyTable::new();
        table.observe_all([3, 1, 2, 1, 2]);
        table.rank();
        let keys = table.entries().iter().map(|e| *e.key()).collect::<Vec<_>>();
        assert_eq!(keys, [1, 2, 3]);
        assert_eq!(table.get(&3).unwrap().rank(), 3);
        assert_eq!(table.get(&1).unwrap().frequency(), 2);
    }

    #[test]
    fn test_unranked_entries_have_rank_zero() {
        let mut table = FrequencyTable::new();
        table.observe("x");
        assert_eq!(table.entries()[0].rank(), 0);
        table.rank();
        assert_eq!(table.entries()[0].rank(), 1);
    }

    #[test]
    fn test_proportions_follow_rank_order() {
        let mut table = FrequencyTable::new();
        table.observe_all(['a', 'b', 'b', 'b']);
        table.rank();
        assert_eq!(table.total(), 4);
        assert_eq!(table.proportions(), [0.75, 0.25]);
    }

    #[test]
    fn test_frequency_of_frequencies() {
        let mut table = FrequencyTable::new();
        table.observe_all([1, 2, 2, 3, 3, 4, 4, 4, 4]);
        assert_eq!(table.frequency_of_frequencies(3), [1, 2, 0]);
    }

    #[test]
    fn test_index_is_rebuilt_after_deserialization() {
        let mut table = FrequencyTable::new();
        table.observe_all(["a", "b", "a"]);
        let bytes = bincode::serialize(&table).unwrap();
        let mut restored: FrequencyTable<String> = bincode::deserialize(&bytes).unwrap();
        restored.observe("a".to_owned());
        restored.observe("c".to_owned());
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.get(&"a".to_owned()).unwrap().frequency(), 3);
    }
}
