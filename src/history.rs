// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Structura and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bounded, most-recent-first list of past topic results.
//!
//! Entries are unique by topic: adding a topic that is already present moves it to the front.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::model::TopicResult;

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    capacity: usize,
    entries: VecDeque<Arc<TopicResult>>,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    /// Rebuilds a history from entries listed most-recent-first.
    ///
    /// Later duplicates of a topic and entries beyond the capacity are dropped.
    pub fn from_entries(capacity: usize, entries: impl IntoIterator<Item = Arc<TopicResult>>) -> Self {
        let mut history = Self::with_capacity(capacity);
        for entry in entries {
            if history.entries.len() == history.capacity {
                break;
            }
            if history.position(entry.topic()).is_none() {
                history.entries.push_back(entry);
            }
        }
        history
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TopicResult>> + '_ {
        self.entries.iter()
    }

    pub fn get(&self, topic: &str) -> Option<&Arc<TopicResult>> {
        self.position(topic).map(|idx| &self.entries[idx])
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.position(topic).is_some()
    }

    /// Puts `result` at the front, replacing any entry with the same topic.
    pub fn add(&mut self, result: Arc<TopicResult>) {
        if let Some(idx) = self.position(result.topic()) {
            self.entries.remove(idx);
        }
        self.entries.push_front(result);
        self.entries.truncate(self.capacity);
    }

    /// Removes the entry for `topic`; returns whether one was present.
    pub fn remove(&mut self, topic: &str) -> bool {
        match self.position(topic) {
            Some(idx) => self.entries.remove(idx).is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, topic: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.topic() == topic)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::{History, HISTORY_CAPACITY};
    use crate::model::{Step, TopicResult};

    fn result(topic: &str) -> Arc<TopicResult> {
        let step = Step::new(1, "Intro", "", Vec::new());
        Arc::new(TopicResult::new(topic, vec![step], "graph TD; A --> B").expect("valid result"))
    }

    fn topics(history: &History) -> Vec<String> {
        history.iter().map(|entry| entry.topic().to_owned()).collect()
    }

    #[test]
    fn add_prepends_and_moves_existing_topic_to_front() {
        let mut history = History::new();
        history.add(result("a"));
        history.add(result("b"));
        history.add(result("a"));
        assert_eq!(topics(&history), ["a", "b"]);
    }

    #[test]
    fn eleventh_topic_evicts_the_oldest() {
        let mut history = History::new();
        for idx in 0..=HISTORY_CAPACITY {
            history.add(result(&format!("topic {idx}")));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert!(!history.contains("topic 0"));
        assert_eq!(topics(&history)[0], "topic 10");
    }

    #[test]
    fn remove_and_clear() {
        let mut history = History::new();
        history.add(result("a"));
        history.add(result("b"));

        assert!(history.remove("a"));
        assert!(!history.remove("missing"));
        assert_eq!(topics(&history), ["b"]);

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn from_entries_normalizes_persisted_lists() {
        let entries = ["a", "b", "a", "c"].map(result);
        let history = History::from_entries(2, entries);
        assert_eq!(topics(&history), ["a", "b"]);
    }

    proptest! {
        #[test]
        fn adds_keep_history_bounded_and_unique(ops in prop::collection::vec(0u8..16, 0..64)) {
            let mut history = History::new();
            for op in &ops {
                let topic = format!("topic {op}");
                history.add(result(&topic));

                prop_assert!(history.len() <= HISTORY_CAPACITY);
                let unique = history.iter().map(|entry| entry.topic()).collect::<BTreeSet<_>>();
                prop_assert_eq!(unique.len(), history.len());
                prop_assert_eq!(history.iter().next().map(|entry| entry.topic()), Some(topic.as_str()));
            }
        }
    }
}
