//! `Correlations` — the mapping from a network reply stream id to the
//! `ReplyHandler` awaiting the application's first BEGIN.
//!
//! Modeled after `h2::proto::streams::store::Store`'s `id -> slot` map, but
//! without the slab/linked-list machinery `Store` needs for priority
//! scheduling: entries here are only ever point-inserted and
//! point-removed, so a plain `HashMap` is the whole story.

use std::collections::HashMap;

/// Owns at most one pending handler per `connectReplyId`.
#[derive(Debug, Default)]
pub struct Correlations<T> {
    entries: HashMap<u64, T>,
}

impl<T> Correlations<T> {
    pub fn new() -> Self {
        Correlations {
            entries: HashMap::new(),
        }
    }

    /// Inserts the entry for `connect_reply_id`.
    ///
    /// # Panics
    /// Panics in debug builds if an entry already exists for this id — the
    /// spec requires at most one correlation entry per id at any moment,
    /// and a duplicate indicates the id supplier handed out a stream id
    /// that's still in flight.
    pub fn insert(&mut self, connect_reply_id: u64, value: T) {
        let prev = self.entries.insert(connect_reply_id, value);
        debug_assert!(prev.is_none(), "duplicate correlation entry");
    }

    /// Removes and returns the entry for `connect_reply_id`, if any.
    pub fn remove(&mut self, connect_reply_id: u64) -> Option<T> {
        self.entries.remove(&connect_reply_id)
    }

    pub fn contains(&self, connect_reply_id: u64) -> bool {
        self.entries.contains_key(&connect_reply_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
