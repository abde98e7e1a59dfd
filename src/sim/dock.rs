//! The dock: a bounded, ordered buffer of collected piece types
//!
//! After each insertion the dock clears exactly three of the first type
//! (in ascending type order) that has reached three. A full dock with no
//! match is an overflow, which loses the game.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::TypeId;
use crate::consts::MATCH_COUNT;

/// Result of inserting into the dock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchOutcome {
    /// Three of this type were cleared
    Matched(TypeId),
    /// Dock is at capacity without a match
    Overflow,
    NoMatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dock {
    slots: Vec<TypeId>,
    capacity: usize,
}

impl Dock {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn has_room(&self) -> bool {
        self.slots.len() < self.capacity
    }

    /// Entries in insertion order
    pub fn slots(&self) -> &[TypeId] {
        &self.slots
    }

    pub fn last(&self) -> Option<TypeId> {
        self.slots.last().copied()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Occurrences of each type, ascending by type
    pub fn counts(&self) -> BTreeMap<TypeId, usize> {
        let mut counts = BTreeMap::new();
        for t in &self.slots {
            *counts.entry(*t).or_insert(0) += 1;
        }
        counts
    }

    /// Append a type and run the match check.
    ///
    /// Callers check `has_room` first; inserting into a full dock reports
    /// `Overflow` without changing it.
    pub fn insert(&mut self, type_id: TypeId) -> MatchOutcome {
        if !self.has_room() {
            return MatchOutcome::Overflow;
        }
        self.slots.push(type_id);

        let matched = self
            .counts()
            .into_iter()
            .find(|(_, n)| *n >= MATCH_COUNT)
            .map(|(t, _)| t);

        if let Some(t) = matched {
            self.remove_first(t, MATCH_COUNT);
            return MatchOutcome::Matched(t);
        }

        if self.slots.len() == self.capacity {
            MatchOutcome::Overflow
        } else {
            MatchOutcome::NoMatch
        }
    }

    /// Pop up to `n` entries from the tail, most recent first
    pub fn pop_last(&mut self, n: usize) -> Vec<TypeId> {
        let keep = self.slots.len().saturating_sub(n);
        let mut popped = self.slots.split_off(keep);
        popped.reverse();
        popped
    }

    /// Remove the first `n` occurrences of a type, keeping everything else
    /// in order
    fn remove_first(&mut self, type_id: TypeId, n: usize) {
        let mut remaining = n;
        self.slots.retain(|t| {
            if remaining > 0 && *t == type_id {
                remaining -= 1;
                false
            } else {
                true
            }
        });
    }
}
