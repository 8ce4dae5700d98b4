//! Bounded undo/redo over full-resolution mask snapshots
//!
//! History is linear: committing after an undo abandons the redo branch.
//! Once the number of entries exceeds the capacity the oldest entry is evicted
//! and the current index stays where it is, so the newest commit remains the
//! current state while the retained undo depth never grows past `capacity`.

use crate::{config::validate_history_capacity, error::Result, types::HistoryEntry};
use std::collections::VecDeque;
use tracing::trace;

/// Undo/redo stack of mask snapshots
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    index: Option<usize>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
            index: None,
            capacity: crate::config::DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl HistoryStore {
    /// Create an empty store holding at most `capacity` entries
    ///
    /// # Errors
    /// - `InvalidConfig` when `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        validate_history_capacity(capacity)?;
        Ok(Self {
            entries: VecDeque::with_capacity(capacity + 1),
            index: None,
            capacity,
        })
    }

    /// Record a new current state
    pub fn commit(&mut self, entry: HistoryEntry) {
        if let Some(index) = self.index {
            self.entries.truncate(index + 1);
        }

        self.entries.push_back(entry);

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            trace!(capacity = self.capacity, "Evicted oldest history entry");
        } else {
            self.index = Some(self.index.map_or(0, |index| index + 1));
        }
    }

    /// Step back one entry, returning the new current state
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        match self.index {
            Some(index) if index > 0 => {
                self.index = Some(index - 1);
                self.entries.get(index - 1)
            },
            _ => None,
        }
    }

    /// Step forward one entry, returning the new current state
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let index = self.index?;
        if index + 1 < self.entries.len() {
            self.index = Some(index + 1);
            self.entries.get(index + 1)
        } else {
            None
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|index| index > 0)
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|index| index + 1 < self.entries.len())
    }

    /// Entry representing the current on-screen state
    #[must_use]
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.index.and_then(|index| self.entries.get(index))
    }

    /// Current position, `None` before the first commit
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry at `position`, oldest first
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&HistoryEntry> {
        self.entries.get(position)
    }

    /// Bytes held by all retained snapshots
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.entries.iter().map(HistoryEntry::size_bytes).sum()
    }
}
