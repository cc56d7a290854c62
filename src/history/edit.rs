use std::collections::VecDeque;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Linear undo/redo history around a current value.
///
/// A new edit pushes the current value onto the undo stack and invalidates redo. When the undo
/// stack is full the oldest entry is dropped. Undo and redo on an empty stack do nothing.
#[derive(Clone, Debug)]
pub struct EditHistory<T> {
    current: T,
    undo: VecDeque<T>,
    redo: Vec<T>,
    capacity: usize,
}

impl<T> EditHistory<T> {
    /// History starting at `initial` with [`DEFAULT_HISTORY_CAPACITY`] undo steps.
    pub fn new(initial: T) -> Self {
        Self::with_capacity(initial, DEFAULT_HISTORY_CAPACITY)
    }

    /// History keeping at most `capacity` undo steps (at least one).
    pub fn with_capacity(initial: T, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            current: initial,
            undo: VecDeque::with_capacity(capacity),
            redo: Vec::new(),
            capacity,
        }
    }

    /// The current value.
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Record a new edit: `next` becomes current.
    pub fn snapshot(&mut self, next: T) {
        let prev = std::mem::replace(&mut self.current, next);
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(prev);
        self.redo.clear();
    }

    /// Step back one edit and return the new current value, or `None` if there is nothing to
    /// undo.
    pub fn undo(&mut self) -> Option<&T> {
        let prev = self.undo.pop_back()?;
        let cur = std::mem::replace(&mut self.current, prev);
        self.redo.push(cur);
        Some(&self.current)
    }

    /// Re-apply the last undone edit and return the new current value, or `None` if there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Option<&T> {
        let next = self.redo.pop()?;
        let cur = std::mem::replace(&mut self.current, next);
        if self.undo.len() == self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(cur);
        Some(&self.current)
    }

    /// Return `true` when [`EditHistory::undo`] would do something.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Return `true` when [`EditHistory::redo`] would do something.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undo steps available.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps available.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Maximum number of undo steps kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget every undo and redo step, keeping the current value.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/edit.rs"]
mod tests;
