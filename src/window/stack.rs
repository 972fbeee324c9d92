//! Front-to-back ordering of open window sessions
//!
//! The front session is the active, top-most floating window. Windows are
//! stored internally bottom-to-top so that bringing a window to the front is a
//! push onto the end of the vector.

use super::SessionId;
use std::collections::HashMap;

/// Ordered set of open window sessions.
///
/// Each id appears at most once. Pushing an id that is already present
/// promotes it to the front instead of duplicating it.
///
/// # Examples
///
/// ```
/// use floatd::window::{SessionId, WindowStack};
///
/// let mut stack = WindowStack::new();
/// stack.push(SessionId(1));
/// stack.push(SessionId(2));
///
/// assert_eq!(stack.front(), Some(SessionId(2)));
/// assert!(stack.is_front(SessionId(2)));
/// ```
#[derive(Debug, Clone)]
pub struct WindowStack {
    /// Sessions ordered from bottom to top
    windows: Vec<SessionId>,

    /// Fast lookup: session ID → index in `windows`
    positions: HashMap<SessionId, usize>,
}

impl WindowStack {
    /// Creates a new empty window stack.
    pub fn new() -> Self {
        Self {
            windows: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Creates a window stack with the specified initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            windows: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    /// Puts a session at the front of the stack.
    ///
    /// If the session is already present it is moved to the front.
    ///
    /// # Returns
    ///
    /// `true` if the session was newly inserted, `false` if it was promoted
    pub fn push(&mut self, id: SessionId) -> bool {
        let inserted = self.remove(id).is_none();
        self.positions.insert(id, self.windows.len());
        self.windows.push(id);
        inserted
    }

    /// Moves a session to the front; inserts it if absent.
    pub fn promote(&mut self, id: SessionId) {
        self.push(id);
    }

    /// Removes a session from the stack.
    ///
    /// # Returns
    ///
    /// `Some(position)` with the session's previous front-based position if
    /// found, `None` otherwise (the stack is left untouched)
    pub fn remove(&mut self, id: SessionId) -> Option<usize> {
        let index = self.positions.remove(&id)?;
        let position = self.windows.len() - 1 - index;
        self.windows.remove(index);
        self.rebuild_positions();
        Some(position)
    }

    /// Returns the front-most (active) session.
    pub fn front(&self) -> Option<SessionId> {
        self.windows.last().copied()
    }

    /// Returns the back-most session.
    pub fn back(&self) -> Option<SessionId> {
        self.windows.first().copied()
    }

    /// `true` iff `id` is the front session. Always `false` on an empty stack.
    pub fn is_front(&self, id: SessionId) -> bool {
        self.front() == Some(id)
    }

    /// Returns an iterator over sessions in front-to-back order.
    pub fn iter(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.windows.iter().rev().copied()
    }

    /// Sessions in front-to-back order.
    pub fn to_vec(&self) -> Vec<SessionId> {
        self.iter().collect()
    }

    /// Returns the number of sessions in the stack.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Returns `true` if the stack contains no sessions.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Checks if a session is in the stack.
    pub fn contains(&self, id: SessionId) -> bool {
        self.positions.contains_key(&id)
    }

    /// Returns the position of a session, 0 being the front.
    pub fn position(&self, id: SessionId) -> Option<usize> {
        self.positions
            .get(&id)
            .map(|&index| self.windows.len() - 1 - index)
    }

    /// Clears all sessions from the stack.
    pub fn clear(&mut self) {
        self.windows.clear();
        self.positions.clear();
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, &id) in self.windows.iter().enumerate() {
            self.positions.insert(id, i);
        }
    }
}

impl Default for WindowStack {
    fn default() -> Self {
        Self::new()
    }
}
