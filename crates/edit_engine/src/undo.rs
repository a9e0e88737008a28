//! Undo/redo history built from inverse commands

use crate::{Command, CommandGroup, EditError, HistoryDirection, Result};

/// Default maximum number of undo entries
pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// An entry in the undo or redo stack
#[derive(Debug)]
pub struct UndoEntry {
    /// Action name shown in menus ("Undo Rotate Page")
    pub label: String,
    /// The command that reverses (undo stack) or replays (redo stack) the edit
    pub command: Box<dyn Command>,
}

#[derive(Debug)]
struct OpenGroup {
    label: String,
    depth: usize,
    inverses: Vec<Box<dyn Command>>,
}

/// Manages undo and redo stacks.
///
/// History is linear: recording a new edit clears the redo stack. Edits are
/// never merged unless a group is opened explicitly.
#[derive(Debug)]
pub struct UndoManager {
    /// Stack of commands that can be undone
    undo_stack: Vec<UndoEntry>,
    /// Stack of commands that can be redone
    redo_stack: Vec<UndoEntry>,
    /// Maximum number of undo entries
    max_entries: usize,
    /// Edits being collected into a single step
    group: Option<OpenGroup>,
}

impl UndoManager {
    /// Create a new undo manager
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_UNDO_LIMIT)
    }

    /// Create with a custom depth limit
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
            group: None,
        }
    }

    /// Record the inverse of a new edit
    pub fn record(&mut self, inverse: Box<dyn Command>, label: impl Into<String>) {
        self.redo_stack.clear();

        if let Some(group) = self.group.as_mut() {
            group.inverses.push(inverse);
            return;
        }

        self.push_undo(UndoEntry { label: label.into(), command: inverse });
    }

    fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);

        // Enforce max entries
        if self.undo_stack.len() > self.max_entries {
            let excess = self.undo_stack.len() - self.max_entries;
            self.undo_stack.drain(..excess);
        }
    }

    /// Pop the last entry for undo
    pub fn pop_undo(&mut self) -> Result<UndoEntry> {
        self.undo_stack.pop().ok_or(EditError::EmptyHistory(HistoryDirection::Undo))
    }

    /// Pop the last undone entry for redo
    pub fn pop_redo(&mut self) -> Result<UndoEntry> {
        self.redo_stack.pop().ok_or(EditError::EmptyHistory(HistoryDirection::Redo))
    }

    /// Store the command that replays an edit that was just undone
    pub fn push_redo(&mut self, label: String, command: Box<dyn Command>) {
        self.redo_stack.push(UndoEntry { label, command });
    }

    /// Store the inverse of an edit that was just redone, keeping the redo stack
    pub fn push_undo_after_redo(&mut self, label: String, inverse: Box<dyn Command>) {
        self.push_undo(UndoEntry { label, command: inverse });
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_action_name(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label.as_str())
    }

    pub fn redo_action_name(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label.as_str())
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Start collecting edits into one undo step. Nested calls join the
    /// outermost group.
    pub fn begin_group(&mut self, label: impl Into<String>) {
        match self.group.as_mut() {
            Some(group) => group.depth += 1,
            None => {
                self.group = Some(OpenGroup { label: label.into(), depth: 1, inverses: Vec::new() })
            }
        }
    }

    /// Close the current group; the outermost close records the step.
    /// Returns `true` if a step was recorded.
    pub fn end_group(&mut self) -> Result<bool> {
        let group = self
            .group
            .as_mut()
            .ok_or_else(|| EditError::InvalidCommand("no undo group is open".to_string()))?;

        group.depth -= 1;
        if group.depth > 0 {
            return Ok(false);
        }

        let Some(OpenGroup { label, mut inverses, .. }) = self.group.take() else {
            return Ok(false);
        };
        if inverses.is_empty() {
            return Ok(false);
        }

        inverses.reverse();
        let command = Box::new(CommandGroup::new(label.clone(), inverses));
        self.push_undo(UndoEntry { label, command });
        Ok(true)
    }

    pub fn in_group(&self) -> bool {
        self.group.is_some()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.group = None;
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
