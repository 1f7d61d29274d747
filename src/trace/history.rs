//! Undo/redo command history

use crate::trace::operation::Operation;
use std::collections::VecDeque;

/// The default number of transactions kept for undo.
pub const DEFAULT_UNDO_LIMIT: usize = 50;

/// The composite command produced by one committed transaction.
#[derive(Clone, Debug)]
pub(crate) struct Command {
    pub description: String,
    pub ops: Vec<Operation>,
}

/// Bounded undo and redo stacks of committed transactions.
///
/// Recording a new command discards everything that could have been redone;
/// once the undo stack reaches its limit the oldest command is forgotten.
#[derive(Debug)]
pub(crate) struct History {
    undo: VecDeque<Command>,
    redo: Vec<Command>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        History {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    pub fn record(&mut self, command: Command) {
        self.redo.clear();

        if self.limit == 0 {
            return;
        }

        while self.undo.len() >= self.limit {
            self.undo.pop_front();
        }

        self.undo.push_back(command);
    }

    pub fn take_undo(&mut self) -> Option<Command> {
        self.undo.pop_back()
    }

    pub fn take_redo(&mut self) -> Option<Command> {
        self.redo.pop()
    }

    /// Put back a command that was just undone, so it can be redone.
    pub fn push_redo(&mut self, command: Command) {
        self.redo.push(command);
    }

    /// Put back a command that was just redone, so it can be undone again.
    ///
    /// Unlike `record`, this leaves the redo stack alone.
    pub fn push_undo(&mut self, command: Command) {
        self.undo.push_back(command);
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo.back().map(|c| c.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo.last().map(|c| c.description.as_str())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
