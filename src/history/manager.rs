use log::debug;

use super::command::Command;
use crate::store::CurveStore;

/// Maximum number of history entries. Older entries are evicted once the
/// list overflows; their states become unreachable, an accepted loss of
/// undo depth rather than an error.
pub const MAX_HISTORY: usize = 100;

/// Bounded undo/redo history. Executes commands against the store,
/// truncates the redo tail on new work and opportunistically merges a
/// new command into the current top entry (point drags, overlapping
/// smooths) so one user gesture stays one undo step.
pub struct CommandManager {
    commands: Vec<Box<dyn Command>>,
    // Number of applied commands; the redo tail starts here.
    cursor: usize,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandManager {
    pub fn new() -> Self {
        CommandManager {
            commands: Vec::new(),
            cursor: 0,
        }
    }

    /// Run a command. On success it becomes the new top of history; on
    /// failure it is discarded and the history is unchanged.
    pub fn execute_command(&mut self, mut command: Box<dyn Command>, store: &mut CurveStore) -> bool {
        if !command.execute(store) {
            debug!("Command '{}' failed, discarded", command.name());
            return false;
        }

        // New work invalidates anything that was undone.
        self.commands.truncate(self.cursor);

        if let Some(top) = self.commands.last_mut() {
            if top.can_merge_with(command.as_ref()) {
                debug!("Merging '{}' into '{}'", command.name(), top.name());
                top.merge_with(command);
                return true;
            }
        }

        debug!("Executed '{}'", command.name());
        self.commands.push(command);
        if self.commands.len() > MAX_HISTORY {
            self.commands.remove(0);
        }
        self.cursor = self.commands.len();
        true
    }

    pub fn undo(&mut self, store: &mut CurveStore) -> bool {
        if self.cursor == 0 {
            return false;
        }
        if self.commands[self.cursor - 1].undo(store) {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn redo(&mut self, store: &mut CurveStore) -> bool {
        if self.cursor >= self.commands.len() {
            return false;
        }
        if self.commands[self.cursor].redo(store) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Number of entries currently undoable.
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    /// Total entries in history, applied or undone.
    pub fn history_len(&self) -> usize {
        self.commands.len()
    }

    pub fn clear_history(&mut self) {
        self.commands.clear();
        self.cursor = 0;
    }
}
