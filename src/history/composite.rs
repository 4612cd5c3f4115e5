use std::any::Any;

use log::warn;

use super::command::Command;
use crate::store::CurveStore;

/// An ordered list of sub-commands executed and undone as one atomic
/// history entry.
///
/// `execute` is all-or-nothing: when a sub-command fails, every
/// previously succeeded sub-command is undone in reverse order and the
/// composite reports failure. `undo` is best-effort in reverse order so
/// a single failing sub-undo does not strand the rest.
pub struct CompositeCommand {
    name: String,
    commands: Vec<Box<dyn Command>>,
    executed: bool,
}

impl CompositeCommand {
    pub fn new(name: impl Into<String>) -> Self {
        CompositeCommand {
            name: name.into(),
            commands: Vec::new(),
            executed: false,
        }
    }

    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    fn run_forward(
        &mut self,
        store: &mut CurveStore,
        run: fn(&mut dyn Command, &mut CurveStore) -> bool,
    ) -> bool {
        for i in 0..self.commands.len() {
            if !run(self.commands[i].as_mut(), store) {
                warn!(
                    "Composite '{}': step {} ('{}') failed, rolling back",
                    self.name,
                    i,
                    self.commands[i].name()
                );
                for j in (0..i).rev() {
                    if !self.commands[j].undo(store) {
                        warn!(
                            "Composite '{}': rollback of step {} ('{}') failed",
                            self.name,
                            j,
                            self.commands[j].name()
                        );
                    }
                }
                self.executed = false;
                return false;
            }
        }
        self.executed = true;
        true
    }
}

impl Command for CompositeCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        self.run_forward(store, |cmd, store| cmd.execute(store))
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        let mut all_ok = true;
        for command in self.commands.iter_mut().rev() {
            if !command.undo(store) {
                warn!(
                    "Composite '{}': undo of '{}' failed",
                    self.name,
                    command.name()
                );
                all_ok = false;
            }
        }
        self.executed = false;
        all_ok
    }

    fn redo(&mut self, store: &mut CurveStore) -> bool {
        self.run_forward(store, |cmd, store| cmd.redo(store))
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
