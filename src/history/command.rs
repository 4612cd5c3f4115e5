use std::any::Any;

use crate::store::CurveStore;

/// A reversible unit of mutation against the curve store.
///
/// `execute` captures, on its first run, whatever prior state `undo`
/// needs; a command that has never executed refuses to undo. Failure is
/// signalled by returning `false` and must leave the store untouched.
pub trait Command {
    /// Short label for history display and logging.
    fn name(&self) -> &str;

    /// Apply the mutation. Returns `false` (with no mutation) on
    /// failure.
    fn execute(&mut self, store: &mut CurveStore) -> bool;

    /// Reverse a previously executed run.
    fn undo(&mut self, store: &mut CurveStore) -> bool;

    /// Re-apply after an undo. Defaults to re-running `execute`.
    fn redo(&mut self, store: &mut CurveStore) -> bool {
        self.execute(store)
    }

    /// Whether the command's mutation is currently applied.
    fn is_executed(&self) -> bool;

    /// Whether `other` can be folded into this command as a single
    /// history entry.
    fn can_merge_with(&self, _other: &dyn Command) -> bool {
        false
    }

    /// Absorb `other` into this command. The merged entry keeps this
    /// command's pre-state and takes `other`'s post-state. Only called
    /// after `can_merge_with` approved the pairing.
    fn merge_with(&mut self, _other: Box<dyn Command>) {}

    /// Downcast hook for merge checks.
    fn as_any(&self) -> &dyn Any;
}
