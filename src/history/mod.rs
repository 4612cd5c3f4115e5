//! Command-based undo/redo engine. Every mutation of the curve store
//! goes through a command so it can be reversed, re-applied and merged
//! with its neighbors in history.

mod command;
mod composite;
mod edits;
mod insert_track;
mod manager;

pub use command::Command;
pub use composite::CompositeCommand;
pub use edits::{
    AddPointCommand, BatchMovePointsCommand, ConvertToInterpolatedCommand, DeletePointsCommand,
    MovePointCommand, SetCurveCommand, SetPointStatusCommand, SmoothPointsCommand,
};
pub use insert_track::InsertTrackOperation;
pub use manager::{CommandManager, MAX_HISTORY};

#[cfg(test)]
mod tests;
