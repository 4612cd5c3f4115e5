//! Curve editing core for 2D motion tracking workflows.
//!
//! Owns per-frame tracking curves (`CurveStore`), derives active and
//! inactive segments from point statuses (`SegmentedCurve`), fills gaps
//! from interpolation or sibling curves (`gap_fill`, `InsertTrackOperation`)
//! and routes every mutation through a bounded undo/redo history
//! (`CommandManager`). Rendering, windowing and file formats live in the
//! surrounding application; this crate only hands them typed data.

pub mod gap_fill;
pub mod history;
pub mod ingest;
pub mod models;
pub mod segments;
pub mod store;

pub use history::{Command, CommandManager, CompositeCommand, InsertTrackOperation, MAX_HISTORY};
pub use models::curves::{Curve, CurvePoint, PointStatus, RawCurvePoint, Segment};
pub use segments::{CurveView, SegmentedCurve};
pub use store::{CurveChange, CurveStore};
