//! Leaf edit commands. Each captures only the point range it touches so
//! undo payloads stay bounded; the whole-curve command intentionally
//! snapshots everything because its reach is unbounded.

use std::any::Any;

use log::debug;

use super::command::Command;
use crate::models::curves::{CurvePoint, PointStatus};
use crate::store::CurveStore;

/// Replace (or create) a whole curve. A captured `None` old state means
/// the curve did not exist before, so undo deletes it; this is how
/// creation of an averaged curve is reversed.
#[derive(Clone)]
pub struct SetCurveCommand {
    curve_name: String,
    new_points: Vec<CurvePoint>,
    old_points: Option<Option<Vec<CurvePoint>>>,
    executed: bool,
}

impl SetCurveCommand {
    pub fn new(curve_name: impl Into<String>, new_points: Vec<CurvePoint>) -> Self {
        SetCurveCommand {
            curve_name: curve_name.into(),
            new_points,
            old_points: None,
            executed: false,
        }
    }

    pub fn curve_name(&self) -> &str {
        &self.curve_name
    }
}

impl Command for SetCurveCommand {
    fn name(&self) -> &str {
        "Set Curve"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        if self.old_points.is_none() {
            self.old_points = Some(store.curve(&self.curve_name).map(|c| c.points().to_vec()));
        }
        match store.set_curve(&self.curve_name, self.new_points.clone()) {
            Ok(()) => {
                self.executed = true;
                true
            }
            Err(e) => {
                debug!("Set Curve failed: {}", e);
                false
            }
        }
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        let restored = match &self.old_points {
            Some(Some(points)) => store.set_curve(&self.curve_name, points.clone()).is_ok(),
            Some(None) => store.delete_curve(&self.curve_name),
            None => false,
        };
        if restored {
            self.executed = false;
        }
        restored
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Add a single point, replacing any point already on that frame.
#[derive(Clone)]
pub struct AddPointCommand {
    curve_name: String,
    point: CurvePoint,
    replaced: Option<Option<CurvePoint>>,
    executed: bool,
}

impl AddPointCommand {
    pub fn new(curve_name: impl Into<String>, point: CurvePoint) -> Self {
        AddPointCommand {
            curve_name: curve_name.into(),
            point,
            replaced: None,
            executed: false,
        }
    }
}

impl Command for AddPointCommand {
    fn name(&self) -> &str {
        "Add Point"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        match store.upsert_point(&self.curve_name, self.point) {
            Ok(old) => {
                if self.replaced.is_none() {
                    self.replaced = Some(old);
                }
                self.executed = true;
                true
            }
            Err(e) => {
                debug!("Add Point failed: {}", e);
                false
            }
        }
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        let restored = match self.replaced {
            Some(Some(old)) => store.upsert_point(&self.curve_name, old).is_ok(),
            Some(None) => store
                .remove_points(&self.curve_name, &[self.point.frame])
                .is_ok(),
            None => false,
        };
        if restored {
            self.executed = false;
        }
        restored
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Move one point to an absolute position, keeping its status.
/// Consecutive moves of the same point merge into one history entry so
/// a drag undoes in a single step.
#[derive(Clone)]
pub struct MovePointCommand {
    curve_name: String,
    frame: i64,
    new_x: f64,
    new_y: f64,
    old_point: Option<CurvePoint>,
    executed: bool,
}

impl MovePointCommand {
    pub fn new(curve_name: impl Into<String>, frame: i64, new_x: f64, new_y: f64) -> Self {
        MovePointCommand {
            curve_name: curve_name.into(),
            frame,
            new_x,
            new_y,
            old_point: None,
            executed: false,
        }
    }
}

impl Command for MovePointCommand {
    fn name(&self) -> &str {
        "Move Point"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        let current = match store.curve(&self.curve_name).and_then(|c| c.point_at(self.frame)) {
            Some(p) => *p,
            None => {
                debug!(
                    "Move Point failed: no point at frame {} of '{}'",
                    self.frame, self.curve_name
                );
                return false;
            }
        };
        if self.old_point.is_none() {
            self.old_point = Some(current);
        }
        let moved = CurvePoint {
            x: self.new_x,
            y: self.new_y,
            ..current
        };
        if store.upsert_point(&self.curve_name, moved).is_err() {
            return false;
        }
        self.executed = true;
        true
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        match self.old_point {
            Some(old) => {
                let restored = store.upsert_point(&self.curve_name, old).is_ok();
                if restored {
                    self.executed = false;
                }
                restored
            }
            None => false,
        }
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn can_merge_with(&self, other: &dyn Command) -> bool {
        match other.as_any().downcast_ref::<MovePointCommand>() {
            Some(o) => o.curve_name == self.curve_name && o.frame == self.frame,
            None => false,
        }
    }

    fn merge_with(&mut self, other: Box<dyn Command>) {
        if let Some(o) = other.as_any().downcast_ref::<MovePointCommand>() {
            // Keep our captured pre-state, take the latest target.
            self.new_x = o.new_x;
            self.new_y = o.new_y;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shift a set of points by a common delta. Merges with a subsequent
/// batch move of the same point set (continued drag of a selection).
#[derive(Clone)]
pub struct BatchMovePointsCommand {
    curve_name: String,
    frames: Vec<i64>,
    dx: f64,
    dy: f64,
    old_points: Option<Vec<CurvePoint>>,
    executed: bool,
}

impl BatchMovePointsCommand {
    pub fn new(curve_name: impl Into<String>, mut frames: Vec<i64>, dx: f64, dy: f64) -> Self {
        frames.sort_unstable();
        frames.dedup();
        BatchMovePointsCommand {
            curve_name: curve_name.into(),
            frames,
            dx,
            dy,
            old_points: None,
            executed: false,
        }
    }
}

impl Command for BatchMovePointsCommand {
    fn name(&self) -> &str {
        "Move Points"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        let curve = match store.curve(&self.curve_name) {
            Some(c) => c,
            None => {
                debug!("Move Points failed: curve '{}' not found", self.curve_name);
                return false;
            }
        };
        // Validate the whole set before touching anything.
        let mut current = Vec::with_capacity(self.frames.len());
        for &frame in &self.frames {
            match curve.point_at(frame) {
                Some(p) => current.push(*p),
                None => {
                    debug!(
                        "Move Points failed: no point at frame {} of '{}'",
                        frame, self.curve_name
                    );
                    return false;
                }
            }
        }
        if current.is_empty() {
            return false;
        }
        if self.old_points.is_none() {
            self.old_points = Some(current.clone());
        }
        for point in current {
            let moved = CurvePoint {
                x: point.x + self.dx,
                y: point.y + self.dy,
                ..point
            };
            if store.upsert_point(&self.curve_name, moved).is_err() {
                return false;
            }
        }
        self.executed = true;
        true
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        let old_points = match &self.old_points {
            Some(points) => points.clone(),
            None => return false,
        };
        for point in old_points {
            if store.upsert_point(&self.curve_name, point).is_err() {
                return false;
            }
        }
        self.executed = false;
        true
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn can_merge_with(&self, other: &dyn Command) -> bool {
        match other.as_any().downcast_ref::<BatchMovePointsCommand>() {
            Some(o) => o.curve_name == self.curve_name && o.frames == self.frames,
            None => false,
        }
    }

    fn merge_with(&mut self, other: Box<dyn Command>) {
        if let Some(o) = other.as_any().downcast_ref::<BatchMovePointsCommand>() {
            self.dx += o.dx;
            self.dy += o.dy;
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Delete the points on the given frames.
#[derive(Clone)]
pub struct DeletePointsCommand {
    curve_name: String,
    frames: Vec<i64>,
    removed: Option<Vec<CurvePoint>>,
    executed: bool,
}

impl DeletePointsCommand {
    pub fn new(curve_name: impl Into<String>, mut frames: Vec<i64>) -> Self {
        frames.sort_unstable();
        frames.dedup();
        DeletePointsCommand {
            curve_name: curve_name.into(),
            frames,
            removed: None,
            executed: false,
        }
    }
}

impl Command for DeletePointsCommand {
    fn name(&self) -> &str {
        "Delete Points"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        let removed = match store.remove_points(&self.curve_name, &self.frames) {
            Ok(points) => points,
            Err(e) => {
                debug!("Delete Points failed: {}", e);
                return false;
            }
        };
        if removed.is_empty() {
            return false;
        }
        if self.removed.is_none() {
            self.removed = Some(removed);
        }
        self.executed = true;
        true
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        let removed = match &self.removed {
            Some(points) => points.clone(),
            None => return false,
        };
        for point in removed {
            if store.upsert_point(&self.curve_name, point).is_err() {
                return false;
            }
        }
        self.executed = false;
        true
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Change the status tag of one point.
#[derive(Clone)]
pub struct SetPointStatusCommand {
    curve_name: String,
    frame: i64,
    status: PointStatus,
    old_point: Option<CurvePoint>,
    executed: bool,
}

impl SetPointStatusCommand {
    pub fn new(curve_name: impl Into<String>, frame: i64, status: PointStatus) -> Self {
        SetPointStatusCommand {
            curve_name: curve_name.into(),
            frame,
            status,
            old_point: None,
            executed: false,
        }
    }
}

impl Command for SetPointStatusCommand {
    fn name(&self) -> &str {
        "Set Point Status"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        let current = match store.curve(&self.curve_name).and_then(|c| c.point_at(self.frame)) {
            Some(p) => *p,
            None => {
                debug!(
                    "Set Point Status failed: no point at frame {} of '{}'",
                    self.frame, self.curve_name
                );
                return false;
            }
        };
        if self.old_point.is_none() {
            self.old_point = Some(current);
        }
        let updated = CurvePoint {
            status: self.status,
            ..current
        };
        if store.upsert_point(&self.curve_name, updated).is_err() {
            return false;
        }
        self.executed = true;
        true
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        match self.old_point {
            Some(old) => {
                let restored = store.upsert_point(&self.curve_name, old).is_ok();
                if restored {
                    self.executed = false;
                }
                restored
            }
            None => false,
        }
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Convert a point to an interpolated one: its position is recomputed
/// from the neighboring points (the interpolation boundaries) and its
/// status becomes `Interpolated`. With a neighbor missing on either
/// side the position is kept and only the status changes.
#[derive(Clone)]
pub struct ConvertToInterpolatedCommand {
    curve_name: String,
    frame: i64,
    old_point: Option<CurvePoint>,
    executed: bool,
}

impl ConvertToInterpolatedCommand {
    pub fn new(curve_name: impl Into<String>, frame: i64) -> Self {
        ConvertToInterpolatedCommand {
            curve_name: curve_name.into(),
            frame,
            old_point: None,
            executed: false,
        }
    }
}

impl Command for ConvertToInterpolatedCommand {
    fn name(&self) -> &str {
        "Convert To Interpolated"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        let points = store.points(&self.curve_name);
        let index = match points.binary_search_by_key(&self.frame, |p| p.frame) {
            Ok(i) => i,
            Err(_) => {
                debug!(
                    "Convert To Interpolated failed: no point at frame {} of '{}'",
                    self.frame, self.curve_name
                );
                return false;
            }
        };
        let current = points[index];
        let prev = points[..index].last().copied();
        let next = points.get(index + 1).copied();

        let (x, y) = match (prev, next) {
            (Some(before), Some(after)) => {
                let t = (self.frame - before.frame) as f64 / (after.frame - before.frame) as f64;
                (
                    before.x + t * (after.x - before.x),
                    before.y + t * (after.y - before.y),
                )
            }
            _ => (current.x, current.y),
        };

        if self.old_point.is_none() {
            self.old_point = Some(current);
        }
        let converted = CurvePoint::new(self.frame, x, y, PointStatus::Interpolated);
        if store.upsert_point(&self.curve_name, converted).is_err() {
            return false;
        }
        self.executed = true;
        true
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        match self.old_point {
            Some(old) => {
                let restored = store.upsert_point(&self.curve_name, old).is_ok();
                if restored {
                    self.executed = false;
                }
                restored
            }
            None => false,
        }
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Neighbor-average smoothing over a set of frames. New positions are
/// computed once from the pre-state and stored, so redo replays the
/// exact result. Overlapping smooths of the same curve merge into one
/// history entry keeping the earliest pre-state and the latest
/// post-state.
#[derive(Clone)]
pub struct SmoothPointsCommand {
    curve_name: String,
    frames: Vec<i64>,
    old_points: Option<Vec<CurvePoint>>,
    new_points: Option<Vec<CurvePoint>>,
    executed: bool,
}

impl SmoothPointsCommand {
    pub fn new(curve_name: impl Into<String>, mut frames: Vec<i64>) -> Self {
        frames.sort_unstable();
        frames.dedup();
        SmoothPointsCommand {
            curve_name: curve_name.into(),
            frames,
            old_points: None,
            new_points: None,
            executed: false,
        }
    }

    fn apply(&self, store: &mut CurveStore, points: &[CurvePoint]) -> bool {
        for &point in points {
            if store.upsert_point(&self.curve_name, point).is_err() {
                return false;
            }
        }
        true
    }
}

impl Command for SmoothPointsCommand {
    fn name(&self) -> &str {
        "Smooth Points"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        if let Some(new_points) = self.new_points.clone() {
            // Replay a previously computed result (redo after undo).
            if !self.apply(store, &new_points) {
                return false;
            }
            self.executed = true;
            return true;
        }

        let points = store.points(&self.curve_name);
        if points.is_empty() {
            debug!("Smooth Points failed: curve '{}' is empty", self.curve_name);
            return false;
        }

        let mut old_points = Vec::new();
        let mut new_points = Vec::new();
        for &frame in &self.frames {
            let index = match points.binary_search_by_key(&frame, |p| p.frame) {
                Ok(i) => i,
                Err(_) => continue,
            };
            let current = points[index];
            let mut x = current.x;
            let mut y = current.y;
            let mut count = 1.0;
            if index > 0 {
                x += points[index - 1].x;
                y += points[index - 1].y;
                count += 1.0;
            }
            if index + 1 < points.len() {
                x += points[index + 1].x;
                y += points[index + 1].y;
                count += 1.0;
            }
            old_points.push(current);
            new_points.push(CurvePoint {
                x: x / count,
                y: y / count,
                ..current
            });
        }
        if new_points.is_empty() {
            return false;
        }

        if !self.apply(store, &new_points) {
            return false;
        }
        self.old_points = Some(old_points);
        self.new_points = Some(new_points);
        self.executed = true;
        true
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        if !self.executed {
            return false;
        }
        let old_points = match &self.old_points {
            Some(points) => points.clone(),
            None => return false,
        };
        if !self.apply(store, &old_points) {
            return false;
        }
        self.executed = false;
        true
    }

    fn is_executed(&self) -> bool {
        self.executed
    }

    fn can_merge_with(&self, other: &dyn Command) -> bool {
        match other.as_any().downcast_ref::<SmoothPointsCommand>() {
            Some(o) => {
                o.curve_name == self.curve_name
                    && o.frames.iter().any(|f| self.frames.binary_search(f).is_ok())
            }
            None => false,
        }
    }

    fn merge_with(&mut self, other: Box<dyn Command>) {
        let o = match other.as_any().downcast_ref::<SmoothPointsCommand>() {
            Some(o) => o,
            None => return,
        };

        // Pre-state: ours wins where both captured a frame (ours is the
        // earlier one); post-state: theirs wins.
        let mut old_points = self.old_points.clone().unwrap_or_default();
        for point in o.old_points.iter().flatten() {
            if !old_points.iter().any(|p| p.frame == point.frame) {
                old_points.push(*point);
            }
        }
        old_points.sort_by_key(|p| p.frame);

        let mut new_points = o.new_points.clone().unwrap_or_default();
        for point in self.new_points.iter().flatten() {
            if !new_points.iter().any(|p| p.frame == point.frame) {
                new_points.push(*point);
            }
        }
        new_points.sort_by_key(|p| p.frame);

        let mut frames = self.frames.clone();
        frames.extend_from_slice(&o.frames);
        frames.sort_unstable();
        frames.dedup();

        self.frames = frames;
        self.old_points = Some(old_points);
        self.new_points = Some(new_points);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
