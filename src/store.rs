//! The single source of truth for curve data. Owns every named curve,
//! the per-curve selection sets and the active-curve pointer; mutated
//! only through commands on the one mutator thread.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::curves::{Curve, CurvePoint};
use crate::segments::SegmentedCurve;

/// What changed in the store. Handed to the change callback after every
/// successful mutation so renderers and timeline views can refresh
/// without a GUI event bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurveChange {
    Replaced(String),
    Deleted(String),
    SelectionChanged(String),
}

type ChangeCallback = Box<dyn Fn(&CurveChange)>;

#[derive(Default)]
pub struct CurveStore {
    curves: BTreeMap<String, Curve>,
    selections: HashMap<String, BTreeSet<usize>>,
    active_curve: Option<String>,
    on_change: Option<ChangeCallback>,
}

impl CurveStore {
    pub fn new() -> Self {
        CurveStore::default()
    }

    /// Register the synchronous notification callback. Invoked after
    /// every successful mutation, on the mutator thread.
    pub fn set_on_change(&mut self, callback: impl Fn(&CurveChange) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    fn notify(&self, change: CurveChange) {
        if let Some(callback) = &self.on_change {
            callback(&change);
        }
    }

    pub fn curve(&self, name: &str) -> Option<&Curve> {
        self.curves.get(name)
    }

    /// Points of the named curve; empty when the curve does not exist.
    /// Reads of missing curves never error.
    pub fn points(&self, name: &str) -> &[CurvePoint] {
        self.curves.get(name).map(|c| c.points()).unwrap_or(&[])
    }

    pub fn contains_curve(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    pub fn curve_names(&self) -> Vec<String> {
        self.curves.keys().cloned().collect()
    }

    /// Replace (or create) a whole curve. Fails closed: duplicate frames
    /// in the input leave the stored curve untouched.
    pub fn set_curve(&mut self, name: &str, points: Vec<CurvePoint>) -> Result<(), String> {
        let curve = Curve::from_points(points)
            .map_err(|e| format!("Failed to set curve '{}': {}", name, e))?;
        self.curves.insert(name.to_string(), curve);
        self.notify(CurveChange::Replaced(name.to_string()));
        Ok(())
    }

    /// Remove a curve together with its selection. Clears the
    /// active-curve pointer when it pointed here. Returns whether a
    /// curve was actually removed.
    pub fn delete_curve(&mut self, name: &str) -> bool {
        let removed = self.curves.remove(name).is_some();
        self.selections.remove(name);
        if self.active_curve.as_deref() == Some(name) {
            self.active_curve = None;
        }
        if removed {
            self.notify(CurveChange::Deleted(name.to_string()));
        }
        removed
    }

    pub fn active_curve(&self) -> Option<&str> {
        self.active_curve.as_deref()
    }

    pub fn set_active(&mut self, name: &str) -> Result<(), String> {
        if !self.curves.contains_key(name) {
            return Err(format!("Curve '{}' not found", name));
        }
        self.active_curve = Some(name.to_string());
        Ok(())
    }

    /// Selected point indices of the named curve; empty when none.
    pub fn selection(&self, name: &str) -> BTreeSet<usize> {
        self.selections.get(name).cloned().unwrap_or_default()
    }

    pub fn set_selection(&mut self, name: &str, indices: BTreeSet<usize>) -> Result<(), String> {
        if !self.curves.contains_key(name) {
            return Err(format!("Curve '{}' not found", name));
        }
        self.selections.insert(name.to_string(), indices);
        self.notify(CurveChange::SelectionChanged(name.to_string()));
        Ok(())
    }

    pub fn clear_selection(&mut self, name: &str) {
        if self.selections.remove(name).is_some() {
            self.notify(CurveChange::SelectionChanged(name.to_string()));
        }
    }

    /// Insert or replace a single point of an existing curve. Returns
    /// the replaced point, if any.
    pub fn upsert_point(
        &mut self,
        name: &str,
        point: CurvePoint,
    ) -> Result<Option<CurvePoint>, String> {
        let curve = self
            .curves
            .get_mut(name)
            .ok_or_else(|| format!("Curve '{}' not found", name))?;
        let old = curve.upsert_point(point);
        self.notify(CurveChange::Replaced(name.to_string()));
        Ok(old)
    }

    /// Remove the points on the given frames of an existing curve.
    /// Returns the removed points in frame order; frames with no point
    /// are ignored.
    pub fn remove_points(&mut self, name: &str, frames: &[i64]) -> Result<Vec<CurvePoint>, String> {
        let curve = self
            .curves
            .get_mut(name)
            .ok_or_else(|| format!("Curve '{}' not found", name))?;
        let removed = curve.remove_frames(frames);
        if !removed.is_empty() {
            self.notify(CurveChange::Replaced(name.to_string()));
        }
        Ok(removed)
    }

    /// Derived active/inactive view of the named curve, rebuilt from its
    /// current points.
    pub fn segmented(&self, name: &str) -> SegmentedCurve {
        SegmentedCurve::from_points(self.points(name))
    }
}
