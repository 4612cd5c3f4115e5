//! The Insert Track operation: reconstruct missing frame ranges in the
//! selected curves from interpolation, a second curve's data, or an
//! average of several curves.

use std::any::Any;

use log::debug;

use super::command::Command;
use super::composite::CompositeCommand;
use super::edits::SetCurveCommand;
use crate::gap_fill::{
    average_multiple_sources, calculate_offset, create_averaged_curve,
    deform_curve_with_interpolated_offset, fill_gap_with_source, find_gap_around_frame,
    find_overlap_frames, interpolate_gap, merge_points,
};
use crate::models::curves::CurvePoint;
use crate::store::CurveStore;

/// Composite command behind the Insert Track action.
///
/// On first execute the selection is classified into one of three
/// scenarios:
/// 1. a single gapped curve is interpolated across its gap;
/// 2. gapped curves are filled from the curves that do have data at the
///    reference frame, offset-corrected (constant, time-deformed, or
///    multi-source averaged);
/// 3. with no gaps and two or more data-bearing curves, a brand-new
///    averaged curve is created.
///
/// Any other combination fails with no mutation. The whole operation
/// undoes atomically.
pub struct InsertTrackOperation {
    curve_names: Vec<String>,
    reference_frame: i64,
    inner: Option<CompositeCommand>,
    created_curve: Option<String>,
}

impl InsertTrackOperation {
    pub fn new(curve_names: Vec<String>, reference_frame: i64) -> Self {
        InsertTrackOperation {
            curve_names,
            reference_frame,
            inner: None,
            created_curve: None,
        }
    }

    /// Name of the averaged curve a scenario-3 run created, if any.
    pub fn created_curve_name(&self) -> Option<&str> {
        self.created_curve.as_deref()
    }

    fn plan(&mut self, store: &CurveStore) -> Option<CompositeCommand> {
        if self.curve_names.is_empty() {
            debug!("Insert Track: empty selection");
            return None;
        }

        let mut gapped: Vec<(String, (i64, i64))> = Vec::new();
        let mut with_data: Vec<String> = Vec::new();
        for name in &self.curve_names {
            let points = store.points(name);
            if let Some(gap) = find_gap_around_frame(points, self.reference_frame) {
                gapped.push((name.clone(), gap));
            } else if points
                .binary_search_by_key(&self.reference_frame, |p| p.frame)
                .is_ok()
            {
                with_data.push(name.clone());
            }
            // Curves with the reference frame outside their span fall
            // into neither bucket.
        }

        if self.curve_names.len() == 1 && gapped.len() == 1 {
            self.plan_interpolation(store, &gapped[0])
        } else if !gapped.is_empty() && !with_data.is_empty() {
            self.plan_source_fill(store, &gapped, &with_data)
        } else if gapped.is_empty() && with_data.len() >= 2 {
            self.plan_averaged_curve(store, &with_data)
        } else {
            debug!(
                "Insert Track: unsupported selection ({} gapped, {} with data)",
                gapped.len(),
                with_data.len()
            );
            None
        }
    }

    /// Scenario 1: linear interpolation across the single curve's gap.
    fn plan_interpolation(
        &self,
        store: &CurveStore,
        target: &(String, (i64, i64)),
    ) -> Option<CompositeCommand> {
        let (name, (gap_start, gap_end)) = target;
        let points = store.points(name);
        let filled = interpolate_gap(points, *gap_start, *gap_end);
        if filled.len() == points.len() {
            debug!("Insert Track: gap of '{}' cannot be interpolated", name);
            return None;
        }
        let mut composite = CompositeCommand::new("Insert Track");
        composite.push(Box::new(SetCurveCommand::new(name.clone(), filled)));
        Some(composite)
    }

    /// Scenario 2: fill each gapped curve from the data-bearing ones.
    /// A target that cannot be filled is skipped; its siblings are
    /// still attempted.
    fn plan_source_fill(
        &self,
        store: &CurveStore,
        gapped: &[(String, (i64, i64))],
        with_data: &[String],
    ) -> Option<CompositeCommand> {
        let mut composite = CompositeCommand::new("Insert Track");

        for (target_name, (gap_start, gap_end)) in gapped {
            let target = store.points(target_name);
            let filled = if with_data.len() == 1 {
                fill_from_single_source(
                    target,
                    store.points(&with_data[0]),
                    *gap_start,
                    *gap_end,
                )
            } else {
                fill_from_multiple_sources(store, target, with_data, *gap_start, *gap_end)
            };

            match filled {
                Some(points) if points.len() > target.len() => {
                    composite.push(Box::new(SetCurveCommand::new(target_name.clone(), points)));
                }
                _ => {
                    debug!("Insert Track: could not fill gap of '{}'", target_name);
                }
            }
        }

        if composite.is_empty() {
            None
        } else {
            Some(composite)
        }
    }

    /// Scenario 3: average the data-bearing curves into a new one.
    fn plan_averaged_curve(
        &mut self,
        store: &CurveStore,
        with_data: &[String],
    ) -> Option<CompositeCommand> {
        let curves: Vec<&[CurvePoint]> = with_data.iter().map(|n| store.points(n)).collect();
        let existing = store.curve_names();
        let (new_name, points) = create_averaged_curve(&curves, &existing)?;

        let mut composite = CompositeCommand::new("Insert Track");
        composite.push(Box::new(SetCurveCommand::new(new_name.clone(), points)));
        self.created_curve = Some(new_name);
        Some(composite)
    }
}

/// Single source: constant offset with at most one overlap point, a
/// time-deformed offset with two or more. No overlap at all is a hard
/// failure for this target.
fn fill_from_single_source(
    target: &[CurvePoint],
    source: &[CurvePoint],
    gap_start: i64,
    gap_end: i64,
) -> Option<Vec<CurvePoint>> {
    let (before, after) = find_overlap_frames(target, source, gap_start, gap_end);
    let overlap: Vec<i64> = before.iter().chain(after.iter()).copied().collect();

    match overlap.len() {
        0 => None,
        1 => {
            let offset = calculate_offset(target, source, &overlap)?;
            Some(fill_gap_with_source(
                target, source, gap_start, gap_end, offset,
            ))
        }
        _ => {
            let anchors: Vec<(i64, (f64, f64))> = overlap
                .iter()
                .filter_map(|&f| calculate_offset(target, source, &[f]).map(|o| (f, o)))
                .collect();
            Some(deform_curve_with_interpolated_offset(
                target, source, gap_start, gap_end, &anchors,
            ))
        }
    }
}

/// Multiple sources: per-source constant offsets, averaged per frame.
/// A source with no overlap against this target is silently skipped —
/// only when every source drops out does the target fail.
fn fill_from_multiple_sources(
    store: &CurveStore,
    target: &[CurvePoint],
    with_data: &[String],
    gap_start: i64,
    gap_end: i64,
) -> Option<Vec<CurvePoint>> {
    let mut sources: Vec<&[CurvePoint]> = Vec::new();
    let mut offsets: Vec<(f64, f64)> = Vec::new();
    for name in with_data {
        let source = store.points(name);
        let (before, after) = find_overlap_frames(target, source, gap_start, gap_end);
        let overlap: Vec<i64> = before.iter().chain(after.iter()).copied().collect();
        if overlap.is_empty() {
            continue;
        }
        if let Some(offset) = calculate_offset(target, source, &overlap) {
            sources.push(source);
            offsets.push(offset);
        }
    }
    if sources.is_empty() {
        return None;
    }

    let frames: Vec<i64> = (gap_start..=gap_end).collect();
    let averaged = average_multiple_sources(&sources, &frames, &offsets);
    if averaged.is_empty() {
        return None;
    }
    Some(merge_points(target, &averaged))
}

impl Command for InsertTrackOperation {
    fn name(&self) -> &str {
        "Insert Track"
    }

    fn execute(&mut self, store: &mut CurveStore) -> bool {
        if self.inner.is_none() {
            self.inner = self.plan(store);
        }
        match self.inner.as_mut() {
            Some(inner) => inner.execute(store),
            None => false,
        }
    }

    fn undo(&mut self, store: &mut CurveStore) -> bool {
        match self.inner.as_mut() {
            Some(inner) => inner.undo(store),
            None => false,
        }
    }

    fn redo(&mut self, store: &mut CurveStore) -> bool {
        match self.inner.as_mut() {
            Some(inner) => inner.redo(store),
            None => false,
        }
    }

    fn is_executed(&self) -> bool {
        self.inner.as_ref().map(|i| i.is_executed()).unwrap_or(false)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
