//! Gap reconstruction for tracking curves: detection, interpolation,
//! source-copy with offset correction, time-varying deformation and
//! multi-source averaging.
//!
//! All functions are pure and operate on sorted, frame-unique point
//! slices. Expected "nothing to do" conditions are signalled by `None`
//! or by returning the input unchanged, never by errors.

use crate::models::curves::{CurvePoint, PointStatus};

fn point_at(points: &[CurvePoint], frame: i64) -> Option<&CurvePoint> {
    points
        .binary_search_by_key(&frame, |p| p.frame)
        .ok()
        .map(|i| &points[i])
}

fn contains_frame(points: &[CurvePoint], frame: i64) -> bool {
    point_at(points, frame).is_some()
}

/// The maximal contiguous run of missing frames containing `frame`,
/// bounded by existing points on both sides.
///
/// Returns `None` when `frame` already has a point, or when it lies
/// outside the curve's span: an open-ended gap has no boundary to
/// interpolate against.
pub fn find_gap_around_frame(points: &[CurvePoint], frame: i64) -> Option<(i64, i64)> {
    let first = points.first()?.frame;
    let last = points.last()?.frame;
    if frame < first || frame > last {
        return None;
    }
    if contains_frame(points, frame) {
        return None;
    }

    let split = points.partition_point(|p| p.frame < frame);
    // Both neighbors exist: frame is inside the span and has no point.
    let gap_start = points[split - 1].frame + 1;
    let gap_end = points[split].frame - 1;
    Some((gap_start, gap_end))
}

/// Frames immediately outside the gap on each side where both target and
/// source have data. Walks outward from the gap edges and stops at the
/// first frame either curve misses. Both lists are in ascending frame
/// order.
pub fn find_overlap_frames(
    target: &[CurvePoint],
    source: &[CurvePoint],
    gap_start: i64,
    gap_end: i64,
) -> (Vec<i64>, Vec<i64>) {
    let mut before = Vec::new();
    let mut frame = gap_start - 1;
    while contains_frame(target, frame) && contains_frame(source, frame) {
        before.push(frame);
        frame -= 1;
    }
    before.reverse();

    let mut after = Vec::new();
    let mut frame = gap_end + 1;
    while contains_frame(target, frame) && contains_frame(source, frame) {
        after.push(frame);
        frame += 1;
    }

    (before, after)
}

/// Average of `target - source` over the given overlap frames. `None`
/// when no overlap frame is supplied.
pub fn calculate_offset(
    target: &[CurvePoint],
    source: &[CurvePoint],
    overlap_frames: &[i64],
) -> Option<(f64, f64)> {
    let mut dx = 0.0;
    let mut dy = 0.0;
    let mut count = 0usize;
    for &frame in overlap_frames {
        let t = point_at(target, frame)?;
        let s = point_at(source, frame)?;
        dx += t.x - s.x;
        dy += t.y - s.y;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some((dx / count as f64, dy / count as f64))
}

/// Fill `[gap_start, gap_end]` by linear interpolation between the
/// points directly bordering the gap. Returns the input unchanged when
/// either border point is missing; failure is "no points added".
pub fn interpolate_gap(points: &[CurvePoint], gap_start: i64, gap_end: i64) -> Vec<CurvePoint> {
    let before = match point_at(points, gap_start - 1) {
        Some(p) => *p,
        None => return points.to_vec(),
    };
    let after = match point_at(points, gap_end + 1) {
        Some(p) => *p,
        None => return points.to_vec(),
    };

    let span = (after.frame - before.frame) as f64;
    let mut filled: Vec<CurvePoint> = Vec::new();
    for frame in gap_start..=gap_end {
        if contains_frame(points, frame) {
            continue;
        }
        let t = (frame - before.frame) as f64 / span;
        filled.push(CurvePoint::new(
            frame,
            before.x + t * (after.x - before.x),
            before.y + t * (after.y - before.y),
            PointStatus::Interpolated,
        ));
    }

    merge_points(points, &filled)
}

/// Copy source data into the gap, shifted by a constant offset. Gap
/// frames the source does not cover are left empty.
pub fn fill_gap_with_source(
    target: &[CurvePoint],
    source: &[CurvePoint],
    gap_start: i64,
    gap_end: i64,
    offset: (f64, f64),
) -> Vec<CurvePoint> {
    let mut filled: Vec<CurvePoint> = Vec::new();
    for frame in gap_start..=gap_end {
        if contains_frame(target, frame) {
            continue;
        }
        if let Some(s) = point_at(source, frame) {
            filled.push(CurvePoint::new(
                frame,
                s.x + offset.0,
                s.y + offset.1,
                s.status,
            ));
        }
    }
    merge_points(target, &filled)
}

/// Copy source data into the gap with a time-varying offset: between
/// each consecutive pair of overlap offsets the correction is linearly
/// interpolated, so gradual drift between target and source is tracked
/// instead of smeared by a single constant.
///
/// `overlap_offsets` pairs an overlap frame with the target-minus-source
/// offset measured there; at least two entries are required to deform.
pub fn deform_curve_with_interpolated_offset(
    target: &[CurvePoint],
    source: &[CurvePoint],
    gap_start: i64,
    gap_end: i64,
    overlap_offsets: &[(i64, (f64, f64))],
) -> Vec<CurvePoint> {
    if overlap_offsets.len() < 2 {
        return target.to_vec();
    }
    let mut anchors = overlap_offsets.to_vec();
    anchors.sort_by_key(|(frame, _)| *frame);

    let mut filled: Vec<CurvePoint> = Vec::new();
    for pair in anchors.windows(2) {
        let (f0, (dx0, dy0)) = pair[0];
        let (f1, (dx1, dy1)) = pair[1];
        if f1 <= f0 + 1 {
            continue;
        }
        for frame in (f0 + 1)..f1 {
            if frame < gap_start || frame > gap_end {
                continue;
            }
            if contains_frame(target, frame) {
                continue;
            }
            let s = match point_at(source, frame) {
                Some(p) => p,
                None => continue,
            };
            let t = (frame - f0) as f64 / (f1 - f0) as f64;
            let dx = dx0 + t * (dx1 - dx0);
            let dy = dy0 + t * (dy1 - dy0);
            filled.push(CurvePoint::new(frame, s.x + dx, s.y + dy, s.status));
        }
    }
    merge_points(target, &filled)
}

/// Average several offset-corrected sources at each requested frame.
/// A frame is skipped when no source covers it; sources missing a frame
/// simply drop out of that frame's average.
pub fn average_multiple_sources(
    sources: &[&[CurvePoint]],
    frames: &[i64],
    offsets: &[(f64, f64)],
) -> Vec<CurvePoint> {
    let mut averaged: Vec<CurvePoint> = Vec::new();
    for &frame in frames {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut count = 0usize;
        for (source, offset) in sources.iter().zip(offsets.iter()) {
            if let Some(p) = point_at(source, frame) {
                x += p.x + offset.0;
                y += p.y + offset.1;
                count += 1;
            }
        }
        if count > 0 {
            averaged.push(CurvePoint::new(
                frame,
                x / count as f64,
                y / count as f64,
                PointStatus::Normal,
            ));
        }
    }
    averaged.sort_by_key(|p| p.frame);
    averaged
}

/// Build a brand-new curve by averaging the input curves over the frames
/// they all share, with no offset correction, and propose a unique name
/// for it (`avrg_01`, `avrg_02`, ...).
///
/// `None` when fewer than two curves are given or when they share no
/// frames.
pub fn create_averaged_curve(
    curves: &[&[CurvePoint]],
    existing_names: &[String],
) -> Option<(String, Vec<CurvePoint>)> {
    if curves.len() < 2 {
        return None;
    }

    let first = curves[0];
    let common_frames: Vec<i64> = first
        .iter()
        .map(|p| p.frame)
        .filter(|&f| curves[1..].iter().all(|c| contains_frame(c, f)))
        .collect();
    if common_frames.is_empty() {
        return None;
    }

    let offsets = vec![(0.0, 0.0); curves.len()];
    let points = average_multiple_sources(curves, &common_frames, &offsets);

    let mut index = 1u32;
    let name = loop {
        let candidate = format!("avrg_{:02}", index);
        if !existing_names.iter().any(|n| n == &candidate) {
            break candidate;
        }
        index += 1;
    };

    Some((name, points))
}

/// Merge additional points into an existing sorted point set. Additions
/// win on frame collisions; the result stays sorted and frame-unique.
pub fn merge_points(existing: &[CurvePoint], additions: &[CurvePoint]) -> Vec<CurvePoint> {
    let mut merged: Vec<CurvePoint> = existing.to_vec();
    for &point in additions {
        match merged.binary_search_by_key(&point.frame, |p| p.frame) {
            Ok(i) => merged[i] = point,
            Err(i) => merged.insert(i, point),
        }
    }
    merged
}
