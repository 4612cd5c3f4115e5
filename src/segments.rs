//! Segmented view of a curve: active/inactive frame ranges derived from
//! per-point statuses.

use crate::models::curves::{CurvePoint, PointStatus, Segment};

/// Read-only collaborator seam for renderers: anything that can hand out
/// points and derived segments.
pub trait CurveView {
    fn points(&self) -> &[CurvePoint];
    fn segments(&self) -> &[Segment];
}

/// A curve partitioned into contiguous active/inactive frame segments.
///
/// Rebuilt from the owning store's points whenever the underlying curve
/// changes; never mutated directly.
#[derive(Clone, Debug, Default)]
pub struct SegmentedCurve {
    points: Vec<CurvePoint>,
    segments: Vec<Segment>,
}

impl SegmentedCurve {
    /// Partition the points into segments with a single linear pass.
    ///
    /// A segment stays active up to and including an endframe point. The
    /// range after an endframe is inactive until tracking restarts: a
    /// keyframe always reopens an active segment, a tracked point reopens
    /// one only after a run of missing frames (data that directly
    /// continues an endframe belongs to the inactive range).
    pub fn from_points(points: &[CurvePoint]) -> Self {
        let mut segments = Vec::new();
        let first = match points.first() {
            Some(p) => p,
            None => {
                return SegmentedCurve {
                    points: Vec::new(),
                    segments,
                }
            }
        };

        let mut start = first.frame;
        let mut active = true;
        let mut prev_frame = first.frame;

        for point in points {
            if !active && reopens_segment(point, prev_frame) {
                let end = if prev_frame >= start {
                    prev_frame
                } else {
                    point.frame - 1
                };
                // Reopening on the frame right after the endframe leaves
                // no inactive range to record.
                if end >= start {
                    segments.push(Segment {
                        start_frame: start,
                        end_frame: end,
                        is_active: false,
                    });
                }
                start = point.frame;
                active = true;
            }
            if point.status == PointStatus::Endframe {
                segments.push(Segment {
                    start_frame: start,
                    end_frame: point.frame,
                    is_active: active,
                });
                start = point.frame + 1;
                active = false;
            }
            prev_frame = point.frame;
        }

        // Close the open segment at the last point's frame. A trailing
        // endframe leaves nothing to close.
        let last_frame = prev_frame;
        if start <= last_frame {
            segments.push(Segment {
                start_frame: start,
                end_frame: last_frame,
                is_active: active,
            });
        }

        SegmentedCurve {
            points: points.to_vec(),
            segments,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment covering the given frame, if any. Frames before the
    /// first point or after the last belong to no segment.
    pub fn segment_at_frame(&self, frame: i64) -> Option<&Segment> {
        self.segments.iter().find(|s| s.contains(frame))
    }

    /// Nearest point at-or-before and at-or-after the given frame,
    /// scanning the full point list rather than segment boundaries.
    /// Renderers use this for dashed/solid transitions; keyframe
    /// conversion uses it to recompute interpolated positions.
    pub fn interpolation_boundaries(
        &self,
        frame: i64,
    ) -> (Option<&CurvePoint>, Option<&CurvePoint>) {
        boundaries_around_frame(&self.points, frame)
    }
}

impl CurveView for SegmentedCurve {
    fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

/// Whether a point restarts tracking while the current segment is
/// inactive. A tracked point only counts when it sits after a frame gap;
/// contiguous tracked data trailing an endframe stays inactive.
fn reopens_segment(point: &CurvePoint, prev_frame: i64) -> bool {
    match point.status {
        PointStatus::Keyframe => true,
        PointStatus::Tracked => point.frame > prev_frame + 1,
        _ => false,
    }
}

/// Nearest existing points at-or-before and at-or-after `frame` in a
/// sorted point slice.
pub fn boundaries_around_frame(
    points: &[CurvePoint],
    frame: i64,
) -> (Option<&CurvePoint>, Option<&CurvePoint>) {
    let split = points.partition_point(|p| p.frame < frame);
    let next = points.get(split).filter(|p| p.frame >= frame);
    let prev = if split < points.len() && points[split].frame == frame {
        Some(&points[split])
    } else if split > 0 {
        Some(&points[split - 1])
    } else {
        None
    };
    (prev, next)
}
