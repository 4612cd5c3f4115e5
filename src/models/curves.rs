use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Status of a single tracked point
#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[ts(export, export_to = "bindings/curves.ts")]
#[serde(rename_all = "snake_case")]
pub enum PointStatus {
    Normal,
    Interpolated,
    Keyframe,
    Tracked,
    Endframe,
}

impl PointStatus {
    /// Whether a point with this status re-opens an active segment
    /// after an endframe.
    pub fn starts_active_segment(&self) -> bool {
        matches!(self, PointStatus::Keyframe | PointStatus::Tracked)
    }
}

impl From<&str> for PointStatus {
    fn from(s: &str) -> Self {
        match s {
            "normal" => PointStatus::Normal,
            "interpolated" => PointStatus::Interpolated,
            "keyframe" => PointStatus::Keyframe,
            "tracked" => PointStatus::Tracked,
            "endframe" => PointStatus::Endframe,
            _ => PointStatus::Normal,
        }
    }
}

impl std::fmt::Display for PointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PointStatus::Normal => write!(f, "normal"),
            PointStatus::Interpolated => write!(f, "interpolated"),
            PointStatus::Keyframe => write!(f, "keyframe"),
            PointStatus::Tracked => write!(f, "tracked"),
            PointStatus::Endframe => write!(f, "endframe"),
        }
    }
}

/// A tracked 2D position on one integer frame of a curve
#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/curves.ts")]
pub struct CurvePoint {
    #[ts(type = "number")]
    pub frame: i64,
    pub x: f64,
    pub y: f64,
    pub status: PointStatus,
}

impl CurvePoint {
    pub fn new(frame: i64, x: f64, y: f64, status: PointStatus) -> Self {
        CurvePoint { frame, x, y, status }
    }
}

/// Legacy status encodings accepted at ingestion: older tracking files
/// store either a bare "is interpolated" flag or a status name.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum RawPointStatus {
    Flag(bool),
    Name(String),
}

/// Input shape for a point as it arrives from file loaders, before
/// status normalization
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RawCurvePoint {
    pub frame: i64,
    pub x: f64,
    pub y: f64,
    pub status: Option<RawPointStatus>,
}

impl RawCurvePoint {
    /// Collapse the legacy encodings into the status enum. Missing status
    /// means a plain normal point; a bare boolean is the old
    /// "is interpolated" flag.
    pub fn normalize(self) -> CurvePoint {
        let status = match self.status {
            None => PointStatus::Normal,
            Some(RawPointStatus::Flag(true)) => PointStatus::Interpolated,
            Some(RawPointStatus::Flag(false)) => PointStatus::Normal,
            Some(RawPointStatus::Name(name)) => PointStatus::from(name.as_str()),
        };
        CurvePoint {
            frame: self.frame,
            x: self.x,
            y: self.y,
            status,
        }
    }
}

/// An ordered, frame-unique sequence of tracked points. Frames are kept
/// strictly increasing after every mutation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    points: Vec<CurvePoint>,
}

impl Curve {
    pub fn new() -> Self {
        Curve { points: Vec::new() }
    }

    /// Build a curve from arbitrary-order points. Sorts by frame and
    /// rejects duplicate frame numbers (fails closed, no partial curve).
    pub fn from_points(mut points: Vec<CurvePoint>) -> Result<Self, String> {
        points.sort_by_key(|p| p.frame);
        for pair in points.windows(2) {
            if pair[0].frame == pair[1].frame {
                return Err(format!("Duplicate frame {} in curve data", pair[0].frame));
            }
        }
        Ok(Curve { points })
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<CurvePoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn index_of(&self, frame: i64) -> Option<usize> {
        self.points.binary_search_by_key(&frame, |p| p.frame).ok()
    }

    pub fn point_at(&self, frame: i64) -> Option<&CurvePoint> {
        self.index_of(frame).map(|i| &self.points[i])
    }

    pub fn contains_frame(&self, frame: i64) -> bool {
        self.index_of(frame).is_some()
    }

    pub fn first_frame(&self) -> Option<i64> {
        self.points.first().map(|p| p.frame)
    }

    pub fn last_frame(&self) -> Option<i64> {
        self.points.last().map(|p| p.frame)
    }

    /// Insert a point, replacing any existing point on the same frame.
    /// Returns the replaced point, if any.
    pub fn upsert_point(&mut self, point: CurvePoint) -> Option<CurvePoint> {
        match self.points.binary_search_by_key(&point.frame, |p| p.frame) {
            Ok(i) => Some(std::mem::replace(&mut self.points[i], point)),
            Err(i) => {
                self.points.insert(i, point);
                None
            }
        }
    }

    /// Remove the points on the given frames. Returns the removed points
    /// in frame order; frames with no point are ignored.
    pub fn remove_frames(&mut self, frames: &[i64]) -> Vec<CurvePoint> {
        let mut removed: Vec<CurvePoint> = Vec::new();
        for &frame in frames {
            if let Ok(i) = self.points.binary_search_by_key(&frame, |p| p.frame) {
                removed.push(self.points.remove(i));
            }
        }
        removed.sort_by_key(|p| p.frame);
        removed
    }
}

/// A contiguous frame range with a uniform active/inactive flag, derived
/// from point statuses. Renderers consume these to decide solid vs dashed
/// drawing.
#[derive(TS, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/curves.ts")]
pub struct Segment {
    #[ts(type = "number")]
    pub start_frame: i64,
    #[ts(type = "number")]
    pub end_frame: i64,
    pub is_active: bool,
}

impl Segment {
    pub fn contains(&self, frame: i64) -> bool {
        frame >= self.start_frame && frame <= self.end_frame
    }
}
