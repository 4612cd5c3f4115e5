pub mod curves;

pub use curves::{Curve, CurvePoint, PointStatus, RawCurvePoint, RawPointStatus, Segment};
