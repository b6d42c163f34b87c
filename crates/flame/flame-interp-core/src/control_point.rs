//! Control points: timestamped values with TCB tangent parameters.

use serde::{Deserialize, Serialize};

/// Kochanek-Bartels tension / continuity / bias triple.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tcb {
    pub tension: f64,
    pub continuity: f64,
    pub bias: f64,
}

impl Tcb {
    pub const fn new(tension: f64, continuity: f64, bias: f64) -> Self {
        Self {
            tension,
            continuity,
            bias,
        }
    }

    /// `c = -1` collapses the tangents onto the chord: piecewise linear.
    pub const LINEAR: Tcb = Tcb::new(0.0, -1.0, 0.0);

    /// `t = c = b = 0` is the Catmull-Rom spline.
    pub const CATMULL_ROM: Tcb = Tcb::new(0.0, 0.0, 0.0);
}

impl Default for Tcb {
    fn default() -> Self {
        Self::LINEAR
    }
}

/// A spline input: N-dimensional value at an integer frame time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub value: Vec<f64>,
    pub time: i64,
    /// Parameters used when this point ends a segment.
    #[serde(default)]
    pub spline_in: Tcb,
    /// Parameters used when this point starts a segment.
    #[serde(default)]
    pub spline_out: Tcb,
}

impl ControlPoint {
    pub fn new(value: impl Into<Vec<f64>>, time: i64) -> Self {
        Self {
            value: value.into(),
            time,
            spline_in: Tcb::default(),
            spline_out: Tcb::default(),
        }
    }

    pub fn scalar(value: f64, time: i64) -> Self {
        Self::new(vec![value], time)
    }

    /// Same parameters on both sides of the point.
    pub fn with_spline(mut self, tcb: Tcb) -> Self {
        self.spline_in = tcb;
        self.spline_out = tcb;
        self
    }

    pub fn with_splines(mut self, spline_in: Tcb, spline_out: Tcb) -> Self {
        self.spline_in = spline_in;
        self.spline_out = spline_out;
        self
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.value.len()
    }

    /// Copy of this point moved to `time`.
    pub(crate) fn at_time(&self, time: i64) -> Self {
        Self {
            time,
            ..self.clone()
        }
    }

    /// Linear extrapolation away from `neighbor`: mirror the neighbour through this point.
    pub(crate) fn extrapolate_from(&self, neighbor: &ControlPoint) -> Self {
        let value = self
            .value
            .iter()
            .zip(neighbor.value.iter())
            .map(|(p, n)| p - (n - p))
            .collect();
        Self {
            value,
            time: self.time - (neighbor.time - self.time),
            spline_in: self.spline_in,
            spline_out: self.spline_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extrapolation_mirrors_neighbor() {
        let p0 = ControlPoint::scalar(5.0, 0);
        let p1 = ControlPoint::scalar(15.0, 10);
        let lead = p0.extrapolate_from(&p1);
        assert_eq!(lead.value, vec![-5.0]);
        assert_eq!(lead.time, -10);
        let trail = p1.extrapolate_from(&p0);
        assert_eq!(trail.value, vec![25.0]);
        assert_eq!(trail.time, 20);
    }

    #[test]
    fn default_spline_is_linear() {
        let cp = ControlPoint::new([1.0, 2.0], 3);
        assert_eq!(cp.spline_in, Tcb::LINEAR);
        assert_eq!(cp.spline_out, Tcb::LINEAR);
        assert_eq!(cp.dimension(), 2);
    }
}
