//! Interpolator configuration.

use serde::{Deserialize, Serialize};

use crate::control_point::Tcb;
use crate::curve::CurveConfig;
use crate::error::InterpError;
use crate::Result;

/// How a timeline refreshes its segments after a control-point edit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rederive {
    /// Rebuild every segment from the control-point list.
    Full,
    /// Touch only the segments adjacent to the edit (and the edges).
    #[default]
    Local,
}

/// Space in which transform coefficient vectors are interpolated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoefficientSpace {
    /// Cartesian (x, y) components.
    #[default]
    Rect,
    /// (length, angle in degrees); rotating coefficients sweep instead of shrinking.
    Polar,
}

/// Configuration shared by an interpolator and every timeline it builds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpConfig {
    /// Frames between consecutive keyframes when no explicit time is given,
    /// and the length of the wraparound segment when looping.
    pub nframes: u32,
    pub looping: bool,
    /// Curve given to every newly derived segment.
    pub curve: CurveConfig,
    /// TCB parameters given to every sampled control point.
    pub spline: Tcb,
    pub coefficient_space: CoefficientSpace,
    pub rederive: Rederive,
}

impl Default for InterpConfig {
    fn default() -> Self {
        Self {
            nframes: 50,
            looping: false,
            curve: CurveConfig::default(),
            spline: Tcb::default(),
            coefficient_space: CoefficientSpace::default(),
            rederive: Rederive::default(),
        }
    }
}

impl InterpConfig {
    pub fn with_nframes(mut self, nframes: u32) -> Self {
        self.nframes = nframes;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_curve(mut self, curve: CurveConfig) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_spline(mut self, spline: Tcb) -> Self {
        self.spline = spline;
        self
    }

    pub fn with_coefficient_space(mut self, space: CoefficientSpace) -> Self {
        self.coefficient_space = space;
        self
    }

    pub fn with_rederive(mut self, rederive: Rederive) -> Self {
        self.rederive = rederive;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.nframes == 0 {
            return Err(InterpError::invalid_parameter(
                "nframes",
                "nframes must be > 0",
            ));
        }
        self.curve.validate()
    }
}
