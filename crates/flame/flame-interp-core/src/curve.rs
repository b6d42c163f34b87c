//! Curve functions: scalar shaping of segment progress.
//!
//! Every kind maps a normalized progress `p` in [0,1] to an additive offset,
//! measured in units of the segment's start→end span. The linear ramp itself
//! comes from the spline; `lin` therefore contributes nothing.
//!
//! - `par` / `npar`: parabolic ease-in / ease-out.
//! - `hcos`: half-period cosine raised to `slope`.
//! - `sinh` / `tanh` / `exp`: hyperbolic and exponential easing shaped by `slope`.
//! - `sin` / `cos`: periodic modulation, `amp` high, `freq` whole cycles per segment.
//! - `plin` / `ppar`: a single bump of height `amp` peaking at `peak`; `ppar` picks
//!   its parabolic flanks with `mode` (0=par/par, 1=par/npar, 2=npar/npar, 3=npar/par).

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InterpError;
use crate::Result;

/// Shape of a segment's easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    Lin,
    Par,
    Npar,
    Hcos,
    Sinh,
    Tanh,
    Exp,
    Sin,
    Cos,
    Plin,
    Ppar,
}

impl CurveKind {
    pub const ALL: [CurveKind; 11] = [
        CurveKind::Lin,
        CurveKind::Par,
        CurveKind::Npar,
        CurveKind::Hcos,
        CurveKind::Sinh,
        CurveKind::Tanh,
        CurveKind::Exp,
        CurveKind::Sin,
        CurveKind::Cos,
        CurveKind::Plin,
        CurveKind::Ppar,
    ];

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lin => "lin",
            Self::Par => "par",
            Self::Npar => "npar",
            Self::Hcos => "hcos",
            Self::Sinh => "sinh",
            Self::Tanh => "tanh",
            Self::Exp => "exp",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Plin => "plin",
            Self::Ppar => "ppar",
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurveKind {
    type Err = InterpError;

    fn from_str(s: &str) -> Result<Self> {
        CurveKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| InterpError::UnsupportedCurve {
                name: s.to_string(),
            })
    }
}

/// Curve selection plus its parameters. Which parameters matter depends on `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    pub kind: CurveKind,
    #[serde(default = "default_amp")]
    pub amp: f64,
    #[serde(default = "default_freq")]
    pub freq: f64,
    #[serde(default = "default_slope")]
    pub slope: f64,
    #[serde(default = "default_peak")]
    pub peak: f64,
    #[serde(default)]
    pub mode: u8,
}

fn default_amp() -> f64 {
    1.0
}
fn default_freq() -> f64 {
    1.0
}
fn default_slope() -> f64 {
    1.0
}
fn default_peak() -> f64 {
    0.5
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self::new(CurveKind::Lin)
    }
}

impl CurveConfig {
    pub fn new(kind: CurveKind) -> Self {
        Self {
            kind,
            amp: default_amp(),
            freq: default_freq(),
            slope: default_slope(),
            peak: default_peak(),
            mode: 0,
        }
    }

    pub fn with_amp(mut self, amp: f64) -> Self {
        self.amp = amp;
        self
    }

    pub fn with_freq(mut self, freq: f64) -> Self {
        self.freq = freq;
        self
    }

    pub fn with_slope(mut self, slope: f64) -> Self {
        self.slope = slope;
        self
    }

    pub fn with_peak(mut self, peak: f64) -> Self {
        self.peak = peak;
        self
    }

    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }

    /// Check the parameters `kind` depends on.
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            CurveKind::Lin | CurveKind::Par | CurveKind::Npar => Ok(()),
            CurveKind::Hcos => {
                if !(self.slope.is_finite() && self.slope > 0.0) {
                    return Err(InterpError::invalid_parameter(
                        "slope",
                        format!("hcos needs a positive slope, got {}", self.slope),
                    ));
                }
                Ok(())
            }
            CurveKind::Sinh | CurveKind::Tanh | CurveKind::Exp => {
                if !self.slope.is_finite() || self.slope == 0.0 {
                    return Err(InterpError::invalid_parameter(
                        "slope",
                        format!("{} needs a non-zero slope, got {}", self.kind, self.slope),
                    ));
                }
                Ok(())
            }
            CurveKind::Sin | CurveKind::Cos => {
                if !(self.freq.is_finite() && self.freq >= 1.0 && self.freq.fract() == 0.0) {
                    return Err(InterpError::invalid_parameter(
                        "freq",
                        format!("{} needs a positive integer freq, got {}", self.kind, self.freq),
                    ));
                }
                self.check_amp()
            }
            CurveKind::Plin => {
                self.check_peak()?;
                self.check_amp()
            }
            CurveKind::Ppar => {
                self.check_peak()?;
                if self.mode > 3 {
                    return Err(InterpError::invalid_parameter(
                        "mode",
                        format!("ppar mode must be 0..=3, got {}", self.mode),
                    ));
                }
                self.check_amp()
            }
        }
    }

    fn check_peak(&self) -> Result<()> {
        if !(self.peak > 0.0 && self.peak < 1.0) {
            return Err(InterpError::invalid_parameter(
                "peak",
                format!("peak must lie in (0,1), got {}", self.peak),
            ));
        }
        Ok(())
    }

    fn check_amp(&self) -> Result<()> {
        if !self.amp.is_finite() {
            return Err(InterpError::invalid_parameter("amp", "amp must be finite"));
        }
        Ok(())
    }

    /// Additive offset at `progress`, in units of the segment span.
    pub fn offset(&self, progress: f64) -> Result<f64> {
        self.validate()?;
        Ok(self.offset_unchecked(progress))
    }

    /// Offsets at `n` evenly spaced positions `i / n`, `i` in `0..n`.
    pub fn offsets(&self, n: usize) -> Result<Vec<f64>> {
        self.validate()?;
        let m = n as f64;
        Ok((0..n).map(|i| self.offset_unchecked(i as f64 / m)).collect())
    }

    /// Dense curved ramp from `x` towards `y` in `n` steps (end value excluded).
    pub fn range(&self, x: f64, y: f64, n: usize) -> Result<Vec<f64>> {
        self.validate()?;
        let m = n as f64;
        let d = y - x;
        Ok((0..n)
            .map(|i| {
                let p = i as f64 / m;
                x + d * (p + self.offset_unchecked(p))
            })
            .collect())
    }

    pub(crate) fn offset_unchecked(&self, progress: f64) -> f64 {
        let p = progress.clamp(0.0, 1.0);
        match self.kind {
            CurveKind::Lin => 0.0,
            CurveKind::Par => p * p - p,
            CurveKind::Npar => 1.0 - (1.0 - p) * (1.0 - p) - p,
            CurveKind::Hcos => (((PI + p * PI).cos() + 1.0) / 2.0).powf(self.slope) - p,
            CurveKind::Sinh => {
                let a = self.slope;
                ((a * (2.0 * p - 1.0)).sinh() + a.sinh()) / (2.0 * a.sinh()) - p
            }
            CurveKind::Tanh => {
                let a = self.slope;
                ((a * (2.0 * p - 1.0)).tanh() + a.tanh()) / (2.0 * a.tanh()) - p
            }
            CurveKind::Exp => {
                let a = self.slope;
                (1.0 - (-a * p).exp()) / (1.0 - (-a).exp()) - p
            }
            CurveKind::Sin => self.amp * (p * PI * 2.0 * self.freq).sin(),
            CurveKind::Cos => self.amp * ((PI + p * PI * 2.0 * self.freq).cos() + 1.0) / 2.0,
            CurveKind::Plin => {
                if p < self.peak {
                    self.amp * p / self.peak
                } else {
                    self.amp * (1.0 - p) / (1.0 - self.peak)
                }
            }
            CurveKind::Ppar => {
                let rising_par = matches!(self.mode, 0 | 1);
                let falling_par = matches!(self.mode, 0 | 3);
                if p < self.peak {
                    let q = p / self.peak;
                    if rising_par {
                        self.amp * q * q
                    } else {
                        self.amp * (1.0 - (1.0 - q) * (1.0 - q))
                    }
                } else {
                    let r = (p - self.peak) / (1.0 - self.peak);
                    if falling_par {
                        self.amp * (1.0 - r * r)
                    } else {
                        self.amp * (1.0 - r) * (1.0 - r)
                    }
                }
            }
        }
    }
}

/// Evaluate a curve by kind and raw parameters.
pub fn curve(
    kind: CurveKind,
    progress: f64,
    amp: f64,
    freq: f64,
    slope: f64,
    peak: f64,
    mode: u8,
) -> Result<f64> {
    CurveConfig {
        kind,
        amp,
        freq,
        slope,
        peak,
        mode,
    }
    .offset(progress)
}
