//! Timeline spline: ordered control points plus the segments derived from them.
//!
//! Model:
//! - Points carry integer frame times, strictly increasing, the first at frame 0.
//! - `vects` holds `[leading edge, interior..., trailing edge]`. Edges only describe the
//!   padding context and are never sampled or curved.
//! - Non-looping: `K - 1` interior segments; padding mirrors the end points through
//!   their neighbours. Total length is the last point's time.
//! - Looping: `K` interior segments, the last one wrapping back to the first point over
//!   `nframes`. Total length is the last point's time plus `nframes`.
//!
//! Every mutation keeps `vects` in sync with `points`, either by rebuilding the full
//! list or by re-deriving only the segments touching the edit (see [`Rederive`]).
//! Both strategies yield the same segments.

use std::borrow::Cow;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::{InterpConfig, Rederive};
use crate::control_point::{ControlPoint, Tcb};
use crate::curve::CurveConfig;
use crate::error::InterpError;
use crate::segment::interpolate_points;
use crate::vect::{Vect, VectKind};
use crate::Result;

/// Dense output of [`TimelineSpline::calculate`], stored `[dimension][frame]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Samples {
    channels: Vec<Vec<f64>>,
}

impl Samples {
    pub fn dimension(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, dim: usize) -> Option<&[f64]> {
        self.channels.get(dim).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    /// All components at one frame.
    pub fn frame(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.len() {
            return None;
        }
        Some(self.channels.iter().map(|c| c[index]).collect())
    }

    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    #[inline]
    pub(crate) fn at(&self, dim: usize, frame: usize) -> f64 {
        self.channels[dim][frame]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredTimeline")]
pub struct TimelineSpline {
    points: Vec<ControlPoint>,
    vects: Vec<Vect>,
    looping: bool,
    nframes: i64,
    default_curve: CurveConfig,
    rederive: Rederive,
}

/// Serialized timeline. Segments are re-derived on load; only interior curves are kept.
#[derive(Deserialize)]
struct StoredTimeline {
    points: Vec<ControlPoint>,
    #[serde(default)]
    vects: Vec<Vect>,
    #[serde(default)]
    looping: bool,
    nframes: i64,
    #[serde(default)]
    default_curve: CurveConfig,
    #[serde(default)]
    rederive: Rederive,
}

impl TryFrom<StoredTimeline> for TimelineSpline {
    type Error = InterpError;

    fn try_from(stored: StoredTimeline) -> Result<Self> {
        let nframes = u32::try_from(stored.nframes).map_err(|_| {
            InterpError::invalid_parameter(
                "nframes",
                format!("nframes must be > 0, got {}", stored.nframes),
            )
        })?;
        let mut timeline = Self::build(
            stored.points,
            stored.looping,
            nframes,
            stored.default_curve,
            stored.rederive,
        )?;
        let curves: Vec<CurveConfig> = stored
            .vects
            .into_iter()
            .filter(|v| !v.is_edge())
            .map(|v| v.curve)
            .collect();
        if curves.is_empty() {
            return Ok(timeline);
        }
        let expected = timeline.segments().len();
        if curves.len() != expected {
            return Err(InterpError::invalid_parameter(
                "vects",
                format!("expected {expected} interior segments, got {}", curves.len()),
            ));
        }
        for curve in &curves {
            curve.validate()?;
        }
        timeline.rebuild(curves);
        Ok(timeline)
    }
}

impl TimelineSpline {
    /// Build a timeline with linear default curves and local re-derivation.
    pub fn new(points: Vec<ControlPoint>, looping: bool, nframes: u32) -> Result<Self> {
        Self::build(
            points,
            looping,
            nframes,
            CurveConfig::default(),
            Rederive::default(),
        )
    }

    /// Build a timeline taking looping, `nframes`, default curve and strategy from `config`.
    pub fn with_config(points: Vec<ControlPoint>, config: &InterpConfig) -> Result<Self> {
        config.validate()?;
        Self::build(
            points,
            config.looping,
            config.nframes,
            config.curve.clone(),
            config.rederive,
        )
    }

    fn build(
        points: Vec<ControlPoint>,
        looping: bool,
        nframes: u32,
        default_curve: CurveConfig,
        rederive: Rederive,
    ) -> Result<Self> {
        if nframes == 0 {
            return Err(InterpError::invalid_parameter(
                "nframes",
                "nframes must be > 0",
            ));
        }
        default_curve.validate()?;
        validate_points(&points)?;

        let mut timeline = Self {
            points,
            vects: Vec::new(),
            looping,
            nframes: i64::from(nframes),
            default_curve,
            rederive,
        };
        let count = timeline.interior_count_for(timeline.points.len());
        timeline.rebuild(vec![timeline.default_curve.clone(); count]);
        Ok(timeline)
    }

    // ---- accessors ----

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&ControlPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed timeline (at least two points).
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.points.first().map_or(0, ControlPoint::dimension)
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn nframes(&self) -> u32 {
        self.nframes as u32
    }

    pub fn rederive(&self) -> Rederive {
        self.rederive
    }

    pub fn set_rederive(&mut self, rederive: Rederive) {
        self.rederive = rederive;
    }

    pub fn default_curve(&self) -> &CurveConfig {
        &self.default_curve
    }

    /// Total frame count of the dense output.
    pub fn length(&self) -> usize {
        let last = self.points.last().map_or(0, |p| p.time);
        let total = if self.looping {
            last + self.nframes
        } else {
            last
        };
        total as usize
    }

    /// Every segment, edges included: `[leading, interior..., trailing]`.
    pub fn vects(&self) -> &[Vect] {
        &self.vects
    }

    /// Segment by its index in [`vects`](Self::vects).
    pub fn segment(&self, index: usize) -> Option<&Vect> {
        self.vects.get(index)
    }

    /// The sampled segments, in time order.
    pub fn segments(&self) -> &[Vect] {
        &self.vects[1..self.vects.len() - 1]
    }

    /// Curves of the sampled segments, in time order.
    pub fn curves(&self) -> Vec<CurveConfig> {
        self.segments().iter().map(|v| v.curve.clone()).collect()
    }

    /// Synthetic context points.
    ///
    /// Non-looping: `[leading pad, trailing pad]`, each the end point mirrored through its
    /// neighbour. Looping: `[last point before the first, first point after the last,
    /// second point after that]`, with times offset by the wrap length.
    pub fn padding(&self) -> Vec<ControlPoint> {
        let k = self.points.len();
        let first = &self.points[0];
        let last = &self.points[k - 1];
        if self.looping {
            let after = last.time + self.nframes;
            vec![
                last.at_time(first.time - self.nframes),
                first.at_time(after),
                self.points[1].at_time(after + self.points[1].time - first.time),
            ]
        } else {
            vec![
                first.extrapolate_from(&self.points[1]),
                last.extrapolate_from(&self.points[k - 2]),
            ]
        }
    }

    // ---- edits ----

    /// Insert `value` at `index`, taking the TCB parameters of the neighbouring point.
    ///
    /// See [`insert_point`](Self::insert_point) for the time semantics.
    pub fn insert_control_point(
        &mut self,
        value: impl Into<Vec<f64>>,
        index: usize,
        dt: i64,
    ) -> Result<()> {
        let neighbor = index.min(self.points.len().saturating_sub(1));
        let mut point = ControlPoint::new(value, 0);
        if let Some(n) = self.points.get(neighbor) {
            point = point.with_splines(n.spline_in, n.spline_out);
        }
        self.insert_point(point, index, dt)
    }

    /// Insert `point` at `index` (`0..=len`). The point takes the time currently held by
    /// `points[index]` (or `last + dt` when appending) and every later point moves by `dt`.
    /// Both halves of a split segment keep its curve; a segment added at an open end
    /// gets the default curve.
    pub fn insert_point(&mut self, mut point: ControlPoint, index: usize, dt: i64) -> Result<()> {
        let k = self.points.len();
        if index > k {
            return Err(InterpError::IndexOutOfRange {
                index,
                len: k + 1,
            });
        }
        if point.dimension() != self.dimension() {
            return Err(InterpError::DimensionMismatch {
                expected: self.dimension(),
                actual: point.dimension(),
                index,
            });
        }
        let anchor = if index < k {
            self.points[index].time
        } else {
            self.points[k - 1].time
        };
        if dt <= 0 {
            return Err(InterpError::NonMonotonicTime {
                index: index + 1,
                time: anchor + dt,
                previous: anchor,
            });
        }

        let parent = self.parent_curve(index);
        let slot = if self.looping { index } else { index.min(k - 1) };

        point.time = if index < k { anchor } else { anchor + dt };
        for p in &mut self.points[index..] {
            p.time += dt;
        }
        self.points.insert(index, point);

        match self.rederive {
            Rederive::Full => {
                let mut curves = self.curves();
                curves.insert(slot, parent);
                self.rebuild(curves);
            }
            Rederive::Local => {
                let k = self.points.len();
                for v in self.interior_mut() {
                    v.shift_up(index);
                }
                self.vects
                    .insert(slot + 1, Vect::interior(index, index, 0, parent));
                if self.looping {
                    self.rederive_segment((index + k - 1) % k);
                    self.rederive_segment(index);
                } else {
                    if index > 0 {
                        self.rederive_segment(index - 1);
                    }
                    if index + 1 < k {
                        self.rederive_segment(index);
                    }
                }
                self.refresh_edges();
                trace!("timeline: local re-derivation after insert at {index}");
            }
        }
        Ok(())
    }

    /// Remove the point at `index`; later points move down by the gap that followed it.
    /// When two segments merge, the earlier one's curve survives.
    pub fn remove_control_point(&mut self, index: usize) -> Result<ControlPoint> {
        let k = self.points.len();
        if index >= k {
            return Err(InterpError::IndexOutOfRange { index, len: k });
        }
        if k <= 2 {
            return Err(InterpError::InsufficientPoints {
                required: 2,
                actual: k - 1,
            });
        }

        let gap = if index + 1 < k {
            self.points[index + 1].time - self.points[index].time
        } else {
            0
        };
        let slot = if !self.looping && index == k - 1 {
            k - 2
        } else {
            index
        };

        let removed = self.points.remove(index);
        for p in &mut self.points[index..] {
            p.time -= gap;
        }

        match self.rederive {
            Rederive::Full => {
                let mut curves = self.curves();
                curves.remove(slot);
                self.rebuild(curves);
            }
            Rederive::Local => {
                let k = self.points.len();
                self.vects.remove(slot + 1);
                for v in self.interior_mut() {
                    v.shift_down(index);
                }
                if self.looping {
                    self.rederive_segment((index + k - 1) % k);
                } else if index > 0 && index < k {
                    self.rederive_segment(index - 1);
                }
                self.refresh_edges();
                trace!("timeline: local re-derivation after remove at {index}");
            }
        }
        Ok(removed)
    }

    /// Move the point at `index` and every later point by `dt` frames.
    pub fn shift_time(&mut self, index: usize, dt: i64) -> Result<()> {
        let k = self.points.len();
        if index >= k {
            return Err(InterpError::IndexOutOfRange { index, len: k });
        }
        if dt == 0 {
            return Ok(());
        }
        if index == 0 {
            return Err(InterpError::InvalidStartTime { time: dt });
        }
        let time = self.points[index].time + dt;
        let previous = self.points[index - 1].time;
        if time <= previous {
            return Err(InterpError::NonMonotonicTime {
                index,
                time,
                previous,
            });
        }
        for p in &mut self.points[index..] {
            p.time += dt;
        }
        match self.rederive {
            Rederive::Full => self.rebuild(self.curves()),
            Rederive::Local => {
                self.rederive_segment(index - 1);
                self.refresh_edges();
            }
        }
        Ok(())
    }

    /// Set the curve of segment `index` in [`vects`](Self::vects).
    pub fn set_curve(&mut self, index: usize, curve: CurveConfig) -> Result<()> {
        let len = self.vects.len();
        let vect = self
            .vects
            .get_mut(index)
            .ok_or(InterpError::IndexOutOfRange { index, len })?;
        if vect.is_edge() {
            return Err(InterpError::EdgeSegmentNotEditable { index });
        }
        curve.validate()?;
        vect.curve = curve;
        Ok(())
    }

    /// Same TCB parameters on both sides of point `index`.
    pub fn set_spline(&mut self, index: usize, tcb: Tcb) -> Result<()> {
        self.set_splines(index, tcb, tcb)
    }

    pub fn set_splines(&mut self, index: usize, spline_in: Tcb, spline_out: Tcb) -> Result<()> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(InterpError::IndexOutOfRange { index, len })?;
        point.spline_in = spline_in;
        point.spline_out = spline_out;
        Ok(())
    }

    // ---- sampling ----

    /// Dense values over `[0, length)`, one column per frame.
    pub fn calculate(&self) -> Result<Samples> {
        let total = self.length();
        let mut channels = vec![vec![0.0; total]; self.dimension()];
        for vect in self.segments() {
            let block = self.sample_segment(vect)?;
            let from = self.points[vect.start].time as usize;
            for (channel, samples) in channels.iter_mut().zip(block) {
                channel[from..from + samples.len()].copy_from_slice(&samples);
            }
        }
        trace!(
            "timeline: calculated {} segments, {} frames x {} components",
            self.segments().len(),
            total,
            self.dimension()
        );
        Ok(Samples { channels })
    }

    /// Value at a single frame. `frame == length` is allowed: it wraps to the first
    /// point when looping and yields the last point otherwise.
    pub fn sample(&self, frame: usize) -> Result<Vec<f64>> {
        let total = self.length();
        if frame > total {
            return Err(InterpError::IndexOutOfRange {
                index: frame,
                len: total + 1,
            });
        }
        let frame = if frame == total {
            if !self.looping {
                return Ok(self.points[self.points.len() - 1].value.clone());
            }
            0
        } else {
            frame
        };
        let t = frame as i64;
        let vect = self
            .segments()
            .iter()
            .find(|v| {
                let start = self.points[v.start].time;
                t >= start && t < start + v.length
            })
            .ok_or(InterpError::IndexOutOfRange {
                index: frame,
                len: total,
            })?;
        let offset = (t - self.points[vect.start].time) as usize;
        let block = self.sample_segment(vect)?;
        Ok(block.iter().map(|c| c[offset]).collect())
    }

    fn sample_segment(&self, vect: &Vect) -> Result<Vec<Vec<f64>>> {
        let [prev, start, end, next] = self.context(vect);
        interpolate_points(
            &[&*prev, &*start, &*end, &*next],
            vect.length as usize,
            &vect.curve,
        )
    }

    /// 4-point context `(previous, start, end, next)` of an interior segment.
    fn context(&self, vect: &Vect) -> [Cow<'_, ControlPoint>; 4] {
        let k = self.points.len();
        let prev = if vect.start > 0 {
            Cow::Borrowed(&self.points[vect.start - 1])
        } else if self.looping {
            Cow::Borrowed(&self.points[k - 1])
        } else {
            Cow::Owned(self.points[0].extrapolate_from(&self.points[1]))
        };
        let next = if vect.end + 1 < k {
            Cow::Borrowed(&self.points[vect.end + 1])
        } else if self.looping {
            Cow::Borrowed(&self.points[(vect.end + 1) % k])
        } else {
            Cow::Owned(self.points[k - 1].extrapolate_from(&self.points[k - 2]))
        };
        [
            prev,
            Cow::Borrowed(&self.points[vect.start]),
            Cow::Borrowed(&self.points[vect.end]),
            next,
        ]
    }

    // ---- derivation ----

    fn interior_count_for(&self, points: usize) -> usize {
        if self.looping {
            points
        } else {
            points - 1
        }
    }

    fn interior_mut(&mut self) -> &mut [Vect] {
        let n = self.vects.len();
        &mut self.vects[1..n - 1]
    }

    /// Curve a newly inserted point's segments inherit, before the insert happens.
    fn parent_curve(&self, index: usize) -> CurveConfig {
        let k = self.points.len();
        let segments = self.segments();
        if self.looping {
            segments[(index + k - 1) % k].curve.clone()
        } else if index > 0 && index < k {
            segments[index - 1].curve.clone()
        } else {
            self.default_curve.clone()
        }
    }

    fn derive_interior(&self, s: usize, curve: CurveConfig) -> Vect {
        let k = self.points.len();
        if self.looping && s == k - 1 {
            Vect::interior(s, 0, self.nframes, curve)
        } else {
            let length = self.points[s + 1].time - self.points[s].time;
            Vect::interior(s, s + 1, length, curve)
        }
    }

    fn derive_edges(&self) -> (Vect, Vect) {
        let k = self.points.len();
        let first_gap = self.points[1].time - self.points[0].time;
        if self.looping {
            (
                Vect::edge(VectKind::LeadingEdge, k - 1, 0, self.nframes),
                Vect::edge(VectKind::TrailingEdge, 0, 1, first_gap),
            )
        } else {
            let last_gap = self.points[k - 1].time - self.points[k - 2].time;
            (
                Vect::edge(VectKind::LeadingEdge, 0, 0, first_gap),
                Vect::edge(VectKind::TrailingEdge, k - 1, k - 1, last_gap),
            )
        }
    }

    fn rederive_segment(&mut self, s: usize) {
        let curve = self.vects[s + 1].curve.clone();
        self.vects[s + 1] = self.derive_interior(s, curve);
    }

    fn refresh_edges(&mut self) {
        let (lead, trail) = self.derive_edges();
        let n = self.vects.len();
        self.vects[0] = lead;
        self.vects[n - 1] = trail;
    }

    fn rebuild(&mut self, curves: Vec<CurveConfig>) {
        let (lead, trail) = self.derive_edges();
        let mut vects = Vec::with_capacity(curves.len() + 2);
        vects.push(lead);
        for (s, curve) in curves.into_iter().enumerate() {
            vects.push(self.derive_interior(s, curve));
        }
        vects.push(trail);
        self.vects = vects;
        trace!(
            "timeline: rebuilt {} segments from {} points",
            self.vects.len() - 2,
            self.points.len()
        );
    }
}

fn validate_points(points: &[ControlPoint]) -> Result<()> {
    if points.len() < 2 {
        return Err(InterpError::InsufficientPoints {
            required: 2,
            actual: points.len(),
        });
    }
    let dim = points[0].dimension();
    if dim == 0 {
        return Err(InterpError::invalid_parameter(
            "value",
            "control points need at least one component",
        ));
    }
    if points[0].time != 0 {
        return Err(InterpError::InvalidStartTime {
            time: points[0].time,
        });
    }
    for (index, pair) in points.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.dimension() != dim {
            return Err(InterpError::DimensionMismatch {
                expected: dim,
                actual: cur.dimension(),
                index: index + 1,
            });
        }
        if cur.time <= prev.time {
            return Err(InterpError::NonMonotonicTime {
                index: index + 1,
                time: cur.time,
                previous: prev.time,
            });
        }
    }
    Ok(())
}
