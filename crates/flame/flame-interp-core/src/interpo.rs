//! Genome interpolator: keyframes in, one fully resolved genome per frame out.
//!
//! Lifecycle (see [`InterpState`]):
//! - `Uninitialized`: keyframes set, nothing derived.
//! - `Aligned`: keyframes padded to a shared transform/variation layout.
//! - `TimelinesBuilt`: one [`TimelineSpline`] per attribute; individual timelines can be
//!   edited through [`Interpolator::timeline_mut`].
//! - `FramesCalculated`: frames cached until the next edit.
//!
//! Editing the keyframe list (or looping / `nframes`) drops back to `Uninitialized`,
//! discarding any per-timeline edits.

use log::debug;

use crate::align::{align, Alignment};
use crate::attributes::{
    AttributeKey, GenomeSamples, GenomeTimelines, GenomeTracks, VariationTracks, XformTracks,
};
use crate::config::{CoefficientSpace, InterpConfig};
use crate::control_point::{ControlPoint, Tcb};
use crate::curve::CurveConfig;
use crate::error::InterpError;
use crate::genome::{Genome, Point, VarEntry, Xform};
use crate::render::{render_frames, BufferDesc, FrameRenderer};
use crate::timeline::{Samples, TimelineSpline};
use crate::Result;

/// A genome pinned to a frame time. `None` places it `nframes` after its predecessor.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub genome: Genome,
    pub time: Option<i64>,
}

impl Keyframe {
    pub fn new(genome: Genome) -> Self {
        Self { genome, time: None }
    }

    pub fn at(genome: Genome, time: i64) -> Self {
        Self {
            genome,
            time: Some(time),
        }
    }
}

impl From<Genome> for Keyframe {
    fn from(genome: Genome) -> Self {
        Self::new(genome)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum InterpState {
    Uninitialized,
    Aligned,
    TimelinesBuilt,
    FramesCalculated,
}

#[derive(Clone, Debug)]
pub struct Interpolator {
    config: InterpConfig,
    keyframes: Vec<Keyframe>,
    state: InterpState,
    alignment: Option<Alignment>,
    timelines: Option<GenomeTimelines>,
    frames: Vec<Genome>,
}

impl Interpolator {
    pub fn new(config: InterpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            keyframes: Vec::new(),
            state: InterpState::Uninitialized,
            alignment: None,
            timelines: None,
            frames: Vec::new(),
        })
    }

    pub fn with_keyframes<I, K>(keyframes: I, config: InterpConfig) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<Keyframe>,
    {
        let mut interp = Self::new(config)?;
        interp.keyframes = keyframes.into_iter().map(Into::into).collect();
        Ok(interp)
    }

    /// Genomes spaced `nframes` apart.
    pub fn from_genomes(genomes: Vec<Genome>, looping: bool, nframes: u32) -> Result<Self> {
        let config = InterpConfig::default()
            .with_looping(looping)
            .with_nframes(nframes);
        Self::with_keyframes(genomes, config)
    }

    // ---- accessors ----

    pub fn config(&self) -> &InterpConfig {
        &self.config
    }

    pub fn state(&self) -> InterpState {
        self.state
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn is_looping(&self) -> bool {
        self.config.looping
    }

    /// Resolved frame time of every keyframe.
    pub fn keyframe_times(&self) -> Vec<i64> {
        let step = i64::from(self.config.nframes);
        let mut times = Vec::with_capacity(self.keyframes.len());
        let mut previous: Option<i64> = None;
        for kf in &self.keyframes {
            let t = match (kf.time, previous) {
                (Some(t), _) => t,
                (None, Some(p)) => p + step,
                (None, None) => 0,
            };
            times.push(t);
            previous = Some(t);
        }
        times
    }

    /// Number of output frames. `None` until at least two keyframes exist, or while the
    /// keyframe times would be rejected by [`build_timelines`](Self::build_timelines)
    /// (first time not 0, or times not strictly increasing).
    pub fn length(&self) -> Option<usize> {
        if self.keyframes.len() < 2 {
            return None;
        }
        let times = self.keyframe_times();
        if times.first() != Some(&0) || times.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }
        let last = *times.last()?;
        let total = if self.config.looping {
            last + i64::from(self.config.nframes)
        } else {
            last
        };
        usize::try_from(total).ok()
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_ref()
    }

    pub fn timelines(&self) -> Option<&GenomeTimelines> {
        self.timelines.as_ref()
    }

    /// Frames from the last [`build_frames`](Self::build_frames); empty when stale.
    pub fn frames(&self) -> &[Genome] {
        &self.frames
    }

    // ---- keyframe edits ----

    pub fn push_keyframe(&mut self, keyframe: impl Into<Keyframe>) {
        self.keyframes.push(keyframe.into());
        self.invalidate("push_keyframe");
    }

    pub fn add_keyframe(&mut self, index: usize, keyframe: impl Into<Keyframe>) -> Result<()> {
        if index > self.keyframes.len() {
            return Err(InterpError::IndexOutOfRange {
                index,
                len: self.keyframes.len() + 1,
            });
        }
        self.keyframes.insert(index, keyframe.into());
        self.invalidate("add_keyframe");
        Ok(())
    }

    pub fn del_keyframe(&mut self, index: usize) -> Result<Keyframe> {
        if index >= self.keyframes.len() {
            return Err(InterpError::IndexOutOfRange {
                index,
                len: self.keyframes.len(),
            });
        }
        let removed = self.keyframes.remove(index);
        self.invalidate("del_keyframe");
        Ok(removed)
    }

    pub fn update_keyframe(&mut self, index: usize, keyframe: impl Into<Keyframe>) -> Result<()> {
        let len = self.keyframes.len();
        let slot = self
            .keyframes
            .get_mut(index)
            .ok_or(InterpError::IndexOutOfRange { index, len })?;
        *slot = keyframe.into();
        self.invalidate("update_keyframe");
        Ok(())
    }

    pub fn set_looping(&mut self, looping: bool) {
        if self.config.looping != looping {
            self.config.looping = looping;
            self.invalidate("set_looping");
        }
    }

    pub fn set_nframes(&mut self, nframes: u32) -> Result<()> {
        if nframes == 0 {
            return Err(InterpError::invalid_parameter(
                "nframes",
                "nframes must be > 0",
            ));
        }
        if self.config.nframes != nframes {
            self.config.nframes = nframes;
            self.invalidate("set_nframes");
        }
        Ok(())
    }

    fn invalidate(&mut self, reason: &str) {
        if self.state != InterpState::Uninitialized {
            debug!("interpo: {reason} invalidated {:?}", self.state);
        }
        self.state = InterpState::Uninitialized;
        self.alignment = None;
        self.timelines = None;
        self.frames.clear();
    }

    // ---- pipeline ----

    /// Run structural alignment if needed.
    pub fn align(&mut self) -> Result<&Alignment> {
        let alignment = match self.alignment.take() {
            Some(a) if self.state >= InterpState::Aligned => a,
            _ => {
                let genomes: Vec<Genome> =
                    self.keyframes.iter().map(|k| k.genome.clone()).collect();
                let a = align(&genomes, self.config.looping)?;
                self.state = InterpState::Aligned;
                a
            }
        };
        Ok(self.alignment.insert(alignment))
    }

    /// Build one timeline per attribute if needed. Requires two keyframes.
    pub fn build_timelines(&mut self) -> Result<&GenomeTimelines> {
        self.ensure_timelines()?;
        self.timelines
            .as_ref()
            .ok_or(InterpError::InsufficientKeyframes {
                actual: self.keyframes.len(),
            })
    }

    fn ensure_timelines(&mut self) -> Result<()> {
        let n = self.keyframes.len();
        if n < 2 {
            return Err(InterpError::InsufficientKeyframes { actual: n });
        }
        if self.state >= InterpState::TimelinesBuilt && self.timelines.is_some() {
            return Ok(());
        }
        let times = self.keyframe_times();
        let config = self.config.clone();
        let built = build_tracks(self.align()?, &times, &config)?;
        debug!(
            "interpo: built {} timelines for {} keyframes",
            built.len(),
            n
        );
        self.timelines = Some(built);
        self.frames.clear();
        self.state = InterpState::TimelinesBuilt;
        Ok(())
    }

    /// Timeline for `key`; available once timelines are built.
    pub fn timeline(&self, key: &AttributeKey) -> Result<&TimelineSpline> {
        self.timelines
            .as_ref()
            .and_then(|t| t.get(key))
            .ok_or_else(|| InterpError::UnknownAttribute {
                key: key.to_string(),
            })
    }

    /// Mutable timeline for `key`, building timelines first if needed.
    /// Cached frames are dropped.
    pub fn timeline_mut(&mut self, key: &AttributeKey) -> Result<&mut TimelineSpline> {
        self.ensure_timelines()?;
        if self.state == InterpState::FramesCalculated {
            self.state = InterpState::TimelinesBuilt;
            self.frames.clear();
        }
        self.timelines
            .as_mut()
            .and_then(|t| t.get_mut(key))
            .ok_or_else(|| InterpError::UnknownAttribute {
                key: key.to_string(),
            })
    }

    /// Curve of segment `segment` (index into [`TimelineSpline::vects`]) of one timeline.
    pub fn set_curve(
        &mut self,
        key: &AttributeKey,
        segment: usize,
        curve: CurveConfig,
    ) -> Result<()> {
        self.timeline_mut(key)?.set_curve(segment, curve)
    }

    /// TCB parameters of control point `point` (one per keyframe) of one timeline.
    pub fn set_spline(&mut self, key: &AttributeKey, point: usize, tcb: Tcb) -> Result<()> {
        self.timeline_mut(key)?.set_spline(point, tcb)
    }

    /// Calculate every timeline and reassemble one genome per frame.
    pub fn build_frames(&mut self) -> Result<&[Genome]> {
        if self.state == InterpState::FramesCalculated {
            return Ok(&self.frames);
        }
        self.ensure_timelines()?;
        let timelines = self
            .timelines
            .as_ref()
            .ok_or(InterpError::InsufficientKeyframes {
                actual: self.keyframes.len(),
            })?;
        let samples: GenomeSamples = timelines.try_map(TimelineSpline::calculate)?;
        let frames = assemble_frames(&samples, self.config.coefficient_space);
        debug!(
            "interpo: built {} frames from {} timelines",
            frames.len(),
            samples.len()
        );
        self.frames = frames;
        self.state = InterpState::FramesCalculated;
        Ok(&self.frames)
    }

    /// Build frames if needed and hand every one to `renderer`.
    pub fn render_all<R: FrameRenderer>(
        &mut self,
        renderer: &R,
        buffer: &BufferDesc,
    ) -> Result<Vec<R::Stats>> {
        self.build_frames()?;
        render_frames(&self.frames, renderer, buffer)
    }
}

// ---- timeline construction ----

fn build_tracks(
    alignment: &Alignment,
    times: &[i64],
    config: &InterpConfig,
) -> Result<GenomeTimelines> {
    let genomes = &alignment.genomes;
    let make = |values: Vec<Vec<f64>>| -> Result<TimelineSpline> {
        let points = values
            .into_iter()
            .zip(times)
            .map(|(v, &t)| ControlPoint::new(v, t).with_spline(config.spline))
            .collect();
        TimelineSpline::with_config(points, config)
    };
    let global = |f: fn(&Genome) -> f64| make(genomes.iter().map(|g| vec![f(g)]).collect());

    let xforms = (0..alignment.xform_count())
        .map(|i| -> Result<XformTracks<TimelineSpline>> {
            let xfs: Vec<&Xform> = genomes.iter().map(|g| &g.xforms[i]).collect();
            let scalar = |f: fn(&Xform) -> f64| make(xfs.iter().map(|x| vec![f(x)]).collect());
            let coef = |f: fn(&Xform) -> Point| {
                make(coefficient_values(
                    xfs.iter().map(|x| f(x)),
                    config.coefficient_space,
                ))
            };

            let variations = alignment.variations[i]
                .iter()
                .map(|&var| -> Result<VariationTracks<TimelineSpline>> {
                    let entries: Vec<&VarEntry> = xfs
                        .iter()
                        .map(|x| x.variation(var))
                        .collect::<Option<_>>()
                        .ok_or_else(|| InterpError::UnknownVariation {
                            name: format!("{var} missing from aligned transform {i}"),
                        })?;
                    let params = (0..var.params().len())
                        .map(|p| make(entries.iter().map(|e| vec![e.params[p]]).collect()))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(VariationTracks {
                        variation: var,
                        weight: make(entries.iter().map(|e| vec![e.weight]).collect())?,
                        params,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(XformTracks {
                weight: scalar(|x| x.weight)?,
                color: scalar(|x| x.color)?,
                symmetry: scalar(|x| x.symmetry)?,
                opacity: scalar(|x| x.opacity)?,
                o: coef(|x| x.o)?,
                x: coef(|x| x.x)?,
                y: coef(|x| x.y)?,
                variations,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GenomeTracks {
        brightness: global(|g| g.brightness)?,
        contrast: global(|g| g.contrast)?,
        gamma: global(|g| g.gamma)?,
        vibrancy: global(|g| g.vibrancy)?,
        rotate: global(|g| g.rotate)?,
        scale: global(|g| g.scale)?,
        symmetry: global(|g| f64::from(g.symmetry))?,
        center: make(
            genomes
                .iter()
                .map(|g| vec![g.center.x, g.center.y])
                .collect(),
        )?,
        xforms,
    })
}

/// Control values for one coefficient vector across keyframes.
///
/// Polar values are `[length, angle]` with the angle unwrapped so consecutive
/// keyframes never differ by more than 180 degrees.
fn coefficient_values(
    points: impl Iterator<Item = Point>,
    space: CoefficientSpace,
) -> Vec<Vec<f64>> {
    match space {
        CoefficientSpace::Rect => points.map(|p| vec![p.x, p.y]).collect(),
        CoefficientSpace::Polar => {
            let mut previous: Option<f64> = None;
            points
                .map(|p| {
                    let raw = p.angle_deg();
                    let angle = match previous {
                        None => raw,
                        Some(prev) => {
                            let d = raw - prev;
                            prev + (d - 360.0 * (d / 360.0).round())
                        }
                    };
                    previous = Some(angle);
                    vec![p.length(), angle]
                })
                .collect()
        }
    }
}

// ---- frame reassembly ----

fn assemble_frames(samples: &GenomeSamples, space: CoefficientSpace) -> Vec<Genome> {
    let count = samples.brightness.len();

    #[cfg(feature = "parallel")]
    let frames = {
        use rayon::prelude::*;
        (0..count)
            .into_par_iter()
            .map(|i| assemble_frame(samples, space, i))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let frames = (0..count)
        .map(|i| assemble_frame(samples, space, i))
        .collect();

    frames
}

fn coefficient_at(samples: &Samples, space: CoefficientSpace, frame: usize) -> Point {
    let (a, b) = (samples.at(0, frame), samples.at(1, frame));
    match space {
        CoefficientSpace::Rect => Point::new(a, b),
        CoefficientSpace::Polar => Point::from_polar(a, b),
    }
}

fn assemble_frame(samples: &GenomeSamples, space: CoefficientSpace, frame: usize) -> Genome {
    let xforms = samples
        .xforms
        .iter()
        .filter_map(|xt| {
            let weight = xt.weight.at(0, frame);
            if weight <= 0.0 {
                return None;
            }
            let variations = xt
                .variations
                .iter()
                .filter_map(|vt| {
                    let w = vt.weight.at(0, frame);
                    (w > 0.0).then(|| {
                        (
                            vt.variation,
                            VarEntry {
                                weight: w,
                                params: vt.params.iter().map(|p| p.at(0, frame)).collect(),
                            },
                        )
                    })
                })
                .collect();
            Some(Xform {
                weight,
                color: xt.color.at(0, frame),
                symmetry: xt.symmetry.at(0, frame),
                opacity: xt.opacity.at(0, frame),
                o: coefficient_at(&xt.o, space, frame),
                x: coefficient_at(&xt.x, space, frame),
                y: coefficient_at(&xt.y, space, frame),
                variations,
            })
        })
        .collect();

    Genome {
        name: None,
        brightness: samples.brightness.at(0, frame),
        contrast: samples.contrast.at(0, frame),
        gamma: samples.gamma.at(0, frame),
        vibrancy: samples.vibrancy.at(0, frame),
        rotate: samples.rotate.at(0, frame),
        scale: samples.scale.at(0, frame),
        symmetry: samples.symmetry.at(0, frame).round() as i32,
        center: Point::new(samples.center.at(0, frame), samples.center.at(1, frame)),
        xforms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variations::Variation;
    use approx::assert_abs_diff_eq;

    fn keyframe(brightness: f64, xforms: usize) -> Genome {
        Genome {
            brightness,
            ..Genome::with_xforms((0..xforms).map(|_| Xform::linear(0.5)).collect())
        }
    }

    #[test]
    fn state_machine_advances_and_resets() {
        let mut interp =
            Interpolator::from_genomes(vec![keyframe(1.0, 1), keyframe(3.0, 1)], false, 10)
                .unwrap();
        assert_eq!(interp.state(), InterpState::Uninitialized);
        interp.align().unwrap();
        assert_eq!(interp.state(), InterpState::Aligned);
        interp.build_timelines().unwrap();
        assert_eq!(interp.state(), InterpState::TimelinesBuilt);
        interp.build_frames().unwrap();
        assert_eq!(interp.state(), InterpState::FramesCalculated);

        interp.push_keyframe(keyframe(5.0, 1));
        assert_eq!(interp.state(), InterpState::Uninitialized);
        assert!(interp.frames().is_empty());
        assert_eq!(interp.build_frames().unwrap().len(), 20);
    }

    #[test]
    fn single_keyframe_is_insufficient() {
        let mut interp = Interpolator::from_genomes(vec![keyframe(1.0, 1)], false, 10).unwrap();
        assert_eq!(
            interp.build_frames().unwrap_err(),
            InterpError::InsufficientKeyframes { actual: 1 }
        );
    }

    #[test]
    fn explicit_times_mix_with_default_spacing() {
        let interp = Interpolator::with_keyframes(
            vec![
                Keyframe::new(keyframe(0.0, 1)),
                Keyframe::at(keyframe(1.0, 1), 30),
                Keyframe::new(keyframe(2.0, 1)),
            ],
            InterpConfig::default().with_nframes(10),
        )
        .unwrap();
        assert_eq!(interp.keyframe_times(), vec![0, 30, 40]);
        assert_eq!(interp.length(), Some(40));
    }

    #[test]
    fn length_is_none_for_times_timelines_reject() {
        let config = InterpConfig::default().with_nframes(10);
        let cases = [
            vec![Keyframe::at(keyframe(0.0, 1), 5), Keyframe::new(keyframe(1.0, 1))],
            vec![
                Keyframe::new(keyframe(0.0, 1)),
                Keyframe::at(keyframe(1.0, 1), 30),
                Keyframe::at(keyframe(2.0, 1), 20),
            ],
            vec![Keyframe::new(keyframe(0.0, 1)), Keyframe::at(keyframe(1.0, 1), 0)],
        ];
        for keyframes in cases {
            let mut interp = Interpolator::with_keyframes(keyframes, config.clone()).unwrap();
            assert_eq!(interp.length(), None, "{:?}", interp.keyframe_times());
            assert!(interp.build_timelines().is_err());
        }
    }

    #[test]
    fn linear_brightness_ramp() {
        let mut interp =
            Interpolator::from_genomes(vec![keyframe(2.0, 1), keyframe(4.0, 1)], false, 4)
                .unwrap();
        let frames = interp.build_frames().unwrap();
        let values: Vec<f64> = frames.iter().map(|g| g.brightness).collect();
        for (v, expected) in values.iter().zip([2.0, 2.5, 3.0, 3.5]) {
            assert_abs_diff_eq!(*v, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn zero_weight_transforms_and_variations_are_dropped() {
        let mut a = keyframe(1.0, 2);
        a.xforms[1].weight = 0.0;
        a.xforms[0].set_variation(Variation::Swirl, 0.0);
        let b = keyframe(1.0, 2);
        let mut interp = Interpolator::from_genomes(vec![a, b], false, 4).unwrap();
        let frames = interp.build_frames().unwrap().to_vec();
        assert_eq!(frames[0].xforms.len(), 1);
        assert!(frames[0].xforms[0].variation(Variation::Swirl).is_none());
        assert_eq!(frames[1].xforms.len(), 2);
    }

    #[test]
    fn timeline_edits_survive_until_keyframes_change() {
        let mut interp =
            Interpolator::from_genomes(vec![keyframe(0.0, 1), keyframe(4.0, 1)], false, 4)
                .unwrap();
        let key = AttributeKey::from(crate::attributes::GlobalAttr::Brightness);
        interp
            .set_curve(&key, 1, CurveConfig::new(crate::curve::CurveKind::Par))
            .unwrap();
        let eased = interp.build_frames().unwrap()[2].brightness;
        assert_abs_diff_eq!(eased, 1.0, epsilon = 1e-12);

        interp.set_looping(false);
        assert_eq!(interp.state(), InterpState::FramesCalculated);
        interp.set_looping(true);
        assert!(interp.timeline(&key).is_err());
    }

    #[test]
    fn polar_space_sweeps_rotation() {
        let mut a = keyframe(1.0, 1);
        let mut b = keyframe(1.0, 1);
        a.xforms[0].x = Point::from_polar(1.0, 170.0);
        b.xforms[0].x = Point::from_polar(1.0, -170.0);
        let config = InterpConfig::default()
            .with_nframes(2)
            .with_coefficient_space(CoefficientSpace::Polar);
        let mut interp = Interpolator::with_keyframes(vec![a, b], config).unwrap();
        let mid = interp.build_frames().unwrap()[1].xforms[0].x;
        assert_abs_diff_eq!(mid.length(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mid.angle_deg().abs(), 180.0, epsilon = 1e-9);
    }
}
