//! Segments ("vects"): the editable curve state between two adjacent control points.

use serde::{Deserialize, Serialize};

use crate::curve::CurveConfig;

/// Where a segment sits in its timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectKind {
    /// Context-only segment before the first control point.
    LeadingEdge,
    /// Sampled segment between two real control points (including the loop wrap).
    Interior,
    /// Context-only segment after the last control point.
    TrailingEdge,
}

/// Pairs two control points (by index into the owning timeline) with a curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vect {
    pub start: usize,
    pub end: usize,
    /// Frames covered, `end.time - start.time` (or `nframes` for the loop wrap).
    pub length: i64,
    pub curve: CurveConfig,
    pub kind: VectKind,
}

impl Vect {
    pub fn interior(start: usize, end: usize, length: i64, curve: CurveConfig) -> Self {
        Self {
            start,
            end,
            length,
            curve,
            kind: VectKind::Interior,
        }
    }

    pub(crate) fn edge(kind: VectKind, start: usize, end: usize, length: i64) -> Self {
        Self {
            start,
            end,
            length,
            curve: CurveConfig::default(),
            kind,
        }
    }

    #[inline]
    pub fn is_edge(&self) -> bool {
        self.kind != VectKind::Interior
    }

    /// Remap point indices after a point was inserted at `at`.
    pub(crate) fn shift_up(&mut self, at: usize) {
        if self.start >= at {
            self.start += 1;
        }
        if self.end >= at {
            self.end += 1;
        }
    }

    /// Remap point indices after the point at `at` was removed.
    pub(crate) fn shift_down(&mut self, at: usize) {
        if self.start > at {
            self.start -= 1;
        }
        if self.end > at {
            self.end -= 1;
        }
    }
}
