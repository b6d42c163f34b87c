//! Hole-filling: neutral transform components synthesized for structural padding.
//!
//! A pad stands in for a transform that exists on one keyframe but not its neighbour.
//! It is an identity affine with `linear` at full strength and weight 0, so fading it
//! in or out leaves the image unchanged. Some variations misbehave next to such a pad
//! (poles at the origin, degenerate parameters); when the counterpart transform uses
//! one of them, the matching [`NEUTRAL_PADS`] entry adjusts the pad.

use serde::Serialize;

use crate::genome::{VarEntry, Xform};
use crate::variations::Variation;

/// How a pad is neutralized against a given variation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PadRule {
    /// Negate the affine part and run `linear` at -1: the two sign flips cancel.
    InverseLinear,
    /// Replace `linear` by the trigger variation at weight 1 with these parameters;
    /// parameters not listed keep their registered defaults.
    Params {
        overrides: &'static [(&'static str, f64)],
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct NeutralPad {
    pub trigger: Variation,
    pub rule: PadRule,
}

const fn inverse(trigger: Variation) -> NeutralPad {
    NeutralPad {
        trigger,
        rule: PadRule::InverseLinear,
    }
}

const fn params(trigger: Variation, overrides: &'static [(&'static str, f64)]) -> NeutralPad {
    NeutralPad {
        trigger,
        rule: PadRule::Params { overrides },
    }
}

/// Neutral-pad table. The first entry whose trigger the counterpart uses wins.
pub static NEUTRAL_PADS: &[NeutralPad] = &[
    inverse(Variation::Spherical),
    inverse(Variation::Ngon),
    inverse(Variation::Julian),
    inverse(Variation::Juliascope),
    inverse(Variation::Polar),
    inverse(Variation::WedgeSph),
    inverse(Variation::WedgeJulia),
    params(Variation::Rectangles, &[("x", 0.0), ("y", 0.0)]),
    params(Variation::Rings2, &[("val", 0.0)]),
    params(Variation::Fan2, &[("x", 0.0), ("y", 0.0)]),
    params(
        Variation::Blob,
        &[("low", 1.0), ("high", 1.0), ("waves", 1.0)],
    ),
    params(Variation::Perspective, &[("angle", 0.0)]),
    params(Variation::Curl, &[("c1", 0.0), ("c2", 0.0)]),
    params(
        Variation::SuperShape,
        &[
            ("n1", 2.0),
            ("n2", 2.0),
            ("n3", 2.0),
            ("rnd", 0.0),
            ("holes", 0.0),
            ("m", 0.0),
        ],
    ),
];

/// Table entry applying to a pad for `counterpart`, if any.
pub fn neutral_pad_for(counterpart: &Xform) -> Option<&'static NeutralPad> {
    NEUTRAL_PADS
        .iter()
        .find(|entry| counterpart.variations.contains_key(&entry.trigger))
}

/// Build the pad for a transform missing opposite `counterpart`.
///
/// Colour and opacity follow the counterpart so only the weight fades.
pub fn pad_for(counterpart: &Xform) -> Xform {
    let mut pad = Xform {
        weight: 0.0,
        color: counterpart.color,
        symmetry: 1.0,
        opacity: counterpart.opacity,
        ..Xform::linear(0.0)
    };

    match neutral_pad_for(counterpart).map(|entry| (entry.trigger, entry.rule)) {
        None => {}
        Some((_, PadRule::InverseLinear)) => {
            pad.x = -pad.x;
            pad.y = -pad.y;
            pad.set_variation(Variation::Linear, -1.0);
        }
        Some((trigger, PadRule::Params { overrides })) => {
            pad.remove_variation(Variation::Linear);
            let mut entry = VarEntry::with_defaults(trigger, 1.0);
            for (name, value) in overrides {
                if let Some(idx) = trigger.params().iter().position(|p| p.name == *name) {
                    entry.params[idx] = *value;
                }
            }
            pad.variations.insert(trigger, entry);
        }
    }
    pad
}
