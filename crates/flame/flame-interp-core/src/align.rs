//! Structural alignment: make every keyframe share one transform/variation layout.
//!
//! 1. Adjacent keyframes (and last→first when looping) are padded pairwise so both
//!    sides of every segment have the same transform count. Pads come from
//!    [`pad_for`](crate::padding::pad_for) applied to the counterpart transform.
//! 2. Any keyframe still short of the overall maximum is padded against the nearest
//!    keyframe that has the missing transform.
//! 3. Per transform index, the union of active variations is collected and every
//!    keyframe lacking one gets it at weight 0 with registered default parameters.

use std::collections::BTreeSet;

use log::debug;

use crate::error::InterpError;
use crate::genome::{Genome, VarEntry};
use crate::padding::pad_for;
use crate::variations::Variation;
use crate::Result;

/// Keyframes after alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    /// Padded and filled keyframe genomes, same order as the input.
    pub genomes: Vec<Genome>,
    /// Union of active variations per transform index, in registry order.
    pub variations: Vec<Vec<Variation>>,
    /// Number of pad transforms synthesized.
    pub pads: usize,
}

impl Alignment {
    pub fn xform_count(&self) -> usize {
        self.variations.len()
    }
}

/// Pad the shorter of `a` and `b` up to the longer one's transform count.
///
/// Returns the number of pads added.
pub fn pad_pair(a: &mut Genome, b: &mut Genome) -> usize {
    let (na, nb) = (a.xforms.len(), b.xforms.len());
    if na > nb {
        b.xforms.extend(a.xforms[nb..].iter().map(pad_for));
        na - nb
    } else {
        a.xforms.extend(b.xforms[na..].iter().map(pad_for));
        nb - na
    }
}

pub fn align(genomes: &[Genome], looping: bool) -> Result<Alignment> {
    if genomes.is_empty() {
        return Err(InterpError::InsufficientKeyframes { actual: 0 });
    }
    let mut aligned = genomes.to_vec();
    let n = aligned.len();
    let mut pads = 0;

    for i in 0..n - 1 {
        let (left, right) = aligned.split_at_mut(i + 1);
        pads += pad_pair(&mut left[i], &mut right[0]);
    }
    if looping && n > 1 {
        if let Some((first, rest)) = aligned.split_first_mut() {
            if let Some(last) = rest.last_mut() {
                pads += pad_pair(last, first);
            }
        }
    }

    let max = aligned.iter().map(|g| g.xforms.len()).max().unwrap_or(0);
    for k in 0..n {
        while aligned[k].xforms.len() < max {
            let i = aligned[k].xforms.len();
            let Some(j) = nearest_with_xform(&aligned, k, i) else {
                break;
            };
            let pad = pad_for(&aligned[j].xforms[i]);
            aligned[k].xforms.push(pad);
            pads += 1;
        }
    }

    let variations: Vec<Vec<Variation>> = (0..max)
        .map(|i| {
            aligned
                .iter()
                .flat_map(|g| g.xforms[i].active_variations())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .collect();

    for genome in &mut aligned {
        for (xf, union) in genome.xforms.iter_mut().zip(&variations) {
            for &var in union {
                xf.variations
                    .entry(var)
                    .or_insert_with(|| VarEntry::with_defaults(var, 0.0));
            }
        }
    }

    debug!(
        "align: {n} keyframes, {max} transforms, {pads} pads, {} variation slots",
        variations.iter().map(Vec::len).sum::<usize>()
    );
    Ok(Alignment {
        genomes: aligned,
        variations,
        pads,
    })
}

/// Closest keyframe to `k` that has a transform at `index` (later wins ties).
fn nearest_with_xform(genomes: &[Genome], k: usize, index: usize) -> Option<usize> {
    (1..genomes.len()).find_map(|d| {
        [k.checked_add(d), k.checked_sub(d)]
            .into_iter()
            .flatten()
            .find(|&j| j < genomes.len() && genomes[j].xforms.len() > index)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Xform;

    fn genome(n: usize) -> Genome {
        Genome::with_xforms((0..n).map(|_| Xform::linear(0.5)).collect())
    }

    #[test]
    fn shorter_keyframe_gets_weight_zero_pads() {
        let a = genome(2);
        let mut b = genome(4);
        b.xforms[3].set_variation(Variation::Spherical, 0.5);
        let out = align(&[a, b], false).unwrap();
        assert_eq!(out.pads, 2);
        assert_eq!(out.xform_count(), 4);
        assert_eq!(out.genomes[0].xforms.len(), 4);
        assert_eq!(out.genomes[1].xforms.len(), 4);
        for pad in &out.genomes[0].xforms[2..] {
            assert_eq!(pad.weight, 0.0);
            assert_eq!(pad.symmetry, 1.0);
        }
        // Spherical counterpart: inverse-linear pad.
        assert_eq!(
            out.genomes[0].xforms[3]
                .variation(Variation::Linear)
                .unwrap()
                .weight,
            -1.0
        );
    }

    #[test]
    fn variation_unions_are_filled_with_zero_weight() {
        let mut a = genome(1);
        a.xforms[0].set_variation(Variation::Julia, 0.3);
        let mut b = genome(1);
        b.xforms[0].set_variation(Variation::Blob, 0.2);
        let out = align(&[a, b], false).unwrap();
        assert_eq!(
            out.variations[0],
            vec![Variation::Linear, Variation::Julia, Variation::Blob]
        );
        let filled = out.genomes[0].xforms[0].variation(Variation::Blob).unwrap();
        assert_eq!(filled.weight, 0.0);
        assert_eq!(filled.params, Variation::Blob.default_params());
        assert_eq!(
            out.genomes[1].xforms[0]
                .variation(Variation::Julia)
                .unwrap()
                .weight,
            0.0
        );
    }

    #[test]
    fn non_adjacent_shortfall_is_padded_from_nearest() {
        let out = align(&[genome(2), genome(2), genome(4)], false).unwrap();
        for g in &out.genomes {
            assert_eq!(g.xforms.len(), 4);
        }
        assert_eq!(out.pads, 4);
    }

    #[test]
    fn looping_pads_wraparound_pair() {
        let out = align(&[genome(3), genome(3), genome(1)], true).unwrap();
        assert!(out.genomes.iter().all(|g| g.xforms.len() == 3));
    }

    #[test]
    fn empty_input_is_insufficient() {
        assert_eq!(
            align(&[], false).unwrap_err(),
            InterpError::InsufficientKeyframes { actual: 0 }
        );
    }
}
