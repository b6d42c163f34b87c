//! Attribute addressing and the per-attribute track layout of an interpolated genome.
//!
//! [`GenomeTracks`] mirrors the genome schema with one `T` per interpolated attribute.
//! The interpolator holds a `GenomeTracks<TimelineSpline>` and calculates it into a
//! `GenomeTracks<Samples>` with the same shape.

use std::fmt;

use crate::timeline::{Samples, TimelineSpline};
use crate::variations::Variation;
use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlobalAttr {
    Brightness,
    Contrast,
    Gamma,
    Vibrancy,
    Rotate,
    Scale,
    Symmetry,
    Center,
}

impl GlobalAttr {
    pub const ALL: [GlobalAttr; 8] = [
        GlobalAttr::Brightness,
        GlobalAttr::Contrast,
        GlobalAttr::Gamma,
        GlobalAttr::Vibrancy,
        GlobalAttr::Rotate,
        GlobalAttr::Scale,
        GlobalAttr::Symmetry,
        GlobalAttr::Center,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Gamma => "gamma",
            Self::Vibrancy => "vibrancy",
            Self::Rotate => "rotate",
            Self::Scale => "scale",
            Self::Symmetry => "symmetry",
            Self::Center => "center",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XformAttr {
    Weight,
    Color,
    Symmetry,
    Opacity,
    O,
    X,
    Y,
}

impl XformAttr {
    pub const ALL: [XformAttr; 7] = [
        XformAttr::Weight,
        XformAttr::Color,
        XformAttr::Symmetry,
        XformAttr::Opacity,
        XformAttr::O,
        XformAttr::X,
        XformAttr::Y,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Color => "color",
            Self::Symmetry => "symmetry",
            Self::Opacity => "opacity",
            Self::O => "o",
            Self::X => "x",
            Self::Y => "y",
        }
    }
}

/// Identifies one interpolated attribute (one timeline).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    Global(GlobalAttr),
    Xform {
        index: usize,
        attr: XformAttr,
    },
    VariationWeight {
        index: usize,
        variation: Variation,
    },
    VariationParam {
        index: usize,
        variation: Variation,
        param: String,
    },
}

impl AttributeKey {
    pub fn xform(index: usize, attr: XformAttr) -> Self {
        Self::Xform { index, attr }
    }

    pub fn variation_weight(index: usize, variation: Variation) -> Self {
        Self::VariationWeight { index, variation }
    }

    pub fn variation_param(index: usize, variation: Variation, param: impl Into<String>) -> Self {
        Self::VariationParam {
            index,
            variation,
            param: param.into(),
        }
    }
}

impl From<GlobalAttr> for AttributeKey {
    fn from(attr: GlobalAttr) -> Self {
        Self::Global(attr)
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(attr) => f.write_str(attr.name()),
            Self::Xform { index, attr } => write!(f, "xform[{index}].{}", attr.name()),
            Self::VariationWeight { index, variation } => {
                write!(f, "xform[{index}].{variation}.weight")
            }
            Self::VariationParam {
                index,
                variation,
                param,
            } => write!(f, "xform[{index}].{variation}.{param}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariationTracks<T> {
    pub variation: Variation,
    pub weight: T,
    /// One track per registered sub-parameter, in registry order.
    pub params: Vec<T>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XformTracks<T> {
    pub weight: T,
    pub color: T,
    pub symmetry: T,
    pub opacity: T,
    pub o: T,
    pub x: T,
    pub y: T,
    pub variations: Vec<VariationTracks<T>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenomeTracks<T> {
    pub brightness: T,
    pub contrast: T,
    pub gamma: T,
    pub vibrancy: T,
    pub rotate: T,
    pub scale: T,
    pub symmetry: T,
    pub center: T,
    pub xforms: Vec<XformTracks<T>>,
}

pub type GenomeTimelines = GenomeTracks<TimelineSpline>;
pub type GenomeSamples = GenomeTracks<Samples>;

impl<T> VariationTracks<T> {
    fn try_map<U, F>(&self, f: &F) -> Result<VariationTracks<U>>
    where
        F: Fn(&T) -> Result<U>,
    {
        Ok(VariationTracks {
            variation: self.variation,
            weight: f(&self.weight)?,
            params: self.params.iter().map(f).collect::<Result<_>>()?,
        })
    }
}

impl<T> XformTracks<T> {
    pub fn attr(&self, attr: XformAttr) -> &T {
        match attr {
            XformAttr::Weight => &self.weight,
            XformAttr::Color => &self.color,
            XformAttr::Symmetry => &self.symmetry,
            XformAttr::Opacity => &self.opacity,
            XformAttr::O => &self.o,
            XformAttr::X => &self.x,
            XformAttr::Y => &self.y,
        }
    }

    pub fn attr_mut(&mut self, attr: XformAttr) -> &mut T {
        match attr {
            XformAttr::Weight => &mut self.weight,
            XformAttr::Color => &mut self.color,
            XformAttr::Symmetry => &mut self.symmetry,
            XformAttr::Opacity => &mut self.opacity,
            XformAttr::O => &mut self.o,
            XformAttr::X => &mut self.x,
            XformAttr::Y => &mut self.y,
        }
    }

    pub fn variation(&self, variation: Variation) -> Option<&VariationTracks<T>> {
        self.variations.iter().find(|v| v.variation == variation)
    }

    pub fn variation_mut(&mut self, variation: Variation) -> Option<&mut VariationTracks<T>> {
        self.variations.iter_mut().find(|v| v.variation == variation)
    }

    fn try_map<U, F>(&self, f: &F) -> Result<XformTracks<U>>
    where
        F: Fn(&T) -> Result<U>,
    {
        Ok(XformTracks {
            weight: f(&self.weight)?,
            color: f(&self.color)?,
            symmetry: f(&self.symmetry)?,
            opacity: f(&self.opacity)?,
            o: f(&self.o)?,
            x: f(&self.x)?,
            y: f(&self.y)?,
            variations: self
                .variations
                .iter()
                .map(|v| v.try_map(f))
                .collect::<Result<_>>()?,
        })
    }
}

impl<T> GenomeTracks<T> {
    pub fn global(&self, attr: GlobalAttr) -> &T {
        match attr {
            GlobalAttr::Brightness => &self.brightness,
            GlobalAttr::Contrast => &self.contrast,
            GlobalAttr::Gamma => &self.gamma,
            GlobalAttr::Vibrancy => &self.vibrancy,
            GlobalAttr::Rotate => &self.rotate,
            GlobalAttr::Scale => &self.scale,
            GlobalAttr::Symmetry => &self.symmetry,
            GlobalAttr::Center => &self.center,
        }
    }

    pub fn global_mut(&mut self, attr: GlobalAttr) -> &mut T {
        match attr {
            GlobalAttr::Brightness => &mut self.brightness,
            GlobalAttr::Contrast => &mut self.contrast,
            GlobalAttr::Gamma => &mut self.gamma,
            GlobalAttr::Vibrancy => &mut self.vibrancy,
            GlobalAttr::Rotate => &mut self.rotate,
            GlobalAttr::Scale => &mut self.scale,
            GlobalAttr::Symmetry => &mut self.symmetry,
            GlobalAttr::Center => &mut self.center,
        }
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&T> {
        match key {
            AttributeKey::Global(attr) => Some(self.global(*attr)),
            AttributeKey::Xform { index, attr } => self.xforms.get(*index).map(|x| x.attr(*attr)),
            AttributeKey::VariationWeight { index, variation } => self
                .xforms
                .get(*index)?
                .variation(*variation)
                .map(|v| &v.weight),
            AttributeKey::VariationParam {
                index,
                variation,
                param,
            } => {
                let slot = variation.param_index(param).ok()?;
                self.xforms
                    .get(*index)?
                    .variation(*variation)?
                    .params
                    .get(slot)
            }
        }
    }

    pub fn get_mut(&mut self, key: &AttributeKey) -> Option<&mut T> {
        match key {
            AttributeKey::Global(attr) => Some(self.global_mut(*attr)),
            AttributeKey::Xform { index, attr } => {
                self.xforms.get_mut(*index).map(|x| x.attr_mut(*attr))
            }
            AttributeKey::VariationWeight { index, variation } => self
                .xforms
                .get_mut(*index)?
                .variation_mut(*variation)
                .map(|v| &mut v.weight),
            AttributeKey::VariationParam {
                index,
                variation,
                param,
            } => {
                let slot = variation.param_index(param).ok()?;
                self.xforms
                    .get_mut(*index)?
                    .variation_mut(*variation)?
                    .params
                    .get_mut(slot)
            }
        }
    }

    /// Every addressable attribute, globals first, then per transform in order.
    pub fn keys(&self) -> Vec<AttributeKey> {
        let mut keys: Vec<AttributeKey> = GlobalAttr::ALL.iter().map(|&a| a.into()).collect();
        for (index, xf) in self.xforms.iter().enumerate() {
            keys.extend(XformAttr::ALL.iter().map(|&attr| AttributeKey::xform(index, attr)));
            for v in &xf.variations {
                keys.push(AttributeKey::variation_weight(index, v.variation));
                keys.extend(
                    v.variation
                        .params()
                        .iter()
                        .map(|p| AttributeKey::variation_param(index, v.variation, p.name)),
                );
            }
        }
        keys
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        GlobalAttr::ALL.len()
            + self
                .xforms
                .iter()
                .map(|x| {
                    XformAttr::ALL.len()
                        + x.variations
                            .iter()
                            .map(|v| 1 + v.params.len())
                            .sum::<usize>()
                })
                .sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Apply `f` to every track, keeping the layout. Transforms are processed in
    /// parallel with the `parallel` feature.
    pub fn try_map<U, F>(&self, f: F) -> Result<GenomeTracks<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> Result<U> + Sync,
    {
        #[cfg(feature = "parallel")]
        let xforms = {
            use rayon::prelude::*;
            self.xforms
                .par_iter()
                .map(|x| x.try_map(&f))
                .collect::<Result<Vec<_>>>()?
        };
        #[cfg(not(feature = "parallel"))]
        let xforms = self
            .xforms
            .iter()
            .map(|x| x.try_map(&f))
            .collect::<Result<Vec<_>>>()?;

        Ok(GenomeTracks {
            brightness: f(&self.brightness)?,
            contrast: f(&self.contrast)?,
            gamma: f(&self.gamma)?,
            vibrancy: f(&self.vibrancy)?,
            rotate: f(&self.rotate)?,
            scale: f(&self.scale)?,
            symmetry: f(&self.symmetry)?,
            center: f(&self.center)?,
            xforms,
        })
    }
}
