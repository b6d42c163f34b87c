//! Genome data model: global attributes plus an ordered list of transform components.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::InterpError;
use crate::variations::Variation;
use crate::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Angle from the +x axis, in degrees.
    pub fn angle_deg(&self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }

    pub fn from_polar(length: f64, angle_deg: f64) -> Self {
        let a = angle_deg.to_radians();
        Self::new(length * a.cos(), length * a.sin())
    }
}

impl std::ops::Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// One active variation on a transform: weight plus sub-parameters in registry order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VarEntry {
    pub weight: f64,
    pub params: Vec<f64>,
}

impl VarEntry {
    /// `weight` with the registered parameter defaults.
    pub fn with_defaults(variation: Variation, weight: f64) -> Self {
        Self {
            weight,
            params: variation.default_params(),
        }
    }
}

/// Transform component: affine coefficients plus weighted variation functions.
///
/// The affine part maps `(px, py)` to `x * px + y * py + o`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Xform {
    pub weight: f64,
    pub color: f64,
    pub symmetry: f64,
    pub opacity: f64,
    pub x: Point,
    pub y: Point,
    pub o: Point,
    pub variations: BTreeMap<Variation, VarEntry>,
}

impl Default for Xform {
    fn default() -> Self {
        Self {
            weight: 0.0,
            color: 0.0,
            symmetry: 0.0,
            opacity: 1.0,
            x: Point::new(1.0, 0.0),
            y: Point::new(0.0, 1.0),
            o: Point::default(),
            variations: BTreeMap::new(),
        }
    }
}

impl Xform {
    /// Identity transform with `linear` at full strength.
    pub fn linear(weight: f64) -> Self {
        let mut xf = Self {
            weight,
            ..Self::default()
        };
        xf.set_variation(Variation::Linear, 1.0);
        xf
    }

    /// flam3 coefficient order: `[x.x, x.y, y.x, y.y, o.x, o.y]`.
    pub fn coefs(&self) -> [f64; 6] {
        [self.x.x, self.x.y, self.y.x, self.y.y, self.o.x, self.o.y]
    }

    pub fn set_coefs(&mut self, c: [f64; 6]) {
        self.x = Point::new(c[0], c[1]);
        self.y = Point::new(c[2], c[3]);
        self.o = Point::new(c[4], c[5]);
    }

    /// Set the weight of `variation`, activating it with default parameters if needed.
    pub fn set_variation(&mut self, variation: Variation, weight: f64) {
        self.variations
            .entry(variation)
            .or_insert_with(|| VarEntry::with_defaults(variation, 0.0))
            .weight = weight;
    }

    /// Set one sub-parameter. An inactive variation is added with weight 0.
    pub fn set_variable(&mut self, variation: Variation, param: &str, value: f64) -> Result<()> {
        let idx = variation.param_index(param)?;
        self.variations
            .entry(variation)
            .or_insert_with(|| VarEntry::with_defaults(variation, 0.0))
            .params[idx] = value;
        Ok(())
    }

    pub fn variation(&self, variation: Variation) -> Option<&VarEntry> {
        self.variations.get(&variation)
    }

    pub fn variable(&self, variation: Variation, param: &str) -> Result<f64> {
        let idx = variation.param_index(param)?;
        let entry = self
            .variations
            .get(&variation)
            .ok_or_else(|| InterpError::UnknownVariation {
                name: format!("{variation} (not active on this transform)"),
            })?;
        Ok(entry.params[idx])
    }

    pub fn remove_variation(&mut self, variation: Variation) -> Option<VarEntry> {
        self.variations.remove(&variation)
    }

    pub fn active_variations(&self) -> impl Iterator<Item = Variation> + '_ {
        self.variations.keys().copied()
    }
}

/// A complete flame parameter set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub name: Option<String>,
    pub brightness: f64,
    pub contrast: f64,
    pub gamma: f64,
    pub vibrancy: f64,
    pub rotate: f64,
    /// Pixels per unit.
    pub scale: f64,
    pub symmetry: i32,
    pub center: Point,
    pub xforms: Vec<Xform>,
}

impl Default for Genome {
    fn default() -> Self {
        Self {
            name: None,
            brightness: 4.0,
            contrast: 1.0,
            gamma: 4.0,
            vibrancy: 1.0,
            rotate: 0.0,
            scale: 50.0,
            symmetry: 0,
            center: Point::default(),
            xforms: Vec::new(),
        }
    }
}

impl Genome {
    pub fn with_xforms(xforms: Vec<Xform>) -> Self {
        Self {
            xforms,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn set_variable_activates_with_defaults() {
        let mut xf = Xform::default();
        xf.set_variable(Variation::Blob, "low", 0.25).unwrap();
        let blob = xf.variation(Variation::Blob).unwrap();
        assert_eq!(blob.weight, 0.0);
        assert_eq!(blob.params, vec![1.0, 0.25, 1.0]);
        assert_eq!(xf.variable(Variation::Blob, "low").unwrap(), 0.25);

        xf.set_variation(Variation::Blob, 0.7);
        assert_eq!(xf.variation(Variation::Blob).unwrap().params[1], 0.25);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let mut xf = Xform::linear(1.0);
        let err = xf.set_variable(Variation::Linear, "x", 1.0).unwrap_err();
        assert!(matches!(err, InterpError::UnknownParameter { .. }));
        assert!(xf.variable(Variation::Curl, "c1").is_err());
    }

    #[test]
    fn variations_iterate_in_registry_order() {
        let mut xf = Xform::default();
        xf.set_variation(Variation::Waves2, 0.1);
        xf.set_variation(Variation::Linear, 0.5);
        xf.set_variation(Variation::Julia, 0.2);
        let order: Vec<Variation> = xf.active_variations().collect();
        assert_eq!(
            order,
            vec![Variation::Linear, Variation::Julia, Variation::Waves2]
        );
    }

    #[test]
    fn polar_roundtrip() {
        let p = Point::new(-1.0, 1.0);
        let q = Point::from_polar(p.length(), p.angle_deg());
        assert_abs_diff_eq!(q.x, p.x, epsilon = 1e-12);
        assert_abs_diff_eq!(q.y, p.y, epsilon = 1e-12);
        assert_abs_diff_eq!(p.angle_deg(), 135.0, epsilon = 1e-12);
    }

    #[test]
    fn coefs_follow_flam3_order() {
        let mut xf = Xform::default();
        xf.set_coefs([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(xf.x, Point::new(1.0, 2.0));
        assert_eq!(xf.o, Point::new(5.0, 6.0));
        assert_eq!(xf.coefs(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
