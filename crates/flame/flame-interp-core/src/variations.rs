//! Variation function registry: every known variation with its sub-parameters.
//!
//! The table is fixed at compile time. Declaration order is the canonical order used
//! wherever variations are listed (transform maps, exported frames, the registry dump).

use std::fmt;
use std::str::FromStr;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::InterpError;
use crate::Result;

/// A named sub-parameter and the value it takes when not supplied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParamDefault {
    pub name: &'static str,
    pub default: f64,
}

macro_rules! variations {
    ($( $variant:ident => $name:literal { $($param:literal : $default:expr),* $(,)? } ),* $(,)?) => {
        /// Variation function identity.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum Variation {
            $( #[serde(rename = $name)] $variant, )*
        }

        impl Variation {
            pub const ALL: &'static [Variation] = &[$(Variation::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $( Variation::$variant => $name, )*
                }
            }

            /// Sub-parameters in canonical order; empty for non-parametric variations.
            pub fn params(self) -> &'static [ParamDefault] {
                match self {
                    $( Variation::$variant => &[$(ParamDefault { name: $param, default: $default }),*], )*
                }
            }
        }
    };
}

variations! {
    Linear => "linear" {},
    Sinusoidal => "sinusoidal" {},
    Spherical => "spherical" {},
    Swirl => "swirl" {},
    Horseshoe => "horseshoe" {},
    Polar => "polar" {},
    Handkerchief => "handkerchief" {},
    Heart => "heart" {},
    Disc => "disc" {},
    Spiral => "spiral" {},
    Hyperbolic => "hyperbolic" {},
    Diamond => "diamond" {},
    Ex => "ex" {},
    Julia => "julia" {},
    Bent => "bent" {},
    Waves => "waves" {},
    Fisheye => "fisheye" {},
    Popcorn => "popcorn" {},
    Exponential => "exponential" {},
    Power => "power" {},
    Cosine => "cosine" {},
    Rings => "rings" {},
    Fan => "fan" {},
    Blob => "blob" { "high": 1.0, "low": 0.0, "waves": 1.0 },
    Pdj => "pdj" { "a": 0.0, "b": 0.0, "c": 0.0, "d": 0.0 },
    Fan2 => "fan2" { "x": 0.0, "y": 1.0 },
    Rings2 => "rings2" { "val": 0.0 },
    Eyefish => "eyefish" {},
    Bubble => "bubble" {},
    Cylinder => "cylinder" {},
    Perspective => "perspective" { "angle": 0.0, "dist": 0.0 },
    Noise => "noise" {},
    Julian => "julian" { "power": 1.0, "dist": 1.0 },
    Juliascope => "juliascope" { "power": 1.0, "dist": 1.0 },
    Blur => "blur" {},
    GaussianBlur => "gaussian_blur" {},
    RadialBlur => "radial_blur" {},
    Pie => "pie" { "slices": 6.0, "rotation": 0.0, "thickness": 0.0 },
    Ngon => "ngon" { "sides": 5.0, "power": 3.0, "circle": 1.0, "corners": 2.0 },
    Curl => "curl" { "c1": 1.0, "c2": 0.0 },
    Rectangles => "rectangles" { "x": 1.0, "y": 1.0 },
    Arch => "arch" {},
    Tangent => "tangent" {},
    Square => "square" {},
    Rays => "rays" {},
    Blade => "blade" {},
    Secant2 => "secant2" {},
    Twintrian => "twintrian" {},
    Cross => "cross" {},
    Disc2 => "disc2" { "rot": 0.0, "twist": 0.0 },
    SuperShape => "super_shape" {
        "rnd": 0.0, "m": 0.0, "n1": 1.0, "n2": 1.0, "n3": 1.0, "holes": 0.0
    },
    Flower => "flower" { "petals": 0.0, "holes": 0.0 },
    Conic => "conic" { "eccentricity": 1.0, "holes": 0.0 },
    Parabola => "parabola" { "height": 0.0, "width": 0.0 },
    Bent2 => "bent2" { "x": 0.0, "y": 0.0 },
    Bipolar => "bipolar" { "shift": 0.0 },
    Boarders => "boarders" {},
    Butterfly => "butterfly" {},
    Cell => "cell" { "size": 1.0 },
    Cpow => "cpow" { "r": 1.0, "i": 0.0, "power": 1.0 },
    Curve => "curve" { "xamp": 1.0, "yamp": 1.0, "xlength": 1.0, "ylength": 1.0 },
    Edisc => "edisc" {},
    Elliptic => "elliptic" {},
    Escher => "escher" { "beta": 0.0 },
    Foci => "foci" {},
    Lazysusan => "lazysusan" { "spin": 0.0, "space": 0.0, "twist": 0.0, "x": 1.0, "y": 1.0 },
    Loonie => "loonie" {},
    PreBlur => "pre_blur" {},
    Modulus => "modulus" { "x": 1.0, "y": 1.0 },
    Oscilloscope => "oscilloscope" {},
    Polar2 => "polar2" {},
    Popcorn2 => "popcorn2" { "x": 0.0, "y": 0.0, "c": 0.0 },
    Scry => "scry" {},
    Separation => "separation" { "x": 0.0, "xinside": 0.0, "y": 0.0, "yinside": 0.0 },
    Split => "split" { "xsize": 0.0, "ysize": 0.0 },
    Splits => "splits" { "x": 1.0, "y": 1.0 },
    Stripes => "stripes" { "space": 1.0, "warp": 0.0 },
    Wedge => "wedge" { "angle": 0.0, "hole": 0.0, "count": 0.0, "swirl": 0.0 },
    WedgeJulia => "wedge_julia" { "angle": 0.0, "count": 0.0, "power": 2.0, "dist": 1.0 },
    WedgeSph => "wedge_sph" { "angle": 0.0, "count": 0.0, "hole": 0.0, "swirl": 0.0 },
    Whorl => "whorl" { "inside": 1.0, "outside": 1.0 },
    Waves2 => "waves2" { "freqx": 1.0, "scalex": 1.0, "freqy": 1.0, "scaley": 1.0 },
}

static BY_NAME: Lazy<HashMap<&'static str, Variation>> =
    Lazy::new(|| Variation::ALL.iter().map(|v| (v.name(), *v)).collect());

impl Variation {
    pub fn from_name(name: &str) -> Result<Self> {
        BY_NAME
            .get(name)
            .copied()
            .ok_or_else(|| InterpError::UnknownVariation {
                name: name.to_string(),
            })
    }

    #[inline]
    pub fn is_parametric(self) -> bool {
        !self.params().is_empty()
    }

    /// Position of sub-parameter `param` in [`params`](Self::params).
    pub fn param_index(self, param: &str) -> Result<usize> {
        self.params()
            .iter()
            .position(|p| p.name == param)
            .ok_or_else(|| InterpError::UnknownParameter {
                variation: self.name().to_string(),
                param: param.to_string(),
            })
    }

    /// Registered defaults, in canonical order.
    pub fn default_params(self) -> Vec<f64> {
        self.params().iter().map(|p| p.default).collect()
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variation {
    type Err = InterpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_complete_and_unique() {
        assert_eq!(Variation::ALL.len(), 82);
        assert_eq!(BY_NAME.len(), Variation::ALL.len());
        for v in Variation::ALL {
            let mut names: Vec<&str> = v.params().iter().map(|p| p.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), v.params().len(), "duplicate param on {v}");
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Variation::from_name("wedge_julia").unwrap(), Variation::WedgeJulia);
        assert_eq!("linear".parse::<Variation>().unwrap(), Variation::Linear);
        let err = Variation::from_name("linaer").unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn parameter_schema() {
        assert!(!Variation::Linear.is_parametric());
        assert_eq!(Variation::Blob.default_params(), vec![1.0, 0.0, 1.0]);
        assert_eq!(Variation::Ngon.param_index("circle").unwrap(), 2);
        assert!(matches!(
            Variation::Curl.param_index("c3").unwrap_err(),
            InterpError::UnknownParameter { .. }
        ));
    }

    #[test]
    fn serde_uses_registry_names() {
        let json = serde_json::to_string(&Variation::GaussianBlur).unwrap();
        assert_eq!(json, "\"gaussian_blur\"");
        let back: Variation = serde_json::from_str("\"super_shape\"").unwrap();
        assert_eq!(back, Variation::SuperShape);
    }
}
