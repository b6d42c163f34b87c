//! Keyframe JSON source and frame export: stored schema converted to and from core genomes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::InterpConfig;
use crate::genome::{Genome, Point, VarEntry, Xform};
use crate::interpo::{Interpolator, Keyframe};
use crate::variations::Variation;
use crate::Result;

/// Keyframes parsed from JSON plus the optional settings stored alongside them.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyframeSet {
    pub nframes: Option<u32>,
    pub looping: Option<bool>,
    pub keyframes: Vec<Keyframe>,
}

impl KeyframeSet {
    /// `base` with the stored overrides applied.
    pub fn config(&self, base: InterpConfig) -> InterpConfig {
        let mut config = base;
        if let Some(n) = self.nframes {
            config.nframes = n;
        }
        if let Some(looping) = self.looping {
            config.looping = looping;
        }
        config
    }

    pub fn into_interpolator(self, base: InterpConfig) -> Result<Interpolator> {
        let config = self.config(base);
        Interpolator::with_keyframes(self.keyframes, config)
    }
}

/// Public API: parse keyframe JSON into core genomes.
///
/// Notes:
/// - Points (`center`, `x`, `y`, `o`) are `[x, y]` pairs; `coefs` (flam3 order) may be
///   given instead of `x`/`y`/`o`.
/// - A variation is either a bare weight or `{ "weight": w, "<param>": v, ... }`; missing
///   parameters take registry defaults.
/// - Unknown variation or parameter names are rejected.
pub fn parse_keyframes_json(s: &str) -> Result<KeyframeSet> {
    let stored: StoredKeyframeSet = serde_json::from_str(s)?;
    let keyframes = stored
        .keyframes
        .into_iter()
        .map(|k| {
            Ok(Keyframe {
                genome: to_core_genome(k.genome)?,
                time: k.time,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(KeyframeSet {
        nframes: stored.nframes,
        looping: stored.looping,
        keyframes,
    })
}

/// Export frames as serde_json::Value using the keyframe genome schema.
pub fn export_frames_json(frames: &[Genome]) -> serde_json::Value {
    let stored: Vec<StoredGenome> = frames.iter().map(to_stored_genome).collect();
    serde_json::json!({ "frames": stored })
}

pub fn genome_to_json(genome: &Genome) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(to_stored_genome(genome))?)
}

pub fn genome_from_json(value: serde_json::Value) -> Result<Genome> {
    to_core_genome(serde_json::from_value(value)?)
}

// ---- stored schema ----

#[derive(Deserialize)]
struct StoredKeyframeSet {
    #[serde(default)]
    nframes: Option<u32>,
    #[serde(default)]
    looping: Option<bool>,
    keyframes: Vec<StoredKeyframe>,
}

#[derive(Deserialize)]
struct StoredKeyframe {
    #[serde(default)]
    time: Option<i64>,
    genome: StoredGenome,
}

fn default_brightness() -> f64 {
    4.0
}
fn default_gamma() -> f64 {
    4.0
}
fn default_one() -> f64 {
    1.0
}
fn default_scale() -> f64 {
    50.0
}

#[derive(Serialize, Deserialize)]
struct StoredGenome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default = "default_brightness")]
    brightness: f64,
    #[serde(default = "default_one")]
    contrast: f64,
    #[serde(default = "default_gamma")]
    gamma: f64,
    #[serde(default = "default_one")]
    vibrancy: f64,
    #[serde(default)]
    rotate: f64,
    #[serde(default = "default_scale")]
    scale: f64,
    #[serde(default)]
    symmetry: i32,
    #[serde(default)]
    center: [f64; 2],
    #[serde(default)]
    xforms: Vec<StoredXform>,
}

#[derive(Serialize, Deserialize)]
struct StoredXform {
    weight: f64,
    #[serde(default)]
    color: f64,
    #[serde(default)]
    symmetry: f64,
    #[serde(default = "default_one")]
    opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coefs: Option<[f64; 6]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<[f64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    o: Option<[f64; 2]>,
    #[serde(default)]
    variations: BTreeMap<String, StoredVariation>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StoredVariation {
    Weight(f64),
    Full {
        weight: f64,
        #[serde(flatten)]
        params: BTreeMap<String, f64>,
    },
}

fn to_core_genome(sg: StoredGenome) -> Result<Genome> {
    let xforms = sg
        .xforms
        .into_iter()
        .map(to_core_xform)
        .collect::<Result<Vec<_>>>()?;
    Ok(Genome {
        name: sg.name,
        brightness: sg.brightness,
        contrast: sg.contrast,
        gamma: sg.gamma,
        vibrancy: sg.vibrancy,
        rotate: sg.rotate,
        scale: sg.scale,
        symmetry: sg.symmetry,
        center: point(sg.center),
        xforms,
    })
}

fn to_core_xform(sx: StoredXform) -> Result<Xform> {
    let mut xf = Xform {
        weight: sx.weight,
        color: sx.color,
        symmetry: sx.symmetry,
        opacity: sx.opacity,
        ..Xform::default()
    };
    if let Some(c) = sx.coefs {
        xf.set_coefs(c);
    }
    if let Some(x) = sx.x {
        xf.x = point(x);
    }
    if let Some(y) = sx.y {
        xf.y = point(y);
    }
    if let Some(o) = sx.o {
        xf.o = point(o);
    }
    for (name, stored) in sx.variations {
        let var = Variation::from_name(&name)?;
        match stored {
            StoredVariation::Weight(w) => xf.set_variation(var, w),
            StoredVariation::Full { weight, params } => {
                xf.set_variation(var, weight);
                for (param, value) in params {
                    xf.set_variable(var, &param, value)?;
                }
            }
        }
    }
    Ok(xf)
}

fn to_stored_genome(g: &Genome) -> StoredGenome {
    StoredGenome {
        name: g.name.clone(),
        brightness: g.brightness,
        contrast: g.contrast,
        gamma: g.gamma,
        vibrancy: g.vibrancy,
        rotate: g.rotate,
        scale: g.scale,
        symmetry: g.symmetry,
        center: [g.center.x, g.center.y],
        xforms: g.xforms.iter().map(to_stored_xform).collect(),
    }
}

fn to_stored_xform(xf: &Xform) -> StoredXform {
    let variations = xf
        .variations
        .iter()
        .map(|(var, entry)| (var.name().to_string(), to_stored_variation(*var, entry)))
        .collect();
    StoredXform {
        weight: xf.weight,
        color: xf.color,
        symmetry: xf.symmetry,
        opacity: xf.opacity,
        coefs: None,
        x: Some([xf.x.x, xf.x.y]),
        y: Some([xf.y.x, xf.y.y]),
        o: Some([xf.o.x, xf.o.y]),
        variations,
    }
}

fn to_stored_variation(var: Variation, entry: &VarEntry) -> StoredVariation {
    if !var.is_parametric() {
        return StoredVariation::Weight(entry.weight);
    }
    StoredVariation::Full {
        weight: entry.weight,
        params: var
            .params()
            .iter()
            .zip(&entry.params)
            .map(|(p, v)| (p.name.to_string(), *v))
            .collect(),
    }
}

fn point(p: [f64; 2]) -> Point {
    Point::new(p[0], p[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterpError;

    const SAMPLE: &str = r#"{
        "nframes": 20,
        "keyframes": [
            { "genome": {
                "name": "a",
                "center": [0.5, -0.5],
                "xforms": [
                    { "weight": 0.5, "color": 1.0, "coefs": [1, 0, 0, 1, 0.25, 0],
                      "variations": { "linear": 1.0, "blob": { "weight": 0.5, "low": 0.3 } } }
                ]
            } },
            { "time": 30, "genome": {
                "xforms": [ { "weight": 1.0, "variations": { "julia": 0.8 } } ]
            } }
        ]
    }"#;

    #[test]
    fn parses_keyframes_with_defaults() {
        let set = parse_keyframes_json(SAMPLE).unwrap();
        assert_eq!(set.nframes, Some(20));
        assert_eq!(set.looping, None);
        assert_eq!(set.keyframes.len(), 2);
        assert_eq!(set.keyframes[1].time, Some(30));

        let a = &set.keyframes[0].genome;
        assert_eq!(a.name.as_deref(), Some("a"));
        assert_eq!(a.center, Point::new(0.5, -0.5));
        assert_eq!(a.gamma, 4.0);
        let xf = &a.xforms[0];
        assert_eq!(xf.o, Point::new(0.25, 0.0));
        assert_eq!(xf.opacity, 1.0);
        let blob = xf.variation(Variation::Blob).unwrap();
        assert_eq!(blob.weight, 0.5);
        assert_eq!(blob.params, vec![1.0, 0.3, 1.0]);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let bad_var = r#"{ "keyframes": [ { "genome": { "xforms": [
            { "weight": 1, "variations": { "wobble": 1 } } ] } } ] }"#;
        assert!(matches!(
            parse_keyframes_json(bad_var).unwrap_err(),
            InterpError::UnknownVariation { .. }
        ));
        let bad_param = r#"{ "keyframes": [ { "genome": { "xforms": [
            { "weight": 1, "variations": { "curl": { "weight": 1, "c9": 2 } } } ] } } ] }"#;
        assert!(matches!(
            parse_keyframes_json(bad_param).unwrap_err(),
            InterpError::UnknownParameter { .. }
        ));
        assert!(matches!(
            parse_keyframes_json("{").unwrap_err(),
            InterpError::Serialization { .. }
        ));
    }

    #[test]
    fn exported_genome_reads_back() {
        let set = parse_keyframes_json(SAMPLE).unwrap();
        let genome = set.keyframes[0].genome.clone();
        let stored = genome_to_json(&genome).unwrap();
        assert!(stored["xforms"].is_array());
        let back = genome_from_json(stored).unwrap();
        assert_eq!(back, genome);

        let frames = export_frames_json(&[genome]);
        assert_eq!(
            frames["frames"][0]["xforms"][0]["variations"]["blob"]["low"],
            serde_json::json!(0.3)
        );
        assert_eq!(
            frames["frames"][0]["xforms"][0]["variations"]["linear"],
            serde_json::json!(1.0)
        );
    }

    #[test]
    fn overrides_apply_to_base_config() {
        let set = parse_keyframes_json(SAMPLE).unwrap();
        let cfg = set.config(InterpConfig::default().with_looping(true));
        assert_eq!(cfg.nframes, 20);
        assert!(cfg.looping);
        let interp = set.into_interpolator(InterpConfig::default()).unwrap();
        assert_eq!(interp.keyframe_times(), vec![0, 30]);
    }
}
