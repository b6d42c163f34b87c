//! Flame Interp Core (renderer-agnostic)
//!
//! Keyframe interpolation for fractal-flame genomes: per-attribute TCB spline
//! timelines with easing curves, structural alignment of keyframes with differing
//! transform/variation layouts, and frame assembly. Rendering is delegated to a
//! [`FrameRenderer`] supplied by the caller.

pub mod align;
pub mod attributes;
pub mod config;
pub mod control_point;
pub mod curve;
pub mod error;
pub mod genome;
pub mod interpo;
pub mod padding;
pub mod render;
pub mod segment;
pub mod stored_genome;
pub mod timeline;
pub mod variations;
pub mod vect;

// Re-exports for consumers (renderers, tools)
pub use align::{align, Alignment};
pub use attributes::{
    AttributeKey, GenomeSamples, GenomeTimelines, GenomeTracks, GlobalAttr, XformAttr,
};
pub use config::{CoefficientSpace, InterpConfig, Rederive};
pub use control_point::{ControlPoint, Tcb};
pub use curve::{curve, CurveConfig, CurveKind};
pub use error::InterpError;
pub use genome::{Genome, Point, VarEntry, Xform};
pub use interpo::{InterpState, Interpolator, Keyframe};
pub use padding::{pad_for, NeutralPad, PadRule, NEUTRAL_PADS};
pub use render::{render_frames, BufferDesc, FrameRenderer, RenderStats};
pub use segment::interpolate;
pub use stored_genome::{export_frames_json, parse_keyframes_json, KeyframeSet};
pub use timeline::{Samples, TimelineSpline};
pub use variations::Variation;
pub use vect::{Vect, VectKind};

pub type Result<T> = core::result::Result<T, InterpError>;
