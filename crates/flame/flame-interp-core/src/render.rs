//! Rendering seam: hand finished frames to an external renderer.
//!
//! Frames are independent, fully resolved genomes, so they can be dispatched in any
//! order; with the `parallel` feature they are rendered concurrently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InterpError;
use crate::genome::Genome;
use crate::Result;

/// Pixel buffer the renderer should fill for each frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferDesc {
    pub width: u32,
    pub height: u32,
    /// Channels per pixel (3 = RGB, 4 = RGBA).
    pub channels: u8,
}

impl BufferDesc {
    pub fn rgba(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            channels: 4,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * usize::from(self.channels)
    }
}

/// Statistics a flame renderer typically reports per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderStats {
    pub badvals: f64,
    pub num_iters: u64,
    pub render_seconds: f64,
}

/// External renderer: one genome in, statistics or an error out.
pub trait FrameRenderer: Sync {
    type Stats: Send;
    type Error: fmt::Display;

    fn render(
        &self,
        genome: &Genome,
        buffer: &BufferDesc,
    ) -> core::result::Result<Self::Stats, Self::Error>;
}

/// Render every frame, in frame order. The first failure aborts with
/// [`InterpError::Render`].
pub fn render_frames<R: FrameRenderer>(
    frames: &[Genome],
    renderer: &R,
    buffer: &BufferDesc,
) -> Result<Vec<R::Stats>> {
    let render_one = |(frame, genome): (usize, &Genome)| {
        renderer
            .render(genome, buffer)
            .map_err(|e| InterpError::Render {
                frame,
                reason: e.to_string(),
            })
    };

    #[cfg(feature = "parallel")]
    let stats = {
        use rayon::prelude::*;
        frames
            .par_iter()
            .enumerate()
            .map(render_one)
            .collect::<Result<Vec<_>>>()
    };
    #[cfg(not(feature = "parallel"))]
    let stats = frames
        .iter()
        .enumerate()
        .map(render_one)
        .collect::<Result<Vec<_>>>();

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail_on_brightness: Option<f64>,
    }

    impl FrameRenderer for Counting {
        type Stats = RenderStats;
        type Error = String;

        fn render(
            &self,
            genome: &Genome,
            buffer: &BufferDesc,
        ) -> core::result::Result<RenderStats, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(genome.brightness) == self.fail_on_brightness {
                return Err("bad genome".into());
            }
            Ok(RenderStats {
                num_iters: buffer.byte_len() as u64,
                ..RenderStats::default()
            })
        }
    }

    fn frames(n: usize) -> Vec<Genome> {
        (0..n)
            .map(|i| Genome {
                brightness: i as f64,
                ..Genome::default()
            })
            .collect()
    }

    #[test]
    fn renders_every_frame_in_order() {
        let renderer = Counting {
            calls: AtomicUsize::new(0),
            fail_on_brightness: None,
        };
        let stats = render_frames(&frames(5), &renderer, &BufferDesc::rgba(4, 2)).unwrap();
        assert_eq!(stats.len(), 5);
        assert_eq!(stats[0].num_iters, 32);
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn failure_reports_frame_index() {
        let renderer = Counting {
            calls: AtomicUsize::new(0),
            fail_on_brightness: Some(3.0),
        };
        let err = render_frames(&frames(5), &renderer, &BufferDesc::rgba(1, 1)).unwrap_err();
        assert_eq!(
            err,
            InterpError::Render {
                frame: 3,
                reason: "bad genome".into()
            }
        );
        assert_eq!(err.category(), "render");
    }
}
