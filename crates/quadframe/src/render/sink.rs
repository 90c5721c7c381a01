//! Render sink abstraction
//!
//! The frame loop produces a list of [`DrawItem`]s every quantum and hands
//! it to a [`RenderSink`]. Real backends (windows, GPUs, terminals) live
//! outside this crate and implement the trait.

use super::DrawItem;
use crate::foundation::time::FrameStats;
use thiserror::Error;

/// Per-frame metadata handed to the sink alongside the draw list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Frame number, starting at 1
    pub index: u64,
    /// Seconds since the previous quantum
    pub delta_time: f64,
    /// Timing counters
    pub stats: FrameStats,
}

/// Consumer of resolved frames
pub trait RenderSink: Send {
    /// Present one frame
    ///
    /// Errors are logged by the frame loop and never stop it.
    fn present_frame(&mut self, frame: &FrameInfo, items: &[DrawItem]) -> Result<(), RenderError>;
}

impl<F> RenderSink for F
where
    F: FnMut(&FrameInfo, &[DrawItem]) -> Result<(), RenderError> + Send,
{
    fn present_frame(&mut self, frame: &FrameInfo, items: &[DrawItem]) -> Result<(), RenderError> {
        self(frame, items)
    }
}

/// Sink that discards every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn present_frame(&mut self, _frame: &FrameInfo, _items: &[DrawItem]) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Sink that summarizes frames through the `log` facade
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    every: u64,
}

impl LogSink {
    /// Log one summary line every `every` frames (0 is treated as 1)
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1) }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(60)
    }
}

impl RenderSink for LogSink {
    fn present_frame(&mut self, frame: &FrameInfo, items: &[DrawItem]) -> Result<(), RenderError> {
        if frame.index % self.every == 0 {
            log::debug!(
                "Frame {}: {} drawables, dt={:.4}s, {:.1} fps",
                frame.index,
                items.len(),
                frame.delta_time,
                frame.stats.current_fps()
            );
        }
        for item in items {
            log::trace!(
                "  {} at ({:.1}, {:.1}) size {:.1}x{:.1}",
                item.sprite,
                item.position.x,
                item.position.y,
                item.size.x,
                item.size.y
            );
        }
        Ok(())
    }
}

/// Render sink errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// The output surface is gone (window closed, device lost)
    #[error("Render surface lost: {0}")]
    SurfaceLost(String),

    /// Presenting the frame failed
    ///
    /// Usually transient; the next frame is attempted regardless.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// A sprite key did not resolve to an asset
    #[error("Unknown sprite: {0}")]
    UnknownSprite(String),
}
