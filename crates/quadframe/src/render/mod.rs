//! Rendering hand-off
//!
//! The simulation core does not draw. It resolves drawable attachments once
//! per frame and passes them to a pluggable [`RenderSink`].

mod attachment;
mod sink;

pub use attachment::{Attachment, DrawItem};
pub use sink::{FrameInfo, LogSink, NullSink, RenderError, RenderSink};
