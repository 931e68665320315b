//! Device output contract.
//!
//! A sink effect has one pixel input, no outputs, and hands every frame it
//! receives to a [`PixelSink`]. The transport behind the sink (a network
//! socket, a terminal, an in-memory capture) is opaque to the graph.

use std::io;

use crate::signal::Rgb;

/// Something that can display a frame of pixels.
pub trait PixelSink: Send {
    /// Short identifier for diagnostics.
    fn name(&self) -> &str;

    /// Transmits one frame.
    fn write(&mut self, pixels: &[Rgb]) -> io::Result<()>;
}

impl<S: PixelSink + ?Sized> PixelSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write(&mut self, pixels: &[Rgb]) -> io::Result<()> {
        (**self).write(pixels)
    }
}
