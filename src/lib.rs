//! This crate provides a progressive decoder for GIF87a and GIF89a
//! images and animations.
//!
//! Frames are composited onto a persistent RGBA canvas following the
//! GIF disposal rules.  The decoder works on an in-memory buffer that
//! may grow between calls, so a stream can be decoded while it is
//! still arriving.

extern crate byteorder;
#[macro_use]
extern crate log;
#[macro_use]
extern crate quick_error;

pub use canvas::Bitmap;
pub use compositor::Disposal;
pub use errcode::GifError;
pub use errcode::GifResult;
pub use gif::{FrameStatus,GifAnimation,GifFrame,ParseStatus};
pub use options::DecoderOptions;

pub mod canvas;
pub mod colour;
pub mod compositor;
pub mod errcode;
pub mod gif;
pub mod lzw;
pub mod options;
pub mod parser;

mod cursor;

/// Owned RGBA pixel buffer, the default pixel sink.
///
/// Pixels are stored row-major, top to bottom, four bytes per pixel
/// in R, G, B, A order.
pub struct RgbaCanvas {
    w: usize,
    h: usize,
    buf: Vec<u8>,
    opaque: bool,
}

/// A rectangle of pixels, relative to the canvas.
#[derive(Clone,Copy,Debug,Default,Eq,PartialEq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}
