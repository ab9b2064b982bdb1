//! Canvas implementation.

use std::cmp::{max,min};

use ::{GifError,GifResult,Rect,RgbaCanvas};

/// Bytes per canvas pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Pixel sink for decoded frames.
///
/// The decoder asks the sink for a buffer of exactly
/// `width * height * 4` bytes, writes RGBA pixels into it, and tells it
/// whether the result is known to be fully opaque.  Implement this to
/// decode straight into a toolkit surface.
pub trait Bitmap {
    /// Reallocate for the given dimensions.  The new contents are fully
    /// transparent black.
    fn resize(&mut self, width: usize, height: usize) -> GifResult<()>;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// RGBA pixels, row-major.
    fn pixels(&self) -> &[u8];

    fn pixels_mut(&mut self) -> &mut [u8];

    /// Called after each decode with whether every pixel is opaque.
    fn set_opaque(&mut self, _opaque: bool) {}

    /// Called after the pixels have been changed.
    fn modified(&mut self) {}
}

impl RgbaCanvas {
    /// Allocate an empty canvas.  The decoder sizes it on first use.
    ///
    /// # Examples
    ///
    /// ```
    /// use nsgif::Bitmap;
    ///
    /// let canvas = nsgif::RgbaCanvas::new();
    /// assert_eq!(canvas.width(), 0);
    /// assert!(canvas.pixels().is_empty());
    /// ```
    pub fn new() -> Self {
        RgbaCanvas {
            w: 0,
            h: 0,
            buf: Vec::new(),
            opaque: false,
        }
    }

    /// Whether the decoder reported every pixel as opaque.
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// The RGBA value at (x, y), if inside the canvas.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.w || y >= self.h {
            return None;
        }

        let i = BYTES_PER_PIXEL * (self.w * y + x);
        let p = &self.buf[i..(i + BYTES_PER_PIXEL)];
        Some([p[0], p[1], p[2], p[3]])
    }
}

impl Default for RgbaCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Bitmap for RgbaCanvas {
    fn resize(&mut self, width: usize, height: usize)
            -> GifResult<()> {
        let len = width.checked_mul(height)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or(GifError::InsufficientMemory)?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len).map_err(|_| GifError::InsufficientMemory)?;
        buf.resize(len, 0);

        self.w = width;
        self.h = height;
        self.buf = buf;
        self.opaque = false;
        Ok(())
    }

    fn width(&self) -> usize {
        self.w
    }

    fn height(&self) -> usize {
        self.h
    }

    fn pixels(&self) -> &[u8] {
        &self.buf
    }

    fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn set_opaque(&mut self, opaque: bool) {
        self.opaque = opaque;
    }
}

/*--------------------------------------------------------------*/

impl Rect {
    pub fn new(x: usize, y: usize, w: usize, h: usize) -> Self {
        Rect {
            x: x,
            y: y,
            w: w,
            h: h,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        } else if other.is_empty() {
            return *self;
        }

        let x0 = min(self.x, other.x);
        let y0 = min(self.y, other.y);
        let x1 = max(self.x + self.w, other.x + other.w);
        let y1 = max(self.y + self.h, other.y + other.h);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Clip to a `w` by `h` canvas.
    pub fn clip(&self, w: usize, h: usize) -> Rect {
        let x0 = min(self.x, w);
        let y0 = min(self.y, h);
        let x1 = min(self.x.saturating_add(self.w), w);
        let y1 = min(self.y.saturating_add(self.h), h);
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}
