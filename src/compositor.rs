//! Frame compositing.
//!
//! The compositor owns the pixel sink.  For each frame it first undoes
//! the previous frame according to that frame's disposal method, then
//! paints the new frame's pixels over whatever is left.

use ::{GifError,GifResult,Rect};
use canvas::{BYTES_PER_PIXEL,Bitmap};
use colour::Palette;
use parser::GIF_DISPOSAL_MASK;

/// Fully transparent black, used to clear the canvas.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// What happens to a frame's rectangle before the next frame is
/// painted.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum Disposal {
    /// No disposal specified.  The canvas is left as is.
    Unspecified,

    /// Do not dispose.  The next frame is combined with this one.
    Combine,

    /// Restore the rectangle to the background.
    Background,

    /// Restore the rectangle to what it held before this frame.
    Previous,
}

/// Iterator over the canvas rows of an interlaced image, in the order
/// the rows are stored in the stream.
///
/// Pass 1 holds every 8th row starting at 0, pass 2 every 8th row
/// starting at 4, pass 3 every 4th row starting at 2, and pass 4 every
/// 2nd row starting at 1.
pub struct InterlacedRows {
    height: usize,
    pass: usize,
    y: usize,
}

/// Owner of the canvas, and of the snapshot that "restore to previous"
/// disposal needs.
pub struct Compositor<B: Bitmap> {
    bitmap: B,

    // Allocated on the first frame that asks for it, then reused.
    snapshot: Option<Vec<u8>>,
    snapshot_rect: Rect,
}

/// Decoded data of a single frame, ready to be painted.
pub struct FramePixels<'a> {
    /// Frame rectangle, relative to the canvas.
    pub rect: Rect,

    /// Colour table indices in stream order.  May be shorter than the
    /// rectangle if the frame was truncated.
    pub indices: &'a [u8],

    pub interlaced: bool,

    pub palette: Palette<'a>,

    /// Set if no index is transparent, so every pixel is copied.
    pub opaque: bool,
}

/*--------------------------------------------------------------*/

impl Disposal {
    /// Decode the disposal field of a graphic control extension.
    ///
    /// Method 4 is written by some encoders to mean "restore to
    /// previous"; 5 to 7 are undefined.
    pub fn from_packed(packed: u8) -> Self {
        match (packed & GIF_DISPOSAL_MASK) >> 2 {
            1 => Disposal::Combine,
            2 => Disposal::Background,
            3 | 4 => Disposal::Previous,
            _ => Disposal::Unspecified,
        }
    }

    /// True if the disposal changes the canvas, so the next frame's
    /// redraw area must include this frame's rectangle.
    pub fn requires_redraw(&self) -> bool {
        match *self {
            Disposal::Background | Disposal::Previous => true,
            _ => false,
        }
    }
}

impl Default for Disposal {
    fn default() -> Self {
        Disposal::Unspecified
    }
}

/// Canvas rows of an interlaced image of the given height, in stream
/// order.
///
/// # Examples
///
/// ```
/// let rows: Vec<usize> = nsgif::compositor::interlaced_rows(10).collect();
/// assert_eq!(rows, [0, 8, 4, 2, 6, 1, 3, 5, 7, 9]);
/// ```
pub fn interlaced_rows(height: usize) -> InterlacedRows {
    InterlacedRows {
        height: height,
        pass: 0,
        y: 0,
    }
}

impl Iterator for InterlacedRows {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        const START: [usize; 4] = [ 0, 4, 2, 1 ];
        const STEP: [usize; 4] = [ 8, 8, 4, 2 ];

        while self.pass < 4 {
            if self.y == 0 && START[self.pass] > 0 {
                self.y = START[self.pass];
            }

            if self.y < self.height {
                let y = self.y;
                self.y = self.y + STEP[self.pass];
                return Some(y);
            }

            self.pass = self.pass + 1;
            self.y = 0;
        }

        None
    }
}

impl<B: Bitmap> Compositor<B> {
    pub fn new(bitmap: B) -> Self {
        Compositor {
            bitmap: bitmap,
            snapshot: None,
            snapshot_rect: Rect::default(),
        }
    }

    pub fn bitmap(&self) -> &B {
        &self.bitmap
    }

    pub fn bitmap_mut(&mut self) -> &mut B {
        &mut self.bitmap
    }

    pub fn into_bitmap(self) -> B {
        self.bitmap
    }

    /// Make sure the sink is `w` by `h`.  Returns true if it had to be
    /// reallocated, which discards the canvas contents.
    pub fn ensure_size(&mut self, w: usize, h: usize)
            -> GifResult<bool> {
        if self.bitmap.width() == w && self.bitmap.height() == h
                && self.bitmap.pixels().len() == w * h * BYTES_PER_PIXEL {
            return Ok(false);
        }

        debug!("canvas resized to {}x{}", w, h);
        self.bitmap.resize(w, h)?;
        self.snapshot = None;
        self.snapshot_rect = Rect::default();
        Ok(true)
    }

    /// Clear the whole canvas to transparent, before the first frame.
    pub fn clear(&mut self) {
        for b in self.bitmap.pixels_mut().iter_mut() {
            *b = 0;
        }
        self.snapshot_rect = Rect::default();
    }

    /// Undo a frame that occupied `rect`, according to its disposal.
    pub fn dispose(&mut self, disposal: Disposal, rect: Rect, background: [u8; 4]) {
        match disposal {
            Disposal::Unspecified | Disposal::Combine => (),
            Disposal::Background => self.fill(rect, background),
            Disposal::Previous => self.restore(rect),
        }
    }

    /// Fill a rectangle with a single colour.
    pub fn fill(&mut self, rect: Rect, colour: [u8; 4]) {
        let w = self.bitmap.width();
        let rect = rect.clip(w, self.bitmap.height());
        if rect.is_empty() {
            return;
        }

        let stride = BYTES_PER_PIXEL * w;
        let buf = self.bitmap.pixels_mut();
        for row in buf.chunks_mut(stride).skip(rect.y).take(rect.h) {
            let start = BYTES_PER_PIXEL * rect.x;
            let end = BYTES_PER_PIXEL * (rect.x + rect.w);
            for px in row[start..end].chunks_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&colour);
            }
        }
    }

    /// Remember the contents of `rect`, so that a later `restore` can
    /// put them back.
    pub fn save(&mut self, rect: Rect)
            -> GifResult<()> {
        let w = self.bitmap.width();
        let rect = rect.clip(w, self.bitmap.height());
        let len = self.bitmap.pixels().len();

        if self.snapshot.is_none() {
            let mut snapshot = Vec::new();
            snapshot.try_reserve_exact(len).map_err(|_| GifError::InsufficientMemory)?;
            snapshot.resize(len, 0);
            self.snapshot = Some(snapshot);
            trace!("allocated {} byte snapshot", len);
        }

        let stride = BYTES_PER_PIXEL * w;
        if let Some(ref mut snapshot) = self.snapshot {
            copy_rect(self.bitmap.pixels(), snapshot, stride, rect);
        }

        self.snapshot_rect = rect;
        Ok(())
    }

    /// Put back the contents remembered by `save`.
    ///
    /// Only the part of `rect` covered by the last snapshot is
    /// restored; the snapshot is taken from the same frame, so that is
    /// all of it in practice.
    pub fn restore(&mut self, rect: Rect) {
        let w = self.bitmap.width();
        let rect = rect.clip(w, self.bitmap.height());
        if rect != self.snapshot_rect {
            warn!("restore of {:?} does not match snapshot {:?}", rect, self.snapshot_rect);
        }

        let stride = BYTES_PER_PIXEL * w;
        let rect = intersect(rect, self.snapshot_rect);
        if let Some(ref snapshot) = self.snapshot {
            copy_rect(snapshot, self.bitmap.pixels_mut(), stride, rect);
        }
    }

    /// Paint a frame over the canvas.
    ///
    /// Transparent pixels leave the canvas alone.  All indices must
    /// already have been validated against the palette.
    pub fn paint(&mut self, frame: &FramePixels) {
        let cw = self.bitmap.width();
        let ch = self.bitmap.height();
        let stride = BYTES_PER_PIXEL * cw;
        let rect = frame.rect;
        if rect.is_empty() {
            return;
        }

        let buf = self.bitmap.pixels_mut();
        let rows = frame.indices.chunks(rect.w);

        let mut paint_row = |y: usize, src: &[u8]| {
            let cy = rect.y + y;
            if cy >= ch || rect.x >= cw {
                return;
            }

            let n = if rect.x + src.len() > cw { cw - rect.x } else { src.len() };
            let start = stride * cy + BYTES_PER_PIXEL * rect.x;
            let dst = &mut buf[start..(start + BYTES_PER_PIXEL * n)];

            let pixels = dst.chunks_mut(BYTES_PER_PIXEL).zip(src.iter());
            if frame.opaque {
                for (px, &idx) in pixels {
                    if let Some(c) = frame.palette.colour(idx) {
                        px.copy_from_slice(&c);
                    }
                }
            } else {
                for (px, &idx) in pixels {
                    if let Ok(Some(c)) = frame.palette.resolve(idx) {
                        px.copy_from_slice(&c);
                    }
                }
            }
        };

        if frame.interlaced {
            for (y, src) in interlaced_rows(rect.h).zip(rows) {
                paint_row(y, src);
            }
        } else {
            for (y, src) in rows.enumerate().take(rect.h) {
                paint_row(y, src);
            }
        }
    }
}

fn intersect(a: Rect, b: Rect) -> Rect {
    let x0 = if a.x > b.x { a.x } else { b.x };
    let y0 = if a.y > b.y { a.y } else { b.y };
    let x1 = if a.x + a.w < b.x + b.w { a.x + a.w } else { b.x + b.w };
    let y1 = if a.y + a.h < b.y + b.h { a.y + a.h } else { b.y + b.h };
    if x1 <= x0 || y1 <= y0 {
        Rect::default()
    } else {
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Copy `rect` between two canvas-sized buffers.
fn copy_rect(src: &[u8], dst: &mut [u8], stride: usize, rect: Rect) {
    if rect.is_empty() {
        return;
    }

    for y in rect.y..(rect.y + rect.h) {
        let start = stride * y + BYTES_PER_PIXEL * rect.x;
        let end = start + BYTES_PER_PIXEL * rect.w;
        dst[start..end].copy_from_slice(&src[start..end]);
    }
}

#[cfg(test)]
mod tests {
    use ::{Rect,RgbaCanvas};
    use colour::{ColourTable,Palette};
    use super::{Compositor,Disposal,FramePixels,interlaced_rows};

    const RED: [u8; 4] = [0xFF, 0x00, 0x00, 0xFF];
    const BLUE: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];

    fn compositor(w: usize, h: usize) -> Compositor<RgbaCanvas> {
        let mut c = Compositor::new(RgbaCanvas::new());
        assert_eq!(c.ensure_size(w, h).expect("size"), true);
        c
    }

    fn pixel(c: &Compositor<RgbaCanvas>, x: usize, y: usize) -> [u8; 4] {
        c.bitmap().pixel(x, y).expect("pixel")
    }

    #[test]
    fn test_disposal_from_packed() {
        assert_eq!(Disposal::from_packed(0x00), Disposal::Unspecified);
        assert_eq!(Disposal::from_packed(0x04), Disposal::Combine);
        assert_eq!(Disposal::from_packed(0x09), Disposal::Background);
        assert_eq!(Disposal::from_packed(0x0C), Disposal::Previous);
        assert_eq!(Disposal::from_packed(0x10), Disposal::Previous);
        assert_eq!(Disposal::from_packed(0x1C), Disposal::Unspecified);
    }

    #[test]
    fn test_interlaced_rows() {
        let rows: Vec<usize> = interlaced_rows(16).collect();
        assert_eq!(rows, [ 0, 8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15 ]);

        let rows: Vec<usize> = interlaced_rows(1).collect();
        assert_eq!(rows, [ 0 ]);

        let rows: Vec<usize> = interlaced_rows(3).collect();
        assert_eq!(rows, [ 0, 2, 1 ]);

        assert_eq!(interlaced_rows(0).count(), 0);
    }

    #[test]
    fn test_paint_transparent_keeps_canvas() {
        let table = ColourTable::from_rgb(&[ 0xFF, 0, 0, 0, 0, 0xFF ]);
        let mut c = compositor(2, 1);
        c.fill(Rect::new(0, 0, 2, 1), BLUE);

        c.paint(&FramePixels {
            rect: Rect::new(0, 0, 2, 1),
            indices: &[ 0, 1 ],
            interlaced: false,
            palette: Palette::new(&table, Some(1)),
            opaque: false,
        });

        assert_eq!(pixel(&c, 0, 0), RED);
        assert_eq!(pixel(&c, 1, 0), BLUE);
    }

    #[test]
    fn test_paint_partial_frame() {
        let table = ColourTable::from_rgb(&[ 0xFF, 0, 0 ]);
        let mut c = compositor(2, 2);

        c.paint(&FramePixels {
            rect: Rect::new(0, 0, 2, 2),
            indices: &[ 0, 0, 0 ],
            interlaced: false,
            palette: Palette::new(&table, None),
            opaque: true,
        });

        assert_eq!(pixel(&c, 0, 1), RED);
        assert_eq!(pixel(&c, 1, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn test_save_and_restore() {
        let mut c = compositor(3, 3);
        c.fill(Rect::new(0, 0, 3, 3), BLUE);

        let rect = Rect::new(1, 1, 2, 2);
        assert!(c.save(rect).is_ok());
        c.fill(rect, RED);
        assert_eq!(pixel(&c, 2, 2), RED);

        c.dispose(Disposal::Previous, rect, [0; 4]);
        assert_eq!(pixel(&c, 2, 2), BLUE);
        assert_eq!(pixel(&c, 1, 1), BLUE);
    }

    #[test]
    fn test_dispose_background() {
        let mut c = compositor(3, 3);
        c.fill(Rect::new(0, 0, 3, 3), BLUE);
        c.dispose(Disposal::Background, Rect::new(0, 0, 1, 1), RED);

        assert_eq!(pixel(&c, 0, 0), RED);
        assert_eq!(pixel(&c, 1, 0), BLUE);

        c.dispose(Disposal::Combine, Rect::new(0, 0, 3, 3), RED);
        assert_eq!(pixel(&c, 1, 0), BLUE);
    }
}
