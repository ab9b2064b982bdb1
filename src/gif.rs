//! GIF animation implementation.

use std::cmp::max;
use std::io::Read;

use ::{Bitmap,DecoderOptions,GifError,GifResult,Rect,RgbaCanvas};
use colour::ColourResolver;
use compositor::{Compositor,Disposal,FramePixels,TRANSPARENT};
use cursor::ByteCursor;
use lzw::{LzwDecoder,LzwStatus};
use parser::*;

/// Loop count used when a stream has no looping extension.
pub const GIF_DEFAULT_LOOP_COUNT: u32 = 1;

/// A GIF animation over an in-memory, possibly still growing, buffer.
///
/// Frames are discovered by `initialise`, and composited onto the
/// canvas by `decode_frame`.  The canvas always holds exactly one
/// frame's worth of composited state, so seeking to anything other
/// than the next frame replays the animation from the first frame.
pub struct GifAnimation<B: Bitmap = RgbaCanvas> {
    data: Vec<u8>,
    opts: DecoderOptions,

    screen: Option<ScreenDescriptor>,
    width: usize,
    height: usize,
    loop_count: u32,
    background_index: u8,

    frames: Vec<GifFrame>,
    frame_count: usize,
    buffer_position: usize,
    complete: bool,

    colours: ColourResolver,
    lzw: LzwDecoder,
    indices: Vec<u8>,
    compositor: Compositor<B>,

    decoded_frame: Option<usize>,
    last_painted: Option<usize>,
    canvas_partial: bool,
    redraw: Rect,
    current_error: Option<GifError>,
}

/// Metadata of one frame.
#[derive(Clone,Debug,Eq,PartialEq)]
pub struct GifFrame {
    display: bool,
    delay: u16,
    frame_pointer: usize,
    virgin: bool,
    opaque: bool,
    disposal: Disposal,
    transparency: Option<u8>,
    interlaced: bool,
    rect: Rect,
    redraw: Rect,
}

/// Outcome of `GifAnimation::initialise`.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum ParseStatus {
    /// The trailer was reached; every frame is known.
    Complete,

    /// The buffer ended first.  Append more data and call again.
    Working,
}

/// Outcome of a successful `GifAnimation::decode_frame`.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum FrameStatus {
    /// The canvas shows the requested frame.
    Decoded,

    /// The frame exists but is not meant to be displayed; the canvas
    /// shows the frame before it.
    NotDisplayed,
}

/*--------------------------------------------------------------*/

impl GifFrame {
    /// Whether the frame should be displayed.
    pub fn display(&self) -> bool {
        self.display
    }

    /// Delay before advancing, in hundredths of a second.
    pub fn delay(&self) -> u16 {
        self.delay
    }

    /// Byte offset of the frame's image descriptor.
    pub fn frame_pointer(&self) -> usize {
        self.frame_pointer
    }

    /// True until the frame has been fully decoded once.
    pub fn virgin(&self) -> bool {
        self.virgin
    }

    /// Whether the frame has no transparent pixels.  Only meaningful
    /// once the frame has been decoded.
    pub fn opaque(&self) -> bool {
        self.opaque
    }

    pub fn disposal(&self) -> Disposal {
        self.disposal
    }

    pub fn transparency(&self) -> Option<u8> {
        self.transparency
    }

    pub fn interlaced(&self) -> bool {
        self.interlaced
    }

    /// The frame rectangle, relative to the canvas.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// The area of the canvas changed when this frame follows its
    /// predecessor.
    pub fn redraw_rect(&self) -> Rect {
        self.redraw
    }
}

impl FrameStatus {
    /// Numeric status, compatible with the classic C decoder's codes.
    pub fn code(&self) -> i32 {
        match *self {
            FrameStatus::Decoded => ::errcode::GIF_OK,
            FrameStatus::NotDisplayed => ::errcode::GIF_FRAME_NO_DISPLAY,
        }
    }
}

impl GifAnimation<RgbaCanvas> {
    /// Start decoding a GIF held in `data`, with default options.
    ///
    /// Nothing is parsed until `initialise` or `decode_frame` is
    /// called.
    ///
    /// # Examples
    ///
    /// ```
    /// let data = vec![
    ///     b'G', b'I', b'F', b'8', b'9', b'a',
    ///     0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00,
    ///     0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF,
    ///     0x2C, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
    ///     0x02, 0x02, 0x44, 0x01, 0x00,
    ///     0x3B ];
    ///
    /// let mut gif = nsgif::GifAnimation::new(data);
    /// assert_eq!(gif.initialise(), Ok(nsgif::ParseStatus::Complete));
    /// assert_eq!(gif.decode_frame(0), Ok(nsgif::FrameStatus::Decoded));
    /// assert_eq!(gif.image(), &[0xFF, 0x00, 0x00, 0xFF]);
    /// ```
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_options(data, DecoderOptions::default())
    }

    pub fn with_options(data: Vec<u8>, opts: DecoderOptions) -> Self {
        Self::with_bitmap(data, opts, RgbaCanvas::new())
    }

    /// Read a whole GIF stream and start decoding it.
    pub fn from_reader<R: Read>(mut r: R, opts: DecoderOptions)
            -> GifResult<Self> {
        let mut data = Vec::new();
        r.read_to_end(&mut data)?;
        Ok(Self::with_options(data, opts))
    }
}

impl<B: Bitmap> GifAnimation<B> {
    /// Start decoding into a caller supplied pixel sink.
    pub fn with_bitmap(data: Vec<u8>, opts: DecoderOptions, bitmap: B) -> Self {
        GifAnimation {
            data: data,
            opts: opts,

            screen: None,
            width: 0,
            height: 0,
            loop_count: GIF_DEFAULT_LOOP_COUNT,
            background_index: 0,

            frames: Vec::new(),
            frame_count: 0,
            buffer_position: 0,
            complete: false,

            colours: ColourResolver::new(),
            lzw: LzwDecoder::new(),
            indices: Vec::new(),
            compositor: Compositor::new(bitmap),

            decoded_frame: None,
            last_painted: None,
            canvas_partial: false,
            redraw: Rect::default(),
            current_error: None,
        }
    }

    /// Append newly arrived bytes to the stream.
    ///
    /// Offsets of everything parsed so far stay valid.
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// The bytes supplied so far.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.opts
    }

    /// Canvas width.  May grow while frames are discovered.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Canvas height.  May grow while frames are discovered.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of frames whose data has been seen in full.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Number of frames whose header has been seen, including one whose
    /// data is still arriving.
    pub fn frame_count_partial(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, n: usize) -> Option<&GifFrame> {
        self.frames.get(n)
    }

    pub fn frames(&self) -> &[GifFrame] {
        &self.frames
    }

    /// Delay of frame `n`, in hundredths of a second.
    pub fn delay(&self, n: usize) -> Option<u16> {
        self.frames.get(n).map(|f| f.delay)
    }

    /// Number of times to play the animation; 0 means forever.
    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn background_index(&self) -> u8 {
        self.background_index
    }

    pub fn screen_descriptor(&self) -> Option<&ScreenDescriptor> {
        self.screen.as_ref()
    }

    /// True once the trailer has been parsed.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Index of the frame currently on the canvas, if any.
    pub fn decoded_frame(&self) -> Option<usize> {
        self.decoded_frame
    }

    /// The error returned by the most recent call, if it failed.
    pub fn last_error(&self) -> Option<&GifError> {
        self.current_error.as_ref()
    }

    /// Area of the canvas changed by the most recent decode.
    pub fn redraw_rect(&self) -> Rect {
        self.redraw
    }

    /// The pixel sink holding the canvas.
    pub fn canvas(&self) -> &B {
        self.compositor.bitmap()
    }

    /// The canvas as RGBA bytes, row-major.
    pub fn image(&self) -> &[u8] {
        self.compositor.bitmap().pixels()
    }

    pub fn into_canvas(self) -> B {
        self.compositor.into_bitmap()
    }

    /// Parse the header, then as many frames as the buffer holds.
    ///
    /// Can be called again after `append` to pick up more frames.
    /// Returns `InsufficientData` if even the header is incomplete,
    /// and `DataError` if the stream is malformed.
    pub fn initialise(&mut self)
            -> GifResult<ParseStatus> {
        let res = self.parse_frames(None);
        self.record(res)
    }

    /// Composite frame `n` onto the canvas.
    ///
    /// If `n` is the successor of the frame on the canvas, only `n` is
    /// painted; otherwise the animation is replayed from frame 0.  On
    /// error the canvas is left at the last frame that decoded cleanly,
    /// unless partial frame painting is enabled.
    pub fn decode_frame(&mut self, n: usize)
            -> GifResult<FrameStatus> {
        let res = self.decode_frame_inner(n);
        self.record(res)
    }

    fn record<T>(&mut self, res: GifResult<T>) -> GifResult<T> {
        self.current_error = match res {
            Ok(_) => None,
            Err(ref e) => Some(e.duplicate()),
        };
        res
    }

    /*----------------------------------------------------------*/

    /// Parse forward until the trailer, the end of the buffer, or
    /// until frame `target` has been seen in full.
    fn parse_frames(&mut self, target: Option<usize>)
            -> GifResult<ParseStatus> {
        if self.screen.is_none() {
            self.parse_screen()?;
        }

        while !self.complete {
            if let Some(t) = target {
                if self.frame_count > t {
                    return Ok(ParseStatus::Working);
                }
            }

            match self.parse_frame() {
                Ok(()) => (),
                Err(GifError::InsufficientData)
                        | Err(GifError::InsufficientFrameData) => {
                    trace!("parse paused at offset {}", self.buffer_position);
                    return Ok(ParseStatus::Working);
                },
                Err(e) => return Err(e),
            }
        }

        Ok(ParseStatus::Complete)
    }

    /// Parse the signature, screen descriptor and global colour table.
    fn parse_screen(&mut self)
            -> GifResult<()> {
        let mut r = ByteCursor::new(&self.data, 0);
        let screen = parse_header(&mut r)?;

        if screen.has_global_table() {
            self.colours.read_global(&mut r, screen.global_table_entries())?;
        }

        let (w, h) = if self.opts.screen_size_quirks() && screen.is_bogus_size() {
            warn!("ignoring logical screen size {}x{}", screen.width, screen.height);
            (1, 1)
        } else {
            (screen.width as usize, screen.height as usize)
        };

        if screen.has_global_table()
                && screen.background_index as usize >= self.colours.global().len() {
            warn!("background index {} outside global colour table",
                    screen.background_index);
        }

        debug!("GIF {}x{}, global colour table {}",
                w, h, if screen.has_global_table() { screen.global_table_entries() } else { 0 });

        self.width = w;
        self.height = h;
        self.background_index = screen.background_index;
        self.buffer_position = r.position();
        self.screen = Some(screen);
        Ok(())
    }

    /// Parse the extensions and image block of the next frame.
    ///
    /// On a short buffer the parse position is left at the start of
    /// the frame, so the whole frame is parsed again next time.
    fn parse_frame(&mut self)
            -> GifResult<()> {
        let mut r = ByteCursor::new(&self.data, self.buffer_position);
        let mut ctl = GraphicControl::default();
        let mut loop_count = None;

        loop {
            match next_block(&r)? {
                Block::Extension => parse_extension(&mut r, &mut ctl, &mut loop_count)?,
                Block::Image => break,
                Block::Trailer => {
                    if self.frames.is_empty() {
                        debug!("trailer before any image");
                        return Err(GifError::DataError);
                    }

                    if let Some(count) = loop_count {
                        self.loop_count = count as u32;
                    }

                    debug!("trailer after {} frames", self.frame_count);
                    self.complete = true;
                    self.buffer_position = r.position() + 1;
                    return Ok(());
                },
            }
        }

        if let Some(count) = loop_count {
            self.loop_count = count as u32;
        }

        let frame_pointer = r.position();
        let desc = parse_image_descriptor(&mut r)?;
        if desc.has_local_table() {
            r.skip(3 * desc.local_table_entries())?;
        }
        let _min_code_size = r.read_u8()?;
        let skipped = r.skip_sub_blocks();
        let end = r.position();

        self.record_frame(frame_pointer, &desc, &ctl);

        match skipped {
            Ok(()) => (),
            Err(GifError::InsufficientData) => return Err(GifError::InsufficientFrameData),
            Err(e) => return Err(e),
        }

        self.frame_count = self.frame_count + 1;
        self.buffer_position = end;
        Ok(())
    }

    /// Create or refresh the metadata of the frame being parsed.
    fn record_frame(&mut self, frame_pointer: usize,
            desc: &ImageDescriptor, ctl: &GraphicControl) {
        let n = self.frame_count;
        let rect = Rect::new(desc.left as usize, desc.top as usize,
                desc.width as usize, desc.height as usize);

        let mut redraw = rect;
        if n > 0 {
            let prev = &self.frames[n - 1];
            if prev.disposal.requires_redraw() {
                redraw = redraw.union(&prev.rect);
            }
        }

        let mut frame = GifFrame {
            display: !rect.is_empty(),
            delay: ctl.delay,
            frame_pointer: frame_pointer,
            virgin: true,
            opaque: false,
            disposal: ctl.disposal,
            transparency: ctl.transparency,
            interlaced: desc.is_interlaced(),
            rect: rect,
            redraw: redraw,
        };

        if n < self.frames.len() {
            let old = &self.frames[n];
            if old.frame_pointer == frame_pointer {
                frame.virgin = old.virgin;
                frame.opaque = old.opaque;
            }
            self.frames[n] = frame;
        } else {
            debug!("frame {} at offset {}: {:?}", n, frame_pointer, rect);
            self.frames.push(frame);
        }

        let w = max(self.width, rect.x + rect.w);
        let h = max(self.height, rect.y + rect.h);
        if w != self.width || h != self.height {
            debug!("canvas grows from {}x{} to {}x{}", self.width, self.height, w, h);
            self.width = w;
            self.height = h;
        }
    }

    /*----------------------------------------------------------*/

    fn decode_frame_inner(&mut self, n: usize)
            -> GifResult<FrameStatus> {
        if n >= self.frame_count && !self.complete {
            match self.parse_frames(Some(n)) {
                Ok(_) => (),
                Err(e) => {
                    if n >= self.frames.len() {
                        return Err(e);
                    }
                },
            }
        }

        if n >= self.frames.len() {
            return Err(GifError::InsufficientData);
        }

        let (w, h) = (self.width, self.height);
        if self.compositor.ensure_size(w, h)? {
            self.decoded_frame = None;
            self.last_painted = None;
            self.canvas_partial = false;
        }

        if self.decoded_frame == Some(n) && !self.canvas_partial {
            self.redraw = Rect::default();
            return Ok(self.status_of(n));
        }

        let start = match self.decoded_frame {
            Some(d) if d + 1 == n && !self.canvas_partial => n,
            _ => 0,
        };

        if start == 0 {
            if n > 0 {
                debug!("replaying frames 0 to {}", n);
            }
            self.compositor.clear();
            self.decoded_frame = None;
            self.last_painted = None;
            self.canvas_partial = false;
            self.redraw = Rect::new(0, 0, w, h);
        } else {
            self.redraw = self.frames[n].redraw.clip(w, h);
        }

        for i in start..n {
            match self.composite(i) {
                Ok(_) => (),
                Err(GifError::FrameDataError) => {
                    // The canvas still shows the last frame that painted.
                    warn!("skipping corrupt frame {} during replay", i);
                },
                Err(e) => return Err(e),
            }
        }

        let status = self.composite(n)?;
        self.compositor.bitmap_mut().modified();
        Ok(status)
    }

    fn status_of(&self, n: usize) -> FrameStatus {
        if self.frames[n].display {
            FrameStatus::Decoded
        } else {
            FrameStatus::NotDisplayed
        }
    }

    /// Colour used by "restore to background" for the frame `prev`.
    fn background_colour(&self, prev: &GifFrame) -> [u8; 4] {
        if self.opts.transparent_background() || !self.colours.has_global() {
            return TRANSPARENT;
        }

        let idx = self.background_index;
        if prev.transparency == Some(idx) {
            return TRANSPARENT;
        }

        match self.colours.global().get(idx as usize) {
            Some(c) => [c[0], c[1], c[2], 0xFF],
            None => TRANSPARENT,
        }
    }

    /// Decode frame `n` and paint it over the canvas, which must hold
    /// the frames before it.
    fn composite(&mut self, n: usize)
            -> GifResult<FrameStatus> {
        let frame = self.frames[n].clone();
        if !frame.display {
            self.decoded_frame = Some(n);
            return Ok(FrameStatus::NotDisplayed);
        }

        let mut r = ByteCursor::new(&self.data, frame.frame_pointer);
        let desc = parse_image_descriptor(&mut r)?;
        if desc.has_local_table() {
            self.colours.read_local(&mut r, desc.local_table_entries())?;
        } else {
            self.colours.clear_local();
        }
        let min_code_size = r.read_u8()?;
        let data_pos = r.position();

        let total = frame.rect.w * frame.rect.h;
        if self.indices.len() < total {
            let extra = total - self.indices.len();
            self.indices.try_reserve_exact(extra).map_err(|_| GifError::InsufficientMemory)?;
            self.indices.resize(total, 0);
        }

        let (produced, status) = self.lzw.decode(
                &self.data, data_pos, min_code_size, &mut self.indices[..total])?;

        let partial = match status {
            LzwStatus::Complete => false,
            LzwStatus::Exhausted => true,
            LzwStatus::EarlyEnd => {
                if !self.opts.accept_early_end_code() {
                    debug!("frame {} ends after {} of {} pixels", n, produced, total);
                    return Err(GifError::FrameDataError);
                }
                false
            },
        };

        // A frame that decoded in full once has already been validated,
        // and its opacity is known.
        let opaque = if frame.virgin || partial {
            let palette = self.colours.palette(frame.transparency);
            palette.scan(&self.indices[..produced])?
        } else {
            frame.opaque
        };

        if partial && !self.opts.paint_partial_frames() {
            return Err(GifError::InsufficientFrameData);
        }

        if let Some(p) = self.last_painted {
            let prev = self.frames[p].clone();
            let background = self.background_colour(&prev);
            self.compositor.dispose(prev.disposal, prev.rect, background);
        }

        if frame.disposal == Disposal::Previous {
            self.compositor.save(frame.rect)?;
        }

        {
            let pixels = FramePixels {
                rect: frame.rect,
                indices: &self.indices[..produced],
                interlaced: frame.interlaced,
                palette: self.colours.palette(frame.transparency),
                opaque: opaque && !partial,
            };
            self.compositor.paint(&pixels);
        }

        if !partial && self.frames[n].virgin {
            self.frames[n].opaque = opaque && produced == total;
            self.frames[n].virgin = false;
        }

        let covers = frame.rect == Rect::new(0, 0, self.width, self.height);
        let canvas_opaque = !partial && self.frames[n].opaque && covers;
        self.compositor.bitmap_mut().set_opaque(canvas_opaque);

        self.last_painted = Some(n);
        self.decoded_frame = Some(n);
        self.canvas_partial = partial;

        if partial {
            return Err(GifError::InsufficientFrameData);
        }

        Ok(FrameStatus::Decoded)
    }
}
