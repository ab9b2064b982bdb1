//! Decoder options.

/// Behaviour switches for `GifAnimation`.
///
/// # Examples
///
/// ```
/// let opts = nsgif::DecoderOptions::new()
///     .set_paint_partial_frames()
///     .set_transparent_background();
///
/// assert!(opts.paint_partial_frames());
/// assert!(!opts.screen_size_quirks());
/// ```
#[derive(Clone,Copy,Debug,Default,Eq,PartialEq)]
pub struct DecoderOptions {
    paint_partial_frames: bool,
    transparent_background: bool,
    screen_size_quirks: bool,
    accept_early_end_code: bool,
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// If set, a frame whose compressed data is truncated is painted as
    /// far as it was decoded.  Otherwise the canvas keeps showing the
    /// last complete frame.
    pub fn set_paint_partial_frames(mut self) -> Self {
        self.paint_partial_frames = true;
        self
    }

    /// If set, "restore to background" always clears to transparent
    /// instead of the stream's background colour.
    pub fn set_transparent_background(mut self) -> Self {
        self.transparent_background = true;
        self
    }

    /// If set, logical screen sizes that look like a monitor
    /// resolution (640x480, 800x600, ...), zero, or larger than 2048
    /// are ignored and the canvas is sized from the frames.
    pub fn set_screen_size_quirks(mut self) -> Self {
        self.screen_size_quirks = true;
        self
    }

    /// If set, an end code that arrives before the frame rectangle is
    /// full ends the frame cleanly instead of being a frame data error.
    pub fn set_accept_early_end_code(mut self) -> Self {
        self.accept_early_end_code = true;
        self
    }

    pub fn paint_partial_frames(&self) -> bool {
        self.paint_partial_frames
    }

    pub fn transparent_background(&self) -> bool {
        self.transparent_background
    }

    pub fn screen_size_quirks(&self) -> bool {
        self.screen_size_quirks
    }

    pub fn accept_early_end_code(&self) -> bool {
        self.accept_early_end_code
    }
}
