//! GIF decoder error codes.

use std::io;

pub type GifResult<T> = Result<T, GifError>;

quick_error! {
    #[derive(Debug)]
    pub enum GifError {
        /// The buffer ends before a structurally required field.
        /// Append more bytes and call again.
        InsufficientData {
            description("insufficient data")
            display("Insufficient data")
        }

        /// A frame's compressed stream ends before every pixel was
        /// produced.  Append more bytes and call again.
        InsufficientFrameData {
            description("insufficient frame data")
            display("Insufficient frame data")
        }

        /// Malformed sub-block, corrupt LZW code or colour index out of
        /// range.  The frame cannot be trusted.
        FrameDataError {
            description("frame data error")
            display("Frame data error")
        }

        /// Malformed top-level structure.  The stream is unusable from
        /// this point forward.
        DataError {
            description("data error")
            display("Data error")
        }

        /// A buffer or table allocation failed.
        InsufficientMemory {
            description("insufficient memory")
            display("Insufficient memory")
        }

        // IO error.
        Io(err: io::Error) {
            from()
            description("io error")
            display("IO error: {}", err)
            cause(err)
        }
    }
}

/// Status code for a successful decode.
pub const GIF_OK: i32 = 0;

/// Status code for a frame flagged not to be displayed.
pub const GIF_FRAME_NO_DISPLAY: i32 = -6;

impl GifError {
    /// Numeric status, compatible with the classic C decoder's codes.
    pub fn code(&self) -> i32 {
        use self::GifError::*;
        match *self {
            InsufficientFrameData => -1,
            FrameDataError => -2,
            InsufficientData => -3,
            DataError => -4,
            InsufficientMemory => -5,
            Io(_) => -3,
        }
    }

    /// True if supplying more bytes may let the same call succeed.
    pub fn is_recoverable(&self) -> bool {
        match *self {
            GifError::InsufficientData | GifError::InsufficientFrameData => true,
            _ => false,
        }
    }

    /// Duplicate the error kind.  `Io` errors keep their kind only.
    pub fn duplicate(&self) -> GifError {
        use self::GifError::*;
        match *self {
            InsufficientData => InsufficientData,
            InsufficientFrameData => InsufficientFrameData,
            FrameDataError => FrameDataError,
            DataError => DataError,
            InsufficientMemory => InsufficientMemory,
            Io(ref err) => Io(io::Error::new(err.kind(), err.to_string())),
        }
    }
}

impl PartialEq for GifError {
    fn eq(&self, other: &GifError) -> bool {
        use self::GifError::*;
        match (self, other) {
            (&Io(ref a), &Io(ref b)) => a.kind() == b.kind(),
            (&Io(_), _) | (_, &Io(_)) => false,
            (a, b) => a.code() == b.code(),
        }
    }
}

/// Map a short read from `byteorder` to `InsufficientData`.
pub fn from_short_read(err: io::Error) -> GifError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        GifError::InsufficientData
    } else {
        GifError::Io(err)
    }
}
