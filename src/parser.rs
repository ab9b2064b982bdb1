//! GIF container parsing.
//!
//! These routines read one structure at a time through a
//! `ByteCursor`.  None of them keep state between calls; the
//! animation records how far it got and restarts a block from its
//! first byte when the buffer turned out to be too short.

use ::{GifError,GifResult};
use colour::{GIF_COLOUR_TABLE_MASK,table_entries};
use compositor::Disposal;
use cursor::ByteCursor;

/// Size of the GIF signature and version on disk.
///
///   Offset | Length |   Name    | Description
///   ------:| ------:|:---------:| -----------------------------------
///        0 |      3 | signature | Always "GIF".
///        3 |      3 |  version  | "87a" or "89a".
pub const SIZE_OF_GIF_SIGNATURE: usize = 6;

/// Size of the logical screen descriptor on disk.
///
/// The logical screen descriptor immediately follows the signature.
/// It gives the size of the area the frames are composited into, and
/// whether a global colour table follows.
///
///   Offset | Length |    Name    | Description
///   ------:| ------:|:----------:| -----------------------------------
///        0 |      2 |   width    | Logical screen width in pixels.
///        2 |      2 |   height   | Logical screen height in pixels.
///        4 |      1 |   packed   | Bit 7: global colour table present.  Bits 4-6: colour resolution.  Bit 3: sorted.  Bits 0-2: global colour table size.
///        5 |      1 | background | Index of the background colour in the global colour table.
///        6 |      1 |   aspect   | Pixel aspect ratio, (aspect + 15) / 64.  Zero if not given.
pub const SIZE_OF_SCREEN_DESCRIPTOR: usize = 7;

/// Extension introducer.
///
/// An extension block is the introducer, a one byte label, and then a
/// chain of data sub-blocks ending with a zero-length block.
pub const GIF_EXTENSION_INTRODUCER: u8 = 0x21;

/// Image separator, the first byte of an image descriptor.
///
///   Offset | Length |   Name   | Description
///   ------:| ------:|:--------:| -----------------------------------
///        0 |      1 | separator| Always 0x2C.
///        1 |      2 |   left   | Column of the frame rectangle on the logical screen.
///        3 |      2 |   top    | Row of the frame rectangle on the logical screen.
///        5 |      2 |   width  | Width of the frame rectangle.
///        7 |      2 |  height  | Height of the frame rectangle.
///        9 |      1 |  packed  | Bit 7: local colour table present.  Bit 6: interlaced.  Bit 5: sorted.  Bits 0-2: local colour table size.
///
/// The optional local colour table follows, then a single byte with the
/// LZW minimum code size, then the compressed image data as a chain of
/// sub-blocks.
pub const GIF_IMAGE_SEPARATOR: u8 = 0x2C;

/// Trailer, the last byte of every complete GIF stream.
pub const GIF_TRAILER: u8 = 0x3B;

/// Label of a graphic control extension.
///
/// Controls how the next image block is displayed.  It holds a single
/// four byte sub-block:
///
///   Offset | Length |   Name   | Description
///   ------:| ------:|:--------:| -----------------------------------
///        0 |      1 |  packed  | Bits 2-4: disposal method.  Bit 1: user input.  Bit 0: transparency present.
///        1 |      2 |   delay  | Delay before the next frame, in hundredths of a second.
///        3 |      1 |  index   | Transparent colour index.
pub const GIF_EXTENSION_GRAPHIC_CONTROL: u8 = 0xF9;

/// Label of an application extension.
///
/// The first sub-block holds an eight byte application identifier and
/// a three byte authentication code.  The only application extension
/// acted upon is the Netscape looping extension, "NETSCAPE2.0" (or
/// the equivalent "ANIMEXTS1.0"), whose second sub-block is the byte 1
/// followed by a little-endian loop count.
pub const GIF_EXTENSION_APPLICATION: u8 = 0xFF;

/// Label of a comment extension.  Skipped.
pub const GIF_EXTENSION_COMMENT: u8 = 0xFE;

/// Label of a plain text extension.  Skipped.
pub const GIF_EXTENSION_PLAIN_TEXT: u8 = 0x01;

/// Mask for the interlace bit of the image descriptor.
pub const GIF_INTERLACE_MASK: u8 = 0x40;

/// Mask for the transparency bit of the graphic control extension.
pub const GIF_TRANSPARENCY_MASK: u8 = 0x01;

/// Mask for the disposal method of the graphic control extension.
pub const GIF_DISPOSAL_MASK: u8 = 0x1C;

/// Largest sane logical screen dimension when screen size quirks are
/// enabled.
pub const GIF_MAX_SANE_DIMENSION: usize = 2048;

/// Logical screen descriptor.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub packed: u8,
    pub background_index: u8,
    pub aspect_ratio: u8,
}

/// Image descriptor, without the separator byte.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub packed: u8,
}

/// Display parameters from a graphic control extension.
#[derive(Clone,Copy,Debug,Default,Eq,PartialEq)]
pub struct GraphicControl {
    pub disposal: Disposal,
    pub delay: u16,
    pub transparency: Option<u8>,
}

/// The kind of the next top-level block.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum Block {
    Extension,
    Image,
    Trailer,
}

/*--------------------------------------------------------------*/

impl ScreenDescriptor {
    pub fn has_global_table(&self) -> bool {
        self.packed & GIF_COLOUR_TABLE_MASK != 0
    }

    /// Number of entries in the global colour table.
    pub fn global_table_entries(&self) -> usize {
        table_entries(self.packed)
    }

    /// Bits per primary colour in the original image.
    pub fn colour_resolution(&self) -> u8 {
        ((self.packed >> 4) & 0x07) + 1
    }

    /// True if the dimensions look like a screen size written by a
    /// broken encoder rather than the image size.
    pub fn is_bogus_size(&self) -> bool {
        let w = self.width as usize;
        let h = self.height as usize;
        match (w, h) {
            (640, 480) | (640, 512) | (800, 600) | (1024, 768)
                | (1280, 1024) | (1600, 1200) => true,
            _ => w == 0 || h == 0
                || w > GIF_MAX_SANE_DIMENSION || h > GIF_MAX_SANE_DIMENSION,
        }
    }
}

impl ImageDescriptor {
    pub fn has_local_table(&self) -> bool {
        self.packed & GIF_COLOUR_TABLE_MASK != 0
    }

    pub fn local_table_entries(&self) -> usize {
        table_entries(self.packed)
    }

    pub fn is_interlaced(&self) -> bool {
        self.packed & GIF_INTERLACE_MASK != 0
    }
}

/// Read the signature and logical screen descriptor.
///
/// The global colour table, if any, is left for the caller.
pub fn parse_header(r: &mut ByteCursor)
        -> GifResult<ScreenDescriptor> {
    let sig = r.read_slice(SIZE_OF_GIF_SIGNATURE)?;
    if &sig[0..3] != b"GIF" {
        return Err(GifError::DataError);
    }

    let version = &sig[3..6];
    if version != b"87a" && version != b"89a" {
        warn!("unknown GIF version {:?}", String::from_utf8_lossy(version));
        return Err(GifError::DataError);
    }

    let width = r.read_u16()?;
    let height = r.read_u16()?;
    let packed = r.read_u8()?;
    let background_index = r.read_u8()?;
    let aspect_ratio = r.read_u8()?;

    Ok(ScreenDescriptor {
        width: width,
        height: height,
        packed: packed,
        background_index: background_index,
        aspect_ratio: aspect_ratio,
    })
}

/// Classify the next top-level block without consuming it.
pub fn next_block(r: &ByteCursor)
        -> GifResult<Block> {
    match r.peek_u8()? {
        GIF_EXTENSION_INTRODUCER => Ok(Block::Extension),
        GIF_IMAGE_SEPARATOR => Ok(Block::Image),
        GIF_TRAILER => Ok(Block::Trailer),
        b => {
            debug!("unknown block introducer 0x{:02X} at {}", b, r.position());
            Err(GifError::DataError)
        },
    }
}

/// Read one extension block, introducer included.
///
/// A graphic control extension updates `ctl`; a Netscape looping
/// extension sets `loop_count`.  Everything else is skipped.
pub fn parse_extension(r: &mut ByteCursor,
        ctl: &mut GraphicControl, loop_count: &mut Option<u16>)
        -> GifResult<()> {
    let introducer = r.read_u8()?;
    if introducer != GIF_EXTENSION_INTRODUCER {
        return Err(GifError::DataError);
    }

    let label = r.read_u8()?;
    match label {
        GIF_EXTENSION_GRAPHIC_CONTROL => {
            let len = r.read_u8()? as usize;
            if len == 0 {
                return Ok(());
            } else if len >= 4 {
                let packed = r.read_u8()?;
                let delay = r.read_u16()?;
                let index = r.read_u8()?;
                r.skip(len - 4)?;

                ctl.disposal = Disposal::from_packed(packed);
                ctl.delay = delay;
                ctl.transparency = if packed & GIF_TRANSPARENCY_MASK != 0 {
                    Some(index)
                } else {
                    None
                };
                trace!("graphic control: {:?}", ctl);
            } else {
                warn!("short graphic control extension ({} bytes)", len);
                r.skip(len)?;
            }
        },

        GIF_EXTENSION_APPLICATION => {
            let len = r.read_u8()? as usize;
            let ident = r.read_slice(len)?;
            if len == 11 && (ident == b"NETSCAPE2.0" || ident == b"ANIMEXTS1.0") {
                let sub_len = r.read_u8()? as usize;
                if sub_len == 0 {
                    return Ok(());
                } else if sub_len >= 3 {
                    let id = r.read_u8()?;
                    let count = r.read_u16()?;
                    r.skip(sub_len - 3)?;
                    if id == 1 {
                        *loop_count = Some(count);
                        trace!("loop count {}", count);
                    }
                } else {
                    r.skip(sub_len)?;
                }
            } else {
                trace!("skipping application extension {:?}",
                        String::from_utf8_lossy(ident));
            }
        },

        GIF_EXTENSION_COMMENT | GIF_EXTENSION_PLAIN_TEXT => {
            trace!("skipping extension 0x{:02X}", label);
        },

        _ => {
            warn!("unknown extension 0x{:02X}", label);
        },
    }

    r.skip_sub_blocks()
}

/// Read an image descriptor, separator included.
pub fn parse_image_descriptor(r: &mut ByteCursor)
        -> GifResult<ImageDescriptor> {
    let separator = r.read_u8()?;
    if separator != GIF_IMAGE_SEPARATOR {
        return Err(GifError::DataError);
    }

    let left = r.read_u16()?;
    let top = r.read_u16()?;
    let width = r.read_u16()?;
    let height = r.read_u16()?;
    let packed = r.read_u8()?;

    Ok(ImageDescriptor {
        left: left,
        top: top,
        width: width,
        height: height,
        packed: packed,
    })
}
