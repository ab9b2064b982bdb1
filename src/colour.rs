//! Colour table resolution.

use ::{GifError,GifResult};
use cursor::ByteCursor;

/// Maximum number of entries in a GIF colour table.
pub const GIF_MAX_COLOURS: usize = 256;

/// Mask for the "colour table present" bit, in both the logical
/// screen descriptor and the image descriptor.
pub const GIF_COLOUR_TABLE_MASK: u8 = 0x80;

/// Mask for the colour table size field.  A table holds
/// 2^(size + 1) RGB triples.
pub const GIF_COLOUR_TABLE_SIZE_MASK: u8 = 0x07;

/// Number of entries declared by a packed descriptor field.
pub fn table_entries(packed: u8) -> usize {
    2 << (packed & GIF_COLOUR_TABLE_SIZE_MASK)
}

/// An ordered list of up to 256 RGB entries.
#[derive(Clone,Debug,Default,Eq,PartialEq)]
pub struct ColourTable {
    entries: Vec<[u8; 3]>,
}

/// Global and frame-local colour tables of one stream.
pub struct ColourResolver {
    global: ColourTable,
    global_present: bool,
    local: ColourTable,
    local_present: bool,
}

/// The colour table and transparency that apply to a single frame.
#[derive(Clone,Copy)]
pub struct Palette<'a> {
    table: &'a ColourTable,
    transparency: Option<u8>,
}

/*--------------------------------------------------------------*/

impl ColourTable {
    pub fn new() -> Self {
        ColourTable {
            entries: Vec::with_capacity(GIF_MAX_COLOURS),
        }
    }

    /// The table used when a stream declares no global table:
    /// entry 0 is black, entry 1 is white.
    pub fn fallback() -> Self {
        ColourTable {
            entries: vec![[0x00, 0x00, 0x00], [0xFF, 0xFF, 0xFF]],
        }
    }

    /// Build a table from packed RGB triples.
    ///
    /// # Examples
    ///
    /// ```
    /// let table = nsgif::colour::ColourTable::from_rgb(&[0xFF, 0, 0, 0, 0, 0xFF]);
    /// assert_eq!(table.len(), 2);
    /// assert_eq!(table.get(1), Some([0, 0, 0xFF]));
    /// ```
    pub fn from_rgb(rgb: &[u8]) -> Self {
        let entries = rgb.chunks(3)
            .filter(|c| c.len() == 3)
            .take(GIF_MAX_COLOURS)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        ColourTable {
            entries: entries,
        }
    }

    /// Replace the contents with `count` triples read from `r`.
    ///
    /// On a short read the table is left untouched.
    pub fn read(&mut self, r: &mut ByteCursor, count: usize)
            -> GifResult<()> {
        let count = if count > GIF_MAX_COLOURS { GIF_MAX_COLOURS } else { count };
        let rgb = r.read_slice(3 * count)?;

        self.entries.clear();
        for c in rgb.chunks(3) {
            self.entries.push([c[0], c[1], c[2]]);
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<[u8; 3]> {
        self.entries.get(idx).cloned()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl ColourResolver {
    pub fn new() -> Self {
        ColourResolver {
            global: ColourTable::fallback(),
            global_present: false,
            local: ColourTable::new(),
            local_present: false,
        }
    }

    /// Read the global colour table declared by the screen descriptor.
    pub fn read_global(&mut self, r: &mut ByteCursor, count: usize)
            -> GifResult<()> {
        self.global.read(r, count)?;
        self.global_present = true;
        Ok(())
    }

    /// Read a frame-local colour table.
    pub fn read_local(&mut self, r: &mut ByteCursor, count: usize)
            -> GifResult<()> {
        self.local.read(r, count)?;
        self.local_present = true;
        Ok(())
    }

    /// Forget the local table; the next frame without one falls back
    /// to the global table.
    pub fn clear_local(&mut self) {
        self.local.clear();
        self.local_present = false;
    }

    pub fn has_global(&self) -> bool {
        self.global_present
    }

    pub fn global(&self) -> &ColourTable {
        &self.global
    }

    /// Local table if the current frame declared one, else global.
    pub fn active(&self) -> &ColourTable {
        if self.local_present {
            &self.local
        } else {
            &self.global
        }
    }

    /// Resolver view for the current frame.
    pub fn palette(&self, transparency: Option<u8>) -> Palette<'_> {
        Palette::new(self.active(), transparency)
    }
}

impl Default for ColourResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Palette<'a> {
    pub fn new(table: &'a ColourTable, transparency: Option<u8>) -> Self {
        Palette {
            table: table,
            transparency: transparency,
        }
    }

    /// Map an index to an opaque RGBA colour, or `None` if the index is
    /// this frame's transparent index.
    pub fn resolve(&self, idx: u8)
            -> GifResult<Option<[u8; 4]>> {
        if self.transparency == Some(idx) {
            return Ok(None);
        }

        match self.colour(idx) {
            Some(c) => Ok(Some(c)),
            None => Err(GifError::FrameDataError),
        }
    }

    /// Map an index to an opaque RGBA colour, ignoring transparency.
    pub fn colour(&self, idx: u8) -> Option<[u8; 4]> {
        self.table.get(idx as usize).map(|c| [c[0], c[1], c[2], 0xFF])
    }

    /// Validate every index of a frame before it touches the canvas.
    ///
    /// Returns true if no index is transparent, i.e. the frame is
    /// opaque across its whole rectangle.
    pub fn scan(&self, indices: &[u8])
            -> GifResult<bool> {
        let len = self.table.len();
        let mut opaque = true;

        for &idx in indices {
            if self.transparency == Some(idx) {
                opaque = false;
            } else if idx as usize >= len {
                return Err(GifError::FrameDataError);
            }
        }

        Ok(opaque)
    }

    pub fn transparency(&self) -> Option<u8> {
        self.transparency
    }
}
