//! Byte cursor over the in-memory GIF stream.
//!
//! All structural reads go through `ByteCursor`, which never advances
//! past the end of the slice it was given.  A read that would run off
//! the end reports `InsufficientData` and leaves the position alone,
//! so the caller can retry the same parse once more bytes arrive.

use std::io::Cursor;
use byteorder::LittleEndian as LE;
use byteorder::ReadBytesExt;

use ::{GifError,GifResult};
use errcode::from_short_read;

/// Read position into a GIF byte buffer.
pub struct ByteCursor<'a> {
    inner: Cursor<&'a [u8]>,
}

impl<'a> ByteCursor<'a> {
    /// Start reading `buf` at byte offset `pos`.
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        let mut inner = Cursor::new(buf);
        inner.set_position(pos as u64);
        ByteCursor {
            inner: inner,
        }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.inner.position() as usize
    }

    /// Number of bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.inner.get_ref().len().saturating_sub(self.position())
    }

    /// Rewind or advance to an absolute offset.
    pub fn seek(&mut self, pos: usize) {
        self.inner.set_position(pos as u64);
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> GifResult<u8> {
        let pos = self.position();
        self.inner.get_ref().get(pos).cloned()
            .ok_or(GifError::InsufficientData)
    }

    pub fn read_u8(&mut self) -> GifResult<u8> {
        self.inner.read_u8().map_err(from_short_read)
    }

    pub fn read_u16(&mut self) -> GifResult<u16> {
        self.need(2)?;
        self.inner.read_u16::<LE>().map_err(from_short_read)
    }

    /// Borrow the next `n` bytes and step over them.
    pub fn read_slice(&mut self, n: usize) -> GifResult<&'a [u8]> {
        self.need(n)?;
        let start = self.position();
        let buf: &'a [u8] = *self.inner.get_ref();
        self.seek(start + n);
        Ok(&buf[start..(start + n)])
    }

    pub fn skip(&mut self, n: usize) -> GifResult<()> {
        self.need(n)?;
        let pos = self.position();
        self.seek(pos + n);
        Ok(())
    }

    /// Skip a chain of data sub-blocks, up to and including the
    /// zero-length block terminator.
    pub fn skip_sub_blocks(&mut self) -> GifResult<()> {
        loop {
            let len = self.read_u8()? as usize;
            if len == 0 {
                return Ok(());
            }
            self.skip(len)?;
        }
    }

    fn need(&self, n: usize) -> GifResult<()> {
        if self.remaining() < n {
            Err(GifError::InsufficientData)
        } else {
            Ok(())
        }
    }
}

/*--------------------------------------------------------------*/

/// Outcome of pulling another byte out of a sub-block chain.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum SubBlockByte {
    Byte(u8),

    /// The zero-length terminator block was reached.
    Terminator,

    /// The buffer ran out in the middle of the chain.
    Exhausted,
}

/// Byte reader that walks GIF data sub-blocks.
///
/// Each sub-block is a length byte followed by that many data bytes;
/// the chain ends with a zero-length block.  The reader hides the
/// framing and yields the concatenated payload one byte at a time.
pub struct SubBlocks<'a> {
    buf: &'a [u8],
    pos: usize,
    block_left: usize,
    terminated: bool,
}

impl<'a> SubBlocks<'a> {
    /// Start reading a sub-block chain whose first length byte is at
    /// offset `pos`.
    pub fn new(buf: &'a [u8], pos: usize) -> Self {
        SubBlocks {
            buf: buf,
            pos: pos,
            block_left: 0,
            terminated: false,
        }
    }

    /// Offset of the next unread byte, framing included.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn next_byte(&mut self) -> SubBlockByte {
        if self.terminated {
            return SubBlockByte::Terminator;
        }

        if self.block_left == 0 {
            match self.buf.get(self.pos) {
                None => return SubBlockByte::Exhausted,
                Some(&0) => {
                    self.pos = self.pos + 1;
                    self.terminated = true;
                    return SubBlockByte::Terminator;
                },
                Some(&len) => {
                    self.pos = self.pos + 1;
                    self.block_left = len as usize;
                },
            }
        }

        match self.buf.get(self.pos) {
            None => SubBlockByte::Exhausted,
            Some(&b) => {
                self.pos = self.pos + 1;
                self.block_left = self.block_left - 1;
                SubBlockByte::Byte(b)
            },
        }
    }
}
