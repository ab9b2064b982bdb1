//! GIF variant LZW decompressor.

use ::{GifError,GifResult};
use cursor::{SubBlockByte,SubBlocks};

/// Maximum code width, in bits, that a GIF LZW stream may use.
///
/// The code width starts at one more than the minimum code size
/// stored in front of the image data, and grows by one bit each time
/// the string table fills the current code space.  Once the width
/// reaches 12 bits and the table holds 4096 entries, the encoder must
/// send a clear code before it can define new strings; until then the
/// decoder keeps reading 12-bit codes and adds nothing to the table.
pub const LZW_MAX_BITS: u8 = 12;

/// Number of entries in the LZW string table.
pub const LZW_TABLE_SIZE: usize = 1 << LZW_MAX_BITS;

/// Capacity of the expansion stack.  A single code never expands to
/// more than `LZW_TABLE_SIZE` bytes, plus one for the KwKwK case.
pub const LZW_STACK_SIZE: usize = 2 * LZW_TABLE_SIZE;

/// How a call to `LzwDecoder::decode` stopped.
#[derive(Clone,Copy,Debug,Eq,PartialEq)]
pub enum LzwStatus {
    /// Every requested index was produced.
    Complete,

    /// The end code, or the sub-block terminator, arrived before the
    /// output was full.
    EarlyEnd,

    /// The buffer ended in the middle of the compressed stream.
    Exhausted,
}

/// Result of pulling one code out of the bit stream.
enum NextCode {
    Code(u16),
    Terminator,
    Exhausted,
}

/// LZW decoder state.
///
/// One decoder is owned by each animation and reused for every frame
/// it decodes.  The tables are sized once for the 12-bit code space.
pub struct LzwDecoder {
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    stack: Vec<u8>,
    sp: usize,

    min_code_size: u8,
    code_size: u8,
    clear_code: u16,
    end_code: u16,
    next_code: u16,
    prev_code: Option<u16>,
    first_byte: u8,

    bit_buf: u32,
    bit_count: u8,
}

/*--------------------------------------------------------------*/

impl LzwDecoder {
    /// Allocate a decoder, with tables for the full 12-bit code space.
    pub fn new() -> Self {
        LzwDecoder {
            prefix: vec![0; LZW_TABLE_SIZE],
            suffix: vec![0; LZW_TABLE_SIZE],
            stack: vec![0; LZW_STACK_SIZE],
            sp: 0,

            min_code_size: 2,
            code_size: 3,
            clear_code: 4,
            end_code: 5,
            next_code: 6,
            prev_code: None,
            first_byte: 0,

            bit_buf: 0,
            bit_count: 0,
        }
    }

    /// Decompress the sub-block chain starting at `src[pos]` into
    /// `out`, one colour table index per byte.
    ///
    /// Decoding stops as soon as `out` is full.  Returns the number of
    /// indices written and why decoding stopped.  A corrupt code
    /// sequence or an unusable minimum code size is a
    /// `FrameDataError`; nothing is ever written past `out.len()`.
    pub fn decode(&mut self, src: &[u8], pos: usize, min_code_size: u8,
            out: &mut [u8])
            -> GifResult<(usize, LzwStatus)> {
        if min_code_size < 2 || min_code_size >= LZW_MAX_BITS {
            return Err(GifError::FrameDataError);
        }

        self.start(min_code_size);
        let mut blocks = SubBlocks::new(src, pos);
        let mut produced = 0;

        loop {
            while self.sp > 0 && produced < out.len() {
                self.sp = self.sp - 1;
                out[produced] = self.stack[self.sp];
                produced = produced + 1;
            }

            if produced >= out.len() {
                return Ok((produced, LzwStatus::Complete));
            }

            let code = match self.next_code_bits(&mut blocks) {
                NextCode::Code(c) => c,
                NextCode::Terminator => return Ok((produced, LzwStatus::EarlyEnd)),
                NextCode::Exhausted => return Ok((produced, LzwStatus::Exhausted)),
            };

            if code == self.clear_code {
                self.clear();
                continue;
            } else if code == self.end_code {
                return Ok((produced, LzwStatus::EarlyEnd));
            }

            self.expand(code)?;
        }
    }

    /// Reset everything for a new frame.
    fn start(&mut self, min_code_size: u8) {
        self.min_code_size = min_code_size;
        self.clear_code = 1 << min_code_size;
        self.end_code = self.clear_code + 1;
        self.sp = 0;
        self.bit_buf = 0;
        self.bit_count = 0;
        self.clear();
    }

    /// Handle a clear code: forget every defined string.
    fn clear(&mut self) {
        self.code_size = self.min_code_size + 1;
        self.next_code = self.end_code + 1;
        self.prev_code = None;
    }

    /// Push the expansion of `code` onto the stack and define the next
    /// string in the table.
    fn expand(&mut self, code: u16)
            -> GifResult<()> {
        let prev = match self.prev_code {
            Some(prev) => prev,
            None => {
                // First code after a clear must be a root.
                if code >= self.clear_code {
                    return Err(GifError::FrameDataError);
                }
                self.push(code as u8)?;
                self.first_byte = code as u8;
                self.prev_code = Some(code);
                return Ok(());
            },
        };

        let mut c = if code < self.next_code {
            code
        } else if code == self.next_code && (code as usize) < LZW_TABLE_SIZE {
            // KwKwK: the string being defined by this very code.
            let first = self.first_byte;
            self.push(first)?;
            prev
        } else {
            return Err(GifError::FrameDataError);
        };

        while c > self.end_code {
            let s = self.suffix[c as usize];
            self.push(s)?;
            c = self.prefix[c as usize];
        }

        if c >= self.clear_code {
            return Err(GifError::FrameDataError);
        }

        let first = c as u8;
        self.push(first)?;
        self.first_byte = first;

        if (self.next_code as usize) < LZW_TABLE_SIZE {
            let n = self.next_code as usize;
            self.prefix[n] = prev;
            self.suffix[n] = first;
            self.next_code = self.next_code + 1;

            if self.next_code >= (1 << self.code_size)
                    && self.code_size < LZW_MAX_BITS {
                self.code_size = self.code_size + 1;
            }
        }

        self.prev_code = Some(code);
        Ok(())
    }

    fn push(&mut self, b: u8)
            -> GifResult<()> {
        if self.sp >= self.stack.len() {
            return Err(GifError::FrameDataError);
        }

        self.stack[self.sp] = b;
        self.sp = self.sp + 1;
        Ok(())
    }

    /// Read one code, least significant bit first.
    fn next_code_bits(&mut self, blocks: &mut SubBlocks)
            -> NextCode {
        while self.bit_count < self.code_size {
            match blocks.next_byte() {
                SubBlockByte::Byte(b) => {
                    self.bit_buf = self.bit_buf | ((b as u32) << self.bit_count);
                    self.bit_count = self.bit_count + 8;
                },
                SubBlockByte::Terminator => return NextCode::Terminator,
                SubBlockByte::Exhausted => return NextCode::Exhausted,
            }
        }

        let mask = (1u32 << self.code_size) - 1;
        let code = (self.bit_buf & mask) as u16;
        self.bit_buf = self.bit_buf >> self.code_size;
        self.bit_count = self.bit_count - self.code_size;
        NextCode::Code(code)
    }
}

impl Default for LzwDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use ::GifError;
    use super::{LzwDecoder,LzwStatus};

    /// Image data of the 10x10 three-colour sample image that is used
    /// throughout GIF tutorials.
    const SAMPLE_DATA: [u8; 23] = [
        0x16,       // sub-block length 22
        0x8C, 0x2D, 0x99, 0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75,
        0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04, 0x91, 0x4C, 0x01,
    ];

    const SAMPLE_INDICES: [u8; 100] = [
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 1, 1, 2, 2, 2, 2, 2,
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
        1, 1, 1, 0, 0, 0, 0, 2, 2, 2,
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
        2, 2, 2, 0, 0, 0, 0, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
        2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
    ];

    #[test]
    fn test_decode_sample() {
        let mut src = SAMPLE_DATA.to_vec();
        src.push(0x00);

        let mut out = [0xFF; 100];
        let mut lzw = LzwDecoder::new();
        let res = lzw.decode(&src, 0, 2, &mut out);

        assert_eq!(res.expect("decode"), (100, LzwStatus::Complete));
        assert_eq!(&out[..], &SAMPLE_INDICES[..]);
    }

    #[test]
    fn test_decode_truncated_sample() {
        let src = &SAMPLE_DATA[..12];

        let mut out = [0xFF; 100];
        let mut lzw = LzwDecoder::new();
        let (n, status) = lzw.decode(src, 0, 2, &mut out).expect("decode");

        assert_eq!(status, LzwStatus::Exhausted);
        assert!(n > 0 && n < 100);
        assert_eq!(&out[..n], &SAMPLE_INDICES[..n]);
        assert!(out[n..].iter().all(|&x| x == 0xFF));
    }

    #[test]
    fn test_decode_small_output_is_not_overrun() {
        let mut src = SAMPLE_DATA.to_vec();
        src.push(0x00);

        let mut out = [0xFF; 7];
        let mut lzw = LzwDecoder::new();
        let res = lzw.decode(&src, 0, 2, &mut out);

        assert_eq!(res.expect("decode"), (7, LzwStatus::Complete));
        assert_eq!(&out[..], &SAMPLE_INDICES[..7]);
    }

    #[test]
    fn test_decode_early_end_code() {
        // 3-bit codes: clear(4), 1, end(5).
        //   bits: 100 001 101 -> 0b101_001_100 = 0x14C
        let src = [ 0x02, 0x4C, 0x01, 0x00 ];

        let mut out = [0xFF; 4];
        let mut lzw = LzwDecoder::new();
        let res = lzw.decode(&src, 0, 2, &mut out);

        assert_eq!(res.expect("decode"), (1, LzwStatus::EarlyEnd));
        assert_eq!(out[0], 1);
    }

    #[test]
    fn test_decode_rejects_undefined_code() {
        // 3-bit codes: clear(4), 1, 7 (next free code is 6).
        //   bits: 100 001 111 -> 0b111_001_100 = 0x1CC
        let src = [ 0x02, 0xCC, 0x01, 0x00 ];

        let mut out = [0xFF; 4];
        let mut lzw = LzwDecoder::new();
        let res = lzw.decode(&src, 0, 2, &mut out);

        assert_eq!(res, Err(GifError::FrameDataError));
    }

    #[test]
    fn test_decode_rejects_bad_code_size() {
        let src = [ 0x00 ];
        let mut out = [0; 1];
        let mut lzw = LzwDecoder::new();

        assert_eq!(lzw.decode(&src, 0, 12, &mut out), Err(GifError::FrameDataError));
        assert_eq!(lzw.decode(&src, 0, 1, &mut out), Err(GifError::FrameDataError));
    }
}
