//! In-memory GIF writer for building test fixtures.

#![allow(dead_code)]

use std::collections::HashMap;

/// Disposal field values, as stored in the graphic control extension.
pub const DISPOSE_NONE: u8 = 0;
pub const DISPOSE_COMBINE: u8 = 1;
pub const DISPOSE_BACKGROUND: u8 = 2;
pub const DISPOSE_PREVIOUS: u8 = 3;

const MAX_CODE: u16 = 4096;

/// LSB-first bit packer.
struct BitWriter {
    out: Vec<u8>,
    acc: u32,
    nbits: u32,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter { out: Vec::new(), acc: 0, nbits: 0 }
    }

    fn write(&mut self, code: u16, size: u8) {
        self.acc |= (code as u32) << self.nbits;
        self.nbits += size as u32;
        while self.nbits >= 8 {
            self.out.push((self.acc & 0xFF) as u8);
            self.acc >>= 8;
            self.nbits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.out.push((self.acc & 0xFF) as u8);
        }
        self.out
    }
}

/// GIF flavoured LZW compression, without sub-block framing.
///
/// The code width follows the decoder's view of the table, which is
/// one entry behind the encoder's.  A clear code is sent whenever the
/// table fills up.
pub fn lzw_encode(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    encode(indices, min_code_size, true)
}

/// Like `lzw_encode`, but once the table is full it keeps emitting
/// 12-bit codes from the frozen table instead of sending a clear code.
pub fn lzw_encode_deferred_clear(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    encode(indices, min_code_size, false)
}

fn encode(indices: &[u8], min_code_size: u8, clear_when_full: bool) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;

    let mut w = BitWriter::new();
    let mut dict: HashMap<(u16, u8), u16> = HashMap::new();
    let mut size = min_code_size + 1;
    let mut next = end + 1;
    let mut dec_next = end + 1;
    let mut first = true;

    w.write(clear, size);

    let mut cur: Option<u16> = None;
    for &c in indices {
        let p = match cur {
            None => {
                cur = Some(c as u16);
                continue;
            },
            Some(p) => p,
        };

        if let Some(&code) = dict.get(&(p, c)) {
            cur = Some(code);
            continue;
        }

        emit(&mut w, p, &mut size, &mut dec_next, &mut first);
        if next < MAX_CODE {
            dict.insert((p, c), next);
            next += 1;
        } else if clear_when_full {
            w.write(clear, size);
            dict.clear();
            size = min_code_size + 1;
            next = end + 1;
            dec_next = end + 1;
            first = true;
        }
        cur = Some(c as u16);
    }

    if let Some(p) = cur {
        emit(&mut w, p, &mut size, &mut dec_next, &mut first);
    }
    w.write(end, size);
    w.finish()
}

fn emit(w: &mut BitWriter, code: u16, size: &mut u8, dec_next: &mut u16, first: &mut bool) {
    w.write(code, *size);
    if *first {
        *first = false;
    } else if *dec_next < MAX_CODE {
        *dec_next += 1;
        if *dec_next >= (1 << *size) && *size < 12 {
            *size += 1;
        }
    }
}

/// Split data into length-prefixed sub-blocks, with a terminator.
pub fn sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
    out
}

/// Compressed image data of a frame: min code size and sub-blocks.
pub fn image_data(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    let mut out = vec![min_code_size];
    out.extend(sub_blocks(&lzw_encode(indices, min_code_size)));
    out
}

/// Canvas rows of an interlaced image, in stream order.
pub fn interlace_order(height: usize) -> Vec<usize> {
    let mut rows = Vec::new();
    for &(start, step) in &[(0, 8), (4, 8), (2, 4), (1, 2)] {
        let mut y = start;
        while y < height {
            rows.push(y);
            y += step;
        }
    }
    rows
}

/// Size field and padded length for a colour table.
fn table_size_field(len: usize) -> (u8, usize) {
    let mut field = 0;
    while (2 << field) < len {
        field += 1;
    }
    (field as u8, 2 << field)
}

fn push_table(out: &mut Vec<u8>, table: &[[u8; 3]]) {
    let (_, padded) = table_size_field(table.len());
    for i in 0..padded {
        let c = table.get(i).cloned().unwrap_or([0, 0, 0]);
        out.extend_from_slice(&c);
    }
}

fn min_code_size_for(len: usize) -> u8 {
    let (field, _) = table_size_field(len);
    let bits = field + 1;
    if bits < 2 { 2 } else { bits }
}

/// One image block, with its graphic control extension.
#[derive(Clone)]
pub struct Frame {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
    /// Indices in canvas row order.
    pub indices: Vec<u8>,
    pub disposal: u8,
    pub delay: u16,
    pub transparency: Option<u8>,
    pub local: Option<Vec<[u8; 3]>>,
    pub interlaced: bool,
    pub control: bool,
}

impl Frame {
    pub fn new(x: u16, y: u16, w: u16, h: u16, indices: Vec<u8>) -> Self {
        assert_eq!(indices.len(), w as usize * h as usize);
        Frame {
            x: x,
            y: y,
            w: w,
            h: h,
            indices: indices,
            disposal: DISPOSE_NONE,
            delay: 0,
            transparency: None,
            local: None,
            interlaced: false,
            control: true,
        }
    }

    /// A frame filling a rectangle with one index.
    pub fn solid(x: u16, y: u16, w: u16, h: u16, idx: u8) -> Self {
        Frame::new(x, y, w, h, vec![idx; w as usize * h as usize])
    }

    pub fn disposal(mut self, d: u8) -> Self {
        self.disposal = d;
        self
    }

    pub fn delay(mut self, d: u16) -> Self {
        self.delay = d;
        self
    }

    pub fn transparent(mut self, idx: u8) -> Self {
        self.transparency = Some(idx);
        self
    }

    pub fn local(mut self, table: Vec<[u8; 3]>) -> Self {
        self.local = Some(table);
        self
    }

    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }

    pub fn without_control(mut self) -> Self {
        self.control = false;
        self
    }
}

/// Builder for a whole GIF stream.
pub struct GifWriter {
    buf: Vec<u8>,
    global_len: usize,
    /// Byte offset of each frame's compressed data, after the min code
    /// size byte.
    pub data_offsets: Vec<usize>,
}

impl GifWriter {
    /// Start a stream.  An empty `global` means no global colour table.
    pub fn new(w: u16, h: u16, global: &[[u8; 3]], background: u8) -> Self {
        let mut buf = b"GIF89a".to_vec();
        buf.push(w as u8);
        buf.push((w >> 8) as u8);
        buf.push(h as u8);
        buf.push((h >> 8) as u8);

        if global.is_empty() {
            buf.push(0);
            buf.push(background);
            buf.push(0);
        } else {
            let (field, _) = table_size_field(global.len());
            buf.push(0x80 | 0x70 | field);
            buf.push(background);
            buf.push(0);
            push_table(&mut buf, global);
        }
        let global_len = global.len();

        GifWriter {
            buf: buf,
            global_len: global_len,
            data_offsets: Vec::new(),
        }
    }

    pub fn loop_count(mut self, n: u16) -> Self {
        self.buf.extend_from_slice(&[0x21, 0xFF, 0x0B]);
        self.buf.extend_from_slice(b"NETSCAPE2.0");
        self.buf.extend_from_slice(&[0x03, 0x01, n as u8, (n >> 8) as u8, 0x00]);
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.buf.extend_from_slice(&[0x21, 0xFE]);
        self.buf.extend(sub_blocks(text.as_bytes()));
        self
    }

    pub fn frame(mut self, f: Frame) -> Self {
        if f.control {
            let mut packed = (f.disposal & 0x07) << 2;
            if f.transparency.is_some() {
                packed |= 0x01;
            }
            self.buf.extend_from_slice(&[
                0x21, 0xF9, 0x04, packed,
                f.delay as u8, (f.delay >> 8) as u8,
                f.transparency.unwrap_or(0), 0x00 ]);
        }

        self.buf.push(0x2C);
        for v in &[f.x, f.y, f.w, f.h] {
            self.buf.push(*v as u8);
            self.buf.push((*v >> 8) as u8);
        }

        let mut packed = 0;
        if f.interlaced {
            packed |= 0x40;
        }
        let table_len = match f.local {
            Some(ref table) => {
                let (field, _) = table_size_field(table.len());
                packed |= 0x80 | field;
                table.len()
            },
            None => if self.global_len > 0 { self.global_len } else { 2 },
        };
        self.buf.push(packed);
        if let Some(ref table) = f.local {
            push_table(&mut self.buf, table);
        }

        let stream: Vec<u8> = if f.interlaced {
            let w = f.w as usize;
            interlace_order(f.h as usize).iter()
                .flat_map(|&y| f.indices[(y * w)..((y + 1) * w)].to_vec())
                .collect()
        } else {
            f.indices.clone()
        };

        let min_code_size = min_code_size_for(table_len);
        self.data_offsets.push(self.buf.len() + 1);
        self.buf.extend(image_data(&stream, min_code_size));
        self
    }

    /// Append raw bytes, for malformed streams.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(0x3B);
        self.buf
    }

    pub fn finish_without_trailer(self) -> Vec<u8> {
        self.buf
    }
}

pub const WHITE: [u8; 3] = [0xFF, 0xFF, 0xFF];
pub const RED: [u8; 3] = [0xFF, 0x00, 0x00];
pub const GREEN: [u8; 3] = [0x00, 0xFF, 0x00];
pub const BLUE: [u8; 3] = [0x00, 0x00, 0xFF];

/// White, red, green, blue.
pub const PALETTE: [[u8; 3]; 4] = [WHITE, RED, GREEN, BLUE];

pub fn rgba(c: [u8; 3]) -> [u8; 4] {
    [c[0], c[1], c[2], 0xFF]
}

/// RGBA value at (x, y) of a row-major canvas.
pub fn pixel_at(image: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
    let i = 4 * (width * y + x);
    [image[i], image[i + 1], image[i + 2], image[i + 3]]
}
