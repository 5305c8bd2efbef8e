//! Lenient little-endian byte cursor
//!
//! Reads past the end of the buffer never fail. They return whatever bytes
//! are left (zero-filled for integers), so a truncated header degrades into
//! empty fields and heuristics that simply find nothing.

/// Read a little-endian `i32` at `offset`, if four bytes are available
pub fn i32_le_at(data: &[u8], offset: usize) -> Option<i32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Decode Latin-1 bytes; every byte maps to the code point of the same value
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Forward-only cursor over an in-memory file
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute offset, clamped to the end of the data
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }

    /// Up to `n` bytes; shorter at end of data
    pub fn read_bytes(&mut self, n: usize) -> &'a [u8] {
        let end = self.pos.saturating_add(n).min(self.data.len());
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        bytes
    }

    pub fn read_u8(&mut self) -> u8 {
        self.read_bytes(1).first().copied().unwrap_or(0)
    }

    pub fn read_u16_le(&mut self) -> u16 {
        let mut buf = [0u8; 2];
        let bytes = self.read_bytes(2);
        buf[..bytes.len()].copy_from_slice(bytes);
        u16::from_le_bytes(buf)
    }

    pub fn read_i32_le(&mut self) -> i32 {
        let mut buf = [0u8; 4];
        let bytes = self.read_bytes(4);
        buf[..bytes.len()].copy_from_slice(bytes);
        i32::from_le_bytes(buf)
    }

    /// Byte length followed by a fixed-width field of `field_len` bytes
    pub fn read_byte_string(&mut self, field_len: usize) -> String {
        let len = usize::from(self.read_u8());
        let field = self.read_bytes(field_len);
        latin1(&field[..len.min(field.len())])
    }

    /// 32-bit block size, then byte length, then the characters
    ///
    /// The block size normally equals length + 1. When it is larger the rest
    /// of the block is skipped; when it is smaller (or negative) the byte
    /// length wins.
    pub fn read_int_byte_string(&mut self) -> String {
        let block = self.read_i32_le();
        let len = usize::from(self.read_u8());
        let text = latin1(self.read_bytes(len));

        if let Ok(block) = usize::try_from(block) {
            let consumed = len + 1;
            if block > consumed {
                self.skip(block - consumed);
            }
        }
        text
    }
}
