//! Bit-field accumulation.
//!
//! Bit-fields are packed MSB first: the first field occupies the high bits of the first byte
//! and a field may span byte boundaries. Both the reader and the writer keep a
//! [BitAccumulator] for the current run of consecutive bit-fields.

/// Pending bits, oldest in the high positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitAccumulator {
    buf: u64,
    count: u32,
}

impl BitAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending bits.
    pub fn available(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Appends a whole byte read from the input.
    pub fn push_byte(&mut self, byte: u8) {
        self.buf = self.buf << 8 | byte as u64;
        self.count += 8;
    }

    /// Removes the oldest `width` bits. The caller must have pushed enough bytes.
    pub fn take(&mut self, width: u32) -> u64 {
        debug_assert!(width <= self.count);
        let rest = self.count - width;
        let value = self.buf >> rest;
        self.buf &= mask(rest);
        self.count = rest;
        value
    }

    /// Appends the low `width` bits of `value`.
    pub fn put(&mut self, value: u64, width: u32) {
        self.buf = self.buf << width | value & mask(width);
        self.count += width;
    }

    /// Removes the oldest complete byte, if there is one.
    pub fn pop_byte(&mut self) -> Option<u8> {
        (self.count >= 8).then(|| self.take(8) as u8)
    }

    /// Removes the remaining partial byte, zero filled in the low bits.
    pub fn flush(&mut self) -> Option<u8> {
        debug_assert!(self.count < 8);
        if self.count == 0 {
            return None;
        }
        let byte = (self.buf << (8 - self.count)) as u8;
        self.clear();
        Some(byte)
    }

    /// Discards pending bits.
    pub fn clear(&mut self) {
        self.buf = 0;
        self.count = 0;
    }
}

fn mask(width: u32) -> u64 {
    if width >= 64 { u64::MAX } else { (1 << width) - 1 }
}

/// Space separated hex bytes, for trace logging.
pub fn to_hex(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, b) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02X}"));
    }
    out
}
