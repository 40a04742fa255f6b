//! Byte cursor shared by the header and field-line grammars.

#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Consume `byte` if it is next.
    pub(crate) fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume spaces and tabs, returning how many were skipped.
    pub(crate) fn skip_blanks(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Consume a run of `1..=max` bytes matching `class`.
    ///
    /// A longer run is a mismatch and leaves the cursor untouched.
    pub(crate) fn take_class(&mut self, max: usize, class: impl Fn(u8) -> bool) -> Option<&'a [u8]> {
        let run = self.rest().iter().take_while(|b| class(**b)).count();
        if run == 0 || run > max {
            return None;
        }
        let token = &self.bytes[self.pos..self.pos + run];
        self.pos += run;
        Some(token)
    }

    /// Consume a run of bytes matching `class`, keeping at most `max` of them.
    ///
    /// Bytes past `max` are consumed and dropped.
    pub(crate) fn take_class_truncated(
        &mut self,
        max: usize,
        class: impl Fn(u8) -> bool,
    ) -> Option<&'a [u8]> {
        let run = self.rest().iter().take_while(|b| class(**b)).count();
        if run == 0 {
            return None;
        }
        let token = &self.bytes[self.pos..self.pos + run.min(max)];
        self.pos += run;
        Some(token)
    }
}

pub(crate) const fn is_lower_hex(byte: u8) -> bool {
    matches!(byte, b'0'..=b'9' | b'a'..=b'f')
}
