use std::io::Read;

// Requests are read into a buffer this small to begin with, so that the
// parser is exercised against partial input from the very first read.
pub const INITIAL_CAPACITY: usize = 8;

/// Holds bytes read from a stream which have not yet been consumed by a
/// parser, followed by spare capacity for the next read.
///
/// There is no upper bound on how large the buffer may grow.
#[derive(Debug)]
pub struct ReadBuffer {
    data: Vec<u8>,
    filled: usize,
}

impl ReadBuffer {
    /// Make sure there is room for at least one more byte, doubling the
    /// backing storage if the unconsumed bytes fill it exactly.
    pub fn ensure_capacity(&mut self) {
        if self.filled >= self.data.len() {
            let new_len = (self.data.len() * 2).max(INITIAL_CAPACITY);
            self.data.resize(new_len, 0);
        }
    }

    /// Drop the first `consumed` bytes, sliding the remainder to the front.
    pub fn consume(&mut self, consumed: usize) {
        let consumed = consumed.min(self.filled);
        if consumed > 0 {
            self.data.copy_within(consumed..self.filled, 0);
            self.filled -= consumed;
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.filled]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_CAPACITY)
    }

    /// Read once from `reader` into the spare capacity, growing first if
    /// there is none.  Returns the number of bytes read, which is zero only
    /// at end of stream.  Interrupted reads are retried.
    pub fn read_from<R>(
        &mut self,
        reader: &mut R
    ) -> std::io::Result<usize>
        where R: Read + ?Sized
    {
        self.ensure_capacity();
        loop {
            match reader.read(&mut self.data[self.filled..]) {
                Ok(read) => {
                    self.filled += read;
                    return Ok(read);
                },
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => (),
                Err(error) => return Err(error),
            }
        }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self{
            data: vec![0; capacity],
            filled: 0,
        }
    }
}

impl Default for ReadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn doubles_only_when_full() {
        let mut buffer = ReadBuffer::new();
        let mut input: &[u8] = b"0123456789";
        assert_eq!(8, buffer.read_from(&mut input).unwrap());
        assert_eq!(INITIAL_CAPACITY, buffer.capacity());
        assert_eq!(2, buffer.read_from(&mut input).unwrap());
        assert_eq!(16, buffer.capacity());
        assert_eq!(b"0123456789", buffer.filled());
        assert_eq!(0, buffer.read_from(&mut input).unwrap());
        assert_eq!(16, buffer.capacity());
    }

    #[test]
    fn consume_slides_remainder_to_front() {
        let mut buffer = ReadBuffer::new();
        let mut input: &[u8] = b"GET /x\r\n";
        buffer.read_from(&mut input).unwrap();
        buffer.consume(4);
        assert_eq!(b"/x\r\n", buffer.filled());
        assert_eq!(4, buffer.len());
        buffer.consume(4);
        assert!(buffer.is_empty());
    }

    #[test]
    fn consume_more_than_filled_empties_buffer() {
        let mut buffer = ReadBuffer::new();
        let mut input: &[u8] = b"abc";
        buffer.read_from(&mut input).unwrap();
        buffer.consume(10);
        assert!(buffer.is_empty());
    }

    #[test]
    fn zero_capacity_buffer_still_grows() {
        let mut buffer = ReadBuffer::with_capacity(0);
        buffer.ensure_capacity();
        assert_eq!(INITIAL_CAPACITY, buffer.capacity());
    }

}
