//! Value buffer of a primitive TLV

use bytes::{Buf, BytesMut};

/// Accumulates the value octets of a primitive TLV across input chunks
///
/// The buffer never holds more than the declared length. Storage grows with
/// the bytes actually received, so a hostile length prefix cannot force a
/// large allocation up front.
#[derive(Debug, Clone, Default)]
pub struct ValueBuffer {
    capacity: usize,
    data: BytesMut,
}

impl ValueBuffer {
    /// Create an empty buffer expecting `capacity` octets
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: BytesMut::new(),
        }
    }

    /// Declared length of the value
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Octets received so far
    pub fn current_length(&self) -> usize {
        self.data.len()
    }

    /// Octets still owed
    pub fn remaining(&self) -> usize {
        self.capacity - self.data.len()
    }

    pub fn is_complete(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Copy as many of the missing octets as `buf` holds
    ///
    /// # Returns
    /// Number of octets consumed from `buf`
    pub fn fill_from<B: Buf>(&mut self, buf: &mut B) -> usize {
        let wanted = self.remaining().min(buf.remaining());
        self.data.reserve(wanted);
        let mut left = wanted;
        while left > 0 {
            let chunk = buf.chunk();
            let n = chunk.len().min(left);
            self.data.extend_from_slice(&chunk[..n]);
            buf.advance(n);
            left -= n;
        }
        wanted
    }

    /// Octets received so far
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Buf;

    #[test]
    fn test_partial_fills() {
        let mut value = ValueBuffer::new(5);
        let mut first: &[u8] = &[1, 2];
        assert_eq!(value.fill_from(&mut first), 2);
        assert!(!value.is_complete());
        assert_eq!(value.remaining(), 3);

        let mut second: &[u8] = &[3, 4, 5, 6, 7];
        assert_eq!(value.fill_from(&mut second), 3);
        assert!(value.is_complete());
        assert_eq!(value.as_slice(), &[1, 2, 3, 4, 5]);
        // Bytes beyond the declared length are left in the input
        assert_eq!(second, &[6, 7]);
    }

    #[test]
    fn test_fill_across_chained_chunks() {
        let mut value = ValueBuffer::new(4);
        let mut input = (&[0xAAu8, 0xBB][..]).chain(&[0xCCu8, 0xDD, 0xEE][..]);
        assert_eq!(value.fill_from(&mut input), 4);
        assert_eq!(value.as_slice(), &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(input.remaining(), 1);
    }

    #[test]
    fn test_empty_input_is_a_no_op() {
        let mut value = ValueBuffer::new(3);
        let mut input: &[u8] = &[];
        assert_eq!(value.fill_from(&mut input), 0);
        assert_eq!(value.current_length(), 0);
        assert_eq!(value.capacity(), 3);
    }
}
