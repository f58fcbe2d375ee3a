use std::io::{self, Read};

use crate::error::{Error, Result};

/// Bytes kept in front of the read cursor across a compaction so that a bit
/// register can always hand its whole bytes back, even right after a refill
/// moved the buffer contents.
const PUTBACK_MARGIN: usize = 8;

/// Extra tail capacity so fixed-width integer reads never straddle a refill.
const INTEGER_TAIL: usize = 4;

/// Refillable byte buffer over a pull source. Hands out contiguous ranges
/// and little-endian integers, and supports returning whole bytes after
/// bit-level reads have pulled ahead of what was actually consumed.
pub struct ByteInput<R: Read> {
    source: R,
    buffer: Vec<u8>,
    position: usize,
    filled: usize,
}

impl<R: Read> ByteInput<R> {
    pub fn new(source: R, buffer_size: usize) -> Self {
        debug_assert!(buffer_size >= 4, "input buffer too small");
        Self {
            source,
            buffer: vec![0; buffer_size + PUTBACK_MARGIN + INTEGER_TAIL],
            position: 0,
            filled: 0,
        }
    }

    fn refill_some(&mut self) -> Result<usize> {
        if self.position > self.buffer.len() / 2 {
            let keep_from = self.position - PUTBACK_MARGIN;
            self.buffer.copy_within(keep_from..self.filled, 0);
            self.filled -= keep_from;
            self.position = PUTBACK_MARGIN;
        }
        let added = self.source.read(&mut self.buffer[self.filled..])?;
        self.filled += added;
        Ok(added)
    }

    fn ensure_size(&mut self, bytes: usize) -> Result<()> {
        while self.position + bytes > self.filled {
            if self.refill_some()? == 0 {
                return Err(Error::UnexpectedEndOfStream);
            }
        }
        Ok(())
    }

    /// Returns up to `size` contiguous bytes and advances past them. May
    /// return fewer than requested; returns an empty slice only once the
    /// source is exhausted.
    pub fn get_range(&mut self, size: usize) -> Result<&[u8]> {
        if self.position + size >= self.filled {
            self.refill_some()?;
        }
        let start = self.position;
        let available = size.min(self.filled - start);
        self.position += available;
        Ok(&self.buffer[start..start + available])
    }

    /// Reads the next `width` bytes (`width <= 8`) as a little-endian
    /// unsigned integer. Fails if the source cannot supply them.
    pub fn get_integer(&mut self, width: usize) -> Result<u64> {
        debug_assert!(width <= 8);
        self.ensure_size(width)?;
        let mut raw = [0u8; 8];
        raw[..width].copy_from_slice(&self.buffer[self.position..self.position + width]);
        self.position += width;
        Ok(u64::from_le_bytes(raw))
    }

    /// Rewinds the cursor by `amount` whole bytes. Only bytes that were
    /// recently delivered can be returned; the put-back margin guarantees
    /// they are still in the buffer.
    pub fn return_bytes(&mut self, amount: usize) -> Result<()> {
        if amount > self.position {
            return Err(Error::Internal("returning more bytes than were read"));
        }
        self.position -= amount;
        Ok(())
    }
}

/// Lifts a pull closure `FnMut(&mut [u8]) -> io::Result<usize>` into
/// [`Read`] so it can feed a decode session. Returning `Ok(0)` signals end
/// of input; doing so while the decoder still needs bytes fails the session
/// with [`Error::UnexpectedEndOfStream`].
pub struct ReadFn<F>(pub F);

impl<F: FnMut(&mut [u8]) -> io::Result<usize>> Read for ReadFn<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (self.0)(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Delivers its payload in fixed-size pieces to exercise refill seams.
    struct Dribble<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Dribble<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(self.data.len()).min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_get_integer_little_endian() {
        let mut input = ByteInput::new(&[0x01u8, 0x02, 0x03, 0x04][..], 16);
        assert_eq!(input.get_integer(2).unwrap(), 0x0201);
        assert_eq!(input.get_integer(2).unwrap(), 0x0403);
        assert!(matches!(
            input.get_integer(1),
            Err(Error::UnexpectedEndOfStream)
        ));
    }

    #[test]
    fn test_get_range_may_return_fewer() {
        let data = vec![7u8; 10];
        let mut input = ByteInput::new(Dribble { data: &data, step: 4 }, 16);
        let first = input.get_range(10).unwrap();
        assert_eq!(first.len(), 4);
        let mut total = first.len();
        while total < 10 {
            let chunk = input.get_range(10 - total).unwrap();
            assert!(!chunk.is_empty());
            total += chunk.len();
        }
        assert!(input.get_range(1).unwrap().is_empty());
    }

    #[test]
    fn test_return_bytes_survives_compaction() {
        let data: Vec<u8> = (0..200u8).collect();
        let mut input = ByteInput::new(&data[..], 64);
        let mut consumed = 0usize;
        // Walk far enough that a refill has compacted at least once.
        while consumed < 150 {
            consumed += input.get_range(6).unwrap().len();
        }
        input.return_bytes(6).unwrap();
        let back = input.get_range(6).unwrap();
        assert_eq!(back, &data[consumed - 6..consumed]);
    }
}
