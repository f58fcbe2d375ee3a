use crate::crc32::Checksum;
use crate::error::{Error, Result};
use crate::settings::DecompressionSettings;

/// Contiguous output window. Holds everything produced since the last slide
/// so back-references up to 32 KiB stay addressable, folds bytes into the
/// session checksum exactly once as they are handed out, and compacts
/// lazily: the slice returned by [`OutputWindow::consume`] stays untouched
/// until the next call.
pub struct OutputWindow<S: DecompressionSettings> {
    buffer: Vec<u8>,
    /// Bytes of valid data; valid data always starts at index 0.
    used: usize,
    /// End of the region already handed out by `consume`.
    consumed: usize,
    expects_more: bool,
    checksum: S::Checksum,
    total_produced: u64,
}

impl<S: DecompressionSettings> OutputWindow<S> {
    pub fn new() -> Self {
        Self {
            buffer: vec![0; S::MAX_OUTPUT_BUFFER_SIZE],
            used: 0,
            consumed: 0,
            expects_more: true,
            checksum: S::Checksum::default(),
            total_produced: 0,
        }
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.buffer.len() - self.used
    }

    pub fn add_byte(&mut self, byte: u8) -> Result<()> {
        if self.used >= self.buffer.len() {
            return Err(Error::Internal("output window overfilled"));
        }
        self.buffer[self.used] = byte;
        self.used += 1;
        self.total_produced += 1;
        Ok(())
    }

    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.used + bytes.len() > self.buffer.len() {
            return Err(Error::Internal("output window overfilled"));
        }
        self.buffer[self.used..self.used + bytes.len()].copy_from_slice(bytes);
        self.used += bytes.len();
        self.total_produced += bytes.len() as u64;
        Ok(())
    }

    /// Copies `length` bytes starting `distance` bytes behind the write
    /// cursor. Overlap (`distance < length`) repeats the pattern, one
    /// distance-sized chunk at a time.
    pub fn repeat_sequence(&mut self, length: usize, distance: usize) -> Result<()> {
        if distance == 0 {
            return Err(Error::MalformedHeader("zero back-reference distance"));
        }
        if self.used + length > self.buffer.len() {
            return Err(Error::Internal("output window overfilled"));
        }
        if distance > self.used {
            return Err(Error::BackReferenceOutOfRange {
                distance,
                produced: self.used,
            });
        }
        let mut written = 0;
        while written < length {
            let to_write = distance.min(length - written);
            let source = self.used - distance;
            self.buffer.copy_within(source..source + to_write, self.used);
            self.used += to_write;
            written += to_write;
        }
        self.total_produced += length as u64;
        Ok(())
    }

    /// Marks the stream finished: the remaining bytes can all be handed out
    /// because no back-reference will ever need them again.
    pub fn done(&mut self) {
        self.expects_more = false;
    }

    /// Hands out the bytes produced since the previous call as a
    /// `(start, end)` range into [`OutputWindow::window`], folding exactly
    /// those bytes into the checksum.
    ///
    /// While the stream is still running this also reclaims the space from
    /// the previous call: at least `bytes_to_keep` of the already-returned
    /// bytes (and never less than the configured minimum window) are kept,
    /// the rest is slid out. Only already-returned bytes can be reclaimed,
    /// so before the window has grown past the minimum nothing is slid and
    /// the produced bytes are simply handed out. The returned range is only
    /// disturbed by the *next* call, so callers may hold it across other
    /// work on the session.
    pub fn consume_range(&mut self, bytes_to_keep: usize) -> Result<(usize, usize)> {
        // The last batch is handed out as-is, without sliding.
        if !self.expects_more {
            let start = self.consumed;
            self.checksum.fold(&self.buffer[start..self.used]);
            self.consumed = self.used;
            return Ok((start, self.used));
        }

        let mut kept = bytes_to_keep.min(self.consumed);
        // Keep enough that a full window minus what remains unconsumed never
        // drops below the minimum back-reference range. Everything beyond
        // the already-returned region stays regardless, so the raise caps at
        // `consumed` (and the slide then reclaims nothing).
        let minimum =
            S::MIN_OUTPUT_BUFFER_SIZE as isize - self.used as isize + self.consumed as isize;
        if (kept as isize) < minimum {
            kept = (minimum as usize).min(self.consumed);
        }
        let removing = self.consumed - kept;

        self.buffer.copy_within(removing..self.used, 0);
        self.used -= removing;
        self.consumed = self.used;

        self.checksum.fold(&self.buffer[kept..self.consumed]);
        Ok((kept, self.consumed))
    }

    /// Like [`OutputWindow::consume_range`] but resolves the range to a
    /// slice immediately.
    pub fn consume(&mut self, bytes_to_keep: usize) -> Result<&[u8]> {
        let (start, end) = self.consume_range(bytes_to_keep)?;
        Ok(&self.buffer[start..end])
    }

    #[inline]
    pub fn window(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    pub fn checksum_digest(&self) -> u32 {
        self.checksum.digest()
    }

    #[inline]
    pub fn total_produced(&self) -> u64 {
        self.total_produced
    }
}
