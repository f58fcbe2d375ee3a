use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::deflate::DeflateDecoder;
use crate::error::{Error, Result};
use crate::gzip::GzHeader;
use crate::input::ByteInput;
use crate::settings::{DecompressionSettings, DefaultSettings};

/// Runs once when the DEFLATE stream ends, before the session is marked
/// done; the GZIP driver uses it to read and verify the trailer.
type FinishHook<R, S> = fn(&mut DeflateDecoder<R, S>) -> Result<()>;

fn no_finish<R: Read, S: DecompressionSettings>(_decoder: &mut DeflateDecoder<R, S>) -> Result<()> {
    Ok(())
}

fn gzip_finish<R: Read, S: DecompressionSettings>(decoder: &mut DeflateDecoder<R, S>) -> Result<()> {
    let expected_crc = decoder.input_mut().get_integer(4)? as u32;
    if S::VERIFY_CHECKSUM {
        let actual = decoder.output().checksum_digest();
        if expected_crc != actual {
            return Err(Error::ChecksumMismatch {
                expected: expected_crc,
                actual,
            });
        }
    }
    let expected_size = decoder.input_mut().get_integer(4)? as u32;
    if S::VERIFY_CHECKSUM {
        let actual = decoder.output().total_produced() as u32;
        if expected_size != actual {
            return Err(Error::IsizeMismatch {
                expected: expected_size,
                actual,
            });
        }
    }
    Ok(())
}

fn read_some_range<R: Read, S: DecompressionSettings>(
    stream: &mut DeflateStream<R, S>,
    bytes_to_keep: usize,
    finish: FinishHook<R, S>,
) -> Result<Option<(usize, usize)>> {
    if stream.done {
        return Ok(None);
    }
    let more_to_do = stream.decoder.parse_some()?;
    let range = stream.decoder.output_mut().consume_range(bytes_to_keep)?;
    if !more_to_do {
        finish(&mut stream.decoder)?;
        stream.done = true;
    }
    Ok(Some(range))
}

fn read_all_with<R: Read, S: DecompressionSettings>(
    stream: &mut DeflateStream<R, S>,
    finish: FinishHook<R, S>,
) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    while let Some((start, end)) = read_some_range(stream, 0, finish)? {
        result.extend_from_slice(&stream.decoder.output().window()[start..end]);
    }
    Ok(result)
}

fn read_by_lines_with<R: Read, S: DecompressionSettings>(
    stream: &mut DeflateStream<R, S>,
    finish: FinishHook<R, S>,
    mut callback: impl FnMut(&[u8]),
    separator: u8,
) -> Result<()> {
    // Asking `consume` to keep the unterminated run makes each record
    // contiguous in the window, right before the chunk that completes it.
    let mut keeping = 0usize;
    let mut last_end = 0usize;
    while let Some((start, end)) = read_some_range(stream, keeping, finish)? {
        let window = stream.decoder.output().window();
        let mut record_start = start - keeping;
        for at in start..end {
            if window[at] == separator {
                callback(&window[record_start..at]);
                record_start = at + 1;
            }
        }
        keeping = end - record_start;
        last_end = end;
        if keeping >= stream.decoder.output().window().len() {
            // The unterminated record occupies the whole window; no space
            // can be reclaimed to decode the rest of it.
            return Err(Error::Internal("record does not fit in the output window"));
        }
    }
    if keeping > 0 {
        let window = stream.decoder.output().window();
        callback(&window[last_end - keeping..last_end]);
    }
    Ok(())
}

fn read_via_window<R: Read, S: DecompressionSettings>(
    stream: &mut DeflateStream<R, S>,
    finish: FinishHook<R, S>,
    buf: &mut [u8],
) -> io::Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    loop {
        let (start, end) = stream.pending;
        if start < end {
            let count = buf.len().min(end - start);
            buf[..count].copy_from_slice(&stream.decoder.output().window()[start..start + count]);
            stream.pending.0 += count;
            return Ok(count);
        }
        match read_some_range(stream, 0, finish).map_err(io::Error::from)? {
            Some(range) => stream.pending = range,
            None => return Ok(0),
        }
    }
}

/// A raw-DEFLATE decode session (no container framing).
///
/// Output can be drained three ways: chunk by chunk with
/// [`DeflateStream::read_some`], all at once with
/// [`DeflateStream::read_all`], or record by record with
/// [`DeflateStream::read_by_lines`]. The type also implements
/// [`std::io::Read`]; do not mix `read` with the chunk interface on the same
/// session.
pub struct DeflateStream<R: Read, S: DecompressionSettings = DefaultSettings> {
    decoder: DeflateDecoder<R, S>,
    done: bool,
    pending: (usize, usize),
}

impl<R: Read, S: DecompressionSettings> DeflateStream<R, S> {
    pub fn new(source: R) -> Self {
        Self::from_decoder(DeflateDecoder::new(source))
    }

    pub(crate) fn from_decoder(decoder: DeflateDecoder<R, S>) -> Self {
        Self {
            decoder,
            done: false,
            pending: (0, 0),
        }
    }

    /// Produces the next chunk of output, or `None` once the stream has
    /// ended. Mid-stream chunks may be empty when a call only reclaimed
    /// window space. The first `bytes_to_keep` bytes before the returned
    /// chunk are guaranteed to stay in place until the next call.
    pub fn read_some(&mut self, bytes_to_keep: usize) -> Result<Option<&[u8]>> {
        match read_some_range(self, bytes_to_keep, no_finish)? {
            Some((start, end)) => Ok(Some(&self.decoder.output().window()[start..end])),
            None => Ok(None),
        }
    }

    /// Decompresses the rest of the stream into one vector.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        read_all_with(self, no_finish)
    }

    /// Invokes `callback` once per `separator`-delimited record, excluding
    /// the separator itself. A trailing record without separator is
    /// delivered last; an input ending in `separator` produces no extra
    /// empty record.
    pub fn read_by_lines(&mut self, callback: impl FnMut(&[u8]), separator: u8) -> Result<()> {
        read_by_lines_with(self, no_finish, callback, separator)
    }
}

impl<S: DecompressionSettings> DeflateStream<File, S> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<'a, S: DecompressionSettings> DeflateStream<&'a [u8], S> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::new(data)
    }
}

impl<R: Read, S: DecompressionSettings> Read for DeflateStream<R, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_via_window(self, no_finish, buf)
    }
}

/// A GZIP decode session: header metadata up front, DEFLATE payload on
/// demand, trailer verification (CRC-32 and ISIZE, when the settings enable
/// it) once the payload ends.
pub struct GzStream<R: Read, S: DecompressionSettings = DefaultSettings> {
    inner: DeflateStream<R, S>,
    header: GzHeader,
}

impl<R: Read, S: DecompressionSettings> GzStream<R, S> {
    /// Reads and validates the header eagerly, so construction fails on
    /// anything that is not a GZIP archive.
    pub fn new(source: R) -> Result<Self> {
        let mut input = ByteInput::new(source, S::INPUT_BUFFER_SIZE);
        let header = GzHeader::parse::<R, S>(&mut input)?;
        Ok(Self {
            inner: DeflateStream::from_decoder(DeflateDecoder::from_input(input)),
            header,
        })
    }

    pub fn info(&self) -> &GzHeader {
        &self.header
    }

    /// See [`DeflateStream::read_some`].
    pub fn read_some(&mut self, bytes_to_keep: usize) -> Result<Option<&[u8]>> {
        match read_some_range(&mut self.inner, bytes_to_keep, gzip_finish)? {
            Some((start, end)) => Ok(Some(&self.inner.decoder.output().window()[start..end])),
            None => Ok(None),
        }
    }

    /// See [`DeflateStream::read_all`].
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        read_all_with(&mut self.inner, gzip_finish)
    }

    /// See [`DeflateStream::read_by_lines`].
    pub fn read_by_lines(&mut self, callback: impl FnMut(&[u8]), separator: u8) -> Result<()> {
        read_by_lines_with(&mut self.inner, gzip_finish, callback, separator)
    }
}

impl<S: DecompressionSettings> GzStream<File, S> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<'a, S: DecompressionSettings> GzStream<&'a [u8], S> {
    pub fn from_slice(data: &'a [u8]) -> Result<Self> {
        Self::new(data)
    }
}

impl<R: Read, S: DecompressionSettings> Read for GzStream<R, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_via_window(&mut self.inner, gzip_finish, buf)
    }
}

/// Decompresses a raw DEFLATE stream into a vector, default settings.
pub fn decompress_deflate<R: Read>(source: R) -> Result<Vec<u8>> {
    DeflateStream::<R, DefaultSettings>::new(source).read_all()
}

/// Decompresses a single-member GZIP archive into a vector, default
/// settings (CRC-32 and ISIZE verified).
pub fn decompress_gzip<R: Read>(source: R) -> Result<Vec<u8>> {
    GzStream::<R, DefaultSettings>::new(source)?.read_all()
}
