use std::io;

use thiserror::Error;

/// All the ways a decode session can fail. No error is recoverable: once a
/// session returns one, the decoder is unusable and further calls have
/// unspecified (but memory-safe) results.
#[derive(Debug, Error)]
pub enum Error {
    /// The input source reported end of data while more bytes were required.
    #[error("unexpected end of stream")]
    UnexpectedEndOfStream,

    /// A structurally invalid GZIP or DEFLATE header field.
    #[error("malformed header: {0}")]
    MalformedHeader(&'static str),

    /// A bit pattern that does not resolve to any symbol of the active
    /// Huffman code, or a code-length vector that cannot form a valid code.
    #[error("invalid huffman code: {0}")]
    InvalidHuffmanCode(&'static str),

    /// LEN/NLEN mismatch in a stored block.
    #[error("corrupted literal block: stored length does not match its complement")]
    CorruptedLiteralBlock,

    /// A back-reference pointing before the start of the produced data.
    #[error("back-reference out of range: distance {distance} with only {produced} bytes produced")]
    BackReferenceOutOfRange { distance: usize, produced: usize },

    /// Header or payload CRC-32 did not match (only raised when verification
    /// is enabled).
    #[error("checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The GZIP trailer's ISIZE field did not match the number of bytes
    /// produced, modulo 2^32 (only raised when verification is enabled).
    #[error("decompressed size mismatch: trailer says {expected}, produced {actual}")]
    IsizeMismatch { expected: u32, actual: u32 },

    /// A buffer capacity invariant was violated. Indicates a bug in this
    /// crate, not corrupt input.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// The input source failed.
    #[error("input source error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(error: Error) -> io::Error {
        match error {
            Error::UnexpectedEndOfStream => {
                io::Error::new(io::ErrorKind::UnexpectedEof, error.to_string())
            }
            Error::Io(inner) => inner,
            Error::Internal(message) => io::Error::new(io::ErrorKind::Other, message),
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}
