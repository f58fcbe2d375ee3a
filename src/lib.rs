//! Streaming decompressor for the DEFLATE format (RFC 1951) and the GZIP
//! container (RFC 1952). Input comes from any `std::io::Read` (a file, a
//! slice, or a pull closure via [`ReadFn`]); output is pulled incrementally
//! from a sliding window, with optional CRC-32 verification of both payload
//! and header.
#![forbid(unsafe_code)]

pub mod bits;
pub mod common;
pub mod crc32;
pub mod deflate;
pub mod error;
pub mod gzip;
pub mod huffman;
pub mod input;
pub mod output;
pub mod settings;
pub mod stream;

pub use crc32::{Checksum, Crc32, Crc32Slice16, NoChecksum};
pub use deflate::DeflateDecoder;
pub use error::{Error, Result};
pub use gzip::{GzHeader, OperatingSystem};
pub use input::ReadFn;
pub use settings::{DecompressionSettings, DefaultSettings, MinSettings};
pub use stream::{decompress_deflate, decompress_gzip, DeflateStream, GzStream};
