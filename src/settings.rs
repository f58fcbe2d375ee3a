use crate::common::{DEFLATE_MAX_MATCH_LEN, DEFLATE_MAX_MATCH_OFFSET};
use crate::crc32::{Checksum, Crc32Slice16, NoChecksum};

/// Compile-time configuration of a decode session.
///
/// The constraints below are not enforced by the type system; violating them
/// makes `DeflateDecoder::new` panic in debug builds and produces
/// `Error::Internal` failures in release builds.
///
/// - `MAX_OUTPUT_BUFFER_SIZE >= 32768 + 258`: the window must hold a full
///   back-reference range plus the longest match.
/// - `MIN_OUTPUT_BUFFER_SIZE >= 32768`: bytes retained across a slide so
///   that any back-reference stays addressable.
/// - `MIN_OUTPUT_BUFFER_SIZE <= MAX_OUTPUT_BUFFER_SIZE / 2` keeps the slide
///   productive.
/// - `INPUT_BUFFER_SIZE >= 4`.
/// - When `VERIFY_CHECKSUM` is set, `Checksum` must compute real CRC-32;
///   pairing it with [`NoChecksum`] would fail every archive.
pub trait DecompressionSettings {
    const MAX_OUTPUT_BUFFER_SIZE: usize;
    const MIN_OUTPUT_BUFFER_SIZE: usize;
    const INPUT_BUFFER_SIZE: usize;
    const VERIFY_CHECKSUM: bool;
    type Checksum: Checksum;
}

/// Smallest legal buffers, no checksum work at all.
pub struct MinSettings;

impl DecompressionSettings for MinSettings {
    const MAX_OUTPUT_BUFFER_SIZE: usize = DEFLATE_MAX_MATCH_OFFSET * 2 + DEFLATE_MAX_MATCH_LEN;
    const MIN_OUTPUT_BUFFER_SIZE: usize = DEFLATE_MAX_MATCH_OFFSET;
    const INPUT_BUFFER_SIZE: usize = 33000;
    const VERIFY_CHECKSUM: bool = false;
    type Checksum = NoChecksum;
}

/// Roomy buffers, CRC-32 verification enabled.
pub struct DefaultSettings;

impl DecompressionSettings for DefaultSettings {
    const MAX_OUTPUT_BUFFER_SIZE: usize = 100000;
    const MIN_OUTPUT_BUFFER_SIZE: usize = DEFLATE_MAX_MATCH_OFFSET;
    const INPUT_BUFFER_SIZE: usize = 100000;
    const VERIFY_CHECKSUM: bool = true;
    type Checksum = Crc32Slice16;
}
