use gzstream::{decompress_deflate, decompress_gzip, GzStream, OperatingSystem};

/// Writes a DEFLATE bit stream by hand: numeric fields go in
/// least-significant-bit-first order, Huffman codewords most-significant
/// bit first.
struct BitWriter {
    bytes: Vec<u8>,
    bit: usize,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: vec![0],
            bit: 0,
        }
    }

    fn push_bit(&mut self, bit: u8) {
        if self.bit == 8 {
            self.bytes.push(0);
            self.bit = 0;
        }
        let last = self.bytes.len() - 1;
        self.bytes[last] |= (bit & 1) << self.bit;
        self.bit += 1;
    }

    fn push_field(&mut self, value: u32, count: u32) {
        for i in 0..count {
            self.push_bit(((value >> i) & 1) as u8);
        }
    }

    fn push_code(&mut self, code: u32, count: u32) {
        for i in (0..count).rev() {
            self.push_bit(((code >> i) & 1) as u8);
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[test]
fn test_empty_archive() {
    let archive = [
        0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x03, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let output = decompress_gzip(&archive[..]).unwrap();
    assert!(output.is_empty());

    let stream = GzStream::<_>::from_slice(&archive[..]).unwrap();
    assert_eq!(stream.info().operating_system, OperatingSystem::Other);
    assert_eq!(stream.info().modification_time, 0);
}

#[test]
fn test_fixed_huffman_single_literal() {
    let payload = [0x4B, 0x04, 0x00];
    assert_eq!(decompress_deflate(&payload[..]).unwrap(), b"a");
}

#[test]
fn test_fixed_huffman_two_literals() {
    let payload = [0x4B, 0x4C, 0x04, 0x00];
    assert_eq!(decompress_deflate(&payload[..]).unwrap(), b"aa");
}

#[test]
fn test_fixed_huffman_run_of_literals() {
    // Literal 'a' followed by a length-9 match at distance 1.
    let payload = [0x4B, 0x4C, 0x84, 0x01, 0x00];
    assert_eq!(decompress_deflate(&payload[..]).unwrap(), vec![b'a'; 10]);
}

#[test]
fn test_stored_block_followed_by_final_empty_block() {
    // BTYPE=00, LEN=5, NLEN=!5, "hello", then a final empty stored block.
    let mut payload = vec![0x00, 0x05, 0x00, 0xFA, 0xFF];
    payload.extend_from_slice(b"hello");
    payload.extend_from_slice(&[0x01, 0x00, 0x00, 0xFF, 0xFF]);
    assert_eq!(decompress_deflate(&payload[..]).unwrap(), b"hello");
}

#[test]
fn test_dynamic_block_from_reference_compressor() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    // A couple of KiB of ASCII compresses into a dynamic-Huffman block at
    // the best level; the trailer CRC and ISIZE are verified on the way out.
    let mut text = Vec::new();
    for i in 0..200 {
        text.extend_from_slice(
            format!("line {i}: the quick brown fox jumps over the lazy dog\n").as_bytes(),
        );
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&text).unwrap();
    let archive = encoder.finish().unwrap();

    assert_eq!(decompress_gzip(&archive[..]).unwrap(), text);
}

#[test]
fn test_overlapping_back_reference() {
    // One literal 'X', then a length-10 copy at distance 1: the copy reads
    // bytes it is itself producing.
    let mut writer = BitWriter::new();
    writer.push_field(1, 1); // BFINAL
    writer.push_field(1, 2); // BTYPE = fixed
    writer.push_code(0x30 + u32::from(b'X'), 8);
    writer.push_code(264 - 256, 7); // length symbol 264 = 10, no extra bits
    writer.push_code(0, 5); // distance symbol 0 = 1
    writer.push_code(0, 7); // end of block
    let payload = writer.into_bytes();

    assert_eq!(decompress_deflate(&payload[..]).unwrap(), vec![b'X'; 11]);
}

#[test]
fn test_back_reference_past_start_is_rejected() {
    // A copy at distance 4 when only one byte has been produced.
    let mut writer = BitWriter::new();
    writer.push_field(1, 1);
    writer.push_field(1, 2);
    writer.push_code(0x30 + u32::from(b'X'), 8);
    writer.push_code(264 - 256, 7);
    writer.push_code(3, 5); // distance symbol 3 = 4
    writer.push_code(0, 7);
    let payload = writer.into_bytes();

    assert!(matches!(
        decompress_deflate(&payload[..]),
        Err(gzstream::Error::BackReferenceOutOfRange { .. })
    ));
}
