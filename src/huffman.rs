use std::io::Read;

use crate::bits::BitReader;
use crate::common::{
    DEFLATE_MAX_CODEWORD_LEN, DEFLATE_MAX_NUM_SYMS, DEFLATE_MAX_PRE_CODEWORD_LEN,
    DEFLATE_NUM_PRECODE_SYMS,
};
use crate::error::{Error, Result};
use crate::input::ByteInput;

const MAX_SYMS: usize = DEFLATE_MAX_NUM_SYMS;

/// Masks selecting the top `k` bits of a byte.
const PREFIX_MASKS: [u8; 9] = [0x00, 0x80, 0xC0, 0xE0, 0xF0, 0xF8, 0xFC, 0xFE, 0xFF];

const UNUSED: i16 = -1;
const END_OF_GROUP: u16 = 0x8000;

#[derive(Clone, Copy, Default)]
struct CodeEntry {
    code: u16,
    length: u8,
}

#[derive(Clone, Copy, Default)]
struct CodeRemainder {
    /// Bits of the codeword beyond the first eight, left-aligned in a byte.
    remainder: u8,
    bits_left: u8,
    /// Symbol index; `END_OF_GROUP` is set on the last entry of a bucket.
    index: u16,
}

/// Canonical Huffman decoder over a code-length vector (RFC 1951 3.2.2).
///
/// Codewords of up to 8 bits resolve through a single 256-entry lookup;
/// longer codewords share their top-8-bit pattern with a bucket of
/// "remainder" entries that are scanned linearly. The arrays are sized for
/// the 288-symbol literal/length alphabet and reused as-is for the smaller
/// distance alphabet.
pub struct HuffmanTable {
    codes: [CodeEntry; MAX_SYMS],
    remainders: [CodeRemainder; MAX_SYMS],
    /// Values below `MAX_SYMS` are symbol indices; `MAX_SYMS + n` points at
    /// remainder entry `n`; `UNUSED` marks patterns no codeword covers.
    codes_index: [i16; 256],
}

impl HuffmanTable {
    pub fn from_lengths(lengths: &[u8]) -> Result<Box<Self>> {
        debug_assert!(lengths.len() <= MAX_SYMS);
        let mut table = Box::new(Self {
            codes: [CodeEntry::default(); MAX_SYMS],
            remainders: [CodeRemainder::default(); MAX_SYMS],
            codes_index: [UNUSED; 256],
        });

        let mut quantities = [0usize; DEFLATE_MAX_CODEWORD_LEN + 1];
        for (i, &length) in lengths.iter().enumerate() {
            debug_assert!(length as usize <= DEFLATE_MAX_CODEWORD_LEN);
            table.codes[i].length = length;
            quantities[length as usize] += 1;
        }

        // Assign canonical codewords, shortest first, symbol order within a
        // length. Short codes fill every index slot sharing their prefix;
        // long codes only count how many land in each top-byte bucket.
        let mut bucket_quantity = [0u16; 256];
        let mut next_code: u32 = 0;
        for size in 1..=DEFLATE_MAX_CODEWORD_LEN {
            if quantities[size] > 0 {
                for i in 0..lengths.len() {
                    if table.codes[i].length as usize != size {
                        continue;
                    }
                    if next_code >= (1 << size) {
                        return Err(Error::InvalidHuffmanCode(
                            "more codes than their lengths allow",
                        ));
                    }
                    table.codes[i].code = next_code as u16;
                    if size <= 8 {
                        let first = (next_code as usize) << (8 - size);
                        let last = (next_code as usize + 1) << (8 - size);
                        for slot in first..last {
                            table.codes_index[slot] = i as i16;
                        }
                    } else {
                        bucket_quantity[(next_code as usize) >> (size - 8)] += 1;
                    }
                    next_code += 1;
                }
            }
            next_code <<= 1;
        }

        // Lay the remainder runs out bucket by bucket.
        let mut bucket_start = [0u16; 256];
        let mut current_start = 0u16;
        for bucket in 0..256 {
            bucket_start[bucket] = current_start;
            current_start += bucket_quantity[bucket];
        }

        let mut bucket_filled = [0u16; 256];
        for i in 0..lengths.len() {
            let CodeEntry { code, length } = table.codes[i];
            if length <= 8 {
                continue;
            }
            let bucket = (code >> (length - 8)) as usize;
            table.codes_index[bucket] = MAX_SYMS as i16 + bucket_start[bucket] as i16;
            let slot = (bucket_start[bucket] + bucket_filled[bucket]) as usize;
            bucket_filled[bucket] += 1;
            let mut index = i as u16;
            if bucket_filled[bucket] == bucket_quantity[bucket] {
                index |= END_OF_GROUP;
            }
            table.remainders[slot] = CodeRemainder {
                remainder: (code << (16 - length as u16)) as u8,
                bits_left: length - 8,
                index,
            };
        }

        Ok(table)
    }

    /// Decodes the next symbol from the bit stream.
    pub fn read_word<R: Read>(
        &self,
        bits: &mut BitReader,
        input: &mut ByteInput<R>,
    ) -> Result<u16> {
        let peeked = bits.peek_reversed_byte(input)?;
        let found = self.codes_index[peeked as usize];
        if found == UNUSED {
            return Err(Error::InvalidHuffmanCode("no symbol for the next 8 bits"));
        }
        let found = found as usize;
        if found < MAX_SYMS {
            bits.consume(self.codes[found].length as u32)?;
            return Ok(found as u16);
        }

        // A codeword longer than a byte: its first 8 bits are accounted for,
        // the trailing bits pick an entry out of the bucket's run.
        bits.consume(8)?;
        let peeked = bits.peek_reversed_byte(input)?;
        let mut at = found - MAX_SYMS;
        loop {
            let entry = &self.remainders[at];
            if peeked & PREFIX_MASKS[entry.bits_left as usize] == entry.remainder {
                bits.consume(entry.bits_left as u32)?;
                return Ok(entry.index & !END_OF_GROUP);
            }
            if entry.index & END_OF_GROUP != 0 {
                return Err(Error::InvalidHuffmanCode("trailing bits match no code"));
            }
            at += 1;
        }
    }
}

const NO_SYMBOL: u8 = 0xFF;

/// Decoder for the 19-symbol code that encodes the code lengths of a dynamic
/// block. Its codewords are at most 7 bits, so one direct 256-entry lookup
/// covers every case.
pub struct CodeLengthDecoder {
    lookup: [u8; 256],
    lengths: [u8; DEFLATE_NUM_PRECODE_SYMS],
}

impl CodeLengthDecoder {
    pub fn new(lengths: &[u8; DEFLATE_NUM_PRECODE_SYMS]) -> Result<Self> {
        let mut lookup = [NO_SYMBOL; 256];
        let mut next_code: u32 = 0;
        for size in 1..=DEFLATE_MAX_PRE_CODEWORD_LEN {
            for (symbol, &length) in lengths.iter().enumerate() {
                if length as usize != size {
                    continue;
                }
                if next_code >= (1 << size) {
                    return Err(Error::InvalidHuffmanCode(
                        "more code-length codes than their lengths allow",
                    ));
                }
                let first = (next_code as usize) << (8 - size);
                let last = (next_code as usize + 1) << (8 - size);
                for slot in first..last {
                    lookup[slot] = symbol as u8;
                }
                next_code += 1;
            }
            next_code <<= 1;
        }
        Ok(Self {
            lookup,
            lengths: *lengths,
        })
    }

    fn read_symbol<R: Read>(&self, bits: &mut BitReader, input: &mut ByteInput<R>) -> Result<u8> {
        let peeked = bits.peek_reversed_byte(input)?;
        let symbol = self.lookup[peeked as usize];
        if symbol == NO_SYMBOL {
            return Err(Error::InvalidHuffmanCode("no code-length symbol matches"));
        }
        bits.consume(self.lengths[symbol as usize] as u32)?;
        Ok(symbol)
    }

    /// Decodes `total` code lengths as one sequence, expanding the copy and
    /// zero-run symbols. Runs may cross the literal/length-to-distance
    /// boundary; overshooting the declared total is a header error.
    pub fn decode_lengths<R: Read>(
        &self,
        total: usize,
        bits: &mut BitReader,
        input: &mut ByteInput<R>,
    ) -> Result<Vec<u8>> {
        let mut lengths = vec![0u8; total];
        let mut filled = 0usize;
        while filled < total {
            match self.read_symbol(bits, input)? {
                symbol @ 0..=15 => {
                    lengths[filled] = symbol;
                    filled += 1;
                }
                16 => {
                    if filled == 0 {
                        return Err(Error::MalformedHeader("length copy with nothing to copy"));
                    }
                    let count = bits.get_bits_forward_order(input, 2)? as usize + 3;
                    if filled + count > total {
                        return Err(Error::MalformedHeader("code length run overruns the table"));
                    }
                    let previous = lengths[filled - 1];
                    lengths[filled..filled + count].fill(previous);
                    filled += count;
                }
                17 => {
                    let count = bits.get_bits_forward_order(input, 3)? as usize + 3;
                    if filled + count > total {
                        return Err(Error::MalformedHeader("code length run overruns the table"));
                    }
                    filled += count;
                }
                _ => {
                    let count = bits.get_bits_forward_order(input, 7)? as usize + 11;
                    if filled + count > total {
                        return Err(Error::MalformedHeader("code length run overruns the table"));
                    }
                    filled += count;
                }
            }
        }
        Ok(lengths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Packs codewords (written MSB-first) into the LSB-first byte order the
    /// wire format uses.
    fn pack(codes: &[(u16, u8)]) -> Vec<u8> {
        let mut bytes = vec![0u8];
        let mut bit = 0usize;
        for &(code, length) in codes {
            for i in (0..length).rev() {
                if bit == 8 {
                    bytes.push(0);
                    bit = 0;
                }
                let last = bytes.len() - 1;
                bytes[last] |= (((code >> i) & 1) as u8) << bit;
                bit += 1;
            }
        }
        bytes
    }

    #[test]
    fn test_canonical_assignment_rfc_example() {
        // The worked example from RFC 1951 3.2.2: lengths (3,3,3,3,3,2,4,4)
        // produce F=00, A=010 .. E=110, G=1110, H=1111.
        let lengths = [3u8, 3, 3, 3, 3, 2, 4, 4];
        let table = HuffmanTable::from_lengths(&lengths).unwrap();
        let stream = pack(&[(0b00, 2), (0b010, 3), (0b1111, 4), (0b110, 3)]);
        let mut input = ByteInput::new(&stream[..], 16);
        let mut bits = BitReader::new();
        assert_eq!(table.read_word(&mut bits, &mut input).unwrap(), 5);
        assert_eq!(table.read_word(&mut bits, &mut input).unwrap(), 0);
        assert_eq!(table.read_word(&mut bits, &mut input).unwrap(), 7);
        assert_eq!(table.read_word(&mut bits, &mut input).unwrap(), 4);
    }

    #[test]
    fn test_long_codes_resolve_through_remainders() {
        // One 1-bit code plus two 9-bit codes sharing a top-byte bucket.
        let lengths = [1u8, 9, 9];
        let table = HuffmanTable::from_lengths(&lengths).unwrap();
        let stream = pack(&[(0b100000001, 9), (0b0, 1), (0b100000000, 9)]);
        let mut input = ByteInput::new(&stream[..], 16);
        let mut bits = BitReader::new();
        assert_eq!(table.read_word(&mut bits, &mut input).unwrap(), 2);
        assert_eq!(table.read_word(&mut bits, &mut input).unwrap(), 0);
        assert_eq!(table.read_word(&mut bits, &mut input).unwrap(), 1);
    }

    #[test]
    fn test_unused_pattern_is_rejected() {
        let lengths = [2u8, 2, 2];
        let table = HuffmanTable::from_lengths(&lengths).unwrap();
        // 11...... matches none of the three assigned 2-bit codes.
        let mut input = ByteInput::new(&[0xFFu8][..], 16);
        let mut bits = BitReader::new();
        assert!(matches!(
            table.read_word(&mut bits, &mut input),
            Err(Error::InvalidHuffmanCode(_))
        ));
    }

    #[test]
    fn test_oversubscribed_lengths_are_rejected() {
        let lengths = [1u8, 1, 1];
        assert!(matches!(
            HuffmanTable::from_lengths(&lengths),
            Err(Error::InvalidHuffmanCode(_))
        ));
    }

    #[test]
    fn test_code_length_runs() {
        // Meta code: symbol 0 -> "0", symbol 17 -> "10", symbol 18 -> "11".
        let mut meta_lengths = [0u8; DEFLATE_NUM_PRECODE_SYMS];
        meta_lengths[0] = 1;
        meta_lengths[17] = 2;
        meta_lengths[18] = 2;
        let decoder = CodeLengthDecoder::new(&meta_lengths).unwrap();
        // 17 with repeat bits 0b001 -> 4 zeros, then a literal zero.
        let mut stream = Vec::new();
        // Codeword 10 (symbol 17) = bits 1,0; extra run bits 001 LSB-first;
        // then codeword 0. Hand-packed: 1,0,1,0,0,0 -> 0b000101.
        stream.push(0b000101);
        let mut input = ByteInput::new(&stream[..], 16);
        let mut bits = BitReader::new();
        let lengths = decoder.decode_lengths(5, &mut bits, &mut input).unwrap();
        assert_eq!(lengths, vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_leading_copy_is_rejected() {
        let mut meta_lengths = [0u8; DEFLATE_NUM_PRECODE_SYMS];
        meta_lengths[0] = 1;
        meta_lengths[16] = 2;
        meta_lengths[17] = 2;
        let decoder = CodeLengthDecoder::new(&meta_lengths).unwrap();
        // Symbol 16 (codeword 10) straight away.
        let mut input = ByteInput::new(&[0b0000_0001u8][..], 16);
        let mut bits = BitReader::new();
        assert!(matches!(
            decoder.decode_lengths(4, &mut bits, &mut input),
            Err(Error::MalformedHeader(_))
        ));
    }
}
