use std::io::Read;

use crate::bits::BitReader;
use crate::common::*;
use crate::error::{Error, Result};
use crate::huffman::{CodeLengthDecoder, HuffmanTable};
use crate::input::ByteInput;
use crate::output::OutputWindow;
use crate::settings::{DecompressionSettings, DefaultSettings};

/// A back-reference copy that ran out of window space and must finish on the
/// next call.
#[derive(Default)]
struct PendingCopy {
    distance: usize,
    remaining: usize,
}

impl PendingCopy {
    /// Starts a copy; returns `false` when the window filled up first.
    fn begin<S: DecompressionSettings>(
        &mut self,
        output: &mut OutputWindow<S>,
        length: usize,
        distance: usize,
    ) -> Result<bool> {
        self.distance = distance;
        self.remaining = length;
        self.resume(output)
    }

    fn resume<S: DecompressionSettings>(&mut self, output: &mut OutputWindow<S>) -> Result<bool> {
        let copying = output.available().min(self.remaining);
        output.repeat_sequence(copying, self.distance)?;
        self.remaining -= copying;
        Ok(self.remaining == 0)
    }
}

enum BlockState {
    Idle,
    Stored {
        bytes_left: usize,
    },
    Fixed {
        copy: PendingCopy,
    },
    Dynamic {
        litlen: Box<HuffmanTable>,
        distance: Box<HuffmanTable>,
        copy: PendingCopy,
    },
    Done,
}

enum Progress {
    MoreOutput,
    EndOfBlock,
}

/// The DEFLATE block state machine. Owns the input buffer, the bit register
/// and the output window; [`DeflateDecoder::parse_some`] runs until the
/// window is full (yield) or the final block ends.
pub struct DeflateDecoder<R: Read, S: DecompressionSettings = DefaultSettings> {
    input: ByteInput<R>,
    output: OutputWindow<S>,
    bits: BitReader,
    state: BlockState,
    was_last: bool,
}

impl<R: Read, S: DecompressionSettings> DeflateDecoder<R, S> {
    pub fn new(source: R) -> Self {
        Self::from_input(ByteInput::new(source, S::INPUT_BUFFER_SIZE))
    }

    pub(crate) fn from_input(input: ByteInput<R>) -> Self {
        debug_assert!(
            S::MAX_OUTPUT_BUFFER_SIZE >= DEFLATE_MAX_MATCH_OFFSET + DEFLATE_MAX_MATCH_LEN,
            "output buffer cannot hold a maximal back-reference"
        );
        debug_assert!(S::MIN_OUTPUT_BUFFER_SIZE >= DEFLATE_MAX_MATCH_OFFSET);
        debug_assert!(S::MIN_OUTPUT_BUFFER_SIZE <= S::MAX_OUTPUT_BUFFER_SIZE / 2);
        Self {
            input,
            output: OutputWindow::new(),
            bits: BitReader::new(),
            state: BlockState::Idle,
            was_last: false,
        }
    }

    /// Decodes until the output window fills or the stream ends. Returns
    /// `true` while there is more to do; pausing and resuming across calls
    /// is invisible in the produced byte sequence.
    pub fn parse_some(&mut self) -> Result<bool> {
        loop {
            let progress = match &mut self.state {
                BlockState::Done => return Ok(false),
                BlockState::Idle => Progress::EndOfBlock,
                BlockState::Stored { bytes_left } => {
                    run_stored(&mut self.input, &mut self.output, bytes_left)?
                }
                BlockState::Fixed { copy } => {
                    run_fixed(&mut self.input, &mut self.bits, &mut self.output, copy)?
                }
                BlockState::Dynamic {
                    litlen,
                    distance,
                    copy,
                } => run_dynamic(
                    &mut self.input,
                    &mut self.bits,
                    &mut self.output,
                    litlen,
                    distance,
                    copy,
                )?,
            };
            match progress {
                Progress::MoreOutput => return Ok(true),
                Progress::EndOfBlock => self.state = BlockState::Idle,
            }

            if self.was_last {
                // Leave the input byte-aligned so the container can read its
                // trailer, and release the whole window for consumption.
                self.bits.return_whole_bytes(&mut self.input)?;
                self.output.done();
                self.state = BlockState::Done;
                return Ok(false);
            }
            self.read_block_header()?;
        }
    }

    /// Hands out the bytes produced since the previous call; see
    /// [`OutputWindow::consume`].
    pub fn consume(&mut self, bytes_to_keep: usize) -> Result<&[u8]> {
        self.output.consume(bytes_to_keep)
    }

    fn read_block_header(&mut self) -> Result<()> {
        self.was_last = self.bits.get_bits(&mut self.input, 1)?.value() != 0;
        let block_type = self.bits.get_bits_forward_order(&mut self.input, 2)?;
        match block_type {
            DEFLATE_BLOCKTYPE_UNCOMPRESSED => {
                // Stored blocks are byte-aligned; the bits up to the next
                // byte boundary are padding.
                self.bits.return_whole_bytes(&mut self.input)?;
                let length = self.input.get_integer(2)? as u16;
                let anti_length = self.input.get_integer(2)? as u16;
                if length != !anti_length {
                    return Err(Error::CorruptedLiteralBlock);
                }
                self.state = BlockState::Stored {
                    bytes_left: length as usize,
                };
            }
            DEFLATE_BLOCKTYPE_STATIC_HUFFMAN => {
                self.state = BlockState::Fixed {
                    copy: PendingCopy::default(),
                };
            }
            DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN => {
                let (litlen, distance) = self.read_dynamic_tables()?;
                self.state = BlockState::Dynamic {
                    litlen,
                    distance,
                    copy: PendingCopy::default(),
                };
            }
            _ => return Err(Error::MalformedHeader("reserved block type")),
        }
        Ok(())
    }

    fn read_dynamic_tables(&mut self) -> Result<(Box<HuffmanTable>, Box<HuffmanTable>)> {
        let bits = &mut self.bits;
        let input = &mut self.input;

        let hlit = bits.get_bits_forward_order(input, 5)? as usize;
        if hlit > 29 {
            return Err(Error::MalformedHeader("too many literal/length codes"));
        }
        let hdist = bits.get_bits_forward_order(input, 5)? as usize;
        let hclen = bits.get_bits_forward_order(input, 4)? as usize;
        let litlen_count = 257 + hlit;
        let distance_count = 1 + hdist;

        let mut precode_lengths = [0u8; DEFLATE_NUM_PRECODE_SYMS];
        for i in 0..(4 + hclen) {
            precode_lengths[DEFLATE_PRECODE_ORDER[i]] =
                bits.get_bits_forward_order(input, 3)? as u8;
        }
        let precode = CodeLengthDecoder::new(&precode_lengths)?;
        let lengths = precode.decode_lengths(litlen_count + distance_count, bits, input)?;
        let litlen = HuffmanTable::from_lengths(&lengths[..litlen_count])?;
        let distance = HuffmanTable::from_lengths(&lengths[litlen_count..])?;
        Ok((litlen, distance))
    }

    pub(crate) fn input_mut(&mut self) -> &mut ByteInput<R> {
        &mut self.input
    }

    pub(crate) fn output(&self) -> &OutputWindow<S> {
        &self.output
    }

    pub(crate) fn output_mut(&mut self) -> &mut OutputWindow<S> {
        &mut self.output
    }
}

fn run_stored<R: Read, S: DecompressionSettings>(
    input: &mut ByteInput<R>,
    output: &mut OutputWindow<S>,
    bytes_left: &mut usize,
) -> Result<Progress> {
    while *bytes_left > 0 {
        let want = (*bytes_left).min(output.available());
        if want == 0 {
            return Ok(Progress::MoreOutput);
        }
        let chunk = input.get_range(want)?;
        if chunk.is_empty() {
            return Err(Error::UnexpectedEndOfStream);
        }
        *bytes_left -= chunk.len();
        output.add_bytes(chunk)?;
    }
    Ok(Progress::EndOfBlock)
}

fn run_fixed<R: Read, S: DecompressionSettings>(
    input: &mut ByteInput<R>,
    bits: &mut BitReader,
    output: &mut OutputWindow<S>,
    copy: &mut PendingCopy,
) -> Result<Progress> {
    if copy.remaining > 0 && !copy.resume(output)? {
        return Ok(Progress::MoreOutput);
    }
    while output.available() > 0 {
        // Peel off the 7-bit prefix, then widen it until it covers one of
        // the four canonical ranges of the fixed code (RFC 1951 3.2.6).
        let mut code = bits.get_bits(input, 7)?;
        if code.value() == 0 {
            return Ok(Progress::EndOfBlock);
        }
        if (0b0011000..=0b1011111).contains(&code.value()) {
            code.get_more(bits, input, 1)?;
            output.add_byte((code.value() - 0b00110000) as u8)?;
        } else if code.value() >= 0b1100100 {
            code.get_more(bits, input, 2)?;
            output.add_byte((code.value() - (0b110010000 - 144)) as u8)?;
        } else {
            let symbol = if code.value() <= 0b0010111 {
                256 + code.value() as usize
            } else {
                code.get_more(bits, input, 1)?;
                280 + code.value() as usize - 0b11000000
            };
            let length = decode_length(input, bits, symbol - 254)?;
            let distance_code = bits.get_bits(input, 5)?.value() as usize + 1;
            let distance = decode_distance(input, bits, distance_code)?;
            if !copy.begin(output, length, distance)? {
                return Ok(Progress::MoreOutput);
            }
        }
    }
    Ok(Progress::MoreOutput)
}

fn run_dynamic<R: Read, S: DecompressionSettings>(
    input: &mut ByteInput<R>,
    bits: &mut BitReader,
    output: &mut OutputWindow<S>,
    litlen: &HuffmanTable,
    distance: &HuffmanTable,
    copy: &mut PendingCopy,
) -> Result<Progress> {
    if copy.remaining > 0 && !copy.resume(output)? {
        return Ok(Progress::MoreOutput);
    }
    while output.available() > 0 {
        let word = litlen.read_word(bits, input)?;
        if word < DEFLATE_END_OF_BLOCK {
            output.add_byte(word as u8)?;
        } else if word == DEFLATE_END_OF_BLOCK {
            return Ok(Progress::EndOfBlock);
        } else {
            let length = decode_length(input, bits, word as usize - 254)?;
            let distance_code = distance.read_word(bits, input)? as usize + 1;
            let far = decode_distance(input, bits, distance_code)?;
            if !copy.begin(output, length, far)? {
                return Ok(Progress::MoreOutput);
            }
        }
    }
    Ok(Progress::MoreOutput)
}

/// Resolves a length index (`symbol - 254`, so 3..=31 for valid symbols)
/// into a match length, reading extra bits where the table calls for them.
/// The arithmetic generalises the length table of RFC 1951 3.2.5.
fn decode_length<R: Read>(
    input: &mut ByteInput<R>,
    bits: &mut BitReader,
    index: usize,
) -> Result<usize> {
    if index <= 10 {
        return Ok(index);
    }
    if index == 31 {
        return Ok(DEFLATE_MAX_MATCH_LEN);
    }
    if index > 31 {
        return Err(Error::InvalidHuffmanCode("length symbol out of range"));
    }
    let extra_bits = (index as u32 - 7) >> 2;
    let additional = bits.get_bits_forward_order(input, extra_bits)? as usize;
    let raised = index + 1;
    Ok((((raised & 3) << extra_bits) | additional) + (1 << (raised >> 2)) + 3)
}

/// Resolves a distance index (`symbol + 1`, so 1..=30 for valid symbols)
/// into a back-reference distance.
fn decode_distance<R: Read>(
    input: &mut ByteInput<R>,
    bits: &mut BitReader,
    index: usize,
) -> Result<usize> {
    if index <= 4 {
        return Ok(index);
    }
    if index > 30 {
        return Err(Error::InvalidHuffmanCode("distance symbol out of range"));
    }
    let extra_bits = (index as u32 - 3) >> 1;
    let more = bits.get_bits_forward_order(input, extra_bits)? as usize;
    Ok(DEFLATE_DISTANCE_BASES[index - 1] + more)
}
