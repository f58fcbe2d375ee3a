use std::io::Read;

use crate::common::*;
use crate::crc32::Checksum;
use crate::error::{Error, Result};
use crate::input::ByteInput;
use crate::settings::DecompressionSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingSystem {
    Windows,
    Unix,
    Other,
}

/// Metadata from a GZIP member header (RFC 1952 2.3).
#[derive(Debug, Clone)]
pub struct GzHeader {
    /// Unix timestamp of the original file, 0 if unavailable.
    pub modification_time: u32,
    pub operating_system: OperatingSystem,
    /// XFL said the compressor used its fastest setting.
    pub fastest_compression: bool,
    /// XFL said the compressor used its strongest setting.
    pub densest_compression: bool,
    pub extra_data: Option<Vec<u8>>,
    /// Original file name, without the terminating NUL.
    pub name: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    pub probably_text: bool,
}

fn read_byte<R: Read, C: Checksum>(input: &mut ByteInput<R>, checksum: &mut C) -> Result<u8> {
    let value = input.get_integer(1)? as u8;
    checksum.fold(&[value]);
    Ok(value)
}

fn read_u16<R: Read, C: Checksum>(input: &mut ByteInput<R>, checksum: &mut C) -> Result<u16> {
    let value = input.get_integer(2)? as u16;
    checksum.fold(&value.to_le_bytes());
    Ok(value)
}

fn read_u32<R: Read, C: Checksum>(input: &mut ByteInput<R>, checksum: &mut C) -> Result<u32> {
    let value = input.get_integer(4)? as u32;
    checksum.fold(&value.to_le_bytes());
    Ok(value)
}

fn read_zero_terminated<R: Read, C: Checksum>(
    input: &mut ByteInput<R>,
    checksum: &mut C,
) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    loop {
        let byte = read_byte(input, checksum)?;
        if byte == 0 {
            return Ok(bytes);
        }
        bytes.push(byte);
    }
}

impl GzHeader {
    /// Parses the header fields in wire order, folding every header byte
    /// (except the FHCRC field itself) into a fresh checksum so the optional
    /// header CRC can be verified.
    pub(crate) fn parse<R: Read, S: DecompressionSettings>(
        input: &mut ByteInput<R>,
    ) -> Result<GzHeader> {
        let mut checksum = S::Checksum::default();

        let id1 = read_byte(input, &mut checksum)?;
        let id2 = read_byte(input, &mut checksum)?;
        if id1 != GZIP_ID1 || id2 != GZIP_ID2 {
            return Err(Error::MalformedHeader("not a gzip archive"));
        }
        if read_byte(input, &mut checksum)? != GZIP_CM_DEFLATE {
            return Err(Error::MalformedHeader("unsupported compression method"));
        }
        let flags = read_byte(input, &mut checksum)?;
        if flags & GZIP_FRESERVED != 0 {
            return Err(Error::MalformedHeader("reserved flag bits set"));
        }
        let modification_time = read_u32(input, &mut checksum)?;
        let extra_flags = read_byte(input, &mut checksum)?;
        let os_byte = read_byte(input, &mut checksum)?;

        let operating_system = match os_byte {
            GZIP_OS_WINDOWS => OperatingSystem::Windows,
            GZIP_OS_UNIX => OperatingSystem::Unix,
            _ => OperatingSystem::Other,
        };

        let mut extra_data = None;
        if flags & GZIP_FEXTRA != 0 {
            let extra_length = read_u16(input, &mut checksum)? as usize;
            let mut data = Vec::with_capacity(extra_length);
            while data.len() < extra_length {
                let taken = input.get_range(extra_length - data.len())?;
                if taken.is_empty() {
                    return Err(Error::UnexpectedEndOfStream);
                }
                checksum.fold(taken);
                data.extend_from_slice(taken);
            }
            extra_data = Some(data);
        }

        let name = if flags & GZIP_FNAME != 0 {
            Some(read_zero_terminated(input, &mut checksum)?)
        } else {
            None
        };
        let comment = if flags & GZIP_FCOMMENT != 0 {
            Some(read_zero_terminated(input, &mut checksum)?)
        } else {
            None
        };

        if flags & GZIP_FHCRC != 0 {
            // The stored CRC16 covers everything before itself.
            let expected = input.get_integer(2)? as u16;
            if S::VERIFY_CHECKSUM {
                let actual = (checksum.digest() & 0xFFFF) as u16;
                if expected != actual {
                    return Err(Error::ChecksumMismatch {
                        expected: expected as u32,
                        actual: actual as u32,
                    });
                }
            }
        }

        Ok(GzHeader {
            modification_time,
            operating_system,
            fastest_compression: extra_flags == GZIP_XFL_FASTEST_COMPRESSION,
            densest_compression: extra_flags == GZIP_XFL_SLOWEST_COMPRESSION,
            extra_data,
            name,
            comment,
            probably_text: flags & GZIP_FTEXT != 0,
        })
    }
}
