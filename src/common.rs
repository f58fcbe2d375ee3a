pub const DEFLATE_BLOCKTYPE_UNCOMPRESSED: u16 = 0;
pub const DEFLATE_BLOCKTYPE_STATIC_HUFFMAN: u16 = 1;
pub const DEFLATE_BLOCKTYPE_DYNAMIC_HUFFMAN: u16 = 2;

pub const DEFLATE_MIN_MATCH_LEN: usize = 3;
pub const DEFLATE_MAX_MATCH_LEN: usize = 258;

pub const DEFLATE_MAX_MATCH_OFFSET: usize = 32768;

pub const DEFLATE_NUM_PRECODE_SYMS: usize = 19;
pub const DEFLATE_NUM_LITLEN_SYMS: usize = 288;
pub const DEFLATE_NUM_OFFSET_SYMS: usize = 32;

pub const DEFLATE_MAX_NUM_SYMS: usize = 288;

pub const DEFLATE_END_OF_BLOCK: u16 = 256;

pub const DEFLATE_MAX_PRE_CODEWORD_LEN: usize = 7;
pub const DEFLATE_MAX_CODEWORD_LEN: usize = 15;

/// Order in which the precode lengths of a dynamic block are transmitted.
pub const DEFLATE_PRECODE_ORDER: [usize; DEFLATE_NUM_PRECODE_SYMS] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Base distance for each distance symbol; extra bits follow for symbols >= 4.
pub const DEFLATE_DISTANCE_BASES: [usize; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

pub const GZIP_FOOTER_SIZE: usize = 8;

pub const GZIP_ID1: u8 = 0x1F;
pub const GZIP_ID2: u8 = 0x8B;
pub const GZIP_CM_DEFLATE: u8 = 8;

pub const GZIP_FTEXT: u8 = 0x01;
pub const GZIP_FHCRC: u8 = 0x02;
pub const GZIP_FEXTRA: u8 = 0x04;
pub const GZIP_FNAME: u8 = 0x08;
pub const GZIP_FCOMMENT: u8 = 0x10;
pub const GZIP_FRESERVED: u8 = 0xE0;

pub const GZIP_XFL_SLOWEST_COMPRESSION: u8 = 4;
pub const GZIP_XFL_FASTEST_COMPRESSION: u8 = 8;

pub const GZIP_OS_WINDOWS: u8 = 0;
pub const GZIP_OS_UNIX: u8 = 3;
