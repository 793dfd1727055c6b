//! Block-header on-disk layout: fixed-size file header and per-block
//! headers. Plain little-endian byte slicing is used for both fixed
//! layouts rather than pulling in a crate like `zerocopy`.

/// `MARK6_SG_SYNC_WORD` — the magic value a valid block-header file's file
/// header must carry.
pub const MARK6_SG_SYNC_WORD: u64 = 0xFEED_6666_FEED_6666;

/// Format version this core understands; any other value causes the file
/// to be skipped as "not in this format".
pub const SUPPORTED_VERSION: u32 = 2;

/// Total size of the file header, in bytes. Discovery begins reading block
/// headers at this offset.
pub const FILE_HEADER_SIZE: usize = 64;

/// Total size of one block header, in bytes. `wb_size`
/// includes this many header bytes plus the payload.
pub const BLOCK_HEADER_SIZE: usize = 16;

#[inline]
fn read_le_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

#[inline]
fn read_le_u64(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap())
}

#[inline]
fn read_le_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

/// The fixed-size structure at the start of a block-header file.
///
/// Layout (little-endian, [`FILE_HEADER_SIZE`] bytes total):
/// - `[0..8)`  `sync_word: u64`
/// - `[8..12)` `version: u32`
/// - `[12..16)` `block_size: u32` (nominal; not consulted by this core)
/// - `[16..64)` reserved, producer-defined, ignored
pub struct FileHeader {
    pub sync_word: u64,
    pub version: u32,
}

impl FileHeader {
    /// Parses a header from a buffer of at least [`FILE_HEADER_SIZE`] bytes.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < FILE_HEADER_SIZE {
            return None;
        }
        Some(FileHeader {
            sync_word: read_le_u64(buf, 0),
            version: read_le_u32(buf, 8),
        })
    }

    /// `true` iff this header matches the sync word and supported version
    /// this core understands.
    pub fn is_recognized(&self) -> bool {
        self.sync_word == MARK6_SG_SYNC_WORD && self.version == SUPPORTED_VERSION
    }
}

/// The fixed-size structure preceding each block's payload.
///
/// Layout (little-endian, [`BLOCK_HEADER_SIZE`] bytes total):
/// - `[0..4)` `block_number: i32`
/// - `[4..8)` `wb_size: u32` (total bytes: header + payload)
/// - `[8..16)` reserved, producer-defined, ignored
pub struct BlockHeader {
    pub block_number: i32,
    pub wb_size: u32,
}

impl BlockHeader {
    /// Parses a header from a buffer of at least [`BLOCK_HEADER_SIZE`] bytes.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < BLOCK_HEADER_SIZE {
            return None;
        }
        Some(BlockHeader {
            block_number: read_le_i32(buf, 0),
            wb_size: read_le_u32(buf, 4),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_header_bytes(sync_word: u64, version: u32) -> [u8; FILE_HEADER_SIZE] {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        buf[0..8].copy_from_slice(&sync_word.to_le_bytes());
        buf[8..12].copy_from_slice(&version.to_le_bytes());
        buf
    }

    fn block_header_bytes(block_number: i32, wb_size: u32) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        buf[0..4].copy_from_slice(&block_number.to_le_bytes());
        buf[4..8].copy_from_slice(&wb_size.to_le_bytes());
        buf
    }

    #[test]
    fn file_header_recognizes_valid_sync_and_version() {
        let buf = file_header_bytes(MARK6_SG_SYNC_WORD, SUPPORTED_VERSION);
        let hdr = FileHeader::parse(&buf).unwrap();
        assert!(hdr.is_recognized());
    }

    #[test]
    fn file_header_rejects_wrong_sync_word() {
        let buf = file_header_bytes(0xDEAD_BEEF, SUPPORTED_VERSION);
        let hdr = FileHeader::parse(&buf).unwrap();
        assert!(!hdr.is_recognized());
    }

    #[test]
    fn file_header_rejects_wrong_version() {
        let buf = file_header_bytes(MARK6_SG_SYNC_WORD, 1);
        let hdr = FileHeader::parse(&buf).unwrap();
        assert!(!hdr.is_recognized());
    }

    #[test]
    fn file_header_parse_rejects_short_buffer() {
        assert!(FileHeader::parse(&[0u8; 10]).is_none());
    }

    #[test]
    fn block_header_round_trip() {
        let buf = block_header_bytes(7, 1024);
        let hdr = BlockHeader::parse(&buf).unwrap();
        assert_eq!(hdr.block_number, 7);
        assert_eq!(hdr.wb_size, 1024);
    }
}
