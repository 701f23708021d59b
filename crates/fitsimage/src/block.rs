//! FITS record geometry: 2880-byte blocks made of 80-byte cards.

/// FITS block size in bytes.
pub const BLOCK_SIZE: usize = 2880;

/// FITS card (keyword record) size in bytes.
pub const CARD_SIZE: usize = 80;

/// Number of cards that fit in a single block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// Padding byte for header blocks (ASCII space).
pub const HEADER_PAD_BYTE: u8 = b' ';

/// Padding byte for data blocks.
pub const DATA_PAD_BYTE: u8 = 0x00;

/// Number of whole blocks needed to hold `num_bytes` bytes.
pub const fn blocks_needed(num_bytes: usize) -> usize {
    num_bytes.div_ceil(BLOCK_SIZE)
}

/// Byte length of `num_bytes` rounded up to a whole number of blocks.
pub const fn padded_byte_len(num_bytes: usize) -> usize {
    blocks_needed(num_bytes) * BLOCK_SIZE
}

/// Extend `buf` with `pad_byte` until its length is a multiple of [`BLOCK_SIZE`].
pub fn pad_to_block(buf: &mut Vec<u8>, pad_byte: u8) {
    let target = padded_byte_len(buf.len());
    buf.resize(target, pad_byte);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_needed_boundaries() {
        assert_eq!(blocks_needed(0), 0);
        assert_eq!(blocks_needed(1), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE + 1), 2);
        assert_eq!(blocks_needed(5760), 2);
    }

    #[test]
    fn padded_len_rounds_up() {
        assert_eq!(padded_byte_len(0), 0);
        assert_eq!(padded_byte_len(100), BLOCK_SIZE);
        assert_eq!(padded_byte_len(2 * BLOCK_SIZE), 2 * BLOCK_SIZE);
    }

    #[test]
    fn constant_relationships() {
        assert_eq!(CARDS_PER_BLOCK, 36);
        assert_eq!(CARDS_PER_BLOCK * CARD_SIZE, BLOCK_SIZE);
    }

    #[test]
    fn pad_header_with_spaces() {
        let mut buf = vec![b'A'; 80];
        pad_to_block(&mut buf, HEADER_PAD_BYTE);
        assert_eq!(buf.len(), BLOCK_SIZE);
        assert!(buf[80..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn pad_data_with_zeros() {
        let mut buf = vec![0xFF; BLOCK_SIZE + 3];
        pad_to_block(&mut buf, DATA_PAD_BYTE);
        assert_eq!(buf.len(), 2 * BLOCK_SIZE);
        assert!(buf[BLOCK_SIZE + 3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn pad_aligned_buffer_is_unchanged() {
        let mut buf = vec![1u8; BLOCK_SIZE];
        pad_to_block(&mut buf, DATA_PAD_BYTE);
        assert_eq!(buf.len(), BLOCK_SIZE);
        let mut empty = Vec::new();
        pad_to_block(&mut empty, HEADER_PAD_BYTE);
        assert!(empty.is_empty());
    }
}
