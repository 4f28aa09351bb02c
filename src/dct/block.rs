//! Block extraction and insertion with level shift and edge handling.

use super::{BLOCK_LEN, BLOCK_SIZE};
use crate::error::{Result, ensure_len};

/// 64 level-shifted samples, indexed `x * 8 + y`.
pub type Block = [f64; BLOCK_LEN];

/// Number of blocks needed to cover `extent` pixels: `ceil(extent / 8)`.
#[must_use]
pub fn blocks_along(extent: usize) -> usize {
    extent.div_ceil(BLOCK_SIZE)
}

/// Read the 8×8 cell at `(block_x, block_y)` from a row-major channel.
///
/// Each sample has 128 subtracted. Positions past the right or bottom edge
/// are zero, which is the level-shifted value of mid-gray.
pub fn extract_block(
    channel: &[u8],
    width: usize,
    height: usize,
    block_x: usize,
    block_y: usize,
) -> Result<Block> {
    ensure_len("channel", width * height, channel.len())?;

    let mut block = [0.0f64; BLOCK_LEN];
    for x in 0..BLOCK_SIZE {
        for y in 0..BLOCK_SIZE {
            let img_x = block_x * BLOCK_SIZE + x;
            let img_y = block_y * BLOCK_SIZE + y;
            if img_x < width && img_y < height {
                block[x * BLOCK_SIZE + y] = f64::from(channel[img_y * width + img_x]) - 128.0;
            }
        }
    }
    Ok(block)
}

/// Write a level-shifted block back into a row-major channel.
///
/// Adds 128, clamps to [0, 255] and truncates toward zero. Positions past the
/// image edge are skipped.
pub fn insert_block(
    channel: &mut [u8],
    width: usize,
    height: usize,
    block_x: usize,
    block_y: usize,
    block: &Block,
) -> Result<()> {
    ensure_len("channel", width * height, channel.len())?;
    write_block(channel, 1, 0, width, height, block_x, block_y, block);
    Ok(())
}

/// Strided form of [`insert_block`]: sample `i` of the image lives at
/// `dst[i * stride + offset]`. Lets the decoder write one channel of an
/// interleaved buffer in place. The caller guarantees `dst` is large enough.
#[allow(clippy::too_many_arguments)]
pub(crate) fn write_block(
    dst: &mut [u8],
    stride: usize,
    offset: usize,
    width: usize,
    height: usize,
    block_x: usize,
    block_y: usize,
    block: &Block,
) {
    for x in 0..BLOCK_SIZE {
        for y in 0..BLOCK_SIZE {
            let img_x = block_x * BLOCK_SIZE + x;
            let img_y = block_y * BLOCK_SIZE + y;
            if img_x < width && img_y < height {
                let v = block[x * BLOCK_SIZE + y] + 128.0;
                let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 255.0) };
                dst[(img_y * width + img_x) * stride + offset] = v as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_along() {
        assert_eq!(blocks_along(0), 0);
        assert_eq!(blocks_along(1), 1);
        assert_eq!(blocks_along(8), 1);
        assert_eq!(blocks_along(9), 2);
        assert_eq!(blocks_along(352), 44);
        assert_eq!(blocks_along(288), 36);
    }

    #[test]
    fn test_extract_level_shift_and_orientation() {
        // 8x8 channel where value = row * 8 + col
        let channel: Vec<u8> = (0..64).collect();
        let block = extract_block(&channel, 8, 8, 0, 0).unwrap();
        // x = 3 (column), y = 2 (row) -> pixel 2 * 8 + 3 = 19
        assert_eq!(block[3 * 8 + 2], 19.0 - 128.0);
    }

    #[test]
    fn test_extract_pads_edges() {
        let channel = vec![200u8; 10 * 3];
        let block = extract_block(&channel, 10, 3, 1, 0).unwrap();
        // Only columns 8..10 and rows 0..3 are inside the image.
        for x in 0..8 {
            for y in 0..8 {
                let expected = if x < 2 && y < 3 { 72.0 } else { 0.0 };
                assert_eq!(block[x * 8 + y], expected, "x={x} y={y}");
            }
        }
    }

    #[test]
    fn test_insert_clamps_and_skips_out_of_bounds() {
        let mut channel = vec![7u8; 10 * 3];
        let mut block = [0.0; BLOCK_LEN];
        block[0] = 500.0;
        block[8] = -500.0;
        block[7 * 8 + 7] = 1.0;
        insert_block(&mut channel, 10, 3, 1, 0, &block).unwrap();

        assert_eq!(channel[8], 255);
        assert_eq!(channel[9], 0);
        assert_eq!(channel[10 + 8], 128);
        // Left of the block is untouched.
        assert_eq!(channel[0], 7);
        assert_eq!(channel[10 + 7], 7);
    }

    #[test]
    fn test_insert_truncates() {
        let mut channel = vec![0u8; 64];
        insert_block(&mut channel, 8, 8, 0, 0, &[0.6; BLOCK_LEN]).unwrap();
        assert!(channel.iter().all(|&v| v == 128));

        insert_block(&mut channel, 8, 8, 0, 0, &[-0.6; BLOCK_LEN]).unwrap();
        assert!(channel.iter().all(|&v| v == 127));

        insert_block(&mut channel, 8, 8, 0, 0, &[126.9; BLOCK_LEN]).unwrap();
        assert!(channel.iter().all(|&v| v == 254));
    }

    #[test]
    fn test_channel_length_checked() {
        assert!(extract_block(&[0u8; 5], 8, 8, 0, 0).is_err());
        let block = [0.0; BLOCK_LEN];
        assert!(insert_block(&mut [0u8; 5], 8, 8, 0, 0, &block).is_err());
    }
}
