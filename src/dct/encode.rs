//! Image → coefficient encoding.

use super::{
    CoefficientSet, EncodedImage, blocks_along, extract_block, forward_dct, quant_divisor,
    quantize_block,
};
use crate::error::Result;
use crate::pixels::split_channels;

/// Encode one row-major channel at quantization level `quant_level`.
pub fn encode_channel(
    channel: &[u8],
    width: usize,
    height: usize,
    quant_level: u32,
) -> Result<CoefficientSet> {
    quant_divisor(quant_level)?;

    let blocks_x = blocks_along(width);
    let blocks_y = blocks_along(height);
    let mut set = CoefficientSet::zeroed(blocks_x, blocks_y);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = extract_block(channel, width, height, bx, by)?;
            let quantized = quantize_block(&forward_dct(&block), quant_level)?;
            set.block_mut(by * blocks_x + bx).copy_from_slice(&quantized);
        }
    }
    Ok(set)
}

/// Encode an interleaved RGB buffer into three coefficient sets.
///
/// Each channel is transformed independently on the same
/// `ceil(width / 8) × ceil(height / 8)` grid.
pub fn encode_image(
    buffer: &[u8],
    width: usize,
    height: usize,
    quant_level: u32,
) -> Result<EncodedImage> {
    let [r, g, b] = split_channels(buffer, width, height)?;
    let channels = [
        encode_channel(&r, width, height, quant_level)?,
        encode_channel(&g, width, height, quant_level)?,
        encode_channel(&b, width, height, quant_level)?,
    ];
    EncodedImage::from_channels(width, height, quant_level, channels)
}
