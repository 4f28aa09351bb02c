//! Interleaved pixel buffer helpers.
//!
//! A pixel buffer is `width * height * 3` bytes in `R, G, B, R, G, B, ...`
//! order. The core never retains buffers; these helpers only reshape them.

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;

use crate::error::{Error, Result, ensure_len};

/// Number of interleaved channels in a pixel buffer.
pub const CHANNELS: usize = 3;

/// Byte length of an interleaved RGB buffer for the given dimensions.
#[must_use]
pub fn buffer_len(width: usize, height: usize) -> usize {
    width * height * CHANNELS
}

/// Split an interleaved buffer into three row-major channels.
pub fn split_channels(buffer: &[u8], width: usize, height: usize) -> Result<[Vec<u8>; 3]> {
    ensure_len("pixel buffer", buffer_len(width, height), buffer.len())?;

    let pixels = width * height;
    let mut r = Vec::with_capacity(pixels);
    let mut g = Vec::with_capacity(pixels);
    let mut b = Vec::with_capacity(pixels);
    for px in buffer.chunks_exact(CHANNELS) {
        r.push(px[0]);
        g.push(px[1]);
        b.push(px[2]);
    }
    Ok([r, g, b])
}

/// Interleave three equal-length channels into one buffer.
pub fn merge_channels(channels: &[Vec<u8>; 3]) -> Result<Vec<u8>> {
    let pixels = channels[0].len();
    ensure_len("green channel", pixels, channels[1].len())?;
    ensure_len("blue channel", pixels, channels[2].len())?;

    let mut out = Vec::with_capacity(pixels * CHANNELS);
    for i in 0..pixels {
        out.extend_from_slice(&[channels[0][i], channels[1][i], channels[2][i]]);
    }
    Ok(out)
}

/// Convert a planar `RRR...GGG...BBB...` buffer to interleaved order.
///
/// This is the layout of raw `.rgb` captures; reading the file is left to
/// the caller.
pub fn interleave_planar(planar: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    ensure_len("planar buffer", buffer_len(width, height), planar.len())?;

    let plane = width * height;
    let (r, rest) = planar.split_at(plane);
    let (g, b) = rest.split_at(plane);
    let mut out = Vec::with_capacity(plane * CHANNELS);
    for ((&r, &g), &b) in r.iter().zip(g).zip(b) {
        out.extend_from_slice(&[r, g, b]);
    }
    Ok(out)
}

/// Sizes tried, in order, when a file name carries no dimensions.
pub const CANDIDATE_SIZES: [(usize, usize); 6] = [
    (512, 512),
    (352, 288),
    (640, 480),
    (256, 256),
    (320, 240),
    (384, 288),
];

/// Work out `(width, height)` for a raw planar `.rgb` file.
///
/// A name ending in `_<W>x<H>.rgb` (any case) gives the size directly.
/// Otherwise the first entry of [`CANDIDATE_SIZES`] whose buffer length
/// equals `byte_len` is used. Either way the result must account for exactly
/// `byte_len` bytes. Nothing is read from disk.
pub fn infer_dimensions(name: &str, byte_len: usize) -> Result<(usize, usize)> {
    let (width, height) = match dimensions_from_name(name) {
        Some(dims) => dims,
        None => CANDIDATE_SIZES
            .into_iter()
            .find(|&(w, h)| buffer_len(w, h) == byte_len)
            .ok_or_else(|| Error::InvalidOption {
                kind: "image size",
                value: name.to_string(),
            })?,
    };
    ensure_len("image file", buffer_len(width, height), byte_len)?;
    Ok((width, height))
}

fn dimensions_from_name(name: &str) -> Option<(usize, usize)> {
    let lower = name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".rgb")?;
    let (_, size) = stem.rsplit_once('_')?;
    let (w, h) = size.split_once('x')?;
    let parse = |s: &str| {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<usize>().ok()
    };
    Some((parse(w)?, parse(h)?))
}

/// Flatten an `imgref` image into an interleaved buffer, dropping stride padding.
#[must_use]
pub fn from_imgref(img: ImgRef<'_, RGB8>) -> Vec<u8> {
    img.pixels().flat_map(|p| [p.r, p.g, p.b]).collect()
}

/// Wrap an interleaved buffer as an owned `imgref` image.
pub fn to_imgvec(buffer: &[u8], width: usize, height: usize) -> Result<ImgVec<RGB8>> {
    ensure_len("pixel buffer", buffer_len(width, height), buffer.len())?;

    let pixels: Vec<RGB8> = buffer
        .chunks_exact(CHANNELS)
        .map(|c| RGB8::new(c[0], c[1], c[2]))
        .collect();
    Ok(ImgVec::new(pixels, width, height))
}
