//! DSSIM (Structural Dissimilarity) over interleaved RGB buffers.
//!
//! Wraps the `dssim-core` crate.

use dssim_core::Dssim;
use imgref::ImgVec;
use rgb::RGBA;

use crate::error::{Error, Result, ensure_len};
use crate::pixels::{CHANNELS, buffer_len};

/// Calculate DSSIM between two interleaved RGB images.
///
/// Returns 0 for identical images, higher for more different ones.
///
/// # Errors
///
/// Returns an error if either buffer is not `width * height * 3` bytes or if
/// `dssim-core` rejects the image (for example, when it is too small).
pub fn calculate_dssim(reference: &[u8], test: &[u8], width: usize, height: usize) -> Result<f64> {
    let expected = buffer_len(width, height);
    ensure_len("reference image", expected, reference.len())?;
    ensure_len("test image", expected, test.len())?;

    let dssim = Dssim::new();

    let ref_image = dssim
        .create_image(&rgb8_to_dssim_image(reference, width, height))
        .ok_or_else(|| Error::MetricCalculation {
            metric: "DSSIM".to_string(),
            reason: "Failed to create reference image".to_string(),
        })?;

    let test_image = dssim
        .create_image(&rgb8_to_dssim_image(test, width, height))
        .ok_or_else(|| Error::MetricCalculation {
            metric: "DSSIM".to_string(),
            reason: "Failed to create test image".to_string(),
        })?;

    let (dssim_val, _ssim_maps) = dssim.compare(&ref_image, test_image);

    Ok(f64::from(dssim_val))
}

/// Convert RGB8 bytes to the normalized RGBA float image `dssim-core` expects.
#[must_use]
pub fn rgb8_to_dssim_image(data: &[u8], width: usize, height: usize) -> ImgVec<RGBA<f32>> {
    let pixels: Vec<RGBA<f32>> = data
        .chunks_exact(CHANNELS)
        .map(|rgb| RGBA {
            r: f32::from(rgb[0]) / 255.0,
            g: f32::from(rgb[1]) / 255.0,
            b: f32::from(rgb[2]) / 255.0,
            a: 1.0,
        })
        .collect();

    ImgVec::new(pixels, width, height)
}
