//! Error types for dct-lab operations.

use thiserror::Error;

/// Result type alias for dct-lab operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while quantizing, encoding, or decoding.
///
/// Every variant except the I/O wrappers is a precondition violation:
/// the caller handed in data of the wrong shape or an out-of-range
/// parameter. Degenerate but valid data (constant channels, empty channels)
/// never produces an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A buffer, channel, or plane has the wrong number of elements.
    #[error("Length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch {
        /// What was being measured.
        context: &'static str,
        /// Required length.
        expected: usize,
        /// Length actually provided.
        actual: usize,
    },

    /// Quantizer bit depth outside 1..=8.
    #[error("Invalid bit depth: {0} (expected 1-8)")]
    InvalidBitDepth(u8),

    /// Coefficient quantization level outside 0..=MAX_QUANT_LEVEL.
    #[error("Invalid quantization level: {0} (expected 0-{max})", max = crate::dct::MAX_QUANT_LEVEL)]
    InvalidQuantLevel(u32),

    /// Coefficient block grids disagree with each other or with the image.
    #[error("Block grid mismatch: expected {expected:?}, got {actual:?}")]
    GridMismatch {
        /// Expected grid (blocks_x, blocks_y).
        expected: (usize, usize),
        /// Actual grid (blocks_x, blocks_y).
        actual: (usize, usize),
    },

    /// Channel index outside 0..3.
    #[error("Invalid channel index: {0} (expected 0-2)")]
    InvalidChannel(usize),

    /// A mode or option string could not be parsed.
    #[error("Unrecognized {kind}: {value:?}")]
    InvalidOption {
        /// Which option was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Failed to calculate a quality metric.
    #[error("Metric calculation failed: {metric}: {reason}")]
    MetricCalculation {
        /// Name of the metric that failed.
        metric: String,
        /// Reason for the failure.
        reason: String,
    },

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Fail with [`Error::LengthMismatch`] unless `actual == expected`.
pub(crate) fn ensure_len(context: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::LengthMismatch {
            context,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_len() {
        assert!(ensure_len("pixels", 12, 12).is_ok());
        let err = ensure_len("pixels", 12, 9).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch {
                expected: 12,
                actual: 9,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "Length mismatch in pixels: expected 12, got 9"
        );
    }

    #[test]
    fn test_quant_level_message() {
        let msg = Error::InvalidQuantLevel(40).to_string();
        assert!(msg.contains("40"));
        assert!(msg.contains("0-15"));
    }
}
