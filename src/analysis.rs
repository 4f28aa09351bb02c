//! Bit-allocation sweeps.
//!
//! For a fixed budget of bits per pixel, which split across the three
//! channels loses the least? A sweep answers that by running every
//! experiment in a grid of (total bits, color space, method, partition) and
//! collecting one [`SweepRow`] per run into a [`SweepReport`] that can be
//! written as CSV or JSON.

use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::color::ColorSpace;
use crate::error::Result;
use crate::experiment::{QuantConfig, run_experiment};
use crate::pixels::{CHANNELS, buffer_len};
use crate::quant::{PASSTHROUGH_BITS, QuantMethod};

/// Bit totals swept when none are configured.
pub const DEFAULT_TOTALS: [u32; 3] = [4, 6, 8];

/// Every `[q1, q2, q3]` with each entry in 1..=8 summing to `total`, in
/// lexicographic order.
#[must_use]
pub fn bit_partitions(total: u32) -> Vec<[u8; CHANNELS]> {
    let mut parts = Vec::new();
    for q1 in 1..=PASSTHROUGH_BITS {
        for q2 in 1..=PASSTHROUGH_BITS {
            for q3 in 1..=PASSTHROUGH_BITS {
                if u32::from(q1) + u32::from(q2) + u32::from(q3) == total {
                    parts.push([q1, q2, q3]);
                }
            }
        }
    }
    parts
}

/// Grid of experiments to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Bits per pixel budgets.
    pub totals: Vec<u32>,
    /// Color spaces to try for each budget.
    pub color_spaces: Vec<ColorSpace>,
    /// Quantizers to try for each color space.
    pub methods: Vec<QuantMethod>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            totals: DEFAULT_TOTALS.to_vec(),
            color_spaces: ColorSpace::ALL.to_vec(),
            methods: QuantMethod::ALL.to_vec(),
        }
    }
}

impl SweepConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> SweepConfigBuilder {
        SweepConfigBuilder::default()
    }

    /// Every configuration in the grid, in report order.
    #[must_use]
    pub fn experiments(&self) -> Vec<QuantConfig> {
        let mut out = Vec::new();
        for &total in &self.totals {
            let parts = bit_partitions(total);
            for &color_space in &self.color_spaces {
                for &method in &self.methods {
                    out.extend(parts.iter().map(|&bits| QuantConfig {
                        color_space,
                        method,
                        bits,
                    }));
                }
            }
        }
        out
    }
}

/// Builder for [`SweepConfig`].
#[derive(Debug, Default)]
pub struct SweepConfigBuilder {
    totals: Option<Vec<u32>>,
    color_spaces: Option<Vec<ColorSpace>>,
    methods: Option<Vec<QuantMethod>>,
}

impl SweepConfigBuilder {
    /// Set the bit totals to sweep.
    #[must_use]
    pub fn totals(mut self, totals: Vec<u32>) -> Self {
        self.totals = Some(totals);
        self
    }

    /// Set the color spaces to sweep.
    #[must_use]
    pub fn color_spaces(mut self, color_spaces: Vec<ColorSpace>) -> Self {
        self.color_spaces = Some(color_spaces);
        self
    }

    /// Set the quantizers to sweep.
    #[must_use]
    pub fn methods(mut self, methods: Vec<QuantMethod>) -> Self {
        self.methods = Some(methods);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> SweepConfig {
        let defaults = SweepConfig::default();
        SweepConfig {
            totals: self.totals.unwrap_or(defaults.totals),
            color_spaces: self.color_spaces.unwrap_or(defaults.color_spaces),
            methods: self.methods.unwrap_or(defaults.methods),
        }
    }
}

/// One experiment's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    /// Bits per pixel budget.
    pub total_bits: u32,
    /// Color space.
    pub color_space: ColorSpace,
    /// Quantizer.
    pub method: QuantMethod,
    /// Bits for the first channel (R or Y).
    pub q1: u8,
    /// Bits for the second channel (G or U).
    pub q2: u8,
    /// Bits for the third channel (B or V).
    pub q3: u8,
    /// Sum of absolute byte differences.
    pub abs_error: u64,
    /// Mean squared error per byte.
    pub mse: f64,
    /// PSNR in dB.
    pub psnr: f64,
}

/// All rows of a sweep over one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Image width.
    pub width: usize,
    /// Image height.
    pub height: usize,
    /// Rows ordered by (total, color space, method, partition).
    pub rows: Vec<SweepRow>,
    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SweepReport {
    /// Row with the smallest absolute error for a given bit total.
    #[must_use]
    pub fn best_for_total(&self, total_bits: u32) -> Option<&SweepRow> {
        self.rows
            .iter()
            .filter(|r| r.total_bits == total_bits)
            .min_by_key(|r| r.abs_error)
    }

    /// Write the rows as CSV with a header line.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record([
            "total_bits",
            "color_space",
            "method",
            "q1",
            "q2",
            "q3",
            "abs_error",
            "mse",
            "psnr",
        ])?;

        for row in &self.rows {
            wtr.write_record([
                &row.total_bits.to_string(),
                &row.color_space.to_string(),
                &row.method.to_string(),
                &row.q1.to_string(),
                &row.q2.to_string(),
                &row.q3.to_string(),
                &row.abs_error.to_string(),
                &format!("{:.4}", row.mse),
                &format!("{:.4}", row.psnr),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write the whole report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Run every experiment in `config` against one image.
///
/// Experiments are independent and run in parallel; rows come back in the
/// order [`SweepConfig::experiments`] lists them.
pub fn run_sweep(
    buffer: &[u8],
    width: usize,
    height: usize,
    config: &SweepConfig,
) -> Result<SweepReport> {
    crate::error::ensure_len("image buffer", buffer_len(width, height), buffer.len())?;

    let rows = config
        .experiments()
        .par_iter()
        .map(|cfg| {
            let result = run_experiment(buffer, width, height, cfg)?;
            Ok(SweepRow {
                total_bits: cfg.total_bits(),
                color_space: cfg.color_space,
                method: cfg.method,
                q1: cfg.bits[0],
                q2: cfg.bits[1],
                q3: cfg.bits[2],
                abs_error: result.abs_error,
                mse: result.mse,
                psnr: result.psnr,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SweepReport {
        width,
        height,
        rows,
        timestamp: chrono::Utc::now(),
    })
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> Vec<u8> {
        (0..8 * 8)
            .flat_map(|i| [(i * 4) as u8, (255 - i * 3) as u8, ((i * 37) % 256) as u8])
            .collect()
    }

    #[test]
    fn test_bit_partitions() {
        assert_eq!(bit_partitions(4), vec![[1, 1, 2], [1, 2, 1], [2, 1, 1]]);
        assert_eq!(bit_partitions(3), vec![[1, 1, 1]]);
        assert_eq!(bit_partitions(6).len(), 10);
        assert_eq!(bit_partitions(8).len(), 21);
        assert_eq!(bit_partitions(24), vec![[8, 8, 8]]);
        assert!(bit_partitions(2).is_empty());
        assert!(bit_partitions(25).is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = SweepConfig::builder().build();
        assert_eq!(config.totals, vec![4, 6, 8]);
        assert_eq!(config.color_spaces, vec![ColorSpace::Rgb, ColorSpace::Yuv]);
        assert_eq!(config.methods, vec![QuantMethod::Uniform, QuantMethod::Smart]);
        assert_eq!(config.experiments().len(), (3 + 10 + 21) * 4);
    }

    #[test]
    fn test_sweep_order() {
        let image = test_image();
        let config = SweepConfig::builder().totals(vec![4, 5]).build();
        let report = run_sweep(&image, 8, 8, &config).unwrap();

        assert_eq!(report.rows.len(), (3 + 6) * 4);
        assert_eq!(report.width, 8);

        let first = &report.rows[0];
        assert_eq!(
            (first.total_bits, first.color_space, first.method, [first.q1, first.q2, first.q3]),
            (4, ColorSpace::Rgb, QuantMethod::Uniform, [1, 1, 2])
        );
        let last = report.rows.last().unwrap();
        assert_eq!(
            (last.total_bits, last.color_space, last.method, [last.q1, last.q2, last.q3]),
            (5, ColorSpace::Yuv, QuantMethod::Smart, [3, 1, 1])
        );
        assert!(report.rows.iter().all(|r| u32::from(r.q1 + r.q2 + r.q3) == r.total_bits));
    }

    #[test]
    fn test_sweep_matches_single_experiment() {
        let image = test_image();
        let config = SweepConfig::builder()
            .totals(vec![6])
            .color_spaces(vec![ColorSpace::Yuv])
            .methods(vec![QuantMethod::Smart])
            .build();
        let report = run_sweep(&image, 8, 8, &config).unwrap();

        for row in &report.rows {
            let single = QuantConfig::builder()
                .color_space(row.color_space)
                .method(row.method)
                .bits([row.q1, row.q2, row.q3])
                .build()
                .unwrap();
            let result = run_experiment(&image, 8, 8, &single).unwrap();
            assert_eq!(result.abs_error, row.abs_error);
        }
        let best = report.best_for_total(6).unwrap();
        assert!(report.rows.iter().all(|r| r.abs_error >= best.abs_error));
        assert!(report.best_for_total(4).is_none());
    }

    #[test]
    fn test_sweep_rejects_bad_buffer() {
        assert!(run_sweep(&[0u8; 7], 2, 2, &SweepConfig::default()).is_err());
    }

    #[test]
    fn test_write_csv() {
        let image = test_image();
        let config = SweepConfig::builder().totals(vec![3]).build();
        let report = run_sweep(&image, 8, 8, &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.csv");
        report.write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "total_bits,color_space,method,q1,q2,q3,abs_error,mse,psnr"
        );
        assert!(lines.next().unwrap().starts_with("3,rgb,uniform,1,1,1,"));
        assert_eq!(text.lines().count(), 1 + 4);
    }

    #[test]
    fn test_write_json() {
        let image = test_image();
        let config = SweepConfig::builder()
            .totals(vec![3])
            .methods(vec![QuantMethod::Uniform])
            .build();
        let report = run_sweep(&image, 8, 8, &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.json");
        report.write_json(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: SweepReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.rows.len(), report.rows.len());
        for (a, b) in back.rows.iter().zip(&report.rows) {
            assert_eq!((a.color_space, a.q1, a.abs_error), (b.color_space, b.q1, b.abs_error));
            assert!((a.mse - b.mse).abs() < 1e-9);
        }
        assert_eq!(back.timestamp, report.timestamp);
        assert!(text.contains("\"color_space\": \"yuv\""));
    }
}
