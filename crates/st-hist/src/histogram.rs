//! Fixed-binning 1D histogram with under/overflow and running moments.

use serde::{Deserialize, Serialize};
use st_core::{Error, Result};

/// A 1D histogram with `n_bins` equal bins on `[x_min, x_max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram1D {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Lower edge of first bin.
    pub x_min: f64,
    /// Upper edge of last bin.
    pub x_max: f64,
    /// Bin contents (length = n_bins, excluding under/overflow).
    pub bin_content: Vec<f64>,
    /// Entries below `x_min`.
    pub underflow: f64,
    /// Entries at or above `x_max`.
    pub overflow: f64,
    /// Number of fills, flows included.
    pub entries: u64,
    /// Sum of all filled values.
    pub sum: f64,
    /// Sum of squares of all filled values.
    pub sum_sq: f64,
}

impl Histogram1D {
    /// Book an empty histogram.
    pub fn new(name: &str, title: &str, n_bins: usize, x_min: f64, x_max: f64) -> Result<Self> {
        if n_bins == 0 {
            return Err(Error::Validation(format!("histogram '{name}': n_bins must be > 0")));
        }
        if !(x_min.is_finite() && x_max.is_finite() && x_min < x_max) {
            return Err(Error::Validation(format!(
                "histogram '{name}': invalid range [{x_min}, {x_max})"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            title: title.to_string(),
            n_bins,
            x_min,
            x_max,
            bin_content: vec![0.0; n_bins],
            underflow: 0.0,
            overflow: 0.0,
            entries: 0,
            sum: 0.0,
            sum_sq: 0.0,
        })
    }

    /// Bin width.
    pub fn bin_width(&self) -> f64 {
        (self.x_max - self.x_min) / self.n_bins as f64
    }

    /// Bin edges (length = n_bins + 1).
    pub fn bin_edges(&self) -> Vec<f64> {
        let w = self.bin_width();
        (0..=self.n_bins).map(|i| self.x_min + w * i as f64).collect()
    }

    /// In-range bin holding `x`, `None` for under/overflow and NaN.
    pub fn bin_index(&self, x: f64) -> Option<usize> {
        if x.is_nan() || x < self.x_min || x >= self.x_max {
            return None;
        }
        let i = ((x - self.x_min) / self.bin_width()) as usize;
        Some(i.min(self.n_bins - 1))
    }

    /// Add one entry. NaN values are ignored.
    pub fn fill(&mut self, x: f64) {
        if x.is_nan() {
            return;
        }
        match self.bin_index(x) {
            Some(i) => self.bin_content[i] += 1.0,
            None if x < self.x_min => self.underflow += 1.0,
            None => self.overflow += 1.0,
        }
        self.entries += 1;
        if x.is_finite() {
            self.sum += x;
            self.sum_sq += x * x;
        }
    }

    /// Sum of in-range bin contents.
    pub fn integral(&self) -> f64 {
        self.bin_content.iter().sum()
    }

    /// Mean of all filled values.
    pub fn mean(&self) -> f64 {
        if self.entries == 0 {
            return 0.0;
        }
        self.sum / self.entries as f64
    }

    /// Standard deviation of all filled values.
    pub fn std_dev(&self) -> f64 {
        if self.entries == 0 {
            return 0.0;
        }
        let n = self.entries as f64;
        let mean = self.sum / n;
        (self.sum_sq / n - mean * mean).max(0.0).sqrt()
    }

    /// Add the contents of `other`, which must have the same binning.
    pub fn merge(&mut self, other: &Histogram1D) -> Result<()> {
        if self.n_bins != other.n_bins || self.x_min != other.x_min || self.x_max != other.x_max {
            return Err(Error::Validation(format!(
                "cannot merge histogram '{}' into '{}': binning differs",
                other.name, self.name
            )));
        }
        for (a, b) in self.bin_content.iter_mut().zip(&other.bin_content) {
            *a += b;
        }
        self.underflow += other.underflow;
        self.overflow += other.overflow;
        self.entries += other.entries;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        Ok(())
    }
}
