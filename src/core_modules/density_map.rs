// THEORY:
// The `DensityMap` is the raw material of the whole engine: a 2-D grid of non-negative
// values produced by an upstream crowd-counting model. Each cell approximates the
// expected number of people at that location, so the sum of the grid is the crowd count.
//
// Key architectural principles:
// 1.  **Validated at the Border**: A `DensityMap` can only be built through checked
//     constructors. Ragged, empty, non-finite or negative grids are refused with an
//     `AnalysisError`, so every stage downstream can assume a well-formed rectangle.
// 2.  **Dumb Data Container**: Like a pixel chunk, it stores a flat row-major buffer and
//     knows how to summarize itself (sum, max, mean, std). It does not analyze.
// 3.  **Scale-Free View**: `normalize` produces a `NormalizedMap` whose peak is 1.0 (or an
//     all-zero map). Every analytic stage except the final count works on this view,
//     which keeps their thresholds independent of the model's output scale.

use crate::error::{AnalysisError, Result};
use std::ops::Deref;

/// A row-major 2-D grid of non-negative densities.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMap {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl DensityMap {
    /// Builds a map from a flat row-major buffer, validating shape and values.
    pub fn new(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::Empty { width, height });
        }
        let cells = width.checked_mul(height);
        if cells != Some(data.len()) {
            return Err(AnalysisError::DimensionMismatch {
                width,
                height,
                len: data.len(),
            });
        }
        for (i, &value) in data.iter().enumerate() {
            let (x, y) = (i % width, i / width);
            if !value.is_finite() {
                return Err(AnalysisError::NonFinite { x, y });
            }
            if value < 0.0 {
                return Err(AnalysisError::Negative { x, y, value });
            }
        }
        // count must stay representable on the wire
        if !data.iter().sum::<f64>().is_finite() {
            return Err(AnalysisError::SumOverflow);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a map from a list of rows (row index is `y`, column index is `x`).
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || height == 0 {
            return Err(AnalysisError::Empty { width, height });
        }

        let mut data = Vec::with_capacity(rows.iter().map(Vec::len).sum());
        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(AnalysisError::NotRectangular {
                    row: row_index,
                    expected: width,
                    found: row.len(),
                });
            }
            data.extend(row);
        }
        Self::new(width, height, data)
    }

    pub fn zeros(width: usize, height: usize) -> Result<Self> {
        Self::filled(width, height, 0.0)
    }

    pub fn filled(width: usize, height: usize, value: f64) -> Result<Self> {
        let cells = width
            .checked_mul(height)
            .ok_or(AnalysisError::DimensionMismatch {
                width,
                height,
                len: 0,
            })?;
        Self::new(width, height, vec![value; cells])
    }

    /// Wraps a buffer that is known to be well-formed (smoothing output, normalized data).
    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Iterates `(x, y, value)` over every cell in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % width, i / width, v))
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.data.len() as f64
    }

    /// Population standard deviation over all cells.
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let variance =
            self.data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / self.data.len() as f64;
        variance.sqrt()
    }
}

/// A `DensityMap` rescaled so that its peak is 1.0, or all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMap(DensityMap);

impl NormalizedMap {
    pub fn into_inner(self) -> DensityMap {
        self.0
    }
}

impl Deref for NormalizedMap {
    type Target = DensityMap;

    fn deref(&self) -> &DensityMap {
        &self.0
    }
}

/// Scales `map` into [0, 1]. An all-zero map is returned unchanged.
pub fn normalize(map: &DensityMap) -> NormalizedMap {
    let peak = map.max();
    if peak <= 0.0 {
        return NormalizedMap(map.clone());
    }
    let data = map.data.iter().map(|v| v / peak).collect();
    NormalizedMap(DensityMap::from_raw(map.width, map.height, data))
}
