//! Fixed-shape history blocks
//!
//! Stacks oriented feature rows into the [n, F] matrix the sequence model
//! consumes. Row order is chronological, oldest first.

use crate::features::FeatureRow;
use serde::{Deserialize, Serialize};

/// A dense [rows, cols] f32 block in row-major order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTensor {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl HistoryTensor {
    /// Stack feature rows in the order given (callers pass oldest first)
    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * FeatureRow::DIM);
        for row in rows {
            data.extend(row.to_vec());
        }
        HistoryTensor {
            rows: rows.len(),
            cols: FeatureRow::DIM,
            data,
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// One row as a slice
    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Flat row-major data
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::played_match;

    #[test]
    fn test_shape_and_row_order() {
        let rows: Vec<FeatureRow> = (0..4)
            .map(|i| {
                let m = played_match(
                    "2016",
                    "Milan",
                    "Roma",
                    &format!("2024-01-{:02}", i + 1),
                    i,
                    0,
                );
                FeatureRow::from_match(&m, "Milan").unwrap()
            })
            .collect();

        let tensor = HistoryTensor::from_rows(&rows);
        assert_eq!(tensor.shape(), (4, FeatureRow::DIM));
        assert_eq!(tensor.data().len(), 4 * FeatureRow::DIM);
        // Oldest first: own_score in row i is the creation index
        for i in 0..4 {
            assert_eq!(tensor.row(i)[0], i as f32);
        }
    }

    #[test]
    fn test_empty_history() {
        let tensor = HistoryTensor::from_rows(&[]);
        assert_eq!(tensor.shape(), (0, FeatureRow::DIM));
        assert!(tensor.data().is_empty());
    }
}
