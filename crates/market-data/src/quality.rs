use serde::{Deserialize, Serialize};

/// How much of a bar file survived parsing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub defective_rows: usize,
    /// Later rows that replaced an earlier row with the same date.
    pub duplicate_rows: usize,
    /// 100 minus the defective share of all rows, in percent.
    pub score: f64,
}

impl DataQuality {
    pub fn new(total_rows: usize, defective_rows: usize, duplicate_rows: usize) -> Self {
        let score = if total_rows == 0 {
            100.0
        } else {
            100.0 - defective_rows as f64 / total_rows as f64 * 100.0
        };
        Self {
            total_rows,
            valid_rows: total_rows.saturating_sub(defective_rows),
            defective_rows,
            duplicate_rows,
            score,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.defective_rows == 0
    }
}
