//! Pearson correlation over numeric columns.

use crate::error::Result;
use crate::types::Table;
use crate::utils::mean;
use serde::Serialize;

/// Square matrix of coefficients; `NaN` marks an undefined coefficient.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Pearson coefficients between every pair of numeric columns, each pair
    /// using only the rows where both values are present.
    pub fn from_table(table: &Table) -> Result<Self> {
        let columns = table.numeric_columns();
        let series: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|name| table.numeric_values(name))
            .collect::<Result<_>>()?;

        let size = columns.len();
        let mut values = vec![vec![f64::NAN; size]; size];
        for i in 0..size {
            for j in i..size {
                let (x, y): (Vec<f64>, Vec<f64>) = series[i]
                    .iter()
                    .zip(series[j].iter())
                    .filter_map(|(a, b)| match (a, b) {
                        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
                        _ => None,
                    })
                    .unzip();
                let r = pearson(&x, &y).unwrap_or(f64::NAN);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(Self { columns, values })
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    /// Off-diagonal pairs ordered by descending absolute coefficient;
    /// undefined coefficients are left out.
    pub fn strongest_pairs(&self) -> Vec<(String, String, f64)> {
        let mut pairs = Vec::new();
        for i in 0..self.columns.len() {
            for j in (i + 1)..self.columns.len() {
                let r = self.values[i][j];
                if r.is_finite() {
                    pairs.push((self.columns[i].clone(), self.columns[j].clone(), r));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
        pairs
    }
}

/// Sample Pearson coefficient; `None` with fewer than two pairs or when
/// either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}
