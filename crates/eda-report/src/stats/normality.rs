//! Shapiro-Wilk normality test.
//!
//! Coefficients and p-values follow Royston's approximation (AS R94):
//! exact for n = 3, a log-gamma transform for 4..=11 and a log-normal
//! transform from 12 upwards.

use crate::utils::{format_float, sorted};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

const MIN_SAMPLE: usize = 3;

/// Outcome of testing one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalityOutcome {
    Tested { w: f64, p_value: f64 },
    /// Fewer than three values.
    InsufficientData,
    /// Every value is identical.
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalityStatus {
    Tested,
    InsufficientData,
    Constant,
}

impl NormalityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tested => "tested",
            Self::InsufficientData => "insufficient_data",
            Self::Constant => "constant",
        }
    }
}

/// One row of the normality results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityRecord {
    pub column: String,
    pub n: usize,
    pub w: Option<f64>,
    pub p_value: Option<f64>,
    pub looks_normal: Option<bool>,
    pub status: NormalityStatus,
}

impl NormalityRecord {
    /// Test a column's observed values at significance `alpha`.
    pub fn test(column: &str, values: &[f64], alpha: f64) -> Self {
        let (w, p_value, status) = match shapiro_wilk(values) {
            NormalityOutcome::Tested { w, p_value } => {
                (Some(w), Some(p_value), NormalityStatus::Tested)
            }
            NormalityOutcome::InsufficientData => (None, None, NormalityStatus::InsufficientData),
            NormalityOutcome::Constant => (None, None, NormalityStatus::Constant),
        };
        Self {
            column: column.to_string(),
            n: values.len(),
            w,
            p_value,
            looks_normal: p_value.map(|p| p > alpha),
            status,
        }
    }

    /// Short text for tables, e.g. `W=0.9512, p=0.3100`.
    pub fn describe(&self) -> String {
        match self.status {
            NormalityStatus::Tested => format!(
                "W={}, p={}",
                format_float(self.w),
                format_float(self.p_value)
            ),
            other => other.as_str().to_string(),
        }
    }
}

/// Run the Shapiro-Wilk test. Never fails; degenerate samples get a status.
pub fn shapiro_wilk(values: &[f64]) -> NormalityOutcome {
    let x = sorted(values);
    let n = x.len();
    if n < MIN_SAMPLE {
        return NormalityOutcome::InsufficientData;
    }
    if x[n - 1] - x[0] <= 0.0 {
        return NormalityOutcome::Constant;
    }
    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return NormalityOutcome::InsufficientData;
    };

    let a = coefficients(&normal, n);
    let mean = x.iter().sum::<f64>() / n as f64;
    let ssq: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let numerator: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * xi).sum();
    let w = ((numerator * numerator) / ssq).min(1.0);

    NormalityOutcome::Tested {
        w,
        p_value: p_value(&normal, w, n),
    }
}

fn poly(coefs: &[f64], u: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * u + c)
}

/// Antisymmetric weights for the ordered sample.
fn coefficients(normal: &Normal, n: usize) -> Vec<f64> {
    if n == 3 {
        let a = 0.5_f64.sqrt();
        return vec![-a, 0.0, a];
    }

    let m: Vec<f64> = (1..=n)
        .map(|i| normal.inverse_cdf((i as f64 - 0.375) / (n as f64 + 0.25)))
        .collect();
    let m_sq: f64 = m.iter().map(|v| v * v).sum();
    let norm = m_sq.sqrt();
    let u = 1.0 / (n as f64).sqrt();

    let a_n = m[n - 1] / norm
        + poly(&[0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056], u);
    let mut a = vec![0.0; n];

    if n > 5 {
        let a_n1 = m[n - 2] / norm
            + poly(&[0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633], u);
        let phi = (m_sq - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
            / (1.0 - 2.0 * a_n.powi(2) - 2.0 * a_n1.powi(2));
        for i in 2..n - 2 {
            a[i] = m[i] / phi.sqrt();
        }
        a[n - 2] = a_n1;
        a[1] = -a_n1;
    } else {
        let phi = (m_sq - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * a_n.powi(2));
        for i in 1..n - 1 {
            a[i] = m[i] / phi.sqrt();
        }
    }
    a[n - 1] = a_n;
    a[0] = -a_n;
    a
}

fn p_value(normal: &Normal, w: f64, n: usize) -> f64 {
    if w >= 1.0 {
        return 1.0;
    }
    let nf = n as f64;

    if n == 3 {
        let p = (6.0 / PI) * (w.sqrt().asin() - 0.75_f64.sqrt().asin());
        return p.clamp(0.0, 1.0);
    }

    let z = if n <= 11 {
        let gamma = -2.273 + 0.459 * nf;
        let mu = 0.5440 - 0.39978 * nf + 0.025054 * nf.powi(2) - 0.0006714 * nf.powi(3);
        let sigma = (1.3822 - 0.77857 * nf + 0.062767 * nf.powi(2) - 0.0020322 * nf.powi(3)).exp();
        let inner = gamma - (1.0 - w).ln();
        if inner <= 0.0 {
            return 0.0;
        }
        (-inner.ln() - mu) / sigma
    } else {
        let l = nf.ln();
        let mu = -1.5861 - 0.31082 * l - 0.083751 * l.powi(2) + 0.0038915 * l.powi(3);
        let sigma = (-0.4803 - 0.082676 * l + 0.0030302 * l.powi(2)).exp();
        ((1.0 - w).ln() - mu) / sigma
    };

    (1.0 - normal.cdf(z)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tested(values: &[f64]) -> (f64, f64) {
        match shapiro_wilk(values) {
            NormalityOutcome::Tested { w, p_value } => (w, p_value),
            other => panic!("expected a test result, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_samples() {
        assert_eq!(shapiro_wilk(&[]), NormalityOutcome::InsufficientData);
        assert_eq!(shapiro_wilk(&[1.0, 2.0]), NormalityOutcome::InsufficientData);
        assert_eq!(shapiro_wilk(&[4.0, 4.0, 4.0, 4.0]), NormalityOutcome::Constant);
    }

    #[test]
    fn test_three_values_exact() {
        // Equally spaced values give W = 1.
        let (w, p) = tested(&[1.0, 2.0, 3.0]);
        assert!((w - 1.0).abs() < 1e-9);
        assert!((p - 1.0).abs() < 1e-9);

        let (w, p) = tested(&[1.0, 2.0, 10.0]);
        assert!(w < 0.9);
        assert!(p < 0.5);
    }

    #[test]
    fn test_symmetric_sample_looks_normal() {
        let values: Vec<f64> = [
            -1.2, -0.8, -0.5, -0.3, -0.1, 0.0, 0.1, 0.3, 0.5, 0.8, 1.2, -1.6, 1.6, 0.05, -0.05,
            0.2, -0.2, 0.65, -0.65, 1.0,
        ]
        .to_vec();
        let (w, p) = tested(&values);
        assert!(w > 0.95, "w = {}", w);
        assert!(p > 0.05, "p = {}", p);
    }

    #[test]
    fn test_skewed_sample_rejected() {
        let values: Vec<f64> = (0..30).map(|i| (i as f64 / 3.0).exp()).collect();
        let (w, p) = tested(&values);
        assert!(w < 0.8, "w = {}", w);
        assert!(p < 0.01, "p = {}", p);
    }

    #[test]
    fn test_small_sample_branch() {
        let (w, p) = tested(&[2.1, 2.9, 3.2, 3.8, 4.4, 5.0, 5.3]);
        assert!(w > 0.9 && w <= 1.0);
        assert!(p > 0.05 && p <= 1.0);
    }

    #[test]
    fn test_record_statuses() {
        let record = NormalityRecord::test("x", &[1.0, 2.0], 0.05);
        assert_eq!(record.status, NormalityStatus::InsufficientData);
        assert_eq!(record.looks_normal, None);
        assert_eq!(record.describe(), "insufficient_data");

        let record = NormalityRecord::test("x", &[3.0, 3.0, 3.0], 0.05);
        assert_eq!(record.status, NormalityStatus::Constant);

        let record = NormalityRecord::test("x", &[1.0, 2.0, 3.0], 0.05);
        assert_eq!(record.looks_normal, Some(true));
        assert!(record.describe().starts_with("W="));
    }
}
