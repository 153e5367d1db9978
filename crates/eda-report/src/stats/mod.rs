//! Statistics shared by the report steps and the report engines.
//!
//! - [`descriptive`]: per-column summary rows
//! - [`correlation`]: pairwise-complete Pearson matrix
//! - [`normality`]: Shapiro-Wilk test

pub mod correlation;
pub mod descriptive;
pub mod normality;

pub use correlation::{CorrelationMatrix, pearson};
pub use descriptive::{ColumnSummary, summarize, summary_frame};
pub use normality::{NormalityOutcome, NormalityRecord, NormalityStatus, shapiro_wilk};
