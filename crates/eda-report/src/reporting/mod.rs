//! Report generation.
//!
//! [`ReportGenerator`] writes the fixed artifact sequence for a cleaned
//! table: summary statistics, histograms, the correlation heatmap, normality
//! results, count plots and finally the selected engine's HTML report.
//!
//! # Example
//!
//! ```rust,ignore
//! use eda_report::reporting::ReportGenerator;
//!
//! let outcome = ReportGenerator::new(&config).generate(&table, &run_dir)?;
//! for artifact in &outcome.artifacts {
//!     println!("{}", artifact.path.display());
//! }
//! ```

mod engines;
mod generator;
pub mod html;
pub mod index;
mod manifest;

pub use engines::{
    ComparisonEngine, EngineOptions, ProfilingEngine, ReportEngine, ReportEngineKind,
};
pub use generator::{
    NORMALITY_FILE, ReportGenerator, ReportOutcome, SUMMARY_FILE, StepFailure, normality_frame,
};
pub use index::{INDEX_FILE, render_index, write_index};
pub use manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
