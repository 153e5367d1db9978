//! Cleaning and exploratory report pipeline for uploaded tables.
//!
//! # Overview
//!
//! A run takes one uploaded `.csv` or `.xlsx` file through a fixed, linear
//! sequence:
//!
//! - **Loading**: parse the bytes into a [`Table`], tagging each column as
//!   numeric or text
//! - **Cleaning**: mean/mode imputation, duplicate removal, IQR outlier
//!   clipping and categorical coercion
//! - **Reporting**: summary statistics, histograms, a correlation heatmap,
//!   Shapiro-Wilk normality tests, count plots and an HTML report
//! - **Listing**: an `index.html` page (and optionally `manifest.json`)
//!   pointing at everything the run produced
//!
//! Each run writes into its own directory under the configured output root.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use eda_report::{Pipeline, PipelineConfig, ReportEngineKind, Upload};
//!
//! let config = PipelineConfig::builder()
//!     .output_root("reports")
//!     .report_engine(ReportEngineKind::Comparison)
//!     .iqr_multiplier(3.0)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| println!("[{:?}] {}", update.stage, update.message))
//!     .build()?
//!     .process(Upload::new("people.csv", bytes))?;
//!
//! for artifact in &result.artifacts {
//!     println!("{:?} -> {}", artifact.kind, artifact.path.display());
//! }
//! ```
//!
//! The stages can also be used on their own:
//!
//! ```rust,ignore
//! use eda_report::{DataCleaner, ReportGenerator, TableLoader};
//!
//! let table = TableLoader::load_path("people.csv")?;
//! let cleaned = DataCleaner::default().clean(table)?;
//! let report = ReportGenerator::default().generate(&cleaned.table, "out".as_ref())?;
//! ```

pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod stats;
pub mod types;
pub mod utils;

pub use cleaner::{ClipBounds, CleaningOutcome, DataCleaner, OutlierClipper, StatisticalImputer};
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder};
pub use error::{EdaError, Result, ResultExt};
pub use loader::{SourceFormat, TableLoader, Upload, sanitize_filename, stage_upload};
pub use pipeline::{
    ClosureProgressReporter, NoopProgressReporter, Pipeline, PipelineBuilder, PipelineResult,
    PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use reporting::{
    ReportEngine, ReportEngineKind, ReportGenerator, ReportOutcome, StepFailure, render_index,
};
pub use types::{Artifact, ArtifactKind, ColumnKind, ColumnSpec, RunId, Table};
