//! Progress reporting for the pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use eda_report::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(upload)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Parsing the upload into a table
    Loading,
    /// Filling missing values
    Imputation,
    /// Dropping repeated rows
    Deduplication,
    /// Clamping numeric values to their IQR fences
    OutlierClipping,
    /// Tagging text columns as categorical
    TypeCoercion,
    /// Writing statistics, plots and reports
    Reporting,
    /// Run finished
    Complete,
    /// Run failed with an error
    Failed,
}

impl PipelineStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Imputation => "Imputing Values",
            Self::Deduplication => "Removing Duplicates",
            Self::OutlierClipping => "Clipping Outliers",
            Self::TypeCoercion => "Coercing Types",
            Self::Reporting => "Generating Reports",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run taken by this stage. The working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Imputation => 0.15,
            Self::Deduplication => 0.10,
            Self::OutlierClipping => 0.15,
            Self::TypeCoercion => 0.05,
            Self::Reporting => 0.45,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Imputation => 0.10,
            Self::Deduplication => 0.25,
            Self::OutlierClipping => 0.35,
            Self::TypeCoercion => 0.50,
            Self::Reporting => 0.55,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,
    /// Overall progress (0.0 - 1.0)
    pub progress: f32,
    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress,
            message: message.into(),
        }
    }

    /// Entering a stage.
    pub fn started(stage: PipelineStage) -> Self {
        Self::new(stage, 0.0, stage.display_name())
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, 1.0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Failed, 0.0, message)
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

/// Receiver of progress updates.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Adapts a closure into a [`ProgressReporter`].
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressReporter;

impl ProgressReporter for NoopProgressReporter {
    fn report(&self, _update: ProgressUpdate) {}
}
