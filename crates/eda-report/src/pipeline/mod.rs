//! Pipeline orchestration and progress reporting.

mod builder;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, PipelineResult};
pub use progress::{
    ClosureProgressReporter, NoopProgressReporter, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
