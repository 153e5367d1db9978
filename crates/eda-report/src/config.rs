//! Configuration types for the cleaning and report pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::reporting::ReportEngineKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the output root folder.
pub const OUTPUT_DIR_ENV: &str = "EDA_OUTPUT_DIR";

/// Environment variable naming the upload staging folder.
pub const UPLOAD_DIR_ENV: &str = "EDA_UPLOAD_DIR";

const DEFAULT_OUTPUT_ROOT: &str = "data/output";
const DEFAULT_UPLOAD_DIR: &str = "data/uploads";

/// Configuration for the pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use eda_report::config::PipelineConfig;
/// use eda_report::ReportEngineKind;
///
/// let config = PipelineConfig::builder()
///     .output_root("reports")
///     .report_engine(ReportEngineKind::Comparison)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root folder under which each run gets its own directory.
    /// Default: "data/output"
    pub output_root: PathBuf,

    /// Folder where uploads are staged under a sanitized name.
    /// Default: "data/uploads"
    pub upload_dir: PathBuf,

    /// Automated report engine to run after the fixed report steps.
    /// Default: Profiling
    pub report_engine: ReportEngineKind,

    /// Multiplier applied to the IQR when computing clip bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Significance level for the normality test; `p > alpha` looks normal.
    /// Default: 0.05
    pub normality_alpha: f64,

    /// Whether to write the cleaner's before/after boxplots.
    /// Default: true
    pub emit_diagnostics: bool,

    /// Abort the report on the first failing step.
    /// When false, successful artifacts are returned alongside step failures.
    /// Default: true
    pub fail_fast: bool,

    /// Whether to write a JSON manifest of the produced artifacts.
    /// Default: false
    pub emit_manifest: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            report_engine: ReportEngineKind::default(),
            iqr_multiplier: 1.5,
            normality_alpha: 0.05,
            emit_diagnostics: true,
            fail_fast: true,
            emit_manifest: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Create a builder seeded with folder configuration from the environment.
    ///
    /// Reads [`OUTPUT_DIR_ENV`] and [`UPLOAD_DIR_ENV`]; unset variables keep
    /// the defaults. Call `dotenv().ok()` first to pick up a `.env` file.
    pub fn from_env() -> PipelineConfigBuilder {
        let mut builder = PipelineConfigBuilder::default();
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV)
            && !dir.trim().is_empty()
        {
            builder = builder.output_root(dir);
        }
        if let Ok(dir) = std::env::var(UPLOAD_DIR_ENV)
            && !dir.trim().is_empty()
        {
            builder = builder.upload_dir(dir);
        }
        builder
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier <= 0.0 {
            return Err(ConfigValidationError::InvalidIqrMultiplier(
                self.iqr_multiplier,
            ));
        }

        if !(self.normality_alpha > 0.0 && self.normality_alpha < 1.0) {
            return Err(ConfigValidationError::InvalidAlpha(self.normality_alpha));
        }

        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("output_root".to_string()));
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyPath("upload_dir".to_string()));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid IQR multiplier: {0} (must be a positive number)")]
    InvalidIqrMultiplier(f64),

    #[error("Invalid normality alpha: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidAlpha(f64),

    #[error("Path '{0}' must not be empty")]
    EmptyPath(String),
}

impl From<ConfigValidationError> for crate::error::EdaError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::EdaError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    output_root: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
    report_engine: Option<ReportEngineKind>,
    iqr_multiplier: Option<f64>,
    normality_alpha: Option<f64>,
    emit_diagnostics: Option<bool>,
    fail_fast: Option<bool>,
    emit_manifest: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the root folder for run directories.
    pub fn output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_root = Some(path.into());
        self
    }

    /// Set the folder uploads are staged into.
    pub fn upload_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(path.into());
        self
    }

    /// Select the automated report engine.
    pub fn report_engine(mut self, engine: ReportEngineKind) -> Self {
        self.report_engine = Some(engine);
        self
    }

    /// Set the IQR multiplier used for clip bounds.
    ///
    /// # Arguments
    /// * `k` - Positive multiplier (1.5 gives the classic Tukey fences)
    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    /// Set the normality test significance level.
    pub fn normality_alpha(mut self, alpha: f64) -> Self {
        self.normality_alpha = Some(alpha);
        self
    }

    /// Enable or disable the cleaner's diagnostic boxplots.
    pub fn emit_diagnostics(mut self, emit: bool) -> Self {
        self.emit_diagnostics = Some(emit);
        self
    }

    /// Abort on the first failing report step, or keep going.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = Some(fail_fast);
        self
    }

    /// Enable or disable the JSON artifact manifest.
    pub fn emit_manifest(mut self, emit: bool) -> Self {
        self.emit_manifest = Some(emit);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            output_root: self
                .output_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
            upload_dir: self
                .upload_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            report_engine: self.report_engine.unwrap_or_default(),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(1.5),
            normality_alpha: self.normality_alpha.unwrap_or(0.05),
            emit_diagnostics: self.emit_diagnostics.unwrap_or(true),
            fail_fast: self.fail_fast.unwrap_or(true),
            emit_manifest: self.emit_manifest.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.output_root, PathBuf::from("data/output"));
        assert_eq!(config.upload_dir, PathBuf::from("data/uploads"));
        assert_eq!(config.report_engine, ReportEngineKind::Profiling);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.normality_alpha, 0.05);
        assert!(config.emit_diagnostics);
        assert!(config.fail_fast);
        assert!(!config.emit_manifest);
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .output_root("reports")
            .report_engine(ReportEngineKind::None)
            .iqr_multiplier(3.0)
            .normality_alpha(0.01)
            .fail_fast(false)
            .build()
            .unwrap();

        assert_eq!(config.output_root, PathBuf::from("reports"));
        assert_eq!(config.report_engine, ReportEngineKind::None);
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.normality_alpha, 0.01);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_validation_invalid_iqr_multiplier() {
        let result = PipelineConfig::builder().iqr_multiplier(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidIqrMultiplier(_)
        ));

        let result = PipelineConfig::builder().iqr_multiplier(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_invalid_alpha() {
        for alpha in [0.0, 1.0, -0.2, 1.5] {
            let result = PipelineConfig::builder().normality_alpha(alpha).build();
            assert!(
                matches!(result, Err(ConfigValidationError::InvalidAlpha(_))),
                "alpha {} should be rejected",
                alpha
            );
        }
    }

    #[test]
    fn test_validation_empty_output_root() {
        let result = PipelineConfig::builder().output_root("").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyPath(_)
        ));
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "output_root": "custom_output",
            "upload_dir": "custom_uploads",
            "report_engine": "Comparison",
            "iqr_multiplier": 2.0,
            "normality_alpha": 0.1,
            "emit_diagnostics": false,
            "fail_fast": false,
            "emit_manifest": true
        }"#;

        let config: PipelineConfig =
            serde_json::from_str(json).expect("Should deserialize from JSON");

        assert_eq!(config.output_root, PathBuf::from("custom_output"));
        assert_eq!(config.report_engine, ReportEngineKind::Comparison);
        assert_eq!(config.iqr_multiplier, 2.0);
        assert!(!config.emit_diagnostics);
        assert!(config.emit_manifest);
        assert!(config.validate().is_ok());
    }
}
