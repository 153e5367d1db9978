//! JSON manifest of a run.

use super::generator::StepFailure;
use crate::error::{EdaError, Result};
use crate::types::{Artifact, ArtifactKind, RunId};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub kind: ArtifactKind,
    /// Path relative to the run directory.
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub run_id: RunId,
    pub source: String,
    pub generated_at: String,
    pub artifacts: Vec<ManifestEntry>,
    pub actions: Vec<String>,
    pub failures: Vec<StepFailure>,
}

impl Manifest {
    pub fn new(
        run_id: &RunId,
        source: &str,
        run_dir: &Path,
        artifacts: &[Artifact],
        actions: &[String],
        failures: &[StepFailure],
    ) -> Self {
        Self {
            run_id: run_id.clone(),
            source: source.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            artifacts: artifacts
                .iter()
                .map(|a| ManifestEntry {
                    kind: a.kind,
                    path: a.relative_to(run_dir),
                    column: a.column.clone(),
                })
                .collect(),
            actions: actions.to_vec(),
            failures: failures.to_vec(),
        }
    }

    /// Write `manifest.json` into the run directory.
    pub fn write(&self, run_dir: &Path) -> Result<Artifact> {
        let path = run_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|e| {
            EdaError::ReportGenerationFailure(format!("writing {}: {}", path.display(), e))
        })?;
        Ok(Artifact::new(ArtifactKind::Manifest, path))
    }
}
