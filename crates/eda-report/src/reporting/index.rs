//! Results page listing a run's artifacts.

use super::generator::StepFailure;
use super::html;
use crate::error::{EdaError, Result};
use crate::types::{Artifact, ArtifactKind};
use std::fs;
use std::path::Path;

pub const INDEX_FILE: &str = "index.html";

/// Render the listing. Paths are made relative to `run_dir` so the page can
/// be opened straight from disk; images are shown inline, everything else
/// is linked.
pub fn render_index(
    title: &str,
    run_dir: &Path,
    artifacts: &[Artifact],
    actions: &[String],
    failures: &[StepFailure],
) -> String {
    let mut body = String::new();

    if !actions.is_empty() {
        body.push_str(&html::section("Cleaning"));
        body.push_str("<ul>\n");
        for action in actions {
            body.push_str(&format!("<li>{}</li>\n", html::escape(action)));
        }
        body.push_str("</ul>\n");
    }

    if !failures.is_empty() {
        body.push_str(&html::section("Failed steps"));
        body.push_str("<ul class=\"warn\">\n");
        for failure in failures {
            body.push_str(&format!(
                "<li>{}: {}</li>\n",
                html::escape(&failure.step),
                html::escape(&failure.message)
            ));
        }
        body.push_str("</ul>\n");
    }

    let (images, documents): (Vec<&Artifact>, Vec<&Artifact>) =
        artifacts.iter().partition(|a| a.kind.is_image());

    body.push_str(&html::section("Files"));
    if documents.is_empty() {
        body.push_str(&html::paragraph("No files were produced."));
    } else {
        body.push_str("<ul>\n");
        for artifact in documents {
            let href = artifact.relative_to(run_dir).to_string_lossy().replace('\\', "/");
            body.push_str(&format!(
                "<li><a href=\"{}\">{}</a> <span class=\"muted\">{}</span></li>\n",
                html::escape(&href),
                html::escape(&artifact.file_name()),
                artifact.kind.display_name()
            ));
        }
        body.push_str("</ul>\n");
    }

    if !images.is_empty() {
        body.push_str(&html::section("Plots"));
        for artifact in images {
            let href = artifact.relative_to(run_dir).to_string_lossy().replace('\\', "/");
            let caption = match &artifact.column {
                Some(column) => format!("{}: {}", artifact.kind.display_name(), column),
                None => artifact.kind.display_name().to_string(),
            };
            body.push_str(&format!(
                concat!(
                    "<div class=\"figure\"><img src=\"{src}\" alt=\"{alt}\"><br>",
                    "<span class=\"muted\">{alt}</span></div>\n"
                ),
                src = html::escape(&href),
                alt = html::escape(&caption),
            ));
        }
    }

    html::page(title, &body)
}

/// Write `index.html` into the run directory.
pub fn write_index(
    title: &str,
    run_dir: &Path,
    artifacts: &[Artifact],
    actions: &[String],
    failures: &[StepFailure],
) -> Result<Artifact> {
    let path = run_dir.join(INDEX_FILE);
    let page = render_index(title, run_dir, artifacts, actions, failures);
    fs::write(&path, page).map_err(|e| {
        EdaError::ReportGenerationFailure(format!("writing {}: {}", path.display(), e))
    })?;
    Ok(Artifact::new(ArtifactKind::Index, path))
}
