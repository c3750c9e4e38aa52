//! Writing the canonical text, report and chapter files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ReconcileError, Result};
use crate::pipeline::PipelineOutput;

pub const CANONICAL_FILE: &str = "canonical.txt";
pub const REPORT_FILE: &str = "report.json";
pub const CHAPTERS_DIR: &str = "chapters";

/// Write everything under `dir`, creating directories as needed.
/// Returns the paths written.
pub fn write_outputs(output: &PipelineOutput, dir: &Path, write_chapters: bool) -> Result<Vec<PathBuf>> {
    create_dir(dir)?;
    let mut written = Vec::new();

    let canonical = dir.join(CANONICAL_FILE);
    write_file(&canonical, output.canonical.content())?;
    written.push(canonical);

    let report = dir.join(REPORT_FILE);
    write_file(&report, &output.report.to_json()?)?;
    written.push(report);

    if write_chapters {
        let chapters_dir = dir.join(CHAPTERS_DIR);
        create_dir(&chapters_dir)?;
        for (name, contents) in output.chapter_files() {
            let path = chapters_dir.join(name);
            write_file(&path, &contents)?;
            written.push(path);
        }
    }

    info!(dir = %dir.display(), files = written.len(), "wrote outputs");
    Ok(written)
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| ReconcileError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| ReconcileError::Io {
        path: path.to_path_buf(),
        source,
    })
}
