//! Result sinks and per-run persistence.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use revcrawl_core::{CrawlSummary, OrganizedResult, OutputFormat};
use serde::Serialize;

use crate::error::OutputError;
use crate::naming::output_path;
use crate::table::write_rows;

/// Top-level shape of the JSON artifact.
#[derive(Debug, Serialize)]
pub struct ResultDocument<'a> {
    pub products: &'a OrganizedResult,
    pub summary: &'a CrawlSummary,
}

impl<'a> ResultDocument<'a> {
    #[must_use]
    pub fn new(result: &'a OrganizedResult) -> Self {
        Self {
            products: result,
            summary: result.summary(),
        }
    }
}

/// Destination for the two per-run artifacts.
pub trait ResultSink {
    /// # Errors
    ///
    /// Returns [`OutputError`] if the document cannot be encoded or written.
    fn write_json(&self, result: &OrganizedResult, path: &Path) -> Result<(), OutputError>;

    /// # Errors
    ///
    /// Returns [`OutputError`] if the table cannot be encoded or written.
    fn write_table(&self, result: &OrganizedResult, path: &Path) -> Result<(), OutputError>;
}

/// Writes artifacts to the local filesystem, creating parent directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSink;

impl FileSink {
    fn create(path: &Path) -> Result<BufWriter<File>, OutputError> {
        let io_err = |source| OutputError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        File::create(path).map(BufWriter::new).map_err(io_err)
    }
}

impl ResultSink for FileSink {
    fn write_json(&self, result: &OrganizedResult, path: &Path) -> Result<(), OutputError> {
        let mut writer = Self::create(path)?;
        serde_json::to_writer_pretty(&mut writer, &ResultDocument::new(result)).map_err(
            |source| OutputError::Json {
                path: path.to_path_buf(),
                source,
            },
        )?;
        writer.flush().map_err(|source| OutputError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn write_table(&self, result: &OrganizedResult, path: &Path) -> Result<(), OutputError> {
        let writer = Self::create(path)?;
        write_rows(writer, result).map_err(|source| OutputError::Csv {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Paths written by [`save_results`] and the failures it recovered from.
#[derive(Debug, Default)]
pub struct SavedFiles {
    pub json: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub failures: Vec<OutputError>,
}

impl SavedFiles {
    #[must_use]
    pub fn written(&self) -> Vec<&Path> {
        self.json
            .iter()
            .chain(self.csv.iter())
            .map(PathBuf::as_path)
            .collect()
    }
}

/// Write the formats selected by `format` into `dir`.
///
/// Each format is attempted independently; a failure is logged, kept in
/// [`SavedFiles::failures`], and does not stop the other format.
pub fn save_results<S: ResultSink>(
    sink: &S,
    result: &OrganizedResult,
    keyword: &str,
    format: OutputFormat,
    dir: &Path,
    run_at: DateTime<Utc>,
) -> SavedFiles {
    let mut saved = SavedFiles::default();

    if format.writes_json() {
        let path = output_path(dir, keyword, run_at, "json");
        match sink.write_json(result, &path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "json results saved");
                saved.json = Some(path);
            }
            Err(e) => {
                tracing::warn!(error = %e, "json results not saved");
                saved.failures.push(e);
            }
        }
    }

    if format.writes_csv() {
        let path = output_path(dir, keyword, run_at, "csv");
        match sink.write_table(result, &path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "csv results saved");
                saved.csv = Some(path);
            }
            Err(e) => {
                tracing::warn!(error = %e, "csv results not saved");
                saved.failures.push(e);
            }
        }
    }

    saved
}
