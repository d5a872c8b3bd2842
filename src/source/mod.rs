//! Filing record source.
//!
//! Loads filing records from `.json` exports (an array of row objects)
//! and `.csv` files with a header row. A directory input is walked
//! recursively; files are read in path order so every run sees the
//! records in the same sequence.

mod error;

pub use error::SourceError;

use crate::analysis::normalize::is_blank;
use crate::models::FilingRecord;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Supported record file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Csv,
}

impl RecordFormat {
    /// Format implied by the file extension, if supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(RecordFormat::Json),
            "csv" => Some(RecordFormat::Csv),
            _ => None,
        }
    }
}

/// Record source rooted at a file or directory.
pub struct RecordSource {
    root: PathBuf,
    show_progress: bool,
}

impl RecordSource {
    /// Create a new record source.
    pub fn new(root: PathBuf, show_progress: bool) -> Self {
        Self {
            root,
            show_progress,
        }
    }

    /// List the record files to load, sorted by path.
    pub fn discover(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.root.exists() {
            return Err(SourceError::NotFound(self.root.clone()));
        }

        if self.root.is_file() {
            if RecordFormat::from_path(&self.root).is_none() {
                return Err(SourceError::UnsupportedFormat(self.root.clone()));
            }
            return Ok(vec![self.root.clone()]);
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry.map_err(|source| SourceError::Walk {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            if RecordFormat::from_path(path).is_some() {
                files.push(path.to_path_buf());
            } else {
                debug!("Skipping non-record file {}", path.display());
            }
        }

        if files.is_empty() {
            return Err(SourceError::NoInputFiles(self.root.clone()));
        }

        files.sort();
        Ok(files)
    }

    /// Load every record from every discovered file.
    pub fn load(&self) -> Result<Vec<FilingRecord>, SourceError> {
        let files = self.discover()?;

        let spinner = if self.show_progress {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut records = Vec::new();
        for path in &files {
            spinner.set_message(format!("Reading {}", path.display()));
            let batch = read_file(path)?;
            debug!("Read {} records from {}", batch.len(), path.display());
            records.extend(batch);
        }

        spinner.finish_and_clear();
        info!(
            "Loaded {} records from {} file(s)",
            records.len(),
            files.len()
        );

        Ok(records)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Read all records from a single file.
pub fn read_file(path: &Path) -> Result<Vec<FilingRecord>, SourceError> {
    match RecordFormat::from_path(path) {
        Some(RecordFormat::Json) => read_json(path),
        Some(RecordFormat::Csv) => read_csv(path),
        None => Err(SourceError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn read_json(path: &Path) -> Result<Vec<FilingRecord>, SourceError> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // An empty export means an empty result set.
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_csv(path: &Path) -> Result<Vec<FilingRecord>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .deserialize()
        .collect::<Result<Vec<FilingRecord>, _>>()
        .map_err(|source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Counts of records removed before aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub missing_entity_name: usize,
    pub missing_agent_group: usize,
}

impl SanitizeStats {
    pub fn dropped(&self) -> usize {
        self.missing_entity_name + self.missing_agent_group
    }
}

/// Drop records that cannot be attributed: a missing or blank entity
/// name, or a missing or blank agent group.
pub fn sanitize(records: Vec<FilingRecord>) -> (Vec<FilingRecord>, SanitizeStats) {
    let mut stats = SanitizeStats::default();

    let kept: Vec<FilingRecord> = records
        .into_iter()
        .filter(|record| {
            if is_blank(record.entity_name.as_deref()) {
                stats.missing_entity_name += 1;
                false
            } else if is_blank(record.agent_group.as_deref()) {
                stats.missing_agent_group += 1;
                false
            } else {
                true
            }
        })
        .collect();

    if stats.dropped() > 0 {
        warn!(
            "Dropped {} unattributable records ({} without entity name, {} without agent group)",
            stats.dropped(),
            stats.missing_entity_name,
            stats.missing_agent_group
        );
    }

    (kept, stats)
}
