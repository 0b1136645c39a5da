//! Batch runner (§5 Concurrency & Resource Model, "batch runner").
//!
//! Drives one [`schema_graph_core::Pipeline`] per database file over a
//! bounded thread pool, writing each artifact atomically next to the
//! others. Each pipeline run owns exactly one `rusqlite::Connection`;
//! parallelism is across files, never within one file's pipeline.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::{info, warn};

use schema_graph_core::{serializer, Pipeline, PipelineConfig, PipelineError, RunSummary};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to build thread pool with {workers} workers: {source}")]
    ThreadPool {
        workers: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("failed to read database directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of processing a single database file.
#[derive(Debug)]
pub struct FileOutcome {
    pub database_path: PathBuf,
    pub outcome: Result<RunSummary, PipelineError>,
}

/// Aggregate result of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub files: Vec<FileOutcome>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_err()).count()
    }
}

/// Runs the pipeline over every recognized database file in a directory on
/// a bounded worker pool.
pub struct WorkerPool {
    workers: usize,
    config: PipelineConfig,
}

impl WorkerPool {
    /// A pool sized to the number of available CPUs.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            workers: num_cpus::get(),
            config,
        }
    }

    /// A pool with an explicit worker count (0 resolves to `num_cpus::get()`).
    pub fn with_workers(config: PipelineConfig, workers: usize) -> Self {
        Self {
            workers: if workers == 0 { num_cpus::get() } else { workers },
            config,
        }
    }

    /// Discover every `*.sqlite`/`*.db` file directly under `databases_dir`,
    /// run the pipeline against each, and write artifacts under
    /// `output_dir/<stem>.json`.
    pub fn run_directory(
        &self,
        databases_dir: &Path,
        output_dir: &Path,
    ) -> Result<BatchSummary, BatchError> {
        let databases = discover_database_files(databases_dir)?;
        info!(count = databases.len(), workers = self.workers, "starting batch run");

        if !output_dir.is_dir() {
            std::fs::create_dir_all(output_dir).map_err(|source| BatchError::CreateOutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|source| BatchError::ThreadPool {
                workers: self.workers,
                source,
            })?;

        let config = self.config;
        let files = pool.install(|| {
            databases
                .par_iter()
                .map(|database_path| process_one(database_path, databases_dir, output_dir, config))
                .collect::<Vec<_>>()
        });

        Ok(BatchSummary { files })
    }
}

fn process_one(
    database_path: &Path,
    dataset_root: &Path,
    output_dir: &Path,
    config: PipelineConfig,
) -> FileOutcome {
    let pipeline = Pipeline::new(dataset_root, config);
    let outcome = pipeline.run(database_path).and_then(|(graph, summary)| {
        let stem = database_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        let output_path = output_dir.join(format!("{stem}.json"));
        serializer::write_atomic(&graph, &output_path)?;
        Ok(summary)
    });

    if let Err(ref err) = outcome {
        warn!(database = %database_path.display(), %err, "pipeline run failed");
    }

    FileOutcome {
        database_path: database_path.to_path_buf(),
        outcome,
    }
}

fn discover_database_files(dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let entries = std::fs::read_dir(dir).map_err(|source| BatchError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("sqlite") | Some("db")
                )
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn write_fixture(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO t VALUES (1, 'a'), (2, 'b');",
        )
        .unwrap();
    }

    #[test]
    fn processes_every_recognized_file_and_writes_artifacts() {
        let databases = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        write_fixture(&databases.path().join("one.sqlite"));
        write_fixture(&databases.path().join("two.db"));
        std::fs::write(databases.path().join("ignore.txt"), b"not a database").unwrap();

        let pool = WorkerPool::with_workers(PipelineConfig::default(), 2);
        let summary = pool.run_directory(databases.path(), output.path()).unwrap();

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 0);
        assert!(output.path().join("one.json").is_file());
        assert!(output.path().join("two.json").is_file());
    }

    #[test]
    fn missing_directory_reports_read_dir_error() {
        let output = TempDir::new().unwrap();
        let pool = WorkerPool::with_workers(PipelineConfig::default(), 1);
        let err = pool
            .run_directory(Path::new("/nonexistent/batch/dir"), output.path())
            .unwrap_err();
        assert!(matches!(err, BatchError::ReadDir { .. }));
    }

    #[test]
    fn worker_count_zero_resolves_to_available_cpus() {
        let pool = WorkerPool::with_workers(PipelineConfig::default(), 0);
        assert!(pool.workers > 0);
    }
}
