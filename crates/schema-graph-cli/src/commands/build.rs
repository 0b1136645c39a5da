//! `schema-graph build` - run the pipeline against one SQLite database.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use schema_graph_core::{serializer, Pipeline};
use tracing::info;

use crate::commands::{load_config, print_info};
use crate::progress;
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Path to the SQLite database file.
    #[arg(long)]
    pub db: PathBuf,

    /// Directory containing an optional `database_description/` folder
    /// with per-table metadata CSVs. Defaults to the database's parent.
    #[arg(long)]
    pub metadata_dir: Option<PathBuf>,

    /// Path to write the JSON artifact. Defaults to `<db stem>.json`.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: BuildArgs, global: &GlobalOptions) -> Result<()> {
    let dataset_root = args
        .metadata_dir
        .clone()
        .or_else(|| args.db.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    let app_config = load_config(global.config.as_deref(), &dataset_root)?;
    let pipeline_config = app_config.profiling.to_pipeline_config();

    let spinner = progress::spinner(
        &format!("profiling {}", args.db.display()),
        global.quiet,
    );

    let pipeline = Pipeline::new(&dataset_root, pipeline_config);
    let (graph, summary) = pipeline
        .run(&args.db)
        .with_context(|| format!("pipeline run failed for {}", args.db.display()))?;

    let output_path = args.output.clone().unwrap_or_else(|| {
        let stem = args
            .db
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        PathBuf::from(format!("{stem}.json"))
    });

    serializer::write_atomic(&graph, &output_path)
        .with_context(|| format!("failed to write artifact to {}", output_path.display()))?;

    progress::finish_spinner(spinner, &format!("wrote {}", output_path.display()));

    info!(
        tables = summary.tables_processed,
        columns = summary.columns_processed,
        foreign_keys = summary.foreign_keys_resolved,
        warnings = summary.warnings.len(),
        "build complete"
    );
    print_info(
        &format!(
            "{} tables, {} columns, {} foreign keys, {} warnings",
            summary.tables_processed,
            summary.columns_processed,
            summary.foreign_keys_resolved,
            summary.warnings.len(),
        ),
        global.quiet,
    );
    for warning in &summary.warnings {
        print_info(&format!("warning: {warning}"), global.quiet);
    }

    Ok(())
}
