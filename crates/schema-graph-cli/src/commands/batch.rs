//! `schema-graph batch` - run the pipeline over a directory of databases.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use schema_graph_batch::WorkerPool;
use tracing::info;

use crate::commands::{load_config, print_info};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory containing `*.sqlite`/`*.db` files to process.
    #[arg(long = "dir")]
    pub databases_dir: PathBuf,

    /// Directory to write one JSON artifact per database into.
    #[arg(long)]
    pub output_dir: PathBuf,

    /// Number of worker threads (0 = number of available CPUs).
    #[arg(long, default_value_t = 0)]
    pub workers: usize,
}

pub fn execute(args: BatchArgs, global: &GlobalOptions) -> Result<()> {
    let app_config = load_config(global.config.as_deref(), &args.databases_dir)?;
    let pipeline_config = app_config.profiling.to_pipeline_config();

    let pool = WorkerPool::with_workers(pipeline_config, args.workers);
    let summary = pool
        .run_directory(&args.databases_dir, &args.output_dir)
        .with_context(|| format!("batch run over {} failed", args.databases_dir.display()))?;

    for file in &summary.files {
        match &file.outcome {
            Ok(run_summary) => info!(
                database = %file.database_path.display(),
                tables = run_summary.tables_processed,
                columns = run_summary.columns_processed,
                "file complete"
            ),
            Err(err) => print_info(
                &format!("failed: {}: {err}", file.database_path.display()),
                global.quiet,
            ),
        }
    }

    print_info(
        &format!(
            "{} succeeded, {} failed out of {} files",
            summary.succeeded(),
            summary.failed(),
            summary.files.len()
        ),
        global.quiet,
    );

    if summary.failed() > 0 {
        bail!("{} of {} database(s) failed", summary.failed(), summary.files.len());
    }
    Ok(())
}
