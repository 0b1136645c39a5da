//! Pipeline Orchestrator (PO, §4.5)
//!
//! Drives the four phases described by the component design: discover
//! tables, build column nodes with profiling, wire foreign keys, and
//! finalize the graph. Non-fatal degradations are accumulated into a
//! [`RunSummary`] rather than aborting the run.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::builder::GraphBuilder;
use crate::config::PipelineConfig;
use crate::dal::Dal;
use crate::error::{NonFatal, PipelineError};
use crate::graph::{ColumnNode, RelationType, SchemaGraph, TableNode};
use crate::metadata::MetadataLoader;
use crate::profiler;

/// Non-fatal events and coarse counters for one pipeline run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub tables_processed: usize,
    pub columns_processed: usize,
    pub foreign_keys_resolved: usize,
    pub warnings: Vec<NonFatal>,
}

impl RunSummary {
    fn push(&mut self, warning: NonFatal) {
        warn!(%warning, "non-fatal pipeline event");
        self.warnings.push(warning);
    }
}

/// Builds a [`SchemaGraph`] for one SQLite database file.
pub struct Pipeline<'a> {
    dataset_root: &'a Path,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(dataset_root: &'a Path, config: PipelineConfig) -> Self {
        Self { dataset_root, config }
    }

    /// Run the full pipeline against `database_path`, returning the
    /// constructed graph and a summary of non-fatal degradations.
    pub fn run(&self, database_path: &Path) -> Result<(SchemaGraph, RunSummary), PipelineError> {
        let dal = Dal::open(database_path, self.config.busy_timeout)?;
        let mut summary = RunSummary::default();
        let mut builder = GraphBuilder::new();

        // Phase 1: Tables.
        let tables = dal.list_tables().map_err(|source| PipelineError::SourceUnavailable {
            path: database_path.to_path_buf(),
            source,
        })?;
        info!(count = tables.len(), "discovered tables");

        let metadata = MetadataLoader::new(self.dataset_root).load(&tables);
        for warning in metadata.warnings.clone() {
            summary.push(warning);
        }

        let mut descriptions = Vec::with_capacity(tables.len());
        for table in &tables {
            let description = dal
                .describe_table(table)
                .map_err(|source| PipelineError::SourceUnavailable {
                    path: database_path.to_path_buf(),
                    source,
                })?;
            let row_count = dal
                .row_count(table)
                .map_err(|source| PipelineError::SourceUnavailable {
                    path: database_path.to_path_buf(),
                    source,
                })?;

            let columns: Vec<String> = description.columns.iter().map(|c| c.name.clone()).collect();
            let foreign_key_columns: Vec<String> = description
                .foreign_keys
                .iter()
                .map(|fk| fk.from_column.clone())
                .collect();

            builder.add_table(TableNode::new(
                table.clone(),
                row_count,
                columns,
                description.primary_key.clone(),
                foreign_key_columns,
            ))?;
            summary.tables_processed += 1;
            descriptions.push((table.clone(), description));
        }

        // Phase 2: Columns & Profiles.
        for (table, description) in &descriptions {
            for column in &description.columns {
                let is_primary_key = column.pk_ordinal.is_some();
                let is_foreign_key = description
                    .foreign_keys
                    .iter()
                    .any(|fk| fk.from_column == column.name);

                let values = match dal.sample_values(table, &column.name, self.config.hard_cap) {
                    Ok(values) => values,
                    Err(source) => {
                        summary.push(NonFatal::ProfilerDegraded {
                            table: table.clone(),
                            column: column.name.clone(),
                            cause: source.to_string(),
                        });
                        Vec::new()
                    }
                };

                let (statistics, profiler_warning) = profiler::profile_column(
                    &column.declared_type,
                    &column.name,
                    is_primary_key,
                    &values,
                    &self.config,
                );
                if let Some(cause) = &profiler_warning {
                    summary.push(NonFatal::ProfilerDegraded {
                        table: table.clone(),
                        column: column.name.clone(),
                        cause: cause.clone(),
                    });
                }

                let description_entry = metadata.get(table, &column.name);

                let relation_type = match (is_primary_key, is_foreign_key) {
                    (true, true) => RelationType::PrimaryAndForeignKey,
                    (true, false) => RelationType::PrimaryKey,
                    (false, true) => RelationType::ForeignKey,
                    (false, false) => RelationType::NormalColumn,
                };

                builder.add_column(
                    ColumnNode {
                        name: column.name.clone(),
                        belongs_to: table.clone(),
                        data_type: column.declared_type.clone(),
                        is_primary_key,
                        is_foreign_key,
                        is_nullable: column.is_nullable,
                        statistics,
                        column_description: description_entry
                            .and_then(|d| d.column_description.clone()),
                        value_description: description_entry
                            .and_then(|d| d.value_description.clone()),
                        profiler_warning,
                    },
                    relation_type,
                )?;
                summary.columns_processed += 1;
            }
        }

        // Phase 3: Foreign Keys.
        for (table, description) in &descriptions {
            for fk in &description.foreign_keys {
                let to_column = match &fk.to_column {
                    Some(c) => c.clone(),
                    None => {
                        let target = descriptions
                            .iter()
                            .find(|(name, _)| name == &fk.to_table)
                            .map(|(_, desc)| desc.primary_key.clone())
                            .unwrap_or_default();
                        match target.as_slice() {
                            [single] => single.clone(),
                            _ => {
                                return Err(PipelineError::UnresolvableFk {
                                    from_table: table.clone(),
                                    from_column: fk.from_column.clone(),
                                    to_table: fk.to_table.clone(),
                                })
                            }
                        }
                    }
                };

                debug!(
                    from_table = %table,
                    from_column = %fk.from_column,
                    to_table = %fk.to_table,
                    %to_column,
                    "resolving foreign key"
                );
                builder.add_foreign_key_edge(table, &fk.from_column, &fk.to_table, &to_column)?;
                summary.foreign_keys_resolved += 1;
            }
        }

        // Phase 4: Finalize & Emit.
        builder.finalize()?;
        let graph = builder.graph();

        info!(
            tables = summary.tables_processed,
            columns = summary.columns_processed,
            foreign_keys = summary.foreign_keys_resolved,
            warnings = summary.warnings.len(),
            "pipeline run complete"
        );

        Ok((graph, summary))
    }
}

/// Convenience entry point for a single database with default tuning.
pub fn run_default(dataset_root: &Path, database_path: &Path) -> Result<(SchemaGraph, RunSummary), PipelineError> {
    Pipeline::new(dataset_root, PipelineConfig::default()).run(database_path)
}
