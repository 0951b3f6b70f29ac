use crate::error::Result;
use crate::models::Dataset;
use crate::processors::{processor_for, DatasetReport, InvariantChecker};
use crate::publish::{PublishedFolder, Publisher, RemoteSync};
use crate::settings::PipelineConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Run the processors side by side instead of one after another.
    pub concurrent: bool,
    pub skip_publish: bool,
    /// Restrict the run to one dataset.
    pub only: Option<Dataset>,
    pub show_progress: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub datasets: Vec<DatasetReport>,
    pub published: Vec<PublishedFolder>,
    pub elapsed_ms: u128,
}

impl PipelineReport {
    pub fn summary(&self) -> String {
        let checker = InvariantChecker::new();
        let mut summary = String::from("=== Pipeline Summary ===\n");

        for report in &self.datasets {
            summary.push_str(&format!(
                "{:<13} loaded {:>9}  written {:>9}  partitions {:>5}  ({} ms)\n",
                report.dataset.name(),
                report.rows_loaded,
                report.rows_written,
                report.partitions,
                report.elapsed_ms
            ));
        }
        for report in &self.datasets {
            summary.push('\n');
            summary.push_str(&checker.generate_summary(&report.quality));
        }

        if self.published.is_empty() {
            summary.push_str("\nNothing published\n");
        } else {
            summary.push_str("\nPublished:\n");
            for folder in &self.published {
                summary.push_str(&format!("  {} -> {}\n", folder.local.display(), folder.remote));
            }
        }
        summary.push_str(&format!("\nTotal time: {} ms\n", self.elapsed_ms));
        summary
    }
}

/// Runs the source processors, then publishes the staging area.
///
/// Processors run on the blocking thread pool; any failure aborts the run
/// before anything is published.
pub struct Pipeline {
    config: Arc<PipelineConfig>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, options: PipelineOptions) -> Self {
        Self {
            config: Arc::new(config),
            options,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn datasets(&self) -> Vec<Dataset> {
        match self.options.only {
            Some(dataset) => vec![dataset],
            None => Dataset::PROCESSING_ORDER.to_vec(),
        }
    }

    pub async fn run(&self, sync: Box<dyn RemoteSync>) -> Result<PipelineReport> {
        let start = Instant::now();

        let datasets = if self.options.concurrent {
            self.process_concurrently().await?
        } else {
            self.process_sequentially().await?
        };

        let published = if self.options.skip_publish {
            info!("Publishing skipped");
            Vec::new()
        } else {
            publish(self.config.clone(), sync).await?
        };

        info!("Program run completed");
        Ok(PipelineReport {
            datasets,
            published,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }

    async fn process_sequentially(&self) -> Result<Vec<DatasetReport>> {
        let mut reports = Vec::new();
        for dataset in self.datasets() {
            let config = self.config.clone();
            let show_progress = self.options.show_progress;
            let report = tokio::task::spawn_blocking(move || {
                processor_for(dataset, show_progress).process(&config)
            })
            .await??;
            reports.push(report);
        }
        Ok(reports)
    }

    async fn process_concurrently(&self) -> Result<Vec<DatasetReport>> {
        let order = self.datasets();
        let mut join_set = JoinSet::new();

        for &dataset in &order {
            let config = self.config.clone();
            let show_progress = self.options.show_progress;
            join_set.spawn_blocking(move || processor_for(dataset, show_progress).process(&config));
        }

        let mut reports = Vec::with_capacity(order.len());
        while let Some(result) = join_set.join_next().await {
            match result? {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!("Processor failed, waiting for the others to stop: {}", e);
                    join_set.abort_all();
                    while join_set.join_next().await.is_some() {}
                    return Err(e);
                }
            }
        }

        reports.sort_by_key(|r| order.iter().position(|d| *d == r.dataset));
        Ok(reports)
    }
}

/// Publish the whole staging area through `sync` on the blocking pool.
pub async fn publish(
    config: Arc<PipelineConfig>,
    sync: Box<dyn RemoteSync>,
) -> Result<Vec<PublishedFolder>> {
    tokio::task::spawn_blocking(move || Publisher::new(&config, sync).publish_all()).await?
}
