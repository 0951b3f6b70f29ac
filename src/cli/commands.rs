use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::pipeline::{self, Pipeline, PipelineOptions};
use crate::processors::{processor_for, InvariantChecker};
use crate::publish::{AwsCliSync, LocalMirrorSync, RemoteSync};
use crate::settings::PipelineConfig;
use crate::writers::ParquetWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub async fn run(cli: Cli) -> Result<()> {
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Run {
            concurrent,
            skip_publish,
            dry_run_publish,
            report_json,
        } => {
            let config = PipelineConfig::load(&cli.config)?;
            let sync = remote_sync(&config, dry_run_publish);
            let pipeline = Pipeline::new(
                config,
                PipelineOptions {
                    concurrent,
                    skip_publish,
                    only: None,
                    show_progress,
                },
            );

            let report = pipeline.run(sync).await?;
            println!("\n{}", report.summary());

            if let Some(path) = report_json {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, json)?;
                info!(path = %path.display(), "Run report written");
            }
        }

        Commands::Process { dataset } => {
            let config = Arc::new(PipelineConfig::load(&cli.config)?);
            let report = tokio::task::spawn_blocking(move || {
                processor_for(dataset, show_progress).process(&config)
            })
            .await??;

            println!(
                "{}: {} rows loaded, {} rows written to {} partitions in {}",
                dataset,
                report.rows_loaded,
                report.rows_written,
                report.partitions,
                report.output_dir.display()
            );
            println!("\n{}", InvariantChecker::new().generate_summary(&report.quality));
        }

        Commands::Publish { dry_run_publish } => {
            let config = PipelineConfig::load(&cli.config)?;
            let sync = remote_sync(&config, dry_run_publish);
            let published = pipeline::publish(Arc::new(config), sync).await?;
            for folder in published {
                println!("{} -> {}", folder.local.display(), folder.remote);
            }
        }

        Commands::Info { dir } => {
            println!("Analyzing partitioned dataset: {}", dir.display());
            let info = ParquetWriter::new().inspect(&dir)?;
            println!("\n{}", info.summary());
            if !info.partition_values.is_empty() {
                println!("\nPartitions: {}", info.partition_values.join(", "));
            }
        }
    }

    Ok(())
}

fn remote_sync(config: &PipelineConfig, dry_run: Option<PathBuf>) -> Box<dyn RemoteSync> {
    match dry_run {
        Some(root) => {
            info!(root = %root.display(), "Dry run: mirroring to local directory");
            Box::new(LocalMirrorSync::new(root))
        }
        None => Box::new(AwsCliSync::new(config.aws.clone())),
    }
}
