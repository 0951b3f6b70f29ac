use crate::models::Dataset;
use crate::utils::constants::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "i94-etl")]
#[command(about = "Batch ETL for I94 immigration, temperature, airport and demographics data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE, help = "INI configuration file")]
    pub config: PathBuf,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = num_cpus::get(), help = "Worker threads for row-level checks")]
    pub max_workers: usize,

    #[arg(long, global = true, help = "Hide progress spinners")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process every dataset, then publish the staging area
    Run {
        #[arg(long, help = "Run the four processors concurrently")]
        concurrent: bool,

        #[arg(long, help = "Stop after writing the local staging area")]
        skip_publish: bool,

        #[arg(long, help = "Mirror into this directory instead of calling the aws cli")]
        dry_run_publish: Option<PathBuf>,

        #[arg(long, help = "Write the run report as JSON to this file")]
        report_json: Option<PathBuf>,
    },

    /// Process a single dataset into the staging area
    Process {
        #[arg(value_enum)]
        dataset: Dataset,
    },

    /// Publish the current staging area
    Publish {
        #[arg(long, help = "Mirror into this directory instead of calling the aws cli")]
        dry_run_publish: Option<PathBuf>,
    },

    /// Display information about a partitioned output directory
    Info {
        #[arg(help = "Dataset directory, e.g. staging/immigration")]
        dir: PathBuf,
    },
}
