pub mod cli;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod processors;
pub mod publish;
pub mod readers;
pub mod settings;
pub mod utils;
pub mod writers;

pub use error::{ProcessingError, Result};
pub use pipeline::{Pipeline, PipelineOptions, PipelineReport};
pub use settings::PipelineConfig;
