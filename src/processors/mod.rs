pub mod airport;
pub mod demographics;
pub mod immigration;
pub mod invariant_checker;
pub mod temperature;

pub use airport::AirportProcessor;
pub use demographics::DemographicsProcessor;
pub use immigration::ImmigrationProcessor;
pub use invariant_checker::{
    field_rules, DatasetCheck, InvariantChecker, InvariantOutcome, QualityReport, RowInvariant,
};
pub use temperature::TemperatureProcessor;

use crate::error::Result;
use crate::models::{Dataset, RowView, Table};
use crate::settings::PipelineConfig;
use crate::writers::{ParquetWriter, PartitionedRecord, WriteSummary};
use serde::Serialize;
use std::path::PathBuf;

/// One source dataset's Load → Clean → Reshape → Validate → Persist stage.
///
/// Implementations own their dataset for the duration of [`process`] and
/// share no state, so they may run in any order or concurrently.
///
/// [`process`]: SourceProcessor::process
pub trait SourceProcessor: Send + Sync {
    fn dataset(&self) -> Dataset;

    fn process(&self, config: &PipelineConfig) -> Result<DatasetReport>;
}

/// What a processor run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset: Dataset,
    pub rows_loaded: usize,
    pub rows_written: usize,
    pub partitions: usize,
    pub output_dir: PathBuf,
    pub quality: QualityReport,
    pub elapsed_ms: u128,
}

/// Build the processor for `dataset`.
pub fn processor_for(dataset: Dataset, show_progress: bool) -> Box<dyn SourceProcessor> {
    match dataset {
        Dataset::Immigration => Box::new(ImmigrationProcessor::new(show_progress)),
        Dataset::Temperature => Box::new(TemperatureProcessor::new(show_progress)),
        Dataset::Airport => Box::new(AirportProcessor::new(show_progress)),
        Dataset::Demographics => Box::new(DemographicsProcessor::new(show_progress)),
    }
}

/// Turn every row of a cleaned table into its typed record.
pub(crate) fn materialize<T, F>(table: &Table, from_row: F) -> Result<Vec<T>>
where
    F: Fn(&RowView<'_>) -> Result<T>,
{
    table.iter().map(|row| from_row(&row)).collect()
}

/// Write `records` to the dataset's staging directory, replacing what was there.
pub(crate) fn persist<T: PartitionedRecord>(
    config: &PipelineConfig,
    dataset: Dataset,
    records: &[T],
) -> Result<WriteSummary> {
    let writer = ParquetWriter::new()
        .with_compression(&config.processing.compression)?
        .with_row_group_size(config.processing.row_group_size);
    writer.write_partitioned(records, &config.output_dir(dataset))
}
