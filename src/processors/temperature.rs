use crate::error::Result;
use crate::models::{ColumnType, Dataset, Table, TemperatureObservation, Value};
use crate::processors::{
    field_rules, materialize, persist, DatasetReport, InvariantChecker, QualityReport,
    SourceProcessor,
};
use crate::readers::DelimitedReader;
use crate::settings::PipelineConfig;
use crate::utils::constants::{TEMPERATURE_COUNTRY, TEMPERATURE_CUTOFF, TEMPERATURE_DELIMITER};
use crate::utils::ProgressReporter;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

const RENAMES: [(&str, &str); 7] = [
    ("dt", "date"),
    ("AverageTemperature", "avg_temperature"),
    ("AverageTemperatureUncertainty", "avg_temperature_uncert"),
    ("City", "city"),
    ("Country", "country"),
    ("Latitude", "latitude"),
    ("Longitude", "longitude"),
];

/// US city temperatures since 2000, partitioned by city.
pub struct TemperatureProcessor {
    show_progress: bool,
}

impl TemperatureProcessor {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Drop incomplete rows, keep US observations from the cutoff date on,
    /// and normalise column names. A `NaN` reading counts as missing.
    pub fn transform(&self, raw: Table) -> Result<Table> {
        let cutoff = cutoff_date();

        let table = raw.drop_nulls();
        let country = table.schema().require("Country")?;
        let table = table
            .filter(|row| matches!(&row.values()[country], Value::Str(c) if c == TEMPERATURE_COUNTRY))
            .cast("dt", ColumnType::Date)?;

        let date = table.schema().require("dt")?;
        table
            .filter(|row| matches!(&row.values()[date], Value::Date(d) if *d >= cutoff))
            .cast("AverageTemperature", ColumnType::Float64)?
            .cast("AverageTemperatureUncertainty", ColumnType::Float64)?
            .drop_nulls()
            .rename(&RENAMES)
    }

    /// Structural checks (non-empty, several cities, several dates) plus the
    /// per-row field rules.
    pub fn check_quality(&self, observations: &[TemperatureObservation]) -> QualityReport {
        let mut report = QualityReport::new(Dataset::Temperature.name());
        InvariantChecker::new().check_all(observations, &[field_rules()], &mut report);

        let cities: HashSet<&str> = observations.iter().map(|o| o.city.as_str()).collect();
        let dates: HashSet<NaiveDate> = observations.iter().map(|o| o.date).collect();

        report.record_check("data frame not empty", !observations.is_empty());
        report.record_check("multiple cities", cities.len() > 1);
        report.record_check("multiple dates", dates.len() > 1);
        report
    }
}

impl SourceProcessor for TemperatureProcessor {
    fn dataset(&self) -> Dataset {
        Dataset::Temperature
    }

    fn process(&self, config: &PipelineConfig) -> Result<DatasetReport> {
        let start = Instant::now();
        let progress = ProgressReporter::new_spinner("Temperature: loading", !self.show_progress);

        let raw = DelimitedReader::new(TEMPERATURE_DELIMITER)
            .read_table(&config.local.temperature_file_loc)?;
        let rows_loaded = raw.num_rows();
        info!(rows = rows_loaded, "Temperature data loaded");

        progress.set_message("Temperature: cleaning");
        let table = self.transform(raw)?;
        let observations = materialize(&table, TemperatureObservation::from_row)?;
        info!(rows = observations.len(), "Temperature data cleaned");

        let quality = self.check_quality(&observations);

        progress.set_message("Temperature: writing");
        let summary = persist(config, Dataset::Temperature, &observations)?;
        progress.finish_with_message("Temperature: done");
        info!(
            rows = summary.rows_written,
            partitions = summary.partitions,
            "Temperature data: PROCESSING FINISHED"
        );

        Ok(DatasetReport {
            dataset: Dataset::Temperature,
            rows_loaded,
            rows_written: summary.rows_written,
            partitions: summary.partitions,
            output_dir: summary.output_dir,
            quality,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }
}

fn cutoff_date() -> NaiveDate {
    let (y, m, d) = TEMPERATURE_CUTOFF;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}
