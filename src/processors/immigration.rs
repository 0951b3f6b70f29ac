use crate::error::{ProcessingError, Result};
use crate::models::{ColumnType, Dataset, Field, ImmigrationRecord, Table, Value};
use crate::processors::{
    field_rules, materialize, persist, DatasetReport, InvariantChecker, QualityReport,
    SourceProcessor,
};
use crate::readers::{ColumnarReader, DelimitedReader};
use crate::settings::PipelineConfig;
use crate::utils::constants::{I94_MODE_AIR, IMMIGRATION_MONTHS};
use crate::utils::dates::sas_offset_to_date;
use crate::utils::ProgressReporter;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Columns every monthly file has to provide.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "i94yr", "i94mon", "i94port", "i94addr", "i94visa", "arrdate", "depdate", "biryear",
    "gender", "visatype", "i94mode", "i94bir",
];

/// Rows missing any of these are unusable.
const KEY_COLUMNS: [&str; 5] = ["i94yr", "i94mon", "i94port", "arrdate", "i94bir"];

const KEPT_COLUMNS: [&str; 10] = [
    "i94yr", "i94mon", "i94port", "i94addr", "i94visa", "arrdate", "depdate", "biryear",
    "gender", "visatype",
];

const RENAMES: [(&str, &str); 6] = [
    ("i94yr", "year"),
    ("i94mon", "month"),
    ("i94port", "airport_code"),
    ("i94addr", "address"),
    ("i94visa", "visa_code"),
    ("visatype", "visa_type"),
];

/// A year of I94 arrivals by air, partitioned by month.
pub struct ImmigrationProcessor {
    show_progress: bool,
}

impl ImmigrationProcessor {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Read one monthly file in the configured format.
    pub fn load_month(&self, config: &PipelineConfig, month: &str) -> Result<Table> {
        let path = config.immigration_file(month);
        read_monthly_file(&path, &config.processing.imm_file_extension)
    }

    /// Union the twelve months of the configured year.
    ///
    /// January fixes the canonical schema; later months are projected onto it
    /// and any extra columns they carry are dropped with a warning.
    pub fn load_year(&self, config: &PipelineConfig) -> Result<Table> {
        let progress = ProgressReporter::new(
            IMMIGRATION_MONTHS.len() as u64,
            "Immigration: loading months",
            !self.show_progress,
        );

        let (first, rest) = IMMIGRATION_MONTHS.split_at(1);
        let mut table = self.load_month(config, first[0])?;
        check_required(&table, first[0])?;
        info!(month = first[0], rows = table.num_rows(), "Immigration month loaded");
        progress.increment(1);

        let canonical = table.schema().clone();
        for month in rest {
            let next = self.load_month(config, month)?;
            let (next, extra) = next.project_to(&canonical, &format!("immigration {}", month))?;
            if !extra.is_empty() {
                warn!(month = *month, columns = ?extra, "Dropping columns absent from January");
            }
            info!(month = *month, rows = next.num_rows(), "Immigration month loaded");
            table.append(next)?;
            progress.increment(1);
        }

        progress.finish_with_message("Immigration: all months loaded");
        info!(rows = table.num_rows(), "Immigration: All months loaded");
        Ok(table)
    }

    /// Deduplicate, keep air arrivals with complete keys, rename and derive
    /// `stay_duration` from the arrival and departure day offsets.
    pub fn transform(&self, raw: Table) -> Result<Table> {
        let table = raw.dedup().cast("i94mode", ColumnType::Int64)?;
        let mode = table.schema().require("i94mode")?;
        let table = table
            .filter(|row| matches!(row.values()[mode], Value::Int(m) if m == I94_MODE_AIR))
            .drop_nulls_in(&KEY_COLUMNS)?
            .select(&KEPT_COLUMNS)?
            .rename(&RENAMES)?
            .cast("year", ColumnType::Int64)?
            .cast("month", ColumnType::Int64)?
            .cast("arrdate", ColumnType::Int64)?
            .cast("depdate", ColumnType::Int64)?;

        log_arrival_window(&table);

        table
            .with_column(Field::new("stay_duration", ColumnType::Int64), |row| {
                match (row.opt_i64("arrdate")?, row.opt_i64("depdate")?) {
                    (Some(arrival), Some(departure)) => Ok(departure
                        .checked_sub(arrival)
                        .map_or(Value::Null, Value::Int)),
                    _ => Ok(Value::Null),
                }
            })?
            .drop_columns(&["arrdate", "depdate"])
    }
}

impl ImmigrationProcessor {
    pub fn check_quality(&self, arrivals: &[ImmigrationRecord]) -> QualityReport {
        let mut report = QualityReport::new(Dataset::Immigration.name());
        report.record_check("data frame not empty", !arrivals.is_empty());
        InvariantChecker::new().check_all(arrivals, &[field_rules()], &mut report);
        report
    }
}

impl SourceProcessor for ImmigrationProcessor {
    fn dataset(&self) -> Dataset {
        Dataset::Immigration
    }

    fn process(&self, config: &PipelineConfig) -> Result<DatasetReport> {
        let start = Instant::now();

        let raw = self.load_year(config)?;
        let rows_loaded = raw.num_rows();

        let progress = ProgressReporter::new_spinner("Immigration: cleaning", !self.show_progress);
        let table = self.transform(raw)?;
        let arrivals = materialize(&table, ImmigrationRecord::from_row)?;
        info!(rows = arrivals.len(), "Immigration data cleaned");

        let quality = self.check_quality(&arrivals);

        progress.set_message("Immigration: writing");
        let summary = persist(config, Dataset::Immigration, &arrivals)?;
        progress.finish_with_message("Immigration: done");
        info!(
            rows = summary.rows_written,
            partitions = summary.partitions,
            "Immigration data: processing finished"
        );

        Ok(DatasetReport {
            dataset: Dataset::Immigration,
            rows_loaded,
            rows_written: summary.rows_written,
            partitions: summary.partitions,
            output_dir: summary.output_dir,
            quality,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }
}

fn read_monthly_file(path: &Path, extension: &str) -> Result<Table> {
    match extension.to_ascii_lowercase().as_str() {
        "parquet" => ColumnarReader::new().read_table(path),
        "csv" => DelimitedReader::new(b',').read_table(path),
        other => Err(ProcessingError::Config(format!(
            "Unsupported immigration file extension '{}' (expected parquet or csv)",
            other
        ))),
    }
}

fn check_required(table: &Table, month: &str) -> Result<()> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !table.schema().contains(c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ProcessingError::SchemaMismatch {
            source_name: format!("immigration {}", month),
            missing,
            conflicting: Vec::new(),
        })
    }
}

fn log_arrival_window(table: &Table) {
    let Some(idx) = table.schema().index_of("arrdate") else {
        return;
    };
    let offsets = table.rows().iter().filter_map(|r| match r[idx] {
        Value::Int(v) => Some(v),
        _ => None,
    });
    let (min, max) = offsets.fold((None, None), |(lo, hi): (Option<i64>, Option<i64>), v| {
        (Some(lo.map_or(v, |l| l.min(v))), Some(hi.map_or(v, |h| h.max(v))))
    });
    if let (Some(min), Some(max)) = (min, max) {
        debug!(
            first = ?sas_offset_to_date(min),
            last = ?sas_offset_to_date(max),
            "Immigration arrival window"
        );
    }
}
