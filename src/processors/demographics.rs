use crate::error::Result;
use crate::models::{ColumnType, Dataset, DemographicsRecord, Table};
use crate::processors::{
    field_rules, materialize, persist, DatasetReport, InvariantChecker, QualityReport,
    RowInvariant, SourceProcessor,
};
use crate::readers::DelimitedReader;
use crate::settings::PipelineConfig;
use crate::utils::constants::DEMOGRAPHICS_DELIMITER;
use crate::utils::ProgressReporter;
use std::time::Instant;
use tracing::{debug, info};

/// Per-race breakdown columns; without them the race rows of a city collapse
/// into exact duplicates.
const RACE_COLUMNS: [&str; 2] = ["Race", "Count"];

const RENAMES: [(&str, &str); 10] = [
    ("City", "city"),
    ("State", "state"),
    ("Median Age", "median_age"),
    ("Male Population", "male_population"),
    ("Female Population", "female_population"),
    ("Total Population", "population"),
    ("Number of Veterans", "veterans"),
    ("Foreign-born", "foreign_born"),
    ("Average Household Size", "avg_household_size"),
    ("State Code", "state_code"),
];

const COUNT_COLUMNS: [&str; 5] = [
    "male_population",
    "female_population",
    "population",
    "veterans",
    "foreign_born",
];

/// One row per US city, partitioned by state code.
pub struct DemographicsProcessor {
    show_progress: bool,
}

impl DemographicsProcessor {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Collapse the race breakdown and type the columns. Rows with a `NaN`
    /// measure are dropped along with the incomplete ones.
    pub fn transform(&self, raw: Table) -> Result<Table> {
        let before = raw.num_rows();
        let table = raw.drop_nulls().drop_columns(&RACE_COLUMNS)?.dedup();
        debug!(before, after = table.num_rows(), "Collapsed race breakdown");

        let mut table = table.rename(&RENAMES)?;
        for column in COUNT_COLUMNS {
            table = table.cast(column, ColumnType::Int64)?;
        }
        Ok(table
            .cast("median_age", ColumnType::Float64)?
            .cast("avg_household_size", ColumnType::Float64)?
            .drop_nulls())
    }

    pub fn invariants() -> Vec<RowInvariant<DemographicsRecord>> {
        vec![
            RowInvariant::new(
                "Data quality issues in population count:",
                |r: &DemographicsRecord| {
                    r.male_population
                        .checked_add(r.female_population)
                        .is_some_and(|split| r.population >= split)
                },
            ),
            RowInvariant::new(
                "Data quality issues in foreign_born:",
                |r: &DemographicsRecord| r.population > r.foreign_born,
            ),
            RowInvariant::new(
                "Data quality issues in avg_household_size:",
                |r: &DemographicsRecord| {
                    r.avg_household_size > 0.0 && r.avg_household_size <= r.population as f64
                },
            ),
            RowInvariant::new(
                "Data quality issues in veterans:",
                |r: &DemographicsRecord| r.male_population > r.veterans,
            ),
        ]
    }

    pub fn check_quality(&self, cities: &[DemographicsRecord]) -> QualityReport {
        let mut report = QualityReport::new(Dataset::Demographics.name());
        let mut invariants = Self::invariants();
        invariants.push(field_rules());
        InvariantChecker::new().check_all(cities, &invariants, &mut report);
        report
    }
}

impl SourceProcessor for DemographicsProcessor {
    fn dataset(&self) -> Dataset {
        Dataset::Demographics
    }

    fn process(&self, config: &PipelineConfig) -> Result<DatasetReport> {
        let start = Instant::now();
        let progress = ProgressReporter::new_spinner("Demographics: loading", !self.show_progress);

        let raw = DelimitedReader::new(DEMOGRAPHICS_DELIMITER)
            .read_table(&config.local.demographics_file_loc)?;
        let rows_loaded = raw.num_rows();
        info!(rows = rows_loaded, "Demographics data loaded");

        progress.set_message("Demographics: cleaning");
        let table = self.transform(raw)?;
        let cities = materialize(&table, DemographicsRecord::from_row)?;
        info!(rows = cities.len(), "Demographics data cleaned");

        let quality = self.check_quality(&cities);

        progress.set_message("Demographics: writing");
        let summary = persist(config, Dataset::Demographics, &cities)?;
        progress.finish_with_message("Demographics: done");
        info!(
            rows = summary.rows_written,
            partitions = summary.partitions,
            "Demographics data: PROCESSING FINISHED"
        );

        Ok(DatasetReport {
            dataset: Dataset::Demographics,
            rows_loaded,
            rows_written: summary.rows_written,
            partitions: summary.partitions,
            output_dir: summary.output_dir,
            quality,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }
}
