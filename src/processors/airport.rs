use crate::error::{ProcessingError, Result};
use crate::models::{AirportRecord, ColumnType, Dataset, Table};
use crate::processors::{
    materialize, persist, DatasetReport, InvariantChecker, QualityReport, RowInvariant,
    SourceProcessor,
};
use crate::readers::DelimitedReader;
use crate::settings::PipelineConfig;
use crate::utils::constants::AIRPORT_DELIMITER;
use crate::utils::ProgressReporter;
use std::time::Instant;
use tracing::info;

/// Source columns with no value downstream.
pub const DROPPED_COLUMNS: [&str; 4] = ["ident", "local_code", "continent", "gps_code"];

const RENAMES: [(&str, &str); 3] = [
    ("type", "airport_type"),
    ("name", "airport_name"),
    ("iata_code", "airport_code"),
];

/// Airports with an IATA code, partitioned by ISO country.
pub struct AirportProcessor {
    show_progress: bool,
}

impl AirportProcessor {
    pub fn new(show_progress: bool) -> Self {
        Self { show_progress }
    }

    /// Keep airports with an IATA code, drop the low-value columns, rename,
    /// and enforce the eight-column output schema.
    pub fn transform(&self, raw: Table) -> Result<Table> {
        let table = raw
            .drop_nulls_in(&["iata_code"])?
            .drop_columns(&DROPPED_COLUMNS)?
            .rename(&RENAMES)?
            .cast("elevation_ft", ColumnType::Float64)?;

        let (table, unexpected) = table.project_to(&AirportRecord::output_schema(), "airport")?;
        if !unexpected.is_empty() {
            return Err(ProcessingError::SchemaMismatch {
                source_name: "airport".to_string(),
                missing: Vec::new(),
                conflicting: unexpected,
            });
        }
        Ok(table)
    }

    pub fn check_quality(&self, airports: &[AirportRecord]) -> QualityReport {
        let mut report = QualityReport::new(Dataset::Airport.name());
        let presence = RowInvariant::new(
            "Missing airport names or airport codes:",
            |a: &AirportRecord| a.airport_name.is_some() && !a.airport_code.is_empty(),
        );

        let outcome = InvariantChecker::new().check(airports, &presence);
        report.record_check(
            "No missing airport names or airport codes",
            outcome.passed(),
        );
        report.invariants.push(outcome);
        report
    }
}

impl SourceProcessor for AirportProcessor {
    fn dataset(&self) -> Dataset {
        Dataset::Airport
    }

    fn process(&self, config: &PipelineConfig) -> Result<DatasetReport> {
        let start = Instant::now();
        let progress = ProgressReporter::new_spinner("Airport: loading", !self.show_progress);

        let raw = DelimitedReader::new(AIRPORT_DELIMITER).read_table(&config.local.airport_file_loc)?;
        let rows_loaded = raw.num_rows();
        info!(rows = rows_loaded, "Airport data loaded");

        progress.set_message("Airport: cleaning");
        let table = self.transform(raw)?;
        let airports = materialize(&table, AirportRecord::from_row)?;
        info!(rows = airports.len(), "Airport data cleaned");

        let quality = self.check_quality(&airports);

        progress.set_message("Airport: writing");
        let summary = persist(config, Dataset::Airport, &airports)?;
        progress.finish_with_message("Airport: done");
        info!(
            rows = summary.rows_written,
            partitions = summary.partitions,
            "Airport data: PROCESSING FINISHED"
        );

        Ok(DatasetReport {
            dataset: Dataset::Airport,
            rows_loaded,
            rows_written: summary.rows_written,
            partitions: summary.partitions,
            output_dir: summary.output_dir,
            quality,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RAW: &str = "\
ident,type,name,elevation_ft,continent,iso_country,iso_region,municipality,gps_code,iata_code,local_code,coordinates
00A,heliport,Total Rf Heliport,11,NA,US,US-PA,Bensalem,00A,,00A,\"-74.93360137939453, 40.07080078125\"
KSEA,large_airport,Seattle Tacoma International Airport,433,NA,US,US-WA,Seattle,KSEA,SEA,SEA,\"-122.308998, 47.449001\"
EGLL,large_airport,,83,EU,GB,GB-ENG,London,EGLL,LHR,,\"-0.461941, 51.4706\"
";

    fn raw() -> Table {
        DelimitedReader::new(b',').read_from(RAW.as_bytes()).unwrap()
    }

    #[test]
    fn test_transform_keeps_iata_airports_only() -> Result<()> {
        let table = AirportProcessor::new(false).transform(raw())?;

        assert_eq!(table.num_rows(), 2);
        assert_eq!(
            table.schema().names(),
            vec![
                "airport_type",
                "airport_name",
                "elevation_ft",
                "iso_country",
                "iso_region",
                "municipality",
                "airport_code",
                "coordinates"
            ]
        );
        for dropped in DROPPED_COLUMNS {
            assert!(!table.schema().contains(dropped));
        }
        Ok(())
    }

    #[test]
    fn test_presence_check_reports_missing_names() -> Result<()> {
        let processor = AirportProcessor::new(false);
        let table = processor.transform(raw())?;
        let airports = materialize(&table, AirportRecord::from_row)?;

        assert_eq!(airports[0].airport_code, "SEA");
        assert_eq!(airports[0].elevation_ft, Some(433.0));

        let report = processor.check_quality(&airports);
        assert!(!report.all_passed());
        assert_eq!(report.total_violations(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_source_column_is_fatal() {
        let data = "ident,type,name,iata_code\nKSEA,large_airport,Seattle,SEA\n";
        let raw = DelimitedReader::new(b',').read_from(data.as_bytes()).unwrap();
        assert!(matches!(
            AirportProcessor::new(false).transform(raw),
            Err(ProcessingError::MissingColumn { .. })
        ));
    }
}
