use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{ColumnType, RowView, TableSchema};
use crate::utils::constants::AIRPORT_PARTITION;
use crate::writers::PartitionedRecord;

/// An airport with an IATA code.
///
/// `airport_name` stays optional here: its presence is a quality check whose
/// failures are reported, not a load failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub airport_type: Option<String>,
    pub airport_name: Option<String>,
    pub elevation_ft: Option<f64>,
    pub iso_country: Option<String>,
    pub iso_region: Option<String>,
    pub municipality: Option<String>,
    pub airport_code: String,
    pub coordinates: Option<String>,
}

impl AirportRecord {
    /// The eight published columns, in order.
    pub fn output_schema() -> TableSchema {
        TableSchema::new(vec![
            crate::models::Field::new("airport_type", ColumnType::Utf8),
            crate::models::Field::new("airport_name", ColumnType::Utf8),
            crate::models::Field::new("elevation_ft", ColumnType::Float64),
            crate::models::Field::new("iso_country", ColumnType::Utf8),
            crate::models::Field::new("iso_region", ColumnType::Utf8),
            crate::models::Field::new("municipality", ColumnType::Utf8),
            crate::models::Field::new("airport_code", ColumnType::Utf8),
            crate::models::Field::new("coordinates", ColumnType::Utf8),
        ])
    }

    pub fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            airport_type: row.opt_str("airport_type")?,
            airport_name: row.opt_str("airport_name")?,
            elevation_ft: row.opt_f64("elevation_ft")?,
            iso_country: row.opt_str("iso_country")?,
            iso_region: row.opt_str("iso_region")?,
            municipality: row.opt_str("municipality")?,
            airport_code: row.str("airport_code")?,
            coordinates: row.opt_str("coordinates")?,
        })
    }
}

impl PartitionedRecord for AirportRecord {
    const PARTITION_COLUMN: &'static str = AIRPORT_PARTITION;

    fn partition_value(&self) -> Option<String> {
        self.iso_country.clone()
    }

    fn file_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("airport_type", DataType::Utf8, true),
            Field::new("airport_name", DataType::Utf8, true),
            Field::new("elevation_ft", DataType::Float64, true),
            Field::new("iso_region", DataType::Utf8, true),
            Field::new("municipality", DataType::Utf8, true),
            Field::new("airport_code", DataType::Utf8, false),
            Field::new("coordinates", DataType::Utf8, true),
        ]))
    }

    fn to_batch(records: &[&Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        let types: Vec<Option<&str>> = records.iter().map(|r| r.airport_type.as_deref()).collect();
        let names: Vec<Option<&str>> = records.iter().map(|r| r.airport_name.as_deref()).collect();
        let elevations: Vec<Option<f64>> = records.iter().map(|r| r.elevation_ft).collect();
        let regions: Vec<Option<&str>> = records.iter().map(|r| r.iso_region.as_deref()).collect();
        let municipalities: Vec<Option<&str>> =
            records.iter().map(|r| r.municipality.as_deref()).collect();
        let codes: Vec<&str> = records.iter().map(|r| r.airport_code.as_str()).collect();
        let coordinates: Vec<Option<&str>> =
            records.iter().map(|r| r.coordinates.as_deref()).collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(types)),
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(elevations)),
            Arc::new(StringArray::from(regions)),
            Arc::new(StringArray::from(municipalities)),
            Arc::new(StringArray::from(codes)),
            Arc::new(StringArray::from(coordinates)),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }
}
