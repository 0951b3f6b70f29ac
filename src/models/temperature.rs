use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::RowView;
use crate::utils::constants::TEMPERATURE_PARTITION;
use crate::utils::dates::days_since_unix_epoch;
use crate::writers::PartitionedRecord;

/// Monthly average land temperature of a US city.
///
/// Latitude and longitude keep the source notation (`42.59N`, `72.00W`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TemperatureObservation {
    pub date: NaiveDate,
    pub avg_temperature: f64,

    #[validate(range(min = 0.0))]
    pub avg_temperature_uncert: f64,

    #[validate(length(min = 1))]
    pub city: String,

    pub country: String,
    pub latitude: String,
    pub longitude: String,
}

impl TemperatureObservation {
    pub fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            date: row.date("date")?,
            avg_temperature: row.f64("avg_temperature")?,
            avg_temperature_uncert: row.f64("avg_temperature_uncert")?,
            city: row.str("city")?,
            country: row.str("country")?,
            latitude: row.str("latitude")?,
            longitude: row.str("longitude")?,
        })
    }
}

impl PartitionedRecord for TemperatureObservation {
    const PARTITION_COLUMN: &'static str = TEMPERATURE_PARTITION;

    fn partition_value(&self) -> Option<String> {
        Some(self.city.clone())
    }

    fn file_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("date", DataType::Date32, false),
            Field::new("avg_temperature", DataType::Float64, false),
            Field::new("avg_temperature_uncert", DataType::Float64, false),
            Field::new("country", DataType::Utf8, false),
            Field::new("latitude", DataType::Utf8, false),
            Field::new("longitude", DataType::Utf8, false),
        ]))
    }

    fn to_batch(records: &[&Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        let dates: Vec<i32> = records.iter().map(|r| days_since_unix_epoch(r.date)).collect();
        let averages: Vec<f64> = records.iter().map(|r| r.avg_temperature).collect();
        let uncertainties: Vec<f64> = records.iter().map(|r| r.avg_temperature_uncert).collect();
        let countries: Vec<&str> = records.iter().map(|r| r.country.as_str()).collect();
        let latitudes: Vec<&str> = records.iter().map(|r| r.latitude.as_str()).collect();
        let longitudes: Vec<&str> = records.iter().map(|r| r.longitude.as_str()).collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(Date32Array::from(dates)),
            Arc::new(Float64Array::from(averages)),
            Arc::new(Float64Array::from(uncertainties)),
            Arc::new(StringArray::from(countries)),
            Arc::new(StringArray::from(latitudes)),
            Arc::new(StringArray::from(longitudes)),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }
}
