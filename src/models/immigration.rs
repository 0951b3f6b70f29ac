use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::models::RowView;
use crate::utils::constants::IMMIGRATION_PARTITION;
use crate::writers::PartitionedRecord;

/// One I94 arrival by air, as published.
///
/// `stay_duration` is departure minus arrival in days, computed on the raw
/// day offsets; it is null when no departure was recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ImmigrationRecord {
    pub year: i32,

    #[validate(range(min = 1, max = 12))]
    pub month: i32,

    #[validate(length(min = 1))]
    pub airport_code: String,

    pub address: Option<String>,
    pub visa_code: Option<i32>,
    pub biryear: Option<i32>,
    pub gender: Option<String>,
    pub visa_type: Option<String>,
    pub stay_duration: Option<i64>,
}

impl ImmigrationRecord {
    /// Materialise from a cleaned, renamed immigration row.
    pub fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            year: to_i32(row.i64("year")?, "year")?,
            month: to_i32(row.i64("month")?, "month")?,
            airport_code: row.str("airport_code")?,
            address: row.opt_str("address")?,
            visa_code: row.opt_i64("visa_code")?.map(|v| to_i32(v, "visa_code")).transpose()?,
            biryear: row.opt_i64("biryear")?.map(|v| to_i32(v, "biryear")).transpose()?,
            gender: row.opt_str("gender")?,
            visa_type: row.opt_str("visa_type")?,
            stay_duration: row.opt_i64("stay_duration")?,
        })
    }
}

fn to_i32(value: i64, column: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| ProcessingError::TypeCoercion {
        column: column.to_string(),
        value: value.to_string(),
        target: "Int32".to_string(),
    })
}

impl PartitionedRecord for ImmigrationRecord {
    const PARTITION_COLUMN: &'static str = IMMIGRATION_PARTITION;

    fn partition_value(&self) -> Option<String> {
        Some(self.month.to_string())
    }

    fn file_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, false),
            Field::new("airport_code", DataType::Utf8, false),
            Field::new("address", DataType::Utf8, true),
            Field::new("visa_code", DataType::Int32, true),
            Field::new("biryear", DataType::Int32, true),
            Field::new("gender", DataType::Utf8, true),
            Field::new("visa_type", DataType::Utf8, true),
            Field::new("stay_duration", DataType::Int64, true),
        ]))
    }

    fn to_batch(records: &[&Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        let years: Vec<i32> = records.iter().map(|r| r.year).collect();
        let airport_codes: Vec<&str> = records.iter().map(|r| r.airport_code.as_str()).collect();
        let addresses: Vec<Option<&str>> = records.iter().map(|r| r.address.as_deref()).collect();
        let visa_codes: Vec<Option<i32>> = records.iter().map(|r| r.visa_code).collect();
        let biryears: Vec<Option<i32>> = records.iter().map(|r| r.biryear).collect();
        let genders: Vec<Option<&str>> = records.iter().map(|r| r.gender.as_deref()).collect();
        let visa_types: Vec<Option<&str>> = records.iter().map(|r| r.visa_type.as_deref()).collect();
        let stays: Vec<Option<i64>> = records.iter().map(|r| r.stay_duration).collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(years)),
            Arc::new(StringArray::from(airport_codes)),
            Arc::new(StringArray::from(addresses)),
            Arc::new(Int32Array::from(visa_codes)),
            Arc::new(Int32Array::from(biryears)),
            Arc::new(StringArray::from(genders)),
            Arc::new(StringArray::from(visa_types)),
            Arc::new(Int64Array::from(stays)),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }
}
