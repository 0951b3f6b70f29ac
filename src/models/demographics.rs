use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::Result;
use crate::models::RowView;
use crate::utils::constants::DEMOGRAPHICS_PARTITION;
use crate::writers::PartitionedRecord;

/// Demographic profile of one US city, with the race breakdown collapsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DemographicsRecord {
    #[validate(length(min = 1))]
    pub city: String,

    pub state: String,

    #[validate(range(min = 0.0))]
    pub median_age: f64,

    pub male_population: i64,
    pub female_population: i64,
    pub population: i64,
    pub veterans: i64,
    pub foreign_born: i64,

    #[validate(range(min = 0.0))]
    pub avg_household_size: f64,

    #[validate(length(min = 1))]
    pub state_code: String,
}

impl DemographicsRecord {
    pub fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(Self {
            city: row.str("city")?,
            state: row.str("state")?,
            median_age: row.f64("median_age")?,
            male_population: row.i64("male_population")?,
            female_population: row.i64("female_population")?,
            population: row.i64("population")?,
            veterans: row.i64("veterans")?,
            foreign_born: row.i64("foreign_born")?,
            avg_household_size: row.f64("avg_household_size")?,
            state_code: row.str("state_code")?,
        })
    }
}

impl PartitionedRecord for DemographicsRecord {
    const PARTITION_COLUMN: &'static str = DEMOGRAPHICS_PARTITION;

    fn partition_value(&self) -> Option<String> {
        Some(self.state_code.clone())
    }

    fn file_schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("city", DataType::Utf8, false),
            Field::new("state", DataType::Utf8, false),
            Field::new("median_age", DataType::Float64, false),
            Field::new("male_population", DataType::Int64, false),
            Field::new("female_population", DataType::Int64, false),
            Field::new("population", DataType::Int64, false),
            Field::new("veterans", DataType::Int64, false),
            Field::new("foreign_born", DataType::Int64, false),
            Field::new("avg_household_size", DataType::Float64, false),
        ]))
    }

    fn to_batch(records: &[&Self], schema: Arc<Schema>) -> Result<RecordBatch> {
        let ints = |f: fn(&DemographicsRecord) -> i64| -> ArrayRef {
            Arc::new(Int64Array::from(records.iter().map(|r| f(r)).collect::<Vec<_>>()))
        };

        let cities: Vec<&str> = records.iter().map(|r| r.city.as_str()).collect();
        let states: Vec<&str> = records.iter().map(|r| r.state.as_str()).collect();
        let median_ages: Vec<f64> = records.iter().map(|r| r.median_age).collect();
        let household_sizes: Vec<f64> = records.iter().map(|r| r.avg_household_size).collect();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(cities)),
            Arc::new(StringArray::from(states)),
            Arc::new(Float64Array::from(median_ages)),
            ints(|r| r.male_population),
            ints(|r| r.female_population),
            ints(|r| r.population),
            ints(|r| r.veterans),
            ints(|r| r.foreign_born),
            Arc::new(Float64Array::from(household_sizes)),
        ];

        Ok(RecordBatch::try_new(schema, columns)?)
    }
}
