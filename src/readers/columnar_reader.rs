use crate::error::{ProcessingError, Result};
use crate::models::{ColumnType, Field, Table, TableSchema, Value};
use crate::utils::dates::date_from_unix_days;
use arrow::array::{Array, ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Reads a Parquet file into a [`Table`], keeping the file's column types.
///
/// Integer columns load as `Int64`, every other numeric column as `Float64`
/// (statistical exports store numbers as doubles), text as `Utf8` and dates
/// as `Date`. NaN is treated as null.
pub struct ColumnarReader {
    batch_size: usize,
}

impl ColumnarReader {
    pub fn new() -> Self {
        Self { batch_size: 8192 }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn read_table(&self, path: &Path) -> Result<Table> {
        if !path.is_file() {
            return Err(ProcessingError::MissingInput {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

        let fields = builder
            .schema()
            .fields()
            .iter()
            .map(|f| -> Result<Field> {
                Ok(Field::new(f.name().as_str(), column_type_of(f.name(), f.data_type())?))
            })
            .collect::<Result<Vec<_>>>()?;
        let schema = TableSchema::new(fields);
        let column_types: Vec<ColumnType> =
            schema.fields().iter().map(|f| f.column_type).collect();

        let reader = builder.with_batch_size(self.batch_size).build()?;
        let mut table = Table::new(schema);

        for batch in reader {
            let batch = batch?;
            let mut columns = batch
                .columns()
                .iter()
                .zip(&column_types)
                .map(|(array, column_type)| column_values(array, *column_type))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .map(|values| values.into_iter())
                .collect::<Vec<_>>();

            for _ in 0..batch.num_rows() {
                let row = columns
                    .iter_mut()
                    .map(|column| column.next().unwrap_or(Value::Null))
                    .collect();
                table.push_row(row)?;
            }
        }

        debug!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.schema().len(),
            "Loaded columnar file"
        );
        Ok(table)
    }
}

impl Default for ColumnarReader {
    fn default() -> Self {
        Self::new()
    }
}

fn column_type_of(name: &str, data_type: &DataType) -> Result<ColumnType> {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Ok(ColumnType::Utf8),
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => Ok(ColumnType::Int64),
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => Ok(ColumnType::Float64),
        DataType::Date32 | DataType::Date64 => Ok(ColumnType::Date),
        other => Err(ProcessingError::InvalidFormat(format!(
            "Unsupported type {} for column '{}'",
            other, name
        ))),
    }
}

fn column_values(array: &ArrayRef, column_type: ColumnType) -> Result<Vec<Value>> {
    let values = match column_type {
        ColumnType::Utf8 => {
            let converted = cast(array, &DataType::Utf8)?;
            downcast::<StringArray>(&converted)?
                .iter()
                .map(|v| v.map_or(Value::Null, |s| Value::Str(s.to_string())))
                .collect()
        }
        ColumnType::Int64 => {
            let converted = cast(array, &DataType::Int64)?;
            downcast::<Int64Array>(&converted)?
                .iter()
                .map(|v| v.map_or(Value::Null, Value::Int))
                .collect()
        }
        ColumnType::Float64 => {
            let converted = cast(array, &DataType::Float64)?;
            downcast::<Float64Array>(&converted)?
                .iter()
                .map(|v| match v {
                    Some(f) if !f.is_nan() => Value::Float(f),
                    _ => Value::Null,
                })
                .collect()
        }
        ColumnType::Date => {
            let converted = cast(array, &DataType::Date32)?;
            downcast::<Date32Array>(&converted)?
                .iter()
                .map(|v| {
                    v.and_then(date_from_unix_days)
                        .map_or(Value::Null, Value::Date)
                })
                .collect()
        }
    };
    Ok(values)
}

fn downcast<T: Array + 'static>(array: &ArrayRef) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        ProcessingError::InvalidFormat(format!(
            "Unexpected array type {}",
            array.data_type()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int32Array;
    use arrow::datatypes::Schema;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn write_sample(path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            arrow::datatypes::Field::new("i94yr", DataType::Float64, true),
            arrow::datatypes::Field::new("i94port", DataType::Utf8, true),
            arrow::datatypes::Field::new("count", DataType::Int32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![Some(2016.0), Some(f64::NAN), None])) as ArrayRef,
                Arc::new(StringArray::from(vec![Some("NYC"), None, Some("LOS")])) as ArrayRef,
                Arc::new(Int32Array::from(vec![Some(1), Some(2), None])) as ArrayRef,
            ],
        )?;
        let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }

    #[test]
    fn test_read_parquet_into_table() -> Result<()> {
        let file = NamedTempFile::new()?;
        write_sample(file.path())?;

        let table = ColumnarReader::new().with_batch_size(2).read_table(file.path())?;
        assert_eq!(table.num_rows(), 3);
        assert_eq!(
            table.schema().field("count").map(|f| f.column_type),
            Some(ColumnType::Int64)
        );
        assert_eq!(table.rows()[0][0], Value::Float(2016.0));
        assert!(table.rows()[1][0].is_null(), "NaN loads as null");
        assert_eq!(table.rows()[2][1], Value::from("LOS"));
        assert!(table.rows()[2][2].is_null());
        Ok(())
    }

    #[test]
    fn test_missing_parquet_file() {
        let result = ColumnarReader::new().read_table(Path::new("/no/such/i94_jan16_sub.parquet"));
        assert!(matches!(result, Err(ProcessingError::MissingInput { .. })));
    }
}
