use crate::error::{ProcessingError, Result};
use crate::models::{Table, TableSchema, Value};
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use encoding_rs::WINDOWS_1252;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Reads a delimited text file with a header row into a [`Table`].
///
/// Every cell is loaded as text; empty cells become nulls. Typing is left to
/// the processors so that coercion failures surface where the column is used.
pub struct DelimitedReader {
    delimiter: u8,
}

impl DelimitedReader {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn read_table(&self, path: &Path) -> Result<Table> {
        if !path.is_file() {
            return Err(ProcessingError::MissingInput {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let table = self.read_from(reader)?;

        debug!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.schema().len(),
            "Loaded delimited file"
        );
        Ok(table)
    }

    pub fn read_from<R: Read>(&self, reader: R) -> Result<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .byte_headers()?
            .iter()
            .map(|h| decode_field(h).trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        let mut table = Table::new(TableSchema::utf8(&headers));

        for record in csv_reader.byte_records() {
            let record = record?;
            let row = record
                .iter()
                .map(|field| {
                    let text = decode_field(field);
                    if text.is_empty() {
                        Value::Null
                    } else {
                        Value::Str(text)
                    }
                })
                .collect();
            table.push_row(row)?;
        }

        Ok(table)
    }
}

/// Decode one cell as UTF-8, falling back to Windows-1252 for legacy exports.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => WINDOWS_1252.decode(bytes).0.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_semicolon_file_with_nulls() -> Result<()> {
        let data = "City;State;Median Age;Race\nSilver Spring;Maryland;33.8;Hispanic or Latino\nQuincy;Massachusetts;;White\n";
        let table = DelimitedReader::new(b';').read_from(data.as_bytes())?;

        assert_eq!(
            table.schema().names(),
            vec!["City", "State", "Median Age", "Race"]
        );
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.rows()[0][2], Value::from("33.8"));
        assert!(table.rows()[1][2].is_null());
        Ok(())
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() -> Result<()> {
        let data = "ident,coordinates\n00A,\"-74.93360137939453, 40.07080078125\"\n";
        let table = DelimitedReader::new(b',').read_from(data.as_bytes())?;
        assert_eq!(
            table.rows()[0][1],
            Value::from("-74.93360137939453, 40.07080078125")
        );
        Ok(())
    }

    #[test]
    fn test_windows_1252_fallback() -> Result<()> {
        let mut data = b"City,Country\n".to_vec();
        data.extend_from_slice(b"\xc5rhus,Denmark\n");
        let table = DelimitedReader::new(b',').read_from(data.as_slice())?;
        assert_eq!(table.rows()[0][0], Value::from("Århus"));
        Ok(())
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let data = "a,b\n1,2,3\n";
        assert!(DelimitedReader::new(b',').read_from(data.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = DelimitedReader::new(b',').read_table(Path::new("/no/such/file.csv"));
        assert!(matches!(result, Err(ProcessingError::MissingInput { .. })));
    }

    #[test]
    fn test_read_table_from_disk() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "dt,AverageTemperature,City")?;
        writeln!(file, "2000-01-01,5.2,Boston")?;
        let table = DelimitedReader::new(b',').read_table(file.path())?;
        assert_eq!(table.num_rows(), 1);
        Ok(())
    }
}
