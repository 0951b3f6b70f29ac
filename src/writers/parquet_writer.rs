use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_PARTITION_NAME, DEFAULT_ROW_GROUP_SIZE, PART_FILE_NAME, SUCCESS_MARKER,
};
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// A typed record that can be persisted as a partitioned Parquet dataset.
///
/// The partition column is encoded in the directory name only, so
/// [`file_schema`](PartitionedRecord::file_schema) must not contain it.
pub trait PartitionedRecord: Sized {
    const PARTITION_COLUMN: &'static str;

    fn partition_value(&self) -> Option<String>;

    fn file_schema() -> Arc<Schema>;

    fn to_batch(records: &[&Self], schema: Arc<Schema>) -> Result<RecordBatch>;
}

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Replace the dataset under `dir` with `records`, one directory per
    /// distinct partition value (`<column>=<value>/part-00000.parquet`).
    ///
    /// Partitions are written in sorted order and rows keep their input order
    /// within a partition, so identical input yields identical bytes.
    pub fn write_partitioned<T: PartitionedRecord>(
        &self,
        records: &[T],
        dir: &Path,
    ) -> Result<WriteSummary> {
        if dir.exists() {
            fs::remove_dir_all(dir)?;
        }
        fs::create_dir_all(dir)?;

        let mut partitions: BTreeMap<String, Vec<&T>> = BTreeMap::new();
        for record in records {
            let name = record
                .partition_value()
                .map(|v| escape_partition_value(&v))
                .unwrap_or_else(|| DEFAULT_PARTITION_NAME.to_string());
            partitions.entry(name).or_default().push(record);
        }

        let schema = T::file_schema();
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        for (name, partition_records) in &partitions {
            let partition_dir = dir.join(format!("{}={}", T::PARTITION_COLUMN, name));
            fs::create_dir_all(&partition_dir)?;

            let file = File::create(partition_dir.join(PART_FILE_NAME))?;
            let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props.clone()))?;
            for chunk in partition_records.chunks(self.row_group_size.max(1)) {
                let batch = T::to_batch(chunk, schema.clone())?;
                writer.write(&batch)?;
            }
            writer.close()?;

            debug!(
                partition = %name,
                rows = partition_records.len(),
                "Wrote partition"
            );
        }

        File::create(dir.join(SUCCESS_MARKER))?;

        Ok(WriteSummary {
            output_dir: dir.to_path_buf(),
            rows_written: records.len(),
            partitions: partitions.len(),
        })
    }

    /// Summarise a partitioned dataset directory.
    pub fn inspect(&self, dir: &Path) -> Result<PartitionSetInfo> {
        if !dir.is_dir() {
            return Err(ProcessingError::MissingInput {
                path: dir.to_path_buf(),
            });
        }

        let mut info = PartitionSetInfo {
            partition_values: Vec::new(),
            files: 0,
            total_rows: 0,
            total_bytes: 0,
        };

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| ProcessingError::InvalidFormat(e.to_string()))?;
            let path = entry.path();

            if entry.file_type().is_dir() && entry.depth() == 1 {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if let Some((_, value)) = name.split_once('=') {
                        info.partition_values.push(value.to_string());
                    }
                }
                continue;
            }

            if path.extension().map_or(true, |ext| ext != "parquet") {
                continue;
            }

            let reader = SerializedFileReader::new(File::open(path)?)?;
            info.files += 1;
            info.total_rows += reader.metadata().file_metadata().num_rows();
            info.total_bytes += entry
                .metadata()
                .map_err(|e| ProcessingError::InvalidFormat(e.to_string()))?
                .len();
        }

        Ok(info)
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a partition value for use as a directory name, Hive style.
pub fn escape_partition_value(value: &str) -> String {
    if value.is_empty() {
        return DEFAULT_PARTITION_NAME.to_string();
    }

    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        let reserved = c.is_control()
            || matches!(
                c,
                '"' | '#' | '%' | '\'' | '*' | '/' | ':' | '=' | '?' | '\\' | '{' | '[' | ']' | '^'
            );
        if reserved {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("%{:02X}", byte));
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub output_dir: PathBuf,
    pub rows_written: usize,
    pub partitions: usize,
}

#[derive(Debug, Clone)]
pub struct PartitionSetInfo {
    pub partition_values: Vec<String>,
    pub files: usize,
    pub total_rows: i64,
    pub total_bytes: u64,
}

impl PartitionSetInfo {
    pub fn summary(&self) -> String {
        format!(
            "Partitioned Dataset Summary:\n\
            - Partitions: {}\n\
            - Files: {}\n\
            - Total rows: {}\n\
            - Size: {:.2} MB\n\
            - Avg rows per partition: {:.0}",
            self.partition_values.len(),
            self.files,
            self.total_rows,
            self.total_bytes as f64 / 1_048_576.0,
            self.total_rows as f64 / self.partition_values.len().max(1) as f64
        )
    }
}
