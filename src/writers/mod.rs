pub mod parquet_writer;

pub use parquet_writer::{
    escape_partition_value, ParquetWriter, PartitionSetInfo, PartitionedRecord, WriteSummary,
};
