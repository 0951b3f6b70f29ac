/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "aws.cfg";

/// Environment override prefix, e.g. `I94ETL__S3__DEST_BUCKET`
pub const ENV_PREFIX: &str = "I94ETL";

/// Immigration source files
pub const IMMIGRATION_MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];
pub const DEFAULT_IMMIGRATION_YEAR: i32 = 2016;
pub const DEFAULT_IMMIGRATION_EXTENSION: &str = "parquet";

/// I94 travel mode code for arrivals by air
pub const I94_MODE_AIR: i64 = 1;

/// Temperature observations older than this are discarded
pub const TEMPERATURE_CUTOFF: (i32, u32, u32) = (2000, 1, 1);
pub const TEMPERATURE_COUNTRY: &str = "United States";

/// Field delimiters of the flat source files
pub const TEMPERATURE_DELIMITER: u8 = b',';
pub const AIRPORT_DELIMITER: u8 = b',';
pub const DEMOGRAPHICS_DELIMITER: u8 = b';';

/// Partition columns of the persisted datasets
pub const IMMIGRATION_PARTITION: &str = "month";
pub const TEMPERATURE_PARTITION: &str = "city";
pub const AIRPORT_PARTITION: &str = "iso_country";
pub const DEMOGRAPHICS_PARTITION: &str = "state_code";

/// Output layout
pub const PART_FILE_NAME: &str = "part-00000.parquet";
pub const SUCCESS_MARKER: &str = "_SUCCESS";
pub const DEFAULT_PARTITION_NAME: &str = "__HIVE_DEFAULT_PARTITION__";

/// Publishing
pub const DESCRIPTION_EXCLUDE: &str = "*ipynb*";
pub const S3_SCHEME: &str = "s3://";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
