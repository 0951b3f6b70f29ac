//! Pipeline configuration.
//!
//! Everything the processors and the publisher need is read once from an
//! INI file (sections `AWS`, `S3`, `LOCAL` and optional `PROCESSING`), may be
//! overridden from `I94ETL__<SECTION>__<KEY>` environment variables, and is
//! then handed around by reference as a [`PipelineConfig`].

use crate::error::{ProcessingError, Result};
use crate::models::Dataset;
use crate::utils::constants::{
    COMPRESSION_SNAPPY, DEFAULT_IMMIGRATION_EXTENSION, DEFAULT_IMMIGRATION_YEAR,
    DEFAULT_ROW_GROUP_SIZE, ENV_PREFIX, S3_SCHEME,
};
use ::config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PipelineConfig {
    #[serde(alias = "AWS")]
    #[validate(nested)]
    pub aws: AwsCredentials,

    #[serde(alias = "S3")]
    #[validate(nested)]
    pub s3: RemoteConfig,

    #[serde(alias = "LOCAL")]
    pub local: LocalPaths,

    #[serde(alias = "PROCESSING", default)]
    #[validate(nested)]
    pub processing: ProcessingOptions,
}

#[derive(Clone, Deserialize, Validate)]
pub struct AwsCredentials {
    #[serde(alias = "AWS_ACCESS_KEY_ID")]
    #[validate(length(min = 1))]
    pub aws_access_key_id: String,

    #[serde(alias = "AWS_SECRET_ACCESS_KEY")]
    #[validate(length(min = 1))]
    pub aws_secret_access_key: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Destination bucket and the per-dataset folder names inside it.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RemoteConfig {
    #[serde(alias = "DEST_BUCKET")]
    #[validate(length(min = 1))]
    pub dest_bucket: String,

    #[serde(alias = "IMM_KEY")]
    #[validate(length(min = 1))]
    pub imm_key: String,

    #[serde(alias = "DESC_KEY")]
    #[validate(length(min = 1))]
    pub desc_key: String,

    #[serde(alias = "TEMPERATURE_KEY")]
    #[validate(length(min = 1))]
    pub temperature_key: String,

    #[serde(alias = "DEMOGRAPHICS_KEY")]
    #[validate(length(min = 1))]
    pub demographics_key: String,

    #[serde(alias = "AIRPORT_KEY")]
    #[validate(length(min = 1))]
    pub airport_key: String,
}

/// Raw input locations and the local staging root.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalPaths {
    #[serde(alias = "IMM_FOLDER_LOC")]
    pub imm_folder_loc: PathBuf,

    #[serde(alias = "AIRPORT_FILE_LOC")]
    pub airport_file_loc: PathBuf,

    #[serde(alias = "DEMOGRAPHICS_FILE_LOC")]
    pub demographics_file_loc: PathBuf,

    #[serde(alias = "TEMPERATURE_FILE_LOC")]
    pub temperature_file_loc: PathBuf,

    #[serde(alias = "LOCAL_KEY")]
    pub local_key: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProcessingOptions {
    #[serde(alias = "COMPRESSION", default = "default_compression")]
    pub compression: String,

    #[serde(alias = "ROW_GROUP_SIZE", default = "default_row_group_size")]
    #[validate(range(min = 1))]
    pub row_group_size: usize,

    #[serde(alias = "IMM_YEAR", default = "default_imm_year")]
    #[validate(range(min = 1900, max = 2099))]
    pub imm_year: i32,

    #[serde(alias = "IMM_FILE_EXTENSION", default = "default_imm_extension")]
    #[validate(length(min = 1))]
    pub imm_file_extension: String,
}

fn default_compression() -> String {
    COMPRESSION_SNAPPY.to_string()
}

fn default_row_group_size() -> usize {
    DEFAULT_ROW_GROUP_SIZE
}

fn default_imm_year() -> i32 {
    DEFAULT_IMMIGRATION_YEAR
}

fn default_imm_extension() -> String {
    DEFAULT_IMMIGRATION_EXTENSION.to_string()
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            compression: default_compression(),
            row_group_size: default_row_group_size(),
            imm_year: default_imm_year(),
            imm_file_extension: default_imm_extension(),
        }
    }
}

impl PipelineConfig {
    /// Load from an INI file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ProcessingError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let path_str = path.to_str().ok_or_else(|| {
            ProcessingError::Config(format!("Non UTF-8 config path: {}", path.display()))
        })?;

        let file = Config::builder()
            .add_source(File::new(path_str, FileFormat::Ini))
            .build()?;

        // INI keys keep their case while environment keys arrive lowercased
        let sections: HashMap<String, HashMap<String, String>> = file.try_deserialize()?;
        let mut builder = Config::builder();
        for (section, entries) in sections {
            for (key, value) in entries {
                let key = format!("{}.{}", section.to_lowercase(), key.to_lowercase());
                builder = builder.set_default(key, value)?;
            }
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Synthetic configuration rooted at `root`: raw data under `root/raw`,
    /// staging under `root/staging`. Remote settings are placeholders.
    pub fn with_local_root(root: &Path) -> Self {
        let raw = root.join("raw");
        Self {
            aws: AwsCredentials {
                aws_access_key_id: "local".to_string(),
                aws_secret_access_key: "local".to_string(),
            },
            s3: RemoteConfig {
                dest_bucket: "local-bucket".to_string(),
                imm_key: "immigration".to_string(),
                desc_key: "immigration_description".to_string(),
                temperature_key: "temperature".to_string(),
                demographics_key: "demographics".to_string(),
                airport_key: "airport".to_string(),
            },
            local: LocalPaths {
                imm_folder_loc: raw.join("i94"),
                airport_file_loc: raw.join("airport-codes_csv.csv"),
                demographics_file_loc: raw.join("us-cities-demographics.csv"),
                temperature_file_loc: raw.join("GlobalLandTemperaturesByCity.csv"),
                local_key: root.join("staging"),
            },
            processing: ProcessingOptions::default(),
        }
    }

    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.local.local_key.as_os_str().is_empty() {
            return Err(ProcessingError::Config(
                "LOCAL_KEY must name a staging directory".to_string(),
            ));
        }
        Ok(())
    }

    /// Folder name of `dataset`, identical locally and remotely.
    pub fn dataset_key(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::Immigration => &self.s3.imm_key,
            Dataset::Temperature => &self.s3.temperature_key,
            Dataset::Airport => &self.s3.airport_key,
            Dataset::Demographics => &self.s3.demographics_key,
        }
    }

    pub fn output_dir(&self, dataset: Dataset) -> PathBuf {
        self.local.local_key.join(self.dataset_key(dataset))
    }

    pub fn description_dir(&self) -> PathBuf {
        self.local.local_key.join(&self.s3.desc_key)
    }

    /// Remote destination of a dataset folder, e.g. `s3://bucket/immigration`.
    pub fn remote_path(&self, key: &str) -> String {
        let bucket = self.s3.dest_bucket.trim_end_matches('/');
        if bucket.contains("://") {
            format!("{}/{}", bucket, key)
        } else {
            format!("{}{}/{}", S3_SCHEME, bucket, key)
        }
    }

    /// Path of one monthly immigration file, e.g. `i94_jan16_sub.parquet`.
    pub fn immigration_file(&self, month: &str) -> PathBuf {
        let file_name = format!(
            "i94_{}{:02}_sub.{}",
            month,
            self.processing.imm_year.rem_euclid(100),
            self.processing.imm_file_extension
        );
        self.local.imm_folder_loc.join(file_name)
    }
}
