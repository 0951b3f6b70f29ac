use crate::error::Result;
use crate::models::Dataset;
use crate::publish::RemoteSync;
use crate::settings::PipelineConfig;
use crate::utils::constants::DESCRIPTION_EXCLUDE;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// One directory pushed to the remote store.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedFolder {
    pub key: String,
    pub local: PathBuf,
    pub remote: String,
}

/// Pushes the staging area to the remote store, one folder at a time.
pub struct Publisher<'a> {
    config: &'a PipelineConfig,
    sync: Box<dyn RemoteSync + 'a>,
}

impl<'a> Publisher<'a> {
    pub fn new(config: &'a PipelineConfig, sync: Box<dyn RemoteSync + 'a>) -> Self {
        Self { config, sync }
    }

    /// Sync the description folder, then every dataset folder. The first
    /// failing sync aborts the rest.
    pub fn publish_all(&self) -> Result<Vec<PublishedFolder>> {
        let start = Instant::now();
        let mut published = Vec::with_capacity(Dataset::PUBLISH_ORDER.len() + 1);

        published.push(self.publish_folder(
            &self.config.s3.desc_key,
            self.config.description_dir(),
            &[DESCRIPTION_EXCLUDE.to_string()],
        )?);
        info!("Immigration description data: json files uploaded");

        for dataset in Dataset::PUBLISH_ORDER {
            published.push(self.publish_dataset(dataset)?);
        }

        info!(
            folders = published.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Publishing finished"
        );
        Ok(published)
    }

    pub fn publish_dataset(&self, dataset: Dataset) -> Result<PublishedFolder> {
        let folder = self.publish_folder(
            self.config.dataset_key(dataset),
            self.config.output_dir(dataset),
            &[],
        )?;
        info!(dataset = %dataset, remote = %folder.remote, "Dataset uploaded");
        Ok(folder)
    }

    fn publish_folder(&self, key: &str, local: PathBuf, exclude: &[String]) -> Result<PublishedFolder> {
        let remote = self.config.remote_path(key);
        self.sync.sync(&local, &remote, exclude, true)?;
        Ok(PublishedFolder {
            key: key.to_string(),
            local,
            remote,
        })
    }
}
