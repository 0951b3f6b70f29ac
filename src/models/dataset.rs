use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four source datasets handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Immigration,
    Temperature,
    Airport,
    Demographics,
}

impl Dataset {
    /// Processing order: cheap flat files first so their checks fail fast,
    /// the twelve-file immigration union last.
    pub const PROCESSING_ORDER: [Dataset; 4] = [
        Dataset::Temperature,
        Dataset::Airport,
        Dataset::Demographics,
        Dataset::Immigration,
    ];

    /// Publishing order of the dataset directories.
    pub const PUBLISH_ORDER: [Dataset; 4] = [
        Dataset::Immigration,
        Dataset::Temperature,
        Dataset::Airport,
        Dataset::Demographics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Immigration => "immigration",
            Dataset::Temperature => "temperature",
            Dataset::Airport => "airport",
            Dataset::Demographics => "demographics",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
