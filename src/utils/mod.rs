pub mod constants;
pub mod dates;
pub mod progress;

pub use constants::*;
pub use dates::{date_from_unix_days, days_since_unix_epoch, sas_offset_to_date};
pub use progress::ProgressReporter;
