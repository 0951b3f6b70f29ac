pub mod airport;
pub mod dataset;
pub mod demographics;
pub mod immigration;
pub mod table;
pub mod temperature;

pub use airport::AirportRecord;
pub use dataset::Dataset;
pub use demographics::DemographicsRecord;
pub use immigration::ImmigrationRecord;
pub use table::{ColumnType, Field, Row, RowView, Table, TableSchema, Value};
pub use temperature::TemperatureObservation;
