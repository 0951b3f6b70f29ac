pub mod columnar_reader;
pub mod delimited_reader;

pub use columnar_reader::ColumnarReader;
pub use delimited_reader::DelimitedReader;
