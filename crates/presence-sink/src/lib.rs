pub mod csv_sink;
pub mod multi;

pub use csv_sink::{CsvSink, DEFAULT_CSV_PATH};
pub use multi::MultiSink;
