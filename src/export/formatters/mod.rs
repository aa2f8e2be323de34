pub mod csv;
pub mod json;

pub use csv::{CsvConfig, CsvFormatter};
pub use json::JsonFormatter;
