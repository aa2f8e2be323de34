pub mod formatter;
pub mod formatters;
pub mod sink;
pub mod task;

pub use formatter::Formatter;
pub use formatters::{CsvConfig, CsvFormatter, JsonFormatter};
pub use sink::{ExportSink, FileSink, MemorySink};
pub use task::ExportTask;
