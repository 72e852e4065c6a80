pub mod sample_log;
pub mod writer;

pub use sample_log::CsvSampleLog;
pub use writer::run_log_writer;
