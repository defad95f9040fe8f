pub mod file_writer;
pub mod report;

pub use file_writer::{classify_io_error, resolve_path, FileWriter, WritePolicy};
pub use report::{
    CollectingSink, StatusLevel, StatusLine, StatusSink, WriteEntry, WriteOutcome, WriteReport,
};
