pub mod block_parser;

pub use block_parser::{extract_files, summarize, ExtractionSummary, FileRecord, DEFAULT_LANGUAGE};
