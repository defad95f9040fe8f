use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Language tag used when a fence opener carries none.
pub const DEFAULT_LANGUAGE: &str = "text";

// **File: `path`** + fence opener with optional tag + lazy body + closing fence
static FILE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\*\*File:\s*`([^`]+)`\*\*\s*\n```(\w+)?\n(.*?)\n```")
        .expect("file block pattern is valid")
});

/// A file the model asked to create, as found in its response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    /// `None` means the record carries no body at all, which is not the same
    /// as an empty file.
    pub content: Option<String>,
    pub language: String,
}

impl FileRecord {
    pub fn new<P, C, L>(path: P, content: C, language: L) -> Self
    where
        P: Into<String>,
        C: Into<String>,
        L: Into<String>,
    {
        Self {
            path: path.into(),
            content: Some(content.into()),
            language: language.into(),
        }
    }

    pub fn without_content<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            content: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn content_len(&self) -> usize {
        self.content.as_ref().map(|c| c.len()).unwrap_or(0)
    }
}

/// Scan a complete response for file blocks.
///
/// Blocks are returned in document order. When a path occurs more than once
/// only the first block is kept. Text that does not form a complete
/// marker + fence pair is ignored, so this never fails.
pub fn extract_files(response: &str) -> Vec<FileRecord> {
    let mut files = Vec::new();
    let mut seen_paths = HashSet::new();

    for captures in FILE_BLOCK.captures_iter(response) {
        let path = captures
            .get(1)
            .map(|m| m.as_str().trim())
            .unwrap_or_default();
        let language = captures
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or(DEFAULT_LANGUAGE);
        let body = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

        if !seen_paths.insert(path.to_string()) {
            debug!(path, "dropping duplicate file block");
            continue;
        }

        files.push(FileRecord::new(path, trim_body(body), language));
    }

    debug!(count = files.len(), "extracted file blocks");
    files
}

// Leading blank lines go, trailing whitespace goes; indentation of the
// first real line stays.
fn trim_body(body: &str) -> String {
    let mut start = 0;
    for line in body.split_inclusive('\n') {
        if line.trim().is_empty() {
            start += line.len();
        } else {
            break;
        }
    }

    body[start..].trim_end().to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total_files: usize,
    pub total_bytes: u64,
    pub files_by_language: BTreeMap<String, usize>,
}

impl ExtractionSummary {
    pub fn display_summary(&self) -> String {
        let languages: Vec<String> = self
            .files_by_language
            .iter()
            .map(|(lang, count)| format!("{}: {}", lang, count))
            .collect();

        format!(
            "{} file block(s), {} bytes ({})",
            self.total_files,
            self.total_bytes,
            languages.join(", ")
        )
    }
}

pub fn summarize(files: &[FileRecord]) -> ExtractionSummary {
    let mut summary = ExtractionSummary::default();

    for file in files {
        summary.total_files += 1;
        summary.total_bytes += file.content_len() as u64;
        *summary
            .files_by_language
            .entry(file.language.clone())
            .or_insert(0) += 1;
    }

    summary
}
