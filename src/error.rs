use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodeFenceError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to read response input: {source_name}")]
    InputUnreadable {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No file blocks found in response")]
    NoFilesFound,

    #[error("Project directory does not exist: {path}")]
    ProjectMissing { path: String },

    #[error("Project path is not a directory: {path}")]
    ProjectNotDirectory { path: String },

    #[error("No project directory configured")]
    ProjectNotConfigured,

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for CodeFenceError {
    fn user_message(&self) -> String {
        match self {
            CodeFenceError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            CodeFenceError::InputUnreadable { source_name, source } => {
                format!("Could not read response from {}: {}", source_name, source)
            }
            CodeFenceError::NoFilesFound => {
                "The response contains no **File: `path`** blocks".to_string()
            }
            CodeFenceError::ProjectMissing { path } => {
                format!("Project directory does not exist: {}", path)
            }
            CodeFenceError::ProjectNotDirectory { path } => {
                format!("Project path exists but is not a directory: {}", path)
            }
            CodeFenceError::ProjectNotConfigured => {
                "No project directory configured".to_string()
            }
            CodeFenceError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            CodeFenceError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            CodeFenceError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config."
                    .to_string(),
            ),
            CodeFenceError::NoFilesFound => Some(
                "Ask the model to format files as **File: `path`** followed by a fenced code block (see --print-instructions).".to_string()
            ),
            CodeFenceError::ProjectMissing { .. } => Some(
                "Create the directory first, or pass --create-project to create it automatically."
                    .to_string(),
            ),
            CodeFenceError::ProjectNotConfigured => Some(
                "Pass --project <DIR> or set [project] folder in your configuration file."
                    .to_string(),
            ),
            CodeFenceError::Permission { .. } => Some(
                "Ensure you have the necessary read/write permissions for the target directory."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for CodeFenceError {
    fn from(error: toml::de::Error) -> Self {
        CodeFenceError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodeFenceError>;
