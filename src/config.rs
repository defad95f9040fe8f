use crate::error::{CodeFenceError, Result};
use crate::writer::WritePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const OUTPUT_FORMATS: &[&str] = &["human", "json", "plain"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub write: WriteConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory extracted files are written into.
    pub folder: Option<PathBuf>,
    pub create_if_missing: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WriteConfig {
    pub overwrite: bool,
    pub strict_containment: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub show_summary: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        let policy = WritePolicy::default();
        Self {
            overwrite: policy.overwrite,
            strict_containment: policy.strict_containment,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            show_summary: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(CodeFenceError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CodeFenceError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| CodeFenceError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        for candidate in Self::default_locations() {
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "loading configuration");
                return Self::load_from_file(candidate);
            }
        }

        Ok(Self::default())
    }

    /// Local files first, then the per-user config directory.
    pub fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![
            PathBuf::from("codefence.toml"),
            PathBuf::from(".codefence.toml"),
        ];

        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join("codefence").join("config.toml"));
        }

        locations
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref folder) = cli_args.project_folder {
            self.project.folder = Some(folder.clone());
        }

        if let Some(create) = cli_args.create_project {
            self.project.create_if_missing = create;
        }

        if let Some(overwrite) = cli_args.overwrite {
            self.write.overwrite = overwrite;
        }

        if let Some(strict) = cli_args.strict_containment {
            self.write.strict_containment = strict;
        }

        if let Some(ref format) = cli_args.output_format {
            self.output.format = format.to_lowercase();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| CodeFenceError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| CodeFenceError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(CodeFenceError::Config {
                message: format!(
                    "Unknown output format '{}' (expected one of: {})",
                    self.output.format,
                    OUTPUT_FORMATS.join(", ")
                ),
            });
        }

        if let Some(ref folder) = self.project.folder {
            if folder.as_os_str().is_empty() {
                return Err(CodeFenceError::Config {
                    message: "Project folder must not be empty".to_string(),
                });
            }

            if folder.exists() && !folder.is_dir() {
                return Err(CodeFenceError::ProjectNotDirectory {
                    path: folder.display().to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn write_policy(&self) -> WritePolicy {
        WritePolicy::new()
            .with_overwrite(self.write.overwrite)
            .with_strict_containment(self.write.strict_containment)
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.project.folder = Some(PathBuf::from("./my-project"));
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub project_folder: Option<PathBuf>,
    pub create_project: Option<bool>,
    pub overwrite: Option<bool>,
    pub strict_containment: Option<bool>,
    pub output_format: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_folder(mut self, folder: Option<PathBuf>) -> Self {
        self.project_folder = folder;
        self
    }

    pub fn with_create_project(mut self, create: Option<bool>) -> Self {
        self.create_project = create;
        self
    }

    pub fn with_overwrite(mut self, overwrite: Option<bool>) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_strict_containment(mut self, strict: Option<bool>) -> Self {
        self.strict_containment = strict;
        self
    }

    pub fn with_output_format(mut self, format: Option<String>) -> Self {
        self.output_format = format;
        self
    }
}
