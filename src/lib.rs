pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod prompt;
pub mod ui;
pub mod writer;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, OutputConfig, ProjectConfig, WriteConfig};
pub use error::{CodeFenceError, Result, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{extract_files, summarize, ExtractionSummary, FileRecord};
pub use prompt::format_instructions;
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressAwareOutput, ProgressManager};
pub use writer::{
    FileWriter, StatusLevel, StatusLine, StatusSink, WriteEntry, WriteOutcome, WritePolicy,
    WriteReport,
};

use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Application driver: turns a model response into files in the project.
pub struct CodeFence {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl CodeFence {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// Create a CodeFence instance for testing (no signal handler conflicts)
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(
            config,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::new_for_test(),
        )
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    /// Create CodeFence instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = Cli::output_mode(&config);

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Extract file blocks, treating a response without any as an error.
    pub fn extract_from_text(&self, response: &str) -> Result<Vec<FileRecord>> {
        let files = extract_files(response);
        if files.is_empty() {
            return Err(CodeFenceError::NoFilesFound);
        }

        self.output_formatter
            .debug(&summarize(&files).display_summary());
        Ok(files)
    }

    pub fn dry_run_plan(&self, response: &str) -> Result<(Vec<FileRecord>, ExtractionSummary)> {
        let files = self.extract_from_text(response)?;
        let summary = summarize(&files);
        Ok((files, summary))
    }

    /// Extract and write in one step.
    pub fn run(&self, response: &str) -> Result<WriteReport> {
        self.shutdown.check_shutdown()?;
        let files = self.extract_from_text(response)?;
        self.apply(&files)
    }

    /// Write records into the project directory, one at a time.
    ///
    /// Ctrl+C is honoured between records: the remaining records are not
    /// attempted and the report is marked cancelled.
    pub fn apply(&self, files: &[FileRecord]) -> Result<WriteReport> {
        let project = self.prepare_project()?;
        let writer = FileWriter::new(&project, self.config.write_policy());

        self.output_formatter.start_operation(&format!(
            "Writing {} file(s) to {}",
            files.len(),
            writer.base_directory().display()
        ));

        let progress = self.progress_manager.create_write_progress(files.len() as u64);
        let sink = ProgressAwareOutput::new(&self.output_formatter, Some(&self.progress_manager));
        let mut report = WriteReport::new(writer.base_directory().to_path_buf());

        for file in files {
            if !self.shutdown.is_running() {
                info!(remaining = files.len() - report.entries.len(), "write batch cancelled");
                report.mark_cancelled();
                break;
            }

            let entry = writer.write_one(file);
            sink.emit(&entry.status_line());
            ui::progress::update_write_progress(&progress, &entry);
            report.record(entry);
        }

        if !report.cancelled {
            report.finish();
        }

        ui::progress::finish_progress_with_summary(&progress, &report.display_summary());
        Ok(report)
    }

    /// Resolve the configured project directory, creating it when allowed.
    pub fn prepare_project(&self) -> Result<PathBuf> {
        let folder = self
            .config
            .project
            .folder
            .as_ref()
            .ok_or(CodeFenceError::ProjectNotConfigured)?;

        if folder.exists() {
            if !folder.is_dir() {
                return Err(CodeFenceError::ProjectNotDirectory {
                    path: folder.display().to_string(),
                });
            }
            return Ok(folder.clone());
        }

        if !self.config.project.create_if_missing {
            return Err(CodeFenceError::ProjectMissing {
                path: folder.display().to_string(),
            });
        }

        std::fs::create_dir_all(folder).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => CodeFenceError::Permission {
                path: folder.display().to_string(),
            },
            _ => CodeFenceError::Io(e),
        })?;
        debug!(path = %folder.display(), "created project directory");
        self.output_formatter
            .info(&format!("Created project directory: {}", folder.display()));

        Ok(folder.clone())
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Request graceful shutdown
    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &CodeFenceError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}
