use crate::config::{CliOverrides, Config};
use crate::error::{CodeFenceError, Result};
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "codefence")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Write the files a language model put in its reply into your project")]
#[command(
    long_about = "codefence reads a complete model response, finds every **File: `path`** \
                  block followed by a fenced code block, and writes those files into a \
                  project directory. Each file is handled independently; one failure never \
                  stops the rest of the batch."
)]
#[command(after_help = "EXAMPLES:\n  \
    codefence reply.md --project ./my-app\n  \
    pbpaste | codefence --project ./my-app --strict\n  \
    codefence reply.md --dry-run --output-format json\n  \
    codefence --print-instructions --project ./my-app")]
pub struct Cli {
    /// File containing the model response (reads stdin when omitted or "-")
    pub input: Option<PathBuf>,

    /// Project directory files are written into
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Skip files that already exist instead of replacing them
    #[arg(long)]
    pub no_overwrite: bool,

    /// Reject paths that resolve outside the project directory
    #[arg(long)]
    pub strict: bool,

    /// Create the project directory if it does not exist
    #[arg(long)]
    pub create_project: bool,

    /// List the files that would be written without touching the disk
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,

    /// Print the formatting instructions to give the model
    #[arg(long)]
    pub print_instructions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Human => "human",
            OutputFormat::Json => "json",
            OutputFormat::Plain => "plain",
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        // Boolean flags only ever tighten or enable; absent flags defer to config.
        CliOverrides::new()
            .with_project_folder(self.project.clone())
            .with_create_project(self.create_project.then_some(true))
            .with_overwrite(self.no_overwrite.then_some(false))
            .with_strict_containment(self.strict.then_some(true))
            .with_output_format(self.output_format.map(|f| f.as_str().to_string()))
    }

    pub fn reads_stdin(&self) -> bool {
        match self.input {
            None => true,
            Some(ref path) => path.as_os_str() == "-",
        }
    }

    pub fn input_name(&self) -> String {
        match self.input {
            Some(ref path) if !self.reads_stdin() => path.display().to_string(),
            _ => "stdin".to_string(),
        }
    }

    /// Read the complete response text the extractor will scan.
    pub fn read_input(&self) -> Result<String> {
        let mut text = String::new();

        let outcome = match self.input {
            Some(ref path) if !self.reads_stdin() => {
                std::fs::read_to_string(path).map(|content| text = content)
            }
            _ => std::io::stdin().read_to_string(&mut text).map(|_| ()),
        };

        outcome.map_err(|source| CodeFenceError::InputUnreadable {
            source_name: self.input_name(),
            source,
        })?;

        Ok(text)
    }

    pub fn output_mode(config: &Config) -> OutputMode {
        OutputMode::from_string(&config.output.format)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            // Level 1 is the default so info lines show without -v.
            self.verbose.saturating_add(1)
        }
    }
}
