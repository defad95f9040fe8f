use clap::Parser;
use codefence::{
    format_instructions, Cli, CodeFence, CodeFenceError, Config, OutputFormatter, OutputMode,
    UserFriendlyError,
};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();
    setup_logging(&cli);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    if cli.print_instructions {
        return handle_print_instructions(&cli);
    }

    let codefence = match CodeFence::from_cli(&cli) {
        Ok(codefence) => codefence,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let response = match cli.read_input() {
        Ok(text) => text,
        Err(e) => {
            codefence.handle_error(&e);
            return exit_code_for(&e);
        }
    };
    tracing::debug!(source = %cli.input_name(), bytes = response.len(), "read response");

    if cli.dry_run {
        return handle_dry_run(&codefence, &response);
    }

    match codefence.run(&response) {
        Ok(report) => {
            if codefence.config().output.show_summary {
                codefence.output_formatter().print_write_report(&report);
            }

            if report.cancelled {
                130
            } else if report.has_failures() {
                2
            } else {
                0
            }
        }
        Err(e) => {
            codefence.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &CodeFenceError) -> i32 {
    match error {
        CodeFenceError::Cancelled => 130, // Interrupted (SIGINT)
        CodeFenceError::NoFilesFound => 3,
        CodeFenceError::ProjectMissing { .. } => 4,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "codefence.toml".to_string());

    match CodeFence::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  codefence reply.md --config {}", config_path);
            println!("\nEdit the file to point [project] folder at your project.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_print_instructions(cli: &Cli) -> i32 {
    // A broken config file should not stop us from printing the instructions.
    let folder = cli.project.clone().or_else(|| {
        Config::load_with_defaults(cli.config.as_ref())
            .ok()
            .and_then(|config| config.project.folder)
    });

    print!("{}", format_instructions(folder.as_deref()));
    0
}

fn handle_dry_run(codefence: &CodeFence, response: &str) -> i32 {
    let formatter = codefence.output_formatter();

    match codefence.dry_run_plan(response) {
        Ok((files, summary)) => {
            formatter.info("DRY RUN MODE - No files will be written");
            if let Some(ref folder) = codefence.config().project.folder {
                formatter.info(&format!("Project directory: {}", folder.display()));
            }
            formatter.print_dry_run(&files, &summary);
            0
        }
        Err(e) => {
            codefence.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn print_startup_error(error: &CodeFenceError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let level = match cli.verbose {
        _ if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("codefence={}", level)));

    // Diagnostics go to stderr; stdout carries the report.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
