//! Command-line interface implementation

mod format;
mod io;

pub use format::{format_output, OutputFormat};
pub use io::{read_input, write_output};

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use crate::config::{load_config, validate};
use crate::transformer::{TransformResult, Transformer};

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;

/// Transform HTML img tags to responsive picture elements or srcset attributes
#[derive(Parser, Debug)]
#[command(name = "responsify")]
#[command(version)]
#[command(after_help = "Examples:
  responsify --input index.html --config config.json --output result.html
  responsify --config config.json < input.html > output.html
  cat page.html | responsify --config config.json --format json")]
pub struct Cli {
    /// Input HTML file (stdin if omitted)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    /// Log processing details to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Run the CLI application
pub fn run() -> ExitCode {
    run_from(std::env::args_os())
}

/// Run with explicit arguments (the first one is the program name)
pub fn run_from<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version come through here too
            return if e.use_stderr() {
                ExitCode::from(EXIT_ERROR)
            } else {
                ExitCode::from(EXIT_SUCCESS)
            };
        }
    };

    init_logging(cli.verbose);
    execute(&cli)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

fn execute(cli: &Cli) -> ExitCode {
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: Could not read config file '{}': {}", cli.config.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let validation = validate(&config);
    if !validation.valid {
        eprintln!("Error: Invalid configuration");
        for error in validation.errors() {
            eprintln!("  - {}", error);
        }
        return ExitCode::from(EXIT_ERROR);
    }

    let html = match read_input(cli.input.as_deref()) {
        Ok(html) => html,
        Err(e) => {
            eprintln!("Error: Could not read input: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    info!("processing {} bytes of HTML", html.len());
    let result = Transformer::default().transform(&html, &config.transforms);

    let stats = match &result {
        TransformResult::Success { stats, .. } => stats,
        TransformResult::Failure { error, .. } => {
            eprintln!("Error: Transformation failed - {}", error);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    info!("images found: {}", stats.images_found);
    info!("images transformed: {}", stats.images_transformed);
    info!("rules applied: {}", stats.rules_applied);
    info!("processing time: {}ms", stats.processing_time_ms);

    let output = match format_output(&result, cli.format) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: Could not format output: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Err(e) = write_output(&output, cli.output.as_deref()) {
        eprintln!("Error: Could not write output: {}", e);
        return ExitCode::from(EXIT_ERROR);
    }

    ExitCode::from(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from([
            "responsify", "-i", "in.html", "--config", "c.json", "-f", "json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("in.html")));
        assert_eq!(cli.config, PathBuf::from("c.json"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_config_is_required() {
        assert!(Cli::try_parse_from(["responsify", "-i", "in.html"]).is_err());
        assert!(Cli::try_parse_from(["responsify", "-c", "c.json", "-f", "xml"]).is_err());
    }
}
