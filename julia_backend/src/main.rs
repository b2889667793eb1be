use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use julia_backend::driver::{self, DriverConfig};
use tracing::{error, info};

/// Translate Python-like source files to Julia.
#[derive(Parser, Debug)]
#[command(name = "pyjl", version, about)]
struct Cli {
    /// Source files or directories of `.py` files
    #[arg(default_value = "test")]
    paths: Vec<PathBuf>,

    /// Write translations here instead of beside the inputs
    #[arg(short, long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Extension of the written files
    #[arg(short, long, default_value = "jl")]
    extension: String,

    /// Print translations instead of writing files
    #[arg(long)]
    stdout: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Less logging (-q errors only, -qq nothing)
    #[arg(short, long, action = clap::ArgAction::Count)]
    quiet: u8,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (1, _) => "debug",
            (_, 0) => "trace",
            (_, 1) => "error",
            _ => "off",
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    let config = DriverConfig {
        inputs: cli.paths,
        out_dir: cli.out_dir,
        extension: cli.extension,
        to_stdout: cli.stdout,
    };
    let report = driver::run(&config);
    info!(translated = report.translated, failed = report.failed, "done");

    if report.success() {
        ExitCode::SUCCESS
    } else {
        error!("{} unit(s) failed to translate", report.failed);
        ExitCode::FAILURE
    }
}
