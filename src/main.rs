//! Tabula - Run spreadsheet command scripts

use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use tabula::config::{self, Config, OutputMode};
use tabula::script;
use tabula_core::Sheet;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "TABULA_LOG";

fn print_usage() {
    eprintln!("Usage: tabula [OPTIONS] [SCRIPT]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [SCRIPT]                  Command script to run (default: stdin)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <MODE>       Final dump: values, texts or none (default: values)");
    eprintln!("  -c, --config <FILE>       Load settings from FILE instead of the user config");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Commands: set <CELL> <TEXT>, clear <CELL>, get <CELL>, text <CELL>,");
    eprintln!("          size, values, texts");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut script_path: Option<PathBuf> = None;
    let mut output: Option<OutputMode> = None;
    let mut config_file: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a mode");
                    std::process::exit(1);
                }
                match args[i].parse() {
                    Ok(mode) => output = Some(mode),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    }
                }
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with('-') && arg != "-" => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if script_path.is_none() {
                    script_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    let (mut config, warnings) = config::load_config(config_file.as_ref());
    init_logging(&config);
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    if let Some(mode) = output {
        config.output = mode;
    }

    match run(script_path, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Filter from `TABULA_LOG`, else the config, else warnings only.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .ok()
        .or_else(|| config.log.as_deref().and_then(|s| EnvFilter::try_new(s).ok()))
        .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Run the script and print the final dump. Returns whether every line
/// succeeded.
fn run(script_path: Option<PathBuf>, config: &Config) -> anyhow::Result<bool> {
    let mut sheet = Sheet::with_parse_options(config.parse_options());
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let errors = match script_path.as_ref().filter(|p| p.as_os_str() != "-") {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            script::run_script(&mut sheet, BufReader::new(file), &mut out)
        }
        None => script::run_script(&mut sheet, io::stdin().lock(), &mut out),
    }
    .context("Failed to run script")?;

    match config.output {
        OutputMode::Values => sheet.print_values(&mut out)?,
        OutputMode::Texts => sheet.print_texts(&mut out)?,
        OutputMode::None => {}
    }
    out.flush()?;

    for error in &errors {
        eprintln!("Error: {}", error);
    }
    Ok(errors.is_empty())
}
