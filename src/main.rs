use std::path::PathBuf;
use std::process::ExitCode;

use lorenz_trail::{AttractorConfig, Simulation};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: lorenz-trail [settings.json]\n       lorenz-trail --write-default <path>";

enum Command {
    Run(Option<PathBuf>),
    WriteDefault(PathBuf),
    Help,
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    match args {
        [] => Ok(Command::Run(None)),
        [flag] if flag == "-h" || flag == "--help" => Ok(Command::Help),
        [flag, path] if flag == "--write-default" => Ok(Command::WriteDefault(PathBuf::from(path))),
        [flag] if flag == "--write-default" => Err("--write-default needs a path".to_string()),
        [path] if !path.starts_with('-') => Ok(Command::Run(Some(PathBuf::from(path)))),
        _ => Err(format!("unexpected arguments: {}", args.join(" "))),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    let config = match command {
        Command::Help => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Command::WriteDefault(path) => {
            return match AttractorConfig::default().save(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "wrote default settings");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    error!(path = %path.display(), %err, "could not write settings");
                    ExitCode::FAILURE
                }
            };
        }
        Command::Run(None) => AttractorConfig::default(),
        Command::Run(Some(path)) => match AttractorConfig::load(&path) {
            Ok(config) => {
                info!(path = %path.display(), "loaded settings");
                config
            }
            Err(err) => {
                error!(path = %path.display(), %err, "invalid settings");
                return ExitCode::FAILURE;
            }
        },
    };

    match Simulation::new(config).run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "viewer stopped");
            ExitCode::FAILURE
        }
    }
}
