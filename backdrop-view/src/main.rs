//! Application entry point for the backdrop viewer.
//!
//! This binary parses the command line, loads the optional TOML config,
//! sets up logging and eframe/egui, and delegates everything else to
//! [`Viewer`] from the `viewer` module.

mod viewer;

use std::{path::PathBuf, process::ExitCode};

use backdrop_core::BackdropConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

const USAGE: &str = "usage: backdrop-view [--config <path>] [--seed <u64>]";

/// Parsed command-line options.
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    help: bool,
}

/// Parses options from `args`, which excludes the program name.
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut out = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                out.config = Some(PathBuf::from(path));
            }
            "--seed" => {
                let raw = args.next().ok_or("--seed needs a value")?;
                let seed = raw
                    .parse()
                    .map_err(|e| format!("invalid --seed {raw:?}: {e}"))?;
                out.seed = Some(seed);
            }
            "-h" | "--help" => out.help = true,
            other => return Err(format!("unexpected argument {other:?}")),
        }
    }
    Ok(out)
}

/// Loads the config named by `args`, or the defaults, and applies the
/// command-line seed over the file's.
fn load_config(args: &Args) -> Result<BackdropConfig, backdrop_core::ConfigError> {
    let mut cfg = match &args.config {
        Some(path) => BackdropConfig::load(path)?,
        None => BackdropConfig::default(),
    };
    if args.seed.is_some() {
        cfg.seed = args.seed;
    }
    Ok(cfg)
}

/// Starts the native eframe application.
///
/// Logging honours `RUST_LOG` and defaults to `info`. Bad arguments or a
/// bad config file exit with status 2 before any window opens.
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let viewer = match load_config(&args).and_then(Viewer::new) {
        Ok(viewer) => viewer,
        Err(err) => {
            error!(error = %err, "cannot start backdrop");
            return ExitCode::from(2);
        }
    };

    let options = eframe::NativeOptions::default();
    let result = eframe::run_native(
        "Backdrop",
        options,
        Box::new(|_cc| Ok(Box::new(viewer))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "viewer exited with an error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn empty_command_line_uses_defaults() {
        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn config_and_seed_are_parsed() {
        let parsed = args(&["--seed", "42", "--config", "fx.toml"]).unwrap();
        assert_eq!(parsed.seed, Some(42));
        assert_eq!(parsed.config, Some(PathBuf::from("fx.toml")));
    }

    #[test]
    fn bad_arguments_are_rejected() {
        assert!(args(&["--seed"]).is_err());
        assert!(args(&["--seed", "-1"]).is_err());
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--frobnicate"]).is_err());
    }

    #[test]
    fn command_line_seed_overrides_defaults() {
        let cfg = load_config(&Args {
            seed: Some(7),
            ..Args::default()
        })
        .unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.particles, BackdropConfig::default().particles);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = load_config(&Args {
            config: Some(PathBuf::from("/definitely/not/here.toml")),
            ..Args::default()
        });
        assert!(matches!(
            result,
            Err(backdrop_core::ConfigError::Io { .. })
        ));
    }
}
