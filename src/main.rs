// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! modulus - run CommonJS-style modules from the command line
//!
//! ## Modes
//!
//! - `modulus app.js` loads a module (and everything it requires)
//! - `modulus -e "<code>"` evaluates inline code with `require` available
//! - `modulus` with a terminal on stdin starts the REPL, otherwise stdin is
//!   evaluated as a script

mod repl;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use modulus_loader::{LoadError, LoaderConfig, ModuleSystem, VERSION, Value};
use owo_colors::OwoColorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Stack for the interpreter thread; module code recurses on the native stack
const INTERPRETER_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(
    name = "modulus",
    about = "Run CommonJS-style JavaScript modules",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Module file to run
    script: Option<PathBuf>,

    /// Evaluate code from the command line
    #[arg(short = 'e', long = "eval", conflicts_with = "script")]
    eval: Option<String>,

    /// Start the interactive REPL
    #[arg(short = 'i', long = "interactive", alias = "repl")]
    interactive: bool,

    /// Directory top-level requires are resolved against
    #[arg(long = "base-dir", value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Configuration file (defaults to ./modulus.toml when present)
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Print the module cache after running
    #[arg(long = "cache-info")]
    cache_info: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = std::thread::Builder::new()
        .name("modulus".into())
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(move || run(cli))
        .context("failed to start the interpreter thread")
        .and_then(|handle| {
            handle
                .join()
                .map_err(|_| anyhow!("the interpreter thread panicked"))?
        });

    match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "modulus=debug,modulus_loader=debug"
    } else {
        "modulus=warn,modulus_loader=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    let system = ModuleSystem::new(config)
        .map_err(|e| anyhow!("failed to create the module system: {}", e))?;
    tracing::debug!(base_dir = %system.base_dir().display(), "starting");

    let code = if let Some(code) = &cli.eval {
        report(&system, system.evaluate(code))
    } else if let Some(script) = &cli.script {
        run_script(&system, script)?
    } else if cli.interactive || atty::is(atty::Stream::Stdin) {
        repl::Repl::new(system.clone())?.run()?;
        ExitCode::SUCCESS
    } else {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        report(&system, system.evaluate(&source))
    };

    if cli.cache_info {
        print_cache_info(&system);
    }
    Ok(code)
}

/// Configuration file and environment, then command line flags
fn load_config(cli: &Cli) -> Result<LoaderConfig> {
    let mut config = LoaderConfig::load(cli.config.as_deref()).map_err(|e| anyhow!("{}", e))?;
    if let Some(dir) = &cli.base_dir {
        config.base_dir = Some(dir.clone());
    }
    Ok(config)
}

/// Load `script` as the main module. Its path is taken from the working
/// directory, not the configured base directory.
fn run_script(system: &ModuleSystem, script: &Path) -> Result<ExitCode> {
    let path = std::path::absolute(script)
        .with_context(|| format!("invalid script path '{}'", script.display()))?;
    let outcome = system.require(&path.to_string_lossy()).map(|_| Value::Undefined);
    Ok(report(system, outcome))
}

/// Print a completion value or a load failure and pick the exit code
fn report(system: &ModuleSystem, outcome: modulus_loader::Result<Value>) -> ExitCode {
    match outcome {
        Ok(value) => {
            if !value.is_undefined() {
                println!("{}", system.engine().inspect(&value));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_load_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn print_load_error(error: &LoadError) {
    match error {
        LoadError::Execution { path, exception } => {
            eprintln!("{} {}", "Uncaught".red().bold(), exception);
            eprintln!("    {} {}", "at".dimmed(), path.display().cyan());
        }
        other => {
            eprintln!("{}: {}", "Error".red().bold(), other);
            if let Some(code) = other.code() {
                eprintln!("    {} {}", "code:".dimmed(), code.yellow());
            }
        }
    }
}

fn print_cache_info(system: &ModuleSystem) {
    let info = system.cache_info();
    eprintln!("{} {}", "Cached modules:".white().bold(), info.count.yellow());
    for module in &info.modules {
        eprintln!("  {}", module.display().cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use modulus_engine::CapturedConsole;
    use std::ffi::OsString;
    use std::rc::Rc;

    fn quiet_system(base_dir: &Path) -> ModuleSystem {
        let config = LoaderConfig {
            base_dir: Some(base_dir.to_path_buf()),
            ..LoaderConfig::default()
        };
        ModuleSystem::builder(config)
            .console(Rc::new(CapturedConsole::default()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from([
            "modulus",
            "app.js",
            "--base-dir",
            "/srv",
            "--cache-info",
        ])
        .unwrap();
        assert_eq!(cli.script, Some(PathBuf::from("app.js")));
        assert_eq!(cli.base_dir, Some(PathBuf::from("/srv")));
        assert!(cli.cache_info);
        assert!(!cli.verbose);

        assert!(Cli::try_parse_from(["modulus", "app.js", "-e", "1"]).is_err());
    }

    #[test]
    fn test_base_dir_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("modulus.toml");
        std::fs::write(&config_path, "base-dir = \"/from/file\"\n").unwrap();

        let cli = Cli::try_parse_from([
            OsString::from("modulus"),
            OsString::from("--config"),
            config_path.into_os_string(),
            OsString::from("--base-dir"),
            OsString::from("/from/flag"),
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_dir, Some(PathBuf::from("/from/flag")));
    }

    #[test]
    fn test_run_script_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.js"), "exports.ok = true;").unwrap();
        std::fs::write(dir.path().join("fail.js"), "throw new Error('nope');").unwrap();
        let system = quiet_system(dir.path());

        let ok = run_script(&system, &dir.path().join("ok.js")).unwrap();
        assert_eq!(ok, ExitCode::SUCCESS);
        let fail = run_script(&system, &dir.path().join("fail.js")).unwrap();
        assert_eq!(fail, ExitCode::FAILURE);
        let missing = run_script(&system, &dir.path().join("missing.js")).unwrap();
        assert_eq!(missing, ExitCode::FAILURE);

        assert_eq!(system.cache_info().count, 1);
    }
}
