use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mwtree::import::load_keys_csv;
use mwtree::{Cli, MultiwayTree, Shell, ShellResult};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_shell(cli: &Cli) -> ShellResult<Shell> {
    let mut config = cli.shell_config();
    let tree = match &cli.load {
        Some(path) => {
            let tree = MultiwayTree::load_snapshot(path)?;
            config.degree = tree.degree();
            Some(tree)
        }
        None => None,
    };

    let mut shell = Shell::new(tree, config.clone());
    shell.insert_keys(&cli.keys)?;
    if let Some(path) = &cli.import {
        shell.insert_keys(&load_keys_csv(path, config.csv_delimiter)?)?;
    }
    Ok(shell)
}

fn run(cli: Cli) -> ShellResult<()> {
    let mut shell = build_shell(&cli)?;

    match &cli.execute {
        Some(script) => {
            for output in shell.run_script(script)? {
                println!("{}", output);
            }
            Ok(())
        }
        None => shell.repl(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
