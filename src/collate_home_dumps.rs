/*
cargo run --bin collate_home_dumps

cargo run --bin collate_home_dumps -- \
    --home /tmp/dumps \
    --log-dir logs \
    --debug
*/

use std::fs::{create_dir_all, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use log::info;
use simplelog::{
    ColorChoice, CombinedLogger, Config as LogConfig, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use home_collate::collate_home_dir;

/// Merge the `data` arrays of every home*.json file into home-collated.json.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding the dumps; the collated file is written there too
    #[arg(long, env = "HOME", value_name = "DIR")]
    home: PathBuf,

    /// Print debug messages
    #[arg(long)]
    debug: bool,

    /// Also write a timestamped log file into this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    info!("Started - home: {:?}", cli.home);
    let summary = collate_home_dir(&cli.home)?;
    info!(
        "Merged {} item(s) from {} file(s) into {}",
        summary.items,
        summary.inputs.len(),
        summary.output.display()
    );

    println!("done");
    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    let (term_level, file_level) = if cli.debug {
        (LevelFilter::Debug, LevelFilter::Debug)
    } else {
        (LevelFilter::Warn, LevelFilter::Info)
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(log_dir) = &cli.log_dir {
        create_dir_all(log_dir)
            .with_context(|| format!("creating log directory {}", log_dir.display()))?;
        let ts = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("collate_home_dumps_{ts}.log"));
        loggers.push(WriteLogger::new(
            file_level,
            LogConfig::default(),
            File::create(&log_path)
                .with_context(|| format!("creating log file {}", log_path.display()))?,
        ));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}
