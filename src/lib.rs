pub mod cli;
pub mod columns;
pub mod data;
pub mod dispatch;
pub mod distribution;
pub mod io_utils;
pub mod likert;
pub mod loader;
pub mod pipeline;
pub mod probe;
pub mod prompt;
pub mod stats;
pub mod table;

use std::{env, io, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{cli::Cli, prompt::Prompter};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("survey_stats", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let options = cli.pipeline_options()?;
    debug!("Pipeline options: {options:?}");
    info!(
        "Analyzing '{}' with delimiter '{}'",
        options.input.display(),
        printable_delimiter(options.delimiter)
    );
    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout().lock());
    pipeline::run(&options, &mut prompter)
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
