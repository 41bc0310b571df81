use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, bail};
use log::info;
use std::path::PathBuf;
use tui_logger::{
    TuiLoggerFile, TuiLoggerLevelOutput, init_logger, set_default_level, set_log_file,
};

use crate::{
    app::App,
    sample::{SamplingContext, SysinfoProvider},
};

pub mod app;
pub mod config;
pub mod error;
pub mod event;
pub mod sample;
pub mod ui;

#[derive(Parser, Debug)]
#[command(about = "Top processes by CPU, memory or I/O, refreshed on a timer")]
struct Cli {
    #[arg(short, long, value_name = "FILE", default_value = config::DEFAULT_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the ranked list, refreshing every interval
    Run,
    /// Rank once after one interval and print the result
    Once,
    /// Validate the configuration file
    Validate,
    /// Write a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    match &cli.command {
        Some(Commands::Validate) => {
            let settings = config::load_from_file(&cli.config)?.validate()?;
            println!("{:#?}", settings);
            Ok(())
        }
        Some(Commands::Init) => {
            if cli.config.exists() {
                bail!("{:?} already exists", cli.config);
            }
            std::fs::write(&cli.config, config::default_toml()?)?;
            println!("Wrote {:?}", cli.config);
            Ok(())
        }
        Some(Commands::Once) => once(&cli.config).await,
        Some(Commands::Run) | None => {
            init_logger(tui_logger::LevelFilter::Debug)?;
            let file_options = TuiLoggerFile::new("proctop.log")
                .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
                .output_file(false)
                .output_separator(':');
            set_log_file(file_options);
            info!("Logging started");
            let mut app = App::new(cli.config)?;
            set_default_level(tui_logger::LevelFilter::Debug);
            let terminal = ratatui::init();
            let result = app.run(terminal).await;
            ratatui::restore();
            result
        }
    }
}

async fn once(config_path: &std::path::Path) -> Result<()> {
    let settings = config::load_from_file(config_path)?.validate()?;
    let mut provider = SysinfoProvider::new();
    let mut context = SamplingContext::new();
    context.prime(&mut provider)?;
    tokio::time::sleep(settings.interval).await;
    let output = context.run_cycle(&mut provider, &settings)?;
    println!("Top {} by {}", settings.top_n, settings.metric.heading());
    for row in output.rows {
        let marker = if row.is_hot { " *" } else { "" };
        println!("{:<32} {:>12}{}", row.display_name, row.display_value, marker);
    }
    Ok(())
}
