use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use slotwatch::cli::{Cli, Commands, ConfigActions};
use slotwatch::config::Config;
use slotwatch::{Extractor, InfoGathering, MultiCandidateQuery, PageSnapshot, Record};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(tz) = &cli.timezone {
        config.engine.timezone = tz.clone();
    }

    slotwatch::init_logger(&config.logging.level);
    debug!("Effective config: {:?}", config);

    match cli.command {
        Commands::Extract { snapshots, pretty } => {
            let mut extractor = Extractor::from_config(&config.engine)?;
            for path in &snapshots {
                let records = extract_one(&mut extractor, path)?;
                let line = if pretty {
                    serde_json::to_string_pretty(&records)?
                } else {
                    serde_json::to_string(&records)?
                };
                println!("{}", line);
            }
            Ok(())
        }
        Commands::Score { queries, snapshots } => {
            let content = fs::read_to_string(&queries)
                .with_context(|| format!("Failed to read queries from {}", queries.display()))?;
            let queries: Vec<Vec<MultiCandidateQuery>> =
                serde_json::from_str(&content).context("Failed to parse queries")?;

            let mut extractor = Extractor::from_config(&config.engine)?;
            let mut metric = InfoGathering::new(queries);
            for path in &snapshots {
                let records = extract_one(&mut extractor, path)?;
                metric.update(records);
            }

            let result = metric.compute();
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Commands::Config { action } => handle_config_command(action, cli.config, &config),
    }
}

fn extract_one(extractor: &mut Extractor, path: &Path) -> Result<Vec<Record>> {
    let snapshot = PageSnapshot::from_path(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;
    let records = extractor.extract(&snapshot);
    info!("{}: {} records", path.display(), records.len());
    Ok(records)
}

fn handle_config_command(
    action: ConfigActions,
    path: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    match action {
        ConfigActions::Show => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
        ConfigActions::Init { force } => {
            let written = Config::init(path.as_deref(), force)?;
            println!("Wrote {}", written.display());
            Ok(())
        }
    }
}
