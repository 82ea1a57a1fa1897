use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ecoevo::analysis::Analyzer;
use ecoevo::config::Config;
use ecoevo::progress::{ProgressMessage, SimulationHandle};
use std::{path::PathBuf, thread, time::Duration};

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a simulation and stream its progress to the log.
    Run {
        /// Interval between channel polls, in milliseconds.
        #[arg(long, default_value_t = 50)]
        poll_ms: u64,
    },

    /// Validate the configuration file and exit.
    Check,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let cfg = Config::from_file(&args.config).context("failed to load config")?;
    log::info!("{cfg:#?}");

    match args.command {
        Command::Run { poll_ms } => run_simulation(cfg, poll_ms)?,
        Command::Check => log::info!("configuration is valid"),
    }

    Ok(())
}

fn run_simulation(cfg: Config, poll_ms: u64) -> Result<()> {
    let t_final = cfg.t_final;
    let mut analyzer = Analyzer::new(&cfg);

    let mut handle = SimulationHandle::spawn(cfg).context("failed to spawn simulation")?;

    loop {
        for message in handle.poll() {
            match message {
                ProgressMessage::Data(snapshot) => {
                    analyzer
                        .update(&snapshot)
                        .context("failed to update observable")?;

                    let progress = 100.0 * snapshot.time / t_final;
                    log::info!(
                        "completed {progress:06.2}%: t = {}, types = {}, biomass = {:.4}",
                        snapshot.time,
                        snapshot.types.len(),
                        snapshot.total_biomass,
                    );
                }
                ProgressMessage::Done(report) => {
                    log::info!(
                        "run {:?} at t = {} after {} epochs",
                        report.reason,
                        report.final_time,
                        report.epochs_run,
                    );
                }
                ProgressMessage::Error(error) => {
                    bail!(
                        "simulation failed at t = {}: {}",
                        error.time_at_failure,
                        error.reason
                    );
                }
            }
        }

        if handle.is_finished() {
            break;
        }
        thread::sleep(Duration::from_millis(poll_ms));
    }

    let report = serde_json::to_string_pretty(&analyzer.report())
        .context("failed to serialize analysis report")?;
    log::info!("analysis report:\n{report}");

    Ok(())
}
