//! Command line runner for valstream.
//!
//! Loads a run file for a given date, runs the value stream it describes and
//! logs the summary. Each successful run appends one record to the run log;
//! the merged ledger can optionally be written out as JSON.
//!
//! ```text
//! valstream runs/montem.toml 20261016 --ledger-out out/ledger.json
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDateTime;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use valstream_core::fixed::qty_to_f64;
use valstream_core::stream::{RunConfig, RunReport, StreamError, ValueStream};
use valstream_data::{DataLoadError, RunLogError, append_record, load_run, write_json};

#[derive(Parser)]
#[command(
    name = "valstream",
    about = "Run a production value stream against an inventory and price snapshot"
)]
struct Cli {
    /// Run file (RON, TOML or JSON)
    run_file: PathBuf,
    /// Date substituted for `{date}` in the run file's paths
    date: String,
    /// Run log to append the run record to
    #[arg(long, default_value = "logs/runlog.txt")]
    run_log: PathBuf,
    /// Write the merged ledger of the run to this file as JSON
    #[arg(long)]
    ledger_out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Load(#[from] DataLoadError),
    #[error(transparent)]
    Run(#[from] StreamError),
    #[error(transparent)]
    Output(#[from] RunLogError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut chain = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                chain.push_str(": ");
                chain.push_str(&cause.to_string());
                source = cause.source();
            }
            error!(run_file = %cli.run_file.display(), error = %chain, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let setup = load_run(&cli.run_file, &cli.date)?;
    let stream_id = stream_id(chrono::Local::now().naive_local());

    let config = RunConfig::new(stream_id, setup.duration)
        .with_sourcing(setup.sourcing)
        .with_config_date(setup.config_date);
    let stream = ValueStream::new(&setup.catalog, setup.stream, setup.inventory, setup.market, config)?;
    let report = stream.run()?;

    log_report(&report);

    append_record(&cli.run_log, &report.record)?;
    info!(path = %cli.run_log.display(), "run record appended");

    if let Some(path) = &cli.ledger_out {
        write_json(path, &report.ledger)?;
        info!(path = %path.display(), entries = report.ledger.entries().len(), "ledger written");
    }
    Ok(())
}

/// Run ids are local timestamps down to the microsecond.
fn stream_id(now: NaiveDateTime) -> String {
    now.format("%Y%m%d.%H%M%S.%6f").to_string()
}

fn log_report(report: &RunReport) {
    let summary = &report.summary;
    info!(
        stream_id = %report.stream_id,
        description = %report.description,
        duration = %report.duration,
        fingerprint = %report.record.fingerprint,
        "run complete"
    );

    for line in &report.lines {
        info!(
            line = %line.id,
            identity = %line.identity,
            uptime = line.summary.uptime,
            gain_loss = line.summary.gain_loss.avg_or_zero(),
            "line summary"
        );
    }

    for (ticker, flow) in &summary.net_production {
        info!(
            ticker = %ticker,
            count = qty_to_f64(flow.count),
            value = flow.value.avg_or_zero(),
            "net production"
        );
    }

    for narrative in summary.missing_inputs.iter().chain(&summary.missing_supplies) {
        warn!("{narrative}");
    }

    if let Some(efficiency) = &summary.efficiency {
        info!(
            min = efficiency.min,
            mean = efficiency.mean,
            max = efficiency.max,
            delta = efficiency.delta,
            "efficiency"
        );
    }

    info!(
        uptime = summary.uptime,
        production_value = summary.production_value.avg_or_zero(),
        production_cost = summary.production_cost.avg_or_zero(),
        purchase_cost = summary.purchase_cost.avg_or_zero(),
        gain_loss = summary.gain_loss.avg_or_zero(),
        start_value = report.start_value.total.avg_or_zero(),
        end_value = report.end_value.total.avg_or_zero(),
        net_value = report.net_value.total.avg_or_zero(),
        "run totals"
    );
}
