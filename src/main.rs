use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use microgrid_dispatch::analysis::{self, CostSummary};
use microgrid_dispatch::config::{Config, DEFAULT_CONFIG_PATH};
use microgrid_dispatch::optimizer::MicrogridOptimizer;
use microgrid_dispatch::telemetry::{init_tracing, LogFormat};
use microgrid_dispatch::{io, DispatchResult, HorizonSeries};
use tracing::{info, warn};

/// Window length when only a start timestamp is given
const DEFAULT_WINDOW_HOURS: usize = 48;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
struct Args {
    /// TOML parameter file; MICROGRID__* environment variables override it.
    #[arg(long, env = "MICROGRID_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize a single horizon and write the dispatch table.
    Solve {
        /// Hourly CSV with timestamp,load_kw,solar_pu columns
        #[arg(long)]
        input: PathBuf,

        /// Output CSV (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// First hour of the window, e.g. 2024-07-04T00:00:00
        #[arg(long)]
        start: Option<NaiveDateTime>,

        /// Window length in hours
        #[arg(long)]
        hours: Option<usize>,
    },

    /// Optimize every calendar month and report annual savings.
    Annual {
        #[arg(long)]
        input: PathBuf,

        /// Combined dispatch CSV
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn build_optimizer(cfg: &Config) -> Result<MicrogridOptimizer> {
    let engine = cfg.solver.engine.create()?;
    Ok(MicrogridOptimizer::with_engine(
        cfg.microgrid.clone(),
        engine,
        cfg.solver.options(),
    )?)
}

fn select_window(
    series: HorizonSeries,
    start: Option<NaiveDateTime>,
    hours: Option<usize>,
) -> Result<HorizonSeries> {
    Ok(match (start, hours) {
        (Some(start), hours) => series.window(start, hours.unwrap_or(DEFAULT_WINDOW_HOURS))?,
        (None, Some(hours)) => series.head(hours),
        (None, None) => series,
    })
}

fn write_table(result: &DispatchResult, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            io::write_dispatch_file(result, path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), rows = result.len(), "dispatch table written");
        }
        None => {
            let stdout = std::io::stdout();
            io::write_dispatch(result, stdout.lock())?;
        }
    }
    Ok(())
}

fn print_summary(summary: &CostSummary, json: bool) -> Result<()> {
    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, summary)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(out, "Baseline cost:   ${:>14.0}", summary.baseline_cost)?;
    writeln!(out, "Optimized cost:  ${:>14.0}", summary.optimized_cost)?;
    writeln!(
        out,
        "Savings:         ${:>14.0} ({:.1}%)",
        summary.savings,
        summary.savings_fraction * 100.0
    )?;
    writeln!(out, "Fuel avoided:     {:>14.0} L", summary.baseline_fuel_l - summary.optimized_fuel_l)?;
    writeln!(out, "CO2 avoided:      {:>14.1} t", summary.co2_avoided_tonnes)?;
    writeln!(out, "CAPEX:           ${:>14.0}", summary.capex)?;
    match summary.payback_years() {
        Some(years) => writeln!(out, "Payback:          {:>14.1} years", years)?,
        None => writeln!(out, "Payback:          {:>14}", "never")?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_format);

    let cfg = Config::load_from(&args.config).context("loading configuration")?;
    info!(
        config = %args.config.display(),
        engine = %cfg.solver.engine,
        effective_fuel_price = cfg.microgrid.effective_fuel_price(),
        "configuration loaded"
    );

    match args.command {
        Command::Solve {
            input,
            output,
            start,
            hours,
        } => {
            let series = io::read_horizon_file(&input)?;
            let horizon = select_window(series, start, hours)?;
            info!(
                from = ?horizon.first_timestamp(),
                to = ?horizon.last_timestamp(),
                "optimizing window"
            );

            let optimizer = build_optimizer(&cfg)?;
            let result = optimizer.build_and_solve(&horizon)?;
            if result.timed_out() {
                warn!("solve hit the time limit; result is feasible but not proven optimal");
            }

            let summary = CostSummary::compute(&horizon, &result, &cfg.microgrid, &cfg.economics);
            info!(
                diesel_kwh = result.diesel_energy_kwh(),
                fuel_l = summary.optimized_fuel_l,
                cost = summary.optimized_cost,
                "dispatch summary"
            );
            write_table(&result, output.as_ref())?;
        }
        Command::Annual {
            input,
            output,
            json,
        } => {
            let series = io::read_horizon_file(&input)?;
            let optimizer = Arc::new(build_optimizer(&cfg)?);
            let annual = analysis::solve_by_month(Arc::clone(&optimizer), &series).await?;

            let timed_out = annual.timed_out_months();
            if !timed_out.is_empty() {
                warn!(months = ?timed_out, "some months hit the solver time limit");
            }

            if let Some(path) = output.as_ref() {
                let combined = annual
                    .combined()
                    .context("no months in the input series")?;
                write_table(&combined, Some(path))?;
            }

            let summary = annual
                .summary(&optimizer, &cfg.economics)
                .context("no months in the input series")?;
            print_summary(&summary, json)?;
        }
    }

    Ok(())
}
