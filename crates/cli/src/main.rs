use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use montefolio_core::domain::histogram::{self, BIN_COUNT};
use montefolio_core::domain::request::SimulationParams;
use montefolio_core::pipeline;
use montefolio_core::remote::http::HttpSimulationService;

mod portfolio;
mod render;

#[derive(Debug, Parser)]
#[command(name = "montefolio", about = "Monte Carlo projection of a multi-asset portfolio")]
struct Args {
    /// Position as SYMBOL=VALUE, e.g. `--position VGT=250000`. Repeatable.
    #[arg(long = "position", value_name = "SYMBOL=VALUE")]
    positions: Vec<portfolio::PositionArg>,

    /// JSON file with `[{"symbol": "VGT", "value": 250000}, ...]`. Read before `--position`.
    #[arg(long)]
    portfolio: Option<PathBuf>,

    #[arg(long, default_value_t = 800_000.0)]
    initial_investment: f64,

    /// Years to project forward.
    #[arg(long, default_value_t = 5)]
    years: u32,

    /// Number of simulated trials.
    #[arg(long, default_value_t = 10_000)]
    n_sims: u32,

    /// Estimated annual standard deviation of the whole portfolio.
    #[arg(long, default_value_t = 0.28)]
    portfolio_std_est: f64,

    /// Histogram buckets, 1 to 500.
    #[arg(long, default_value_t = BIN_COUNT, value_parser = parse_bins)]
    bins: usize,

    /// Do not look up ticker details before simulating.
    #[arg(long)]
    skip_enrich: bool,

    /// Print the simulation request instead of submitting it.
    #[arg(long)]
    dry_run: bool,
}

fn parse_bins(raw: &str) -> Result<usize, String> {
    let bins: usize = raw.parse().map_err(|e| format!("{e}"))?;
    histogram::validate_bin_count(bins).map_err(|e| e.to_string())?;
    Ok(bins)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = montefolio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(args, &settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "montefolio run failed");
    }
    result
}

async fn run(args: Args, settings: &montefolio_core::config::Settings) -> anyhow::Result<()> {
    let mut entries = match &args.portfolio {
        Some(path) => portfolio::load_entries(path)?,
        None => Vec::new(),
    };
    entries.extend(args.positions.iter().map(portfolio::PositionArg::to_entry));
    anyhow::ensure!(
        !entries.is_empty(),
        "no positions given; use --position SYMBOL=VALUE or --portfolio FILE"
    );

    let mut store = portfolio::build_store(&entries)?;

    let service = Arc::new(HttpSimulationService::from_settings(settings)?);

    if !args.skip_enrich {
        let report = portfolio::enrich_all(&mut store, service.clone()).await;
        for failure in &report.failures {
            eprintln!("warning: {failure}");
        }
        tracing::info!(
            applied = report.applied,
            discarded = report.discarded,
            failed = report.failures.len(),
            "ticker lookups finished"
        );
    }

    let params = SimulationParams {
        initial_investment: args.initial_investment,
        years: args.years,
        n_sims: args.n_sims,
        portfolio_std_est: args.portfolio_std_est,
    };
    let request = pipeline::prepare(store.positions(), &params)?;

    print!("{}", render::positions_table(store.positions(), &request));

    if args.dry_run {
        let json = serde_json::to_string_pretty(&request).context("serialize request failed")?;
        println!("{json}");
        return Ok(());
    }

    let report = pipeline::submit(service.as_ref(), request, args.bins).await?;

    println!();
    print!("{}", render::summary(&report.summary));
    println!();
    print!("{}", render::histogram(&report.histogram));
    Ok(())
}

fn init_sentry(settings: &montefolio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
