//! Suburb sighting density.
//!
//! Loads suburb boundaries, fetches iNaturalist observations within their
//! combined bounding box, and reports the suburb with the most sightings.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tawny_density::config::Config;
use tawny_density::inat::{ObservationFetcher, ObservationQuery, ReqwestClient};
use tawny_density::pip::{assign, load_areas_from_path};
use tawny_density::report::{summary_line, write_counts_csv_file, write_tally};

/// Exit status for bad or missing arguments
const EXIT_USAGE: u8 = 1;
/// Exit status for load, fetch and write failures
const EXIT_FAILURE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "tawny-density")]
#[command(about = "Find the suburb with the most sightings of a species")]
struct Args {
    /// Suburb boundaries as a GeoJSON FeatureCollection (.geojson or .geojson.gz)
    #[arg(short, long)]
    geojson: PathBuf,

    /// Write per-suburb counts to this CSV file
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scientific or common taxon name (overrides config)
    #[arg(long)]
    taxon: Option<String>,

    /// First observation date, YYYY-MM-DD (overrides config)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last observation date, YYYY-MM-DD (overrides config)
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries the report
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.print().is_err() {
                eprintln!("{}", e);
            }
            return if e.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(taxon) = args.taxon {
        config.query.taxon = taxon;
    }
    if let Some(start) = args.start {
        config.query.start = start;
    }
    if let Some(end) = args.end {
        config.query.end = end;
    }
    config.validate()?;

    // 1) Load suburbs
    let index = load_areas_from_path(&args.geojson)?;
    let bbox = index.bounds();

    // 2) Fetch observations inside the combined suburb box
    info!(
        "Querying iNaturalist within bbox [{},{}] to [{},{}] for {} from {} to {} ...",
        bbox.min_lat,
        bbox.min_lon,
        bbox.max_lat,
        bbox.max_lon,
        config.query.taxon,
        config.query.start,
        config.query.end
    );
    let client = ReqwestClient::new(&config.fetch.user_agent, config.fetch.timeout())?;
    let fetcher = ObservationFetcher::new(client, config.fetch.clone());
    let query = ObservationQuery {
        taxon: config.query.taxon.clone(),
        start: config.query.start,
        end: config.query.end,
        bbox,
    };
    let points = fetcher
        .fetch_points(&query)
        .await
        .context("Couldn't fetch observations")?;

    // 3) Assign to suburbs
    let assignment = assign(points, &index);
    info!(
        "Assigned observations: {} ({} outside every suburb)",
        assignment.assigned,
        assignment.unassigned()
    );

    // 4) Report
    let top = assignment.counts.top_area();
    {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        write_tally(&mut out, &assignment.counts)?;
        writeln!(
            out,
            "{}",
            summary_line(&top, &config.query.taxon, &config.query.window_label())
        )?;
    }

    if let Some(path) = &args.out {
        write_counts_csv_file(path, &assignment.counts)?;
    }

    Ok(())
}
