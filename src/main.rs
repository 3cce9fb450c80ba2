use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use rusty_hazard::data::filter::{available_targets, DisaggregationTarget};
use rusty_hazard::data::loader::{load_hazard_curve, load_table, load_uhs};
use rusty_hazard::hazard::metric::{return_period, to_annual_rate};
use rusty_hazard::hazard::spectrum::{spectrum_label, UhsSummary};
use rusty_hazard::report::DisaggregationInputs;
use rusty_hazard::{Config, DisaggregationReport};

#[derive(Parser)]
#[command(name = "rusty-hazard", about = "Seismic hazard post-processing")]
struct Cli {
    /// JSON config file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Exposure period in years, overrides the config
    #[arg(long, global = true)]
    years: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reduce disaggregation tables for one (poe, imt) target
    Disagg {
        /// Magnitude/distance/epsilon table
        #[arg(long)]
        mag_dist_eps: PathBuf,
        /// Tectonic region by magnitude/distance table
        #[arg(long)]
        trt: Option<PathBuf>,
        /// Tectonic region by longitude/latitude table
        #[arg(long)]
        lon_lat: Option<PathBuf>,
        #[arg(long)]
        poe: f64,
        #[arg(long)]
        imt: String,
        /// Emit flattened stack records instead of the full report
        #[arg(long)]
        records: bool,
    },
    /// List the (poe, imt) pairs present in a disaggregation table
    Targets { file: PathBuf },
    /// Read a hazard curve at a reference probability of exceedance
    Curve {
        file: PathBuf,
        #[arg(long)]
        poe: f64,
    },
    /// Spectral accelerations of a mean UHS and its quantiles
    Uhs {
        #[arg(long)]
        mean: PathBuf,
        #[arg(long = "quantile")]
        quantiles: Vec<PathBuf>,
        #[arg(long)]
        poe: f64,
    },
    /// Convert probabilities of exceedance to annual rates
    Rate {
        #[arg(required = true)]
        poes: Vec<f64>,
    },
}

#[derive(Serialize)]
struct RateRow {
    poe: f64,
    annual_rate: f64,
    return_period: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(years) = cli.years {
        config.exposure_years = years;
    }
    config.validate()?;

    match cli.command {
        Command::Disagg {
            mag_dist_eps,
            trt,
            lon_lat,
            poe,
            imt,
            records,
        } => {
            let mag_dist_eps = load_table(&mag_dist_eps)?;
            let trt = trt.as_deref().map(load_table).transpose()?;
            let lon_lat = lon_lat.as_deref().map(load_table).transpose()?;
            let report = DisaggregationReport::build(
                &config,
                &DisaggregationTarget::new(poe, imt),
                DisaggregationInputs {
                    mag_dist_eps: &mag_dist_eps,
                    tectonic_region: trt.as_ref(),
                    location: lon_lat.as_ref(),
                },
            )?;
            if records {
                print_json(&report.epsilon.layout.records())
            } else {
                print_json(&report)
            }
        }
        Command::Targets { file } => {
            let table = load_table(&file)?;
            print_json(&available_targets(&table, &config.columns)?)
        }
        Command::Curve { file, poe } => {
            let curve = load_hazard_curve(&file)?;
            print_json(&curve.reading(poe, config.exposure_years))
        }
        Command::Uhs {
            mean,
            quantiles,
            poe,
        } => {
            let mean = load_uhs(&mean, config.pga_period)?;
            let loaded = quantiles
                .iter()
                .map(|path| Ok((label_for(path), load_uhs(path, config.pga_period)?)))
                .collect::<Result<Vec<_>>>()?;
            let borrowed: Vec<_> = loaded.iter().map(|(l, t)| (l.clone(), t)).collect();
            print_json(&UhsSummary::build(&mean, &borrowed, poe)?)
        }
        Command::Rate { poes } => {
            let rows: Vec<RateRow> = poes
                .into_iter()
                .map(|poe| RateRow {
                    poe,
                    annual_rate: to_annual_rate(poe, config.exposure_years),
                    return_period: return_period(poe, config.exposure_years),
                })
                .collect();
            print_json(&rows)
        }
    }
}

fn label_for(path: &Path) -> String {
    let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
    spectrum_label(&name)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
