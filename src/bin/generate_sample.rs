//! Writes a synthetic single-site OpenQuake export set into a directory
//! (default `sample_data/`): disaggregation tables as CSV and Parquet, a
//! mean hazard curve, and mean plus quantile uniform hazard spectra.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const INVESTIGATION_TIME: f64 = 50.0;
const SITE: (f64, f64) = (-78.5, -0.2);
const POES: [f64; 2] = [0.1, 0.02];
const IMTS: [&str; 3] = ["PGA", "SA(0.2)", "SA(1.0)"];
const MAGNITUDES: [f64; 4] = [5.5, 6.5, 7.5, 8.5];
const DISTANCES: [f64; 5] = [10.0, 30.0, 50.0, 90.0, 150.0];
const EPSILONS: [f64; 4] = [-1.5, -0.5, 0.5, 1.5];
const REGIONS: [&str; 3] = ["Active Shallow Crust", "Subduction Interface", "Subduction IntraSlab"];
const LEVELS: [f64; 8] = [0.005, 0.01, 0.05, 0.1, 0.2, 0.4, 0.8, 1.6];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Multiplicative jitter in `[1 - spread, 1 + spread)`.
    fn jitter(&mut self, spread: f64) -> f64 {
        1.0 + spread * (2.0 * self.next_f64() - 1.0)
    }
}

/// Intensity level reached at `poe` for an IMT; longer return periods and
/// short periods shake harder.
fn iml(imt: &str, poe: f64) -> f64 {
    let scale = match imt {
        "PGA" => 0.3,
        "SA(0.2)" => 0.7,
        _ => 0.35,
    };
    scale * (0.1 / poe).powf(0.4)
}

struct MagDistEpsRow {
    imt: &'static str,
    iml: f64,
    poe: f64,
    mag: f64,
    dist: f64,
    eps: f64,
    mean: f64,
}

fn mag_dist_eps_rows(rng: &mut SimpleRng) -> Vec<MagDistEpsRow> {
    let mut rows = Vec::new();
    for &poe in &POES {
        // rarer targets are dominated by larger, closer events
        let mode_mag = if poe < 0.05 { 7.5 } else { 6.5 };
        let mode_dist = if poe < 0.05 { 30.0 } else { 50.0 };
        for imt in IMTS {
            for &mag in &MAGNITUDES {
                for &dist in &DISTANCES {
                    for &eps in &EPSILONS {
                        let weight = gaussian(mag, mode_mag, 0.8, 1.0)
                            * gaussian(dist, mode_dist, 40.0, 1.0)
                            * gaussian(eps, 0.5, 1.0, 1.0);
                        rows.push(MagDistEpsRow {
                            imt,
                            iml: iml(imt, poe),
                            poe,
                            mag,
                            dist,
                            eps,
                            mean: poe * 1e-2 * weight * rng.jitter(0.2),
                        });
                    }
                }
            }
        }
    }
    rows
}

fn metadata_record(extra: &str) -> Vec<String> {
    vec![
        "#".to_string(),
        String::new(),
        format!(
            "generated_by='rusty-hazard generate_sample', investigation_time={INVESTIGATION_TIME:.1}{extra}"
        ),
    ]
}

fn csv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))
}

fn write_mag_dist_eps_csv(path: &Path, rows: &[MagDistEpsRow]) -> Result<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record(metadata_record(""))?;
    writer.write_record(["imt", "iml", "poe", "mag", "dist", "eps", "mean"])?;
    for row in rows {
        writer.write_record([
            row.imt.to_string(),
            format!("{:.6}", row.iml),
            row.poe.to_string(),
            row.mag.to_string(),
            row.dist.to_string(),
            row.eps.to_string(),
            format!("{:.6e}", row.mean),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_mag_dist_eps_parquet(path: &Path, rows: &[MagDistEpsRow]) -> Result<()> {
    let float_column = |f: fn(&MagDistEpsRow) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("imt", DataType::Utf8, false),
        Field::new("iml", DataType::Float64, false),
        Field::new("poe", DataType::Float64, false),
        Field::new("mag", DataType::Float64, false),
        Field::new("dist", DataType::Float64, false),
        Field::new("eps", DataType::Float64, false),
        Field::new("mean", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(rows.iter().map(|r| r.imt).collect::<Vec<_>>())) as ArrayRef,
            float_column(|r| r.iml),
            float_column(|r| r.poe),
            float_column(|r| r.mag),
            float_column(|r| r.dist),
            float_column(|r| r.eps),
            float_column(|r| r.mean),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// `TRT_Mag_Dist` and `TRT_Lon_Lat` tables. Each region has its own
/// magnitude/distance mode and a source cell around the site.
fn write_region_tables(dir: &Path, rng: &mut SimpleRng) -> Result<()> {
    let modes = [(6.5, 30.0), (8.5, 90.0), (7.5, 150.0)];
    let offsets = [(0.0, 0.0), (-1.5, -0.5), (-0.5, -1.0)];

    let mut mag_dist = csv_writer(&dir.join("TRT_Mag_Dist-mean-0_1.csv"))?;
    mag_dist.write_record(metadata_record(""))?;
    mag_dist.write_record(["trt", "imt", "iml", "poe", "mag", "dist", "mean"])?;

    let mut lon_lat = csv_writer(&dir.join("TRT_Lon_Lat-mean-0_1.csv"))?;
    lon_lat.write_record(metadata_record(""))?;
    lon_lat.write_record(["trt", "imt", "iml", "poe", "lon", "lat", "mean"])?;

    for &poe in &POES {
        for imt in IMTS {
            let level = format!("{:.6}", iml(imt, poe));
            for ((region, &(mode_mag, mode_dist)), &(dlon, dlat)) in
                REGIONS.iter().zip(&modes).zip(&offsets)
            {
                for &mag in &MAGNITUDES {
                    for &dist in &DISTANCES {
                        let mean = poe
                            * 1e-2
                            * gaussian(mag, mode_mag, 0.7, 1.0)
                            * gaussian(dist, mode_dist, 35.0, 1.0)
                            * rng.jitter(0.2);
                        mag_dist.write_record([
                            region.to_string(),
                            imt.to_string(),
                            level.clone(),
                            poe.to_string(),
                            mag.to_string(),
                            dist.to_string(),
                            format!("{mean:.6e}"),
                        ])?;
                    }
                }
                for step in 0..3 {
                    let lon = SITE.0 + dlon + 0.5 * f64::from(step);
                    let lat = SITE.1 + dlat;
                    let mean = poe * 1e-3 * rng.jitter(0.5);
                    lon_lat.write_record([
                        region.to_string(),
                        imt.to_string(),
                        level.clone(),
                        poe.to_string(),
                        lon.to_string(),
                        lat.to_string(),
                        format!("{mean:.6e}"),
                    ])?;
                }
            }
        }
    }
    mag_dist.flush()?;
    lon_lat.flush()?;
    Ok(())
}

/// PoE of exceeding `level` over the investigation time, decreasing in level.
fn curve_poe(imt: &str, level: f64) -> f64 {
    // inverse of `iml`, anchored at poe = 0.1
    let scale = iml(imt, 0.1);
    (0.1 * (scale / level).powf(2.5)).min(0.999)
}

fn write_hazard_curve(path: &Path, imt: &str) -> Result<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record(metadata_record(&format!(", imt='{imt}'")))?;

    let mut header = vec!["lon".to_string(), "lat".to_string(), "depth".to_string()];
    header.extend(LEVELS.iter().map(|level| format!("poe-{level}")));
    writer.write_record(&header)?;

    let mut values = vec![SITE.0.to_string(), SITE.1.to_string(), "0.0".to_string()];
    values.extend(LEVELS.iter().map(|&level| format!("{:.6}", curve_poe(imt, level))));
    writer.write_record(&values)?;
    writer.flush()?;
    Ok(())
}

/// UHS export; `factor` scales the mean spectrum for quantile files.
fn write_uhs(path: &Path, factor: f64) -> Result<()> {
    let mut writer = csv_writer(path)?;
    writer.write_record(metadata_record(""))?;

    let mut header = vec!["lon".to_string(), "lat".to_string()];
    let mut values = vec![SITE.0.to_string(), SITE.1.to_string()];
    for &poe in &POES {
        for imt in IMTS {
            header.push(format!("{poe:.6}~{imt}"));
            values.push(format!("{:.6}", iml(imt, poe) * factor));
        }
    }
    writer.write_record(&header)?;
    writer.write_record(&values)?;
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let rows = mag_dist_eps_rows(&mut rng);
    write_mag_dist_eps_csv(&dir.join("Mag_Dist_Eps-mean-0_1.csv"), &rows)?;
    write_mag_dist_eps_parquet(&dir.join("Mag_Dist_Eps-mean-0_1.parquet"), &rows)?;
    write_region_tables(&dir, &mut rng)?;

    for imt in IMTS {
        write_hazard_curve(&dir.join(format!("hazard_curve-mean-{imt}_1.csv")), imt)?;
    }
    write_uhs(&dir.join("hazard_uhs-mean_1.csv"), 1.0)?;
    write_uhs(&dir.join("quantile_uhs-0.16_1.csv"), 0.7)?;
    write_uhs(&dir.join("quantile_uhs-0.84_1.csv"), 1.4)?;

    println!(
        "Wrote {} magnitude/distance/epsilon rows and curve/UHS files to {}",
        rows.len(),
        dir.display()
    );
    Ok(())
}
