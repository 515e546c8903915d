//! Leona CLI - satellite change detection over local scene catalogs

mod config;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use leona_acquire::{
    fetch_pair, AcquisitionRequest, BandSource, LocalCatalog, SceneOrder, TimeRange,
};
use leona_algorithms::analysis::{
    analyze_urban_heat, detect_deforestation, detect_irrigation, DeforestationParams,
    FusionBands, IrrigationInput, IrrigationParams, OpticalBands, ThermalBands, UrbanHeatParams,
};
use leona_algorithms::change::{DNBR, DNDVI, DNDWI, DVV_DB};
use leona_algorithms::report::AnalysisOutput;
use leona_core::io::write_mask_geotiff;
use leona_core::{BandRaster, BoundingBox};

use config::{resolve_thresholds, Config};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "leona")]
#[command(author, version, about = "Satellite raster change detection", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect vegetation loss between two Sentinel-2 periods
    Deforestation {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        periods: PeriodArgs,
        /// Optical collection
        #[arg(long, default_value = "sentinel-2-l2a")]
        collection: String,
        /// Maximum scene cloud cover in percent
        #[arg(long, default_value = "30")]
        max_cloud_cover: f64,
        /// Minimum NDVI loss
        #[arg(long)]
        dndvi: Option<f64>,
        /// Minimum NBR loss
        #[arg(long)]
        dnbr: Option<f64>,
    },
    /// Detect irrigation from Sentinel-1 backscatter and Sentinel-2 NDWI
    Irrigation {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        periods: PeriodArgs,
        /// Radar collection (VV in linear power)
        #[arg(long, default_value = "sentinel-1-grd")]
        radar_collection: String,
        /// Optical collection
        #[arg(long, default_value = "sentinel-2-l2a")]
        optical_collection: String,
        /// Maximum optical scene cloud cover in percent
        #[arg(long, default_value = "30")]
        max_cloud_cover: f64,
        /// Minimum NDWI increase
        #[arg(long)]
        ndwi_threshold: Option<f64>,
        /// Minimum VV decrease in dB (magnitude)
        #[arg(long)]
        vv_db_threshold: Option<f64>,
    },
    /// Land surface temperature hotspots from one Landsat scene
    UrbanHeat {
        #[command(flatten)]
        common: CommonArgs,
        /// Latest acceptable acquisition date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Days to look back from --date
        #[arg(long, default_value = "30")]
        days_before: u64,
        /// Thermal collection
        #[arg(long, default_value = "landsat-8-9-c2-l2")]
        collection: String,
        /// Maximum scene cloud cover in percent
        #[arg(long, default_value = "20")]
        max_cloud_cover: f64,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Scene catalog root directory
    #[arg(long)]
    catalog: PathBuf,
    /// Region as min_lon,min_lat,max_lon,max_lat
    #[arg(long, allow_hyphen_values = true)]
    bbox: BoundingBox,
    /// TOML file with threshold and calibration overrides
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the detection mask as a GeoTIFF
    #[arg(long)]
    mask_out: Option<PathBuf>,
    /// Write the JSON result to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct PeriodArgs {
    /// Reference period start (YYYY-MM-DD)
    #[arg(long)]
    reference_start: NaiveDate,
    /// Reference period end (YYYY-MM-DD)
    #[arg(long)]
    reference_end: NaiveDate,
    /// Recent period start (YYYY-MM-DD)
    #[arg(long)]
    recent_start: NaiveDate,
    /// Recent period end (YYYY-MM-DD)
    #[arg(long)]
    recent_end: NaiveDate,
}

impl PeriodArgs {
    fn ranges(&self) -> Result<(TimeRange, TimeRange)> {
        let reference = TimeRange::new(self.reference_start, self.reference_end)
            .context("Invalid reference period")?;
        let recent =
            TimeRange::new(self.recent_start, self.recent_end).context("Invalid recent period")?;
        Ok((reference, recent))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn emit<R: Serialize>(
    output: &AnalysisOutput<R>,
    region: &BoundingBox,
    common: &CommonArgs,
) -> Result<()> {
    if let Some(path) = &common.mask_out {
        let (rows, cols) = output.mask.shape();
        write_mask_geotiff(&output.mask, region.geotransform(rows, cols), path)
            .context("Failed to write mask")?;
        info!("Mask saved to: {}", path.display());
    }

    let json = serde_json::to_string_pretty(&output.report)?;
    match &common.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Result saved to: {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn fetch_two<S: BandSource>(
    source: &S,
    what: &str,
    reference: &AcquisitionRequest,
    recent: &AcquisitionRequest,
) -> Result<(BandRaster, BandRaster)> {
    let pb = spinner(&format!("Loading {what} scenes..."));
    let pair = fetch_pair(source, reference, recent)
        .with_context(|| format!("Failed to acquire {what} scenes"));
    pb.finish_and_clear();
    pair
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run_deforestation(
    common: &CommonArgs,
    periods: &PeriodArgs,
    collection: &str,
    max_cloud_cover: f64,
    flags: [(&str, Option<f64>); 2],
) -> Result<()> {
    let config = Config::load(common.config.as_deref())?;
    let (reference_range, recent_range) = periods.ranges()?;
    let catalog = LocalCatalog::new(&common.catalog);
    let bands = OpticalBands::default();
    let band_list = [
        bands.red.as_str(),
        bands.nir.as_str(),
        bands.swir.as_str(),
        "SCL",
        "dataMask",
    ];

    let request = |range: TimeRange| {
        AcquisitionRequest::new(common.bbox, range, collection)
            .bands(&band_list)
            .max_cloud_cover(max_cloud_cover)
    };
    let (reference, recent) = fetch_two(
        &catalog,
        "optical",
        &request(reference_range),
        &request(recent_range),
    )?;

    let params = DeforestationParams {
        thresholds: resolve_thresholds(
            DeforestationParams::default_thresholds(),
            &config.deforestation,
            &flags,
        )?,
        bands,
        ..DeforestationParams::default()
    };

    let start = Instant::now();
    let output = detect_deforestation(&common.bbox, &reference, &recent, &params)
        .context("Deforestation analysis failed")?;
    info!("Processing time: {:.2?}", start.elapsed());
    emit(&output, &common.bbox, common)
}

fn run_irrigation(
    common: &CommonArgs,
    periods: &PeriodArgs,
    radar_collection: &str,
    optical_collection: &str,
    max_cloud_cover: f64,
    flags: [(&str, Option<f64>); 2],
) -> Result<()> {
    let config = Config::load(common.config.as_deref())?;
    let (reference_range, recent_range) = periods.ranges()?;
    let catalog = LocalCatalog::new(&common.catalog);
    let bands = FusionBands::default();

    let radar_request = |range: TimeRange| {
        AcquisitionRequest::new(common.bbox, range, radar_collection).bands(&[bands.vv.as_str()])
    };
    let optical_request = |range: TimeRange| {
        AcquisitionRequest::new(common.bbox, range, optical_collection)
            .bands(&[bands.green.as_str(), bands.nir.as_str()])
            .max_cloud_cover(max_cloud_cover)
    };
    let (radar_reference, radar_recent) = fetch_two(
        &catalog,
        "radar",
        &radar_request(reference_range),
        &radar_request(recent_range),
    )?;
    let (optical_reference, optical_recent) = fetch_two(
        &catalog,
        "optical",
        &optical_request(reference_range),
        &optical_request(recent_range),
    )?;

    let params = IrrigationParams {
        thresholds: resolve_thresholds(
            IrrigationParams::default_thresholds(),
            &config.irrigation,
            &flags,
        )?,
        bands,
        ..IrrigationParams::default()
    };
    let input = IrrigationInput {
        region: common.bbox,
        radar_reference,
        radar_recent,
        optical_reference,
        optical_recent,
    };

    let start = Instant::now();
    let output = detect_irrigation(&input, &params).context("Irrigation analysis failed")?;
    info!("Processing time: {:.2?}", start.elapsed());
    emit(&output, &common.bbox, common)
}

fn run_urban_heat(
    common: &CommonArgs,
    date: NaiveDate,
    days_before: u64,
    collection: &str,
    max_cloud_cover: f64,
) -> Result<()> {
    let config = Config::load(common.config.as_deref())?;
    let catalog = LocalCatalog::new(&common.catalog);
    let bands = ThermalBands::default();
    let range = TimeRange::lookback(date, days_before).context("Invalid date window")?;

    let request = AcquisitionRequest::new(common.bbox, range, collection)
        .bands(&[bands.thermal.as_str(), bands.red.as_str(), bands.nir.as_str()])
        .max_cloud_cover(max_cloud_cover)
        .order(SceneOrder::MostRecent);

    let pb = spinner("Loading thermal scene...");
    let scene = catalog.fetch_bands(&request);
    pb.finish_and_clear();
    let scene = scene.context("Failed to acquire thermal scene")?;

    let defaults = UrbanHeatParams::default();
    let params = UrbanHeatParams {
        calibration: config.urban_heat.calibration.unwrap_or(defaults.calibration),
        pixel_size_m: config.urban_heat.pixel_size_m.unwrap_or(defaults.pixel_size_m),
        bands,
        ..defaults
    };

    let start = Instant::now();
    let output =
        analyze_urban_heat(&common.bbox, &scene, &params).context("Urban heat analysis failed")?;
    info!("Processing time: {:.2?}", start.elapsed());
    emit(&output, &common.bbox, common)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Deforestation {
            common,
            periods,
            collection,
            max_cloud_cover,
            dndvi,
            dnbr,
        } => run_deforestation(
            &common,
            &periods,
            &collection,
            max_cloud_cover,
            [(DNDVI, dndvi), (DNBR, dnbr)],
        ),
        Commands::Irrigation {
            common,
            periods,
            radar_collection,
            optical_collection,
            max_cloud_cover,
            ndwi_threshold,
            vv_db_threshold,
        } => run_irrigation(
            &common,
            &periods,
            &radar_collection,
            &optical_collection,
            max_cloud_cover,
            [(DNDWI, ndwi_threshold), (DVV_DB, vv_db_threshold)],
        ),
        Commands::UrbanHeat {
            common,
            date,
            days_before,
            collection,
            max_cloud_cover,
        } => run_urban_heat(&common, date, days_before, &collection, max_cloud_cover),
    }
}
