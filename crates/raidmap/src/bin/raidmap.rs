//! `raidmap` command line: project screenshot telemetry onto calibrated
//! maps, fit transforms from point pairs and lint map documents.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use raidmap::{
    fit_from_points, load_maps, CalibrationPoint, Session, SessionError, TrackerSettings,
};

#[derive(Parser)]
#[command(
    name = "raidmap",
    version,
    about = "Project screenshot position telemetry onto calibrated 2D maps"
)]
struct Cli {
    /// Log verbosity (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Project screenshot filenames onto one map, one JSON position per line.
    Locate {
        /// Map document (JSON array of map records).
        #[arg(long)]
        maps: PathBuf,
        /// Key of the map to project onto.
        #[arg(long)]
        map: String,
        /// Tracker settings file; defaults apply when omitted.
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Screenshot filenames; a leading directory path is ignored.
        #[arg(required = true)]
        screenshots: Vec<String>,
    },
    /// Fit a 6-coefficient affine transform from verified point pairs.
    Fit {
        /// JSON array of calibration points ({id, gameX, gameZ, targetX, targetY}).
        #[arg(long)]
        pairs: PathBuf,
    },
    /// Validate a map document and print a per-map summary.
    Maps {
        /// Map document (JSON array of map records).
        #[arg(long)]
        maps: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_level: LevelFilter) {
    raidmap::init_tracing(false);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) {
    let _ = raidmap::core::init_with_level(level);
}

fn run(command: Command) -> Result<ExitCode, Box<dyn Error>> {
    match command {
        Command::Locate {
            maps,
            map,
            settings,
            screenshots,
        } => locate(&maps, &map, settings.as_deref(), &screenshots),
        Command::Fit { pairs } => fit(&pairs),
        Command::Maps { maps } => lint(&maps),
    }
}

fn locate(
    maps_path: &std::path::Path,
    map_key: &str,
    settings_path: Option<&std::path::Path>,
    screenshots: &[String],
) -> Result<ExitCode, Box<dyn Error>> {
    let maps = load_maps(maps_path)?;
    let config = maps
        .iter()
        .find(|m| m.key == map_key)
        .ok_or_else(|| format!("no map {map_key:?} in {}", maps_path.display()))?;
    let settings = match settings_path {
        Some(path) => TrackerSettings::load_json(path)?,
        None => TrackerSettings::default(),
    };

    let mut session = Session::new(config, &settings)?;
    let mut projected = 0usize;
    for name in screenshots {
        match session.record(name) {
            Ok(position) => {
                println!("{}", serde_json::to_string(&position)?);
                projected += 1;
            }
            // A bad sample is skipped, the rest of the batch still runs.
            Err(SessionError::Parse(err)) => log::warn!("skipping {name:?}: {err}"),
            Err(err) => return Err(err.into()),
        }
    }

    if projected == 0 {
        eprintln!("error: no screenshot carried usable telemetry");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn fit(pairs_path: &std::path::Path) -> Result<ExitCode, Box<dyn Error>> {
    let raw = std::fs::read_to_string(pairs_path)?;
    let points: Vec<CalibrationPoint> = serde_json::from_str(&raw)?;
    match fit_from_points(&points) {
        Ok(transform) => {
            println!("{}", serde_json::to_string(&transform.to_array().to_vec())?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("error: {err}");
            Ok(ExitCode::from(2))
        }
    }
}

fn lint(maps_path: &std::path::Path) -> Result<ExitCode, Box<dyn Error>> {
    let maps = load_maps(maps_path)?;
    let mut invalid = 0usize;
    for config in &maps {
        let label = if config.display_name.is_empty() {
            config.key.clone()
        } else {
            format!("{} ({})", config.key, config.display_name)
        };
        match config.validate() {
            Ok(()) => println!(
                "{label}: ok, {} calibration points, {} floors",
                config.calibration_points.len(),
                config.floors.len()
            ),
            Err(err) => {
                println!("{label}: INVALID: {err}");
                invalid += 1;
            }
        }
    }
    println!("{} maps, {} invalid", maps.len(), invalid);
    Ok(if invalid == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
