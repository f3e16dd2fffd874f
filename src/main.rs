use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use lapline::{
    AppConfig, Lap, LapReadout, LaplineError, TelemetryView,
    telemetry::loader::{load_lap, load_lap_jsonl},
};
use log::{error, info};
use snafu::Snafu;

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("No lap given: use --lap, or --telemetry with an optional --track-path"))]
    MissingLapInput,
    #[snafu(display("{source}"))]
    Lapline { source: LaplineError },
    #[snafu(display("Error serializing readouts"))]
    ReadoutSerializeError { source: serde_json::Error },
}

impl From<LaplineError> for CliError {
    fn from(value: LaplineError) -> Self {
        CliError::Lapline { source: value }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct LapArgs {
    /// JSON-lines lap recording
    #[arg(short, long)]
    lap: Option<PathBuf>,

    /// Channel-set JSON file
    #[arg(short, long, conflicts_with = "lap")]
    telemetry: Option<PathBuf>,

    /// Track path JSON file, used with --telemetry
    #[arg(long, requires = "telemetry")]
    track_path: Option<PathBuf>,

    /// JSON-lines recording of a lap to compare against
    #[arg(long)]
    compare_lap: Option<PathBuf>,

    #[arg(long, conflicts_with = "compare_lap")]
    compare_telemetry: Option<PathBuf>,

    #[arg(long, requires = "compare_telemetry")]
    compare_track_path: Option<PathBuf>,

    /// Hovered distance in meters
    #[arg(short, long)]
    distance: Option<f64>,

    #[arg(long, requires = "zoom_max")]
    zoom_min: Option<f64>,

    #[arg(long, requires = "zoom_min")]
    zoom_max: Option<f64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render the colored track map as SVG
    Render {
        #[command(flatten)]
        lap: LapArgs,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the correlated channel readouts at a distance
    Inspect {
        #[command(flatten)]
        lap: LapArgs,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn lap_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lap".to_string())
}

fn read_lap(
    recording: Option<&PathBuf>,
    telemetry: Option<&PathBuf>,
    track_path: Option<&PathBuf>,
) -> Result<Option<Lap>, LaplineError> {
    match (recording, telemetry) {
        (Some(recording), _) => load_lap_jsonl(&lap_name(recording), recording).map(Some),
        (None, Some(telemetry)) => {
            load_lap(&lap_name(telemetry), telemetry, track_path.map(PathBuf::as_path)).map(Some)
        }
        (None, None) => Ok(None),
    }
}

fn build_view(config: AppConfig, args: &LapArgs) -> Result<TelemetryView, CliError> {
    let primary = read_lap(
        args.lap.as_ref(),
        args.telemetry.as_ref(),
        args.track_path.as_ref(),
    )?
    .ok_or(CliError::MissingLapInput)?;

    let mut view = TelemetryView::new(config);
    view.load_primary(primary);
    if let Some(comparison) = read_lap(
        args.compare_lap.as_ref(),
        args.compare_telemetry.as_ref(),
        args.compare_track_path.as_ref(),
    )? {
        view.set_comparison(comparison);
    }
    if let (Some(min), Some(max)) = (args.zoom_min, args.zoom_max) {
        view.set_zoom(min, max);
    }
    if let Some(distance) = args.distance {
        if !view.on_pointer_move(distance) {
            info!("Distance {distance}m is outside the zoom range, no hover");
        }
    }
    Ok(view)
}

fn render(view: &TelemetryView, output: Option<&Path>) -> Result<(), CliError> {
    let svg = view.render()?;
    match output {
        Some(path) => {
            fs::write(path, svg).map_err(|e| LaplineError::TrackMapWriteError {
                path: format!("{:?}", path),
                source: e,
            })?;
            info!("Track map written to {:?}", path);
        }
        None => println!("{svg}"),
    }
    Ok(())
}

fn print_readout(title: &str, readout: &LapReadout) {
    match &readout.position {
        Some(p) => println!("{title}: car at ({:.2}, {:.2}), {:.1}m", p.x, p.y, p.distance),
        None => println!("{title}: no position"),
    }
    for value in &readout.values {
        println!(
            "  {:<20} {}",
            value.channel.label(),
            value.formatted.as_deref().unwrap_or("--")
        );
    }
}

fn inspect(view: &TelemetryView, json: bool) -> Result<(), CliError> {
    let Some(result) = view.readouts() else {
        return Err(CliError::MissingLapInput);
    };
    if json {
        let out = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::ReadoutSerializeError { source: e })?;
        println!("{out}");
        return Ok(());
    }

    match result.distance {
        Some(distance) => println!("Distance {distance:.2}m"),
        None => println!("No hovered distance"),
    }
    let primary_name = view.primary().map(|v| v.name()).unwrap_or("primary");
    print_readout(primary_name, &result.primary);
    if let (Some(readout), Some(comparison)) = (&result.comparison, view.comparison()) {
        print_readout(comparison.name(), readout);
    }
    Ok(())
}

fn run(cli: Args) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::from_local_file()?.unwrap_or_default(),
    };
    match &cli.command {
        Commands::Render { lap, output } => {
            let view = build_view(config, lap)?;
            render(&view, output.as_deref())
        }
        Commands::Inspect { lap, json } => {
            let view = build_view(config, lap)?;
            inspect(&view, *json)
        }
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
