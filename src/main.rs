use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use spectrometer_rs::config::SpectrometerConfig;
use spectrometer_rs::logger;
use spectrometer_rs::spectrometer::camera::{LoopbackStreamer, ReplayCamera, SimulatedCamera};
use spectrometer_rs::spectrometer::peripherals::{display_for, indicator_for};
use spectrometer_rs::spectrometer::{
    AcquisitionController, CameraControl, CameraDevice, CameraHandle, CameraSession, CameraWorker, CropBox,
    FileResultWriter, Measurement,
};

type Controller = AcquisitionController<CameraHandle, FileResultWriter>;

#[derive(Parser)]
#[command(name = "spectrometer")]
#[command(about = "Capture, calibrate and log spectra from a camera spectrometer")]
#[command(version)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Replay this image instead of using the simulated camera.
    #[arg(long, global = true)]
    still: Option<PathBuf>,

    /// Output directory (overrides the configuration).
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (overrides the configuration).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one prepare / measure / process cycle and exit.
    Measure(MeasureArgs),

    /// Read commands from stdin until `quit`.
    Interactive,
}

#[derive(Debug, Clone, Args)]
struct MeasureArgs {
    /// Exposure in seconds (0.1 to 5.0).
    #[arg(long)]
    exposure: Option<f64>,

    /// Crop box as left,top,right,bottom.
    #[arg(long, value_delimiter = ',')]
    crop: Option<Vec<String>>,

    /// Calibration line columns as pixel1,pixel2.
    #[arg(long, value_delimiter = ',')]
    lines: Option<Vec<String>>,

    #[arg(long)]
    scientist: Option<String>,

    #[arg(long)]
    light_source: Option<String>,

    #[arg(long)]
    sample: Option<String>,

    #[arg(long)]
    notes: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SpectrometerConfig::from_json_file(path)?,
        None => SpectrometerConfig::default(),
    };
    if let Some(output) = &cli.output {
        config.output.root = output.clone();
    }
    logger::init(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    info!("Starting spectrometer...");
    std::fs::create_dir_all(&config.output.root)
        .with_context(|| format!("cannot create output directory {}", config.output.root.display()))?;

    let mut controller = build_controller(&config, cli.still.as_ref())?;

    let result = match &cli.command {
        Commands::Measure(args) => run_measure(&mut controller, &config, args),
        Commands::Interactive => run_interactive(&mut controller, &config),
    };

    // the camera is released on every path
    let closed = controller.shutdown();
    result?;
    closed.context("closing the camera")?;
    info!("Spectrometer stopped");
    Ok(())
}

fn build_controller(config: &SpectrometerConfig, still: Option<&PathBuf>) -> Result<Controller> {
    let camera: Box<dyn CameraDevice> = match still {
        Some(path) => Box::new(ReplayCamera::from_file(path)?),
        None => Box::new(SimulatedCamera::new(config.camera.resolution).with_mount_rotation(config.camera.rotation)),
    };
    let streamer = LoopbackStreamer::new().with_overlay_file(config.output.root.join("overlay.svg"));
    let session = CameraSession::new(camera, streamer, config.session_config());
    let handle = CameraWorker::spawn(session).context("starting the camera worker")?;

    info!(
        resolution = %handle.resolution(),
        stream = %config.camera.stream_url,
        "Camera ready"
    );

    let params = config.acquisition_params(handle.resolution())?;
    let display_path = config.output.root.join(&config.peripherals.display_path);
    Ok(AcquisitionController::new(handle, config.result_writer(), params)
        .with_indicator(indicator_for(config.peripherals.indicator))
        .with_display(display_for(config.peripherals.display, display_path)))
}

fn run_measure(controller: &mut Controller, config: &SpectrometerConfig, args: &MeasureArgs) -> Result<()> {
    let mut metadata = controller.params().metadata.clone();
    for (field, value) in [
        (&mut metadata.scientist, &args.scientist),
        (&mut metadata.light_source, &args.light_source),
        (&mut metadata.sample, &args.sample),
        (&mut metadata.notes, &args.notes),
    ] {
        if let Some(value) = value {
            *field = value.clone();
        }
    }
    controller.set_metadata(metadata);

    controller.prepare()?;
    if let Some(seconds) = args.exposure {
        controller.set_exposure(seconds)?;
    }
    if let Some(crop) = &args.crop {
        controller.set_crop(crop_from(crop)?)?;
    }
    if let Some(lines) = &args.lines {
        let (pixel1, pixel2) = pair_from(lines)?;
        let anchors = controller.params().calibration.with_pixel_fields(pixel1, pixel2)?;
        controller.set_calibration(anchors)?;
    }

    let measurement = controller.measure_and_process()?;
    print_measurement(&measurement, config);
    Ok(())
}

fn run_interactive(controller: &mut Controller, config: &SpectrometerConfig) -> Result<()> {
    controller.prepare()?;
    println!("{}", controller.status());
    println!("commands: expo <s> | rotate <deg> | angle <deg> | crop <l> <t> <r> <b> | lines <p1> <p2> | measure | process | status | quit");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            continue;
        };

        let outcome = match command {
            "quit" | "exit" => break,
            "status" => Ok(()),
            "expo" => number(rest).and_then(|s| Ok(controller.set_exposure(s)?)),
            "rotate" => number(rest).and_then(|d| Ok(controller.set_rotation(d)?)),
            "angle" => number(rest).and_then(|d| Ok(controller.set_fine_angle(d)?)),
            "crop" => crop_from(rest).and_then(|crop| Ok(controller.set_crop(crop)?)),
            "lines" => pair_from(rest).and_then(|(p1, p2)| {
                let anchors = controller.params().calibration.with_pixel_fields(p1, p2)?;
                Ok(controller.set_calibration(anchors)?)
            }),
            "measure" => controller.measure().map(|_| ()).map_err(Into::into),
            "process" => controller.process().map(|m| print_measurement(&m, config)).map_err(Into::into),
            other => Err(anyhow::anyhow!("unknown command '{}'", other)),
        };

        match outcome {
            Ok(()) => println!("{}", controller.status()),
            Err(e) => {
                warn!("{:#}", e);
                println!("error: {} ({})", e, controller.status());
            }
        }
        io::stdout().flush()?;
    }
    Ok(())
}

fn number(args: &[impl AsRef<str>]) -> Result<f64> {
    let [value] = args else {
        anyhow::bail!("expected one number");
    };
    value
        .as_ref()
        .parse()
        .with_context(|| format!("'{}' is not a number", value.as_ref()))
}

fn crop_from(args: &[impl AsRef<str>]) -> Result<CropBox> {
    let fields: &[_; 4] = args.try_into().context("expected four crop values")?;
    Ok(CropBox::parse_fields(fields)?)
}

fn pair_from<S: AsRef<str>>(args: &[S]) -> Result<(&str, &str)> {
    match args {
        [first, second] => Ok((first.as_ref(), second.as_ref())),
        _ => anyhow::bail!("expected two values"),
    }
}

fn print_measurement(measurement: &Measurement, config: &SpectrometerConfig) {
    let paths = config.result_writer().paths_for(&measurement.stamp);
    println!("measurement {}", measurement.stamp);
    println!("  columns:      {}", measurement.trace.len());
    println!("  scale factor: {}", measurement.scale_factor);
    if let Some(peak) = measurement.trace.peak() {
        println!("  peak:         {:.1} nm ({:.1})", peak.wavelength, peak.intensity);
    }
    println!("  report:       {}", paths.report.display());
    println!("  data:         {}", paths.csv.display());
    println!(
        "  processing:   {:.3}ms",
        measurement.timings.total_duration().as_secs_f64() * 1000.0
    );
}
