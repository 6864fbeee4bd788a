//! Command-line interface for the drone survey tools.

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{DxfConfig, PerturbationScheme, PlaneConfig};
use crate::processors::facets::FacetSummary;
use crate::processors::plane::PlaneEvaluator;
use crate::SurveyConfig;

#[derive(Parser)]
#[command(name = "drone-survey")]
#[command(about = "Drone survey post-processing tools", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Perturbed-variant enumeration for the variance analysis.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemeArg {
    /// All 512 ± combinations of the nine coordinates
    Corners,
    /// Each coordinate displaced alone (18 variants)
    Axes,
}

impl From<SchemeArg> for PerturbationScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Corners => PerturbationScheme::Corners,
            SchemeArg::Axes => PerturbationScheme::Axes,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Dip, dip direction and area of 3-point faces (DXF POINT triples)
    Faces {
        /// Input DXF file
        input: PathBuf,
        /// Output CSV (defaults to <input>_geological_analysis.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Coordinate perturbation for the variance analysis (0 disables it)
        #[arg(short, long)]
        perturbation: Option<f64>,
        /// Variance perturbation scheme
        #[arg(long, value_enum)]
        scheme: Option<SchemeArg>,
        /// Also plot the facet poles to this PNG
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Geological report for three-vertex DXF polylines
    Vertices {
        /// Input DXF file
        input: PathBuf,
        /// Output CSV (defaults to <input>_vertices.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Coordinate perturbation for the variance analysis (0 disables it)
        #[arg(short, long)]
        perturbation: Option<f64>,
        /// Variance perturbation scheme
        #[arg(long, value_enum)]
        scheme: Option<SchemeArg>,
        /// Only read polylines on layers starting with this prefix
        #[arg(long)]
        layer_prefix: Option<String>,
        /// Also plot the facet poles to this PNG
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Interpolate camera positions from .MRK and .pos files
    Camera {
        /// Directory holding the JPG images, the .MRK and the .pos file
        directory: PathBuf,
        /// Output directory (defaults to the image directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Also plot the camera track to this PNG
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Correct every RINEX .obs file in a directory
    Rinex {
        /// Directory containing .obs files
        directory: PathBuf,
    },

    /// Plot facet poles on an equal-area stereonet (PNG)
    Stereonet {
        /// Input DXF file
        input: PathBuf,
        /// Output PNG file path (defaults to same name as the DXF with .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Read facets from polylines instead of POINT triples
        #[arg(long)]
        polylines: bool,
    },

    /// Write the default configuration to a YAML file
    InitConfig {
        /// Output path
        #[arg(default_value = "drone-survey.yaml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match SurveyConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                SurveyConfig::default()
            }
        },
        None => SurveyConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Faces { input, output, perturbation, scheme, plot } => {
            let evaluator = build_evaluator(&config.plane, perturbation, scheme);
            cmd_faces(&input, output.as_deref(), &evaluator, plot.as_deref());
        }
        Commands::Vertices { input, output, perturbation, scheme, layer_prefix, plot } => {
            let evaluator = build_evaluator(&config.plane, perturbation, scheme);
            let mut dxf = config.dxf.clone();
            if let Some(prefix) = layer_prefix {
                dxf.polyline_layer_prefix = prefix;
            }
            cmd_vertices(&input, output.as_deref(), &evaluator, &dxf, plot.as_deref());
        }
        Commands::Camera { directory, output_dir, plot } => {
            cmd_camera(&directory, output_dir.as_deref(), plot.as_deref(), &config);
        }
        Commands::Rinex { directory } => {
            cmd_rinex(&directory, &config);
        }
        Commands::Stereonet { input, output, polylines } => {
            cmd_stereonet(&input, output, polylines, &config);
        }
        Commands::InitConfig { path, force } => {
            cmd_init_config(&path, force);
        }
    }
}

/// Plane evaluator from the config, with command-line overrides.
fn build_evaluator(
    config: &PlaneConfig,
    perturbation: Option<f64>,
    scheme: Option<SchemeArg>,
) -> PlaneEvaluator {
    let plane = PlaneConfig {
        perturbation: perturbation.unwrap_or(config.perturbation),
        scheme: scheme.map(Into::into).unwrap_or(config.scheme),
        collinear_tolerance: config.collinear_tolerance,
    };
    PlaneEvaluator::from_config(&plane)
}

/// Comma-separated labels, or `-` when there are none.
fn label_list(labels: &[&str]) -> String {
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(", ")
    }
}

fn facet_summary_items(
    summary: &FacetSummary,
    evaluator: &PlaneEvaluator,
) -> Vec<(&'static str, String)> {
    let skipped: Vec<&str> = summary
        .batch
        .skipped
        .iter()
        .map(|s| s.label.as_str())
        .collect();
    vec![
        ("Input file", summary.input.display().to_string()),
        ("Output file", summary.output.display().to_string()),
        ("Facets evaluated", summary.batch.evaluated().to_string()),
        ("Facets skipped", summary.batch.skipped.len().to_string()),
        ("Skipped", label_list(&skipped)),
        ("Perturbation", evaluator.perturbation.to_string()),
        ("Scheme", format!("{:?}", evaluator.scheme)),
    ]
}

fn plot_summary_poles(summary: &FacetSummary, plot: &Path) {
    use crate::visualization;

    if let Err(e) = visualization::plot_poles(plot, &summary.batch.measurements()) {
        warn!("Failed to plot poles of {}: {}", summary.input.display(), e);
    }
}

fn cmd_faces(
    input: &Path,
    output: Option<&Path>,
    evaluator: &PlaneEvaluator,
    plot: Option<&Path>,
) {
    use crate::processors::facets;

    let start = Instant::now();

    println!("Evaluating 3-point faces...");
    println!("Input: {}", input.display());

    let spinner = create_spinner("Reading DXF points and evaluating faces...");

    match facets::run_faces(input, output, evaluator) {
        Ok(summary) => {
            if let Some(plot) = plot {
                spinner.set_message("Plotting poles...");
                plot_summary_poles(&summary, plot);
            }
            spinner.finish_and_clear();

            let mut items = facet_summary_items(&summary, evaluator);
            items.push(("Duration", format!("{:.2?}", start.elapsed())));
            print_summary("Face Analysis Complete", &items);
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Face analysis failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_vertices(
    input: &Path,
    output: Option<&Path>,
    evaluator: &PlaneEvaluator,
    dxf: &DxfConfig,
    plot: Option<&Path>,
) {
    use crate::processors::facets;

    let start = Instant::now();

    println!("Evaluating polyline facets...");
    println!("Input: {}", input.display());
    println!("Layer prefix: {:?}", dxf.polyline_layer_prefix);

    let spinner = create_spinner("Reading DXF polylines and evaluating facets...");

    match facets::run_vertices(input, output, evaluator, dxf) {
        Ok(summary) => {
            if let Some(plot) = plot {
                spinner.set_message("Plotting poles...");
                plot_summary_poles(&summary, plot);
            }
            spinner.finish_and_clear();

            let mut items = facet_summary_items(&summary, evaluator);
            items.push(("Duration", format!("{:.2?}", start.elapsed())));
            print_summary("Polyline Analysis Complete", &items);
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Polyline analysis failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_camera(
    directory: &Path,
    output_dir: Option<&Path>,
    plot: Option<&Path>,
    config: &SurveyConfig,
) {
    use crate::processors::camera;
    use crate::visualization;

    let start = Instant::now();

    println!("Calculating camera positions...");
    println!("Directory: {}", directory.display());

    let spinner = create_spinner("Matching images with timestamps and positions...");

    match camera::run_camera(directory, output_dir, &config.camera) {
        Ok(summary) => {
            if let Some(plot) = plot {
                spinner.set_message("Plotting camera track...");
                if let Err(e) = visualization::plot_camera_track(plot, &summary.positions) {
                    warn!("Failed to plot camera track: {}", e);
                }
            }
            spinner.finish_and_clear();

            let unmatched: Vec<&str> = summary
                .unmatched
                .iter()
                .map(|u| u.image_name.as_str())
                .collect();

            print_summary(
                "Camera Positions Complete",
                &[
                    ("Directory", directory.display().to_string()),
                    ("Output file", summary.output.display().to_string()),
                    ("Images found", summary.images.to_string()),
                    ("Positions written", summary.positions.len().to_string()),
                    ("Unmatched images", summary.unmatched.len().to_string()),
                    ("Unmatched", label_list(&unmatched)),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Camera position calculation failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_rinex(directory: &Path, config: &SurveyConfig) {
    use crate::processors::rinex;

    let start = Instant::now();

    println!("Correcting RINEX observation files...");
    println!("Directory: {}", directory.display());

    let spinner = create_spinner("Correcting .obs files...");

    match rinex::run_rinex(directory, &config.rinex) {
        Ok(summary) => {
            spinner.finish_and_clear();

            for (input, reason) in &summary.failed {
                error!("{}: {}", input.display(), reason);
            }

            print_summary(
                "RINEX Correction Complete",
                &[
                    ("Directory", directory.display().to_string()),
                    ("Files found", summary.total().to_string()),
                    ("Files corrected", summary.corrected.len().to_string()),
                    ("Files failed", summary.failed.len().to_string()),
                    ("Suffix", config.rinex.suffix.clone()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );

            if !summary.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("RINEX correction failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_stereonet(input: &Path, output: Option<PathBuf>, polylines: bool, config: &SurveyConfig) {
    use crate::processors::facets;
    use crate::visualization;

    let start = Instant::now();

    // Determine output path (default to same name as input with .png extension)
    let output_path = output.unwrap_or_else(|| input.with_extension("png"));

    println!("Plotting facet poles...");
    println!("Input: {}", input.display());
    println!("Output: {}", output_path.display());

    let spinner = create_spinner("Evaluating facets...");

    // Orientation only; the variance analysis is not needed for the plot
    let evaluator = PlaneEvaluator::from_config(&config.plane).with_perturbation(0.0);
    let batch = if polylines {
        facets::analyze_polylines(input, &evaluator, &config.dxf)
    } else {
        facets::analyze_points(input, &evaluator)
    };

    let batch = match batch {
        Ok(b) => b,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Failed to evaluate facets: {:#}", e);
            std::process::exit(1);
        }
    };

    spinner.set_message("Generating plot...");

    match visualization::plot_poles(&output_path, &batch.measurements()) {
        Ok(()) => {
            spinner.finish_and_clear();

            print_summary(
                "Stereonet Complete",
                &[
                    ("Input file", input.display().to_string()),
                    ("Output PNG", output_path.display().to_string()),
                    ("Poles plotted", batch.records.len().to_string()),
                    ("Facets skipped", batch.skipped.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Visualization failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_init_config(path: &Path, force: bool) {
    if path.exists() && !force {
        error!("{} already exists (use --force to overwrite)", path.display());
        std::process::exit(1);
    }

    match SurveyConfig::default().to_yaml(path) {
        Ok(()) => println!("Wrote default configuration to {}", path.display()),
        Err(e) => {
            error!("Failed to write {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
