//! transectaz CLI - Transect azimuths for soil survey lines

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use transectaz_algorithms::statistics::{
    linear_directional_mean, DirectionalMeanParams, FIELD_COMPASS_ANGLE,
};
use transectaz_algorithms::transect::{
    MessageSink, PipelineParams, PipelineReport, PipelineStage, RoundingMode,
    TransectAzimuthPipeline, DEFAULT_ID_FIELD, METERS_TO_FEET,
};
use transectaz_core::io::read_shapefile;
use transectaz_core::map::{LayerPosition, MapSession};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "transectaz")]
#[command(author, version, about = "Transect azimuths for soil survey lines", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Renumber, summarise, prune, normalize and publish a transect dataset
    Run {
        /// Input polyline shapefile
        input: PathBuf,
        /// Map document receiving the output layer
        #[arg(short, long)]
        map: Option<PathBuf>,
        /// Identifier field, renumbered and used to group transects
        #[arg(short, long, default_value = DEFAULT_ID_FIELD)]
        id_field: String,
        /// Treat lines as undirected
        #[arg(short, long)]
        orientation_only: bool,
        /// Tie-breaking rule for whole-degree azimuths
        #[arg(short, long, value_enum, default_value_t = Rounding::HalfAway)]
        rounding: Rounding,
        /// Multiplier applied to mean lengths
        #[arg(short, long, default_value_t = METERS_TO_FEET)]
        factor: f64,
        /// Put the layer at the bottom of the stack instead of the top
        #[arg(long)]
        bottom: bool,
    },
    /// Show information about a line shapefile
    Info {
        /// Input polyline shapefile
        input: PathBuf,
    },
    /// Map document management
    Map {
        #[command(subcommand)]
        action: MapCommands,
    },
}

#[derive(Subcommand)]
enum MapCommands {
    /// Create an empty map document
    Init {
        /// Map document path
        map: PathBuf,
        /// Map title
        #[arg(short, long, default_value = "Untitled")]
        title: String,
    },
    /// List the layers of a map document, top first
    Layers {
        /// Map document path
        map: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Rounding {
    /// 0.5 rounds away from zero
    HalfAway,
    /// 0.5 rounds to even
    HalfEven,
}

impl From<Rounding> for RoundingMode {
    fn from(r: Rounding) -> Self {
        match r {
            Rounding::HalfAway => RoundingMode::HalfAwayFromZero,
            Rounding::HalfEven => RoundingMode::HalfEven,
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Prints each stage message above the spinner and moves the spinner on
struct SpinnerSink {
    pb: ProgressBar,
}

impl MessageSink for SpinnerSink {
    fn message(&mut self, stage: PipelineStage, text: &str) {
        info!(%stage, "{}", text);
        self.pb.println(format!("  {}", text));
        let next = stage.next();
        if next != PipelineStage::Done {
            self.pb.set_message(format!("{}...", next));
        }
    }
}

fn done(report: &PipelineReport) {
    println!("Transect azimuths saved to: {}", report.output.display());
    println!(
        "  {} transects, {} records, layer {}",
        report.renumbered, report.groups, report.layer_name
    );
    println!("  Processing time: {:.2?}", report.elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Run ──────────────────────────────────────────────────────
        Commands::Run {
            input,
            map,
            id_field,
            orientation_only,
            rounding,
            factor,
            bottom,
        } => {
            let mut session = match map {
                Some(path) => Some(
                    MapSession::open(&path)
                        .with_context(|| format!("Failed to open map {}", path.display()))?,
                ),
                None => None,
            };
            let params = PipelineParams {
                id_field,
                orientation_only,
                rounding: rounding.into(),
                length_factor: factor,
                layer_position: if bottom {
                    LayerPosition::Bottom
                } else {
                    LayerPosition::Top
                },
                ..Default::default()
            };

            let pipeline = TransectAzimuthPipeline::new(params);
            let mut sink = SpinnerSink {
                pb: spinner(&format!("{}...", PipelineStage::Renumbering)),
            };
            let result = pipeline.run(&input, session.as_mut(), &mut sink);
            sink.pb.finish_and_clear();
            let report = result.context("Failed to compute transect azimuths")?;
            done(&report);
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let pb = spinner("Reading shapefile...");
            let dataset = read_shapefile(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            pb.finish_and_clear();

            let features = &dataset.features;
            println!("File: {}", input.display());
            println!("Geometry: {}", dataset.kind);
            println!("Features: {}", features.len());
            match features.crs() {
                Some(crs) => println!("CRS: {}", crs.name().unwrap_or("unnamed")),
                None => println!("CRS: none (no .prj)"),
            }
            println!("\nFields:");
            for field in features.schema().fields() {
                println!("  {:<10} {}", field.name, field.kind);
            }

            if !features.is_empty() {
                match linear_directional_mean(features, &DirectionalMeanParams::default()) {
                    Ok(records) => {
                        if let Some(all) = records.first() {
                            println!("\nOverall trend:");
                            println!("  {}: {:.2}", FIELD_COMPASS_ANGLE, all.compass_angle);
                            println!("  Circular variance: {:.4}", all.circular_variance);
                            println!("  Mean length: {:.3}", all.mean_length);
                        }
                    }
                    Err(e) => println!("\nOverall trend: unavailable ({})", e),
                }
            }
        }

        // ── Map ──────────────────────────────────────────────────────
        Commands::Map { action } => match action {
            MapCommands::Init { map, title } => {
                MapSession::create(&map, title)
                    .with_context(|| format!("Failed to create map {}", map.display()))?;
                println!("Map created: {}", map.display());
            }
            MapCommands::Layers { map } => {
                let session = MapSession::open(&map)
                    .with_context(|| format!("Failed to open map {}", map.display()))?;
                let doc = session.document();
                println!("Map: {}", doc.title);
                if doc.layers.is_empty() {
                    println!("  (no layers)");
                }
                for (i, layer) in doc.layers.iter().enumerate() {
                    println!(
                        "  {:>2}. {}{} ({})",
                        i + 1,
                        layer.name,
                        if layer.visible { "" } else { " [hidden]" },
                        layer.source.display()
                    );
                }
            }
        },
    }

    Ok(())
}
