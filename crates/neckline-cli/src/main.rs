mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Settings;
use neckline_core::annotate::annotate;
use neckline_core::{
    Canvas, GarmentAsset, Landmarks, NeckSegmenter, PlacementEngine, PrecomputedMask,
    SearchStrategy, SegmentationMask,
};
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "neckline", about = "Place a necklace on a portrait", version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Inputs {
    /// Portrait to edit
    #[arg(long)]
    image: PathBuf,
    /// Landmarks as JSON, or @path to a JSON file
    #[arg(long)]
    landmarks: String,
    /// Grayscale neck segmentation mask
    #[arg(long)]
    mask: Option<PathBuf>,
    /// Refine mask hits along their row toward the neck contour
    #[arg(long)]
    refine: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite a necklace onto the portrait
    Apply {
        #[command(flatten)]
        inputs: Inputs,
        /// Necklace file, or name in the asset directory
        #[arg(long)]
        necklace: Option<String>,
        /// Output image (default: <image>_necklace.<ext>)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the resolved neck anchors as JSON
    Locate {
        #[command(flatten)]
        inputs: Inputs,
    },
    /// Check whether the necklace fits, without compositing
    Check {
        #[command(flatten)]
        inputs: Inputs,
        #[arg(long)]
        necklace: Option<String>,
    },
    /// Draw landmarks and anchors on the portrait
    Annotate {
        #[command(flatten)]
        inputs: Inputs,
        #[arg(long)]
        out: PathBuf,
    },
    /// List available necklaces
    Assets,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Apply {
            inputs,
            necklace,
            out,
        } => {
            let loaded = Loaded::open(&inputs, &mut settings)?;
            let asset = open_necklace(&settings, necklace.as_deref())?;
            let engine = PlacementEngine::new(settings.placement.clone());
            let result = engine
                .apply(&loaded.canvas, &asset, &loaded.landmarks, loaded.mask.as_ref())
                .context("necklace placement failed")?;

            let out = out.unwrap_or_else(|| default_output(&inputs.image));
            result
                .save(&out)
                .with_context(|| format!("failed to save {}", out.display()))?;
            println!("{}", out.display());
        }
        Commands::Locate { inputs } => {
            let loaded = Loaded::open(&inputs, &mut settings)?;
            let engine = PlacementEngine::new(settings.placement.clone());
            let anchors =
                engine.locate(&loaded.landmarks, loaded.mask.as_ref(), loaded.canvas.height());
            println!("{}", serde_json::to_string_pretty(&anchors)?);
        }
        Commands::Check { inputs, necklace } => {
            let loaded = Loaded::open(&inputs, &mut settings)?;
            let asset = open_necklace(&settings, necklace.as_deref())?;
            let engine = PlacementEngine::new(settings.placement.clone());
            let report = match engine.plan(
                &loaded.landmarks,
                loaded.mask.as_ref(),
                &asset,
                loaded.canvas.shape(),
            ) {
                Ok(placement) => json!({ "status": "ok", "placement": placement }),
                Err(e) => json!({
                    "status": "rejected",
                    "reason": e.to_string(),
                    "anchors": e.anchors(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Annotate { inputs, out } => {
            let loaded = Loaded::open(&inputs, &mut settings)?;
            let engine = PlacementEngine::new(settings.placement.clone());
            let anchors =
                engine.locate(&loaded.landmarks, loaded.mask.as_ref(), loaded.canvas.height());
            annotate(&loaded.canvas, &loaded.landmarks, Some(&anchors))
                .save(&out)
                .with_context(|| format!("failed to save {}", out.display()))?;
            println!("{}", out.display());
        }
        Commands::Assets => {
            let default_path = settings.asset_dir.join(&settings.default_necklace);
            let necklaces = settings.catalogue().unwrap_or_else(|e| {
                tracing::warn!("{e:#}");
                Vec::new()
            });
            let report = json!({
                "asset_dir": settings.asset_dir,
                "default_necklace": settings.default_necklace,
                "default_found": default_path.is_file(),
                "necklaces": necklaces,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Inputs shared by every placement subcommand.
struct Loaded {
    canvas: Canvas,
    landmarks: Landmarks,
    mask: Option<SegmentationMask>,
}

impl Loaded {
    fn open(inputs: &Inputs, settings: &mut Settings) -> Result<Self> {
        if inputs.refine {
            settings.placement.strategy = SearchStrategy::VerticalThenHorizontal;
        }
        let canvas = Canvas::open(&inputs.image)?;
        let landmarks = parse_landmarks(&inputs.landmarks)?;
        let mask = match &inputs.mask {
            Some(path) => {
                let segmenter = PrecomputedMask::open(path, settings.placement.mask_threshold)?;
                segmenter.segment(&canvas)?
            }
            None => None,
        };
        Ok(Self {
            canvas,
            landmarks,
            mask,
        })
    }
}

fn open_necklace(settings: &Settings, necklace: Option<&str>) -> Result<GarmentAsset> {
    let path = settings.necklace_path(necklace)?;
    Ok(GarmentAsset::open(path)?)
}

/// Inline JSON, or `@path` to read it from a file.
fn parse_landmarks(arg: &str) -> Result<Landmarks> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read landmarks {path}"))?,
        None => arg.to_string(),
    };
    Landmarks::from_json(&text).context("invalid landmarks JSON")
}

fn default_output(image: &Path) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = image
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    image.with_file_name(format!("{stem}_necklace.{ext}"))
}
