use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use atlas_gen_core::{
    generate_with_progress, publish_static, AtlasConfig, InputManifest, JsonMap, ProgressEvent,
    SourceImage,
};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "atlas-gen",
    about = "Build multi-resolution texture atlases from a folder of images",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pack every image of a folder into multi-resolution atlases
    Generate(GenerateArgs),
    /// Create or update the input manifest.json (per-image title/url entries)
    Metadata(MetadataArgs),
    /// Publish a generation output as a static bundle (index-keyed atlas.json)
    Publish(PublishArgs),
}

#[derive(Parser, Debug, Clone)]
struct GenerateArgs {
    /// Input directory with source images (and an optional manifest.json)
    #[arg(default_value = "input_images", help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory for atlas PNGs and the manifest
    #[arg(short, long, default_value = "output_atlases", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Maximum atlas side length; defaults to the input manifest value or 2048
    #[arg(long, help_heading = "Layout")]
    max_atlas_size: Option<u32>,
    /// Pixel margin around each placed image; defaults to the manifest value or 2
    #[arg(long, help_heading = "Layout")]
    padding: Option<u32>,
    /// Maximum source image side before packing; defaults to the manifest value or max_atlas_size
    #[arg(long, help_heading = "Layout")]
    max_image_size: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
struct MetadataArgs {
    /// Input directory with source images
    #[arg(default_value = "input_images")]
    input: PathBuf,
    /// Delete manifest entries whose image file no longer exists
    #[arg(long, default_value_t = false)]
    auto_delete_missing: bool,
}

#[derive(Parser, Debug, Clone)]
struct PublishArgs {
    /// Directory holding a generation output (atlas PNGs + manifest.json)
    #[arg(default_value = "output_atlases")]
    input: PathBuf,
    /// Output directory for the static bundle
    #[arg(short, long, default_value = "output_static")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Generate(args) => run_generate(args, cli.progress && !cli.quiet),
        Commands::Metadata(args) => run_metadata(args),
        Commands::Publish(args) => run_publish(args),
    }
}

fn run_generate(args: &GenerateArgs, show_progress: bool) -> anyhow::Result<()> {
    if !args.input.is_dir() {
        anyhow::bail!("input directory not found: {}", args.input.display());
    }

    let input_manifest = read_input_manifest(&args.input);
    let cfg = resolve_config(args, input_manifest.as_ref());
    info!(
        max_atlas_size = cfg.max_atlas_size,
        padding = cfg.padding,
        max_image_size = cfg.max_image_size,
        "generation parameters"
    );

    let paths = gather_image_paths(&args.input);
    let images = load_images_with_progress(&paths, cfg.max_image_size, show_progress);
    if images.is_empty() {
        anyhow::bail!("no valid images in {}", args.input.display());
    }
    info!(count = images.len(), "loaded input images");

    let search_bar = if show_progress {
        let b = indicatif::ProgressBar::new(1);
        b.set_style(
            indicatif::ProgressStyle::with_template(
                "{spinner:.green} packing {msg} [{bar:30}] {pos}/{len}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
        Some(b)
    } else {
        None
    };
    let mut on_progress = |ev: ProgressEvent| {
        if let Some(bar) = &search_bar {
            match ev {
                ProgressEvent::Level { scale } => bar.set_message(format!("x{:02}", scale)),
                ProgressEvent::Candidate { evaluated, total } => {
                    bar.set_length(total as u64);
                    bar.set_position(evaluated as u64);
                }
                ProgressEvent::AtlasPacked { .. } | ProgressEvent::AtlasSaved { .. } => {}
            }
        }
    };
    let manifest = generate_with_progress(
        &images,
        input_manifest.as_ref(),
        &cfg,
        &args.out_dir,
        &mut on_progress,
    )
    .with_context(|| format!("generate atlases into {}", args.out_dir.display()))?;
    if let Some(bar) = &search_bar {
        bar.finish_and_clear();
    }

    let mut by_scale: BTreeMap<u32, usize> = BTreeMap::new();
    for atlas in &manifest.atlases {
        *by_scale.entry(atlas.scale).or_insert(0) += 1;
    }
    for (scale, count) in &by_scale {
        info!(scale, count, "downscale level summary");
    }
    info!(
        images = manifest.total_images,
        atlases = manifest.atlases.len(),
        "generation complete"
    );
    Ok(())
}

fn run_metadata(args: &MetadataArgs) -> anyhow::Result<()> {
    const MISSING_MARK: &str = "ERROR: Image file not found";

    if !args.input.is_dir() {
        anyhow::bail!("input directory not found: {}", args.input.display());
    }
    let manifest_path = args.input.join("manifest.json");
    let mut manifest = if manifest_path.is_file() {
        match InputManifest::load(&manifest_path) {
            Ok(m) => {
                info!(path = %manifest_path.display(), "loaded existing manifest");
                m
            }
            Err(e) => {
                warn!(error = %e, "manifest unreadable; starting a new one");
                InputManifest::default()
            }
        }
    } else {
        InputManifest::default()
    };

    let files: Vec<String> = gather_image_paths(&args.input)
        .iter()
        .filter_map(|p| p.file_name().and_then(|s| s.to_str()).map(String::from))
        .collect();
    if files.is_empty() {
        anyhow::bail!("no images found in {}", args.input.display());
    }
    let file_set: HashSet<&String> = files.iter().collect();

    let mut new_entries = 0usize;
    let mut updated = 0usize;
    let mut missing = 0usize;

    // reconcile entries against the files actually present
    let known: Vec<String> = manifest.images.keys().cloned().collect();
    for name in known {
        if file_set.contains(&name) {
            if let Some(entry) = manifest.images.get_mut(&name) {
                if entry.get("_comment").and_then(Value::as_str) == Some(MISSING_MARK) {
                    entry.remove("_comment");
                    info!(image = %name, "file found again");
                }
            }
        } else if args.auto_delete_missing {
            manifest.images.shift_remove(&name);
            missing += 1;
            info!(image = %name, "entry removed (file missing)");
        } else if let Some(entry) = manifest.images.get_mut(&name) {
            if entry.get("_comment").and_then(Value::as_str) != Some(MISSING_MARK) {
                entry.insert("_comment".to_string(), Value::String(MISSING_MARK.into()));
                missing += 1;
                warn!(image = %name, "file missing");
            }
        }
    }

    // new files get a skeleton entry at the end; existing entries keep order
    for name in &files {
        match manifest.images.get_mut(name) {
            None => {
                let mut entry = JsonMap::new();
                entry.insert("title".to_string(), Value::String(String::new()));
                entry.insert("url".to_string(), Value::String(String::new()));
                manifest.images.insert(name.clone(), entry);
                new_entries += 1;
            }
            Some(entry) => {
                for key in ["title", "url"] {
                    if !entry.contains_key(key) {
                        entry.insert(key.to_string(), Value::String(String::new()));
                        updated += 1;
                    }
                }
            }
        }
    }

    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
        .with_context(|| format!("write {}", manifest_path.display()))?;
    info!(
        total = manifest.images.len(),
        new = new_entries,
        updated,
        missing,
        path = %manifest_path.display(),
        "manifest updated"
    );
    Ok(())
}

fn run_publish(args: &PublishArgs) -> anyhow::Result<()> {
    let summary = publish_static(&args.input, &args.out_dir)
        .with_context(|| format!("publish {}", args.input.display()))?;
    info!(
        atlases = summary.atlases,
        images = summary.images,
        copied = summary.copied,
        out = %args.out_dir.display(),
        "static bundle written"
    );
    Ok(())
}

fn read_input_manifest(input: &Path) -> Option<InputManifest> {
    let path = input.join("manifest.json");
    if !path.is_file() {
        return None;
    }
    match InputManifest::load(&path) {
        Ok(m) => {
            info!(path = %path.display(), images = m.images.len(), "input manifest loaded");
            Some(m)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "input manifest unreadable; using defaults");
            None
        }
    }
}

/// Explicit flags win over input-manifest parameters, which win over the
/// defaults (2048 / 2 / max_atlas_size).
fn resolve_config(args: &GenerateArgs, manifest: Option<&InputManifest>) -> AtlasConfig {
    let max_atlas_size = args
        .max_atlas_size
        .or_else(|| manifest.and_then(|m| m.max_atlas_size()))
        .unwrap_or(2048);
    let padding = args
        .padding
        .or_else(|| manifest.and_then(|m| m.padding()))
        .unwrap_or(2);
    let max_image_size = args
        .max_image_size
        .or_else(|| manifest.and_then(|m| m.max_image_size()))
        .unwrap_or(max_atlas_size);
    AtlasConfig {
        max_atlas_size,
        padding,
        max_image_size,
    }
}

fn gather_image_paths(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && atlas_gen_core::is_supported_image(p))
        .collect()
}

fn load_images_with_progress(
    paths: &[PathBuf],
    max_image_size: u32,
    progress: bool,
) -> Vec<SourceImage> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
            )
            .unwrap(),
        );
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match SourceImage::load(p, max_image_size) {
            Ok(img) => list.push(img),
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    list
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
