use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "coverkit", version)]
struct Cli {
    /// Log at debug level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a document (or a template's state) as a PNG.
    Export(ExportArgs),
    /// List the built-in resolution presets.
    Presets,
    /// Load a document and report its layer count.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input document or template JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory the PNG is written into.
    #[arg(long)]
    out_dir: PathBuf,

    /// Base directory for relative image paths. Defaults to the input file's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Directory with .ttf/.otf fonts for text layers.
    #[arg(long)]
    fonts: Option<PathBuf>,

    /// Editor config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Oversampling factor (1..=8).
    #[arg(long)]
    oversample: Option<u32>,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input document or template JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Presets => cmd_presets(),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<coverkit::Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("open document '{}'", path.display()))?;
    let doc = coverkit::template::load_document_json(&text)
        .with_context(|| format!("load document '{}'", path.display()))?;
    Ok(doc)
}

fn load_config(args: &ExportArgs) -> anyhow::Result<coverkit::EditorConfig> {
    let mut cfg = match &args.config {
        Some(path) => coverkit::EditorConfig::from_json_file(path)?,
        None => coverkit::EditorConfig::default(),
    }
    .with_env_overrides();

    let assets_root = args
        .assets
        .clone()
        .or_else(|| cfg.assets_root.clone())
        .unwrap_or_else(|| {
            args.in_path
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        });
    cfg = cfg.with_assets_root(assets_root);
    if let Some(fonts) = &args.fonts {
        cfg = cfg.with_fonts_dir(fonts);
    }
    if let Some(n) = args.oversample {
        let export = cfg.export.clone().with_oversample(n);
        cfg = cfg.with_export(export);
    }
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args)?;
    let doc = read_document(&args.in_path)?;
    tracing::info!(
        layers = doc.layers.len(),
        w = doc.width,
        h = doc.height,
        "loaded document"
    );

    let mut rasterizer = coverkit::CpuRasterizer::from_config(&cfg)?;
    let mut session = coverkit::EditorSession::with_document(doc, cfg);
    let artifact = session
        .export_now(&mut rasterizer, coverkit::foundation::core::now_ms())
        .context("export cover")?;
    let path = artifact.write_to_dir(&args.out_dir)?;

    println!("{}", path.display());
    Ok(())
}

fn cmd_presets() -> anyhow::Result<()> {
    for p in coverkit::PRESETS {
        println!("{:>5}x{:<5} {:<5} {}", p.width, p.height, p.ratio_label, p.label);
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    println!(
        "ok: {} layers, {}x{} ({})",
        doc.layers.len(),
        doc.width,
        doc.height,
        doc.aspect_ratio_label
    );
    Ok(())
}
