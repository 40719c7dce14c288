use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use pinmark::annotations::{Handle, InteractionController};
use pinmark::capture::FsImageResolver;
use pinmark::config::Config;
use pinmark::domain::{BoundingBox, Endpoint, Point};
use pinmark::export::{Document, PagedExporter, export_markup};

#[derive(Parser, Debug)]
#[command(name = "pinmark", version, about = "Dot and arrow annotations on document images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every image block as an HTML figure
    ExportHtml(ExportArgs),
    /// Lay out image blocks on pages and print the page content as JSON
    ExportPdf(PdfArgs),
    /// Add a dot at the image center and print its id
    AddDot(BlockArgs),
    /// Add the default arrow and print its id
    AddArrow(BlockArgs),
    /// Move a dot or one end of an arrow
    Move(MoveArgs),
    /// Delete an annotation
    Remove(AnnotationArgs),
    /// Turn an image block into an annotated image
    Convert(BlockArgs),
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Document JSON
    document: PathBuf,
    /// Write here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,
    /// Directory relative image URLs are resolved against (default: the document's)
    #[arg(long)]
    base_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PdfArgs {
    #[command(flatten)]
    export: ExportArgs,
    /// Editor content width in px
    #[arg(long)]
    editor_width: Option<f64>,
    /// JSON object of measured preview widths by block id
    #[arg(long)]
    measured: Option<PathBuf>,
    /// Remember --editor-width in the config file
    #[arg(long)]
    save_config: bool,
}

#[derive(Args, Debug)]
struct BlockArgs {
    document: PathBuf,
    block: String,
}

#[derive(Args, Debug)]
struct AnnotationArgs {
    #[command(flatten)]
    block: BlockArgs,
    annotation: String,
}

#[derive(Args, Debug)]
struct MoveArgs {
    #[command(flatten)]
    target: AnnotationArgs,
    /// Normalized x, 0..1
    x: f64,
    /// Normalized y, 0..1
    y: f64,
    /// Move an arrow's end instead of its start
    #[arg(long)]
    end: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Commands::ExportHtml(args) => command_export_html(args).await,
        Commands::ExportPdf(args) => command_export_pdf(args, config).await,
        Commands::AddDot(args) => {
            edit(&args, |controller, doc| {
                let id = controller.add_dot(doc, &args.block);
                println!("{id}");
                Ok(())
            })
            .await
        }
        Commands::AddArrow(args) => {
            edit(&args, |controller, doc| {
                let id = controller.add_arrow(doc, &args.block);
                println!("{id}");
                Ok(())
            })
            .await
        }
        Commands::Move(args) => command_move(args).await,
        Commands::Remove(args) => {
            edit(&args.block, |controller, doc| {
                // Endpoint is irrelevant for deletion
                let handle = Handle::dot(&args.annotation);
                if !controller.shift_click(doc, &args.block.block, &handle) {
                    bail!("no annotation {} on block {}", args.annotation, args.block.block);
                }
                Ok(())
            })
            .await
        }
        Commands::Convert(args) => {
            let mut doc = Document::load(&args.document).await?;
            if !doc.convert_to_annotated(&args.block) {
                bail!("no image block {}", args.block);
            }
            doc.save(&args.document).await
        }
    }
}

/// Load the document, check the block, run `f` and save
async fn edit<F>(args: &BlockArgs, f: F) -> Result<()>
where
    F: FnOnce(&mut InteractionController, &mut Document) -> Result<()>,
{
    let mut doc = Document::load(&args.document).await?;
    match doc.find(&args.block) {
        Some(block) if block.is_annotated() => {}
        Some(block) => bail!("block {} is {:?}, not an annotated image", args.block, block.kind),
        None => bail!("no block {}", args.block),
    }
    let mut controller = InteractionController::new();
    f(&mut controller, &mut doc)?;
    doc.save(&args.document).await
}

async fn command_move(args: MoveArgs) -> Result<()> {
    let target = &args.target;
    edit(&target.block, |controller, doc| {
        let endpoint = if args.end {
            Endpoint::Terminus
        } else {
            Endpoint::Origin
        };
        let handle = Handle {
            annotation_id: target.annotation.clone(),
            endpoint: Some(endpoint),
        };
        // Drag across a unit box so pixel and normalized positions coincide
        let unit = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        controller.pointer_down(&target.block.block, &handle);
        let moved = controller.pointer_move(doc, Point::new(args.x, args.y), &unit);
        controller.pointer_up();
        if !moved {
            bail!("no annotation {} on block {}", target.annotation, target.block.block);
        }
        Ok(())
    })
    .await
}

fn image_base_dir(args: &ExportArgs) -> PathBuf {
    args.base_dir.clone().unwrap_or_else(|| {
        args.document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    })
}

async fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => tokio::fs::write(path, content)
            .await
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

async fn command_export_html(args: ExportArgs) -> Result<()> {
    let doc = Document::load(&args.document).await?;
    let resolver = FsImageResolver::new(image_base_dir(&args));
    let html = export_markup(&doc, Some(&resolver)).await;
    write_output(args.out.as_deref(), &html).await
}

async fn command_export_pdf(args: PdfArgs, mut config: Config) -> Result<()> {
    let mut doc = Document::load(&args.export.document).await?;
    if let Some(path) = &args.measured {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let measured: HashMap<String, f64> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        doc.apply_measured_widths(&measured);
    }
    if config.apply_overrides(args.editor_width) && args.save_config {
        config.save();
    }

    let resolver = FsImageResolver::new(image_base_dir(&args.export));
    let exporter = PagedExporter::new(config.width_resolver(), config.block_spacing_pt, &resolver);
    let export = exporter.export(&doc).await;
    log::info!("Exported {} pages", export.pages.len());

    let json = serde_json::to_string_pretty(&export)?;
    write_output(args.export.out.as_deref(), &json).await
}
