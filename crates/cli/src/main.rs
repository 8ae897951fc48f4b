//! CLI tool for generating PowerPoint decks from a topic.

use anyhow::{Context, Result};
use clap::Parser;
use deckgen_cli::{prompts, DeckRequest, Pipeline};
use deckgen_core::outline::validate_slide_count;
use deckgen_core::{
    ContentShape, DeckOptions, LayoutStyle, OrderingPolicy, ServiceConfig, TemplateSelection,
};
use deckgen_pptx::template::template_label;
use deckgen_pptx::{DeckInspector, TemplateStore};
use deckgen_services::{CustomSearchClient, GeminiClient, HttpImageFetcher, ImageSearch};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Generate a slide deck from a topic using Gemini and Google image search.
#[derive(Parser, Debug)]
#[command(name = "deckgen")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Presentation topic (prompted for when omitted)
    #[arg(short, long)]
    topic: Option<String>,

    /// Number of content slides, at least 3 (prompted for when omitted)
    #[arg(short = 'n', long)]
    slides: Option<usize>,

    /// Directory containing .pptx templates
    #[arg(long, default_value = "templates")]
    templates: PathBuf,

    /// Use this template file instead of choosing from the directory
    #[arg(long)]
    template: Option<PathBuf>,

    /// How to choose a template: prompt or random
    #[arg(long, default_value = "prompt")]
    selection: TemplateSelection,

    /// Slide layout: fixed or adaptive
    #[arg(long, default_value = "adaptive")]
    layout: LayoutStyle,

    /// Content shape: paragraph or bullets
    #[arg(long, default_value = "paragraph")]
    content: ContentShape,

    /// Slide ordering: preserve or intro-conclusion
    #[arg(long, default_value = "intro-conclusion")]
    ordering: OrderingPolicy,

    /// Image candidates to try per slide (0-3)
    #[arg(long, default_value = "3")]
    images: u8,

    /// Skip image search entirely
    #[arg(long)]
    no_images: bool,

    /// Subtitle for the title slide
    #[arg(long)]
    subtitle: Option<String>,

    /// Suffix appended to the output file name
    #[arg(long)]
    suffix: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Gemini model (overrides GEMINI_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut config = ServiceConfig::from_env().context("Failed to load configuration")?;
    if let Some(model) = &args.model {
        config = config.with_model(model.as_str());
    }
    log::debug!("{:?}", config);

    let options = deck_options(&args);

    let topic = match &args.topic {
        Some(topic) if !topic.trim().is_empty() => topic.trim().to_string(),
        _ => prompts::topic()?,
    };
    let slide_count = match args.slides {
        Some(count) => count,
        None => prompts::slide_count()?,
    };
    validate_slide_count(slide_count)?;

    // Templates are resolved before any generation work starts.
    let template = resolve_template(&args, options.template_selection)?;
    if args.verbose {
        eprintln!("Using template: {}", template.display());
    }

    let completion = GeminiClient::new(&config)?;
    let fetcher = HttpImageFetcher::new()?;
    let search = if args.no_images || options.image_candidates == 0 {
        None
    } else if config.search_enabled() {
        Some(CustomSearchClient::new(&config)?)
    } else {
        log::warn!("Image search is not configured; slides will have no images");
        None
    };

    let pipeline = Pipeline::new(
        &completion,
        search.as_ref().map(|s| s as &dyn ImageSearch),
        &fetcher,
        &options,
    );
    let request = DeckRequest { topic, slide_count };
    let report = pipeline
        .run(&request, &template, &args.output)
        .await
        .with_context(|| format!("Failed to generate a deck on '{}'", request.topic))?;

    print_summary(&report.output_path)?;
    println!(
        "Saved {} ({} slides, {} images)",
        report.output_path.display(),
        report.slides + 1,
        report.images
    );

    Ok(())
}

fn deck_options(args: &Args) -> DeckOptions {
    DeckOptions {
        layout: args.layout,
        content_shape: args.content,
        ordering: args.ordering,
        template_selection: args.selection,
        subtitle: args.subtitle.clone(),
        output_suffix: args.suffix.clone(),
        ..DeckOptions::default()
    }
    .with_image_candidates(if args.no_images { 0 } else { args.images })
}

/// Pick the template file: explicit path, random pick, or interactive menu.
fn resolve_template(args: &Args, selection: TemplateSelection) -> Result<PathBuf> {
    if let Some(path) = &args.template {
        return Ok(path.clone());
    }

    let store = TemplateStore::new(&args.templates);
    let templates = store
        .list()
        .with_context(|| format!("No templates available in {}", store.dir().display()))?;

    match selection {
        TemplateSelection::Random => {
            let pick = store.choose_random()?;
            log::info!("Randomly selected template {}", template_label(&pick));
            Ok(pick)
        }
        TemplateSelection::Prompt => prompts::template(templates),
    }
}

/// Print each slide's first line of text from the finished file.
fn print_summary(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let slides = DeckInspector::new().read(BufReader::new(file))?;

    for slide in &slides {
        let heading = slide.texts().first().copied().unwrap_or("");
        let heading = heading.lines().next().unwrap_or("");
        let marker = if slide.pictures.is_empty() { "" } else { " [image]" };
        println!("{:>3}. {}{}", slide.number, heading, marker);
    }
    Ok(())
}
