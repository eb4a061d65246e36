//! CLI tool for extracting, matching and applying slide deck designs.

mod input;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use deckstyle_backend::HttpBackend;
use deckstyle_core::presets::builtin_presets;
use deckstyle_core::{ExemplarScope, ExtractedDesign, SlideSpec};
use deckstyle_engine::{DesignEngine, EngineConfig, OutlineOptions, Refinement};
use deckstyle_store::SqliteExemplarStore;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Extract slide designs from images, match them to new decks and
/// synthesize styled outlines.
#[derive(Parser, Debug)]
#[command(name = "deckstyle")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "DECKSTYLE_CONFIG")]
    config: Option<PathBuf>,

    /// Exemplar database
    #[arg(long, global = true, env = "DECKSTYLE_DB", default_value = "deckstyle.db")]
    db: PathBuf,

    /// Override the backend base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override the per-call timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the design of one slide image
    Extract {
        /// Image URL, data URI or local file
        image: String,

        /// Topic keywords (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Store the result under this category
        #[arg(long)]
        store: Option<String>,

        /// Uploader id recorded with a stored exemplar
        #[arg(long, requires = "store")]
        uploader: Option<String>,
    },

    /// Analyze many images into one category (e.g. `user-set:<id>`)
    Import {
        /// Image URLs, data URIs or local files
        #[arg(required = true)]
        images: Vec<String>,

        #[arg(long)]
        category: String,

        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,

        #[arg(long)]
        uploader: Option<String>,
    },

    /// Rank stored exemplars for a request
    Match {
        /// What the deck should look like
        #[arg(short, long, default_value = "")]
        prompt: String,

        /// File with content sample
        #[arg(long)]
        content: Option<PathBuf>,

        /// Explicit keywords; skips keyword extraction
        #[arg(short, long, value_delimiter = ',')]
        keywords: Vec<String>,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Only this curated set
        #[arg(long, conflicts_with = "uploader")]
        set: Option<String>,

        /// Prefer this uploader's exemplars
        #[arg(long)]
        uploader: Option<String>,

        /// Count the returned matches as used
        #[arg(long)]
        record_usage: bool,
    },

    /// Merge extracted designs from JSON files into one style
    Aggregate {
        /// Files with one design or an array of designs
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show the most recently curated set, aggregated
    ActiveSet,

    /// Synthesize a styled slide outline
    Outline {
        /// Source text file
        source: PathBuf,

        #[arg(short, long)]
        prompt: Option<String>,

        /// Built-in preset id (see `presets`)
        #[arg(long)]
        preset: Option<String>,

        /// Number of matched exemplars to apply
        #[arg(long, default_value = "0")]
        matches: usize,

        /// Apply the active curated set
        #[arg(long)]
        active_set: bool,

        /// Change request for an existing outline
        #[arg(long, requires = "prior")]
        refine: Option<String>,

        /// Outline JSON to refine
        #[arg(long)]
        prior: Option<PathBuf>,
    },

    /// List built-in presets
    Presets,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let config = load_config(&args)?;
    let db = args.db.clone();
    let open_engine = move || -> Result<Engine> {
        let backend = HttpBackend::new(config.http_backend_config())
            .context("Failed to create HTTP backend")?;
        let store = SqliteExemplarStore::open(&db)
            .with_context(|| format!("Failed to open {}", db.display()))?;
        Ok(DesignEngine::new(backend, store, config))
    };

    run(args.command, open_engine)
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(base_url) = &args.base_url {
        config.backend.base_url = base_url.clone();
    }
    if let Some(timeout) = args.timeout {
        config.backend.timeout_secs = timeout;
    }
    config.validate()?;
    Ok(config)
}

type Engine = DesignEngine<HttpBackend, SqliteExemplarStore>;

/// Run one command; the engine is only opened for commands that need it.
fn run<F>(command: Command, open_engine: F) -> Result<()>
where
    F: FnOnce() -> Result<Engine>,
{
    match command {
        Command::Presets => print_json(&builtin_presets()),

        Command::Aggregate { files } => {
            let designs = read_designs(&files)?;
            print_json(&deckstyle_core::aggregate(&designs))
        }

        Command::Extract {
            image,
            keywords,
            store,
            uploader,
        } => {
            let engine = open_engine()?;
            let image_ref = input::image_ref(&image)?;
            match store {
                Some(category) => print_json(&engine.extract_and_store(
                    &image_ref,
                    &keywords,
                    &category,
                    uploader.as_deref(),
                )?),
                None => print_json(&engine.extract_design(&image_ref, &keywords)?),
            }
        }

        Command::Import {
            images,
            category,
            keywords,
            uploader,
        } => {
            let engine = open_engine()?;
            let mut stored = Vec::new();
            for image in &images {
                log::info!("Processing: {}", image);
                let result = input::image_ref(image).and_then(|image_ref| {
                    engine
                        .extract_and_store(&image_ref, &keywords, &category, uploader.as_deref())
                        .map_err(Into::into)
                });
                match result {
                    Ok(exemplar) => stored.push(exemplar),
                    // Credential and quota failures stop the whole import
                    Err(e) if is_configuration(&e) => return Err(e),
                    Err(e) => eprintln!("Error processing {}: {}", image, e),
                }
            }
            print_json(&stored)
        }

        Command::Match {
            prompt,
            content,
            keywords,
            limit,
            set,
            uploader,
            record_usage,
        } => {
            let engine = open_engine()?;
            let scope = ExemplarScope {
                set_id: set,
                uploader_id: uploader,
            };
            let matches = if keywords.is_empty() {
                let content = match content {
                    Some(path) => input::read_text(&path)?,
                    None => String::new(),
                };
                engine.match_designs(&prompt, &content, limit, &scope)?
            } else {
                engine.match_keywords(&keywords, limit, &scope)?
            };

            if record_usage {
                let ids: Vec<&str> = matches.iter().map(|m| m.design_id.as_str()).collect();
                engine.record_usage(ids.as_slice())?;
            }
            print_json(&matches)
        }

        Command::ActiveSet => print_json(&open_engine()?.active_aggregated_set()?),

        Command::Outline {
            source,
            prompt,
            preset,
            matches,
            active_set,
            refine,
            prior,
        } => {
            let engine = open_engine()?;
            let text = input::read_text(&source)?;

            let matched = if matches > 0 {
                engine.match_designs(
                    prompt.as_deref().unwrap_or(""),
                    &text,
                    Some(matches),
                    &ExemplarScope::default(),
                )?
            } else {
                Vec::new()
            };
            let aggregated = if active_set {
                match engine.active_aggregated_set()? {
                    Some(set) => Some(set.spec),
                    None => {
                        log::warn!("No active design set; continuing without one");
                        None
                    }
                }
            } else {
                None
            };
            let refinement = match (refine, prior) {
                (Some(instruction), Some(path)) => Some(Refinement {
                    instruction,
                    prior_slides: read_prior_slides(&path)?,
                }),
                _ => None,
            };

            let options = OutlineOptions {
                preset,
                matched,
                aggregated,
                refinement,
            };
            let outline = engine.synthesize_outline(&text, prompt.as_deref(), &options)?;

            let ids: Vec<&str> = options.matched.iter().map(|m| m.design_id.as_str()).collect();
            if !ids.is_empty() {
                engine.record_usage(ids.as_slice())?;
            }
            print_json(&outline)
        }
    }
}

fn is_configuration(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<deckstyle_core::Error>()
        .is_some_and(|e| e.is_configuration())
}

/// Read designs from JSON files holding one design or an array.
fn read_designs(files: &[PathBuf]) -> Result<Vec<ExtractedDesign>> {
    let mut designs = Vec::new();
    for path in files {
        let text = input::read_text(path)?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;
        match value {
            serde_json::Value::Array(items) => {
                for item in items {
                    designs.push(
                        serde_json::from_value(item)
                            .with_context(|| format!("Invalid design in {}", path.display()))?,
                    );
                }
            }
            other => designs.push(
                serde_json::from_value(other)
                    .with_context(|| format!("Invalid design in {}", path.display()))?,
            ),
        }
    }
    Ok(designs)
}

/// Read prior slides from an outline (`{"slides": [...]}`) or a bare array.
fn read_prior_slides(path: &Path) -> Result<Vec<SlideSpec>> {
    let text = input::read_text(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let slides = match value {
        serde_json::Value::Object(mut object) => match object.remove("slides") {
            Some(slides) => slides,
            None => bail!("{} has no slides", path.display()),
        },
        other => other,
    };
    serde_json::from_value(slides).with_context(|| format!("Invalid slides in {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
