use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use coastwatch::classify::{ClassificationInput, SentimentScorer};
use coastwatch::config::Config;
use coastwatch::db::models::PostFilter;
use coastwatch::db::PostStore;
use coastwatch::output::terminal;
use coastwatch::pipeline::extract::{ExtractionPipeline, ExtractionReport, RawPost};
use coastwatch::pipeline::store::store_posts;

/// coastwatch: rule-based ocean hazard classification for social posts.
///
/// Classifies free text into coastal hazard categories (tsunami, cyclone,
/// flooding, oil spill, coastal erosion) with a confidence and urgency,
/// scores sentiment, and keeps a local record of classified posts.
#[derive(Parser)]
#[command(name = "coastwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Classify a single piece of text
    Classify {
        /// The post text
        text: String,

        /// Hashtag or other tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Source context, e.g. a subreddit (used by the reddit profile)
        #[arg(long)]
        source: Option<String>,

        /// Scoring profile (default: COASTWATCH_PROFILE or "default")
        #[arg(long)]
        profile: Option<String>,

        /// Print JSON instead of a formatted view
        #[arg(long)]
        json: bool,
    },

    /// Score the sentiment of a piece of text
    Sentiment {
        text: String,
    },

    /// Classify a JSON file of posts (an array of post objects)
    Extract {
        /// Path to the JSON file
        file: PathBuf,

        /// Force one profile for every post instead of choosing by platform
        #[arg(long)]
        profile: Option<String>,

        /// Also store the classified posts in the database
        #[arg(long)]
        store: bool,

        /// Number of concurrent database writes (default: COASTWATCH_STORE_CONCURRENCY or 8)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Print JSON instead of a formatted report
        #[arg(long)]
        json: bool,
    },

    /// List stored posts, highest confidence first
    Report {
        /// Only include this hazard category
        #[arg(long)]
        category: Option<String>,

        /// Only include posts from this platform
        #[arg(long)]
        platform: Option<String>,

        /// Only include posts at or above this confidence
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Max posts to show (default: 50)
        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Show the active rule table for a profile
    Rules {
        #[arg(long)]
        profile: Option<String>,
    },

    /// Show system status (DB stats, recent extraction runs)
    Status,

    /// Start the JSON API server
    #[cfg(feature = "web")]
    Serve {
        #[arg(long, default_value = "8080")]
        port: u16,

        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("coastwatch=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing coastwatch database...");
            let config = Config::load()?;
            let store = init_store(&config)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\ncoastwatch is ready. Try:");
            println!("  coastwatch classify \"Tsunami warning: evacuation ordered now\"");
        }

        Commands::Classify {
            text,
            tags,
            source,
            profile,
            json,
        } => {
            let config = Config::load()?;
            let table = config.rule_table()?;
            let profile = profile.unwrap_or_else(|| config.profile.clone());
            let classifier = table.classifier(&profile)?;
            let scorer = SentimentScorer::new(&table.sentiment);

            let mut input = ClassificationInput::new(text).with_tags(tags);
            input.source_context = source;
            let result = classifier.classify(&input);
            let sentiment = scorer.score(&input.text);

            if json {
                let output = serde_json::json!({
                    "category": result.category,
                    "confidence": result.confidence,
                    "urgency": result.urgency,
                    "score": sentiment.score,
                    "profile": profile.to_lowercase(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                terminal::display_classification(&input.text, &profile, &result, &sentiment);
            }
        }

        Commands::Sentiment { text } => {
            let config = Config::load()?;
            let table = config.rule_table()?;
            let sentiment = SentimentScorer::new(&table.sentiment).score(&text);
            terminal::display_sentiment(&text, &sentiment);
        }

        Commands::Extract {
            file,
            profile,
            store,
            concurrency,
            json,
        } => {
            let config = Config::load()?;
            let table = config.rule_table()?;

            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let posts: Vec<RawPost> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON array of posts", file.display()))?;
            info!(count = posts.len(), file = %file.display(), "Loaded posts");

            let mut pipeline = ExtractionPipeline::new(&table)?;
            if let Some(ref name) = profile {
                pipeline = pipeline.with_profile(name)?;
            }

            let report = run_with_progress(&pipeline, posts, json)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                terminal::display_extraction(&report);
            }

            if store {
                let db = init_store(&config)?;
                let concurrency = concurrency.unwrap_or(config.store_concurrency);
                let summary = store_posts(db.clone(), report.posts.clone(), concurrency).await;
                if let Err(e) = db
                    .insert_run(profile.as_deref(), &report.stats, &summary)
                    .await
                {
                    warn!(error = %e, "Failed to record extraction run");
                }
                if !json {
                    terminal::display_storage(&summary);
                }
            }
        }

        Commands::Report {
            category,
            platform,
            min_confidence,
            limit,
        } => {
            let config = Config::load()?;
            config.require_database()?;
            let db = open_store(&config)?;

            let filter = PostFilter {
                category,
                platform,
                min_confidence,
                limit: Some(limit),
            };
            let posts = db.get_posts(&filter).await?;
            terminal::display_stored_posts(&posts);

            if filter.category.is_none() {
                let counts = db.category_counts().await?;
                terminal::display_label_counts("By category", &counts);
            }
        }

        Commands::Rules { profile } => {
            let config = Config::load()?;
            let table = config.rule_table()?;
            let profile = profile.unwrap_or_else(|| config.profile.clone());
            terminal::display_rules(&table, &profile)?;
        }

        Commands::Status => {
            let config = Config::load()?;
            if config.require_database().is_err() {
                println!("Database: not initialized");
                println!("\nRun `coastwatch init` to set up the database.");
                return Ok(());
            }
            let db = open_store(&config)?;
            coastwatch::status::show(&db, &config).await?;
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            let table = config.rule_table()?;
            config.require_profile(&table)?;
            let store = init_store(&config)?;
            let state = coastwatch::web::AppState::new(config, table, store)?;
            coastwatch::web::run_server(state, port, &bind).await?;
        }
    }

    Ok(())
}

/// Run the pipeline with a progress bar following along.
/// The bar is hidden when stdout carries JSON.
fn run_with_progress(
    pipeline: &ExtractionPipeline,
    posts: Vec<RawPost>,
    quiet: bool,
) -> Result<ExtractionReport> {
    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(posts.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar().template("  Classifying [{bar:30}] {pos}/{len} ({eta})")?,
    );

    let report = pipeline.run_with_progress(posts, |_| pb.inc(1));
    pb.finish_and_clear();
    Ok(report)
}

/// Open the existing database as a PostStore.
#[cfg(feature = "sqlite")]
fn open_store(config: &Config) -> Result<Arc<dyn PostStore>> {
    coastwatch::db::open_store(&config.db_path)
}

/// Open the database, creating it if needed.
#[cfg(feature = "sqlite")]
fn init_store(config: &Config) -> Result<Arc<dyn PostStore>> {
    coastwatch::db::initialize_store(&config.db_path)
}

#[cfg(not(feature = "sqlite"))]
fn open_store(_config: &Config) -> Result<Arc<dyn PostStore>> {
    anyhow::bail!(
        "Storage requires the 'sqlite' feature.\n\
         Rebuild with: cargo build --features sqlite"
    )
}

#[cfg(not(feature = "sqlite"))]
fn init_store(config: &Config) -> Result<Arc<dyn PostStore>> {
    open_store(config)
}
