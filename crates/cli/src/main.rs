use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use metadata_client::MetadataClient;
use metadata_model::{FavoriteItem, MediaType, UserBundle, UserPreferences, WatchlistItem};
use server::{Config, InMemoryPersistentCache, InMemoryPreferenceStore, Populator, RawRequest, RecommendationOrchestrator};

/// ReelRecs - personalized movie/TV recommendation engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Personalized movie/TV recommendation engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get recommendations for a user
    Recommend {
        /// User ID to get recommendations for (the demo store seeds "demo" and "demo2")
        #[arg(long, default_value = "demo")]
        user_id: String,

        /// One of "movie", "tv", "both"
        #[arg(long, default_value = "both")]
        media_type: String,

        /// Number of recommendations to return (clamped to 9)
        #[arg(long, default_value = "9")]
        limit: i64,

        /// Comma-separated ids to exclude
        #[arg(long)]
        exclude: Option<String>,

        /// Print the per-factor score breakdown reason for each item
        #[arg(long)]
        explain: bool,
    },

    /// Run the scheduled cache populator once and report what it wrote
    Populate {
        /// One of "daily", "weekly", "full"
        #[arg(long, default_value = "full")]
        mode: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend {
            user_id,
            media_type,
            limit,
            exclude,
            explain,
        } => handle_recommend(&config, user_id, media_type, limit, exclude, explain).await?,
        Commands::Populate { mode } => handle_populate(&config, mode).await?,
    }

    Ok(())
}

async fn handle_recommend(
    config: &Config,
    user_id: String,
    media_type: String,
    limit: i64,
    exclude: Option<String>,
    explain: bool,
) -> Result<()> {
    let request = server::parse_request(RawRequest {
        user_id,
        media_type: Some(media_type),
        exclude,
        limit: Some(limit),
        inline_preferences: None,
    })
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    let client_config = metadata_client::MetadataClientConfig {
        base_url: config.metadata_api_base_url.clone(),
        api_key: config.metadata_api_key.clone(),
        cache_ttl: config.cache_ttl(),
        cache_capacity: config.cache_capacity,
    };
    let client = Arc::new(MetadataClient::request_path(client_config));
    let store = Arc::new(demo_preference_store());
    let orchestrator = RecommendationOrchestrator::new(client, store, config.request_deadline());

    println!("{}", format!("Fetching recommendations for '{}'...", request.user_id).bold().blue());
    let start = Instant::now();
    let response = orchestrator.recommend(&request).await?;
    println!(
        "{} {} items in {:?} (source: {})",
        "✓".green(),
        response.items.len(),
        start.elapsed(),
        response.source
    );

    for (rank, item) in response.items.iter().enumerate() {
        println!(
            "{}. {} [{}] - {:.1}/10, score {:.1}",
            (rank + 1).to_string().green(),
            item.title,
            item.genres,
            item.vote_average,
            item.score
        );
        if explain {
            println!("   {}", item.recommendation_reason.italic());
        }
    }

    Ok(())
}

async fn handle_populate(config: &Config, mode: String) -> Result<()> {
    let client_config = metadata_client::MetadataClientConfig {
        base_url: config.metadata_api_base_url.clone(),
        api_key: config.metadata_api_key.clone(),
        cache_ttl: config.cache_ttl(),
        cache_capacity: config.cache_capacity,
    };
    let client = Arc::new(MetadataClient::populator(client_config));
    let cache = Arc::new(InMemoryPersistentCache::new());
    let populator = Populator::new(client, cache.clone());
    let cancel = CancellationToken::new();

    println!("{}", format!("Running populator ({mode})...").bold().blue());
    let start = Instant::now();
    match mode.as_str() {
        "daily" => populator.run_daily(&cancel).await,
        "weekly" => populator.run_weekly(&cancel).await,
        "full" => populator.run_full(&cancel).await,
        other => anyhow::bail!("unknown populator mode '{other}', expected daily/weekly/full"),
    }
    println!(
        "{} wrote {} cache entries in {:?}",
        "✓".green(),
        cache.len(),
        start.elapsed()
    );

    Ok(())
}

/// A small seeded store so `recommend` has something to run against without
/// external infrastructure: two demo users with a few favorites each.
fn demo_preference_store() -> InMemoryPreferenceStore {
    let store = InMemoryPreferenceStore::new();

    let mut preferences = UserPreferences::default();
    preferences.genre_ratings.insert(28, 9); // Action
    preferences.genre_ratings.insert(878, 8); // Science Fiction
    preferences.favorite_content.push("The Matrix".to_string());

    store.seed(
        "demo",
        UserBundle {
            preferences,
            favorites: vec![FavoriteItem {
                media_id: 603,
                media_type: MediaType::Movie,
                title: "The Matrix".to_string(),
                added_at: Some(now_minus_days(14)),
                genres: vec![28, 878],
                cast: Vec::new(),
                crew: Vec::new(),
                vote_average: Some(8.2),
                release_date: Some("1999-03-31".to_string()),
            }],
            watchlist: vec![WatchlistItem {
                media_id: 604,
                media_type: MediaType::Movie,
                title: "The Matrix Reloaded".to_string(),
                added_at: Some(now_minus_days(3)),
            }],
        },
    );

    store.seed(
        "demo2",
        UserBundle {
            preferences: UserPreferences::default(),
            favorites: Vec::new(),
            watchlist: Vec::new(),
        },
    );

    store
}

fn now_minus_days(days: u64) -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    (now - Duration::from_secs(days * 24 * 60 * 60)).as_secs() as i64
}
