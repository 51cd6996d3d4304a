mod config;
mod storage;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobtailor_client::{ChatCompleter, ReaderFetcher};
use jobtailor_core::traits::Fetcher;
use jobtailor_core::{TailorService, parse};

use crate::config::Config;
use crate::storage::AppPaths;

#[derive(Parser)]
#[command(name = "jobtailor", version, about = "Tailor a resume to a job posting with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a job posting and generate a tailored application
    Apply {
        /// Job posting URL
        url: String,

        /// API key override (otherwise read from config.json)
        #[arg(long, env = "JOBTAILOR_API_KEY")]
        api_key: Option<String>,

        /// Model override (otherwise read from config.json)
        #[arg(long, env = "JOBTAILOR_MODEL")]
        model: Option<String>,
    },

    /// Classify a saved job-posting document and print the node table
    Parse {
        /// Path to a file containing reader-proxy markdown
        file: PathBuf,
    },

    /// Create the application directories, example templates, and config
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobtailor=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let paths = AppPaths::resolve()?;

    match cli.command {
        Commands::Apply { url, api_key, model } => {
            cmd_apply(&paths, &url, api_key, model).await?;
        }
        Commands::Parse { file } => {
            cmd_parse(&file)?;
        }
        Commands::Setup => {
            cmd_setup(&paths)?;
        }
    }

    Ok(())
}

fn cmd_setup(paths: &AppPaths) -> Result<()> {
    paths.scaffold()?;
    if !paths.config_file.exists() {
        Config::write_placeholder(&paths.config_file)?;
    }
    println!("Application root ready at {}", paths.root.display());
    println!("Edit {} and fill in your API key.", paths.config_file.display());
    Ok(())
}

fn cmd_parse(file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let nodes = parse(&raw);
    println!("Parsed {} nodes from {}\n", nodes.len(), file.display());
    for node in &nodes {
        let tag = serde_json::to_string(&node.node_type)?;
        println!("{:<20} {}", tag.trim_matches('"'), node.content);
    }
    Ok(())
}

async fn cmd_apply(
    paths: &AppPaths,
    url: &str,
    api_key: Option<String>,
    model: Option<String>,
) -> Result<()> {
    paths.scaffold()?;

    if !paths.config_file.exists() {
        Config::write_placeholder(&paths.config_file)?;
        println!(
            "Created config at {} — fill in your API key and re-run.",
            paths.config_file.display()
        );
        return Ok(());
    }

    let mut cfg = Config::load(&paths.config_file)?;
    if let Some(key) = api_key {
        cfg.api_key = key;
    }
    if let Some(model) = model {
        cfg.model = model;
    }
    cfg.validate_api_key()?;

    // Ctrl-C aborts in-flight requests and backoff waits promptly.
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    tracing::info!("Fetching {}", url);
    let fetcher = ReaderFetcher::new()
        .map_err(|e| anyhow::anyhow!(e))?
        .with_cancellation(cancel.clone());
    let raw = fetcher.fetch(url).await.map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Fetched {} bytes of markdown", raw.len());

    // Classify once; the same node list feeds the model payload and the
    // output-folder slug.
    let nodes = parse(&raw);
    tracing::info!("Classified document: {} nodes", nodes.len());

    let base_resume = paths.read_resume_template()?;
    let base_cover = paths.read_cover_template();

    let completer = ChatCompleter::with_base_url(&cfg.api_key, &cfg.base_url)
        .map_err(|e| anyhow::anyhow!(e))?
        .with_cancellation(cancel);
    let service =
        TailorService::new(completer, &cfg.model).with_reply_format(cfg.reply_format);

    let app = service
        .run_nodes(&nodes, &base_resume, base_cover.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    let dir = storage::store_application(paths, &nodes, &app)?;

    println!("Company:     {}", app.company);
    println!("Role:        {}", app.role);
    println!("Match score: {}/10", app.score);
    println!("Tokens used: {}", app.tokens_used);
    println!("Saved to:    {}", dir.display());

    Ok(())
}
