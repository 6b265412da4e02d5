use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use concierge_core::responders::{model_registry, template_registry};
use concierge_core::{Coordinator, KeywordClassifier, ModelClient, Query};

mod config;

use config::ConciergeConfig;

#[derive(Parser)]
#[command(name = "concierge")]
#[command(version)]
#[command(about = "Concierge: routes each question to the right specialist")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a one-shot question and print the routed answer
    Ask {
        /// The message to send
        message: String,

        /// Conversation id used for log correlation
        #[arg(long)]
        context_id: Option<String>,
    },

    /// Show domain scores and the routing decision without answering
    Classify {
        message: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered responders and their capabilities
    Agents,

    /// Interactive session (/stats for statistics, /quit to exit)
    Chat,

    /// Probe every responder
    Health,

    /// Initialize config directory and default config
    Init,

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loading happens before logging so the configured level can apply;
    // errors surface once the subscriber is up.
    let loaded = ConciergeConfig::load(&cli.config);

    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.as_str())
        .unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.debug, level))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => cmd_init().await,
        Commands::Ask {
            message,
            context_id,
        } => cmd_ask(&loaded?, &message, context_id).await,
        Commands::Classify { message, json } => cmd_classify(&loaded?, &message, json),
        Commands::Agents => cmd_agents(&loaded?),
        Commands::Chat => cmd_chat(&loaded?).await,
        Commands::Health => cmd_health(&loaded?).await,
        Commands::Config => cmd_config(&loaded?),
    }
}

/// `--debug` wins, then RUST_LOG, then the configured level
fn log_filter(debug: bool, configured: &str) -> EnvFilter {
    if debug {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
}

fn build_coordinator(cfg: &ConciergeConfig) -> Result<Coordinator> {
    let classifier =
        KeywordClassifier::new(&cfg.classifier).context("Invalid [classifier] configuration")?;

    let registry = if cfg.model.enabled {
        let client = Arc::new(
            ModelClient::new(&cfg.model).context("Failed to initialize model client")?,
        );
        info!(
            "Using model responders ({} at {})",
            cfg.model.model, cfg.model.base_url
        );
        model_registry(client)
    } else {
        template_registry()
    };

    Coordinator::new(
        Arc::new(classifier),
        Arc::new(registry),
        cfg.coordinator.clone(),
    )
    .context("Failed to build coordinator")
}

async fn cmd_init() -> Result<()> {
    let config_dir = config::config_dir();
    tokio::fs::create_dir_all(&config_dir)
        .await
        .with_context(|| format!("Failed to create config dir: {}", config_dir.display()))?;

    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        warn!("Config already exists at {}", config_path.display());
    } else {
        let default_config = include_str!("../../../config/default.toml");
        tokio::fs::write(&config_path, default_config).await?;
        info!("Created default config at {}", config_path.display());
    }

    println!("Concierge initialized at {}", config_dir.display());
    println!(
        "Edit {} to tune keywords, thresholds and the model backend.",
        config_path.display()
    );
    Ok(())
}

fn cmd_config(cfg: &ConciergeConfig) -> Result<()> {
    println!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}

async fn cmd_ask(cfg: &ConciergeConfig, message: &str, context_id: Option<String>) -> Result<()> {
    let coordinator = build_coordinator(cfg)?;
    let mut query = Query::new(message);
    if let Some(id) = context_id {
        query = query.with_context_id(id);
    }

    let response = coordinator.handle(query).await?;
    println!("{}", response);
    Ok(())
}

fn cmd_classify(cfg: &ConciergeConfig, message: &str, json: bool) -> Result<()> {
    let coordinator = build_coordinator(cfg)?;
    let (scores, decision) = coordinator.route(&Query::new(message));

    if json {
        let out = serde_json::json!({
            "scores": scores,
            "decision": decision,
            "mode": decision.mode(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("Scores:");
    for s in &scores {
        println!("  {:<9} {:.2}", s.domain, s.score);
    }
    println!(
        "Decision: {} -> {}",
        decision.reason,
        decision
            .selected()
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(" + ")
    );
    println!("Confidence: {:.2}", decision.confidence);
    println!("Reasoning: {}", decision.reasoning);
    Ok(())
}

fn cmd_agents(cfg: &ConciergeConfig) -> Result<()> {
    let coordinator = build_coordinator(cfg)?;
    for profile in coordinator.profiles() {
        println!("{} ({})", profile.heading(), profile.domain);
        for capability in &profile.capabilities {
            println!("    - {}", capability);
        }
    }
    Ok(())
}

async fn cmd_health(cfg: &ConciergeConfig) -> Result<()> {
    let coordinator = build_coordinator(cfg)?;
    let health = coordinator.health_check().await;
    for (domain, healthy) in &health {
        let mark = if *healthy { "ok" } else { "UNAVAILABLE" };
        println!("  {:<9} {}", domain, mark);
    }
    let down = health.values().filter(|h| !**h).count();
    if down > 0 {
        warn!("{} of {} responders unhealthy", down, health.len());
    }
    Ok(())
}

async fn cmd_chat(cfg: &ConciergeConfig) -> Result<()> {
    let coordinator = build_coordinator(cfg)?;
    let session_id = uuid::Uuid::new_v4().to_string();
    info!("Chat session {}", session_id);

    println!("Concierge chat. Type /stats for statistics, /quit to exit.");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/stats" => {
                print!("{}", coordinator.stats());
                continue;
            }
            _ => {}
        }

        match coordinator
            .handle(Query::new(line).with_context_id(session_id.clone()))
            .await
        {
            Ok(response) => println!("{}\n", response),
            Err(e) => println!("Sorry, no responder could answer: {}\n", e),
        }
    }

    println!("Goodbye.");
    Ok(())
}
