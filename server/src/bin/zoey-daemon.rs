use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zoey_core::{get_default_config_file, CompletionClient, Provider, ZoeyConfig};
use zoey_dialogue::shop::{HttpProductSearch, ProductSearch};
use zoey_dialogue::store::InMemoryActivityStore;
use zoey_server::config::{load_layered, AppConfig};
use zoey_server::http_server::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "zoey-daemon", about = "Zoey persona chat service")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP server address
    #[arg(long)]
    http_addr: Option<String>,

    /// API key for the completion endpoint
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Completion provider (openai or gaia)
    #[arg(short, long)]
    provider: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Chat model
    #[arg(short = 'o', long)]
    model: Option<String>,

    /// Vision model used for image descriptions
    #[arg(long)]
    vision_model: Option<String>,

    /// Log filter, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the effective configuration to the default config file and exit
    #[arg(long)]
    init_config: bool,
}

impl Args {
    fn overrides(&self) -> anyhow::Result<ZoeyConfig> {
        let provider = match &self.provider {
            Some(raw) => Some(raw.parse::<Provider>()?),
            None => None,
        };

        Ok(ZoeyConfig {
            provider,
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            vision_model: self.vision_model.clone(),
            http_addr: self.http_addr.clone(),
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line args
    let args = Args::parse();

    // Pick up .env before logging so RUST_LOG may live there too
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to read .env file"),
    }

    info!("Starting Zoey daemon");

    // Load config from file, environment and CLI args
    let env = ZoeyConfig::from_env()?;
    let config = match load_layered(args.config.as_deref(), &env, &args.overrides()?) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(anyhow::anyhow!("Configuration error: {}", e));
        }
    };

    if args.init_config {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => get_default_config_file("zoey")?,
        };
        config.save_to_file(&path)?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let app_config = AppConfig::from_zoey(&config)?;

    // Initialize completion client
    let llm = match CompletionClient::new(&config) {
        Ok(client) => {
            info!(
                provider = %config.provider(),
                endpoint = %client.endpoint(),
                model = %app_config.model,
                "Initialized completion client"
            );
            client
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize completion client");
            return Err(anyhow::anyhow!("Failed to initialize completion client: {}", e));
        }
    };

    let products: Option<Arc<dyn ProductSearch>> = match &config.product_search_url {
        Some(url) => {
            let timeout = config.timeout_secs.map(Duration::from_secs);
            let search = HttpProductSearch::new(url.clone(), timeout)?;
            info!(url = %url, "Using product search endpoint");
            Some(Arc::new(search))
        }
        None => {
            info!("No product search endpoint configured, shopper uses the fallback catalog");
            None
        }
    };

    let state = AppState::new(
        app_config,
        Arc::new(llm),
        products,
        Arc::new(InMemoryActivityStore::new()),
    );

    let server = tokio::spawn(async move {
        if let Err(e) = http_server::run_server(state).await {
            error!(error = %e, "HTTP server failed");
        }
    });

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!(error = %e, "Task panicked");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt");
        }
    }

    info!("Zoey daemon shutting down");
    Ok(())
}
