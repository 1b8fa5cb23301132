use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notifications_server::config::{AppConfig, CliConfig, FileConfig};
use notifications_server::push::{PushDispatcher, SubscriptionRegistry, WebPushTransport};
use notifications_server::server::{run_server, ServerConfig};
use notifications_server::{NotificationStore, RequestsLoggingLevel, SqliteNotificationStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite notifications database file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base64url-encoded raw P-256 VAPID private key scalar.
    #[clap(long)]
    pub vapid_private_key: Option<String>,

    /// VAPID subject claim, e.g. "mailto:ops@example.com".
    #[clap(long)]
    pub vapid_subject: Option<String>,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        db_path: cli_args.db_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        vapid_private_key: cli_args.vapid_private_key,
        vapid_subject: cli_args.vapid_subject,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    let store: Arc<dyn NotificationStore> =
        Arc::new(SqliteNotificationStore::new(&config.db_path)?);

    let push_dispatcher = match &config.push {
        Some(push) => {
            info!("Web push enabled (subject {})", push.vapid_subject);
            let transport = Arc::new(WebPushTransport::new(
                push.vapid_private_key.clone(),
                push.vapid_subject.clone(),
            ));
            Some(Arc::new(PushDispatcher::new(
                SubscriptionRegistry::new(store.clone()),
                transport,
                push.settings.clone(),
            )))
        }
        None => {
            warn!("VAPID keys are not configured, push delivery is disabled");
            None
        }
    };

    let server_config = ServerConfig {
        port: config.port,
        requests_logging_level: config.logging_level,
    };

    info!(
        "Starting notifications server on port {} (db {:?})",
        server_config.port, config.db_path
    );
    run_server(server_config, store, push_dispatcher).await
}
