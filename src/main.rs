use std::sync::Arc;

use details_bot::channels::{CliChannel, bot_routes, run_channel, with_static_files};
use details_bot::config::{BotConfig, StorageConfig};
use details_bot::dialog::DialogStateMachine;
use details_bot::error::Error;
use details_bot::store::{KeyValueStore, LibSqlBackend, MemoryStore};
use details_bot::turn::TurnDispatcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().map_err(Error::from)?;

    eprintln!("🤖 Details Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Locale: {}", config.locale);
    eprintln!("   Messages API: http://{}/api/messages", config.bind_address());

    // ── Storage ──────────────────────────────────────────────────────────
    let store: Arc<dyn KeyValueStore> = match &config.storage {
        StorageConfig::Memory => {
            eprintln!("   Database: in-memory (state is lost on exit)");
            Arc::new(MemoryStore::new())
        }
        StorageConfig::LibSql(path) => {
            let backend = LibSqlBackend::new_local(path).await.unwrap_or_else(|e| {
                eprintln!("Error: Failed to open database at {}: {}", path.display(), e);
                std::process::exit(1);
            });
            eprintln!("   Database: {}", path.display());
            Arc::new(backend)
        }
    };

    let dispatcher = Arc::new(TurnDispatcher::new(
        store,
        DialogStateMachine::with_details(config.locale),
    ));

    // ── HTTP ─────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "HTTP server started");
    let app = with_static_files(bot_routes(Arc::clone(&dispatcher)), &config.static_dir);

    if config.cli {
        eprintln!("   Type a message and press Enter. Ctrl+C to exit.\n");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        run_channel(&CliChannel::new(), &dispatcher).await?;
    } else {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                tokio::signal::ctrl_c().await.ok();
                tracing::info!("Ctrl+C received, shutting down...");
            })
            .await?;
    }

    Ok(())
}
