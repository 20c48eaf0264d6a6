use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use shoe_api::auth::hash_password;
use shoe_api::config::Settings;
use shoe_api::models::user::{NewUser, Role};
use shoe_api::store::postgres::PgStore;
use shoe_api::store::Store;
use shoe_api::{create_app, db, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Shoe catalog API with API-key gated public endpoints
#[derive(Parser)]
#[command(name = "shoe-api")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create an account with the admin role
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "shoe_api=info,tower_http=debug".into()),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load application settings")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings).await,
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => create_admin(settings, username, email, password).await,
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    info!("🚀 Starting shoe-api {}", env!("CARGO_PKG_VERSION"));

    let pool = db::create_pool(&settings.database).await?;
    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    let address = settings.server.address().to_string();
    let app = create_app(AppState::new(store, settings));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;
    info!("🌐 Listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("👋 shoe-api shutdown completed");
    Ok(())
}

async fn create_admin(
    settings: Settings,
    username: String,
    email: String,
    password: String,
) -> anyhow::Result<()> {
    if password.len() < 6 {
        bail!("Password must be at least 6 characters");
    }

    let pool = db::create_pool(&settings.database).await?;
    let store = PgStore::new(pool);

    if store
        .username_or_email_taken(&username, &email)
        .await
        .context("Failed to check for existing user")?
    {
        bail!("Username or email already registered");
    }

    let user = store
        .create_user(NewUser {
            username,
            email,
            password_hash: hash_password(&password).await?,
            role: Role::Admin,
        })
        .await
        .context("Failed to create admin user")?;

    info!("✅ Created admin {} (id {})", user.username, user.id);
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
