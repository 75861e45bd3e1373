use clap::Parser;
use clap::Subcommand;
use portal_service::app;
use portal_service::config::Config;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Parser)]
#[command(name = "portal-service", version, about = "Patient and doctor portal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply migrations and serve HTTP (default)
    Serve,
    /// Create the database schema and exit
    InitDb,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "portal-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        host = %config.server.host,
        http_port = config.server.http_port,
        uploads = %config.uploads.directory.display(),
        "Configuration loaded"
    );
    if config.uses_development_secret() {
        tracing::warn!("Using the development session secret; set SESSION__SECRET in production");
    }

    let pool = app::connect_database(&config.database).await?;
    app::migrate(&pool).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::InitDb => {
            tracing::info!("Database initialized");
            Ok(())
        }
        Command::Serve => {
            let http_application = app::build_router(&config, pool).await?;

            let http_address = format!("{}:{}", config.server.host, config.server.http_port);
            let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
            tracing::info!(
                address = %http_address,
                port = config.server.http_port,
                protocol = "http",
                "Http server listening"
            );

            axum::serve(http_listener, http_application).await?;
            tracing::info!("Server exited successfully");
            Ok(())
        }
    }
}
