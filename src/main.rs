use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ogte::{api, client::OgteClient, config::SiteConfig, db};

#[derive(Parser)]
#[command(name = "ogte")]
#[command(about = "Word lists and entries for ogte course activities")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API (overrides OGTE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply database migrations and exit
    Migrate,
    /// Print the view page of a course module from a running server
    View {
        /// Course module id
        #[arg(long)]
        id: i64,
    },
    /// Print the lists of a course module from a running server
    Lists {
        /// Course module id
        #[arg(long)]
        id: i64,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "ogte=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(site: &SiteConfig) -> anyhow::Result<db::Database> {
    let db = match &site.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(site: SiteConfig) -> anyhow::Result<()> {
    let db = open_database(&site)?;
    let port = site.port;
    let app = api::create_router(db, site);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("ogte server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut site = SiteConfig::from_env();

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                site.port = port;
            }
            serve(site).await?;
        }
        Some(Commands::Migrate) => {
            open_database(&site)?;
            tracing::info!("Database is up to date");
        }
        Some(Commands::View { id }) => {
            let page = OgteClient::from_env().get_view(id).await?;
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Some(Commands::Lists { id }) => {
            let lists = OgteClient::from_env().get_lists(id).await?;
            println!("{}", serde_json::to_string_pretty(&lists)?);
        }
        None => serve(site).await?,
    }

    Ok(())
}
