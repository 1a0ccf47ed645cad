use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use platekeeper::alpr::HttpAlpr;
use platekeeper::registry::TenantRegistry;
use platekeeper::store::postgres::PgStore;
use platekeeper::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "platekeeper=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Building { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_building_command(&db, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let alpr = HttpAlpr::new(&cfg.alpr_url, Duration::from_secs(cfg.alpr_timeout_secs));

    let state = Arc::new(AppState {
        db,
        alpr: Arc::new(alpr),
        config: cfg,
    });

    let app = axum::Router::new()
        // Health endpoints (no auth)
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .route("/readyz", axum::routing::get(readiness_check))
        .nest("/admin", api::admin_router(state.clone()))
        .nest("/api/v1", api::tenant_router(state.clone()))
        .with_state(state)
        // Room for base64-encoded camera frames
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("PlateKeeper listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn readiness_check() -> &'static str {
    "ok"
}

/// Middleware: injects a unique X-Request-Id into every response so
/// clients can correlate errors with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

async fn handle_building_command(
    db: &PgStore,
    cmd: cli::BuildingCommands,
) -> anyhow::Result<()> {
    match cmd {
        cli::BuildingCommands::Create { name, address } => {
            let building = db.create_building(&name, address.as_deref()).await?;
            println!(
                "Building created:\n  ID:    {}\n  Name:  {}\n  Token: {}",
                building.id, building.name, building.api_token
            );
        }
        cli::BuildingCommands::List => {
            let buildings = db.list_buildings().await?;
            if buildings.is_empty() {
                println!("No buildings found.");
            } else {
                println!("{:<38} {:<30} {:<8}", "ID", "NAME", "ACTIVE");
                for b in buildings {
                    println!("{:<38} {:<30} {:<8}", b.id, b.name, b.is_active);
                }
            }
        }
        cli::BuildingCommands::RotateToken { id } => {
            let building_id = uuid::Uuid::parse_str(&id)
                .map_err(|_| anyhow::anyhow!("invalid building ID: {}", id))?;
            let building = db.rotate_token(building_id).await?;
            println!(
                "Token rotated for {}:\n  New token: {}",
                building.id, building.api_token
            );
        }
    }
    Ok(())
}
