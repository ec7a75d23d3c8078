use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use noticeboard_api::{build_router, config::Config, services::sweeper, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noticeboard_api=info,api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(config);
    let config = state.config.clone();

    match config.max_notices {
        Some(max) => info!("Notice store capped at {} notices", max),
        None => info!("Notice store unbounded"),
    }

    match config.sweep_interval {
        Some(every) => {
            sweeper::start(state.notices.clone(), every);
            info!("Background sweep every {}s", every.as_secs());
        }
        None => info!("Background sweep disabled, expired notices are purged on read"),
    }

    if let Some(dir) = &config.static_dir {
        info!("Serving static front-end from {}", dir);
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Notice board API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
