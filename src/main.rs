use time::UtcOffset;

mod analysis;
mod app;
mod config;
mod state;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // must run before the runtime spawns worker threads
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "snapcal=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
    tracing::info!(offset = %local_offset, "local utc offset resolved");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(local_offset))
}

async fn run(local_offset: UtcOffset) -> anyhow::Result<()> {
    let app_state = state::AppState::init(local_offset)?;
    let addr = app_state.config.listen_addr;
    app::serve(app::build_app(app_state), addr).await
}
