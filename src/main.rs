use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use notebook_search::api;
use notebook_search::config;
use notebook_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging / 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notebook_search=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let mut app_config = config::load_config(&config::get_config_path()).map_err(anyhow::Error::msg)?;
    app_config.apply_env();
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create notes root if not exists / 创建笔记根目录
    let notes_root = app_config.get_notes_root();
    if !notes_root.exists() {
        std::fs::create_dir_all(&notes_root)?;
        tracing::info!("Created notes root: {:?}", notes_root);
    }

    tracing::info!(
        "notebook-search {} (built {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME")
    );

    let bind_addr = app_config.get_bind_address();
    let state = Arc::new(AppState::from_config(app_config));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
