use std::{net::SocketAddr, sync::Arc};

use tokio::{net::TcpListener, sync::broadcast};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod blog_index;
mod config;
mod content_loader;
mod content_store;
mod dates;
mod error;
mod frontmatter;
mod hot_reload;
mod markdown;
mod models;
mod notifier;
mod render;
mod routes;
mod state;

use config::SiteConfig;
use content_loader::load_site_content;
use hot_reload::start_content_watcher;
use markdown::StyleRules;
use notifier::Notifier;
use state::{AppState, RouterState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SiteConfig::load().await?;
    info!("RUST_ENV is set to development: {}", config.is_development);

    let style_rules = StyleRules::with_overrides(&config.styles)?;
    let site = load_site_content(&config.content_dir, &style_rules).await?;
    info!(posts = site.posts.len(), "Loaded initial content");

    let notifier = Notifier::from_webhook_url(config.contact_webhook_url.as_deref());
    let port = config.port;
    let is_development = config.is_development;
    let state = Arc::new(AppState::new(config, style_rules, notifier, site));

    // Hot-reload setup
    let (tx, _rx) = broadcast::channel(1);
    if is_development {
        info!("Hot reload enabled. Check logs for file change events.");
        start_content_watcher(tx.clone(), state.clone());
    }

    let app = routes::router(RouterState {
        app_state: state,
        broadcaster: tx,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
