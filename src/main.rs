use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

use crate::config::settings::AppConfig;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::redis::client::RedisService;
use crate::infrastructure::storage::cloudinary::CloudinaryService;
use crate::modules::video::repository::RedisVideoRepository;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::new()?;

    // Upload and thumbnail directories must exist before the first request lands.
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.thumbnail_dir).await?;

    let redis = RedisService::new(&config.redis_url).await?;
    let queue = RabbitMqService::new(&config.amqp_url).await?;
    let storage = CloudinaryService::new(
        &config.cloudinary_cloud_name,
        &config.cloudinary_upload_preset,
    );
    let videos = RedisVideoRepository::new(redis);

    let state = AppState::new(config.clone(), queue, storage, videos);

    tokio::spawn(workers::processor::start_processing_worker(state.clone()));

    let app = app::create_app(state).await;

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
