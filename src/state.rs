use crate::config::settings::AppConfig;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;
use crate::infrastructure::storage::cloudinary::CloudinaryService;
use crate::modules::video::repository::RedisVideoRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub queue: RabbitMqService,
    pub storage: CloudinaryService,
    pub videos: RedisVideoRepository,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        queue: RabbitMqService,
        storage: CloudinaryService,
        videos: RedisVideoRepository,
    ) -> Self {
        Self {
            config,
            queue,
            storage,
            videos,
        }
    }
}
