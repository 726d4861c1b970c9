mod telegram_media_gateway;

pub use telegram_media_gateway::TelegramMediaGateway;
