pub mod announce_service;
pub mod channel_matcher;
pub mod diagnostic_logger;
pub mod playlist_service;
pub mod token_service;
pub mod twitch_service;
