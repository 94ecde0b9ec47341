pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod file_cache;
pub mod historical;
pub mod http_client;
pub mod live;
pub mod locator;
pub mod normalize;
pub mod ordinal;
pub mod play_text;
pub mod prediction;
pub mod session;
pub mod state;
