pub mod config;
pub mod fulfil_client;

pub use config::ConfigError;
pub use fulfil_client::FulfilError;
