pub mod client;
pub mod config;
pub mod download;
pub mod progress;
pub mod types;
