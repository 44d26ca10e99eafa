pub mod model_downloader;
pub mod registry;
pub mod state;
