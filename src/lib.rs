pub mod alerts;
pub mod app;
pub mod collectors;
pub mod config;
pub mod daemon;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod report;
pub mod trends;

pub use app::App;
pub use config::Config;
pub use error::{Error, Result};
