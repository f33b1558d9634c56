pub mod app;
pub mod cli;
pub mod compose;
pub mod config;
pub mod detail;
pub mod highlight;
pub mod model;
pub mod store;
pub mod thread;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
