pub mod app;
pub mod cli;
pub mod config;
pub mod date;
pub mod document;
pub mod editor;
pub mod journaling;
pub mod storage;
pub mod todo;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
