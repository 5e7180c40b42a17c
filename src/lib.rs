pub mod app_context;
pub mod common;
pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod mindmap;
pub mod services;

#[cfg(feature = "server")]
pub mod server;
