pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod projection;
pub mod storage;
pub mod store;
pub mod sync;
pub mod tui;
