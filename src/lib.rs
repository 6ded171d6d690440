#![allow(clippy::uninlined_format_args)]

pub mod app;
pub mod config;
pub mod cursor;
pub mod data;
pub mod fetcher;
pub mod media;
pub mod reddit;
pub mod resolve;
pub mod session;
pub mod source;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use app::run;
