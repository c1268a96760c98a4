pub mod artwork;
pub mod config;
pub mod error;
pub mod models;
pub mod payload;
pub mod reconciler;
