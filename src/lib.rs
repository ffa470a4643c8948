pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod navigation;
pub mod observability;
pub mod platform;
pub mod state;
