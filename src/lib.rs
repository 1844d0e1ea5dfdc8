pub mod app;
pub mod authorization;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod read_models;
pub mod services;
