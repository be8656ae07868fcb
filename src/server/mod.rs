pub mod config;
mod http_layers;
pub mod metrics;
mod pages;
mod routes;
#[allow(clippy::module_inception)]
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use pages::Pages;
pub use server::{make_app, run_server};
