mod auth;
pub mod config;
mod http_layers;
mod import_export_routes;
pub mod metrics;
pub mod server;
pub mod state;

pub use auth::{AdminAccess, AuthGate, SharedPasswordGate, ADMIN_PASSWORD_HEADER};
pub use config::ServerConfig;
pub use http_layers::*;
pub use import_export_routes::EXPORT_FILE_NAME;
pub use server::{make_app, run_server};
