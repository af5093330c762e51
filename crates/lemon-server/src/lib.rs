pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;
pub mod state;

pub use server::{LemonServer, ServerBuilder, build_app, routes};
pub use state::AppState;
