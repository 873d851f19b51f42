//! Paddock Web Server
//!
//! Serves a built bundle from disk. Unknown paths get the shell document so
//! the client router can resolve them; hashed assets are cached forever,
//! the shell never.

pub mod cache;
pub mod config;
pub mod middleware;
pub mod server;
pub mod static_files;

pub use config::{SecurityHeaders, ServerConfig};
pub use server::{serve, WebServer};
pub use static_files::{ServedKind, StaticFiles};
