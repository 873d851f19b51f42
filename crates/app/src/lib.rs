//! Paddock application
//!
//! The single-page application served by `paddock-web`: a route table with
//! two static views, the persistent chrome around them, the browser runtime
//! that swaps views without reloading, and the bundler that emits it all
//! with content-hashed asset names.

pub mod bundle;
pub mod client;
pub mod route;
pub mod shell;
pub mod view;

pub use bundle::{Bundle, BundleFile, BundleOptions, Bundler};
pub use route::{Route, RouteTable};
pub use shell::{ShellDocument, DEFAULT_TITLE, MESSAGE};
pub use view::View;
