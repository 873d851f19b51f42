//! CLI Commands

pub mod bundle;
pub mod routes;
pub mod serve;
