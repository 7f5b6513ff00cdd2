//! # reposync
//!
//! Mirrors GitHub repository metadata and recent commits into SQLite and
//! serves them over a REST API and a Unix-socket RPC interface.

pub mod config;
pub mod connectors;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod rpc;
pub mod server;
pub mod service;
pub mod sync_engine;
pub mod telemetry;
pub use migration;

#[cfg(test)]
mod test_support;
