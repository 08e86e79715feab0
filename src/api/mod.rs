//! HTTP surface for the bingopool engine.
//!
//! Thin axum layer over [`crate::engine::BingoEngine`]: handlers advance the
//! tick, call the synchronous engine, and map engine errors to structured
//! JSON responses. The engine itself never awaits.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
