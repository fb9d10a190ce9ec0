//! Axum-based HTTP server implementation for the vision relay.
//!
//! This module is responsible for setting up the HTTP server, configuring
//! routes, and turning incoming requests into pipeline runs.
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints (index, health, echo, analyze-image).
//! - `middleware`: Request ID tracking and CORS.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, AppState};
