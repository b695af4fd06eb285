//! Library exports for stagedoor, shared between the binary and tests.

pub mod auth;
pub mod backend;
pub mod config;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod startup;
pub mod state;
pub mod utils;
