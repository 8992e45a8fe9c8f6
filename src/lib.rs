pub mod config;
pub mod constants;
pub mod error;
pub mod logging;

// Domain data shapes shared across layers
pub mod domain;

pub mod observability;
pub mod pipeline;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;
