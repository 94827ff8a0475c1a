//! Core library modules for saferoute
//!
//! This module contains the internal implementation details of the saferoute library.

pub mod avoidance;
pub mod config;
pub mod error;
pub mod geo;
pub mod orchestrator;
pub mod route;

// Re-export main types for internal use
pub use self::config::RoutingConfig;
pub use self::orchestrator::RouteOrchestrator;
