//! # Saferoute
//!
//! Concurrent pedestrian route alternatives with risk-aware avoidance.
//!
//! Given an origin and a destination, saferoute fetches a baseline route, a
//! server-computed set of risky path segments, and two further routes that
//! avoid those segments with different strictness. Every route that resolves
//! is published incrementally as a map overlay, in network-completion order.
//!
//! ## Example
//!
//! ```no_run
//! use saferoute::{Coordinate, RoutingConfig, RouteOrchestrator};
//!
//! # async fn example() {
//! let config = RoutingConfig::new("your-api-key");
//! let from = Coordinate::new(39.3299, -76.6205);
//! let to = Coordinate::new(39.28, -76.59);
//!
//! let (orchestrator, mut events) = RouteOrchestrator::start(config, from, to);
//! while let Some(event) = events.recv().await {
//!     for overlay in event.overlays {
//!         let color = orchestrator.color_for(overlay).unwrap();
//!         println!("new overlay with stroke {}", color.hex());
//!     }
//! }
//! # }
//! ```

mod core;

pub use crate::core::avoidance::AvoidanceSet;
pub use crate::core::config::RoutingConfig;
pub use crate::core::error::{Error, Result};
pub use crate::core::geo::{pair_shape_points, Coordinate};
pub use crate::core::orchestrator::{OverlayEvent, OverlayId, RouteOrchestrator};
pub use crate::core::route::{Color, Route, RouteKind};

use tokio::sync::mpsc::UnboundedReceiver;

/// Start one routing orchestration with the given configuration
///
/// Convenience wrapper around [`RouteOrchestrator::start`]. Must be called
/// from within a Tokio runtime.
pub fn plan_routes(
    config: RoutingConfig,
    from: Coordinate,
    to: Coordinate,
) -> (RouteOrchestrator, UnboundedReceiver<OverlayEvent>) {
    RouteOrchestrator::start(config, from, to)
}
