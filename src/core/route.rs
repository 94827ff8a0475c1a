//! Route variants and the two-stage resolution protocol
//!
//! A route resolves through two strictly sequential remote calls: the
//! directions call yields opaque route metadata carrying a session ID, and the
//! shape call keyed by that session ID yields the renderable geometry. The
//! three variants share this algorithm and differ only in the avoidance
//! constraints they add to the directions query and in their presentation
//! color.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::core::avoidance::AvoidanceSet;
use crate::core::config::RoutingConfig;
use crate::core::error::{Error, Result};
use crate::core::geo::{pair_shape_points, Coordinate};

/// Global HTTP client shared by all fetches
///
/// Deliberately carries no request timeout: a hung remote call leaves its
/// variant permanently unresolved instead of erroring.
pub(crate) static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .user_agent(concat!("saferoute/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// An RGB stroke color for a rendered overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Format as a `#rrggbb` hex string
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The kind of a route variant, with its avoidance constraints
#[derive(Debug, Clone)]
pub enum RouteKind {
    /// Baseline route, no constraints
    Plain,

    /// Soft constraint on the must-avoid tier only
    PartialAvoidance(Arc<AvoidanceSet>),

    /// Hard constraint on must-avoid, soft constraint on try-avoid
    FullAvoidance(Arc<AvoidanceSet>),
}

impl RouteKind {
    /// Human-readable variant name for logging and CLI output
    pub fn label(&self) -> &'static str {
        match self {
            RouteKind::Plain => "plain",
            RouteKind::PartialAvoidance(_) => "partial-avoidance",
            RouteKind::FullAvoidance(_) => "full-avoidance",
        }
    }

    /// Fixed stroke color for this variant's overlay
    pub fn color(&self) -> Color {
        match self {
            RouteKind::Plain => Color { r: 255, g: 38, b: 0 },
            RouteKind::PartialAvoidance(_) => Color { r: 255, g: 251, b: 0 },
            RouteKind::FullAvoidance(_) => Color { r: 0, g: 249, b: 0 },
        }
    }

    /// Extra directions query parameters for this variant's constraints
    ///
    /// An empty tier omits its parameter entirely rather than sending an
    /// empty value.
    fn extra_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        match self {
            RouteKind::Plain => {}
            RouteKind::PartialAvoidance(avoid) => {
                if !avoid.must_avoid.is_empty() {
                    params.push(("tryAvoidLinkIds", csv(&avoid.must_avoid)));
                }
            }
            RouteKind::FullAvoidance(avoid) => {
                if !avoid.must_avoid.is_empty() {
                    params.push(("mustAvoidLinkIds", csv(&avoid.must_avoid)));
                }
                if !avoid.try_avoid.is_empty() {
                    params.push(("tryAvoidLinkIds", csv(&avoid.try_avoid)));
                }
            }
        }
        params
    }
}

/// Join link IDs into a comma-separated query value
fn csv(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// A successful resolution: opaque route metadata plus the full shape
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub metadata: serde_json::Map<String, Value>,
    pub shape: Vec<Coordinate>,
}

/// One route alternative between an origin and a destination
///
/// `metadata` and `shape` stay empty until resolution succeeds; the shape is
/// set atomically, in full, exactly once. A route whose fetches fail remains
/// permanently unresolved.
#[derive(Debug, Clone)]
pub struct Route {
    kind: RouteKind,
    from: Coordinate,
    to: Coordinate,
    metadata: serde_json::Map<String, Value>,
    shape: Vec<Coordinate>,
}

impl Route {
    /// Create an unresolved route
    pub fn new(kind: RouteKind, from: Coordinate, to: Coordinate) -> Self {
        Self {
            kind,
            from,
            to,
            metadata: serde_json::Map::new(),
            shape: Vec::new(),
        }
    }

    pub fn kind(&self) -> &RouteKind {
        &self.kind
    }

    pub fn origin(&self) -> Coordinate {
        self.from
    }

    pub fn destination(&self) -> Coordinate {
        self.to
    }

    /// Stroke color for this route's overlay
    pub fn color(&self) -> Color {
        self.kind.color()
    }

    /// Opaque key-value result of the directions call (empty until resolved)
    pub fn metadata(&self) -> &serde_json::Map<String, Value> {
        &self.metadata
    }

    /// Resolved geometry (empty until resolved)
    pub fn shape(&self) -> &[Coordinate] {
        &self.shape
    }

    /// True once the route has a non-empty shape
    pub fn is_resolved(&self) -> bool {
        !self.shape.is_empty()
    }

    pub(crate) fn apply_resolution(&mut self, resolution: Resolution) {
        self.metadata = resolution.metadata;
        self.shape = resolution.shape;
    }

    /// Full directions query for this route
    fn directions_query(&self, config: &RoutingConfig) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("key", config.api_key.clone()),
            ("from", self.from.query_tuple()),
            ("to", self.to.query_tuple()),
            ("routeType", "pedestrian".to_string()),
        ];
        params.extend(self.kind.extra_query_params());
        params
    }

    /// Resolve this route through the two-stage fetch
    ///
    /// Any failure aborts the whole resolution; there is no retry.
    pub(crate) async fn resolve(&self, config: &RoutingConfig) -> Result<Resolution> {
        let url = format!("{}/directions/v2/route", config.directions_base_url);
        let response = GLOBAL_CLIENT
            .get(&url)
            .query(&self.directions_query(config))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::HttpError(format!(
                "directions request failed: {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        let metadata = body
            .get("route")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::MalformedResponse("missing route object".to_string()))?
            .clone();
        let session_id = metadata
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedResponse("missing sessionId".to_string()))?
            .to_string();

        let shape = self.fetch_shape(config, &session_id).await?;
        if shape.is_empty() {
            return Err(Error::EmptyResult);
        }

        Ok(Resolution { metadata, shape })
    }

    /// Fetch the full (non-simplified) shape for a directions session
    async fn fetch_shape(
        &self,
        config: &RoutingConfig,
        session_id: &str,
    ) -> Result<Vec<Coordinate>> {
        let url = format!("{}/directions/v2/routeshape", config.directions_base_url);
        let response = GLOBAL_CLIENT
            .get(&url)
            .query(&[
                ("key", config.api_key.as_str()),
                ("sessionId", session_id),
                ("fullShape", "true"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::HttpError(format!(
                "routeshape request failed: {status}"
            )));
        }

        let body: ShapeResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        Ok(pair_shape_points(&body.route.shape.shape_points))
    }
}

#[derive(Deserialize)]
struct ShapeResponse {
    route: ShapeRoute,
}

#[derive(Deserialize)]
struct ShapeRoute {
    shape: Shape,
}

#[derive(Deserialize)]
struct Shape {
    #[serde(rename = "shapePoints")]
    shape_points: Vec<f64>,
}
