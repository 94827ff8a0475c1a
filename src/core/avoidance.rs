//! Risk-annotation fetch for saferoute
//!
//! The risk service partitions risky path segments ("link IDs") into two
//! severity tiers. One all-or-nothing fetch per orchestration: if either tier
//! is missing from the response, no `AvoidanceSet` is produced at all.

use serde::Deserialize;

use crate::core::config::RoutingConfig;
use crate::core::error::{Error, Result};
use crate::core::geo::Coordinate;
use crate::core::route::GLOBAL_CLIENT;

/// Link IDs to avoid, partitioned by severity
///
/// Both tiers are required; a response missing either key deserializes to
/// nothing rather than to a partial set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AvoidanceSet {
    /// High-severity link IDs (hard "must avoid" tier)
    #[serde(rename = "red")]
    pub must_avoid: Vec<i64>,

    /// Medium-severity link IDs (soft "try avoid" tier)
    #[serde(rename = "yellow")]
    pub try_avoid: Vec<i64>,
}

impl AvoidanceSet {
    /// True if neither tier contains any link IDs
    pub fn is_empty(&self) -> bool {
        self.must_avoid.is_empty() && self.try_avoid.is_empty()
    }
}

/// Fetch the link IDs to avoid between two points
pub(crate) async fn fetch_avoidance(
    config: &RoutingConfig,
    from: Coordinate,
    to: Coordinate,
) -> Result<AvoidanceSet> {
    let url = format!("{}/v1/avoidLinkIds", config.risk_base_url);
    let response = GLOBAL_CLIENT
        .get(&url)
        .query(&[
            ("fromLat", from.latitude.to_string()),
            ("toLat", to.latitude.to_string()),
            ("fromLng", from.longitude.to_string()),
            ("toLng", to.longitude.to_string()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(Error::HttpError(format!(
            "avoid-link request failed: {status}"
        )));
    }

    response
        .json::<AvoidanceSet>()
        .await
        .map_err(|e| Error::MalformedResponse(e.to_string()))
}
