//! CLI-specific output formatting for saferoute
//!
//! Renders resolved routes as human-readable summary lines and as a GeoJSON
//! FeatureCollection for piping into map tooling.

use saferoute::Route;
use serde_json::{json, Value};

/// One-line summary of a resolved route for stderr progress output
pub fn summary_line(route: &Route) -> String {
    format!(
        "{} route: {} points (stroke {})",
        route.kind().label(),
        route.shape().len(),
        route.color().hex()
    )
}

/// Build a GeoJSON FeatureCollection of resolved routes
///
/// GeoJSON positions are `[lng, lat]`, the reverse of the wire order used by
/// the directions provider.
pub fn geojson_document(routes: &[Route]) -> Value {
    let features: Vec<Value> = routes
        .iter()
        .map(|route| {
            let coordinates: Vec<Value> = route
                .shape()
                .iter()
                .map(|coord| json!([coord.longitude, coord.latitude]))
                .collect();
            json!({
                "type": "Feature",
                "properties": {
                    "variant": route.kind().label(),
                    "stroke": route.color().hex(),
                },
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
