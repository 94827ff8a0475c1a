//! Geographic value types for saferoute
//!
//! A `Coordinate` is a plain latitude/longitude pair. The core performs no
//! range validation; out-of-range values are passed through to the remote
//! services uninterpreted.

use std::fmt;
use std::str::FromStr;

use crate::core::error::Error;

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from a latitude and longitude
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format as `lat,lng` for query strings
    pub fn query_tuple(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    /// Parse a `lat,lng` pair, e.g. `39.3299,-76.6205`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ',');
        let latitude = parts
            .next()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .ok_or_else(|| Error::InvalidInput(format!("invalid coordinate: {s}")))?;
        let longitude = parts
            .next()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .ok_or_else(|| Error::InvalidInput(format!("invalid coordinate: {s}")))?;
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Pair a flat lat,lng-interleaved array into coordinates
///
/// Consumes values two at a time, in order. A dangling trailing value (odd
/// array length) is dropped.
pub fn pair_shape_points(points: &[f64]) -> Vec<Coordinate> {
    points
        .chunks_exact(2)
        .map(|pair| Coordinate::new(pair[0], pair[1]))
        .collect()
}
