//! Pluggable directions providers.
//!
//! Implementations of [`DirectionsProvider`]:
//!
//! - **`StaticDirections`**: In-memory table of canned responses. Zero dependencies.
//! - **`HttpDirections`** (feature `directions`): Calls a Google-style directions endpoint.
//! - **`CachedDirections`**: LRU cache around any provider; failures are not cached.
//!
//! Providers return a [`RawRouteResponse`], which [`RawRouteResponse::into_route`]
//! turns into a [`Route`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::geo::{BoundingBox, Coordinate};
use crate::route::{build_route, RawStep, Route};

mod cache;
#[cfg(feature = "directions")]
mod http;
mod parser;
mod response;

pub use cache::CachedDirections;
#[cfg(feature = "directions")]
pub use http::HttpDirections;
pub use parser::parse_directions_json;


/// Public Google Directions endpoint.
pub const DEFAULT_DIRECTIONS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/directions/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteOptions {
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub mode: TravelMode,
    pub language: String,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            avoid_tolls: false,
            avoid_highways: false,
            mode: TravelMode::Driving,
            language: "en".to_string(),
        }
    }
}

impl RouteOptions {
    /// `avoid` query value, e.g. `tolls|highways`.
    pub fn avoid_param(&self) -> Option<String> {
        let mut avoid = Vec::new();
        if self.avoid_tolls {
            avoid.push("tolls");
        }
        if self.avoid_highways {
            avoid.push("highways");
        }
        (!avoid.is_empty()).then(|| avoid.join("|"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub avoid_tolls: bool,
    pub avoid_highways: bool,
    pub mode: TravelMode,
    pub language: String,
    pub cache_capacity: usize,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DIRECTIONS_ENDPOINT.to_string(),
            api_key: None,
            avoid_tolls: false,
            avoid_highways: false,
            mode: TravelMode::Driving,
            language: "en".to_string(),
            cache_capacity: 256,
        }
    }
}

impl DirectionsConfig {
    pub fn route_options(&self) -> RouteOptions {
        RouteOptions {
            avoid_tolls: self.avoid_tolls,
            avoid_highways: self.avoid_highways,
            mode: self.mode,
            language: self.language.clone(),
        }
    }
}

/// The part of a directions response the core consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRouteResponse {
    pub polyline: String,
    pub steps: Vec<RawStep>,
    pub bounds: Option<BoundingBox>,
    pub distance_text: String,
    pub duration_text: String,
}

impl RawRouteResponse {
    pub fn into_route(self) -> Route {
        build_route(&self.polyline, &self.steps, self.bounds)
            .with_summary(&self.distance_text, &self.duration_text)
    }
}

/// Trait for directions backends. Implementations must be `Send + Sync` so a
/// provider can be shared with the session task.
pub trait DirectionsProvider: Send + Sync {
    fn calculate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        options: &RouteOptions,
    ) -> Result<RawRouteResponse, DriverError>;
}

/// Coordinates rounded to polyline precision, usable as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CoordinateKey(i64, i64);

impl From<Coordinate> for CoordinateKey {
    fn from(coordinate: Coordinate) -> Self {
        Self(
            (coordinate.latitude * 1e5).round() as i64,
            (coordinate.longitude * 1e5).round() as i64,
        )
    }
}

/// Canned responses keyed by origin and destination. Options are ignored.
#[derive(Debug, Clone, Default)]
pub struct StaticDirections {
    table: HashMap<(CoordinateKey, CoordinateKey), RawRouteResponse>,
}

impl StaticDirections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(
        mut self,
        origin: Coordinate,
        destination: Coordinate,
        response: RawRouteResponse,
    ) -> Self {
        self.insert(origin, destination, response);
        self
    }

    pub fn insert(&mut self, origin: Coordinate, destination: Coordinate, response: RawRouteResponse) {
        self.table.insert((origin.into(), destination.into()), response);
    }
}

impl DirectionsProvider for StaticDirections {
    fn calculate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        _options: &RouteOptions,
    ) -> Result<RawRouteResponse, DriverError> {
        self.table
            .get(&(origin.into(), destination.into()))
            .cloned()
            .ok_or_else(|| DriverError::RouteCalculation("ZERO_RESULTS".to_string()))
    }
}

/// Build the configured network provider, wrapped in an LRU cache.
#[cfg(feature = "directions")]
pub fn build_directions_provider(
    config: &DirectionsConfig,
) -> Result<Box<dyn DirectionsProvider>, DriverError> {
    let inner = HttpDirections::new(&config.endpoint, config.api_key.clone())?;
    Ok(Box::new(CachedDirections::new(Box::new(inner), config.cache_capacity)))
}
