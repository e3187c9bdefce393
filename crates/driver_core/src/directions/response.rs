use crate::geo::{BoundingBox, Coordinate};

#[derive(serde::Deserialize)]
pub(super) struct DirectionsResponse {
    pub(super) status: String,
    #[serde(default)]
    pub(super) error_message: Option<String>,
    #[serde(default)]
    pub(super) routes: Vec<DirectionsRoute>,
}

#[derive(serde::Deserialize)]
pub(super) struct DirectionsRoute {
    pub(super) bounds: Option<BoundingBox>,
    pub(super) overview_polyline: EncodedPolyline,
    #[serde(default)]
    pub(super) legs: Vec<DirectionsLeg>,
}

#[derive(serde::Deserialize)]
pub(super) struct EncodedPolyline {
    pub(super) points: String,
}

#[derive(serde::Deserialize)]
pub(super) struct DirectionsLeg {
    pub(super) distance: Option<TextValue>,
    pub(super) duration: Option<TextValue>,
    #[serde(default)]
    pub(super) steps: Vec<DirectionsStep>,
}

#[derive(serde::Deserialize)]
pub(super) struct DirectionsStep {
    #[serde(default)]
    pub(super) html_instructions: String,
    pub(super) distance: Option<TextValue>,
    pub(super) duration: Option<TextValue>,
    pub(super) maneuver: Option<String>,
    pub(super) start_location: Option<Coordinate>,
    pub(super) end_location: Option<Coordinate>,
}

/// Provider `{ "text": "1.2 km", "value": 1200 }` pairs.
#[derive(serde::Deserialize, Default)]
pub(super) struct TextValue {
    #[serde(default)]
    pub(super) text: String,
    #[serde(default)]
    pub(super) value: f64,
}
