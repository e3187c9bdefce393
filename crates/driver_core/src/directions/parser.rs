use crate::error::DriverError;
use crate::route::RawStep;

use super::response::{DirectionsLeg, DirectionsResponse, TextValue};
use super::RawRouteResponse;

/// Parse a Google-style directions JSON document.
pub fn parse_directions_json(json: &str) -> Result<RawRouteResponse, DriverError> {
    let response: DirectionsResponse = serde_json::from_str(json)
        .map_err(|err| DriverError::RouteCalculation(format!("malformed response: {err}")))?;
    parse_directions_response(response)
}

pub(super) fn parse_directions_response(
    resp: DirectionsResponse,
) -> Result<RawRouteResponse, DriverError> {
    if resp.status != "OK" {
        let detail = match resp.error_message {
            Some(message) if !message.trim().is_empty() => format!("{}: {}", resp.status, message),
            _ => resp.status,
        };
        return Err(DriverError::RouteCalculation(detail));
    }

    let route = resp
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| DriverError::RouteCalculation("response contained no routes".into()))?;

    let (distance_text, duration_text) = summary_texts(&route.legs);
    let mut steps = Vec::new();
    let mut previous_end = None;
    for (index, step) in route.legs.into_iter().flat_map(|leg| leg.steps).enumerate() {
        // A step starts where the previous one ended.
        let anchor = step
            .start_location
            .or(previous_end)
            .or(step.end_location)
            .ok_or_else(|| {
                DriverError::RouteCalculation(format!("step {index} has no location"))
            })?;
        previous_end = step.end_location;
        steps.push(RawStep {
            instruction_html: step.html_instructions,
            distance_text: step.distance.map(|d| d.text).unwrap_or_default(),
            duration_text: step.duration.map(|d| d.text).unwrap_or_default(),
            maneuver: step.maneuver,
            start_location: anchor,
        });
    }

    Ok(RawRouteResponse {
        polyline: route.overview_polyline.points,
        steps,
        bounds: route.bounds,
        distance_text,
        duration_text,
    })
}

/// A single leg keeps the provider's own texts; multi-leg routes are summed.
fn summary_texts(legs: &[DirectionsLeg]) -> (String, String) {
    if let [leg] = legs {
        return (text_of(&leg.distance), text_of(&leg.duration));
    }
    let meters: f64 = legs.iter().filter_map(|leg| leg.distance.as_ref()).map(|d| d.value).sum();
    let seconds: f64 = legs.iter().filter_map(|leg| leg.duration.as_ref()).map(|d| d.value).sum();
    (format_distance(meters), format_duration(seconds))
}

fn text_of(value: &Option<TextValue>) -> String {
    value.as_ref().map(|v| v.text.clone()).unwrap_or_default()
}

pub(super) fn format_distance(meters: f64) -> String {
    if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else {
        format!("{} m", meters.round() as u64)
    }
}

pub(super) fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round() as u64;
    match minutes {
        0 | 1 => "1 min".to_string(),
        m if m < 60 => format!("{m} mins"),
        m => format!("{} hours {} mins", m / 60, m % 60),
    }
}
