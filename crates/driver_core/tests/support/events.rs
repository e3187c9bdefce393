use driver_core::clock::{DriverAction, RouteUpdate, SessionEvent};
use driver_core::geo::Coordinate;
use driver_core::location::PositionFix;
use driver_core::route::Route;

pub fn action(at_ms: u64, action: DriverAction) -> SessionEvent {
    SessionEvent::Action { at_ms, action }
}

pub fn fix(at_ms: u64, coordinate: Coordinate) -> SessionEvent {
    SessionEvent::Position(PositionFix::new(coordinate, at_ms))
}

pub fn route_ready(at_ms: u64, route: Route) -> SessionEvent {
    SessionEvent::Route {
        at_ms,
        update: RouteUpdate::Ready(route),
    }
}

pub fn route_failed(at_ms: u64, reason: &str) -> SessionEvent {
    SessionEvent::Route {
        at_ms,
        update: RouteUpdate::Failed(reason.to_string()),
    }
}

/// `meters` due north of `from`, close enough for short offsets.
pub fn north_of(from: Coordinate, meters: f64) -> Coordinate {
    Coordinate::new(from.latitude + meters / 111_195.0, from.longitude)
}
