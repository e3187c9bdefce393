use std::time::Duration;

use reqwest::{blocking::Client, Url};
use tracing::{debug, warn};

use crate::error::DriverError;
use crate::geo::Coordinate;

use super::parser::parse_directions_response;
use super::response::DirectionsResponse;
use super::{DirectionsProvider, RawRouteResponse, RouteOptions};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP client for a Google-style directions endpoint.
#[derive(Debug, Clone)]
pub struct HttpDirections {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpDirections {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, DriverError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| DriverError::RouteCalculation(format!("failed to build client: {err}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request_url(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        options: &RouteOptions,
    ) -> Result<Url, DriverError> {
        let mut url = Url::parse(&self.endpoint).map_err(|err| {
            DriverError::RouteCalculation(format!("invalid directions endpoint: {err}"))
        })?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(
                    "origin",
                    &format!("{:.6},{:.6}", origin.latitude, origin.longitude),
                )
                .append_pair(
                    "destination",
                    &format!("{:.6},{:.6}", destination.latitude, destination.longitude),
                )
                .append_pair("mode", options.mode.as_str())
                .append_pair("language", &options.language);
            if let Some(avoid) = options.avoid_param() {
                query.append_pair("avoid", &avoid);
            }
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
        }
        Ok(url)
    }
}

impl DirectionsProvider for HttpDirections {
    fn calculate_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        options: &RouteOptions,
    ) -> Result<RawRouteResponse, DriverError> {
        let url = self.request_url(origin, destination, options)?;
        debug!(endpoint = %self.endpoint, "requesting directions");

        let response = self.client.get(url).send().map_err(|err| {
            warn!(error = %err, "directions request failed");
            DriverError::RouteCalculation(err.to_string())
        })?;
        let parsed: DirectionsResponse = response
            .json()
            .map_err(|err| DriverError::RouteCalculation(format!("malformed response: {err}")))?;
        parse_directions_response(parsed)
    }
}
