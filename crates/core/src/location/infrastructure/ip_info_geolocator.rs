use std::time::Duration;

use serde::Deserialize;

use crate::location::domain::geolocator::{GeolocationError, Geolocator, Location};

pub const DEFAULT_ENDPOINT: &str = "https://ipinfo.io/json";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves the public IP's city and country with one blocking GET.
pub struct IpInfoGeolocator {
    endpoint: String,
}

#[derive(Deserialize)]
struct IpInfoResponse {
    city: Option<String>,
    country: Option<String>,
}

impl IpInfoGeolocator {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for IpInfoGeolocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Geolocator for IpInfoGeolocator {
    fn locate(&self) -> Result<Location, GeolocationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeolocationError::Lookup(Box::new(e)))?;
        let body = client
            .get(&self.endpoint)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(|e| GeolocationError::Lookup(Box::new(e)))?;
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Location, GeolocationError> {
    let response: IpInfoResponse =
        serde_json::from_str(body).map_err(|e| GeolocationError::Response(Box::new(e)))?;
    Ok(Location {
        city: response.city,
        country: response.country,
    })
}
