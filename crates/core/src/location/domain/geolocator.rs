use thiserror::Error;

use crate::shared::constants::UNKNOWN_LOCATION;

/// Coarse place resolved from the network, either part possibly unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Location {
    /// `"<city>, <country>"`. A missing city reads as [`UNKNOWN_LOCATION`];
    /// a missing country leaves no dangling separator.
    pub fn label(&self) -> String {
        let city = non_blank(self.city.as_deref()).unwrap_or(UNKNOWN_LOCATION);
        let country = non_blank(self.country.as_deref()).unwrap_or("");
        format!("{city}, {country}")
            .trim_matches(|c| c == ',' || c == ' ')
            .to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Error, Debug)]
pub enum GeolocationError {
    #[error("location lookup failed: {0}")]
    Lookup(#[source] Box<dyn std::error::Error>),
    #[error("location response not understood: {0}")]
    Response(#[source] Box<dyn std::error::Error>),
}

/// One-shot lookup of where this machine is.
pub trait Geolocator {
    fn locate(&self) -> Result<Location, GeolocationError>;
}

/// Label for the overlay: the located place, or [`UNKNOWN_LOCATION`] when
/// the lookup fails.
pub fn resolve_label(geolocator: &dyn Geolocator) -> String {
    match geolocator.locate() {
        Ok(location) => {
            let label = location.label();
            log::info!("Location resolved: {label}");
            label
        }
        Err(e) => {
            log::warn!("{e}");
            UNKNOWN_LOCATION.to_string()
        }
    }
}
