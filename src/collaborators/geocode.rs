//! Geocoding collaborator contract.

use async_trait::async_trait;

use crate::error::GeocodeError;

/// Converts extracted location names to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Whether geocoding is configured. Disabled geocoders are skipped,
    /// not errored.
    fn is_enabled(&self) -> bool;

    /// Geocode a batch of location names, returning a JSON array of
    /// results. Callers cap the batch at 20 names.
    async fn geocode_all(&self, locations: &[String]) -> Result<String, GeocodeError>;
}

/// Maximum location names per geocoding call.
pub const MAX_GEOCODE_LOCATIONS: usize = 20;
