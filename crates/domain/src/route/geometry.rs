//! GeoJSON `LineString` geometry with coordinate validation.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A GeoJSON position: `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate(pub f64, pub f64);

impl Coordinate {
    /// Creates a coordinate from longitude and latitude.
    #[must_use]
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self(lng, lat)
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.0
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.1
    }

    /// Returns true if longitude is in [-180, 180] and latitude in [-90, 90].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.0) && (-90.0..=90.0).contains(&self.1)
    }
}

/// GeoJSON `LineString` describing a route path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStringGeometry {
    /// Always "`LineString`".
    #[serde(rename = "type")]
    pub geometry_type: String,
    /// Ordered positions along the path.
    pub coordinates: Vec<Coordinate>,
}

impl LineStringGeometry {
    /// The only geometry type routes use.
    pub const TYPE: &'static str = "LineString";

    /// Creates a `LineString` from positions.
    #[must_use]
    pub fn new(coordinates: Vec<Coordinate>) -> Self {
        Self {
            geometry_type: Self::TYPE.to_string(),
            coordinates,
        }
    }

    /// Checks the geometry type, the point count and every position.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> DomainResult<()> {
        if self.geometry_type != Self::TYPE {
            return Err(DomainError::InvalidGeometry(format!(
                "expected \"LineString\", got \"{}\"",
                self.geometry_type
            )));
        }
        if self.coordinates.len() < 2 {
            return Err(DomainError::InvalidGeometry(
                "coordinates must contain at least 2 points".to_string(),
            ));
        }
        if let Some(index) = self.coordinates.iter().position(|c| !c.is_valid()) {
            return Err(DomainError::InvalidCoordinate(format!(
                "pair at index {index}: longitude must be in [-180, 180] and latitude in [-90, 90]"
            )));
        }
        Ok(())
    }

    /// Returns true if `validate` succeeds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
