//! Route calculation request and response payloads.

use serde::{Deserialize, Serialize};

use super::geometry::{Coordinate, LineStringGeometry};
use crate::error::{DomainError, DomainResult};

/// Mode of transport used for route optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Road and rail.
    #[default]
    Land,
    /// Shipping lanes.
    Sea,
    /// Air freight.
    Air,
}

impl TransportMode {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Land => "land",
            Self::Sea => "sea",
            Self::Air => "air",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportMode {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.to_lowercase().as_str() {
            "land" => Ok(Self::Land),
            "sea" => Ok(Self::Sea),
            "air" => Ok(Self::Air),
            other => Err(DomainError::InvalidRoute(format!(
                "unknown transport mode: {other}"
            ))),
        }
    }
}

/// A named point with coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointIn {
    /// Place name, e.g. "Delhi".
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl PointIn {
    /// Creates a point.
    #[must_use]
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    /// Returns the point as a GeoJSON position.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lng, self.lat)
    }
}

/// Body of `POST /routes/calculate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCalculationRequest {
    /// Starting point.
    pub origin: PointIn,
    /// End point.
    pub destination: PointIn,
    /// Cargo weight in kilograms; must be positive.
    pub cargo_weight_kg: f64,
    /// Transport mode.
    pub transport_mode: TransportMode,
}

impl RouteCalculationRequest {
    /// Checks the payload before it is sent.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive weight or out-of-range points.
    pub fn validate(&self) -> DomainResult<()> {
        if !(self.cargo_weight_kg.is_finite() && self.cargo_weight_kg > 0.0) {
            return Err(DomainError::InvalidCargoWeight(format!(
                "{} (must be greater than 0)",
                self.cargo_weight_kg
            )));
        }
        for (label, point) in [("origin", &self.origin), ("destination", &self.destination)] {
            if !point.coordinate().is_valid() {
                return Err(DomainError::InvalidCoordinate(format!(
                    "{label} ({}, {}) is out of range",
                    point.lat, point.lng
                )));
            }
        }
        Ok(())
    }
}

/// A single route option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Path geometry.
    pub geometry: LineStringGeometry,
    /// Distance in kilometres.
    pub distance_km: f64,
    /// Duration in hours.
    pub duration_hours: f64,
    /// Estimated CO₂ emissions in kilograms.
    pub co2_emissions_kg: f64,
}

impl Route {
    /// Checks the geometry and metrics.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid geometry, non-positive distance or
    /// duration, or negative emissions.
    pub fn validate(&self) -> DomainResult<()> {
        self.geometry.validate()?;
        if self.distance_km <= 0.0 || self.duration_hours <= 0.0 {
            return Err(DomainError::InvalidRoute(
                "distance and duration must be positive".to_string(),
            ));
        }
        if self.co2_emissions_kg < 0.0 {
            return Err(DomainError::InvalidRoute(
                "emissions must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// CO₂ saved by the efficient route relative to the shortest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RouteSavings {
    /// Kilograms of CO₂ saved.
    pub co2_saved_kg: f64,
    /// Percentage saved.
    pub percentage: f64,
}

/// The lower-emission route option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficientRoute {
    /// Route data.
    #[serde(flatten)]
    pub route: Route,
    /// Savings against the shortest route.
    #[serde(default)]
    pub savings: RouteSavings,
}

/// Response of `POST /routes/calculate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCalculationResponse {
    /// Route optimised for distance.
    pub shortest_route: Route,
    /// Route optimised for emissions.
    pub efficient_route: EfficientRoute,
    /// Identifier of the stored search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_id: Option<String>,
    /// Free-form comparison data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<serde_json::Value>,
}

impl RouteCalculationResponse {
    /// Validates both routes.
    ///
    /// # Errors
    ///
    /// Returns the first invalid route's error.
    pub fn validate(&self) -> DomainResult<()> {
        self.shortest_route.validate()?;
        self.efficient_route.route.validate()
    }

    /// Both routes, shortest first.
    #[must_use]
    pub fn routes(&self) -> [&Route; 2] {
        [&self.shortest_route, &self.efficient_route.route]
    }
}
