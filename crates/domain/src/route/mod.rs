//! Route comparison types: GeoJSON geometry, calculation payloads and
//! map bounds.

mod bounds;
mod geometry;
mod types;

pub use bounds::BoundingBox;
pub use geometry::{Coordinate, LineStringGeometry};
pub use types::{
    EfficientRoute, PointIn, Route, RouteCalculationRequest, RouteCalculationResponse,
    RouteSavings, TransportMode,
};
