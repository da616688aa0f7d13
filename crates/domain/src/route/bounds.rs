//! Map bounds covering a set of routes.

use serde::{Deserialize, Serialize};

use super::geometry::Coordinate;
use super::types::Route;

/// Axis-aligned longitude/latitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// South-west corner.
    pub south_west: Coordinate,
    /// North-east corner.
    pub north_east: Coordinate,
}

impl BoundingBox {
    /// A degenerate box around one position.
    #[must_use]
    pub const fn around(point: Coordinate) -> Self {
        Self {
            south_west: point,
            north_east: point,
        }
    }

    /// Grows the box to include `point`.
    pub fn extend(&mut self, point: Coordinate) {
        self.south_west = Coordinate::new(
            self.south_west.lng().min(point.lng()),
            self.south_west.lat().min(point.lat()),
        );
        self.north_east = Coordinate::new(
            self.north_east.lng().max(point.lng()),
            self.north_east.lat().max(point.lat()),
        );
    }

    /// Box covering every position, or `None` if there are none.
    #[must_use]
    pub fn from_coordinates<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut bounds = Self::around(*points.next()?);
        for point in points {
            bounds.extend(*point);
        }
        Some(bounds)
    }

    /// Box covering every visible route.
    ///
    /// Returns `None` when no route is visible, so the caller keeps its
    /// current view.
    #[must_use]
    pub fn from_routes(routes: &[&Route]) -> Option<Self> {
        Self::from_coordinates(routes.iter().flat_map(|r| r.geometry.coordinates.iter()))
    }

    /// Centre of the box.
    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            f64::midpoint(self.south_west.lng(), self.north_east.lng()),
            f64::midpoint(self.south_west.lat(), self.north_east.lat()),
        )
    }

    /// Returns true if `point` lies inside or on the edge.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south_west.lng()..=self.north_east.lng()).contains(&point.lng())
            && (self.south_west.lat()..=self.north_east.lat()).contains(&point.lat())
    }
}
