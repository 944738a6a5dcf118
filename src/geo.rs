//! Geographic and screen-space primitives shared by the whole crate.
//!
//! Coordinates follow the renderer convention: longitude first, latitude
//! second, both in degrees. Screen positions are logical pixels with the
//! origin at the top-left corner of the map view.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// A position on the map view in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned geographic rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds {
    pub southwest: LngLat,
    pub northeast: LngLat,
}

impl LngLatBounds {
    #[must_use]
    pub fn new(southwest: LngLat, northeast: LngLat) -> Self {
        Self { southwest, northeast }
    }

    /// Whether the coordinate lies inside the bounds (edges inclusive).
    ///
    /// Bounds that straddle the antimeridian are not handled specially; the
    /// renderer normalises coordinates before events reach this crate.
    #[must_use]
    pub fn contains(&self, coordinate: LngLat) -> bool {
        coordinate.lng >= self.southwest.lng
            && coordinate.lng <= self.northeast.lng
            && coordinate.lat >= self.southwest.lat
            && coordinate.lat <= self.northeast.lat
    }
}

/// Padding applied to the edges of the map view, in logical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    #[must_use]
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self { top, left, bottom, right }
    }

    /// Uniform padding on all four edges.
    #[must_use]
    pub fn all(value: f64) -> Self {
        Self { top: value, left: value, bottom: value, right: value }
    }
}

/// The geographic quadrilateral currently covered by the viewport.
///
/// With a tilted camera the region is a trapezoid, so the renderer reports
/// all four corners rather than a rectangle. `far` corners are the top edge
/// of the view, `near` corners the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibleRegion {
    pub far_left: LngLat,
    pub far_right: LngLat,
    pub near_left: LngLat,
    pub near_right: LngLat,
}

impl VisibleRegion {
    /// The smallest axis-aligned bounds containing all four corners.
    #[must_use]
    pub fn bounds(&self) -> LngLatBounds {
        let corners = [self.far_left, self.far_right, self.near_left, self.near_right];
        let mut southwest = corners[0];
        let mut northeast = corners[0];
        for corner in &corners[1..] {
            southwest.lng = southwest.lng.min(corner.lng);
            southwest.lat = southwest.lat.min(corner.lat);
            northeast.lng = northeast.lng.max(corner.lng);
            northeast.lat = northeast.lat.max(corner.lat);
        }
        LngLatBounds { southwest, northeast }
    }
}

/// A device location fix reported by the renderer's location component.
///
/// Sensor-derived fields are optional; platforms omit what the hardware
/// does not provide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub position: LngLat,
    pub altitude: Option<f64>,
    pub bearing: Option<f64>,
    pub speed: Option<f64>,
    pub horizontal_accuracy: Option<f64>,
    /// Milliseconds since the Unix epoch when the fix was taken.
    pub timestamp: i64,
}
