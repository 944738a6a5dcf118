//! Camera model: position snapshots, movement commands, motion state.
//!
//! The controller never computes camera math itself. It forwards
//! [`CameraUpdate`] commands to the renderer and mirrors the positions the
//! renderer reports back through move events. [`CameraMotion`] is the
//! two-state machine driven by those events: `Moving` between a move-started
//! event and the next idle event, `Idle` otherwise.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::geo::{LngLat, LngLatBounds};

/// A full camera description as reported by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraPosition {
    pub target: LngLat,
    pub zoom: f64,
    /// Compass bearing in degrees, clockwise from north.
    pub bearing: f64,
    /// Viewing angle in degrees from straight down.
    pub tilt: f64,
}

/// A camera movement command. Every variant maps onto one renderer-side
/// camera operation; relative variants (`ScrollBy`, `ZoomBy`, ...) are
/// resolved against the renderer's current camera, not the mirrored one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraUpdate {
    /// Jump to a complete position.
    NewPosition { position: CameraPosition },
    /// Re-center, keeping zoom, bearing and tilt.
    NewCenter { center: LngLat },
    /// Re-center and set zoom in one step.
    NewCenterZoom { center: LngLat, zoom: f64 },
    /// Fit a bounding box with uniform padding in logical pixels.
    NewBounds { bounds: LngLatBounds, padding: f64 },
    /// Pan by a screen-space delta in logical pixels.
    ScrollBy { dx: f64, dy: f64 },
    /// Change zoom by a relative amount.
    ZoomBy { amount: f64 },
    /// Zoom in by one level.
    ZoomIn,
    /// Zoom out by one level.
    ZoomOut,
    /// Set an absolute zoom level.
    ZoomTo { zoom: f64 },
    /// Set an absolute bearing in degrees.
    BearingTo { bearing: f64 },
    /// Set an absolute tilt in degrees.
    TiltTo { tilt: f64 },
}

impl CameraUpdate {
    /// Convenience for the common "center on a point at this zoom" move.
    #[must_use]
    pub fn center_zoom(center: LngLat, zoom: f64) -> Self {
        Self::NewCenterZoom { center, zoom }
    }

    /// Fit `bounds` with the same padding on all four edges.
    #[must_use]
    pub fn bounds(bounds: LngLatBounds, padding: f64) -> Self {
        Self::NewBounds { bounds, padding }
    }
}

/// Whether the camera is currently between a move-started event and the
/// matching idle event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMotion {
    #[default]
    Idle,
    Moving,
}

impl CameraMotion {
    #[must_use]
    pub fn is_moving(self) -> bool {
        self == Self::Moving
    }
}

/// How the renderer follows the device location puck.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationTrackingMode {
    /// The camera ignores the device location.
    #[default]
    None,
    /// The camera follows the device location.
    Tracking,
    /// The camera follows location and rotates with the compass.
    TrackingCompass,
    /// The camera follows location and rotates with the course over ground.
    TrackingGps,
}
