//! Renderer channel abstraction.
//!
//! DESIGN
//! ======
//! The controller talks to the native renderer exclusively through
//! [`RendererChannel`]. The trait hides the transport (a platform message
//! channel in production, an in-memory recorder in tests) and exposes one
//! method per remote operation. Methods are grouped the way the remote side
//! groups them: annotation CRUD per kind, camera control, style mutation,
//! and geometry/feature queries.
//!
//! Every method returns `Result<_, ChannelError>`. A channel failure means
//! the remote call did not complete; callers must leave their local mirrors
//! untouched when they see one, so local state never runs ahead of the
//! renderer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::annotations::{CircleOptions, FillOptions, LineOptions, SymbolOptions};
use crate::camera::{CameraUpdate, LocationTrackingMode};
use crate::geo::{EdgeInsets, LngLat, ScreenPoint, VisibleRegion};

/// Errors surfaced by a [`RendererChannel`] implementation.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The remote call reached the renderer but failed, or its response
    /// could not be interpreted.
    #[error("channel call {method} failed: {message}")]
    Call {
        method: &'static str,
        message: String,
    },

    /// The channel is no longer connected to a live renderer.
    #[error("renderer channel is detached")]
    Detached,
}

/// The renderer-side layer type a [`LayerDefinition`] instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Symbol,
    Line,
    Circle,
    Fill,
    Raster,
}

/// A style layer added on top of a registered source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDefinition {
    pub id: String,
    /// Identifier of the source this layer draws from.
    pub source: String,
    pub kind: LayerKind,
    /// Renderer layout properties, passed through verbatim.
    pub layout: Value,
    /// Renderer paint properties, passed through verbatim.
    pub paint: Value,
    /// Optional renderer filter expression.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Insert below this layer id instead of on top of the stack.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub below: Option<String>,
}

/// One method per remote renderer operation.
///
/// Annotation creation is batched: `create_*` takes fully merged options
/// records and returns renderer-assigned ids in the same order. Geometry
/// queries return the renderer's current geometry, which may differ from the
/// mirrored options while a drag is in flight.
#[async_trait]
pub trait RendererChannel: Send + Sync {
    // ====== SYMBOLS ======

    async fn create_symbols(&self, options: &[SymbolOptions]) -> Result<Vec<String>, ChannelError>;
    async fn update_symbol(&self, id: &str, options: &SymbolOptions) -> Result<(), ChannelError>;
    async fn remove_symbol(&self, id: &str) -> Result<(), ChannelError>;
    async fn symbol_geometry(&self, id: &str) -> Result<LngLat, ChannelError>;

    // ====== LINES ======

    async fn create_lines(&self, options: &[LineOptions]) -> Result<Vec<String>, ChannelError>;
    async fn update_line(&self, id: &str, options: &LineOptions) -> Result<(), ChannelError>;
    async fn remove_line(&self, id: &str) -> Result<(), ChannelError>;
    async fn line_geometry(&self, id: &str) -> Result<Vec<LngLat>, ChannelError>;

    // ====== CIRCLES ======

    async fn create_circles(&self, options: &[CircleOptions]) -> Result<Vec<String>, ChannelError>;
    async fn update_circle(&self, id: &str, options: &CircleOptions) -> Result<(), ChannelError>;
    async fn remove_circle(&self, id: &str) -> Result<(), ChannelError>;
    async fn circle_geometry(&self, id: &str) -> Result<LngLat, ChannelError>;

    // ====== FILLS ======

    async fn create_fills(&self, options: &[FillOptions]) -> Result<Vec<String>, ChannelError>;
    async fn update_fill(&self, id: &str, options: &FillOptions) -> Result<(), ChannelError>;
    async fn remove_fill(&self, id: &str) -> Result<(), ChannelError>;
    async fn fill_geometry(&self, id: &str) -> Result<Vec<Vec<LngLat>>, ChannelError>;

    // ====== CAMERA ======

    /// Apply `update` without animation. Returns whether the renderer
    /// accepted the move.
    async fn move_camera(&self, update: &CameraUpdate) -> Result<bool, ChannelError>;

    /// Apply `update` with an animated transition. Returns whether the
    /// renderer accepted the move.
    async fn animate_camera(
        &self,
        update: &CameraUpdate,
        duration: Option<Duration>,
    ) -> Result<bool, ChannelError>;

    async fn update_content_insets(
        &self,
        insets: &EdgeInsets,
        animated: bool,
    ) -> Result<(), ChannelError>;

    async fn set_tracking_mode(&self, mode: LocationTrackingMode) -> Result<(), ChannelError>;

    /// Switch label language, e.g. `"en"` or `"de"`.
    async fn set_map_language(&self, language: &str) -> Result<(), ChannelError>;

    async fn visible_region(&self) -> Result<VisibleRegion, ChannelError>;

    /// Last known device location, if location tracking has produced one.
    async fn my_location(&self) -> Result<Option<LngLat>, ChannelError>;

    // ====== STYLE ======

    async fn add_image(&self, name: &str, bytes: &[u8], sdf: bool) -> Result<(), ChannelError>;

    /// Register a georeferenced image source. `corners` are the image
    /// corners in order top-left, top-right, bottom-right, bottom-left.
    async fn add_image_source(
        &self,
        id: &str,
        bytes: &[u8],
        corners: &[LngLat; 4],
    ) -> Result<(), ChannelError>;

    /// Replace the bytes and/or corners of an existing image source. Absent
    /// parts keep their current value.
    async fn update_image_source(
        &self,
        id: &str,
        bytes: Option<&[u8]>,
        corners: Option<&[LngLat; 4]>,
    ) -> Result<(), ChannelError>;

    async fn add_layer(&self, layer: &LayerDefinition) -> Result<(), ChannelError>;
    async fn remove_layer(&self, id: &str) -> Result<(), ChannelError>;

    async fn add_geojson_source(&self, id: &str, data: &Value) -> Result<(), ChannelError>;

    /// Replace the data of an existing GeoJSON source.
    async fn set_geojson_source(&self, id: &str, data: &Value) -> Result<(), ChannelError>;

    async fn remove_source(&self, id: &str) -> Result<(), ChannelError>;

    // ====== QUERIES ======

    /// Rendered features under `point`, optionally restricted to `layers`
    /// (empty means all layers). Features are raw renderer JSON.
    async fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[String],
    ) -> Result<Vec<Value>, ChannelError>;

    /// Project coordinates into screen space, preserving order.
    async fn to_screen_locations(
        &self,
        coordinates: &[LngLat],
    ) -> Result<Vec<ScreenPoint>, ChannelError>;

    /// Unproject a screen point into a coordinate.
    async fn to_lng_lat(&self, point: ScreenPoint) -> Result<LngLat, ChannelError>;
}
