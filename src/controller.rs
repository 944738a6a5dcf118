//! Map controller: the client-side mirror of a native map renderer.
//!
//! DESIGN
//! ======
//! `MapController` sits between declarative UI code and an imperative
//! renderer on the far side of a [`RendererChannel`]. It keeps one registry
//! per annotation kind, a camera snapshot, the tracking mode, and the last
//! reported user location, and it owns the callback and listener registries
//! that UI code observes.
//!
//! Every mutation follows the same ordering: await the remote call first,
//! then apply the local mirror change, then notify change listeners exactly
//! once. A failed remote call therefore leaves the mirror untouched, and the
//! mirror never claims state the renderer has not confirmed. There is no
//! retry, no timeout beyond the channel's own, and no concurrency control
//! beyond `&mut self`: callers that issue overlapping mutations get
//! last-writer-wins, matching the renderer.
//!
//! Inbound events go through [`MapController::handle_event`]. Events that
//! reference an entity the controller does not track are dropped, not
//! errored: the renderer may legitimately report taps on annotations some
//! other controller owns.
//!
//! Annotation CRUD lives in `controller_annotations`, event dispatch in
//! `controller_events`; this file holds the state, construction, observer
//! registration, and the camera/style/query passthroughs.

#[path = "controller_annotations.rs"]
mod controller_annotations;
#[path = "controller_events.rs"]
mod controller_events;

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::annotations::{AnnotationKind, Circle, Fill, Line, Symbol};
use crate::camera::{CameraMotion, CameraPosition, CameraUpdate, LocationTrackingMode};
use crate::channel::{ChannelError, LayerDefinition, RendererChannel};
use crate::events::{CallbackRegistry, ChangeListeners, ClickEvent, ListenerId};
use crate::geo::{EdgeInsets, LngLat, ScreenPoint, UserLocation, VisibleRegion};
use crate::geocoding::{Place, PlaceResolver};

/// Errors from controller operations.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The entity passed in is not in this controller's registry.
    #[error("{kind} {id} is not tracked by this controller")]
    UnknownAnnotation { kind: AnnotationKind, id: String },

    /// The entity passed in has the id of a tracked entity but different
    /// contents. The caller is holding an outdated copy.
    #[error("{kind} {id} does not match the tracked copy")]
    StaleAnnotation { kind: AnnotationKind, id: String },

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Client-side facade over a native map renderer.
pub struct MapController {
    channel: Arc<dyn RendererChannel>,
    places: PlaceResolver,
    symbols: HashMap<String, Symbol>,
    lines: HashMap<String, Line>,
    circles: HashMap<String, Circle>,
    fills: HashMap<String, Fill>,
    camera: Option<CameraPosition>,
    motion: CameraMotion,
    tracking_mode: LocationTrackingMode,
    last_user_location: Option<UserLocation>,
    callbacks: CallbackRegistry,
    listeners: ChangeListeners,
}

impl MapController {
    #[must_use]
    pub fn new(channel: Arc<dyn RendererChannel>, places: PlaceResolver) -> Self {
        Self {
            channel,
            places,
            symbols: HashMap::new(),
            lines: HashMap::new(),
            circles: HashMap::new(),
            fills: HashMap::new(),
            camera: None,
            motion: CameraMotion::default(),
            tracking_mode: LocationTrackingMode::default(),
            last_user_location: None,
            callbacks: CallbackRegistry::default(),
            listeners: ChangeListeners::default(),
        }
    }

    // ====== STATE ======

    /// Last camera position reported by the renderer. `None` until the first
    /// camera event arrives.
    #[must_use]
    pub fn camera_position(&self) -> Option<CameraPosition> {
        self.camera
    }

    /// Current motion state of the two-state camera machine.
    #[must_use]
    pub fn camera_motion(&self) -> CameraMotion {
        self.motion
    }

    #[must_use]
    pub fn is_camera_moving(&self) -> bool {
        self.motion.is_moving()
    }

    /// Tracking mode as last reported by the renderer.
    #[must_use]
    pub fn tracking_mode(&self) -> LocationTrackingMode {
        self.tracking_mode
    }

    /// Most recent location fix delivered through events, if any.
    #[must_use]
    pub fn last_user_location(&self) -> Option<&UserLocation> {
        self.last_user_location.as_ref()
    }

    // ====== OBSERVERS ======

    /// Register a change listener, fired after every observable state
    /// change. Returns the handle used to unregister.
    pub fn add_listener(&mut self, listener: impl Fn() + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a listener. Returns whether the handle was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub(crate) fn notify_listeners(&self) {
        self.listeners.notify();
    }

    pub fn on_symbol_tapped(&mut self, callback: impl Fn(&Symbol, &Place) + 'static) {
        self.callbacks.symbol_tapped = Some(Box::new(callback));
    }

    pub fn on_line_tapped(&mut self, callback: impl Fn(&Line) + 'static) {
        self.callbacks.line_tapped = Some(Box::new(callback));
    }

    pub fn on_circle_tapped(&mut self, callback: impl Fn(&Circle) + 'static) {
        self.callbacks.circle_tapped = Some(Box::new(callback));
    }

    pub fn on_fill_tapped(&mut self, callback: impl Fn(&Fill) + 'static) {
        self.callbacks.fill_tapped = Some(Box::new(callback));
    }

    pub fn on_info_window_tapped(&mut self, callback: impl Fn(&Symbol) + 'static) {
        self.callbacks.info_window_tapped = Some(Box::new(callback));
    }

    pub fn on_map_click(&mut self, callback: impl Fn(&ClickEvent, &Place) + 'static) {
        self.callbacks.map_click = Some(Box::new(callback));
    }

    pub fn on_map_long_click(&mut self, callback: impl Fn(&ClickEvent, &Place) + 'static) {
        self.callbacks.map_long_click = Some(Box::new(callback));
    }

    pub fn on_camera_move_started(&mut self, callback: impl Fn() + 'static) {
        self.callbacks.camera_move_started = Some(Box::new(callback));
    }

    pub fn on_camera_moved(&mut self, callback: impl Fn(&CameraPosition) + 'static) {
        self.callbacks.camera_moved = Some(Box::new(callback));
    }

    pub fn on_camera_idle(&mut self, callback: impl Fn() + 'static) {
        self.callbacks.camera_idle = Some(Box::new(callback));
    }

    pub fn on_style_loaded(&mut self, callback: impl Fn() + 'static) {
        self.callbacks.style_loaded = Some(Box::new(callback));
    }

    pub fn on_map_idle(&mut self, callback: impl Fn() + 'static) {
        self.callbacks.map_idle = Some(Box::new(callback));
    }

    pub fn on_tracking_mode_changed(&mut self, callback: impl Fn(LocationTrackingMode) + 'static) {
        self.callbacks.tracking_mode_changed = Some(Box::new(callback));
    }

    pub fn on_tracking_dismissed(&mut self, callback: impl Fn() + 'static) {
        self.callbacks.tracking_dismissed = Some(Box::new(callback));
    }

    pub fn on_user_location_updated(&mut self, callback: impl Fn(&UserLocation) + 'static) {
        self.callbacks.user_location_updated = Some(Box::new(callback));
    }

    // ====== CAMERA ======

    /// Apply a camera update without animation. The mirrored position only
    /// changes when the renderer reports back through camera events.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn move_camera(&self, update: CameraUpdate) -> Result<bool, ControllerError> {
        Ok(self.channel.move_camera(&update).await?)
    }

    /// Apply a camera update with an animated transition.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn animate_camera(
        &self,
        update: CameraUpdate,
        duration: Option<Duration>,
    ) -> Result<bool, ControllerError> {
        Ok(self.channel.animate_camera(&update, duration).await?)
    }

    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn update_content_insets(
        &self,
        insets: EdgeInsets,
        animated: bool,
    ) -> Result<(), ControllerError> {
        Ok(self.channel.update_content_insets(&insets, animated).await?)
    }

    /// Request a tracking mode change. The mirrored mode updates when the
    /// renderer confirms through a tracking event, not here.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn set_tracking_mode(
        &self,
        mode: LocationTrackingMode,
    ) -> Result<(), ControllerError> {
        Ok(self.channel.set_tracking_mode(mode).await?)
    }

    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn set_map_language(&self, language: &str) -> Result<(), ControllerError> {
        Ok(self.channel.set_map_language(language).await?)
    }

    /// Corner coordinates of the current viewport, straight from the
    /// renderer.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn visible_region(&self) -> Result<VisibleRegion, ControllerError> {
        Ok(self.channel.visible_region().await?)
    }

    /// The renderer's last known device location, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn my_location(&self) -> Result<Option<LngLat>, ControllerError> {
        Ok(self.channel.my_location().await?)
    }

    // ====== STYLE ======

    /// Register an image for use by symbols and fill patterns. `sdf` marks
    /// the image as a signed distance field, recolorable by the renderer.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn add_image(
        &self,
        name: &str,
        bytes: &[u8],
        sdf: bool,
    ) -> Result<(), ControllerError> {
        Ok(self.channel.add_image(name, bytes, sdf).await?)
    }

    /// Register a georeferenced image source pinned to four corners.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn add_image_source(
        &self,
        id: &str,
        bytes: &[u8],
        corners: &[LngLat; 4],
    ) -> Result<(), ControllerError> {
        Ok(self.channel.add_image_source(id, bytes, corners).await?)
    }

    /// Replace the bytes and/or corners of an existing image source. Passing
    /// `None` keeps the current value.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn update_image_source(
        &self,
        id: &str,
        bytes: Option<&[u8]>,
        corners: Option<&[LngLat; 4]>,
    ) -> Result<(), ControllerError> {
        Ok(self.channel.update_image_source(id, bytes, corners).await?)
    }

    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn add_layer(&self, layer: &LayerDefinition) -> Result<(), ControllerError> {
        Ok(self.channel.add_layer(layer).await?)
    }

    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn remove_layer(&self, id: &str) -> Result<(), ControllerError> {
        Ok(self.channel.remove_layer(id).await?)
    }

    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn add_geojson_source(&self, id: &str, data: &Value) -> Result<(), ControllerError> {
        Ok(self.channel.add_geojson_source(id, data).await?)
    }

    /// Replace the data of an existing GeoJSON source.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn set_geojson_source(&self, id: &str, data: &Value) -> Result<(), ControllerError> {
        Ok(self.channel.set_geojson_source(id, data).await?)
    }

    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn remove_source(&self, id: &str) -> Result<(), ControllerError> {
        Ok(self.channel.remove_source(id).await?)
    }

    // ====== QUERIES ======

    /// Rendered features under `point`, optionally restricted to `layers`
    /// (empty means all layers).
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[String],
    ) -> Result<Vec<Value>, ControllerError> {
        Ok(self.channel.query_rendered_features(point, layers).await?)
    }

    /// Project coordinates into screen space, preserving order.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn to_screen_locations(
        &self,
        coordinates: &[LngLat],
    ) -> Result<Vec<ScreenPoint>, ControllerError> {
        Ok(self.channel.to_screen_locations(coordinates).await?)
    }

    /// Project a single coordinate into screen space.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns no point.
    pub async fn to_screen_location(
        &self,
        coordinate: LngLat,
    ) -> Result<ScreenPoint, ControllerError> {
        let mut points = self.channel.to_screen_locations(&[coordinate]).await?;
        if points.is_empty() {
            return Err(ChannelError::Call {
                method: "to_screen_locations",
                message: "no point returned".to_owned(),
            }
            .into());
        }
        Ok(points.remove(0))
    }

    /// Unproject a screen point into a coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails.
    pub async fn to_lng_lat(&self, point: ScreenPoint) -> Result<LngLat, ControllerError> {
        Ok(self.channel.to_lng_lat(point).await?)
    }
}

impl std::fmt::Debug for MapController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapController")
            .field("symbols", &self.symbols.len())
            .field("lines", &self.lines.len())
            .field("circles", &self.circles.len())
            .field("fills", &self.fills.len())
            .field("camera", &self.camera)
            .field("motion", &self.motion)
            .field("tracking_mode", &self.tracking_mode)
            .finish_non_exhaustive()
    }
}
