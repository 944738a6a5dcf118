//! Inbound renderer events and observer plumbing.
//!
//! Events flow one way: the native renderer emits a [`RendererEvent`], the
//! controller updates its mirrors and invokes the matching user callback.
//! Two observer mechanisms exist side by side, mirroring how UI code consumes
//! them. Typed callbacks carry event payloads and fire once per event.
//! Change listeners are bare `Fn()` hooks fired after any observable state
//! change, at most once per handled event, so a widget can re-read the
//! controller and re-render.
//!
//! Callbacks and listeners are deliberately not `Send`: they run on the
//! thread that feeds events to the controller, which in an embedder is the
//! platform UI thread.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use serde::{Deserialize, Serialize};

use crate::annotations::{Circle, Fill, Line, Symbol};
use crate::camera::{CameraPosition, LocationTrackingMode};
use crate::geo::{LngLat, ScreenPoint, UserLocation};
use crate::geocoding::Place;

/// A tap or long-press on the map background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Screen position of the gesture in logical pixels.
    pub point: ScreenPoint,
    /// The tapped map coordinate.
    pub coordinate: LngLat,
}

/// An event decoded from the renderer side of the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RendererEvent {
    SymbolTapped { id: String },
    LineTapped { id: String },
    CircleTapped { id: String },
    FillTapped { id: String },
    /// Tap on the info window attached to a symbol.
    InfoWindowTapped { id: String },
    MapClick(ClickEvent),
    MapLongClick(ClickEvent),
    CameraMoveStarted,
    CameraMoved { position: CameraPosition },
    /// The camera came to rest. Renderers that cannot report a final
    /// position send `None`; the last mirrored position then stands.
    CameraIdle { position: Option<CameraPosition> },
    StyleLoaded,
    MapIdle,
    TrackingModeChanged { mode: LocationTrackingMode },
    /// The user gesture broke location tracking.
    TrackingDismissed,
    UserLocationUpdated { location: UserLocation },
}

/// What the controller did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The event updated state and/or reached its callback.
    Delivered,
    /// The event referenced an entity this controller does not track and
    /// was discarded.
    Dropped,
}

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registry of bare change listeners.
#[derive(Default)]
pub(crate) struct ChangeListeners {
    next_id: u64,
    entries: Vec<(ListenerId, Box<dyn Fn()>)>,
}

impl ChangeListeners {
    pub(crate) fn add(&mut self, listener: impl Fn() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the id was registered.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Invoke every listener in registration order.
    pub(crate) fn notify(&self) {
        for (_, listener) in &self.entries {
            listener();
        }
    }
}

impl std::fmt::Debug for ChangeListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// One optional slot per typed event callback. Setting a slot replaces any
/// previous callback for that event.
#[derive(Default)]
pub(crate) struct CallbackRegistry {
    pub(crate) symbol_tapped: Option<Box<dyn Fn(&Symbol, &Place)>>,
    pub(crate) line_tapped: Option<Box<dyn Fn(&Line)>>,
    pub(crate) circle_tapped: Option<Box<dyn Fn(&Circle)>>,
    pub(crate) fill_tapped: Option<Box<dyn Fn(&Fill)>>,
    pub(crate) info_window_tapped: Option<Box<dyn Fn(&Symbol)>>,
    pub(crate) map_click: Option<Box<dyn Fn(&ClickEvent, &Place)>>,
    pub(crate) map_long_click: Option<Box<dyn Fn(&ClickEvent, &Place)>>,
    pub(crate) camera_move_started: Option<Box<dyn Fn()>>,
    pub(crate) camera_moved: Option<Box<dyn Fn(&CameraPosition)>>,
    pub(crate) camera_idle: Option<Box<dyn Fn()>>,
    pub(crate) style_loaded: Option<Box<dyn Fn()>>,
    pub(crate) map_idle: Option<Box<dyn Fn()>>,
    pub(crate) tracking_mode_changed: Option<Box<dyn Fn(LocationTrackingMode)>>,
    pub(crate) tracking_dismissed: Option<Box<dyn Fn()>>,
    pub(crate) user_location_updated: Option<Box<dyn Fn(&UserLocation)>>,
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry").finish_non_exhaustive()
    }
}
