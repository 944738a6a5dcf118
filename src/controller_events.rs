//! Renderer event dispatch extracted from `controller`.
//!
//! One entry point, [`MapController::handle_event`], applies each event in
//! three steps: update the mirrored state, wake change listeners (at most
//! once per event, and only when observable state changed), then invoke the
//! typed callback for the event if one is registered.
//!
//! Entity tap events are looked up in the registries first. A tap on an id
//! this controller does not track is dropped with a debug log, not treated
//! as an error: the renderer happily reports annotations owned by other
//! controllers or by the style itself.
//!
//! Place resolution for symbol taps and map clicks only runs when a callback
//! is registered for the event, so an idle controller never touches the
//! network.

#[cfg(test)]
#[path = "controller_events_test.rs"]
mod controller_events_test;

use super::MapController;
use crate::annotations::AnnotationKind;
use crate::camera::{CameraMotion, LocationTrackingMode};
use crate::events::{EventOutcome, RendererEvent};

impl MapController {
    /// Apply one renderer event to the mirrored state and fan it out to
    /// observers. Returns whether the event was delivered or dropped.
    pub async fn handle_event(&mut self, event: RendererEvent) -> EventOutcome {
        match event {
            RendererEvent::SymbolTapped { id } => {
                let Some(symbol) = self.symbols.get(&id) else {
                    return self.drop_event(AnnotationKind::Symbol, &id);
                };
                let symbol = symbol.clone();
                if let Some(callback) = &self.callbacks.symbol_tapped {
                    let coordinate = symbol.options.geometry.unwrap_or_default();
                    let place = self.places.resolve(coordinate).await;
                    callback(&symbol, &place);
                }
                EventOutcome::Delivered
            }

            RendererEvent::LineTapped { id } => {
                let Some(line) = self.lines.get(&id) else {
                    return self.drop_event(AnnotationKind::Line, &id);
                };
                if let Some(callback) = &self.callbacks.line_tapped {
                    callback(line);
                }
                EventOutcome::Delivered
            }

            RendererEvent::CircleTapped { id } => {
                let Some(circle) = self.circles.get(&id) else {
                    return self.drop_event(AnnotationKind::Circle, &id);
                };
                if let Some(callback) = &self.callbacks.circle_tapped {
                    callback(circle);
                }
                EventOutcome::Delivered
            }

            RendererEvent::FillTapped { id } => {
                let Some(fill) = self.fills.get(&id) else {
                    return self.drop_event(AnnotationKind::Fill, &id);
                };
                if let Some(callback) = &self.callbacks.fill_tapped {
                    callback(fill);
                }
                EventOutcome::Delivered
            }

            RendererEvent::InfoWindowTapped { id } => {
                let Some(symbol) = self.symbols.get(&id) else {
                    return self.drop_event(AnnotationKind::Symbol, &id);
                };
                if let Some(callback) = &self.callbacks.info_window_tapped {
                    callback(symbol);
                }
                EventOutcome::Delivered
            }

            RendererEvent::MapClick(click) => {
                if let Some(callback) = &self.callbacks.map_click {
                    let place = self.places.resolve(click.coordinate).await;
                    callback(&click, &place);
                }
                EventOutcome::Delivered
            }

            RendererEvent::MapLongClick(click) => {
                if let Some(callback) = &self.callbacks.map_long_click {
                    let place = self.places.resolve(click.coordinate).await;
                    callback(&click, &place);
                }
                EventOutcome::Delivered
            }

            RendererEvent::CameraMoveStarted => {
                self.motion = CameraMotion::Moving;
                self.notify_listeners();
                if let Some(callback) = &self.callbacks.camera_move_started {
                    callback();
                }
                EventOutcome::Delivered
            }

            RendererEvent::CameraMoved { position } => {
                self.camera = Some(position);
                self.notify_listeners();
                if let Some(callback) = &self.callbacks.camera_moved {
                    callback(&position);
                }
                EventOutcome::Delivered
            }

            RendererEvent::CameraIdle { position } => {
                if let Some(position) = position {
                    self.camera = Some(position);
                }
                self.motion = CameraMotion::Idle;
                self.notify_listeners();
                if let Some(callback) = &self.callbacks.camera_idle {
                    callback();
                }
                EventOutcome::Delivered
            }

            RendererEvent::StyleLoaded => {
                if let Some(callback) = &self.callbacks.style_loaded {
                    callback();
                }
                EventOutcome::Delivered
            }

            RendererEvent::MapIdle => {
                if let Some(callback) = &self.callbacks.map_idle {
                    callback();
                }
                EventOutcome::Delivered
            }

            RendererEvent::TrackingModeChanged { mode } => {
                self.tracking_mode = mode;
                self.notify_listeners();
                if let Some(callback) = &self.callbacks.tracking_mode_changed {
                    callback(mode);
                }
                EventOutcome::Delivered
            }

            RendererEvent::TrackingDismissed => {
                self.tracking_mode = LocationTrackingMode::None;
                self.notify_listeners();
                if let Some(callback) = &self.callbacks.tracking_dismissed {
                    callback();
                }
                EventOutcome::Delivered
            }

            // Location fixes arrive continuously; they update the mirror and
            // the typed callback without waking change listeners.
            RendererEvent::UserLocationUpdated { location } => {
                self.last_user_location = Some(location.clone());
                if let Some(callback) = &self.callbacks.user_location_updated {
                    callback(&location);
                }
                EventOutcome::Delivered
            }
        }
    }

    fn drop_event(&self, kind: AnnotationKind, id: &str) -> EventOutcome {
        tracing::debug!(%kind, id, "dropping event for untracked annotation");
        EventOutcome::Dropped
    }
}
