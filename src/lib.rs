//! Client-side controller layer for a native map renderer.
//!
//! This crate mediates between declarative UI code and an imperative map
//! renderer living on the far side of a platform message channel. It keeps
//! client-side mirrors of the annotations placed on the map, forwards
//! mutations and camera commands over the channel, translates renderer
//! events into typed callbacks, and enriches tap coordinates with
//! best-effort reverse-geocoded places. The host is responsible only for
//! wiring a [`channel::RendererChannel`] implementation to the real
//! transport and feeding decoded [`events::RendererEvent`]s into the
//! controller.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`controller`] | The [`controller::MapController`] facade |
//! | [`annotations`] | Symbol/line/circle/fill entities and their options |
//! | [`camera`] | Camera snapshots, movement commands, motion state |
//! | [`channel`] | Renderer channel trait and channel errors |
//! | [`events`] | Inbound renderer events, callbacks, change listeners |
//! | [`geocoding`] | Reverse geocoding client and place resolution |
//! | [`connectivity`] | Online/offline gate for network lookups |
//! | [`geo`] | Coordinate and viewport primitives |

pub mod annotations;
pub mod camera;
pub mod channel;
pub mod connectivity;
pub mod controller;
pub mod events;
pub mod geo;
pub mod geocoding;

#[cfg(test)]
pub(crate) mod test_support;
