//! Shared test doubles: a recording renderer channel, a scripted geocoder,
//! and a fixed connectivity gate. Compiled only for tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::annotations::{CircleOptions, FillOptions, LineOptions, SymbolOptions};
use crate::camera::{CameraUpdate, LocationTrackingMode};
use crate::channel::{ChannelError, LayerDefinition, RendererChannel};
use crate::connectivity::Connectivity;
use crate::controller::MapController;
use crate::geo::{EdgeInsets, LngLat, ScreenPoint, VisibleRegion};
use crate::geocoding::{GeocodeError, Place, PlaceResolver, ReverseGeocode};

/// Build a controller over `channel` with an always-online resolver that
/// scripts nothing, so place lookups degrade to the placeholder.
pub(crate) fn test_controller(channel: Arc<RecordingChannel>) -> MapController {
    let resolver = PlaceResolver::new(
        Arc::new(StaticGeocoder::default()),
        Arc::new(FixedConnectivity(true)),
    );
    MapController::new(channel, resolver)
}

// =============================================================================
// RECORDING CHANNEL
// =============================================================================

/// In-memory [`RendererChannel`] that logs every call, hands out uuid ids,
/// and replays stored geometry. Individual methods can be forced to fail.
#[derive(Default)]
pub(crate) struct RecordingChannel {
    calls: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<&'static str>>,
    /// When set, the next `create_*` call returns exactly these ids.
    forced_ids: Mutex<Option<Vec<String>>>,
    symbol_geometries: Mutex<HashMap<String, LngLat>>,
    line_geometries: Mutex<HashMap<String, Vec<LngLat>>>,
    circle_geometries: Mutex<HashMap<String, LngLat>>,
    fill_geometries: Mutex<HashMap<String, Vec<Vec<LngLat>>>>,
    my_location: Mutex<Option<LngLat>>,
    features: Mutex<Vec<Value>>,
}

impl RecordingChannel {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Force every future call to `method` to fail.
    pub(crate) fn fail_on(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    /// Make the next `create_*` call return exactly `ids`.
    pub(crate) fn force_created_ids(&self, ids: Vec<String>) {
        *self.forced_ids.lock().unwrap() = Some(ids);
    }

    pub(crate) fn set_my_location(&self, location: Option<LngLat>) {
        *self.my_location.lock().unwrap() = location;
    }

    pub(crate) fn set_features(&self, features: Vec<Value>) {
        *self.features.lock().unwrap() = features;
    }

    /// Full call log as `(method, detail)` pairs, in call order.
    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Just the method names, in call order.
    pub(crate) fn method_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }

    fn record(&self, method: &'static str, detail: impl Into<String>) -> Result<(), ChannelError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_owned(), detail.into()));
        if self.failing.lock().unwrap().contains(method) {
            return Err(ChannelError::Call {
                method,
                message: "forced failure".to_owned(),
            });
        }
        Ok(())
    }

    fn next_ids(&self, count: usize) -> Vec<String> {
        if let Some(ids) = self.forced_ids.lock().unwrap().take() {
            return ids;
        }
        (0..count).map(|_| Uuid::new_v4().to_string()).collect()
    }
}

#[async_trait]
impl RendererChannel for RecordingChannel {
    async fn create_symbols(&self, options: &[SymbolOptions]) -> Result<Vec<String>, ChannelError> {
        self.record("create_symbols", options.len().to_string())?;
        let ids = self.next_ids(options.len());
        let mut geometries = self.symbol_geometries.lock().unwrap();
        for (id, opts) in ids.iter().zip(options) {
            if let Some(geometry) = opts.geometry {
                geometries.insert(id.clone(), geometry);
            }
        }
        Ok(ids)
    }

    async fn update_symbol(&self, id: &str, options: &SymbolOptions) -> Result<(), ChannelError> {
        self.record("update_symbol", id)?;
        if let Some(geometry) = options.geometry {
            self.symbol_geometries.lock().unwrap().insert(id.to_owned(), geometry);
        }
        Ok(())
    }

    async fn remove_symbol(&self, id: &str) -> Result<(), ChannelError> {
        self.record("remove_symbol", id)?;
        self.symbol_geometries.lock().unwrap().remove(id);
        Ok(())
    }

    async fn symbol_geometry(&self, id: &str) -> Result<LngLat, ChannelError> {
        self.record("symbol_geometry", id)?;
        self.symbol_geometries
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .ok_or(ChannelError::Call {
                method: "symbol_geometry",
                message: "unknown id".to_owned(),
            })
    }

    async fn create_lines(&self, options: &[LineOptions]) -> Result<Vec<String>, ChannelError> {
        self.record("create_lines", options.len().to_string())?;
        let ids = self.next_ids(options.len());
        let mut geometries = self.line_geometries.lock().unwrap();
        for (id, opts) in ids.iter().zip(options) {
            if let Some(geometry) = &opts.geometry {
                geometries.insert(id.clone(), geometry.clone());
            }
        }
        Ok(ids)
    }

    async fn update_line(&self, id: &str, options: &LineOptions) -> Result<(), ChannelError> {
        self.record("update_line", id)?;
        if let Some(geometry) = &options.geometry {
            self.line_geometries.lock().unwrap().insert(id.to_owned(), geometry.clone());
        }
        Ok(())
    }

    async fn remove_line(&self, id: &str) -> Result<(), ChannelError> {
        self.record("remove_line", id)?;
        self.line_geometries.lock().unwrap().remove(id);
        Ok(())
    }

    async fn line_geometry(&self, id: &str) -> Result<Vec<LngLat>, ChannelError> {
        self.record("line_geometry", id)?;
        self.line_geometries
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(ChannelError::Call {
                method: "line_geometry",
                message: "unknown id".to_owned(),
            })
    }

    async fn create_circles(&self, options: &[CircleOptions]) -> Result<Vec<String>, ChannelError> {
        self.record("create_circles", options.len().to_string())?;
        let ids = self.next_ids(options.len());
        let mut geometries = self.circle_geometries.lock().unwrap();
        for (id, opts) in ids.iter().zip(options) {
            if let Some(geometry) = opts.geometry {
                geometries.insert(id.clone(), geometry);
            }
        }
        Ok(ids)
    }

    async fn update_circle(&self, id: &str, options: &CircleOptions) -> Result<(), ChannelError> {
        self.record("update_circle", id)?;
        if let Some(geometry) = options.geometry {
            self.circle_geometries.lock().unwrap().insert(id.to_owned(), geometry);
        }
        Ok(())
    }

    async fn remove_circle(&self, id: &str) -> Result<(), ChannelError> {
        self.record("remove_circle", id)?;
        self.circle_geometries.lock().unwrap().remove(id);
        Ok(())
    }

    async fn circle_geometry(&self, id: &str) -> Result<LngLat, ChannelError> {
        self.record("circle_geometry", id)?;
        self.circle_geometries
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .ok_or(ChannelError::Call {
                method: "circle_geometry",
                message: "unknown id".to_owned(),
            })
    }

    async fn create_fills(&self, options: &[FillOptions]) -> Result<Vec<String>, ChannelError> {
        self.record("create_fills", options.len().to_string())?;
        let ids = self.next_ids(options.len());
        let mut geometries = self.fill_geometries.lock().unwrap();
        for (id, opts) in ids.iter().zip(options) {
            if let Some(geometry) = &opts.geometry {
                geometries.insert(id.clone(), geometry.clone());
            }
        }
        Ok(ids)
    }

    async fn update_fill(&self, id: &str, options: &FillOptions) -> Result<(), ChannelError> {
        self.record("update_fill", id)?;
        if let Some(geometry) = &options.geometry {
            self.fill_geometries.lock().unwrap().insert(id.to_owned(), geometry.clone());
        }
        Ok(())
    }

    async fn remove_fill(&self, id: &str) -> Result<(), ChannelError> {
        self.record("remove_fill", id)?;
        self.fill_geometries.lock().unwrap().remove(id);
        Ok(())
    }

    async fn fill_geometry(&self, id: &str) -> Result<Vec<Vec<LngLat>>, ChannelError> {
        self.record("fill_geometry", id)?;
        self.fill_geometries
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(ChannelError::Call {
                method: "fill_geometry",
                message: "unknown id".to_owned(),
            })
    }

    async fn move_camera(&self, update: &CameraUpdate) -> Result<bool, ChannelError> {
        self.record("move_camera", format!("{update:?}"))?;
        Ok(true)
    }

    async fn animate_camera(
        &self,
        update: &CameraUpdate,
        duration: Option<Duration>,
    ) -> Result<bool, ChannelError> {
        self.record("animate_camera", format!("{update:?} {duration:?}"))?;
        Ok(true)
    }

    async fn update_content_insets(
        &self,
        insets: &EdgeInsets,
        animated: bool,
    ) -> Result<(), ChannelError> {
        self.record("update_content_insets", format!("{insets:?} animated={animated}"))
    }

    async fn set_tracking_mode(&self, mode: LocationTrackingMode) -> Result<(), ChannelError> {
        self.record("set_tracking_mode", format!("{mode:?}"))
    }

    async fn set_map_language(&self, language: &str) -> Result<(), ChannelError> {
        self.record("set_map_language", language)
    }

    async fn visible_region(&self) -> Result<VisibleRegion, ChannelError> {
        self.record("visible_region", "")?;
        Ok(VisibleRegion {
            far_left: LngLat::new(0.0, 10.0),
            far_right: LngLat::new(10.0, 10.0),
            near_left: LngLat::new(0.0, 0.0),
            near_right: LngLat::new(10.0, 0.0),
        })
    }

    async fn my_location(&self) -> Result<Option<LngLat>, ChannelError> {
        self.record("my_location", "")?;
        Ok(*self.my_location.lock().unwrap())
    }

    async fn add_image(&self, name: &str, bytes: &[u8], sdf: bool) -> Result<(), ChannelError> {
        self.record("add_image", format!("{name} {} bytes sdf={sdf}", bytes.len()))
    }

    async fn add_image_source(
        &self,
        id: &str,
        bytes: &[u8],
        _corners: &[LngLat; 4],
    ) -> Result<(), ChannelError> {
        self.record("add_image_source", format!("{id} {} bytes", bytes.len()))
    }

    async fn update_image_source(
        &self,
        id: &str,
        bytes: Option<&[u8]>,
        corners: Option<&[LngLat; 4]>,
    ) -> Result<(), ChannelError> {
        self.record(
            "update_image_source",
            format!("{id} bytes={} corners={}", bytes.is_some(), corners.is_some()),
        )
    }

    async fn add_layer(&self, layer: &LayerDefinition) -> Result<(), ChannelError> {
        self.record("add_layer", layer.id.clone())
    }

    async fn remove_layer(&self, id: &str) -> Result<(), ChannelError> {
        self.record("remove_layer", id)
    }

    async fn add_geojson_source(&self, id: &str, _data: &Value) -> Result<(), ChannelError> {
        self.record("add_geojson_source", id)
    }

    async fn set_geojson_source(&self, id: &str, _data: &Value) -> Result<(), ChannelError> {
        self.record("set_geojson_source", id)
    }

    async fn remove_source(&self, id: &str) -> Result<(), ChannelError> {
        self.record("remove_source", id)
    }

    async fn query_rendered_features(
        &self,
        point: ScreenPoint,
        layers: &[String],
    ) -> Result<Vec<Value>, ChannelError> {
        self.record(
            "query_rendered_features",
            format!("({}, {}) layers={}", point.x, point.y, layers.join(",")),
        )?;
        Ok(self.features.lock().unwrap().clone())
    }

    async fn to_screen_locations(
        &self,
        coordinates: &[LngLat],
    ) -> Result<Vec<ScreenPoint>, ChannelError> {
        self.record("to_screen_locations", coordinates.len().to_string())?;
        Ok(coordinates
            .iter()
            .map(|c| ScreenPoint {
                x: c.lng * 100.0,
                y: c.lat * 100.0,
            })
            .collect())
    }

    async fn to_lng_lat(&self, point: ScreenPoint) -> Result<LngLat, ChannelError> {
        self.record("to_lng_lat", format!("({}, {})", point.x, point.y))?;
        Ok(LngLat::new(point.x / 100.0, point.y / 100.0))
    }
}

// =============================================================================
// SCRIPTED GEOCODER
// =============================================================================

/// [`ReverseGeocode`] double fed from per-method queues. Each call pops the
/// front of its queue; an empty queue yields the "nothing found" default.
#[derive(Default)]
pub(crate) struct StaticGeocoder {
    features: Mutex<Vec<Result<Option<Place>, GeocodeError>>>,
    localities: Mutex<Vec<Result<Option<Place>, GeocodeError>>>,
    tags: Mutex<Vec<Result<HashMap<String, String>, GeocodeError>>>,
    feature_requests: Mutex<Vec<LngLat>>,
    locality_requests: Mutex<Vec<LngLat>>,
    tag_requests: Mutex<Vec<i64>>,
}

impl StaticGeocoder {
    pub(crate) fn push_feature(&self, result: Result<Option<Place>, GeocodeError>) {
        self.features.lock().unwrap().push(result);
    }

    pub(crate) fn push_locality(&self, result: Result<Option<Place>, GeocodeError>) {
        self.localities.lock().unwrap().push(result);
    }

    pub(crate) fn push_tags(&self, result: Result<HashMap<String, String>, GeocodeError>) {
        self.tags.lock().unwrap().push(result);
    }

    pub(crate) fn feature_requests(&self) -> Vec<LngLat> {
        self.feature_requests.lock().unwrap().clone()
    }

    pub(crate) fn locality_requests(&self) -> Vec<LngLat> {
        self.locality_requests.lock().unwrap().clone()
    }

    pub(crate) fn tag_requests(&self) -> Vec<i64> {
        self.tag_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReverseGeocode for StaticGeocoder {
    async fn reverse_feature(&self, coordinate: LngLat) -> Result<Option<Place>, GeocodeError> {
        self.feature_requests.lock().unwrap().push(coordinate);
        let mut queue = self.features.lock().unwrap();
        if queue.is_empty() {
            return Ok(None);
        }
        queue.remove(0)
    }

    async fn reverse_locality(&self, coordinate: LngLat) -> Result<Option<Place>, GeocodeError> {
        self.locality_requests.lock().unwrap().push(coordinate);
        let mut queue = self.localities.lock().unwrap();
        if queue.is_empty() {
            return Ok(None);
        }
        queue.remove(0)
    }

    async fn extended_tags(&self, place_id: i64) -> Result<HashMap<String, String>, GeocodeError> {
        self.tag_requests.lock().unwrap().push(place_id);
        let mut queue = self.tags.lock().unwrap();
        if queue.is_empty() {
            return Ok(HashMap::new());
        }
        queue.remove(0)
    }
}

// =============================================================================
// CONNECTIVITY
// =============================================================================

/// Connectivity gate pinned to a single answer.
pub(crate) struct FixedConnectivity(pub(crate) bool);

impl Connectivity for FixedConnectivity {
    fn is_online(&self) -> bool {
        self.0
    }
}
