#![allow(clippy::float_cmp)]

use super::*;
use crate::camera::CameraUpdate;
use crate::channel::LayerKind;
use crate::test_support::{test_controller, RecordingChannel};
use serde_json::json;

// --- construction ---

#[test]
fn new_controller_mirrors_nothing() {
    let controller = test_controller(RecordingChannel::new());
    assert!(controller.camera_position().is_none());
    assert_eq!(controller.camera_motion(), CameraMotion::Idle);
    assert!(!controller.is_camera_moving());
    assert_eq!(controller.tracking_mode(), LocationTrackingMode::None);
    assert!(controller.last_user_location().is_none());
    assert!(controller.symbols().is_empty());
    assert!(controller.lines().is_empty());
    assert!(controller.circles().is_empty());
    assert!(controller.fills().is_empty());
}

// --- listeners ---

#[test]
fn listener_registration_round_trip() {
    let mut controller = test_controller(RecordingChannel::new());
    let id = controller.add_listener(|| {});
    assert!(controller.remove_listener(id));
    assert!(!controller.remove_listener(id));
}

// --- camera passthroughs ---

#[tokio::test]
async fn move_camera_forwards_update() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    let accepted = controller.move_camera(CameraUpdate::ZoomIn).await.unwrap();
    assert!(accepted);
    let calls = channel.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "move_camera");
    assert!(calls[0].1.contains("ZoomIn"));
}

#[tokio::test]
async fn move_camera_does_not_touch_mirrored_position() {
    let channel = RecordingChannel::new();
    let mut controller = test_controller(Arc::clone(&channel));

    controller
        .move_camera(CameraUpdate::center_zoom(LngLat::new(13.4, 52.5), 12.0))
        .await
        .unwrap();
    assert!(controller.camera_position().is_none());

    // The mirror updates only when the renderer reports back.
    controller
        .handle_event(crate::events::RendererEvent::CameraMoved {
            position: CameraPosition {
                target: LngLat::new(13.4, 52.5),
                zoom: 12.0,
                bearing: 0.0,
                tilt: 0.0,
            },
        })
        .await;
    assert_eq!(controller.camera_position().unwrap().zoom, 12.0);
}

#[tokio::test]
async fn animate_camera_forwards_duration() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    controller
        .animate_camera(CameraUpdate::ZoomOut, Some(Duration::from_millis(300)))
        .await
        .unwrap();
    let calls = channel.calls();
    assert_eq!(calls[0].0, "animate_camera");
    assert!(calls[0].1.contains("300ms"));
}

#[tokio::test]
async fn content_insets_forward_animated_flag() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    controller
        .update_content_insets(EdgeInsets::all(16.0), true)
        .await
        .unwrap();
    let calls = channel.calls();
    assert_eq!(calls[0].0, "update_content_insets");
    assert!(calls[0].1.contains("animated=true"));
}

#[tokio::test]
async fn set_tracking_mode_is_forward_only() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    controller
        .set_tracking_mode(LocationTrackingMode::Tracking)
        .await
        .unwrap();
    // The mirrored mode is event-driven and must not change here.
    assert_eq!(controller.tracking_mode(), LocationTrackingMode::None);
    assert_eq!(channel.method_names(), vec!["set_tracking_mode"]);
}

#[tokio::test]
async fn set_map_language_forwards_language() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    controller.set_map_language("de").await.unwrap();
    assert_eq!(channel.calls()[0], ("set_map_language".to_owned(), "de".to_owned()));
}

#[tokio::test]
async fn visible_region_comes_from_renderer() {
    let channel = RecordingChannel::new();
    let controller = test_controller(channel);

    let region = controller.visible_region().await.unwrap();
    let bounds = region.bounds();
    assert_eq!(bounds.southwest, LngLat::new(0.0, 0.0));
    assert_eq!(bounds.northeast, LngLat::new(10.0, 10.0));
}

#[tokio::test]
async fn my_location_passes_through() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    assert!(controller.my_location().await.unwrap().is_none());
    channel.set_my_location(Some(LngLat::new(13.4, 52.5)));
    assert_eq!(
        controller.my_location().await.unwrap(),
        Some(LngLat::new(13.4, 52.5))
    );
}

#[tokio::test]
async fn channel_failure_propagates_as_controller_error() {
    let channel = RecordingChannel::new();
    channel.fail_on("move_camera");
    let controller = test_controller(channel);

    let result = controller.move_camera(CameraUpdate::ZoomIn).await;
    assert!(matches!(result, Err(ControllerError::Channel(_))));
}

// --- style passthroughs ---

#[tokio::test]
async fn style_operations_forward_in_order() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    controller.add_image("marker", &[1, 2, 3], false).await.unwrap();
    let layer = LayerDefinition {
        id: "poi-circles".to_owned(),
        source: "pois".to_owned(),
        kind: LayerKind::Circle,
        layout: json!({}),
        paint: json!({ "circle-color": "#ff0000" }),
        filter: None,
        below: None,
    };
    controller.add_geojson_source("pois", &json!({ "type": "FeatureCollection", "features": [] }))
        .await
        .unwrap();
    controller.add_layer(&layer).await.unwrap();
    controller
        .set_geojson_source("pois", &json!({ "type": "FeatureCollection", "features": [] }))
        .await
        .unwrap();
    controller.remove_layer("poi-circles").await.unwrap();
    controller.remove_source("pois").await.unwrap();

    assert_eq!(
        channel.method_names(),
        vec![
            "add_image",
            "add_geojson_source",
            "add_layer",
            "set_geojson_source",
            "remove_layer",
            "remove_source",
        ]
    );
}

#[tokio::test]
async fn image_source_updates_forward_partial_parts() {
    let channel = RecordingChannel::new();
    let controller = test_controller(Arc::clone(&channel));

    let corners = [
        LngLat::new(0.0, 1.0),
        LngLat::new(1.0, 1.0),
        LngLat::new(1.0, 0.0),
        LngLat::new(0.0, 0.0),
    ];
    controller
        .add_image_source("overlay", &[0xff], &corners)
        .await
        .unwrap();
    controller
        .update_image_source("overlay", Some(&[0xaa]), None)
        .await
        .unwrap();

    let calls = channel.calls();
    assert_eq!(calls[0].0, "add_image_source");
    assert_eq!(calls[1].0, "update_image_source");
    assert!(calls[1].1.contains("bytes=true"));
    assert!(calls[1].1.contains("corners=false"));
}

// --- queries ---

#[tokio::test]
async fn query_rendered_features_returns_channel_features() {
    let channel = RecordingChannel::new();
    channel.set_features(vec![json!({ "id": "poi-7" })]);
    let controller = test_controller(Arc::clone(&channel));

    let features = controller
        .query_rendered_features(ScreenPoint::new(10.0, 20.0), &["poi-circles".to_owned()])
        .await
        .unwrap();
    assert_eq!(features, vec![json!({ "id": "poi-7" })]);
    assert!(channel.calls()[0].1.contains("poi-circles"));
}

#[tokio::test]
async fn coordinate_projection_round_trips() {
    let channel = RecordingChannel::new();
    let controller = test_controller(channel);

    let point = controller
        .to_screen_location(LngLat::new(1.5, -2.0))
        .await
        .unwrap();
    assert_eq!(point, ScreenPoint::new(150.0, -200.0));

    let coordinate = controller.to_lng_lat(point).await.unwrap();
    assert_eq!(coordinate, LngLat::new(1.5, -2.0));
}

#[tokio::test]
async fn batch_projection_preserves_order() {
    let channel = RecordingChannel::new();
    let controller = test_controller(channel);

    let points = controller
        .to_screen_locations(&[LngLat::new(1.0, 1.0), LngLat::new(2.0, 2.0)])
        .await
        .unwrap();
    assert_eq!(points, vec![ScreenPoint::new(100.0, 100.0), ScreenPoint::new(200.0, 200.0)]);
}
