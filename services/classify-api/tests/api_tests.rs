//! Router tests for the classification service, driven through
//! `tower::ServiceExt::oneshot` with an in-memory layer source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use classify_api::handlers::classify::classify_layer;
use classify_api::request::ClassifyRequest;
use classify_api::routes::build_router;
use classify_api::state::AppState;
use geoserver_client::{Feature, FeatureCollection, GeoServerError, GeoServerResult, LayerSource};

/// Serves one fixed collection and counts fetches.
struct FakeLayers {
    collection: FeatureCollection,
    calls: AtomicUsize,
}

#[async_trait]
impl LayerSource for FakeLayers {
    async fn fetch_layer(
        &self,
        _workspace: &str,
        layer: &str,
    ) -> GeoServerResult<FeatureCollection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if layer == "missing" {
            return Err(GeoServerError::UnexpectedStatus {
                status: 404,
                body: "Feature type not found".to_string(),
            });
        }
        Ok(self.collection.clone())
    }
}

/// Parcels with a numeric `value`, a text `name` and optionally a null row.
fn parcels(values: &[Option<f64>]) -> FeatureCollection {
    let features = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let mut props = Map::new();
            props.insert("name".to_string(), json!(format!("parcel {i}")));
            props.insert("value".to_string(), v.map(Value::from).unwrap_or(Value::Null));
            Feature::new(Some(json!({"type": "Point", "coordinates": [i, 0]})), props)
                .with_id(format!("parcels.{i}"))
        })
        .collect();
    FeatureCollection::new(features)
}

fn one_to_nine() -> FeatureCollection {
    parcels(&(1..=9).map(|v| Some(f64::from(v))).collect::<Vec<_>>())
}

fn setup(collection: FeatureCollection, legacy: bool) -> (Router, Arc<FakeLayers>) {
    let layers = Arc::new(FakeLayers {
        collection,
        calls: AtomicUsize::new(0),
    });
    let state = AppState::new(layers.clone()).with_legacy_error_status(legacy);
    let handle = PrometheusBuilder::new().build_recorder().handle();
    (build_router(Arc::new(state), handle), layers)
}

async fn post_classify(router: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/classify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn colors(n: usize) -> Vec<String> {
    ["#ffffcc", "#c2e699", "#78c679", "#31a354", "#006837", "#004529"]
        .iter()
        .take(n)
        .map(|c| c.to_string())
        .collect()
}

fn assert_close(actual: &Value, expected: f64) {
    let actual = actual.as_f64().unwrap();
    assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

// ============================================================================
// Successful classification
// ============================================================================

#[tokio::test]
async fn test_equal_interval_on_one_to_nine() {
    let (router, layers) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "K_classes": 3,
            "method": "EqualInterval",
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(layers.calls.load(Ordering::SeqCst), 1);
    assert_eq!(body["type"], "FeatureCollection");

    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 9);
    let classes: Vec<u64> = features
        .iter()
        .map(|f| f["properties"]["class"].as_u64().unwrap())
        .collect();
    assert_eq!(classes, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);

    let table = body["classes"].as_array().unwrap();
    assert_eq!(table.len(), 3);
    let width = 8.0 / 3.0;
    for (i, class) in table.iter().enumerate() {
        assert_eq!(class["count"], 3);
        assert_close(&class["range"][0], 1.0 + width * i as f64);
        assert_close(&class["range"][1], 1.0 + width * (i + 1) as f64);
    }
    assert_eq!(table[0]["label"], "[1.00, 3.67]");
}

#[tokio::test]
async fn test_feature_colors_follow_class() {
    let (router, _) = setup(one_to_nine(), false);
    let palette = colors(4);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "K_classes": 4,
            "method": "Quantiles",
            "color": palette
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let mut total = 0;
    for feature in body["features"].as_array().unwrap() {
        let class = feature["properties"]["class"].as_u64().unwrap() as usize;
        assert_eq!(feature["properties"]["color"], palette[class].as_str());
        total += 1;
    }
    let counts: u64 = body["classes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["count"].as_u64().unwrap())
        .sum();
    assert_eq!(counts, total);
}

#[tokio::test]
async fn test_percentiles_with_matching_colors() {
    let (router, _) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "method": "Percentiles",
            "bins": [25, 50, 75, 100],
            "color": colors(4)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classes"].as_array().unwrap().len(), 4);
    assert_close(&body["classes"][3]["range"][1], 9.0);
}

#[tokio::test]
async fn test_null_values_are_skipped() {
    let collection = parcels(&[Some(4.0), None, Some(1.0), Some(10.0), None]);
    let (router, _) = setup(collection, false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "method": "UserDefined",
            "bins": [5, 10],
            "color": colors(2)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["parcels.0", "parcels.2", "parcels.3"]);
    assert_eq!(body["features"][0]["geometry"]["coordinates"], json!([0, 0]));
    assert_eq!(body["classes"][0]["count"], 2);
    assert_eq!(body["classes"][1]["count"], 1);
}

#[tokio::test]
async fn test_classify_layer_without_router() {
    let layers = Arc::new(FakeLayers {
        collection: one_to_nine(),
        calls: AtomicUsize::new(0),
    });
    let state = AppState::new(layers.clone());
    let request: ClassifyRequest = serde_json::from_value(json!({
        "layername": "parcels",
        "workspace": "cadastre",
        "column": "value",
        "K_classes": 3,
        "method": "MaxP",
        "color": colors(3)
    }))
    .unwrap();

    let collection = tokio_test::assert_ok!(classify_layer(&state, request).await);
    let counts: Vec<usize> = collection.classes.iter().map(|c| c.count).collect();
    assert_eq!(counts.len(), 3);
    assert_eq!(counts.iter().sum::<usize>(), 9);
    assert!(counts.iter().all(|c| *c > 0));
    assert_eq!(layers.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_classify_layer_rejects_before_fetch() {
    let layers = Arc::new(FakeLayers {
        collection: one_to_nine(),
        calls: AtomicUsize::new(0),
    });
    let state = AppState::new(layers.clone());
    let request: ClassifyRequest = serde_json::from_value(json!({
        "layername": "parcels",
        "workspace": "cadastre",
        "column": "value",
        "method": "PrettyBreaks",
        "color": colors(3)
    }))
    .unwrap();

    tokio_test::assert_err!(classify_layer(&state, request).await);
    assert_eq!(layers.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Validation happens before the fetch
// ============================================================================

#[tokio::test]
async fn test_percentiles_color_mismatch_skips_fetch() {
    let (router, layers) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "method": "Percentiles",
            "bins": [25, 50, 75, 100],
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "color layers must equal number of classes"}));
    assert_eq!(layers.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_k_color_mismatch_skips_fetch() {
    let (router, layers) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "K_classes": 5,
            "method": "NaturalBreaks",
            "color": colors(4)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "color layers must equal number of classes");
    assert_eq!(layers.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_method() {
    let (router, layers) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "K_classes": 3,
            "method": "Jenks",
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "unknown method, please provide a valid mapclassify method."})
    );
    assert_eq!(layers.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_k_classes() {
    let (router, layers) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "method": "MaximumBreaks",
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MaximumBreaks requires K_classes");
    assert_eq!(layers.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_malformed_body() {
    let (router, layers) = setup(one_to_nine(), false);
    let request = Request::builder()
        .method("POST")
        .uri("/classify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"layername\": "))
        .unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(layers.calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Failures after the fetch
// ============================================================================

#[tokio::test]
async fn test_text_column_is_rejected() {
    let (router, _) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "name",
            "K_classes": 3,
            "method": "EqualInterval",
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "column must be numeric"}));
}

#[tokio::test]
async fn test_unknown_column() {
    let (router, _) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "area",
            "method": "BoxPlot",
            "color": colors(6)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "column 'area' not found in layer");
}

#[tokio::test]
async fn test_upstream_failure() {
    let (router, _) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "missing",
            "workspace": "cadastre",
            "column": "value",
            "K_classes": 3,
            "method": "EqualInterval",
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_classification_failure() {
    let collection = parcels(&[Some(1.0), Some(1.0), Some(2.0), Some(2.0)]);
    let (router, _) = setup(collection, false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "K_classes": 3,
            "method": "FisherJenks",
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("error classifying data: "));
}

#[tokio::test]
async fn test_too_few_colors_for_data_driven_classes() {
    let (router, _) = setup(one_to_nine(), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "method": "UserDefined",
            "bins": [3, 6],
            "color": colors(2)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("cannot prepare data: "));
}

#[tokio::test]
async fn test_legacy_error_status() {
    let (router, _) = setup(one_to_nine(), true);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "name",
            "K_classes": 3,
            "method": "EqualInterval",
            "color": colors(3)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "column must be numeric"}));
}

#[tokio::test]
async fn test_all_null_column_is_not_numeric() {
    let (router, _) = setup(parcels(&[None, None, None]), false);
    let (status, body) = post_classify(
        router,
        json!({
            "layername": "parcels",
            "workspace": "cadastre",
            "column": "value",
            "K_classes": 2,
            "method": "Quantiles",
            "color": colors(2)
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "column must be numeric"}));
}

// ============================================================================
// Columns, health and metrics
// ============================================================================

#[tokio::test]
async fn test_get_columns() {
    let (router, layers) = setup(one_to_nine(), false);
    let request = Request::builder()
        .uri("/get_columns?workspace=cadastre&layername=parcels")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["name", "value", "geometry"]));
    assert_eq!(layers.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_columns_requires_parameters() {
    let (router, layers) = setup(one_to_nine(), false);
    let request = Request::builder()
        .uri("/get_columns?workspace=cadastre")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(layers.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health() {
    let (router, _) = setup(one_to_nine(), false);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (router, _) = setup(one_to_nine(), false);
    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}
