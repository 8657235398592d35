//! End-to-end scenarios against the full router, driven with
//! `tower::ServiceExt::oneshot` instead of binding a real listener.
//!
//! All of these need a reachable PostGIS database to build `AppState`
//! (the pool connects eagerly), so they're ignored by default and meant
//! to run against a provisioned test database.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use meridian_server::{init_server, ServerConfig};
use tower::ServiceExt;

async fn test_app() -> axum::Router {
    init_server(ServerConfig::default()).await.expect("app state requires a reachable database")
}

#[tokio::test]
#[ignore = "requires a reachable PostGIS database"]
async fn s1_empty_forest_tile_is_cached_across_repeat_requests() {
    let app = test_app().await;

    let first = app
        .clone()
        .oneshot(Request::builder().uri("/tiles/foret/10/512/512").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    let second = app
        .oneshot(Request::builder().uri("/tiles/foret/10/512/512").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires a reachable PostGIS database"]
async fn s2_admin_layer_allow_list_is_enforced() {
    let app = test_app().await;

    let rejected = app
        .clone()
        .oneshot(Request::builder().uri("/tiles/admin/foo/5/10/10").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

    let accepted = app
        .oneshot(Request::builder().uri("/tiles/admin/regions/5/10/10").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(accepted.status() == StatusCode::OK || accepted.status() == StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires a reachable PostGIS database"]
async fn s3_cadastre_tile_requires_identity() {
    let app = test_app().await;

    let anonymous = app
        .clone()
        .oneshot(Request::builder().uri("/tiles/cadastre/16/33000/22000").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let authenticated = app
        .oneshot(
            Request::builder()
                .uri("/tiles/cadastre/16/33000/22000")
                .header("Authorization", "Bearer test-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(authenticated.status() == StatusCode::OK || authenticated.status() == StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "requires a reachable PostGIS database"]
async fn s4_polygon_analysis_groups_by_canonical_code() {
    let app = test_app().await;

    let body = serde_json::json!({
        "operation": "analyzePolygon",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]]
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a reachable PostGIS database"]
async fn s5_lidar_analysis_reports_out_of_bounds_without_fetching() {
    let app = test_app().await;

    let body = serde_json::json!({
        "operation": "analyzeLidar",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 5.0], [5.0, 5.0], [5.0, 0.0], [0.0, 0.0]]]
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a reachable PostGIS database and a reachable WFS index"]
async fn s6_lidar_happy_path_returns_a_retrievable_chm_image() {
    let app = test_app().await;

    let body = serde_json::json!({
        "operation": "analyzeLidar",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.0, 0.5], [0.5, 0.5], [0.5, 0.0], [0.0, 0.0]]]
        }
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/graphql")
                .header("Authorization", "Bearer test-token")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a reachable PostGIS database"]
async fn healthz_reports_database_status() {
    let app = test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
