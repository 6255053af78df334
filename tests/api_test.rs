//! End-to-end tests for the HTTP API
//!
//! Every scenario runs against both backends so the link strategies are
//! held to the same observable behaviour.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use tempfile::TempDir;
use tower::ServiceExt;

use hbnb::api;
use hbnb::storage::{DbStorage, FileStorage, Storage};

// =============================================================================
// Harness
// =============================================================================

enum Backing {
    File(PathBuf),
    Db(PathBuf),
}

struct TestApp {
    router: Router,
    backing: Backing,
    _dir: TempDir,
}

impl TestApp {
    async fn file() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        let storage = FileStorage::open(&path).await.unwrap();
        Self {
            router: api::router(Storage::file(storage)),
            backing: Backing::File(path),
            _dir: dir,
        }
    }

    async fn db() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hbnb.sqlite3");
        let storage = DbStorage::open(&path).await.unwrap();
        Self {
            router: api::router(Storage::db(storage)),
            backing: Backing::Db(path),
            _dir: dir,
        }
    }

    async fn both() -> [Self; 2] {
        [Self::file().await, Self::db().await]
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_amenity(&self, name: &str) -> String {
        let (status, body) = self
            .send(Method::POST, "/api/v1/amenities", Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_place(&self, name: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/places",
                Some(json!({ "city_id": "c1", "user_id": "u1", "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }
}

/// Observes the backing store so a test can tell whether a request wrote.
enum WriteWatch {
    File {
        path: PathBuf,
        bytes: Vec<u8>,
    },
    Db {
        conn: SqliteConnection,
        version: i64,
        links: i64,
    },
}

impl WriteWatch {
    async fn start(app: &TestApp) -> Self {
        match &app.backing {
            Backing::File(path) => Self::File {
                path: path.clone(),
                bytes: std::fs::read(path).unwrap(),
            },
            Backing::Db(path) => {
                let options = SqliteConnectOptions::new().filename(path);
                let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
                let (version, links) = Self::db_state(&mut conn).await;
                Self::Db {
                    conn,
                    version,
                    links,
                }
            }
        }
    }

    // data_version moves whenever another connection commits
    async fn db_state(conn: &mut SqliteConnection) -> (i64, i64) {
        let version: i64 = sqlx::query_scalar("PRAGMA data_version")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM place_amenity")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        (version, links)
    }

    async fn assert_unchanged(self) {
        match self {
            Self::File { path, bytes } => {
                assert_eq!(std::fs::read(&path).unwrap(), bytes);
            }
            Self::Db {
                mut conn,
                version,
                links,
            } => {
                assert_eq!(Self::db_state(&mut conn).await, (version, links));
            }
        }
    }
}

fn ids(body: &Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap().to_string())
        .collect()
}

// =============================================================================
// Place amenities
// =============================================================================

#[tokio::test]
async fn test_link_lifecycle() {
    for app in TestApp::both().await {
        let place = app.create_place("Loft").await;
        let wifi = app.create_amenity("Wifi").await;
        let link = format!("/api/v1/places/{place}/amenities/{wifi}");
        let list = format!("/api/v1/places/{place}/amenities");
        let place_uri = format!("/api/v1/places/{place}");
        let wifi_uri = format!("/api/v1/amenities/{wifi}");
        let (_, place_before) = app.send(Method::GET, &place_uri, None).await;
        let (_, wifi_before) = app.send(Method::GET, &wifi_uri, None).await;

        let (status, body) = app.send(Method::POST, &link, None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], wifi.as_str());
        assert_eq!(body["name"], "Wifi");
        assert_eq!(body["__class__"], "Amenity");

        let watch = WriteWatch::start(&app).await;
        let (status, body) = app.send(Method::POST, &link, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, wifi_before);
        watch.assert_unchanged().await;

        let (status, body) = app.send(Method::GET, &list, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![wifi.clone()]);

        let (status, body) = app.send(Method::DELETE, &link, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, body) = app.send(Method::DELETE, &link, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));

        let (_, body) = app.send(Method::GET, &list, None).await;
        assert_eq!(body, json!([]));

        let (_, place_after) = app.send(Method::GET, &place_uri, None).await;
        let (_, wifi_after) = app.send(Method::GET, &wifi_uri, None).await;
        assert_eq!(place_after, place_before);
        assert_eq!(wifi_after, wifi_before);
    }
}

#[tokio::test]
async fn test_empty_place_id_is_404() {
    for app in TestApp::both().await {
        let wifi = app.create_amenity("Wifi").await;

        let (status, body) = app.send(Method::GET, "/api/v1/places//amenities", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));

        for method in [Method::POST, Method::DELETE] {
            let (status, body) = app
                .send(method, &format!("/api/v1/places//amenities/{wifi}"), None)
                .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "error": "Not found" }));
        }
    }
}

#[tokio::test]
async fn test_link_order_is_insertion_order() {
    for app in TestApp::both().await {
        let place = app.create_place("Loft").await;
        let pool = app.create_amenity("Pool").await;
        let wifi = app.create_amenity("Wifi").await;

        for amenity in [&wifi, &pool] {
            let uri = format!("/api/v1/places/{place}/amenities/{amenity}");
            let (status, _) = app.send(Method::POST, &uri, None).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = app
            .send(Method::GET, &format!("/api/v1/places/{place}/amenities"), None)
            .await;
        assert_eq!(ids(&body), vec![wifi, pool]);
    }
}

#[tokio::test]
async fn test_missing_place_is_404_before_amenity_check() {
    for app in TestApp::both().await {
        let wifi = app.create_amenity("Wifi").await;

        for method in [Method::POST, Method::DELETE] {
            let (status, body) = app
                .send(method, &format!("/api/v1/places/nope/amenities/{wifi}"), None)
                .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "error": "Not found" }));
        }

        let (status, _) = app
            .send(Method::GET, "/api/v1/places/nope/amenities", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_missing_amenity_is_404() {
    for app in TestApp::both().await {
        let place = app.create_place("Loft").await;
        let uri = format!("/api/v1/places/{place}/amenities/nope");

        let (status, _) = app.send(Method::POST, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_empty_list() {
    for app in TestApp::both().await {
        let place = app.create_place("Loft").await;
        let (status, body) = app
            .send(Method::GET, &format!("/api/v1/places/{place}/amenities"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}

#[tokio::test]
async fn test_deleting_amenity_drops_link() {
    for app in TestApp::both().await {
        let place = app.create_place("Loft").await;
        let wifi = app.create_amenity("Wifi").await;
        let pool = app.create_amenity("Pool").await;
        for amenity in [&wifi, &pool] {
            let uri = format!("/api/v1/places/{place}/amenities/{amenity}");
            app.send(Method::POST, &uri, None).await;
        }

        let (status, _) = app
            .send(Method::DELETE, &format!("/api/v1/amenities/{wifi}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .send(Method::GET, &format!("/api/v1/places/{place}/amenities"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ids(&body), vec![pool]);
    }
}

// =============================================================================
// Amenities
// =============================================================================

#[tokio::test]
async fn test_amenity_crud() {
    for app in TestApp::both().await {
        let wifi = app.create_amenity("Wifi").await;
        let uri = format!("/api/v1/amenities/{wifi}");

        let (status, body) = app.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Wifi");
        let created_at = body["created_at"].clone();

        let (status, body) = app
            .send(Method::PUT, &uri, Some(json!({ "name": "Fast wifi", "id": "x" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Fast wifi");
        assert_eq!(body["id"], wifi.as_str());
        assert_eq!(body["created_at"], created_at);

        let (_, body) = app.send(Method::GET, "/api/v1/amenities", None).await;
        assert_eq!(ids(&body), vec![wifi.clone()]);

        let (status, body) = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, _) = app.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_amenity_bad_requests() {
    let app = TestApp::file().await;

    let (status, body) = app
        .send(Method::POST, "/api/v1/amenities", Some(json!({ "label": "Wifi" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing name" }));

    let (status, body) = app
        .send(Method::POST, "/api/v1/amenities", Some(json!([1, 2])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Not a JSON" }));

    let (status, _) = app
        .send(Method::POST, "/api/v1/amenities", Some(json!({ "name": 7 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Places
// =============================================================================

#[tokio::test]
async fn test_place_crud() {
    for app in TestApp::both().await {
        let place = app.create_place("Loft").await;
        let uri = format!("/api/v1/places/{place}");

        let (status, body) = app
            .send(
                Method::PUT,
                &uri,
                Some(json!({ "number_rooms": 3, "latitude": 48.85, "user_id": "other" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["number_rooms"], 3);
        assert_eq!(body["latitude"], 48.85);
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["__class__"], "Place");

        let (status, body) = app.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["number_rooms"], 3);

        let (status, _) = app.send(Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_place_create_requires_owners_and_name() {
    let app = TestApp::file().await;

    for (body, message) in [
        (json!({ "user_id": "u1", "name": "Loft" }), "Missing city_id"),
        (json!({ "city_id": "c1", "name": "Loft" }), "Missing user_id"),
        (json!({ "city_id": "c1", "user_id": "u1" }), "Missing name"),
    ] {
        let (status, body) = app.send(Method::POST, "/api/v1/places", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": message }));
    }

    let (status, _) = app
        .send(
            Method::PUT,
            "/api/v1/places/nope",
            Some(json!({ "name": "Loft" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Index
// =============================================================================

#[tokio::test]
async fn test_status_and_stats() {
    for app in TestApp::both().await {
        let (status, body) = app.send(Method::GET, "/api/v1/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "OK" }));

        app.create_place("Loft").await;
        app.create_amenity("Wifi").await;
        app.create_amenity("Pool").await;

        let (status, body) = app.send(Method::GET, "/api/v1/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "amenities": 2, "places": 1 }));
    }
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = TestApp::file().await;
    let (status, body) = app.send(Method::GET, "/api/v1/nowhere", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = TestApp::file().await;
    let request = Request::builder()
        .uri("/api/v1/status")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
