//! End-to-end API tests against a live PostgreSQL instance.
//!
//! Run with a database available:
//!   DATABASE_URL=postgres://localhost/boreal_test cargo test -- --ignored
//!
//! Geolocation and notification are in-process mocks; only Postgres is real.

use std::net::SocketAddr;
use std::sync::Arc;

use uuid::Uuid;

use boreal_api::AppState;
use boreal_core::{derive_factory_token, derive_factory_token_hash, Settings};
use boreal_db::Database;
use boreal_geo::{MismatchPolicy, MockGeolocation, ResolvedIp};
use boreal_notify::MockNotifier;

const FACTORY_SECRET: &str = "integration-factory-secret";

// Registered placement used throughout: rural Nagano.
const REG_LAT: f64 = 36.2380;
const REG_LON: f64 = 137.9723;

// IP the mock resolves ~2.3 km from the placement.
const NEAR_IP: &str = "198.51.100.10";
// IP the mock resolves ~212 km away.
const FAR_IP: &str = "198.51.100.20";

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    db: Database,
    notifier: Arc<MockNotifier>,
}

async fn spawn_app() -> TestApp {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url).await.unwrap();
    db.migrate().await.unwrap();

    let geo = Arc::new(
        MockGeolocation::unavailable()
            .with_ip(
                NEAR_IP.parse().unwrap(),
                ResolvedIp {
                    region: "Nagano".to_string(),
                    lat: 36.2587,
                    lon: REG_LON,
                },
            )
            .with_ip(
                FAR_IP.parse().unwrap(),
                ResolvedIp {
                    region: "Aichi".to_string(),
                    lat: 34.3312,
                    lon: REG_LON,
                },
            ),
    );
    let notifier = Arc::new(MockNotifier::new());

    let mut settings = Settings::default();
    settings.jwt_secret = "integration-jwt-secret".to_string();
    settings.factory_secret = FACTORY_SECRET.to_string();

    let state = AppState {
        db: db.clone(),
        geo,
        notifier: notifier.clone(),
        mismatch_policy: MismatchPolicy::default(),
        settings: Arc::new(settings),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = boreal_api::app(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
        db,
        notifier,
    }
}

impl TestApp {
    async fn register_user(&self) -> (Uuid, String, String) {
        let email = format!("owner-{}@example.com", Uuid::new_v4().simple());
        let password = "hunter2hunter2";
        let resp = self
            .client
            .post(format!("{}/api/v1/auth/register", self.base_url))
            .json(&serde_json::json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: serde_json::Value = resp.json().await.unwrap();
        (
            body["user_id"].as_str().unwrap().parse().unwrap(),
            body["access_token"].as_str().unwrap().to_string(),
            password.to_string(),
        )
    }

    async fn register_device(&self, access_token: &str, device_id: &str) -> String {
        let fth = derive_factory_token_hash(&derive_factory_token(device_id, FACTORY_SECRET));
        let resp = self
            .client
            .post(format!(
                "{}/api/v1/devices/{}/register?fth={}",
                self.base_url, device_id, fth
            ))
            .bearer_auth(access_token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["api_token"].as_str().unwrap().to_string()
    }

    async fn register_location(&self, access_token: &str, device_id: &str) {
        let resp = self
            .client
            .post(format!(
                "{}/api/v1/devices/{}/location",
                self.base_url, device_id
            ))
            .bearer_auth(access_token)
            .json(&serde_json::json!({"lat": REG_LAT, "lon": REG_LON, "accuracy_m": 15.0}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["warning"].is_null());
    }
}

fn fresh_device_id() -> String {
    // devices.device_id is VARCHAR(30)
    format!("BX-{}", &Uuid::new_v4().simple().to_string()[..12])
}

#[tokio::test]
#[ignore]
async fn full_provisioning_and_ingestion_scenario() {
    let app = spawn_app().await;
    let (_user_id, access, _password) = app.register_user().await;
    let device_id = fresh_device_id();
    let api_token = app.register_device(&access, &device_id).await;
    app.register_location(&access, &device_id).await;

    // Near event: same region, ~2.3 km. No mismatch.
    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/event",
            app.base_url, device_id
        ))
        .header("x-api-token", &api_token)
        .header("x-forwarded-for", NEAR_IP)
        .json(&serde_json::json!({"detection_type": "bear", "confidence": 0.93}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["location_mismatch"], false);
    let near_event_id = body["event_id"].as_i64().unwrap();

    // Far event: ~212 km. Mismatch plus exactly one alert.
    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/event",
            app.base_url, device_id
        ))
        .header("x-api-token", &api_token)
        .header("x-forwarded-for", FAR_IP)
        .json(&serde_json::json!({"detection_type": "human", "confidence": 0.81}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["location_mismatch"], true);

    // Notification dispatch is fire-and-forget; give it a moment.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(app.notifier.detection_count(), 2);
    assert_eq!(app.notifier.mismatch_count(), 1);
    let alert = &app.notifier.mismatches()[0];
    assert!(alert.distance_km.unwrap() > 150.0);
    assert_eq!(alert.region, "Aichi");

    // Stored rows carry the amended fields.
    let near = app.db.events.get(near_event_id).await.unwrap().unwrap();
    assert!(!near.location_mismatch);
    assert!(near.distance_from_registered_km.unwrap() < 10.0);
    assert_eq!(near.ip_geolocation_region.as_deref(), Some("Nagano"));
}

#[tokio::test]
#[ignore]
async fn registration_rejects_bad_fth_and_double_bind() {
    let app = spawn_app().await;
    let (_uid, access, _pw) = app.register_user().await;
    let device_id = fresh_device_id();

    // Wrong hash: 400, and no row is created.
    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/register?fth=0123456789abcdef",
            app.base_url, device_id
        ))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert!(app.db.devices.find(&device_id).await.unwrap().is_none());

    // Missing fth: 422.
    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/register",
            app.base_url, device_id
        ))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    // Correct bind, then a second attempt by another user conflicts.
    let api_token = app.register_device(&access, &device_id).await;
    let (_uid2, access2, _pw2) = app.register_user().await;
    let fth = derive_factory_token_hash(&derive_factory_token(&device_id, FACTORY_SECRET));
    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/register?fth={}",
            app.base_url, device_id, fth
        ))
        .bearer_auth(&access2)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // The original credential is unchanged.
    let device = app.db.devices.find(&device_id).await.unwrap().unwrap();
    assert_eq!(device.api_token.as_deref(), Some(api_token.as_str()));
}

#[tokio::test]
#[ignore]
async fn suspended_device_cannot_ingest_but_can_read_status() {
    let app = spawn_app().await;
    let (_uid, access, _pw) = app.register_user().await;
    let device_id = fresh_device_id();
    let api_token = app.register_device(&access, &device_id).await;
    app.register_location(&access, &device_id).await;

    app.db
        .devices
        .set_status(&device_id, boreal_core::DeviceStatus::Suspended)
        .await
        .unwrap();

    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/event",
            app.base_url, device_id
        ))
        .header("x-api-token", &api_token)
        .json(&serde_json::json!({"detection_type": "bear", "confidence": 0.5}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    assert!(app
        .db
        .events
        .list_for_device(&device_id, 10)
        .await
        .unwrap()
        .is_empty());

    // Status still answers, reporting the suspension.
    let resp = app
        .client
        .get(format!(
            "{}/api/v1/devices/{}/status",
            app.base_url, device_id
        ))
        .header("x-api-token", &api_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "suspended");
    assert!(body["active_location"]["lat"].as_f64().is_some());
}

#[tokio::test]
#[ignore]
async fn upload_logs_inserts_batch_without_mismatch() {
    let app = spawn_app().await;
    let (_uid, access, _pw) = app.register_user().await;
    let device_id = fresh_device_id();
    let api_token = app.register_device(&access, &device_id).await;
    app.register_location(&access, &device_id).await;

    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/upload-logs",
            app.base_url, device_id
        ))
        .header("x-api-token", &api_token)
        .header("x-forwarded-for", FAR_IP)
        .json(&serde_json::json!({"events": [
            {"detection_type": "bear", "confidence": 0.9, "detected_at": "2026-08-20T03:15:00Z"},
            {"detection_type": "human", "confidence": 0.7, "detected_at": "2026-08-20T04:02:00Z"},
            {"detection_type": "unknown", "confidence": 0.4, "detected_at": "2026-08-20T04:40:00Z"},
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["inserted"], 3);

    // Replayed rows are never flagged, even with a far-away replay IP.
    let events = app.db.events.list_for_device(&device_id, 10).await.unwrap();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| !e.location_mismatch));

    // Empty batch is a validation error.
    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/upload-logs",
            app.base_url, device_id
        ))
        .header("x-api-token", &api_token)
        .json(&serde_json::json!({"events": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
}

#[tokio::test]
#[ignore]
async fn device_credential_is_scoped_to_its_device() {
    let app = spawn_app().await;
    let (_uid, access, _pw) = app.register_user().await;
    let device_a = fresh_device_id();
    let device_b = fresh_device_id();
    let token_a = app.register_device(&access, &device_a).await;
    app.register_device(&access, &device_b).await;

    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/event",
            app.base_url, device_b
        ))
        .header("x-api-token", &token_a)
        .json(&serde_json::json!({"detection_type": "bear", "confidence": 0.9}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // Garbage credential is 401, not 403.
    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/event",
            app.base_url, device_a
        ))
        .header("x-api-token", "not-a-real-token")
        .json(&serde_json::json!({"detection_type": "bear", "confidence": 0.9}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore]
async fn relocate_requires_password_reverification() {
    let app = spawn_app().await;
    let (_uid, access, password) = app.register_user().await;
    let device_id = fresh_device_id();
    app.register_device(&access, &device_id).await;
    app.register_location(&access, &device_id).await;

    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/relocate",
            app.base_url, device_id
        ))
        .bearer_auth(&access)
        .json(&serde_json::json!({
            "lat": 35.0, "lon": 138.0, "accuracy_m": 30.0,
            "password": "wrong-password",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .post(format!(
            "{}/api/v1/devices/{}/relocate",
            app.base_url, device_id
        ))
        .bearer_auth(&access)
        .json(&serde_json::json!({
            "lat": 35.0, "lon": 138.0, "accuracy_m": 30.0,
            "password": password,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let active = app.db.locations.active(&device_id).await.unwrap().unwrap();
    assert_eq!(active.lat, 35.0);
}

#[tokio::test]
#[ignore]
async fn setup_stores_channels_and_rejects_unknown_targets() {
    let app = spawn_app().await;
    let (_uid, access, _pw) = app.register_user().await;
    let device_id = fresh_device_id();
    app.register_device(&access, &device_id).await;

    let resp = app
        .client
        .put(format!(
            "{}/api/v1/devices/{}/setup",
            app.base_url, device_id
        ))
        .bearer_auth(&access)
        .json(&serde_json::json!({
            "notification_channels": [{"kind": "line", "token": "line-abc"}],
            "detection_targets": ["bear", "human"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["notification_channels"][0]["kind"], "line");
    assert_eq!(body["detection_targets"], serde_json::json!(["bear", "human"]));

    // Unknown detection target fails deserialization.
    let resp = app
        .client
        .put(format!(
            "{}/api/v1/devices/{}/setup",
            app.base_url, device_id
        ))
        .bearer_auth(&access)
        .json(&serde_json::json!({"detection_targets": ["drone"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);

    // A stranger sees 404, not 403.
    let (_uid2, access2, _pw2) = app.register_user().await;
    let resp = app
        .client
        .put(format!(
            "{}/api/v1/devices/{}/setup",
            app.base_url, device_id
        ))
        .bearer_auth(&access2)
        .json(&serde_json::json!({"detection_targets": ["bear"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore]
async fn login_and_refresh_flow() {
    let app = spawn_app().await;
    let (_uid, _access, password) = app.register_user().await;

    // register_user generated the email; log in again with a fresh account
    // to exercise the whole flow explicitly.
    let email = format!("login-{}@example.com", Uuid::new_v4().simple());
    let resp = app
        .client
        .post(format!("{}/api/v1/auth/register", app.base_url))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = app
        .client
        .post(format!("{}/api/v1/auth/login", app.base_url))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let tokens: serde_json::Value = resp.json().await.unwrap();

    let resp = app
        .client
        .post(format!("{}/api/v1/auth/refresh", app.base_url))
        .json(&serde_json::json!({"refresh_token": tokens["refresh_token"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // An access token is not accepted as a refresh token.
    let resp = app
        .client
        .post(format!("{}/api/v1/auth/refresh", app.base_url))
        .json(&serde_json::json!({"refresh_token": tokens["access_token"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Duplicate email registration conflicts.
    let resp = app
        .client
        .post(format!("{}/api/v1/auth/register", app.base_url))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}
