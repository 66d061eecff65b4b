use axum::{routing::get, routing::post, routing::put, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::tracker::SessionRegistry;

use super::api::geo as geo_handlers;
use super::api::routes as route_handlers;
use super::api::tracker as tracker_handlers;
use super::api_doc::ApiDoc;
use super::auth::AppState;
use super::config::{Config, ConfigError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn build_state(config: Config) -> Result<AppState, ConfigError> {
    let resolved = config.resolve()?;
    log::info!("Loaded {} route(s)", resolved.routes.len());

    Ok(AppState {
        config: Arc::new(config),
        registry: Arc::new(Mutex::new(SessionRegistry::new(
            resolved.routes,
            resolved.settings,
        ))),
        fallback_observer: resolved.fallback_observer,
    })
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Session API endpoints
        .route(
            "/api/sessions",
            post(tracker_handlers::create_session).get(tracker_handlers::list_sessions),
        )
        .route(
            "/api/sessions/{id}",
            get(tracker_handlers::get_session).delete(tracker_handlers::delete_session),
        )
        .route("/api/sessions/{id}/start", post(tracker_handlers::start))
        .route("/api/sessions/{id}/stop", post(tracker_handlers::stop))
        .route("/api/sessions/{id}/reset", post(tracker_handlers::reset))
        .route("/api/sessions/{id}/advance", post(tracker_handlers::advance))
        .route(
            "/api/sessions/{id}/observer",
            put(tracker_handlers::set_observer),
        )
        // Route catalogue
        .route("/api/routes", get(route_handlers::list_routes))
        .route(
            "/api/routes/{name}/nearest",
            get(route_handlers::nearest_waypoint),
        )
        .route("/api/geo/distance", get(geo_handlers::distance))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let bind_addr = config.web.bind.clone();
    let state = build_state(config)?;
    let app = router(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    const CONFIG: &str = r#"
tracking:
  advance_interval: 1h
  telemetry_interval: 1h
routes:
  - name: dehradun-delhi
    waypoints:
      - "30.3165, 78.0322"
      - "29.8661, 77.8945"
      - "28.6139, 77.2090"
api_keys:
  - key: rider
    name: rider
    permissions: [track]
  - key: operator
    name: operator
    permissions: [track, operate]
"#;

    fn app() -> Router {
        let config = Config::from_yaml(CONFIG).unwrap();
        router(build_state(config).unwrap())
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        key: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn open_session(app: &Router, body: Value) -> String {
        let (status, json) = send(app, "POST", "/api/sessions", Some("rider"), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn requests_without_key_are_rejected() {
        let app = app();
        let (status, json) = send(&app, "GET", "/api/routes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "unauthorized");
        assert_eq!(json["message"], "missing Authorization header");

        let (status, json) = send(&app, "GET", "/api/routes", Some("nope"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "unknown API key");
    }

    #[tokio::test]
    async fn lists_configured_routes() {
        let app = app();
        let (status, json) = send(&app, "GET", "/api/routes", Some("rider"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json[0]["name"], "dehradun-delhi");
        assert_eq!(json[0]["waypoint_count"], 3);
    }

    #[tokio::test]
    async fn session_lifecycle_over_http() {
        let app = app();
        let id = open_session(
            &app,
            serde_json::json!({ "route": "dehradun-delhi", "observer": { "lat": 28.6139, "lon": 77.2090 } }),
        )
        .await;

        let uri = format!("/api/sessions/{}", id);
        let (status, json) = send(&app, "GET", &uri, Some("rider"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "idle");
        assert_eq!(json["progress_percent"], 0.0);

        let start = format!("{}/start", uri);
        let (status, json) = send(&app, "POST", &start, Some("rider"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"], "forbidden");
        assert_eq!(json["message"], "key lacks the Operate permission");

        let (status, json) = send(&app, "POST", &start, Some("operator"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], "running");

        let (status, json) = send(&app, "POST", &start, Some("operator"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "tracker_running");

        let advance = format!("{}/advance", uri);
        send(&app, "POST", &advance, Some("operator"), None).await;
        let (_, json) = send(&app, "POST", &advance, Some("operator"), None).await;
        assert_eq!(json["current_index"], 2);
        assert_eq!(json["state"], "completed");
        assert_eq!(json["progress_percent"], 100.0);
        assert!(json["distance_km"].as_f64().unwrap() < 1e-9);

        let (_, json) = send(&app, "POST", &format!("{}/reset", uri), Some("operator"), None).await;
        assert_eq!(json["state"], "idle");
        assert_eq!(json["current_index"], 0);

        let (status, _) = send(&app, "DELETE", &uri, Some("rider"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, json) = send(&app, "GET", &uri, Some("rider"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "session_not_found");
    }

    #[tokio::test]
    async fn fallback_observer_fills_missing_position() {
        let app = app();
        let id = open_session(&app, serde_json::json!({ "route": "dehradun-delhi" })).await;
        let (_, json) = send(&app, "GET", &format!("/api/sessions/{}", id), Some("rider"), None).await;
        assert!(json["distance_km"].as_f64().unwrap() > 190.0);

        let observer = format!("/api/sessions/{}/observer", id);
        let (status, json) = send(&app, "PUT", &observer, Some("rider"), Some(serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["distance_km"].is_null());
        assert!(json["eta_minutes"].is_null());

        let bad = serde_json::json!({ "observer": { "lat": 120.0, "lon": 0.0 } });
        let (status, _) = send(&app, "PUT", &observer, Some("rider"), Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let app = app();
        let (status, json) = send(
            &app,
            "POST",
            "/api/sessions",
            Some("rider"),
            Some(serde_json::json!({ "route": "atlantis" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "route_not_found");
    }

    #[tokio::test]
    async fn distance_endpoint_validates_speed() {
        let app = app();
        let (status, json) = send(
            &app,
            "GET",
            "/api/geo/distance?from=30.3165,78.0322&to=30.3165,78.0322",
            Some("rider"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["distance_km"], 0.0);
        assert_eq!(json["eta_display_minutes"], 0);

        let (status, _) = send(
            &app,
            "GET",
            "/api/geo/distance?from=30.3165,78.0322&to=28.6139,77.2090&speed=0",
            Some("rider"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn nearest_waypoint_lookup() {
        let app = app();
        let (status, json) = send(
            &app,
            "GET",
            "/api/routes/dehradun-delhi/nearest?at=29.85,77.90",
            Some("rider"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["index"], 1);
    }
}
