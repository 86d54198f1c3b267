// src/routes.rs
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        dashboard_handler,
        request_handler::{self, IDEMPOTENCY_HEADER},
        volunteer_handler,
    },
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route("/health", get(dashboard_handler::health))
        .route(
            "/api/aid-requests",
            post(request_handler::create_request).get(request_handler::list_requests),
        )
        .route("/api/aid-requests/stats", get(request_handler::request_stats))
        .route(
            "/api/aid-requests/:id",
            get(request_handler::get_request)
                .put(request_handler::update_request)
                .delete(request_handler::delete_request),
        )
        .route("/api/aid-requests/:id/accept", post(request_handler::accept_request))
        .route("/api/aid-requests/:id/assign", post(request_handler::assign_volunteer))
        .route("/api/aid-requests/:id/complete", post(request_handler::complete_request))
        .route(
            "/api/volunteers",
            get(volunteer_handler::list_volunteers).post(volunteer_handler::register_volunteer),
        )
        .route("/api/volunteers/:id", get(volunteer_handler::get_volunteer))
        .route(
            "/api/volunteers/:id/status",
            patch(volunteer_handler::update_volunteer_status),
        )
        .route("/api/notifications", get(dashboard_handler::notifications))
        .route("/api/overview", get(dashboard_handler::overview))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(IDEMPOTENCY_HEADER)])
            .max_age(Duration::from_secs(60 * 60)),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin {origin}: {e}");
            CorsLayer::permissive()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn seeded_state() -> Arc<AppState> {
        let state = AppState::in_memory();
        seed::seed_demo_data(&state.store, &state.notification_service).await.unwrap();
        state
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(AppState::in_memory());
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["store"], "memory");
    }

    #[tokio::test]
    async fn test_create_then_replay_with_key() {
        let app = router(AppState::in_memory());
        let payload = json!({
            "type": "Medical",
            "location": { "longitude": -74.006, "latitude": 40.7128 },
            "details": "Insulin needed"
        });

        let request = |payload: Value| {
            Request::builder()
                .method("POST")
                .uri("/api/aid-requests")
                .header("content-type", "application/json")
                .header("Idempotency-Key", "3b1f7c2e")
                .body(Body::from(payload.to_string()))
                .unwrap()
        };

        let first = app.clone().oneshot(request(payload.clone())).await.unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let created = body_json(first).await;
        assert_eq!(created["type"], "Medical");
        assert_eq!(created["status"], "pending");
        assert_eq!(created["location"]["longitude"], -74.006);

        let second = app.clone().oneshot(request(payload)).await.unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(body_json(second).await["id"], created["id"]);

        let listed = body_json(app.oneshot(get("/api/aid-requests")).await.unwrap()).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["time_ago"], "Just now");
    }

    #[tokio::test]
    async fn test_create_rejects_missing_type() {
        let app = router(AppState::in_memory());
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/aid-requests",
                json!({ "location": { "longitude": 0.0, "latitude": 0.0 }, "details": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "missing_field");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = router(AppState::in_memory());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/aid-requests")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_filtered_listing() {
        let app = router(seeded_state().await);
        let response = app
            .clone()
            .oneshot(get("/api/aid-requests?urgency=high&status=pending&contact=%2B1-555-0123"))
            .await
            .unwrap();
        let listed = body_json(response).await;
        let ids: Vec<&str> = listed.as_array().unwrap().iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["req-250612-vb001", "req-250612-vc001"]);

        let bad = app.oneshot(get("/api/aid-requests?urgency=extreme")).await.unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_accept_assign_complete_flow() {
        let state = seeded_state().await;
        let app = router(state.clone());

        let accepted = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/aid-requests/req-250612-vb002/accept",
                json!({ "volunteer_id": "vol-250601-or001" }),
            ))
            .await
            .unwrap();
        assert_eq!(accepted.status(), StatusCode::OK);
        assert_eq!(body_json(accepted).await["status"], "accepted");

        let busy = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/aid-requests/req-250612-vb002/assign",
                json!({ "volunteer_id": "vol-250601-or002" }),
            ))
            .await
            .unwrap();
        assert_eq!(busy.status(), StatusCode::CONFLICT);

        let assigned = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/aid-requests/req-250612-vb002/assign",
                json!({ "volunteerId": "vol-250601-or003" }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(assigned).await["helper"], "Amit Singh");

        let completed = app
            .clone()
            .oneshot(json_request("POST", "/api/aid-requests/req-250612-vb002/complete", json!({})))
            .await
            .unwrap();
        assert_eq!(body_json(completed).await["status"], "completed");

        let locked = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/aid-requests/req-250612-vb002")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(locked.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(locked).await["error"], "request_locked");
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let app = router(AppState::in_memory());
        let response = app.oneshot(get("/api/aid-requests/req-250101-nope0")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_overview_and_feed() {
        let app = router(seeded_state().await);

        let overview = body_json(app.clone().oneshot(get("/api/overview")).await.unwrap()).await;
        assert_eq!(overview["requests"]["total"], 11);
        assert_eq!(overview["volunteers"]["available"], 2);
        assert_eq!(overview["volunteers"]["busy"], 2);

        let feed = body_json(app.oneshot(get("/api/notifications?limit=2")).await.unwrap()).await;
        let feed = feed.as_array().unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0]["category"], "urgent");
        assert_eq!(feed[0]["time"], "10 min ago");
    }

    #[tokio::test]
    async fn test_volunteer_registration_and_status() {
        let app = router(AppState::in_memory());
        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/volunteers",
                json!({ "name": "Kavya Iyer", "role": "Logistics", "experience_years": 1 }),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let volunteer = body_json(created).await;
        let id = volunteer["id"].as_str().unwrap().to_string();

        let updated = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/volunteers/{id}/status"),
                json!({ "status": "busy" }),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(updated).await["status"], "busy");

        let busy = body_json(app.oneshot(get("/api/volunteers?status=busy")).await.unwrap()).await;
        assert_eq!(busy.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_query_is_json_bad_request() {
        let app = router(seeded_state().await);

        let feed = app.clone().oneshot(get("/api/notifications?limit=abc")).await.unwrap();
        assert_eq!(feed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(feed).await["error"], "bad_request");

        let volunteers = app
            .oneshot(get("/api/volunteers?status=busy&status=available"))
            .await
            .unwrap();
        assert_eq!(volunteers.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(volunteers).await["error"], "bad_request");
    }
}
