// src/handlers/dashboard_handler.rs
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{
    errors::ResqResult,
    handlers::request_handler::query_params,
    models::{
        notification::NotificationView,
        request::{StatusStats, UrgencyBreakdown},
        volunteer::AvailabilityStats,
    },
    services::{request_service::RequestOperations, volunteer_service::VolunteerOperations},
    state::AppState,
};

const DEFAULT_FEED_LIMIT: usize = 20;

#[derive(Debug, Deserialize, Default)]
pub struct FeedQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OverviewResponse {
    pub requests: StatusStats,
    pub urgency: UrgencyBreakdown,
    pub volunteers: AvailabilityStats,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "store": state.store.backend_name(),
    }))
}

pub async fn notifications(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> ResqResult<Json<Vec<NotificationView>>> {
    let limit = query_params(query)?.limit.unwrap_or(DEFAULT_FEED_LIMIT);
    Ok(Json(state.notification_service.recent(limit, Utc::now()).await))
}

pub async fn overview(State(state): State<Arc<AppState>>) -> ResqResult<Json<OverviewResponse>> {
    let (requests, urgency, volunteers) = tokio::try_join!(
        state.request_service.status_stats(),
        state.request_service.urgency_breakdown(),
        state.volunteer_service.availability_stats(),
    )?;
    Ok(Json(OverviewResponse {
        requests,
        urgency,
        volunteers,
    }))
}
