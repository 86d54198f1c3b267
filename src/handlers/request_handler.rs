// src/handlers/request_handler.rs
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    errors::{ResqError, ResqResult},
    models::request::{AidRequest, AidRequestView, NewAidRequest, StatusStats, VolunteerAction},
    services::{
        filter::RequestQuery, matching_service::MatchingOperations, request_service::RequestOperations,
    },
    state::AppState,
};

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ResqResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ResqError::bad_request(rejection.body_text()))
}

pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ResqResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ResqError::bad_request(rejection.body_text()))
}

fn idempotency_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// 201 for a new request, 200 when the idempotency key replayed an earlier one.
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<NewAidRequest>, JsonRejection>,
) -> ResqResult<(StatusCode, Json<AidRequest>)> {
    let request = json_body(payload)?;
    let outcome = state
        .request_service
        .create_request(request, idempotency_key(&headers))
        .await?;

    let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(outcome.request)))
}

pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RequestQuery>, QueryRejection>,
) -> ResqResult<Json<Vec<AidRequestView>>> {
    let filter = query_params(query)?.into_filter()?;
    let now = Utc::now();
    let requests = state.request_service.list_requests(&filter).await?;
    Ok(Json(requests.into_iter().map(|r| r.view(now)).collect()))
}

pub async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> ResqResult<Json<AidRequestView>> {
    let request = state.request_service.get_request(&request_id).await?;
    Ok(Json(request.view(Utc::now())))
}

pub async fn update_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    payload: Result<Json<NewAidRequest>, JsonRejection>,
) -> ResqResult<Json<AidRequest>> {
    let update = json_body(payload)?;
    Ok(Json(state.request_service.update_request(&request_id, update).await?))
}

pub async fn delete_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> ResqResult<StatusCode> {
    state.request_service.delete_request(&request_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn request_stats(State(state): State<Arc<AppState>>) -> ResqResult<Json<StatusStats>> {
    Ok(Json(state.request_service.status_stats().await?))
}

pub async fn accept_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    payload: Result<Json<VolunteerAction>, JsonRejection>,
) -> ResqResult<Json<AidRequest>> {
    let action = json_body(payload)?;
    Ok(Json(
        state
            .matching_service
            .accept_request(&request_id, &action.volunteer_id)
            .await?,
    ))
}

pub async fn assign_volunteer(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
    payload: Result<Json<VolunteerAction>, JsonRejection>,
) -> ResqResult<Json<AidRequest>> {
    let action = json_body(payload)?;
    Ok(Json(
        state
            .matching_service
            .assign_volunteer(&request_id, &action.volunteer_id)
            .await?,
    ))
}

pub async fn complete_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> ResqResult<Json<AidRequest>> {
    Ok(Json(state.matching_service.complete_request(&request_id).await?))
}
