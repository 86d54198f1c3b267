// src/handlers/volunteer_handler.rs
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    errors::ResqResult,
    handlers::request_handler::{json_body, query_params},
    models::volunteer::{Volunteer, VolunteerRegistration, VolunteerStatus, VolunteerStatusUpdate},
    services::volunteer_service::VolunteerOperations,
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct VolunteerQuery {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn register_volunteer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VolunteerRegistration>, JsonRejection>,
) -> ResqResult<(StatusCode, Json<Volunteer>)> {
    let registration = json_body(payload)?;
    let volunteer = state.volunteer_service.register_volunteer(registration).await?;
    Ok((StatusCode::CREATED, Json(volunteer)))
}

pub async fn list_volunteers(
    State(state): State<Arc<AppState>>,
    query: Result<Query<VolunteerQuery>, QueryRejection>,
) -> ResqResult<Json<Vec<Volunteer>>> {
    let status = query_params(query)?
        .status
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
        .map(|s| s.parse::<VolunteerStatus>())
        .transpose()?;
    Ok(Json(state.volunteer_service.list_volunteers(status).await?))
}

pub async fn get_volunteer(
    State(state): State<Arc<AppState>>,
    Path(volunteer_id): Path<String>,
) -> ResqResult<Json<Volunteer>> {
    Ok(Json(state.volunteer_service.get_volunteer(&volunteer_id).await?))
}

pub async fn update_volunteer_status(
    State(state): State<Arc<AppState>>,
    Path(volunteer_id): Path<String>,
    payload: Result<Json<VolunteerStatusUpdate>, JsonRejection>,
) -> ResqResult<Json<Volunteer>> {
    let update = json_body(payload)?;
    Ok(Json(
        state
            .volunteer_service
            .update_status(&volunteer_id, update.status)
            .await?,
    ))
}
