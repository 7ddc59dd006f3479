use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingSettings, WorkingHours};
use crate::services::booking::{self, BookingConfirmation, BookingError, BookingRequest};
use crate::state::AppState;

// POST /booking/:slug/book
pub async fn book(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<BookingConfirmation>, BookingError> {
    // Malformed bodies share the validation error shape.
    let Json(body) = payload.map_err(|rejection| {
        tracing::info!(slug = %slug, error = %rejection.body_text(), "malformed booking body");
        BookingError::Validation(rejection.body_text())
    })?;
    tracing::info!(slug = %slug, date = %body.date, time = %body.time, "booking request received");
    let confirmation = state.engine.book(&slug, body).await?;
    Ok(Json(confirmation))
}

// GET /booking/:slug
#[derive(Serialize)]
pub struct PublicServiceResponse {
    id: String,
    name: String,
    duration_minutes: i32,
    price: Option<String>,
}

#[derive(Serialize)]
pub struct PublicOrganizationResponse {
    slug: String,
    display_name: String,
    enabled: bool,
    working_hours: WorkingHours,
    working_hours_text: String,
    advance_days: i64,
    min_advance_hours: i64,
    services: Vec<PublicServiceResponse>,
}

pub async fn organization_info(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<PublicOrganizationResponse>, AppError> {
    let org = state.engine.organization(&slug).await?;
    let services = {
        let db = state.conn()?;
        queries::list_services(&db, &org.id)?
    };

    let BookingSettings {
        enabled,
        working_hours,
        advance_days,
        min_advance_hours,
        ..
    } = org.booking_settings;

    Ok(Json(PublicOrganizationResponse {
        slug: org.slug,
        display_name: org.display_name,
        enabled,
        working_hours_text: working_hours.to_human_readable(),
        working_hours,
        advance_days,
        min_advance_hours,
        services: services
            .into_iter()
            .map(|s| PublicServiceResponse {
                id: s.id,
                name: s.name,
                duration_minutes: s.duration_minutes,
                price: s.price,
            })
            .collect(),
    }))
}

// GET /booking/:slug/slots?date=YYYY-MM-DD&duration=60
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: String,
    pub duration: Option<i32>,
}

#[derive(Serialize)]
pub struct SlotsResponse {
    date: String,
    slots: Vec<String>,
}

pub async fn available_slots(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, BookingError> {
    let date = booking::parse_date(&query.date)?;
    let slots = state
        .engine
        .available_slots(&slug, date, query.duration)
        .await?;

    Ok(Json(SlotsResponse {
        date: date.format("%Y-%m-%d").to_string(),
        slots: slots.iter().map(|s| s.format("%H:%M").to_string()).collect(),
    }))
}
