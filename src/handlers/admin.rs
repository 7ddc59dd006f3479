use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingSettings, Organization, Service, Visit, VisitStatus};
use crate::services::booking::validate_duration;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

// POST /api/admin/orgs
#[derive(Deserialize)]
pub struct UpsertOrganizationRequest {
    pub slug: String,
    pub display_name: String,
    #[serde(default)]
    pub booking_settings: BookingSettings,
    pub telegram_chat_id: Option<String>,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

pub async fn upsert_organization(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UpsertOrganizationRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let slug = body.slug.trim().to_string();
    if !is_valid_slug(&slug) {
        return Err(AppError::BadRequest(format!(
            "slug must be lowercase letters, digits and dashes: {slug:?}"
        )));
    }
    if body.display_name.trim().is_empty() {
        return Err(AppError::BadRequest("display_name is required".to_string()));
    }
    if !(-14 * 60..=14 * 60).contains(&body.utc_offset_minutes) {
        return Err(AppError::BadRequest("utc_offset_minutes out of range".to_string()));
    }
    body.booking_settings
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let id = {
        let db = state.conn()?;
        let id = queries::get_organization_by_slug(&db, &slug)?
            .map(|existing| existing.id)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        queries::save_organization(
            &db,
            &Organization {
                id: id.clone(),
                slug: slug.clone(),
                display_name: body.display_name.trim().to_string(),
                booking_settings: body.booking_settings,
                telegram_chat_id: body.telegram_chat_id.filter(|c| !c.trim().is_empty()),
                utc_offset_minutes: body.utc_offset_minutes,
            },
        )?;
        id
    };

    tracing::info!(slug = %slug, id = %id, "organization saved");
    Ok(Json(serde_json::json!({ "ok": true, "id": id, "slug": slug })))
}

// GET /api/admin/orgs/:slug/visits
#[derive(Deserialize)]
pub struct VisitsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct VisitResponse {
    id: String,
    client_id: Option<String>,
    service_name: String,
    scheduled_at: String,
    duration_minutes: i32,
    price: Option<String>,
    status: String,
    notes: String,
    created_at: String,
    updated_at: String,
}

impl From<Visit> for VisitResponse {
    fn from(v: Visit) -> Self {
        Self {
            id: v.id,
            client_id: v.client_id,
            service_name: v.service_name,
            scheduled_at: v.scheduled_at.format(queries::TS_FORMAT).to_string(),
            duration_minutes: v.duration_minutes,
            price: v.price,
            status: v.status.as_str().to_string(),
            notes: v.notes,
            created_at: v.created_at.format(queries::TS_FORMAT).to_string(),
            updated_at: v.updated_at.format(queries::TS_FORMAT).to_string(),
        }
    }
}

fn parse_status(raw: &str) -> Result<VisitStatus, AppError> {
    VisitStatus::parse(raw).ok_or_else(|| AppError::BadRequest(format!("unknown status: {raw}")))
}

pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(query): Query<VisitsQuery>,
) -> Result<Json<Vec<VisitResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status = query.status.as_deref().map(parse_status).transpose()?;
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let org = state.engine.organization(&slug).await?;

    let visits = {
        let db = state.conn()?;
        queries::list_visits(&db, &org.id, status, limit)?
    };

    Ok(Json(visits.into_iter().map(VisitResponse::from).collect()))
}

// POST /api/admin/visits/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_visit_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<VisitResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let next = parse_status(&body.status)?;

    let visit = {
        let db = state.conn()?;
        let visit = queries::get_visit(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("visit {id}")))?;

        if !visit.status.can_transition_to(next) {
            return Err(AppError::BadRequest(format!(
                "cannot change visit from {} to {}",
                visit.status.as_str(),
                next.as_str()
            )));
        }

        queries::update_visit_status(&db, &id, next)?;
        queries::get_visit(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("visit {id}")))?
    };

    tracing::info!(visit_id = %id, status = next.as_str(), "visit status changed");
    Ok(Json(VisitResponse::from(visit)))
}

// GET /api/admin/orgs/:slug/clients
#[derive(Deserialize)]
pub struct ClientsQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct ClientResponse {
    id: String,
    first_name: String,
    last_name: String,
    phone: String,
    email: Option<String>,
    notes: String,
    created_at: String,
}

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(query): Query<ClientsQuery>,
) -> Result<Json<Vec<ClientResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let org = state.engine.organization(&slug).await?;
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let clients = {
        let db = state.conn()?;
        queries::list_clients(&db, &org.id, limit)?
    };

    Ok(Json(
        clients
            .into_iter()
            .map(|c| ClientResponse {
                id: c.id,
                first_name: c.first_name,
                last_name: c.last_name,
                phone: c.phone,
                email: c.email,
                notes: c.notes,
                created_at: c.created_at.format(queries::TS_FORMAT).to_string(),
            })
            .collect(),
    ))
}

// POST /api/admin/orgs/:slug/services
#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_minutes: Option<i32>,
    pub price: Option<String>,
}

pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<CreateServiceRequest>,
) -> Result<Json<Service>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    let duration_minutes = validate_duration(body.duration_minutes)?
        .unwrap_or(crate::models::DEFAULT_VISIT_MINUTES);

    let org = state.engine.organization(&slug).await?;
    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        organization_id: org.id,
        name: name.to_string(),
        duration_minutes,
        price: body.price.filter(|p| !p.trim().is_empty()),
    };

    {
        let db = state.conn()?;
        queries::create_service(&db, &service)?;
    }

    Ok(Json(service))
}
