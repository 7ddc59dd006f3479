use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::queries;
use crate::errors::AppError;
use crate::services::calendar::generate_ics;
use crate::state::AppState;

// GET /booking/:slug/visits/:visit_id(.ics)
pub async fn download_ics(
    State(state): State<Arc<AppState>>,
    Path((slug, raw_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let visit_id = raw_id.strip_suffix(".ics").unwrap_or(&raw_id);

    let org = state.engine.organization(&slug).await?;
    let visit = {
        let db = state.conn()?;
        queries::get_visit(&db, visit_id)?
    }
    // Visits of other organizations are invisible under this slug.
    .filter(|v| v.organization_id == org.id)
    .ok_or_else(|| AppError::NotFound(format!("visit {visit_id}")))?;

    let ics = generate_ics(&visit, &org.display_name);
    let filename = format!("visit-{visit_id}.ics");

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        ics,
    )
        .into_response())
}
