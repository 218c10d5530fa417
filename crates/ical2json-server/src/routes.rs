//! HTTP routes.
//!
//! - `GET /nextcloud/cal/{uri}`: the whole calendar
//! - `GET /nextcloud/cal/{uri}/from_now`: only events starting now or later
//!
//! Both accept `?mode=typed|extras` to pick the JSON shape.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use ical2json_core::{Calendar, OutputMode};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/nextcloud/cal/{uri}", get(get_calendar))
        .route("/nextcloud/cal/{uri}/from_now", get(get_calendar_from_now))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Query parameters shared by the calendar routes.
#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    /// Overrides the server's default output mode.
    pub mode: Option<OutputMode>,
}

/// GET /nextcloud/cal/{uri}
async fn get_calendar(
    State(state): State<AppState>,
    Path(uri): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Calendar>, ApiError> {
    let calendar = state.calendar(&uri, query.mode).await?;
    Ok(Json(calendar))
}

/// GET /nextcloud/cal/{uri}/from_now
async fn get_calendar_from_now(
    State(state): State<AppState>,
    Path(uri): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Calendar>, ApiError> {
    let calendar = state.calendar(&uri, query.mode).await?.from_now(Utc::now());
    Ok(Json(calendar))
}
