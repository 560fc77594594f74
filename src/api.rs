//! HTTP API handlers for stormwatch.
//!
//! The handlers expose exactly what the session core produces: the ordered,
//! paginated alert view with its counts and loading/error flags, the zone
//! list gated on area selection, and setters for the selection and
//! pagination state. Rendering is someone else's job.
//!
//! The session has a single logical owner: every handler goes through one
//! async lock, so selection changes, fetch application, and re-derivation
//! never interleave.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::data_sources::AlertFeed;
use crate::derive::SortDirection;
use crate::session::{DashboardSession, DashboardView, ZonesView};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The dashboard session, serialized behind one lock.
    pub session: Arc<Mutex<DashboardSession>>,
    /// The remote feed the session refreshes from.
    pub feed: Arc<dyn AlertFeed>,
}

impl AppState {
    /// Create fresh state with a default session over the given feed.
    pub fn new(feed: Arc<dyn AlertFeed>) -> Self {
        Self {
            session: Arc::new(Mutex::new(DashboardSession::new())),
            feed,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/zones", get(get_zones))
        .route("/selection", post(update_selection))
        .route("/selection/clear", post(clear_selection))
        .route("/pagination", post(update_pagination))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Partial update of the filter/sort selection.
///
/// Absent fields are left unchanged; empty strings clear the corresponding
/// filter.
#[derive(Debug, Deserialize)]
pub struct SelectionUpdate {
    pub area: Option<String>,
    pub zone: Option<String>,
    pub severity: Option<String>,
    pub urgency: Option<String>,
    pub sort_by: Option<String>,
    /// "asc" or "desc".
    pub sort_direction: Option<String>,
}

/// Partial update of the pagination window.
#[derive(Debug, Deserialize)]
pub struct PaginationUpdate {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// GET /dashboard - Refresh the active alert source and serve the current
/// page of the derived list.
#[instrument(skip(state))]
pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    let mut session = state.session.lock().await;
    session.refresh(state.feed.as_ref()).await;

    let view = session.page_view();
    info!(
        total = view.total,
        visible = view.visible,
        page = view.page,
        error = view.error,
        "Dashboard served"
    );
    Json(view)
}

/// GET /zones - The zone list for the selected area.
///
/// Empty, with no loading flag, when no area is selected; the zone-list
/// fetch is never attempted in that case.
#[instrument(skip(state))]
pub async fn get_zones(State(state): State<AppState>) -> Json<ZonesView> {
    let mut session = state.session.lock().await;
    session.refresh(state.feed.as_ref()).await;

    let view = session.zones_view();
    info!(zones = view.zones.len(), loading = view.loading, "Zone list served");
    Json(view)
}

/// POST /selection - Update filter/sort fields and serve the resulting view.
///
/// # Request Body
///
/// ```json
/// {
///     "area": "CA",
///     "severity": "Severe",
///     "sort_by": "severity",
///     "sort_direction": "desc"
/// }
/// ```
///
/// Any subset of fields may be provided. Returns `400 Bad Request` for a
/// sort direction other than "asc" or "desc".
#[instrument(skip(state))]
pub async fn update_selection(
    State(state): State<AppState>,
    Json(update): Json<SelectionUpdate>,
) -> Result<Json<DashboardView>, StatusCode> {
    let direction = match update.sort_direction.as_deref() {
        Some(raw) => match SortDirection::parse(raw) {
            Some(direction) => Some(direction),
            None => {
                warn!(direction = raw, "Invalid sort direction");
                return Err(StatusCode::BAD_REQUEST);
            }
        },
        None => None,
    };

    let mut session = state.session.lock().await;
    if let Some(area) = &update.area {
        session.set_area(area);
    }
    if let Some(zone) = &update.zone {
        session.set_zone(zone);
    }
    if let Some(severity) = &update.severity {
        session.set_severity(severity);
    }
    if let Some(urgency) = &update.urgency {
        session.set_urgency(urgency);
    }
    if let Some(field) = &update.sort_by {
        session.set_sort_by(field);
    }
    if let Some(direction) = direction {
        session.set_sort_direction(direction);
    }

    session.refresh(state.feed.as_ref()).await;

    let view = session.page_view();
    info!(selection = ?session.selection(), total = view.total, "Selection updated");
    Ok(Json(view))
}

/// POST /selection/clear - Reset area, zone, severity, and urgency.
#[instrument(skip(state))]
pub async fn clear_selection(State(state): State<AppState>) -> Json<DashboardView> {
    let mut session = state.session.lock().await;
    session.clear_filters();
    session.refresh(state.feed.as_ref()).await;

    info!("Filters cleared");
    Json(session.page_view())
}

/// POST /pagination - Update page index and/or page size.
///
/// Changing the page size resets the page index to 0; when both are given,
/// the explicit page wins. Returns `400 Bad Request` for a zero page size.
#[instrument(skip(state))]
pub async fn update_pagination(
    State(state): State<AppState>,
    Json(update): Json<PaginationUpdate>,
) -> Result<Json<DashboardView>, StatusCode> {
    if update.page_size == Some(0) {
        warn!("Zero page size rejected");
        return Err(StatusCode::BAD_REQUEST);
    }

    let mut session = state.session.lock().await;
    if let Some(size) = update.page_size {
        session.set_page_size(size);
    }
    if let Some(page) = update.page {
        session.set_page(page);
    }

    Ok(Json(session.page_view()))
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
