use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CompanyId, TechnicianId};
use super::events::RatingEvent;
use super::repository::{RepositoryError, SnapshotStore, TechnicianRepository};
use super::service::{RatingServiceError, SafetyRatingService};

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterTechnicianRequest {
    pub(crate) technician_id: String,
}

/// Router builder exposing the rating read accessors and event intake.
pub fn rating_router<R, S>(service: Arc<SafetyRatingService<R, S>>) -> Router
where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    Router::new()
        .route("/api/v1/technicians", post(register_handler::<R, S>))
        .route(
            "/api/v1/technicians/:technician_id/safety-rating",
            get(rating_handler::<R, S>),
        )
        .route(
            "/api/v1/technicians/:technician_id/events",
            post(event_handler::<R, S>),
        )
        .route(
            "/api/v1/companies/:company_id/workforce-safety-score",
            get(workforce_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R, S>(
    State(service): State<Arc<SafetyRatingService<R, S>>>,
    axum::Json(request): axum::Json<RegisterTechnicianRequest>,
) -> Response
where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    match service.register_technician(TechnicianId(request.technician_id)) {
        Ok(snapshot) => (StatusCode::CREATED, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rating_handler<R, S>(
    State(service): State<Arc<SafetyRatingService<R, S>>>,
    Path(technician_id): Path<String>,
) -> Response
where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    match service.personal_safety_rating(&TechnicianId(technician_id)) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn event_handler<R, S>(
    State(service): State<Arc<SafetyRatingService<R, S>>>,
    Path(technician_id): Path<String>,
    axum::Json(event): axum::Json<RatingEvent>,
) -> Response
where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    match service.apply(&TechnicianId(technician_id), event) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn workforce_handler<R, S>(
    State(service): State<Arc<SafetyRatingService<R, S>>>,
    Path(company_id): Path<String>,
) -> Response
where
    R: TechnicianRepository + 'static,
    S: SnapshotStore + 'static,
{
    match service.workforce_safety_score(&CompanyId(company_id)) {
        Ok(score) => (StatusCode::OK, axum::Json(score)).into_response(),
        Err(error) => error_response(error),
    }
}

/// Status code for a rating service failure, shared with `AppError`.
pub(crate) fn status_for(error: &RatingServiceError) -> StatusCode {
    match error {
        RatingServiceError::TechnicianNotFound(_)
        | RatingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RatingServiceError::Event(_)
        | RatingServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RatingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn error_response(error: RatingServiceError) -> Response {
    let status = status_for(&error);
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
