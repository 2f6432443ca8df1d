use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::activity::{ActivityPublisher, Communication};
use super::domain::{CandidateId, OfferId, ScreeningResult};
use super::error::EligibilityError;
use super::offers::{OfferDraft, OfferResponse, OfferTransitionError};
use super::projection::CandidateQuery;
use super::service::{EligibilityService, EligibilityServiceError, ScreeningBlockRequest};
use super::store::{CandidateRepository, RepositoryError};

/// Header carrying the internal team member performing a mutation.
pub const ACTOR_HEADER: &str = "x-internal-team-member";

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub(crate) struct ManualBlockRequest {
    pub(crate) reason: String,
    pub(crate) duration_months: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkUnblockRequest {
    pub(crate) candidate_ids: Vec<CandidateId>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScreeningRequest {
    pub(crate) result: ScreeningResult,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    #[serde(default)]
    pub(crate) block: Option<ScreeningBlockRequest>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfferResponseRequest {
    pub(crate) response: OfferResponse,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActivityQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

/// Router builder exposing the internal team eligibility pages and commands.
pub fn eligibility_router<R, A>(service: Arc<EligibilityService<R, A>>) -> Router
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    Router::new()
        .route("/api/internal/candidates", get(list_handler::<R, A>))
        .route(
            "/api/internal/candidates/unblock",
            post(bulk_unblock_handler::<R, A>),
        )
        .route(
            "/api/internal/candidates/:candidate_id",
            get(candidate_handler::<R, A>),
        )
        .route(
            "/api/internal/candidates/:candidate_id/block",
            post(block_handler::<R, A>).delete(unblock_handler::<R, A>),
        )
        .route(
            "/api/internal/candidates/:candidate_id/screening",
            post(screening_handler::<R, A>),
        )
        .route(
            "/api/internal/candidates/:candidate_id/offers",
            post(create_offer_handler::<R, A>),
        )
        .route(
            "/api/internal/candidates/:candidate_id/offers/:offer_id/response",
            post(offer_response_handler::<R, A>),
        )
        .route(
            "/api/internal/candidates/:candidate_id/communications",
            post(communication_handler::<R, A>),
        )
        .route("/api/internal/activity", get(activity_handler::<R, A>))
        .route("/api/internal/dashboard", get(dashboard_handler::<R, A>))
        .route(
            "/api/internal/views/blocked-candidates",
            get(blocked_view_handler::<R, A>),
        )
        .route(
            "/api/internal/views/screening-blocking",
            get(screening_view_handler::<R, A>),
        )
        .route(
            "/api/internal/views/offer-management",
            get(offer_view_handler::<R, A>),
        )
        .with_state(service)
}

type SharedService<R, A> = State<Arc<EligibilityService<R, A>>>;

pub(crate) async fn list_handler<R, A>(
    State(service): SharedService<R, A>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    respond(service.list(&query, Utc::now()), StatusCode::OK)
}

pub(crate) async fn candidate_handler<R, A>(
    State(service): SharedService<R, A>,
    Path(candidate_id): Path<String>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let id = CandidateId(candidate_id);
    respond(service.project(&id, Utc::now()), StatusCode::OK)
}

pub(crate) async fn block_handler<R, A>(
    State(service): SharedService<R, A>,
    Path(candidate_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ManualBlockRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let actor = match actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = CandidateId(candidate_id);
    respond(
        service.block_manually(
            &id,
            &request.reason,
            request.duration_months,
            &actor,
            Utc::now(),
        ),
        StatusCode::CREATED,
    )
}

pub(crate) async fn unblock_handler<R, A>(
    State(service): SharedService<R, A>,
    Path(candidate_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let actor = match actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = CandidateId(candidate_id);
    match service.remove_block(&id, &actor, Utc::now()) {
        Ok(removed) => {
            let payload = json!({
                "candidate_id": id.0,
                "unblocked": removed.is_some(),
                "previous_block": removed,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_unblock_handler<R, A>(
    State(service): SharedService<R, A>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<BulkUnblockRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let actor = match actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        service.bulk_unblock(&request.candidate_ids, &actor, Utc::now()),
        StatusCode::OK,
    )
}

pub(crate) async fn screening_handler<R, A>(
    State(service): SharedService<R, A>,
    Path(candidate_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ScreeningRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let actor = match actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = CandidateId(candidate_id);
    respond(
        service.record_screening(
            &id,
            request.result,
            request.notes,
            request.block,
            &actor,
            Utc::now(),
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn create_offer_handler<R, A>(
    State(service): SharedService<R, A>,
    Path(candidate_id): Path<String>,
    headers: HeaderMap,
    axum::Json(mut draft): axum::Json<OfferDraft>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let actor = match actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    draft.candidate_code = candidate_id;
    respond(
        service.create_offer(&draft, &actor, Utc::now()),
        StatusCode::CREATED,
    )
}

pub(crate) async fn offer_response_handler<R, A>(
    State(service): SharedService<R, A>,
    Path((candidate_id, offer_id)): Path<(String, String)>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<OfferResponseRequest>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let actor = match actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        service.respond_to_offer(
            &CandidateId(candidate_id),
            &OfferId(offer_id),
            request.response,
            &actor,
            Utc::now(),
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn communication_handler<R, A>(
    State(service): SharedService<R, A>,
    Path(candidate_id): Path<String>,
    headers: HeaderMap,
    axum::Json(communication): axum::Json<Communication>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let actor = match actor(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    respond(
        service.log_communication(&CandidateId(candidate_id), &communication, &actor, Utc::now()),
        StatusCode::CREATED,
    )
}

pub(crate) async fn activity_handler<R, A>(
    State(service): SharedService<R, A>,
    Query(query): Query<ActivityQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    respond(service.recent_activity(limit), StatusCode::OK)
}

pub(crate) async fn dashboard_handler<R, A>(State(service): SharedService<R, A>) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    respond(service.dashboard(Utc::now()), StatusCode::OK)
}

pub(crate) async fn blocked_view_handler<R, A>(
    State(service): SharedService<R, A>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    respond(
        service.blocked_candidates_view(&query, Utc::now()),
        StatusCode::OK,
    )
}

pub(crate) async fn screening_view_handler<R, A>(
    State(service): SharedService<R, A>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    respond(
        service.screening_blocking_view(&query, Utc::now()),
        StatusCode::OK,
    )
}

pub(crate) async fn offer_view_handler<R, A>(
    State(service): SharedService<R, A>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    R: CandidateRepository + 'static,
    A: ActivityPublisher + 'static,
{
    respond(
        service.offer_management_view(&query, Utc::now()),
        StatusCode::OK,
    )
}

fn actor(headers: &HeaderMap) -> Result<String, Response> {
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match actor {
        Some(actor) => Ok(actor.to_string()),
        None => {
            let payload = json!({
                "error": format!("missing {ACTOR_HEADER} header"),
            });
            Err((StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response())
        }
    }
}

fn respond<T: serde::Serialize>(
    result: Result<T, EligibilityServiceError>,
    success: StatusCode,
) -> Response {
    match result {
        Ok(body) => (success, axum::Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &EligibilityServiceError) -> StatusCode {
    match error {
        EligibilityServiceError::Eligibility(EligibilityError::UnknownCandidate(_))
        | EligibilityServiceError::OfferTransition(OfferTransitionError::UnknownOffer(_)) => {
            StatusCode::NOT_FOUND
        }
        EligibilityServiceError::Eligibility(EligibilityError::InvalidDuration { .. })
        | EligibilityServiceError::Eligibility(EligibilityError::EmptyReason)
        | EligibilityServiceError::OfferValidation(_)
        | EligibilityServiceError::EmptySubject => StatusCode::UNPROCESSABLE_ENTITY,
        EligibilityServiceError::CandidateBlocked { .. }
        | EligibilityServiceError::OfferTransition(OfferTransitionError::NotPending { .. })
        | EligibilityServiceError::Repository(RepositoryError::VersionConflict { .. })
        | EligibilityServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        EligibilityServiceError::Eligibility(EligibilityError::DateOutOfRange)
        | EligibilityServiceError::Repository(_)
        | EligibilityServiceError::Activity(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: EligibilityServiceError) -> Response {
    let status = status_for(&error);
    let payload = match &error {
        EligibilityServiceError::OfferValidation(validation) => json!({
            "error": error.to_string(),
            "issues": validation
                .issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
        }),
        _ => json!({
            "error": error.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}
