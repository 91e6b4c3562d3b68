use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, ApplicationStatus, ApplicationSubmission};
use super::evaluation::{CriterionId, ReviewAction};
use super::repository::{ApplicationRecord, ApplicationRepository};
use super::service::{ReviewService, ReviewServiceError};
use crate::auth::actor_from_headers;
use crate::listing::{ListQuery, SortDirection, SortKey};
use crate::locale::Locale;
use crate::uploads::{UploadPolicy, UploadedFile};
use crate::workflows::http::{
    access_response, error_response, repository_status, workflow_status,
};

pub(crate) struct ReviewRouterState<R> {
    service: Arc<ReviewService<R>>,
    default_locale: Locale,
}

impl<R> ReviewRouterState<R> {
    pub(crate) fn new(service: Arc<ReviewService<R>>, default_locale: Locale) -> Self {
        Self {
            service,
            default_locale,
        }
    }
}

impl<R> Clone for ReviewRouterState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            default_locale: self.default_locale,
        }
    }
}

/// Router builder exposing the reviewer endpoints.
pub fn review_router<R>(service: Arc<ReviewService<R>>, default_locale: Locale) -> Router
where
    R: ApplicationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/review/applications",
            post(submit_handler::<R>).get(queue_handler::<R>),
        )
        .route(
            "/api/v1/review/applications/:application_id",
            get(detail_handler::<R>),
        )
        .route(
            "/api/v1/review/applications/:application_id/criteria/:criterion_id",
            put(score_handler::<R>),
        )
        .route(
            "/api/v1/review/applications/:application_id/evidence/:index",
            put(verify_handler::<R>),
        )
        .route(
            "/api/v1/review/applications/:application_id/evidence/:index/document",
            put(document_handler::<R>),
        )
        .route(
            "/api/v1/review/applications/:application_id/decision",
            post(decision_handler::<R>),
        )
        .with_state(ReviewRouterState::new(service, default_locale))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueueParams {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    sort: Option<SortKey>,
    #[serde(default)]
    direction: Option<SortDirection>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    /// Wider than the engine's score type; anything above the criterion maximum is clamped.
    pub(crate) score: u64,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyRequest {
    pub(crate) verified: bool,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DocumentClass {
    #[default]
    Certificate,
    Institutional,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentRequest {
    pub(crate) file: UploadedFile,
    #[serde(default)]
    pub(crate) class: DocumentClass,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub(crate) action: ReviewAction,
    #[serde(default)]
    pub(crate) feedback: String,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

fn service_error_response(error: ReviewServiceError) -> Response {
    let status = match &error {
        ReviewServiceError::Workflow(inner) => workflow_status(inner),
        ReviewServiceError::Repository(inner) => repository_status(inner),
        ReviewServiceError::Upload(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    error_response(status, error.to_string())
}

fn record_response(status: StatusCode, record: &ApplicationRecord, locale: Locale) -> Response {
    (status, axum::Json(record.status_view(locale))).into_response()
}

pub(crate) async fn submit_handler<R>(
    State(state): State<ReviewRouterState<R>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state
        .service
        .submit(&actor, submission, Local::now().date_naive())
    {
        Ok(record) => record_response(StatusCode::CREATED, &record, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn queue_handler<R>(
    State(state): State<ReviewRouterState<R>>,
    headers: HeaderMap,
    Query(params): Query<QueueParams>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => match ApplicationStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("unknown status filter '{raw}'"),
                )
            }
        },
    };

    let query = ListQuery {
        search: params.search,
        sort: params.sort.unwrap_or_default(),
        direction: params.direction.unwrap_or_default(),
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(0),
    };

    match state.service.queue(&actor, status, &query) {
        Ok(page) => {
            let page = page.map(|record| record.status_view(locale));
            (StatusCode::OK, axum::Json(page)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn detail_handler<R>(
    State(state): State<ReviewRouterState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);
    let id = ApplicationId(application_id);

    let record = match state.service.get(&actor, &id) {
        Ok(record) => record,
        Err(err) => return service_error_response(err),
    };
    let evaluation = match state.service.evaluate(&actor, &id) {
        Ok(outcome) => outcome,
        Err(err) => return service_error_response(err),
    };

    let payload = json!({
        "summary": record.status_view(locale),
        "evaluation_summary": evaluation.summary(locale),
        "evaluation": evaluation,
        "application": record.application,
        "decision": record.decision,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn score_handler<R>(
    State(state): State<ReviewRouterState<R>>,
    Path((application_id, criterion_id)): Path<(String, String)>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ScoreRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.score_criterion(
        &actor,
        &ApplicationId(application_id),
        &CriterionId(criterion_id),
        u16::try_from(request.score).unwrap_or(u16::MAX),
        request.expected_version,
    ) {
        Ok(record) => record_response(StatusCode::OK, &record, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn verify_handler<R>(
    State(state): State<ReviewRouterState<R>>,
    Path((application_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<VerifyRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.verify_evidence(
        &actor,
        &ApplicationId(application_id),
        index,
        request.verified,
        request.expected_version,
    ) {
        Ok(record) => record_response(StatusCode::OK, &record, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn document_handler<R>(
    State(state): State<ReviewRouterState<R>>,
    Path((application_id, index)): Path<(String, usize)>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<DocumentRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);
    let policy = match request.class {
        DocumentClass::Certificate => UploadPolicy::certificates(),
        DocumentClass::Institutional => UploadPolicy::institutional_documents(),
    };

    match state.service.attach_document(
        &actor,
        &ApplicationId(application_id),
        index,
        &request.file,
        &policy,
        request.expected_version,
    ) {
        Ok(record) => record_response(StatusCode::OK, &record, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn decision_handler<R>(
    State(state): State<ReviewRouterState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<DecisionRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.decide(
        &actor,
        &ApplicationId(application_id),
        request.action,
        &request.feedback,
        Local::now().date_naive(),
        request.expected_version,
    ) {
        Ok(record) => record_response(StatusCode::OK, &record, locale),
        Err(err) => service_error_response(err),
    }
}
