use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NewRegistration, RegistrationId, RegistrationStatus};
use super::repository::{RegistrationRepository, StoredRegistration};
use super::service::{RegistryService, RegistryServiceError};
use crate::auth::actor_from_headers;
use crate::listing::{ListQuery, SortDirection, SortKey};
use crate::locale::Locale;
use crate::workflows::http::{access_response, error_response, repository_status, workflow_status};

pub(crate) struct RegistryRouterState<R> {
    service: Arc<RegistryService<R>>,
    default_locale: Locale,
}

impl<R> RegistryRouterState<R> {
    pub(crate) fn new(service: Arc<RegistryService<R>>, default_locale: Locale) -> Self {
        Self {
            service,
            default_locale,
        }
    }
}

impl<R> Clone for RegistryRouterState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            default_locale: self.default_locale,
        }
    }
}

/// Router builder exposing the registrar endpoints.
pub fn registry_router<R>(service: Arc<RegistryService<R>>, default_locale: Locale) -> Router
where
    R: RegistrationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/registry/records",
            post(register_handler::<R>).get(list_handler::<R>),
        )
        .route("/api/v1/registry/records/export", get(export_handler::<R>))
        .route("/api/v1/registry/records/expire", post(sweep_handler::<R>))
        .route(
            "/api/v1/registry/records/:registration_id",
            get(detail_handler::<R>),
        )
        .route(
            "/api/v1/registry/records/:registration_id/revoke",
            post(revoke_handler::<R>),
        )
        .route(
            "/api/v1/registry/records/:registration_id/renew",
            post(renew_handler::<R>),
        )
        .route(
            "/api/v1/registry/records/:registration_id/suspend",
            post(suspend_handler::<R>),
        )
        .with_state(RegistryRouterState::new(service, default_locale))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RegistryParams {
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
pub(crate) struct ReasonRequest {
    #[serde(default)]
    pub(crate) reason: String,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RenewRequest {
    pub(crate) years: u32,
    #[serde(default)]
    pub(crate) expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SweepRequest {
    #[serde(default)]
    pub(crate) as_of: Option<NaiveDate>,
}

fn service_error_response(error: RegistryServiceError) -> Response {
    let status = match &error {
        RegistryServiceError::Workflow(inner) => workflow_status(inner),
        RegistryServiceError::Repository(inner) => repository_status(inner),
        RegistryServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}

fn parse_status(raw: Option<&str>) -> Result<Option<RegistrationStatus>, Response> {
    match raw {
        None => Ok(None),
        Some(raw) => RegistrationStatus::parse(raw).map(Some).ok_or_else(|| {
            error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("unknown status filter '{raw}'"),
            )
        }),
    }
}

fn stored_response(status: StatusCode, stored: &StoredRegistration, locale: Locale) -> Response {
    (status, axum::Json(stored.view(locale))).into_response()
}

pub(crate) async fn register_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    headers: HeaderMap,
    axum::Json(registration): axum::Json<NewRegistration>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.register(&actor, registration) {
        Ok(stored) => stored_response(StatusCode::CREATED, &stored, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn list_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    headers: HeaderMap,
    Query(params): Query<RegistryParams>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);
    let status = match parse_status(params.status.as_deref()) {
        Ok(status) => status,
        Err(response) => return response,
    };

    let query = ListQuery {
        search: params.search,
        sort: params.sort.unwrap_or_default(),
        direction: params.direction.unwrap_or_default(),
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(0),
    };

    match state.service.list(&actor, status, &query) {
        Ok(page) => {
            let page = page.map(|stored| stored.view(locale));
            (StatusCode::OK, axum::Json(page)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn detail_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    Path(registration_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.get(&actor, &RegistrationId(registration_id)) {
        Ok(stored) => {
            let payload = json!({
                "summary": stored.view(locale),
                "history": stored.record.history,
                "renewals": stored.record.renewals,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn revoke_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    Path(registration_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ReasonRequest>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.revoke(
        &actor,
        &RegistrationId(registration_id),
        &request.reason,
        Local::now().date_naive(),
        request.expected_version,
    ) {
        Ok(stored) => stored_response(StatusCode::OK, &stored, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn renew_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    Path(registration_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<RenewRequest>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.renew(
        &actor,
        &RegistrationId(registration_id),
        request.years,
        Local::now().date_naive(),
        request.expected_version,
    ) {
        Ok(stored) => stored_response(StatusCode::OK, &stored, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn suspend_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    Path(registration_id): Path<String>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ReasonRequest>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);

    match state.service.suspend(
        &actor,
        &RegistrationId(registration_id),
        &request.reason,
        Local::now().date_naive(),
        request.expected_version,
    ) {
        Ok(stored) => stored_response(StatusCode::OK, &stored, locale),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn sweep_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    headers: HeaderMap,
    Query(request): Query<SweepRequest>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let locale = Locale::from_headers(&headers, state.default_locale);
    let as_of = request.as_of.unwrap_or_else(|| Local::now().date_naive());

    match state.service.sweep_expired(&actor, as_of) {
        Ok(expired) => {
            let views: Vec<_> = expired.iter().map(|stored| stored.view(locale)).collect();
            (StatusCode::OK, axum::Json(json!({ "as_of": as_of, "expired": views }))).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn export_handler<R>(
    State(state): State<RegistryRouterState<R>>,
    headers: HeaderMap,
    Query(params): Query<RegistryParams>,
) -> Response
where
    R: RegistrationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(err) => return access_response(err),
    };
    let status = match parse_status(params.status.as_deref()) {
        Ok(status) => status,
        Err(response) => return response,
    };

    let mut buffer = Vec::new();
    match state.service.export_csv(&actor, status, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.as_ref())],
            buffer,
        )
            .into_response(),
        Err(err) => service_error_response(err),
    }
}
