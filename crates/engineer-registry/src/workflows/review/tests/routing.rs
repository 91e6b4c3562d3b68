use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::auth::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
use crate::locale::Locale;
use crate::workflows::review::router::{detail_handler, ReviewRouterState};
use crate::workflows::review::ReviewService;
use crate::workflows::review::evaluation::EvaluationConfig;

fn request(method: Method, uri: &str, role: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(role) = role {
        builder = builder
            .header(ACTOR_ID_HEADER, format!("{role}-1"))
            .header(ACTOR_ROLE_HEADER, role);
    }
    let body = body
        .map(|value| Body::from(serde_json::to_vec(&value).unwrap()))
        .unwrap_or_else(Body::empty);
    builder.body(body).unwrap()
}

async fn submit(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/review/applications",
            Some("applicant"),
            Some(serde_json::to_value(submission()).unwrap()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    body["application_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn submit_route_creates_pending_application() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(request(
            Method::POST,
            "/api/v1/review/applications",
            Some("applicant"),
            Some(serde_json::to_value(submission()).unwrap()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["status_label"], "Pending");
    assert_eq!(body["version"], 1);
    assert!(body.get("feedback").is_none());
}

#[tokio::test]
async fn missing_actor_headers_are_unauthorized() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(request(Method::GET, "/api/v1/review/applications", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("actor"));
}

#[tokio::test]
async fn applicant_cannot_read_queue() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/review/applications",
            Some("applicant"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn score_route_clamps_and_reports_version() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let id = submit(&router).await;

    let response = router
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/review/applications/{id}/criteria/education"),
            Some("reviewer"),
            Some(json!({ "score": 400, "expected_version": 1 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["version"], 2);
    assert_eq!(body["score_percentage"], 25.0);
}

#[tokio::test]
async fn score_route_clamps_values_beyond_the_engine_range() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let id = submit(&router).await;

    let response = router
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/review/applications/{id}/criteria/experience"),
            Some("reviewer"),
            Some(json!({ "score": 70_000 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["version"], 2);
    assert_eq!(body["score_percentage"], 35.0);
}

#[tokio::test]
async fn decision_without_feedback_is_unprocessable() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let id = submit(&router).await;

    let response = router
        .oneshot(request(
            Method::POST,
            &format!("/api/v1/review/applications/{id}/decision"),
            Some("reviewer"),
            Some(json!({ "action": "approve" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn second_decision_conflicts() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let id = submit(&router).await;
    let uri = format!("/api/v1/review/applications/{id}/decision");

    let first = router
        .clone()
        .oneshot(request(
            Method::POST,
            &uri,
            Some("reviewer"),
            Some(json!({ "action": "reject", "feedback": "Experience not evidenced" })),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body = read_json_body(first).await;
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["feedback"], "Experience not evidenced");

    let second = router
        .oneshot(request(
            Method::POST,
            &uri,
            Some("admin"),
            Some(json!({ "action": "approve", "feedback": "Overturned" })),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn stale_version_conflicts() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let id = submit(&router).await;

    let response = router
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/review/applications/{id}/evidence/0"),
            Some("reviewer"),
            Some(json!({ "verified": true, "expected_version": 7 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejected_upload_is_unprocessable() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let id = submit(&router).await;

    let response = router
        .oneshot(request(
            Method::PUT,
            &format!("/api/v1/review/applications/{id}/evidence/1/document"),
            Some("applicant"),
            Some(json!({
                "file": { "name": "cv.exe", "content_type": "application/octet-stream", "size_bytes": 1024 }
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_status_filter_is_unprocessable() {
    let (service, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/review/applications?status=archived",
            Some("reviewer"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn queue_route_pages_results() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    submit(&router).await;
    submit(&router).await;

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/review/applications?status=pending&page=2&page_size=1&sort=name&direction=asc",
            Some("registrar"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total_items"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn detail_handler_returns_not_found_for_unknown_id() {
    let (service, _) = build_service();
    let state = ReviewRouterState::new(Arc::new(service), Locale::En);
    let mut headers = HeaderMap::new();
    headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("rev-1"));
    headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("reviewer"));

    let response =
        detail_handler::<MemoryRepository>(State(state), Path("APP-404404".to_string()), headers)
            .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn detail_route_localizes_labels() {
    let (service, _) = build_service();
    let router = router_with_service(service);
    let id = submit(&router).await;

    let mut request = request(
        Method::GET,
        &format!("/api/v1/review/applications/{id}"),
        Some("reviewer"),
        None,
    );
    request
        .headers_mut()
        .insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ar"));
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["summary"]["status_label"], "قيد المراجعة");
    assert_eq!(body["evaluation"]["total_score"], 0);
    assert_eq!(body["evaluation"]["unverified_evidence"], 3);
}

#[tokio::test]
async fn repository_outage_is_internal_error() {
    let service = ReviewService::new(Arc::new(UnavailableRepository), EvaluationConfig::default());
    let router = crate::workflows::review::review_router(Arc::new(service), Locale::En);

    let response = router
        .oneshot(request(
            Method::GET,
            "/api/v1/review/applications",
            Some("admin"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
