use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use engineer_registry::locale::Locale;
use engineer_registry::workflows::registration::{
    registry_router, RegistrationRepository, RegistryService,
};
use engineer_registry::workflows::review::{review_router, ApplicationRepository, ReviewService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_workflow_routes<A, R>(
    review: Arc<ReviewService<A>>,
    registry: Arc<RegistryService<R>>,
    default_locale: Locale,
) -> axum::Router
where
    A: ApplicationRepository + 'static,
    R: RegistrationRepository + 'static,
{
    review_router(review, default_locale)
        .merge(registry_router(registry, default_locale))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{
        seed_registry, InMemoryApplicationRepository, InMemoryRegistrationRepository,
    };
    use axum::body::Body;
    use axum::http::Request;
    use engineer_registry::workflows::review::EvaluationConfig;
    use tower::ServiceExt;

    fn router() -> axum::Router {
        let review = Arc::new(ReviewService::new(
            Arc::new(InMemoryApplicationRepository::default()),
            EvaluationConfig::default(),
        ));
        let registry = RegistryService::new(Arc::new(InMemoryRegistrationRepository::default()));
        seed_registry(&registry).expect("seeded");
        with_workflow_routes(review, Arc::new(registry), Locale::En)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn merged_router_serves_both_workflows() {
        let router = router();

        let registry = router
            .clone()
            .oneshot(
                Request::get("/api/v1/registry/records?sort=name&direction=asc")
                    .header("x-actor-id", "reg-1")
                    .header("x-actor-role", "registrar")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(registry.status(), StatusCode::OK);

        let review = router
            .oneshot(
                Request::get("/api/v1/review/applications")
                    .header("x-actor-id", "rev-1")
                    .header("x-actor-role", "reviewer")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(review.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
