use crate::infra::AppState;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use digima_report::analytics::FetchError;
use digima_report::error::AppError;
use digima_report::report::{plan_deck, ReportData, SectionKind};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

pub(crate) fn report_routes() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/report/summary", post(summary_endpoint))
        .route("/api/v1/report/deck", post(deck_endpoint))
        .route("/ga4/sessions", get(ga4_sessions_endpoint))
        .route("/gsc/queries", get(search_queries_endpoint))
        .route("/ads/monthly", get(ads_monthly_endpoint))
}

pub(crate) async fn index() -> Json<Value> {
    Json(json!({
        "status": "digima report api is running",
        "endpoints": {
            "/health": "liveness probe",
            "/ready": "readiness probe",
            "/metrics": "prometheus metrics",
            "/api/v1/report/summary": "POST report data, returns the completed summary",
            "/api/v1/report/deck": "POST report data, returns the deck plan (?section=)",
            "/ga4/sessions": "latest session total",
            "/gsc/queries": "search queries (?month=)",
            "/ads/monthly": "ads monthly metrics"
        }
    }))
}

pub(crate) async fn healthcheck() -> Json<Value> {
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

pub(crate) async fn summary_endpoint(Json(payload): Json<Value>) -> Result<Json<Value>, AppError> {
    let data = ReportData::load_value(payload)?;
    info!(families = data.summary.as_map().len(), "summary completed");
    Ok(Json(json!({ "summary": data.summary })))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeckQuery {
    #[serde(default)]
    pub(crate) section: Option<String>,
}

pub(crate) async fn deck_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<DeckQuery>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let section = query
        .section
        .as_deref()
        .map(str::parse::<SectionKind>)
        .transpose()?;
    let data = ReportData::load_value(payload)?;

    let mut plan = plan_deck(&data);
    if let Some(template) = &state.template_path {
        plan = plan.with_template(template.clone());
    }

    let body = match section {
        Some(kind) => json!({ "section": kind, "slides": plan.section(kind) }),
        None => json!(plan),
    };
    Ok(Json(body))
}

pub(crate) async fn ga4_sessions_endpoint(Extension(state): Extension<AppState>) -> Response {
    match state.gateway.ga4_sessions() {
        Ok(totals) => Json(json!({
            "success": true,
            "sessions": totals.sessions,
            "message": totals.message(),
            "period": totals.period,
        }))
        .into_response(),
        Err(err) => failure("ga4_sessions", err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueriesQuery {
    #[serde(default)]
    pub(crate) month: Option<String>,
}

pub(crate) async fn search_queries_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<QueriesQuery>,
) -> Response {
    match state.gateway.search_queries(query.month.as_deref()) {
        Ok(found) => Json(json!({
            "success": true,
            "month": found.month,
            "queries": found.queries,
        }))
        .into_response(),
        Err(err) => failure("gsc_queries", err),
    }
}

pub(crate) async fn ads_monthly_endpoint(Extension(state): Extension<AppState>) -> Response {
    match state.gateway.ads_monthly() {
        Ok(months) => Json(json!({ "success": true, "months": months })).into_response(),
        Err(err) => failure("ads_monthly", err),
    }
}

fn failure(source: &'static str, err: FetchError) -> Response {
    warn!(source, error = %err, "data source request failed");
    let mut body = json!({ "success": false, "error": err.to_string() });
    if let Some(hint) = err.hint() {
        body["hint"] = json!(hint);
    }
    if let Some(details) = err.details() {
        body["details"] = json!(details);
    }
    (err.status(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::testing;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use digima_report::analytics::UnconfiguredGateway;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn router(ready: bool) -> Router {
        let gateway = Arc::new(UnconfiguredGateway::new(FetchError::NotConfigured {
            missing: vec!["GA4_PROPERTY_ID", "SERVICE_ACCOUNT_JSON"],
        }));
        report_routes().layer(Extension(testing::state(gateway, ready)))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).expect("json"))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
            .expect("request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (status, body) = send(router(false), get_request("/ready")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let (status, _) = send(router(true), get_request("/ready")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn summary_endpoint_completes_missing_fields() {
        let payload = json!({
            "ga4_monthly": [
                { "sessions": 100, "area_sessions": 40, "area_rate": 40.0, "inquiry_views": 10, "inquiry_rate": 10.0 },
                { "sessions": 150, "area_sessions": 40, "area_rate": 26.7, "inquiry_views": 12, "inquiry_rate": 8.0 }
            ],
            "summary": { "sessions": { "value": 999 } }
        });
        let (status, body) = send(router(true), post("/api/v1/report/summary", payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["sessions"]["value"], json!(999));
        assert_eq!(body["summary"]["sessions"]["diff_pct"], json!(50.0));
        assert_eq!(body["summary"]["area_sessions"]["prev_rate"], json!(40.0));
        assert!(body["summary"].get("cv").is_none());
    }

    #[tokio::test]
    async fn summary_endpoint_completes_around_malformed_cells() {
        let payload = json!({
            "ga4_monthly": [ { "sessions": "many" } ],
            "cv_months": [ { "actual": 5 }, { "actual": 8 } ]
        });
        let (status, body) = send(router(true), post("/api/v1/report/summary", payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["cv"], json!({ "value": 8, "prev": 5, "diff": 3 }));
        assert!(body["summary"].get("sessions").is_none());
    }

    #[tokio::test]
    async fn summary_endpoint_rejects_documents_that_are_not_objects() {
        let (status, body) =
            send(router(true), post("/api/v1/report/summary", json!([1, 2, 3]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("invalid report data"));
    }

    #[tokio::test]
    async fn deck_endpoint_filters_by_section() {
        let payload = json!({
            "store_name": "川口",
            "proposals": [ { "color": "red", "title": "LP改善", "body": "CTAを上部へ" } ]
        });
        let (status, body) =
            send(router(true), post("/api/v1/report/deck?section=proposals", payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["section"], "proposals");
        let slides = body["slides"].as_array().expect("slides");
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0]["title"], "改善提案（優先度順）");
        assert_eq!(slides[0]["blocks"][0]["kind"], "proposal");
        assert_eq!(slides[0]["blocks"][0]["priority"], "🔴 最優先");
    }

    #[tokio::test]
    async fn deck_endpoint_reports_unknown_section() {
        let (status, body) =
            send(router(true), post("/api/v1/report/deck?section=cover", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().expect("message").contains("cover"));
    }

    #[tokio::test]
    async fn full_deck_carries_template_and_cover() {
        let (status, body) = send(
            router(true),
            post("/api/v1/report/deck", json!({ "store_name": "川口", "period": "2025年6月" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["template_path"], "template.pptx");
        assert_eq!(body["cover"]["branch"], "（プロタイムズ 川口）");
        assert_eq!(body["cover"]["meeting"], "2025年6月　アクセル定例MTG");
    }

    #[tokio::test]
    async fn unconfigured_gateway_returns_failure_shape() {
        let (status, body) = send(router(true), get_request("/ga4/sessions")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], json!(false));
        assert_eq!(
            body["error"],
            "環境変数が設定されていません。GA4_PROPERTY_ID と SERVICE_ACCOUNT_JSON を設定してください。"
        );
        assert!(body.get("hint").is_none());
    }
}
