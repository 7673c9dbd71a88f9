use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use base64ct::{Base64, Encoding};
use bytes::Bytes;
use tracing::{error, instrument, warn};

use super::dto::{AnalysisResult, AnalyzeRequest};
use super::error::AnalysisFailure;
use crate::state::AppState;

pub const NO_FOODS_MESSAGE: &str = "No foods were detected in the image. Please try another photo.";
pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Failed to analyze image. Please try another photo or try again later.";

pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze_base64))
        .route("/analyze/upload", post(analyze_upload))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /analyze { image_b64: "..." }
#[instrument(skip(state, body), fields(model = %state.config.model.model))]
pub async fn analyze_base64(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, (StatusCode, String)> {
    let image_b64 = strip_data_uri(body.image_b64.trim());
    if image_b64.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "image_b64 is required".into()));
    }
    if Base64::decode_vec(image_b64).is_err() {
        warn!(len = image_b64.len(), "rejecting undecodable image payload");
        return Err((StatusCode::BAD_REQUEST, "invalid base64".into()));
    }

    run_analysis(&state, image_b64).await
}

/// POST /analyze/upload (multipart), field: file (image/jpeg)
#[instrument(skip(state, mp), fields(model = %state.config.model.model))]
pub async fn analyze_upload(
    State(state): State<AppState>,
    mut mp: Multipart,
) -> Result<Json<AnalysisResult>, (StatusCode, String)> {
    let mut image: Option<Bytes> = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_rejection(e)),
        };
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "image/jpeg".into());
        if !is_jpeg(&content_type) {
            return Err((
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!("unsupported content type {}", content_type),
            ));
        }
        image = Some(field.bytes().await.map_err(multipart_rejection)?);
        break;
    }

    let Some(data) = image.filter(|d| !d.is_empty()) else {
        return Err((StatusCode::BAD_REQUEST, "file is required".into()));
    };
    let image_b64 = Base64::encode_string(&data);
    run_analysis(&state, &image_b64).await
}

async fn run_analysis(
    state: &AppState,
    image_b64: &str,
) -> Result<Json<AnalysisResult>, (StatusCode, String)> {
    let result = state
        .analyzer
        .analyze(image_b64)
        .await
        .map_err(transport_failed)?;

    if result.no_foods_detected() {
        warn!(meal_type = %result.meal_type, "no foods detected");
        return Err((StatusCode::UNPROCESSABLE_ENTITY, NO_FOODS_MESSAGE.into()));
    }
    Ok(Json(result))
}

fn multipart_rejection(e: MultipartError) -> (StatusCode, String) {
    warn!(error = %e, status = %e.status(), "multipart read failed");
    (e.status(), e.body_text())
}

fn transport_failed(e: AnalysisFailure) -> (StatusCode, String) {
    error!(error = %e, rate_limited = e.is_rate_limited(), "analysis failed");
    (StatusCode::BAD_GATEWAY, ANALYSIS_FAILED_MESSAGE.into())
}

fn strip_data_uri(payload: &str) -> &str {
    match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:image/") => rest,
        _ => payload,
    }
}

fn is_jpeg(ct: &str) -> bool {
    matches!(ct, "image/jpeg" | "image/jpg")
}

#[cfg(test)]
mod analyze_tests {
    use super::*;
    use crate::analysis::services::test_support::FakeVision;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const CHICKEN_REPLY: &str = "Sure! ```json\n{\"foods\":[{\"name\":\"Grilled Chicken\",\"calories\":200}],\"totalCalories\":200}\n```";

    fn app(vision: FakeVision) -> Router {
        analyze_routes().with_state(AppState::fake(vision, 19))
    }

    fn json_request(body: Value) -> Request<Body> {
        Request::post("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_body(res: axum::response::Response) -> Vec<u8> {
        to_bytes(res.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[test]
    fn test_strip_data_uri() {
        assert_eq!(strip_data_uri("data:image/jpeg;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri("QUJD"), "QUJD");
        assert_eq!(strip_data_uri("data:text/plain;base64,QUJD"), "data:text/plain;base64,QUJD");
    }

    #[test]
    fn test_is_jpeg() {
        assert!(is_jpeg("image/jpeg"));
        assert!(is_jpeg("image/jpg"));
        assert!(!is_jpeg("image/png"));
        assert!(!is_jpeg("application/octet-stream"));
    }

    #[tokio::test]
    async fn analyze_returns_enriched_result() {
        let res = app(FakeVision::Reply(CHICKEN_REPLY.into()))
            .oneshot(json_request(json!({ "image_b64": "data:image/jpeg;base64,QUJD" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body: Value = serde_json::from_slice(&read_body(res).await).unwrap();
        assert_eq!(body["totalCalories"], 200.0);
        assert_eq!(body["mealType"], "Dinner");
        assert_eq!(body["healthScore"], 100);
        assert_eq!(body["foods"][0]["name"], "Grilled Chicken");
        assert_eq!(body["foods"][0]["servingSize"], "100g (3.5 oz)");
    }

    #[tokio::test]
    async fn analyze_without_foods_is_unprocessable() {
        let res = app(FakeVision::Reply("not json at all".into()))
            .oneshot(json_request(json!({ "image_b64": "QUJD" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(read_body(res).await, NO_FOODS_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn transport_failure_is_bad_gateway() {
        let res = app(FakeVision::Unreachable)
            .oneshot(json_request(json!({ "image_b64": "QUJD" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(read_body(res).await, ANALYSIS_FAILED_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn bad_payloads_are_rejected() {
        for payload in ["", "   ", "not base64!!"] {
            let res = app(FakeVision::Reply(CHICKEN_REPLY.into()))
                .oneshot(json_request(json!({ "image_b64": payload })))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "payload {payload:?}");
        }
    }

    fn multipart_request(content_type: &str, data: &[u8]) -> Request<Body> {
        let boundary = "snapcal-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"meal.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Request::post("/analyze/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn upload_jpeg_is_analyzed() {
        let res = app(FakeVision::Reply(CHICKEN_REPLY.into()))
            .oneshot(multipart_request("image/jpeg", &[0xff, 0xd8, 0xff, 0xe0]))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn upload_without_file_is_bad_request() {
        let boundary = "snapcal-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nlunch\r\n--{boundary}--\r\n"
        );
        let req = Request::post("/analyze/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let res = app(FakeVision::Reply(CHICKEN_REPLY.into()))
            .oneshot(req)
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(read_body(res).await, b"file is required");
    }

    #[tokio::test]
    async fn oversized_upload_is_payload_too_large() {
        let data = vec![0xffu8; 21 * 1024 * 1024];
        let res = app(FakeVision::Reply(CHICKEN_REPLY.into()))
            .oneshot(multipart_request("image/jpeg", &data))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn upload_rejects_other_media_types() {
        let res = app(FakeVision::Reply(CHICKEN_REPLY.into()))
            .oneshot(multipart_request("image/png", &[0x89, 0x50]))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
