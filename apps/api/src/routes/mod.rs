pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route(
            "/api/v1/analyze/upload",
            post(handlers::handle_analyze_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::dictionaries::Dictionaries;

    const RESUME: &str = "John Doe\njohn@example.com\n555-123-4567\nSkills: Python, SQL\nEducation: B.Sc Computer Science\nExperience: Jan 2020 - Dec 2022 Software Engineer";
    const JOB: &str = "Requires Python, Java, B.Sc Computer Science, 2+ years experience";
    const BOUNDARY: &str = "resume-analyzer-test-boundary";

    fn app() -> Router {
        let dictionaries = Dictionaries::builtin().unwrap();
        build_router(AppState::new(dictionaries, Config::default()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn multipart_body(file_name: &str, content_type: &str, file: &[u8], job: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(
            format!(
                "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{job}\r\n--{BOUNDARY}--\r\n"
            )
            .as_bytes(),
        );
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analyze/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn analyze_request(payload: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "resume-analyzer");
    }

    #[tokio::test]
    async fn test_analyze_returns_report() {
        let response = app()
            .oneshot(analyze_request(json!({ "resume_text": RESUME, "job_description": JOB })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["scores"]["ats_score"], 51.54);
        assert_eq!(body["contact"]["email"], "john@example.com");
        assert_eq!(body["experience"]["total_months"], 36);
    }

    #[tokio::test]
    async fn test_blank_resume_is_rejected() {
        let response = app()
            .oneshot(analyze_request(json!({ "resume_text": "  \n\t", "job_description": JOB })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_plain_text() {
        let body = multipart_body("resume.txt", "text/plain", RESUME.as_bytes(), JOB);
        let response = app().oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["scores"]["ats_score"], 51.54);
    }

    #[tokio::test]
    async fn test_upload_unsupported_format_is_422() {
        let body = multipart_body("photo.png", "image/png", b"\x89PNG\r\n\x1a\n", JOB);
        let response = app().oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
        assert_eq!(body["error"]["message"], "The document could not be analyzed");
    }

    #[tokio::test]
    async fn test_upload_without_resume_field() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{JOB}\r\n--{BOUNDARY}--\r\n"
        );
        let response = app().oneshot(upload_request(body.into_bytes())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
