use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::error::AnalysisFailure;
use super::prompt::ChatCompletionRequest;
use crate::config::ModelConfig;

/// Outbound boundary to the vision model. Returns the first choice's text.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, AnalysisFailure>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// OpenRouter (or any OpenAI-compatible) chat completions endpoint.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: Client,
    base_url: String,
    api_key: String,
    referer: String,
    title: String,
}

impl OpenRouterClient {
    pub fn new(cfg: &ModelConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| anyhow::anyhow!("build http client: {e}"))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            api_key: cfg.api_key.clone(),
            referer: cfg.referer.clone(),
            title: cfg.title.clone(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VisionClient for OpenRouterClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, AnalysisFailure> {
        let url = self.completions_url();
        debug!(%url, model = %request.model, "sending chat completion");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, %url, "model request failed");
                AnalysisFailure::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!(error = %e, "reading model response failed");
            AnalysisFailure::Transport(e.to_string())
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            warn!(status = status.as_u16(), %message, "model provider rejected request");
            return Err(AnalysisFailure::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(first_choice_text(&body))
    }
}

/// An envelope we cannot read is treated as an empty reply.
fn first_choice_text(body: &str) -> String {
    match serde_json::from_str::<CompletionResponse>(body) {
        Ok(resp) => match resp.choices.into_iter().next() {
            Some(choice) => choice.message.content.unwrap_or_default(),
            None => {
                warn!("model response has no choices");
                String::new()
            }
        },
        Err(e) => {
            warn!(error = %e, "model response is not a chat completion");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::prompt::build_request;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn config(base_url: String) -> ModelConfig {
        ModelConfig {
            base_url,
            api_key: "sk-test".into(),
            model: "vision-test".into(),
            referer: "localhost:19000".into(),
            title: "SnapCal".into(),
            timeout_secs: Some(5),
        }
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api/v1/", addr)
    }

    #[test]
    fn envelope_parsing() {
        assert_eq!(
            first_choice_text(r#"{"choices":[{"message":{"content":"hi"}},{"message":{"content":"no"}}]}"#),
            "hi"
        );
        assert_eq!(first_choice_text(r#"{"choices":[{"message":{"content":null}}]}"#), "");
        assert_eq!(first_choice_text(r#"{"choices":[]}"#), "");
        assert_eq!(first_choice_text("<html>gateway</html>"), "");
    }

    #[tokio::test]
    async fn sends_credentials_headers_and_body() {
        let seen: Arc<Mutex<Option<(HeaderMap, Value)>>> = Arc::default();
        let captured = seen.clone();
        let router = Router::new().route(
            "/api/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some((headers, body));
                    Json(json!({
                        "choices": [{ "message": { "role": "assistant", "content": "{\"foods\":[]}" } }]
                    }))
                }
            }),
        );
        let base = spawn_stub(router).await;
        let client = OpenRouterClient::new(&config(base)).unwrap();

        let reply = client
            .complete(&build_request("vision-test", "QUJD"))
            .await
            .unwrap();
        assert_eq!(reply, "{\"foods\":[]}");

        let (headers, body) = seen.lock().unwrap().take().unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(headers["http-referer"], "localhost:19000");
        assert_eq!(headers["x-title"], "SnapCal");
        assert_eq!(body["model"], "vision-test");
        assert_eq!(
            body["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,QUJD"
        );
    }

    #[tokio::test]
    async fn non_success_status_is_rejected_with_provider_message() {
        let router = Router::new().route(
            "/api/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": { "message": "Rate limit exceeded", "code": 429 } })),
                )
            }),
        );
        let base = spawn_stub(router).await;
        let client = OpenRouterClient::new(&config(base)).unwrap();

        let err = client
            .complete(&build_request("vision-test", "QUJD"))
            .await
            .unwrap_err();
        match err {
            AnalysisFailure::Rejected { status, ref message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_failure() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = OpenRouterClient::new(&config(format!("http://{}", addr))).unwrap();
        let err = client
            .complete(&build_request("vision-test", "QUJD"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisFailure::Transport(_)));
    }
}
