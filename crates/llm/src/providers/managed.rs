//! Managed completion provider.
//!
//! Talks to the hosted completion endpoint that fronts the organisation's
//! models. Each client is bound to one bearer token; when the service rejects
//! it the call fails with `AppError::AuthExpired` and the owner of the
//! session is expected to build a fresh client.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use medrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CompleteRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompleteResponse {
    #[serde(alias = "text", alias = "completion")]
    response: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

/// Client for the hosted completion endpoint.
pub struct ManagedClient {
    endpoint: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ManagedClient {
    /// Create a client for `endpoint`, authenticating with `token` when present.
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            token,
            client,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for ManagedClient {
    fn provider_name(&self) -> &str {
        "managed"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!(
            "Sending completion request (model: {}, prompt: {} bytes)",
            request.model,
            request.prompt.len()
        );

        let body = CompleteRequest {
            model: &request.model,
            prompt: &request.prompt,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to reach completion service: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(super::classify_failure(
                "Completion service",
                status.as_u16(),
                &error_text,
            ));
        }

        let parsed: CompleteResponse = response.json().await.map_err(|e| {
            AppError::Llm(format!("Failed to parse completion response: {}", e))
        })?;

        Ok(LlmResponse {
            content: parsed.response,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            usage: parsed.usage.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
                if request_complete(&received) {
                    break;
                }
            }

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/complete", addr)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= header_end + 4 + content_length
    }

    fn client_for(endpoint: String) -> ManagedClient {
        ManagedClient::new(endpoint, Some("token".to_string()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_complete_success() {
        let endpoint = serve_once("200 OK", r#"{"response":"Metformin 500mg twice daily."}"#).await;
        let client = client_for(endpoint);

        let response = client
            .complete(&LlmRequest::new("dose?", "llama3.3-70b"))
            .await
            .unwrap();

        assert_eq!(response.content, "Metformin 500mg twice daily.");
        assert_eq!(response.model, "llama3.3-70b");
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_expired() {
        let endpoint = serve_once("401 Unauthorized", r#"{"message":"expired"}"#).await;
        let client = client_for(endpoint);

        let err = client
            .complete(&LlmRequest::new("dose?", "llama3.3-70b"))
            .await
            .unwrap_err();

        assert!(err.is_auth_expired());
    }

    #[tokio::test]
    async fn test_server_error_is_not_auth() {
        let endpoint = serve_once("500 Internal Server Error", r#"{"message":"boom"}"#).await;
        let client = client_for(endpoint);

        let err = client
            .complete(&LlmRequest::new("dose?", "llama3.3-70b"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
    }
}
