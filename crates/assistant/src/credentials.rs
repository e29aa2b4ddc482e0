//! Bearer token resolution for the managed services.
//!
//! Either a ready token from the environment, or a username/password pair
//! traded at a token exchange endpoint. Values are read on every call so a
//! reconnect picks up rotated secrets.

use medrag_core::config::AuthConfig;
use medrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct ExchangeResponse {
    #[serde(alias = "access_token")]
    token: String,
}

/// Resolve the bearer token for a new session.
///
/// Returns `None` when no token source is configured.
pub async fn resolve_token(auth: &AuthConfig, timeout: Duration) -> AppResult<Option<String>> {
    match auth.token_url {
        Some(ref url) => exchange_credentials(auth, url, timeout).await.map(Some),
        None => {
            let token = read_env(&auth.token_env);
            if token.is_none() {
                tracing::debug!("No bearer token in {}", auth.token_env);
            }
            Ok(token)
        }
    }
}

async fn exchange_credentials(
    auth: &AuthConfig,
    url: &str,
    timeout: Duration,
) -> AppResult<String> {
    let username = read_env(&auth.username_env).ok_or_else(|| {
        AppError::Config(format!("{} is not set", auth.username_env))
    })?;
    let password = read_env(&auth.password_env).ok_or_else(|| {
        AppError::Config(format!("{} is not set", auth.password_env))
    })?;

    tracing::debug!("Exchanging credentials for a session token at {}", url);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Other(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .post(url)
        .json(&ExchangeRequest {
            username: &username,
            password: &password,
        })
        .send()
        .await
        .map_err(|e| AppError::Other(format!("Token exchange request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::AuthExpired(format!(
            "Token exchange failed ({}): {}",
            status, body
        )));
    }

    let parsed: ExchangeResponse = response.json().await.map_err(|e| {
        AppError::MalformedPayload(format!("Failed to parse token response: {}", e))
    })?;

    Ok(parsed.token)
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
