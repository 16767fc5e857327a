//! Single-shot JSON request gateway.
//!
//! Every call reads the current credential from the `TokenStore`, performs exactly one
//! transport request and translates the outcome into `ApiError`. A 401 clears the
//! credential before the error is returned; nothing is retried.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::token_store::TokenStore;
use crate::transport::{HttpRequest, HttpTransport};

pub struct RequestGateway {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenStore>,
}

impl RequestGateway {
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenStore>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            tokens,
        }
    }

    /// Issue `method endpoint` with an optional JSON body and parse the JSON reply.
    ///
    /// # Errors
    ///
    /// - `ApiError::AuthenticationFailed` on 401, after the credential is cleared.
    /// - `ApiError::Http` on any other non-2xx status.
    /// - `ApiError::Transport` when no response was obtained.
    /// - `ApiError::InvalidResponse` when a 2xx body does not parse as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        let credential = self.tokens.current();
        if let Some(credential) = &credential {
            headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", credential.expose()),
            ));
        }

        tracing::debug!(%method, endpoint, authenticated = credential.is_some(), "api request");
        let request = HttpRequest {
            method: method.clone(),
            url: format!("{}{endpoint}", self.base_url),
            headers,
            body,
        };

        let response = self.transport.send(request).await.map_err(|err| {
            tracing::warn!(%method, endpoint, error = %err, "api request failed without response");
            ApiError::Transport(err.0)
        })?;
        tracing::debug!(%method, endpoint, status = response.status, "api response");

        if response.status == 401 {
            tracing::warn!(%method, endpoint, "credential rejected, clearing session");
            self.tokens.clear().await;
            return Err(ApiError::AuthenticationFailed);
        }

        if !response.is_success() {
            let message = error_message(&response.body)
                .unwrap_or_else(|| format!("HTTP {}", response.status));
            return Err(ApiError::Http {
                status: response.status,
                message,
            });
        }

        parse_body(&response.body)
    }

    /// # Errors
    ///
    /// See [`RequestGateway::request`].
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(Method::GET, endpoint, None).await
    }

    /// # Errors
    ///
    /// See [`RequestGateway::request`]; also `ApiError::InvalidRequest` if `body`
    /// cannot be encoded.
    pub async fn post<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, endpoint, Some(encode(body)?))
            .await
    }

    /// # Errors
    ///
    /// See [`RequestGateway::post`].
    pub async fn put<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, endpoint, Some(encode(body)?))
            .await
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|err| ApiError::InvalidRequest(err.to_string()))
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let result = if body.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(body)
    };
    result.map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

/// Pull a human-readable message out of an error body like `{"error": "..."}`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .into_iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|message| !message.trim().is_empty())
        .map(str::to_string)
}
